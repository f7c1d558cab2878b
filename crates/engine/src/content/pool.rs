//! Shuffled index queue backing the content banks.

use crate::random::{RandomError, RandomSource};

/// A permutation of `0..len` consumed one slot at a time.
///
/// Each draw swaps a uniformly chosen remaining index into the cursor slot
/// (an incremental Fisher-Yates shuffle). When the cursor reaches the end the
/// whole arena becomes available again.
#[derive(Debug, Clone)]
pub struct ShuffledPool {
    indices: Vec<usize>,
    cursor: usize,
}

impl ShuffledPool {
    pub fn new(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Draws left before the pool refills.
    pub fn remaining(&self) -> usize {
        self.indices.len() - self.cursor
    }

    /// Next index. On a random failure the pool is left untouched.
    pub fn draw(&mut self, rng: &mut dyn RandomSource) -> Result<usize, RandomError> {
        if self.cursor == self.indices.len() {
            self.cursor = 0;
        }
        let pick = rng.int_in(self.cursor..self.indices.len())?;
        self.indices.swap(self.cursor, pick);
        let index = self.indices[self.cursor];
        self.cursor += 1;
        Ok(index)
    }
}
