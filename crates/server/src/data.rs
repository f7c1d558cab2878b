//! Content bundled into the binary. Hosts may load their own instead.

/// Elimination phrases. `{killer}` and `{dying}` are substituted.
pub const PHRASES_JSON: &str = include_str!("../data/phrases.en.json");

/// Narrator jokes as `{"q": .., "a": ..}` objects.
pub const JOKES_JSON: &str = include_str!("../data/jokes.en.json");
