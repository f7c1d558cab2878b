//! Elimination phrase templates with `{killer}` and `{dying}` placeholders.
//!
//! Templates are parsed once at load so a malformed phrase is rejected up
//! front rather than mid-day. `{{` and `}}` render as literal braces.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Killer,
    Dying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseTemplate {
    segments: Vec<Segment>,
}

impl PhraseTemplate {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(format!("unclosed placeholder `{{{name}`")),
                        }
                    }
                    let segment = match name.trim() {
                        "killer" => Segment::Killer,
                        "dying" => Segment::Dying,
                        other => return Err(format!("unknown placeholder `{other}`")),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => return Err("unmatched `}`".to_string()),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, killer: &str, dying: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Killer => out.push_str(killer),
                Segment::Dying => out.push_str(dying),
            }
        }
        out
    }
}
