//! Template bodies: text with `{name}` placeholders, parsed once.
//!
//! `{{` and `}}` stand for literal braces. Placeholder names are
//! identifiers, optionally dotted (`accum_t.name`). Format specs and
//! positional `{}` are rejected at parse time.

use std::collections::BTreeSet;

use super::Params;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateBody {
    segments: Vec<Segment>,
}

impl TemplateBody {
    /// Parse `text`, returning a reason string on malformed input.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if chars.peek().map(|&(_, n)| n) == Some('{') {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, n) in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(format!("unclosed '{{' at byte {}", pos));
                    }
                    if !is_placeholder_name(&name) {
                        return Err(format!("invalid placeholder '{{{}}}' at byte {}", name, pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    if chars.peek().map(|&(_, n)| n) == Some('}') {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(format!("single '}}' at byte {}", pos));
                    }
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) if seen.insert(name.as_str()) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Fill every placeholder from `params`. On a miss, returns the name
    /// of the first unresolved placeholder and no text.
    pub fn render<'a>(&'a self, params: &Params) -> Result<String, &'a str> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => return Err(name.as_str()),
                },
            }
        }
        Ok(out)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
