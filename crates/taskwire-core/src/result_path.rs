use serde_json::Value;
use std::fmt::{Display, Formatter};

/// One step into a result document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A dotted path into a service result, e.g. `items[0].total`.
///
/// Paths are parsed by hand rather than through a JSON-path crate so that
/// the accepted grammar stays exactly what templates may carry: dotted
/// identifiers and bracketed numeric indexes, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultPath {
    segments: Vec<PathSegment>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResultPathParseError {
    #[error("result path must not be empty")]
    Empty,
    #[error("empty segment in result path at byte {0}")]
    EmptySegment(usize),
    #[error("invalid character `{ch}` in result path at byte {at}")]
    InvalidChar { ch: char, at: usize },
    #[error("unclosed `[` in result path at byte {0}")]
    UnclosedBracket(usize),
    #[error("array index must be numeric at byte {0}")]
    BadIndex(usize),
}

impl ResultPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walks `value` along the path. Returns `None` as soon as a key or
    /// index is absent, without distinguishing why.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match segment {
                PathSegment::Key(key) => current.as_object()?.get(key)?,
                PathSegment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }

    pub fn parse(input: &str) -> Result<Self, ResultPathParseError> {
        if input.is_empty() {
            return Err(ResultPathParseError::Empty);
        }
        let bytes = input.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0usize;
        let mut expect_key = true;
        while pos < bytes.len() {
            match bytes[pos] {
                b'.' => {
                    if expect_key {
                        return Err(ResultPathParseError::EmptySegment(pos));
                    }
                    pos += 1;
                    expect_key = true;
                }
                b'[' => {
                    if expect_key {
                        // A path may not open with an index; results are objects.
                        return Err(ResultPathParseError::EmptySegment(pos));
                    }
                    let open = pos;
                    pos += 1;
                    let start = pos;
                    while pos < bytes.len() && bytes[pos] != b']' {
                        pos += 1;
                    }
                    if pos == bytes.len() {
                        return Err(ResultPathParseError::UnclosedBracket(open));
                    }
                    let digits = &input[start..pos];
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(ResultPathParseError::BadIndex(start));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| ResultPathParseError::BadIndex(start))?;
                    segments.push(PathSegment::Index(index));
                    pos += 1;
                }
                _ => {
                    if !expect_key {
                        let ch = input[pos..].chars().next().unwrap_or('?');
                        return Err(ResultPathParseError::InvalidChar { ch, at: pos });
                    }
                    let start = pos;
                    while pos < bytes.len() && is_key_byte(bytes[pos]) {
                        pos += 1;
                    }
                    if pos == start {
                        let ch = input[pos..].chars().next().unwrap_or('?');
                        return Err(ResultPathParseError::InvalidChar { ch, at: pos });
                    }
                    segments.push(PathSegment::Key(input[start..pos].to_string()));
                    expect_key = false;
                }
            }
        }
        if expect_key {
            return Err(ResultPathParseError::EmptySegment(input.len()));
        }
        Ok(Self { segments })
    }
}

fn is_key_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

impl std::str::FromStr for ResultPath {
    type Err = ResultPathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl Display for ResultPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "result_path_test.rs"]
mod tests;
