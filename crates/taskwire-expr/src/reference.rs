use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use taskwire_core::ResultPath;

/// A parsed `service{key}.path` expression. The key names an earlier
/// service node's result (its alias, or its name when unaliased); the
/// path walks into that result document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceExpression {
    key: String,
    path: ResultPath,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("reference must start with `service{{`")]
    MissingPrefix,
    #[error("reference key is missing its closing `}}`")]
    UnclosedBrace,
    #[error("reference key must not be empty")]
    EmptyKey,
    #[error("invalid character `{0}` in reference key")]
    InvalidKeyChar(char),
    #[error("reference must continue with `.` and a result path")]
    MissingPath,
    #[error("invalid result path in reference: {0}")]
    Path(#[from] taskwire_core::ResultPathParseError),
}

impl ReferenceExpression {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &ResultPath {
        &self.path
    }

    pub fn parse(input: &str) -> Result<Self, ReferenceParseError> {
        let Some(rest) = input.strip_prefix("service{") else {
            return Err(ReferenceParseError::MissingPrefix);
        };
        let Some(close) = rest.find('}') else {
            return Err(ReferenceParseError::UnclosedBrace);
        };
        let key = &rest[..close];
        if key.is_empty() {
            return Err(ReferenceParseError::EmptyKey);
        }
        if let Some(ch) = key.chars().find(|ch| !is_key_char(*ch)) {
            return Err(ReferenceParseError::InvalidKeyChar(ch));
        }
        let after = &rest[close + 1..];
        let Some(path_text) = after.strip_prefix('.') else {
            return Err(ReferenceParseError::MissingPath);
        };
        let path = ResultPath::parse(path_text)?;
        Ok(Self {
            key: key.to_string(),
            path,
        })
    }
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

impl std::str::FromStr for ReferenceExpression {
    type Err = ReferenceParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl Display for ReferenceExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "service{{{}}}.{}", self.key, self.path)
    }
}

// On the wire a reference is its source text.
impl Serialize for ReferenceExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReferenceExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
#[path = "reference_test.rs"]
mod tests;
