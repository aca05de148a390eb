use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A semantic version. Pre-release text is kept for exact comparison but
/// ignored when checking range bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version must not be empty")]
    Empty,
    #[error("version must have three numeric components, got `{0}`")]
    MissingComponent(String),
    #[error("invalid version component `{0}`")]
    InvalidComponent(String),
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (input, None),
        };
        let mut parts = core.split('.');
        let major = parse_component(parts.next(), core)?;
        let minor = parse_component(parts.next(), core)?;
        let patch = parse_component(parts.next(), core)?;
        if parts.next().is_some() {
            return Err(VersionParseError::InvalidComponent(core.to_string()));
        }
        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

fn parse_component(part: Option<&str>, whole: &str) -> Result<u64, VersionParseError> {
    let Some(part) = part else {
        return Err(VersionParseError::MissingComponent(whole.to_string()));
    };
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(VersionParseError::InvalidComponent(part.to_string()));
    }
    part.parse::<u64>()
        .map_err(|_| VersionParseError::InvalidComponent(part.to_string()))
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// A version prefix as written in ranges: `1`, `1.2`, `1.2.3`, `1.x`, `1.2.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPrefix {
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
}

impl VersionPrefix {
    fn floor(&self) -> (u64, u64, u64) {
        (self.major, self.minor.unwrap_or(0), self.patch.unwrap_or(0))
    }
}

/// The version-range string carried on the wire. Syntax is checked at
/// template validation time via [`VersionRange::spec`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRange(String);

impl VersionRange {
    /// The wildcard range, matching any version. The default when a
    /// service node does not name one.
    pub fn any() -> Self {
        Self("*".to_string())
    }

    pub fn new(range: impl Into<String>) -> Self {
        Self(range.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn spec(&self) -> Result<RangeSpec, VersionRangeError> {
        RangeSpec::parse(self.0.as_str())
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VersionRangeError {
    #[error("version range must not be empty")]
    Empty,
    #[error("invalid version range component `{0}`")]
    InvalidComponent(String),
    #[error("wildcard segment must not precede a numeric segment in `{0}`")]
    WildcardBeforeNumber(String),
    #[error("version range has too many components: `{0}`")]
    TooManyComponents(String),
    #[error("hyphen range must have exactly two sides: `{0}`")]
    MalformedHyphen(String),
    #[error("invalid version in range: {0}")]
    Version(#[from] VersionParseError),
}

/// A parsed version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    Any,
    Exact(Version),
    Caret(VersionPrefix),
    Tilde(VersionPrefix),
    Wildcard(VersionPrefix),
    Hyphen(VersionPrefix, VersionPrefix),
}

impl RangeSpec {
    pub fn parse(input: &str) -> Result<Self, VersionRangeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VersionRangeError::Empty);
        }
        if input == "*" || input.eq_ignore_ascii_case("x") {
            return Ok(RangeSpec::Any);
        }
        if let Some((low, high)) = input.split_once(" - ") {
            let low = low.trim();
            let high = high.trim();
            if low.is_empty() || high.is_empty() || high.contains(' ') {
                return Err(VersionRangeError::MalformedHyphen(input.to_string()));
            }
            let (low, low_wild) = parse_prefix(low)?;
            let (high, high_wild) = parse_prefix(high)?;
            if low_wild || high_wild {
                return Err(VersionRangeError::InvalidComponent(input.to_string()));
            }
            return Ok(RangeSpec::Hyphen(low, high));
        }
        if let Some(rest) = input.strip_prefix('^') {
            let (prefix, _) = parse_prefix(rest.trim())?;
            return Ok(RangeSpec::Caret(prefix));
        }
        if let Some(rest) = input.strip_prefix('~') {
            let (prefix, _) = parse_prefix(rest.trim())?;
            return Ok(RangeSpec::Tilde(prefix));
        }

        // Pre-release text only makes sense on an exact version.
        if input.contains('-') {
            return Ok(RangeSpec::Exact(input.parse::<Version>()?));
        }

        let (prefix, wildcarded) = parse_prefix(input)?;
        if !wildcarded && prefix.minor.is_some() && prefix.patch.is_some() {
            return Ok(RangeSpec::Exact(input.parse::<Version>()?));
        }
        // `1` and `1.2` behave like `1.x` and `1.2.x`.
        Ok(RangeSpec::Wildcard(prefix))
    }

    pub fn matches(&self, version: &Version) -> bool {
        let v = version.triple();
        match self {
            RangeSpec::Any => true,
            RangeSpec::Exact(exact) => version == exact,
            RangeSpec::Caret(prefix) => v >= prefix.floor() && v < caret_ceiling(prefix),
            RangeSpec::Tilde(prefix) | RangeSpec::Wildcard(prefix) => {
                v >= prefix.floor() && v < tilde_ceiling(prefix)
            }
            RangeSpec::Hyphen(low, high) => {
                if v < low.floor() {
                    return false;
                }
                match (high.minor, high.patch) {
                    (Some(minor), Some(patch)) => v <= (high.major, minor, patch),
                    _ => v < tilde_ceiling(high),
                }
            }
        }
    }
}

fn caret_ceiling(prefix: &VersionPrefix) -> (u64, u64, u64) {
    if prefix.major > 0 {
        return (prefix.major + 1, 0, 0);
    }
    match prefix.minor {
        Some(minor) if minor > 0 => (0, minor + 1, 0),
        Some(_) => match prefix.patch {
            Some(patch) => (0, 0, patch + 1),
            None => (0, 1, 0),
        },
        None => (1, 0, 0),
    }
}

fn tilde_ceiling(prefix: &VersionPrefix) -> (u64, u64, u64) {
    match prefix.minor {
        Some(minor) => (prefix.major, minor + 1, 0),
        None => (prefix.major + 1, 0, 0),
    }
}

/// Parses `1`, `1.2`, `1.2.3`, `1.x`, `1.2.x`. Returns the prefix and
/// whether an explicit wildcard segment appeared.
fn parse_prefix(input: &str) -> Result<(VersionPrefix, bool), VersionRangeError> {
    if input.is_empty() {
        return Err(VersionRangeError::Empty);
    }
    let mut segments = Vec::<Option<u64>>::new();
    for part in input.split('.') {
        if part == "x" || part == "X" || part == "*" {
            segments.push(None);
            continue;
        }
        if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(VersionRangeError::InvalidComponent(part.to_string()));
        }
        let number = part
            .parse::<u64>()
            .map_err(|_| VersionRangeError::InvalidComponent(part.to_string()))?;
        segments.push(Some(number));
    }
    if segments.len() > 3 {
        return Err(VersionRangeError::TooManyComponents(input.to_string()));
    }
    let mut wildcard_seen = false;
    for segment in &segments {
        match segment {
            None => wildcard_seen = true,
            Some(_) if wildcard_seen => {
                return Err(VersionRangeError::WildcardBeforeNumber(input.to_string()));
            }
            Some(_) => {}
        }
    }
    let Some(Some(major)) = segments.first() else {
        return Err(VersionRangeError::InvalidComponent(input.to_string()));
    };
    let prefix = VersionPrefix {
        major: *major,
        minor: segments.get(1).copied().flatten(),
        patch: segments.get(2).copied().flatten(),
    };
    Ok((prefix, wildcard_seen))
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
