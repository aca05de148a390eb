pub mod canonical;
pub mod issues;
pub mod node;
pub mod result_path;
pub mod version;

pub use canonical::{canonical_json_bytes, digest_hex};
pub use issues::{IssueSeverity, ValidationIssue};
pub use node::{
    ComparisonOp, ConditionExpression, FailurePolicy, Node, RetryPolicy, Template,
};
pub use result_path::{PathSegment, ResultPath, ResultPathParseError};
pub use version::{RangeSpec, Version, VersionParseError, VersionRange, VersionRangeError};
