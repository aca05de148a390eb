pub mod condition;
pub mod reference;

pub use condition::{compare, evaluate, EvalError};
pub use reference::{ReferenceExpression, ReferenceParseError};
