pub mod classification;
pub mod conversation;
pub mod evidence;
pub mod telemetry;

pub use classification::*;
pub use conversation::*;
pub use evidence::*;
pub use telemetry::*;

/// A string did not name a known variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
