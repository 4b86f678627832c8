//! Error types for the template compiler.
//!
//! Syntax and structural errors abort a compile call. Generation anomalies do
//! not; the generator records them and keeps going.
use thiserror::Error;
use crate::frontend::data::Location;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// End of input before the `>` closing a tag (or the quote closing one of
    /// its attribute values).
    #[error("unterminated tag starting at {0}")]
    UnterminatedTag(Location),
    /// End of input before the `}` balancing an expression.
    #[error("unterminated expression starting at {0}")]
    UnterminatedExpression(Location),
    #[error("element at {location} is nested deeper than {limit} levels")]
    NestingTooDeep {
        location: Location,
        limit: usize,
    },
}

impl SyntaxError {
    pub fn location(&self) -> Location {
        match self {
            SyntaxError::UnterminatedTag(x) => *x,
            SyntaxError::UnterminatedExpression(x) => *x,
            SyntaxError::NestingTooDeep{location, ..} => *location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("{kind} at {location} has no tag name")]
    MissingTagName {
        kind: &'static str,
        location: Location,
    },
    /// A component name is called directly from the emitted code, so it must
    /// be a plain identifier (no `-`).
    #[error("component `{name}` at {location} is not a valid identifier")]
    InvalidComponentName {
        name: String,
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Something the generator could not emit. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationAnomaly {
    #[error("instruction {index} has an unsupported op; skipped")]
    UnsupportedOp {
        index: usize,
    },
    #[error("entry block {0} is missing; emitting an empty body")]
    MissingEntryBlock(usize),
}
