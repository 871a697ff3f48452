//! Compiler and runtime errors

use thiserror::Error;

use crate::dom::DomError;
use crate::parse_util::ParseError;

/// Fatal errors raised while compiling, loading or binding a template.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// Malformed directive or block structure in the template source.
    #[error("{0}")]
    Syntax(ParseError),

    /// The document provider refused a node operation.
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("A handler for template code '{0}' already exists")]
    HandlerExists(String),

    #[error("No handler registered for template code '{0}'")]
    UnknownRenderKind(String),

    /// The materialized markup and the reference table disagree.
    #[error("Reference table mismatch: {0}")]
    ReferenceMismatch(String),

    #[error("Malformed iteration expression '{0}'")]
    IterationExpression(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        CompilerError::Syntax(err)
    }
}

impl CompilerError {
    /// The parse error behind a syntax failure, if any.
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            CompilerError::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompilerError>;
