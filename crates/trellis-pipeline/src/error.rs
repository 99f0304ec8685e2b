use thiserror::Error;
use trellis_query::{MatchOp, MatchParseError};
use trellis_schema::SchemaError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{op:?} expects an array operand, got {got}")]
    TypeMismatch { op: MatchOp, got: String },
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
}

impl From<MatchParseError> for PipelineError {
    fn from(e: MatchParseError) -> Self {
        match e {
            MatchParseError::UnsupportedOperator(op) => PipelineError::UnsupportedOperator(op),
            MatchParseError::InvalidShape(msg) => PipelineError::UnsupportedOperator(msg),
        }
    }
}
