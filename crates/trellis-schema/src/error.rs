use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown column path `{path}` on entity `{entity}`")]
    UnknownPath { entity: String, path: String },
    #[error("entity `{0}` declares no primary key")]
    NoPrimaryKey(String),
    #[error("column `{column}` on entity `{entity}` has no representable type")]
    UnsupportedType { entity: String, column: String },
}
