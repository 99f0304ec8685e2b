mod column;
mod entity;
mod error;
mod registry;
mod validator;

pub use column::{Column, ColumnType, RealColumn, VirtualColumn};
pub use entity::EntitySchema;
pub use error::SchemaError;
pub use registry::{RegistryBuilder, SchemaRegistry};
