use serde::{Deserialize, Serialize};

use crate::column::Column;

/// A named entity shape: ordered columns plus the primary key designation.
///
/// Column order is declaration order and drives every iteration in the
/// compiler, which is what makes compilation deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    /// Collection the entity's documents live in. Defaults to the entity
    /// name; embedded entities never hit the store so theirs is unused.
    pub collection: String,
    pub columns: Vec<Column>,
    /// Name of the primary-key real column. Embedded entities may omit it.
    pub primary: Option<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection: name.clone(),
            name,
            columns: Vec::new(),
            primary: None,
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn column(mut self, column: impl Into<Column>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn primary(mut self, name: impl Into<String>) -> Self {
        self.primary = Some(name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }
}
