use std::collections::HashMap;

use crate::column::{Column, RealColumn, VirtualColumn};
use crate::entity::EntitySchema;
use crate::error::SchemaError;

/// Immutable lookup of entity schemas. Built once at startup and shared
/// freely across threads — the compiler never mutates it.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entities: HashMap<String, EntitySchema>,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: Vec<EntitySchema>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, schema: EntitySchema) -> Self {
        self.entities.push(schema);
        self
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            entities: self
                .entities
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
        }
    }
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn entity(&self, name: &str) -> Result<&EntitySchema, SchemaError> {
        self.entities
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEntity(name.to_string()))
    }

    /// Real columns of `entity`, restricted by the requested field paths.
    ///
    /// An empty path list selects every declared column. Otherwise a column
    /// is eligible when its name is a dotted prefix of a requested path
    /// (an ancestor of something requested) or a requested path is a dotted
    /// prefix of it — which is what makes partial nested selection work.
    pub fn real_columns(
        &self,
        entity: &str,
        fields: &[String],
    ) -> Result<Vec<&RealColumn>, SchemaError> {
        Ok(self
            .entity(entity)?
            .columns
            .iter()
            .filter_map(Column::as_real)
            .filter(|c| selected(&c.name, fields))
            .collect())
    }

    /// Virtual (join) columns of `entity`, restricted like `real_columns`.
    pub fn virtual_columns(
        &self,
        entity: &str,
        fields: &[String],
    ) -> Result<Vec<&VirtualColumn>, SchemaError> {
        Ok(self
            .entity(entity)?
            .columns
            .iter()
            .filter_map(Column::as_virtual)
            .filter(|c| selected(&c.name, fields))
            .collect())
    }

    pub fn primary_column(&self, entity: &str) -> Result<&RealColumn, SchemaError> {
        let schema = self.entity(entity)?;
        schema
            .primary
            .as_deref()
            .and_then(|name| schema.get(name))
            .and_then(Column::as_real)
            .ok_or_else(|| SchemaError::NoPrimaryKey(entity.to_string()))
    }

    /// Resolve a dotted column path to its column chain, descending through
    /// nested entities and join targets.
    pub fn resolve_path(&self, entity: &str, path: &str) -> Result<Vec<&Column>, SchemaError> {
        let unknown = || SchemaError::UnknownPath {
            entity: entity.to_string(),
            path: path.to_string(),
        };

        let mut chain = Vec::new();
        let mut current = self.entity(entity)?;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let column = current.get(segment).ok_or_else(unknown)?;
            chain.push(column);

            if segments.peek().is_some() {
                let next = match column {
                    Column::Real(real) => real.nested_entity().ok_or_else(unknown)?,
                    Column::Virtual(join) => &join.entity,
                };
                current = self.entity(next)?;
            }
        }

        if chain.is_empty() {
            return Err(unknown());
        }
        Ok(chain)
    }

    /// Dotted storage-name form of a column path.
    pub fn storage_path(&self, entity: &str, path: &str) -> Result<String, SchemaError> {
        let chain = self.resolve_path(entity, path)?;
        Ok(chain
            .iter()
            .map(|c| c.storage_name())
            .collect::<Vec<_>>()
            .join("."))
    }
}

/// Dotted-segment prefix test in both directions.
fn selected(name: &str, fields: &[String]) -> bool {
    fields.is_empty()
        || fields
            .iter()
            .any(|f| f == name || dotted_prefix(name, f) || dotted_prefix(f, name))
}

fn dotted_prefix(prefix: &str, path: &str) -> bool {
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'.'
}
