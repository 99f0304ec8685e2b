//! Compiles sort maps into native `$sort` documents.

use bson::Document;
use trellis_query::SortDirection;
use trellis_schema::SchemaRegistry;

use crate::error::PipelineError;

pub fn compile(
    registry: &SchemaRegistry,
    entity: &str,
    sort: &[(String, SortDirection)],
) -> Result<Document, PipelineError> {
    let mut out = Document::new();
    for (path, direction) in sort {
        let storage = registry.storage_path(entity, path)?;
        let value = match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        out.insert(storage, value);
    }
    Ok(out)
}
