use bson::{Bson, Document, doc};
use tracing::debug;
use trellis_query::{MatchExpr, MatchOp, Query};
use trellis_schema::SchemaRegistry;

use crate::error::PipelineError;
use crate::filter;
use crate::resolver::Resolver;

/// Front door of the compiler: hands queries to the resolver and builds
/// the small derived pipelines (counts, by-id filters).
pub struct Assembler<'a> {
    registry: &'a SchemaRegistry,
    resolver: Resolver<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            resolver: Resolver::new(registry),
        }
    }

    /// Full read pipeline for an entity, query and requested field paths.
    pub fn pipeline(
        &self,
        entity: &str,
        query: &Query,
        fields: &[String],
    ) -> Result<Vec<Document>, PipelineError> {
        self.resolver.build(entity, query, fields)
    }

    /// Read pipeline terminated by a `$count` stage.
    pub fn count(&self, entity: &str, query: &Query) -> Result<Vec<Document>, PipelineError> {
        debug!(entity, "compiling count pipeline");
        let mut stages = self.resolver.build(entity, query, &[])?;
        stages.push(doc! { "$count": "count" });
        Ok(stages)
    }

    /// Equality expression on the entity's primary key, for by-id
    /// operations.
    pub fn primary_id_match(
        &self,
        entity: &str,
        value: impl Into<Bson>,
    ) -> Result<MatchExpr, PipelineError> {
        let pk = self.registry.primary_column(entity)?;
        Ok(MatchExpr::new().and(pk.name.clone(), MatchOp::Eq, value.into()))
    }

    /// `primary_id_match` compiled to a native predicate, with the value
    /// cast against the key column.
    pub fn primary_id_filter(
        &self,
        entity: &str,
        value: impl Into<Bson>,
    ) -> Result<Document, PipelineError> {
        let expr = self.primary_id_match(entity, value)?;
        filter::compile(self.registry, entity, &[expr])
    }
}
