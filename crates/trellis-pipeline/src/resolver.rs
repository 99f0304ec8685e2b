//! Relationship resolution: compiles an entity's column tree into
//! aggregation stages.
//!
//! Joins nested under embedded arrays need per-element correlation, so the
//! resolver decomposes every array level above a join (`$unwind` recording
//! the element's original index), runs the `$lookup`, and then recomposes
//! the arrays from the innermost level back out (`$group` + `$project` per
//! level). The recomposition keys carry the recorded indexes of every
//! still-pending outer level, which is what stops elements from different
//! array slots from being merged and keeps root cardinality exact.

use std::collections::BTreeSet;
use std::rc::Rc;

use bson::{Document, doc};
use tracing::debug;
use trellis_query::Query;
use trellis_schema::{SchemaError, SchemaRegistry, VirtualColumn};

use crate::error::PipelineError;
use crate::level::{Level, ancestors};
use crate::{filter, sort};

pub struct Resolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Compile the full stage list for one entity and query.
    ///
    /// Stage order is fixed: pre-match, relationship stages, post-match,
    /// sort, skip/limit, final projection. The final projection is only
    /// emitted when the caller restricted the field set; an empty field
    /// list selects everything and needs no projection stage.
    ///
    /// Note: with an empty field list every declared join is resolved, so
    /// cyclic join graphs must be queried with explicit field paths.
    pub fn build(
        &self,
        entity: &str,
        query: &Query,
        fields: &[String],
    ) -> Result<Vec<Document>, PipelineError> {
        debug!(entity, fields = fields.len(), "compiling pipeline");
        let mut stages = Vec::new();
        self.build_into(entity, query, fields, &mut stages)?;
        Ok(stages)
    }

    fn build_into(
        &self,
        entity: &str,
        query: &Query,
        fields: &[String],
        stages: &mut Vec<Document>,
    ) -> Result<(), PipelineError> {
        let root_pk = match self.registry.primary_column(entity) {
            Ok(pk) => pk.storage_name().to_string(),
            Err(SchemaError::NoPrimaryKey(_)) => "_id".to_string(),
            Err(e) => return Err(e.into()),
        };
        let view = self.view(entity, fields)?;

        if !query.pre.is_empty() {
            stages.push(doc! { "$match": filter::compile(self.registry, entity, &query.pre)? });
        }

        let project = self.apply_relationship(entity, &view, &root_pk, fields, None, stages)?;

        if !query.post.is_empty() {
            stages.push(doc! { "$match": filter::compile(self.registry, entity, &query.post)? });
        }
        if !query.sort.is_empty() {
            stages.push(doc! { "$sort": sort::compile(self.registry, entity, &query.sort)? });
        }
        if let Some(limit) = query.limit {
            if limit.start > 0 {
                stages.push(doc! { "$skip": limit.start as i64 });
            }
            stages.push(doc! { "$limit": limit.count as i64 });
        }

        if !fields.is_empty() && !view.is_empty() {
            stages.push(doc! { "$project": project });
        }
        Ok(())
    }

    /// The set of top-level storage names any intermediate stage must
    /// retain: the primary key, the restricted real and join columns, and
    /// every join's local key.
    fn view(&self, entity: &str, fields: &[String]) -> Result<BTreeSet<String>, PipelineError> {
        let schema = self.registry.entity(entity)?;
        let mut view = BTreeSet::new();
        if let Ok(pk) = self.registry.primary_column(entity) {
            view.insert(pk.storage_name().to_string());
        }
        for real in self.registry.real_columns(entity, fields)? {
            view.insert(real.storage_name().to_string());
        }
        for join in self.registry.virtual_columns(entity, fields)? {
            view.insert(join.name.clone());
            let local = schema
                .get(&join.local_key)
                .map(|c| c.storage_name().to_string())
                .unwrap_or_else(|| join.local_key.clone());
            view.insert(local);
        }
        Ok(view)
    }

    /// Walk the entity's columns: resolve joins, recurse into nested
    /// entities, and build the projection map for the final stage.
    fn apply_relationship(
        &self,
        entity: &str,
        view: &BTreeSet<String>,
        root_pk: &str,
        fields: &[String],
        parent: Option<Rc<Level>>,
        stages: &mut Vec<Document>,
    ) -> Result<Document, PipelineError> {
        let mut project = Document::new();
        if let Ok(pk) = self.registry.primary_column(entity) {
            project.insert(pk.storage_name(), true);
        }

        for join in self.registry.virtual_columns(entity, fields)? {
            let sub = sub_fields(fields, &join.name);
            self.resolve_foreign(entity, join, &sub, parent.clone(), view, root_pk, stages)?;
            project.insert(join.name.as_str(), true);
        }

        for real in self.registry.real_columns(entity, fields)? {
            let storage = real.storage_name();
            if project.contains_key(storage) {
                continue;
            }
            match real.nested_entity() {
                // Map columns are opaque documents, projected wholesale.
                Some(nested) if !real.is_map() => {
                    let sub = sub_fields(fields, &real.name);
                    let retain: Vec<String> = self.view(nested, &sub)?.into_iter().collect();
                    let level = Level::push(parent.clone(), storage, real.is_array(), retain);
                    let nested_project =
                        self.apply_relationship(nested, view, root_pk, &sub, Some(level), stages)?;
                    if nested_project.is_empty() {
                        project.insert(storage, true);
                    } else {
                        project.insert(storage, nested_project);
                    }
                }
                _ => {
                    project.insert(storage, true);
                }
            }
        }
        Ok(project)
    }

    /// Resolve one foreign relation: decompose array ancestors, `$lookup`
    /// with a correlated sub-pipeline, null-safe `$unwind` unless the join
    /// keeps its array, then recompose whatever was decomposed.
    fn resolve_foreign(
        &self,
        entity: &str,
        join: &VirtualColumn,
        sub: &[String],
        parent: Option<Rc<Level>>,
        view: &BTreeSet<String>,
        root_pk: &str,
        stages: &mut Vec<Document>,
    ) -> Result<(), PipelineError> {
        let target = self.registry.entity(&join.entity)?;
        let retain: Vec<String> = self.view(&join.entity, sub)?.into_iter().collect();
        let level = Level::push(parent, &join.name, join.many, retain);

        let multiples = decompose(&level, stages);

        let local_storage = self.registry.storage_path(entity, &join.local_key)?;
        let local_path = match &level.parent {
            Some(p) => format!("{}.{}", p.name, local_storage),
            None => local_storage,
        };
        let foreign_storage = self.registry.storage_path(&join.entity, &join.foreign_key)?;

        let mut pipeline = vec![doc! { "$match": {
            "$expr": { "$eq": [format!("${foreign_storage}"), "$$local"] }
        }}];
        let sub_query = join.query.clone().unwrap_or_default();
        self.build_into(&join.entity, &sub_query, sub, &mut pipeline)?;

        stages.push(doc! { "$lookup": {
            "from": target.collection.as_str(),
            "let": { "local": format!("${local_path}") },
            "pipeline": pipeline,
            "as": level.name.as_str(),
        }});

        let unwound = !join.all;
        if unwound {
            stages.push(doc! { "$unwind": {
                "path": format!("${}", level.name),
                "preserveNullAndEmptyArrays": true,
            }});
        }

        if !multiples.is_empty() {
            recompose(&level, &multiples, unwound, view, root_pk, stages);
        }
        Ok(())
    }
}

/// Unwind every multiply-valued ancestor that is not already decomposed,
/// root to leaf, recording each element's original index. Returns the
/// levels that were decomposed here, innermost last.
fn decompose(level: &Rc<Level>, stages: &mut Vec<Document>) -> Vec<Rc<Level>> {
    let mut multiples = Vec::new();
    for ancestor in ancestors(level) {
        if ancestor.multiple && !ancestor.is_unwound() {
            stages.push(doc! { "$unwind": {
                "path": format!("${}", ancestor.name),
                "includeArrayIndex": ancestor.index_field(),
                "preserveNullAndEmptyArrays": true,
            }});
            ancestor.set_unwound(true);
            multiples.push(ancestor);
        }
    }
    multiples
}

/// Rebuild the decomposed arrays, walking from the join level back out.
///
/// Each step groups by the root id plus the recorded index of every level
/// that is still decomposed further out, re-assembles the current level
/// (`$push` for arrays, `$first` for a single join), carries the remaining
/// in-scope fields, and follows up with a `$project` that drops absent
/// fields instead of emitting nulls and lifts the composite key parts back
/// to the top level.
fn recompose(
    join: &Rc<Level>,
    multiples: &[Rc<Level>],
    join_unwound: bool,
    view: &BTreeSet<String>,
    root_pk: &str,
    stages: &mut Vec<Document>,
) {
    let mut chain: Vec<Rc<Level>> = Vec::with_capacity(multiples.len() + 1);
    chain.push(join.clone());
    chain.extend(multiples.iter().rev().cloned());

    for (i, level) in chain.iter().enumerate() {
        let pending = &multiples[..multiples.len() - i];
        let alias = level.group_alias();
        let dotted = level.name.contains('.');

        // $group
        let mut group = Document::new();
        if pending.is_empty() {
            group.insert("_id", format!("${root_pk}"));
        } else {
            let mut key = Document::new();
            key.insert("_id", format!("${root_pk}"));
            for p in pending {
                key.insert(p.index_field(), format!("${}", p.index_field()));
            }
            group.insert("_id", key);
        }

        let push = if i == 0 {
            // The join level multiplies documents only when it was unwound.
            level.multiple && join_unwound
        } else {
            true
        };
        let mut acc = Document::new();
        acc.insert(
            if push { "$push" } else { "$first" },
            format!("${}", level.name),
        );
        group.insert(alias.clone(), acc);

        let carried = carried_fields(level, view, root_pk);
        for field in &carried {
            group.insert(field.clone(), doc! { "$first": format!("${field}") });
        }
        stages.push(doc! { "$group": group });

        // Defensive $project after the group.
        let mut project = Document::new();
        if pending.is_empty() {
            if root_pk == "_id" {
                project.insert("_id", true);
            } else {
                project.insert("_id", false);
                project.insert(root_pk, "$_id");
            }
        } else {
            if root_pk == "_id" {
                project.insert("_id", "$_id._id");
            } else {
                project.insert("_id", false);
                project.insert(root_pk, "$_id._id");
            }
            for p in pending {
                project.insert(p.index_field(), format!("$_id.{}", p.index_field()));
            }
        }

        if dotted {
            // Keep the siblings along the ancestor chain so restoring the
            // leaf path does not drop the rest of each enclosing element.
            for ancestor in ancestors(level) {
                let rest = &level.name[ancestor.name.len() + 1..];
                let next = rest.split('.').next().unwrap_or(rest);
                let child_prefix = format!("{}.{}", ancestor.name, next);
                for sibling in &ancestor.retain {
                    let path = format!("{}.{}", ancestor.name, sibling);
                    if path != child_prefix {
                        project.insert(
                            path.clone(),
                            doc! { "$ifNull": [format!("${path}"), "$$REMOVE"] },
                        );
                    }
                }
            }
        }
        project.insert(
            level.name.clone(),
            doc! { "$ifNull": [format!("${alias}"), "$$REMOVE"] },
        );
        for field in &carried {
            if dotted && field == level.head() {
                // Restored through its nested paths above.
                continue;
            }
            project.insert(
                field.clone(),
                doc! { "$ifNull": [format!("${field}"), "$$REMOVE"] },
            );
        }
        stages.push(doc! { "$project": project });
    }

    for level in multiples {
        level.set_unwound(false);
    }
}

/// Top-level fields a recompose group must carry besides the level being
/// re-assembled and the root id.
fn carried_fields(level: &Level, view: &BTreeSet<String>, root_pk: &str) -> Vec<String> {
    view.iter()
        .filter(|f| f.as_str() != root_pk && f.as_str() != level.name)
        .cloned()
        .collect()
}

fn sub_fields(fields: &[String], name: &str) -> Vec<String> {
    fields
        .iter()
        .filter_map(|f| f.strip_prefix(name).and_then(|r| r.strip_prefix('.')))
        .map(str::to_string)
        .collect()
}
