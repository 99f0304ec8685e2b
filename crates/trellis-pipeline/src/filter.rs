//! Compiles match expressions into native `$match` predicates.

use bson::{Bson, Document, doc};
use trellis_query::{MatchCondition, MatchExpr, MatchOp};
use trellis_schema::{Column, RealColumn, SchemaRegistry};

use crate::cast::{cast, cast_many};
use crate::error::PipelineError;

/// Compile one or more OR-ed match expressions into a predicate document.
pub fn compile(
    registry: &SchemaRegistry,
    entity: &str,
    exprs: &[MatchExpr],
) -> Result<Document, PipelineError> {
    match exprs {
        [] => Ok(Document::new()),
        [single] => compile_expr(registry, entity, single),
        many => {
            let branches = many
                .iter()
                .map(|e| compile_expr(registry, entity, e).map(Bson::Document))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(doc! { "$or": branches })
        }
    }
}

fn compile_expr(
    registry: &SchemaRegistry,
    entity: &str,
    expr: &MatchExpr,
) -> Result<Document, PipelineError> {
    let mut out = Document::new();
    for condition in &expr.conditions {
        let path = registry.storage_path(entity, &condition.path)?;
        let column = operand_column(registry, entity, &condition.path)?;
        out.insert(path, predicate(condition, column)?);
    }
    Ok(out)
}

/// Column the operand is cast against: the last real column of the chain,
/// or the join target's primary key when the path ends on a join.
fn operand_column<'a>(
    registry: &'a SchemaRegistry,
    entity: &str,
    path: &str,
) -> Result<Option<&'a RealColumn>, PipelineError> {
    let chain = registry.resolve_path(entity, path)?;
    match chain.last() {
        Some(Column::Real(real)) => Ok(Some(real)),
        Some(Column::Virtual(join)) => Ok(registry.primary_column(&join.entity).ok()),
        None => Ok(None),
    }
}

fn predicate(
    condition: &MatchCondition,
    column: Option<&RealColumn>,
) -> Result<Document, PipelineError> {
    let value = condition.value.clone();
    let scalar = |v: Bson| match column {
        Some(c) => cast(v, c),
        None => v,
    };
    let sequence = |v: Bson| match column {
        Some(c) => cast_many(v, c, condition.op),
        None => match v {
            Bson::Array(items) => Ok(items),
            other => Err(PipelineError::TypeMismatch {
                op: condition.op,
                got: format!("{:?}", other.element_type()),
            }),
        },
    };

    let out = match condition.op {
        MatchOp::Lt => doc! { "$lt": scalar(value) },
        MatchOp::Lte => doc! { "$lte": scalar(value) },
        MatchOp::Eq => doc! { "$eq": scalar(value) },
        MatchOp::Ne => doc! { "$ne": scalar(value) },
        MatchOp::Gte => doc! { "$gte": scalar(value) },
        MatchOp::Gt => doc! { "$gt": scalar(value) },
        MatchOp::Contain => doc! { "$in": sequence(value)? },
        MatchOp::NotContain => doc! { "$nin": sequence(value)? },
        MatchOp::Regex => doc! { "$regex": scalar(value) },
        MatchOp::Between => {
            let bounds = sequence(value)?;
            let [lower, upper] = <[Bson; 2]>::try_from(bounds).map_err(|b| {
                PipelineError::TypeMismatch {
                    op: MatchOp::Between,
                    got: format!("{} bounds", b.len()),
                }
            })?;
            doc! { "$gte": lower, "$lte": upper }
        }
    };
    Ok(out)
}
