use bson::{Bson, Document};
use thiserror::Error;

use crate::expr::{MatchExpr, MatchOp};

/// Parse error for match documents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchParseError {
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("invalid match document: {0}")]
    InvalidShape(String),
}

/// Parse a BSON filter document into match expressions.
///
/// Follows MongoDB query conventions:
/// - Top-level document is an implicit AND of all entries
/// - `{ "field": value }` is implicit `$eq`
/// - `{ "field": { "$gt": v } }` uses operator sub-documents
/// - `{ "$or": [...] }` produces one expression per branch
///
/// The returned list is interpreted as an OR by the filter compiler, so a
/// plain document comes back as a single-element list.
pub fn parse_match(doc: &Document) -> Result<Vec<MatchExpr>, MatchParseError> {
    if let Some(or) = doc.get("$or") {
        if doc.len() != 1 {
            return Err(MatchParseError::InvalidShape(
                "$or cannot be combined with sibling conditions".into(),
            ));
        }
        let branches = match or {
            Bson::Array(items) => items,
            _ => {
                return Err(MatchParseError::InvalidShape(
                    "$or value must be an array".into(),
                ));
            }
        };
        return branches
            .iter()
            .map(|branch| match branch {
                Bson::Document(sub) => parse_expr(sub),
                _ => Err(MatchParseError::InvalidShape(
                    "$or array elements must be documents".into(),
                )),
            })
            .collect();
    }

    Ok(vec![parse_expr(doc)?])
}

fn parse_expr(doc: &Document) -> Result<MatchExpr, MatchParseError> {
    let mut expr = MatchExpr::new();

    for (key, value) in doc {
        if key.starts_with('$') {
            return Err(MatchParseError::UnsupportedOperator(key.clone()));
        }
        match value {
            Bson::Document(sub) if sub.keys().any(|k| k.starts_with('$')) => {
                for (op_key, op_value) in sub {
                    expr = expr.and(key.clone(), parse_op(op_key)?, op_value.clone());
                }
            }
            other => expr = expr.and(key.clone(), MatchOp::Eq, other.clone()),
        }
    }

    Ok(expr)
}

fn parse_op(key: &str) -> Result<MatchOp, MatchParseError> {
    let op = match key {
        "$lt" => MatchOp::Lt,
        "$lte" => MatchOp::Lte,
        "$eq" => MatchOp::Eq,
        "$ne" => MatchOp::Ne,
        "$gte" => MatchOp::Gte,
        "$gt" => MatchOp::Gt,
        "$in" => MatchOp::Contain,
        "$nin" => MatchOp::NotContain,
        "$regex" => MatchOp::Regex,
        "$between" => MatchOp::Between,
        other => return Err(MatchParseError::UnsupportedOperator(other.into())),
    };
    Ok(op)
}
