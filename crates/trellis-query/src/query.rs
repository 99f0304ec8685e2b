use serde::{Deserialize, Serialize};

use crate::expr::MatchExpr;
use crate::sort::SortDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub start: u64,
    pub count: u64,
}

/// A complete read query against one entity.
///
/// `pre` is matched before relationship stages, `post` after — so `post`
/// may reference fields that only exist once joins have run. Empty filter
/// lists mean "no filter". Sort entries keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub pre: Vec<MatchExpr>,
    pub post: Vec<MatchExpr>,
    pub sort: Vec<(String, SortDirection)>,
    pub limit: Option<Limit>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre(mut self, expr: MatchExpr) -> Self {
        self.pre.push(expr);
        self
    }

    pub fn post(mut self, expr: MatchExpr) -> Self {
        self.post.push(expr);
        self
    }

    pub fn sort(mut self, path: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((path.into(), direction));
        self
    }

    pub fn limit(mut self, start: u64, count: u64) -> Self {
        self.limit = Some(Limit { start, count });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty() && self.sort.is_empty() && self.limit.is_none()
    }
}
