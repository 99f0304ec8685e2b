use bson::Bson;
use serde::{Deserialize, Serialize};

/// Comparison operator applied to one column path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOp {
    Lt,
    Lte,
    Eq,
    Ne,
    Gte,
    Gt,
    Contain,
    NotContain,
    Regex,
    Between,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub path: String,
    pub op: MatchOp,
    pub value: Bson,
}

/// A conjunction of conditions over column paths.
///
/// One expression ANDs its conditions together; a list of expressions is
/// interpreted as their logical OR by the filter compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchExpr {
    pub conditions: Vec<MatchCondition>,
}

impl MatchExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, path: impl Into<String>, op: MatchOp, value: impl Into<Bson>) -> Self {
        self.conditions.push(MatchCondition {
            path: path.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
