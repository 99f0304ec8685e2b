mod expr;
mod parse_match;
mod query;
mod sort;

pub use expr::{MatchCondition, MatchExpr, MatchOp};
pub use parse_match::{MatchParseError, parse_match};
pub use query::{Limit, Query};
pub use sort::SortDirection;
