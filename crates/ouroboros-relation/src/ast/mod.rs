//! Query AST: the SELECT statement a relation mutates.
//!
//! A [`SelectQuery`] holds one source table alias, an ordered list of
//! [`JoinSource`]s whose aliases are unique, the projection list, a monotonic
//! distinct flag and a list of constraints. Expressions and predicates are
//! [`Node`] trees.

mod helpers;
mod node;
mod query;
mod table;

pub use helpers::{quote_identifier, validate_identifier};
pub use node::{Node, Operator, Value};
pub use query::{JoinBuilder, JoinKind, JoinSource, Projection, SelectQuery};
pub use table::TableAlias;
