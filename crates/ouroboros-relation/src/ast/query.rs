//! SELECT statement under construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DataBridgeError, Result};
use super::node::Node;
use super::table::TableAlias;

/// Type of SQL JOIN
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// INNER JOIN
    Inner,
    /// LEFT OUTER JOIN
    #[default]
    Outer,
    /// Join whose ON condition is raw SQL text
    String,
}

impl JoinKind {
    /// Returns the SQL JOIN type string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Outer => "LEFT OUTER JOIN",
            JoinKind::String => "JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = DataBridgeError;

    /// Parses join type tokens: `outer`, `false`, `nil` and the empty string
    /// map to `Outer`; `inner` and `true` to `Inner`; `string` to `String`.
    fn from_str(token: &str) -> Result<Self> {
        match token.trim().to_lowercase().as_str() {
            "" | "outer" | "false" | "nil" | "none" => Ok(JoinKind::Outer),
            "inner" | "true" => Ok(JoinKind::Inner),
            "string" => Ok(JoinKind::String),
            other => Err(DataBridgeError::JoinTypeInvalid(format!(
                "'{}' is not one of outer, inner, string",
                other
            ))),
        }
    }
}

impl From<bool> for JoinKind {
    fn from(inner: bool) -> Self {
        if inner { JoinKind::Inner } else { JoinKind::Outer }
    }
}

impl From<Option<bool>> for JoinKind {
    fn from(inner: Option<bool>) -> Self {
        inner.map(JoinKind::from).unwrap_or_default()
    }
}

/// One joined source: alias, join type and ON condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSource {
    pub alias: TableAlias,
    pub kind: JoinKind,
    pub on: Node,
}

impl fmt::Display for JoinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JoinKind::String => write!(f, "{}", self.on),
            _ => write!(f, "{} {} ON {}", self.kind.to_sql(), self.alias, self.on),
        }
    }
}

/// One projected output expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: Node,
    /// Output label; `None` for expressions selected directly.
    pub name: Option<String>,
}

impl Projection {
    pub fn new(expr: Node, name: Option<String>) -> Self {
        Self { expr, name }
    }

    pub fn named(expr: Node, name: &str) -> Self {
        Self::new(expr, Some(name.to_string()))
    }
}

/// The mutable SELECT statement a relation assembles.
///
/// Joins and constraints are append-only; the distinct flag is monotonic.
/// Projections are appended, and a projection can be retracted by label when
/// the selection that produced it is excluded again.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    source: TableAlias,
    join_sources: Vec<JoinSource>,
    projections: Vec<Projection>,
    distinct: bool,
    constraints: Vec<Node>,
}

/// Pending JOIN, completed by [`JoinBuilder::on`].
pub struct JoinBuilder<'a> {
    query: &'a mut SelectQuery,
    alias: TableAlias,
    kind: JoinKind,
}

impl JoinBuilder<'_> {
    /// Attach the ON condition and append the join.
    pub fn on(self, on: Node) {
        self.query.join_sources.push(JoinSource {
            alias: self.alias,
            kind: self.kind,
            on,
        });
    }
}

impl SelectQuery {
    pub fn new(source: TableAlias) -> Self {
        Self {
            source,
            join_sources: Vec::new(),
            projections: Vec::new(),
            distinct: false,
            constraints: Vec::new(),
        }
    }

    pub fn source(&self) -> &TableAlias {
        &self.source
    }

    pub fn join_sources(&self) -> &[JoinSource] {
        &self.join_sources
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn constraints(&self) -> &[Node] {
        &self.constraints
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Aliases of the source followed by every joined source.
    pub fn source_aliases(&self) -> Vec<&TableAlias> {
        std::iter::once(&self.source)
            .chain(self.join_sources.iter().map(|j| &j.alias))
            .collect()
    }

    /// True when `alias` is the source or already joined.
    pub fn has_source(&self, alias: &TableAlias) -> bool {
        self.source == *alias || self.join_sources.iter().any(|j| j.alias == *alias)
    }

    pub fn project<I>(&mut self, projections: I)
    where
        I: IntoIterator<Item = Projection>,
    {
        self.projections.extend(projections);
    }

    /// Remove the projection labelled `name`. Returns whether one was removed.
    pub fn retract(&mut self, name: &str) -> bool {
        let before = self.projections.len();
        self.projections.retain(|p| p.name.as_deref() != Some(name));
        before != self.projections.len()
    }

    /// Remove an unlabelled projection of exactly `expr`.
    pub fn retract_expr(&mut self, expr: &Node) -> bool {
        let before = self.projections.len();
        self.projections.retain(|p| !(p.name.is_none() && p.expr == *expr));
        before != self.projections.len()
    }

    /// Start a join of `alias`. Callers check [`has_source`](Self::has_source)
    /// first; aliases in the join list are unique.
    pub fn join(&mut self, alias: TableAlias, kind: JoinKind) -> JoinBuilder<'_> {
        JoinBuilder {
            query: self,
            alias,
            kind,
        }
    }

    /// Append `source` unless its alias is already present.
    pub fn merge_join_source(&mut self, source: &JoinSource) -> bool {
        if self.has_source(&source.alias) {
            return false;
        }
        self.join_sources.push(source.clone());
        true
    }

    /// Turn DISTINCT on. Passing `false` never clears it once set.
    pub fn distinct(&mut self, distinct: bool) {
        self.distinct |= distinct;
    }

    pub fn add_constraint(&mut self, node: Node) {
        if !node.is_empty() {
            self.constraints.push(node);
        }
    }

    /// All constraints combined with AND (`Empty` when there are none).
    pub fn constraint(&self) -> Node {
        self.constraints
            .iter()
            .cloned()
            .fold(Node::Empty, Node::and)
    }
}
