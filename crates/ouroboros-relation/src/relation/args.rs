//! Argument types accepted by `Relation::join` and `Relation::select`.

use std::fmt;
use std::str::FromStr;

use crate::ast::{JoinKind, Node, TableAlias};
use crate::model::AssociationRef;
use crate::{DataBridgeError, Result};
use super::Relation;

/// Associations to join: one name, a list of names, or names paired with
/// their own join type. A pair without a type uses the call's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Joins {
    Single(String),
    List(Vec<String>),
    Pairs(Vec<(String, Option<JoinKind>)>),
}

impl Joins {
    /// Normalize to `(name, kind)` pairs in input order.
    pub fn into_pairs(self) -> Vec<(String, Option<JoinKind>)> {
        match self {
            Joins::Single(name) => vec![(name, None)],
            Joins::List(names) => names.into_iter().map(|n| (n, None)).collect(),
            Joins::Pairs(pairs) => pairs,
        }
    }
}

impl From<&str> for Joins {
    fn from(name: &str) -> Self {
        Joins::Single(name.to_string())
    }
}

impl From<String> for Joins {
    fn from(name: String) -> Self {
        Joins::Single(name)
    }
}

impl From<Vec<&str>> for Joins {
    fn from(names: Vec<&str>) -> Self {
        Joins::List(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Joins {
    fn from(names: [&str; N]) -> Self {
        Joins::List(names.into_iter().map(String::from).collect())
    }
}

impl From<Vec<(&str, JoinKind)>> for Joins {
    fn from(pairs: Vec<(&str, JoinKind)>) -> Self {
        Joins::Pairs(pairs.into_iter().map(|(n, k)| (n.to_string(), Some(k))).collect())
    }
}

impl From<Vec<(String, Option<JoinKind>)>> for Joins {
    fn from(pairs: Vec<(String, Option<JoinKind>)>) -> Self {
        Joins::Pairs(pairs)
    }
}

impl TryFrom<Vec<(&str, &str)>> for Joins {
    type Error = DataBridgeError;

    /// Pairs of association name and join type token.
    fn try_from(pairs: Vec<(&str, &str)>) -> Result<Self> {
        pairs
            .into_iter()
            .map(|(name, token)| Ok((name.to_string(), Some(token.parse::<JoinKind>()?))))
            .collect::<Result<Vec<_>>>()
            .map(Joins::Pairs)
    }
}

/// How a selected field changes the working selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOp {
    /// Add the field.
    Include,
    /// Remove the field.
    Exclude,
    /// Replace the untouched default selection, otherwise add.
    Default,
}

impl FromStr for SelectOp {
    type Err = DataBridgeError;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim() {
            "include" | "including" | "also" | "add" | "+" | "true" => Ok(SelectOp::Include),
            "exclude" | "excluding" | "except" | "remove" | "-" | "false" => Ok(SelectOp::Exclude),
            "" | "nil" | "only" | "default" => Ok(SelectOp::Default),
            other => Err(DataBridgeError::SelectFieldOperationInvalid(other.to_string())),
        }
    }
}

impl From<bool> for SelectOp {
    fn from(include: bool) -> Self {
        if include { SelectOp::Include } else { SelectOp::Exclude }
    }
}

/// A field name, an association name, or an expression to project as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Name(String),
    Expr(Node),
}

impl Selector {
    pub fn name(&self) -> Option<&str> {
        match self {
            Selector::Name(name) => Some(name),
            Selector::Expr(_) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "{}", name),
            Selector::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<Node> for Selector {
    fn from(expr: Node) -> Self {
        Selector::Expr(expr)
    }
}

/// Fields to select. `Default` selects nothing beyond the current working
/// selection (the model's default fields on a fresh relation).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Fields {
    #[default]
    Default,
    Single(Selector),
    List(Vec<Selector>),
    Pairs(Vec<(Selector, Option<SelectOp>)>),
}

impl Fields {
    /// Normalize to `(selector, op)` pairs in input order.
    pub fn into_pairs(self) -> Vec<(Selector, Option<SelectOp>)> {
        match self {
            Fields::Default => Vec::new(),
            Fields::Single(selector) => vec![(selector, None)],
            Fields::List(selectors) => selectors.into_iter().map(|s| (s, None)).collect(),
            Fields::Pairs(pairs) => pairs,
        }
    }
}

impl From<&str> for Fields {
    fn from(name: &str) -> Self {
        Fields::Single(name.into())
    }
}

impl From<Node> for Fields {
    fn from(expr: Node) -> Self {
        Fields::Single(Selector::Expr(expr))
    }
}

impl From<Selector> for Fields {
    fn from(selector: Selector) -> Self {
        Fields::Single(selector)
    }
}

impl From<Vec<&str>> for Fields {
    fn from(names: Vec<&str>) -> Self {
        Fields::List(names.into_iter().map(Selector::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Fields {
    fn from(names: [&str; N]) -> Self {
        Fields::List(names.into_iter().map(Selector::from).collect())
    }
}

impl From<Vec<Selector>> for Fields {
    fn from(selectors: Vec<Selector>) -> Self {
        Fields::List(selectors)
    }
}

impl From<Vec<(&str, SelectOp)>> for Fields {
    fn from(pairs: Vec<(&str, SelectOp)>) -> Self {
        Fields::Pairs(pairs.into_iter().map(|(n, op)| (n.into(), Some(op))).collect())
    }
}

impl TryFrom<Vec<(&str, &str)>> for Fields {
    type Error = DataBridgeError;

    /// Pairs of field name and operation token.
    fn try_from(pairs: Vec<(&str, &str)>) -> Result<Self> {
        pairs
            .into_iter()
            .map(|(name, token)| Ok((Selector::from(name), Some(token.parse::<SelectOp>()?))))
            .collect::<Result<Vec<_>>>()
            .map(Fields::Pairs)
    }
}

/// Alias override for a joined association.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasOverride {
    /// Use this alias as-is.
    Alias(TableAlias),
    /// Use the named model's default alias.
    Model(String),
    /// Attach this alias name to the association's table.
    Name(String),
}

/// Options for a join call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOptions {
    /// Alias for the joined association.
    pub alias: Option<AliasOverride>,
    /// Alias for the intermediate of a through association.
    pub through: Option<AliasOverride>,
    /// Condition used instead of the association's registered one;
    /// `field` references bind to the joined alias.
    pub on: Option<Node>,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: AliasOverride) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn alias_name(self, name: &str) -> Self {
        self.alias(AliasOverride::Name(name.to_string()))
    }

    pub fn alias_model(self, model: &str) -> Self {
        self.alias(AliasOverride::Model(model.to_string()))
    }

    pub fn through(mut self, alias: AliasOverride) -> Self {
        self.through = Some(alias);
        self
    }

    pub fn through_name(self, name: &str) -> Self {
        self.through(AliasOverride::Name(name.to_string()))
    }

    pub fn on(mut self, on: Node) -> Self {
        self.on = Some(on);
        self
    }
}

/// What a join-condition callback sees.
pub struct JoinContext<'a> {
    /// Condition built so far (registered condition and scope constraints).
    pub condition: &'a Node,
    /// Association name being joined.
    pub association: &'a str,
    pub reference: &'a AssociationRef,
    pub through: Option<&'a AssociationRef>,
    /// Scoped relation of the joined model.
    pub relation: &'a Relation,
}

impl JoinContext<'_> {
    /// Alias the association is joined under.
    pub fn alias(&self) -> &TableAlias {
        self.relation.query().source()
    }
}

/// Result of a join-condition callback.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Use this condition instead.
    Replace(Node),
    /// AND each condition onto the current one.
    Extend(Vec<Node>),
}

/// Join-condition callback.
pub type JoinCallback<'a> = dyn Fn(&JoinContext<'_>) -> JoinOn + 'a;

/// Projection callback: returns the expression to project for a field, or
/// `None` to use the field's own expression.
pub type SelectCallback<'a> = dyn Fn(&str, &TableAlias) -> Option<Node> + 'a;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_into_pairs() {
        assert_eq!(Joins::from("author").into_pairs(), vec![("author".to_string(), None)]);
        assert_eq!(
            Joins::from(["author", "comments"]).into_pairs(),
            vec![("author".to_string(), None), ("comments".to_string(), None)]
        );
        assert_eq!(
            Joins::from(vec![("author", JoinKind::Inner)]).into_pairs(),
            vec![("author".to_string(), Some(JoinKind::Inner))]
        );
    }

    #[test]
    fn test_joins_from_tokens() {
        let joins = Joins::try_from(vec![("author", "inner"), ("comments", "false")]).unwrap();
        assert_eq!(
            joins.into_pairs(),
            vec![
                ("author".to_string(), Some(JoinKind::Inner)),
                ("comments".to_string(), Some(JoinKind::Outer)),
            ]
        );
        assert!(matches!(
            Joins::try_from(vec![("author", "sideways")]),
            Err(DataBridgeError::JoinTypeInvalid(_))
        ));
    }

    #[test]
    fn test_select_op_tokens() {
        for token in ["include", "including", "also", "add", "+", "true"] {
            assert_eq!(token.parse::<SelectOp>().unwrap(), SelectOp::Include);
        }
        for token in ["exclude", "excluding", "except", "remove", "-", "false"] {
            assert_eq!(token.parse::<SelectOp>().unwrap(), SelectOp::Exclude);
        }
        for token in ["", "nil", "only", "default"] {
            assert_eq!(token.parse::<SelectOp>().unwrap(), SelectOp::Default);
        }
        assert!(matches!(
            "toggle".parse::<SelectOp>(),
            Err(DataBridgeError::SelectFieldOperationInvalid(_))
        ));
    }

    #[test]
    fn test_fields_into_pairs() {
        assert!(Fields::Default.into_pairs().is_empty());
        assert_eq!(
            Fields::from(vec![("title", SelectOp::Exclude)]).into_pairs(),
            vec![(Selector::from("title"), Some(SelectOp::Exclude))]
        );
        assert_eq!(
            Fields::from(Node::sql("COUNT(*)")).into_pairs(),
            vec![(Selector::Expr(Node::sql("COUNT(*)")), None)]
        );
    }

    #[test]
    fn test_fields_from_tokens() {
        let fields = Fields::try_from(vec![("title", "+"), ("body", "-")]).unwrap();
        assert_eq!(
            fields.into_pairs(),
            vec![
                (Selector::from("title"), Some(SelectOp::Include)),
                (Selector::from("body"), Some(SelectOp::Exclude)),
            ]
        );
        assert!(Fields::try_from(vec![("title", "flip")]).is_err());
    }
}
