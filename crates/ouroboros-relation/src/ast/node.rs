//! Expression and predicate nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::helpers::quote_identifier;

/// A literal value embedded in an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE pattern matching
    Like,
}

impl Operator {
    /// Returns the SQL operator string.
    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
        }
    }
}

/// Expression tree used for projections, join conditions and constraints.
///
/// `Field` is an unbound column reference: it names a column of "the current
/// source" and is turned into an `Attribute` by [`Node::bind`] once the alias
/// it is evaluated against is known. Model definitions use it for computed
/// fields, scopes and extra join conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Always-true condition; the identity for `and`.
    Empty,
    /// Column of a named source.
    Attribute { relation: String, name: String },
    /// Column of the source the node is bound to.
    Field(String),
    Literal(Value),
    /// Raw SQL, passed through untouched.
    SqlLiteral(String),
    Binary {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
    IsNull(Box<Node>),
    IsNotNull(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
    Grouping(Box<Node>),
    Function { name: String, args: Vec<Node> },
}

impl Node {
    pub fn attribute(relation: &str, name: &str) -> Self {
        Node::Attribute {
            relation: relation.to_string(),
            name: name.to_string(),
        }
    }

    pub fn field(name: &str) -> Self {
        Node::Field(name.to_string())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal(value.into())
    }

    pub fn sql(raw: &str) -> Self {
        Node::SqlLiteral(raw.to_string())
    }

    pub fn binary(op: Operator, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Node, right: Node) -> Self {
        Self::binary(Operator::Eq, left, right)
    }

    pub fn is_not_null(node: Node) -> Self {
        Node::IsNotNull(Box::new(node))
    }

    pub fn function(name: &str, args: Vec<Node>) -> Self {
        Node::Function {
            name: name.to_string(),
            args,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Conjunction of `self` and `other`.
    ///
    /// `Empty` on either side yields the other side unchanged, and nested
    /// conjunctions are flattened so repeated `and` calls build one list.
    pub fn and(self, other: Node) -> Node {
        match (self, other) {
            (Node::Empty, other) => other,
            (node, Node::Empty) => node,
            (Node::And(mut left), Node::And(right)) => {
                left.extend(right);
                Node::And(left)
            }
            (Node::And(mut left), right) => {
                left.push(right);
                Node::And(left)
            }
            (left, right) => Node::And(vec![left, right]),
        }
    }

    /// Disjunction of `self` and `other`.
    pub fn or(self, other: Node) -> Node {
        match (self, other) {
            (Node::Or(mut left), right) => {
                left.push(right);
                Node::Or(left)
            }
            (left, right) => Node::Or(vec![left, right]),
        }
    }

    /// True when the node evaluates to a boolean and can stand as a join
    /// condition or constraint.
    pub fn is_predicate(&self) -> bool {
        match self {
            Node::Empty
            | Node::SqlLiteral(_)
            | Node::Binary { .. }
            | Node::IsNull(_)
            | Node::IsNotNull(_)
            | Node::Not(_) => true,
            Node::Literal(Value::Bool(_)) => true,
            Node::And(nodes) | Node::Or(nodes) => nodes.iter().all(Node::is_predicate),
            Node::Grouping(inner) => inner.is_predicate(),
            Node::Attribute { .. } | Node::Field(_) | Node::Literal(_) | Node::Function { .. } => false,
        }
    }

    /// Resolve every `Field` reference against the source `relation`.
    pub fn bind(&self, relation: &str) -> Node {
        match self {
            Node::Field(name) => Node::attribute(relation, name),
            Node::Binary { op, left, right } => Node::Binary {
                op: *op,
                left: Box::new(left.bind(relation)),
                right: Box::new(right.bind(relation)),
            },
            Node::IsNull(inner) => Node::IsNull(Box::new(inner.bind(relation))),
            Node::IsNotNull(inner) => Node::IsNotNull(Box::new(inner.bind(relation))),
            Node::Not(inner) => Node::Not(Box::new(inner.bind(relation))),
            Node::Grouping(inner) => Node::Grouping(Box::new(inner.bind(relation))),
            Node::And(nodes) => Node::And(nodes.iter().map(|n| n.bind(relation)).collect()),
            Node::Or(nodes) => Node::Or(nodes.iter().map(|n| n.bind(relation)).collect()),
            Node::Function { name, args } => Node::Function {
                name: name.clone(),
                args: args.iter().map(|n| n.bind(relation)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => write!(f, "TRUE"),
            Node::Attribute { relation, name } => {
                write!(f, "{}.{}", quote_identifier(relation), quote_identifier(name))
            }
            Node::Field(name) => write!(f, "{}", quote_identifier(name)),
            Node::Literal(value) => write!(f, "{}", value),
            Node::SqlLiteral(raw) => write!(f, "{}", raw),
            Node::Binary { op, left, right } => write!(f, "{} {} {}", left, op.to_sql(), right),
            Node::IsNull(inner) => write!(f, "{} IS NULL", inner),
            Node::IsNotNull(inner) => write!(f, "{} IS NOT NULL", inner),
            Node::And(nodes) => write_joined(f, nodes, " AND "),
            Node::Or(nodes) => {
                write!(f, "(")?;
                write_joined(f, nodes, " OR ")?;
                write!(f, ")")
            }
            Node::Not(inner) => write!(f, "NOT ({})", inner),
            Node::Grouping(inner) => write!(f, "({})", inner),
            Node::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node], separator: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", node)?;
    }
    Ok(())
}
