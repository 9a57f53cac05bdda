//! Association-aware query composition for the ouroboros ORM.
//!
//! This crate builds one SELECT statement per [`Relation`] by walking the
//! association graph declared in a [`Registry`] of models:
//!
//! - **Join resolution**: association names become join sources, each alias
//!   joined at most once, through-associations joined before their target,
//!   scope constraints and caller conditions merged into the ON clause.
//! - **Field selection**: include/exclude/default operations against the
//!   model's default fields, with selected associations joined and their own
//!   default fields pulled in.
//!
//! Rendering and executing the query are left to the caller; the assembled
//! [`SelectQuery`] is handed off with [`Relation::into_query`].
//!
//! # Architecture
//!
//! ```text
//!   Relation (select / join / distinct)
//!        |             |
//!   select.rs  --->  join.rs          resolvers, depth-bounded recursion
//!        |             |
//!   Registry (models, associations, scopes)
//!        |
//!   SelectQuery (source, joins, projections, distinct, constraints)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ouroboros_relation::{Registry, Relation, JoinKind};
//!
//! let registry = Arc::new(Registry::from_yaml_str(MODELS)?);
//! let mut posts = Relation::new(Arc::clone(&registry), "Post")?;
//! posts.select(["title", "author"])?;
//!
//! assert_eq!(posts.join_sources().len(), 1);
//! assert!(posts.query().is_distinct());
//! ```
//!
//! # Thread Safety
//!
//! A `Relation` is a private builder for one call chain and is mutated
//! through `&mut self`. The `Registry` is immutable and shared via `Arc`.

/// Query AST: table aliases, expression nodes and the SELECT statement.
pub mod ast;

/// Resolver depths and defaults.
pub mod config;

/// Model definitions and the validated registry.
pub mod model;

/// The relation builder and its join and selection resolvers.
pub mod relation;

pub use ast::{JoinKind, JoinSource, Node, Operator, Projection, SelectQuery, TableAlias, Value};
pub use config::ResolverConfig;
pub use model::{
    AssociationDef, AssociationRef, FieldDef, JoinKeys, Model, ModelDef, Registry,
    RegistryBuilder, Scope,
};
pub use relation::{
    AliasOverride, Fields, JoinCallback, JoinContext, JoinOn, JoinOptions, Joins, Relation,
    SelectCallback, SelectOp, Selector,
};

pub use ouroboros_common::{DataBridgeError, Result};
