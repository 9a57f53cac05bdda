//! Relation: the chainable builder that owns one query.
//!
//! A [`Relation`] wraps a [`SelectQuery`] for one model and exposes `join`,
//! `select` and `distinct`. Each call resolves associations through the
//! [`Registry`], mutates the query in place and hands back the same relation:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ouroboros_relation::{Registry, Relation};
//!
//! let registry = Arc::new(Registry::from_file("models.yaml")?);
//! let mut posts = Relation::new(registry, "Post")?;
//! posts.select(["title", "author"])?.join("comments")?;
//!
//! let query = posts.into_query();
//! // projections: posts.title, authors.name
//! // joins: authors (outer), comments (outer)
//! // distinct: true
//! ```
//!
//! `select` resolves three association hops deep and `join` one; the shallow
//! variants resolve only the named items.

mod args;
mod join;
mod select;


use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{JoinSource, Node, Projection, SelectQuery, TableAlias};
use crate::config::ResolverConfig;
use crate::model::{Model, Registry, Scope};
use crate::Result;

pub use args::{
    AliasOverride, Fields, JoinCallback, JoinContext, JoinOn, JoinOptions, Joins,
    SelectCallback, SelectOp, Selector,
};

/// Query builder for one model.
///
/// Not meant for concurrent mutation: keep one relation per call chain.
#[derive(Debug, Clone)]
pub struct Relation {
    registry: Arc<Registry>,
    model: Arc<Model>,
    query: SelectQuery,
    config: ResolverConfig,
    /// Association names leading from the root relation to this one.
    nesting: Vec<String>,
    /// Scopes keyed by nesting path, shared with nested relations.
    scopes: Arc<HashMap<String, Scope>>,
    includes: Vec<String>,
    /// Working selection left by the last select.
    selected: Vec<Selector>,
    select_issued: bool,
    /// Working selection is still exactly the model's default fields.
    default_untouched: bool,
    distinct_issued: bool,
}

impl Relation {
    /// Relation over `model`, read through the model's default alias.
    pub fn new(registry: Arc<Registry>, model: &str) -> Result<Self> {
        let model = Arc::clone(registry.model(model)?);
        let alias = model.table_alias().clone();
        Ok(Self::from_model(registry, model, alias))
    }

    /// Relation over `model`, read through `alias`.
    pub fn aliased(registry: Arc<Registry>, model: &str, alias: TableAlias) -> Result<Self> {
        let model = Arc::clone(registry.model(model)?);
        Ok(Self::from_model(registry, model, alias))
    }

    fn from_model(registry: Arc<Registry>, model: Arc<Model>, alias: TableAlias) -> Self {
        let scopes = Arc::new(model.scopes().clone());
        let includes = model.includes().to_vec();
        Self {
            registry,
            model,
            query: SelectQuery::new(alias),
            config: ResolverConfig::default(),
            nesting: Vec::new(),
            scopes,
            includes,
            selected: Vec::new(),
            select_issued: false,
            default_untouched: true,
            distinct_issued: false,
        }
    }

    /// Relation for the target of an association, one nesting level down.
    fn nested(&self, association: &str, model: Arc<Model>, alias: TableAlias) -> Self {
        let mut nesting = self.nesting.clone();
        nesting.push(association.to_string());
        let includes = model.includes().to_vec();
        Self {
            registry: Arc::clone(&self.registry),
            model,
            query: SelectQuery::new(alias),
            config: self.config.clone(),
            nesting,
            scopes: Arc::clone(&self.scopes),
            includes,
            selected: Vec::new(),
            select_issued: false,
            default_untouched: true,
            distinct_issued: false,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    /// Hand the assembled query off for rendering or execution.
    pub fn into_query(self) -> SelectQuery {
        self.query
    }

    pub fn projections(&self) -> &[Projection] {
        self.query.projections()
    }

    pub fn join_sources(&self) -> &[JoinSource] {
        self.query.join_sources()
    }

    pub fn constraints(&self) -> &[Node] {
        self.query.constraints()
    }

    /// Working selection left by the last select (empty before any select).
    pub fn selected(&self) -> &[Selector] {
        &self.selected
    }

    /// Dotted association path from the root relation (`""` at the root).
    pub fn nesting_path(&self) -> String {
        self.nesting.join(".")
    }

    /// Path under which the scope for `association` is registered.
    fn nest_association(&self, association: &str) -> String {
        if self.nesting.is_empty() {
            association.to_string()
        } else {
            format!("{}.{}", self.nesting_path(), association)
        }
    }

    /// Output label for `field` of this relation: the bare field name at the
    /// root, `alias.field` in a joined relation. Aliases are unique within a
    /// query, so labels are too.
    fn label(&self, field: &str) -> String {
        if self.nesting.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.query.source().name(), field)
        }
    }

    pub fn is_select(&self) -> bool {
        self.select_issued || !self.query.projections().is_empty()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct_issued || self.query.is_distinct()
    }

    /// Request DISTINCT. Once on it stays on; `distinct(false)` before any
    /// join only stops joins from turning it on.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct_issued = true;
        self.query.distinct(distinct);
        self
    }

    /// Register `scope` for the nested relation at `path`
    /// (e.g. `"author"` or `"author.company"`).
    pub fn scope(&mut self, path: &str, scope: Scope) -> &mut Self {
        Arc::make_mut(&mut self.scopes).insert(path.to_string(), scope);
        self
    }

    /// Apply `scope` to this relation's own constraints.
    pub fn apply_scope(&mut self, scope: &Scope) -> &mut Self {
        for constraint in scope.bind(self.query.source()) {
            self.query.add_constraint(constraint);
        }
        self
    }

    /// Add a constraint; `field` references bind to this relation's alias.
    pub fn where_clause(&mut self, node: Node) -> &mut Self {
        let bound = node.bind(self.query.source().name());
        self.query.add_constraint(bound);
        self
    }

    /// Mark associations for eager inclusion by the next top-level select.
    pub fn include<I, S>(&mut self, associations: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for association in associations {
            let name = association.as_ref();
            if !self.model.has_association(name) {
                return Err(crate::DataBridgeError::AssociationNotDefined(format!(
                    "{}.{}",
                    self.model.name(),
                    name
                )));
            }
            if !self.includes.iter().any(|i| i == name) {
                self.includes.push(name.to_string());
            }
        }
        Ok(self)
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }
}
