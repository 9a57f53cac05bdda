//! Join resolution.
//!
//! Turns association names into join sources on the relation's query. A join
//! whose alias is already present is a no-op, so repeated or overlapping join
//! calls never produce two sources with the same alias. Depth controls how
//! far the joined model's own default selection is pulled in: at depth 0 only
//! the named association is joined.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::ast::{validate_identifier, JoinKind, Node, TableAlias};
use crate::model::AssociationRef;
use crate::{DataBridgeError, Result};
use super::{
    AliasOverride, Fields, JoinCallback, JoinContext, JoinOn, JoinOptions, Joins, Relation,
    SelectOp,
};

impl Relation {
    /// Join `associations` with the configured default join type.
    ///
    /// Each joined model contributes its default fields; its own
    /// associations are not joined.
    pub fn join(&mut self, associations: impl Into<Joins>) -> Result<&mut Self> {
        let kind = self.config.default_join_kind;
        let depth = self.config.join_depth;
        self.deep_join(associations.into(), kind, depth, &JoinOptions::default(), None)
    }

    /// Join with an explicit join type and options.
    pub fn join_with(
        &mut self,
        associations: impl Into<Joins>,
        kind: JoinKind,
        options: &JoinOptions,
    ) -> Result<&mut Self> {
        let depth = self.config.join_depth;
        self.deep_join(associations.into(), kind, depth, options, None)
    }

    /// Join with a callback that adjusts each association's ON condition.
    ///
    /// ```rust,ignore
    /// posts.join_on("author", JoinKind::Inner, &JoinOptions::new(), |ctx| {
    ///     JoinOn::Extend(vec![Node::is_not_null(ctx.alias().attribute("name"))])
    /// })?;
    /// ```
    pub fn join_on<F>(
        &mut self,
        associations: impl Into<Joins>,
        kind: JoinKind,
        options: &JoinOptions,
        on: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&JoinContext<'_>) -> JoinOn,
    {
        let depth = self.config.join_depth;
        let on: &JoinCallback<'_> = &on;
        self.deep_join(associations.into(), kind, depth, options, Some(on))
    }

    /// Join only the named associations; nothing of the joined models is
    /// selected or joined.
    pub fn shallow_join(
        &mut self,
        associations: impl Into<Joins>,
        kind: JoinKind,
        options: &JoinOptions,
    ) -> Result<&mut Self> {
        self.deep_join(associations.into(), kind, 0, options, None)
    }

    pub(crate) fn deep_join(
        &mut self,
        associations: Joins,
        kind: JoinKind,
        depth: u32,
        options: &JoinOptions,
        on: Option<&JoinCallback<'_>>,
    ) -> Result<&mut Self> {
        for (association, association_kind) in associations.into_pairs() {
            self.deep_join_association(
                &association,
                association_kind.unwrap_or(kind),
                depth,
                options,
                on,
            )?;
        }
        Ok(self)
    }

    #[instrument(level = "debug", skip(self, options, on), fields(model = %self.model.name(), path = %self.nesting_path()))]
    pub(crate) fn deep_join_association(
        &mut self,
        association: &str,
        kind: JoinKind,
        depth: u32,
        options: &JoinOptions,
        on: Option<&JoinCallback<'_>>,
    ) -> Result<&mut Self> {
        let reference = self
            .model
            .association(association)
            .cloned()
            .ok_or_else(|| {
                DataBridgeError::AssociationNotDefined(format!("{}.{}", self.model.name(), association))
            })?;

        let table_alias = self.alias_for_join(&reference, options.alias.as_ref())?;
        if self.query.has_source(&table_alias) {
            trace!(alias = %table_alias.name(), "Join already satisfied");
            return Ok(self);
        }

        if self.config.distinct_on_join && !self.is_distinct() {
            self.distinct(true);
        }

        let through = self.model.through(association).cloned();
        let owner = match &through {
            Some(through) => {
                let through_options = JoinOptions {
                    alias: options.through.clone(),
                    ..JoinOptions::default()
                };
                self.deep_join_association(&through.name, kind, 0, &through_options, None)?;
                self.alias_for_join(through, options.through.as_ref())?
            }
            None => self.query.source().clone(),
        };

        let relation = self.scoped_relation(association, &reference, table_alias.clone(), depth)?;
        let node = self.node_for_join(
            association,
            &reference,
            through.as_ref(),
            &relation,
            owner.name(),
            options.on.as_ref(),
            on,
        )?;

        debug!(alias = %table_alias.name(), ?kind, on = %node, "Joining association");
        self.query.join(table_alias, kind).on(node);
        self.merge_join_sources(&relation);
        Ok(self)
    }

    fn alias_for_join(
        &self,
        reference: &AssociationRef,
        alias: Option<&AliasOverride>,
    ) -> Result<TableAlias> {
        match alias {
            None => Ok(reference.table_alias.clone()),
            Some(AliasOverride::Alias(alias)) => Ok(alias.clone()),
            Some(AliasOverride::Model(model)) => Ok(self.registry.model(model)?.table_alias().clone()),
            Some(AliasOverride::Name(name)) => {
                validate_identifier(name)?;
                Ok(reference.table_alias.alias(name))
            }
        }
    }

    /// Relation of the joined model under `alias`, with the scope registered
    /// for its nesting path applied and, above depth 0, its default fields
    /// selected.
    fn scoped_relation(
        &self,
        association: &str,
        reference: &AssociationRef,
        alias: TableAlias,
        depth: u32,
    ) -> Result<Relation> {
        let model = Arc::clone(self.registry.model(&reference.model)?);
        let mut relation = self.nested(association, model, alias);
        let path = self.nest_association(association);
        if let Some(scope) = self.scopes.get(&path) {
            trace!(path = %path, "Applying scope");
            relation.apply_scope(scope);
        }
        if depth > 0 {
            relation.deep_select(Fields::Default, SelectOp::Default, depth - 1, None)?;
        }
        Ok(relation)
    }

    #[allow(clippy::too_many_arguments)]
    fn node_for_join(
        &self,
        association: &str,
        reference: &AssociationRef,
        through: Option<&AssociationRef>,
        relation: &Relation,
        owner: &str,
        explicit: Option<&Node>,
        on: Option<&JoinCallback<'_>>,
    ) -> Result<Node> {
        let target = relation.query.source().name();
        let mut node = match explicit {
            Some(node) => node.bind(target),
            None => reference.condition(owner, target),
        };
        node = relation.constraints().iter().cloned().fold(node, Node::and);

        if let Some(on) = on {
            let context = JoinContext {
                condition: &node,
                association,
                reference,
                through,
                relation,
            };
            let result = on(&context);
            node = match result {
                JoinOn::Replace(replacement) => replacement,
                JoinOn::Extend(conditions) => conditions.into_iter().fold(node, Node::and),
            };
        }

        if !node.is_predicate() {
            return Err(DataBridgeError::JoinTypeInvalid(format!(
                "join condition for '{}' is not a predicate: {}",
                association, node
            )));
        }
        Ok(node)
    }

    /// Absorb joins and projections of a nested relation. Aliases are checked
    /// against the live join list, so a source joined moments earlier (the
    /// outer join itself, or one merged from a sibling) is never duplicated.
    /// Projections labelled for a skipped source are dropped with it.
    fn merge_join_sources(&mut self, relation: &Relation) -> &mut Self {
        let mut skipped = HashSet::new();
        for source in relation.join_sources() {
            if !self.query.merge_join_source(source) {
                trace!(alias = %source.alias.name(), "Skipping join already present");
                skipped.insert(source.alias.name());
            }
        }
        let projections = relation
            .projections()
            .iter()
            .filter(|p| {
                let source = p.name.as_deref().and_then(|n| n.split_once('.')).map(|(a, _)| a);
                !source.is_some_and(|a| skipped.contains(a))
            })
            .cloned();
        self.query.project(projections);
        self
    }
}
