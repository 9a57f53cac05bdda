//! Field selection.
//!
//! A select call computes a working selection from the model's default
//! fields (or from the previous selection, once one has been made), projects
//! what became selected, retracts what was excluded, and joins every selected
//! association one level shallower than the call itself.

use tracing::{debug, instrument};

use crate::ast::{JoinKind, Node, Projection, TableAlias};
use crate::{DataBridgeError, Result};
use super::{Fields, JoinOptions, Relation, SelectCallback, SelectOp, Selector};

impl Relation {
    /// Select `fields` with the default operation, three association hops
    /// deep.
    ///
    /// On a fresh relation the first default-operation field replaces the
    /// model's default selection; later fields, and later calls, add to it.
    pub fn select(&mut self, fields: impl Into<Fields>) -> Result<&mut Self> {
        let depth = self.config.select_depth;
        self.deep_select(fields.into(), SelectOp::Default, depth, None)
    }

    /// Select `fields` applying `op` to every field that does not carry its
    /// own operation.
    pub fn select_with(&mut self, fields: impl Into<Fields>, op: SelectOp) -> Result<&mut Self> {
        let depth = self.config.select_depth;
        self.deep_select(fields.into(), op, depth, None)
    }

    /// Select with a callback that may supply the projected expression for a
    /// field.
    pub fn select_using<F>(&mut self, fields: impl Into<Fields>, op: SelectOp, projection: F) -> Result<&mut Self>
    where
        F: Fn(&str, &TableAlias) -> Option<Node>,
    {
        let depth = self.config.select_depth;
        let projection: &SelectCallback<'_> = &projection;
        self.deep_select(fields.into(), op, depth, Some(projection))
    }

    /// Select without joining any selected association.
    pub fn shallow_select(&mut self, fields: impl Into<Fields>, op: SelectOp) -> Result<&mut Self> {
        self.deep_select(fields.into(), op, 0, None)
    }

    #[instrument(level = "debug", skip(self, fields, callback), fields(model = %self.model.name(), path = %self.nesting_path()))]
    pub(crate) fn deep_select(
        &mut self,
        fields: Fields,
        op: SelectOp,
        depth: u32,
        callback: Option<&SelectCallback<'_>>,
    ) -> Result<&mut Self> {
        let (working, untouched) = self.fields_for_select(fields, op)?;
        let rest: Vec<Selector> = working
            .iter()
            .filter(|s| !self.is_include(s))
            .cloned()
            .collect();
        let previous: Vec<Selector> = if self.select_issued {
            self.selected
                .iter()
                .filter(|s| !self.is_include(s))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        for selector in previous.iter().filter(|s| !rest.contains(s)) {
            self.retract(selector);
        }
        let projections: Vec<Projection> = rest
            .iter()
            .filter(|s| !previous.contains(s))
            .filter_map(|s| self.projection_for(s, callback))
            .collect();
        debug!(projected = projections.len(), selected = working.len(), "Selecting fields");
        self.query.project(projections);
        self.selected = working;
        self.select_issued = true;
        self.default_untouched = untouched;

        if depth > 0 {
            if depth == self.config.select_depth {
                for include in self.includes.clone() {
                    self.including(&include)?;
                }
            }
            let associations: Vec<String> = rest
                .iter()
                .filter_map(Selector::name)
                .filter(|name| self.model.has_association(name))
                .map(String::from)
                .collect();
            for association in associations {
                self.deep_join_association(
                    &association,
                    JoinKind::Outer,
                    depth - 1,
                    &JoinOptions::default(),
                    None,
                )?;
            }
        }
        Ok(self)
    }

    /// Working selection after applying `fields`, and whether it is still
    /// the unmodified default selection.
    ///
    /// Every named selector is checked before anything is applied, so an
    /// unknown name leaves the relation untouched.
    pub(crate) fn fields_for_select(&self, fields: Fields, op: SelectOp) -> Result<(Vec<Selector>, bool)> {
        let mut selected: Vec<Selector> = if self.select_issued {
            self.selected.clone()
        } else {
            self.model
                .fields()
                .iter()
                .map(|f| Selector::Name(f.name.clone()))
                .collect()
        };
        let mut untouched = self.default_untouched;

        let pairs = fields.into_pairs();
        for (selector, _) in &pairs {
            if let Selector::Name(name) = selector {
                if !self.model.has_field(name) && !self.model.has_association(name) {
                    return Err(DataBridgeError::FieldNotDefined(format!(
                        "{}.{}",
                        self.model.name(),
                        name
                    )));
                }
            }
        }
        for (selector, field_op) in pairs {
            select_field_for_operation(&mut selected, &mut untouched, selector, field_op.unwrap_or(op));
        }
        Ok((selected, untouched))
    }

    fn is_include(&self, selector: &Selector) -> bool {
        selector
            .name()
            .is_some_and(|name| self.includes.iter().any(|i| i == name))
    }

    fn projection_for(&self, selector: &Selector, callback: Option<&SelectCallback<'_>>) -> Option<Projection> {
        let alias = self.query.source();
        match selector {
            Selector::Expr(expr) => Some(Projection::new(expr.bind(alias.name()), None)),
            Selector::Name(name) => {
                // Associations project nothing themselves; joining them does.
                let field = self.model.field(name)?;
                let expr = callback
                    .and_then(|cb| cb(name, alias))
                    .unwrap_or_else(|| field.expression(alias));
                Some(Projection::named(expr, &self.label(name)))
            }
        }
    }

    fn retract(&mut self, selector: &Selector) {
        match selector {
            Selector::Name(name) => {
                if self.model.has_field(name) {
                    let label = self.label(name);
                    self.query.retract(&label);
                }
            }
            Selector::Expr(expr) => {
                let bound = expr.bind(self.query.source().name());
                self.query.retract_expr(&bound);
            }
        }
    }

    /// Join an eagerly included association at the default join depth.
    fn including(&mut self, association: &str) -> Result<&mut Self> {
        let kind = self.config.default_join_kind;
        let depth = self.config.join_depth;
        self.deep_join_association(association, kind, depth, &JoinOptions::default(), None)
    }
}

/// Apply one operation. The first default-op field replaces the default
/// selection only while nothing has modified it yet; any operation ends that.
fn select_field_for_operation(
    selected: &mut Vec<Selector>,
    untouched: &mut bool,
    selector: Selector,
    op: SelectOp,
) {
    match op {
        SelectOp::Include => add_selector(selected, selector),
        SelectOp::Exclude => selected.retain(|s| *s != selector),
        SelectOp::Default => {
            if *untouched {
                selected.clear();
            }
            add_selector(selected, selector);
        }
    }
    *untouched = false;
}

fn add_selector(selected: &mut Vec<Selector>, selector: Selector) {
    if !selected.contains(&selector) {
        selected.push(selector);
    }
}
