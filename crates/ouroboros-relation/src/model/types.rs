//! Model definition types.
//!
//! These are the serde-facing descriptions of models, fields, associations
//! and scopes. [`Registry`](super::Registry) validates them once and resolves
//! association aliases.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Node, TableAlias};

/// A declared field: a table column or a computed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Column name; defaults to the field name.
    #[serde(default)]
    pub column: Option<String>,
    /// Computed expression; `field` references bind to the model's alias.
    #[serde(default)]
    pub expr: Option<Node>,
}

impl FieldDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column: None,
            expr: None,
        }
    }

    /// Field stored in a column with a different name.
    pub fn column(name: &str, column: &str) -> Self {
        Self {
            column: Some(column.to_string()),
            ..Self::new(name)
        }
    }

    pub fn computed(name: &str, expr: Node) -> Self {
        Self {
            expr: Some(expr),
            ..Self::new(name)
        }
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Projection expression for this field read through `alias`.
    pub fn expression(&self, alias: &TableAlias) -> Node {
        match &self.expr {
            Some(expr) => expr.bind(alias.name()),
            None => alias.attribute(self.column_name()),
        }
    }
}

/// Column pair linking the owner side of an association to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKeys {
    /// Column on the owner (or through) source.
    pub local: String,
    /// Column on the target source.
    pub remote: String,
}

/// Association as written in a model definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationDef {
    pub name: String,
    /// Target model name.
    pub model: String,
    /// Association of the same model that must be joined first.
    #[serde(default)]
    pub through: Option<String>,
    /// Alias name; defaults to the target model's alias.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub keys: Option<JoinKeys>,
    /// Extra join condition; `field` references bind to the target alias.
    #[serde(default)]
    pub on: Option<Node>,
}

impl AssociationDef {
    pub fn new(name: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            through: None,
            alias: None,
            keys: None,
            on: None,
        }
    }

    pub fn keys(mut self, local: &str, remote: &str) -> Self {
        self.keys = Some(JoinKeys {
            local: local.to_string(),
            remote: remote.to_string(),
        });
        self
    }

    pub fn through(mut self, association: &str) -> Self {
        self.through = Some(association.to_string());
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn on(mut self, on: Node) -> Self {
        self.on = Some(on);
        self
    }
}

/// Resolved association: the definition plus the alias it joins under.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRef {
    pub name: String,
    pub model: String,
    pub through: Option<String>,
    pub table_alias: TableAlias,
    pub keys: Option<JoinKeys>,
    pub on: Option<Node>,
}

impl AssociationRef {
    pub(crate) fn resolve(def: &AssociationDef, target_alias: &TableAlias) -> Self {
        let table_alias = match &def.alias {
            Some(alias) => target_alias.alias(alias),
            None => target_alias.clone(),
        };
        Self {
            name: def.name.clone(),
            model: def.model.clone(),
            through: def.through.clone(),
            table_alias,
            keys: def.keys.clone(),
            on: def.on.clone(),
        }
    }

    /// Registered join condition between `owner` and `target`.
    ///
    /// Join keys compare the owner's `local` column with the target's
    /// `remote` column; an extra `on` node is bound to the target and ANDed
    /// on. Without either, the condition is `Empty`.
    pub fn condition(&self, owner: &str, target: &str) -> Node {
        let mut node = Node::Empty;
        if let Some(keys) = &self.keys {
            node = node.and(Node::eq(
                Node::attribute(owner, &keys.local),
                Node::attribute(target, &keys.remote),
            ));
        }
        if let Some(on) = &self.on {
            node = node.and(on.bind(target));
        }
        node
    }
}

/// Named restriction applied to a nested relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    /// Predicates; `field` references bind to the scoped relation's alias.
    #[serde(default)]
    pub constraints: Vec<Node>,
}

impl Scope {
    pub fn new(constraints: Vec<Node>) -> Self {
        Self { constraints }
    }

    /// Constraints bound to `alias`.
    pub fn bind(&self, alias: &TableAlias) -> Vec<Node> {
        self.constraints.iter().map(|c| c.bind(alias.name())).collect()
    }
}

/// Model as written in a definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub name: String,
    pub table: String,
    /// Default alias; defaults to the table name.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub associations: Vec<AssociationDef>,
    /// Scopes keyed by nesting path (`author`, `author.company`).
    #[serde(default)]
    pub scopes: HashMap<String, Scope>,
    /// Associations eagerly joined by a top-level select.
    #[serde(default)]
    pub includes: Vec<String>,
}

impl ModelDef {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            alias: None,
            fields: Vec::new(),
            associations: Vec::new(),
            scopes: HashMap::new(),
            includes: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(FieldDef::new(name));
        self
    }

    pub fn field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn association(mut self, association: AssociationDef) -> Self {
        self.associations.push(association);
        self
    }

    pub fn scope(mut self, path: &str, scope: Scope) -> Self {
        self.scopes.insert(path.to_string(), scope);
        self
    }

    pub fn include(mut self, association: &str) -> Self {
        self.includes.push(association.to_string());
        self
    }

    pub(crate) fn table_alias(&self) -> TableAlias {
        match &self.alias {
            Some(alias) => TableAlias::new(&self.table, alias),
            None => TableAlias::table(&self.table),
        }
    }
}

/// Top-level shape of a registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDef {
    #[serde(default)]
    pub models: Vec<ModelDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_expression_uses_column() {
        let alias = TableAlias::new("users", "authors");
        assert_eq!(FieldDef::new("name").expression(&alias), Node::attribute("authors", "name"));
        assert_eq!(
            FieldDef::column("email", "email_address").expression(&alias),
            Node::attribute("authors", "email_address")
        );
    }

    #[test]
    fn test_computed_field_binds_to_alias() {
        let field = FieldDef::computed("lower_name", Node::function("LOWER", vec![Node::field("name")]));
        assert_eq!(
            field.expression(&TableAlias::new("users", "authors")),
            Node::function("LOWER", vec![Node::attribute("authors", "name")])
        );
    }

    #[test]
    fn test_association_condition() {
        let def = AssociationDef::new("author", "User")
            .keys("author_id", "id")
            .on(Node::is_not_null(Node::field("name")));
        let reference = AssociationRef::resolve(&def, &TableAlias::table("users"));
        assert_eq!(
            reference.condition("posts", "users"),
            Node::And(vec![
                Node::eq(Node::attribute("posts", "author_id"), Node::attribute("users", "id")),
                Node::is_not_null(Node::attribute("users", "name")),
            ])
        );
    }

    #[test]
    fn test_association_without_condition_is_empty() {
        let reference = AssociationRef::resolve(
            &AssociationDef::new("tags", "Tag"),
            &TableAlias::table("tags"),
        );
        assert!(reference.condition("posts", "tags").is_empty());
    }

    #[test]
    fn test_association_alias_override() {
        let def = AssociationDef::new("author", "User").alias("authors");
        let reference = AssociationRef::resolve(&def, &TableAlias::table("users"));
        assert_eq!(reference.table_alias.name(), "authors");
        assert_eq!(reference.table_alias.table_name(), "users");
    }
}
