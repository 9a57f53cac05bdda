//! Validated model registry.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::ast::{validate_identifier, TableAlias};
use crate::{DataBridgeError, Result};
use super::types::{AssociationRef, FieldDef, ModelDef, RegistryDef, Scope};

/// A model whose fields and associations have been checked and whose
/// association aliases are resolved.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    table_alias: TableAlias,
    fields: Vec<FieldDef>,
    field_index: HashMap<String, usize>,
    associations: HashMap<String, AssociationRef>,
    association_order: Vec<String>,
    scopes: HashMap<String, Scope>,
    includes: Vec<String>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default alias the model is queried under.
    pub fn table_alias(&self) -> &TableAlias {
        &self.table_alias
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    pub fn associations(&self) -> &HashMap<String, AssociationRef> {
        &self.associations
    }

    /// Association names in declaration order.
    pub fn association_names(&self) -> &[String] {
        &self.association_order
    }

    pub fn association(&self, name: &str) -> Option<&AssociationRef> {
        self.associations.get(name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.contains_key(name)
    }

    /// Association name → name of the association it goes through.
    pub fn through_associations(&self) -> HashMap<&str, &str> {
        self.associations
            .values()
            .filter_map(|a| a.through.as_deref().map(|t| (a.name.as_str(), t)))
            .collect()
    }

    /// The intermediate association `name` is reached through, if any.
    pub fn through(&self, name: &str) -> Option<&AssociationRef> {
        self.associations
            .get(name)
            .and_then(|a| a.through.as_deref())
            .and_then(|t| self.associations.get(t))
    }

    pub fn scopes(&self) -> &HashMap<String, Scope> {
        &self.scopes
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }
}

/// All models known to the composition layer, keyed by name.
///
/// Built once; relations share it through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: HashMap<String, Arc<Model>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Validate `defs` and build the registry.
    #[instrument(skip(defs), fields(models = defs.len()))]
    pub fn from_defs(defs: Vec<ModelDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &defs {
            if !seen.insert(def.name.as_str()) {
                return Err(DataBridgeError::Validation(format!(
                    "Model '{}' is defined more than once",
                    def.name
                )));
            }
            validate_identifier(&def.table)?;
            if let Some(alias) = &def.alias {
                validate_identifier(alias)?;
            }
        }

        let aliases: HashMap<&str, TableAlias> = defs
            .iter()
            .map(|d| (d.name.as_str(), d.table_alias()))
            .collect();

        let mut models = HashMap::with_capacity(defs.len());
        for def in &defs {
            let model = Self::build_model(def, &aliases)?;
            debug!(
                model = %model.name,
                fields = model.fields.len(),
                associations = model.associations.len(),
                "Registered model"
            );
            models.insert(def.name.clone(), Arc::new(model));
        }

        Ok(Self { models })
    }

    /// Parse and validate a YAML document with a top-level `models` list.
    ///
    /// Expression nodes are written as single-key maps
    /// (`is_not_null: { field: label }`) rather than YAML tags.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let def: RegistryDef =
            serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))?;
        Self::from_defs(def.models)
    }

    /// Parse and validate a JSON document with a top-level `models` list.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let def: RegistryDef = serde_json::from_str(json)?;
        Self::from_defs(def.models)
    }

    /// Load a registry document; `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.get(name)
    }

    pub fn model(&self, name: &str) -> Result<&Arc<Model>> {
        self.models
            .get(name)
            .ok_or_else(|| DataBridgeError::ModelNotDefined(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn build_model(def: &ModelDef, aliases: &HashMap<&str, TableAlias>) -> Result<Model> {
        let invalid = |msg: String| DataBridgeError::Validation(format!("Model '{}': {}", def.name, msg));

        let mut field_index = HashMap::with_capacity(def.fields.len());
        for (i, field) in def.fields.iter().enumerate() {
            if field.expr.is_none() {
                validate_identifier(field.column_name())?;
            }
            if field_index.insert(field.name.clone(), i).is_some() {
                return Err(invalid(format!("field '{}' is declared twice", field.name)));
            }
        }

        let mut associations = HashMap::with_capacity(def.associations.len());
        let mut association_order = Vec::with_capacity(def.associations.len());
        for assoc in &def.associations {
            if field_index.contains_key(&assoc.name) {
                return Err(invalid(format!(
                    "association '{}' shadows a field of the same name",
                    assoc.name
                )));
            }
            let target = aliases.get(assoc.model.as_str()).ok_or_else(|| {
                invalid(format!(
                    "association '{}' targets unknown model '{}'",
                    assoc.name, assoc.model
                ))
            })?;
            if let Some(alias) = &assoc.alias {
                validate_identifier(alias)?;
            }
            if let Some(keys) = &assoc.keys {
                validate_identifier(&keys.local)?;
                validate_identifier(&keys.remote)?;
            }
            let reference = AssociationRef::resolve(assoc, target);
            if associations.insert(assoc.name.clone(), reference).is_some() {
                return Err(invalid(format!("association '{}' is declared twice", assoc.name)));
            }
            association_order.push(assoc.name.clone());
        }

        // Through chains must name associations of this model and end.
        for name in &association_order {
            let mut visited = HashSet::new();
            let mut current = name.as_str();
            while let Some(through) = associations.get(current).and_then(|a| a.through.as_deref()) {
                if !associations.contains_key(through) {
                    return Err(invalid(format!(
                        "association '{}' goes through unknown association '{}'",
                        current, through
                    )));
                }
                if !visited.insert(current) {
                    return Err(invalid(format!(
                        "association '{}' has a cyclic through chain",
                        name
                    )));
                }
                current = through;
            }
        }

        for include in &def.includes {
            if !associations.contains_key(include) {
                return Err(invalid(format!(
                    "include '{}' is not an association",
                    include
                )));
            }
        }

        Ok(Model {
            name: def.name.clone(),
            table_alias: def.table_alias(),
            fields: def.fields.clone(),
            field_index,
            associations,
            association_order,
            scopes: def.scopes.clone(),
            includes: def.includes.clone(),
        })
    }
}

/// Collects model definitions before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<ModelDef>,
}

impl RegistryBuilder {
    pub fn model(mut self, def: ModelDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<Registry> {
        Registry::from_defs(self.defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::model::AssociationDef;

    fn user() -> ModelDef {
        ModelDef::new("User", "users").field("name")
    }

    #[test]
    fn test_build_resolves_association_alias() {
        let registry = Registry::builder()
            .model(user())
            .model(
                ModelDef::new("Post", "posts")
                    .field("title")
                    .association(AssociationDef::new("author", "User").alias("authors").keys("author_id", "id")),
            )
            .build()
            .unwrap();

        let post = registry.model("Post").unwrap();
        let author = post.association("author").unwrap();
        assert_eq!(author.table_alias.name(), "authors");
        assert_eq!(author.table_alias.table_name(), "users");
        assert_eq!(post.field_names(), vec!["title"]);
        assert_eq!(post.table_alias().name(), "posts");
    }

    #[test]
    fn test_unknown_model_lookup() {
        let registry = Registry::builder().model(user()).build().unwrap();
        assert!(matches!(registry.model("Post"), Err(DataBridgeError::ModelNotDefined(_))));
    }

    #[test]
    fn test_rejects_dangling_target() {
        let result = Registry::builder()
            .model(ModelDef::new("Post", "posts").association(AssociationDef::new("author", "User")))
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let result = Registry::builder()
            .model(ModelDef::new("User", "users").field("name").field("name"))
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_association_shadowing_field() {
        let result = Registry::builder()
            .model(user())
            .model(
                ModelDef::new("Post", "posts")
                    .field("author")
                    .association(AssociationDef::new("author", "User")),
            )
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_unknown_through() {
        let result = Registry::builder()
            .model(user())
            .model(ModelDef::new("Post", "posts").association(AssociationDef::new("fans", "User").through("likes")))
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_cyclic_through() {
        let result = Registry::builder()
            .model(user())
            .model(
                ModelDef::new("Post", "posts")
                    .association(AssociationDef::new("a", "User").through("b"))
                    .association(AssociationDef::new("b", "User").through("a")),
            )
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_include_of_unknown_association() {
        let result = Registry::builder()
            .model(ModelDef::new("Post", "posts").field("title").include("title"))
            .build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_invalid_table_name() {
        let result = Registry::builder().model(ModelDef::new("Post", "posts; drop")).build();
        assert!(matches!(result, Err(DataBridgeError::Validation(_))));
    }

    #[test]
    fn test_yaml_expression_nodes() {
        let yaml = r#"
models:
  - name: Tag
    table: tags
    fields:
      - name: label
      - name: slug
        expr:
          function: { name: LOWER, args: [ { field: label } ] }
    scopes:
      owner:
        constraints:
          - binary: { op: eq, left: { field: active }, right: { literal: true } }
    associations:
      - name: owner
        model: Tag
        keys: { local: owner_id, remote: id }
        on:
          is_not_null: { field: label }
"#;
        let registry = Registry::from_yaml_str(yaml).unwrap();
        let tag = registry.model("Tag").unwrap();

        assert_eq!(
            tag.field("slug").unwrap().expr,
            Some(Node::function("LOWER", vec![Node::field("label")]))
        );
        assert_eq!(
            tag.scopes()["owner"].constraints,
            vec![Node::eq(Node::field("active"), Node::literal(true))]
        );
        assert_eq!(
            tag.association("owner").unwrap().on,
            Some(Node::is_not_null(Node::field("label")))
        );
    }

    #[test]
    fn test_through_associations() {
        let registry = Registry::builder()
            .model(user())
            .model(
                ModelDef::new("Comment", "comments")
                    .field("body"),
            )
            .model(
                ModelDef::new("Post", "posts")
                    .association(AssociationDef::new("comments", "Comment").keys("id", "post_id"))
                    .association(
                        AssociationDef::new("commenters", "User")
                            .through("comments")
                            .alias("commenters")
                            .keys("user_id", "id"),
                    ),
            )
            .build()
            .unwrap();

        let post = registry.model("Post").unwrap();
        let through = post.through_associations();
        assert_eq!(through.get("commenters"), Some(&"comments"));
        assert_eq!(through.len(), 1);
        assert_eq!(post.through("commenters").map(|a| a.name.as_str()), Some("comments"));
        assert!(post.through("comments").is_none());
        assert_eq!(post.association_names(), &["comments".to_string(), "commenters".to_string()]);
    }
}
