//! Shared fixtures for the relation integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ouroboros_relation::{Registry, Relation};

/// Blog schema: posts with an aliased author, comments, commenters reached
/// through comments, and tags with a computed slug. Authors belong to a
/// company, and only active companies are joined.
pub const BLOG_MODELS: &str = r#"
models:
  - name: Company
    table: companies
    fields:
      - name: name
    associations:
      - name: staff
        model: Member
        keys: { local: id, remote: company_id }

  - name: Member
    table: members
    fields:
      - name: name
      - name: email
        column: email_address
    associations:
      - name: company
        model: Company
        keys: { local: company_id, remote: id }
      - name: posts
        model: Post
        keys: { local: id, remote: author_id }
    scopes:
      company:
        constraints:
          - binary: { op: eq, left: { field: active }, right: { literal: true } }
    includes: [company]

  - name: Comment
    table: comments
    fields:
      - name: body
    associations:
      - name: post
        model: Post
        keys: { local: post_id, remote: id }

  - name: Tag
    table: tags
    fields:
      - name: label
      - name: slug
        expr:
          function: { name: LOWER, args: [ { field: label } ] }

  - name: Post
    table: posts
    fields:
      - name: title
      - name: body
    associations:
      - name: author
        model: Member
        alias: authors
        keys: { local: author_id, remote: id }
      - name: comments
        model: Comment
        keys: { local: id, remote: post_id }
      - name: commenters
        model: Member
        through: comments
        alias: commenters
        keys: { local: member_id, remote: id }
      - name: tags
        model: Tag
        keys: { local: id, remote: post_id }
        on:
          is_not_null: { field: label }
"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

pub fn registry() -> Arc<Registry> {
    init_tracing();
    Arc::new(Registry::from_yaml_str(BLOG_MODELS).unwrap())
}

pub fn relation(model: &str) -> Relation {
    Relation::new(registry(), model).unwrap()
}

/// Output labels of the relation's projections, in order.
pub fn labels(relation: &Relation) -> Vec<String> {
    relation
        .projections()
        .iter()
        .filter_map(|p| p.name.clone())
        .collect()
}

/// Aliases of the relation's join sources, in order.
pub fn aliases(relation: &Relation) -> Vec<String> {
    relation
        .join_sources()
        .iter()
        .map(|j| j.alias.name().to_string())
        .collect()
}
