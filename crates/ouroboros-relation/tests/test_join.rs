//! Join resolution against the blog schema loaded from YAML.

mod common;

use common::{aliases, labels, registry, relation};
use ouroboros_relation::{
    DataBridgeError, JoinKind, JoinOn, JoinOptions, Node, Relation, ResolverConfig, Scope,
};

#[test]
fn test_select_joins_aliased_author() {
    let mut posts = relation("Post");
    posts.select(["title", "author"]).unwrap();

    assert_eq!(labels(&posts), vec!["title", "authors.name", "authors.email"]);
    assert_eq!(
        posts.projections()[2].expr,
        Node::attribute("authors", "email_address")
    );
    assert_eq!(aliases(&posts), vec!["authors"]);
    assert_eq!(posts.join_sources()[0].kind, JoinKind::Outer);
    assert!(posts.query().is_distinct());
}

#[test]
fn test_join_renders_on_condition() {
    let mut posts = relation("Post");
    posts.join_with("author", JoinKind::Inner, &JoinOptions::new()).unwrap();

    assert_eq!(
        posts.join_sources()[0].to_string(),
        r#"INNER JOIN "members" "authors" ON "posts"."author_id" = "authors"."id""#
    );
}

#[test]
fn test_association_on_is_merged() {
    let mut posts = relation("Post");
    posts.join("tags").unwrap();

    assert_eq!(
        posts.join_sources()[0].on,
        Node::And(vec![
            Node::eq(Node::attribute("posts", "id"), Node::attribute("tags", "post_id")),
            Node::is_not_null(Node::attribute("tags", "label")),
        ])
    );
    assert_eq!(
        posts.projections()[1].expr,
        Node::function("LOWER", vec![Node::attribute("tags", "label")])
    );
}

#[test]
fn test_model_scope_and_include() {
    let mut members = relation("Member");
    members.select("name").unwrap();

    assert_eq!(aliases(&members), vec!["companies"]);
    assert_eq!(labels(&members), vec!["name", "companies.name"]);
    assert_eq!(
        members.join_sources()[0].on,
        Node::And(vec![
            Node::eq(Node::attribute("members", "company_id"), Node::attribute("companies", "id")),
            Node::eq(Node::attribute("companies", "active"), Node::literal(true)),
        ])
    );
}

#[test]
fn test_nested_scope_path() {
    let mut posts = Relation::new(registry(), "Post")
        .unwrap()
        .with_config(ResolverConfig::default().join_depth(4));
    posts.scope(
        "author.company",
        Scope::new(vec![Node::eq(Node::field("verified"), Node::literal(true))]),
    );
    posts.join("author").unwrap();

    assert_eq!(aliases(&posts), vec!["authors", "companies"]);
    assert_eq!(
        posts.join_sources()[1].on,
        Node::And(vec![
            Node::eq(Node::attribute("authors", "company_id"), Node::attribute("companies", "id")),
            Node::eq(Node::attribute("companies", "verified"), Node::literal(true)),
        ])
    );
    assert_eq!(
        labels(&posts),
        vec!["authors.name", "authors.email", "companies.name"]
    );
}

#[test]
fn test_nested_join_back_to_source_adds_no_columns() {
    let mut companies = Relation::new(registry(), "Company")
        .unwrap()
        .with_config(ResolverConfig::default().join_depth(4));
    companies.join("staff").unwrap();

    // Members include their company, which is the root source here.
    assert_eq!(aliases(&companies), vec!["members"]);
    assert_eq!(labels(&companies), vec!["members.name", "members.email"]);
}

#[test]
fn test_through_association_order() {
    let mut posts = relation("Post");
    posts.join("commenters").unwrap();

    assert_eq!(aliases(&posts), vec!["comments", "commenters"]);
    assert_eq!(labels(&posts), vec!["commenters.name", "commenters.email"]);
}

#[test]
fn test_repeated_joins_keep_aliases_unique() {
    let mut posts = relation("Post");
    posts.join(["author", "comments"]).unwrap();
    posts.join("commenters").unwrap();
    posts.select(["title", "author", "comments"]).unwrap();
    posts.join(["comments", "author", "commenters"]).unwrap();

    assert_eq!(aliases(&posts), vec!["authors", "comments", "commenters"]);
}

#[test]
fn test_cycle_between_models() {
    let mut comments = relation("Comment");
    comments.select(["body", "post"]).unwrap();

    assert_eq!(aliases(&comments), vec!["posts"]);
    assert_eq!(labels(&comments), vec!["body", "posts.title", "posts.body"]);
}

#[test]
fn test_callback_sees_joined_relation() {
    let mut posts = relation("Post");
    posts
        .join_on("author", JoinKind::Inner, &JoinOptions::new(), |ctx| {
            let model = ctx.relation.model().name().to_string();
            JoinOn::Extend(vec![Node::eq(
                ctx.alias().attribute("kind"),
                Node::literal(model.as_str()),
            )])
        })
        .unwrap();

    assert_eq!(
        posts.join_sources()[0].on,
        Node::And(vec![
            Node::eq(Node::attribute("posts", "author_id"), Node::attribute("authors", "id")),
            Node::eq(Node::attribute("authors", "kind"), Node::literal("Member")),
        ])
    );
}

#[test]
fn test_invalid_join_kind_token() {
    let result = "sideways".parse::<JoinKind>();
    assert!(matches!(result, Err(DataBridgeError::JoinTypeInvalid(_))));
}
