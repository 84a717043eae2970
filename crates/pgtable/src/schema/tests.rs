use super::*;
use crate::error::OrmError;
use std::sync::Arc;

fn groups() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::builder("groups")
            .namespace("demo")
            .field(Field::int("id"))
            .field(Field::string("name"))
            .build()
            .unwrap(),
    )
}

#[test]
fn test_select_columns_skip_hidden_fields() {
    let schema = TableSchema::builder("users")
        .field(Field::string("a"))
        .field(Field::string("b").no_select())
        .field(Field::string("c").column("c_col"))
        .build()
        .unwrap();
    assert_eq!(schema.select_columns(), r#""users"."a", "users"."c_col""#);
    assert_eq!(schema.column_count(), 2);
}

#[test]
fn test_qualified_names() {
    let plain = TableSchema::builder("users").build().unwrap();
    assert_eq!(plain.qualified_name(), r#""users""#);
    assert_eq!(plain.display_name(), "users");

    let ns = crate::Ident::new("public").unwrap();
    assert_eq!(plain.qualified_name_or(Some(&ns)), r#""public"."users""#);

    let groups = groups();
    assert_eq!(groups.qualified_name(), r#""demo"."groups""#);
    assert_eq!(groups.qualified_name_or(Some(&ns)), r#""demo"."groups""#);
    assert_eq!(groups.display_name(), "demo.groups");
    assert_eq!(groups.primary_key_ref(), r#""groups"."id""#);
}

#[test]
fn test_column_ref() {
    let schema = TableSchema::builder("users")
        .field(Field::string("email").column("email_address"))
        .build()
        .unwrap();
    assert_eq!(
        schema.column_ref("email").unwrap(),
        r#""users"."email_address""#
    );
    assert!(matches!(
        schema.column_ref("phone"),
        Err(OrmError::UnknownField { .. })
    ));
}

#[test]
fn test_joins_keep_declaration_order() {
    let roles = Arc::new(
        TableSchema::builder("roles")
            .field(Field::string("name"))
            .build()
            .unwrap(),
    );
    let schema = TableSchema::builder("users")
        .field(Field::int("group_id"))
        .field(Field::int("role_id").column("role"))
        .join("group", groups(), "group_id")
        .join("role", roles, "role_id")
        .build()
        .unwrap();
    let names: Vec<_> = schema.joins().iter().map(|j| j.name()).collect();
    assert_eq!(names, ["group", "role"]);
    let role = schema.join("role").unwrap();
    assert_eq!(role.field(), "role_id");
    assert_eq!(role.column().as_str(), "role");
    assert_eq!(role.table().name().as_str(), "roles");
}

#[test]
fn test_field_for_constraint() {
    let schema = TableSchema::builder("users")
        .field(Field::string("username"))
        .field(Field::string("email").column("mail"))
        .unique_constraint("users_login_key", "username")
        .build()
        .unwrap();
    assert_eq!(schema.field_for_constraint("users_login_key"), Some("username"));
    assert_eq!(
        schema.field_for_constraint("users_unique_username_index"),
        Some("username")
    );
    assert_eq!(schema.field_for_constraint("users_unique_mail_index"), Some("email"));
    assert_eq!(schema.field_for_constraint("users_unique_phone_index"), None);
    assert_eq!(schema.field_for_constraint("orders_pkey"), None);
}

#[test]
fn test_duplicate_field_rejected() {
    let err = TableSchema::builder("users")
        .field(Field::string("name"))
        .field(Field::int("name"))
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)));
}

#[test]
fn test_invalid_identifiers_rejected() {
    assert!(TableSchema::builder("users; drop").build().is_err());
    assert!(
        TableSchema::builder("users")
            .field(Field::string("name").column("na\"me"))
            .build()
            .is_err()
    );
    assert!(
        TableSchema::builder("users")
            .field(Field::string("a.b"))
            .build()
            .is_err()
    );
}

#[test]
fn test_bad_joins_rejected() {
    let unknown_fk = TableSchema::builder("users")
        .field(Field::int("group_id"))
        .join("group", groups(), "team_id")
        .build();
    assert!(matches!(unknown_fk, Err(OrmError::Schema(_))));

    let collides = TableSchema::builder("users")
        .field(Field::int("group_id"))
        .join("group_id", groups(), "group_id")
        .build();
    assert!(matches!(collides, Err(OrmError::Schema(_))));

    let twice = TableSchema::builder("users")
        .field(Field::int("group_id"))
        .join("group", groups(), "group_id")
        .join("group", groups(), "group_id")
        .build();
    assert!(matches!(twice, Err(OrmError::Schema(_))));
}

#[test]
fn test_keys_only_for_json() {
    let err = TableSchema::builder("posts")
        .field(Field::string("title").keys(["en"]))
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)));

    let schema = TableSchema::builder("posts")
        .field(Field::json("title").keys(["en", "de"]))
        .build()
        .unwrap();
    assert_eq!(schema.field("title").unwrap().keys(), Some(&["en".to_string(), "de".to_string()][..]));
}

#[test]
fn test_unique_constraint_needs_known_field() {
    let err = TableSchema::builder("users")
        .unique_constraint("users_email_key", "email")
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)));
}

#[test]
fn test_schema_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TableSchema>();
    assert_send_sync::<FieldSchema>();
}
