use super::*;
use crate::clause::OrderRequest;
use crate::schema::Field;
use serde_json::json;

fn groups() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::builder("groups")
            .field(Field::int("id"))
            .field(Field::string("name"))
            .build()
            .unwrap(),
    )
}

fn users() -> Repository {
    let schema = TableSchema::builder("users")
        .field(Field::int("id").no_insert().no_update())
        .field(Field::string("username"))
        .field(Field::string("password").no_select().encoder(|p| format!("hash:{p}")))
        .field(Field::string("status").options(["active", "disabled"]))
        .field(Field::int("group_id").nullable())
        .join("group", groups(), "group_id")
        .unique_constraint("users_login_key", "username")
        .build()
        .unwrap();
    let config = RepoConfig::new().default_namespace("demo").unwrap();
    Repository::with_config(Arc::new(schema), config)
}

fn params(stmt: &Statement) -> Vec<&str> {
    stmt.params()
        .iter()
        .map(|p| p.as_str().unwrap_or("NULL"))
        .collect()
}

const SELECT: &str = concat!(
    r#"SELECT "users"."id", "users"."username", "users"."status", "users"."group_id", "#,
    r#""groups"."id", "groups"."name""#
);
const JOIN: &str = r#"LEFT JOIN "demo"."groups" ON "groups"."id"="users"."group_id""#;

#[test]
fn test_insert_statement() {
    let repo = users();
    let stmt = repo
        .insert_statement(&json!({"id": 5, "username": "john", "password": "pw", "status": "active"}))
        .unwrap();
    assert_eq!(
        stmt.to_sql(),
        format!(
            r#"WITH "users" AS (INSERT INTO "demo"."users" ("username", "password", "status") VALUES ($1, $2, $3) RETURNING *) {SELECT} FROM "users" {JOIN}"#
        )
    );
    assert_eq!(params(&stmt), ["john", "hash:pw", "active"]);
    assert_eq!(stmt.tag(), Some("users.add"));
    assert!(stmt.validate().is_ok());
}

#[test]
fn test_update_statement_binds_key_last() {
    let repo = users();
    let stmt = repo
        .update_statement(&json!("7"), &json!({"status": "disabled", "group_id": null}))
        .unwrap();
    assert_eq!(
        stmt.to_sql(),
        format!(
            r#"WITH "users" AS (UPDATE "demo"."users" SET "status"=$1, "group_id"=$2 WHERE "users"."id"=$3 RETURNING *) {SELECT} FROM "users" {JOIN}"#
        )
    );
    assert_eq!(params(&stmt), ["disabled", "NULL", "7"]);
}

#[test]
fn test_get_and_delete_statements() {
    let repo = users();
    let get = repo.get_statement(&json!(3)).unwrap();
    assert_eq!(
        get.to_sql(),
        format!(r#"{SELECT} FROM "demo"."users" {JOIN} WHERE "users"."id"=$1"#)
    );
    assert_eq!(params(&get), ["3"]);

    let delete = repo.delete_statement(&json!(3)).unwrap();
    assert_eq!(
        delete.to_sql(),
        r#"DELETE FROM "demo"."users" WHERE "users"."id"=$1"#
    );
}

#[test]
fn test_key_is_coerced_through_its_field() {
    let repo = users();
    let err = repo.get_statement(&json!("abc")).unwrap_err();
    assert!(err.is_invalid_value());
    assert!(matches!(
        repo.delete_statement(&Value::Null),
        Err(OrmError::MissingInput)
    ));
}

#[test]
fn test_list_statement_defaults_to_primary_key_order() {
    let repo = users();
    let planner = repo.planner();
    let stmt = repo
        .list_statement(&planner, &ListQuery::new(), None)
        .unwrap();
    assert_eq!(
        stmt.to_sql(),
        format!(
            r#"{SELECT} FROM "demo"."users" {JOIN} WHERE (1=1) AND (1=1) ORDER BY "users"."id" ASC"#
        )
    );
    assert_eq!(stmt.tag(), Some("users.all"));
}

#[test]
fn test_list_statement_with_filters_and_limit() {
    let repo = users();
    let planner = repo.planner();
    let query = ListQuery::new()
        .filter(json!({"status": "active", "group": {"id": [1, 2]}}))
        .search(json!({"username": "jo"}))
        .order(OrderRequest::new("group.name").desc())
        .limit(500);
    let stmt = repo.list_statement(&planner, &query, None).unwrap();
    assert_eq!(
        stmt.to_sql(),
        format!(
            r#"{SELECT} FROM "demo"."users" {JOIN} WHERE ("users"."username" ILIKE $1) AND (("users"."status"=$2) AND ("groups"."id" IN ($3, $4))) ORDER BY "groups"."name" DESC LIMIT $5"#
        )
    );
    assert_eq!(params(&stmt), ["%jo%", "active", "1", "2", "100"]);
}

#[test]
fn test_filter_statement_paginates_with_total() {
    let repo = users();
    let planner = repo.planner().with_total();
    let query = ListQuery::new().page(3).limit(20);
    let page = Pagination::new(query.page, query.limit, repo.config());
    let stmt = repo.list_statement(&planner, &query, Some(page)).unwrap();
    assert_eq!(
        stmt.to_sql(),
        format!(
            r#"{SELECT}, COUNT(*) OVER() FROM "demo"."users" {JOIN} WHERE (1=1) AND (1=1) ORDER BY "users"."id" ASC LIMIT $1 OFFSET $2"#
        )
    );
    assert_eq!(params(&stmt), ["20", "40"]);
    assert_eq!(stmt.tag(), Some("users.filter"));
}

#[test]
fn test_method_without_field_orders_by_primary_key() {
    let repo = users();
    let planner = repo.planner();
    let query = ListQuery::new().order(OrderRequest {
        field: None,
        method: Some("desc".into()),
    });
    let stmt = repo.list_statement(&planner, &query, None).unwrap();
    assert!(stmt.to_sql().ends_with(r#"ORDER BY "users"."id" DESC"#));

    let query = ListQuery::new().order(OrderRequest {
        field: None,
        method: Some("sideways".into()),
    });
    let err = repo.list_statement(&planner, &query, None).unwrap_err();
    assert!(err.is_invalid_value());
    assert_eq!(err.field(), Some("id"));
}

#[test]
fn test_pagination_clamps() {
    let config = RepoConfig::new();
    let page = Pagination::new(Some(0), Some(1000), &config);
    assert_eq!(page, Pagination { page: 1, limit: 100 });
    assert_eq!(page.offset(), 0);

    let page = Pagination::new(Some(4), Some(0), &config);
    assert_eq!(page.limit, 1);
    assert_eq!(page.offset(), 3);

    let page = Pagination::new(None, None, &config.clone().default_page_size(25));
    assert_eq!(page, Pagination { page: 1, limit: 25 });

    let page = Pagination::new(Some(3), Some(10), &config);
    assert_eq!(page.offset(), 20);
}

#[test]
fn test_list_query_deserializes() {
    let query: ListQuery = serde_json::from_value(json!({
        "filter": {"status": "active"},
        "order": {"field": "username", "method": "asc"},
        "page": 2
    }))
    .unwrap();
    assert_eq!(query.filter, Some(json!({"status": "active"})));
    assert_eq!(query.order, Some(OrderRequest::new("username").asc()));
    assert_eq!(query.page, Some(2));
    assert_eq!(query.limit, None);
}

#[test]
fn test_unique_violation_translation() {
    let repo = users();
    let mapped = repo.translate_error(OrmError::UniqueViolation {
        constraint: "users_login_key".into(),
        message: "duplicate key".into(),
    });
    assert!(matches!(
        mapped,
        OrmError::UniqueConstraint { ref field, .. } if field == "username"
    ));

    let by_convention = repo.translate_error(OrmError::UniqueViolation {
        constraint: "users_unique_status_index".into(),
        message: "duplicate key".into(),
    });
    assert_eq!(by_convention.field(), Some("status"));

    let unmapped = repo.translate_error(OrmError::UniqueViolation {
        constraint: "users_pkey".into(),
        message: "duplicate key".into(),
    });
    assert!(matches!(unmapped, OrmError::UniqueViolation { .. }));
    assert!(unmapped.is_unique_violation());

    assert!(repo.translate_error(OrmError::MissingInput).field().is_none());
}

#[test]
fn test_page_result_map() {
    let page = PageResult {
        total: Some(3),
        items: vec![1, 2],
    };
    let page = page.map(|n| n * 10);
    assert_eq!(page.items, [10, 20]);
    assert_eq!(page.total, Some(3));
    assert!(PageResult::<i32>::default().is_empty());
}
