use pgtable::{
    Clause, Combinator, Field, FromRecord, JoinPlanner, OrderRequest, OrmError, OrmResult, Record,
    TableSchema, build_insert, build_order, build_update, build_where, plan_join,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

fn authors() -> Arc<TableSchema> {
    Arc::new(
        TableSchema::builder("authors")
            .field(Field::int("id"))
            .field(Field::string("name"))
            .field(Field::json("bio"))
            .build()
            .unwrap(),
    )
}

fn books() -> TableSchema {
    TableSchema::builder("books")
        .namespace("library")
        .field(Field::int("id").no_insert().no_update())
        .field(Field::string("title"))
        .field(Field::json("summary").keys(["en", "fr"]))
        .field(Field::int("pages"))
        .field(Field::date("published_at"))
        .field(Field::string("genre").options(["novel", "essay", "poetry"]))
        .field(Field::string("isbn").decoder(|v| match v {
            Value::String(s) => Value::String(s.replace('-', "")),
            other => other,
        }))
        .field(Field::string("labels").array())
        .field(Field::int("author_id").nullable())
        .join("author", authors(), "author_id")
        .build()
        .unwrap()
}

fn placeholders(sql: &str) -> usize {
    sql.match_indices('$')
        .filter(|(i, _)| {
            sql[i + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .count()
}

fn assert_bound(clause: &Clause) {
    assert_eq!(placeholders(&clause.render(None)), clause.values().len());
}

#[test]
fn insert_columns_and_values_line_up() {
    let schema = books();
    let clause = build_insert(
        &schema,
        &json!({
            "id": 9,
            "title": "Dune",
            "pages": "412",
            "summary": {"en": "Spice"},
            "labels": ["sf", "classic"],
            "unknown": true
        }),
    )
    .unwrap();

    assert_eq!(clause.fields().len(), clause.values().len());
    assert_eq!(
        clause.render(None),
        r#""title", "summary", "pages", "labels""#
    );
    assert_eq!(clause.render(Some("$?")), "$1, $2, $3, $4");
    let values: Vec<_> = clause.values().iter().map(|v| v.as_str()).collect();
    assert_eq!(
        values,
        [
            Some("Dune"),
            Some(r#"{"en":"Spice"}"#),
            Some("412"),
            Some("{sf,classic}")
        ]
    );
}

#[test]
fn update_skips_fields_that_refuse_updates() {
    let schema = books();
    let clause = build_update(&schema, &json!({"id": 1, "pages": 10})).unwrap();
    assert_eq!(clause.render(None), r#""pages"=$1"#);
    assert_bound(&clause);

    assert!(matches!(
        build_update(&schema, &json!({"id": 1})),
        Err(OrmError::MissingInput)
    ));
}

#[test]
fn where_clause_placeholders_match_values() {
    let schema = books();
    let payloads = [
        json!({}),
        json!({"title": "dune"}),
        json!({"pages": {"from": 100, "to": 300}}),
        json!({"genre": ["novel", "essay"], "labels": ["sf"]}),
        json!({"summary": "spice", "author_id": null}),
        json!({"published_at": {"from": "2020-01-01"}, "genre": []}),
    ];
    for payload in payloads {
        for combinator in [Combinator::And, Combinator::Or] {
            let clause = build_where(&schema, &payload, combinator).unwrap();
            assert_bound(&clause);
        }
    }
}

#[test]
fn where_clause_rejects_bad_values() {
    let schema = books();
    let err = build_where(&schema, &json!({"genre": "comic"}), Combinator::And).unwrap_err();
    assert_eq!(err.field(), Some("genre"));

    let err = build_where(&schema, &json!({"title": {"from": "a"}}), Combinator::And).unwrap_err();
    assert!(err.is_invalid_value());

    let err = build_where(&schema, &json!({"pages": ["x"]}), Combinator::And).unwrap_err();
    assert_eq!(err.field(), Some("pages"));
}

#[test]
fn order_follows_declared_keys() {
    let schema = books();
    assert_eq!(
        build_order(&schema, Some("summary.fr"), Some("desc"), None).unwrap(),
        r#""books"."summary"->'fr' DESC"#
    );
    assert_eq!(
        build_order(&schema, Some("pages"), None, Some(&OrderRequest::new("title").asc())).unwrap(),
        r#""books"."title" ASC"#
    );
    assert!(matches!(
        build_order(&schema, Some("summary.de"), None, None),
        Err(OrmError::UnknownField { .. })
    ));
    assert!(matches!(
        build_order(&schema, None, Some("asc"), None),
        Err(OrmError::MissingField)
    ));
}

#[test]
fn planner_offsets_mirror_column_list() {
    let schema = books();
    let planner = JoinPlanner::new(&schema).with_total();
    let columns = planner.column_list();
    let width = columns.split(", ").count();
    assert_eq!(planner.cursor().width(), width + 1);
    assert!(planner.select_list().ends_with(", COUNT(*) OVER()"));

    let root = planner.cursor().offset("@root").unwrap();
    let author = planner.cursor().offset("author").unwrap();
    assert_eq!(root.start, 0);
    assert_eq!(author.start, root.count);
    assert_eq!(author.count, 3);
}

#[test]
fn plan_join_combines_search_and_filter() {
    let schema = books();
    let planner = plan_join(
        &schema,
        Some(&json!({"genre": "novel", "author": {"id": 4}})),
        Some(&json!({"title": "du", "author": {"name": "her"}})),
    )
    .unwrap();
    let clause = planner.where_clause().unwrap();
    assert_eq!(
        clause.render(None),
        concat!(
            r#"(("books"."title" ILIKE $1) OR ("authors"."name" ILIKE $2)) AND "#,
            r#"(("books"."genre"=$3) AND ("authors"."id"=$4))"#
        )
    );
    assert_bound(clause);
}

#[derive(Debug, Deserialize, PartialEq)]
struct Author {
    id: i64,
    name: String,
    bio: Value,
}

#[derive(Debug, PartialEq)]
struct Book {
    id: i64,
    title: String,
    isbn: String,
    labels: Vec<String>,
    author: Option<Author>,
}

impl FromRecord for Book {
    fn from_record(record: Record) -> OrmResult<Self> {
        Ok(Book {
            id: record.get_as("id")?,
            title: record.get_as("title")?,
            isbn: record.get_as("isbn")?,
            labels: record.get_as("labels")?,
            author: match record.join("author") {
                Some(author) => Some(author.clone().deserialize()?),
                None => None,
            },
        })
    }
}

fn book_row(author: [Value; 3]) -> Vec<Value> {
    let mut row = vec![
        json!(1),
        json!("Dune"),
        json!(r#"{"en":"Spice"}"#),
        json!(412),
        json!("1965-08-01 00:00:00"),
        json!("novel"),
        json!("978-0-441"),
        json!("{sf,classic}"),
        json!(7),
    ];
    row.extend(author);
    row
}

#[test]
fn hydrates_rows_into_application_types() {
    let schema = books();
    let mut planner = JoinPlanner::new(&schema);

    let record = planner
        .hydrate(book_row([json!(7), json!("Herbert"), json!(r#"{"born":1920}"#)]))
        .unwrap();
    assert_eq!(record.get("summary"), Some(&json!({"en": "Spice"})));
    let book = Book::from_record(record).unwrap();
    assert_eq!(
        book,
        Book {
            id: 1,
            title: "Dune".into(),
            isbn: "9780441".into(),
            labels: vec!["sf".into(), "classic".into()],
            author: Some(Author {
                id: 7,
                name: "Herbert".into(),
                bio: json!({"born": 1920}),
            }),
        }
    );

    let orphan = planner
        .hydrate(book_row([Value::Null, Value::Null, Value::Null]))
        .unwrap();
    assert!(orphan.has_join("author"));
    assert!(Book::from_record(orphan).unwrap().author.is_none());
}

#[test]
fn short_rows_fail_hydration() {
    let schema = books();
    let mut planner = JoinPlanner::new(&schema);
    let mut row = book_row([json!(7), json!("Herbert"), json!("{}")]);
    row.truncate(10);
    assert!(matches!(
        planner.hydrate(row),
        Err(OrmError::Hydration(_))
    ));
}
