mod common;

use std::sync::Arc;

use serde_json::json;

use solr_sql::query::preprocess_query;
use solr_sql::{QueryParser, SortDirection};

use common::{FakeSolr, StaticSchema, engine};

#[test]
fn test_shorthand_select_parses() -> solr_sql::Result<()> {
    let sql = "SELECT id, title FROM docs WHERE category:news LIMIT 5";
    assert!(preprocess_query(sql).contains("category = 'news'"));

    let parsed = QueryParser::new().parse(sql)?;
    assert_eq!(parsed.collection, "docs");
    assert_eq!(parsed.fields, vec!["id", "title"]);
    assert_eq!(parsed.ast.limit, Some(5));
    Ok(())
}

#[test]
fn test_parse_is_repeatable() -> solr_sql::Result<()> {
    let parser = QueryParser::new();
    let sql = "SELECT id, price AS cost FROM docs WHERE category:news ORDER BY price DESC, id";
    let first = parser.parse(sql)?;
    let second = parser.parse(sql)?;
    assert_eq!(first, second);
    assert_eq!(
        first.sort_fields,
        vec![
            ("price".to_string(), SortDirection::Desc),
            ("id".to_string(), SortDirection::Asc)
        ]
    );
    assert_eq!(first.fields, vec!["id", "cost"]);
    Ok(())
}

#[test]
fn test_every_shorthand_token_is_rewritten() -> solr_sql::Result<()> {
    let sql = r#"SELECT * FROM docs WHERE category:news AND price:10 OR title:"hello world""#;
    let processed = preprocess_query(sql);
    assert_eq!(processed.matches(" = '").count(), 3);
    assert!(processed.contains("title = 'hello world'"));

    QueryParser::new().parse(sql)?;
    Ok(())
}

#[test]
fn test_shorthand_inside_string_literal_is_kept() {
    let sql = "SELECT * FROM docs WHERE title = 'time: 10:30'";
    assert_eq!(preprocess_query(sql), sql);
}

#[tokio::test]
async fn test_execute_select_builds_native_query() -> solr_sql::Result<()> {
    let solr = Arc::new(FakeSolr::default().with_select_docs(vec![
        json!({"id": "1", "title": ["Breaking"]}),
        json!({"id": "2", "title": "Update"}),
    ]));
    let engine = engine(Arc::new(StaticSchema::docs()), solr.clone());

    let response = engine
        .execute_select("SELECT id, title FROM docs WHERE category:news LIMIT 5")
        .await?;
    assert_eq!(response.num_found, 2);
    assert_eq!(response.docs[0]["title"], "Breaking");

    let requests = solr.requests();
    assert_eq!(requests.len(), 1);
    let (collection, spec) = &requests[0];
    assert_eq!(collection, "docs");
    assert_eq!(spec.query, "*:*");
    assert_eq!(spec.filter_queries, vec!["category:\"news\""]);
    assert_eq!(spec.field_list.as_deref(), Some("id,title"));
    assert_eq!(spec.rows, Some(5));
    assert_eq!(spec.start, None);
    Ok(())
}

#[tokio::test]
async fn test_execute_select_with_range_sort_and_paging() -> solr_sql::Result<()> {
    let solr = Arc::new(FakeSolr::default());
    let engine = engine(Arc::new(StaticSchema::docs()), solr.clone());

    engine
        .execute_select(
            "SELECT id, price FROM docs WHERE price > 10 ORDER BY price DESC LIMIT 3 OFFSET 6",
        )
        .await?;
    let (_, spec) = &solr.requests()[0];
    assert_eq!(spec.filter_queries, vec!["price:{10 TO *]"]);
    assert_eq!(spec.sort.as_deref(), Some("price DESC"));
    assert_eq!(spec.rows, Some(3));
    assert_eq!(spec.start, Some(6));
    assert_eq!(spec.param("wt").as_deref(), Some("json"));
    Ok(())
}

#[tokio::test]
async fn test_and_binds_tighter_than_or_in_filter() -> solr_sql::Result<()> {
    let solr = Arc::new(FakeSolr::default());
    let engine = engine(Arc::new(StaticSchema::docs()), solr.clone());

    engine
        .execute_select("SELECT id FROM docs WHERE category:news OR category:tech AND price > 10")
        .await?;
    let (_, spec) = &solr.requests()[0];
    assert_eq!(
        spec.filter_queries,
        vec!["category:\"news\" OR (category:\"tech\" AND price:{10 TO *])"]
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_statements_are_query_errors() {
    let solr = Arc::new(FakeSolr::default());
    let engine = engine(Arc::new(StaticSchema::docs()), solr.clone());

    let err = engine.execute_select("SELECT bogus FROM docs").await.unwrap_err();
    assert!(err.is_query());
    assert!(err.message().contains("bogus"));

    let err = engine.execute_select("DELETE FROM docs").await.unwrap_err();
    assert!(err.is_query());
    assert_eq!(err.message(), "Only SELECT statements are supported");

    let err = engine.execute_select("SELECT id FROM").await.unwrap_err();
    assert!(err.is_query());

    let err = engine
        .execute_select("SELECT id FROM docs ORDER BY content DESC")
        .await
        .unwrap_err();
    assert!(err.is_query());
    assert!(err.message().contains("content"));

    assert!(solr.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_collection_is_schema_error() {
    let engine = engine(Arc::new(StaticSchema::docs()), Arc::new(FakeSolr::default()));
    let err = engine.execute_select("SELECT * FROM ghost").await.unwrap_err();
    assert!(err.is_schema());
    assert!(err.message().contains("ghost"));
}
