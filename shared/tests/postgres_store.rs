//! Round trips against a live PostgreSQL server.
//!
//! Run with `TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`.

use serde_json::json;
use shared::database::postgres::quote_ident;
use shared::store::{HighlightStyle, MatchQuery, SearchIndexDefinition};
use shared::{DocumentStore, MutateInSpec, QueryStatement, SearchQuery, StoreError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    Some(
        PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to TEST_DATABASE_URL"),
    )
}

fn bucket_name() -> String {
    format!("test_{}", uuid::Uuid::new_v4().simple())
}

async fn drop_bucket(pool: &PgPool, bucket: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(bucket)))
        .execute(pool)
        .await
        .expect("drop bucket table");
}

#[tokio::test]
#[ignore]
async fn test_key_value_operations_track_cas() {
    let Some(pool) = pool().await else { return };
    let bucket = bucket_name();
    let store = shared::store::PostgresStore::open(pool.clone(), &bucket).await.unwrap();

    let cas = store.insert("p1", &json!({ "type": "person" })).await.unwrap();
    assert_eq!(cas, 1);
    assert!(matches!(
        store.insert("p1", &json!({})).await,
        Err(StoreError::DocumentExists(_))
    ));

    let cas = store.upsert("p1", &json!({ "type": "person", "n": 1 })).await.unwrap();
    assert_eq!(cas, 2);

    assert!(matches!(
        store.replace("p1", &json!({ "n": 2 }), 1).await,
        Err(StoreError::CasMismatch { expected: 1, actual: 2, .. })
    ));
    let cas = store.replace("p1", &json!({ "n": 2 }), 2).await.unwrap();
    assert_eq!(cas, 3);
    assert_eq!(store.get("p1").await.unwrap().content, json!({ "n": 2 }));

    store.remove("p1").await.unwrap();
    assert!(store.get("p1").await.unwrap_err().is_not_found());

    drop_bucket(&pool, &bucket).await;
}

#[tokio::test]
#[ignore]
async fn test_mutate_in_is_atomic() {
    let Some(pool) = pool().await else { return };
    let bucket = bucket_name();
    let store = shared::store::PostgresStore::open(pool.clone(), &bucket).await.unwrap();

    store.insert("d1", &json!({ "type": "doctor" })).await.unwrap();
    let add = MutateInSpec::array_add_unique("patients", json!("p1")).create_parents(true);
    store.mutate_in("d1", &[add.clone()]).await.unwrap();

    let result = store
        .mutate_in("d1", &[MutateInSpec::upsert("department", json!("ER")), add])
        .await;
    assert!(matches!(result, Err(StoreError::PathExists(_))));

    let doctor = store.get("d1").await.unwrap();
    assert_eq!(doctor.cas, 2);
    assert_eq!(
        doctor.content,
        json!({ "type": "doctor", "patients": ["p1"] })
    );

    drop_bucket(&pool, &bucket).await;
}

#[tokio::test]
#[ignore]
async fn test_query_and_search() {
    let Some(pool) = pool().await else { return };
    let bucket = bucket_name();
    let store = shared::store::PostgresStore::open(pool.clone(), &bucket)
        .await
        .unwrap()
        .with_search_index(SearchIndexDefinition {
            name: "conditions".to_string(),
            doc_type: Some("patient".to_string()),
            fields: vec!["notes.message".to_string()],
        });

    store
        .insert(
            "p1",
            &json!({ "type": "patient", "notes": [{ "message": "Chronic cough" }] }),
        )
        .await
        .unwrap();
    store
        .insert("d1", &json!({ "type": "doctor", "notes": [{ "message": "cough" }] }))
        .await
        .unwrap();

    let statement = QueryStatement::parameterized(
        format!(
            "SELECT jsonb_build_object('id', id) AS row FROM {} WHERE content->>'type' = $1",
            quote_ident(&bucket)
        ),
        ["patient"],
    );
    assert_eq!(
        store.query(&statement).await.unwrap(),
        vec![json!({ "id": "p1" })]
    );

    let query = SearchQuery::new("conditions", MatchQuery::new("coughs").fuzziness(1))
        .highlight(HighlightStyle::Html, ["notes.message"]);
    let results = store.search(&query).await.unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "p1");
    assert_eq!(
        results.hits[0].fragments["notes.message"],
        vec!["Chronic&#32;<mark>cough</mark>".to_string()]
    );

    drop_bucket(&pool, &bucket).await;
}
