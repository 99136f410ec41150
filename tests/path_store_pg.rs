//! Postgres path-store integration tests.
//!
//! Require a live database; run with:
//!   DATABASE_URL=postgres://... cargo test -- --ignored

use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use artifact_locator::error::AppError;
use artifact_locator::models::NewArtifactPath;
use artifact_locator::retry::RetryPolicy;
use artifact_locator::services::path_store::{PathStore, PgPathStore};

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn sample(project: &str, build: i32) -> NewArtifactPath {
    NewArtifactPath {
        project_name: project.to_string(),
        version: "3.0.0".to_string(),
        build_number: build,
        nas_path: format!("/release/product/mr3.0.0/250310/{build}"),
        download_file: Some("V3.0.0_250310_0843.tar.gz".to_string()),
        all_files: vec![
            "V3.0.0_250310_0843.tar.gz".to_string(),
            "be3.0.0_250310_26.tar.gz".to_string(),
        ],
        build_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    }
}

#[tokio::test]
#[ignore]
async fn upsert_then_find_round_trips() {
    let pool = test_pool().await;
    let store = PgPathStore::new(pool, RetryPolicy::immediate(1));
    let project = format!("it-find-{}", uuid::Uuid::new_v4());

    let created = store.upsert(&sample(&project, 26)).await.unwrap();
    assert_eq!(created.build_number, 26);
    assert!(created.verified_at >= created.created_at);

    let found = store.find(&project, "3.0.0", 26).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.nas_path, created.nas_path);
    assert_eq!(found.all_files.0.len(), 2);
}

#[tokio::test]
#[ignore]
async fn upsert_refreshes_existing_row_in_place() {
    let pool = test_pool().await;
    let store = PgPathStore::new(pool, RetryPolicy::immediate(1));
    let project = format!("it-refresh-{}", uuid::Uuid::new_v4());

    let first = store.upsert(&sample(&project, 26)).await.unwrap();

    let mut updated = sample(&project, 26);
    updated.nas_path = "/release/product/mr3.0.0/250311/26".to_string();
    let second = store.upsert(&updated).await.unwrap();

    // Same row, refreshed contents and verification time.
    assert_eq!(second.id, first.id);
    assert_eq!(second.nas_path, "/release/product/mr3.0.0/250311/26");
    assert_eq!(second.created_at, first.created_at);
    assert!(second.verified_at >= first.verified_at);
}

#[tokio::test]
#[ignore]
async fn find_misses_on_unknown_key() {
    let pool = test_pool().await;
    let store = PgPathStore::new(pool, RetryPolicy::immediate(1));
    let project = format!("it-miss-{}", uuid::Uuid::new_v4());

    assert!(store.find(&project, "3.0.0", 1).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn oversized_version_is_rejected_before_the_round_trip() {
    let pool = test_pool().await;
    let store = PgPathStore::new(pool, RetryPolicy::immediate(1));
    let project = format!("it-constraint-{}", uuid::Uuid::new_v4());

    let mut input = sample(&project, 26);
    input.version = "x".repeat(21); // exceeds VARCHAR(20)
    let err = store.upsert(&input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore]
async fn list_recent_orders_by_verification_time() {
    let pool = test_pool().await;
    let store = PgPathStore::new(pool, RetryPolicy::immediate(1));
    let project = format!("it-recent-{}", uuid::Uuid::new_v4());

    store.upsert(&sample(&project, 1)).await.unwrap();
    store.upsert(&sample(&project, 2)).await.unwrap();

    let recent = store.list_recent(200).await.unwrap();
    let ours: Vec<_> = recent
        .iter()
        .filter(|r| r.project_name == project)
        .collect();
    assert_eq!(ours.len(), 2);
    assert!(ours[0].verified_at >= ours[1].verified_at);
}
