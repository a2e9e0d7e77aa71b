//! Integration tests against a real Postgres instance, migrated fresh per
//! test by `sqlx::test`. Requires `DATABASE_URL` to point at a Postgres
//! with the `pgcrypto`/`vector` extensions installable by the migrating
//! role (see `../../migrations`).

use newsloom_common::{ArticleStatus, FeedbackAction, SourceType};
use newsloom_store::{ArticleFilter, NewSource, Store};

#[sqlx::test(migrations = "../../migrations")]
async fn create_article_then_duplicate_source_id_is_unique_violation(pool: sqlx::PgPool) {
    let store = Store::from_pool(pool);
    let section = store
        .create_section("tech", "Tech", 0, 10, &["software".to_string()])
        .await
        .unwrap();

    let make = |url: &str| ArticleFilter {
        source_type: SourceType::Syndication,
        source_id: "abc123",
        section_id: Some(section.id),
        url,
        title: "Title",
        content: None,
        author: None,
        published_at: None,
        metadata: serde_json::json!({}),
    };

    let first = store.create_article(make("https://example.com/a")).await.unwrap();
    assert_eq!(first.status, ArticleStatus::Pending);

    let dup = store.create_article(make("https://example.com/b")).await;
    assert!(matches!(dup, Err(newsloom_store::StoreError::UniqueViolation(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_article_section_and_status_sets_processed_at(pool: sqlx::PgPool) {
    let store = Store::from_pool(pool);
    let section = store.create_section("world", "World", 0, 10, &[]).await.unwrap();
    let article = store
        .create_article(ArticleFilter {
            source_type: SourceType::Syndication,
            source_id: "s1",
            section_id: None,
            url: "https://example.com/x",
            title: "X",
            content: None,
            author: None,
            published_at: None,
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap();
    assert!(article.processed_at.is_none());

    store
        .update_article_section_and_status(article.id, Some(section.id), 0.5, ArticleStatus::Processed)
        .await
        .unwrap();

    let reloaded = store.get_article(article.id).await.unwrap();
    assert_eq!(reloaded.status, ArticleStatus::Processed);
    assert_eq!(reloaded.relevance_score, Some(0.5));
    assert!(reloaded.processed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn section_profile_upsert_round_trips(pool: sqlx::PgPool) {
    let store = Store::from_pool(pool);
    let section = store.create_section("biz", "Business", 0, 10, &[]).await.unwrap();

    assert!(store.get_section_profile(section.id).await.unwrap().is_none());

    let profile = newsloom_common::SectionProfile {
        section_id: section.id,
        positive_embedding: Some(vec![0.1, 0.2, 0.3]),
        negative_embedding: None,
        like_count: 3,
        dislike_count: 0,
        updated_at: chrono::Utc::now(),
    };
    store.upsert_section_profile(&profile).await.unwrap();

    let reloaded = store.get_section_profile(section.id).await.unwrap().unwrap();
    assert_eq!(reloaded.like_count, 3);
    assert_eq!(reloaded.positive_embedding, Some(vec![0.1, 0.2, 0.3]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn source_with_section_links_created_transactionally(pool: sqlx::PgPool) {
    let store = Store::from_pool(pool);
    let section = store.create_section("sec", "Security", 0, 10, &[]).await.unwrap();

    let source = store
        .create_source(NewSource {
            source_type: SourceType::ForgeReleases,
            name: "rustlang/rust".to_string(),
            config: serde_json::json!({"owner": "rustlang", "repo": "rust"}),
            section_ids: vec![section.id],
        })
        .await
        .unwrap();

    let linked = store.sections_for_source(source.id).await.unwrap();
    assert_eq!(linked, vec![section.id]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn feedback_create_and_lookup_section(pool: sqlx::PgPool) {
    let store = Store::from_pool(pool);
    let section = store.create_section("sports", "Sports", 0, 10, &[]).await.unwrap();
    let article = store
        .create_article(ArticleFilter {
            source_type: SourceType::SocialAggregator,
            source_id: "hn1",
            section_id: Some(section.id),
            url: "https://example.com/hn1",
            title: "Story",
            content: None,
            author: None,
            published_at: None,
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap();

    store.create_feedback(article.id, FeedbackAction::Like).await.unwrap();

    let found = store.section_for_article(article.id).await.unwrap();
    assert_eq!(found, Some(section.id));
}
