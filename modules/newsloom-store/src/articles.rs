use std::str::FromStr;

use chrono::{DateTime, Utc};
use newsloom_common::{Article, ArticleStatus, SourceType};
use uuid::Uuid;

use crate::error::classify;
use crate::vector_col::from_pgvector;
use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: Uuid,
    source_type: String,
    source_id: String,
    section_id: Option<Uuid>,
    url: String,
    title: String,
    content: Option<String>,
    summary: Option<String>,
    author: Option<String>,
    published_at: Option<DateTime<Utc>>,
    ingested_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    embedding: Option<pgvector::Vector>,
    relevance_score: Option<f64>,
    status: String,
    metadata: serde_json::Value,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_type: SourceType::from_str(&row.source_type).unwrap_or(SourceType::Syndication),
            source_id: row.source_id,
            section_id: row.section_id,
            url: row.url,
            title: row.title,
            content: row.content,
            summary: row.summary,
            author: row.author,
            published_at: row.published_at,
            ingested_at: row.ingested_at,
            processed_at: row.processed_at,
            embedding: from_pgvector(row.embedding),
            relevance_score: row.relevance_score,
            status: ArticleStatus::from_str(&row.status).unwrap_or(ArticleStatus::Pending),
            metadata: row.metadata,
        }
    }
}

const SELECT_COLUMNS: &str = "id, source_type, source_id, section_id, url, title, content, summary, \
     author, published_at, ingested_at, processed_at, embedding, relevance_score, status, metadata";

pub struct PendingPage {
    pub articles: Vec<Article>,
    pub total_above_threshold: i64,
}

pub struct ArticleFilter<'a> {
    pub source_type: SourceType,
    pub source_id: &'a str,
    pub section_id: Option<Uuid>,
    pub url: &'a str,
    pub title: &'a str,
    pub content: Option<&'a str>,
    pub author: Option<&'a str>,
    pub published_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl Store {
    /// Insert a new article with `status = pending`. A unique-constraint
    /// violation on `(source_type, source_id)` or `url` surfaces as
    /// `StoreError::UniqueViolation` so the caller can treat it as
    /// "already seen" rather than a hard failure.
    pub async fn create_article(&self, new: ArticleFilter<'_>) -> Result<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            INSERT INTO articles
                (source_type, source_id, section_id, url, title, content, author, published_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SELECT_COLUMNS}
            "#,
        ))
        .bind(new.source_type.to_string())
        .bind(new.source_id)
        .bind(new.section_id)
        .bind(new.url)
        .bind(new.title)
        .bind(new.content)
        .bind(new.author)
        .bind(new.published_at)
        .bind(new.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    pub async fn get_article(&self, id: Uuid) -> Result<Article> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::StoreError::NotFound(format!("article {id}")))?;
        Ok(row.into())
    }

    /// Set the embedding produced by the embedding service.
    pub async fn update_article_embedding(&self, id: Uuid, embedding: &[f32]) -> Result<()> {
        sqlx::query("UPDATE articles SET embedding = $2 WHERE id = $1")
            .bind(id)
            .bind(pgvector::Vector::from(embedding.to_vec()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Atomic section/score/status update; sets `processed_at = now()`
    /// when the new status is `processed` or `briefed`.
    pub async fn update_article_section_and_status(
        &self,
        id: Uuid,
        section_id: Option<Uuid>,
        score: f64,
        status: ArticleStatus,
    ) -> Result<()> {
        let sets_processed_at = matches!(status, ArticleStatus::Processed | ArticleStatus::Briefed);
        sqlx::query(
            r#"
            UPDATE articles
            SET section_id = $2,
                relevance_score = $3,
                status = $4,
                processed_at = CASE WHEN $5 THEN now() ELSE processed_at END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(section_id)
        .bind(score)
        .bind(status.to_string())
        .bind(sets_processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Transition status only, without touching score/section. Used by
    /// the briefing composer for filtered/briefed bookkeeping.
    pub async fn update_article_status(&self, id: Uuid, status: ArticleStatus) -> Result<()> {
        let sets_processed_at = matches!(status, ArticleStatus::Processed | ArticleStatus::Briefed);
        sqlx::query(
            r#"
            UPDATE articles
            SET status = $2,
                processed_at = CASE WHEN $3 THEN now() ELSE processed_at END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(sets_processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_article_statuses(&self, ids: &[Uuid], status: ArticleStatus) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let sets_processed_at = matches!(status, ArticleStatus::Processed | ArticleStatus::Briefed);
        sqlx::query(
            r#"
            UPDATE articles
            SET status = $2,
                processed_at = CASE WHEN $3 THEN now() ELSE processed_at END
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .bind(status.to_string())
        .bind(sets_processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn merge_article_metadata(&self, id: Uuid, patch: serde_json::Value) -> Result<()> {
        sqlx::query("UPDATE articles SET metadata = metadata || $2 WHERE id = $1")
            .bind(id)
            .bind(patch)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_article_summary(&self, id: Uuid, summary: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET summary = $2 WHERE id = $1")
            .bind(id)
            .bind(summary)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Pending articles at or above `threshold`, ranked score desc then
    /// ingest time desc, plus the total count above threshold.
    pub async fn list_pending_articles_for_section(
        &self,
        section_id: Uuid,
        threshold: f64,
        limit: i64,
    ) -> Result<PendingPage> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM articles
            WHERE section_id = $1 AND status = 'pending' AND relevance_score >= $2
            ORDER BY relevance_score DESC, ingested_at DESC
            LIMIT $3
            "#,
        ))
        .bind(section_id)
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total_above_threshold = self.count_pending_above_threshold(section_id, threshold).await?;

        Ok(PendingPage {
            articles: rows.into_iter().map(Article::from).collect(),
            total_above_threshold,
        })
    }

    /// Used by adaptive thresholding.
    pub async fn count_pending_above_threshold(&self, section_id: Uuid, threshold: f64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM articles WHERE section_id = $1 AND status = 'pending' AND relevance_score >= $2",
        )
        .bind(section_id)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Top-k cosine-nearest articles with a non-null embedding, published
    /// (ingested) within the last 48 hours, excluding `exclude_id`
    ///.
    pub async fn find_similar_last_48h(
        &self,
        embedding: &[f32],
        exclude_id: Uuid,
        k: i64,
    ) -> Result<Vec<(Article, f64)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            article: ArticleRow,
            similarity: f64,
        }

        let rows = sqlx::query_as::<_, Row>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}, 1 - (embedding <=> $1) AS similarity
            FROM articles
            WHERE id != $2
              AND embedding IS NOT NULL
              AND ingested_at >= now() - interval '48 hours'
            ORDER BY embedding <=> $1
            LIMIT $3
            "#,
        ))
        .bind(pgvector::Vector::from(embedding.to_vec()))
        .bind(exclude_id)
        .bind(k)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (Article::from(r.article), r.similarity))
            .collect())
    }

    /// All embeddings of articles in `section_id` with at least one
    /// feedback row of `action`.
    pub async fn list_section_embeddings_by_feedback_action(
        &self,
        section_id: Uuid,
        action: &str,
    ) -> Result<Vec<Vec<f32>>> {
        let rows: Vec<(pgvector::Vector,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT a.embedding
            FROM articles a
            JOIN feedback f ON f.article_id = a.id
            WHERE a.section_id = $1 AND a.embedding IS NOT NULL AND f.action = $2
            "#,
        )
        .bind(section_id)
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(v,)| v.to_vec()).collect())
    }
}
