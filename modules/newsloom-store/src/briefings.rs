use chrono::{DateTime, Utc};
use newsloom_common::{Briefing, BriefingMetadata};
use uuid::Uuid;

use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct BriefingRow {
    id: Uuid,
    generated_at: DateTime<Utc>,
    content: String,
    article_ids: Vec<Uuid>,
    metadata: serde_json::Value,
}

impl TryFrom<BriefingRow> for Briefing {
    type Error = serde_json::Error;

    fn try_from(row: BriefingRow) -> std::result::Result<Self, Self::Error> {
        Ok(Briefing {
            id: row.id,
            generated_at: row.generated_at,
            content: row.content,
            article_ids: row.article_ids,
            metadata: serde_json::from_value::<BriefingMetadata>(row.metadata)?,
        })
    }
}

pub struct NewBriefing {
    pub content: String,
    pub article_ids: Vec<Uuid>,
    pub metadata: BriefingMetadata,
}

impl Store {
    /// Briefings are immutable once created — there is no
    /// update method, only create and read.
    pub async fn create_briefing(&self, new: NewBriefing) -> Result<Briefing> {
        let metadata = serde_json::to_value(&new.metadata).map_err(|e| crate::StoreError::Database(
            sqlx::Error::Decode(Box::new(e)),
        ))?;
        let row = sqlx::query_as::<_, BriefingRow>(
            r#"
            INSERT INTO briefings (content, article_ids, metadata)
            VALUES ($1, $2, $3)
            RETURNING id, generated_at, content, article_ids, metadata
            "#,
        )
        .bind(new.content)
        .bind(new.article_ids)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
            .map_err(|e: serde_json::Error| crate::StoreError::Database(sqlx::Error::Decode(Box::new(e))))
    }

    pub async fn get_briefing(&self, id: Uuid) -> Result<Briefing> {
        let row = sqlx::query_as::<_, BriefingRow>(
            "SELECT id, generated_at, content, article_ids, metadata FROM briefings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::StoreError::NotFound(format!("briefing {id}")))?;
        row.try_into()
            .map_err(|e: serde_json::Error| crate::StoreError::Database(sqlx::Error::Decode(Box::new(e))))
    }

    pub async fn list_recent_briefings(&self, limit: i64) -> Result<Vec<Briefing>> {
        let rows = sqlx::query_as::<_, BriefingRow>(
            "SELECT id, generated_at, content, article_ids, metadata FROM briefings ORDER BY generated_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: serde_json::Error| crate::StoreError::Database(sqlx::Error::Decode(Box::new(e)))))
            .collect()
    }
}
