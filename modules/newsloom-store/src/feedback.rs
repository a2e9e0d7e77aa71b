use std::str::FromStr;

use chrono::{DateTime, Utc};
use newsloom_common::{Feedback, FeedbackAction};
use uuid::Uuid;

use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: Uuid,
    article_id: Uuid,
    action: String,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            article_id: row.article_id,
            action: FeedbackAction::from_str(&row.action).unwrap_or(FeedbackAction::Save),
            created_at: row.created_at,
        }
    }
}

impl Store {
    pub async fn create_feedback(&self, article_id: Uuid, action: FeedbackAction) -> Result<Feedback> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            INSERT INTO feedback (article_id, action)
            VALUES ($1, $2)
            RETURNING id, article_id, action, created_at
            "#,
        )
        .bind(article_id)
        .bind(action.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    pub async fn delete_feedback(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The section an article belongs to, used to target an *immediate*
    /// profile recomputation when feedback for it is created/deleted
    ///.
    pub async fn section_for_article(&self, article_id: Uuid) -> Result<Option<Uuid>> {
        let row: Option<(Option<Uuid>,)> =
            sqlx::query_as("SELECT section_id FROM articles WHERE id = $1")
                .bind(article_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(id,)| id))
    }
}
