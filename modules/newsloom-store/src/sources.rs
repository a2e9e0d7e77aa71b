use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use newsloom_common::{Source, SourceType};
use uuid::Uuid;

use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct SourceRow {
    id: Uuid,
    source_type: String,
    name: String,
    config: serde_json::Value,
    enabled: bool,
    last_fetched_at: Option<DateTime<Utc>>,
    error_count: i32,
    last_error: Option<String>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            source_type: SourceType::from_str(&row.source_type).unwrap_or(SourceType::Syndication),
            name: row.name,
            config: row.config,
            enabled: row.enabled,
            last_fetched_at: row.last_fetched_at,
            error_count: row.error_count,
            last_error: row.last_error,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, source_type, name, config, enabled, last_fetched_at, error_count, last_error";

pub struct NewSource {
    pub source_type: SourceType,
    pub name: String,
    pub config: serde_json::Value,
    pub section_ids: Vec<Uuid>,
}

impl Store {
    pub async fn list_enabled_sources_by_type(&self, source_type: SourceType) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sources WHERE enabled AND source_type = $1"
        ))
        .bind(source_type.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    pub async fn list_all_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!("SELECT {SELECT_COLUMNS} FROM sources"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    pub async fn get_source(&self, id: Uuid) -> Result<Source> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::StoreError::NotFound(format!("source {id}")))?;
        Ok(row.into())
    }

    /// Section ids linked to a source.
    pub async fn sections_for_source(&self, source_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT section_id FROM source_sections WHERE source_id = $1")
                .bind(source_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Reverse index: every source's linked section ids in one round trip,
    /// for the relevance engine's startup cache.
    pub async fn all_source_section_links(&self) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let rows: Vec<(Uuid, Uuid)> =
            sqlx::query_as("SELECT source_id, section_id FROM source_sections")
                .fetch_all(&self.pool)
                .await?;
        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (source_id, section_id) in rows {
            map.entry(source_id).or_default().push(section_id);
        }
        Ok(map)
    }

    /// Create a source and link it to sections in one transaction
    ///.
    pub async fn create_source(&self, new: NewSource) -> Result<Source> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SourceRow>(&format!(
            r#"
            INSERT INTO sources (source_type, name, config)
            VALUES ($1, $2, $3)
            RETURNING {SELECT_COLUMNS}
            "#,
        ))
        .bind(new.source_type.to_string())
        .bind(&new.name)
        .bind(&new.config)
        .fetch_one(&mut *tx)
        .await?;

        for section_id in &new.section_ids {
            sqlx::query("INSERT INTO source_sections (source_id, section_id) VALUES ($1, $2)")
                .bind(row.id)
                .bind(section_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace a source's section links wholesale, transactionally.
    pub async fn replace_source_sections(&self, source_id: Uuid, section_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM source_sections WHERE source_id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;
        for section_id in section_ids {
            sqlx::query("INSERT INTO source_sections (source_id, section_id) VALUES ($1, $2)")
                .bind(source_id)
                .bind(section_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// On success, clears the error and bumps `last_fetched_at`; on
    /// error, increments `error_count` and records `last_error`
    ///.
    pub async fn update_source_fetch_status(&self, id: Uuid, err: Option<&str>) -> Result<()> {
        match err {
            None => {
                sqlx::query(
                    "UPDATE sources SET last_fetched_at = now(), error_count = 0, last_error = NULL WHERE id = $1",
                )
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            Some(message) => {
                sqlx::query(
                    "UPDATE sources SET error_count = error_count + 1, last_error = $2 WHERE id = $1",
                )
                .bind(id)
                .bind(message)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}
