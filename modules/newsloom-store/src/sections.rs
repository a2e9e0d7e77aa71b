use newsloom_common::Section;
use uuid::Uuid;

use crate::error::classify;
use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: Uuid,
    name: String,
    display_name: String,
    enabled: bool,
    sort_order: i32,
    max_briefing_articles: i32,
    seed_keywords: serde_json::Value,
    config: serde_json::Value,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        let seed_keywords = row
            .seed_keywords
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        Section {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            enabled: row.enabled,
            sort_order: row.sort_order,
            max_briefing_articles: row.max_briefing_articles,
            seed_keywords,
            config: row.config,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, name, display_name, enabled, sort_order, max_briefing_articles, seed_keywords, config";

impl Store {
    /// Enabled sections ordered by `sort_order`.
    pub async fn list_enabled_sections(&self) -> Result<Vec<Section>> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sections WHERE enabled ORDER BY sort_order ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Section::from).collect())
    }

    pub async fn get_section(&self, id: Uuid) -> Result<Section> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| crate::StoreError::NotFound(format!("section {id}")))?;
        Ok(row.into())
    }

    pub async fn get_section_by_name(&self, name: &str) -> Result<Option<Section>> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sections WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Section::from))
    }

    pub async fn create_section(
        &self,
        name: &str,
        display_name: &str,
        sort_order: i32,
        max_briefing_articles: i32,
        seed_keywords: &[String],
    ) -> Result<Section> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            r#"
            INSERT INTO sections (name, display_name, sort_order, max_briefing_articles, seed_keywords, config)
            VALUES ($1, $2, $3, $4, $5, '{{}}'::jsonb)
            RETURNING {SELECT_COLUMNS}
            "#,
        ))
        .bind(name)
        .bind(display_name)
        .bind(sort_order)
        .bind(max_briefing_articles)
        .bind(serde_json::Value::from(seed_keywords.to_vec()))
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(row.into())
    }

    /// Merge `relevance_threshold` into a section's config. Single-statement, last-write-wins.
    pub async fn update_section_threshold(&self, section_id: Uuid, threshold: f64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sections
            SET config = jsonb_set(config, '{relevance_threshold}', to_jsonb($2::double precision), true)
            WHERE id = $1
            "#,
        )
        .bind(section_id)
        .bind(threshold)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Reorder sections by `sort_order`, transactionally.
    pub async fn reorder_sections(&self, ordered_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (idx, id) in ordered_ids.iter().enumerate() {
            sqlx::query("UPDATE sections SET sort_order = $2 WHERE id = $1")
                .bind(id)
                .bind(idx as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
