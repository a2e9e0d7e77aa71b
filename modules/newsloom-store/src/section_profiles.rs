use chrono::{DateTime, Utc};
use newsloom_common::SectionProfile;
use uuid::Uuid;

use crate::vector_col::{from_pgvector, to_pgvector};
use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct SectionProfileRow {
    section_id: Uuid,
    positive_embedding: Option<pgvector::Vector>,
    negative_embedding: Option<pgvector::Vector>,
    like_count: i32,
    dislike_count: i32,
    updated_at: DateTime<Utc>,
}

impl From<SectionProfileRow> for SectionProfile {
    fn from(row: SectionProfileRow) -> Self {
        SectionProfile {
            section_id: row.section_id,
            positive_embedding: from_pgvector(row.positive_embedding),
            negative_embedding: from_pgvector(row.negative_embedding),
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "section_id, positive_embedding, negative_embedding, like_count, dislike_count, updated_at";

impl Store {
    pub async fn get_section_profile(&self, section_id: Uuid) -> Result<Option<SectionProfile>> {
        let row = sqlx::query_as::<_, SectionProfileRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM section_profiles WHERE section_id = $1"
        ))
        .bind(section_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SectionProfile::from))
    }

    /// Insert-or-update the whole profile row. Racing
    /// immediate recomputations for the same section converge via
    /// ordinary last-write-wins.
    pub async fn upsert_section_profile(&self, profile: &SectionProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO section_profiles
                (section_id, positive_embedding, negative_embedding, like_count, dislike_count, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (section_id) DO UPDATE SET
                positive_embedding = EXCLUDED.positive_embedding,
                negative_embedding = EXCLUDED.negative_embedding,
                like_count = EXCLUDED.like_count,
                dislike_count = EXCLUDED.dislike_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.section_id)
        .bind(to_pgvector(&profile.positive_embedding))
        .bind(to_pgvector(&profile.negative_embedding))
        .bind(profile.like_count)
        .bind(profile.dislike_count)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
