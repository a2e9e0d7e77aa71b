//! Postgres-backed persistence layer:
//! articles, sources, sections, feedback, section profiles, briefings, with
//! a `vector(384)` embedding column and the cosine-distance operator family
//! from `pgvector`.
//!
//! Schema migrations are forward-only, versioned by filename under
//! `../../migrations` (the workspace-root `migrations/` directory, shared
//! with `newsloom-eventbus`'s `bus_events` table), applied via
//! `sqlx::migrate!` and tracked in sqlx's own `_sqlx_migrations` table.

mod articles;
mod briefings;
pub mod error;
mod feedback;
mod sections;
mod section_profiles;
mod sources;
mod vector_col;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

pub use articles::{ArticleFilter, PendingPage};
pub use briefings::NewBriefing;
pub use sources::NewSource;

/// Minimum/maximum connections in the shared pool.
const MIN_CONNECTIONS: u32 = 2;
const MAX_CONNECTIONS: u32 = 20;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(MIN_CONNECTIONS)
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply all pending migrations. Fails fast — startup is a fatal
    /// initialization failure if migrations don't apply.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}
