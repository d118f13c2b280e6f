//! PostgreSQL store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Schema
//!
//! Excuse rows hold plain UUID columns for their parts, with no foreign keys:
//! deleting a fragment, meme or law leaves the excuse in place and the
//! reference dangling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Row};
use std::time::Duration;
use uuid::Uuid;

use super::{ContentStore, ExcuseStore};
use crate::pool::ContentPool;
use crate::role::Role;
use crate::types::{
    Excuse, ExcuseId, ExcuseType, Fragment, FragmentId, FragmentKind, Law, LawId, Meme, MemeId,
};

/// DDL for all tables. Safe to run repeatedly.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS fragments (
    id          UUID PRIMARY KEY,
    kind        TEXT NOT NULL,
    text        TEXT NOT NULL,
    role        TEXT,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS fragments_kind_role_idx ON fragments (kind, role);

CREATE TABLE IF NOT EXISTS memes (
    id          UUID PRIMARY KEY,
    author      VARCHAR(100) NOT NULL,
    quote       TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS laws (
    id          UUID PRIMARY KEY,
    name        VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    category    TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS excuses (
    id                UUID PRIMARY KEY,
    context_id        UUID,
    cause_id          UUID,
    consequence_id    UUID,
    recommendation_id UUID,
    meme_id           UUID,
    law_id            UUID,
    excuse_type       TEXT NOT NULL,
    role              TEXT,
    seed              BIGINT NOT NULL,
    created_at        TIMESTAMPTZ NOT NULL,
    updated_at        TIMESTAMPTZ
);
"#;

const FRAGMENT_COLUMNS: &str = "id, kind, text, role, created_at, updated_at";
const MEME_COLUMNS: &str = "id, author, quote, created_at, updated_at";
const LAW_COLUMNS: &str = "id, name, description, category, created_at, updated_at";
const EXCUSE_COLUMNS: &str = "id, context_id, cause_id, consequence_id, recommendation_id, \
                              meme_id, law_id, excuse_type, role, seed, created_at, updated_at";

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/excuses".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored value could not be decoded into a domain type.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// PostgreSQL store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store with the given configuration and ensure the schema.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create tables and indexes if missing.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        // Unprepared execution so the multi-statement DDL runs in one round trip.
        (&self.pool).execute(SCHEMA).await?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    fn parse_fragment_row(row: &PgRow) -> Result<Fragment, PostgresError> {
        let kind: String = row.try_get("kind")?;
        let role: Option<String> = row.try_get("role")?;
        Ok(Fragment {
            id: FragmentId::new(row.try_get("id")?),
            kind: FragmentKind::from_str(&kind)
                .ok_or_else(|| PostgresError::Corrupt(format!("unknown fragment kind {:?}", kind)))?,
            text: row.try_get("text")?,
            role: parse_role(role)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_meme_row(row: &PgRow) -> Result<Meme, PostgresError> {
        Ok(Meme {
            id: MemeId::new(row.try_get("id")?),
            author: row.try_get("author")?,
            quote: row.try_get("quote")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_law_row(row: &PgRow) -> Result<Law, PostgresError> {
        Ok(Law {
            id: LawId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_excuse_row(row: &PgRow) -> Result<Excuse, PostgresError> {
        let excuse_type: String = row.try_get("excuse_type")?;
        let role: Option<String> = row.try_get("role")?;
        let fragment = |col: &str| -> Result<Option<FragmentId>, PostgresError> {
            Ok(row.try_get::<Option<Uuid>, _>(col)?.map(FragmentId::new))
        };
        Ok(Excuse {
            id: ExcuseId::new(row.try_get("id")?),
            context: fragment("context_id")?,
            cause: fragment("cause_id")?,
            consequence: fragment("consequence_id")?,
            recommendation: fragment("recommendation_id")?,
            meme: row.try_get::<Option<Uuid>, _>("meme_id")?.map(MemeId::new),
            law: row.try_get::<Option<Uuid>, _>("law_id")?.map(LawId::new),
            excuse_type: ExcuseType::from_str(&excuse_type)
                .ok_or_else(|| PostgresError::Corrupt(format!("unknown excuse type {:?}", excuse_type)))?,
            role: parse_role(role)?,
            seed: row.try_get("seed")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Run a fragment query binding `kind` then `role` as `$1`/`$2` when given.
    async fn fetch_fragments(
        &self,
        sql: &str,
        kind: Option<FragmentKind>,
        role: Option<Role>,
    ) -> Result<Vec<Fragment>, PostgresError> {
        let mut query = sqlx::query(sql);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }
        if let Some(role) = role {
            query = query.bind(role.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::parse_fragment_row).collect()
    }
}

fn parse_role(role: Option<String>) -> Result<Option<Role>, PostgresError> {
    role.map(|r| Role::from_str(&r).ok_or_else(|| PostgresError::Corrupt(format!("unknown role {:?}", r))))
        .transpose()
}

#[async_trait]
impl ContentStore for PostgresStore {
    type Error = PostgresError;

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn content_pool(&self) -> Result<ContentPool, Self::Error> {
        // One repeatable-read transaction so all three reads see one snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let fragments = sqlx::query(&format!("SELECT {} FROM fragments ORDER BY id", FRAGMENT_COLUMNS))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(Self::parse_fragment_row)
            .collect::<Result<Vec<_>, _>>()?;
        let memes = sqlx::query(&format!("SELECT {} FROM memes ORDER BY id", MEME_COLUMNS))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(Self::parse_meme_row)
            .collect::<Result<Vec<_>, _>>()?;
        let laws = sqlx::query(&format!("SELECT {} FROM laws ORDER BY id", LAW_COLUMNS))
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(Self::parse_law_row)
            .collect::<Result<Vec<_>, _>>()?;

        tx.commit().await?;
        Ok(ContentPool::new(fragments, memes, laws))
    }

    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, Self::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM fragments WHERE id = $1", FRAGMENT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_fragment_row).transpose()
    }

    async fn list_fragments(&self) -> Result<Vec<Fragment>, Self::Error> {
        self.fetch_fragments(
            &format!("SELECT {} FROM fragments ORDER BY id", FRAGMENT_COLUMNS),
            None,
            None,
        )
        .await
    }

    async fn fragments_by_kind(&self, kind: FragmentKind) -> Result<Vec<Fragment>, Self::Error> {
        self.fetch_fragments(
            &format!("SELECT {} FROM fragments WHERE kind = $1 ORDER BY id", FRAGMENT_COLUMNS),
            Some(kind),
            None,
        )
        .await
    }

    async fn fragments_by_kind_and_role(
        &self,
        kind: FragmentKind,
        role: Role,
    ) -> Result<Vec<Fragment>, Self::Error> {
        self.fetch_fragments(
            &format!(
                "SELECT {} FROM fragments WHERE kind = $1 AND role = $2 ORDER BY id",
                FRAGMENT_COLUMNS
            ),
            Some(kind),
            Some(role),
        )
        .await
    }

    async fn fragments_by_role(&self, role: Role) -> Result<Vec<Fragment>, Self::Error> {
        self.fetch_fragments(
            &format!("SELECT {} FROM fragments WHERE role = $1 ORDER BY id", FRAGMENT_COLUMNS),
            None,
            Some(role),
        )
        .await
    }

    async fn put_fragment(&self, fragment: &Fragment) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO fragments (id, kind, text, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET kind = EXCLUDED.kind, text = EXCLUDED.text, role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(fragment.id.as_uuid())
        .bind(fragment.kind.as_str())
        .bind(&fragment.text)
        .bind(fragment.role.map(|r| r.as_str()))
        .bind(fragment.created_at)
        .bind(fragment.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_fragment(&self, id: &FragmentId) -> Result<bool, Self::Error> {
        let result = sqlx::query("DELETE FROM fragments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_meme(&self, id: &MemeId) -> Result<Option<Meme>, Self::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM memes WHERE id = $1", MEME_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_meme_row).transpose()
    }

    async fn list_memes(&self) -> Result<Vec<Meme>, Self::Error> {
        sqlx::query(&format!("SELECT {} FROM memes ORDER BY id", MEME_COLUMNS))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::parse_meme_row)
            .collect()
    }

    async fn memes_by_author(&self, author: &str) -> Result<Vec<Meme>, Self::Error> {
        sqlx::query(&format!("SELECT {} FROM memes WHERE author = $1 ORDER BY id", MEME_COLUMNS))
            .bind(author)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::parse_meme_row)
            .collect()
    }

    async fn put_meme(&self, meme: &Meme) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO memes (id, author, quote, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET author = EXCLUDED.author, quote = EXCLUDED.quote, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(meme.id.as_uuid())
        .bind(&meme.author)
        .bind(&meme.quote)
        .bind(meme.created_at)
        .bind(meme.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_meme(&self, id: &MemeId) -> Result<bool, Self::Error> {
        let result = sqlx::query("DELETE FROM memes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_law(&self, id: &LawId) -> Result<Option<Law>, Self::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM laws WHERE id = $1", LAW_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_law_row).transpose()
    }

    async fn list_laws(&self) -> Result<Vec<Law>, Self::Error> {
        sqlx::query(&format!("SELECT {} FROM laws ORDER BY id", LAW_COLUMNS))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::parse_law_row)
            .collect()
    }

    async fn laws_by_category(&self, category: &str) -> Result<Vec<Law>, Self::Error> {
        sqlx::query(&format!("SELECT {} FROM laws WHERE category = $1 ORDER BY id", LAW_COLUMNS))
            .bind(category)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::parse_law_row)
            .collect()
    }

    async fn put_law(&self, law: &Law) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO laws (id, name, description, category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description,
                category = EXCLUDED.category, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(law.id.as_uuid())
        .bind(&law.name)
        .bind(&law.description)
        .bind(&law.category)
        .bind(law.created_at)
        .bind(law.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_law(&self, id: &LawId) -> Result<bool, Self::Error> {
        let result = sqlx::query("DELETE FROM laws WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn content_counts(&self) -> Result<(usize, usize, usize), Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT (SELECT COUNT(*) FROM fragments) AS fragments,
                   (SELECT COUNT(*) FROM memes) AS memes,
                   (SELECT COUNT(*) FROM laws) AS laws
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        let count = |col: &str| -> Result<usize, PostgresError> {
            Ok(row.try_get::<i64, _>(col)?.max(0) as usize)
        };
        Ok((count("fragments")?, count("memes")?, count("laws")?))
    }
}

#[async_trait]
impl ExcuseStore for PostgresStore {
    async fn insert_excuse(&self, excuse: &Excuse) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO excuses (id, context_id, cause_id, consequence_id, recommendation_id,
                                 meme_id, law_id, excuse_type, role, seed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(excuse.id.as_uuid())
        .bind(excuse.context.map(|id| id.as_uuid()))
        .bind(excuse.cause.map(|id| id.as_uuid()))
        .bind(excuse.consequence.map(|id| id.as_uuid()))
        .bind(excuse.recommendation.map(|id| id.as_uuid()))
        .bind(excuse.meme.map(|id| id.as_uuid()))
        .bind(excuse.law.map(|id| id.as_uuid()))
        .bind(excuse.excuse_type.as_str())
        .bind(excuse.role.map(|r| r.as_str()))
        .bind(excuse.seed)
        .bind(excuse.created_at)
        .bind(excuse.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_excuse(&self, id: &ExcuseId) -> Result<Option<Excuse>, Self::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM excuses WHERE id = $1", EXCUSE_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_excuse_row).transpose()
    }

    async fn list_excuses(&self) -> Result<Vec<Excuse>, Self::Error> {
        sqlx::query(&format!("SELECT {} FROM excuses ORDER BY created_at, id", EXCUSE_COLUMNS))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(Self::parse_excuse_row)
            .collect()
    }
}
