use super::{InsertOutcome, LinkRepository};
use crate::error::{AppError, AppResult};
use crate::models::Link;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;

const LINK_COLUMNS: &str = "code, target_url, total_clicks, last_clicked_at, created_at";

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgLinkRepository {
    pool: PgPool,
}

impl PgLinkRepository {
    /// Create a new repository with a bounded connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn exists(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM links WHERE code = $1)
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn insert_if_absent(
        &self,
        code: &str,
        target_url: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<InsertOutcome> {
        // ON CONFLICT makes the primary key the arbiter: a racing insert of the
        // same code returns no row instead of a second link.
        let result = sqlx::query_as::<_, Link>(&format!(
            r#"
            INSERT INTO links (code, target_url, total_clicks, created_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (code) DO NOTHING
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(target_url)
        .bind(created_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match result {
            Some(link) => InsertOutcome::Inserted(link),
            None => InsertOutcome::AlreadyExists,
        })
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Link>> {
        let result = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE code = $1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn delete_by_code(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM links WHERE code = $1
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> AppResult<Vec<Link>> {
        let results = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            ORDER BY created_at DESC, code ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn increment_click(&self, code: &str) -> AppResult<Option<Link>> {
        let now = Utc::now();

        // Single statement: concurrent clicks on one code serialize on the row
        // lock. GREATEST keeps last_clicked_at from moving backwards when app
        // clocks disagree.
        let result = sqlx::query_as::<_, Link>(&format!(
            r#"
            UPDATE links
            SET total_clicks = total_clicks + 1,
                last_clicked_at = GREATEST(last_clicked_at, $1)
            WHERE code = $2
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
