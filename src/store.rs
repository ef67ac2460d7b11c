use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::create_timestamp;
use crate::judge::{AcceptedSink, JudgeVerdict, Submitter};

const DATABASE_NAME: &str = "judge_relay.sqlite3";

pub fn get_db_path() -> anyhow::Result<PathBuf> {
    use directories::ProjectDirs;

    let proj_dirs = ProjectDirs::from("", "", "judge_relay")
        .ok_or_else(|| anyhow::anyhow!("Unable to find user directory"))?;
    let data_dir = proj_dirs.data_local_dir();

    fs::create_dir_all(data_dir)?;

    Ok(data_dir.join(DATABASE_NAME))
}

pub async fn init_db(db_path: impl AsRef<Path>) -> sqlx::Result<SqlitePool> {
    let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display()); // rwc = read/write/create
    let db_pool = init_pool(&db_url).await?;

    log::info!("Initialized database at {}", db_path.as_ref().display());

    Ok(db_pool)
}

/// Connects to `db_url` and creates the schema if missing
pub async fn init_pool(db_url: &str) -> sqlx::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .connect(db_url)
        .await?;

    for pragma_sql in &["PRAGMA busy_timeout = 2000;", "PRAGMA synchronous = NORMAL;"] {
        sqlx::query(pragma_sql).execute(&db_pool).await?;
    }

    let mut tx = db_pool.begin().await?;

    for sql in &[
        r"
        CREATE TABLE IF NOT EXISTS accepted_solutions (
            id            INTEGER  PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER  NOT NULL,
            problem_id    INTEGER  NOT NULL,
            language      TEXT     NOT NULL,
            source_code   TEXT     NOT NULL,
            total_time_ms INTEGER  NOT NULL,
            created_time  TEXT     NOT NULL
        );",
        "CREATE INDEX IF NOT EXISTS idx_solutions_user ON accepted_solutions(user_id, problem_id);",
        r"
        CREATE TABLE IF NOT EXISTS user_stats (
            user_id        INTEGER  PRIMARY KEY,
            accepted_count INTEGER  NOT NULL,
            total_time_ms  INTEGER  NOT NULL,
            updated_time   TEXT     NOT NULL
        );",
    ] {
        sqlx::query(sql).execute(tx.as_mut()).await?;
    }

    tx.commit().await?;
    Ok(db_pool)
}

pub fn remove_db(db_path: impl AsRef<Path>) {
    // Remove WAL and SHM files (ignore errors as they might not exist)
    let wal_path = format!("{}-wal", db_path.as_ref().display());
    let shm_path = format!("{}-shm", db_path.as_ref().display());
    let _ = fs::remove_file(wal_path);
    let _ = fs::remove_file(shm_path);

    if let Err(e) = fs::remove_file(&db_path) {
        log::warn!(
            "Unable to remove database at {}: {e}",
            db_path.as_ref().display()
        );
    } else {
        log::info!("Removed database at {}", db_path.as_ref().display());
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user_id: i64,
    pub accepted_count: i64,
    pub total_time_ms: i64,
    pub updated_time: String,
}

/// SQLite-backed record of accepted solutions and per-user statistics
#[derive(Clone)]
pub struct SolutionStore {
    pool: SqlitePool,
}

impl SolutionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn fetch_user_stats(&self, user_id: u32) -> sqlx::Result<Option<UserStats>> {
        sqlx::query_as::<_, UserStats>(
            r"
            SELECT user_id, accepted_count, total_time_ms, updated_time
            FROM user_stats
            WHERE user_id = ?
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn count_solutions(&self, submitter: &Submitter) -> sqlx::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM accepted_solutions WHERE user_id = ? AND problem_id = ?",
        )
        .bind(submitter.user_id)
        .bind(submitter.problem_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl AcceptedSink for SolutionStore {
    async fn persist_solution(
        &self,
        submitter: &Submitter,
        source_code: &str,
        verdict: &JudgeVerdict,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO accepted_solutions
                (user_id, problem_id, language, source_code, total_time_ms, created_time)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(submitter.user_id)
        .bind(submitter.problem_id)
        .bind(&verdict.language)
        .bind(source_code)
        .bind(verdict.aggregate_time_ms as i64)
        .bind(create_timestamp())
        .execute(&self.pool)
        .await?;

        log::info!(
            "Stored accepted solution of user {} for problem {}",
            submitter.user_id,
            submitter.problem_id
        );
        Ok(())
    }

    async fn update_statistics(
        &self,
        submitter: &Submitter,
        verdict: &JudgeVerdict,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_stats (user_id, accepted_count, total_time_ms, updated_time)
            VALUES (?, 1, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                accepted_count = accepted_count + 1,
                total_time_ms  = total_time_ms + excluded.total_time_ms,
                updated_time   = excluded.updated_time
            ",
        )
        .bind(submitter.user_id)
        .bind(verdict.aggregate_time_ms as i64)
        .bind(create_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
