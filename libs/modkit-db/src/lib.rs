#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! Database handle for the apps catalog.
//!
//! Wraps one SQLx pool (SQLite or PostgreSQL) together with a SeaORM
//! connection built on that same pool, and provides the lowering of
//! `search_core` predicates into SeaORM conditions ([`search`]).
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> modkit_db::Result<()> {
//!     use modkit_db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite://catalog.db", ConnectOpts::default()).await?;
//!     let conn = db.sea();
//!     # let _ = conn;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

#[cfg(feature = "sea-orm")]
pub mod search;

use std::time::Duration;

#[cfg(any(feature = "pg", feature = "sqlite"))]
use sqlx::pool::PoolOptions;
#[cfg(feature = "pg")]
use sqlx::PgPool;
#[cfg(feature = "sqlite")]
use sqlx::SqlitePool;

#[cfg(feature = "sea-orm")]
use sea_orm::DatabaseConnection;
#[cfg(all(feature = "sea-orm", feature = "pg"))]
use sea_orm::SqlxPostgresConnector;
#[cfg(all(feature = "sea-orm", feature = "sqlite"))]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;
use tracing::{debug, info};

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[cfg(feature = "sea-orm")]
    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    /// SQLite only; ignored for in-memory databases.
    pub busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            busy_timeout: Some(Duration::from_millis(DEFAULT_SQLITE_BUSY_TIMEOUT_MS)),
            create_sqlite_dirs: true,
        }
    }
}

impl ConnectOpts {
    /// Options for a private in-memory SQLite database. Every pooled
    /// connection would otherwise see its own empty database, so the pool
    /// is pinned to one connection.
    pub fn single_connection() -> Self {
        Self {
            max_conns: Some(1),
            min_conns: Some(1),
            idle_timeout: None,
            ..Self::default()
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    #[cfg(feature = "sea-orm")]
    sea: DatabaseConnection,
}

const DEFAULT_SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

#[cfg(feature = "sqlite")]
fn is_sqlite_memory(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        debug!(?engine, "connecting to database");
        let handle = match engine {
            DbEngine::Postgres => connect_postgres(dsn, &opts).await?,
            DbEngine::Sqlite => connect_sqlite(dsn, &opts).await?,
        };
        info!(?engine, "database connected");
        Ok(handle)
    }

    /// Graceful pool close.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Get the DSN used for this connection.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match self.pool {
            DbPool::Sqlite(ref p) => Some(p),
            #[cfg(feature = "pg")]
            _ => None,
        }
    }

    /// Get SeaORM connection (clone; cheap handle).
    #[cfg(feature = "sea-orm")]
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }
}

// ===================== helpers =====================

/// Knobs shared by every driver.
#[cfg(any(feature = "pg", feature = "sqlite"))]
fn pool_options<DB: sqlx::Database>(opts: &ConnectOpts) -> PoolOptions<DB> {
    let mut o = PoolOptions::<DB>::new();
    if let Some(n) = opts.max_conns {
        o = o.max_connections(n);
    }
    if let Some(n) = opts.min_conns {
        o = o.min_connections(n);
    }
    if let Some(t) = opts.acquire_timeout {
        o = o.acquire_timeout(t);
    }
    o.idle_timeout(opts.idle_timeout)
}

#[cfg(feature = "pg")]
async fn connect_postgres(dsn: &str, opts: &ConnectOpts) -> Result<DbHandle> {
    let pool: PgPool = pool_options(opts).connect(dsn).await?;
    Ok(DbHandle {
        engine: DbEngine::Postgres,
        #[cfg(feature = "sea-orm")]
        sea: SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone()),
        pool: DbPool::Postgres(pool),
        dsn: dsn.to_string(),
    })
}

#[cfg(not(feature = "pg"))]
async fn connect_postgres(_dsn: &str, _opts: &ConnectOpts) -> Result<DbHandle> {
    Err(DbError::FeatureDisabled("PostgreSQL feature not enabled"))
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(dsn: &str, opts: &ConnectOpts) -> Result<DbHandle> {
    let dsn = prepare_sqlite_path(dsn, opts.create_sqlite_dirs)?;
    let memory = is_sqlite_memory(&dsn);
    let busy_ms = opts
        .busy_timeout
        .map_or(DEFAULT_SQLITE_BUSY_TIMEOUT_MS, |d| d.as_millis() as u64);

    let mut o = pool_options::<sqlx::Sqlite>(opts);
    if memory {
        // Closing the last connection would drop the database.
        o = o.idle_timeout(None).max_lifetime(None);
    }
    let o = o.after_connect(move |conn, _meta| {
        Box::pin(async move {
            for pragma in sqlite_pragmas(memory, busy_ms) {
                sqlx::query(&pragma).execute(&mut *conn).await?;
            }
            Ok(())
        })
    });

    let pool: SqlitePool = o.connect(&dsn).await?;
    debug!(memory, "sqlite pool ready");
    Ok(DbHandle {
        engine: DbEngine::Sqlite,
        #[cfg(feature = "sea-orm")]
        sea: SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone()),
        pool: DbPool::Sqlite(pool),
        dsn,
    })
}

#[cfg(not(feature = "sqlite"))]
async fn connect_sqlite(_dsn: &str, _opts: &ConnectOpts) -> Result<DbHandle> {
    Err(DbError::FeatureDisabled("SQLite feature not enabled"))
}

/// Per-connection pragmas. WAL and busy waiting only make sense on files.
/// `LIKE` must compare case-sensitively like `=` does, as it does on Postgres.
#[cfg(feature = "sqlite")]
fn sqlite_pragmas(memory: bool, busy_ms: u64) -> Vec<String> {
    let mut pragmas = vec![
        "PRAGMA foreign_keys = ON".to_string(),
        "PRAGMA case_sensitive_like = ON".to_string(),
    ];
    if memory {
        pragmas.push("PRAGMA journal_mode = DELETE".to_string());
    } else {
        pragmas.push("PRAGMA journal_mode = WAL".to_string());
        pragmas.push(format!("PRAGMA busy_timeout = {busy_ms}"));
    }
    pragmas
}


#[cfg(feature = "sqlite")]
fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> Result<String> {
    if !create_dirs || is_sqlite_memory(dsn) {
        return Ok(dsn.to_string());
    }

    // Handles "sqlite:/path" and "sqlite://path"; URI forms like
    // "sqlite:file:name?..." have no directory to create.
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);

    if !raw.starts_with("file:") && !raw.contains('?') {
        if let Some(parent) = std::path::Path::new(raw).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    // sqlx refuses to open a missing file unless asked to create it.
    if raw.contains('?') {
        Ok(dsn.to_string())
    } else {
        Ok(format!("{dsn}?mode=rwc"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_memory_connection() -> Result<()> {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::single_connection()).await?;
        assert_eq!(db.engine(), DbEngine::Sqlite);

        let pool = db.sqlx_sqlite().expect("sqlite pool");
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(pool)
            .await?;
        sqlx::query("INSERT INTO t (name) VALUES (?)")
            .bind("catalog")
            .execute(pool)
            .await?;
        let row: (i64, String) = sqlx::query_as("SELECT id, name FROM t WHERE id = 1")
            .fetch_one(pool)
            .await?;
        assert_eq!(row, (1, "catalog".to_string()));
        db.close().await;
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_file_creates_parent_dirs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("catalog.db");
        let dsn = format!("sqlite://{}", path.display());
        let db = DbHandle::connect(&dsn, ConnectOpts::default()).await?;
        assert!(path.parent().is_some_and(|p| p.exists()));
        assert!(db.dsn().ends_with("?mode=rwc"));
        db.close().await;
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn memory_databases_skip_wal() {
        let memory = sqlite_pragmas(true, 100);
        assert!(memory.iter().all(|p| !p.contains("WAL") && !p.contains("busy_timeout")));
        let file = sqlite_pragmas(false, 250);
        assert!(file.contains(&"PRAGMA busy_timeout = 250".to_string()));
        for pragmas in [memory, file] {
            assert!(pragmas.contains(&"PRAGMA case_sensitive_like = ON".to_string()));
        }
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn like_is_case_sensitive() -> Result<()> {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::single_connection()).await?;
        let pool = db.sqlx_sqlite().expect("sqlite pool");
        let (upper, lower): (i64, i64) =
            sqlx::query_as("SELECT 'sleep' LIKE 'SLEEP', 'sleep' LIKE 'sleep'")
                .fetch_one(pool)
                .await?;
        assert_eq!((upper, lower), (0, 1));
        db.close().await;
        Ok(())
    }

    #[test]
    fn test_backend_detection() {
        assert_eq!(DbHandle::detect("sqlite://test.db").unwrap(), DbEngine::Sqlite);
        assert_eq!(DbHandle::detect("sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert_eq!(
            DbHandle::detect("postgres://localhost/test").unwrap(),
            DbEngine::Postgres
        );
        assert!(DbHandle::detect("mysql://localhost/test").is_err());
        assert!(DbHandle::detect("unknown://test").is_err());
    }
}
