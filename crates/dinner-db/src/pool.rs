//! # Connection Pool & Querier
//!
//! The [`Querier`] owns the PostgreSQL pool and every injected collaborator.
//! Repository methods for each entity family live in `repository/` as
//! further `impl Querier` blocks.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Querier Lifecycle                               │
//! │                                                                         │
//! │  DatabaseConfig::load(path)?.validate()                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Querier::provide(config).await ← lazy pool, no connection yet         │
//! │       │                                                                 │
//! │       ├── run_migrations = true ──► migrate() ──► is_ready() pings     │
//! │       │                                  │                              │
//! │       │                                  ▼                              │
//! │       │                          embedded migrations (once)            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │               PgPool                     │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │ ... │       │  (max 7 open, 30m life)   │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Clones share the pool, the generators and the migration latch  │
//! │       ▼                                                                 │
//! │  close().await ← on shutdown                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::LevelFilter;
use sqlx::postgres::PgPoolOptions;
use sqlx::{ConnectOptions, PgPool, Postgres, Transaction};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::{DatabaseConfig, PoolSettings};
use crate::error::{DbError, DbResult};
use crate::generators::{
    Clock, IdGenerator, RandomSecretGenerator, SecretGenerator, SystemClock, UuidGenerator,
};
use crate::migrations;
use crate::observability::prepare_error;

/// Idle connections are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Translates the pool tunables into sqlx options.
///
/// sqlx has no cap on idle connections, only a floor. `max_idle_connections`
/// becomes that floor (bounded by `max_open_connections`): the pool keeps
/// that many connections open and reaps idle ones above it after
/// [`IDLE_TIMEOUT`]. With `max_idle_connections = 0` every idle connection
/// is eventually closed.
fn pool_options(settings: &PoolSettings, debug: bool) -> PgPoolOptions {
    let options = PgPoolOptions::new()
        .max_connections(settings.max_open_connections)
        .min_connections(settings.max_idle_connections.min(settings.max_open_connections))
        .max_lifetime(Some(settings.connection_max_lifetime))
        .idle_timeout(Some(IDLE_TIMEOUT))
        .acquire_timeout(settings.acquire_timeout);

    if !debug {
        return options;
    }

    options
        .after_connect(|_conn, meta| {
            Box::pin(async move {
                info!(age = ?meta.age, "Opened database connection");
                Ok(())
            })
        })
        .before_acquire(|_conn, meta| {
            Box::pin(async move {
                debug!(age = ?meta.age, idle_for = ?meta.idle_for, "Reusing database connection");
                Ok(true)
            })
        })
}

/// The data access core's single entry point.
///
/// Cheap to clone. Immutable after construction apart from the pool itself
/// and the one-shot migration latch.
///
/// ## Usage
/// ```rust,ignore
/// let config = DatabaseConfig::load(None)?;
/// let querier = Querier::provide(config).await?;
///
/// let meal = querier.get_meal("meal-id").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Querier {
    pool: PgPool,
    config: Arc<DatabaseConfig>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    secrets: Arc<dyn SecretGenerator>,
    /// Outcome of the first `migrate()` call, shared by every later caller.
    migrated: Arc<OnceCell<Result<(), String>>>,
}

impl Querier {
    /// Validates the configuration, builds the pool and, when
    /// `run_migrations` is set, migrates.
    ///
    /// ## Returns
    /// * `Ok(Querier)` - Ready to use (connections are opened on demand)
    /// * `Err(DbError::Config)` - The configuration is invalid
    /// * `Err(DbError::MigrationFailed)` - Auto-migration failed
    #[tracing::instrument(skip(config), fields(debug = config.debug))]
    pub async fn provide(config: DatabaseConfig) -> DbResult<Self> {
        config.validate()?;

        if config.debug {
            info!(
                connection = %config.connection_details,
                max_open_connections = config.pool.max_open_connections,
                max_idle_connections = config.pool.max_idle_connections,
                "Initializing database connection"
            );
        } else {
            debug!("Initializing database connection");
        }

        let connect_options = if config.log_queries {
            config
                .connection_details
                .connect_options()
                .log_statements(LevelFilter::Debug)
        } else {
            config
                .connection_details
                .connect_options()
                .disable_statement_logging()
        };

        let pool = pool_options(&config.pool, config.debug).connect_lazy_with(connect_options);

        let querier = Querier::with_pool(pool, config);
        if querier.config.run_migrations {
            querier.migrate().await?;
        }

        Ok(querier)
    }

    /// Wraps an existing pool with default generators.
    pub fn with_pool(pool: PgPool, config: DatabaseConfig) -> Self {
        Querier {
            pool,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            secrets: Arc::new(RandomSecretGenerator::default()),
            migrated: Arc::new(OnceCell::new()),
        }
    }

    /// Replaces the clock and ID/secret generators (tests).
    pub fn with_generators(
        mut self,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        secrets: Arc<dyn SecretGenerator>,
    ) -> Self {
        self.clock = clock;
        self.ids = ids;
        self.secrets = secrets;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    // =========================================================================
    // Readiness & Lifecycle
    // =========================================================================

    /// Pings the server up to `max_ping_attempts` times, waiting
    /// `ping_wait_period` between attempts.
    #[tracing::instrument(skip(self))]
    pub async fn is_ready(&self) -> bool {
        let attempts = self.config.max_ping_attempts.max(1);
        for attempt in 1..=attempts {
            match sqlx::query("SELECT 1").execute(&self.pool).await {
                Ok(_) => return true,
                Err(err) => {
                    debug!(attempt, error = %err, "database not ready yet");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.ping_wait_period).await;
                    }
                }
            }
        }

        warn!(attempts, "database never became ready");
        false
    }

    /// Applies the embedded migrations at most once per process.
    ///
    /// Concurrent callers wait for the first run and observe its outcome,
    /// including its failure.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(&self) -> DbResult<()> {
        let outcome = self
            .migrated
            .get_or_init(|| async {
                if !self.is_ready().await {
                    return Err("database never became ready".to_string());
                }
                migrations::run_migrations(&self.pool)
                    .await
                    .map_err(|err| err.to_string())
            })
            .await;

        outcome
            .clone()
            .map_err(|reason| prepare_error(DbError::MigrationFailed(reason), "migrating database"))
    }

    /// Drops every application table. Integration tests only.
    #[tracing::instrument(skip(self))]
    pub async fn destroy(&self) -> DbResult<()> {
        migrations::drop_all_tables(&self.pool)
            .await
            .map_err(|err| prepare_error(err, "destroying database"))
    }

    /// Closes the pool. Every later call fails with `ConnectionFailed`.
    #[tracing::instrument(skip(self))]
    pub async fn close(&self) {
        if self.config.debug {
            info!(
                open = self.pool.size(),
                idle = self.pool.num_idle(),
                "Closing database connection pool"
            );
        }
        self.pool.close().await;
    }

    // =========================================================================
    // Crate Helpers
    // =========================================================================

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn new_id(&self) -> String {
        self.ids.new_id()
    }

    pub(crate) fn new_secret(&self) -> String {
        self.secrets.generate_secret()
    }

    /// Window after which a searchable row needs reindexing, in seconds.
    pub(crate) fn reindex_window_seconds(&self) -> f64 {
        self.config.reindex_window.as_secs_f64()
    }

    pub(crate) async fn begin(&self, description: &str) -> DbResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|err| prepare_error(err, description))
    }

    pub(crate) async fn commit(
        tx: Transaction<'static, Postgres>,
        description: &str,
    ) -> DbResult<()> {
        tx.commit()
            .await
            .map_err(|err| prepare_error(err, description))
    }

    /// Rolls back once. A failed rollback is logged and otherwise ignored so
    /// the caller can return the error that caused it.
    pub(crate) async fn rollback(tx: Transaction<'static, Postgres>) {
        if let Err(err) = tx.rollback().await {
            error!(error = %err, "rolling back transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionDetails;
    use crate::generators::{FixedClock, SequentialIdGenerator};

    fn config() -> DatabaseConfig {
        DatabaseConfig::new(ConnectionDetails {
            username: "root".to_string(),
            password: "password".to_string(),
            database: "test".to_string(),
            host: "localhost".to_string(),
            port: 1234,
            disable_ssl: true,
        })
        .oauth2_token_encryption_key("example")
        .run_migrations(false)
    }

    #[tokio::test]
    async fn test_provide_is_lazy() {
        let querier = Querier::provide(config()).await.unwrap();
        assert_eq!(querier.config().pool.max_open_connections, 7);
        assert!(!querier.pool().is_closed());
        querier.close().await;
        assert!(querier.pool().is_closed());
    }

    #[test]
    fn test_pool_options_honour_tunables() {
        let options = pool_options(&PoolSettings::default(), false);
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 5);
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(30 * 60)));
        assert_eq!(options.get_idle_timeout(), Some(IDLE_TIMEOUT));
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_pool_options_bound_idle_by_open() {
        let settings = PoolSettings {
            max_idle_connections: 12,
            max_open_connections: 3,
            ..Default::default()
        };
        assert_eq!(pool_options(&settings, true).get_min_connections(), 3);

        let settings = PoolSettings {
            max_idle_connections: 0,
            ..Default::default()
        };
        assert_eq!(pool_options(&settings, false).get_min_connections(), 0);
    }

    #[tokio::test]
    async fn test_provide_rejects_invalid_config() {
        let mut config = config();
        config.oauth2_token_encryption_key.clear();
        let err = Querier::provide(config).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[tokio::test]
    async fn test_generators_are_injected() {
        let now = Utc::now();
        let querier = Querier::provide(config()).await.unwrap().with_generators(
            Arc::new(FixedClock(now)),
            Arc::new(SequentialIdGenerator::new("test")),
            Arc::new(RandomSecretGenerator::new(4)),
        );
        assert_eq!(querier.now(), now);
        assert_eq!(querier.new_id(), "test-1");
        assert_eq!(querier.new_secret().len(), 8);
    }

    #[tokio::test]
    async fn test_failed_migration_is_memoized() {
        let config = config().ping(1, Duration::from_millis(1));
        let querier = Querier::provide(config).await.unwrap();

        let first = querier.migrate().await.unwrap_err();
        let second = querier.migrate().await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
    }
}
