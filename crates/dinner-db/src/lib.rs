//! # dinner-db: Data Access Core for Dinner Done Better
//!
//! Every read and write against the PostgreSQL store goes through the
//! [`Querier`] defined here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dinner Done Better Data Flow                         │
//! │                                                                         │
//! │  HTTP handler / worker (outside this workspace)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   dinner-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Querier    │    │  repository/  │    │   queries/   │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ guards, codec │    │ named SQL,   │  │   │
//! │  │   │ PgPool, clock │◄───│ transactions, │───►│ row records, │  │   │
//! │  │   │ IDs, latch    │    │ aggregates    │    │ list filter  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   migrations/postgres/*.sql (embedded)                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Connection details, pool tuning, file/env loading
//! - [`pool`] - The [`Querier`], readiness, migration latch, transactions
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - [`DbError`] and its classification
//! - [`observability`] - Error logging at the repository boundary
//! - [`generators`] - Injected clock, ID and secret sources
//! - [`codec`] - Conversions between entity fields and column types
//! - [`queries`] - Named SQL statements and their row records
//! - [`repository`] - Repository methods, one file per entity family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dinner_db::{DatabaseConfig, Querier};
//!
//! let config = DatabaseConfig::load(None)?;
//! let querier = Querier::provide(config).await?;
//!
//! let plans = querier.get_meal_plans_for_household(&household_id, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod config;
pub mod error;
pub mod generators;
pub mod migrations;
pub mod observability;
pub mod pool;
pub mod queries;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConnectionDetails, DatabaseConfig, PoolSettings};
pub use error::{DbError, DbResult, ErrorKind};
pub use generators::{
    Clock, FixedClock, IdGenerator, RandomSecretGenerator, SecretGenerator, SequentialIdGenerator, SystemClock,
    UuidGenerator,
};
pub use pool::Querier;
pub use repository::fetch_all_rows;
