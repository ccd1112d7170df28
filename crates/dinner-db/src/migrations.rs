//! # Database Migrations
//!
//! Embedded SQL migrations for the Dinner Done Better schema.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Querier::migrate()  (at most once per process)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  is_ready() ← ping until the server answers                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       ├── 0001_initial_schema.sql  ⬜ → applied in its own transaction │
//! │       └── 0002_grocery_lists_and_prep_tasks.sql                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result memoized: every later caller sees the same outcome             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Tables owned by the schema, children before parents.
pub const APPLICATION_TABLES: &[&str] = &[
    "household_instrument_ownerships",
    "user_ingredient_preferences",
    "meal_plan_grocery_list_items",
    "meal_plan_tasks",
    "recipe_prep_task_steps",
    "recipe_prep_tasks",
    "meal_plan_option_votes",
    "meal_plan_options",
    "meal_plan_events",
    "meal_plans",
    "meal_components",
    "meals",
    "recipe_ratings",
    "recipe_media",
    "recipe_step_completion_condition_ingredients",
    "recipe_step_completion_conditions",
    "recipe_step_vessels",
    "recipe_step_instruments",
    "recipe_step_ingredients",
    "recipe_step_products",
    "recipe_steps",
    "recipes",
    "valid_measurement_unit_conversions",
    "valid_ingredient_state_ingredients",
    "valid_ingredient_states",
    "valid_preparation_vessels",
    "valid_preparation_instruments",
    "valid_ingredient_preparations",
    "valid_ingredient_measurement_units",
    "valid_ingredient_group_members",
    "valid_ingredient_groups",
    "valid_vessels",
    "valid_preparations",
    "valid_measurement_units",
    "valid_instruments",
    "valid_ingredients",
    "webhooks",
    "service_setting_configurations",
    "service_settings",
    "audit_log_entries",
    "household_invitations",
    "household_user_memberships",
    "households",
    "users",
    "_sqlx_migrations",
];

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Drops every application table. Integration tests only.
pub async fn drop_all_tables(pool: &PgPool) -> DbResult<()> {
    for table in APPLICATION_TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table} CASCADE"))
            .execute(pool)
            .await?;
    }
    info!(tables = APPLICATION_TABLES.len(), "Dropped application tables");
    Ok(())
}
