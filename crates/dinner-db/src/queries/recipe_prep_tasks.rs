//! Recipe prep tasks and the steps each one covers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional};

table_row! {
    pub struct RecipePrepTaskRow joined as "recipe_prep_task_" {
        pub id: String,
        pub name: String,
        pub description: String,
        pub notes: String,
        pub optional: bool,
        pub explicit_storage_instructions: String,
        pub minimum_storage_temperature_in_celsius: Option<Decimal>,
        pub maximum_storage_temperature_in_celsius: Option<Decimal>,
        pub storage_type: Option<String>,
        pub minimum_time_buffer_before_recipe_in_seconds: i64,
        pub maximum_time_buffer_before_recipe_in_seconds: Option<i64>,
        pub belongs_to_recipe: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct RecipePrepTaskStepRow {
        pub id: String,
        pub belongs_to_recipe_step: String,
        pub belongs_to_recipe_prep_task: String,
        pub satisfies_recipe_step: bool,
    }
}

// =============================================================================
// Tasks
// =============================================================================

/// `$1` recipe, `$2` task.
pub const RECIPE_PREP_TASK_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_prep_tasks.id FROM recipe_prep_tasks
    WHERE recipe_prep_tasks.archived_at IS NULL
    AND recipe_prep_tasks.belongs_to_recipe = $1
    AND recipe_prep_tasks.id = $2
)";

pub const GET_RECIPE_PREP_TASK: &str = concat!(
    "SELECT ", recipe_prep_task_columns!("recipe_prep_tasks", ""),
    " FROM recipe_prep_tasks WHERE recipe_prep_tasks.archived_at IS NULL",
    " AND recipe_prep_tasks.belongs_to_recipe = $1 AND recipe_prep_tasks.id = $2"
);

pub const GET_RECIPE_PREP_TASKS_FOR_RECIPE: &str = concat!(
    "SELECT ", recipe_prep_task_columns!("recipe_prep_tasks", ""),
    " FROM recipe_prep_tasks WHERE recipe_prep_tasks.archived_at IS NULL",
    " AND recipe_prep_tasks.belongs_to_recipe = $1",
    " ORDER BY recipe_prep_tasks.created_at, recipe_prep_tasks.id"
);

pub const CREATE_RECIPE_PREP_TASK: &str = "INSERT INTO recipe_prep_tasks (
    id, name, description, notes, optional, explicit_storage_instructions,
    minimum_storage_temperature_in_celsius, maximum_storage_temperature_in_celsius,
    storage_type, minimum_time_buffer_before_recipe_in_seconds,
    maximum_time_buffer_before_recipe_in_seconds, belongs_to_recipe, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)";

pub const UPDATE_RECIPE_PREP_TASK: &str = "UPDATE recipe_prep_tasks SET
    name = $2, description = $3, notes = $4, optional = $5,
    explicit_storage_instructions = $6, minimum_storage_temperature_in_celsius = $7,
    maximum_storage_temperature_in_celsius = $8, storage_type = $9,
    minimum_time_buffer_before_recipe_in_seconds = $10,
    maximum_time_buffer_before_recipe_in_seconds = $11,
    last_updated_at = GREATEST($13, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe = $12";

pub const ARCHIVE_RECIPE_PREP_TASK: &str = "UPDATE recipe_prep_tasks SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe = $1 AND id = $2";

/// Binds `$1` (id) through `$12` (belongs_to_recipe).
fn bind_recipe_prep_task<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipePrepTaskRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.notes)
        .bind(row.optional)
        .bind(&row.explicit_storage_instructions)
        .bind(row.minimum_storage_temperature_in_celsius)
        .bind(row.maximum_storage_temperature_in_celsius)
        .bind(&row.storage_type)
        .bind(row.minimum_time_buffer_before_recipe_in_seconds)
        .bind(row.maximum_time_buffer_before_recipe_in_seconds)
        .bind(&row.belongs_to_recipe)
}

pub async fn recipe_prep_task_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    task_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(RECIPE_PREP_TASK_EXISTS).bind(recipe_id).bind(task_id),
        exec,
    )
    .await
}

pub async fn get_recipe_prep_task<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    task_id: &str,
) -> DbResult<Option<RecipePrepTaskRow>> {
    fetch_optional(
        sqlx::query(GET_RECIPE_PREP_TASK).bind(recipe_id).bind(task_id),
        exec,
    )
    .await
}

pub async fn get_recipe_prep_tasks_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
) -> DbResult<Vec<RecipePrepTaskRow>> {
    fetch_all(sqlx::query(GET_RECIPE_PREP_TASKS_FOR_RECIPE).bind(recipe_id), exec).await
}

pub async fn create_recipe_prep_task<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipePrepTaskRow,
) -> DbResult<u64> {
    let query = bind_recipe_prep_task(sqlx::query(CREATE_RECIPE_PREP_TASK), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_prep_task<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipePrepTaskRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_prep_task(sqlx::query(UPDATE_RECIPE_PREP_TASK), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_prep_task<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    task_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_PREP_TASK).bind(recipe_id).bind(task_id),
        exec,
    )
    .await
}

// =============================================================================
// Task Steps
// =============================================================================

pub const GET_RECIPE_PREP_TASK_STEPS_FOR_TASKS: &str = concat!(
    "SELECT ", recipe_prep_task_step_columns!("recipe_prep_task_steps", ""),
    " FROM recipe_prep_task_steps",
    " WHERE recipe_prep_task_steps.belongs_to_recipe_prep_task = ANY($1)",
    " ORDER BY recipe_prep_task_steps.belongs_to_recipe_prep_task, recipe_prep_task_steps.id"
);

pub const CREATE_RECIPE_PREP_TASK_STEP: &str = "INSERT INTO recipe_prep_task_steps (
    id, belongs_to_recipe_step, belongs_to_recipe_prep_task, satisfies_recipe_step
) VALUES ($1, $2, $3, $4)";

pub async fn get_recipe_prep_task_steps_for_tasks<'e, E: PgExecutor<'e>>(
    exec: E,
    task_ids: &[String],
) -> DbResult<Vec<RecipePrepTaskStepRow>> {
    fetch_all(
        sqlx::query(GET_RECIPE_PREP_TASK_STEPS_FOR_TASKS).bind(task_ids),
        exec,
    )
    .await
}

pub async fn create_recipe_prep_task_step<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipePrepTaskStepRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_RECIPE_PREP_TASK_STEP)
        .bind(&row.id)
        .bind(&row.belongs_to_recipe_step)
        .bind(&row.belongs_to_recipe_prep_task)
        .bind(row.satisfies_recipe_step);
    execute(query, exec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_reads_are_scoped_to_the_recipe() {
        for sql in [RECIPE_PREP_TASK_EXISTS, GET_RECIPE_PREP_TASK, ARCHIVE_RECIPE_PREP_TASK] {
            assert!(sql.contains("belongs_to_recipe = $1"), "{sql}");
        }
    }

    #[test]
    fn test_update_leaves_the_steps_alone() {
        assert!(!UPDATE_RECIPE_PREP_TASK.contains("recipe_prep_task_steps"));
        assert!(UPDATE_RECIPE_PREP_TASK.contains("belongs_to_recipe = $12"));
    }
}
