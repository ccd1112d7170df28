//! Meal plan tasks.
//!
//! ```text
//! meal_plans ◄── meal_plan_events ◄── meal_plan_options ◄── meal_plan_tasks ──► recipe_prep_tasks
//!     $1                                     (joined, with its meal)              (joined)
//! ```
//! Tasks are never archived; they end in a terminal status instead.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::error::DbResult;
use crate::queries::meal_plans::MealPlanOptionWithMealRow;
use crate::queries::recipe_prep_tasks::RecipePrepTaskRow;
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional};

table_row! {
    pub struct MealPlanTaskRow {
        pub id: String,
        pub belongs_to_meal_plan_option: String,
        pub belongs_to_recipe_prep_task: String,
        pub creation_explanation: String,
        pub status: String,
        pub status_explanation: String,
        pub assigned_to_user: Option<String>,
        pub completed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
    }
}

/// The option's meal lands under `meal_plan_option_meal_`.
pub type MealPlanTaskWideRow = (MealPlanTaskRow, MealPlanOptionWithMealRow, RecipePrepTaskRow);

macro_rules! task_select {
    () => {
        concat!(
            "SELECT ", meal_plan_task_columns!("meal_plan_tasks", ""), ", ",
            meal_plan_option_columns!("meal_plan_options", "meal_plan_option_"), ", ",
            meal_columns!("meals", "meal_plan_option_meal_"), ", ",
            recipe_prep_task_columns!("recipe_prep_tasks", "recipe_prep_task_"),
            " FROM meal_plan_tasks",
            " JOIN meal_plan_options ON meal_plan_options.id = meal_plan_tasks.belongs_to_meal_plan_option",
            " JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event",
            " JOIN meals ON meals.id = meal_plan_options.meal_id",
            " JOIN recipe_prep_tasks ON recipe_prep_tasks.id = meal_plan_tasks.belongs_to_recipe_prep_task"
        )
    };
}

/// `$1` plan, `$2` task.
pub const MEAL_PLAN_TASK_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plan_tasks.id FROM meal_plan_tasks
    JOIN meal_plan_options ON meal_plan_options.id = meal_plan_tasks.belongs_to_meal_plan_option
    JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event
    WHERE meal_plan_options.archived_at IS NULL
    AND meal_plan_events.archived_at IS NULL
    AND meal_plan_events.belongs_to_meal_plan = $1
    AND meal_plan_tasks.id = $2
)";

pub const GET_MEAL_PLAN_TASK: &str = concat!(
    task_select!(),
    " WHERE meal_plan_options.archived_at IS NULL",
    " AND meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = $1",
    " AND meal_plan_tasks.id = $2"
);

pub const GET_MEAL_PLAN_TASKS_FOR_MEAL_PLAN: &str = concat!(
    task_select!(),
    " WHERE meal_plan_options.archived_at IS NULL",
    " AND meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = $1",
    " ORDER BY meal_plan_tasks.created_at, meal_plan_tasks.id"
);

pub const GET_INCOMPLETE_MEAL_PLAN_TASKS_FOR_OPTION: &str = concat!(
    task_select!(),
    " WHERE meal_plan_tasks.belongs_to_meal_plan_option = $1",
    " AND meal_plan_tasks.completed_at IS NULL",
    " AND meal_plan_tasks.status IN ('unfinished', 'postponed')",
    " ORDER BY meal_plan_tasks.created_at, meal_plan_tasks.id"
);

pub const CREATE_MEAL_PLAN_TASK: &str = "INSERT INTO meal_plan_tasks (
    id, belongs_to_meal_plan_option, belongs_to_recipe_prep_task, creation_explanation,
    status, status_explanation, assigned_to_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

/// `$1` task, `$2` status, `$3` explanation, `$4` completed_at, `$5` now.
pub const CHANGE_MEAL_PLAN_TASK_STATUS: &str = "UPDATE meal_plan_tasks SET
    status = $2, status_explanation = $3, completed_at = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE id = $1";

pub const MARK_TASKS_CREATED: &str = "UPDATE meal_plans SET
    tasks_created = TRUE, last_updated_at = GREATEST($2, created_at)
WHERE archived_at IS NULL AND id = $1";

pub async fn meal_plan_task_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    task_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(MEAL_PLAN_TASK_EXISTS).bind(meal_plan_id).bind(task_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_task<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    task_id: &str,
) -> DbResult<Option<MealPlanTaskWideRow>> {
    fetch_optional(
        sqlx::query(GET_MEAL_PLAN_TASK).bind(meal_plan_id).bind(task_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_tasks_for_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
) -> DbResult<Vec<MealPlanTaskWideRow>> {
    fetch_all(sqlx::query(GET_MEAL_PLAN_TASKS_FOR_MEAL_PLAN).bind(meal_plan_id), exec).await
}

pub async fn get_incomplete_meal_plan_tasks_for_option<'e, E: PgExecutor<'e>>(
    exec: E,
    option_id: &str,
) -> DbResult<Vec<MealPlanTaskWideRow>> {
    fetch_all(
        sqlx::query(GET_INCOMPLETE_MEAL_PLAN_TASKS_FOR_OPTION).bind(option_id),
        exec,
    )
    .await
}

pub async fn create_meal_plan_task<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanTaskRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_MEAL_PLAN_TASK)
        .bind(&row.id)
        .bind(&row.belongs_to_meal_plan_option)
        .bind(&row.belongs_to_recipe_prep_task)
        .bind(&row.creation_explanation)
        .bind(&row.status)
        .bind(&row.status_explanation)
        .bind(&row.assigned_to_user)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn change_meal_plan_task_status<'e, E: PgExecutor<'e>>(
    exec: E,
    task_id: &str,
    status: &str,
    status_explanation: &str,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(CHANGE_MEAL_PLAN_TASK_STATUS)
        .bind(task_id)
        .bind(status)
        .bind(status_explanation)
        .bind(completed_at)
        .bind(now);
    execute(query, exec).await
}

pub async fn mark_tasks_created<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    execute(sqlx::query(MARK_TASKS_CREATED).bind(meal_plan_id).bind(now), exec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_is_nested_under_the_option_prefix() {
        assert!(GET_MEAL_PLAN_TASK.contains("meals.id AS meal_plan_option_meal_id"));
        assert!(GET_MEAL_PLAN_TASK.contains("meal_plan_options.id AS meal_plan_option_id"));
        assert!(GET_MEAL_PLAN_TASK.contains("recipe_prep_tasks.id AS recipe_prep_task_id"));
    }

    #[test]
    fn test_plan_scoped_reads_check_the_plan() {
        for sql in [MEAL_PLAN_TASK_EXISTS, GET_MEAL_PLAN_TASK, GET_MEAL_PLAN_TASKS_FOR_MEAL_PLAN] {
            assert!(sql.contains("meal_plan_events.belongs_to_meal_plan = $1"), "{sql}");
        }
    }

    #[test]
    fn test_incomplete_tasks_are_the_open_statuses() {
        assert!(GET_INCOMPLETE_MEAL_PLAN_TASKS_FOR_OPTION
            .contains("status IN ('unfinished', 'postponed')"));
    }
}
