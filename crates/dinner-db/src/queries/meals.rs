//! Meals and their recipe components.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::recipes::RecipeRow;
use crate::queries::{
    execute, fetch_all, fetch_exists, fetch_ids, fetch_optional, list_query, Counted, ListQuery,
};

table_row! {
    pub struct MealRow joined as "meal_" {
        pub id: String,
        pub name: String,
        pub description: String,
        pub min_estimated_portions: Decimal,
        pub max_estimated_portions: Option<Decimal>,
        pub eligible_for_meal_plans: bool,
        pub created_by_user: String,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct MealComponentRow {
        pub id: String,
        pub meal_id: String,
        pub recipe_id: String,
        pub meal_component_type: String,
        pub recipe_scale: Decimal,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `recipe_id` is selected under both sides and the join keeps them equal.
pub type MealComponentWithRecipeRow = (MealComponentRow, RecipeRow);

// =============================================================================
// Statements
// =============================================================================

pub const MEAL_EXISTS: &str = exists_by_id!("meals");

pub const GET_MEAL: &str = concat!(
    "SELECT ", meal_columns!("meals", ""),
    " FROM meals WHERE meals.archived_at IS NULL AND meals.id = $1"
);

pub const GET_MEALS: &str = concat!(
    "SELECT ", meal_columns!("meals", ""), ", ",
    list_counts!("meals", "TRUE"),
    " FROM meals",
    list_where!("meals", "TRUE")
);

pub const GET_MEALS_CREATED_BY_USER: &str = concat!(
    "SELECT ", meal_columns!("meals", ""), ", ",
    list_counts!("meals", "meals.created_by_user = $8"),
    " FROM meals",
    list_where!("meals", "meals.created_by_user = $8")
);

pub const SEARCH_FOR_MEALS: &str = concat!(
    "SELECT ", meal_columns!("meals", ""),
    " FROM meals WHERE meals.archived_at IS NULL",
    " AND meals.name ILIKE '%' || $1 || '%'",
    " ORDER BY meals.name, meals.id LIMIT $2"
);

pub const CREATE_MEAL: &str = "INSERT INTO meals (
    id, name, description, min_estimated_portions, max_estimated_portions,
    eligible_for_meal_plans, created_by_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const UPDATE_MEAL: &str = "UPDATE meals SET
    name = $2, description = $3, min_estimated_portions = $4, max_estimated_portions = $5,
    eligible_for_meal_plans = $6, last_updated_at = GREATEST($8, created_at)
WHERE archived_at IS NULL AND id = $1 AND created_by_user = $7";

pub const ARCHIVE_MEAL: &str = "UPDATE meals SET archived_at = NOW()
WHERE archived_at IS NULL AND id = $1 AND created_by_user = $2";

pub const GET_MEAL_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("meals");
pub const UPDATE_MEAL_LAST_INDEXED_AT: &str = update_last_indexed_at!("meals");

pub const GET_MEAL_COMPONENTS_FOR_MEALS: &str = concat!(
    "SELECT ", meal_component_columns!("meal_components", ""), ", ",
    recipe_columns!("recipes", "recipe_"),
    " FROM meal_components",
    " JOIN recipes ON recipes.id = meal_components.recipe_id",
    " WHERE meal_components.archived_at IS NULL",
    " AND meal_components.meal_id = ANY($1)",
    " ORDER BY meal_components.created_at, meal_components.id"
);

pub const CREATE_MEAL_COMPONENT: &str = "INSERT INTO meal_components (
    id, meal_id, recipe_id, meal_component_type, recipe_scale, created_at
) VALUES ($1, $2, $3, $4, $5, $6)";

pub const ARCHIVE_MEAL_COMPONENTS: &str = "UPDATE meal_components SET archived_at = NOW()
WHERE archived_at IS NULL AND meal_id = $1";

// =============================================================================
// Meals
// =============================================================================

/// Binds `$1` (id) through `$7` (created_by_user).
fn bind_meal<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q MealRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(row.min_estimated_portions)
        .bind(row.max_estimated_portions)
        .bind(row.eligible_for_meal_plans)
        .bind(&row.created_by_user)
}

pub async fn meal_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(MEAL_EXISTS).bind(id), exec).await
}

pub async fn get_meal<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<Option<MealRow>> {
    fetch_optional(sqlx::query(GET_MEAL).bind(id), exec).await
}

pub async fn get_meals<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<MealRow>>> {
    fetch_all(list_query(GET_MEALS, filter), exec).await
}

pub async fn get_meals_created_by_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<MealRow>>> {
    fetch_all(list_query(GET_MEALS_CREATED_BY_USER, filter).bind(user_id), exec).await
}

pub async fn search_for_meals<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<MealRow>> {
    fetch_all(sqlx::query(SEARCH_FOR_MEALS).bind(name).bind(limit), exec).await
}

pub async fn create_meal<'e, E: PgExecutor<'e>>(exec: E, row: &MealRow) -> DbResult<u64> {
    let query = bind_meal(sqlx::query(CREATE_MEAL), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_meal<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_meal(sqlx::query(UPDATE_MEAL), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_meal<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    meal_id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_MEAL).bind(meal_id).bind(user_id), exec).await
}

pub async fn get_meal_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_MEAL_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_meal_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_MEAL_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Components
// =============================================================================

pub async fn get_meal_components_for_meals<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_ids: &[String],
) -> DbResult<Vec<MealComponentWithRecipeRow>> {
    fetch_all(sqlx::query(GET_MEAL_COMPONENTS_FOR_MEALS).bind(meal_ids), exec).await
}

pub async fn create_meal_component<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealComponentRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_MEAL_COMPONENT)
        .bind(&row.id)
        .bind(&row.meal_id)
        .bind(&row.recipe_id)
        .bind(&row.meal_component_type)
        .bind(row.recipe_scale)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn archive_meal_components<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_MEAL_COMPONENTS).bind(meal_id), exec).await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_meals", sql: GET_MEALS },
    ListQuery { name: "get_meals_created_by_user", sql: GET_MEALS_CREATED_BY_USER },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_writes_are_owned_by_creator() {
        assert!(UPDATE_MEAL.contains("created_by_user = $7"));
        assert!(ARCHIVE_MEAL.contains("created_by_user = $2"));
    }

    #[test]
    fn test_components_join_their_recipe() {
        assert!(GET_MEAL_COMPONENTS_FOR_MEALS.contains("recipes.id AS recipe_id"));
        assert!(GET_MEAL_COMPONENTS_FOR_MEALS.contains("meal_id = ANY($1)"));
    }
}
