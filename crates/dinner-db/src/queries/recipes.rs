//! Recipes, recipe steps, recipe media and recipe ratings.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::valid_enumerations::ValidPreparationRow;
use crate::queries::{
    execute, fetch_all, fetch_exists, fetch_ids, fetch_optional, list_query, Counted, ListQuery,
};

// =============================================================================
// Recipes
// =============================================================================

table_row! {
    pub struct RecipeRow joined as "recipe_" {
        pub id: String,
        pub name: String,
        pub slug: String,
        pub source: String,
        pub description: String,
        pub inspired_by_recipe_id: Option<String>,
        pub min_estimated_portions: Decimal,
        pub max_estimated_portions: Option<Decimal>,
        pub portion_name: String,
        pub plural_portion_name: String,
        pub seal_of_approval: bool,
        pub eligible_for_meals: bool,
        pub yields_component_type: String,
        pub created_by_user: String,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const RECIPE_EXISTS: &str = exists_by_id!("recipes");

pub const GET_RECIPE: &str = concat!(
    "SELECT ", recipe_columns!("recipes", ""),
    " FROM recipes WHERE recipes.archived_at IS NULL AND recipes.id = $1"
);

pub const GET_RECIPES: &str = concat!(
    "SELECT ", recipe_columns!("recipes", ""), ", ",
    list_counts!("recipes", "TRUE"),
    " FROM recipes",
    list_where!("recipes", "TRUE")
);

pub const GET_RECIPES_CREATED_BY_USER: &str = concat!(
    "SELECT ", recipe_columns!("recipes", ""), ", ",
    list_counts!("recipes", "recipes.created_by_user = $8"),
    " FROM recipes",
    list_where!("recipes", "recipes.created_by_user = $8")
);

pub const SEARCH_FOR_RECIPES: &str = concat!(
    "SELECT ", recipe_columns!("recipes", ""),
    " FROM recipes WHERE recipes.archived_at IS NULL",
    " AND recipes.name ILIKE '%' || $1 || '%'",
    " ORDER BY recipes.name, recipes.id LIMIT $2"
);

pub const CREATE_RECIPE: &str = "INSERT INTO recipes (
    id, name, slug, source, description, inspired_by_recipe_id, min_estimated_portions,
    max_estimated_portions, portion_name, plural_portion_name, seal_of_approval,
    eligible_for_meals, yields_component_type, created_by_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)";

pub const UPDATE_RECIPE: &str = "UPDATE recipes SET
    name = $2, slug = $3, source = $4, description = $5, inspired_by_recipe_id = $6,
    min_estimated_portions = $7, max_estimated_portions = $8, portion_name = $9,
    plural_portion_name = $10, seal_of_approval = $11, eligible_for_meals = $12,
    yields_component_type = $13, last_updated_at = GREATEST($15, created_at)
WHERE archived_at IS NULL AND id = $1 AND created_by_user = $14";

pub const ARCHIVE_RECIPE: &str = "UPDATE recipes SET archived_at = NOW()
WHERE archived_at IS NULL AND id = $1 AND created_by_user = $2";

pub const GET_RECIPE_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("recipes");
pub const UPDATE_RECIPE_LAST_INDEXED_AT: &str = update_last_indexed_at!("recipes");

/// Binds `$1` (id) through `$14` (created_by_user).
fn bind_recipe<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.slug)
        .bind(&row.source)
        .bind(&row.description)
        .bind(&row.inspired_by_recipe_id)
        .bind(row.min_estimated_portions)
        .bind(row.max_estimated_portions)
        .bind(&row.portion_name)
        .bind(&row.plural_portion_name)
        .bind(row.seal_of_approval)
        .bind(row.eligible_for_meals)
        .bind(&row.yields_component_type)
        .bind(&row.created_by_user)
}

pub async fn recipe_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(RECIPE_EXISTS).bind(id), exec).await
}

pub async fn get_recipe<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<Option<RecipeRow>> {
    fetch_optional(sqlx::query(GET_RECIPE).bind(id), exec).await
}

pub async fn get_recipes<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<RecipeRow>>> {
    fetch_all(list_query(GET_RECIPES, filter), exec).await
}

pub async fn get_recipes_created_by_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<RecipeRow>>> {
    fetch_all(list_query(GET_RECIPES_CREATED_BY_USER, filter).bind(user_id), exec).await
}

pub async fn search_for_recipes<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<RecipeRow>> {
    fetch_all(sqlx::query(SEARCH_FOR_RECIPES).bind(name).bind(limit), exec).await
}

pub async fn create_recipe<'e, E: PgExecutor<'e>>(exec: E, row: &RecipeRow) -> DbResult<u64> {
    let query = bind_recipe(sqlx::query(CREATE_RECIPE), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe(sqlx::query(UPDATE_RECIPE), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    recipe_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE).bind(recipe_id).bind(user_id),
        exec,
    )
    .await
}

pub async fn get_recipe_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_RECIPE_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_recipe_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_RECIPE_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Steps
// =============================================================================

table_row! {
    pub struct RecipeStepRow {
        pub id: String,
        pub index: i32,
        pub preparation_id: String,
        pub minimum_estimated_time_in_seconds: Option<i64>,
        pub maximum_estimated_time_in_seconds: Option<i64>,
        pub minimum_temperature_in_celsius: Option<Decimal>,
        pub maximum_temperature_in_celsius: Option<Decimal>,
        pub notes: String,
        pub explicit_instructions: String,
        pub condition_expression: String,
        pub optional: bool,
        pub start_timer_automatically: bool,
        pub belongs_to_recipe: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// A step and the preparation it applies.
pub type RecipeStepWithPreparationRow = (RecipeStepRow, ValidPreparationRow);

macro_rules! recipe_step_select {
    () => {
        concat!(
            "SELECT ", recipe_step_columns!("recipe_steps", ""), ", ",
            valid_preparation_columns!("valid_preparations", "valid_preparation_")
        )
    };
}

macro_rules! recipe_step_from {
    () => {
        concat!(
            " FROM recipe_steps",
            " JOIN recipes ON recipes.id = recipe_steps.belongs_to_recipe",
            " JOIN valid_preparations ON valid_preparations.id = recipe_steps.preparation_id"
        )
    };
}

/// `$1` recipe, `$2` step.
pub const RECIPE_STEP_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_steps.id FROM recipe_steps
    JOIN recipes ON recipes.id = recipe_steps.belongs_to_recipe
    WHERE recipe_steps.archived_at IS NULL
    AND recipes.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_steps.id = $2
)";

pub const GET_RECIPE_STEP: &str = concat!(
    recipe_step_select!(),
    recipe_step_from!(),
    " WHERE recipe_steps.archived_at IS NULL",
    " AND recipes.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_steps.id = $2"
);

/// Every live step of one recipe, in step order.
pub const GET_ALL_RECIPE_STEPS_FOR_RECIPE: &str = concat!(
    recipe_step_select!(),
    recipe_step_from!(),
    " WHERE recipe_steps.archived_at IS NULL",
    " AND recipes.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " ORDER BY recipe_steps.index, recipe_steps.created_at, recipe_steps.id"
);

pub const GET_RECIPE_STEPS: &str = concat!(
    recipe_step_select!(), ", ",
    list_counts!("recipe_steps", "recipe_steps.belongs_to_recipe = $8"),
    recipe_step_from!(),
    list_where!("recipe_steps", "recipe_steps.belongs_to_recipe = $8")
);

pub const CREATE_RECIPE_STEP: &str = "INSERT INTO recipe_steps (
    id, index, preparation_id, minimum_estimated_time_in_seconds,
    maximum_estimated_time_in_seconds, minimum_temperature_in_celsius,
    maximum_temperature_in_celsius, notes, explicit_instructions, condition_expression,
    optional, start_timer_automatically, belongs_to_recipe, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)";

pub const UPDATE_RECIPE_STEP: &str = "UPDATE recipe_steps SET
    index = $2, preparation_id = $3, minimum_estimated_time_in_seconds = $4,
    maximum_estimated_time_in_seconds = $5, minimum_temperature_in_celsius = $6,
    maximum_temperature_in_celsius = $7, notes = $8, explicit_instructions = $9,
    condition_expression = $10, optional = $11, start_timer_automatically = $12,
    last_updated_at = GREATEST($14, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe = $13";

pub const ARCHIVE_RECIPE_STEP: &str = "UPDATE recipe_steps SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe = $1 AND id = $2";

pub const ARCHIVE_RECIPE_STEPS_FOR_RECIPE: &str = "UPDATE recipe_steps SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe = $1";

/// Binds `$1` (id) through `$13` (belongs_to_recipe).
fn bind_recipe_step<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeStepRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(row.index)
        .bind(&row.preparation_id)
        .bind(row.minimum_estimated_time_in_seconds)
        .bind(row.maximum_estimated_time_in_seconds)
        .bind(row.minimum_temperature_in_celsius)
        .bind(row.maximum_temperature_in_celsius)
        .bind(&row.notes)
        .bind(&row.explicit_instructions)
        .bind(&row.condition_expression)
        .bind(row.optional)
        .bind(row.start_timer_automatically)
        .bind(&row.belongs_to_recipe)
}

pub async fn recipe_step_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(RECIPE_STEP_EXISTS).bind(recipe_id).bind(step_id),
        exec,
    )
    .await
}

pub async fn get_recipe_step<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Option<RecipeStepWithPreparationRow>> {
    fetch_optional(
        sqlx::query(GET_RECIPE_STEP).bind(recipe_id).bind(step_id),
        exec,
    )
    .await
}

pub async fn get_all_recipe_steps_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
) -> DbResult<Vec<RecipeStepWithPreparationRow>> {
    fetch_all(sqlx::query(GET_ALL_RECIPE_STEPS_FOR_RECIPE).bind(recipe_id), exec).await
}

pub async fn get_recipe_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
) -> DbResult<Vec<Counted<RecipeStepWithPreparationRow>>> {
    fetch_all(list_query(GET_RECIPE_STEPS, filter).bind(recipe_id), exec).await
}

pub async fn create_recipe_step<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepRow,
) -> DbResult<u64> {
    let query = bind_recipe_step(sqlx::query(CREATE_RECIPE_STEP), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_step<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_step(sqlx::query(UPDATE_RECIPE_STEP), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_step<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP).bind(recipe_id).bind(step_id),
        exec,
    )
    .await
}

pub async fn archive_recipe_steps_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_RECIPE_STEPS_FOR_RECIPE).bind(recipe_id), exec).await
}

// =============================================================================
// Media
// =============================================================================

table_row! {
    pub struct RecipeMediaRow {
        pub id: String,
        pub belongs_to_recipe: Option<String>,
        pub belongs_to_recipe_step: Option<String>,
        pub mime_type: String,
        pub internal_path: String,
        pub external_path: String,
        pub index: i32,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const RECIPE_MEDIA_EXISTS: &str = exists_by_id!("recipe_media");

pub const GET_RECIPE_MEDIA: &str = concat!(
    "SELECT ", recipe_media_columns!("recipe_media", ""),
    " FROM recipe_media WHERE recipe_media.archived_at IS NULL AND recipe_media.id = $1"
);

/// Every live media row attached to a recipe or one of its steps.
pub const GET_ALL_RECIPE_MEDIA_FOR_RECIPE: &str = concat!(
    "SELECT ", recipe_media_columns!("recipe_media", ""),
    " FROM recipe_media WHERE recipe_media.archived_at IS NULL",
    " AND recipe_media.belongs_to_recipe = $1",
    " ORDER BY recipe_media.index, recipe_media.created_at, recipe_media.id"
);

pub const GET_RECIPE_MEDIA_FOR_RECIPE: &str = concat!(
    "SELECT ", recipe_media_columns!("recipe_media", ""), ", ",
    list_counts!("recipe_media", "recipe_media.belongs_to_recipe = $8"),
    " FROM recipe_media",
    list_where!("recipe_media", "recipe_media.belongs_to_recipe = $8")
);

pub const CREATE_RECIPE_MEDIA: &str = "INSERT INTO recipe_media (
    id, belongs_to_recipe, belongs_to_recipe_step, mime_type, internal_path, external_path,
    index, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const UPDATE_RECIPE_MEDIA: &str = "UPDATE recipe_media SET
    belongs_to_recipe = $2, belongs_to_recipe_step = $3, mime_type = $4,
    internal_path = $5, external_path = $6, index = $7,
    last_updated_at = GREATEST($8, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_RECIPE_MEDIA: &str = archive_by_id!("recipe_media");

fn bind_recipe_media<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeMediaRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.belongs_to_recipe)
        .bind(&row.belongs_to_recipe_step)
        .bind(&row.mime_type)
        .bind(&row.internal_path)
        .bind(&row.external_path)
        .bind(row.index)
}

pub async fn recipe_media_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(RECIPE_MEDIA_EXISTS).bind(id), exec).await
}

pub async fn get_recipe_media<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<RecipeMediaRow>> {
    fetch_optional(sqlx::query(GET_RECIPE_MEDIA).bind(id), exec).await
}

pub async fn get_all_recipe_media_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
) -> DbResult<Vec<RecipeMediaRow>> {
    fetch_all(sqlx::query(GET_ALL_RECIPE_MEDIA_FOR_RECIPE).bind(recipe_id), exec).await
}

pub async fn get_recipe_media_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
) -> DbResult<Vec<Counted<RecipeMediaRow>>> {
    fetch_all(list_query(GET_RECIPE_MEDIA_FOR_RECIPE, filter).bind(recipe_id), exec).await
}

pub async fn create_recipe_media<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeMediaRow,
) -> DbResult<u64> {
    let query = bind_recipe_media(sqlx::query(CREATE_RECIPE_MEDIA), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_media<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeMediaRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_media(sqlx::query(UPDATE_RECIPE_MEDIA), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_media<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_RECIPE_MEDIA).bind(id), exec).await
}

// =============================================================================
// Ratings
// =============================================================================

table_row! {
    pub struct RecipeRatingRow {
        pub id: String,
        pub recipe_id: String,
        pub taste: Decimal,
        pub difficulty: Decimal,
        pub cleanup: Decimal,
        pub instructions: Decimal,
        pub overall: Decimal,
        pub notes: String,
        pub by_user: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `$1` recipe, `$2` rating.
pub const RECIPE_RATING_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_ratings.id FROM recipe_ratings
    WHERE recipe_ratings.archived_at IS NULL
    AND recipe_ratings.recipe_id = $1
    AND recipe_ratings.id = $2
)";

pub const GET_RECIPE_RATING: &str = concat!(
    "SELECT ", recipe_rating_columns!("recipe_ratings", ""),
    " FROM recipe_ratings WHERE recipe_ratings.archived_at IS NULL",
    " AND recipe_ratings.recipe_id = $1 AND recipe_ratings.id = $2"
);

pub const GET_RECIPE_RATINGS_FOR_RECIPE: &str = concat!(
    "SELECT ", recipe_rating_columns!("recipe_ratings", ""), ", ",
    list_counts!("recipe_ratings", "recipe_ratings.recipe_id = $8"),
    " FROM recipe_ratings",
    list_where!("recipe_ratings", "recipe_ratings.recipe_id = $8")
);

pub const GET_RECIPE_RATINGS_FOR_USER: &str = concat!(
    "SELECT ", recipe_rating_columns!("recipe_ratings", ""), ", ",
    list_counts!("recipe_ratings", "recipe_ratings.by_user = $8"),
    " FROM recipe_ratings",
    list_where!("recipe_ratings", "recipe_ratings.by_user = $8")
);

pub const CREATE_RECIPE_RATING: &str = "INSERT INTO recipe_ratings (
    id, recipe_id, taste, difficulty, cleanup, instructions, overall, notes, by_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

pub const UPDATE_RECIPE_RATING: &str = "UPDATE recipe_ratings SET
    taste = $3, difficulty = $4, cleanup = $5, instructions = $6, overall = $7, notes = $8,
    last_updated_at = GREATEST($10, created_at)
WHERE archived_at IS NULL AND id = $1 AND recipe_id = $2 AND by_user = $9";

pub const ARCHIVE_RECIPE_RATING: &str = "UPDATE recipe_ratings SET archived_at = NOW()
WHERE archived_at IS NULL AND recipe_id = $1 AND id = $2";

fn bind_recipe_rating<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeRatingRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.recipe_id)
        .bind(row.taste)
        .bind(row.difficulty)
        .bind(row.cleanup)
        .bind(row.instructions)
        .bind(row.overall)
        .bind(&row.notes)
        .bind(&row.by_user)
}

pub async fn recipe_rating_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    rating_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(RECIPE_RATING_EXISTS).bind(recipe_id).bind(rating_id),
        exec,
    )
    .await
}

pub async fn get_recipe_rating<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    rating_id: &str,
) -> DbResult<Option<RecipeRatingRow>> {
    fetch_optional(
        sqlx::query(GET_RECIPE_RATING).bind(recipe_id).bind(rating_id),
        exec,
    )
    .await
}

pub async fn get_recipe_ratings_for_recipe<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
) -> DbResult<Vec<Counted<RecipeRatingRow>>> {
    fetch_all(list_query(GET_RECIPE_RATINGS_FOR_RECIPE, filter).bind(recipe_id), exec).await
}

pub async fn get_recipe_ratings_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<RecipeRatingRow>>> {
    fetch_all(list_query(GET_RECIPE_RATINGS_FOR_USER, filter).bind(user_id), exec).await
}

pub async fn create_recipe_rating<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeRatingRow,
) -> DbResult<u64> {
    let query = bind_recipe_rating(sqlx::query(CREATE_RECIPE_RATING), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_rating<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeRatingRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_rating(sqlx::query(UPDATE_RECIPE_RATING), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_rating<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    rating_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_RATING).bind(recipe_id).bind(rating_id),
        exec,
    )
    .await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_recipes", sql: GET_RECIPES },
    ListQuery { name: "get_recipes_created_by_user", sql: GET_RECIPES_CREATED_BY_USER },
    ListQuery { name: "get_recipe_steps", sql: GET_RECIPE_STEPS },
    ListQuery { name: "get_recipe_media_for_recipe", sql: GET_RECIPE_MEDIA_FOR_RECIPE },
    ListQuery { name: "get_recipe_ratings_for_recipe", sql: GET_RECIPE_RATINGS_FOR_RECIPE },
    ListQuery { name: "get_recipe_ratings_for_user", sql: GET_RECIPE_RATINGS_FOR_USER },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_mutations_are_scoped_to_the_creator() {
        assert!(UPDATE_RECIPE.contains("created_by_user = $14"));
        assert!(UPDATE_RECIPE.contains("GREATEST($15, created_at)"));
        assert!(ARCHIVE_RECIPE.contains("created_by_user = $2"));
    }

    #[test]
    fn test_step_reads_require_a_live_parent_recipe() {
        for sql in [RECIPE_STEP_EXISTS, GET_RECIPE_STEP, GET_ALL_RECIPE_STEPS_FOR_RECIPE] {
            assert!(sql.contains("recipes.archived_at IS NULL"));
            assert!(sql.contains("recipe_steps.belongs_to_recipe = $1"));
        }
    }

    #[test]
    fn test_steps_are_returned_in_step_order() {
        assert!(GET_ALL_RECIPE_STEPS_FOR_RECIPE.contains("ORDER BY recipe_steps.index"));
    }
}
