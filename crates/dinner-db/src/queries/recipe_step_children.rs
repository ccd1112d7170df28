//! Children of a recipe step: ingredients, products, instruments, vessels and
//! completion conditions.
//!
//! Every read is scoped by both the recipe and the step, so a child is
//! invisible through the wrong parent. Single reads bind `$1` recipe,
//! `$2` step, `$3` child; lists bind `$8` recipe and `$9` step. The batch
//! reads behind a recipe or step GET bind an array of step IDs as `$1`.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::valid_enumerations::{
    ValidIngredientRow, ValidInstrumentRow, ValidMeasurementUnitRow, ValidVesselWithUnitRow,
};
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

// =============================================================================
// Ingredients
// =============================================================================

table_row! {
    pub struct RecipeStepIngredientRow {
        pub id: String,
        pub name: String,
        pub optional: bool,
        pub ingredient_id: Option<String>,
        pub measurement_unit: String,
        pub minimum_quantity_value: Decimal,
        pub maximum_quantity_value: Option<Decimal>,
        pub quantity_notes: String,
        pub ingredient_notes: String,
        pub recipe_step_product_id: Option<String>,
        pub option_index: i32,
        pub vessel_index: Option<i32>,
        pub product_percentage_to_use: Option<Decimal>,
        pub to_taste: bool,
        pub belongs_to_recipe_step: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// The ingredient side is absent when the step consumes an earlier product.
pub type RecipeStepIngredientWideRow = (
    RecipeStepIngredientRow,
    Option<ValidIngredientRow>,
    ValidMeasurementUnitRow,
);

macro_rules! rsi_select {
    () => {
        concat!(
            "SELECT ", recipe_step_ingredient_columns!("recipe_step_ingredients", ""), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"), ", ",
            valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"),
            " FROM recipe_step_ingredients",
            " JOIN recipe_steps ON recipe_steps.id = recipe_step_ingredients.belongs_to_recipe_step",
            " LEFT JOIN valid_ingredients ON valid_ingredients.id = recipe_step_ingredients.ingredient_id",
            " JOIN valid_measurement_units ON valid_measurement_units.id = recipe_step_ingredients.measurement_unit"
        )
    };
}

pub const RECIPE_STEP_INGREDIENT_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_step_ingredients.id FROM recipe_step_ingredients
    JOIN recipe_steps ON recipe_steps.id = recipe_step_ingredients.belongs_to_recipe_step
    WHERE recipe_step_ingredients.archived_at IS NULL
    AND recipe_steps.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_step_ingredients.belongs_to_recipe_step = $2
    AND recipe_step_ingredients.id = $3
)";

pub const GET_RECIPE_STEP_INGREDIENT: &str = concat!(
    rsi_select!(),
    " WHERE recipe_step_ingredients.archived_at IS NULL",
    " AND recipe_steps.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_step_ingredients.belongs_to_recipe_step = $2",
    " AND recipe_step_ingredients.id = $3"
);

pub const GET_RECIPE_STEP_INGREDIENTS_FOR_STEPS: &str = concat!(
    rsi_select!(),
    " WHERE recipe_step_ingredients.archived_at IS NULL",
    " AND recipe_step_ingredients.belongs_to_recipe_step = ANY($1)",
    " ORDER BY recipe_step_ingredients.created_at, recipe_step_ingredients.id"
);

pub const GET_RECIPE_STEP_INGREDIENTS: &str = concat!(
    "SELECT ", recipe_step_ingredient_columns!("recipe_step_ingredients", ""), ", ",
    valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"), ", ",
    valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"), ", ",
    list_counts!(
        "recipe_step_ingredients",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_ingredients.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_ingredients.belongs_to_recipe_step = $9"
    ),
    " FROM recipe_step_ingredients",
    " LEFT JOIN valid_ingredients ON valid_ingredients.id = recipe_step_ingredients.ingredient_id",
    " JOIN valid_measurement_units ON valid_measurement_units.id = recipe_step_ingredients.measurement_unit",
    list_where!(
        "recipe_step_ingredients",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_ingredients.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_ingredients.belongs_to_recipe_step = $9"
    )
);

pub const CREATE_RECIPE_STEP_INGREDIENT: &str = "INSERT INTO recipe_step_ingredients (
    id, name, optional, ingredient_id, measurement_unit, minimum_quantity_value,
    maximum_quantity_value, quantity_notes, ingredient_notes, recipe_step_product_id,
    option_index, vessel_index, product_percentage_to_use, to_taste, belongs_to_recipe_step,
    created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";

pub const UPDATE_RECIPE_STEP_INGREDIENT: &str = "UPDATE recipe_step_ingredients SET
    name = $2, optional = $3, ingredient_id = $4, measurement_unit = $5,
    minimum_quantity_value = $6, maximum_quantity_value = $7, quantity_notes = $8,
    ingredient_notes = $9, recipe_step_product_id = $10, option_index = $11,
    vessel_index = $12, product_percentage_to_use = $13, to_taste = $14,
    last_updated_at = GREATEST($16, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe_step = $15";

pub const ARCHIVE_RECIPE_STEP_INGREDIENT: &str = "UPDATE recipe_step_ingredients SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step = $1 AND id = $2";

/// Binds `$1` (id) through `$15` (belongs_to_recipe_step).
fn bind_recipe_step_ingredient<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeStepIngredientRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(row.optional)
        .bind(&row.ingredient_id)
        .bind(&row.measurement_unit)
        .bind(row.minimum_quantity_value)
        .bind(row.maximum_quantity_value)
        .bind(&row.quantity_notes)
        .bind(&row.ingredient_notes)
        .bind(&row.recipe_step_product_id)
        .bind(row.option_index)
        .bind(row.vessel_index)
        .bind(row.product_percentage_to_use)
        .bind(row.to_taste)
        .bind(&row.belongs_to_recipe_step)
}

pub async fn recipe_step_ingredient_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(RECIPE_STEP_INGREDIENT_EXISTS)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_exists(query, exec).await
}

pub async fn get_recipe_step_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<Option<RecipeStepIngredientWideRow>> {
    let query = sqlx::query(GET_RECIPE_STEP_INGREDIENT)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_optional(query, exec).await
}

pub async fn get_recipe_step_ingredients_for_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    step_ids: &[String],
) -> DbResult<Vec<RecipeStepIngredientWideRow>> {
    fetch_all(sqlx::query(GET_RECIPE_STEP_INGREDIENTS_FOR_STEPS).bind(step_ids), exec).await
}

pub async fn get_recipe_step_ingredients<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Vec<Counted<RecipeStepIngredientWideRow>>> {
    let query = list_query(GET_RECIPE_STEP_INGREDIENTS, filter)
        .bind(recipe_id)
        .bind(step_id);
    fetch_all(query, exec).await
}

pub async fn create_recipe_step_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepIngredientRow,
) -> DbResult<u64> {
    let query = bind_recipe_step_ingredient(sqlx::query(CREATE_RECIPE_STEP_INGREDIENT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_step_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepIngredientRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_step_ingredient(sqlx::query(UPDATE_RECIPE_STEP_INGREDIENT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_step_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    step_id: &str,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_INGREDIENT).bind(step_id).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Products
// =============================================================================

table_row! {
    pub struct RecipeStepProductRow {
        pub id: String,
        pub name: String,
        pub product_type: String,
        pub measurement_unit: Option<String>,
        pub minimum_quantity_value: Option<Decimal>,
        pub maximum_quantity_value: Option<Decimal>,
        pub quantity_notes: String,
        pub compostable: bool,
        pub minimum_storage_duration_in_seconds: Option<i64>,
        pub maximum_storage_duration_in_seconds: Option<i64>,
        pub minimum_storage_temperature_in_celsius: Option<Decimal>,
        pub maximum_storage_temperature_in_celsius: Option<Decimal>,
        pub storage_instructions: String,
        pub is_liquid: bool,
        pub is_waste: bool,
        pub index: i32,
        pub contained_in_vessel_index: Option<i32>,
        pub belongs_to_recipe_step: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub type RecipeStepProductWideRow = (RecipeStepProductRow, Option<ValidMeasurementUnitRow>);

macro_rules! rsp_select {
    () => {
        concat!(
            "SELECT ", recipe_step_product_columns!("recipe_step_products", ""), ", ",
            valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"),
            " FROM recipe_step_products",
            " JOIN recipe_steps ON recipe_steps.id = recipe_step_products.belongs_to_recipe_step",
            " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = recipe_step_products.measurement_unit"
        )
    };
}

pub const RECIPE_STEP_PRODUCT_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_step_products.id FROM recipe_step_products
    JOIN recipe_steps ON recipe_steps.id = recipe_step_products.belongs_to_recipe_step
    WHERE recipe_step_products.archived_at IS NULL
    AND recipe_steps.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_step_products.belongs_to_recipe_step = $2
    AND recipe_step_products.id = $3
)";

pub const GET_RECIPE_STEP_PRODUCT: &str = concat!(
    rsp_select!(),
    " WHERE recipe_step_products.archived_at IS NULL",
    " AND recipe_steps.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_step_products.belongs_to_recipe_step = $2",
    " AND recipe_step_products.id = $3"
);

pub const GET_RECIPE_STEP_PRODUCTS_FOR_STEPS: &str = concat!(
    rsp_select!(),
    " WHERE recipe_step_products.archived_at IS NULL",
    " AND recipe_step_products.belongs_to_recipe_step = ANY($1)",
    " ORDER BY recipe_step_products.index, recipe_step_products.created_at, recipe_step_products.id"
);

pub const GET_RECIPE_STEP_PRODUCTS: &str = concat!(
    "SELECT ", recipe_step_product_columns!("recipe_step_products", ""), ", ",
    valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"), ", ",
    list_counts!(
        "recipe_step_products",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_products.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_products.belongs_to_recipe_step = $9"
    ),
    " FROM recipe_step_products",
    " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = recipe_step_products.measurement_unit",
    list_where!(
        "recipe_step_products",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_products.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_products.belongs_to_recipe_step = $9"
    )
);

pub const CREATE_RECIPE_STEP_PRODUCT: &str = "INSERT INTO recipe_step_products (
    id, name, product_type, measurement_unit, minimum_quantity_value, maximum_quantity_value,
    quantity_notes, compostable, minimum_storage_duration_in_seconds,
    maximum_storage_duration_in_seconds, minimum_storage_temperature_in_celsius,
    maximum_storage_temperature_in_celsius, storage_instructions, is_liquid, is_waste, index,
    contained_in_vessel_index, belongs_to_recipe_step, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)";

pub const UPDATE_RECIPE_STEP_PRODUCT: &str = "UPDATE recipe_step_products SET
    name = $2, product_type = $3, measurement_unit = $4, minimum_quantity_value = $5,
    maximum_quantity_value = $6, quantity_notes = $7, compostable = $8,
    minimum_storage_duration_in_seconds = $9, maximum_storage_duration_in_seconds = $10,
    minimum_storage_temperature_in_celsius = $11, maximum_storage_temperature_in_celsius = $12,
    storage_instructions = $13, is_liquid = $14, is_waste = $15, index = $16,
    contained_in_vessel_index = $17, last_updated_at = GREATEST($19, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe_step = $18";

pub const ARCHIVE_RECIPE_STEP_PRODUCT: &str = "UPDATE recipe_step_products SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step = $1 AND id = $2";

/// Binds `$1` (id) through `$18` (belongs_to_recipe_step).
fn bind_recipe_step_product<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeStepProductRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.product_type)
        .bind(&row.measurement_unit)
        .bind(row.minimum_quantity_value)
        .bind(row.maximum_quantity_value)
        .bind(&row.quantity_notes)
        .bind(row.compostable)
        .bind(row.minimum_storage_duration_in_seconds)
        .bind(row.maximum_storage_duration_in_seconds)
        .bind(row.minimum_storage_temperature_in_celsius)
        .bind(row.maximum_storage_temperature_in_celsius)
        .bind(&row.storage_instructions)
        .bind(row.is_liquid)
        .bind(row.is_waste)
        .bind(row.index)
        .bind(row.contained_in_vessel_index)
        .bind(&row.belongs_to_recipe_step)
}

pub async fn recipe_step_product_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(RECIPE_STEP_PRODUCT_EXISTS)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_exists(query, exec).await
}

pub async fn get_recipe_step_product<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<Option<RecipeStepProductWideRow>> {
    let query = sqlx::query(GET_RECIPE_STEP_PRODUCT)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_optional(query, exec).await
}

pub async fn get_recipe_step_products_for_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    step_ids: &[String],
) -> DbResult<Vec<RecipeStepProductWideRow>> {
    fetch_all(sqlx::query(GET_RECIPE_STEP_PRODUCTS_FOR_STEPS).bind(step_ids), exec).await
}

pub async fn get_recipe_step_products<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Vec<Counted<RecipeStepProductWideRow>>> {
    let query = list_query(GET_RECIPE_STEP_PRODUCTS, filter)
        .bind(recipe_id)
        .bind(step_id);
    fetch_all(query, exec).await
}

pub async fn create_recipe_step_product<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepProductRow,
) -> DbResult<u64> {
    let query = bind_recipe_step_product(sqlx::query(CREATE_RECIPE_STEP_PRODUCT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_step_product<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepProductRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_step_product(sqlx::query(UPDATE_RECIPE_STEP_PRODUCT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_step_product<'e, E: PgExecutor<'e>>(
    exec: E,
    step_id: &str,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_PRODUCT).bind(step_id).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Instruments
// =============================================================================

table_row! {
    pub struct RecipeStepInstrumentRow {
        pub id: String,
        pub instrument_id: Option<String>,
        pub recipe_step_product_id: Option<String>,
        pub name: String,
        pub notes: String,
        pub preference_rank: i32,
        pub optional: bool,
        pub option_index: i32,
        pub minimum_quantity: i64,
        pub maximum_quantity: Option<i64>,
        pub belongs_to_recipe_step: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub type RecipeStepInstrumentWideRow = (RecipeStepInstrumentRow, Option<ValidInstrumentRow>);

macro_rules! rsin_select {
    () => {
        concat!(
            "SELECT ", recipe_step_instrument_columns!("recipe_step_instruments", ""), ", ",
            valid_instrument_columns!("valid_instruments", "valid_instrument_"),
            " FROM recipe_step_instruments",
            " JOIN recipe_steps ON recipe_steps.id = recipe_step_instruments.belongs_to_recipe_step",
            " LEFT JOIN valid_instruments ON valid_instruments.id = recipe_step_instruments.instrument_id"
        )
    };
}

pub const RECIPE_STEP_INSTRUMENT_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_step_instruments.id FROM recipe_step_instruments
    JOIN recipe_steps ON recipe_steps.id = recipe_step_instruments.belongs_to_recipe_step
    WHERE recipe_step_instruments.archived_at IS NULL
    AND recipe_steps.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_step_instruments.belongs_to_recipe_step = $2
    AND recipe_step_instruments.id = $3
)";

pub const GET_RECIPE_STEP_INSTRUMENT: &str = concat!(
    rsin_select!(),
    " WHERE recipe_step_instruments.archived_at IS NULL",
    " AND recipe_steps.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_step_instruments.belongs_to_recipe_step = $2",
    " AND recipe_step_instruments.id = $3"
);

pub const GET_RECIPE_STEP_INSTRUMENTS_FOR_STEPS: &str = concat!(
    rsin_select!(),
    " WHERE recipe_step_instruments.archived_at IS NULL",
    " AND recipe_step_instruments.belongs_to_recipe_step = ANY($1)",
    " ORDER BY recipe_step_instruments.created_at, recipe_step_instruments.id"
);

pub const GET_RECIPE_STEP_INSTRUMENTS: &str = concat!(
    "SELECT ", recipe_step_instrument_columns!("recipe_step_instruments", ""), ", ",
    valid_instrument_columns!("valid_instruments", "valid_instrument_"), ", ",
    list_counts!(
        "recipe_step_instruments",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_instruments.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_instruments.belongs_to_recipe_step = $9"
    ),
    " FROM recipe_step_instruments",
    " LEFT JOIN valid_instruments ON valid_instruments.id = recipe_step_instruments.instrument_id",
    list_where!(
        "recipe_step_instruments",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_instruments.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_instruments.belongs_to_recipe_step = $9"
    )
);

pub const CREATE_RECIPE_STEP_INSTRUMENT: &str = "INSERT INTO recipe_step_instruments (
    id, instrument_id, recipe_step_product_id, name, notes, preference_rank, optional,
    option_index, minimum_quantity, maximum_quantity, belongs_to_recipe_step, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

pub const UPDATE_RECIPE_STEP_INSTRUMENT: &str = "UPDATE recipe_step_instruments SET
    instrument_id = $2, recipe_step_product_id = $3, name = $4, notes = $5,
    preference_rank = $6, optional = $7, option_index = $8, minimum_quantity = $9,
    maximum_quantity = $10, last_updated_at = GREATEST($12, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe_step = $11";

pub const ARCHIVE_RECIPE_STEP_INSTRUMENT: &str = "UPDATE recipe_step_instruments SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step = $1 AND id = $2";

fn bind_recipe_step_instrument<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeStepInstrumentRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.instrument_id)
        .bind(&row.recipe_step_product_id)
        .bind(&row.name)
        .bind(&row.notes)
        .bind(row.preference_rank)
        .bind(row.optional)
        .bind(row.option_index)
        .bind(row.minimum_quantity)
        .bind(row.maximum_quantity)
        .bind(&row.belongs_to_recipe_step)
}

pub async fn recipe_step_instrument_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(RECIPE_STEP_INSTRUMENT_EXISTS)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_exists(query, exec).await
}

pub async fn get_recipe_step_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<Option<RecipeStepInstrumentWideRow>> {
    let query = sqlx::query(GET_RECIPE_STEP_INSTRUMENT)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_optional(query, exec).await
}

pub async fn get_recipe_step_instruments_for_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    step_ids: &[String],
) -> DbResult<Vec<RecipeStepInstrumentWideRow>> {
    fetch_all(sqlx::query(GET_RECIPE_STEP_INSTRUMENTS_FOR_STEPS).bind(step_ids), exec).await
}

pub async fn get_recipe_step_instruments<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Vec<Counted<RecipeStepInstrumentWideRow>>> {
    let query = list_query(GET_RECIPE_STEP_INSTRUMENTS, filter)
        .bind(recipe_id)
        .bind(step_id);
    fetch_all(query, exec).await
}

pub async fn create_recipe_step_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepInstrumentRow,
) -> DbResult<u64> {
    let query = bind_recipe_step_instrument(sqlx::query(CREATE_RECIPE_STEP_INSTRUMENT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_step_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepInstrumentRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_step_instrument(sqlx::query(UPDATE_RECIPE_STEP_INSTRUMENT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_step_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    step_id: &str,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_INSTRUMENT).bind(step_id).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Vessels
// =============================================================================

table_row! {
    pub struct RecipeStepVesselRow {
        pub id: String,
        pub valid_vessel_id: Option<String>,
        pub recipe_step_product_id: Option<String>,
        pub name: String,
        pub notes: String,
        pub vessel_preposition: String,
        pub minimum_quantity: i32,
        pub maximum_quantity: Option<i32>,
        pub unavailable_after_step: bool,
        pub belongs_to_recipe_step: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `valid_vessel_id` is selected under both sides; the left join keeps them
/// equal, including when both are NULL.
pub type RecipeStepVesselWideRow = (RecipeStepVesselRow, Option<ValidVesselWithUnitRow>);

macro_rules! rsv_select {
    () => {
        concat!(
            "SELECT ", recipe_step_vessel_columns!("recipe_step_vessels", ""), ", ",
            valid_vessel_columns!("valid_vessels", "valid_vessel_"), ", ",
            valid_measurement_unit_columns!(
                "valid_measurement_units",
                "valid_vessel_valid_measurement_unit_"
            ),
            " FROM recipe_step_vessels",
            " JOIN recipe_steps ON recipe_steps.id = recipe_step_vessels.belongs_to_recipe_step",
            " LEFT JOIN valid_vessels ON valid_vessels.id = recipe_step_vessels.valid_vessel_id",
            " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit"
        )
    };
}

pub const RECIPE_STEP_VESSEL_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_step_vessels.id FROM recipe_step_vessels
    JOIN recipe_steps ON recipe_steps.id = recipe_step_vessels.belongs_to_recipe_step
    WHERE recipe_step_vessels.archived_at IS NULL
    AND recipe_steps.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_step_vessels.belongs_to_recipe_step = $2
    AND recipe_step_vessels.id = $3
)";

pub const GET_RECIPE_STEP_VESSEL: &str = concat!(
    rsv_select!(),
    " WHERE recipe_step_vessels.archived_at IS NULL",
    " AND recipe_steps.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_step_vessels.belongs_to_recipe_step = $2",
    " AND recipe_step_vessels.id = $3"
);

pub const GET_RECIPE_STEP_VESSELS_FOR_STEPS: &str = concat!(
    rsv_select!(),
    " WHERE recipe_step_vessels.archived_at IS NULL",
    " AND recipe_step_vessels.belongs_to_recipe_step = ANY($1)",
    " ORDER BY recipe_step_vessels.created_at, recipe_step_vessels.id"
);

pub const GET_RECIPE_STEP_VESSELS: &str = concat!(
    "SELECT ", recipe_step_vessel_columns!("recipe_step_vessels", ""), ", ",
    valid_vessel_columns!("valid_vessels", "valid_vessel_"), ", ",
    valid_measurement_unit_columns!(
        "valid_measurement_units",
        "valid_vessel_valid_measurement_unit_"
    ), ", ",
    list_counts!(
        "recipe_step_vessels",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_vessels.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_vessels.belongs_to_recipe_step = $9"
    ),
    " FROM recipe_step_vessels",
    " LEFT JOIN valid_vessels ON valid_vessels.id = recipe_step_vessels.valid_vessel_id",
    " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit",
    list_where!(
        "recipe_step_vessels",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_vessels.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_vessels.belongs_to_recipe_step = $9"
    )
);

pub const CREATE_RECIPE_STEP_VESSEL: &str = "INSERT INTO recipe_step_vessels (
    id, valid_vessel_id, recipe_step_product_id, name, notes, vessel_preposition,
    minimum_quantity, maximum_quantity, unavailable_after_step, belongs_to_recipe_step,
    created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

pub const UPDATE_RECIPE_STEP_VESSEL: &str = "UPDATE recipe_step_vessels SET
    valid_vessel_id = $2, recipe_step_product_id = $3, name = $4, notes = $5,
    vessel_preposition = $6, minimum_quantity = $7, maximum_quantity = $8,
    unavailable_after_step = $9, last_updated_at = GREATEST($11, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe_step = $10";

pub const ARCHIVE_RECIPE_STEP_VESSEL: &str = "UPDATE recipe_step_vessels SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step = $1 AND id = $2";

fn bind_recipe_step_vessel<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q RecipeStepVesselRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.valid_vessel_id)
        .bind(&row.recipe_step_product_id)
        .bind(&row.name)
        .bind(&row.notes)
        .bind(&row.vessel_preposition)
        .bind(row.minimum_quantity)
        .bind(row.maximum_quantity)
        .bind(row.unavailable_after_step)
        .bind(&row.belongs_to_recipe_step)
}

pub async fn recipe_step_vessel_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(RECIPE_STEP_VESSEL_EXISTS)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_exists(query, exec).await
}

pub async fn get_recipe_step_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<Option<RecipeStepVesselWideRow>> {
    let query = sqlx::query(GET_RECIPE_STEP_VESSEL)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_optional(query, exec).await
}

pub async fn get_recipe_step_vessels_for_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    step_ids: &[String],
) -> DbResult<Vec<RecipeStepVesselWideRow>> {
    fetch_all(sqlx::query(GET_RECIPE_STEP_VESSELS_FOR_STEPS).bind(step_ids), exec).await
}

pub async fn get_recipe_step_vessels<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Vec<Counted<RecipeStepVesselWideRow>>> {
    let query = list_query(GET_RECIPE_STEP_VESSELS, filter)
        .bind(recipe_id)
        .bind(step_id);
    fetch_all(query, exec).await
}

pub async fn create_recipe_step_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepVesselRow,
) -> DbResult<u64> {
    let query = bind_recipe_step_vessel(sqlx::query(CREATE_RECIPE_STEP_VESSEL), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_recipe_step_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepVesselRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_recipe_step_vessel(sqlx::query(UPDATE_RECIPE_STEP_VESSEL), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_recipe_step_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    step_id: &str,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_VESSEL).bind(step_id).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Completion Conditions
// =============================================================================

table_row! {
    pub struct RecipeStepCompletionConditionRow {
        pub id: String,
        pub ingredient_state: String,
        pub notes: String,
        pub optional: bool,
        pub belongs_to_recipe_step: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct RecipeStepCompletionConditionIngredientRow {
        pub id: String,
        pub belongs_to_recipe_step_completion_condition: String,
        pub recipe_step_ingredient: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const RECIPE_STEP_COMPLETION_CONDITION_EXISTS: &str = "SELECT EXISTS (
    SELECT recipe_step_completion_conditions.id FROM recipe_step_completion_conditions
    JOIN recipe_steps ON recipe_steps.id = recipe_step_completion_conditions.belongs_to_recipe_step
    WHERE recipe_step_completion_conditions.archived_at IS NULL
    AND recipe_steps.archived_at IS NULL
    AND recipe_steps.belongs_to_recipe = $1
    AND recipe_step_completion_conditions.belongs_to_recipe_step = $2
    AND recipe_step_completion_conditions.id = $3
)";

pub const GET_RECIPE_STEP_COMPLETION_CONDITION: &str = concat!(
    "SELECT ",
    recipe_step_completion_condition_columns!("recipe_step_completion_conditions", ""),
    " FROM recipe_step_completion_conditions",
    " JOIN recipe_steps ON recipe_steps.id = recipe_step_completion_conditions.belongs_to_recipe_step",
    " WHERE recipe_step_completion_conditions.archived_at IS NULL",
    " AND recipe_steps.archived_at IS NULL",
    " AND recipe_steps.belongs_to_recipe = $1",
    " AND recipe_step_completion_conditions.belongs_to_recipe_step = $2",
    " AND recipe_step_completion_conditions.id = $3"
);

pub const GET_RECIPE_STEP_COMPLETION_CONDITIONS_FOR_STEPS: &str = concat!(
    "SELECT ",
    recipe_step_completion_condition_columns!("recipe_step_completion_conditions", ""),
    " FROM recipe_step_completion_conditions",
    " WHERE recipe_step_completion_conditions.archived_at IS NULL",
    " AND recipe_step_completion_conditions.belongs_to_recipe_step = ANY($1)",
    " ORDER BY recipe_step_completion_conditions.created_at, recipe_step_completion_conditions.id"
);

pub const GET_RECIPE_STEP_COMPLETION_CONDITIONS: &str = concat!(
    "SELECT ",
    recipe_step_completion_condition_columns!("recipe_step_completion_conditions", ""), ", ",
    list_counts!(
        "recipe_step_completion_conditions",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_completion_conditions.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_completion_conditions.belongs_to_recipe_step = $9"
    ),
    " FROM recipe_step_completion_conditions",
    list_where!(
        "recipe_step_completion_conditions",
        "EXISTS (SELECT 1 FROM recipe_steps WHERE recipe_steps.id = recipe_step_completion_conditions.belongs_to_recipe_step AND recipe_steps.archived_at IS NULL AND recipe_steps.belongs_to_recipe = $8) AND recipe_step_completion_conditions.belongs_to_recipe_step = $9"
    )
);

pub const GET_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENTS_FOR_CONDITIONS: &str = concat!(
    "SELECT ",
    recipe_step_completion_condition_ingredient_columns!(
        "recipe_step_completion_condition_ingredients",
        ""
    ),
    " FROM recipe_step_completion_condition_ingredients",
    " WHERE recipe_step_completion_condition_ingredients.archived_at IS NULL",
    " AND recipe_step_completion_condition_ingredients.belongs_to_recipe_step_completion_condition = ANY($1)",
    " ORDER BY recipe_step_completion_condition_ingredients.created_at,",
    " recipe_step_completion_condition_ingredients.id"
);

pub const CREATE_RECIPE_STEP_COMPLETION_CONDITION: &str = "INSERT INTO recipe_step_completion_conditions (
    id, ingredient_state, notes, optional, belongs_to_recipe_step, created_at
) VALUES ($1, $2, $3, $4, $5, $6)";

pub const CREATE_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENT: &str = "INSERT INTO recipe_step_completion_condition_ingredients (
    id, belongs_to_recipe_step_completion_condition, recipe_step_ingredient, created_at
) VALUES ($1, $2, $3, $4)";

pub const UPDATE_RECIPE_STEP_COMPLETION_CONDITION: &str = "UPDATE recipe_step_completion_conditions SET
    ingredient_state = $2, notes = $3, optional = $4,
    last_updated_at = GREATEST($6, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_recipe_step = $5";

pub const ARCHIVE_RECIPE_STEP_COMPLETION_CONDITION: &str = "UPDATE recipe_step_completion_conditions SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step = $1 AND id = $2";

pub const ARCHIVE_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENTS: &str = "UPDATE recipe_step_completion_condition_ingredients SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_recipe_step_completion_condition = $1";

pub async fn recipe_step_completion_condition_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(RECIPE_STEP_COMPLETION_CONDITION_EXISTS)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_exists(query, exec).await
}

pub async fn get_recipe_step_completion_condition<'e, E: PgExecutor<'e>>(
    exec: E,
    recipe_id: &str,
    step_id: &str,
    id: &str,
) -> DbResult<Option<RecipeStepCompletionConditionRow>> {
    let query = sqlx::query(GET_RECIPE_STEP_COMPLETION_CONDITION)
        .bind(recipe_id)
        .bind(step_id)
        .bind(id);
    fetch_optional(query, exec).await
}

pub async fn get_recipe_step_completion_conditions_for_steps<'e, E: PgExecutor<'e>>(
    exec: E,
    step_ids: &[String],
) -> DbResult<Vec<RecipeStepCompletionConditionRow>> {
    fetch_all(
        sqlx::query(GET_RECIPE_STEP_COMPLETION_CONDITIONS_FOR_STEPS).bind(step_ids),
        exec,
    )
    .await
}

pub async fn get_recipe_step_completion_conditions<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    recipe_id: &str,
    step_id: &str,
) -> DbResult<Vec<Counted<RecipeStepCompletionConditionRow>>> {
    let query = list_query(GET_RECIPE_STEP_COMPLETION_CONDITIONS, filter)
        .bind(recipe_id)
        .bind(step_id);
    fetch_all(query, exec).await
}

pub async fn get_recipe_step_completion_condition_ingredients_for_conditions<
    'e,
    E: PgExecutor<'e>,
>(
    exec: E,
    condition_ids: &[String],
) -> DbResult<Vec<RecipeStepCompletionConditionIngredientRow>> {
    fetch_all(
        sqlx::query(GET_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENTS_FOR_CONDITIONS)
            .bind(condition_ids),
        exec,
    )
    .await
}

pub async fn create_recipe_step_completion_condition<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepCompletionConditionRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_RECIPE_STEP_COMPLETION_CONDITION)
        .bind(&row.id)
        .bind(&row.ingredient_state)
        .bind(&row.notes)
        .bind(row.optional)
        .bind(&row.belongs_to_recipe_step)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn create_recipe_step_completion_condition_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepCompletionConditionIngredientRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENT)
        .bind(&row.id)
        .bind(&row.belongs_to_recipe_step_completion_condition)
        .bind(&row.recipe_step_ingredient)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_recipe_step_completion_condition<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &RecipeStepCompletionConditionRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_RECIPE_STEP_COMPLETION_CONDITION)
        .bind(&row.id)
        .bind(&row.ingredient_state)
        .bind(&row.notes)
        .bind(row.optional)
        .bind(&row.belongs_to_recipe_step)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_recipe_step_completion_condition<'e, E: PgExecutor<'e>>(
    exec: E,
    step_id: &str,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_COMPLETION_CONDITION)
            .bind(step_id)
            .bind(id),
        exec,
    )
    .await
}

pub async fn archive_recipe_step_completion_condition_ingredients<'e, E: PgExecutor<'e>>(
    exec: E,
    condition_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_RECIPE_STEP_COMPLETION_CONDITION_INGREDIENTS).bind(condition_id),
        exec,
    )
    .await
}

// =============================================================================
// Cascading Archives
// =============================================================================

/// Archives every child of the listed steps, condition ingredients first.
pub const ARCHIVE_CHILDREN_OF_STEPS: [&str; 6] = [
    "UPDATE recipe_step_completion_condition_ingredients SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step_completion_condition IN (
        SELECT id FROM recipe_step_completion_conditions WHERE belongs_to_recipe_step = ANY($1)
    )",
    "UPDATE recipe_step_completion_conditions SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step = ANY($1)",
    "UPDATE recipe_step_ingredients SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step = ANY($1)",
    "UPDATE recipe_step_instruments SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step = ANY($1)",
    "UPDATE recipe_step_vessels SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step = ANY($1)",
    "UPDATE recipe_step_products SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_recipe_step = ANY($1)",
];

/// Runs every statement of [`ARCHIVE_CHILDREN_OF_STEPS`] on one connection,
/// normally an open transaction. Returns the total rows touched.
pub async fn archive_children_of_steps(
    conn: &mut PgConnection,
    step_ids: &[String],
) -> DbResult<u64> {
    let mut touched = 0;
    for sql in ARCHIVE_CHILDREN_OF_STEPS {
        touched += execute(sqlx::query(sql).bind(step_ids), &mut *conn).await?;
    }
    Ok(touched)
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_recipe_step_ingredients", sql: GET_RECIPE_STEP_INGREDIENTS },
    ListQuery { name: "get_recipe_step_products", sql: GET_RECIPE_STEP_PRODUCTS },
    ListQuery { name: "get_recipe_step_instruments", sql: GET_RECIPE_STEP_INSTRUMENTS },
    ListQuery { name: "get_recipe_step_vessels", sql: GET_RECIPE_STEP_VESSELS },
    ListQuery {
        name: "get_recipe_step_completion_conditions",
        sql: GET_RECIPE_STEP_COMPLETION_CONDITIONS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reads_are_scoped_by_recipe_and_step() {
        for sql in [
            RECIPE_STEP_INGREDIENT_EXISTS,
            GET_RECIPE_STEP_INGREDIENT,
            RECIPE_STEP_PRODUCT_EXISTS,
            GET_RECIPE_STEP_PRODUCT,
            RECIPE_STEP_INSTRUMENT_EXISTS,
            GET_RECIPE_STEP_INSTRUMENT,
            RECIPE_STEP_VESSEL_EXISTS,
            GET_RECIPE_STEP_VESSEL,
            RECIPE_STEP_COMPLETION_CONDITION_EXISTS,
            GET_RECIPE_STEP_COMPLETION_CONDITION,
        ] {
            assert!(sql.contains("recipe_steps.belongs_to_recipe = $1"), "{sql}");
            assert!(sql.contains("belongs_to_recipe_step = $2"), "{sql}");
            assert!(sql.contains(".id = $3"), "{sql}");
        }
    }

    #[test]
    fn test_lists_are_scoped_by_recipe_and_step() {
        for query in LIST_QUERIES {
            assert_eq!(query.sql.matches("recipe_steps.belongs_to_recipe = $8").count(), 3);
            assert_eq!(query.sql.matches("belongs_to_recipe_step = $9").count(), 3);
        }
    }

    #[test]
    fn test_cascade_archives_condition_ingredients_first() {
        assert!(ARCHIVE_CHILDREN_OF_STEPS[0]
            .starts_with("UPDATE recipe_step_completion_condition_ingredients"));
        for sql in ARCHIVE_CHILDREN_OF_STEPS {
            assert!(sql.contains("archived_at IS NULL"));
        }
    }
}
