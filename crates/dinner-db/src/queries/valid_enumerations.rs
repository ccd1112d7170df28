//! Valid ingredients, instruments, measurement units, preparations, vessels,
//! ingredient states and ingredient groups. Global tables: no owner predicate.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::{
    execute, fetch_all, fetch_exists, fetch_ids, fetch_optional, list_query, Counted, ListQuery,
};

// =============================================================================
// Ingredients
// =============================================================================

table_row! {
    pub struct ValidIngredientRow joined as "valid_ingredient_" {
        pub id: String,
        pub name: String,
        pub plural_name: String,
        pub description: String,
        pub warning: String,
        pub icon_path: String,
        pub slug: String,
        pub shopping_suggestions: String,
        pub storage_instructions: String,
        pub minimum_ideal_storage_temperature_in_celsius: Option<Decimal>,
        pub maximum_ideal_storage_temperature_in_celsius: Option<Decimal>,
        pub contains_egg: bool,
        pub contains_dairy: bool,
        pub contains_peanut: bool,
        pub contains_tree_nut: bool,
        pub contains_soy: bool,
        pub contains_wheat: bool,
        pub contains_shellfish: bool,
        pub contains_sesame: bool,
        pub contains_fish: bool,
        pub contains_gluten: bool,
        pub contains_alcohol: bool,
        pub animal_flesh: bool,
        pub animal_derived: bool,
        pub volumetric: bool,
        pub is_liquid: Option<bool>,
        pub restrict_to_preparations: bool,
        pub is_starch: bool,
        pub is_protein: bool,
        pub is_grain: bool,
        pub is_fruit: bool,
        pub is_salt: bool,
        pub is_fat: bool,
        pub is_acid: bool,
        pub is_heat: bool,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_INGREDIENT_EXISTS: &str = exists_by_id!("valid_ingredients");

pub const GET_VALID_INGREDIENT: &str = concat!(
    "SELECT ", valid_ingredient_columns!("valid_ingredients", ""),
    " FROM valid_ingredients",
    " WHERE valid_ingredients.archived_at IS NULL AND valid_ingredients.id = $1"
);

pub const GET_VALID_INGREDIENTS: &str = concat!(
    "SELECT ", valid_ingredient_columns!("valid_ingredients", ""), ", ",
    list_counts!("valid_ingredients", "TRUE"),
    " FROM valid_ingredients",
    list_where!("valid_ingredients", "TRUE")
);

pub const SEARCH_FOR_VALID_INGREDIENTS: &str = concat!(
    "SELECT ", valid_ingredient_columns!("valid_ingredients", ""),
    " FROM valid_ingredients",
    " WHERE valid_ingredients.archived_at IS NULL",
    " AND valid_ingredients.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_ingredients.name, valid_ingredients.id LIMIT $2"
);

pub const CREATE_VALID_INGREDIENT: &str = "INSERT INTO valid_ingredients (
    id, name, plural_name, description, warning, icon_path, slug, shopping_suggestions,
    storage_instructions, minimum_ideal_storage_temperature_in_celsius,
    maximum_ideal_storage_temperature_in_celsius, contains_egg, contains_dairy,
    contains_peanut, contains_tree_nut, contains_soy, contains_wheat, contains_shellfish,
    contains_sesame, contains_fish, contains_gluten, contains_alcohol, animal_flesh,
    animal_derived, volumetric, is_liquid, restrict_to_preparations, is_starch, is_protein,
    is_grain, is_fruit, is_salt, is_fat, is_acid, is_heat, created_at
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
    $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35, $36
)";

pub const UPDATE_VALID_INGREDIENT: &str = "UPDATE valid_ingredients SET
    name = $2, plural_name = $3, description = $4, warning = $5, icon_path = $6, slug = $7,
    shopping_suggestions = $8, storage_instructions = $9,
    minimum_ideal_storage_temperature_in_celsius = $10,
    maximum_ideal_storage_temperature_in_celsius = $11, contains_egg = $12,
    contains_dairy = $13, contains_peanut = $14, contains_tree_nut = $15, contains_soy = $16,
    contains_wheat = $17, contains_shellfish = $18, contains_sesame = $19, contains_fish = $20,
    contains_gluten = $21, contains_alcohol = $22, animal_flesh = $23, animal_derived = $24,
    volumetric = $25, is_liquid = $26, restrict_to_preparations = $27, is_starch = $28,
    is_protein = $29, is_grain = $30, is_fruit = $31, is_salt = $32, is_fat = $33,
    is_acid = $34, is_heat = $35, last_updated_at = GREATEST($36, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT: &str = archive_by_id!("valid_ingredients");
pub const GET_VALID_INGREDIENT_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("valid_ingredients");
pub const UPDATE_VALID_INGREDIENT_LAST_INDEXED_AT: &str = update_last_indexed_at!("valid_ingredients");

/// Binds `$1..$35` in column order.
fn bind_valid_ingredient<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidIngredientRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.plural_name)
        .bind(&row.description)
        .bind(&row.warning)
        .bind(&row.icon_path)
        .bind(&row.slug)
        .bind(&row.shopping_suggestions)
        .bind(&row.storage_instructions)
        .bind(row.minimum_ideal_storage_temperature_in_celsius)
        .bind(row.maximum_ideal_storage_temperature_in_celsius)
        .bind(row.contains_egg)
        .bind(row.contains_dairy)
        .bind(row.contains_peanut)
        .bind(row.contains_tree_nut)
        .bind(row.contains_soy)
        .bind(row.contains_wheat)
        .bind(row.contains_shellfish)
        .bind(row.contains_sesame)
        .bind(row.contains_fish)
        .bind(row.contains_gluten)
        .bind(row.contains_alcohol)
        .bind(row.animal_flesh)
        .bind(row.animal_derived)
        .bind(row.volumetric)
        .bind(row.is_liquid)
        .bind(row.restrict_to_preparations)
        .bind(row.is_starch)
        .bind(row.is_protein)
        .bind(row.is_grain)
        .bind(row.is_fruit)
        .bind(row.is_salt)
        .bind(row.is_fat)
        .bind(row.is_acid)
        .bind(row.is_heat)
}

pub async fn valid_ingredient_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT).bind(id), exec).await
}

pub async fn get_valid_ingredients<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENTS, filter), exec).await
}

pub async fn search_for_valid_ingredients<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidIngredientRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_INGREDIENTS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientRow,
) -> DbResult<u64> {
    let query = bind_valid_ingredient(sqlx::query(CREATE_VALID_INGREDIENT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_ingredient(sqlx::query(UPDATE_VALID_INGREDIENT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_ingredient<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT).bind(id), exec).await
}

pub async fn get_valid_ingredient_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_INGREDIENT_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_ingredient_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_VALID_INGREDIENT_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Instruments
// =============================================================================

table_row! {
    pub struct ValidInstrumentRow joined as "valid_instrument_" {
        pub id: String,
        pub name: String,
        pub plural_name: String,
        pub description: String,
        pub icon_path: String,
        pub slug: String,
        pub usable_for_storage: bool,
        pub display_in_summary_lists: bool,
        pub include_in_generated_instructions: bool,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_INSTRUMENT_EXISTS: &str = exists_by_id!("valid_instruments");

pub const GET_VALID_INSTRUMENT: &str = concat!(
    "SELECT ", valid_instrument_columns!("valid_instruments", ""),
    " FROM valid_instruments",
    " WHERE valid_instruments.archived_at IS NULL AND valid_instruments.id = $1"
);

pub const GET_VALID_INSTRUMENTS: &str = concat!(
    "SELECT ", valid_instrument_columns!("valid_instruments", ""), ", ",
    list_counts!("valid_instruments", "TRUE"),
    " FROM valid_instruments",
    list_where!("valid_instruments", "TRUE")
);

pub const SEARCH_FOR_VALID_INSTRUMENTS: &str = concat!(
    "SELECT ", valid_instrument_columns!("valid_instruments", ""),
    " FROM valid_instruments",
    " WHERE valid_instruments.archived_at IS NULL",
    " AND valid_instruments.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_instruments.name, valid_instruments.id LIMIT $2"
);

pub const CREATE_VALID_INSTRUMENT: &str = "INSERT INTO valid_instruments (
    id, name, plural_name, description, icon_path, slug, usable_for_storage,
    display_in_summary_lists, include_in_generated_instructions, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

pub const UPDATE_VALID_INSTRUMENT: &str = "UPDATE valid_instruments SET
    name = $2, plural_name = $3, description = $4, icon_path = $5, slug = $6,
    usable_for_storage = $7, display_in_summary_lists = $8,
    include_in_generated_instructions = $9, last_updated_at = GREATEST($10, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INSTRUMENT: &str = archive_by_id!("valid_instruments");
pub const GET_VALID_INSTRUMENT_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("valid_instruments");
pub const UPDATE_VALID_INSTRUMENT_LAST_INDEXED_AT: &str = update_last_indexed_at!("valid_instruments");

fn bind_valid_instrument<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidInstrumentRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.plural_name)
        .bind(&row.description)
        .bind(&row.icon_path)
        .bind(&row.slug)
        .bind(row.usable_for_storage)
        .bind(row.display_in_summary_lists)
        .bind(row.include_in_generated_instructions)
}

pub async fn valid_instrument_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INSTRUMENT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidInstrumentRow>> {
    fetch_optional(sqlx::query(GET_VALID_INSTRUMENT).bind(id), exec).await
}

pub async fn get_valid_instruments<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidInstrumentRow>>> {
    fetch_all(list_query(GET_VALID_INSTRUMENTS, filter), exec).await
}

pub async fn search_for_valid_instruments<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidInstrumentRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_INSTRUMENTS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidInstrumentRow,
) -> DbResult<u64> {
    let query = bind_valid_instrument(sqlx::query(CREATE_VALID_INSTRUMENT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidInstrumentRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_instrument(sqlx::query(UPDATE_VALID_INSTRUMENT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_instrument<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INSTRUMENT).bind(id), exec).await
}

pub async fn get_valid_instrument_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_INSTRUMENT_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_instrument_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_VALID_INSTRUMENT_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Measurement Units
// =============================================================================

table_row! {
    pub struct ValidMeasurementUnitRow joined as "valid_measurement_unit_" {
        pub id: String,
        pub name: String,
        pub plural_name: String,
        pub description: String,
        pub icon_path: String,
        pub slug: String,
        pub volumetric: bool,
        pub universal: bool,
        pub metric: bool,
        pub imperial: bool,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_MEASUREMENT_UNIT_EXISTS: &str = exists_by_id!("valid_measurement_units");

pub const GET_VALID_MEASUREMENT_UNIT: &str = concat!(
    "SELECT ", valid_measurement_unit_columns!("valid_measurement_units", ""),
    " FROM valid_measurement_units",
    " WHERE valid_measurement_units.archived_at IS NULL AND valid_measurement_units.id = $1"
);

pub const GET_VALID_MEASUREMENT_UNITS: &str = concat!(
    "SELECT ", valid_measurement_unit_columns!("valid_measurement_units", ""), ", ",
    list_counts!("valid_measurement_units", "TRUE"),
    " FROM valid_measurement_units",
    list_where!("valid_measurement_units", "TRUE")
);

pub const SEARCH_FOR_VALID_MEASUREMENT_UNITS: &str = concat!(
    "SELECT ", valid_measurement_unit_columns!("valid_measurement_units", ""),
    " FROM valid_measurement_units",
    " WHERE valid_measurement_units.archived_at IS NULL",
    " AND valid_measurement_units.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_measurement_units.name, valid_measurement_units.id LIMIT $2"
);

pub const CREATE_VALID_MEASUREMENT_UNIT: &str = "INSERT INTO valid_measurement_units (
    id, name, plural_name, description, icon_path, slug, volumetric, universal, metric,
    imperial, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

pub const UPDATE_VALID_MEASUREMENT_UNIT: &str = "UPDATE valid_measurement_units SET
    name = $2, plural_name = $3, description = $4, icon_path = $5, slug = $6,
    volumetric = $7, universal = $8, metric = $9, imperial = $10,
    last_updated_at = GREATEST($11, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_MEASUREMENT_UNIT: &str = archive_by_id!("valid_measurement_units");
pub const GET_VALID_MEASUREMENT_UNIT_IDS_NEEDING_INDEXING: &str =
    ids_needing_indexing!("valid_measurement_units");
pub const UPDATE_VALID_MEASUREMENT_UNIT_LAST_INDEXED_AT: &str =
    update_last_indexed_at!("valid_measurement_units");

fn bind_valid_measurement_unit<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidMeasurementUnitRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.plural_name)
        .bind(&row.description)
        .bind(&row.icon_path)
        .bind(&row.slug)
        .bind(row.volumetric)
        .bind(row.universal)
        .bind(row.metric)
        .bind(row.imperial)
}

pub async fn valid_measurement_unit_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_MEASUREMENT_UNIT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidMeasurementUnitRow>> {
    fetch_optional(sqlx::query(GET_VALID_MEASUREMENT_UNIT).bind(id), exec).await
}

pub async fn get_valid_measurement_units<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidMeasurementUnitRow>>> {
    fetch_all(list_query(GET_VALID_MEASUREMENT_UNITS, filter), exec).await
}

pub async fn search_for_valid_measurement_units<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidMeasurementUnitRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_MEASUREMENT_UNITS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidMeasurementUnitRow,
) -> DbResult<u64> {
    let query = bind_valid_measurement_unit(sqlx::query(CREATE_VALID_MEASUREMENT_UNIT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidMeasurementUnitRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_measurement_unit(sqlx::query(UPDATE_VALID_MEASUREMENT_UNIT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_MEASUREMENT_UNIT).bind(id), exec).await
}

pub async fn get_valid_measurement_unit_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_MEASUREMENT_UNIT_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_measurement_unit_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(UPDATE_VALID_MEASUREMENT_UNIT_LAST_INDEXED_AT).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Preparations
// =============================================================================

table_row! {
    pub struct ValidPreparationRow joined as "valid_preparation_" {
        pub id: String,
        pub name: String,
        pub past_tense: String,
        pub description: String,
        pub icon_path: String,
        pub slug: String,
        pub yields_nothing: bool,
        pub restrict_to_ingredients: bool,
        pub minimum_ingredient_count: i32,
        pub maximum_ingredient_count: Option<i32>,
        pub minimum_instrument_count: i32,
        pub maximum_instrument_count: Option<i32>,
        pub minimum_vessel_count: i32,
        pub maximum_vessel_count: Option<i32>,
        pub temperature_required: bool,
        pub time_estimate_required: bool,
        pub condition_expression_required: bool,
        pub consumes_vessel: bool,
        pub only_for_vessels: bool,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_PREPARATION_EXISTS: &str = exists_by_id!("valid_preparations");

pub const GET_VALID_PREPARATION: &str = concat!(
    "SELECT ", valid_preparation_columns!("valid_preparations", ""),
    " FROM valid_preparations",
    " WHERE valid_preparations.archived_at IS NULL AND valid_preparations.id = $1"
);

pub const GET_VALID_PREPARATIONS: &str = concat!(
    "SELECT ", valid_preparation_columns!("valid_preparations", ""), ", ",
    list_counts!("valid_preparations", "TRUE"),
    " FROM valid_preparations",
    list_where!("valid_preparations", "TRUE")
);

pub const SEARCH_FOR_VALID_PREPARATIONS: &str = concat!(
    "SELECT ", valid_preparation_columns!("valid_preparations", ""),
    " FROM valid_preparations",
    " WHERE valid_preparations.archived_at IS NULL",
    " AND valid_preparations.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_preparations.name, valid_preparations.id LIMIT $2"
);

pub const CREATE_VALID_PREPARATION: &str = "INSERT INTO valid_preparations (
    id, name, past_tense, description, icon_path, slug, yields_nothing,
    restrict_to_ingredients, minimum_ingredient_count, maximum_ingredient_count,
    minimum_instrument_count, maximum_instrument_count, minimum_vessel_count,
    maximum_vessel_count, temperature_required, time_estimate_required,
    condition_expression_required, consumes_vessel, only_for_vessels, created_at
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
)";

pub const UPDATE_VALID_PREPARATION: &str = "UPDATE valid_preparations SET
    name = $2, past_tense = $3, description = $4, icon_path = $5, slug = $6,
    yields_nothing = $7, restrict_to_ingredients = $8, minimum_ingredient_count = $9,
    maximum_ingredient_count = $10, minimum_instrument_count = $11,
    maximum_instrument_count = $12, minimum_vessel_count = $13, maximum_vessel_count = $14,
    temperature_required = $15, time_estimate_required = $16,
    condition_expression_required = $17, consumes_vessel = $18, only_for_vessels = $19,
    last_updated_at = GREATEST($20, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_PREPARATION: &str = archive_by_id!("valid_preparations");
pub const GET_VALID_PREPARATION_IDS_NEEDING_INDEXING: &str =
    ids_needing_indexing!("valid_preparations");
pub const UPDATE_VALID_PREPARATION_LAST_INDEXED_AT: &str =
    update_last_indexed_at!("valid_preparations");

fn bind_valid_preparation<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidPreparationRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.past_tense)
        .bind(&row.description)
        .bind(&row.icon_path)
        .bind(&row.slug)
        .bind(row.yields_nothing)
        .bind(row.restrict_to_ingredients)
        .bind(row.minimum_ingredient_count)
        .bind(row.maximum_ingredient_count)
        .bind(row.minimum_instrument_count)
        .bind(row.maximum_instrument_count)
        .bind(row.minimum_vessel_count)
        .bind(row.maximum_vessel_count)
        .bind(row.temperature_required)
        .bind(row.time_estimate_required)
        .bind(row.condition_expression_required)
        .bind(row.consumes_vessel)
        .bind(row.only_for_vessels)
}

pub async fn valid_preparation_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_PREPARATION_EXISTS).bind(id), exec).await
}

pub async fn get_valid_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidPreparationRow>> {
    fetch_optional(sqlx::query(GET_VALID_PREPARATION).bind(id), exec).await
}

pub async fn get_valid_preparations<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidPreparationRow>>> {
    fetch_all(list_query(GET_VALID_PREPARATIONS, filter), exec).await
}

pub async fn search_for_valid_preparations<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidPreparationRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_PREPARATIONS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationRow,
) -> DbResult<u64> {
    let query = bind_valid_preparation(sqlx::query(CREATE_VALID_PREPARATION), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_preparation(sqlx::query(UPDATE_VALID_PREPARATION), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_preparation<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_PREPARATION).bind(id), exec).await
}

pub async fn get_valid_preparation_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_PREPARATION_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_preparation_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_VALID_PREPARATION_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Vessels
// =============================================================================

table_row! {
    pub struct ValidVesselRow joined as "valid_vessel_" {
        pub id: String,
        pub name: String,
        pub plural_name: String,
        pub description: String,
        pub icon_path: String,
        pub slug: String,
        pub usable_for_storage: bool,
        pub display_in_summary_lists: bool,
        pub include_in_generated_instructions: bool,
        pub capacity: Decimal,
        pub capacity_unit: Option<String>,
        pub width_in_millimeters: Option<Decimal>,
        pub length_in_millimeters: Option<Decimal>,
        pub height_in_millimeters: Option<Decimal>,
        pub shape: String,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// A vessel and its capacity unit, when it has one.
pub type ValidVesselWithUnitRow = (ValidVesselRow, Option<ValidMeasurementUnitRow>);

pub const VALID_VESSEL_EXISTS: &str = exists_by_id!("valid_vessels");

pub const GET_VALID_VESSEL: &str = concat!(
    "SELECT ", valid_vessel_columns!("valid_vessels", ""), ", ",
    valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"),
    " FROM valid_vessels",
    " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit",
    " AND valid_measurement_units.archived_at IS NULL",
    " WHERE valid_vessels.archived_at IS NULL AND valid_vessels.id = $1"
);

pub const GET_VALID_VESSELS: &str = concat!(
    "SELECT ", valid_vessel_columns!("valid_vessels", ""), ", ",
    valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"), ", ",
    list_counts!("valid_vessels", "TRUE"),
    " FROM valid_vessels",
    " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit",
    " AND valid_measurement_units.archived_at IS NULL",
    list_where!("valid_vessels", "TRUE")
);

pub const SEARCH_FOR_VALID_VESSELS: &str = concat!(
    "SELECT ", valid_vessel_columns!("valid_vessels", ""), ", ",
    valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"),
    " FROM valid_vessels",
    " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit",
    " AND valid_measurement_units.archived_at IS NULL",
    " WHERE valid_vessels.archived_at IS NULL",
    " AND valid_vessels.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_vessels.name, valid_vessels.id LIMIT $2"
);

pub const CREATE_VALID_VESSEL: &str = "INSERT INTO valid_vessels (
    id, name, plural_name, description, icon_path, slug, usable_for_storage,
    display_in_summary_lists, include_in_generated_instructions, capacity, capacity_unit,
    width_in_millimeters, length_in_millimeters, height_in_millimeters, shape, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";

pub const UPDATE_VALID_VESSEL: &str = "UPDATE valid_vessels SET
    name = $2, plural_name = $3, description = $4, icon_path = $5, slug = $6,
    usable_for_storage = $7, display_in_summary_lists = $8,
    include_in_generated_instructions = $9, capacity = $10, capacity_unit = $11,
    width_in_millimeters = $12, length_in_millimeters = $13, height_in_millimeters = $14,
    shape = $15, last_updated_at = GREATEST($16, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_VESSEL: &str = archive_by_id!("valid_vessels");
pub const GET_VALID_VESSEL_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("valid_vessels");
pub const UPDATE_VALID_VESSEL_LAST_INDEXED_AT: &str = update_last_indexed_at!("valid_vessels");

fn bind_valid_vessel<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidVesselRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.plural_name)
        .bind(&row.description)
        .bind(&row.icon_path)
        .bind(&row.slug)
        .bind(row.usable_for_storage)
        .bind(row.display_in_summary_lists)
        .bind(row.include_in_generated_instructions)
        .bind(row.capacity)
        .bind(&row.capacity_unit)
        .bind(row.width_in_millimeters)
        .bind(row.length_in_millimeters)
        .bind(row.height_in_millimeters)
        .bind(&row.shape)
}

pub async fn valid_vessel_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_VESSEL_EXISTS).bind(id), exec).await
}

pub async fn get_valid_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidVesselWithUnitRow>> {
    fetch_optional(sqlx::query(GET_VALID_VESSEL).bind(id), exec).await
}

pub async fn get_valid_vessels<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidVesselWithUnitRow>>> {
    fetch_all(list_query(GET_VALID_VESSELS, filter), exec).await
}

pub async fn search_for_valid_vessels<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidVesselWithUnitRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_VESSELS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidVesselRow,
) -> DbResult<u64> {
    let query = bind_valid_vessel(sqlx::query(CREATE_VALID_VESSEL), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidVesselRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_vessel(sqlx::query(UPDATE_VALID_VESSEL), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_vessel<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_VESSEL).bind(id), exec).await
}

pub async fn get_valid_vessel_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_VESSEL_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_vessel_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_VALID_VESSEL_LAST_INDEXED_AT).bind(id), exec).await
}

// =============================================================================
// Ingredient States
// =============================================================================

table_row! {
    pub struct ValidIngredientStateRow joined as "valid_ingredient_state_" {
        pub id: String,
        pub name: String,
        pub past_tense: String,
        pub slug: String,
        pub description: String,
        pub icon_path: String,
        pub attribute_type: String,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_INGREDIENT_STATE_EXISTS: &str = exists_by_id!("valid_ingredient_states");

pub const GET_VALID_INGREDIENT_STATE: &str = concat!(
    "SELECT ", valid_ingredient_state_columns!("valid_ingredient_states", ""),
    " FROM valid_ingredient_states",
    " WHERE valid_ingredient_states.archived_at IS NULL AND valid_ingredient_states.id = $1"
);

pub const GET_VALID_INGREDIENT_STATES: &str = concat!(
    "SELECT ", valid_ingredient_state_columns!("valid_ingredient_states", ""), ", ",
    list_counts!("valid_ingredient_states", "TRUE"),
    " FROM valid_ingredient_states",
    list_where!("valid_ingredient_states", "TRUE")
);

pub const SEARCH_FOR_VALID_INGREDIENT_STATES: &str = concat!(
    "SELECT ", valid_ingredient_state_columns!("valid_ingredient_states", ""),
    " FROM valid_ingredient_states",
    " WHERE valid_ingredient_states.archived_at IS NULL",
    " AND valid_ingredient_states.name ILIKE '%' || $1 || '%'",
    " ORDER BY valid_ingredient_states.name, valid_ingredient_states.id LIMIT $2"
);

pub const CREATE_VALID_INGREDIENT_STATE: &str = "INSERT INTO valid_ingredient_states (
    id, name, past_tense, slug, description, icon_path, attribute_type, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const UPDATE_VALID_INGREDIENT_STATE: &str = "UPDATE valid_ingredient_states SET
    name = $2, past_tense = $3, slug = $4, description = $5, icon_path = $6,
    attribute_type = $7, last_updated_at = GREATEST($8, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT_STATE: &str = archive_by_id!("valid_ingredient_states");
pub const GET_VALID_INGREDIENT_STATE_IDS_NEEDING_INDEXING: &str =
    ids_needing_indexing!("valid_ingredient_states");
pub const UPDATE_VALID_INGREDIENT_STATE_LAST_INDEXED_AT: &str =
    update_last_indexed_at!("valid_ingredient_states");

fn bind_valid_ingredient_state<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidIngredientStateRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.past_tense)
        .bind(&row.slug)
        .bind(&row.description)
        .bind(&row.icon_path)
        .bind(&row.attribute_type)
}

pub async fn valid_ingredient_state_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_STATE_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient_state<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientStateRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT_STATE).bind(id), exec).await
}

pub async fn get_valid_ingredient_states<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientStateRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENT_STATES, filter), exec).await
}

pub async fn search_for_valid_ingredient_states<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ValidIngredientStateRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_VALID_INGREDIENT_STATES).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient_state<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientStateRow,
) -> DbResult<u64> {
    let query = bind_valid_ingredient_state(sqlx::query(CREATE_VALID_INGREDIENT_STATE), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_ingredient_state<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientStateRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_ingredient_state(sqlx::query(UPDATE_VALID_INGREDIENT_STATE), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_ingredient_state<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT_STATE).bind(id), exec).await
}

pub async fn get_valid_ingredient_state_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_VALID_INGREDIENT_STATE_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_valid_ingredient_state_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(UPDATE_VALID_INGREDIENT_STATE_LAST_INDEXED_AT).bind(id),
        exec,
    )
    .await
}

// =============================================================================
// Ingredient Groups
// =============================================================================

table_row! {
    pub struct ValidIngredientGroupRow {
        pub id: String,
        pub name: String,
        pub description: String,
        pub slug: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidIngredientGroupMemberRow {
        pub id: String,
        pub belongs_to_group: String,
        pub valid_ingredient: String,
        pub created_at: DateTime<Utc>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const VALID_INGREDIENT_GROUP_EXISTS: &str = exists_by_id!("valid_ingredient_groups");

pub const GET_VALID_INGREDIENT_GROUP: &str = concat!(
    "SELECT ", valid_ingredient_group_columns!("valid_ingredient_groups", ""),
    " FROM valid_ingredient_groups",
    " WHERE valid_ingredient_groups.archived_at IS NULL AND valid_ingredient_groups.id = $1"
);

pub const GET_VALID_INGREDIENT_GROUPS: &str = concat!(
    "SELECT ", valid_ingredient_group_columns!("valid_ingredient_groups", ""), ", ",
    list_counts!("valid_ingredient_groups", "TRUE"),
    " FROM valid_ingredient_groups",
    list_where!("valid_ingredient_groups", "TRUE")
);

/// Members of every listed group in one round trip.
pub const GET_VALID_INGREDIENT_GROUP_MEMBERS: &str = concat!(
    "SELECT ", valid_ingredient_group_member_columns!("valid_ingredient_group_members", ""), ", ",
    valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"),
    " FROM valid_ingredient_group_members",
    " JOIN valid_ingredients ON valid_ingredients.id = valid_ingredient_group_members.valid_ingredient",
    " WHERE valid_ingredient_group_members.archived_at IS NULL",
    " AND valid_ingredients.archived_at IS NULL",
    " AND valid_ingredient_group_members.belongs_to_group = ANY($1)",
    " ORDER BY valid_ingredient_group_members.created_at, valid_ingredient_group_members.id"
);

pub const CREATE_VALID_INGREDIENT_GROUP: &str = "INSERT INTO valid_ingredient_groups (
    id, name, description, slug, created_at
) VALUES ($1, $2, $3, $4, $5)";

pub const CREATE_VALID_INGREDIENT_GROUP_MEMBER: &str = "INSERT INTO valid_ingredient_group_members (
    id, belongs_to_group, valid_ingredient, created_at
) VALUES ($1, $2, $3, $4)";

pub const UPDATE_VALID_INGREDIENT_GROUP: &str = "UPDATE valid_ingredient_groups SET
    name = $2, description = $3, slug = $4, last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT_GROUP: &str = archive_by_id!("valid_ingredient_groups");

pub const ARCHIVE_VALID_INGREDIENT_GROUP_MEMBERS: &str = "UPDATE valid_ingredient_group_members
SET archived_at = NOW() WHERE archived_at IS NULL AND belongs_to_group = $1";

/// A group member joined with its ingredient.
pub type ValidIngredientGroupMemberWithIngredientRow =
    (ValidIngredientGroupMemberRow, ValidIngredientRow);

pub async fn valid_ingredient_group_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_GROUP_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient_group<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientGroupRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT_GROUP).bind(id), exec).await
}

pub async fn get_valid_ingredient_groups<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientGroupRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENT_GROUPS, filter), exec).await
}

pub async fn get_valid_ingredient_group_members<'e, E: PgExecutor<'e>>(
    exec: E,
    group_ids: &[String],
) -> DbResult<Vec<ValidIngredientGroupMemberWithIngredientRow>> {
    fetch_all(
        sqlx::query(GET_VALID_INGREDIENT_GROUP_MEMBERS).bind(group_ids),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient_group<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientGroupRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_INGREDIENT_GROUP)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.slug)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn create_valid_ingredient_group_member<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientGroupMemberRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_INGREDIENT_GROUP_MEMBER)
        .bind(&row.id)
        .bind(&row.belongs_to_group)
        .bind(&row.valid_ingredient)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_ingredient_group<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientGroupRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_INGREDIENT_GROUP)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.slug)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_ingredient_group<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT_GROUP).bind(id), exec).await
}

pub async fn archive_valid_ingredient_group_members<'e, E: PgExecutor<'e>>(
    exec: E,
    group_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_VALID_INGREDIENT_GROUP_MEMBERS).bind(group_id),
        exec,
    )
    .await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_valid_ingredients", sql: GET_VALID_INGREDIENTS },
    ListQuery { name: "get_valid_instruments", sql: GET_VALID_INSTRUMENTS },
    ListQuery { name: "get_valid_measurement_units", sql: GET_VALID_MEASUREMENT_UNITS },
    ListQuery { name: "get_valid_preparations", sql: GET_VALID_PREPARATIONS },
    ListQuery { name: "get_valid_vessels", sql: GET_VALID_VESSELS },
    ListQuery { name: "get_valid_ingredient_states", sql: GET_VALID_INGREDIENT_STATES },
    ListQuery { name: "get_valid_ingredient_groups", sql: GET_VALID_INGREDIENT_GROUPS },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vessel_unit_is_left_joined() {
        assert!(GET_VALID_VESSEL.contains("LEFT JOIN valid_measurement_units"));
        assert!(GET_VALID_VESSEL
            .contains("valid_measurement_units.id AS valid_measurement_unit_id"));
    }

    #[test]
    fn test_insert_and_update_placeholders_line_up() {
        assert!(CREATE_VALID_INGREDIENT.contains("$36"));
        assert!(!CREATE_VALID_INGREDIENT.contains("$37"));
        assert!(UPDATE_VALID_INGREDIENT.contains("GREATEST($36, created_at)"));
        assert!(UPDATE_VALID_PREPARATION.contains("GREATEST($20, created_at)"));
        assert!(UPDATE_VALID_VESSEL.contains("GREATEST($16, created_at)"));
        assert!(UPDATE_VALID_INGREDIENT_STATE.contains("GREATEST($8, created_at)"));
    }

    #[test]
    fn test_reindex_statement_uses_window_parameter() {
        assert!(GET_VALID_INGREDIENT_IDS_NEEDING_INDEXING
            .contains("last_indexed_at < NOW() - make_interval(secs => $1)"));
        assert!(GET_VALID_INGREDIENT_IDS_NEEDING_INDEXING.contains("archived_at IS NULL"));
    }
}
