//! Links between valid enumerations. Every read joins both linked sides.
//!
//! The link's own `valid_*_id` columns share aliases with the joined sides'
//! `id` columns; the join conditions keep them equal.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::valid_enumerations::{
    ValidIngredientRow, ValidIngredientStateRow, ValidInstrumentRow, ValidMeasurementUnitRow,
    ValidPreparationRow, ValidVesselWithUnitRow,
};
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

table_row! {
    pub struct ValidIngredientMeasurementUnitRow {
        pub id: String,
        pub notes: String,
        pub valid_ingredient_id: String,
        pub valid_measurement_unit_id: String,
        pub minimum_allowable_quantity: Decimal,
        pub maximum_allowable_quantity: Option<Decimal>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidIngredientPreparationRow {
        pub id: String,
        pub notes: String,
        pub valid_preparation_id: String,
        pub valid_ingredient_id: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidPreparationInstrumentRow {
        pub id: String,
        pub notes: String,
        pub valid_preparation_id: String,
        pub valid_instrument_id: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidPreparationVesselRow {
        pub id: String,
        pub notes: String,
        pub valid_preparation_id: String,
        pub valid_vessel_id: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidIngredientStateIngredientRow {
        pub id: String,
        pub notes: String,
        pub valid_ingredient_state_id: String,
        pub valid_ingredient_id: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ValidMeasurementUnitConversionRow {
        pub id: String,
        pub from_unit: String,
        pub to_unit: String,
        pub only_for_ingredient: Option<String>,
        pub modifier: Decimal,
        pub notes: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

joined_alias! {
    pub struct FromUnitRow(ValidMeasurementUnitRow) joined as "from_unit_";
}

joined_alias! {
    pub struct ToUnitRow(ValidMeasurementUnitRow) joined as "to_unit_";
}

pub type ValidIngredientMeasurementUnitWideRow =
    (ValidIngredientMeasurementUnitRow, ValidIngredientRow, ValidMeasurementUnitRow);

pub type ValidIngredientPreparationWideRow =
    (ValidIngredientPreparationRow, ValidPreparationRow, ValidIngredientRow);

pub type ValidPreparationInstrumentWideRow =
    (ValidPreparationInstrumentRow, ValidPreparationRow, ValidInstrumentRow);

/// The vessel side carries its own optional capacity unit, aliased under
/// `valid_vessel_valid_measurement_unit_`.
pub type ValidPreparationVesselWideRow =
    (ValidPreparationVesselRow, ValidPreparationRow, ValidVesselWithUnitRow);

pub type ValidIngredientStateIngredientWideRow =
    (ValidIngredientStateIngredientRow, ValidIngredientStateRow, ValidIngredientRow);

/// Both units come from the same table, aliased `from_units` and `to_units`.
pub type ValidMeasurementUnitConversionWideRow = (
    ValidMeasurementUnitConversionRow,
    FromUnitRow,
    ToUnitRow,
    Option<ValidIngredientRow>,
);

// =============================================================================
// Ingredient ⇄ measurement unit
// =============================================================================

macro_rules! vimu_select {
    () => {
        concat!(
            "SELECT ",
            valid_ingredient_measurement_unit_columns!("valid_ingredient_measurement_units", ""), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"), ", ",
            valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_")
        )
    };
}

macro_rules! vimu_from {
    () => {
        concat!(
            " FROM valid_ingredient_measurement_units",
            " JOIN valid_ingredients ON valid_ingredients.id = valid_ingredient_measurement_units.valid_ingredient_id",
            " JOIN valid_measurement_units ON valid_measurement_units.id = valid_ingredient_measurement_units.valid_measurement_unit_id"
        )
    };
}

macro_rules! vimu_list {
    ($owner:literal) => {
        concat!(
            vimu_select!(), ", ",
            list_counts!("valid_ingredient_measurement_units", $owner),
            vimu_from!(),
            list_where!("valid_ingredient_measurement_units", $owner)
        )
    };
}

pub const VALID_INGREDIENT_MEASUREMENT_UNIT_EXISTS: &str =
    exists_by_id!("valid_ingredient_measurement_units");

pub const GET_VALID_INGREDIENT_MEASUREMENT_UNIT: &str = concat!(
    vimu_select!(),
    vimu_from!(),
    " WHERE valid_ingredient_measurement_units.archived_at IS NULL",
    " AND valid_ingredients.archived_at IS NULL",
    " AND valid_measurement_units.archived_at IS NULL",
    " AND valid_ingredient_measurement_units.id = $1"
);

pub const GET_VALID_INGREDIENT_MEASUREMENT_UNITS: &str = vimu_list!("TRUE");

pub const GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_INGREDIENT: &str =
    vimu_list!("valid_ingredient_measurement_units.valid_ingredient_id = $8");

pub const GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_MEASUREMENT_UNIT: &str =
    vimu_list!("valid_ingredient_measurement_units.valid_measurement_unit_id = $8");

pub const CREATE_VALID_INGREDIENT_MEASUREMENT_UNIT: &str = "INSERT INTO valid_ingredient_measurement_units (
    id, notes, valid_ingredient_id, valid_measurement_unit_id, minimum_allowable_quantity,
    maximum_allowable_quantity, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_VALID_INGREDIENT_MEASUREMENT_UNIT: &str = "UPDATE valid_ingredient_measurement_units SET
    notes = $2, valid_ingredient_id = $3, valid_measurement_unit_id = $4,
    minimum_allowable_quantity = $5, maximum_allowable_quantity = $6,
    last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT_MEASUREMENT_UNIT: &str =
    archive_by_id!("valid_ingredient_measurement_units");

pub async fn valid_ingredient_measurement_unit_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_MEASUREMENT_UNIT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientMeasurementUnitWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT_MEASUREMENT_UNIT).bind(id), exec).await
}

pub async fn get_valid_ingredient_measurement_units<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientMeasurementUnitWideRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENT_MEASUREMENT_UNITS, filter), exec).await
}

pub async fn get_valid_ingredient_measurement_units_for_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    ingredient_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientMeasurementUnitWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_INGREDIENT, filter)
            .bind(ingredient_id),
        exec,
    )
    .await
}

pub async fn get_valid_ingredient_measurement_units_for_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    measurement_unit_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientMeasurementUnitWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_MEASUREMENT_UNIT, filter)
            .bind(measurement_unit_id),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientMeasurementUnitRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_INGREDIENT_MEASUREMENT_UNIT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_ingredient_id)
        .bind(&row.valid_measurement_unit_id)
        .bind(row.minimum_allowable_quantity)
        .bind(row.maximum_allowable_quantity)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_ingredient_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientMeasurementUnitRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_INGREDIENT_MEASUREMENT_UNIT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_ingredient_id)
        .bind(&row.valid_measurement_unit_id)
        .bind(row.minimum_allowable_quantity)
        .bind(row.maximum_allowable_quantity)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_ingredient_measurement_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT_MEASUREMENT_UNIT).bind(id), exec).await
}

// =============================================================================
// Ingredient ⇄ preparation
// =============================================================================

macro_rules! vip_select {
    () => {
        concat!(
            "SELECT ",
            valid_ingredient_preparation_columns!("valid_ingredient_preparations", ""), ", ",
            valid_preparation_columns!("valid_preparations", "valid_preparation_"), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_")
        )
    };
}

macro_rules! vip_from {
    () => {
        concat!(
            " FROM valid_ingredient_preparations",
            " JOIN valid_preparations ON valid_preparations.id = valid_ingredient_preparations.valid_preparation_id",
            " JOIN valid_ingredients ON valid_ingredients.id = valid_ingredient_preparations.valid_ingredient_id"
        )
    };
}

macro_rules! vip_list {
    ($owner:literal) => {
        concat!(
            vip_select!(), ", ",
            list_counts!("valid_ingredient_preparations", $owner),
            vip_from!(),
            list_where!("valid_ingredient_preparations", $owner)
        )
    };
}

pub const VALID_INGREDIENT_PREPARATION_EXISTS: &str =
    exists_by_id!("valid_ingredient_preparations");

pub const GET_VALID_INGREDIENT_PREPARATION: &str = concat!(
    vip_select!(),
    vip_from!(),
    " WHERE valid_ingredient_preparations.archived_at IS NULL",
    " AND valid_preparations.archived_at IS NULL",
    " AND valid_ingredients.archived_at IS NULL",
    " AND valid_ingredient_preparations.id = $1"
);

pub const GET_VALID_INGREDIENT_PREPARATIONS: &str = vip_list!("TRUE");

pub const GET_VALID_INGREDIENT_PREPARATIONS_FOR_INGREDIENT: &str =
    vip_list!("valid_ingredient_preparations.valid_ingredient_id = $8");

pub const GET_VALID_INGREDIENT_PREPARATIONS_FOR_PREPARATION: &str =
    vip_list!("valid_ingredient_preparations.valid_preparation_id = $8");

pub const CREATE_VALID_INGREDIENT_PREPARATION: &str = "INSERT INTO valid_ingredient_preparations (
    id, notes, valid_preparation_id, valid_ingredient_id, created_at
) VALUES ($1, $2, $3, $4, $5)";

pub const UPDATE_VALID_INGREDIENT_PREPARATION: &str = "UPDATE valid_ingredient_preparations SET
    notes = $2, valid_preparation_id = $3, valid_ingredient_id = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT_PREPARATION: &str =
    archive_by_id!("valid_ingredient_preparations");

pub async fn valid_ingredient_preparation_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_PREPARATION_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientPreparationWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT_PREPARATION).bind(id), exec).await
}

pub async fn get_valid_ingredient_preparations<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientPreparationWideRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENT_PREPARATIONS, filter), exec).await
}

pub async fn get_valid_ingredient_preparations_for_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    ingredient_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientPreparationWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_PREPARATIONS_FOR_INGREDIENT, filter).bind(ingredient_id),
        exec,
    )
    .await
}

pub async fn get_valid_ingredient_preparations_for_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    preparation_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientPreparationWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_PREPARATIONS_FOR_PREPARATION, filter).bind(preparation_id),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientPreparationRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_INGREDIENT_PREPARATION)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_ingredient_id)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_ingredient_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientPreparationRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_INGREDIENT_PREPARATION)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_ingredient_id)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_ingredient_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT_PREPARATION).bind(id), exec).await
}

// =============================================================================
// Preparation ⇄ instrument
// =============================================================================

macro_rules! vpi_select {
    () => {
        concat!(
            "SELECT ",
            valid_preparation_instrument_columns!("valid_preparation_instruments", ""), ", ",
            valid_preparation_columns!("valid_preparations", "valid_preparation_"), ", ",
            valid_instrument_columns!("valid_instruments", "valid_instrument_")
        )
    };
}

macro_rules! vpi_from {
    () => {
        concat!(
            " FROM valid_preparation_instruments",
            " JOIN valid_preparations ON valid_preparations.id = valid_preparation_instruments.valid_preparation_id",
            " JOIN valid_instruments ON valid_instruments.id = valid_preparation_instruments.valid_instrument_id"
        )
    };
}

macro_rules! vpi_list {
    ($owner:literal) => {
        concat!(
            vpi_select!(), ", ",
            list_counts!("valid_preparation_instruments", $owner),
            vpi_from!(),
            list_where!("valid_preparation_instruments", $owner)
        )
    };
}

pub const VALID_PREPARATION_INSTRUMENT_EXISTS: &str =
    exists_by_id!("valid_preparation_instruments");

pub const GET_VALID_PREPARATION_INSTRUMENT: &str = concat!(
    vpi_select!(),
    vpi_from!(),
    " WHERE valid_preparation_instruments.archived_at IS NULL",
    " AND valid_preparations.archived_at IS NULL",
    " AND valid_instruments.archived_at IS NULL",
    " AND valid_preparation_instruments.id = $1"
);

pub const GET_VALID_PREPARATION_INSTRUMENTS: &str = vpi_list!("TRUE");

pub const GET_VALID_PREPARATION_INSTRUMENTS_FOR_PREPARATION: &str =
    vpi_list!("valid_preparation_instruments.valid_preparation_id = $8");

pub const GET_VALID_PREPARATION_INSTRUMENTS_FOR_INSTRUMENT: &str =
    vpi_list!("valid_preparation_instruments.valid_instrument_id = $8");

pub const CREATE_VALID_PREPARATION_INSTRUMENT: &str = "INSERT INTO valid_preparation_instruments (
    id, notes, valid_preparation_id, valid_instrument_id, created_at
) VALUES ($1, $2, $3, $4, $5)";

pub const UPDATE_VALID_PREPARATION_INSTRUMENT: &str = "UPDATE valid_preparation_instruments SET
    notes = $2, valid_preparation_id = $3, valid_instrument_id = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_PREPARATION_INSTRUMENT: &str =
    archive_by_id!("valid_preparation_instruments");

pub async fn valid_preparation_instrument_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_PREPARATION_INSTRUMENT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_preparation_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidPreparationInstrumentWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_PREPARATION_INSTRUMENT).bind(id), exec).await
}

pub async fn get_valid_preparation_instruments<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidPreparationInstrumentWideRow>>> {
    fetch_all(list_query(GET_VALID_PREPARATION_INSTRUMENTS, filter), exec).await
}

pub async fn get_valid_preparation_instruments_for_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    preparation_id: &str,
) -> DbResult<Vec<Counted<ValidPreparationInstrumentWideRow>>> {
    fetch_all(
        list_query(GET_VALID_PREPARATION_INSTRUMENTS_FOR_PREPARATION, filter).bind(preparation_id),
        exec,
    )
    .await
}

pub async fn get_valid_preparation_instruments_for_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    instrument_id: &str,
) -> DbResult<Vec<Counted<ValidPreparationInstrumentWideRow>>> {
    fetch_all(
        list_query(GET_VALID_PREPARATION_INSTRUMENTS_FOR_INSTRUMENT, filter).bind(instrument_id),
        exec,
    )
    .await
}

pub async fn create_valid_preparation_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationInstrumentRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_PREPARATION_INSTRUMENT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_instrument_id)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_preparation_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationInstrumentRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_PREPARATION_INSTRUMENT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_instrument_id)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_preparation_instrument<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_PREPARATION_INSTRUMENT).bind(id), exec).await
}

// =============================================================================
// Preparation ⇄ vessel
// =============================================================================

macro_rules! vpv_select {
    () => {
        concat!(
            "SELECT ",
            valid_preparation_vessel_columns!("valid_preparation_vessels", ""), ", ",
            valid_preparation_columns!("valid_preparations", "valid_preparation_"), ", ",
            valid_vessel_columns!("valid_vessels", "valid_vessel_"), ", ",
            valid_measurement_unit_columns!(
                "valid_measurement_units",
                "valid_vessel_valid_measurement_unit_"
            )
        )
    };
}

macro_rules! vpv_from {
    () => {
        concat!(
            " FROM valid_preparation_vessels",
            " JOIN valid_preparations ON valid_preparations.id = valid_preparation_vessels.valid_preparation_id",
            " JOIN valid_vessels ON valid_vessels.id = valid_preparation_vessels.valid_vessel_id",
            " LEFT JOIN valid_measurement_units ON valid_measurement_units.id = valid_vessels.capacity_unit"
        )
    };
}

macro_rules! vpv_list {
    ($owner:literal) => {
        concat!(
            vpv_select!(), ", ",
            list_counts!("valid_preparation_vessels", $owner),
            vpv_from!(),
            list_where!("valid_preparation_vessels", $owner)
        )
    };
}

pub const VALID_PREPARATION_VESSEL_EXISTS: &str = exists_by_id!("valid_preparation_vessels");

pub const GET_VALID_PREPARATION_VESSEL: &str = concat!(
    vpv_select!(),
    vpv_from!(),
    " WHERE valid_preparation_vessels.archived_at IS NULL",
    " AND valid_preparations.archived_at IS NULL",
    " AND valid_vessels.archived_at IS NULL",
    " AND valid_preparation_vessels.id = $1"
);

pub const GET_VALID_PREPARATION_VESSELS: &str = vpv_list!("TRUE");

pub const GET_VALID_PREPARATION_VESSELS_FOR_PREPARATION: &str =
    vpv_list!("valid_preparation_vessels.valid_preparation_id = $8");

pub const GET_VALID_PREPARATION_VESSELS_FOR_VESSEL: &str =
    vpv_list!("valid_preparation_vessels.valid_vessel_id = $8");

pub const CREATE_VALID_PREPARATION_VESSEL: &str = "INSERT INTO valid_preparation_vessels (
    id, notes, valid_preparation_id, valid_vessel_id, created_at
) VALUES ($1, $2, $3, $4, $5)";

pub const UPDATE_VALID_PREPARATION_VESSEL: &str = "UPDATE valid_preparation_vessels SET
    notes = $2, valid_preparation_id = $3, valid_vessel_id = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_PREPARATION_VESSEL: &str = archive_by_id!("valid_preparation_vessels");

pub async fn valid_preparation_vessel_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_PREPARATION_VESSEL_EXISTS).bind(id), exec).await
}

pub async fn get_valid_preparation_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidPreparationVesselWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_PREPARATION_VESSEL).bind(id), exec).await
}

pub async fn get_valid_preparation_vessels<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidPreparationVesselWideRow>>> {
    fetch_all(list_query(GET_VALID_PREPARATION_VESSELS, filter), exec).await
}

pub async fn get_valid_preparation_vessels_for_preparation<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    preparation_id: &str,
) -> DbResult<Vec<Counted<ValidPreparationVesselWideRow>>> {
    fetch_all(
        list_query(GET_VALID_PREPARATION_VESSELS_FOR_PREPARATION, filter).bind(preparation_id),
        exec,
    )
    .await
}

pub async fn get_valid_preparation_vessels_for_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    vessel_id: &str,
) -> DbResult<Vec<Counted<ValidPreparationVesselWideRow>>> {
    fetch_all(
        list_query(GET_VALID_PREPARATION_VESSELS_FOR_VESSEL, filter).bind(vessel_id),
        exec,
    )
    .await
}

pub async fn create_valid_preparation_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationVesselRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_PREPARATION_VESSEL)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_vessel_id)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_preparation_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidPreparationVesselRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_PREPARATION_VESSEL)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_preparation_id)
        .bind(&row.valid_vessel_id)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_preparation_vessel<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_PREPARATION_VESSEL).bind(id), exec).await
}

// =============================================================================
// Ingredient state ⇄ ingredient
// =============================================================================

macro_rules! visi_select {
    () => {
        concat!(
            "SELECT ",
            valid_ingredient_state_ingredient_columns!("valid_ingredient_state_ingredients", ""), ", ",
            valid_ingredient_state_columns!("valid_ingredient_states", "valid_ingredient_state_"), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_")
        )
    };
}

macro_rules! visi_from {
    () => {
        concat!(
            " FROM valid_ingredient_state_ingredients",
            " JOIN valid_ingredient_states ON valid_ingredient_states.id = valid_ingredient_state_ingredients.valid_ingredient_state_id",
            " JOIN valid_ingredients ON valid_ingredients.id = valid_ingredient_state_ingredients.valid_ingredient_id"
        )
    };
}

macro_rules! visi_list {
    ($owner:literal) => {
        concat!(
            visi_select!(), ", ",
            list_counts!("valid_ingredient_state_ingredients", $owner),
            visi_from!(),
            list_where!("valid_ingredient_state_ingredients", $owner)
        )
    };
}

pub const VALID_INGREDIENT_STATE_INGREDIENT_EXISTS: &str =
    exists_by_id!("valid_ingredient_state_ingredients");

pub const GET_VALID_INGREDIENT_STATE_INGREDIENT: &str = concat!(
    visi_select!(),
    visi_from!(),
    " WHERE valid_ingredient_state_ingredients.archived_at IS NULL",
    " AND valid_ingredient_states.archived_at IS NULL",
    " AND valid_ingredients.archived_at IS NULL",
    " AND valid_ingredient_state_ingredients.id = $1"
);

pub const GET_VALID_INGREDIENT_STATE_INGREDIENTS: &str = visi_list!("TRUE");

pub const GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT_STATE: &str =
    visi_list!("valid_ingredient_state_ingredients.valid_ingredient_state_id = $8");

pub const GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT: &str =
    visi_list!("valid_ingredient_state_ingredients.valid_ingredient_id = $8");

pub const CREATE_VALID_INGREDIENT_STATE_INGREDIENT: &str = "INSERT INTO valid_ingredient_state_ingredients (
    id, notes, valid_ingredient_state_id, valid_ingredient_id, created_at
) VALUES ($1, $2, $3, $4, $5)";

pub const UPDATE_VALID_INGREDIENT_STATE_INGREDIENT: &str = "UPDATE valid_ingredient_state_ingredients SET
    notes = $2, valid_ingredient_state_id = $3, valid_ingredient_id = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_INGREDIENT_STATE_INGREDIENT: &str =
    archive_by_id!("valid_ingredient_state_ingredients");

pub async fn valid_ingredient_state_ingredient_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_INGREDIENT_STATE_INGREDIENT_EXISTS).bind(id), exec).await
}

pub async fn get_valid_ingredient_state_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidIngredientStateIngredientWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_INGREDIENT_STATE_INGREDIENT).bind(id), exec).await
}

pub async fn get_valid_ingredient_state_ingredients<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ValidIngredientStateIngredientWideRow>>> {
    fetch_all(list_query(GET_VALID_INGREDIENT_STATE_INGREDIENTS, filter), exec).await
}

pub async fn get_valid_ingredient_state_ingredients_for_ingredient_state<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    ingredient_state_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientStateIngredientWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT_STATE, filter)
            .bind(ingredient_state_id),
        exec,
    )
    .await
}

pub async fn get_valid_ingredient_state_ingredients_for_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    ingredient_id: &str,
) -> DbResult<Vec<Counted<ValidIngredientStateIngredientWideRow>>> {
    fetch_all(
        list_query(GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT, filter)
            .bind(ingredient_id),
        exec,
    )
    .await
}

pub async fn create_valid_ingredient_state_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientStateIngredientRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_VALID_INGREDIENT_STATE_INGREDIENT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_ingredient_state_id)
        .bind(&row.valid_ingredient_id)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_valid_ingredient_state_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidIngredientStateIngredientRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_VALID_INGREDIENT_STATE_INGREDIENT)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.valid_ingredient_state_id)
        .bind(&row.valid_ingredient_id)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_valid_ingredient_state_ingredient<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_INGREDIENT_STATE_INGREDIENT).bind(id), exec).await
}

// =============================================================================
// Measurement unit conversions
// =============================================================================

/// Unit lists are short; these reads are not paginated.
macro_rules! vmuc_select {
    () => {
        concat!(
            "SELECT ",
            valid_measurement_unit_conversion_columns!("valid_measurement_unit_conversions", ""), ", ",
            valid_measurement_unit_columns!("from_units", "from_unit_"), ", ",
            valid_measurement_unit_columns!("to_units", "to_unit_"), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"),
            " FROM valid_measurement_unit_conversions",
            " JOIN valid_measurement_units AS from_units ON from_units.id = valid_measurement_unit_conversions.from_unit",
            " JOIN valid_measurement_units AS to_units ON to_units.id = valid_measurement_unit_conversions.to_unit",
            " LEFT JOIN valid_ingredients ON valid_ingredients.id = valid_measurement_unit_conversions.only_for_ingredient",
            " WHERE valid_measurement_unit_conversions.archived_at IS NULL",
            " AND from_units.archived_at IS NULL",
            " AND to_units.archived_at IS NULL"
        )
    };
}

pub const VALID_MEASUREMENT_UNIT_CONVERSION_EXISTS: &str =
    exists_by_id!("valid_measurement_unit_conversions");

pub const GET_VALID_MEASUREMENT_UNIT_CONVERSION: &str = concat!(
    vmuc_select!(),
    " AND valid_measurement_unit_conversions.id = $1"
);

pub const GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_FROM_UNIT: &str = concat!(
    vmuc_select!(),
    " AND valid_measurement_unit_conversions.from_unit = $1",
    " ORDER BY valid_measurement_unit_conversions.created_at, valid_measurement_unit_conversions.id"
);

pub const GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_TO_UNIT: &str = concat!(
    vmuc_select!(),
    " AND valid_measurement_unit_conversions.to_unit = $1",
    " ORDER BY valid_measurement_unit_conversions.created_at, valid_measurement_unit_conversions.id"
);

pub const CREATE_VALID_MEASUREMENT_UNIT_CONVERSION: &str = "INSERT INTO valid_measurement_unit_conversions (
    id, from_unit, to_unit, only_for_ingredient, modifier, notes, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_VALID_MEASUREMENT_UNIT_CONVERSION: &str = "UPDATE valid_measurement_unit_conversions SET
    from_unit = $2, to_unit = $3, only_for_ingredient = $4, modifier = $5, notes = $6,
    last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_VALID_MEASUREMENT_UNIT_CONVERSION: &str =
    archive_by_id!("valid_measurement_unit_conversions");

fn bind_valid_measurement_unit_conversion<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q ValidMeasurementUnitConversionRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.from_unit)
        .bind(&row.to_unit)
        .bind(&row.only_for_ingredient)
        .bind(row.modifier)
        .bind(&row.notes)
}

pub async fn valid_measurement_unit_conversion_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(VALID_MEASUREMENT_UNIT_CONVERSION_EXISTS).bind(id), exec).await
}

pub async fn get_valid_measurement_unit_conversion<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ValidMeasurementUnitConversionWideRow>> {
    fetch_optional(sqlx::query(GET_VALID_MEASUREMENT_UNIT_CONVERSION).bind(id), exec).await
}

pub async fn get_valid_measurement_unit_conversions_from_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    unit_id: &str,
) -> DbResult<Vec<ValidMeasurementUnitConversionWideRow>> {
    fetch_all(
        sqlx::query(GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_FROM_UNIT).bind(unit_id),
        exec,
    )
    .await
}

pub async fn get_valid_measurement_unit_conversions_to_unit<'e, E: PgExecutor<'e>>(
    exec: E,
    unit_id: &str,
) -> DbResult<Vec<ValidMeasurementUnitConversionWideRow>> {
    fetch_all(
        sqlx::query(GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_TO_UNIT).bind(unit_id),
        exec,
    )
    .await
}

pub async fn create_valid_measurement_unit_conversion<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidMeasurementUnitConversionRow,
) -> DbResult<u64> {
    let query = bind_valid_measurement_unit_conversion(
        sqlx::query(CREATE_VALID_MEASUREMENT_UNIT_CONVERSION),
        row,
    );
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_valid_measurement_unit_conversion<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ValidMeasurementUnitConversionRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_valid_measurement_unit_conversion(
        sqlx::query(UPDATE_VALID_MEASUREMENT_UNIT_CONVERSION),
        row,
    );
    execute(query.bind(now), exec).await
}

pub async fn archive_valid_measurement_unit_conversion<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_VALID_MEASUREMENT_UNIT_CONVERSION).bind(id), exec).await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery {
        name: "get_valid_ingredient_measurement_units",
        sql: GET_VALID_INGREDIENT_MEASUREMENT_UNITS,
    },
    ListQuery {
        name: "get_valid_ingredient_measurement_units_for_ingredient",
        sql: GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_INGREDIENT,
    },
    ListQuery {
        name: "get_valid_ingredient_measurement_units_for_measurement_unit",
        sql: GET_VALID_INGREDIENT_MEASUREMENT_UNITS_FOR_MEASUREMENT_UNIT,
    },
    ListQuery {
        name: "get_valid_ingredient_preparations",
        sql: GET_VALID_INGREDIENT_PREPARATIONS,
    },
    ListQuery {
        name: "get_valid_ingredient_preparations_for_ingredient",
        sql: GET_VALID_INGREDIENT_PREPARATIONS_FOR_INGREDIENT,
    },
    ListQuery {
        name: "get_valid_ingredient_preparations_for_preparation",
        sql: GET_VALID_INGREDIENT_PREPARATIONS_FOR_PREPARATION,
    },
    ListQuery {
        name: "get_valid_preparation_instruments",
        sql: GET_VALID_PREPARATION_INSTRUMENTS,
    },
    ListQuery {
        name: "get_valid_preparation_instruments_for_preparation",
        sql: GET_VALID_PREPARATION_INSTRUMENTS_FOR_PREPARATION,
    },
    ListQuery {
        name: "get_valid_preparation_instruments_for_instrument",
        sql: GET_VALID_PREPARATION_INSTRUMENTS_FOR_INSTRUMENT,
    },
    ListQuery {
        name: "get_valid_preparation_vessels",
        sql: GET_VALID_PREPARATION_VESSELS,
    },
    ListQuery {
        name: "get_valid_preparation_vessels_for_preparation",
        sql: GET_VALID_PREPARATION_VESSELS_FOR_PREPARATION,
    },
    ListQuery {
        name: "get_valid_preparation_vessels_for_vessel",
        sql: GET_VALID_PREPARATION_VESSELS_FOR_VESSEL,
    },
    ListQuery {
        name: "get_valid_ingredient_state_ingredients",
        sql: GET_VALID_INGREDIENT_STATE_INGREDIENTS,
    },
    ListQuery {
        name: "get_valid_ingredient_state_ingredients_for_ingredient_state",
        sql: GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT_STATE,
    },
    ListQuery {
        name: "get_valid_ingredient_state_ingredients_for_ingredient",
        sql: GET_VALID_INGREDIENT_STATE_INGREDIENTS_FOR_INGREDIENT,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vessel_unit_is_nested_under_the_vessel_prefix() {
        assert!(GET_VALID_PREPARATION_VESSEL
            .contains("valid_measurement_units.id AS valid_vessel_valid_measurement_unit_id"));
        assert!(GET_VALID_PREPARATION_VESSEL.contains("LEFT JOIN valid_measurement_units"));
    }

    #[test]
    fn test_single_reads_skip_archived_sides() {
        for sql in [
            GET_VALID_INGREDIENT_MEASUREMENT_UNIT,
            GET_VALID_INGREDIENT_PREPARATION,
            GET_VALID_PREPARATION_INSTRUMENT,
            GET_VALID_PREPARATION_VESSEL,
            GET_VALID_INGREDIENT_STATE_INGREDIENT,
            GET_VALID_MEASUREMENT_UNIT_CONVERSION,
        ] {
            assert_eq!(sql.matches("archived_at IS NULL").count(), 3);
        }
    }

    #[test]
    fn test_conversion_units_are_aliased_apart() {
        assert!(GET_VALID_MEASUREMENT_UNIT_CONVERSION.contains("from_units.id AS from_unit_id"));
        assert!(GET_VALID_MEASUREMENT_UNIT_CONVERSION.contains("to_units.id AS to_unit_id"));
        assert!(GET_VALID_MEASUREMENT_UNIT_CONVERSION.contains("LEFT JOIN valid_ingredients"));
    }

    #[test]
    fn test_conversion_lists_filter_on_their_own_side() {
        assert!(GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_FROM_UNIT
            .contains("valid_measurement_unit_conversions.from_unit = $1"));
        assert!(GET_VALID_MEASUREMENT_UNIT_CONVERSIONS_TO_UNIT
            .contains("valid_measurement_unit_conversions.to_unit = $1"));
    }
}
