//! Grocery list items for a meal plan.
//!
//! The measurement unit table is joined twice: once for the unit the
//! recipe needs (`valid_measurement_unit_`) and once, optionally, for the
//! unit the purchase came in (`purchased_measurement_unit_`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::meal_plans::MealPlanRow;
use crate::queries::valid_enumerations::{ValidIngredientRow, ValidMeasurementUnitRow};
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional};

table_row! {
    pub struct MealPlanGroceryListItemRow {
        pub id: String,
        pub belongs_to_meal_plan: String,
        pub valid_ingredient: String,
        pub valid_measurement_unit: String,
        pub minimum_quantity_needed: Decimal,
        pub maximum_quantity_needed: Option<Decimal>,
        pub quantity_purchased: Option<Decimal>,
        pub purchased_measurement_unit: Option<String>,
        pub purchased_upc: Option<String>,
        pub purchase_price: Option<Decimal>,
        pub status_explanation: String,
        pub status: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

joined_alias! {
    pub struct PurchasedMeasurementUnitRow(ValidMeasurementUnitRow)
        joined as "purchased_measurement_unit_";
}

pub type MealPlanGroceryListItemWideRow = (
    MealPlanGroceryListItemRow,
    ValidIngredientRow,
    ValidMeasurementUnitRow,
    Option<PurchasedMeasurementUnitRow>,
);

macro_rules! grocery_item_select {
    () => {
        concat!(
            "SELECT ",
            meal_plan_grocery_list_item_columns!("meal_plan_grocery_list_items", ""), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"), ", ",
            valid_measurement_unit_columns!("valid_measurement_units", "valid_measurement_unit_"), ", ",
            valid_measurement_unit_columns!("purchased_units", "purchased_measurement_unit_"),
            " FROM meal_plan_grocery_list_items",
            " JOIN valid_ingredients ON valid_ingredients.id = meal_plan_grocery_list_items.valid_ingredient",
            " JOIN valid_measurement_units ON valid_measurement_units.id = meal_plan_grocery_list_items.valid_measurement_unit",
            " LEFT JOIN valid_measurement_units AS purchased_units ON purchased_units.id = meal_plan_grocery_list_items.purchased_measurement_unit",
            " WHERE meal_plan_grocery_list_items.archived_at IS NULL",
            " AND meal_plan_grocery_list_items.belongs_to_meal_plan = $1"
        )
    };
}

pub const MEAL_PLAN_GROCERY_LIST_ITEM_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plan_grocery_list_items.id FROM meal_plan_grocery_list_items
    WHERE meal_plan_grocery_list_items.archived_at IS NULL
    AND meal_plan_grocery_list_items.belongs_to_meal_plan = $1
    AND meal_plan_grocery_list_items.id = $2
)";

pub const GET_MEAL_PLAN_GROCERY_LIST_ITEM: &str = concat!(
    grocery_item_select!(),
    " AND meal_plan_grocery_list_items.id = $2"
);

pub const GET_MEAL_PLAN_GROCERY_LIST_ITEMS_FOR_MEAL_PLAN: &str = concat!(
    grocery_item_select!(),
    " ORDER BY meal_plan_grocery_list_items.created_at, meal_plan_grocery_list_items.id"
);

pub const CREATE_MEAL_PLAN_GROCERY_LIST_ITEM: &str = "INSERT INTO meal_plan_grocery_list_items (
    id, belongs_to_meal_plan, valid_ingredient, valid_measurement_unit, minimum_quantity_needed,
    maximum_quantity_needed, quantity_purchased, purchased_measurement_unit, purchased_upc,
    purchase_price, status_explanation, status, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)";

pub const UPDATE_MEAL_PLAN_GROCERY_LIST_ITEM: &str = "UPDATE meal_plan_grocery_list_items SET
    valid_ingredient = $3, valid_measurement_unit = $4, minimum_quantity_needed = $5,
    maximum_quantity_needed = $6, quantity_purchased = $7, purchased_measurement_unit = $8,
    purchased_upc = $9, purchase_price = $10, status_explanation = $11, status = $12,
    last_updated_at = GREATEST($13, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_meal_plan = $2";

pub const ARCHIVE_MEAL_PLAN_GROCERY_LIST_ITEM: &str = "UPDATE meal_plan_grocery_list_items SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_meal_plan = $1 AND id = $2";

pub const MARK_GROCERY_LIST_INITIALIZED: &str = "UPDATE meal_plans SET
    grocery_list_initialized = TRUE, last_updated_at = GREATEST($2, created_at)
WHERE archived_at IS NULL AND id = $1";

/// Plans the grocery list worker still has to visit.
pub const GET_FINALIZED_MEAL_PLANS_WITHOUT_GROCERY_LISTS: &str = concat!(
    "SELECT ", meal_plan_columns!("meal_plans", ""),
    " FROM meal_plans WHERE meal_plans.archived_at IS NULL",
    " AND meal_plans.status = 'finalized'",
    " AND meal_plans.grocery_list_initialized IS FALSE",
    " ORDER BY meal_plans.created_at, meal_plans.id"
);

/// Binds `$1` (id) through `$12` (status).
fn bind_meal_plan_grocery_list_item<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q MealPlanGroceryListItemRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.belongs_to_meal_plan)
        .bind(&row.valid_ingredient)
        .bind(&row.valid_measurement_unit)
        .bind(row.minimum_quantity_needed)
        .bind(row.maximum_quantity_needed)
        .bind(row.quantity_purchased)
        .bind(&row.purchased_measurement_unit)
        .bind(&row.purchased_upc)
        .bind(row.purchase_price)
        .bind(&row.status_explanation)
        .bind(&row.status)
}

pub async fn meal_plan_grocery_list_item_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    item_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(MEAL_PLAN_GROCERY_LIST_ITEM_EXISTS).bind(meal_plan_id).bind(item_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_grocery_list_item<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    item_id: &str,
) -> DbResult<Option<MealPlanGroceryListItemWideRow>> {
    fetch_optional(
        sqlx::query(GET_MEAL_PLAN_GROCERY_LIST_ITEM).bind(meal_plan_id).bind(item_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_grocery_list_items_for_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
) -> DbResult<Vec<MealPlanGroceryListItemWideRow>> {
    fetch_all(
        sqlx::query(GET_MEAL_PLAN_GROCERY_LIST_ITEMS_FOR_MEAL_PLAN).bind(meal_plan_id),
        exec,
    )
    .await
}

pub async fn create_meal_plan_grocery_list_item<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanGroceryListItemRow,
) -> DbResult<u64> {
    let query = bind_meal_plan_grocery_list_item(
        sqlx::query(CREATE_MEAL_PLAN_GROCERY_LIST_ITEM),
        row,
    );
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_meal_plan_grocery_list_item<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanGroceryListItemRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_meal_plan_grocery_list_item(
        sqlx::query(UPDATE_MEAL_PLAN_GROCERY_LIST_ITEM),
        row,
    );
    execute(query.bind(now), exec).await
}

pub async fn archive_meal_plan_grocery_list_item<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    item_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_MEAL_PLAN_GROCERY_LIST_ITEM).bind(meal_plan_id).bind(item_id),
        exec,
    )
    .await
}

pub async fn mark_grocery_list_initialized<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    execute(
        sqlx::query(MARK_GROCERY_LIST_INITIALIZED).bind(meal_plan_id).bind(now),
        exec,
    )
    .await
}

pub async fn get_finalized_meal_plans_without_grocery_lists<'e, E: PgExecutor<'e>>(
    exec: E,
) -> DbResult<Vec<MealPlanRow>> {
    fetch_all(sqlx::query(GET_FINALIZED_MEAL_PLANS_WITHOUT_GROCERY_LISTS), exec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchased_unit_is_a_left_join_under_its_own_alias() {
        assert!(GET_MEAL_PLAN_GROCERY_LIST_ITEM
            .contains("LEFT JOIN valid_measurement_units AS purchased_units"));
        assert!(GET_MEAL_PLAN_GROCERY_LIST_ITEM
            .contains("purchased_units.id AS purchased_measurement_unit_id"));
    }

    #[test]
    fn test_item_reads_are_scoped_to_the_plan() {
        for sql in [
            MEAL_PLAN_GROCERY_LIST_ITEM_EXISTS,
            GET_MEAL_PLAN_GROCERY_LIST_ITEM,
            GET_MEAL_PLAN_GROCERY_LIST_ITEMS_FOR_MEAL_PLAN,
            ARCHIVE_MEAL_PLAN_GROCERY_LIST_ITEM,
        ] {
            assert!(sql.contains("belongs_to_meal_plan = $1"), "{sql}");
        }
    }

    #[test]
    fn test_worker_query_skips_initialized_plans() {
        assert!(GET_FINALIZED_MEAL_PLANS_WITHOUT_GROCERY_LISTS
            .contains("grocery_list_initialized IS FALSE"));
        assert!(GET_FINALIZED_MEAL_PLANS_WITHOUT_GROCERY_LISTS.contains("status = 'finalized'"));
    }
}
