//! # Grocery List Repository
//!
//! Items are scoped by their meal plan. The batch create marks the plan as
//! having its grocery list initialized in the same transaction, so the
//! grocery list worker never sees a half-written list.
//!
//! ```text
//! finalized plan ──► get_finalized_meal_plans_without_initialized_grocery_lists
//!                         │
//!                         ▼
//!               create_meal_plan_grocery_list_items_for_meal_plan
//!                 ├── INSERT item × N
//!                 └── meal_plans.grocery_list_initialized = TRUE
//! ```

use dinner_core::{
    MealPlan, MealPlanGroceryListItem, MealPlanGroceryListItemDatabaseCreationInput,
    ValidIngredient, ValidMeasurementUnit,
};
use tracing::{debug, info, instrument};

use crate::codec::{
    float32_range_with_optional_max, optional_decimal_from_f32, optional_f32_from_decimal,
    parse_enum, DecimalPair,
};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::meal_plan_grocery_list_items::{
    self as q, MealPlanGroceryListItemRow, MealPlanGroceryListItemWideRow,
    PurchasedMeasurementUnitRow,
};
use crate::repository::meal_plans::meal_plan_from_row;
use crate::repository::valid_enumerations::{
    valid_ingredient_from_row, valid_measurement_unit_from_row,
};

// =============================================================================
// Conversions
// =============================================================================

fn meal_plan_grocery_list_item_from_row(
    (row, ingredient, unit, purchased_unit): MealPlanGroceryListItemWideRow,
) -> DbResult<MealPlanGroceryListItem> {
    Ok(MealPlanGroceryListItem {
        quantity_needed: float32_range_with_optional_max(
            "quantity_needed",
            row.minimum_quantity_needed,
            row.maximum_quantity_needed,
        )?,
        quantity_purchased: optional_f32_from_decimal("quantity_purchased", row.quantity_purchased)?,
        purchase_price: optional_f32_from_decimal("purchase_price", row.purchase_price)?,
        status: parse_enum("status", &row.status)?,
        ingredient: valid_ingredient_from_row(ingredient)?,
        measurement_unit: valid_measurement_unit_from_row(unit),
        purchased_measurement_unit: purchased_unit
            .map(|PurchasedMeasurementUnitRow(unit)| valid_measurement_unit_from_row(unit)),
        id: row.id,
        belongs_to_meal_plan: row.belongs_to_meal_plan,
        purchased_upc: row.purchased_upc,
        status_explanation: row.status_explanation,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_plan_grocery_list_item_row(
    item: &MealPlanGroceryListItem,
) -> DbResult<MealPlanGroceryListItemRow> {
    let needed = DecimalPair::from_float32_range_with_optional_max("quantity_needed", &item.quantity_needed)?;

    Ok(MealPlanGroceryListItemRow {
        id: item.id.clone(),
        belongs_to_meal_plan: item.belongs_to_meal_plan.clone(),
        valid_ingredient: item.ingredient.id.clone(),
        valid_measurement_unit: item.measurement_unit.id.clone(),
        minimum_quantity_needed: needed.min.unwrap_or_default(),
        maximum_quantity_needed: needed.max,
        quantity_purchased: optional_decimal_from_f32("quantity_purchased", item.quantity_purchased)?,
        purchased_measurement_unit: item
            .purchased_measurement_unit
            .as_ref()
            .map(|unit| unit.id.clone()),
        purchased_upc: item.purchased_upc.clone(),
        purchase_price: optional_decimal_from_f32("purchase_price", item.purchase_price)?,
        status_explanation: item.status_explanation.clone(),
        status: item.status.as_str().to_string(),
        created_at: item.created_at,
        last_updated_at: item.last_updated_at,
        archived_at: item.archived_at,
    })
}

impl Querier {
    fn new_meal_plan_grocery_list_item(
        &self,
        input: &MealPlanGroceryListItemDatabaseCreationInput,
        meal_plan_id: &str,
    ) -> MealPlanGroceryListItem {
        MealPlanGroceryListItem {
            id: self.new_id(),
            belongs_to_meal_plan: meal_plan_id.to_string(),
            ingredient: ValidIngredient {
                id: input.valid_ingredient_id.clone(),
                ..Default::default()
            },
            measurement_unit: ValidMeasurementUnit {
                id: input.valid_measurement_unit_id.clone(),
                ..Default::default()
            },
            quantity_needed: input.quantity_needed,
            quantity_purchased: input.quantity_purchased,
            purchased_measurement_unit: input.purchased_measurement_unit_id.as_ref().map(|id| {
                ValidMeasurementUnit {
                    id: id.clone(),
                    ..Default::default()
                }
            }),
            purchased_upc: input.purchased_upc.clone(),
            purchase_price: input.purchase_price,
            status_explanation: input.status_explanation.clone(),
            status: input.status,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    #[instrument(skip(self))]
    pub async fn meal_plan_grocery_list_item_exists(
        &self,
        meal_plan_id: &str,
        item_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[meal_plan_id, item_id])?;

        q::meal_plan_grocery_list_item_exists(self.pool(), meal_plan_id, item_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal plan grocery list item existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_grocery_list_item(
        &self,
        meal_plan_id: &str,
        item_id: &str,
    ) -> DbResult<MealPlanGroceryListItem> {
        require_ids(&[meal_plan_id, item_id])?;

        q::get_meal_plan_grocery_list_item(self.pool(), meal_plan_id, item_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(meal_plan_grocery_list_item_from_row)
            .map_err(|err| prepare_error(err, "fetching meal plan grocery list item"))
    }

    /// The whole list, oldest item first. Lists are small and not paginated.
    #[instrument(skip(self))]
    pub async fn get_meal_plan_grocery_list_items_for_meal_plan(
        &self,
        meal_plan_id: &str,
    ) -> DbResult<Vec<MealPlanGroceryListItem>> {
        require_id(meal_plan_id)?;

        q::get_meal_plan_grocery_list_items_for_meal_plan(self.pool(), meal_plan_id)
            .await
            .and_then(|rows| rows.into_iter().map(meal_plan_grocery_list_item_from_row).collect())
            .map_err(|err| prepare_error(err, "fetching meal plan grocery list items"))
    }

    #[instrument(skip(self, input), fields(meal_plan_id = %input.belongs_to_meal_plan))]
    pub async fn create_meal_plan_grocery_list_item(
        &self,
        input: &MealPlanGroceryListItemDatabaseCreationInput,
    ) -> DbResult<MealPlanGroceryListItem> {
        input.validate()?;

        let item = self.new_meal_plan_grocery_list_item(input, &input.belongs_to_meal_plan);
        let row = meal_plan_grocery_list_item_row(&item)?;

        q::create_meal_plan_grocery_list_item(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating meal plan grocery list item"))?;

        info!(id = %item.id, "Created meal plan grocery list item");
        Ok(item)
    }

    /// Writes a plan's whole list and flags the plan in one transaction.
    /// Every item lands under `meal_plan_id` whatever its input says.
    #[instrument(skip(self, inputs), fields(items = inputs.len()))]
    pub async fn create_meal_plan_grocery_list_items_for_meal_plan(
        &self,
        meal_plan_id: &str,
        inputs: &[MealPlanGroceryListItemDatabaseCreationInput],
    ) -> DbResult<Vec<MealPlanGroceryListItem>> {
        require_id(meal_plan_id)?;

        let mut items = Vec::with_capacity(inputs.len());
        let mut rows = Vec::with_capacity(inputs.len());
        for input in inputs {
            let input = MealPlanGroceryListItemDatabaseCreationInput {
                belongs_to_meal_plan: meal_plan_id.to_string(),
                ..input.clone()
            };
            input.validate()?;
            let item = self.new_meal_plan_grocery_list_item(&input, meal_plan_id);
            rows.push(meal_plan_grocery_list_item_row(&item)?);
            items.push(item);
        }

        let now = self.now();
        let mut tx = self.begin("beginning grocery list creation transaction").await?;
        let outcome: DbResult<()> = async {
            for (index, row) in rows.iter().enumerate() {
                q::create_meal_plan_grocery_list_item(&mut *tx, row)
                    .await
                    .map_err(|err| err.context(format!("creating grocery list item #{}", index + 1)))?;
            }
            if q::mark_grocery_list_initialized(&mut *tx, meal_plan_id, now).await? == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing grocery list creation transaction").await?;
                info!(meal_plan_id = %meal_plan_id, items = items.len(), "Created meal plan grocery list");
                Ok(items)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal plan grocery list items"))
            }
        }
    }

    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn update_meal_plan_grocery_list_item(
        &self,
        item: &MealPlanGroceryListItem,
    ) -> DbResult<()> {
        require_ids(&[&item.id, &item.belongs_to_meal_plan])?;
        item.validate()?;
        let row = meal_plan_grocery_list_item_row(item)?;

        q::update_meal_plan_grocery_list_item(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal plan grocery list item"))?;

        debug!(id = %item.id, "Updated meal plan grocery list item");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_meal_plan_grocery_list_item(
        &self,
        meal_plan_id: &str,
        item_id: &str,
    ) -> DbResult<()> {
        require_ids(&[meal_plan_id, item_id])?;

        q::archive_meal_plan_grocery_list_item(self.pool(), meal_plan_id, item_id)
            .await
            .map_err(|err| prepare_error(err, "archiving meal plan grocery list item"))?;

        info!(id = %item_id, "Archived meal plan grocery list item");
        Ok(())
    }

    /// Finalized plans whose grocery list has not been written yet, with
    /// their events and options loaded.
    #[instrument(skip(self))]
    pub async fn get_finalized_meal_plans_without_initialized_grocery_lists(
        &self,
    ) -> DbResult<Vec<MealPlan>> {
        let outcome: DbResult<Vec<MealPlan>> = async {
            let mut plans = q::get_finalized_meal_plans_without_grocery_lists(self.pool())
                .await?
                .into_iter()
                .map(meal_plan_from_row)
                .collect::<DbResult<Vec<_>>>()?;
            self.attach_meal_plan_events(&mut plans).await?;
            Ok(plans)
        }
        .await;

        outcome.map_err(|err| {
            prepare_error(err, "fetching finalized meal plans without grocery lists")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::{Float32RangeWithOptionalMax, GroceryListItemStatus};
    use rust_decimal::Decimal;

    fn item() -> MealPlanGroceryListItem {
        MealPlanGroceryListItem {
            id: "item".to_string(),
            belongs_to_meal_plan: "plan".to_string(),
            ingredient: ValidIngredient {
                id: "onion".to_string(),
                ..Default::default()
            },
            measurement_unit: ValidMeasurementUnit {
                id: "unit".to_string(),
                ..Default::default()
            },
            quantity_needed: Float32RangeWithOptionalMax::new(2.0, Some(3.5)),
            status: GroceryListItemStatus::AlreadyOwned,
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    #[test]
    fn test_item_row_keeps_unpurchased_columns_null() {
        let row = meal_plan_grocery_list_item_row(&item()).unwrap();

        assert_eq!(row.minimum_quantity_needed, Decimal::new(2, 0));
        assert_eq!(row.maximum_quantity_needed, Some(Decimal::new(35, 1)));
        assert_eq!(row.quantity_purchased, None);
        assert_eq!(row.purchased_measurement_unit, None);
        assert_eq!(row.status, "already owned");
    }

    #[test]
    fn test_purchased_unit_reference_maps_to_its_column() {
        let item = MealPlanGroceryListItem {
            quantity_purchased: Some(1.0),
            purchased_measurement_unit: Some(ValidMeasurementUnit {
                id: "bag".to_string(),
                ..Default::default()
            }),
            purchase_price: Some(2.49),
            ..item()
        };

        let row = meal_plan_grocery_list_item_row(&item).unwrap();
        assert_eq!(row.purchased_measurement_unit.as_deref(), Some("bag"));
        assert_eq!(row.quantity_purchased, Some(Decimal::new(1, 0)));
    }
}
