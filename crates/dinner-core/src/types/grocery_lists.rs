//! # Grocery Lists
//!
//! What a household has to buy for a finalized meal plan, one line per
//! ingredient and unit, plus what was actually bought.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::Float32RangeWithOptionalMax;
use crate::types::valid_enumerations::{ValidIngredient, ValidMeasurementUnit};

string_enum! {
    #[derive(Default)]
    GroceryListItemStatus as "grocery list item status" {
        #[default]
        Unknown => "unknown",
        AlreadyOwned => "already owned",
        Needs => "needs",
        Unavailable => "unavailable",
        Acquired => "acquired",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanGroceryListItem {
    pub id: String,
    pub belongs_to_meal_plan: String,
    pub ingredient: ValidIngredient,
    pub measurement_unit: ValidMeasurementUnit,
    pub quantity_needed: Float32RangeWithOptionalMax,
    pub quantity_purchased: Option<f32>,
    /// Set when the purchase came in a different unit than was needed.
    pub purchased_measurement_unit: Option<ValidMeasurementUnit>,
    pub purchased_upc: Option<String>,
    pub purchase_price: Option<f32>,
    pub status_explanation: String,
    pub status: GroceryListItemStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl MealPlanGroceryListItem {
    /// Checks an edited item before it is written back.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_item(
            &self.quantity_needed,
            self.quantity_purchased,
            self.purchase_price,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanGroceryListItemDatabaseCreationInput {
    pub belongs_to_meal_plan: String,
    pub valid_ingredient_id: String,
    pub valid_measurement_unit_id: String,
    pub quantity_needed: Float32RangeWithOptionalMax,
    pub quantity_purchased: Option<f32>,
    pub purchased_measurement_unit_id: Option<String>,
    pub purchased_upc: Option<String>,
    pub purchase_price: Option<f32>,
    pub status_explanation: String,
    pub status: GroceryListItemStatus,
}

impl MealPlanGroceryListItemDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("belongs_to_meal_plan", &self.belongs_to_meal_plan),
            ("valid_ingredient_id", &self.valid_ingredient_id),
            ("valid_measurement_unit_id", &self.valid_measurement_unit_id),
        ] {
            if value.is_empty() {
                return Err(ValidationError::required(field));
            }
        }
        check_item(
            &self.quantity_needed,
            self.quantity_purchased,
            self.purchase_price,
        )
    }
}

fn check_item(
    quantity_needed: &Float32RangeWithOptionalMax,
    quantity_purchased: Option<f32>,
    purchase_price: Option<f32>,
) -> Result<(), ValidationError> {
    quantity_needed.validate("quantity_needed")?;
    for (field, value) in [
        ("quantity_purchased", quantity_purchased),
        ("purchase_price", purchase_price),
    ] {
        if value.is_some_and(|v| v < 0.0) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onions() -> MealPlanGroceryListItemDatabaseCreationInput {
        MealPlanGroceryListItemDatabaseCreationInput {
            belongs_to_meal_plan: "plan".to_string(),
            valid_ingredient_id: "onion".to_string(),
            valid_measurement_unit_id: "unit".to_string(),
            quantity_needed: Float32RangeWithOptionalMax::new(2.0, Some(3.0)),
            ..Default::default()
        }
    }

    #[test]
    fn test_item_requires_its_plan() {
        assert!(onions().validate().is_ok());

        let input = MealPlanGroceryListItemDatabaseCreationInput {
            belongs_to_meal_plan: String::new(),
            ..onions()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::required("belongs_to_meal_plan"))
        );
    }

    #[test]
    fn test_negative_purchases_rejected() {
        let input = MealPlanGroceryListItemDatabaseCreationInput {
            purchase_price: Some(-1.5),
            ..onions()
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::OutOfRange { field, .. }) if field == "purchase_price"
        ));
    }

    #[test]
    fn test_status_names_keep_their_spaces() {
        assert_eq!(GroceryListItemStatus::AlreadyOwned.as_str(), "already owned");
        assert_eq!(GroceryListItemStatus::default(), GroceryListItemStatus::Unknown);
    }
}
