//! # Recipes
//!
//! A recipe is an ordered list of steps. Each step applies one preparation
//! and lists what goes in (ingredients), what it needs (instruments and
//! vessels), what comes out (products) and how to tell it is done
//! (completion conditions).
//!
//! ```text
//! Recipe
//!  ├── RecipeMedia
//!  ├── RecipeRating (by users)
//!  └── RecipeStep[index]
//!       ├── RecipeStepIngredient  (ValidIngredient | earlier product)
//!       ├── RecipeStepProduct
//!       ├── RecipeStepInstrument  (ValidInstrument | earlier product)
//!       ├── RecipeStepVessel      (ValidVessel | earlier product)
//!       └── RecipeStepCompletionCondition → RecipeStepIngredient IDs
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::{
    Float32RangeWithOptionalMax, OptionalFloat32Range, OptionalUint32Range,
    Uint16RangeWithOptionalMax, Uint32RangeWithOptionalMax,
};
use crate::types::valid_enumerations::{
    ValidIngredient, ValidInstrument, ValidMeasurementUnit, ValidPreparation, ValidVessel,
};

string_enum! {
    /// The course a recipe (or meal component) fills.
    #[derive(Default)]
    ComponentType as "component type" {
        #[default]
        Unspecified => "unspecified",
        AmuseBouche => "amuse-bouche",
        Appetizer => "appetizer",
        Soup => "soup",
        Main => "main",
        Salad => "salad",
        Beverage => "beverage",
        Side => "side",
        Dessert => "dessert",
    }
}

string_enum! {
    RecipeStepProductType as "recipe step product type" {
        Ingredient => "ingredient",
        Instrument => "instrument",
        Vessel => "vessel",
    }
}

// =============================================================================
// Recipe
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub source: String,
    pub description: String,
    pub inspired_by_recipe_id: Option<String>,
    pub estimated_portions: Float32RangeWithOptionalMax,
    pub portion_name: String,
    pub plural_portion_name: String,
    pub seal_of_approval: bool,
    pub eligible_for_meals: bool,
    pub yields_component_type: ComponentType,
    pub created_by_user: String,
    pub steps: Vec<RecipeStep>,
    pub media: Vec<RecipeMedia>,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDatabaseCreationInput {
    pub name: String,
    pub slug: String,
    pub source: String,
    pub description: String,
    pub inspired_by_recipe_id: Option<String>,
    pub estimated_portions: Float32RangeWithOptionalMax,
    pub portion_name: String,
    pub plural_portion_name: String,
    pub seal_of_approval: bool,
    pub eligible_for_meals: bool,
    pub yields_component_type: ComponentType,
    pub created_by_user: String,
    /// Steps created in the same transaction. `belongs_to_recipe` is
    /// overwritten with the new recipe's ID.
    pub steps: Vec<RecipeStepDatabaseCreationInput>,
}

impl RecipeDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        if self.created_by_user.is_empty() {
            return Err(ValidationError::required("created_by_user"));
        }
        self.estimated_portions.validate("estimated_portions")?;
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Steps
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub id: String,
    pub index: u32,
    pub preparation: ValidPreparation,
    pub estimated_time_in_seconds: OptionalUint32Range,
    pub temperature_in_celsius: OptionalFloat32Range,
    pub notes: String,
    pub explicit_instructions: String,
    pub condition_expression: String,
    pub optional: bool,
    pub start_timer_automatically: bool,
    pub belongs_to_recipe: String,
    pub ingredients: Vec<RecipeStepIngredient>,
    pub products: Vec<RecipeStepProduct>,
    pub instruments: Vec<RecipeStepInstrument>,
    pub vessels: Vec<RecipeStepVessel>,
    pub completion_conditions: Vec<RecipeStepCompletionCondition>,
    pub media: Vec<RecipeMedia>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// A step with every child it should be created with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepDatabaseCreationInput {
    pub index: u32,
    pub preparation_id: String,
    pub estimated_time_in_seconds: OptionalUint32Range,
    pub temperature_in_celsius: OptionalFloat32Range,
    pub notes: String,
    pub explicit_instructions: String,
    pub condition_expression: String,
    pub optional: bool,
    pub start_timer_automatically: bool,
    pub belongs_to_recipe: String,
    pub ingredients: Vec<RecipeStepIngredientDatabaseCreationInput>,
    pub products: Vec<RecipeStepProductDatabaseCreationInput>,
    pub instruments: Vec<RecipeStepInstrumentDatabaseCreationInput>,
    pub vessels: Vec<RecipeStepVesselDatabaseCreationInput>,
    pub completion_conditions: Vec<RecipeStepCompletionConditionDatabaseCreationInput>,
}

impl RecipeStepDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.preparation_id.is_empty() {
            return Err(ValidationError::required("preparation_id"));
        }
        self.estimated_time_in_seconds
            .validate("estimated_time_in_seconds")?;
        self.temperature_in_celsius.validate("temperature_in_celsius")?;
        for ingredient in &self.ingredients {
            ingredient.validate()?;
        }
        for product in &self.products {
            product.validate()?;
        }
        for instrument in &self.instruments {
            instrument.validate()?;
        }
        for vessel in &self.vessels {
            vessel.validate()?;
        }
        for condition in &self.completion_conditions {
            for index in &condition.ingredient_indices {
                if *index >= self.ingredients.len() {
                    return Err(ValidationError::OutOfRange {
                        field: "completion condition ingredient index".to_string(),
                        min: 0,
                        max: self.ingredients.len() as i64 - 1,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Step Ingredients
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepIngredient {
    pub id: String,
    pub name: String,
    pub optional: bool,
    /// Absent when the ingredient is the product of an earlier step.
    pub ingredient: Option<ValidIngredient>,
    pub measurement_unit: ValidMeasurementUnit,
    pub quantity: Float32RangeWithOptionalMax,
    pub quantity_notes: String,
    pub ingredient_notes: String,
    pub recipe_step_product_id: Option<String>,
    pub option_index: u16,
    pub vessel_index: Option<u16>,
    pub product_percentage_to_use: Option<f32>,
    pub to_taste: bool,
    pub belongs_to_recipe_step: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepIngredientDatabaseCreationInput {
    pub name: String,
    pub optional: bool,
    pub ingredient_id: Option<String>,
    pub measurement_unit_id: String,
    pub quantity: Float32RangeWithOptionalMax,
    pub quantity_notes: String,
    pub ingredient_notes: String,
    pub recipe_step_product_id: Option<String>,
    pub option_index: u16,
    pub vessel_index: Option<u16>,
    pub product_percentage_to_use: Option<f32>,
    pub to_taste: bool,
    pub belongs_to_recipe_step: String,
}

impl RecipeStepIngredientDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ingredient_id.is_none() && self.recipe_step_product_id.is_none() {
            return Err(ValidationError::required("ingredient_id"));
        }
        if self.measurement_unit_id.is_empty() {
            return Err(ValidationError::required("measurement_unit_id"));
        }
        self.quantity.validate("quantity")
    }
}

// =============================================================================
// Step Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepProduct {
    pub id: String,
    pub name: String,
    pub product_type: RecipeStepProductType,
    pub measurement_unit: Option<ValidMeasurementUnit>,
    pub quantity: OptionalFloat32Range,
    pub quantity_notes: String,
    pub compostable: bool,
    pub storage_duration_in_seconds: OptionalUint32Range,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
    pub storage_instructions: String,
    pub is_liquid: bool,
    pub is_waste: bool,
    pub index: u16,
    pub contained_in_vessel_index: Option<u16>,
    pub belongs_to_recipe_step: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepProductDatabaseCreationInput {
    pub name: String,
    pub product_type: RecipeStepProductType,
    pub measurement_unit_id: Option<String>,
    pub quantity: OptionalFloat32Range,
    pub quantity_notes: String,
    pub compostable: bool,
    pub storage_duration_in_seconds: OptionalUint32Range,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
    pub storage_instructions: String,
    pub is_liquid: bool,
    pub is_waste: bool,
    pub index: u16,
    pub contained_in_vessel_index: Option<u16>,
    pub belongs_to_recipe_step: String,
}

impl RecipeStepProductDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        self.quantity.validate("quantity")?;
        self.storage_duration_in_seconds
            .validate("storage_duration_in_seconds")?;
        self.storage_temperature_in_celsius
            .validate("storage_temperature_in_celsius")
    }
}

// =============================================================================
// Step Instruments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepInstrument {
    pub id: String,
    pub instrument: Option<ValidInstrument>,
    pub recipe_step_product_id: Option<String>,
    pub name: String,
    pub notes: String,
    pub preference_rank: u8,
    pub optional: bool,
    pub option_index: u16,
    pub quantity: Uint32RangeWithOptionalMax,
    pub belongs_to_recipe_step: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepInstrumentDatabaseCreationInput {
    pub instrument_id: Option<String>,
    pub recipe_step_product_id: Option<String>,
    pub name: String,
    pub notes: String,
    pub preference_rank: u8,
    pub optional: bool,
    pub option_index: u16,
    pub quantity: Uint32RangeWithOptionalMax,
    pub belongs_to_recipe_step: String,
}

impl RecipeStepInstrumentDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.instrument_id.is_none() && self.recipe_step_product_id.is_none() {
            return Err(ValidationError::required("instrument_id"));
        }
        self.quantity.validate("quantity")
    }
}

// =============================================================================
// Step Vessels
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepVessel {
    pub id: String,
    pub vessel: Option<ValidVessel>,
    pub recipe_step_product_id: Option<String>,
    pub name: String,
    pub notes: String,
    pub vessel_preposition: String,
    pub quantity: Uint16RangeWithOptionalMax,
    pub unavailable_after_step: bool,
    pub belongs_to_recipe_step: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepVesselDatabaseCreationInput {
    pub vessel_id: Option<String>,
    pub recipe_step_product_id: Option<String>,
    pub name: String,
    pub notes: String,
    pub vessel_preposition: String,
    pub quantity: Uint16RangeWithOptionalMax,
    pub unavailable_after_step: bool,
    pub belongs_to_recipe_step: String,
}

impl RecipeStepVesselDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.vessel_id.is_none() && self.recipe_step_product_id.is_none() {
            return Err(ValidationError::required("vessel_id"));
        }
        self.quantity.validate("quantity")
    }
}

// =============================================================================
// Step Completion Conditions
// =============================================================================

/// "Cook until the onions are translucent."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepCompletionCondition {
    pub id: String,
    pub ingredient_state: String,
    pub notes: String,
    pub optional: bool,
    pub ingredients: Vec<RecipeStepCompletionConditionIngredient>,
    pub belongs_to_recipe_step: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepCompletionConditionIngredient {
    pub id: String,
    pub belongs_to_recipe_step_completion_condition: String,
    pub recipe_step_ingredient: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepCompletionConditionDatabaseCreationInput {
    pub ingredient_state: String,
    pub notes: String,
    pub optional: bool,
    /// Existing step ingredient IDs.
    pub ingredient_ids: Vec<String>,
    /// Positions in the enclosing step's ingredient list, resolved to IDs
    /// when the step is created in the same transaction.
    pub ingredient_indices: Vec<usize>,
    pub belongs_to_recipe_step: String,
}

// =============================================================================
// Media
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMedia {
    pub id: String,
    pub belongs_to_recipe: Option<String>,
    pub belongs_to_recipe_step: Option<String>,
    pub mime_type: String,
    pub internal_path: String,
    pub external_path: String,
    pub index: u16,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeMediaDatabaseCreationInput {
    pub belongs_to_recipe: Option<String>,
    pub belongs_to_recipe_step: Option<String>,
    pub mime_type: String,
    pub internal_path: String,
    pub external_path: String,
    pub index: u16,
}

impl RecipeMediaDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.belongs_to_recipe.is_none() {
            return Err(ValidationError::required("belongs_to_recipe"));
        }
        if self.mime_type.is_empty() {
            return Err(ValidationError::required("mime_type"));
        }
        Ok(())
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// Highest score a rating dimension accepts.
pub const MAX_RECIPE_RATING: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRating {
    pub id: String,
    pub recipe_id: String,
    pub taste: f32,
    pub difficulty: f32,
    pub cleanup: f32,
    pub instructions: f32,
    pub overall: f32,
    pub notes: String,
    pub by_user: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRatingDatabaseCreationInput {
    pub recipe_id: String,
    pub taste: f32,
    pub difficulty: f32,
    pub cleanup: f32,
    pub instructions: f32,
    pub overall: f32,
    pub notes: String,
    pub by_user: String,
}

impl RecipeRatingDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let scores = [
            ("taste", self.taste),
            ("difficulty", self.difficulty),
            ("cleanup", self.cleanup),
            ("instructions", self.instructions),
            ("overall", self.overall),
        ];
        for (field, score) in scores {
            if !(0.0..=MAX_RECIPE_RATING).contains(&score) {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    min: 0,
                    max: MAX_RECIPE_RATING as i64,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ingredient_needs_a_source() {
        let input = RecipeStepIngredientDatabaseCreationInput {
            measurement_unit_id: "unit".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::required("ingredient_id")));

        let from_product = RecipeStepIngredientDatabaseCreationInput {
            recipe_step_product_id: Some("product".to_string()),
            ..input
        };
        assert!(from_product.validate().is_ok());
    }

    #[test]
    fn test_completion_condition_indices_must_exist() {
        let step = RecipeStepDatabaseCreationInput {
            preparation_id: "prep".to_string(),
            completion_conditions: vec![RecipeStepCompletionConditionDatabaseCreationInput {
                ingredient_indices: vec![0],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(step.validate().is_err());
    }

    #[test]
    fn test_rating_bounds() {
        let mut rating = RecipeRatingDatabaseCreationInput {
            taste: 4.5,
            overall: 5.0,
            ..Default::default()
        };
        assert!(rating.validate().is_ok());
        rating.cleanup = 7.0;
        assert!(rating.validate().is_err());
    }
}
