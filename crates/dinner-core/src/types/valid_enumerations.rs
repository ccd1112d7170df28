//! # Valid Enumerations
//!
//! Curated, globally shared catalogues: ingredients, instruments,
//! measurement units, preparations, vessels, ingredient groups and
//! ingredient states. These are not owned by any user and are referenced by
//! recipes, meals and preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::{OptionalFloat32Range, Uint16RangeWithOptionalMax};

fn require_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::required("name"));
    }
    Ok(())
}

// =============================================================================
// Ingredients
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredient {
    pub id: String,
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub warning: String,
    pub icon_path: String,
    pub slug: String,
    pub shopping_suggestions: String,
    pub storage_instructions: String,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
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
    /// Unknown for many ingredients.
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientDatabaseCreationInput {
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub warning: String,
    pub icon_path: String,
    pub slug: String,
    pub shopping_suggestions: String,
    pub storage_instructions: String,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
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
}

impl ValidIngredientDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)?;
        self.storage_temperature_in_celsius
            .validate("storage_temperature_in_celsius")
    }
}

// =============================================================================
// Instruments
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidInstrument {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidInstrumentDatabaseCreationInput {
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub usable_for_storage: bool,
    pub display_in_summary_lists: bool,
    pub include_in_generated_instructions: bool,
}

impl ValidInstrumentDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)
    }
}

// =============================================================================
// Measurement Units
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidMeasurementUnit {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidMeasurementUnitDatabaseCreationInput {
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub volumetric: bool,
    pub universal: bool,
    pub metric: bool,
    pub imperial: bool,
}

impl ValidMeasurementUnitDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)?;
        if self.metric && self.imperial {
            return Err(ValidationError::unknown_value(
                "measurement system",
                "metric and imperial",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Preparations
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparation {
    pub id: String,
    pub name: String,
    pub past_tense: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub yields_nothing: bool,
    pub restrict_to_ingredients: bool,
    pub ingredient_count: Uint16RangeWithOptionalMax,
    pub instrument_count: Uint16RangeWithOptionalMax,
    pub vessel_count: Uint16RangeWithOptionalMax,
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparationDatabaseCreationInput {
    pub name: String,
    pub past_tense: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub yields_nothing: bool,
    pub restrict_to_ingredients: bool,
    pub ingredient_count: Uint16RangeWithOptionalMax,
    pub instrument_count: Uint16RangeWithOptionalMax,
    pub vessel_count: Uint16RangeWithOptionalMax,
    pub temperature_required: bool,
    pub time_estimate_required: bool,
    pub condition_expression_required: bool,
    pub consumes_vessel: bool,
    pub only_for_vessels: bool,
}

impl ValidPreparationDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)?;
        self.ingredient_count.validate("ingredient_count")?;
        self.instrument_count.validate("instrument_count")?;
        self.vessel_count.validate("vessel_count")
    }
}

// =============================================================================
// Vessels
// =============================================================================

string_enum! {
    #[derive(Default)]
    VesselShape as "vessel shape" {
        Hemisphere => "hemisphere",
        Rectangle => "rectangle",
        Cone => "cone",
        Pyramid => "pyramid",
        Cylinder => "cylinder",
        Sphere => "sphere",
        Cube => "cube",
        #[default]
        Other => "other",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidVessel {
    pub id: String,
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub usable_for_storage: bool,
    pub display_in_summary_lists: bool,
    pub include_in_generated_instructions: bool,
    pub capacity: f32,
    pub capacity_unit: Option<ValidMeasurementUnit>,
    pub width_in_millimeters: Option<f32>,
    pub length_in_millimeters: Option<f32>,
    pub height_in_millimeters: Option<f32>,
    pub shape: VesselShape,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidVesselDatabaseCreationInput {
    pub name: String,
    pub plural_name: String,
    pub description: String,
    pub icon_path: String,
    pub slug: String,
    pub usable_for_storage: bool,
    pub display_in_summary_lists: bool,
    pub include_in_generated_instructions: bool,
    pub capacity: f32,
    pub capacity_unit_id: Option<String>,
    pub width_in_millimeters: Option<f32>,
    pub length_in_millimeters: Option<f32>,
    pub height_in_millimeters: Option<f32>,
    pub shape: VesselShape,
}

impl ValidVesselDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)?;
        if self.capacity < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "capacity".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Ingredient Groups
// =============================================================================

/// A named set of ingredients ("alliums", "citrus").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub members: Vec<ValidIngredientGroupMember>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientGroupMember {
    pub id: String,
    pub belongs_to_group: String,
    pub valid_ingredient: ValidIngredient,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientGroupDatabaseCreationInput {
    pub name: String,
    pub description: String,
    pub slug: String,
    /// IDs of the member ingredients.
    pub members: Vec<String>,
}

impl ValidIngredientGroupDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)?;
        if self.members.is_empty() {
            return Err(ValidationError::Empty {
                field: "members".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Ingredient States
// =============================================================================

string_enum! {
    #[derive(Default)]
    IngredientAttributeType as "ingredient attribute type" {
        Texture => "texture",
        Consistency => "consistency",
        Color => "color",
        Appearance => "appearance",
        Odor => "odor",
        Taste => "taste",
        Sound => "sound",
        Temperature => "temperature",
        #[default]
        Other => "other",
    }
}

/// An observable state an ingredient can be brought to ("caramelized",
/// "softened").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientState {
    pub id: String,
    pub name: String,
    pub past_tense: String,
    pub slug: String,
    pub description: String,
    pub icon_path: String,
    pub attribute_type: IngredientAttributeType,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientStateDatabaseCreationInput {
    pub name: String,
    pub past_tense: String,
    pub slug: String,
    pub description: String,
    pub icon_path: String,
    pub attribute_type: IngredientAttributeType,
}

impl ValidIngredientStateDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_defaults_to_other() {
        let input = ValidIngredientStateDatabaseCreationInput {
            name: "caramelized".to_string(),
            ..Default::default()
        };
        assert_eq!(input.attribute_type, IngredientAttributeType::Other);
        assert!(input.validate().is_ok());
        assert!(ValidIngredientStateDatabaseCreationInput::default().validate().is_err());
    }

    #[test]
    fn test_preparation_counts_are_checked() {
        let input = ValidPreparationDatabaseCreationInput {
            name: "dice".to_string(),
            ingredient_count: Uint16RangeWithOptionalMax::new(2, Some(1)),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_group_requires_members() {
        let input = ValidIngredientGroupDatabaseCreationInput {
            name: "alliums".to_string(),
            ..Default::default()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::Empty {
                field: "members".to_string()
            })
        );
    }
}
