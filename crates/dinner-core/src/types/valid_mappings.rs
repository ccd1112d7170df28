//! Many-to-many links between valid enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::Float32RangeWithOptionalMax;
use crate::types::valid_enumerations::{
    ValidIngredient, ValidIngredientState, ValidInstrument, ValidMeasurementUnit,
    ValidPreparation, ValidVessel,
};

fn require_ids(pairs: &[(&str, &str)]) -> Result<(), ValidationError> {
    for (field, value) in pairs {
        if value.is_empty() {
            return Err(ValidationError::required(*field));
        }
    }
    Ok(())
}

/// Which units an ingredient may be measured in, and how much of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientMeasurementUnit {
    pub id: String,
    pub notes: String,
    pub ingredient: ValidIngredient,
    pub measurement_unit: ValidMeasurementUnit,
    pub allowable_quantity: Float32RangeWithOptionalMax,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientMeasurementUnitDatabaseCreationInput {
    pub notes: String,
    pub valid_ingredient_id: String,
    pub valid_measurement_unit_id: String,
    pub allowable_quantity: Float32RangeWithOptionalMax,
}

impl ValidIngredientMeasurementUnitDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_ids(&[
            ("valid_ingredient_id", &self.valid_ingredient_id),
            ("valid_measurement_unit_id", &self.valid_measurement_unit_id),
        ])?;
        self.allowable_quantity.validate("allowable_quantity")
    }
}

/// Preparations that make sense for an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientPreparation {
    pub id: String,
    pub notes: String,
    pub preparation: ValidPreparation,
    pub ingredient: ValidIngredient,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientPreparationDatabaseCreationInput {
    pub notes: String,
    pub valid_preparation_id: String,
    pub valid_ingredient_id: String,
}

impl ValidIngredientPreparationDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_ids(&[
            ("valid_preparation_id", &self.valid_preparation_id),
            ("valid_ingredient_id", &self.valid_ingredient_id),
        ])
    }
}

/// Instruments usable for a preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparationInstrument {
    pub id: String,
    pub notes: String,
    pub preparation: ValidPreparation,
    pub instrument: ValidInstrument,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparationInstrumentDatabaseCreationInput {
    pub notes: String,
    pub valid_preparation_id: String,
    pub valid_instrument_id: String,
}

impl ValidPreparationInstrumentDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_ids(&[
            ("valid_preparation_id", &self.valid_preparation_id),
            ("valid_instrument_id", &self.valid_instrument_id),
        ])
    }
}

/// Vessels usable for a preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparationVessel {
    pub id: String,
    pub notes: String,
    pub preparation: ValidPreparation,
    pub vessel: ValidVessel,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidPreparationVesselDatabaseCreationInput {
    pub notes: String,
    pub valid_preparation_id: String,
    pub valid_vessel_id: String,
}

impl ValidPreparationVesselDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_ids(&[
            ("valid_preparation_id", &self.valid_preparation_id),
            ("valid_vessel_id", &self.valid_vessel_id),
        ])
    }
}

/// Ingredients that can be brought to a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientStateIngredient {
    pub id: String,
    pub notes: String,
    pub ingredient_state: ValidIngredientState,
    pub ingredient: ValidIngredient,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidIngredientStateIngredientDatabaseCreationInput {
    pub notes: String,
    pub valid_ingredient_state_id: String,
    pub valid_ingredient_id: String,
}

impl ValidIngredientStateIngredientDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_ids(&[
            ("valid_ingredient_state_id", &self.valid_ingredient_state_id),
            ("valid_ingredient_id", &self.valid_ingredient_id),
        ])
    }
}

/// `1 from_unit = modifier × to_unit`, optionally only for one ingredient
/// (a cup of flour weighs less than a cup of honey).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidMeasurementUnitConversion {
    pub id: String,
    pub from: ValidMeasurementUnit,
    pub to: ValidMeasurementUnit,
    pub only_for_ingredient: Option<ValidIngredient>,
    pub modifier: f32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl ValidMeasurementUnitConversion {
    /// Checks the rules a stored conversion must keep after an edit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_conversion(&self.from.id, &self.to.id, self.modifier)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidMeasurementUnitConversionDatabaseCreationInput {
    pub from: String,
    pub to: String,
    pub only_for_ingredient: Option<String>,
    pub modifier: f32,
    pub notes: String,
}

impl ValidMeasurementUnitConversionDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_conversion(&self.from, &self.to, self.modifier)
    }
}

fn check_conversion(from: &str, to: &str, modifier: f32) -> Result<(), ValidationError> {
    require_ids(&[("from", from), ("to", to)])?;
    if from == to {
        return Err(ValidationError::unknown_value("conversion", format!("{from} to itself")));
    }
    if !modifier.is_finite() || modifier <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "modifier".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_needs_two_distinct_units() {
        let input = ValidMeasurementUnitConversionDatabaseCreationInput {
            from: "cup".to_string(),
            to: "cup".to_string(),
            modifier: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::UnknownValue { .. })
        ));

        let input = ValidMeasurementUnitConversionDatabaseCreationInput {
            to: "millilitre".to_string(),
            modifier: 236.6,
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_conversion_modifier_must_be_positive() {
        for modifier in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let input = ValidMeasurementUnitConversionDatabaseCreationInput {
                from: "cup".to_string(),
                to: "gram".to_string(),
                modifier,
                ..Default::default()
            };
            assert!(input.validate().is_err(), "{modifier} was accepted");
        }
    }

    #[test]
    fn test_state_ingredient_requires_both_sides() {
        let input = ValidIngredientStateIngredientDatabaseCreationInput {
            valid_ingredient_state_id: "softened".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::required("valid_ingredient_id")));
    }
}
