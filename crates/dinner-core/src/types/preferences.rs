//! User ingredient preferences and household instrument ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::valid_enumerations::{ValidIngredient, ValidInstrument};

/// Preference ratings run from strongly disliked to strongly liked.
pub const MIN_INGREDIENT_PREFERENCE_RATING: i8 = -10;
pub const MAX_INGREDIENT_PREFERENCE_RATING: i8 = 10;

// =============================================================================
// Ingredient Preferences
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIngredientPreference {
    pub id: String,
    pub ingredient: ValidIngredient,
    pub rating: i8,
    pub notes: String,
    pub allergy: bool,
    pub belongs_to_user: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Either a single ingredient or a whole ingredient group.
///
/// When `valid_ingredient_group_id` is set, one preference is created per
/// group member and `valid_ingredient_id` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIngredientPreferenceDatabaseCreationInput {
    pub valid_ingredient_group_id: Option<String>,
    pub valid_ingredient_id: String,
    pub rating: i8,
    pub notes: String,
    pub allergy: bool,
    pub belongs_to_user: String,
}

impl UserIngredientPreferenceDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.belongs_to_user.is_empty() {
            return Err(ValidationError::required("belongs_to_user"));
        }
        let has_group = self
            .valid_ingredient_group_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        if !has_group && self.valid_ingredient_id.is_empty() {
            return Err(ValidationError::required("valid_ingredient_id"));
        }
        if !(MIN_INGREDIENT_PREFERENCE_RATING..=MAX_INGREDIENT_PREFERENCE_RATING)
            .contains(&self.rating)
        {
            return Err(ValidationError::OutOfRange {
                field: "rating".to_string(),
                min: MIN_INGREDIENT_PREFERENCE_RATING.into(),
                max: MAX_INGREDIENT_PREFERENCE_RATING.into(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Instrument Ownership
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdInstrumentOwnership {
    pub id: String,
    pub notes: String,
    pub quantity: u16,
    pub instrument: ValidInstrument,
    pub belongs_to_household: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdInstrumentOwnershipDatabaseCreationInput {
    pub notes: String,
    pub quantity: u16,
    pub valid_instrument_id: String,
    pub belongs_to_household: String,
}

impl HouseholdInstrumentOwnershipDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.valid_instrument_id.is_empty() {
            return Err(ValidationError::required("valid_instrument_id"));
        }
        if self.belongs_to_household.is_empty() {
            return Err(ValidationError::required("belongs_to_household"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_preference_needs_no_ingredient() {
        let input = UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_group_id: Some("group".to_string()),
            rating: 5,
            belongs_to_user: "user".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_rating_range() {
        let input = UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_id: "ingredient".to_string(),
            rating: 11,
            belongs_to_user: "user".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
