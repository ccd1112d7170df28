//! Meals: named bundles of recipes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::Float32RangeWithOptionalMax;
use crate::types::recipes::{ComponentType, Recipe};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub description: String,
    pub estimated_portions: Float32RangeWithOptionalMax,
    pub eligible_for_meal_plans: bool,
    pub created_by_user: String,
    pub components: Vec<MealComponent>,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// One recipe's role in a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealComponent {
    /// The recipe without its steps.
    pub recipe: Recipe,
    pub recipe_scale: f32,
    pub component_type: ComponentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealComponentDatabaseCreationInput {
    pub recipe_id: String,
    pub recipe_scale: f32,
    pub component_type: ComponentType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealDatabaseCreationInput {
    pub name: String,
    pub description: String,
    pub estimated_portions: Float32RangeWithOptionalMax,
    pub eligible_for_meal_plans: bool,
    pub created_by_user: String,
    pub components: Vec<MealComponentDatabaseCreationInput>,
}

impl MealDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        if self.created_by_user.is_empty() {
            return Err(ValidationError::required("created_by_user"));
        }
        if self.components.is_empty() {
            return Err(ValidationError::Empty {
                field: "components".to_string(),
            });
        }
        for component in &self.components {
            if component.recipe_scale <= 0.0 {
                return Err(ValidationError::OutOfRange {
                    field: "recipe_scale".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
        self.estimated_portions.validate("estimated_portions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_requires_components() {
        let input = MealDatabaseCreationInput {
            name: "Taco Tuesday".to_string(),
            created_by_user: "user".to_string(),
            estimated_portions: Float32RangeWithOptionalMax::new(4.0, None),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
