//! # Recipe Prep Tasks
//!
//! Work that can happen ahead of cooking a recipe: soak the beans the night
//! before, make the dough two hours early. A prep task covers one or more
//! recipe steps and says how long before the recipe it may start and how
//! its result is stored meanwhile.
//!
//! ```text
//! Recipe
//!  └── RecipePrepTask (buffer 8h..24h, covered, 2°C..5°C)
//!       └── RecipePrepTaskStep → RecipeStep (satisfies it, or only starts it)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ranges::{OptionalFloat32Range, Uint32RangeWithOptionalMax};

string_enum! {
    StorageContainerType as "storage container type" {
        Uncovered => "uncovered",
        Covered => "covered",
        OnAWireRack => "on a wire rack",
        InAnAirtightContainer => "in an airtight container",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipePrepTask {
    pub id: String,
    pub name: String,
    pub description: String,
    pub notes: String,
    pub optional: bool,
    pub explicit_storage_instructions: String,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
    pub storage_type: Option<StorageContainerType>,
    pub time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax,
    pub belongs_to_recipe: String,
    pub task_steps: Vec<RecipePrepTaskStep>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePrepTaskStep {
    pub id: String,
    pub belongs_to_recipe_step: String,
    pub belongs_to_recipe_prep_task: String,
    /// False when the task only gets the step started.
    pub satisfies_recipe_step: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipePrepTaskDatabaseCreationInput {
    pub name: String,
    pub description: String,
    pub notes: String,
    pub optional: bool,
    pub explicit_storage_instructions: String,
    pub storage_temperature_in_celsius: OptionalFloat32Range,
    pub storage_type: Option<StorageContainerType>,
    pub time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax,
    pub belongs_to_recipe: String,
    pub task_steps: Vec<RecipePrepTaskStepDatabaseCreationInput>,
}

impl RecipePrepTaskDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.belongs_to_recipe.is_empty() {
            return Err(ValidationError::required("belongs_to_recipe"));
        }
        if self.task_steps.is_empty() {
            return Err(ValidationError::Empty {
                field: "task_steps".to_string(),
            });
        }
        for step in &self.task_steps {
            if step.belongs_to_recipe_step.is_empty() {
                return Err(ValidationError::required("belongs_to_recipe_step"));
            }
        }
        self.storage_temperature_in_celsius
            .validate("storage_temperature_in_celsius")?;
        self.time_buffer_before_recipe_in_seconds
            .validate("time_buffer_before_recipe_in_seconds")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePrepTaskStepDatabaseCreationInput {
    pub belongs_to_recipe_step: String,
    pub satisfies_recipe_step: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soak_beans() -> RecipePrepTaskDatabaseCreationInput {
        RecipePrepTaskDatabaseCreationInput {
            name: "soak the beans".to_string(),
            belongs_to_recipe: "recipe".to_string(),
            time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax::new(
                8 * 3600,
                Some(24 * 3600),
            ),
            task_steps: vec![RecipePrepTaskStepDatabaseCreationInput {
                belongs_to_recipe_step: "step".to_string(),
                satisfies_recipe_step: true,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_prep_task_needs_steps() {
        assert!(soak_beans().validate().is_ok());

        let input = RecipePrepTaskDatabaseCreationInput {
            task_steps: Vec::new(),
            ..soak_beans()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::Empty {
                field: "task_steps".to_string()
            })
        );
    }

    #[test]
    fn test_prep_task_buffer_must_be_ordered() {
        let input = RecipePrepTaskDatabaseCreationInput {
            time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax::new(600, Some(60)),
            ..soak_beans()
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_storage_type_uses_spoken_names() {
        assert_eq!(StorageContainerType::OnAWireRack.as_str(), "on a wire rack");
        assert_eq!(
            "in an airtight container".parse::<StorageContainerType>().unwrap(),
            StorageContainerType::InAnAirtightContainer
        );
    }
}
