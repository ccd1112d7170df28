//! # Meal Plan Tasks
//!
//! A recipe prep task scheduled for one chosen meal plan option.
//!
//! ```text
//! unfinished ──► postponed ──► unfinished
//!     │
//!     ├──► finished   (completed_at set)
//!     ├──► ignored
//!     └──► canceled
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::meal_plans::MealPlanOption;
use crate::types::recipe_prep_tasks::RecipePrepTask;

string_enum! {
    #[derive(Default)]
    MealPlanTaskStatus as "meal plan task status" {
        #[default]
        Unfinished => "unfinished",
        Postponed => "postponed",
        Ignored => "ignored",
        Canceled => "canceled",
        Finished => "finished",
    }
}

impl MealPlanTaskStatus {
    /// Whether the task still needs doing.
    pub fn is_open(&self) -> bool {
        matches!(self, MealPlanTaskStatus::Unfinished | MealPlanTaskStatus::Postponed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanTask {
    pub id: String,
    /// The option without its votes; its meal without components.
    pub meal_plan_option: MealPlanOption,
    pub recipe_prep_task: RecipePrepTask,
    pub creation_explanation: String,
    pub status: MealPlanTaskStatus,
    pub status_explanation: String,
    pub assigned_to_user: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanTaskDatabaseCreationInput {
    pub meal_plan_option_id: String,
    pub recipe_prep_task_id: String,
    pub creation_explanation: String,
    pub status_explanation: String,
    pub assigned_to_user: Option<String>,
}

impl MealPlanTaskDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.meal_plan_option_id.is_empty() {
            return Err(ValidationError::required("meal_plan_option_id"));
        }
        if self.recipe_prep_task_id.is_empty() {
            return Err(ValidationError::required("recipe_prep_task_id"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanTaskStatusChangeRequestInput {
    pub id: String,
    pub status: MealPlanTaskStatus,
    pub status_explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_statuses() {
        let open: Vec<_> = MealPlanTaskStatus::ALL
            .iter()
            .filter(|status| status.is_open())
            .collect();
        assert_eq!(
            open,
            vec![&MealPlanTaskStatus::Unfinished, &MealPlanTaskStatus::Postponed]
        );
    }

    #[test]
    fn test_task_requires_option_and_prep_task() {
        let input = MealPlanTaskDatabaseCreationInput {
            meal_plan_option_id: "option".to_string(),
            ..Default::default()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::required("recipe_prep_task_id"))
        );
    }
}
