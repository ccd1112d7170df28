//! # Domain Types
//!
//! Entities persisted by the data access core, grouped by ownership.
//!
//! ## Ownership Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  User ──┬── Household (default) ──┬── HouseholdUserMembership           │
//! │         │                         ├── HouseholdInvitation               │
//! │         │                         ├── Webhook                           │
//! │         │                         ├── HouseholdInstrumentOwnership      │
//! │         │                         └── MealPlan ── Event ── Option ── Vote│
//! │         │                              ├── GroceryListItem   └─ Task    │
//! │         ├── Recipe ── RecipeStep ── Ingredient / Product / Instrument   │
//! │         │         │              └─ Vessel / CompletionCondition        │
//! │         │         ├── RecipePrepTask ── RecipePrepTaskStep              │
//! │         │         ├── RecipeMedia                                       │
//! │         │         └── RecipeRating                                      │
//! │         ├── Meal ── MealComponent (→ Recipe)                            │
//! │         ├── UserIngredientPreference (→ ValidIngredient)                │
//! │         └── AuditLogEntry / ServiceSettingConfiguration                 │
//! │                                                                         │
//! │  Global: ValidIngredient, ValidInstrument, ValidMeasurementUnit,        │
//! │          ValidPreparation, ValidVessel, ValidIngredientGroup,           │
//! │          ValidIngredient×Unit, ValidIngredient×Preparation,             │
//! │          ValidPreparation×Instrument, ValidPreparation×Vessel,          │
//! │          ValidIngredientState, ValidIngredientState×Ingredient,         │
//! │          ValidMeasurementUnitConversion, ServiceSetting                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Temporal Fields
//! Every entity carries `created_at`, `last_updated_at` and `archived_at`.
//! Searchable entities also carry `last_indexed_at`. An archived row is
//! never returned by a default read.

/// Declares a closed set of string values stored as TEXT.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant,)+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The stored representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::error::ValidationError::unknown_value($label, other)),
                }
            }
        }
    };
}

pub mod audit;
pub mod data_privacy;
pub mod grocery_lists;
pub mod households;
pub mod meal_plan_tasks;
pub mod meal_plans;
pub mod meals;
pub mod preferences;
pub mod recipe_prep_tasks;
pub mod recipes;
pub mod settings;
pub mod users;
pub mod valid_enumerations;
pub mod valid_mappings;
pub mod webhooks;

pub use audit::*;
pub use data_privacy::*;
pub use grocery_lists::*;
pub use households::*;
pub use meal_plan_tasks::*;
pub use meal_plans::*;
pub use meals::*;
pub use preferences::*;
pub use recipe_prep_tasks::*;
pub use recipes::*;
pub use settings::*;
pub use users::*;
pub use valid_enumerations::*;
pub use valid_mappings::*;
pub use webhooks::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_enum_round_trip() {
        for status in MealPlanStatus::ALL {
            assert_eq!(status.as_str().parse::<MealPlanStatus>().unwrap(), *status);
        }
        assert!("voting".parse::<MealPlanStatus>().is_err());
    }

    #[test]
    fn test_string_enum_serde_uses_stored_names() {
        let json = serde_json::to_string(&InvitationState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: ComponentType = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(parsed, ComponentType::Main);
    }
}
