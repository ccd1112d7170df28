//! The whole-user data export.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::audit::AuditLogEntry;
use crate::types::households::{Household, HouseholdInvitation};
use crate::types::meal_plans::MealPlan;
use crate::types::meals::Meal;
use crate::types::preferences::{HouseholdInstrumentOwnership, UserIngredientPreference};
use crate::types::recipes::{Recipe, RecipeRating};
use crate::types::settings::ServiceSettingConfiguration;
use crate::types::users::User;
use crate::types::webhooks::Webhook;

/// Everything the store holds about one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataCollection {
    /// Caller-supplied identifier for this export.
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub user: User,
    pub audit_log_entries: Vec<AuditLogEntry>,
    pub service_setting_configurations: Vec<ServiceSettingConfiguration>,
    pub sent_invites: Vec<HouseholdInvitation>,
    pub received_invites: Vec<HouseholdInvitation>,
    pub recipes: Vec<Recipe>,
    pub recipe_ratings: Vec<RecipeRating>,
    pub meals: Vec<Meal>,
    pub user_ingredient_preferences: Vec<UserIngredientPreference>,
    /// Keyed by household ID.
    pub households: BTreeMap<String, HouseholdDataCollection>,
}

/// Per-household section of a [`UserDataCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdDataCollection {
    pub household: Household,
    pub audit_log_entries: Vec<AuditLogEntry>,
    pub service_setting_configurations: Vec<ServiceSettingConfiguration>,
    pub webhooks: Vec<Webhook>,
    pub instrument_ownerships: Vec<HouseholdInstrumentOwnership>,
    pub meal_plans: Vec<MealPlan>,
}

impl HouseholdDataCollection {
    pub fn new(household: Household) -> Self {
        HouseholdDataCollection {
            household,
            audit_log_entries: Vec::new(),
            service_setting_configurations: Vec::new(),
            webhooks: Vec::new(),
            instrument_ownerships: Vec::new(),
            meal_plans: Vec::new(),
        }
    }
}
