//! # Data Privacy Repository
//!
//! Assembles the full export of one user's data.
//!
//! ```text
//! aggregate_user_data(user_id, report_id)
//!       │
//!       ├── get_user                         NotFound ──► abort
//!       ├── fetch_all_rows × 8               user-scoped lists
//!       └── for each household of the user
//!               └── fetch_all_rows × 5       household-scoped lists
//! ```
//!
//! Any failure aborts the export; a partial collection is never returned.

use std::collections::BTreeMap;

use dinner_core::{Household, HouseholdDataCollection, UserDataCollection};
use tracing::{info, instrument};

use crate::error::{require_ids, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::repository::fetch_all_rows;

impl Querier {
    /// Collects everything stored about `user_id` under the caller's
    /// `report_id`.
    #[instrument(skip(self))]
    pub async fn aggregate_user_data(&self, user_id: &str, report_id: &str) -> DbResult<UserDataCollection> {
        require_ids(&[user_id, report_id])?;

        let result: DbResult<UserDataCollection> = async {
            let user = self.get_user(user_id).await?;

            let audit_log_entries = fetch_all_rows(|filter| async move {
                self.get_audit_log_entries_for_user(user_id, Some(&filter)).await
            })
            .await?;
            let service_setting_configurations = fetch_all_rows(|filter| async move {
                self.get_service_setting_configurations_for_user(user_id, Some(&filter)).await
            })
            .await?;
            let sent_invites = fetch_all_rows(|filter| async move {
                self.get_pending_household_invitations_from_user(user_id, Some(&filter)).await
            })
            .await?;
            let received_invites = fetch_all_rows(|filter| async move {
                self.get_pending_household_invitations_for_user(user_id, Some(&filter)).await
            })
            .await?;
            let recipes = fetch_all_rows(|filter| async move {
                self.get_recipes_created_by_user(user_id, Some(&filter)).await
            })
            .await?;
            let recipe_ratings = fetch_all_rows(|filter| async move {
                self.get_recipe_ratings_for_user(user_id, Some(&filter)).await
            })
            .await?;
            let meals = fetch_all_rows(|filter| async move {
                self.get_meals_created_by_user(user_id, Some(&filter)).await
            })
            .await?;
            let user_ingredient_preferences = fetch_all_rows(|filter| async move {
                self.get_user_ingredient_preferences(user_id, Some(&filter)).await
            })
            .await?;

            let memberships = fetch_all_rows(|filter| async move {
                self.get_households_for_user(user_id, Some(&filter)).await
            })
            .await?;

            let mut households = BTreeMap::new();
            for household in memberships {
                let section = self.household_data_collection(household).await?;
                households.insert(section.household.id.clone(), section);
            }

            Ok(UserDataCollection {
                report_id: report_id.to_string(),
                generated_at: self.now(),
                user,
                audit_log_entries,
                service_setting_configurations,
                sent_invites,
                received_invites,
                recipes,
                recipe_ratings,
                meals,
                user_ingredient_preferences,
                households,
            })
        }
        .await;

        let collection = result.map_err(|err| prepare_error(err, "aggregating user data"))?;
        info!(
            report_id = %collection.report_id,
            households = collection.households.len(),
            recipes = collection.recipes.len(),
            "Aggregated user data"
        );
        Ok(collection)
    }

    async fn household_data_collection(&self, household: Household) -> DbResult<HouseholdDataCollection> {
        let id = household.id.clone();
        let household_id = id.as_str();
        let mut section = HouseholdDataCollection::new(household);

        section.audit_log_entries = fetch_all_rows(|filter| async move {
            self.get_audit_log_entries_for_household(household_id, Some(&filter)).await
        })
        .await?;
        section.service_setting_configurations = fetch_all_rows(|filter| async move {
            self.get_service_setting_configurations_for_household(household_id, Some(&filter)).await
        })
        .await?;
        section.webhooks = fetch_all_rows(|filter| async move {
            self.get_webhooks(household_id, Some(&filter)).await
        })
        .await?;
        section.instrument_ownerships = fetch_all_rows(|filter| async move {
            self.get_household_instrument_ownerships(household_id, Some(&filter)).await
        })
        .await?;
        section.meal_plans = fetch_all_rows(|filter| async move {
            self.get_meal_plans_for_household(household_id, Some(&filter)).await
        })
        .await?;

        Ok(section)
    }
}
