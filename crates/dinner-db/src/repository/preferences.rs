//! # Preference Repository
//!
//! User ingredient preferences and household instrument ownerships.
//!
//! ## Group Expansion
//! ```text
//! create_user_ingredient_preference { group: G }        (one transaction)
//!       │
//!       ├── G exists?                 no ──► NotFound, nothing written
//!       ├── members of G              [I1, I2, I3]
//!       └── INSERT preference × member, skipping blank member IDs
//!                 │
//!                 └── zero inserted ──► Validation(Empty), rolled back
//! ```
//! Without a group the same path runs with the single ingredient.

use dinner_core::{
    HouseholdInstrumentOwnership, HouseholdInstrumentOwnershipDatabaseCreationInput, QueryFilter,
    QueryFilteredResult, UserIngredientPreference, UserIngredientPreferenceDatabaseCreationInput,
    ValidIngredient, ValidInstrument, ValidationError,
};
use tracing::{debug, info, instrument};

use crate::codec::narrow;
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::preferences::{
    self as q, HouseholdInstrumentOwnershipRow, HouseholdInstrumentOwnershipWithInstrumentRow,
    UserIngredientPreferenceRow, UserIngredientPreferenceWithIngredientRow,
};
use crate::queries::valid_enumerations as enumerations;
use crate::repository::valid_enumerations::{valid_ingredient_from_row, valid_instrument_from_row};
use crate::repository::{filter_or_default, into_filtered_result};

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn user_ingredient_preference_from_row(
    (row, ingredient): UserIngredientPreferenceWithIngredientRow,
) -> DbResult<UserIngredientPreference> {
    Ok(UserIngredientPreference {
        ingredient: valid_ingredient_from_row(ingredient)?,
        rating: narrow("rating", row.rating)?,
        id: row.id,
        notes: row.notes,
        allergy: row.allergy,
        belongs_to_user: row.belongs_to_user,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn user_ingredient_preference_row(preference: &UserIngredientPreference) -> UserIngredientPreferenceRow {
    UserIngredientPreferenceRow {
        id: preference.id.clone(),
        ingredient: preference.ingredient.id.clone(),
        rating: i16::from(preference.rating),
        notes: preference.notes.clone(),
        allergy: preference.allergy,
        belongs_to_user: preference.belongs_to_user.clone(),
        created_at: preference.created_at,
        last_updated_at: preference.last_updated_at,
        archived_at: preference.archived_at,
    }
}

pub(crate) fn household_instrument_ownership_from_row(
    (row, instrument): HouseholdInstrumentOwnershipWithInstrumentRow,
) -> DbResult<HouseholdInstrumentOwnership> {
    Ok(HouseholdInstrumentOwnership {
        quantity: narrow("quantity", row.quantity)?,
        instrument: valid_instrument_from_row(instrument),
        id: row.id,
        notes: row.notes,
        belongs_to_household: row.belongs_to_household,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn household_instrument_ownership_row(ownership: &HouseholdInstrumentOwnership) -> HouseholdInstrumentOwnershipRow {
    HouseholdInstrumentOwnershipRow {
        id: ownership.id.clone(),
        notes: ownership.notes.clone(),
        quantity: i32::from(ownership.quantity),
        valid_instrument_id: ownership.instrument.id.clone(),
        belongs_to_household: ownership.belongs_to_household.clone(),
        created_at: ownership.created_at,
        last_updated_at: ownership.last_updated_at,
        archived_at: ownership.archived_at,
    }
}

/// The group's ingredient IDs, or the single ingredient when no group is
/// named. Blank IDs are dropped.
fn preference_targets(group_members: Option<Vec<String>>, single: &str) -> Vec<String> {
    group_members
        .unwrap_or_else(|| vec![single.to_string()])
        .into_iter()
        .filter(|id| !id.trim().is_empty())
        .collect()
}

impl Querier {
    // =========================================================================
    // Ingredient Preferences
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn user_ingredient_preference_exists(
        &self,
        user_id: &str,
        user_ingredient_preference_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[user_id, user_ingredient_preference_id])?;

        q::user_ingredient_preference_exists(self.pool(), user_id, user_ingredient_preference_id)
            .await
            .map_err(|err| prepare_error(err, "checking user ingredient preference existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_user_ingredient_preference(
        &self,
        user_id: &str,
        user_ingredient_preference_id: &str,
    ) -> DbResult<UserIngredientPreference> {
        require_ids(&[user_id, user_ingredient_preference_id])?;

        q::get_user_ingredient_preference(self.pool(), user_id, user_ingredient_preference_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(user_ingredient_preference_from_row)
            .map_err(|err| prepare_error(err, "fetching user ingredient preference"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_user_ingredient_preferences(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<UserIngredientPreference>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_user_ingredient_preferences_for_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, user_ingredient_preference_from_row))
            .map_err(|err| prepare_error(err, "fetching user ingredient preferences"))
    }

    /// Creates one preference per target ingredient in one transaction.
    ///
    /// With `valid_ingredient_group_id` set, every member of the group is a
    /// target; otherwise `valid_ingredient_id` is. The returned preferences
    /// carry ID-only ingredient references.
    #[instrument(skip(self, input), fields(user_id = %input.belongs_to_user))]
    pub async fn create_user_ingredient_preference(
        &self,
        input: &UserIngredientPreferenceDatabaseCreationInput,
    ) -> DbResult<Vec<UserIngredientPreference>> {
        input.validate()?;
        require_id(&input.belongs_to_user)?;
        let group_id = input
            .valid_ingredient_group_id
            .as_deref()
            .filter(|id| !id.is_empty());

        let now = self.now();
        let mut tx = self.begin("beginning user ingredient preference creation transaction").await?;
        let outcome: DbResult<Vec<UserIngredientPreference>> = async {
            let members = match group_id {
                Some(group_id) => {
                    enumerations::get_valid_ingredient_group(&mut *tx, group_id)
                        .await?
                        .ok_or(DbError::NotFound)?;
                    let rows =
                        enumerations::get_valid_ingredient_group_members(&mut *tx, &[group_id.to_string()]).await?;
                    Some(rows.into_iter().map(|(member, _)| member.valid_ingredient).collect())
                }
                None => None,
            };

            let mut created = Vec::new();
            for (index, ingredient_id) in preference_targets(members, &input.valid_ingredient_id)
                .into_iter()
                .enumerate()
            {
                let preference = UserIngredientPreference {
                    id: self.new_id(),
                    ingredient: ValidIngredient {
                        id: ingredient_id,
                        ..Default::default()
                    },
                    rating: input.rating,
                    notes: input.notes.clone(),
                    allergy: input.allergy,
                    belongs_to_user: input.belongs_to_user.clone(),
                    created_at: now,
                    last_updated_at: None,
                    archived_at: None,
                };
                q::create_user_ingredient_preference(&mut *tx, &user_ingredient_preference_row(&preference))
                    .await
                    .map_err(|err| err.context(format!("creating user ingredient preference #{}", index + 1)))?;
                created.push(preference);
            }

            if created.is_empty() {
                return Err(ValidationError::Empty {
                    field: "valid ingredient group members".to_string(),
                }
                .into());
            }
            Ok(created)
        }
        .await;

        match outcome {
            Ok(created) => {
                Querier::commit(tx, "committing user ingredient preference creation transaction").await?;
                info!(count = created.len(), group = group_id.is_some(), "Created user ingredient preferences");
                Ok(created)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating user ingredient preference"))
            }
        }
    }

    #[instrument(skip(self, preference), fields(id = %preference.id))]
    pub async fn update_user_ingredient_preference(&self, preference: &UserIngredientPreference) -> DbResult<()> {
        require_ids(&[&preference.id, &preference.belongs_to_user, &preference.ingredient.id])?;

        q::update_user_ingredient_preference(self.pool(), &user_ingredient_preference_row(preference), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating user ingredient preference"))?;

        debug!(id = %preference.id, "Updated user ingredient preference");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_user_ingredient_preference(
        &self,
        user_id: &str,
        user_ingredient_preference_id: &str,
    ) -> DbResult<()> {
        require_ids(&[user_id, user_ingredient_preference_id])?;

        q::archive_user_ingredient_preference(self.pool(), user_id, user_ingredient_preference_id)
            .await
            .map_err(|err| prepare_error(err, "archiving user ingredient preference"))?;

        info!(id = %user_ingredient_preference_id, "Archived user ingredient preference");
        Ok(())
    }

    // =========================================================================
    // Instrument Ownerships
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn household_instrument_ownership_exists(
        &self,
        household_id: &str,
        household_instrument_ownership_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[household_id, household_instrument_ownership_id])?;

        q::household_instrument_ownership_exists(self.pool(), household_id, household_instrument_ownership_id)
            .await
            .map_err(|err| prepare_error(err, "checking household instrument ownership existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_household_instrument_ownership(
        &self,
        household_id: &str,
        household_instrument_ownership_id: &str,
    ) -> DbResult<HouseholdInstrumentOwnership> {
        require_ids(&[household_id, household_instrument_ownership_id])?;

        q::get_household_instrument_ownership(self.pool(), household_id, household_instrument_ownership_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(household_instrument_ownership_from_row)
            .map_err(|err| prepare_error(err, "fetching household instrument ownership"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_household_instrument_ownerships(
        &self,
        household_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<HouseholdInstrumentOwnership>> {
        require_id(household_id)?;
        let filter = filter_or_default(filter);

        q::get_household_instrument_ownerships_for_household(self.pool(), &filter, household_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, household_instrument_ownership_from_row))
            .map_err(|err| prepare_error(err, "fetching household instrument ownerships"))
    }

    #[instrument(skip(self, input), fields(household_id = %input.belongs_to_household))]
    pub async fn create_household_instrument_ownership(
        &self,
        input: &HouseholdInstrumentOwnershipDatabaseCreationInput,
    ) -> DbResult<HouseholdInstrumentOwnership> {
        input.validate()?;

        let ownership = HouseholdInstrumentOwnership {
            id: self.new_id(),
            notes: input.notes.clone(),
            quantity: input.quantity,
            instrument: ValidInstrument {
                id: input.valid_instrument_id.clone(),
                ..Default::default()
            },
            belongs_to_household: input.belongs_to_household.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_household_instrument_ownership(self.pool(), &household_instrument_ownership_row(&ownership))
            .await
            .map_err(|err| prepare_error(err, "creating household instrument ownership"))?;

        info!(id = %ownership.id, instrument = %ownership.instrument.id, "Created household instrument ownership");
        Ok(ownership)
    }

    #[instrument(skip(self, ownership), fields(id = %ownership.id))]
    pub async fn update_household_instrument_ownership(
        &self,
        ownership: &HouseholdInstrumentOwnership,
    ) -> DbResult<()> {
        require_ids(&[&ownership.id, &ownership.belongs_to_household, &ownership.instrument.id])?;

        q::update_household_instrument_ownership(
            self.pool(),
            &household_instrument_ownership_row(ownership),
            self.now(),
        )
        .await
        .map_err(|err| prepare_error(err, "updating household instrument ownership"))?;

        debug!(id = %ownership.id, "Updated household instrument ownership");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_household_instrument_ownership(
        &self,
        household_id: &str,
        household_instrument_ownership_id: &str,
    ) -> DbResult<()> {
        require_ids(&[household_id, household_instrument_ownership_id])?;

        q::archive_household_instrument_ownership(self.pool(), household_id, household_instrument_ownership_id)
            .await
            .map_err(|err| prepare_error(err, "archiving household instrument ownership"))?;

        info!(id = %household_instrument_ownership_id, "Archived household instrument ownership");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ingredient_target() {
        assert_eq!(preference_targets(None, "onion"), vec!["onion"]);
        assert!(preference_targets(None, "").is_empty());
    }

    #[test]
    fn test_group_members_replace_single_ingredient() {
        let members = vec!["a".to_string(), " ".to_string(), "b".to_string()];
        assert_eq!(preference_targets(Some(members), "ignored"), vec!["a", "b"]);
        assert!(preference_targets(Some(Vec::new()), "ignored").is_empty());
    }
}
