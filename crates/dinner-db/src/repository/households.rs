//! # Household Repository
//!
//! Households, who belongs to them, and how people are invited in.
//!
//! ## Invitation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Household Invitation States                         │
//! │                                                                         │
//! │  create_household_invitation()                                         │
//! │       │   token = random secret, expires in 7 days                      │
//! │       ▼                                                                 │
//! │   pending ──cancel_household_invitation()──► cancelled                 │
//! │       │                                                                 │
//! │       ├──reject_household_invitation()────► rejected                   │
//! │       │                                                                 │
//! │       └──accept_household_invitation()────► accepted                   │
//! │              (same transaction: membership for to_user + audit)        │
//! │                                                                         │
//! │  Terminal states also archive the invitation; only pending ones move.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every membership change keeps exactly one default household per user
//! when the user has any membership left.

use std::collections::BTreeMap;

use dinner_core::{
    AuditLogEntryDatabaseCreationInput, AuditLogEntryEventType, Household,
    HouseholdDatabaseCreationInput, HouseholdInvitation, HouseholdInvitationDatabaseCreationInput,
    HouseholdUserMembership, HouseholdUserMembershipDatabaseCreationInput,
    HouseholdUserMembershipWithUser, InvitationState, QueryFilter, QueryFilteredResult,
    ValidationError, DEFAULT_BILLING_STATUS, HOUSEHOLDS_RESOURCE_TYPE, HOUSEHOLD_ADMIN_ROLE,
    HOUSEHOLD_INVITATIONS_RESOURCE_TYPE, HOUSEHOLD_MEMBER_ROLE,
    HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument};

use crate::codec::{optional_decimal_from_f64, optional_f64_from_decimal, parse_enum};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::households::{
    self as q, HouseholdInvitationRow, HouseholdInvitationWithHouseholdRow, HouseholdRow,
    HouseholdUserMembershipRow, HouseholdUserMembershipWithUserRow,
};
use crate::repository::users::user_from_row;
use crate::repository::{filter_or_default, into_filtered_result};

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn household_from_row(row: HouseholdRow) -> DbResult<Household> {
    Ok(Household {
        latitude: optional_f64_from_decimal("latitude", row.latitude)?,
        longitude: optional_f64_from_decimal("longitude", row.longitude)?,
        id: row.id,
        name: row.name,
        billing_status: row.billing_status,
        contact_phone: row.contact_phone,
        address_line_1: row.address_line_1,
        address_line_2: row.address_line_2,
        city: row.city,
        state: row.state,
        zip_code: row.zip_code,
        country: row.country,
        belongs_to_user: row.belongs_to_user,
        members: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn household_row(household: &Household) -> DbResult<HouseholdRow> {
    Ok(HouseholdRow {
        id: household.id.clone(),
        name: household.name.clone(),
        billing_status: household.billing_status.clone(),
        contact_phone: household.contact_phone.clone(),
        address_line_1: household.address_line_1.clone(),
        address_line_2: household.address_line_2.clone(),
        city: household.city.clone(),
        state: household.state.clone(),
        zip_code: household.zip_code.clone(),
        country: household.country.clone(),
        latitude: optional_decimal_from_f64("latitude", household.latitude)?,
        longitude: optional_decimal_from_f64("longitude", household.longitude)?,
        belongs_to_user: household.belongs_to_user.clone(),
        created_at: household.created_at,
        last_updated_at: household.last_updated_at,
        archived_at: household.archived_at,
    })
}

fn membership_from_row(row: HouseholdUserMembershipRow) -> HouseholdUserMembership {
    HouseholdUserMembership {
        id: row.id,
        belongs_to_household: row.belongs_to_household,
        belongs_to_user: row.belongs_to_user,
        household_role: row.household_role,
        default_household: row.default_household,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

fn member_from_row((row, user): HouseholdUserMembershipWithUserRow) -> HouseholdUserMembershipWithUser {
    HouseholdUserMembershipWithUser {
        id: row.id,
        belongs_to_household: row.belongs_to_household,
        belongs_to_user: user_from_row(user),
        household_role: row.household_role,
        default_household: row.default_household,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

pub(crate) fn invitation_from_row(
    (row, household): HouseholdInvitationWithHouseholdRow,
) -> DbResult<HouseholdInvitation> {
    Ok(HouseholdInvitation {
        status: parse_enum("status", &row.status)?,
        destination_household: household_from_row(household)?,
        id: row.id,
        from_user: row.from_user,
        to_user: row.to_user,
        to_name: row.to_name,
        to_email: row.to_email,
        note: row.note,
        status_note: row.status_note,
        token: row.token,
        expires_at: row.expires_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

impl Querier {
    /// Loads members for each household in one round-trip.
    async fn attach_household_members(&self, households: &mut [Household]) -> DbResult<()> {
        if households.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = households.iter().map(|h| h.id.clone()).collect();
        let mut by_household: BTreeMap<String, Vec<HouseholdUserMembershipWithUser>> = BTreeMap::new();
        for row in q::get_household_members(self.pool(), &ids).await? {
            let member = member_from_row(row);
            by_household
                .entry(member.belongs_to_household.clone())
                .or_default()
                .push(member);
        }

        for household in households.iter_mut() {
            household.members = by_household.remove(&household.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Adds a membership and keeps the user's default household consistent.
    async fn add_membership_in(
        &self,
        conn: &mut PgConnection,
        household_id: &str,
        user_id: &str,
        household_role: &str,
    ) -> DbResult<HouseholdUserMembership> {
        let row = HouseholdUserMembershipRow {
            id: self.new_id(),
            belongs_to_household: household_id.to_string(),
            belongs_to_user: user_id.to_string(),
            household_role: household_role.to_string(),
            default_household: false,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        q::add_user_to_household(&mut *conn, &row).await?;
        q::ensure_default_household_for_user(&mut *conn, user_id).await?;

        self.write_audit_log_entry(
            &mut *conn,
            AuditLogEntryDatabaseCreationInput::new(
                HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE,
                &row.id,
                AuditLogEntryEventType::Created,
            )
            .for_user(user_id)
            .for_household(household_id)
            .change("household_role", "", household_role),
        )
        .await?;

        Ok(membership_from_row(row))
    }
}

// =============================================================================
// Households
// =============================================================================

impl Querier {
    /// Whether the household exists and `user_id` is an active member.
    #[instrument(skip(self))]
    pub async fn household_exists(&self, household_id: &str, user_id: &str) -> DbResult<bool> {
        require_ids(&[household_id, user_id])?;

        q::household_exists(self.pool(), household_id, user_id)
            .await
            .map_err(|err| prepare_error(err, "checking household existence"))
    }

    /// Fetches a household with its members.
    #[instrument(skip(self))]
    pub async fn get_household(&self, household_id: &str) -> DbResult<Household> {
        require_id(household_id)?;

        let result: DbResult<Household> = async {
            let row = q::get_household(self.pool(), household_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut households = vec![household_from_row(row)?];
            self.attach_household_members(&mut households).await?;
            households.pop().ok_or(DbError::NotFound)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching household"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_households_for_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<Household>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<Household>> = async {
            let rows = q::get_households_for_user(self.pool(), &filter, user_id).await?;
            let mut result = into_filtered_result(rows, &filter, household_from_row)?;
            self.attach_household_members(&mut result.data).await?;
            Ok(result)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching households for user"))
    }

    /// Creates a household with its creator as admin.
    #[instrument(skip(self, input), fields(user_id = %input.belongs_to_user))]
    pub async fn create_household(&self, input: &HouseholdDatabaseCreationInput) -> DbResult<Household> {
        input.validate()?;
        require_id(&input.belongs_to_user)?;

        let household = Household {
            id: self.new_id(),
            name: input.name.clone(),
            billing_status: DEFAULT_BILLING_STATUS.to_string(),
            contact_phone: input.contact_phone.clone(),
            address_line_1: input.address_line_1.clone(),
            address_line_2: input.address_line_2.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            zip_code: input.zip_code.clone(),
            country: input.country.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
            belongs_to_user: input.belongs_to_user.clone(),
            members: Vec::new(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = household_row(&household)?;

        let mut tx = self.begin("beginning household creation transaction").await?;
        let outcome: DbResult<()> = async {
            q::create_household(&mut *tx, &row).await?;
            self.write_audit_log_entry(
                &mut *tx,
                AuditLogEntryDatabaseCreationInput::new(
                    HOUSEHOLDS_RESOURCE_TYPE,
                    &row.id,
                    AuditLogEntryEventType::Created,
                )
                .for_user(&row.belongs_to_user)
                .for_household(&row.id),
            )
            .await?;
            self.add_membership_in(&mut tx, &row.id, &row.belongs_to_user, HOUSEHOLD_ADMIN_ROLE)
                .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing household creation transaction").await?;
                info!(id = %household.id, name = %household.name, "Created household");
                Ok(household)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating household"))
            }
        }
    }

    /// Updates the mutable household fields. Only the owning user's
    /// households are touched.
    #[instrument(skip(self, household), fields(household_id = %household.id))]
    pub async fn update_household(&self, household: &Household) -> DbResult<()> {
        require_ids(&[&household.id, &household.belongs_to_user])?;
        let row = household_row(household)?;

        q::update_household(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating household"))?;

        debug!(id = %household.id, "Updated household");
        Ok(())
    }

    /// Archives a household owned by `user_id` and all of its memberships.
    #[instrument(skip(self))]
    pub async fn archive_household(&self, household_id: &str, user_id: &str) -> DbResult<()> {
        require_ids(&[household_id, user_id])?;

        let mut tx = self.begin("beginning household archive transaction").await?;
        let outcome: DbResult<u64> = async {
            let archived = q::archive_household(&mut *tx, household_id, user_id).await?;
            if archived > 0 {
                q::archive_household_memberships(&mut *tx, household_id).await?;
                self.write_audit_log_entry(
                    &mut *tx,
                    AuditLogEntryDatabaseCreationInput::new(
                        HOUSEHOLDS_RESOURCE_TYPE,
                        household_id,
                        AuditLogEntryEventType::Archived,
                    )
                    .for_user(user_id)
                    .for_household(household_id),
                )
                .await?;
            }
            Ok(archived)
        }
        .await;

        match outcome {
            Ok(archived) => {
                Querier::commit(tx, "committing household archive transaction").await?;
                info!(id = %household_id, archived, "Archived household");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving household"))
            }
        }
    }
}

// =============================================================================
// Memberships
// =============================================================================

impl Querier {
    #[instrument(skip(self))]
    pub async fn user_is_member_of_household(&self, household_id: &str, user_id: &str) -> DbResult<bool> {
        require_ids(&[household_id, user_id])?;

        q::user_is_member_of_household(self.pool(), household_id, user_id)
            .await
            .map_err(|err| prepare_error(err, "checking household membership"))
    }

    /// The household a user acts in when none is specified.
    #[instrument(skip(self))]
    pub async fn get_default_household_id_for_user(&self, user_id: &str) -> DbResult<String> {
        require_id(user_id)?;

        q::get_default_household_id_for_user(self.pool(), user_id)
            .await
            .and_then(|id| id.ok_or(DbError::NotFound))
            .map_err(|err| prepare_error(err, "fetching default household for user"))
    }

    /// Adds a user to a household. Re-adding a removed member revives the
    /// membership with the new role.
    #[instrument(skip(self, input), fields(household_id = %input.household_id, user_id = %input.user_id))]
    pub async fn add_user_to_household(
        &self,
        input: &HouseholdUserMembershipDatabaseCreationInput,
    ) -> DbResult<HouseholdUserMembership> {
        require_ids(&[&input.household_id, &input.user_id])?;
        if input.household_role.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        let mut tx = self.begin("beginning membership creation transaction").await?;
        match self
            .add_membership_in(&mut tx, &input.household_id, &input.user_id, &input.household_role)
            .await
        {
            Ok(membership) => {
                Querier::commit(tx, "committing membership creation transaction").await?;
                info!(id = %membership.id, "Added user to household");
                Ok(membership)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "adding user to household"))
            }
        }
    }

    /// Makes `household_id` the user's default household.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - The user is not a member of it
    #[instrument(skip(self))]
    pub async fn mark_household_as_user_default(&self, user_id: &str, household_id: &str) -> DbResult<()> {
        require_ids(&[user_id, household_id])?;

        let mut tx = self.begin("beginning default household transaction").await?;
        let outcome: DbResult<()> = async {
            if !q::user_is_member_of_household(&mut *tx, household_id, user_id).await? {
                return Err(DbError::NotFound);
            }
            q::mark_household_as_user_default(&mut *tx, user_id, household_id, self.now()).await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing default household transaction").await?;
                debug!(user_id = %user_id, household_id = %household_id, "Marked default household");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "marking household as default"))
            }
        }
    }

    /// Removes a member. If it was their default household, their oldest
    /// remaining membership becomes the default.
    #[instrument(skip(self))]
    pub async fn remove_user_from_household(&self, household_id: &str, user_id: &str) -> DbResult<()> {
        require_ids(&[household_id, user_id])?;

        let mut tx = self.begin("beginning membership removal transaction").await?;
        let outcome: DbResult<()> = async {
            q::remove_user_from_household(&mut *tx, household_id, user_id).await?;
            q::ensure_default_household_for_user(&mut *tx, user_id).await?;
            self.write_audit_log_entry(
                &mut *tx,
                AuditLogEntryDatabaseCreationInput::new(
                    HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE,
                    user_id,
                    AuditLogEntryEventType::Archived,
                )
                .for_user(user_id)
                .for_household(household_id),
            )
            .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing membership removal transaction").await?;
                info!(user_id = %user_id, household_id = %household_id, "Removed user from household");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "removing user from household"))
            }
        }
    }
}

// =============================================================================
// Invitations
// =============================================================================

impl Querier {
    #[instrument(skip(self))]
    pub async fn household_invitation_exists(&self, household_id: &str, invitation_id: &str) -> DbResult<bool> {
        require_ids(&[household_id, invitation_id])?;

        q::household_invitation_exists(self.pool(), household_id, invitation_id)
            .await
            .map_err(|err| prepare_error(err, "checking household invitation existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_household_invitation_by_household_and_id(
        &self,
        household_id: &str,
        invitation_id: &str,
    ) -> DbResult<HouseholdInvitation> {
        require_ids(&[household_id, invitation_id])?;

        q::get_household_invitation_by_household_and_id(self.pool(), household_id, invitation_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(invitation_from_row)
            .map_err(|err| prepare_error(err, "fetching household invitation"))
    }

    #[instrument(skip(self, token))]
    pub async fn get_household_invitation_by_token_and_id(
        &self,
        token: &str,
        invitation_id: &str,
    ) -> DbResult<HouseholdInvitation> {
        require_ids(&[token, invitation_id])?;

        q::get_household_invitation_by_token_and_id(self.pool(), token, invitation_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(invitation_from_row)
            .map_err(|err| prepare_error(err, "fetching household invitation by token"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_pending_household_invitations_from_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<HouseholdInvitation>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_pending_household_invitations_from_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, invitation_from_row))
            .map_err(|err| prepare_error(err, "fetching outgoing household invitations"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_pending_household_invitations_for_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<HouseholdInvitation>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_pending_household_invitations_for_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, invitation_from_row))
            .map_err(|err| prepare_error(err, "fetching incoming household invitations"))
    }

    /// Creates a pending invitation with a fresh token.
    ///
    /// The returned destination household carries only its ID.
    #[instrument(skip(self, input), fields(household_id = %input.destination_household_id))]
    pub async fn create_household_invitation(
        &self,
        input: &HouseholdInvitationDatabaseCreationInput,
    ) -> DbResult<HouseholdInvitation> {
        input.validate()?;
        require_ids(&[&input.destination_household_id, &input.from_user])?;

        let now = self.now();
        let row = HouseholdInvitationRow {
            id: self.new_id(),
            destination_household: input.destination_household_id.clone(),
            from_user: input.from_user.clone(),
            to_user: input.to_user.clone(),
            to_name: input.to_name.clone(),
            to_email: input.to_email.clone(),
            note: input.note.clone(),
            status: InvitationState::Pending.as_str().to_string(),
            status_note: String::new(),
            token: self.new_secret(),
            expires_at: input.expiry_from(now),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let mut tx = self.begin("beginning household invitation transaction").await?;
        let outcome: DbResult<()> = async {
            q::create_household_invitation(&mut *tx, &row).await?;
            self.write_audit_log_entry(
                &mut *tx,
                AuditLogEntryDatabaseCreationInput::new(
                    HOUSEHOLD_INVITATIONS_RESOURCE_TYPE,
                    &row.id,
                    AuditLogEntryEventType::Created,
                )
                .for_user(&row.from_user)
                .for_household(&row.destination_household),
            )
            .await?;
            Ok(())
        }
        .await;

        if let Err(err) = outcome {
            Querier::rollback(tx).await;
            return Err(prepare_error(err, "creating household invitation"));
        }
        Querier::commit(tx, "committing household invitation transaction").await?;
        info!(id = %row.id, "Created household invitation");

        let household = Household {
            id: row.destination_household.clone(),
            ..Default::default()
        };
        invitation_from_row((row, household_row(&household)?))
            .map_err(|err| prepare_error(err, "creating household invitation"))
    }

    /// Moves a pending invitation to a terminal state and audits it.
    ///
    /// Returns the number of invitations changed (0 when it was no longer
    /// pending).
    async fn set_invitation_status_in(
        &self,
        conn: &mut PgConnection,
        invitation: &HouseholdInvitation,
        status: InvitationState,
        note: &str,
    ) -> DbResult<u64> {
        let changed =
            q::set_household_invitation_status(&mut *conn, &invitation.id, status.as_str(), note, self.now())
                .await?;
        if changed > 0 {
            self.write_audit_log_entry(
                &mut *conn,
                AuditLogEntryDatabaseCreationInput::new(
                    HOUSEHOLD_INVITATIONS_RESOURCE_TYPE,
                    &invitation.id,
                    AuditLogEntryEventType::Updated,
                )
                .for_user(invitation.to_user.clone().unwrap_or_else(|| invitation.from_user.clone()))
                .for_household(&invitation.destination_household.id)
                .change("status", invitation.status.as_str(), status.as_str()),
            )
            .await?;
        }
        Ok(changed)
    }

    async fn finish_invitation(
        &self,
        household_id: &str,
        invitation_id: &str,
        status: InvitationState,
        note: &str,
    ) -> DbResult<()> {
        require_ids(&[household_id, invitation_id])?;
        let description = format!("marking household invitation as {status}");

        let invitation = self
            .get_household_invitation_by_household_and_id(household_id, invitation_id)
            .await?;

        let mut tx = self.begin("beginning household invitation status transaction").await?;
        match self.set_invitation_status_in(&mut tx, &invitation, status, note).await {
            Ok(changed) => {
                Querier::commit(tx, "committing household invitation status transaction").await?;
                info!(id = %invitation_id, status = %status, changed, "Finished household invitation");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, &description))
            }
        }
    }

    #[instrument(skip(self, note))]
    pub async fn cancel_household_invitation(
        &self,
        household_id: &str,
        invitation_id: &str,
        note: &str,
    ) -> DbResult<()> {
        self.finish_invitation(household_id, invitation_id, InvitationState::Cancelled, note)
            .await
    }

    #[instrument(skip(self, note))]
    pub async fn reject_household_invitation(
        &self,
        household_id: &str,
        invitation_id: &str,
        note: &str,
    ) -> DbResult<()> {
        self.finish_invitation(household_id, invitation_id, InvitationState::Rejected, note)
            .await
    }

    /// Accepts an invitation and adds its recipient to the household.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No live invitation matches the token
    /// * `Err(DbError::Validation)` - The recipient has no account yet
    #[instrument(skip(self, token, note))]
    pub async fn accept_household_invitation(
        &self,
        invitation_id: &str,
        token: &str,
        note: &str,
    ) -> DbResult<()> {
        require_ids(&[invitation_id, token])?;

        let invitation = self.get_household_invitation_by_token_and_id(token, invitation_id).await?;
        let to_user = invitation
            .to_user
            .clone()
            .ok_or_else(|| DbError::Validation(ValidationError::required("to_user")))?;

        let mut tx = self.begin("beginning household invitation acceptance transaction").await?;
        let outcome: DbResult<()> = async {
            if self
                .set_invitation_status_in(&mut tx, &invitation, InvitationState::Accepted, note)
                .await?
                == 0
            {
                return Err(DbError::NotFound);
            }
            self.add_membership_in(
                &mut tx,
                &invitation.destination_household.id,
                &to_user,
                HOUSEHOLD_MEMBER_ROLE,
            )
            .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing household invitation acceptance transaction").await?;
                info!(id = %invitation_id, user_id = %to_user, "Accepted household invitation");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "accepting household invitation"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_household_coordinates_round_trip() {
        let household = Household {
            id: "household".to_string(),
            name: "Home".to_string(),
            latitude: Some(35.5),
            longitude: Some(-97.25),
            belongs_to_user: "user".to_string(),
            created_at: Utc::now(),
            ..Default::default()
        };

        let row = household_row(&household).unwrap();
        assert_eq!(row.latitude, Some(Decimal::new(355, 1)));

        let back = household_from_row(row).unwrap();
        assert_eq!(back, household);
    }

    #[test]
    fn test_unknown_invitation_status_is_integrity_error() {
        let now = Utc::now();
        let household = household_row(&Household {
            id: "household".to_string(),
            created_at: now,
            ..Default::default()
        })
        .unwrap();
        let invitation = HouseholdInvitationRow {
            id: "invitation".to_string(),
            destination_household: "household".to_string(),
            from_user: "user".to_string(),
            to_user: None,
            to_name: String::new(),
            to_email: "someone@example.com".to_string(),
            note: String::new(),
            status: "lost".to_string(),
            status_note: String::new(),
            token: "token".to_string(),
            expires_at: now,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let err = invitation_from_row((invitation, household)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }
}
