//! # User Repository
//!
//! Accounts and the household every account starts with.
//!
//! ## Signup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_user (one transaction)                       │
//! │                                                                         │
//! │  1. INSERT users                       (unverified, service_user)      │
//! │  2. INSERT households                  "{username}'s cool household"   │
//! │  3. INSERT household_user_memberships  (household_admin, default)      │
//! │  4. INSERT audit_log_entries           user, household, membership     │
//! │  5. UPDATE household_invitations       to_user = new id, by email      │
//! │                                                                         │
//! │  Any failure ──► ROLLBACK, nothing from the signup is visible           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use dinner_core::{
    AuditLogEntryDatabaseCreationInput, AuditLogEntryEventType, QueryFilter, QueryFilteredResult,
    User, UserDatabaseCreationInput, UserDetailsDatabaseUpdateInput, DEFAULT_BILLING_STATUS,
    DEFAULT_SERVICE_ROLE, HOUSEHOLDS_RESOURCE_TYPE, HOUSEHOLD_ADMIN_ROLE,
    HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE, UNVERIFIED_ACCOUNT_STATUS, USERS_RESOURCE_TYPE,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument};

use crate::error::{require_id, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::households::{self as household_queries, HouseholdRow, HouseholdUserMembershipRow};
use crate::queries::users::{self as q, UserRow};
use crate::repository::{filter_or_default, into_filtered_result, SEARCH_LIMIT};

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        email_address: row.email_address,
        email_address_verified_at: row.email_address_verified_at,
        avatar_src: row.avatar_src,
        birthday: row.birthday,
        hashed_password: row.hashed_password,
        password_last_changed_at: row.password_last_changed_at,
        requires_password_change: row.requires_password_change,
        two_factor_secret: row.two_factor_secret,
        two_factor_secret_verified_at: row.two_factor_secret_verified_at,
        service_role: row.service_role,
        account_status: row.user_account_status,
        account_status_explanation: row.user_account_status_explanation,
        last_accepted_terms_of_service: row.last_accepted_terms_of_service,
        last_accepted_privacy_policy: row.last_accepted_privacy_policy,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

impl Querier {
    #[instrument(skip(self))]
    pub async fn user_exists(&self, user_id: &str) -> DbResult<bool> {
        require_id(user_id)?;

        q::user_exists(self.pool(), user_id)
            .await
            .map_err(|err| prepare_error(err, "checking user existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> DbResult<User> {
        require_id(user_id)?;

        q::get_user(self.pool(), user_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map(user_from_row)
            .map_err(|err| prepare_error(err, "fetching user"))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> DbResult<User> {
        if username.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        q::get_user_by_username(self.pool(), username)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map(user_from_row)
            .map_err(|err| prepare_error(err, "fetching user by username"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_users(&self, filter: Option<&QueryFilter>) -> DbResult<QueryFilteredResult<User>> {
        let filter = filter_or_default(filter);

        q::get_users(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, |row| Ok(user_from_row(row))))
            .map_err(|err| prepare_error(err, "fetching users"))
    }

    /// Users whose username contains `username`, case-insensitively.
    #[instrument(skip(self))]
    pub async fn search_for_users_by_username(&self, username: &str) -> DbResult<Vec<User>> {
        if username.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        let rows = q::search_for_users_by_username(self.pool(), username, SEARCH_LIMIT)
            .await
            .map_err(|err| prepare_error(err, "searching for users"))?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    /// Creates an account, its default household and admin membership.
    ///
    /// ## Returns
    /// * `Ok(User)` - The new account (unverified)
    /// * `Err(DbError::UniqueViolation)` - The username is taken
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: &UserDatabaseCreationInput) -> DbResult<User> {
        input.validate()?;

        let mut tx = self.begin("beginning user creation transaction").await?;
        match self.create_user_in(&mut tx, input).await {
            Ok(user) => {
                Querier::commit(tx, "committing user creation transaction").await?;
                info!(id = %user.id, username = %user.username, "Created user");
                Ok(user)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating user"))
            }
        }
    }

    async fn create_user_in(
        &self,
        conn: &mut PgConnection,
        input: &UserDatabaseCreationInput,
    ) -> DbResult<User> {
        let now = self.now();
        let row = UserRow {
            id: self.new_id(),
            username: input.username.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email_address: input.email_address.clone(),
            email_address_verified_at: None,
            avatar_src: input.avatar_src.clone(),
            birthday: input.birthday,
            hashed_password: input.hashed_password.clone(),
            password_last_changed_at: None,
            requires_password_change: false,
            two_factor_secret: input.two_factor_secret.clone(),
            two_factor_secret_verified_at: None,
            service_role: DEFAULT_SERVICE_ROLE.to_string(),
            user_account_status: UNVERIFIED_ACCOUNT_STATUS.to_string(),
            user_account_status_explanation: String::new(),
            last_accepted_terms_of_service: None,
            last_accepted_privacy_policy: None,
            last_indexed_at: None,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        q::create_user(&mut *conn, &row).await?;
        self.write_audit_log_entry(
            &mut *conn,
            AuditLogEntryDatabaseCreationInput::new(
                USERS_RESOURCE_TYPE,
                &row.id,
                AuditLogEntryEventType::Created,
            )
            .for_user(&row.id),
        )
        .await?;

        let household = HouseholdRow {
            id: self.new_id(),
            name: input.default_household_name(),
            billing_status: DEFAULT_BILLING_STATUS.to_string(),
            contact_phone: String::new(),
            address_line_1: String::new(),
            address_line_2: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: String::new(),
            latitude: None,
            longitude: None,
            belongs_to_user: row.id.clone(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        household_queries::create_household(&mut *conn, &household).await?;
        self.write_audit_log_entry(
            &mut *conn,
            AuditLogEntryDatabaseCreationInput::new(
                HOUSEHOLDS_RESOURCE_TYPE,
                &household.id,
                AuditLogEntryEventType::Created,
            )
            .for_user(&row.id)
            .for_household(&household.id),
        )
        .await?;

        let membership = HouseholdUserMembershipRow {
            id: self.new_id(),
            belongs_to_household: household.id.clone(),
            belongs_to_user: row.id.clone(),
            household_role: HOUSEHOLD_ADMIN_ROLE.to_string(),
            default_household: true,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        household_queries::add_user_to_household(&mut *conn, &membership).await?;
        self.write_audit_log_entry(
            &mut *conn,
            AuditLogEntryDatabaseCreationInput::new(
                HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE,
                &membership.id,
                AuditLogEntryEventType::Created,
            )
            .for_user(&row.id)
            .for_household(&household.id),
        )
        .await?;

        let attached = q::attach_invitations_to_user(&mut *conn, &row.id, &row.email_address, now).await?;
        debug!(id = %row.id, household_id = %household.id, attached, "Prepared user signup");

        Ok(user_from_row(row))
    }

    #[instrument(skip(self, input))]
    pub async fn update_user_details(
        &self,
        user_id: &str,
        input: &UserDetailsDatabaseUpdateInput,
    ) -> DbResult<()> {
        require_id(user_id)?;

        q::update_user_details(
            self.pool(),
            user_id,
            &input.first_name,
            &input.last_name,
            input.birthday,
            self.now(),
        )
        .await
        .map_err(|err| prepare_error(err, "updating user details"))?;

        debug!(id = %user_id, "Updated user details");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_user_username(&self, user_id: &str, new_username: &str) -> DbResult<()> {
        require_id(user_id)?;
        if new_username.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        q::update_user_username(self.pool(), user_id, new_username, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating username"))?;

        debug!(id = %user_id, "Updated username");
        Ok(())
    }

    /// Archives an account and all of its memberships.
    ///
    /// Unlike other archives this is not idempotent: archiving a user that
    /// does not exist (or is already archived) fails with `NotFound`.
    #[instrument(skip(self))]
    pub async fn archive_user(&self, user_id: &str) -> DbResult<()> {
        require_id(user_id)?;

        let mut tx = self.begin("beginning user archive transaction").await?;
        let outcome: DbResult<()> = async {
            if q::archive_user(&mut *tx, user_id).await? == 0 {
                return Err(DbError::NotFound);
            }
            let memberships = q::archive_user_memberships(&mut *tx, user_id).await?;
            self.write_audit_log_entry(
                &mut *tx,
                AuditLogEntryDatabaseCreationInput::new(
                    USERS_RESOURCE_TYPE,
                    user_id,
                    AuditLogEntryEventType::Archived,
                )
                .for_user(user_id),
            )
            .await?;
            debug!(id = %user_id, memberships, "Archived user memberships");
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing user archive transaction").await?;
                info!(id = %user_id, "Archived user");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving user"))
            }
        }
    }

    /// Users never indexed, or last indexed before the reindex window.
    #[instrument(skip(self))]
    pub async fn get_user_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_user_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching user IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_user_last_indexed_at(&self, user_id: &str) -> DbResult<()> {
        require_id(user_id)?;

        q::update_user_last_indexed_at(self.pool(), user_id)
            .await
            .map_err(|err| prepare_error(err, "marking user as indexed"))?;
        Ok(())
    }
}
