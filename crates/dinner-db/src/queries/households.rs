//! Households, memberships and invitations.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::error::DbResult;
use crate::queries::users::UserRow;
use crate::queries::{
    execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, IdRow, ListQuery,
};

table_row! {
    pub struct HouseholdRow joined as "household_" {
        pub id: String,
        pub name: String,
        pub billing_status: String,
        pub contact_phone: String,
        pub address_line_1: String,
        pub address_line_2: String,
        pub city: String,
        pub state: String,
        pub zip_code: String,
        pub country: String,
        pub latitude: Option<Decimal>,
        pub longitude: Option<Decimal>,
        pub belongs_to_user: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct HouseholdUserMembershipRow {
        pub id: String,
        pub belongs_to_household: String,
        pub belongs_to_user: String,
        pub household_role: String,
        pub default_household: bool,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct HouseholdInvitationRow {
        pub id: String,
        pub destination_household: String,
        pub from_user: String,
        pub to_user: Option<String>,
        pub to_name: String,
        pub to_email: String,
        pub note: String,
        pub status: String,
        pub status_note: String,
        pub token: String,
        pub expires_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// A membership and the member's account.
pub type HouseholdUserMembershipWithUserRow = (HouseholdUserMembershipRow, UserRow);

/// An invitation and its destination household.
pub type HouseholdInvitationWithHouseholdRow = (HouseholdInvitationRow, HouseholdRow);

// =============================================================================
// Households
// =============================================================================

/// `$1` household, `$2` a user who must be an active member.
pub const HOUSEHOLD_EXISTS: &str = "SELECT EXISTS (
    SELECT households.id FROM households
    JOIN household_user_memberships ON household_user_memberships.belongs_to_household = households.id
    WHERE households.archived_at IS NULL
    AND household_user_memberships.archived_at IS NULL
    AND households.id = $1
    AND household_user_memberships.belongs_to_user = $2
)";

pub const GET_HOUSEHOLD: &str = concat!(
    "SELECT ", household_columns!("households", ""),
    " FROM households WHERE households.archived_at IS NULL AND households.id = $1"
);

pub const GET_HOUSEHOLDS_FOR_USER: &str = concat!(
    "SELECT ", household_columns!("households", ""), ", ",
    list_counts!(
        "households",
        "EXISTS (SELECT 1 FROM household_user_memberships WHERE household_user_memberships.belongs_to_household = households.id AND household_user_memberships.archived_at IS NULL AND household_user_memberships.belongs_to_user = $8)"
    ),
    " FROM households",
    list_where!(
        "households",
        "EXISTS (SELECT 1 FROM household_user_memberships WHERE household_user_memberships.belongs_to_household = households.id AND household_user_memberships.archived_at IS NULL AND household_user_memberships.belongs_to_user = $8)"
    )
);

/// Active members of every listed household, with their accounts.
pub const GET_HOUSEHOLD_MEMBERS: &str = concat!(
    "SELECT ", household_user_membership_columns!("household_user_memberships", ""), ", ",
    user_columns!("users", "user_"),
    " FROM household_user_memberships",
    " JOIN users ON users.id = household_user_memberships.belongs_to_user",
    " WHERE household_user_memberships.archived_at IS NULL",
    " AND users.archived_at IS NULL",
    " AND household_user_memberships.belongs_to_household = ANY($1)",
    " ORDER BY household_user_memberships.created_at, household_user_memberships.id"
);

pub const CREATE_HOUSEHOLD: &str = "INSERT INTO households (
    id, name, billing_status, contact_phone, address_line_1, address_line_2, city, state,
    zip_code, country, latitude, longitude, belongs_to_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)";

pub const UPDATE_HOUSEHOLD: &str = "UPDATE households SET
    name = $2, contact_phone = $3, address_line_1 = $4, address_line_2 = $5, city = $6,
    state = $7, zip_code = $8, country = $9, latitude = $10, longitude = $11,
    last_updated_at = GREATEST($12, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_user = $13";

pub const ARCHIVE_HOUSEHOLD: &str = "UPDATE households SET archived_at = NOW()
WHERE archived_at IS NULL AND id = $1 AND belongs_to_user = $2";

pub const ARCHIVE_HOUSEHOLD_MEMBERSHIPS: &str = "UPDATE household_user_memberships
SET archived_at = NOW(), default_household = false
WHERE archived_at IS NULL AND belongs_to_household = $1";

pub async fn household_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    user_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(HOUSEHOLD_EXISTS).bind(household_id).bind(user_id),
        exec,
    )
    .await
}

pub async fn get_household<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<HouseholdRow>> {
    fetch_optional(sqlx::query(GET_HOUSEHOLD).bind(id), exec).await
}

pub async fn get_households_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<HouseholdRow>>> {
    fetch_all(list_query(GET_HOUSEHOLDS_FOR_USER, filter).bind(user_id), exec).await
}

pub async fn get_household_members<'e, E: PgExecutor<'e>>(
    exec: E,
    household_ids: &[String],
) -> DbResult<Vec<HouseholdUserMembershipWithUserRow>> {
    fetch_all(sqlx::query(GET_HOUSEHOLD_MEMBERS).bind(household_ids), exec).await
}

pub async fn create_household<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_HOUSEHOLD)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.billing_status)
        .bind(&row.contact_phone)
        .bind(&row.address_line_1)
        .bind(&row.address_line_2)
        .bind(&row.city)
        .bind(&row.state)
        .bind(&row.zip_code)
        .bind(&row.country)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(&row.belongs_to_user)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_household<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_HOUSEHOLD)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.contact_phone)
        .bind(&row.address_line_1)
        .bind(&row.address_line_2)
        .bind(&row.city)
        .bind(&row.state)
        .bind(&row.zip_code)
        .bind(&row.country)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(now)
        .bind(&row.belongs_to_user);
    execute(query, exec).await
}

pub async fn archive_household<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    user_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_HOUSEHOLD).bind(household_id).bind(user_id),
        exec,
    )
    .await
}

pub async fn archive_household_memberships<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_HOUSEHOLD_MEMBERSHIPS).bind(household_id),
        exec,
    )
    .await
}

// =============================================================================
// Memberships
// =============================================================================

pub const USER_IS_MEMBER_OF_HOUSEHOLD: &str = "SELECT EXISTS (
    SELECT household_user_memberships.id FROM household_user_memberships
    WHERE household_user_memberships.archived_at IS NULL
    AND household_user_memberships.belongs_to_household = $1
    AND household_user_memberships.belongs_to_user = $2
)";

pub const GET_DEFAULT_HOUSEHOLD_ID_FOR_USER: &str = "SELECT households.id AS id
FROM household_user_memberships
JOIN households ON households.id = household_user_memberships.belongs_to_household
WHERE household_user_memberships.archived_at IS NULL
AND households.archived_at IS NULL
AND household_user_memberships.default_household
AND household_user_memberships.belongs_to_user = $1
ORDER BY household_user_memberships.created_at, household_user_memberships.id
LIMIT 1";

/// Inserts a membership, or revives an archived one for the same pair.
/// Touches zero rows when the pair is already an active member.
pub const ADD_USER_TO_HOUSEHOLD: &str = "INSERT INTO household_user_memberships (
    id, belongs_to_household, belongs_to_user, household_role, default_household, created_at
) VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (belongs_to_household, belongs_to_user) DO UPDATE SET
    id = EXCLUDED.id,
    household_role = EXCLUDED.household_role,
    default_household = EXCLUDED.default_household,
    archived_at = NULL,
    last_updated_at = EXCLUDED.created_at
WHERE household_user_memberships.archived_at IS NOT NULL";

pub const MARK_HOUSEHOLD_AS_USER_DEFAULT: &str = "UPDATE household_user_memberships SET
    default_household = (belongs_to_household = $2),
    last_updated_at = GREATEST($3, created_at)
WHERE archived_at IS NULL AND belongs_to_user = $1";

pub const REMOVE_USER_FROM_HOUSEHOLD: &str = "UPDATE household_user_memberships
SET archived_at = NOW(), default_household = false
WHERE archived_at IS NULL AND belongs_to_household = $1 AND belongs_to_user = $2";

/// Promotes the oldest remaining membership when the user has no default.
pub const ENSURE_DEFAULT_HOUSEHOLD_FOR_USER: &str = "UPDATE household_user_memberships
SET default_household = true
WHERE id = (
    SELECT id FROM household_user_memberships
    WHERE archived_at IS NULL AND belongs_to_user = $1
    ORDER BY created_at, id LIMIT 1
)
AND NOT EXISTS (
    SELECT 1 FROM household_user_memberships
    WHERE archived_at IS NULL AND belongs_to_user = $1 AND default_household
)";

pub async fn user_is_member_of_household<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    user_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(USER_IS_MEMBER_OF_HOUSEHOLD)
            .bind(household_id)
            .bind(user_id),
        exec,
    )
    .await
}

pub async fn get_default_household_id_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> DbResult<Option<String>> {
    let row: Option<IdRow> =
        fetch_optional(sqlx::query(GET_DEFAULT_HOUSEHOLD_ID_FOR_USER).bind(user_id), exec)
            .await?;
    Ok(row.map(|IdRow(id)| id))
}

pub async fn add_user_to_household<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdUserMembershipRow,
) -> DbResult<u64> {
    let query = sqlx::query(ADD_USER_TO_HOUSEHOLD)
        .bind(&row.id)
        .bind(&row.belongs_to_household)
        .bind(&row.belongs_to_user)
        .bind(&row.household_role)
        .bind(row.default_household)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn mark_household_as_user_default<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    household_id: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(MARK_HOUSEHOLD_AS_USER_DEFAULT)
        .bind(user_id)
        .bind(household_id)
        .bind(now);
    execute(query, exec).await
}

pub async fn remove_user_from_household<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    user_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(REMOVE_USER_FROM_HOUSEHOLD)
            .bind(household_id)
            .bind(user_id),
        exec,
    )
    .await
}

pub async fn ensure_default_household_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ENSURE_DEFAULT_HOUSEHOLD_FOR_USER).bind(user_id),
        exec,
    )
    .await
}

// =============================================================================
// Invitations
// =============================================================================

pub const HOUSEHOLD_INVITATION_EXISTS: &str = "SELECT EXISTS (
    SELECT household_invitations.id FROM household_invitations
    WHERE household_invitations.archived_at IS NULL
    AND household_invitations.destination_household = $1
    AND household_invitations.id = $2
)";

pub const GET_HOUSEHOLD_INVITATION_BY_HOUSEHOLD_AND_ID: &str = concat!(
    "SELECT ", household_invitation_columns!("household_invitations", ""), ", ",
    household_columns!("households", "household_"),
    " FROM household_invitations",
    " JOIN households ON households.id = household_invitations.destination_household",
    " WHERE household_invitations.archived_at IS NULL",
    " AND household_invitations.expires_at > NOW()",
    " AND household_invitations.destination_household = $1",
    " AND household_invitations.id = $2"
);

pub const GET_HOUSEHOLD_INVITATION_BY_TOKEN_AND_ID: &str = concat!(
    "SELECT ", household_invitation_columns!("household_invitations", ""), ", ",
    household_columns!("households", "household_"),
    " FROM household_invitations",
    " JOIN households ON households.id = household_invitations.destination_household",
    " WHERE household_invitations.archived_at IS NULL",
    " AND household_invitations.expires_at > NOW()",
    " AND household_invitations.token = $1",
    " AND household_invitations.id = $2"
);

pub const GET_PENDING_HOUSEHOLD_INVITATIONS_FROM_USER: &str = concat!(
    "SELECT ", household_invitation_columns!("household_invitations", ""), ", ",
    household_columns!("households", "household_"), ", ",
    list_counts!(
        "household_invitations",
        "household_invitations.status = 'pending' AND household_invitations.from_user = $8"
    ),
    " FROM household_invitations",
    " JOIN households ON households.id = household_invitations.destination_household",
    list_where!(
        "household_invitations",
        "household_invitations.status = 'pending' AND household_invitations.from_user = $8"
    )
);

pub const GET_PENDING_HOUSEHOLD_INVITATIONS_FOR_USER: &str = concat!(
    "SELECT ", household_invitation_columns!("household_invitations", ""), ", ",
    household_columns!("households", "household_"), ", ",
    list_counts!(
        "household_invitations",
        "household_invitations.status = 'pending' AND household_invitations.to_user = $8"
    ),
    " FROM household_invitations",
    " JOIN households ON households.id = household_invitations.destination_household",
    list_where!(
        "household_invitations",
        "household_invitations.status = 'pending' AND household_invitations.to_user = $8"
    )
);

pub const CREATE_HOUSEHOLD_INVITATION: &str = "INSERT INTO household_invitations (
    id, destination_household, from_user, to_user, to_name, to_email, note, status,
    status_note, token, expires_at, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

/// Moves a pending invitation into a terminal state, which also retires it.
pub const SET_HOUSEHOLD_INVITATION_STATUS: &str = "UPDATE household_invitations SET
    status = $2, status_note = $3, last_updated_at = GREATEST($4, created_at),
    archived_at = NOW()
WHERE archived_at IS NULL AND status = 'pending' AND id = $1";

pub async fn household_invitation_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    invitation_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(HOUSEHOLD_INVITATION_EXISTS)
            .bind(household_id)
            .bind(invitation_id),
        exec,
    )
    .await
}

pub async fn get_household_invitation_by_household_and_id<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    invitation_id: &str,
) -> DbResult<Option<HouseholdInvitationWithHouseholdRow>> {
    fetch_optional(
        sqlx::query(GET_HOUSEHOLD_INVITATION_BY_HOUSEHOLD_AND_ID)
            .bind(household_id)
            .bind(invitation_id),
        exec,
    )
    .await
}

pub async fn get_household_invitation_by_token_and_id<'e, E: PgExecutor<'e>>(
    exec: E,
    token: &str,
    invitation_id: &str,
) -> DbResult<Option<HouseholdInvitationWithHouseholdRow>> {
    fetch_optional(
        sqlx::query(GET_HOUSEHOLD_INVITATION_BY_TOKEN_AND_ID)
            .bind(token)
            .bind(invitation_id),
        exec,
    )
    .await
}

pub async fn get_pending_household_invitations_from_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<HouseholdInvitationWithHouseholdRow>>> {
    fetch_all(
        list_query(GET_PENDING_HOUSEHOLD_INVITATIONS_FROM_USER, filter).bind(user_id),
        exec,
    )
    .await
}

pub async fn get_pending_household_invitations_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<HouseholdInvitationWithHouseholdRow>>> {
    fetch_all(
        list_query(GET_PENDING_HOUSEHOLD_INVITATIONS_FOR_USER, filter).bind(user_id),
        exec,
    )
    .await
}

pub async fn create_household_invitation<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdInvitationRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_HOUSEHOLD_INVITATION)
        .bind(&row.id)
        .bind(&row.destination_household)
        .bind(&row.from_user)
        .bind(&row.to_user)
        .bind(&row.to_name)
        .bind(&row.to_email)
        .bind(&row.note)
        .bind(&row.status)
        .bind(&row.status_note)
        .bind(&row.token)
        .bind(row.expires_at)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn set_household_invitation_status<'e, E: PgExecutor<'e>>(
    exec: E,
    invitation_id: &str,
    status: &str,
    status_note: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(SET_HOUSEHOLD_INVITATION_STATUS)
        .bind(invitation_id)
        .bind(status)
        .bind(status_note)
        .bind(now);
    execute(query, exec).await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_households_for_user", sql: GET_HOUSEHOLDS_FOR_USER },
    ListQuery {
        name: "get_pending_household_invitations_from_user",
        sql: GET_PENDING_HOUSEHOLD_INVITATIONS_FROM_USER,
    },
    ListQuery {
        name: "get_pending_household_invitations_for_user",
        sql: GET_PENDING_HOUSEHOLD_INVITATIONS_FOR_USER,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_revival_only_touches_archived_rows() {
        assert!(ADD_USER_TO_HOUSEHOLD.contains("ON CONFLICT (belongs_to_household, belongs_to_user)"));
        assert!(ADD_USER_TO_HOUSEHOLD
            .contains("WHERE household_user_memberships.archived_at IS NOT NULL"));
    }

    #[test]
    fn test_invitation_reads_honour_expiry() {
        assert!(GET_HOUSEHOLD_INVITATION_BY_TOKEN_AND_ID.contains("expires_at > NOW()"));
        assert!(GET_HOUSEHOLD_INVITATION_BY_HOUSEHOLD_AND_ID.contains("expires_at > NOW()"));
    }

    #[test]
    fn test_only_pending_invitations_change_status() {
        assert!(SET_HOUSEHOLD_INVITATION_STATUS.contains("status = 'pending'"));
    }
}
