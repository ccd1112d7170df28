//! Users.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use sqlx::PgExecutor;

use crate::error::DbResult;
use crate::queries::{
    execute, fetch_all, fetch_exists, fetch_ids, fetch_optional, list_query, Counted, ListQuery,
};

table_row! {
    pub struct UserRow joined as "user_" {
        pub id: String,
        pub username: String,
        pub first_name: String,
        pub last_name: String,
        pub email_address: String,
        pub email_address_verified_at: Option<DateTime<Utc>>,
        pub avatar_src: Option<String>,
        pub birthday: Option<DateTime<Utc>>,
        pub hashed_password: String,
        pub password_last_changed_at: Option<DateTime<Utc>>,
        pub requires_password_change: bool,
        pub two_factor_secret: String,
        pub two_factor_secret_verified_at: Option<DateTime<Utc>>,
        pub service_role: String,
        pub user_account_status: String,
        pub user_account_status_explanation: String,
        pub last_accepted_terms_of_service: Option<DateTime<Utc>>,
        pub last_accepted_privacy_policy: Option<DateTime<Utc>>,
        pub last_indexed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const USER_EXISTS: &str = exists_by_id!("users");

pub const GET_USER: &str = concat!(
    "SELECT ", user_columns!("users", ""),
    " FROM users WHERE users.archived_at IS NULL AND users.id = $1"
);

pub const GET_USER_BY_USERNAME: &str = concat!(
    "SELECT ", user_columns!("users", ""),
    " FROM users WHERE users.archived_at IS NULL AND users.username = $1"
);

pub const GET_USERS: &str = concat!(
    "SELECT ", user_columns!("users", ""), ", ",
    list_counts!("users", "TRUE"),
    " FROM users",
    list_where!("users", "TRUE")
);

pub const SEARCH_FOR_USERS_BY_USERNAME: &str = concat!(
    "SELECT ", user_columns!("users", ""),
    " FROM users WHERE users.archived_at IS NULL",
    " AND users.username ILIKE '%' || $1 || '%'",
    " ORDER BY users.username, users.id LIMIT $2"
);

pub const CREATE_USER: &str = "INSERT INTO users (
    id, username, first_name, last_name, email_address, avatar_src, birthday,
    hashed_password, two_factor_secret, service_role, user_account_status,
    user_account_status_explanation, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)";

pub const UPDATE_USER_DETAILS: &str = "UPDATE users SET
    first_name = $2, last_name = $3, birthday = $4,
    last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const UPDATE_USER_USERNAME: &str = "UPDATE users SET
    username = $2, last_updated_at = GREATEST($3, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_USER: &str = archive_by_id!("users");

pub const ARCHIVE_USER_MEMBERSHIPS: &str = "UPDATE household_user_memberships
SET archived_at = NOW() WHERE archived_at IS NULL AND belongs_to_user = $1";

/// Points invitations sent to an address at the account now registered
/// with it.
pub const ATTACH_INVITATIONS_TO_USER: &str = "UPDATE household_invitations
SET to_user = $1, last_updated_at = $3
WHERE archived_at IS NULL AND to_user IS NULL AND to_email = $2";

pub const GET_USER_IDS_NEEDING_INDEXING: &str = ids_needing_indexing!("users");
pub const UPDATE_USER_LAST_INDEXED_AT: &str = update_last_indexed_at!("users");

pub async fn user_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(USER_EXISTS).bind(id), exec).await
}

pub async fn get_user<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<Option<UserRow>> {
    fetch_optional(sqlx::query(GET_USER).bind(id), exec).await
}

pub async fn get_user_by_username<'e, E: PgExecutor<'e>>(
    exec: E,
    username: &str,
) -> DbResult<Option<UserRow>> {
    fetch_optional(sqlx::query(GET_USER_BY_USERNAME).bind(username), exec).await
}

pub async fn get_users<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<UserRow>>> {
    fetch_all(list_query(GET_USERS, filter), exec).await
}

pub async fn search_for_users_by_username<'e, E: PgExecutor<'e>>(
    exec: E,
    username: &str,
    limit: i64,
) -> DbResult<Vec<UserRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_USERS_BY_USERNAME).bind(username).bind(limit),
        exec,
    )
    .await
}

pub async fn create_user<'e, E: PgExecutor<'e>>(exec: E, row: &UserRow) -> DbResult<u64> {
    let query = sqlx::query(CREATE_USER)
        .bind(&row.id)
        .bind(&row.username)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.email_address)
        .bind(&row.avatar_src)
        .bind(row.birthday)
        .bind(&row.hashed_password)
        .bind(&row.two_factor_secret)
        .bind(&row.service_role)
        .bind(&row.user_account_status)
        .bind(&row.user_account_status_explanation)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_user_details<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
    first_name: &str,
    last_name: &str,
    birthday: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_USER_DETAILS)
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(birthday)
        .bind(now);
    execute(query, exec).await
}

pub async fn update_user_username<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
    username: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    execute(
        sqlx::query(UPDATE_USER_USERNAME).bind(id).bind(username).bind(now),
        exec,
    )
    .await
}

pub async fn archive_user<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_USER).bind(id), exec).await
}

pub async fn archive_user_memberships<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_USER_MEMBERSHIPS).bind(user_id), exec).await
}

pub async fn attach_invitations_to_user<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    email_address: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(ATTACH_INVITATIONS_TO_USER)
        .bind(user_id)
        .bind(email_address)
        .bind(now);
    execute(query, exec).await
}

pub async fn get_user_ids_needing_indexing<'e, E: PgExecutor<'e>>(
    exec: E,
    window_seconds: f64,
) -> DbResult<Vec<String>> {
    fetch_ids(
        sqlx::query(GET_USER_IDS_NEEDING_INDEXING).bind(window_seconds),
        exec,
    )
    .await
}

pub async fn update_user_last_indexed_at<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(UPDATE_USER_LAST_INDEXED_AT).bind(id), exec).await
}

pub const LIST_QUERIES: &[ListQuery] = &[ListQuery {
    name: "get_users",
    sql: GET_USERS,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_skip_archived_users() {
        for sql in [GET_USER, GET_USER_BY_USERNAME, SEARCH_FOR_USERS_BY_USERNAME] {
            assert!(sql.contains("users.archived_at IS NULL"));
        }
    }

    #[test]
    fn test_invitations_attach_only_to_unclaimed_rows() {
        assert!(ATTACH_INVITATIONS_TO_USER.contains("to_user IS NULL"));
        assert!(ATTACH_INVITATIONS_TO_USER.contains("to_email = $2"));
    }
}
