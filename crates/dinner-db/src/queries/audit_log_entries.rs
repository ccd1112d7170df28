//! Audit log entries.
//!
//! Entries are append-only and have no update or archive columns, so their
//! lists take a reduced parameter set:
//! ```text
//! $1 created_after  $2 created_before  $3 offset  $4 limit
//! $5 owner ID       $6 resource types (optional)
//! ```

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::{execute, fetch_all, fetch_optional, Counted};

table_row! {
    pub struct AuditLogEntryRow {
        pub id: String,
        pub resource_type: String,
        pub relevant_id: String,
        pub event_type: String,
        pub changes: serde_json::Value,
        pub belongs_to_user: Option<String>,
        pub belongs_to_household: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

macro_rules! audit_window {
    () => {
        concat!(
            "audit_log_entries.created_at > COALESCE($1, NOW() - interval '999 years')",
            " AND audit_log_entries.created_at < COALESCE($2, NOW() + interval '999 years')"
        )
    };
}

macro_rules! audit_list {
    ($owner:literal) => {
        concat!(
            "SELECT ", audit_log_entry_columns!("audit_log_entries", ""), ", ",
            "(SELECT COUNT(audit_log_entries.id) FROM audit_log_entries WHERE ",
            $owner, " AND ", audit_window!(), ") AS filtered_count, ",
            "(SELECT COUNT(audit_log_entries.id) FROM audit_log_entries WHERE ",
            $owner, ") AS total_count",
            " FROM audit_log_entries WHERE ", $owner, " AND ", audit_window!(),
            " ORDER BY audit_log_entries.created_at, audit_log_entries.id",
            " OFFSET $3 LIMIT $4"
        )
    };
}

pub const GET_AUDIT_LOG_ENTRY: &str = concat!(
    "SELECT ", audit_log_entry_columns!("audit_log_entries", ""),
    " FROM audit_log_entries WHERE audit_log_entries.id = $1"
);

pub const GET_AUDIT_LOG_ENTRIES_FOR_USER: &str =
    audit_list!("audit_log_entries.belongs_to_user = $5");

pub const GET_AUDIT_LOG_ENTRIES_FOR_USER_AND_RESOURCE_TYPES: &str = audit_list!(
    "audit_log_entries.belongs_to_user = $5 AND audit_log_entries.resource_type = ANY($6::text[])"
);

pub const GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD: &str =
    audit_list!("audit_log_entries.belongs_to_household = $5");

pub const GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD_AND_RESOURCE_TYPES: &str = audit_list!(
    "audit_log_entries.belongs_to_household = $5 AND audit_log_entries.resource_type = ANY($6::text[])"
);

pub const CREATE_AUDIT_LOG_ENTRY: &str = "INSERT INTO audit_log_entries (
    id, resource_type, relevant_id, event_type, changes, belongs_to_user,
    belongs_to_household, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

fn audit_list_query<'q>(sql: &'q str, filter: &QueryFilter) -> Query<'q, Postgres, PgArguments> {
    sqlx::query(sql)
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(i64::from(filter.query_offset()))
        .bind(i64::from(filter.query_limit()))
}

pub async fn get_audit_log_entry<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<AuditLogEntryRow>> {
    fetch_optional(sqlx::query(GET_AUDIT_LOG_ENTRY).bind(id), exec).await
}

pub async fn get_audit_log_entries_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<AuditLogEntryRow>>> {
    fetch_all(
        audit_list_query(GET_AUDIT_LOG_ENTRIES_FOR_USER, filter).bind(user_id),
        exec,
    )
    .await
}

pub async fn get_audit_log_entries_for_user_and_resource_types<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
    resource_types: &[String],
) -> DbResult<Vec<Counted<AuditLogEntryRow>>> {
    let query = audit_list_query(GET_AUDIT_LOG_ENTRIES_FOR_USER_AND_RESOURCE_TYPES, filter)
        .bind(user_id)
        .bind(resource_types);
    fetch_all(query, exec).await
}

pub async fn get_audit_log_entries_for_household<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
) -> DbResult<Vec<Counted<AuditLogEntryRow>>> {
    fetch_all(
        audit_list_query(GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD, filter).bind(household_id),
        exec,
    )
    .await
}

pub async fn get_audit_log_entries_for_household_and_resource_types<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
    resource_types: &[String],
) -> DbResult<Vec<Counted<AuditLogEntryRow>>> {
    let query = audit_list_query(GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD_AND_RESOURCE_TYPES, filter)
        .bind(household_id)
        .bind(resource_types);
    fetch_all(query, exec).await
}

pub async fn create_audit_log_entry<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &AuditLogEntryRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_AUDIT_LOG_ENTRY)
        .bind(&row.id)
        .bind(&row.resource_type)
        .bind(&row.relevant_id)
        .bind(&row.event_type)
        .bind(&row.changes)
        .bind(&row.belongs_to_user)
        .bind(&row.belongs_to_household)
        .bind(row.created_at);
    execute(query, exec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_types_bind_as_text_array() {
        for sql in [
            GET_AUDIT_LOG_ENTRIES_FOR_USER_AND_RESOURCE_TYPES,
            GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD_AND_RESOURCE_TYPES,
        ] {
            assert_eq!(sql.matches("ANY($6::text[])").count(), 3);
        }
    }

    #[test]
    fn test_lists_page_after_the_created_window() {
        for sql in [GET_AUDIT_LOG_ENTRIES_FOR_USER, GET_AUDIT_LOG_ENTRIES_FOR_HOUSEHOLD] {
            assert_eq!(sql.matches("COALESCE($1,").count(), 2);
            assert!(sql.ends_with("OFFSET $3 LIMIT $4"));
            assert!(!sql.contains("$6"));
        }
    }
}
