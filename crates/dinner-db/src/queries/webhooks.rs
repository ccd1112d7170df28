//! Household webhooks.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use sqlx::PgExecutor;

use crate::error::DbResult;
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

table_row! {
    pub struct WebhookRow {
        pub id: String,
        pub name: String,
        pub content_type: String,
        pub url: String,
        pub method: String,
        pub events: Vec<String>,
        pub data_types: Vec<String>,
        pub belongs_to_household: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `$1` household, `$2` webhook.
pub const WEBHOOK_EXISTS: &str = "SELECT EXISTS (
    SELECT webhooks.id FROM webhooks
    WHERE webhooks.archived_at IS NULL
    AND webhooks.belongs_to_household = $1
    AND webhooks.id = $2
)";

pub const GET_WEBHOOK: &str = concat!(
    "SELECT ", webhook_columns!("webhooks", ""),
    " FROM webhooks WHERE webhooks.archived_at IS NULL",
    " AND webhooks.belongs_to_household = $1 AND webhooks.id = $2"
);

pub const GET_WEBHOOKS_FOR_HOUSEHOLD: &str = concat!(
    "SELECT ", webhook_columns!("webhooks", ""), ", ",
    list_counts!("webhooks", "webhooks.belongs_to_household = $8"),
    " FROM webhooks",
    list_where!("webhooks", "webhooks.belongs_to_household = $8")
);

pub const CREATE_WEBHOOK: &str = "INSERT INTO webhooks (
    id, name, content_type, url, method, events, data_types, belongs_to_household, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

pub const ARCHIVE_WEBHOOK: &str = "UPDATE webhooks SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_household = $1 AND id = $2";

pub async fn webhook_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    webhook_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(WEBHOOK_EXISTS).bind(household_id).bind(webhook_id),
        exec,
    )
    .await
}

pub async fn get_webhook<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    webhook_id: &str,
) -> DbResult<Option<WebhookRow>> {
    fetch_optional(
        sqlx::query(GET_WEBHOOK).bind(household_id).bind(webhook_id),
        exec,
    )
    .await
}

pub async fn get_webhooks_for_household<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
) -> DbResult<Vec<Counted<WebhookRow>>> {
    fetch_all(
        list_query(GET_WEBHOOKS_FOR_HOUSEHOLD, filter).bind(household_id),
        exec,
    )
    .await
}

pub async fn create_webhook<'e, E: PgExecutor<'e>>(exec: E, row: &WebhookRow) -> DbResult<u64> {
    let query = sqlx::query(CREATE_WEBHOOK)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.content_type)
        .bind(&row.url)
        .bind(&row.method)
        .bind(&row.events)
        .bind(&row.data_types)
        .bind(&row.belongs_to_household)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn archive_webhook<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    webhook_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_WEBHOOK).bind(household_id).bind(webhook_id),
        exec,
    )
    .await
}

pub const LIST_QUERIES: &[ListQuery] = &[ListQuery {
    name: "get_webhooks_for_household",
    sql: GET_WEBHOOKS_FOR_HOUSEHOLD,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhooks_are_scoped_to_their_household() {
        for sql in [WEBHOOK_EXISTS, GET_WEBHOOK, ARCHIVE_WEBHOOK] {
            assert!(sql.contains("belongs_to_household = $1"));
        }
    }
}
