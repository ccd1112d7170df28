//! Service settings and their configurations.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use sqlx::PgExecutor;

use crate::error::DbResult;
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

table_row! {
    pub struct ServiceSettingRow joined as "service_setting_" {
        pub id: String,
        pub name: String,
        pub setting_type: String,
        pub description: String,
        pub default_value: Option<String>,
        pub enumeration: Vec<String>,
        pub admins_only: bool,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

table_row! {
    pub struct ServiceSettingConfigurationRow {
        pub id: String,
        pub value: String,
        pub notes: String,
        pub service_setting_id: String,
        pub belongs_to_user: String,
        pub belongs_to_household: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// A configuration and the setting it configures.
///
/// `service_setting_id` is selected under both sides; the join keeps the
/// two values equal.
pub type ServiceSettingConfigurationWithSettingRow =
    (ServiceSettingConfigurationRow, ServiceSettingRow);

// =============================================================================
// Settings
// =============================================================================

pub const SERVICE_SETTING_EXISTS: &str = exists_by_id!("service_settings");

pub const GET_SERVICE_SETTING: &str = concat!(
    "SELECT ", service_setting_columns!("service_settings", ""),
    " FROM service_settings WHERE service_settings.archived_at IS NULL AND service_settings.id = $1"
);

pub const GET_SERVICE_SETTINGS: &str = concat!(
    "SELECT ", service_setting_columns!("service_settings", ""), ", ",
    list_counts!("service_settings", "TRUE"),
    " FROM service_settings",
    list_where!("service_settings", "TRUE")
);

pub const SEARCH_FOR_SERVICE_SETTINGS: &str = concat!(
    "SELECT ", service_setting_columns!("service_settings", ""),
    " FROM service_settings WHERE service_settings.archived_at IS NULL",
    " AND service_settings.name ILIKE '%' || $1 || '%'",
    " ORDER BY service_settings.name, service_settings.id LIMIT $2"
);

pub const CREATE_SERVICE_SETTING: &str = "INSERT INTO service_settings (
    id, name, setting_type, description, default_value, enumeration, admins_only, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const ARCHIVE_SERVICE_SETTING: &str = archive_by_id!("service_settings");

pub async fn service_setting_exists<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<bool> {
    fetch_exists(sqlx::query(SERVICE_SETTING_EXISTS).bind(id), exec).await
}

pub async fn get_service_setting<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ServiceSettingRow>> {
    fetch_optional(sqlx::query(GET_SERVICE_SETTING).bind(id), exec).await
}

pub async fn get_service_settings<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
) -> DbResult<Vec<Counted<ServiceSettingRow>>> {
    fetch_all(list_query(GET_SERVICE_SETTINGS, filter), exec).await
}

pub async fn search_for_service_settings<'e, E: PgExecutor<'e>>(
    exec: E,
    name: &str,
    limit: i64,
) -> DbResult<Vec<ServiceSettingRow>> {
    fetch_all(
        sqlx::query(SEARCH_FOR_SERVICE_SETTINGS).bind(name).bind(limit),
        exec,
    )
    .await
}

pub async fn create_service_setting<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ServiceSettingRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_SERVICE_SETTING)
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.setting_type)
        .bind(&row.description)
        .bind(&row.default_value)
        .bind(&row.enumeration)
        .bind(row.admins_only)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn archive_service_setting<'e, E: PgExecutor<'e>>(exec: E, id: &str) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_SERVICE_SETTING).bind(id), exec).await
}

// =============================================================================
// Configurations
// =============================================================================

pub const SERVICE_SETTING_CONFIGURATION_EXISTS: &str =
    exists_by_id!("service_setting_configurations");

macro_rules! configuration_select {
    () => {
        concat!(
            "SELECT ",
            service_setting_configuration_columns!("service_setting_configurations", ""), ", ",
            service_setting_columns!("service_settings", "service_setting_"),
            " FROM service_setting_configurations",
            " JOIN service_settings ON service_settings.id = service_setting_configurations.service_setting_id"
        )
    };
}

pub const GET_SERVICE_SETTING_CONFIGURATION: &str = concat!(
    configuration_select!(),
    " WHERE service_setting_configurations.archived_at IS NULL",
    " AND service_settings.archived_at IS NULL",
    " AND service_setting_configurations.id = $1"
);

pub const GET_SERVICE_SETTING_CONFIGURATION_FOR_USER_BY_SETTING_NAME: &str = concat!(
    configuration_select!(),
    " WHERE service_setting_configurations.archived_at IS NULL",
    " AND service_settings.archived_at IS NULL",
    " AND service_settings.name = $1",
    " AND service_setting_configurations.belongs_to_user = $2",
    " ORDER BY service_setting_configurations.created_at, service_setting_configurations.id",
    " LIMIT 1"
);

pub const GET_SERVICE_SETTING_CONFIGURATION_FOR_HOUSEHOLD_BY_SETTING_NAME: &str = concat!(
    configuration_select!(),
    " WHERE service_setting_configurations.archived_at IS NULL",
    " AND service_settings.archived_at IS NULL",
    " AND service_settings.name = $1",
    " AND service_setting_configurations.belongs_to_household = $2",
    " ORDER BY service_setting_configurations.created_at, service_setting_configurations.id",
    " LIMIT 1"
);

pub const GET_SERVICE_SETTING_CONFIGURATIONS_FOR_USER: &str = concat!(
    "SELECT ",
    service_setting_configuration_columns!("service_setting_configurations", ""), ", ",
    service_setting_columns!("service_settings", "service_setting_"), ", ",
    list_counts!(
        "service_setting_configurations",
        "service_setting_configurations.belongs_to_user = $8"
    ),
    " FROM service_setting_configurations",
    " JOIN service_settings ON service_settings.id = service_setting_configurations.service_setting_id",
    list_where!(
        "service_setting_configurations",
        "service_setting_configurations.belongs_to_user = $8"
    )
);

pub const GET_SERVICE_SETTING_CONFIGURATIONS_FOR_HOUSEHOLD: &str = concat!(
    "SELECT ",
    service_setting_configuration_columns!("service_setting_configurations", ""), ", ",
    service_setting_columns!("service_settings", "service_setting_"), ", ",
    list_counts!(
        "service_setting_configurations",
        "service_setting_configurations.belongs_to_household = $8"
    ),
    " FROM service_setting_configurations",
    " JOIN service_settings ON service_settings.id = service_setting_configurations.service_setting_id",
    list_where!(
        "service_setting_configurations",
        "service_setting_configurations.belongs_to_household = $8"
    )
);

pub const CREATE_SERVICE_SETTING_CONFIGURATION: &str = "INSERT INTO service_setting_configurations (
    id, value, notes, service_setting_id, belongs_to_user, belongs_to_household, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_SERVICE_SETTING_CONFIGURATION: &str = "UPDATE service_setting_configurations SET
    value = $2, notes = $3, last_updated_at = GREATEST($4, created_at)
WHERE archived_at IS NULL AND id = $1";

pub const ARCHIVE_SERVICE_SETTING_CONFIGURATION: &str =
    archive_by_id!("service_setting_configurations");

pub async fn service_setting_configuration_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<bool> {
    fetch_exists(sqlx::query(SERVICE_SETTING_CONFIGURATION_EXISTS).bind(id), exec).await
}

pub async fn get_service_setting_configuration<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<Option<ServiceSettingConfigurationWithSettingRow>> {
    fetch_optional(sqlx::query(GET_SERVICE_SETTING_CONFIGURATION).bind(id), exec).await
}

pub async fn get_service_setting_configuration_for_user_by_setting_name<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    setting_name: &str,
) -> DbResult<Option<ServiceSettingConfigurationWithSettingRow>> {
    let query = sqlx::query(GET_SERVICE_SETTING_CONFIGURATION_FOR_USER_BY_SETTING_NAME)
        .bind(setting_name)
        .bind(user_id);
    fetch_optional(query, exec).await
}

pub async fn get_service_setting_configuration_for_household_by_setting_name<
    'e,
    E: PgExecutor<'e>,
>(
    exec: E,
    household_id: &str,
    setting_name: &str,
) -> DbResult<Option<ServiceSettingConfigurationWithSettingRow>> {
    let query = sqlx::query(GET_SERVICE_SETTING_CONFIGURATION_FOR_HOUSEHOLD_BY_SETTING_NAME)
        .bind(setting_name)
        .bind(household_id);
    fetch_optional(query, exec).await
}

pub async fn get_service_setting_configurations_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<ServiceSettingConfigurationWithSettingRow>>> {
    fetch_all(
        list_query(GET_SERVICE_SETTING_CONFIGURATIONS_FOR_USER, filter).bind(user_id),
        exec,
    )
    .await
}

pub async fn get_service_setting_configurations_for_household<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
) -> DbResult<Vec<Counted<ServiceSettingConfigurationWithSettingRow>>> {
    fetch_all(
        list_query(GET_SERVICE_SETTING_CONFIGURATIONS_FOR_HOUSEHOLD, filter).bind(household_id),
        exec,
    )
    .await
}

pub async fn create_service_setting_configuration<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ServiceSettingConfigurationRow,
) -> DbResult<u64> {
    let query = sqlx::query(CREATE_SERVICE_SETTING_CONFIGURATION)
        .bind(&row.id)
        .bind(&row.value)
        .bind(&row.notes)
        .bind(&row.service_setting_id)
        .bind(&row.belongs_to_user)
        .bind(&row.belongs_to_household)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_service_setting_configuration<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &ServiceSettingConfigurationRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_SERVICE_SETTING_CONFIGURATION)
        .bind(&row.id)
        .bind(&row.value)
        .bind(&row.notes)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_service_setting_configuration<'e, E: PgExecutor<'e>>(
    exec: E,
    id: &str,
) -> DbResult<u64> {
    execute(sqlx::query(ARCHIVE_SERVICE_SETTING_CONFIGURATION).bind(id), exec).await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_service_settings", sql: GET_SERVICE_SETTINGS },
    ListQuery {
        name: "get_service_setting_configurations_for_user",
        sql: GET_SERVICE_SETTING_CONFIGURATIONS_FOR_USER,
    },
    ListQuery {
        name: "get_service_setting_configurations_for_household",
        sql: GET_SERVICE_SETTING_CONFIGURATIONS_FOR_HOUSEHOLD,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configurations_carry_their_setting() {
        for sql in [
            GET_SERVICE_SETTING_CONFIGURATION,
            GET_SERVICE_SETTING_CONFIGURATIONS_FOR_USER,
            GET_SERVICE_SETTING_CONFIGURATION_FOR_HOUSEHOLD_BY_SETTING_NAME,
        ] {
            assert!(sql.contains("service_settings.id AS service_setting_id"));
            assert!(sql.contains("JOIN service_settings ON"));
        }
    }
}
