//! # Service Settings Repository
//!
//! Service settings are global knobs defined by administrators; a
//! configuration is one user's (within one household) choice for a setting.
//! Every configuration mutation is audited in the same transaction.

use dinner_core::{
    AuditLogEntryDatabaseCreationInput, AuditLogEntryEventType, QueryFilter, QueryFilteredResult,
    ServiceSetting, ServiceSettingConfiguration, ServiceSettingConfigurationDatabaseCreationInput,
    ServiceSettingDatabaseCreationInput, SERVICE_SETTING_CONFIGURATIONS_RESOURCE_TYPE,
};
use tracing::{debug, info, instrument};

use crate::codec::parse_enum;
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::service_settings::{
    self as q, ServiceSettingConfigurationRow, ServiceSettingConfigurationWithSettingRow,
    ServiceSettingRow,
};
use crate::repository::{filter_or_default, into_filtered_result, SEARCH_LIMIT};

fn service_setting_from_row(row: ServiceSettingRow) -> DbResult<ServiceSetting> {
    Ok(ServiceSetting {
        setting_type: parse_enum("setting_type", &row.setting_type)?,
        id: row.id,
        name: row.name,
        description: row.description,
        default_value: row.default_value,
        enumeration: row.enumeration,
        admins_only: row.admins_only,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

pub(crate) fn configuration_from_row(
    (row, setting): ServiceSettingConfigurationWithSettingRow,
) -> DbResult<ServiceSettingConfiguration> {
    Ok(ServiceSettingConfiguration {
        service_setting: service_setting_from_row(setting)?,
        id: row.id,
        value: row.value,
        notes: row.notes,
        belongs_to_user: row.belongs_to_user,
        belongs_to_household: row.belongs_to_household,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn configuration_row(configuration: &ServiceSettingConfiguration) -> ServiceSettingConfigurationRow {
    ServiceSettingConfigurationRow {
        id: configuration.id.clone(),
        value: configuration.value.clone(),
        notes: configuration.notes.clone(),
        service_setting_id: configuration.service_setting.id.clone(),
        belongs_to_user: configuration.belongs_to_user.clone(),
        belongs_to_household: configuration.belongs_to_household.clone(),
        created_at: configuration.created_at,
        last_updated_at: configuration.last_updated_at,
        archived_at: configuration.archived_at,
    }
}

fn configuration_audit(
    configuration: &ServiceSettingConfigurationRow,
    event_type: AuditLogEntryEventType,
) -> AuditLogEntryDatabaseCreationInput {
    AuditLogEntryDatabaseCreationInput::new(
        SERVICE_SETTING_CONFIGURATIONS_RESOURCE_TYPE,
        &configuration.id,
        event_type,
    )
    .for_user(&configuration.belongs_to_user)
    .for_household(&configuration.belongs_to_household)
}

// =============================================================================
// Settings
// =============================================================================

impl Querier {
    #[instrument(skip(self))]
    pub async fn service_setting_exists(&self, service_setting_id: &str) -> DbResult<bool> {
        require_id(service_setting_id)?;

        q::service_setting_exists(self.pool(), service_setting_id)
            .await
            .map_err(|err| prepare_error(err, "checking service setting existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_service_setting(&self, service_setting_id: &str) -> DbResult<ServiceSetting> {
        require_id(service_setting_id)?;

        q::get_service_setting(self.pool(), service_setting_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(service_setting_from_row)
            .map_err(|err| prepare_error(err, "fetching service setting"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_service_settings(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ServiceSetting>> {
        let filter = filter_or_default(filter);

        q::get_service_settings(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, service_setting_from_row))
            .map_err(|err| prepare_error(err, "fetching service settings"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_service_settings(&self, query: &str) -> DbResult<Vec<ServiceSetting>> {
        if query.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        q::search_for_service_settings(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(service_setting_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for service settings"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_service_setting(
        &self,
        input: &ServiceSettingDatabaseCreationInput,
    ) -> DbResult<ServiceSetting> {
        input.validate()?;

        let setting = ServiceSetting {
            id: self.new_id(),
            name: input.name.clone(),
            setting_type: input.setting_type,
            description: input.description.clone(),
            default_value: input.default_value.clone(),
            enumeration: input.enumeration.clone(),
            admins_only: input.admins_only,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = ServiceSettingRow {
            id: setting.id.clone(),
            name: setting.name.clone(),
            setting_type: setting.setting_type.as_str().to_string(),
            description: setting.description.clone(),
            default_value: setting.default_value.clone(),
            enumeration: setting.enumeration.clone(),
            admins_only: setting.admins_only,
            created_at: setting.created_at,
            last_updated_at: None,
            archived_at: None,
        };

        q::create_service_setting(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating service setting"))?;

        info!(id = %setting.id, name = %setting.name, "Created service setting");
        Ok(setting)
    }

    #[instrument(skip(self))]
    pub async fn archive_service_setting(&self, service_setting_id: &str) -> DbResult<()> {
        require_id(service_setting_id)?;

        q::archive_service_setting(self.pool(), service_setting_id)
            .await
            .map_err(|err| prepare_error(err, "archiving service setting"))?;

        debug!(id = %service_setting_id, "Archived service setting");
        Ok(())
    }
}

// =============================================================================
// Configurations
// =============================================================================

impl Querier {
    #[instrument(skip(self))]
    pub async fn service_setting_configuration_exists(&self, configuration_id: &str) -> DbResult<bool> {
        require_id(configuration_id)?;

        q::service_setting_configuration_exists(self.pool(), configuration_id)
            .await
            .map_err(|err| prepare_error(err, "checking service setting configuration existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_service_setting_configuration(
        &self,
        configuration_id: &str,
    ) -> DbResult<ServiceSettingConfiguration> {
        require_id(configuration_id)?;

        q::get_service_setting_configuration(self.pool(), configuration_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(configuration_from_row)
            .map_err(|err| prepare_error(err, "fetching service setting configuration"))
    }

    #[instrument(skip(self))]
    pub async fn get_service_setting_configuration_for_user_by_setting_name(
        &self,
        user_id: &str,
        setting_name: &str,
    ) -> DbResult<ServiceSettingConfiguration> {
        require_ids(&[user_id, setting_name])?;

        q::get_service_setting_configuration_for_user_by_setting_name(self.pool(), user_id, setting_name)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(configuration_from_row)
            .map_err(|err| prepare_error(err, "fetching service setting configuration for user"))
    }

    #[instrument(skip(self))]
    pub async fn get_service_setting_configuration_for_household_by_setting_name(
        &self,
        household_id: &str,
        setting_name: &str,
    ) -> DbResult<ServiceSettingConfiguration> {
        require_ids(&[household_id, setting_name])?;

        q::get_service_setting_configuration_for_household_by_setting_name(
            self.pool(),
            household_id,
            setting_name,
        )
        .await
        .and_then(|row| row.ok_or(DbError::NotFound))
        .and_then(configuration_from_row)
        .map_err(|err| prepare_error(err, "fetching service setting configuration for household"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_service_setting_configurations_for_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ServiceSettingConfiguration>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_service_setting_configurations_for_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, configuration_from_row))
            .map_err(|err| prepare_error(err, "fetching service setting configurations for user"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_service_setting_configurations_for_household(
        &self,
        household_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ServiceSettingConfiguration>> {
        require_id(household_id)?;
        let filter = filter_or_default(filter);

        q::get_service_setting_configurations_for_household(self.pool(), &filter, household_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, configuration_from_row))
            .map_err(|err| {
                prepare_error(err, "fetching service setting configurations for household")
            })
    }

    /// Runs one configuration write plus its audit entry in a transaction.
    async fn audited_configuration_write(
        &self,
        description: &str,
        row: &ServiceSettingConfigurationRow,
        event_type: AuditLogEntryEventType,
    ) -> DbResult<()> {
        let mut tx = self.begin(description).await?;
        let outcome: DbResult<()> = async {
            match event_type {
                AuditLogEntryEventType::Created => {
                    q::create_service_setting_configuration(&mut *tx, row).await?;
                }
                AuditLogEntryEventType::Archived => {
                    q::archive_service_setting_configuration(&mut *tx, &row.id).await?;
                }
                AuditLogEntryEventType::Updated | AuditLogEntryEventType::Other => {
                    q::update_service_setting_configuration(&mut *tx, row, self.now()).await?;
                }
            }
            self.write_audit_log_entry(&mut *tx, configuration_audit(row, event_type))
                .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => Querier::commit(tx, description).await,
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, description))
            }
        }
    }

    /// Creates a configuration. The returned setting carries only its ID.
    #[instrument(skip(self, input), fields(service_setting_id = %input.service_setting_id))]
    pub async fn create_service_setting_configuration(
        &self,
        input: &ServiceSettingConfigurationDatabaseCreationInput,
    ) -> DbResult<ServiceSettingConfiguration> {
        input.validate()?;
        require_ids(&[
            &input.service_setting_id,
            &input.belongs_to_user,
            &input.belongs_to_household,
        ])?;

        let configuration = ServiceSettingConfiguration {
            id: self.new_id(),
            value: input.value.clone(),
            notes: input.notes.clone(),
            service_setting: ServiceSetting {
                id: input.service_setting_id.clone(),
                ..Default::default()
            },
            belongs_to_user: input.belongs_to_user.clone(),
            belongs_to_household: input.belongs_to_household.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = configuration_row(&configuration);

        self.audited_configuration_write(
            "creating service setting configuration",
            &row,
            AuditLogEntryEventType::Created,
        )
        .await?;

        info!(id = %configuration.id, "Created service setting configuration");
        Ok(configuration)
    }

    #[instrument(skip(self, configuration), fields(configuration_id = %configuration.id))]
    pub async fn update_service_setting_configuration(
        &self,
        configuration: &ServiceSettingConfiguration,
    ) -> DbResult<()> {
        require_id(&configuration.id)?;
        let row = configuration_row(configuration);

        self.audited_configuration_write(
            "updating service setting configuration",
            &row,
            AuditLogEntryEventType::Updated,
        )
        .await?;

        debug!(id = %configuration.id, "Updated service setting configuration");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_service_setting_configuration(&self, configuration_id: &str) -> DbResult<()> {
        require_id(configuration_id)?;

        // Already archived (or never existed): nothing to audit.
        let configuration = match self.get_service_setting_configuration(configuration_id).await {
            Ok(configuration) => configuration,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };
        let row = configuration_row(&configuration);

        self.audited_configuration_write(
            "archiving service setting configuration",
            &row,
            AuditLogEntryEventType::Archived,
        )
        .await?;

        debug!(id = %configuration_id, "Archived service setting configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::SettingType;

    #[test]
    fn test_configuration_row_keeps_setting_id() {
        let configuration = ServiceSettingConfiguration {
            id: "configuration".to_string(),
            value: "metric".to_string(),
            notes: String::new(),
            service_setting: ServiceSetting {
                id: "setting".to_string(),
                setting_type: SettingType::default(),
                ..Default::default()
            },
            belongs_to_user: "user".to_string(),
            belongs_to_household: "household".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let row = configuration_row(&configuration);
        assert_eq!(row.service_setting_id, "setting");

        let audit = configuration_audit(&row, AuditLogEntryEventType::Updated);
        assert_eq!(audit.relevant_id, "configuration");
        assert_eq!(audit.belongs_to_household.as_deref(), Some("household"));
    }
}
