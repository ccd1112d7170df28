//! # Audit Log Repository
//!
//! Append-only record of who changed what. Entries are never updated or
//! archived; other families write them inside their own transactions via
//! [`Querier::write_audit_log_entry`].

use dinner_core::{AuditLogEntry, AuditLogEntryDatabaseCreationInput, QueryFilter, QueryFilteredResult};
use sqlx::PgExecutor;
use tracing::{debug, instrument};

use crate::codec::parse_enum;
use crate::error::{require_id, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::audit_log_entries::{self as q, AuditLogEntryRow};
use crate::repository::{filter_or_default, into_filtered_result};

pub(crate) fn audit_log_entry_from_row(row: AuditLogEntryRow) -> DbResult<AuditLogEntry> {
    let changes = serde_json::from_value(row.changes.clone())
        .map_err(|err| DbError::integrity("changes", &row.changes, err.to_string()))?;

    Ok(AuditLogEntry {
        event_type: parse_enum("event_type", &row.event_type)?,
        id: row.id,
        resource_type: row.resource_type,
        relevant_id: row.relevant_id,
        changes,
        belongs_to_user: row.belongs_to_user,
        belongs_to_household: row.belongs_to_household,
        created_at: row.created_at,
    })
}

impl Querier {
    /// Inserts an audit entry with any executor, typically an open
    /// transaction.
    pub(crate) async fn write_audit_log_entry<'e, E: PgExecutor<'e>>(
        &self,
        exec: E,
        input: AuditLogEntryDatabaseCreationInput,
    ) -> DbResult<AuditLogEntry> {
        let changes = serde_json::to_value(&input.changes)
            .map_err(|err| DbError::Internal(format!("encoding audit changes: {err}")))?;

        let row = AuditLogEntryRow {
            id: self.new_id(),
            resource_type: input.resource_type,
            relevant_id: input.relevant_id,
            event_type: input.event_type.as_str().to_string(),
            changes,
            belongs_to_user: input.belongs_to_user,
            belongs_to_household: input.belongs_to_household,
            created_at: self.now(),
        };
        q::create_audit_log_entry(exec, &row).await?;

        debug!(
            id = %row.id,
            resource_type = %row.resource_type,
            relevant_id = %row.relevant_id,
            "Recorded audit log entry"
        );
        audit_log_entry_from_row(row)
    }

    #[instrument(skip(self))]
    pub async fn get_audit_log_entry(&self, audit_log_entry_id: &str) -> DbResult<AuditLogEntry> {
        require_id(audit_log_entry_id)?;

        let row = q::get_audit_log_entry(self.pool(), audit_log_entry_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map_err(|err| prepare_error(err, "fetching audit log entry"))?;

        audit_log_entry_from_row(row).map_err(|err| prepare_error(err, "decoding audit log entry"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_audit_log_entries_for_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<AuditLogEntry>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_audit_log_entries_for_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, audit_log_entry_from_row))
            .map_err(|err| prepare_error(err, "fetching audit log entries for user"))
    }

    /// Entries for a user restricted to the given resource types.
    #[instrument(skip(self, filter))]
    pub async fn get_audit_log_entries_for_user_and_resource_types(
        &self,
        user_id: &str,
        resource_types: &[String],
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<AuditLogEntry>> {
        require_id(user_id)?;
        if resource_types.is_empty() {
            return Err(DbError::NilInput);
        }
        let filter = filter_or_default(filter);

        q::get_audit_log_entries_for_user_and_resource_types(
            self.pool(),
            &filter,
            user_id,
            resource_types,
        )
        .await
        .and_then(|rows| into_filtered_result(rows, &filter, audit_log_entry_from_row))
        .map_err(|err| prepare_error(err, "fetching audit log entries for user and resource types"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_audit_log_entries_for_household(
        &self,
        household_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<AuditLogEntry>> {
        require_id(household_id)?;
        let filter = filter_or_default(filter);

        q::get_audit_log_entries_for_household(self.pool(), &filter, household_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, audit_log_entry_from_row))
            .map_err(|err| prepare_error(err, "fetching audit log entries for household"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_audit_log_entries_for_household_and_resource_types(
        &self,
        household_id: &str,
        resource_types: &[String],
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<AuditLogEntry>> {
        require_id(household_id)?;
        if resource_types.is_empty() {
            return Err(DbError::NilInput);
        }
        let filter = filter_or_default(filter);

        q::get_audit_log_entries_for_household_and_resource_types(
            self.pool(),
            &filter,
            household_id,
            resource_types,
        )
        .await
        .and_then(|rows| into_filtered_result(rows, &filter, audit_log_entry_from_row))
        .map_err(|err| {
            prepare_error(err, "fetching audit log entries for household and resource types")
        })
    }

    /// Records a standalone audit entry.
    #[instrument(skip(self, input), fields(resource_type = %input.resource_type))]
    pub async fn create_audit_log_entry(
        &self,
        input: &AuditLogEntryDatabaseCreationInput,
    ) -> DbResult<AuditLogEntry> {
        require_id(&input.relevant_id)?;

        self.write_audit_log_entry(self.pool(), input.clone())
            .await
            .map_err(|err| prepare_error(err, "creating audit log entry"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::AuditLogEntryEventType;
    use serde_json::json;

    fn row(changes: serde_json::Value) -> AuditLogEntryRow {
        AuditLogEntryRow {
            id: "entry".to_string(),
            resource_type: "webhooks".to_string(),
            relevant_id: "webhook".to_string(),
            event_type: "updated".to_string(),
            changes,
            belongs_to_user: None,
            belongs_to_household: Some("household".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_changes_decode_from_json() {
        let entry = audit_log_entry_from_row(row(json!({
            "name": { "old_value": "a", "new_value": "b" }
        })))
        .unwrap();

        assert_eq!(entry.event_type, AuditLogEntryEventType::Updated);
        assert_eq!(entry.changes["name"].new_value, "b");
    }

    #[test]
    fn test_malformed_changes_are_integrity_errors() {
        let err = audit_log_entry_from_row(row(json!(["not", "a", "map"]))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }
}
