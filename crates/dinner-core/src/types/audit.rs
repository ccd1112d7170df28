//! Append-only audit log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERS_RESOURCE_TYPE: &str = "users";
pub const HOUSEHOLDS_RESOURCE_TYPE: &str = "households";
pub const HOUSEHOLD_USER_MEMBERSHIPS_RESOURCE_TYPE: &str = "household_user_memberships";
pub const HOUSEHOLD_INVITATIONS_RESOURCE_TYPE: &str = "household_invitations";
pub const WEBHOOKS_RESOURCE_TYPE: &str = "webhooks";
pub const SERVICE_SETTING_CONFIGURATIONS_RESOURCE_TYPE: &str = "service_setting_configurations";

string_enum! {
    AuditLogEntryEventType as "audit log event type" {
        Created => "created",
        Updated => "updated",
        Archived => "archived",
        Other => "other",
    }
}

/// Before/after values of one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeLog {
    pub old_value: String,
    pub new_value: String,
}

/// A record of something that happened to a resource. Never updated or
/// archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub resource_type: String,
    pub relevant_id: String,
    pub event_type: AuditLogEntryEventType,
    pub changes: BTreeMap<String, ChangeLog>,
    pub belongs_to_user: Option<String>,
    pub belongs_to_household: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntryDatabaseCreationInput {
    pub resource_type: String,
    pub relevant_id: String,
    pub event_type: AuditLogEntryEventType,
    pub changes: BTreeMap<String, ChangeLog>,
    pub belongs_to_user: Option<String>,
    pub belongs_to_household: Option<String>,
}

impl AuditLogEntryDatabaseCreationInput {
    /// An entry with no recorded field changes.
    pub fn new(
        resource_type: &str,
        relevant_id: impl Into<String>,
        event_type: AuditLogEntryEventType,
    ) -> Self {
        AuditLogEntryDatabaseCreationInput {
            resource_type: resource_type.to_string(),
            relevant_id: relevant_id.into(),
            event_type,
            changes: BTreeMap::new(),
            belongs_to_user: None,
            belongs_to_household: None,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.belongs_to_user = Some(user_id.into());
        self
    }

    pub fn for_household(mut self, household_id: impl Into<String>) -> Self {
        self.belongs_to_household = Some(household_id.into());
        self
    }

    /// Records a changed field.
    pub fn change(
        mut self,
        field: &str,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        self.changes.insert(
            field.to_string(),
            ChangeLog {
                old_value: old_value.into(),
                new_value: new_value.into(),
            },
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let entry = AuditLogEntryDatabaseCreationInput::new(
            USERS_RESOURCE_TYPE,
            "user-1",
            AuditLogEntryEventType::Updated,
        )
        .for_user("user-1")
        .change("username", "old", "new");

        assert_eq!(entry.belongs_to_user.as_deref(), Some("user-1"));
        assert_eq!(entry.belongs_to_household, None);
        assert_eq!(entry.changes["username"].new_value, "new");
    }
}
