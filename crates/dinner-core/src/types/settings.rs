//! Service settings and per-user / per-household configurations of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

string_enum! {
    /// Which scope a setting is configured at.
    #[derive(Default)]
    SettingType as "setting type" {
        #[default]
        User => "user",
        Household => "household",
        Membership => "membership",
    }
}

/// A named, typed knob the service understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSetting {
    pub id: String,
    pub name: String,
    pub setting_type: SettingType,
    pub description: String,
    pub default_value: Option<String>,
    /// Allowed values; empty means free-form.
    pub enumeration: Vec<String>,
    pub admins_only: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettingDatabaseCreationInput {
    pub name: String,
    pub setting_type: SettingType,
    pub description: String,
    pub default_value: Option<String>,
    pub enumeration: Vec<String>,
    pub admins_only: bool,
}

impl ServiceSettingDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        if let Some(default) = &self.default_value {
            if !self.enumeration.is_empty() && !self.enumeration.contains(default) {
                return Err(ValidationError::unknown_value("default_value", default.clone()));
            }
        }
        Ok(())
    }
}

/// A chosen value for a service setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettingConfiguration {
    pub id: String,
    pub value: String,
    pub notes: String,
    pub service_setting: ServiceSetting,
    pub belongs_to_user: String,
    pub belongs_to_household: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettingConfigurationDatabaseCreationInput {
    pub value: String,
    pub notes: String,
    pub service_setting_id: String,
    pub belongs_to_user: String,
    pub belongs_to_household: String,
}

impl ServiceSettingConfigurationDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_setting_id.is_empty() {
            return Err(ValidationError::required("service_setting_id"));
        }
        if self.belongs_to_user.is_empty() {
            return Err(ValidationError::required("belongs_to_user"));
        }
        if self.belongs_to_household.is_empty() {
            return Err(ValidationError::required("belongs_to_household"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_must_be_enumerated() {
        let input = ServiceSettingDatabaseCreationInput {
            name: "preferred_units".to_string(),
            setting_type: SettingType::User,
            description: String::new(),
            default_value: Some("furlongs".to_string()),
            enumeration: vec!["metric".to_string(), "imperial".to_string()],
            admins_only: false,
        };
        assert!(input.validate().is_err());
    }
}
