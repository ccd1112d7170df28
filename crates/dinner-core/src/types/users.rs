//! Users and their account state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role granted to ordinary accounts.
pub const DEFAULT_SERVICE_ROLE: &str = "service_user";

/// Status of a freshly registered account.
pub const UNVERIFIED_ACCOUNT_STATUS: &str = "unverified";

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Unique across all users, archived or not.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub email_address_verified_at: Option<DateTime<Utc>>,
    pub avatar_src: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub password_last_changed_at: Option<DateTime<Utc>>,
    pub requires_password_change: bool,
    #[serde(skip_serializing)]
    pub two_factor_secret: String,
    pub two_factor_secret_verified_at: Option<DateTime<Utc>>,
    pub service_role: String,
    pub account_status: String,
    pub account_status_explanation: String,
    pub last_accepted_terms_of_service: Option<DateTime<Utc>>,
    pub last_accepted_privacy_policy: Option<DateTime<Utc>>,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Everything needed to register a user.
///
/// Creating a user also creates their default household; when
/// `household_name` is `None` it is derived from the username.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDatabaseCreationInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub hashed_password: String,
    pub two_factor_secret: String,
    pub avatar_src: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub household_name: Option<String>,
}

impl UserDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::required("username"));
        }
        if self.email_address.trim().is_empty() {
            return Err(ValidationError::required("email_address"));
        }
        if self.hashed_password.is_empty() {
            return Err(ValidationError::required("hashed_password"));
        }
        Ok(())
    }

    /// Name given to the household created alongside the user.
    pub fn default_household_name(&self) -> String {
        self.household_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{}'s cool household", self.username))
    }
}

/// Mutable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetailsDatabaseUpdateInput {
    pub first_name: String,
    pub last_name: String,
    pub birthday: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_household_name() {
        let mut input = UserDatabaseCreationInput {
            username: "chef".to_string(),
            ..Default::default()
        };
        assert_eq!(input.default_household_name(), "chef's cool household");

        input.household_name = Some("The Kitchen".to_string());
        assert_eq!(input.default_household_name(), "The Kitchen");

        input.household_name = Some("   ".to_string());
        assert_eq!(input.default_household_name(), "chef's cool household");
    }

    #[test]
    fn test_creation_input_requires_username() {
        let input = UserDatabaseCreationInput {
            email_address: "chef@example.com".to_string(),
            hashed_password: "hashed".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::required("username")));
    }
}
