//! Households, memberships and invitations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::users::User;

/// Role of the user who created (or defaults into) a household.
pub const HOUSEHOLD_ADMIN_ROLE: &str = "household_admin";

/// Role of everyone else.
pub const HOUSEHOLD_MEMBER_ROLE: &str = "household_member";

/// How long an invitation stays acceptable.
pub const DEFAULT_INVITATION_LIFETIME_DAYS: i64 = 7;

/// Billing status of a newly created household.
pub const DEFAULT_BILLING_STATUS: &str = "unpaid";

// =============================================================================
// Household
// =============================================================================

/// A group of users sharing meal plans, webhooks and equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Household {
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
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// The user who created the household.
    pub belongs_to_user: String,
    pub members: Vec<HouseholdUserMembershipWithUser>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdDatabaseCreationInput {
    pub name: String,
    pub contact_phone: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub belongs_to_user: String,
}

impl HouseholdDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("name"));
        }
        Ok(())
    }
}

// =============================================================================
// Memberships
// =============================================================================

/// Links a user to a household with a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdUserMembership {
    pub id: String,
    pub belongs_to_household: String,
    pub belongs_to_user: String,
    pub household_role: String,
    pub default_household: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// A membership with the member's account attached, as listed on a household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdUserMembershipWithUser {
    pub id: String,
    pub belongs_to_household: String,
    pub belongs_to_user: User,
    pub household_role: String,
    pub default_household: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HouseholdUserMembershipDatabaseCreationInput {
    pub household_id: String,
    pub user_id: String,
    pub household_role: String,
}

// =============================================================================
// Invitations
// =============================================================================

string_enum! {
    /// Lifecycle of a household invitation. Only `Pending` is not terminal.
    InvitationState as "invitation state" {
        Pending => "pending",
        Cancelled => "cancelled",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

impl InvitationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationState::Pending)
    }
}

/// An invitation for someone (maybe not yet a user) to join a household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdInvitation {
    pub id: String,
    pub destination_household: Household,
    pub from_user: String,
    pub to_user: Option<String>,
    pub to_name: String,
    pub to_email: String,
    pub note: String,
    pub status: InvitationState,
    pub status_note: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdInvitationDatabaseCreationInput {
    pub destination_household_id: String,
    pub from_user: String,
    pub to_user: Option<String>,
    pub to_name: String,
    pub to_email: String,
    pub note: String,
    /// Defaults to seven days after creation.
    pub expires_at: Option<DateTime<Utc>>,
}

impl HouseholdInvitationDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.to_email.trim().is_empty() {
            return Err(ValidationError::required("to_email"));
        }
        Ok(())
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .unwrap_or_else(|| now + Duration::days(DEFAULT_INVITATION_LIFETIME_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_expiry_defaults_to_a_week() {
        let now = Utc::now();
        let input = HouseholdInvitationDatabaseCreationInput {
            destination_household_id: "h".to_string(),
            from_user: "u".to_string(),
            to_user: None,
            to_name: String::new(),
            to_email: "friend@example.com".to_string(),
            note: String::new(),
            expires_at: None,
        };
        assert_eq!(input.expiry_from(now), now + Duration::days(7));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!InvitationState::Pending.is_terminal());
        assert!(InvitationState::Accepted.is_terminal());
        assert!(InvitationState::Cancelled.is_terminal());
    }
}
