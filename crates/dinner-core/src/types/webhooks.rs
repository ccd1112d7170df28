//! Household-owned webhooks. Delivery happens elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    /// Event names the webhook fires on.
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub belongs_to_household: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookDatabaseCreationInput {
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub belongs_to_household: String,
}

impl WebhookDatabaseCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::required("url"));
        }
        if self.events.is_empty() {
            return Err(ValidationError::Empty {
                field: "events".to_string(),
            });
        }
        Ok(())
    }
}
