//! # Webhook Repository
//!
//! Household webhooks. Delivery happens elsewhere; this only stores them.

use dinner_core::{
    AuditLogEntryDatabaseCreationInput, AuditLogEntryEventType, QueryFilter, QueryFilteredResult,
    ValidationError, Webhook, WebhookDatabaseCreationInput, WEBHOOKS_RESOURCE_TYPE,
};
use tracing::{info, instrument};
use url::Url;

use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::webhooks::{self as q, WebhookRow};
use crate::repository::{filter_or_default, into_filtered_result};

pub(crate) fn webhook_from_row(row: WebhookRow) -> Webhook {
    Webhook {
        id: row.id,
        name: row.name,
        content_type: row.content_type,
        url: row.url,
        method: row.method,
        events: row.events,
        data_types: row.data_types,
        belongs_to_household: row.belongs_to_household,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

/// Rejects URLs that would never be deliverable.
fn validate_webhook_url(raw: &str) -> Result<(), ValidationError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::unknown_value("url", raw)),
    }
}

impl Querier {
    #[instrument(skip(self))]
    pub async fn webhook_exists(&self, household_id: &str, webhook_id: &str) -> DbResult<bool> {
        require_ids(&[household_id, webhook_id])?;

        q::webhook_exists(self.pool(), household_id, webhook_id)
            .await
            .map_err(|err| prepare_error(err, "checking webhook existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_webhook(&self, household_id: &str, webhook_id: &str) -> DbResult<Webhook> {
        require_ids(&[household_id, webhook_id])?;

        q::get_webhook(self.pool(), household_id, webhook_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map(webhook_from_row)
            .map_err(|err| prepare_error(err, "fetching webhook"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_webhooks(
        &self,
        household_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<Webhook>> {
        require_id(household_id)?;
        let filter = filter_or_default(filter);

        q::get_webhooks_for_household(self.pool(), &filter, household_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, |row| Ok(webhook_from_row(row))))
            .map_err(|err| prepare_error(err, "fetching webhooks"))
    }

    #[instrument(skip(self, input), fields(household_id = %input.belongs_to_household))]
    pub async fn create_webhook(&self, input: &WebhookDatabaseCreationInput) -> DbResult<Webhook> {
        input.validate()?;
        validate_webhook_url(&input.url)?;
        require_id(&input.belongs_to_household)?;

        let row = WebhookRow {
            id: self.new_id(),
            name: input.name.clone(),
            content_type: input.content_type.clone(),
            url: input.url.clone(),
            method: input.method.clone(),
            events: input.events.clone(),
            data_types: input.data_types.clone(),
            belongs_to_household: input.belongs_to_household.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        let mut tx = self.begin("beginning webhook creation transaction").await?;
        let outcome: DbResult<()> = async {
            q::create_webhook(&mut *tx, &row).await?;
            self.write_audit_log_entry(
                &mut *tx,
                AuditLogEntryDatabaseCreationInput::new(
                    WEBHOOKS_RESOURCE_TYPE,
                    &row.id,
                    AuditLogEntryEventType::Created,
                )
                .for_household(&row.belongs_to_household),
            )
            .await?;
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing webhook creation transaction").await?;
                info!(id = %row.id, name = %row.name, "Created webhook");
                Ok(webhook_from_row(row))
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating webhook"))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn archive_webhook(&self, household_id: &str, webhook_id: &str) -> DbResult<()> {
        require_ids(&[household_id, webhook_id])?;

        let mut tx = self.begin("beginning webhook archive transaction").await?;
        let outcome: DbResult<u64> = async {
            let archived = q::archive_webhook(&mut *tx, household_id, webhook_id).await?;
            if archived > 0 {
                self.write_audit_log_entry(
                    &mut *tx,
                    AuditLogEntryDatabaseCreationInput::new(
                        WEBHOOKS_RESOURCE_TYPE,
                        webhook_id,
                        AuditLogEntryEventType::Archived,
                    )
                    .for_household(household_id),
                )
                .await?;
            }
            Ok(archived)
        }
        .await;

        match outcome {
            Ok(archived) => {
                Querier::commit(tx, "committing webhook archive transaction").await?;
                info!(id = %webhook_id, archived, "Archived webhook");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving webhook"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_urls_must_be_http() {
        assert!(validate_webhook_url("https://example.com/hooks").is_ok());
        assert!(validate_webhook_url("http://localhost:8080").is_ok());
        assert!(validate_webhook_url("ftp://example.com").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }
}
