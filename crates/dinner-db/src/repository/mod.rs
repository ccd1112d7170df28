//! # Repository Module
//!
//! The public contract of the data access core: every method is an
//! `impl Querier` block in one of the family files below.
//!
//! ## Call Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Repository Method                              │
//! │                                                                         │
//! │  querier.get_meal_plan(household_id, meal_plan_id)                     │
//! │       │                                                                 │
//! │       ├── span "get_meal_plan" { household_id, meal_plan_id }          │
//! │       ├── require_ids(..)            ← InvalidId, no SQL               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  queries::meal_plans::get_meal_plan(pool, ..)                          │
//! │       │                                                                 │
//! │       │  MealPlanRow (+ joined rows)                                   │
//! │       ▼                                                                 │
//! │  codec conversions ──► MealPlan { events: [..options: [..votes]] }     │
//! │       │                                                                 │
//! │       └── any failure ──► prepare_error(err, "fetching meal plan")     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregates open a transaction with [`Querier::begin`], pass `&mut *tx`
//! to each statement, and either commit or roll back exactly once.
//!
//! ## Families
//!
//! - [`users`] - Accounts, username search, reindex pair
//! - [`households`] - Households, memberships, invitations
//! - [`audit_log_entries`] - Append-only audit trail
//! - [`service_settings`] - Settings and their per-user configurations
//! - [`webhooks`] - Household webhooks
//! - [`valid_enumerations`] - Ingredients, instruments, units, preparations,
//!   vessels, ingredient states, ingredient groups
//! - [`valid_mappings`] - Pairings between the enumerations, unit conversions
//! - [`recipes`] - Recipes, steps, step children, media, ratings
//! - [`recipe_prep_tasks`] - Work that can start ahead of a recipe
//! - [`meals`] - Meals and components
//! - [`meal_plans`] - Plans, events, options, votes, finalization
//! - [`meal_plan_tasks`] - Prep tasks scheduled for chosen options
//! - [`meal_plan_grocery_list_items`] - What to buy for a finalized plan
//! - [`preferences`] - Ingredient preferences, instrument ownerships
//! - [`data_privacy`] - Full export of one user's data

use std::future::Future;

use dinner_core::filter::MAX_QUERY_FILTER_LIMIT;
use dinner_core::{QueryFilter, QueryFilteredResult};
use tracing::warn;

use crate::error::DbResult;
use crate::queries::Counted;

pub mod audit_log_entries;
pub mod data_privacy;
pub mod households;
pub mod meal_plan_grocery_list_items;
pub mod meal_plan_tasks;
pub mod meal_plans;
pub mod meals;
pub mod preferences;
pub mod recipe_prep_tasks;
pub mod recipe_step_children;
pub mod recipes;
pub mod service_settings;
pub mod users;
pub mod valid_enumerations;
pub mod valid_mappings;
pub mod webhooks;

/// Upper bound on pages [`fetch_all_rows`] will request.
pub const FETCH_ALL_MAX_PAGES: u16 = 1000;

/// Maximum results returned by the `search_for_*` methods.
pub const SEARCH_LIMIT: i64 = 50;

/// Resolves the filter a list method was called with.
pub(crate) fn filter_or_default(filter: Option<&QueryFilter>) -> QueryFilter {
    filter.copied().unwrap_or_default()
}

/// Turns counted list rows into a paged result.
///
/// Both counts are read off the first row; an empty page reports zero.
pub(crate) fn into_filtered_result<R, T>(
    rows: Vec<Counted<R>>,
    filter: &QueryFilter,
    mut convert: impl FnMut(R) -> DbResult<T>,
) -> DbResult<QueryFilteredResult<T>> {
    let mut result = QueryFilteredResult::empty(filter);
    if let Some(first) = rows.first() {
        result.pagination.filtered_count = u64::try_from(first.filtered_count).unwrap_or(0);
        result.pagination.total_count = u64::try_from(first.total_count).unwrap_or(0);
    }

    result.data = rows
        .into_iter()
        .map(|counted| convert(counted.row))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(result)
}

/// Drains a list method page by page.
///
/// Every request asks for the largest legal page. Stops once the
/// accumulated rows reach the reported total, a page comes back empty, or
/// [`FETCH_ALL_MAX_PAGES`] pages have been read.
///
/// ## Example
/// ```rust,ignore
/// let meals = fetch_all_rows(|filter| async move {
///     querier.get_meals_created_by_user(user_id, Some(&filter)).await
/// })
/// .await?;
/// ```
pub async fn fetch_all_rows<T, F, Fut>(mut list: F) -> DbResult<Vec<T>>
where
    F: FnMut(QueryFilter) -> Fut,
    Fut: Future<Output = DbResult<QueryFilteredResult<T>>>,
{
    let mut accumulated = Vec::new();

    for page in 1..=FETCH_ALL_MAX_PAGES {
        let result = list(QueryFilter::page(page, MAX_QUERY_FILTER_LIMIT)).await?;
        let total = result.total_count();
        if result.data.is_empty() {
            return Ok(accumulated);
        }

        accumulated.extend(result.data);
        if accumulated.len() as u64 >= total {
            return Ok(accumulated);
        }
    }

    warn!(
        pages = FETCH_ALL_MAX_PAGES,
        rows = accumulated.len(),
        "stopped paging before reaching the reported total"
    );
    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use std::sync::atomic::{AtomicU16, Ordering};
    use std::sync::Arc;

    fn page_of(filter: QueryFilter, total: u64) -> QueryFilteredResult<u64> {
        let start = u64::from(filter.query_offset() as u32);
        let end = (start + u64::from(filter.effective_limit())).min(total);
        let mut result = QueryFilteredResult::empty(&filter);
        result.data = (start..end).collect();
        result.pagination.filtered_count = total;
        result.pagination.total_count = total;
        result
    }

    #[tokio::test]
    async fn test_fetch_all_rows_stops_at_total() {
        let calls = Arc::new(AtomicU16::new(0));
        let seen = calls.clone();
        let rows = fetch_all_rows(move |filter| {
            seen.fetch_add(1, Ordering::SeqCst);
            async move { Ok(page_of(filter, 600)) }
        })
        .await
        .unwrap();

        assert_eq!(rows.len(), 600);
        assert_eq!(rows.last(), Some(&599));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_rows_stops_on_empty_page() {
        // A total that never matches the data must not loop forever.
        let rows = fetch_all_rows(|filter| async move {
            let mut result = page_of(filter, 10);
            result.pagination.total_count = 10_000;
            Ok(result)
        })
        .await
        .unwrap();
        assert_eq!(rows.len(), 10);
    }

    #[tokio::test]
    async fn test_fetch_all_rows_requests_max_limit() {
        let _ = fetch_all_rows(|filter| async move {
            assert_eq!(filter.effective_limit(), MAX_QUERY_FILTER_LIMIT);
            Ok(page_of(filter, 1))
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_all_rows_propagates_errors() {
        let err = fetch_all_rows::<u64, _, _>(|_| async { Err(DbError::NotFound) })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_counts_come_from_first_row() {
        let rows = vec![
            Counted { row: 1, filtered_count: 3, total_count: 7 },
            Counted { row: 2, filtered_count: 3, total_count: 7 },
        ];
        let filter = QueryFilter::page(1, 2);
        let result = into_filtered_result(rows, &filter, |v: i32| Ok(v * 10)).unwrap();

        assert_eq!(result.data, vec![10, 20]);
        assert_eq!(result.filtered_count(), 3);
        assert_eq!(result.total_count(), 7);
        assert_eq!(result.pagination.limit, 2);
    }

    #[test]
    fn test_empty_page_reports_zero_counts() {
        let filter = QueryFilter::page(9, 10);
        let result = into_filtered_result(Vec::<Counted<i32>>::new(), &filter, Ok).unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.total_count(), 0);
        assert_eq!(result.pagination.page, 9);
    }

    #[test]
    fn test_missing_filter_uses_defaults() {
        let filter = filter_or_default(None);
        assert_eq!(filter.effective_page(), 1);
        assert_eq!(filter.effective_limit(), 20);
        assert!(!filter.includes_archived());
    }
}
