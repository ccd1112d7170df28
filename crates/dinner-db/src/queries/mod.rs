//! # Named SQL Statements
//!
//! One function per statement. Each takes any PostgreSQL executor (the pool,
//! or `&mut *tx` inside a transaction) plus typed parameters, and returns row
//! records. No spans, no logging, no retries: the repository does that.
//!
//! ## Wide Rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT recipe_step_ingredients.id AS id, ...,                          │
//! │         valid_ingredients.id AS valid_ingredient_id, ...,               │
//! │         valid_measurement_units.id AS valid_measurement_unit_id, ...    │
//! │                                                                         │
//! │  decoded as                                                             │
//! │  (RecipeStepIngredientRow,          ← prefix ""                         │
//! │   Option<ValidIngredientRow>,       ← prefix "valid_ingredient_"        │
//! │   ValidMeasurementUnitRow)          ← prefix "valid_measurement_unit_"  │
//! │                                                                         │
//! │  An optional side whose `{prefix}id` is NULL collapses to None.        │
//! │  A table joined twice is re-prefixed with `joined_alias!`.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## List Statements
//! Every paginated list binds the same leading parameters:
//! ```text
//! $1 created_after   $2 created_before   $3 updated_after
//! $4 updated_before  $5 include_archived $6 offset   $7 limit
//! $8.. owner IDs
//! ```
//! and returns `filtered_count` / `total_count` on every row. The
//! filtered-count subquery and the outer WHERE are expanded from the same
//! [`filter_predicate!`] so their bounds always agree.

use dinner_core::QueryFilter;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres, Row};

use crate::error::{DbError, DbResult};

// =============================================================================
// Statement Macros
// =============================================================================

/// `table.col AS {prefix}col, ...` for a fixed column list.
macro_rules! columns {
    ($table:literal, $prefix:literal, [$first:literal $(, $rest:literal)* $(,)?]) => {
        concat!(
            $table, ".", $first, " AS ", $prefix, $first
            $(, ", ", $table, ".", $rest, " AS ", $prefix, $rest)*
        )
    };
}

/// Time windows plus archive inclusion. `after` is always the lower bound,
/// `before` the upper bound; rows never updated pass the update window.
macro_rules! filter_predicate {
    ($table:literal) => {
        concat!(
            $table, ".created_at > COALESCE($1, NOW() - interval '999 years')",
            " AND ", $table, ".created_at < COALESCE($2, NOW() + interval '999 years')",
            " AND (", $table, ".last_updated_at IS NULL OR ",
            $table, ".last_updated_at > COALESCE($3, NOW() - interval '999 years'))",
            " AND (", $table, ".last_updated_at IS NULL OR ",
            $table, ".last_updated_at < COALESCE($4, NOW() + interval '999 years'))",
            " AND (", $table, ".archived_at IS NULL OR COALESCE($5, false))"
        )
    };
}

/// The two count columns every list row carries.
macro_rules! list_counts {
    ($table:literal, $owner:literal) => {
        concat!(
            "(SELECT COUNT(", $table, ".id) FROM ", $table,
            " WHERE ", $owner, " AND ", filter_predicate!($table), ") AS filtered_count, ",
            "(SELECT COUNT(", $table, ".id) FROM ", $table,
            " WHERE ", $owner, " AND (", $table, ".archived_at IS NULL OR COALESCE($5, false))",
            ") AS total_count"
        )
    };
}

/// Outer WHERE, stable ordering and the page window.
macro_rules! list_where {
    ($table:literal, $owner:literal) => {
        concat!(
            " WHERE ", $owner, " AND ", filter_predicate!($table),
            " ORDER BY ", $table, ".created_at, ", $table, ".id",
            " OFFSET $6 LIMIT $7"
        )
    };
}

macro_rules! exists_by_id {
    ($table:literal) => {
        concat!(
            "SELECT EXISTS (SELECT ", $table, ".id FROM ", $table,
            " WHERE ", $table, ".archived_at IS NULL AND ", $table, ".id = $1)"
        )
    };
}

macro_rules! archive_by_id {
    ($table:literal) => {
        concat!(
            "UPDATE ", $table, " SET archived_at = NOW() WHERE archived_at IS NULL AND id = $1"
        )
    };
}

/// `$1` is the reindex window in seconds.
macro_rules! ids_needing_indexing {
    ($table:literal) => {
        concat!(
            "SELECT ", $table, ".id FROM ", $table,
            " WHERE ", $table, ".archived_at IS NULL AND (",
            $table, ".last_indexed_at IS NULL OR ",
            $table, ".last_indexed_at < NOW() - make_interval(secs => $1))"
        )
    };
}

macro_rules! update_last_indexed_at {
    ($table:literal) => {
        concat!(
            "UPDATE ", $table, " SET last_indexed_at = NOW() WHERE id = $1 AND archived_at IS NULL"
        )
    };
}

/// Declares a row record mirroring a table's columns.
///
/// Generates the struct, its `COLUMNS` list and a [`PrefixedRow`] impl that
/// reads each field from `{prefix}{field}`. With `joined as "p_"` it is also
/// [`Joinable`] under that prefix.
macro_rules! table_row {
    (
        $(#[$meta:meta])*
        pub struct $name:ident $(joined as $join:literal)? {
            $(pub $field:ident: $ty:ty,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl $name {
            #[allow(dead_code)]
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];
        }

        impl $crate::queries::PrefixedRow for $name {
            fn from_prefixed_row(
                row: &sqlx::postgres::PgRow,
                prefix: &str,
            ) -> Result<Self, sqlx::Error> {
                use sqlx::Row;
                Ok($name {
                    $($field: row.try_get(format!("{prefix}{}", stringify!($field)).as_str())?,)+
                })
            }
        }

        $(
            impl $crate::queries::Joinable for $name {
                const JOIN_PREFIX: &'static str = $join;
            }
        )?
    };
}

/// Re-declares an existing row record under another join prefix, for
/// statements that join the same table twice.
macro_rules! joined_alias {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($inner:ty) joined as $join:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub $inner);

        impl $crate::queries::PrefixedRow for $name {
            fn from_prefixed_row(
                row: &sqlx::postgres::PgRow,
                prefix: &str,
            ) -> Result<Self, sqlx::Error> {
                <$inner as $crate::queries::PrefixedRow>::from_prefixed_row(row, prefix).map($name)
            }
        }

        impl $crate::queries::Joinable for $name {
            const JOIN_PREFIX: &'static str = $join;
        }
    };
}

#[macro_use]
pub mod columns;

pub mod audit_log_entries;
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

// =============================================================================
// Row Decoding
// =============================================================================

/// A record that can be read out of a (possibly wide) row at a column prefix.
pub trait PrefixedRow: Sized {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error>;
}

/// A record that appears as the joined side of a wide row.
pub trait Joinable: PrefixedRow {
    const JOIN_PREFIX: &'static str;
}

impl<T: Joinable> PrefixedRow for Option<T> {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let id: Option<String> = row.try_get(format!("{prefix}id").as_str())?;
        match id {
            Some(_) => T::from_prefixed_row(row, prefix).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: Joinable> Joinable for Option<T> {
    const JOIN_PREFIX: &'static str = T::JOIN_PREFIX;
}

impl<A: PrefixedRow, B: Joinable> PrefixedRow for (A, B) {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok((
            A::from_prefixed_row(row, prefix)?,
            B::from_prefixed_row(row, &format!("{prefix}{}", B::JOIN_PREFIX))?,
        ))
    }
}

impl<A: Joinable, B: Joinable> Joinable for (A, B) {
    const JOIN_PREFIX: &'static str = A::JOIN_PREFIX;
}

impl<A: PrefixedRow, B: Joinable, C: Joinable> PrefixedRow for (A, B, C) {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok((
            A::from_prefixed_row(row, prefix)?,
            B::from_prefixed_row(row, &format!("{prefix}{}", B::JOIN_PREFIX))?,
            C::from_prefixed_row(row, &format!("{prefix}{}", C::JOIN_PREFIX))?,
        ))
    }
}

impl<A: PrefixedRow, B: Joinable, C: Joinable, D: Joinable> PrefixedRow for (A, B, C, D) {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok((
            A::from_prefixed_row(row, prefix)?,
            B::from_prefixed_row(row, &format!("{prefix}{}", B::JOIN_PREFIX))?,
            C::from_prefixed_row(row, &format!("{prefix}{}", C::JOIN_PREFIX))?,
            D::from_prefixed_row(row, &format!("{prefix}{}", D::JOIN_PREFIX))?,
        ))
    }
}

/// A list row plus the two pagination counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Counted<T> {
    pub row: T,
    pub filtered_count: i64,
    pub total_count: i64,
}

impl<T: PrefixedRow> PrefixedRow for Counted<T> {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Counted {
            row: T::from_prefixed_row(row, prefix)?,
            filtered_count: row.try_get("filtered_count")?,
            total_count: row.try_get("total_count")?,
        })
    }
}

/// A single-column `id` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRow(pub String);

impl PrefixedRow for IdRow {
    fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
        row.try_get(format!("{prefix}id").as_str()).map(IdRow)
    }
}

// =============================================================================
// Execution Helpers
// =============================================================================

/// Statement with the seven list parameters already bound.
pub fn list_query<'q>(sql: &'q str, filter: &QueryFilter) -> Query<'q, Postgres, PgArguments> {
    sqlx::query(sql)
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(filter.updated_after)
        .bind(filter.updated_before)
        .bind(filter.include_archived)
        .bind(i64::from(filter.query_offset()))
        .bind(i64::from(filter.query_limit()))
}

pub async fn fetch_optional<'q, 'e, T, E>(
    query: Query<'q, Postgres, PgArguments>,
    exec: E,
) -> DbResult<Option<T>>
where
    T: PrefixedRow,
    E: PgExecutor<'e>,
{
    let row = query.fetch_optional(exec).await?;
    Ok(row.map(|r| T::from_prefixed_row(&r, "")).transpose()?)
}

pub async fn fetch_one<'q, 'e, T, E>(query: Query<'q, Postgres, PgArguments>, exec: E) -> DbResult<T>
where
    T: PrefixedRow,
    E: PgExecutor<'e>,
{
    fetch_optional(query, exec).await?.ok_or(DbError::NotFound)
}

pub async fn fetch_all<'q, 'e, T, E>(
    query: Query<'q, Postgres, PgArguments>,
    exec: E,
) -> DbResult<Vec<T>>
where
    T: PrefixedRow,
    E: PgExecutor<'e>,
{
    let rows = query.fetch_all(exec).await?;
    rows.iter()
        .map(|r| T::from_prefixed_row(r, "").map_err(DbError::from))
        .collect()
}

/// Runs a `SELECT EXISTS (...)` statement.
pub async fn fetch_exists<'q, 'e, E>(query: Query<'q, Postgres, PgArguments>, exec: E) -> DbResult<bool>
where
    E: PgExecutor<'e>,
{
    let row = query.fetch_one(exec).await?;
    Ok(row.try_get(0)?)
}

/// Runs a write and returns the number of rows it touched.
pub async fn execute<'q, 'e, E>(query: Query<'q, Postgres, PgArguments>, exec: E) -> DbResult<u64>
where
    E: PgExecutor<'e>,
{
    Ok(query.execute(exec).await?.rows_affected())
}

pub async fn fetch_ids<'q, 'e, E>(query: Query<'q, Postgres, PgArguments>, exec: E) -> DbResult<Vec<String>>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<IdRow> = fetch_all(query, exec).await?;
    Ok(ids.into_iter().map(|IdRow(id)| id).collect())
}

// =============================================================================
// List Registry
// =============================================================================

/// A paginated statement and the table its predicate filters.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every time-windowed list statement, for invariant checks.
pub fn all_list_queries() -> Vec<ListQuery> {
    [
        households::LIST_QUERIES,
        meal_plans::LIST_QUERIES,
        meals::LIST_QUERIES,
        preferences::LIST_QUERIES,
        recipe_step_children::LIST_QUERIES,
        recipes::LIST_QUERIES,
        service_settings::LIST_QUERIES,
        users::LIST_QUERIES,
        valid_enumerations::LIST_QUERIES,
        valid_mappings::LIST_QUERIES,
        webhooks::LIST_QUERIES,
    ]
    .concat()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_columns_macro() {
        assert_eq!(
            columns!("valid_instruments", "valid_instrument_", ["id", "name"]),
            "valid_instruments.id AS valid_instrument_id, valid_instruments.name AS valid_instrument_name"
        );
    }

    #[test]
    fn test_registry_is_populated() {
        assert!(all_list_queries().len() > 30);
    }

    #[test]
    fn test_update_bounds_have_the_same_sense_everywhere() {
        for query in all_list_queries() {
            let after = occurrences(query.sql, "last_updated_at > COALESCE($3,");
            let before = occurrences(query.sql, "last_updated_at < COALESCE($4,");
            assert_eq!(after, 2, "{}: updated_after must be a lower bound twice", query.name);
            assert_eq!(before, 2, "{}: updated_before must be an upper bound twice", query.name);
            assert_eq!(occurrences(query.sql, "$3"), 2, "{}", query.name);
            assert_eq!(occurrences(query.sql, "$4"), 2, "{}", query.name);
        }
    }

    #[test]
    fn test_created_bounds_and_window() {
        for query in all_list_queries() {
            assert_eq!(
                occurrences(query.sql, "created_at > COALESCE($1,"),
                2,
                "{}",
                query.name
            );
            assert_eq!(
                occurrences(query.sql, "created_at < COALESCE($2,"),
                2,
                "{}",
                query.name
            );
            assert_eq!(occurrences(query.sql, "COALESCE($5, false)"), 3, "{}", query.name);
            assert_eq!(occurrences(query.sql, "OFFSET $6 LIMIT $7"), 1, "{}", query.name);
            assert!(query.sql.contains("AS filtered_count"), "{}", query.name);
            assert!(query.sql.contains("AS total_count"), "{}", query.name);
        }
    }

    #[test]
    fn test_rows_are_stably_ordered() {
        for query in all_list_queries() {
            assert!(
                query.sql.contains(".created_at, ") && query.sql.contains(".id OFFSET $6"),
                "{} must order by created_at, id",
                query.name
            );
        }
    }

    #[test]
    fn test_owner_parameters_start_at_eight() {
        for query in all_list_queries() {
            for n in 8..=12 {
                let placeholder = format!("${n}");
                if query.sql.contains(&placeholder) {
                    assert!(
                        (8..n).all(|m| query.sql.contains(&format!("${m}"))),
                        "{} skips an owner placeholder before {placeholder}",
                        query.name
                    );
                }
            }
        }
    }
}
