//! User ingredient preferences and household instrument ownerships.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::valid_enumerations::{ValidIngredientRow, ValidInstrumentRow};
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

// =============================================================================
// Ingredient Preferences
// =============================================================================

table_row! {
    pub struct UserIngredientPreferenceRow {
        pub id: String,
        pub ingredient: String,
        pub rating: i16,
        pub notes: String,
        pub allergy: bool,
        pub belongs_to_user: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub type UserIngredientPreferenceWithIngredientRow = (UserIngredientPreferenceRow, ValidIngredientRow);

macro_rules! preference_select {
    () => {
        concat!(
            "SELECT ", user_ingredient_preference_columns!("user_ingredient_preferences", ""), ", ",
            valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"),
            " FROM user_ingredient_preferences",
            " JOIN valid_ingredients ON valid_ingredients.id = user_ingredient_preferences.ingredient"
        )
    };
}

/// `$1` user, `$2` preference.
pub const USER_INGREDIENT_PREFERENCE_EXISTS: &str = "SELECT EXISTS (
    SELECT user_ingredient_preferences.id FROM user_ingredient_preferences
    WHERE user_ingredient_preferences.archived_at IS NULL
    AND user_ingredient_preferences.belongs_to_user = $1
    AND user_ingredient_preferences.id = $2
)";

pub const GET_USER_INGREDIENT_PREFERENCE: &str = concat!(
    preference_select!(),
    " WHERE user_ingredient_preferences.archived_at IS NULL",
    " AND user_ingredient_preferences.belongs_to_user = $1",
    " AND user_ingredient_preferences.id = $2"
);

pub const GET_USER_INGREDIENT_PREFERENCES_FOR_USER: &str = concat!(
    "SELECT ", user_ingredient_preference_columns!("user_ingredient_preferences", ""), ", ",
    valid_ingredient_columns!("valid_ingredients", "valid_ingredient_"), ", ",
    list_counts!("user_ingredient_preferences", "user_ingredient_preferences.belongs_to_user = $8"),
    " FROM user_ingredient_preferences",
    " JOIN valid_ingredients ON valid_ingredients.id = user_ingredient_preferences.ingredient",
    list_where!("user_ingredient_preferences", "user_ingredient_preferences.belongs_to_user = $8")
);

pub const CREATE_USER_INGREDIENT_PREFERENCE: &str = "INSERT INTO user_ingredient_preferences (
    id, ingredient, rating, notes, allergy, belongs_to_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_USER_INGREDIENT_PREFERENCE: &str = "UPDATE user_ingredient_preferences SET
    ingredient = $2, rating = $3, notes = $4, allergy = $5,
    last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_user = $6";

pub const ARCHIVE_USER_INGREDIENT_PREFERENCE: &str = "UPDATE user_ingredient_preferences SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_user = $1 AND id = $2";

fn bind_user_ingredient_preference<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q UserIngredientPreferenceRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.ingredient)
        .bind(row.rating)
        .bind(&row.notes)
        .bind(row.allergy)
        .bind(&row.belongs_to_user)
}

pub async fn user_ingredient_preference_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    preference_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(USER_INGREDIENT_PREFERENCE_EXISTS)
            .bind(user_id)
            .bind(preference_id),
        exec,
    )
    .await
}

pub async fn get_user_ingredient_preference<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    preference_id: &str,
) -> DbResult<Option<UserIngredientPreferenceWithIngredientRow>> {
    fetch_optional(
        sqlx::query(GET_USER_INGREDIENT_PREFERENCE)
            .bind(user_id)
            .bind(preference_id),
        exec,
    )
    .await
}

pub async fn get_user_ingredient_preferences_for_user<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    user_id: &str,
) -> DbResult<Vec<Counted<UserIngredientPreferenceWithIngredientRow>>> {
    fetch_all(
        list_query(GET_USER_INGREDIENT_PREFERENCES_FOR_USER, filter).bind(user_id),
        exec,
    )
    .await
}

pub async fn create_user_ingredient_preference<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &UserIngredientPreferenceRow,
) -> DbResult<u64> {
    let query =
        bind_user_ingredient_preference(sqlx::query(CREATE_USER_INGREDIENT_PREFERENCE), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_user_ingredient_preference<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &UserIngredientPreferenceRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query =
        bind_user_ingredient_preference(sqlx::query(UPDATE_USER_INGREDIENT_PREFERENCE), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_user_ingredient_preference<'e, E: PgExecutor<'e>>(
    exec: E,
    user_id: &str,
    preference_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_USER_INGREDIENT_PREFERENCE)
            .bind(user_id)
            .bind(preference_id),
        exec,
    )
    .await
}

// =============================================================================
// Instrument Ownerships
// =============================================================================

table_row! {
    pub struct HouseholdInstrumentOwnershipRow {
        pub id: String,
        pub notes: String,
        pub quantity: i32,
        pub valid_instrument_id: String,
        pub belongs_to_household: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `valid_instrument_id` is selected under both sides and the join keeps
/// them equal.
pub type HouseholdInstrumentOwnershipWithInstrumentRow =
    (HouseholdInstrumentOwnershipRow, ValidInstrumentRow);

macro_rules! ownership_select {
    () => {
        concat!(
            "SELECT ",
            household_instrument_ownership_columns!("household_instrument_ownerships", ""), ", ",
            valid_instrument_columns!("valid_instruments", "valid_instrument_"),
            " FROM household_instrument_ownerships",
            " JOIN valid_instruments ON valid_instruments.id = household_instrument_ownerships.valid_instrument_id"
        )
    };
}

/// `$1` household, `$2` ownership.
pub const HOUSEHOLD_INSTRUMENT_OWNERSHIP_EXISTS: &str = "SELECT EXISTS (
    SELECT household_instrument_ownerships.id FROM household_instrument_ownerships
    WHERE household_instrument_ownerships.archived_at IS NULL
    AND household_instrument_ownerships.belongs_to_household = $1
    AND household_instrument_ownerships.id = $2
)";

pub const GET_HOUSEHOLD_INSTRUMENT_OWNERSHIP: &str = concat!(
    ownership_select!(),
    " WHERE household_instrument_ownerships.archived_at IS NULL",
    " AND household_instrument_ownerships.belongs_to_household = $1",
    " AND household_instrument_ownerships.id = $2"
);

pub const GET_HOUSEHOLD_INSTRUMENT_OWNERSHIPS_FOR_HOUSEHOLD: &str = concat!(
    "SELECT ",
    household_instrument_ownership_columns!("household_instrument_ownerships", ""), ", ",
    valid_instrument_columns!("valid_instruments", "valid_instrument_"), ", ",
    list_counts!(
        "household_instrument_ownerships",
        "household_instrument_ownerships.belongs_to_household = $8"
    ),
    " FROM household_instrument_ownerships",
    " JOIN valid_instruments ON valid_instruments.id = household_instrument_ownerships.valid_instrument_id",
    list_where!(
        "household_instrument_ownerships",
        "household_instrument_ownerships.belongs_to_household = $8"
    )
);

pub const CREATE_HOUSEHOLD_INSTRUMENT_OWNERSHIP: &str = "INSERT INTO household_instrument_ownerships (
    id, notes, quantity, valid_instrument_id, belongs_to_household, created_at
) VALUES ($1, $2, $3, $4, $5, $6)";

pub const UPDATE_HOUSEHOLD_INSTRUMENT_OWNERSHIP: &str = "UPDATE household_instrument_ownerships SET
    notes = $2, quantity = $3, valid_instrument_id = $4,
    last_updated_at = GREATEST($6, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_household = $5";

pub const ARCHIVE_HOUSEHOLD_INSTRUMENT_OWNERSHIP: &str = "UPDATE household_instrument_ownerships SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_household = $1 AND id = $2";

fn bind_household_instrument_ownership<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q HouseholdInstrumentOwnershipRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.notes)
        .bind(row.quantity)
        .bind(&row.valid_instrument_id)
        .bind(&row.belongs_to_household)
}

pub async fn household_instrument_ownership_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    ownership_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(HOUSEHOLD_INSTRUMENT_OWNERSHIP_EXISTS)
            .bind(household_id)
            .bind(ownership_id),
        exec,
    )
    .await
}

pub async fn get_household_instrument_ownership<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    ownership_id: &str,
) -> DbResult<Option<HouseholdInstrumentOwnershipWithInstrumentRow>> {
    fetch_optional(
        sqlx::query(GET_HOUSEHOLD_INSTRUMENT_OWNERSHIP)
            .bind(household_id)
            .bind(ownership_id),
        exec,
    )
    .await
}

pub async fn get_household_instrument_ownerships_for_household<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
) -> DbResult<Vec<Counted<HouseholdInstrumentOwnershipWithInstrumentRow>>> {
    fetch_all(
        list_query(GET_HOUSEHOLD_INSTRUMENT_OWNERSHIPS_FOR_HOUSEHOLD, filter).bind(household_id),
        exec,
    )
    .await
}

pub async fn create_household_instrument_ownership<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdInstrumentOwnershipRow,
) -> DbResult<u64> {
    let query = bind_household_instrument_ownership(
        sqlx::query(CREATE_HOUSEHOLD_INSTRUMENT_OWNERSHIP),
        row,
    );
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_household_instrument_ownership<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &HouseholdInstrumentOwnershipRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_household_instrument_ownership(
        sqlx::query(UPDATE_HOUSEHOLD_INSTRUMENT_OWNERSHIP),
        row,
    );
    execute(query.bind(now), exec).await
}

pub async fn archive_household_instrument_ownership<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    ownership_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_HOUSEHOLD_INSTRUMENT_OWNERSHIP)
            .bind(household_id)
            .bind(ownership_id),
        exec,
    )
    .await
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery {
        name: "get_user_ingredient_preferences_for_user",
        sql: GET_USER_INGREDIENT_PREFERENCES_FOR_USER,
    },
    ListQuery {
        name: "get_household_instrument_ownerships_for_household",
        sql: GET_HOUSEHOLD_INSTRUMENT_OWNERSHIPS_FOR_HOUSEHOLD,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_are_scoped_to_their_user() {
        for sql in [
            USER_INGREDIENT_PREFERENCE_EXISTS,
            GET_USER_INGREDIENT_PREFERENCE,
            ARCHIVE_USER_INGREDIENT_PREFERENCE,
        ] {
            assert!(sql.contains("belongs_to_user = $1"), "{sql}");
        }
    }

    #[test]
    fn test_ownerships_join_their_instrument() {
        assert!(GET_HOUSEHOLD_INSTRUMENT_OWNERSHIP
            .contains("valid_instruments.id AS valid_instrument_id"));
    }
}
