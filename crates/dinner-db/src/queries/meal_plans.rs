//! Meal plans, their events, options and votes.
//!
//! ```text
//! households ◄── meal_plans ◄── meal_plan_events ◄── meal_plan_options ◄── votes
//!     $1 / $8        $2 / $9           $3 / $10              (singles / lists)
//! ```
//! Reads below the plan check the whole chain, so an event is invisible
//! through another plan and an option through another event.

use chrono::{DateTime, Utc};
use dinner_core::QueryFilter;
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, PgExecutor, Postgres};

use crate::error::DbResult;
use crate::queries::meals::MealRow;
use crate::queries::{execute, fetch_all, fetch_exists, fetch_optional, list_query, Counted, ListQuery};

// =============================================================================
// Meal Plans
// =============================================================================

table_row! {
    pub struct MealPlanRow {
        pub id: String,
        pub notes: String,
        pub status: String,
        pub voting_deadline: DateTime<Utc>,
        pub election_method: String,
        pub belongs_to_household: String,
        pub created_by_user: String,
        pub grocery_list_initialized: bool,
        pub tasks_created: bool,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const MEAL_PLAN_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plans.id FROM meal_plans
    WHERE meal_plans.archived_at IS NULL
    AND meal_plans.belongs_to_household = $1
    AND meal_plans.id = $2
)";

pub const GET_MEAL_PLAN: &str = concat!(
    "SELECT ", meal_plan_columns!("meal_plans", ""),
    " FROM meal_plans WHERE meal_plans.archived_at IS NULL",
    " AND meal_plans.belongs_to_household = $1 AND meal_plans.id = $2"
);

pub const GET_MEAL_PLANS_FOR_HOUSEHOLD: &str = concat!(
    "SELECT ", meal_plan_columns!("meal_plans", ""), ", ",
    list_counts!("meal_plans", "meal_plans.belongs_to_household = $8"),
    " FROM meal_plans",
    list_where!("meal_plans", "meal_plans.belongs_to_household = $8")
);

pub const CREATE_MEAL_PLAN: &str = "INSERT INTO meal_plans (
    id, notes, status, voting_deadline, election_method, belongs_to_household,
    created_by_user, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const UPDATE_MEAL_PLAN: &str = "UPDATE meal_plans SET
    notes = $2, status = $3, voting_deadline = $4, election_method = $5,
    last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_household = $6";

pub const ARCHIVE_MEAL_PLAN: &str = "UPDATE meal_plans SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_household = $1 AND id = $2";

/// Only a plan still awaiting votes can be finalized.
pub const FINALIZE_MEAL_PLAN: &str = "UPDATE meal_plans SET
    status = 'finalized', last_updated_at = GREATEST($3, created_at)
WHERE archived_at IS NULL AND belongs_to_household = $1 AND id = $2
AND status = 'awaiting_votes'";

pub async fn meal_plan_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    meal_plan_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(MEAL_PLAN_EXISTS).bind(household_id).bind(meal_plan_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    meal_plan_id: &str,
) -> DbResult<Option<MealPlanRow>> {
    fetch_optional(
        sqlx::query(GET_MEAL_PLAN).bind(household_id).bind(meal_plan_id),
        exec,
    )
    .await
}

pub async fn get_meal_plans_for_household<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    household_id: &str,
) -> DbResult<Vec<Counted<MealPlanRow>>> {
    fetch_all(
        list_query(GET_MEAL_PLANS_FOR_HOUSEHOLD, filter).bind(household_id),
        exec,
    )
    .await
}

pub async fn create_meal_plan<'e, E: PgExecutor<'e>>(exec: E, row: &MealPlanRow) -> DbResult<u64> {
    let query = sqlx::query(CREATE_MEAL_PLAN)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.status)
        .bind(row.voting_deadline)
        .bind(&row.election_method)
        .bind(&row.belongs_to_household)
        .bind(&row.created_by_user)
        .bind(row.created_at);
    execute(query, exec).await
}

pub async fn update_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(UPDATE_MEAL_PLAN)
        .bind(&row.id)
        .bind(&row.notes)
        .bind(&row.status)
        .bind(row.voting_deadline)
        .bind(&row.election_method)
        .bind(&row.belongs_to_household)
        .bind(now);
    execute(query, exec).await
}

pub async fn archive_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    meal_plan_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_MEAL_PLAN).bind(household_id).bind(meal_plan_id),
        exec,
    )
    .await
}

pub async fn finalize_meal_plan<'e, E: PgExecutor<'e>>(
    exec: E,
    household_id: &str,
    meal_plan_id: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(FINALIZE_MEAL_PLAN)
        .bind(household_id)
        .bind(meal_plan_id)
        .bind(now);
    execute(query, exec).await
}

// =============================================================================
// Events
// =============================================================================

table_row! {
    pub struct MealPlanEventRow {
        pub id: String,
        pub notes: String,
        pub starts_at: DateTime<Utc>,
        pub ends_at: DateTime<Utc>,
        pub meal_name: String,
        pub belongs_to_meal_plan: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const MEAL_PLAN_EVENT_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plan_events.id FROM meal_plan_events
    WHERE meal_plan_events.archived_at IS NULL
    AND meal_plan_events.belongs_to_meal_plan = $1
    AND meal_plan_events.id = $2
)";

pub const GET_MEAL_PLAN_EVENT: &str = concat!(
    "SELECT ", meal_plan_event_columns!("meal_plan_events", ""),
    " FROM meal_plan_events WHERE meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = $1 AND meal_plan_events.id = $2"
);

pub const GET_MEAL_PLAN_EVENTS_FOR_PLANS: &str = concat!(
    "SELECT ", meal_plan_event_columns!("meal_plan_events", ""),
    " FROM meal_plan_events WHERE meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = ANY($1)",
    " ORDER BY meal_plan_events.starts_at, meal_plan_events.id"
);

pub const GET_MEAL_PLAN_EVENTS: &str = concat!(
    "SELECT ", meal_plan_event_columns!("meal_plan_events", ""), ", ",
    list_counts!("meal_plan_events", "meal_plan_events.belongs_to_meal_plan = $8"),
    " FROM meal_plan_events",
    list_where!("meal_plan_events", "meal_plan_events.belongs_to_meal_plan = $8")
);

pub const CREATE_MEAL_PLAN_EVENT: &str = "INSERT INTO meal_plan_events (
    id, notes, starts_at, ends_at, meal_name, belongs_to_meal_plan, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_MEAL_PLAN_EVENT: &str = "UPDATE meal_plan_events SET
    notes = $2, starts_at = $3, ends_at = $4, meal_name = $5,
    last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_meal_plan = $6";

pub const ARCHIVE_MEAL_PLAN_EVENT: &str = "UPDATE meal_plan_events SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_meal_plan = $1 AND id = $2";

/// Binds `$1` (id) through `$6` (belongs_to_meal_plan).
fn bind_meal_plan_event<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q MealPlanEventRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.notes)
        .bind(row.starts_at)
        .bind(row.ends_at)
        .bind(&row.meal_name)
        .bind(&row.belongs_to_meal_plan)
}

pub async fn meal_plan_event_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
) -> DbResult<bool> {
    fetch_exists(
        sqlx::query(MEAL_PLAN_EVENT_EXISTS).bind(meal_plan_id).bind(event_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_event<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
) -> DbResult<Option<MealPlanEventRow>> {
    fetch_optional(
        sqlx::query(GET_MEAL_PLAN_EVENT).bind(meal_plan_id).bind(event_id),
        exec,
    )
    .await
}

pub async fn get_meal_plan_events_for_plans<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_ids: &[String],
) -> DbResult<Vec<MealPlanEventRow>> {
    fetch_all(sqlx::query(GET_MEAL_PLAN_EVENTS_FOR_PLANS).bind(meal_plan_ids), exec).await
}

pub async fn get_meal_plan_events<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    meal_plan_id: &str,
) -> DbResult<Vec<Counted<MealPlanEventRow>>> {
    fetch_all(list_query(GET_MEAL_PLAN_EVENTS, filter).bind(meal_plan_id), exec).await
}

pub async fn create_meal_plan_event<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanEventRow,
) -> DbResult<u64> {
    let query = bind_meal_plan_event(sqlx::query(CREATE_MEAL_PLAN_EVENT), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_meal_plan_event<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanEventRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_meal_plan_event(sqlx::query(UPDATE_MEAL_PLAN_EVENT), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_meal_plan_event<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_MEAL_PLAN_EVENT).bind(meal_plan_id).bind(event_id),
        exec,
    )
    .await
}

// =============================================================================
// Options
// =============================================================================

table_row! {
    pub struct MealPlanOptionRow joined as "meal_plan_option_" {
        pub id: String,
        pub meal_id: String,
        pub notes: String,
        pub meal_scale: Decimal,
        pub chosen: bool,
        pub tiebroken: bool,
        pub assigned_cook: Option<String>,
        pub assigned_dishwasher: Option<String>,
        pub belongs_to_meal_plan_event: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

/// `meal_id` is selected under both sides and the join keeps them equal.
pub type MealPlanOptionWithMealRow = (MealPlanOptionRow, MealRow);

macro_rules! option_select {
    () => {
        concat!(
            "SELECT ", meal_plan_option_columns!("meal_plan_options", ""), ", ",
            meal_columns!("meals", "meal_"),
            " FROM meal_plan_options",
            " JOIN meals ON meals.id = meal_plan_options.meal_id"
        )
    };
}

pub const MEAL_PLAN_OPTION_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plan_options.id FROM meal_plan_options
    JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event
    WHERE meal_plan_options.archived_at IS NULL
    AND meal_plan_events.archived_at IS NULL
    AND meal_plan_events.belongs_to_meal_plan = $1
    AND meal_plan_options.belongs_to_meal_plan_event = $2
    AND meal_plan_options.id = $3
)";

pub const GET_MEAL_PLAN_OPTION: &str = concat!(
    option_select!(),
    " JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event",
    " WHERE meal_plan_options.archived_at IS NULL",
    " AND meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = $1",
    " AND meal_plan_options.belongs_to_meal_plan_event = $2",
    " AND meal_plan_options.id = $3"
);

pub const GET_MEAL_PLAN_OPTIONS_FOR_EVENTS: &str = concat!(
    option_select!(),
    " WHERE meal_plan_options.archived_at IS NULL",
    " AND meal_plan_options.belongs_to_meal_plan_event = ANY($1)",
    " ORDER BY meal_plan_options.created_at, meal_plan_options.id"
);

pub const GET_MEAL_PLAN_OPTIONS: &str = concat!(
    "SELECT ", meal_plan_option_columns!("meal_plan_options", ""), ", ",
    meal_columns!("meals", "meal_"), ", ",
    list_counts!(
        "meal_plan_options",
        "EXISTS (SELECT 1 FROM meal_plan_events WHERE meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event AND meal_plan_events.archived_at IS NULL AND meal_plan_events.belongs_to_meal_plan = $8) AND meal_plan_options.belongs_to_meal_plan_event = $9"
    ),
    " FROM meal_plan_options",
    " JOIN meals ON meals.id = meal_plan_options.meal_id",
    list_where!(
        "meal_plan_options",
        "EXISTS (SELECT 1 FROM meal_plan_events WHERE meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event AND meal_plan_events.archived_at IS NULL AND meal_plan_events.belongs_to_meal_plan = $8) AND meal_plan_options.belongs_to_meal_plan_event = $9"
    )
);

pub const CREATE_MEAL_PLAN_OPTION: &str = "INSERT INTO meal_plan_options (
    id, meal_id, notes, meal_scale, chosen, tiebroken, assigned_cook, assigned_dishwasher,
    belongs_to_meal_plan_event, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

pub const UPDATE_MEAL_PLAN_OPTION: &str = "UPDATE meal_plan_options SET
    meal_id = $2, notes = $3, meal_scale = $4, chosen = $5, tiebroken = $6,
    assigned_cook = $7, assigned_dishwasher = $8,
    last_updated_at = GREATEST($10, created_at)
WHERE archived_at IS NULL AND id = $1 AND belongs_to_meal_plan_event = $9";

pub const ARCHIVE_MEAL_PLAN_OPTION: &str = "UPDATE meal_plan_options SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_meal_plan_event = $2 AND id = $3
AND EXISTS (
    SELECT 1 FROM meal_plan_events
    WHERE meal_plan_events.id = $2 AND meal_plan_events.belongs_to_meal_plan = $1
)";

/// `$1` plan, `$2` event, `$3` option, `$4` tiebroken, `$5` now.
pub const FINALIZE_MEAL_PLAN_OPTION: &str = "UPDATE meal_plan_options SET
    chosen = TRUE, tiebroken = $4, last_updated_at = GREATEST($5, created_at)
WHERE archived_at IS NULL AND belongs_to_meal_plan_event = $2 AND id = $3
AND EXISTS (
    SELECT 1 FROM meal_plan_events
    WHERE meal_plan_events.id = $2 AND meal_plan_events.belongs_to_meal_plan = $1
    AND meal_plan_events.archived_at IS NULL
)";

/// Binds `$1` (id) through `$9` (belongs_to_meal_plan_event).
fn bind_meal_plan_option<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q MealPlanOptionRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(&row.meal_id)
        .bind(&row.notes)
        .bind(row.meal_scale)
        .bind(row.chosen)
        .bind(row.tiebroken)
        .bind(&row.assigned_cook)
        .bind(&row.assigned_dishwasher)
        .bind(&row.belongs_to_meal_plan_event)
}

pub async fn meal_plan_option_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(MEAL_PLAN_OPTION_EXISTS)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id);
    fetch_exists(query, exec).await
}

pub async fn get_meal_plan_option<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
) -> DbResult<Option<MealPlanOptionWithMealRow>> {
    let query = sqlx::query(GET_MEAL_PLAN_OPTION)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id);
    fetch_optional(query, exec).await
}

pub async fn get_meal_plan_options_for_events<'e, E: PgExecutor<'e>>(
    exec: E,
    event_ids: &[String],
) -> DbResult<Vec<MealPlanOptionWithMealRow>> {
    fetch_all(sqlx::query(GET_MEAL_PLAN_OPTIONS_FOR_EVENTS).bind(event_ids), exec).await
}

pub async fn get_meal_plan_options<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    meal_plan_id: &str,
    event_id: &str,
) -> DbResult<Vec<Counted<MealPlanOptionWithMealRow>>> {
    let query = list_query(GET_MEAL_PLAN_OPTIONS, filter)
        .bind(meal_plan_id)
        .bind(event_id);
    fetch_all(query, exec).await
}

pub async fn create_meal_plan_option<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanOptionRow,
) -> DbResult<u64> {
    let query = bind_meal_plan_option(sqlx::query(CREATE_MEAL_PLAN_OPTION), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_meal_plan_option<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanOptionRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_meal_plan_option(sqlx::query(UPDATE_MEAL_PLAN_OPTION), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_meal_plan_option<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
) -> DbResult<u64> {
    let query = sqlx::query(ARCHIVE_MEAL_PLAN_OPTION)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id);
    execute(query, exec).await
}

pub async fn finalize_meal_plan_option<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
    tiebroken: bool,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = sqlx::query(FINALIZE_MEAL_PLAN_OPTION)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id)
        .bind(tiebroken)
        .bind(now);
    execute(query, exec).await
}

// =============================================================================
// Votes
// =============================================================================

table_row! {
    pub struct MealPlanOptionVoteRow {
        pub id: String,
        pub rank: i32,
        pub abstain: bool,
        pub notes: String,
        pub by_user: String,
        pub belongs_to_meal_plan_option: String,
        pub created_at: DateTime<Utc>,
        pub last_updated_at: Option<DateTime<Utc>>,
        pub archived_at: Option<DateTime<Utc>>,
    }
}

pub const MEAL_PLAN_OPTION_VOTE_EXISTS: &str = "SELECT EXISTS (
    SELECT meal_plan_option_votes.id FROM meal_plan_option_votes
    JOIN meal_plan_options ON meal_plan_options.id = meal_plan_option_votes.belongs_to_meal_plan_option
    JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event
    WHERE meal_plan_option_votes.archived_at IS NULL
    AND meal_plan_options.archived_at IS NULL
    AND meal_plan_events.archived_at IS NULL
    AND meal_plan_events.belongs_to_meal_plan = $1
    AND meal_plan_options.belongs_to_meal_plan_event = $2
    AND meal_plan_option_votes.belongs_to_meal_plan_option = $3
    AND meal_plan_option_votes.id = $4
)";

pub const GET_MEAL_PLAN_OPTION_VOTE: &str = concat!(
    "SELECT ", meal_plan_option_vote_columns!("meal_plan_option_votes", ""),
    " FROM meal_plan_option_votes",
    " JOIN meal_plan_options ON meal_plan_options.id = meal_plan_option_votes.belongs_to_meal_plan_option",
    " JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event",
    " WHERE meal_plan_option_votes.archived_at IS NULL",
    " AND meal_plan_options.archived_at IS NULL",
    " AND meal_plan_events.archived_at IS NULL",
    " AND meal_plan_events.belongs_to_meal_plan = $1",
    " AND meal_plan_options.belongs_to_meal_plan_event = $2",
    " AND meal_plan_option_votes.belongs_to_meal_plan_option = $3",
    " AND meal_plan_option_votes.id = $4"
);

pub const GET_MEAL_PLAN_OPTION_VOTES_FOR_OPTIONS: &str = concat!(
    "SELECT ", meal_plan_option_vote_columns!("meal_plan_option_votes", ""),
    " FROM meal_plan_option_votes WHERE meal_plan_option_votes.archived_at IS NULL",
    " AND meal_plan_option_votes.belongs_to_meal_plan_option = ANY($1)",
    " ORDER BY meal_plan_option_votes.created_at, meal_plan_option_votes.id"
);

pub const GET_MEAL_PLAN_OPTION_VOTES: &str = concat!(
    "SELECT ", meal_plan_option_vote_columns!("meal_plan_option_votes", ""), ", ",
    list_counts!(
        "meal_plan_option_votes",
        "EXISTS (SELECT 1 FROM meal_plan_options JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event WHERE meal_plan_options.id = meal_plan_option_votes.belongs_to_meal_plan_option AND meal_plan_events.belongs_to_meal_plan = $8 AND meal_plan_options.belongs_to_meal_plan_event = $9) AND meal_plan_option_votes.belongs_to_meal_plan_option = $10"
    ),
    " FROM meal_plan_option_votes",
    list_where!(
        "meal_plan_option_votes",
        "EXISTS (SELECT 1 FROM meal_plan_options JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event WHERE meal_plan_options.id = meal_plan_option_votes.belongs_to_meal_plan_option AND meal_plan_events.belongs_to_meal_plan = $8 AND meal_plan_options.belongs_to_meal_plan_event = $9) AND meal_plan_option_votes.belongs_to_meal_plan_option = $10"
    )
);

pub const CREATE_MEAL_PLAN_OPTION_VOTE: &str = "INSERT INTO meal_plan_option_votes (
    id, rank, abstain, notes, by_user, belongs_to_meal_plan_option, created_at
) VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const UPDATE_MEAL_PLAN_OPTION_VOTE: &str = "UPDATE meal_plan_option_votes SET
    rank = $2, abstain = $3, notes = $4, last_updated_at = GREATEST($7, created_at)
WHERE archived_at IS NULL AND id = $1 AND by_user = $5 AND belongs_to_meal_plan_option = $6";

pub const ARCHIVE_MEAL_PLAN_OPTION_VOTE: &str = "UPDATE meal_plan_option_votes SET archived_at = NOW()
WHERE archived_at IS NULL AND belongs_to_meal_plan_option = $1 AND id = $2";

/// Binds `$1` (id) through `$6` (belongs_to_meal_plan_option).
fn bind_meal_plan_option_vote<'q>(
    query: Query<'q, Postgres, PgArguments>,
    row: &'q MealPlanOptionVoteRow,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&row.id)
        .bind(row.rank)
        .bind(row.abstain)
        .bind(&row.notes)
        .bind(&row.by_user)
        .bind(&row.belongs_to_meal_plan_option)
}

pub async fn meal_plan_option_vote_exists<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
    vote_id: &str,
) -> DbResult<bool> {
    let query = sqlx::query(MEAL_PLAN_OPTION_VOTE_EXISTS)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id)
        .bind(vote_id);
    fetch_exists(query, exec).await
}

pub async fn get_meal_plan_option_vote<'e, E: PgExecutor<'e>>(
    exec: E,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
    vote_id: &str,
) -> DbResult<Option<MealPlanOptionVoteRow>> {
    let query = sqlx::query(GET_MEAL_PLAN_OPTION_VOTE)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id)
        .bind(vote_id);
    fetch_optional(query, exec).await
}

pub async fn get_meal_plan_option_votes_for_options<'e, E: PgExecutor<'e>>(
    exec: E,
    option_ids: &[String],
) -> DbResult<Vec<MealPlanOptionVoteRow>> {
    fetch_all(
        sqlx::query(GET_MEAL_PLAN_OPTION_VOTES_FOR_OPTIONS).bind(option_ids),
        exec,
    )
    .await
}

pub async fn get_meal_plan_option_votes<'e, E: PgExecutor<'e>>(
    exec: E,
    filter: &QueryFilter,
    meal_plan_id: &str,
    event_id: &str,
    option_id: &str,
) -> DbResult<Vec<Counted<MealPlanOptionVoteRow>>> {
    let query = list_query(GET_MEAL_PLAN_OPTION_VOTES, filter)
        .bind(meal_plan_id)
        .bind(event_id)
        .bind(option_id);
    fetch_all(query, exec).await
}

pub async fn create_meal_plan_option_vote<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanOptionVoteRow,
) -> DbResult<u64> {
    let query = bind_meal_plan_option_vote(sqlx::query(CREATE_MEAL_PLAN_OPTION_VOTE), row);
    execute(query.bind(row.created_at), exec).await
}

pub async fn update_meal_plan_option_vote<'e, E: PgExecutor<'e>>(
    exec: E,
    row: &MealPlanOptionVoteRow,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let query = bind_meal_plan_option_vote(sqlx::query(UPDATE_MEAL_PLAN_OPTION_VOTE), row);
    execute(query.bind(now), exec).await
}

pub async fn archive_meal_plan_option_vote<'e, E: PgExecutor<'e>>(
    exec: E,
    option_id: &str,
    vote_id: &str,
) -> DbResult<u64> {
    execute(
        sqlx::query(ARCHIVE_MEAL_PLAN_OPTION_VOTE).bind(option_id).bind(vote_id),
        exec,
    )
    .await
}

// =============================================================================
// Cascading Archive
// =============================================================================

/// Archives everything below one plan, votes first.
pub const ARCHIVE_CHILDREN_OF_MEAL_PLAN: [&str; 3] = [
    "UPDATE meal_plan_option_votes SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_meal_plan_option IN (
        SELECT meal_plan_options.id FROM meal_plan_options
        JOIN meal_plan_events ON meal_plan_events.id = meal_plan_options.belongs_to_meal_plan_event
        WHERE meal_plan_events.belongs_to_meal_plan = $1
    )",
    "UPDATE meal_plan_options SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_meal_plan_event IN (
        SELECT id FROM meal_plan_events WHERE belongs_to_meal_plan = $1
    )",
    "UPDATE meal_plan_events SET archived_at = NOW()
    WHERE archived_at IS NULL AND belongs_to_meal_plan = $1",
];

pub async fn archive_children_of_meal_plan(
    conn: &mut PgConnection,
    meal_plan_id: &str,
) -> DbResult<u64> {
    let mut touched = 0;
    for sql in ARCHIVE_CHILDREN_OF_MEAL_PLAN {
        touched += execute(sqlx::query(sql).bind(meal_plan_id), &mut *conn).await?;
    }
    Ok(touched)
}

pub const LIST_QUERIES: &[ListQuery] = &[
    ListQuery { name: "get_meal_plans_for_household", sql: GET_MEAL_PLANS_FOR_HOUSEHOLD },
    ListQuery { name: "get_meal_plan_events", sql: GET_MEAL_PLAN_EVENTS },
    ListQuery { name: "get_meal_plan_options", sql: GET_MEAL_PLAN_OPTIONS },
    ListQuery { name: "get_meal_plan_option_votes", sql: GET_MEAL_PLAN_OPTION_VOTES },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_only_touches_unfinalized_plans() {
        assert!(FINALIZE_MEAL_PLAN.contains("status = 'awaiting_votes'"));
        assert!(FINALIZE_MEAL_PLAN.contains("belongs_to_household = $1"));
    }

    #[test]
    fn test_option_reads_check_the_plan() {
        for sql in [MEAL_PLAN_OPTION_EXISTS, GET_MEAL_PLAN_OPTION, FINALIZE_MEAL_PLAN_OPTION] {
            assert!(sql.contains("meal_plan_events.belongs_to_meal_plan = $1"), "{sql}");
        }
    }

    #[test]
    fn test_vote_list_binds_three_owners() {
        for owner in ["$8", "$9", "$10"] {
            assert!(GET_MEAL_PLAN_OPTION_VOTES.contains(owner));
        }
    }
}
