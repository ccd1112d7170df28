//! # Meal Plan Repository
//!
//! Plans, events, options and votes, all reached through their household.
//!
//! ## Loading
//! ```text
//! get_meal_plan / get_meal_plans_for_household
//!       │
//!       ├── plans                     1 query
//!       ├── events  for plan IDs      1 query  (ANY($1))
//!       ├── options for event IDs     1 query  (joined with their meal)
//!       └── votes   for option IDs    1 query
//! ```
//!
//! ## Finalization
//! Tallying happens outside the store. [`Querier::finalize_meal_plan`]
//! records the winners it is given: the plan moves to `finalized` and each
//! winning option is marked chosen, all in one transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dinner_core::{
    Meal, MealPlan, MealPlanDatabaseCreationInput, MealPlanEvent, MealPlanEventDatabaseCreationInput,
    MealPlanOption, MealPlanOptionDatabaseCreationInput, MealPlanOptionVote,
    MealPlanOptionVotesDatabaseCreationInput, MealPlanOptionWinner, MealPlanStatus, QueryFilter,
    QueryFilteredResult,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument, warn};

use crate::codec::{decimal_from_f32, f32_from_decimal, narrow, parse_enum};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::meal_plans::{
    self as q, MealPlanEventRow, MealPlanOptionRow, MealPlanOptionVoteRow, MealPlanOptionWithMealRow,
    MealPlanRow,
};
use crate::repository::meals::meal_from_row;
use crate::repository::{filter_or_default, into_filtered_result};

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn meal_plan_from_row(row: MealPlanRow) -> DbResult<MealPlan> {
    Ok(MealPlan {
        status: parse_enum("status", &row.status)?,
        election_method: parse_enum("election_method", &row.election_method)?,
        id: row.id,
        notes: row.notes,
        voting_deadline: row.voting_deadline,
        belongs_to_household: row.belongs_to_household,
        created_by_user: row.created_by_user,
        grocery_list_initialized: row.grocery_list_initialized,
        tasks_created: row.tasks_created,
        events: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_plan_row(plan: &MealPlan) -> MealPlanRow {
    MealPlanRow {
        id: plan.id.clone(),
        notes: plan.notes.clone(),
        status: plan.status.as_str().to_string(),
        voting_deadline: plan.voting_deadline,
        election_method: plan.election_method.as_str().to_string(),
        belongs_to_household: plan.belongs_to_household.clone(),
        created_by_user: plan.created_by_user.clone(),
        grocery_list_initialized: plan.grocery_list_initialized,
        tasks_created: plan.tasks_created,
        created_at: plan.created_at,
        last_updated_at: plan.last_updated_at,
        archived_at: plan.archived_at,
    }
}

fn meal_plan_event_from_row(row: MealPlanEventRow) -> DbResult<MealPlanEvent> {
    Ok(MealPlanEvent {
        meal_name: parse_enum("meal_name", &row.meal_name)?,
        id: row.id,
        notes: row.notes,
        starts_at: row.starts_at,
        ends_at: row.ends_at,
        belongs_to_meal_plan: row.belongs_to_meal_plan,
        options: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_plan_event_row(event: &MealPlanEvent) -> MealPlanEventRow {
    MealPlanEventRow {
        id: event.id.clone(),
        notes: event.notes.clone(),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        meal_name: event.meal_name.as_str().to_string(),
        belongs_to_meal_plan: event.belongs_to_meal_plan.clone(),
        created_at: event.created_at,
        last_updated_at: event.last_updated_at,
        archived_at: event.archived_at,
    }
}

pub(crate) fn meal_plan_option_from_row((row, meal): MealPlanOptionWithMealRow) -> DbResult<MealPlanOption> {
    Ok(MealPlanOption {
        meal: meal_from_row(meal)?,
        meal_scale: f32_from_decimal("meal_scale", row.meal_scale)?,
        id: row.id,
        notes: row.notes,
        chosen: row.chosen,
        tiebroken: row.tiebroken,
        assigned_cook: row.assigned_cook,
        assigned_dishwasher: row.assigned_dishwasher,
        belongs_to_meal_plan_event: row.belongs_to_meal_plan_event,
        votes: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_plan_option_row(option: &MealPlanOption) -> DbResult<MealPlanOptionRow> {
    Ok(MealPlanOptionRow {
        id: option.id.clone(),
        meal_id: option.meal.id.clone(),
        notes: option.notes.clone(),
        meal_scale: decimal_from_f32("meal_scale", option.meal_scale)?,
        chosen: option.chosen,
        tiebroken: option.tiebroken,
        assigned_cook: option.assigned_cook.clone(),
        assigned_dishwasher: option.assigned_dishwasher.clone(),
        belongs_to_meal_plan_event: option.belongs_to_meal_plan_event.clone(),
        created_at: option.created_at,
        last_updated_at: option.last_updated_at,
        archived_at: option.archived_at,
    })
}

fn meal_plan_option_vote_from_row(row: MealPlanOptionVoteRow) -> DbResult<MealPlanOptionVote> {
    Ok(MealPlanOptionVote {
        rank: narrow("rank", row.rank)?,
        id: row.id,
        abstain: row.abstain,
        notes: row.notes,
        by_user: row.by_user,
        belongs_to_meal_plan_option: row.belongs_to_meal_plan_option,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_plan_option_vote_row(vote: &MealPlanOptionVote) -> MealPlanOptionVoteRow {
    MealPlanOptionVoteRow {
        id: vote.id.clone(),
        rank: i32::from(vote.rank),
        abstain: vote.abstain,
        notes: vote.notes.clone(),
        by_user: vote.by_user.clone(),
        belongs_to_meal_plan_option: vote.belongs_to_meal_plan_option.clone(),
        created_at: vote.created_at,
        last_updated_at: vote.last_updated_at,
        archived_at: vote.archived_at,
    }
}

/// Moves each child under the parent whose key it carries.
pub(crate) fn group_under<P, C>(
    parents: &mut [P],
    children: Vec<C>,
    parent_id: impl Fn(&P) -> &str,
    child_parent: impl Fn(&C) -> &str,
    slot: impl Fn(&mut P) -> &mut Vec<C>,
) {
    let mut grouped: BTreeMap<String, Vec<C>> = BTreeMap::new();
    for child in children {
        grouped.entry(child_parent(&child).to_string()).or_default().push(child);
    }
    for parent in parents.iter_mut() {
        let key = parent_id(parent).to_string();
        *slot(parent) = grouped.remove(&key).unwrap_or_default();
    }
}

impl Querier {
    // =========================================================================
    // Tree loading
    // =========================================================================

    async fn attach_meal_plan_option_votes(&self, options: &mut [MealPlanOption]) -> DbResult<()> {
        if options.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = options.iter().map(|o| o.id.clone()).collect();
        let votes = q::get_meal_plan_option_votes_for_options(self.pool(), &ids)
            .await?
            .into_iter()
            .map(meal_plan_option_vote_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        group_under(
            options,
            votes,
            |o| o.id.as_str(),
            |v| v.belongs_to_meal_plan_option.as_str(),
            |o| &mut o.votes,
        );
        Ok(())
    }

    async fn attach_meal_plan_options(&self, events: &mut [MealPlanEvent]) -> DbResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        let mut options = q::get_meal_plan_options_for_events(self.pool(), &ids)
            .await?
            .into_iter()
            .map(meal_plan_option_from_row)
            .collect::<DbResult<Vec<_>>>()?;
        self.attach_meal_plan_option_votes(&mut options).await?;

        group_under(
            events,
            options,
            |e| e.id.as_str(),
            |o| o.belongs_to_meal_plan_event.as_str(),
            |e| &mut e.options,
        );
        Ok(())
    }

    pub(crate) async fn attach_meal_plan_events(&self, plans: &mut [MealPlan]) -> DbResult<()> {
        if plans.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = plans.iter().map(|p| p.id.clone()).collect();
        let mut events = q::get_meal_plan_events_for_plans(self.pool(), &ids)
            .await?
            .into_iter()
            .map(meal_plan_event_from_row)
            .collect::<DbResult<Vec<_>>>()?;
        self.attach_meal_plan_options(&mut events).await?;

        group_under(
            plans,
            events,
            |p| p.id.as_str(),
            |e| e.belongs_to_meal_plan.as_str(),
            |p| &mut p.events,
        );
        Ok(())
    }

    // =========================================================================
    // In-transaction inserts
    // =========================================================================

    fn new_meal_plan_option(
        &self,
        input: &MealPlanOptionDatabaseCreationInput,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> MealPlanOption {
        MealPlanOption {
            id: self.new_id(),
            meal: Meal {
                id: input.meal_id.clone(),
                ..Default::default()
            },
            notes: input.notes.clone(),
            meal_scale: input.meal_scale,
            chosen: false,
            tiebroken: false,
            assigned_cook: input.assigned_cook.clone(),
            assigned_dishwasher: input.assigned_dishwasher.clone(),
            belongs_to_meal_plan_event: event_id.to_string(),
            votes: Vec::new(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        }
    }

    async fn insert_meal_plan_event_in(
        &self,
        conn: &mut PgConnection,
        input: &MealPlanEventDatabaseCreationInput,
        meal_plan_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<MealPlanEvent> {
        let mut event = MealPlanEvent {
            id: self.new_id(),
            notes: input.notes.clone(),
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            meal_name: input.meal_name,
            belongs_to_meal_plan: meal_plan_id.to_string(),
            options: Vec::with_capacity(input.options.len()),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        q::create_meal_plan_event(&mut *conn, &meal_plan_event_row(&event)).await?;

        for (index, option) in input.options.iter().enumerate() {
            let option = self.new_meal_plan_option(option, &event.id, now);
            let row = meal_plan_option_row(&option)?;
            q::create_meal_plan_option(&mut *conn, &row)
                .await
                .map_err(|err| err.context(format!("creating meal plan option #{}", index + 1)))?;
            event.options.push(option);
        }
        Ok(event)
    }

    // =========================================================================
    // Meal Plans
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn meal_plan_exists(&self, household_id: &str, meal_plan_id: &str) -> DbResult<bool> {
        require_ids(&[household_id, meal_plan_id])?;

        q::meal_plan_exists(self.pool(), household_id, meal_plan_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal plan existence"))
    }

    /// Fetches a plan with its events, their options and every vote.
    #[instrument(skip(self))]
    pub async fn get_meal_plan(&self, household_id: &str, meal_plan_id: &str) -> DbResult<MealPlan> {
        require_ids(&[household_id, meal_plan_id])?;

        let result: DbResult<MealPlan> = async {
            let row = q::get_meal_plan(self.pool(), household_id, meal_plan_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut plans = [meal_plan_from_row(row)?];
            self.attach_meal_plan_events(&mut plans).await?;
            let [plan] = plans;
            Ok(plan)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plan"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meal_plans_for_household(
        &self,
        household_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<MealPlan>> {
        require_id(household_id)?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<MealPlan>> = async {
            let rows = q::get_meal_plans_for_household(self.pool(), &filter, household_id).await?;
            let mut page = into_filtered_result(rows, &filter, meal_plan_from_row)?;
            self.attach_meal_plan_events(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plans for household"))
    }

    /// Creates a plan with its events and their options in one transaction.
    /// New plans always start out awaiting votes.
    #[instrument(skip(self, input), fields(household_id = %input.belongs_to_household, events = input.events.len()))]
    pub async fn create_meal_plan(&self, input: &MealPlanDatabaseCreationInput) -> DbResult<MealPlan> {
        input.validate()?;
        require_ids(&[&input.belongs_to_household, &input.created_by_user])?;

        let now = self.now();
        let mut plan = MealPlan {
            id: self.new_id(),
            notes: input.notes.clone(),
            status: MealPlanStatus::AwaitingVotes,
            voting_deadline: input.voting_deadline,
            election_method: input.election_method,
            belongs_to_household: input.belongs_to_household.clone(),
            created_by_user: input.created_by_user.clone(),
            grocery_list_initialized: false,
            tasks_created: false,
            events: Vec::with_capacity(input.events.len()),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let row = meal_plan_row(&plan);

        let mut tx = self.begin("beginning meal plan creation transaction").await?;
        let outcome: DbResult<Vec<MealPlanEvent>> = async {
            q::create_meal_plan(&mut *tx, &row).await?;

            let mut events = Vec::with_capacity(input.events.len());
            for (index, event) in input.events.iter().enumerate() {
                let event = self
                    .insert_meal_plan_event_in(&mut tx, event, &row.id, now)
                    .await
                    .map_err(|err| err.context(format!("creating meal plan event #{}", index + 1)))?;
                events.push(event);
            }
            Ok(events)
        }
        .await;

        match outcome {
            Ok(events) => {
                Querier::commit(tx, "committing meal plan creation transaction").await?;
                plan.events = events;
                info!(id = %plan.id, events = plan.events.len(), "Created meal plan");
                Ok(plan)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal plan"))
            }
        }
    }

    #[instrument(skip(self, plan), fields(id = %plan.id))]
    pub async fn update_meal_plan(&self, plan: &MealPlan) -> DbResult<()> {
        require_ids(&[&plan.id, &plan.belongs_to_household])?;

        q::update_meal_plan(self.pool(), &meal_plan_row(plan), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal plan"))?;

        debug!(id = %plan.id, "Updated meal plan");
        Ok(())
    }

    /// Archives a plan and every event, option and vote below it.
    #[instrument(skip(self))]
    pub async fn archive_meal_plan(&self, household_id: &str, meal_plan_id: &str) -> DbResult<()> {
        require_ids(&[household_id, meal_plan_id])?;

        let mut tx = self.begin("beginning meal plan archive transaction").await?;
        let outcome: DbResult<u64> = async {
            let archived = q::archive_meal_plan(&mut *tx, household_id, meal_plan_id).await?;
            if archived == 0 {
                return Ok(0);
            }
            Ok(archived + q::archive_children_of_meal_plan(&mut tx, meal_plan_id).await?)
        }
        .await;

        match outcome {
            Ok(touched) => {
                Querier::commit(tx, "committing meal plan archive transaction").await?;
                info!(id = %meal_plan_id, touched, "Archived meal plan");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving meal plan"))
            }
        }
    }

    /// Records election results for a plan still awaiting votes.
    ///
    /// Returns `false` without touching anything when the plan is already
    /// finalized. A winner that does not belong to the plan is `NotFound`
    /// and nothing is recorded.
    #[instrument(skip(self, winners), fields(winners = winners.len()))]
    pub async fn finalize_meal_plan(
        &self,
        household_id: &str,
        meal_plan_id: &str,
        winners: &[MealPlanOptionWinner],
    ) -> DbResult<bool> {
        require_ids(&[household_id, meal_plan_id])?;
        for winner in winners {
            require_ids(&[&winner.meal_plan_event_id, &winner.meal_plan_option_id])?;
        }

        let now = self.now();
        let mut tx = self.begin("beginning meal plan finalization transaction").await?;
        let outcome: DbResult<bool> = async {
            if q::finalize_meal_plan(&mut *tx, household_id, meal_plan_id, now).await? == 0 {
                return Ok(false);
            }

            for (index, winner) in winners.iter().enumerate() {
                let marked = q::finalize_meal_plan_option(
                    &mut *tx,
                    meal_plan_id,
                    &winner.meal_plan_event_id,
                    &winner.meal_plan_option_id,
                    winner.tiebroken,
                    now,
                )
                .await?;
                if marked == 0 {
                    return Err(DbError::NotFound.context(format!("finalizing meal plan option #{}", index + 1)));
                }
            }
            Ok(true)
        }
        .await;

        match outcome {
            Ok(true) => {
                Querier::commit(tx, "committing meal plan finalization transaction").await?;
                info!(id = %meal_plan_id, winners = winners.len(), "Finalized meal plan");
                Ok(true)
            }
            Ok(false) => {
                Querier::rollback(tx).await;
                warn!(id = %meal_plan_id, "meal plan was not awaiting votes");
                Ok(false)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "finalizing meal plan"))
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn meal_plan_event_exists(&self, meal_plan_id: &str, meal_plan_event_id: &str) -> DbResult<bool> {
        require_ids(&[meal_plan_id, meal_plan_event_id])?;

        q::meal_plan_event_exists(self.pool(), meal_plan_id, meal_plan_event_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal plan event existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_event(&self, meal_plan_id: &str, meal_plan_event_id: &str) -> DbResult<MealPlanEvent> {
        require_ids(&[meal_plan_id, meal_plan_event_id])?;

        let result: DbResult<MealPlanEvent> = async {
            let row = q::get_meal_plan_event(self.pool(), meal_plan_id, meal_plan_event_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut events = [meal_plan_event_from_row(row)?];
            self.attach_meal_plan_options(&mut events).await?;
            let [event] = events;
            Ok(event)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plan event"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meal_plan_events(
        &self,
        meal_plan_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<MealPlanEvent>> {
        require_id(meal_plan_id)?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<MealPlanEvent>> = async {
            let rows = q::get_meal_plan_events(self.pool(), &filter, meal_plan_id).await?;
            let mut page = into_filtered_result(rows, &filter, meal_plan_event_from_row)?;
            self.attach_meal_plan_options(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plan events"))
    }

    /// Creates an event and its options in one transaction.
    #[instrument(skip(self, input), fields(meal_plan_id = %input.belongs_to_meal_plan))]
    pub async fn create_meal_plan_event(&self, input: &MealPlanEventDatabaseCreationInput) -> DbResult<MealPlanEvent> {
        input.validate()?;
        require_id(&input.belongs_to_meal_plan)?;

        let mut tx = self.begin("beginning meal plan event creation transaction").await?;
        let outcome = self
            .insert_meal_plan_event_in(&mut tx, input, &input.belongs_to_meal_plan, self.now())
            .await;

        match outcome {
            Ok(event) => {
                Querier::commit(tx, "committing meal plan event creation transaction").await?;
                info!(id = %event.id, options = event.options.len(), "Created meal plan event");
                Ok(event)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal plan event"))
            }
        }
    }

    #[instrument(skip(self, event), fields(id = %event.id))]
    pub async fn update_meal_plan_event(&self, event: &MealPlanEvent) -> DbResult<()> {
        require_ids(&[&event.id, &event.belongs_to_meal_plan])?;

        q::update_meal_plan_event(self.pool(), &meal_plan_event_row(event), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal plan event"))?;

        debug!(id = %event.id, "Updated meal plan event");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_meal_plan_event(&self, meal_plan_id: &str, meal_plan_event_id: &str) -> DbResult<()> {
        require_ids(&[meal_plan_id, meal_plan_event_id])?;

        q::archive_meal_plan_event(self.pool(), meal_plan_id, meal_plan_event_id)
            .await
            .map_err(|err| prepare_error(err, "archiving meal plan event"))?;

        info!(id = %meal_plan_event_id, "Archived meal plan event");
        Ok(())
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn meal_plan_option_exists(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id])?;

        q::meal_plan_option_exists(self.pool(), meal_plan_id, meal_plan_event_id, meal_plan_option_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal plan option existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_option(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
    ) -> DbResult<MealPlanOption> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id])?;

        let result: DbResult<MealPlanOption> = async {
            let row = q::get_meal_plan_option(self.pool(), meal_plan_id, meal_plan_event_id, meal_plan_option_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut options = [meal_plan_option_from_row(row)?];
            self.attach_meal_plan_option_votes(&mut options).await?;
            let [option] = options;
            Ok(option)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plan option"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meal_plan_options(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<MealPlanOption>> {
        require_ids(&[meal_plan_id, meal_plan_event_id])?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<MealPlanOption>> = async {
            let rows = q::get_meal_plan_options(self.pool(), &filter, meal_plan_id, meal_plan_event_id).await?;
            let mut page = into_filtered_result(rows, &filter, meal_plan_option_from_row)?;
            self.attach_meal_plan_option_votes(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal plan options"))
    }

    #[instrument(skip(self, input), fields(meal_plan_event_id = %input.belongs_to_meal_plan_event))]
    pub async fn create_meal_plan_option(
        &self,
        input: &MealPlanOptionDatabaseCreationInput,
    ) -> DbResult<MealPlanOption> {
        input.validate()?;
        require_id(&input.belongs_to_meal_plan_event)?;

        let option = self.new_meal_plan_option(input, &input.belongs_to_meal_plan_event, self.now());
        let row = meal_plan_option_row(&option)?;

        q::create_meal_plan_option(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating meal plan option"))?;

        info!(id = %option.id, meal_id = %option.meal.id, "Created meal plan option");
        Ok(option)
    }

    #[instrument(skip(self, option), fields(id = %option.id))]
    pub async fn update_meal_plan_option(&self, option: &MealPlanOption) -> DbResult<()> {
        require_ids(&[&option.id, &option.belongs_to_meal_plan_event, &option.meal.id])?;
        let row = meal_plan_option_row(option)?;

        q::update_meal_plan_option(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal plan option"))?;

        debug!(id = %option.id, "Updated meal plan option");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_meal_plan_option(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
    ) -> DbResult<()> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id])?;

        q::archive_meal_plan_option(self.pool(), meal_plan_id, meal_plan_event_id, meal_plan_option_id)
            .await
            .map_err(|err| prepare_error(err, "archiving meal plan option"))?;

        info!(id = %meal_plan_option_id, "Archived meal plan option");
        Ok(())
    }

    // =========================================================================
    // Votes
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn meal_plan_option_vote_exists(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
        meal_plan_option_vote_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id, meal_plan_option_vote_id])?;

        q::meal_plan_option_vote_exists(
            self.pool(),
            meal_plan_id,
            meal_plan_event_id,
            meal_plan_option_id,
            meal_plan_option_vote_id,
        )
        .await
        .map_err(|err| prepare_error(err, "checking meal plan option vote existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_option_vote(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
        meal_plan_option_vote_id: &str,
    ) -> DbResult<MealPlanOptionVote> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id, meal_plan_option_vote_id])?;

        q::get_meal_plan_option_vote(
            self.pool(),
            meal_plan_id,
            meal_plan_event_id,
            meal_plan_option_id,
            meal_plan_option_vote_id,
        )
        .await
        .and_then(|row| row.ok_or(DbError::NotFound))
        .and_then(meal_plan_option_vote_from_row)
        .map_err(|err| prepare_error(err, "fetching meal plan option vote"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meal_plan_option_votes(
        &self,
        meal_plan_id: &str,
        meal_plan_event_id: &str,
        meal_plan_option_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<MealPlanOptionVote>> {
        require_ids(&[meal_plan_id, meal_plan_event_id, meal_plan_option_id])?;
        let filter = filter_or_default(filter);

        q::get_meal_plan_option_votes(self.pool(), &filter, meal_plan_id, meal_plan_event_id, meal_plan_option_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, meal_plan_option_vote_from_row))
            .map_err(|err| prepare_error(err, "fetching meal plan option votes"))
    }

    /// Casts a user's whole ballot in one transaction.
    #[instrument(skip(self, input), fields(by_user = %input.by_user, votes = input.votes.len()))]
    pub async fn create_meal_plan_option_votes(
        &self,
        input: &MealPlanOptionVotesDatabaseCreationInput,
    ) -> DbResult<Vec<MealPlanOptionVote>> {
        if input.votes.is_empty() {
            return Err(DbError::NilInput);
        }
        require_id(&input.by_user)?;
        for vote in &input.votes {
            require_id(&vote.belongs_to_meal_plan_option)?;
        }

        let now = self.now();
        let votes: Vec<MealPlanOptionVote> = input
            .votes
            .iter()
            .map(|vote| MealPlanOptionVote {
                id: self.new_id(),
                rank: vote.rank,
                abstain: vote.abstain,
                notes: vote.notes.clone(),
                by_user: input.by_user.clone(),
                belongs_to_meal_plan_option: vote.belongs_to_meal_plan_option.clone(),
                created_at: now,
                last_updated_at: None,
                archived_at: None,
            })
            .collect();

        let mut tx = self.begin("beginning meal plan option vote creation transaction").await?;
        let outcome: DbResult<()> = async {
            for (index, vote) in votes.iter().enumerate() {
                q::create_meal_plan_option_vote(&mut *tx, &meal_plan_option_vote_row(vote))
                    .await
                    .map_err(|err| err.context(format!("creating meal plan option vote #{}", index + 1)))?;
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing meal plan option vote creation transaction").await?;
                info!(count = votes.len(), "Created meal plan option votes");
                Ok(votes)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal plan option votes"))
            }
        }
    }

    #[instrument(skip(self, vote), fields(id = %vote.id))]
    pub async fn update_meal_plan_option_vote(&self, vote: &MealPlanOptionVote) -> DbResult<()> {
        require_ids(&[&vote.id, &vote.by_user, &vote.belongs_to_meal_plan_option])?;

        q::update_meal_plan_option_vote(self.pool(), &meal_plan_option_vote_row(vote), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal plan option vote"))?;

        debug!(id = %vote.id, "Updated meal plan option vote");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_meal_plan_option_vote(
        &self,
        meal_plan_option_id: &str,
        meal_plan_option_vote_id: &str,
    ) -> DbResult<()> {
        require_ids(&[meal_plan_option_id, meal_plan_option_vote_id])?;

        q::archive_meal_plan_option_vote(self.pool(), meal_plan_option_id, meal_plan_option_vote_id)
            .await
            .map_err(|err| prepare_error(err, "archiving meal plan option vote"))?;

        info!(id = %meal_plan_option_vote_id, "Archived meal plan option vote");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinner_core::{MealName, ValidElectionMethod};

    #[test]
    fn test_plan_row_uses_wire_names() {
        let now = Utc::now();
        let plan = MealPlan {
            id: "plan".to_string(),
            notes: String::new(),
            status: MealPlanStatus::AwaitingVotes,
            voting_deadline: now,
            election_method: ValidElectionMethod::InstantRunoff,
            belongs_to_household: "h".to_string(),
            created_by_user: "u".to_string(),
            grocery_list_initialized: true,
            tasks_created: false,
            events: Vec::new(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let row = meal_plan_row(&plan);
        assert_eq!(row.status, "awaiting_votes");
        assert_eq!(row.election_method, "instant-runoff");
        assert_eq!(meal_plan_from_row(row).unwrap(), plan);
    }

    #[test]
    fn test_unknown_meal_name_is_integrity_error() {
        let now = Utc::now();
        let row = MealPlanEventRow {
            id: "e".to_string(),
            notes: String::new(),
            starts_at: now,
            ends_at: now,
            meal_name: "elevenses".to_string(),
            belongs_to_meal_plan: "plan".to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let err = meal_plan_event_from_row(row.clone()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);

        let event = meal_plan_event_from_row(MealPlanEventRow {
            meal_name: "dinner".to_string(),
            ..row
        })
        .unwrap();
        assert_eq!(event.meal_name, MealName::Dinner);
    }

    #[test]
    fn test_vote_rank_out_of_range_is_integrity_error() {
        let row = MealPlanOptionVoteRow {
            id: "v".to_string(),
            rank: 300,
            abstain: false,
            notes: String::new(),
            by_user: "u".to_string(),
            belongs_to_meal_plan_option: "o".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let err = meal_plan_option_vote_from_row(row).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }

    #[test]
    fn test_children_land_under_their_parent() {
        #[derive(Default)]
        struct Parent {
            id: &'static str,
            children: Vec<(&'static str, u8)>,
        }

        let mut parents = [
            Parent { id: "a", ..Default::default() },
            Parent { id: "b", ..Default::default() },
        ];
        group_under(
            &mut parents,
            vec![("b", 1), ("a", 2), ("b", 3), ("orphan", 4)],
            |p| p.id,
            |c| c.0,
            |p| &mut p.children,
        );

        assert_eq!(parents[0].children, vec![("a", 2)]);
        assert_eq!(parents[1].children, vec![("b", 1), ("b", 3)]);
    }
}
