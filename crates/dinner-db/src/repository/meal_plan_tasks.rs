//! # Meal Plan Task Repository
//!
//! Tasks hang off a chosen option and point at the recipe prep task they
//! come from. Reads carry the option (with its meal) and the prep task
//! (with its steps). Tasks are never archived; a status change is the only
//! write after creation.
//!
//! ```text
//! status change ──► Finished ──► completed_at = now
//!               └─► anything else ──► completed_at cleared
//! ```

use chrono::{DateTime, Utc};
use dinner_core::{
    MealPlanOption, MealPlanTask, MealPlanTaskDatabaseCreationInput, MealPlanTaskStatus,
    MealPlanTaskStatusChangeRequestInput, RecipePrepTask,
};
use tracing::{debug, info, instrument};

use crate::codec::parse_enum;
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::meal_plan_tasks::{self as q, MealPlanTaskRow, MealPlanTaskWideRow};
use crate::repository::meal_plans::meal_plan_option_from_row;
use crate::repository::recipe_prep_tasks::recipe_prep_task_from_row;

// =============================================================================
// Conversions
// =============================================================================

fn meal_plan_task_from_row((row, option, prep_task): MealPlanTaskWideRow) -> DbResult<MealPlanTask> {
    Ok(MealPlanTask {
        meal_plan_option: meal_plan_option_from_row(option)?,
        recipe_prep_task: recipe_prep_task_from_row(prep_task)?,
        status: parse_enum("status", &row.status)?,
        id: row.id,
        creation_explanation: row.creation_explanation,
        status_explanation: row.status_explanation,
        assigned_to_user: row.assigned_to_user,
        completed_at: row.completed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
    })
}

fn meal_plan_task_row(task: &MealPlanTask) -> MealPlanTaskRow {
    MealPlanTaskRow {
        id: task.id.clone(),
        belongs_to_meal_plan_option: task.meal_plan_option.id.clone(),
        belongs_to_recipe_prep_task: task.recipe_prep_task.id.clone(),
        creation_explanation: task.creation_explanation.clone(),
        status: task.status.as_str().to_string(),
        status_explanation: task.status_explanation.clone(),
        assigned_to_user: task.assigned_to_user.clone(),
        completed_at: task.completed_at,
        created_at: task.created_at,
        last_updated_at: task.last_updated_at,
    }
}

fn completed_at_for(status: MealPlanTaskStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (status == MealPlanTaskStatus::Finished).then_some(now)
}

impl Querier {
    fn new_meal_plan_task(&self, input: &MealPlanTaskDatabaseCreationInput) -> MealPlanTask {
        MealPlanTask {
            id: self.new_id(),
            meal_plan_option: MealPlanOption {
                id: input.meal_plan_option_id.clone(),
                ..Default::default()
            },
            recipe_prep_task: RecipePrepTask {
                id: input.recipe_prep_task_id.clone(),
                ..Default::default()
            },
            creation_explanation: input.creation_explanation.clone(),
            status: MealPlanTaskStatus::Unfinished,
            status_explanation: input.status_explanation.clone(),
            assigned_to_user: input.assigned_to_user.clone(),
            completed_at: None,
            created_at: self.now(),
            last_updated_at: None,
        }
    }

    async fn meal_plan_tasks_from_rows(&self, rows: Vec<MealPlanTaskWideRow>) -> DbResult<Vec<MealPlanTask>> {
        let mut tasks = rows
            .into_iter()
            .map(meal_plan_task_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        let mut prep_tasks: Vec<RecipePrepTask> =
            tasks.iter().map(|task| task.recipe_prep_task.clone()).collect();
        self.attach_recipe_prep_task_steps(&mut prep_tasks).await?;
        for (task, prep_task) in tasks.iter_mut().zip(prep_tasks) {
            task.recipe_prep_task = prep_task;
        }
        Ok(tasks)
    }

    #[instrument(skip(self))]
    pub async fn meal_plan_task_exists(&self, meal_plan_id: &str, task_id: &str) -> DbResult<bool> {
        require_ids(&[meal_plan_id, task_id])?;

        q::meal_plan_task_exists(self.pool(), meal_plan_id, task_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal plan task existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_task(&self, meal_plan_id: &str, task_id: &str) -> DbResult<MealPlanTask> {
        require_ids(&[meal_plan_id, task_id])?;

        let outcome: DbResult<MealPlanTask> = async {
            let row = q::get_meal_plan_task(self.pool(), meal_plan_id, task_id)
                .await?
                .ok_or(DbError::NotFound)?;
            self.meal_plan_tasks_from_rows(vec![row])
                .await?
                .pop()
                .ok_or(DbError::NotFound)
        }
        .await;

        outcome.map_err(|err| prepare_error(err, "fetching meal plan task"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal_plan_tasks_for_meal_plan(&self, meal_plan_id: &str) -> DbResult<Vec<MealPlanTask>> {
        require_id(meal_plan_id)?;

        let outcome: DbResult<Vec<MealPlanTask>> = async {
            let rows = q::get_meal_plan_tasks_for_meal_plan(self.pool(), meal_plan_id).await?;
            self.meal_plan_tasks_from_rows(rows).await
        }
        .await;

        outcome.map_err(|err| prepare_error(err, "fetching meal plan tasks for meal plan"))
    }

    /// Tasks on an option that are still unfinished or postponed.
    #[instrument(skip(self))]
    pub async fn get_incomplete_meal_plan_tasks_for_option(
        &self,
        option_id: &str,
    ) -> DbResult<Vec<MealPlanTask>> {
        require_id(option_id)?;

        let outcome: DbResult<Vec<MealPlanTask>> = async {
            let rows = q::get_incomplete_meal_plan_tasks_for_option(self.pool(), option_id).await?;
            self.meal_plan_tasks_from_rows(rows).await
        }
        .await;

        outcome.map_err(|err| prepare_error(err, "fetching incomplete meal plan tasks"))
    }

    /// New tasks start unfinished. The returned task carries only the IDs of
    /// its option and prep task.
    #[instrument(skip(self, input), fields(option_id = %input.meal_plan_option_id))]
    pub async fn create_meal_plan_task(
        &self,
        input: &MealPlanTaskDatabaseCreationInput,
    ) -> DbResult<MealPlanTask> {
        input.validate()?;

        let task = self.new_meal_plan_task(input);
        q::create_meal_plan_task(self.pool(), &meal_plan_task_row(&task))
            .await
            .map_err(|err| prepare_error(err, "creating meal plan task"))?;

        info!(id = %task.id, "Created meal plan task");
        Ok(task)
    }

    /// Writes every task for a plan and flags the plan as having its tasks
    /// created, in one transaction.
    #[instrument(skip(self, inputs), fields(tasks = inputs.len()))]
    pub async fn create_meal_plan_tasks_for_meal_plan(
        &self,
        meal_plan_id: &str,
        inputs: &[MealPlanTaskDatabaseCreationInput],
    ) -> DbResult<Vec<MealPlanTask>> {
        require_id(meal_plan_id)?;
        for input in inputs {
            input.validate()?;
        }
        let tasks: Vec<MealPlanTask> = inputs.iter().map(|input| self.new_meal_plan_task(input)).collect();

        let now = self.now();
        let mut tx = self.begin("beginning meal plan task creation transaction").await?;
        let outcome: DbResult<()> = async {
            for (index, task) in tasks.iter().enumerate() {
                q::create_meal_plan_task(&mut *tx, &meal_plan_task_row(task))
                    .await
                    .map_err(|err| err.context(format!("creating meal plan task #{}", index + 1)))?;
            }
            if q::mark_tasks_created(&mut *tx, meal_plan_id, now).await? == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing meal plan task creation transaction").await?;
                info!(meal_plan_id = %meal_plan_id, tasks = tasks.len(), "Created meal plan tasks");
                Ok(tasks)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal plan tasks"))
            }
        }
    }

    /// Moving to `Finished` stamps `completed_at`; any other status clears it.
    #[instrument(skip(self, input), fields(id = %input.id, status = %input.status.as_str()))]
    pub async fn change_meal_plan_task_status(
        &self,
        input: &MealPlanTaskStatusChangeRequestInput,
    ) -> DbResult<()> {
        require_id(&input.id)?;

        let now = self.now();
        let changed = q::change_meal_plan_task_status(
            self.pool(),
            &input.id,
            input.status.as_str(),
            &input.status_explanation,
            completed_at_for(input.status, now),
            now,
        )
        .await
        .and_then(|changed| if changed == 0 { Err(DbError::NotFound) } else { Ok(changed) })
        .map_err(|err| prepare_error(err, "changing meal plan task status"))?;

        debug!(id = %input.id, rows = changed, "Changed meal plan task status");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_finished_tasks_are_stamped_complete() {
        let now = Utc::now();

        assert_eq!(completed_at_for(MealPlanTaskStatus::Finished, now), Some(now));
        for status in MealPlanTaskStatus::ALL.iter().filter(|s| **s != MealPlanTaskStatus::Finished) {
            assert_eq!(completed_at_for(*status, now), None, "{status:?}");
        }
    }

    #[test]
    fn test_task_row_points_at_option_and_prep_task() {
        let task = MealPlanTask {
            id: "task".to_string(),
            meal_plan_option: MealPlanOption {
                id: "option".to_string(),
                ..Default::default()
            },
            recipe_prep_task: RecipePrepTask {
                id: "prep".to_string(),
                ..Default::default()
            },
            creation_explanation: "chosen for tuesday".to_string(),
            status: MealPlanTaskStatus::Postponed,
            status_explanation: String::new(),
            assigned_to_user: None,
            completed_at: None,
            created_at: Utc::now(),
            last_updated_at: None,
        };

        let row = meal_plan_task_row(&task);
        assert_eq!(row.belongs_to_meal_plan_option, "option");
        assert_eq!(row.belongs_to_recipe_prep_task, "prep");
        assert_eq!(row.status, "postponed");
    }
}
