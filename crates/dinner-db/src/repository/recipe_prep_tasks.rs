//! # Recipe Prep Task Repository
//!
//! Prep tasks are scoped by their recipe and always come back with the
//! steps they cover. A task and its steps are written in one transaction;
//! updates touch the task columns only.

use dinner_core::{RecipePrepTask, RecipePrepTaskDatabaseCreationInput, RecipePrepTaskStep};
use tracing::{debug, info, instrument};

use crate::codec::{optional_float32_range, parse_enum, uint32_range_with_optional_max, DecimalPair};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::recipe_prep_tasks::{self as q, RecipePrepTaskRow, RecipePrepTaskStepRow};
use crate::repository::meal_plans::group_under;

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn recipe_prep_task_from_row(row: RecipePrepTaskRow) -> DbResult<RecipePrepTask> {
    Ok(RecipePrepTask {
        storage_temperature_in_celsius: optional_float32_range(
            "storage_temperature_in_celsius",
            row.minimum_storage_temperature_in_celsius,
            row.maximum_storage_temperature_in_celsius,
        )?,
        storage_type: row
            .storage_type
            .as_deref()
            .map(|storage_type| parse_enum("storage_type", storage_type))
            .transpose()?,
        time_buffer_before_recipe_in_seconds: uint32_range_with_optional_max(
            "time_buffer_before_recipe_in_seconds",
            row.minimum_time_buffer_before_recipe_in_seconds,
            row.maximum_time_buffer_before_recipe_in_seconds,
        )?,
        id: row.id,
        name: row.name,
        description: row.description,
        notes: row.notes,
        optional: row.optional,
        explicit_storage_instructions: row.explicit_storage_instructions,
        belongs_to_recipe: row.belongs_to_recipe,
        task_steps: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_prep_task_row(task: &RecipePrepTask) -> DbResult<RecipePrepTaskRow> {
    let temperature = DecimalPair::from_optional_float32_range(
        "storage_temperature_in_celsius",
        &task.storage_temperature_in_celsius,
    )?;
    let buffer = &task.time_buffer_before_recipe_in_seconds;

    Ok(RecipePrepTaskRow {
        id: task.id.clone(),
        name: task.name.clone(),
        description: task.description.clone(),
        notes: task.notes.clone(),
        optional: task.optional,
        explicit_storage_instructions: task.explicit_storage_instructions.clone(),
        minimum_storage_temperature_in_celsius: temperature.min,
        maximum_storage_temperature_in_celsius: temperature.max,
        storage_type: task.storage_type.map(|t| t.as_str().to_string()),
        minimum_time_buffer_before_recipe_in_seconds: i64::from(buffer.min),
        maximum_time_buffer_before_recipe_in_seconds: buffer.max.map(i64::from),
        belongs_to_recipe: task.belongs_to_recipe.clone(),
        created_at: task.created_at,
        last_updated_at: task.last_updated_at,
        archived_at: task.archived_at,
    })
}

fn recipe_prep_task_step_from_row(row: RecipePrepTaskStepRow) -> RecipePrepTaskStep {
    RecipePrepTaskStep {
        id: row.id,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        belongs_to_recipe_prep_task: row.belongs_to_recipe_prep_task,
        satisfies_recipe_step: row.satisfies_recipe_step,
    }
}

fn recipe_prep_task_step_row(step: &RecipePrepTaskStep) -> RecipePrepTaskStepRow {
    RecipePrepTaskStepRow {
        id: step.id.clone(),
        belongs_to_recipe_step: step.belongs_to_recipe_step.clone(),
        belongs_to_recipe_prep_task: step.belongs_to_recipe_prep_task.clone(),
        satisfies_recipe_step: step.satisfies_recipe_step,
    }
}

impl Querier {
    pub(crate) async fn attach_recipe_prep_task_steps(
        &self,
        tasks: &mut [RecipePrepTask],
    ) -> DbResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let steps = q::get_recipe_prep_task_steps_for_tasks(self.pool(), &ids)
            .await?
            .into_iter()
            .map(recipe_prep_task_step_from_row)
            .collect();

        group_under(
            tasks,
            steps,
            |t| t.id.as_str(),
            |s: &RecipePrepTaskStep| s.belongs_to_recipe_prep_task.as_str(),
            |t| &mut t.task_steps,
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn recipe_prep_task_exists(&self, recipe_id: &str, task_id: &str) -> DbResult<bool> {
        require_ids(&[recipe_id, task_id])?;

        q::recipe_prep_task_exists(self.pool(), recipe_id, task_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe prep task existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_prep_task(
        &self,
        recipe_id: &str,
        task_id: &str,
    ) -> DbResult<RecipePrepTask> {
        require_ids(&[recipe_id, task_id])?;

        let outcome: DbResult<RecipePrepTask> = async {
            let row = q::get_recipe_prep_task(self.pool(), recipe_id, task_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut tasks = [recipe_prep_task_from_row(row)?];
            self.attach_recipe_prep_task_steps(&mut tasks).await?;
            let [task] = tasks;
            Ok(task)
        }
        .await;

        outcome.map_err(|err| prepare_error(err, "fetching recipe prep task"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_prep_tasks_for_recipe(
        &self,
        recipe_id: &str,
    ) -> DbResult<Vec<RecipePrepTask>> {
        require_id(recipe_id)?;

        let outcome: DbResult<Vec<RecipePrepTask>> = async {
            let mut tasks = q::get_recipe_prep_tasks_for_recipe(self.pool(), recipe_id)
                .await?
                .into_iter()
                .map(recipe_prep_task_from_row)
                .collect::<DbResult<Vec<_>>>()?;
            self.attach_recipe_prep_task_steps(&mut tasks).await?;
            Ok(tasks)
        }
        .await;

        outcome.map_err(|err| prepare_error(err, "fetching recipe prep tasks for recipe"))
    }

    /// Creates a task and the steps it covers in one transaction.
    #[instrument(skip(self, input), fields(recipe_id = %input.belongs_to_recipe, steps = input.task_steps.len()))]
    pub async fn create_recipe_prep_task(
        &self,
        input: &RecipePrepTaskDatabaseCreationInput,
    ) -> DbResult<RecipePrepTask> {
        input.validate()?;

        let task_id = self.new_id();
        let task = RecipePrepTask {
            task_steps: input
                .task_steps
                .iter()
                .map(|step| RecipePrepTaskStep {
                    id: self.new_id(),
                    belongs_to_recipe_step: step.belongs_to_recipe_step.clone(),
                    belongs_to_recipe_prep_task: task_id.clone(),
                    satisfies_recipe_step: step.satisfies_recipe_step,
                })
                .collect(),
            id: task_id,
            name: input.name.clone(),
            description: input.description.clone(),
            notes: input.notes.clone(),
            optional: input.optional,
            explicit_storage_instructions: input.explicit_storage_instructions.clone(),
            storage_temperature_in_celsius: input.storage_temperature_in_celsius,
            storage_type: input.storage_type,
            time_buffer_before_recipe_in_seconds: input.time_buffer_before_recipe_in_seconds,
            belongs_to_recipe: input.belongs_to_recipe.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = recipe_prep_task_row(&task)?;

        let mut tx = self.begin("beginning recipe prep task creation transaction").await?;
        let outcome: DbResult<()> = async {
            q::create_recipe_prep_task(&mut *tx, &row).await?;
            for (index, step) in task.task_steps.iter().enumerate() {
                q::create_recipe_prep_task_step(&mut *tx, &recipe_prep_task_step_row(step))
                    .await
                    .map_err(|err| err.context(format!("creating recipe prep task step #{}", index + 1)))?;
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing recipe prep task creation transaction").await?;
                info!(id = %task.id, steps = task.task_steps.len(), "Created recipe prep task");
                Ok(task)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating recipe prep task"))
            }
        }
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    pub async fn update_recipe_prep_task(&self, task: &RecipePrepTask) -> DbResult<()> {
        require_ids(&[&task.id, &task.belongs_to_recipe])?;
        task.storage_temperature_in_celsius
            .validate("storage_temperature_in_celsius")?;
        task.time_buffer_before_recipe_in_seconds
            .validate("time_buffer_before_recipe_in_seconds")?;
        let row = recipe_prep_task_row(task)?;

        q::update_recipe_prep_task(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe prep task"))?;

        debug!(id = %task.id, "Updated recipe prep task");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_prep_task(&self, recipe_id: &str, task_id: &str) -> DbResult<()> {
        require_ids(&[recipe_id, task_id])?;

        q::archive_recipe_prep_task(self.pool(), recipe_id, task_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe prep task"))?;

        info!(id = %task_id, "Archived recipe prep task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::{OptionalFloat32Range, StorageContainerType, Uint32RangeWithOptionalMax};
    use rust_decimal::Decimal;

    fn task() -> RecipePrepTask {
        RecipePrepTask {
            id: "task".to_string(),
            name: "chill the dough".to_string(),
            storage_temperature_in_celsius: OptionalFloat32Range::new(Some(2.0), Some(5.0)),
            storage_type: Some(StorageContainerType::Covered),
            time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax::new(3600, None),
            belongs_to_recipe: "recipe".to_string(),
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prep_task_round_trips_through_columns() {
        let task = task();
        let row = recipe_prep_task_row(&task).unwrap();
        assert_eq!(row.storage_type.as_deref(), Some("covered"));
        assert_eq!(row.minimum_storage_temperature_in_celsius, Some(Decimal::new(2, 0)));
        assert_eq!(row.minimum_time_buffer_before_recipe_in_seconds, 3600);
        assert_eq!(row.maximum_time_buffer_before_recipe_in_seconds, None);

        assert_eq!(recipe_prep_task_from_row(row).unwrap(), task);
    }

    #[test]
    fn test_negative_buffer_is_integrity_error() {
        let mut row = recipe_prep_task_row(&task()).unwrap();
        row.minimum_time_buffer_before_recipe_in_seconds = -1;

        let err = recipe_prep_task_from_row(row).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }
}
