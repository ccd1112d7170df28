//! # Recipe Repository
//!
//! Recipes, their steps, media and ratings. Step children live in
//! [`super::recipe_step_children`].
//!
//! ## Nested Step Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   create_recipe_step (one transaction)                  │
//! │                                                                         │
//! │  INSERT recipe_steps                                                    │
//! │    ├── ingredients             #1, #2, ..  (input order kept)           │
//! │    ├── products                #1, #2, ..                               │
//! │    ├── instruments             #1, #2, ..                               │
//! │    ├── vessels                 #1, #2, ..                               │
//! │    └── completion conditions   #1, #2, ..  (indices → ingredient IDs)   │
//! │                                                                         │
//! │  any failure ──► ROLLBACK, error names the child: "... ingredient #2"  │
//! │  success     ──► COMMIT, step returned with every child populated      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `create_recipe` nests the same step insert one level up, so a recipe
//! with all of its steps is either fully visible or not at all.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dinner_core::{
    QueryFilter, QueryFilteredResult, Recipe, RecipeDatabaseCreationInput, RecipeMedia,
    RecipeMediaDatabaseCreationInput, RecipeRating, RecipeRatingDatabaseCreationInput, RecipeStep,
    RecipeStepDatabaseCreationInput, ValidPreparation, ValidationError,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument};

use crate::codec::{
    decimal_from_f32, f32_from_decimal, float32_range_with_optional_max, narrow, optional_float32_range,
    optional_uint32_range, parse_enum, DecimalPair,
};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::recipe_step_children::archive_children_of_steps;
use crate::queries::recipes::{
    self as q, RecipeMediaRow, RecipeRatingRow, RecipeRow, RecipeStepRow, RecipeStepWithPreparationRow,
};
use crate::repository::valid_enumerations::valid_preparation_from_row;
use crate::repository::{filter_or_default, into_filtered_result, SEARCH_LIMIT};

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn recipe_from_row(row: RecipeRow) -> DbResult<Recipe> {
    Ok(Recipe {
        estimated_portions: float32_range_with_optional_max(
            "estimated_portions",
            row.min_estimated_portions,
            row.max_estimated_portions,
        )?,
        yields_component_type: parse_enum("yields_component_type", &row.yields_component_type)?,
        id: row.id,
        name: row.name,
        slug: row.slug,
        source: row.source,
        description: row.description,
        inspired_by_recipe_id: row.inspired_by_recipe_id,
        portion_name: row.portion_name,
        plural_portion_name: row.plural_portion_name,
        seal_of_approval: row.seal_of_approval,
        eligible_for_meals: row.eligible_for_meals,
        created_by_user: row.created_by_user,
        steps: Vec::new(),
        media: Vec::new(),
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_row(recipe: &Recipe) -> DbResult<RecipeRow> {
    let portions =
        DecimalPair::from_float32_range_with_optional_max("estimated_portions", &recipe.estimated_portions)?;

    Ok(RecipeRow {
        id: recipe.id.clone(),
        name: recipe.name.clone(),
        slug: recipe.slug.clone(),
        source: recipe.source.clone(),
        description: recipe.description.clone(),
        inspired_by_recipe_id: recipe.inspired_by_recipe_id.clone(),
        min_estimated_portions: portions.min.unwrap_or_default(),
        max_estimated_portions: portions.max,
        portion_name: recipe.portion_name.clone(),
        plural_portion_name: recipe.plural_portion_name.clone(),
        seal_of_approval: recipe.seal_of_approval,
        eligible_for_meals: recipe.eligible_for_meals,
        yields_component_type: recipe.yields_component_type.as_str().to_string(),
        created_by_user: recipe.created_by_user.clone(),
        last_indexed_at: recipe.last_indexed_at,
        created_at: recipe.created_at,
        last_updated_at: recipe.last_updated_at,
        archived_at: recipe.archived_at,
    })
}

pub(crate) fn recipe_step_from_row((row, preparation): RecipeStepWithPreparationRow) -> DbResult<RecipeStep> {
    Ok(RecipeStep {
        index: narrow("index", row.index)?,
        preparation: valid_preparation_from_row(preparation)?,
        estimated_time_in_seconds: optional_uint32_range(
            "estimated_time_in_seconds",
            row.minimum_estimated_time_in_seconds,
            row.maximum_estimated_time_in_seconds,
        )?,
        temperature_in_celsius: optional_float32_range(
            "temperature_in_celsius",
            row.minimum_temperature_in_celsius,
            row.maximum_temperature_in_celsius,
        )?,
        id: row.id,
        notes: row.notes,
        explicit_instructions: row.explicit_instructions,
        condition_expression: row.condition_expression,
        optional: row.optional,
        start_timer_automatically: row.start_timer_automatically,
        belongs_to_recipe: row.belongs_to_recipe,
        ingredients: Vec::new(),
        products: Vec::new(),
        instruments: Vec::new(),
        vessels: Vec::new(),
        completion_conditions: Vec::new(),
        media: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_step_row(step: &RecipeStep) -> DbResult<RecipeStepRow> {
    let temperature =
        DecimalPair::from_optional_float32_range("temperature_in_celsius", &step.temperature_in_celsius)?;

    Ok(RecipeStepRow {
        id: step.id.clone(),
        index: narrow("index", step.index)?,
        preparation_id: step.preparation.id.clone(),
        minimum_estimated_time_in_seconds: step.estimated_time_in_seconds.min.map(i64::from),
        maximum_estimated_time_in_seconds: step.estimated_time_in_seconds.max.map(i64::from),
        minimum_temperature_in_celsius: temperature.min,
        maximum_temperature_in_celsius: temperature.max,
        notes: step.notes.clone(),
        explicit_instructions: step.explicit_instructions.clone(),
        condition_expression: step.condition_expression.clone(),
        optional: step.optional,
        start_timer_automatically: step.start_timer_automatically,
        belongs_to_recipe: step.belongs_to_recipe.clone(),
        created_at: step.created_at,
        last_updated_at: step.last_updated_at,
        archived_at: step.archived_at,
    })
}

pub(crate) fn recipe_media_from_row(row: RecipeMediaRow) -> DbResult<RecipeMedia> {
    Ok(RecipeMedia {
        index: narrow("index", row.index)?,
        id: row.id,
        belongs_to_recipe: row.belongs_to_recipe,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        mime_type: row.mime_type,
        internal_path: row.internal_path,
        external_path: row.external_path,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_media_row(media: &RecipeMedia) -> RecipeMediaRow {
    RecipeMediaRow {
        id: media.id.clone(),
        belongs_to_recipe: media.belongs_to_recipe.clone(),
        belongs_to_recipe_step: media.belongs_to_recipe_step.clone(),
        mime_type: media.mime_type.clone(),
        internal_path: media.internal_path.clone(),
        external_path: media.external_path.clone(),
        index: i32::from(media.index),
        created_at: media.created_at,
        last_updated_at: media.last_updated_at,
        archived_at: media.archived_at,
    }
}

pub(crate) fn recipe_rating_from_row(row: RecipeRatingRow) -> DbResult<RecipeRating> {
    Ok(RecipeRating {
        taste: f32_from_decimal("taste", row.taste)?,
        difficulty: f32_from_decimal("difficulty", row.difficulty)?,
        cleanup: f32_from_decimal("cleanup", row.cleanup)?,
        instructions: f32_from_decimal("instructions", row.instructions)?,
        overall: f32_from_decimal("overall", row.overall)?,
        id: row.id,
        recipe_id: row.recipe_id,
        notes: row.notes,
        by_user: row.by_user,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_rating_row(rating: &RecipeRating) -> DbResult<RecipeRatingRow> {
    Ok(RecipeRatingRow {
        id: rating.id.clone(),
        recipe_id: rating.recipe_id.clone(),
        taste: decimal_from_f32("taste", rating.taste)?,
        difficulty: decimal_from_f32("difficulty", rating.difficulty)?,
        cleanup: decimal_from_f32("cleanup", rating.cleanup)?,
        instructions: decimal_from_f32("instructions", rating.instructions)?,
        overall: decimal_from_f32("overall", rating.overall)?,
        notes: rating.notes.clone(),
        by_user: rating.by_user.clone(),
        created_at: rating.created_at,
        last_updated_at: rating.last_updated_at,
        archived_at: rating.archived_at,
    })
}

/// Splits media between the recipe and the steps they were attached to.
/// Media pointing at a step that is not in `steps` stays on the recipe.
fn distribute_media(recipe: &mut Recipe, media: Vec<RecipeMedia>) {
    let positions: BTreeMap<String, usize> =
        recipe.steps.iter().enumerate().map(|(i, step)| (step.id.clone(), i)).collect();

    for item in media {
        let position = item
            .belongs_to_recipe_step
            .as_ref()
            .and_then(|step_id| positions.get(step_id).copied());
        match position {
            Some(i) => recipe.steps[i].media.push(item),
            None => recipe.media.push(item),
        }
    }
}

impl Querier {
    // =========================================================================
    // Recipes
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_exists(&self, recipe_id: &str) -> DbResult<bool> {
        require_id(recipe_id)?;

        q::recipe_exists(self.pool(), recipe_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe existence"))
    }

    /// Fetches a recipe with its steps, their children and all media.
    #[instrument(skip(self))]
    pub async fn get_recipe(&self, recipe_id: &str) -> DbResult<Recipe> {
        require_id(recipe_id)?;

        let result: DbResult<Recipe> = async {
            let row = q::get_recipe(self.pool(), recipe_id).await?.ok_or(DbError::NotFound)?;
            let mut recipe = recipe_from_row(row)?;

            recipe.steps = q::get_all_recipe_steps_for_recipe(self.pool(), recipe_id)
                .await?
                .into_iter()
                .map(recipe_step_from_row)
                .collect::<DbResult<_>>()?;
            self.attach_recipe_step_children(&mut recipe.steps).await?;

            let media = q::get_all_recipe_media_for_recipe(self.pool(), recipe_id)
                .await?
                .into_iter()
                .map(recipe_media_from_row)
                .collect::<DbResult<Vec<_>>>()?;
            distribute_media(&mut recipe, media);

            Ok(recipe)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching recipe"))
    }

    /// Lists recipes without their steps.
    #[instrument(skip(self, filter))]
    pub async fn get_recipes(&self, filter: Option<&QueryFilter>) -> DbResult<QueryFilteredResult<Recipe>> {
        let filter = filter_or_default(filter);

        q::get_recipes(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_from_row))
            .map_err(|err| prepare_error(err, "fetching recipes"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipes_created_by_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<Recipe>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_recipes_created_by_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_from_row))
            .map_err(|err| prepare_error(err, "fetching recipes created by user"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_recipes(&self, query: &str) -> DbResult<Vec<Recipe>> {
        if query.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        q::search_for_recipes(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(recipe_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for recipes"))
    }

    /// Creates a recipe and every step in `input.steps` in one transaction.
    #[instrument(skip(self, input), fields(name = %input.name, steps = input.steps.len()))]
    pub async fn create_recipe(&self, input: &RecipeDatabaseCreationInput) -> DbResult<Recipe> {
        input.validate()?;
        if let Some(inspiration) = &input.inspired_by_recipe_id {
            require_id(inspiration)?;
        }

        let now = self.now();
        let mut recipe = Recipe {
            id: self.new_id(),
            name: input.name.clone(),
            slug: input.slug.clone(),
            source: input.source.clone(),
            description: input.description.clone(),
            inspired_by_recipe_id: input.inspired_by_recipe_id.clone(),
            estimated_portions: input.estimated_portions,
            portion_name: input.portion_name.clone(),
            plural_portion_name: input.plural_portion_name.clone(),
            seal_of_approval: input.seal_of_approval,
            eligible_for_meals: input.eligible_for_meals,
            yields_component_type: input.yields_component_type,
            created_by_user: input.created_by_user.clone(),
            steps: Vec::with_capacity(input.steps.len()),
            media: Vec::new(),
            last_indexed_at: None,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let row = recipe_row(&recipe)?;

        let mut tx = self.begin("beginning recipe creation transaction").await?;
        let outcome: DbResult<Vec<RecipeStep>> = async {
            q::create_recipe(&mut *tx, &row).await?;

            let mut steps = Vec::with_capacity(input.steps.len());
            for (index, step) in input.steps.iter().enumerate() {
                let step = self
                    .insert_recipe_step_in(&mut tx, step, &row.id, now)
                    .await
                    .map_err(|err| err.context(format!("creating recipe step #{}", index + 1)))?;
                steps.push(step);
            }
            Ok(steps)
        }
        .await;

        match outcome {
            Ok(steps) => {
                Querier::commit(tx, "committing recipe creation transaction").await?;
                recipe.steps = steps;
                info!(id = %recipe.id, steps = recipe.steps.len(), "Created recipe");
                Ok(recipe)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating recipe"))
            }
        }
    }

    /// Updates a recipe's own fields. Only its creator's row can change.
    #[instrument(skip(self, recipe), fields(id = %recipe.id))]
    pub async fn update_recipe(&self, recipe: &Recipe) -> DbResult<()> {
        require_ids(&[&recipe.id, &recipe.created_by_user])?;
        recipe.estimated_portions.validate("estimated_portions")?;
        let row = recipe_row(recipe)?;

        q::update_recipe(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe"))?;

        debug!(id = %recipe.id, "Updated recipe");
        Ok(())
    }

    /// Archives a recipe along with its steps and their children.
    ///
    /// Nothing cascades unless the recipe itself was archived by this call,
    /// so another user's recipe is left untouched.
    #[instrument(skip(self))]
    pub async fn archive_recipe(&self, user_id: &str, recipe_id: &str) -> DbResult<()> {
        require_ids(&[user_id, recipe_id])?;

        let mut tx = self.begin("beginning recipe archive transaction").await?;
        let outcome: DbResult<u64> = async {
            // Steps are only listed while the recipe is live.
            let step_ids: Vec<String> = q::get_all_recipe_steps_for_recipe(&mut *tx, recipe_id)
                .await?
                .into_iter()
                .map(|(step, _)| step.id)
                .collect();

            let archived = q::archive_recipe(&mut *tx, user_id, recipe_id).await?;
            if archived == 0 {
                return Ok(0);
            }

            let mut touched = archived;
            touched += q::archive_recipe_steps_for_recipe(&mut *tx, recipe_id).await?;
            if !step_ids.is_empty() {
                touched += archive_children_of_steps(&mut tx, &step_ids).await?;
            }
            Ok(touched)
        }
        .await;

        match outcome {
            Ok(touched) => {
                Querier::commit(tx, "committing recipe archive transaction").await?;
                info!(id = %recipe_id, touched, "Archived recipe");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving recipe"))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_recipe_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching recipe IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_recipe_last_indexed_at(&self, recipe_id: &str) -> DbResult<()> {
        require_id(recipe_id)?;

        q::update_recipe_last_indexed_at(self.pool(), recipe_id)
            .await
            .map_err(|err| prepare_error(err, "marking recipe as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Inserts one step and its children on `conn`, in the fixed child
    /// order. Each child failure is labelled with its kind and 1-based
    /// position.
    pub(crate) async fn insert_recipe_step_in(
        &self,
        conn: &mut PgConnection,
        input: &RecipeStepDatabaseCreationInput,
        recipe_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<RecipeStep> {
        let mut step = RecipeStep {
            id: self.new_id(),
            index: input.index,
            preparation: ValidPreparation {
                id: input.preparation_id.clone(),
                ..Default::default()
            },
            estimated_time_in_seconds: input.estimated_time_in_seconds,
            temperature_in_celsius: input.temperature_in_celsius,
            notes: input.notes.clone(),
            explicit_instructions: input.explicit_instructions.clone(),
            condition_expression: input.condition_expression.clone(),
            optional: input.optional,
            start_timer_automatically: input.start_timer_automatically,
            belongs_to_recipe: recipe_id.to_string(),
            ingredients: Vec::with_capacity(input.ingredients.len()),
            products: Vec::with_capacity(input.products.len()),
            instruments: Vec::with_capacity(input.instruments.len()),
            vessels: Vec::with_capacity(input.vessels.len()),
            completion_conditions: Vec::with_capacity(input.completion_conditions.len()),
            media: Vec::new(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };

        let row = recipe_step_row(&step)?;
        q::create_recipe_step(&mut *conn, &row).await?;

        for (index, child) in input.ingredients.iter().enumerate() {
            let ingredient = self.new_recipe_step_ingredient(child, &step.id, now);
            self.insert_recipe_step_ingredient_in(&mut *conn, &ingredient)
                .await
                .map_err(|err| err.context(format!("creating recipe step ingredient #{}", index + 1)))?;
            step.ingredients.push(ingredient);
        }

        for (index, child) in input.products.iter().enumerate() {
            let product = self.new_recipe_step_product(child, &step.id, now);
            self.insert_recipe_step_product_in(&mut *conn, &product)
                .await
                .map_err(|err| err.context(format!("creating recipe step product #{}", index + 1)))?;
            step.products.push(product);
        }

        for (index, child) in input.instruments.iter().enumerate() {
            let instrument = self.new_recipe_step_instrument(child, &step.id, now);
            self.insert_recipe_step_instrument_in(&mut *conn, &instrument)
                .await
                .map_err(|err| err.context(format!("creating recipe step instrument #{}", index + 1)))?;
            step.instruments.push(instrument);
        }

        for (index, child) in input.vessels.iter().enumerate() {
            let vessel = self.new_recipe_step_vessel(child, &step.id, now);
            self.insert_recipe_step_vessel_in(&mut *conn, &vessel)
                .await
                .map_err(|err| err.context(format!("creating recipe step vessel #{}", index + 1)))?;
            step.vessels.push(vessel);
        }

        for (index, child) in input.completion_conditions.iter().enumerate() {
            let label = format!("creating recipe step completion condition #{}", index + 1);
            let ingredient_ids = resolve_condition_ingredients(&step, &child.ingredient_ids, &child.ingredient_indices)
                .map_err(|err| DbError::from(err).context(label.clone()))?;
            let condition = self
                .insert_recipe_step_completion_condition_in(&mut *conn, child, &step.id, ingredient_ids, now)
                .await
                .map_err(|err| err.context(label))?;
            step.completion_conditions.push(condition);
        }

        Ok(step)
    }

    #[instrument(skip(self))]
    pub async fn recipe_step_exists(&self, recipe_id: &str, recipe_step_id: &str) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id])?;

        q::recipe_step_exists(self.pool(), recipe_id, recipe_step_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe step existence"))
    }

    /// Fetches a step with all of its children.
    #[instrument(skip(self))]
    pub async fn get_recipe_step(&self, recipe_id: &str, recipe_step_id: &str) -> DbResult<RecipeStep> {
        require_ids(&[recipe_id, recipe_step_id])?;

        let result: DbResult<RecipeStep> = async {
            let row = q::get_recipe_step(self.pool(), recipe_id, recipe_step_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut steps = [recipe_step_from_row(row)?];
            self.attach_recipe_step_children(&mut steps).await?;
            let [step] = steps;
            Ok(step)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching recipe step"))
    }

    /// Lists a recipe's steps, each with its children.
    #[instrument(skip(self, filter))]
    pub async fn get_recipe_steps(
        &self,
        recipe_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStep>> {
        require_id(recipe_id)?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<RecipeStep>> = async {
            let rows = q::get_recipe_steps(self.pool(), &filter, recipe_id).await?;
            let mut page = into_filtered_result(rows, &filter, recipe_step_from_row)?;
            self.attach_recipe_step_children(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching recipe steps"))
    }

    /// Creates a step and all of its children atomically.
    ///
    /// On failure nothing from this call is visible, and the error names
    /// the child that failed, e.g. `creating recipe step ingredient #2`.
    #[instrument(skip(self, input), fields(recipe_id = %input.belongs_to_recipe))]
    pub async fn create_recipe_step(&self, input: &RecipeStepDatabaseCreationInput) -> DbResult<RecipeStep> {
        input.validate()?;
        require_id(&input.belongs_to_recipe)?;

        let mut tx = self.begin("beginning recipe step creation transaction").await?;
        let outcome = self
            .insert_recipe_step_in(&mut tx, input, &input.belongs_to_recipe, self.now())
            .await;

        match outcome {
            Ok(step) => {
                Querier::commit(tx, "committing recipe step creation transaction").await?;
                info!(
                    id = %step.id,
                    ingredients = step.ingredients.len(),
                    products = step.products.len(),
                    instruments = step.instruments.len(),
                    vessels = step.vessels.len(),
                    completion_conditions = step.completion_conditions.len(),
                    "Created recipe step"
                );
                Ok(step)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating recipe step"))
            }
        }
    }

    /// Updates a step's own fields; children are updated individually.
    #[instrument(skip(self, step), fields(id = %step.id))]
    pub async fn update_recipe_step(&self, step: &RecipeStep) -> DbResult<()> {
        require_ids(&[&step.id, &step.belongs_to_recipe, &step.preparation.id])?;
        step.estimated_time_in_seconds.validate("estimated_time_in_seconds")?;
        step.temperature_in_celsius.validate("temperature_in_celsius")?;
        let row = recipe_step_row(step)?;

        q::update_recipe_step(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step"))?;

        debug!(id = %step.id, "Updated recipe step");
        Ok(())
    }

    /// Archives a step and every child it owns.
    #[instrument(skip(self))]
    pub async fn archive_recipe_step(&self, recipe_id: &str, recipe_step_id: &str) -> DbResult<()> {
        require_ids(&[recipe_id, recipe_step_id])?;

        let mut tx = self.begin("beginning recipe step archive transaction").await?;
        let outcome: DbResult<u64> = async {
            let archived = q::archive_recipe_step(&mut *tx, recipe_id, recipe_step_id).await?;
            if archived == 0 {
                return Ok(0);
            }
            let children = archive_children_of_steps(&mut tx, &[recipe_step_id.to_string()]).await?;
            Ok(archived + children)
        }
        .await;

        match outcome {
            Ok(touched) => {
                Querier::commit(tx, "committing recipe step archive transaction").await?;
                info!(id = %recipe_step_id, touched, "Archived recipe step");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving recipe step"))
            }
        }
    }

    // =========================================================================
    // Media
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_media_exists(&self, recipe_media_id: &str) -> DbResult<bool> {
        require_id(recipe_media_id)?;

        q::recipe_media_exists(self.pool(), recipe_media_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe media existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_media(&self, recipe_media_id: &str) -> DbResult<RecipeMedia> {
        require_id(recipe_media_id)?;

        q::get_recipe_media(self.pool(), recipe_media_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_media_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe media"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_media_for_recipe(
        &self,
        recipe_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeMedia>> {
        require_id(recipe_id)?;
        let filter = filter_or_default(filter);

        q::get_recipe_media_for_recipe(self.pool(), &filter, recipe_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_media_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe media for recipe"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_recipe_media(&self, input: &RecipeMediaDatabaseCreationInput) -> DbResult<RecipeMedia> {
        input.validate()?;

        let media = RecipeMedia {
            id: self.new_id(),
            belongs_to_recipe: input.belongs_to_recipe.clone(),
            belongs_to_recipe_step: input.belongs_to_recipe_step.clone(),
            mime_type: input.mime_type.clone(),
            internal_path: input.internal_path.clone(),
            external_path: input.external_path.clone(),
            index: input.index,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_recipe_media(self.pool(), &recipe_media_row(&media))
            .await
            .map_err(|err| prepare_error(err, "creating recipe media"))?;

        info!(id = %media.id, mime_type = %media.mime_type, "Created recipe media");
        Ok(media)
    }

    #[instrument(skip(self, media), fields(id = %media.id))]
    pub async fn update_recipe_media(&self, media: &RecipeMedia) -> DbResult<()> {
        require_id(&media.id)?;

        q::update_recipe_media(self.pool(), &recipe_media_row(media), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe media"))?;

        debug!(id = %media.id, "Updated recipe media");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_media(&self, recipe_media_id: &str) -> DbResult<()> {
        require_id(recipe_media_id)?;

        q::archive_recipe_media(self.pool(), recipe_media_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe media"))?;

        info!(id = %recipe_media_id, "Archived recipe media");
        Ok(())
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_rating_exists(&self, recipe_id: &str, recipe_rating_id: &str) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_rating_id])?;

        q::recipe_rating_exists(self.pool(), recipe_id, recipe_rating_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe rating existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_rating(&self, recipe_id: &str, recipe_rating_id: &str) -> DbResult<RecipeRating> {
        require_ids(&[recipe_id, recipe_rating_id])?;

        q::get_recipe_rating(self.pool(), recipe_id, recipe_rating_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_rating_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe rating"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_ratings_for_recipe(
        &self,
        recipe_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeRating>> {
        require_id(recipe_id)?;
        let filter = filter_or_default(filter);

        q::get_recipe_ratings_for_recipe(self.pool(), &filter, recipe_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_rating_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe ratings for recipe"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_ratings_for_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeRating>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        q::get_recipe_ratings_for_user(self.pool(), &filter, user_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_rating_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe ratings for user"))
    }

    #[instrument(skip(self, input), fields(recipe_id = %input.recipe_id))]
    pub async fn create_recipe_rating(&self, input: &RecipeRatingDatabaseCreationInput) -> DbResult<RecipeRating> {
        input.validate()?;
        require_ids(&[&input.recipe_id, &input.by_user])?;

        let rating = RecipeRating {
            id: self.new_id(),
            recipe_id: input.recipe_id.clone(),
            taste: input.taste,
            difficulty: input.difficulty,
            cleanup: input.cleanup,
            instructions: input.instructions,
            overall: input.overall,
            notes: input.notes.clone(),
            by_user: input.by_user.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = recipe_rating_row(&rating)?;

        q::create_recipe_rating(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating recipe rating"))?;

        info!(id = %rating.id, "Created recipe rating");
        Ok(rating)
    }

    #[instrument(skip(self, rating), fields(id = %rating.id))]
    pub async fn update_recipe_rating(&self, rating: &RecipeRating) -> DbResult<()> {
        require_ids(&[&rating.id, &rating.recipe_id])?;
        let row = recipe_rating_row(rating)?;

        q::update_recipe_rating(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe rating"))?;

        debug!(id = %rating.id, "Updated recipe rating");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_rating(&self, recipe_id: &str, recipe_rating_id: &str) -> DbResult<()> {
        require_ids(&[recipe_id, recipe_rating_id])?;

        q::archive_recipe_rating(self.pool(), recipe_id, recipe_rating_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe rating"))?;

        info!(id = %recipe_rating_id, "Archived recipe rating");
        Ok(())
    }
}

/// Collects the step ingredient IDs a completion condition points at:
/// explicit IDs first, then positions in the step's ingredient list.
fn resolve_condition_ingredients(
    step: &RecipeStep,
    ids: &[String],
    indices: &[usize],
) -> Result<Vec<String>, ValidationError> {
    let mut resolved = ids.to_vec();
    for &index in indices {
        let ingredient = step.ingredients.get(index).ok_or_else(|| ValidationError::OutOfRange {
            field: "completion condition ingredient index".to_string(),
            min: 0,
            max: step.ingredients.len() as i64 - 1,
        })?;
        resolved.push(ingredient.id.clone());
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinner_core::{ComponentType, Float32RangeWithOptionalMax, RecipeStepIngredient, ValidMeasurementUnit};
    use rust_decimal::Decimal;

    fn step(id: &str) -> RecipeStep {
        RecipeStep {
            id: id.to_string(),
            index: 0,
            preparation: ValidPreparation::default(),
            estimated_time_in_seconds: Default::default(),
            temperature_in_celsius: Default::default(),
            notes: String::new(),
            explicit_instructions: String::new(),
            condition_expression: String::new(),
            optional: false,
            start_timer_automatically: false,
            belongs_to_recipe: "recipe".to_string(),
            ingredients: Vec::new(),
            products: Vec::new(),
            instruments: Vec::new(),
            vessels: Vec::new(),
            completion_conditions: Vec::new(),
            media: Vec::new(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    fn media(id: &str, step_id: Option<&str>) -> RecipeMedia {
        RecipeMedia {
            id: id.to_string(),
            belongs_to_recipe: Some("recipe".to_string()),
            belongs_to_recipe_step: step_id.map(str::to_string),
            mime_type: "image/png".to_string(),
            internal_path: String::new(),
            external_path: String::new(),
            index: 0,
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    fn step_ingredient(id: &str) -> RecipeStepIngredient {
        RecipeStepIngredient {
            id: id.to_string(),
            name: String::new(),
            optional: false,
            ingredient: None,
            measurement_unit: ValidMeasurementUnit::default(),
            quantity: Float32RangeWithOptionalMax::default(),
            quantity_notes: String::new(),
            ingredient_notes: String::new(),
            recipe_step_product_id: None,
            option_index: 0,
            vessel_index: None,
            product_percentage_to_use: None,
            to_taste: false,
            belongs_to_recipe_step: "s".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    #[test]
    fn test_media_follow_their_step() {
        let mut recipe = Recipe {
            steps: vec![step("s1"), step("s2")],
            ..Default::default()
        };

        distribute_media(
            &mut recipe,
            vec![media("m1", None), media("m2", Some("s2")), media("m3", Some("gone"))],
        );

        let on_recipe: Vec<_> = recipe.media.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(on_recipe, vec!["m1", "m3"]);
        assert!(recipe.steps[0].media.is_empty());
        assert_eq!(recipe.steps[1].media[0].id, "m2");
    }

    #[test]
    fn test_condition_indices_resolve_to_ingredient_ids() {
        let mut s = step("s");
        s.ingredients = vec![step_ingredient("a"), step_ingredient("b")];

        let resolved = resolve_condition_ingredients(&s, &["x".to_string()], &[1, 0]).unwrap();
        assert_eq!(resolved, vec!["x", "b", "a"]);

        assert!(resolve_condition_ingredients(&s, &[], &[2]).is_err());
    }

    #[test]
    fn test_recipe_row_round_trip() {
        let recipe = Recipe {
            id: "r".to_string(),
            name: "soup".to_string(),
            estimated_portions: Float32RangeWithOptionalMax::new(2.0, Some(4.0)),
            yields_component_type: ComponentType::Soup,
            created_by_user: "u".to_string(),
            ..Default::default()
        };

        let row = recipe_row(&recipe).unwrap();
        assert_eq!(row.min_estimated_portions, Decimal::new(2, 0));
        assert_eq!(row.yields_component_type, "soup");

        let back = recipe_from_row(row).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_unknown_component_type_is_integrity_error() {
        let mut row = recipe_row(&Recipe::default()).unwrap();
        row.yields_component_type = "brunch".to_string();

        let err = recipe_from_row(row).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }

    #[test]
    fn test_rating_scores_survive_decimal_storage() {
        let rating = RecipeRating {
            id: "rating".to_string(),
            recipe_id: "r".to_string(),
            taste: 4.5,
            difficulty: 2.0,
            cleanup: 1.0,
            instructions: 3.5,
            overall: 4.0,
            notes: String::new(),
            by_user: "u".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let back = recipe_rating_from_row(recipe_rating_row(&rating).unwrap()).unwrap();
        assert_eq!(back, rating);
    }
}
