//! # Recipe Step Child Repository
//!
//! Ingredients, products, instruments, vessels and completion conditions of
//! a recipe step. Reads are scoped by recipe and step; a child reached
//! through the wrong parent is `NotFound`.
//!
//! The `new_*` builders and `insert_*_in` helpers are shared with the step
//! and recipe aggregates in [`super::recipes`], which insert children inside
//! their own transactions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dinner_core::{
    QueryFilter, QueryFilteredResult, RecipeStep, RecipeStepCompletionCondition,
    RecipeStepCompletionConditionDatabaseCreationInput, RecipeStepCompletionConditionIngredient,
    RecipeStepIngredient, RecipeStepIngredientDatabaseCreationInput, RecipeStepInstrument,
    RecipeStepInstrumentDatabaseCreationInput, RecipeStepProduct,
    RecipeStepProductDatabaseCreationInput, RecipeStepVessel, RecipeStepVesselDatabaseCreationInput,
    ValidIngredient, ValidInstrument, ValidMeasurementUnit, ValidVessel, ValidationError,
};
use sqlx::PgConnection;
use tracing::{debug, info, instrument};

use crate::codec::{
    float32_range_with_optional_max, narrow, narrow_optional, optional_decimal_from_f32,
    optional_f32_from_decimal, optional_float32_range, optional_uint32_range, parse_enum,
    uint16_range_with_optional_max, uint32_range_with_optional_max, DecimalPair,
};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::recipe_step_children::{
    self as q, RecipeStepCompletionConditionIngredientRow, RecipeStepCompletionConditionRow,
    RecipeStepIngredientRow, RecipeStepIngredientWideRow, RecipeStepInstrumentRow,
    RecipeStepInstrumentWideRow, RecipeStepProductRow, RecipeStepProductWideRow,
    RecipeStepVesselRow, RecipeStepVesselWideRow,
};
use crate::repository::valid_enumerations::{
    valid_ingredient_from_row, valid_instrument_from_row, valid_measurement_unit_from_row,
    valid_vessel_from_row,
};
use crate::repository::{filter_or_default, into_filtered_result};

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn recipe_step_ingredient_from_row(
    (row, ingredient, unit): RecipeStepIngredientWideRow,
) -> DbResult<RecipeStepIngredient> {
    let ingredient = match (ingredient, row.ingredient_id) {
        (Some(ingredient), _) => Some(valid_ingredient_from_row(ingredient)?),
        (None, Some(id)) => Some(ValidIngredient {
            id,
            ..Default::default()
        }),
        (None, None) => None,
    };

    Ok(RecipeStepIngredient {
        quantity: float32_range_with_optional_max(
            "quantity_value",
            row.minimum_quantity_value,
            row.maximum_quantity_value,
        )?,
        option_index: narrow("option_index", row.option_index)?,
        vessel_index: narrow_optional("vessel_index", row.vessel_index)?,
        product_percentage_to_use: optional_f32_from_decimal(
            "product_percentage_to_use",
            row.product_percentage_to_use,
        )?,
        measurement_unit: valid_measurement_unit_from_row(unit),
        ingredient,
        id: row.id,
        name: row.name,
        optional: row.optional,
        quantity_notes: row.quantity_notes,
        ingredient_notes: row.ingredient_notes,
        recipe_step_product_id: row.recipe_step_product_id,
        to_taste: row.to_taste,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_step_ingredient_row(ingredient: &RecipeStepIngredient) -> DbResult<RecipeStepIngredientRow> {
    let quantity = DecimalPair::from_float32_range_with_optional_max("quantity", &ingredient.quantity)?;

    Ok(RecipeStepIngredientRow {
        id: ingredient.id.clone(),
        name: ingredient.name.clone(),
        optional: ingredient.optional,
        ingredient_id: ingredient.ingredient.as_ref().map(|i| i.id.clone()),
        measurement_unit: ingredient.measurement_unit.id.clone(),
        minimum_quantity_value: quantity.min.unwrap_or_default(),
        maximum_quantity_value: quantity.max,
        quantity_notes: ingredient.quantity_notes.clone(),
        ingredient_notes: ingredient.ingredient_notes.clone(),
        recipe_step_product_id: ingredient.recipe_step_product_id.clone(),
        option_index: i32::from(ingredient.option_index),
        vessel_index: ingredient.vessel_index.map(i32::from),
        product_percentage_to_use: optional_decimal_from_f32(
            "product_percentage_to_use",
            ingredient.product_percentage_to_use,
        )?,
        to_taste: ingredient.to_taste,
        belongs_to_recipe_step: ingredient.belongs_to_recipe_step.clone(),
        created_at: ingredient.created_at,
        last_updated_at: ingredient.last_updated_at,
        archived_at: ingredient.archived_at,
    })
}

pub(crate) fn recipe_step_product_from_row(
    (row, unit): RecipeStepProductWideRow,
) -> DbResult<RecipeStepProduct> {
    let measurement_unit = match (unit, row.measurement_unit) {
        (Some(unit), _) => Some(valid_measurement_unit_from_row(unit)),
        (None, Some(id)) => Some(ValidMeasurementUnit {
            id,
            ..Default::default()
        }),
        (None, None) => None,
    };

    Ok(RecipeStepProduct {
        product_type: parse_enum("product_type", &row.product_type)?,
        quantity: optional_float32_range(
            "quantity_value",
            row.minimum_quantity_value,
            row.maximum_quantity_value,
        )?,
        storage_duration_in_seconds: optional_uint32_range(
            "storage_duration_in_seconds",
            row.minimum_storage_duration_in_seconds,
            row.maximum_storage_duration_in_seconds,
        )?,
        storage_temperature_in_celsius: optional_float32_range(
            "storage_temperature_in_celsius",
            row.minimum_storage_temperature_in_celsius,
            row.maximum_storage_temperature_in_celsius,
        )?,
        index: narrow("index", row.index)?,
        contained_in_vessel_index: narrow_optional(
            "contained_in_vessel_index",
            row.contained_in_vessel_index,
        )?,
        measurement_unit,
        id: row.id,
        name: row.name,
        quantity_notes: row.quantity_notes,
        compostable: row.compostable,
        storage_instructions: row.storage_instructions,
        is_liquid: row.is_liquid,
        is_waste: row.is_waste,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_step_product_row(product: &RecipeStepProduct) -> DbResult<RecipeStepProductRow> {
    let quantity = DecimalPair::from_optional_float32_range("quantity", &product.quantity)?;
    let temperature = DecimalPair::from_optional_float32_range(
        "storage_temperature_in_celsius",
        &product.storage_temperature_in_celsius,
    )?;

    Ok(RecipeStepProductRow {
        id: product.id.clone(),
        name: product.name.clone(),
        product_type: product.product_type.as_str().to_string(),
        measurement_unit: product.measurement_unit.as_ref().map(|u| u.id.clone()),
        minimum_quantity_value: quantity.min,
        maximum_quantity_value: quantity.max,
        quantity_notes: product.quantity_notes.clone(),
        compostable: product.compostable,
        minimum_storage_duration_in_seconds: product.storage_duration_in_seconds.min.map(i64::from),
        maximum_storage_duration_in_seconds: product.storage_duration_in_seconds.max.map(i64::from),
        minimum_storage_temperature_in_celsius: temperature.min,
        maximum_storage_temperature_in_celsius: temperature.max,
        storage_instructions: product.storage_instructions.clone(),
        is_liquid: product.is_liquid,
        is_waste: product.is_waste,
        index: i32::from(product.index),
        contained_in_vessel_index: product.contained_in_vessel_index.map(i32::from),
        belongs_to_recipe_step: product.belongs_to_recipe_step.clone(),
        created_at: product.created_at,
        last_updated_at: product.last_updated_at,
        archived_at: product.archived_at,
    })
}

pub(crate) fn recipe_step_instrument_from_row(
    (row, instrument): RecipeStepInstrumentWideRow,
) -> DbResult<RecipeStepInstrument> {
    let instrument = match (instrument, row.instrument_id) {
        (Some(instrument), _) => Some(valid_instrument_from_row(instrument)),
        (None, Some(id)) => Some(ValidInstrument {
            id,
            ..Default::default()
        }),
        (None, None) => None,
    };

    Ok(RecipeStepInstrument {
        preference_rank: narrow("preference_rank", row.preference_rank)?,
        option_index: narrow("option_index", row.option_index)?,
        quantity: uint32_range_with_optional_max("quantity", row.minimum_quantity, row.maximum_quantity)?,
        instrument,
        id: row.id,
        recipe_step_product_id: row.recipe_step_product_id,
        name: row.name,
        notes: row.notes,
        optional: row.optional,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_step_instrument_row(instrument: &RecipeStepInstrument) -> RecipeStepInstrumentRow {
    RecipeStepInstrumentRow {
        id: instrument.id.clone(),
        instrument_id: instrument.instrument.as_ref().map(|i| i.id.clone()),
        recipe_step_product_id: instrument.recipe_step_product_id.clone(),
        name: instrument.name.clone(),
        notes: instrument.notes.clone(),
        preference_rank: i32::from(instrument.preference_rank),
        optional: instrument.optional,
        option_index: i32::from(instrument.option_index),
        minimum_quantity: i64::from(instrument.quantity.min),
        maximum_quantity: instrument.quantity.max.map(i64::from),
        belongs_to_recipe_step: instrument.belongs_to_recipe_step.clone(),
        created_at: instrument.created_at,
        last_updated_at: instrument.last_updated_at,
        archived_at: instrument.archived_at,
    }
}

pub(crate) fn recipe_step_vessel_from_row(
    (row, vessel): RecipeStepVesselWideRow,
) -> DbResult<RecipeStepVessel> {
    let vessel = match (vessel, row.valid_vessel_id) {
        (Some(vessel), _) => Some(valid_vessel_from_row(vessel)?),
        (None, Some(id)) => Some(ValidVessel {
            id,
            ..Default::default()
        }),
        (None, None) => None,
    };

    Ok(RecipeStepVessel {
        quantity: uint16_range_with_optional_max("quantity", row.minimum_quantity, row.maximum_quantity)?,
        vessel,
        id: row.id,
        recipe_step_product_id: row.recipe_step_product_id,
        name: row.name,
        notes: row.notes,
        vessel_preposition: row.vessel_preposition,
        unavailable_after_step: row.unavailable_after_step,
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn recipe_step_vessel_row(vessel: &RecipeStepVessel) -> RecipeStepVesselRow {
    RecipeStepVesselRow {
        id: vessel.id.clone(),
        valid_vessel_id: vessel.vessel.as_ref().map(|v| v.id.clone()),
        recipe_step_product_id: vessel.recipe_step_product_id.clone(),
        name: vessel.name.clone(),
        notes: vessel.notes.clone(),
        vessel_preposition: vessel.vessel_preposition.clone(),
        minimum_quantity: i32::from(vessel.quantity.min),
        maximum_quantity: vessel.quantity.max.map(i32::from),
        unavailable_after_step: vessel.unavailable_after_step,
        belongs_to_recipe_step: vessel.belongs_to_recipe_step.clone(),
        created_at: vessel.created_at,
        last_updated_at: vessel.last_updated_at,
        archived_at: vessel.archived_at,
    }
}

fn completion_condition_from_row(row: RecipeStepCompletionConditionRow) -> RecipeStepCompletionCondition {
    RecipeStepCompletionCondition {
        id: row.id,
        ingredient_state: row.ingredient_state,
        notes: row.notes,
        optional: row.optional,
        ingredients: Vec::new(),
        belongs_to_recipe_step: row.belongs_to_recipe_step,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

fn completion_condition_ingredient_from_row(
    row: RecipeStepCompletionConditionIngredientRow,
) -> RecipeStepCompletionConditionIngredient {
    RecipeStepCompletionConditionIngredient {
        id: row.id,
        belongs_to_recipe_step_completion_condition: row.belongs_to_recipe_step_completion_condition,
        recipe_step_ingredient: row.recipe_step_ingredient,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

/// Groups decoded children by the step they belong to.
fn by_step<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> DbResult<T>,
    step_of: impl Fn(&T) -> &str,
) -> DbResult<BTreeMap<String, Vec<T>>> {
    let mut grouped: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        let child = convert(row)?;
        grouped.entry(step_of(&child).to_string()).or_default().push(child);
    }
    Ok(grouped)
}

impl Querier {
    // =========================================================================
    // Builders and in-transaction inserts
    // =========================================================================

    pub(crate) fn new_recipe_step_ingredient(
        &self,
        input: &RecipeStepIngredientDatabaseCreationInput,
        step_id: &str,
        now: DateTime<Utc>,
    ) -> RecipeStepIngredient {
        RecipeStepIngredient {
            id: self.new_id(),
            name: input.name.clone(),
            optional: input.optional,
            ingredient: input.ingredient_id.as_ref().map(|id| ValidIngredient {
                id: id.clone(),
                ..Default::default()
            }),
            measurement_unit: ValidMeasurementUnit {
                id: input.measurement_unit_id.clone(),
                ..Default::default()
            },
            quantity: input.quantity,
            quantity_notes: input.quantity_notes.clone(),
            ingredient_notes: input.ingredient_notes.clone(),
            recipe_step_product_id: input.recipe_step_product_id.clone(),
            option_index: input.option_index,
            vessel_index: input.vessel_index,
            product_percentage_to_use: input.product_percentage_to_use,
            to_taste: input.to_taste,
            belongs_to_recipe_step: step_id.to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        }
    }

    pub(crate) fn new_recipe_step_product(
        &self,
        input: &RecipeStepProductDatabaseCreationInput,
        step_id: &str,
        now: DateTime<Utc>,
    ) -> RecipeStepProduct {
        RecipeStepProduct {
            id: self.new_id(),
            name: input.name.clone(),
            product_type: input.product_type,
            measurement_unit: input.measurement_unit_id.as_ref().map(|id| ValidMeasurementUnit {
                id: id.clone(),
                ..Default::default()
            }),
            quantity: input.quantity,
            quantity_notes: input.quantity_notes.clone(),
            compostable: input.compostable,
            storage_duration_in_seconds: input.storage_duration_in_seconds,
            storage_temperature_in_celsius: input.storage_temperature_in_celsius,
            storage_instructions: input.storage_instructions.clone(),
            is_liquid: input.is_liquid,
            is_waste: input.is_waste,
            index: input.index,
            contained_in_vessel_index: input.contained_in_vessel_index,
            belongs_to_recipe_step: step_id.to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        }
    }

    pub(crate) fn new_recipe_step_instrument(
        &self,
        input: &RecipeStepInstrumentDatabaseCreationInput,
        step_id: &str,
        now: DateTime<Utc>,
    ) -> RecipeStepInstrument {
        RecipeStepInstrument {
            id: self.new_id(),
            instrument: input.instrument_id.as_ref().map(|id| ValidInstrument {
                id: id.clone(),
                ..Default::default()
            }),
            recipe_step_product_id: input.recipe_step_product_id.clone(),
            name: input.name.clone(),
            notes: input.notes.clone(),
            preference_rank: input.preference_rank,
            optional: input.optional,
            option_index: input.option_index,
            quantity: input.quantity,
            belongs_to_recipe_step: step_id.to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        }
    }

    pub(crate) fn new_recipe_step_vessel(
        &self,
        input: &RecipeStepVesselDatabaseCreationInput,
        step_id: &str,
        now: DateTime<Utc>,
    ) -> RecipeStepVessel {
        RecipeStepVessel {
            id: self.new_id(),
            vessel: input.vessel_id.as_ref().map(|id| ValidVessel {
                id: id.clone(),
                ..Default::default()
            }),
            recipe_step_product_id: input.recipe_step_product_id.clone(),
            name: input.name.clone(),
            notes: input.notes.clone(),
            vessel_preposition: input.vessel_preposition.clone(),
            quantity: input.quantity,
            unavailable_after_step: input.unavailable_after_step,
            belongs_to_recipe_step: step_id.to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        }
    }

    pub(crate) async fn insert_recipe_step_ingredient_in(
        &self,
        conn: &mut PgConnection,
        ingredient: &RecipeStepIngredient,
    ) -> DbResult<()> {
        let row = recipe_step_ingredient_row(ingredient)?;
        q::create_recipe_step_ingredient(&mut *conn, &row).await?;
        Ok(())
    }

    pub(crate) async fn insert_recipe_step_product_in(
        &self,
        conn: &mut PgConnection,
        product: &RecipeStepProduct,
    ) -> DbResult<()> {
        let row = recipe_step_product_row(product)?;
        q::create_recipe_step_product(&mut *conn, &row).await?;
        Ok(())
    }

    pub(crate) async fn insert_recipe_step_instrument_in(
        &self,
        conn: &mut PgConnection,
        instrument: &RecipeStepInstrument,
    ) -> DbResult<()> {
        q::create_recipe_step_instrument(&mut *conn, &recipe_step_instrument_row(instrument)).await?;
        Ok(())
    }

    pub(crate) async fn insert_recipe_step_vessel_in(
        &self,
        conn: &mut PgConnection,
        vessel: &RecipeStepVessel,
    ) -> DbResult<()> {
        q::create_recipe_step_vessel(&mut *conn, &recipe_step_vessel_row(vessel)).await?;
        Ok(())
    }

    /// Inserts a completion condition and one link row per referenced step
    /// ingredient.
    pub(crate) async fn insert_recipe_step_completion_condition_in(
        &self,
        conn: &mut PgConnection,
        input: &RecipeStepCompletionConditionDatabaseCreationInput,
        step_id: &str,
        ingredient_ids: Vec<String>,
        now: DateTime<Utc>,
    ) -> DbResult<RecipeStepCompletionCondition> {
        let row = RecipeStepCompletionConditionRow {
            id: self.new_id(),
            ingredient_state: input.ingredient_state.clone(),
            notes: input.notes.clone(),
            optional: input.optional,
            belongs_to_recipe_step: step_id.to_string(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        q::create_recipe_step_completion_condition(&mut *conn, &row).await?;

        let mut ingredients = Vec::with_capacity(ingredient_ids.len());
        for ingredient_id in ingredient_ids {
            let link = RecipeStepCompletionConditionIngredientRow {
                id: self.new_id(),
                belongs_to_recipe_step_completion_condition: row.id.clone(),
                recipe_step_ingredient: ingredient_id,
                created_at: now,
                last_updated_at: None,
                archived_at: None,
            };
            q::create_recipe_step_completion_condition_ingredient(&mut *conn, &link).await?;
            ingredients.push(completion_condition_ingredient_from_row(link));
        }

        let mut condition = completion_condition_from_row(row);
        condition.ingredients = ingredients;
        Ok(condition)
    }

    /// Loads every child of the given steps in one query per child kind.
    pub(crate) async fn attach_recipe_step_children(&self, steps: &mut [RecipeStep]) -> DbResult<()> {
        if steps.is_empty() {
            return Ok(());
        }
        let step_ids: Vec<String> = steps.iter().map(|s| s.id.clone()).collect();

        let mut ingredients = by_step(
            q::get_recipe_step_ingredients_for_steps(self.pool(), &step_ids).await?,
            recipe_step_ingredient_from_row,
            |c| c.belongs_to_recipe_step.as_str(),
        )?;
        let mut products = by_step(
            q::get_recipe_step_products_for_steps(self.pool(), &step_ids).await?,
            recipe_step_product_from_row,
            |c| c.belongs_to_recipe_step.as_str(),
        )?;
        let mut instruments = by_step(
            q::get_recipe_step_instruments_for_steps(self.pool(), &step_ids).await?,
            recipe_step_instrument_from_row,
            |c| c.belongs_to_recipe_step.as_str(),
        )?;
        let mut vessels = by_step(
            q::get_recipe_step_vessels_for_steps(self.pool(), &step_ids).await?,
            recipe_step_vessel_from_row,
            |c| c.belongs_to_recipe_step.as_str(),
        )?;

        let mut conditions: Vec<RecipeStepCompletionCondition> =
            q::get_recipe_step_completion_conditions_for_steps(self.pool(), &step_ids)
                .await?
                .into_iter()
                .map(completion_condition_from_row)
                .collect();
        self.attach_completion_condition_ingredients(&mut conditions).await?;
        let mut conditions = by_step(conditions, Ok, |c| c.belongs_to_recipe_step.as_str())?;

        for step in steps.iter_mut() {
            step.ingredients = ingredients.remove(&step.id).unwrap_or_default();
            step.products = products.remove(&step.id).unwrap_or_default();
            step.instruments = instruments.remove(&step.id).unwrap_or_default();
            step.vessels = vessels.remove(&step.id).unwrap_or_default();
            step.completion_conditions = conditions.remove(&step.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn attach_completion_condition_ingredients(
        &self,
        conditions: &mut [RecipeStepCompletionCondition],
    ) -> DbResult<()> {
        if conditions.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = conditions.iter().map(|c| c.id.clone()).collect();
        let rows = q::get_recipe_step_completion_condition_ingredients_for_conditions(self.pool(), &ids).await?;

        let mut by_condition: BTreeMap<String, Vec<RecipeStepCompletionConditionIngredient>> = BTreeMap::new();
        for row in rows {
            let ingredient = completion_condition_ingredient_from_row(row);
            by_condition
                .entry(ingredient.belongs_to_recipe_step_completion_condition.clone())
                .or_default()
                .push(ingredient);
        }
        for condition in conditions.iter_mut() {
            condition.ingredients = by_condition.remove(&condition.id).unwrap_or_default();
        }
        Ok(())
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_step_ingredient_exists(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_ingredient_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_ingredient_id])?;

        q::recipe_step_ingredient_exists(self.pool(), recipe_id, recipe_step_id, recipe_step_ingredient_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe step ingredient existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_step_ingredient(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_ingredient_id: &str,
    ) -> DbResult<RecipeStepIngredient> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_ingredient_id])?;

        q::get_recipe_step_ingredient(self.pool(), recipe_id, recipe_step_id, recipe_step_ingredient_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_step_ingredient_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe step ingredient"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_step_ingredients(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStepIngredient>> {
        require_ids(&[recipe_id, recipe_step_id])?;
        let filter = filter_or_default(filter);

        q::get_recipe_step_ingredients(self.pool(), &filter, recipe_id, recipe_step_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_step_ingredient_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe step ingredients"))
    }

    #[instrument(skip(self, input), fields(recipe_step_id = %input.belongs_to_recipe_step))]
    pub async fn create_recipe_step_ingredient(
        &self,
        input: &RecipeStepIngredientDatabaseCreationInput,
    ) -> DbResult<RecipeStepIngredient> {
        input.validate()?;
        require_id(&input.belongs_to_recipe_step)?;

        let ingredient = self.new_recipe_step_ingredient(input, &input.belongs_to_recipe_step, self.now());
        let row = recipe_step_ingredient_row(&ingredient)?;

        q::create_recipe_step_ingredient(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating recipe step ingredient"))?;

        info!(id = %ingredient.id, "Created recipe step ingredient");
        Ok(ingredient)
    }

    #[instrument(skip(self, ingredient), fields(id = %ingredient.id))]
    pub async fn update_recipe_step_ingredient(&self, ingredient: &RecipeStepIngredient) -> DbResult<()> {
        require_ids(&[&ingredient.id, &ingredient.belongs_to_recipe_step])?;
        ingredient.quantity.validate("quantity")?;
        let row = recipe_step_ingredient_row(ingredient)?;

        q::update_recipe_step_ingredient(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step ingredient"))?;

        debug!(id = %ingredient.id, "Updated recipe step ingredient");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_step_ingredient(
        &self,
        recipe_step_id: &str,
        recipe_step_ingredient_id: &str,
    ) -> DbResult<()> {
        require_ids(&[recipe_step_id, recipe_step_ingredient_id])?;

        q::archive_recipe_step_ingredient(self.pool(), recipe_step_id, recipe_step_ingredient_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe step ingredient"))?;

        info!(id = %recipe_step_ingredient_id, "Archived recipe step ingredient");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_step_product_exists(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_product_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_product_id])?;

        q::recipe_step_product_exists(self.pool(), recipe_id, recipe_step_id, recipe_step_product_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe step product existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_step_product(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_product_id: &str,
    ) -> DbResult<RecipeStepProduct> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_product_id])?;

        q::get_recipe_step_product(self.pool(), recipe_id, recipe_step_id, recipe_step_product_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_step_product_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe step product"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_step_products(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStepProduct>> {
        require_ids(&[recipe_id, recipe_step_id])?;
        let filter = filter_or_default(filter);

        q::get_recipe_step_products(self.pool(), &filter, recipe_id, recipe_step_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_step_product_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe step products"))
    }

    #[instrument(skip(self, input), fields(recipe_step_id = %input.belongs_to_recipe_step))]
    pub async fn create_recipe_step_product(
        &self,
        input: &RecipeStepProductDatabaseCreationInput,
    ) -> DbResult<RecipeStepProduct> {
        input.validate()?;
        require_id(&input.belongs_to_recipe_step)?;

        let product = self.new_recipe_step_product(input, &input.belongs_to_recipe_step, self.now());
        let row = recipe_step_product_row(&product)?;

        q::create_recipe_step_product(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating recipe step product"))?;

        info!(id = %product.id, "Created recipe step product");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn update_recipe_step_product(&self, product: &RecipeStepProduct) -> DbResult<()> {
        require_ids(&[&product.id, &product.belongs_to_recipe_step])?;
        let row = recipe_step_product_row(product)?;

        q::update_recipe_step_product(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step product"))?;

        debug!(id = %product.id, "Updated recipe step product");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_step_product(
        &self,
        recipe_step_id: &str,
        recipe_step_product_id: &str,
    ) -> DbResult<()> {
        require_ids(&[recipe_step_id, recipe_step_product_id])?;

        q::archive_recipe_step_product(self.pool(), recipe_step_id, recipe_step_product_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe step product"))?;

        info!(id = %recipe_step_product_id, "Archived recipe step product");
        Ok(())
    }

    // =========================================================================
    // Instruments
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_step_instrument_exists(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_instrument_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_instrument_id])?;

        q::recipe_step_instrument_exists(self.pool(), recipe_id, recipe_step_id, recipe_step_instrument_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe step instrument existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_step_instrument(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_instrument_id: &str,
    ) -> DbResult<RecipeStepInstrument> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_instrument_id])?;

        q::get_recipe_step_instrument(self.pool(), recipe_id, recipe_step_id, recipe_step_instrument_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_step_instrument_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe step instrument"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_step_instruments(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStepInstrument>> {
        require_ids(&[recipe_id, recipe_step_id])?;
        let filter = filter_or_default(filter);

        q::get_recipe_step_instruments(self.pool(), &filter, recipe_id, recipe_step_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_step_instrument_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe step instruments"))
    }

    #[instrument(skip(self, input), fields(recipe_step_id = %input.belongs_to_recipe_step))]
    pub async fn create_recipe_step_instrument(
        &self,
        input: &RecipeStepInstrumentDatabaseCreationInput,
    ) -> DbResult<RecipeStepInstrument> {
        input.validate()?;
        require_id(&input.belongs_to_recipe_step)?;

        let instrument = self.new_recipe_step_instrument(input, &input.belongs_to_recipe_step, self.now());

        q::create_recipe_step_instrument(self.pool(), &recipe_step_instrument_row(&instrument))
            .await
            .map_err(|err| prepare_error(err, "creating recipe step instrument"))?;

        info!(id = %instrument.id, "Created recipe step instrument");
        Ok(instrument)
    }

    #[instrument(skip(self, instrument), fields(id = %instrument.id))]
    pub async fn update_recipe_step_instrument(&self, instrument: &RecipeStepInstrument) -> DbResult<()> {
        require_ids(&[&instrument.id, &instrument.belongs_to_recipe_step])?;
        instrument.quantity.validate("quantity")?;

        q::update_recipe_step_instrument(self.pool(), &recipe_step_instrument_row(instrument), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step instrument"))?;

        debug!(id = %instrument.id, "Updated recipe step instrument");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_step_instrument(
        &self,
        recipe_step_id: &str,
        recipe_step_instrument_id: &str,
    ) -> DbResult<()> {
        require_ids(&[recipe_step_id, recipe_step_instrument_id])?;

        q::archive_recipe_step_instrument(self.pool(), recipe_step_id, recipe_step_instrument_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe step instrument"))?;

        info!(id = %recipe_step_instrument_id, "Archived recipe step instrument");
        Ok(())
    }

    // =========================================================================
    // Vessels
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_step_vessel_exists(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_vessel_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_vessel_id])?;

        q::recipe_step_vessel_exists(self.pool(), recipe_id, recipe_step_id, recipe_step_vessel_id)
            .await
            .map_err(|err| prepare_error(err, "checking recipe step vessel existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_recipe_step_vessel(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_vessel_id: &str,
    ) -> DbResult<RecipeStepVessel> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_vessel_id])?;

        q::get_recipe_step_vessel(self.pool(), recipe_id, recipe_step_id, recipe_step_vessel_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(recipe_step_vessel_from_row)
            .map_err(|err| prepare_error(err, "fetching recipe step vessel"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_step_vessels(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStepVessel>> {
        require_ids(&[recipe_id, recipe_step_id])?;
        let filter = filter_or_default(filter);

        q::get_recipe_step_vessels(self.pool(), &filter, recipe_id, recipe_step_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, recipe_step_vessel_from_row))
            .map_err(|err| prepare_error(err, "fetching recipe step vessels"))
    }

    #[instrument(skip(self, input), fields(recipe_step_id = %input.belongs_to_recipe_step))]
    pub async fn create_recipe_step_vessel(
        &self,
        input: &RecipeStepVesselDatabaseCreationInput,
    ) -> DbResult<RecipeStepVessel> {
        input.validate()?;
        require_id(&input.belongs_to_recipe_step)?;

        let vessel = self.new_recipe_step_vessel(input, &input.belongs_to_recipe_step, self.now());

        q::create_recipe_step_vessel(self.pool(), &recipe_step_vessel_row(&vessel))
            .await
            .map_err(|err| prepare_error(err, "creating recipe step vessel"))?;

        info!(id = %vessel.id, "Created recipe step vessel");
        Ok(vessel)
    }

    #[instrument(skip(self, vessel), fields(id = %vessel.id))]
    pub async fn update_recipe_step_vessel(&self, vessel: &RecipeStepVessel) -> DbResult<()> {
        require_ids(&[&vessel.id, &vessel.belongs_to_recipe_step])?;
        vessel.quantity.validate("quantity")?;

        q::update_recipe_step_vessel(self.pool(), &recipe_step_vessel_row(vessel), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step vessel"))?;

        debug!(id = %vessel.id, "Updated recipe step vessel");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_step_vessel(
        &self,
        recipe_step_id: &str,
        recipe_step_vessel_id: &str,
    ) -> DbResult<()> {
        require_ids(&[recipe_step_id, recipe_step_vessel_id])?;

        q::archive_recipe_step_vessel(self.pool(), recipe_step_id, recipe_step_vessel_id)
            .await
            .map_err(|err| prepare_error(err, "archiving recipe step vessel"))?;

        info!(id = %recipe_step_vessel_id, "Archived recipe step vessel");
        Ok(())
    }

    // =========================================================================
    // Completion Conditions
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn recipe_step_completion_condition_exists(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_completion_condition_id: &str,
    ) -> DbResult<bool> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_completion_condition_id])?;

        q::recipe_step_completion_condition_exists(
            self.pool(),
            recipe_id,
            recipe_step_id,
            recipe_step_completion_condition_id,
        )
        .await
        .map_err(|err| prepare_error(err, "checking recipe step completion condition existence"))
    }

    /// Fetches a completion condition with its referenced step ingredients.
    #[instrument(skip(self))]
    pub async fn get_recipe_step_completion_condition(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        recipe_step_completion_condition_id: &str,
    ) -> DbResult<RecipeStepCompletionCondition> {
        require_ids(&[recipe_id, recipe_step_id, recipe_step_completion_condition_id])?;

        let result: DbResult<RecipeStepCompletionCondition> = async {
            let row = q::get_recipe_step_completion_condition(
                self.pool(),
                recipe_id,
                recipe_step_id,
                recipe_step_completion_condition_id,
            )
            .await?
            .ok_or(DbError::NotFound)?;

            let mut conditions = [completion_condition_from_row(row)];
            self.attach_completion_condition_ingredients(&mut conditions).await?;
            let [condition] = conditions;
            Ok(condition)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching recipe step completion condition"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_recipe_step_completion_conditions(
        &self,
        recipe_id: &str,
        recipe_step_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<RecipeStepCompletionCondition>> {
        require_ids(&[recipe_id, recipe_step_id])?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<RecipeStepCompletionCondition>> = async {
            let rows =
                q::get_recipe_step_completion_conditions(self.pool(), &filter, recipe_id, recipe_step_id).await?;
            let mut page = into_filtered_result(rows, &filter, |row| Ok(completion_condition_from_row(row)))?;
            self.attach_completion_condition_ingredients(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching recipe step completion conditions"))
    }

    /// Creates a completion condition and its ingredient links in one
    /// transaction.
    ///
    /// Only `ingredient_ids` are honoured here; positional
    /// `ingredient_indices` are resolved when the condition is created
    /// together with its step.
    #[instrument(skip(self, input), fields(recipe_step_id = %input.belongs_to_recipe_step))]
    pub async fn create_recipe_step_completion_condition(
        &self,
        input: &RecipeStepCompletionConditionDatabaseCreationInput,
    ) -> DbResult<RecipeStepCompletionCondition> {
        require_id(&input.belongs_to_recipe_step)?;
        if !input.ingredient_indices.is_empty() {
            return Err(ValidationError::OutOfRange {
                field: "completion condition ingredient index".to_string(),
                min: 0,
                max: -1,
            }
            .into());
        }
        for ingredient_id in &input.ingredient_ids {
            require_id(ingredient_id)?;
        }

        let mut tx = self.begin("beginning recipe step completion condition creation transaction").await?;
        let outcome = self
            .insert_recipe_step_completion_condition_in(
                &mut tx,
                input,
                &input.belongs_to_recipe_step,
                input.ingredient_ids.clone(),
                self.now(),
            )
            .await;

        match outcome {
            Ok(condition) => {
                Querier::commit(tx, "committing recipe step completion condition creation transaction").await?;
                info!(id = %condition.id, ingredients = condition.ingredients.len(), "Created recipe step completion condition");
                Ok(condition)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating recipe step completion condition"))
            }
        }
    }

    /// Updates the condition's own fields; its ingredient links are fixed.
    #[instrument(skip(self, condition), fields(id = %condition.id))]
    pub async fn update_recipe_step_completion_condition(
        &self,
        condition: &RecipeStepCompletionCondition,
    ) -> DbResult<()> {
        require_ids(&[&condition.id, &condition.belongs_to_recipe_step])?;

        let row = RecipeStepCompletionConditionRow {
            id: condition.id.clone(),
            ingredient_state: condition.ingredient_state.clone(),
            notes: condition.notes.clone(),
            optional: condition.optional,
            belongs_to_recipe_step: condition.belongs_to_recipe_step.clone(),
            created_at: condition.created_at,
            last_updated_at: condition.last_updated_at,
            archived_at: condition.archived_at,
        };

        q::update_recipe_step_completion_condition(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating recipe step completion condition"))?;

        debug!(id = %condition.id, "Updated recipe step completion condition");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_recipe_step_completion_condition(
        &self,
        recipe_step_id: &str,
        recipe_step_completion_condition_id: &str,
    ) -> DbResult<()> {
        require_ids(&[recipe_step_id, recipe_step_completion_condition_id])?;

        let mut tx = self.begin("beginning recipe step completion condition archive transaction").await?;
        let outcome: DbResult<u64> = async {
            q::archive_recipe_step_completion_condition_ingredients(&mut *tx, recipe_step_completion_condition_id)
                .await?;
            q::archive_recipe_step_completion_condition(&mut *tx, recipe_step_id, recipe_step_completion_condition_id)
                .await
        }
        .await;

        match outcome {
            Ok(archived) => {
                Querier::commit(tx, "committing recipe step completion condition archive transaction").await?;
                info!(id = %recipe_step_completion_condition_id, archived, "Archived recipe step completion condition");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving recipe step completion condition"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinner_core::{Float32RangeWithOptionalMax, RecipeStepProductType};
    use rust_decimal::Decimal;

    fn measurement_unit_row() -> crate::queries::valid_enumerations::ValidMeasurementUnitRow {
        crate::queries::valid_enumerations::ValidMeasurementUnitRow {
            id: "gram".to_string(),
            name: "gram".to_string(),
            plural_name: "grams".to_string(),
            description: String::new(),
            icon_path: String::new(),
            slug: "gram".to_string(),
            volumetric: false,
            universal: false,
            metric: true,
            imperial: false,
            last_indexed_at: None,
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    fn ingredient_row() -> RecipeStepIngredientRow {
        RecipeStepIngredientRow {
            id: "rsi".to_string(),
            name: "flour".to_string(),
            optional: false,
            ingredient_id: None,
            measurement_unit: "gram".to_string(),
            minimum_quantity_value: Decimal::new(250, 0),
            maximum_quantity_value: None,
            quantity_notes: String::new(),
            ingredient_notes: String::new(),
            recipe_step_product_id: Some("product".to_string()),
            option_index: 0,
            vessel_index: Some(1),
            product_percentage_to_use: Some(Decimal::new(5, 1)),
            to_taste: false,
            belongs_to_recipe_step: "step".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    #[test]
    fn test_ingredient_from_earlier_product_has_no_valid_ingredient() {
        let ingredient = recipe_step_ingredient_from_row((ingredient_row(), None, measurement_unit_row())).unwrap();

        assert!(ingredient.ingredient.is_none());
        assert_eq!(ingredient.recipe_step_product_id.as_deref(), Some("product"));
        assert_eq!(ingredient.measurement_unit.name, "gram");
        assert_eq!(ingredient.quantity, Float32RangeWithOptionalMax::new(250.0, None));
        assert_eq!(ingredient.vessel_index, Some(1));
        assert_eq!(ingredient.product_percentage_to_use, Some(0.5));
    }

    #[test]
    fn test_negative_option_index_is_integrity_error() {
        let mut row = ingredient_row();
        row.option_index = -1;

        let err = recipe_step_ingredient_from_row((row, None, measurement_unit_row())).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }

    #[test]
    fn test_product_row_keeps_type_and_unit_reference() {
        let product = RecipeStepProduct {
            id: "p".to_string(),
            name: "dough".to_string(),
            product_type: RecipeStepProductType::Ingredient,
            measurement_unit: Some(ValidMeasurementUnit {
                id: "gram".to_string(),
                ..Default::default()
            }),
            quantity: Default::default(),
            quantity_notes: String::new(),
            compostable: false,
            storage_duration_in_seconds: dinner_core::OptionalUint32Range::new(Some(60), None),
            storage_temperature_in_celsius: Default::default(),
            storage_instructions: String::new(),
            is_liquid: false,
            is_waste: false,
            index: 2,
            contained_in_vessel_index: None,
            belongs_to_recipe_step: "step".to_string(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let row = recipe_step_product_row(&product).unwrap();
        assert_eq!(row.product_type, "ingredient");
        assert_eq!(row.measurement_unit.as_deref(), Some("gram"));
        assert_eq!(row.minimum_storage_duration_in_seconds, Some(60));
        assert_eq!(row.index, 2);
    }

    #[test]
    fn test_children_group_by_step() {
        let grouped = by_step(
            vec![("a", 1), ("b", 2), ("a", 3)],
            Ok,
            |(step, _)| *step,
        )
        .unwrap();

        assert_eq!(grouped["a"], vec![("a", 1), ("a", 3)]);
        assert_eq!(grouped["b"], vec![("b", 2)]);
    }
}
