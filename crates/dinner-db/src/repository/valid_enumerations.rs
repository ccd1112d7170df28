//! # Valid Enumeration Repository
//!
//! Globally shared catalogues. None of these are owned, so lists take no
//! owner and nothing here writes audit entries.
//!
//! ```text
//! ┌──────────────────────┬────────┬──────┬────────┬─────────┐
//! │ Family               │ search │ CRUD │ index  │ joins   │
//! ├──────────────────────┼────────┼──────┼────────┼─────────┤
//! │ ingredients          │   ✓    │  ✓   │   ✓    │         │
//! │ instruments          │   ✓    │  ✓   │   ✓    │         │
//! │ measurement units    │   ✓    │  ✓   │   ✓    │         │
//! │ preparations         │   ✓    │  ✓   │   ✓    │         │
//! │ vessels              │   ✓    │  ✓   │   ✓    │ unit    │
//! │ ingredient states    │   ✓    │  ✓   │   ✓    │         │
//! │ ingredient groups    │        │  ✓   │        │ members │
//! └──────────────────────┴────────┴──────┴────────┴─────────┘
//! ```

use std::collections::BTreeMap;

use dinner_core::{
    QueryFilter, QueryFilteredResult, ValidIngredient, ValidIngredientDatabaseCreationInput,
    ValidIngredientGroup, ValidIngredientGroupDatabaseCreationInput, ValidIngredientGroupMember,
    ValidIngredientState, ValidIngredientStateDatabaseCreationInput, ValidInstrument,
    ValidInstrumentDatabaseCreationInput, ValidMeasurementUnit,
    ValidMeasurementUnitDatabaseCreationInput, ValidPreparation,
    ValidPreparationDatabaseCreationInput, ValidVessel, ValidVesselDatabaseCreationInput,
};
use tracing::{debug, info, instrument};

use crate::codec::{
    decimal_from_f32, f32_from_decimal, optional_decimal_from_f32, optional_f32_from_decimal,
    optional_float32_range, parse_enum, uint16_range_with_optional_max, DecimalPair,
};
use crate::error::{require_id, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::valid_enumerations::{
    self as q, ValidIngredientGroupMemberWithIngredientRow, ValidIngredientGroupRow,
    ValidIngredientGroupMemberRow, ValidIngredientRow, ValidIngredientStateRow, ValidInstrumentRow,
    ValidMeasurementUnitRow, ValidPreparationRow, ValidVesselRow, ValidVesselWithUnitRow,
};
use crate::repository::{filter_or_default, into_filtered_result, SEARCH_LIMIT};

fn require_query(query: &str) -> DbResult<()> {
    if query.trim().is_empty() {
        return Err(DbError::NilInput);
    }
    Ok(())
}

// =============================================================================
// Conversions
// =============================================================================

pub(crate) fn valid_ingredient_from_row(row: ValidIngredientRow) -> DbResult<ValidIngredient> {
    Ok(ValidIngredient {
        storage_temperature_in_celsius: optional_float32_range(
            "ideal_storage_temperature_in_celsius",
            row.minimum_ideal_storage_temperature_in_celsius,
            row.maximum_ideal_storage_temperature_in_celsius,
        )?,
        id: row.id,
        name: row.name,
        plural_name: row.plural_name,
        description: row.description,
        warning: row.warning,
        icon_path: row.icon_path,
        slug: row.slug,
        shopping_suggestions: row.shopping_suggestions,
        storage_instructions: row.storage_instructions,
        contains_egg: row.contains_egg,
        contains_dairy: row.contains_dairy,
        contains_peanut: row.contains_peanut,
        contains_tree_nut: row.contains_tree_nut,
        contains_soy: row.contains_soy,
        contains_wheat: row.contains_wheat,
        contains_shellfish: row.contains_shellfish,
        contains_sesame: row.contains_sesame,
        contains_fish: row.contains_fish,
        contains_gluten: row.contains_gluten,
        contains_alcohol: row.contains_alcohol,
        animal_flesh: row.animal_flesh,
        animal_derived: row.animal_derived,
        volumetric: row.volumetric,
        is_liquid: row.is_liquid,
        restrict_to_preparations: row.restrict_to_preparations,
        is_starch: row.is_starch,
        is_protein: row.is_protein,
        is_grain: row.is_grain,
        is_fruit: row.is_fruit,
        is_salt: row.is_salt,
        is_fat: row.is_fat,
        is_acid: row.is_acid,
        is_heat: row.is_heat,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_ingredient_row(ingredient: &ValidIngredient) -> DbResult<ValidIngredientRow> {
    let temperature = DecimalPair::from_optional_float32_range(
        "storage_temperature_in_celsius",
        &ingredient.storage_temperature_in_celsius,
    )?;

    Ok(ValidIngredientRow {
        id: ingredient.id.clone(),
        name: ingredient.name.clone(),
        plural_name: ingredient.plural_name.clone(),
        description: ingredient.description.clone(),
        warning: ingredient.warning.clone(),
        icon_path: ingredient.icon_path.clone(),
        slug: ingredient.slug.clone(),
        shopping_suggestions: ingredient.shopping_suggestions.clone(),
        storage_instructions: ingredient.storage_instructions.clone(),
        minimum_ideal_storage_temperature_in_celsius: temperature.min,
        maximum_ideal_storage_temperature_in_celsius: temperature.max,
        contains_egg: ingredient.contains_egg,
        contains_dairy: ingredient.contains_dairy,
        contains_peanut: ingredient.contains_peanut,
        contains_tree_nut: ingredient.contains_tree_nut,
        contains_soy: ingredient.contains_soy,
        contains_wheat: ingredient.contains_wheat,
        contains_shellfish: ingredient.contains_shellfish,
        contains_sesame: ingredient.contains_sesame,
        contains_fish: ingredient.contains_fish,
        contains_gluten: ingredient.contains_gluten,
        contains_alcohol: ingredient.contains_alcohol,
        animal_flesh: ingredient.animal_flesh,
        animal_derived: ingredient.animal_derived,
        volumetric: ingredient.volumetric,
        is_liquid: ingredient.is_liquid,
        restrict_to_preparations: ingredient.restrict_to_preparations,
        is_starch: ingredient.is_starch,
        is_protein: ingredient.is_protein,
        is_grain: ingredient.is_grain,
        is_fruit: ingredient.is_fruit,
        is_salt: ingredient.is_salt,
        is_fat: ingredient.is_fat,
        is_acid: ingredient.is_acid,
        is_heat: ingredient.is_heat,
        last_indexed_at: ingredient.last_indexed_at,
        created_at: ingredient.created_at,
        last_updated_at: ingredient.last_updated_at,
        archived_at: ingredient.archived_at,
    })
}

pub(crate) fn valid_instrument_from_row(row: ValidInstrumentRow) -> ValidInstrument {
    ValidInstrument {
        id: row.id,
        name: row.name,
        plural_name: row.plural_name,
        description: row.description,
        icon_path: row.icon_path,
        slug: row.slug,
        usable_for_storage: row.usable_for_storage,
        display_in_summary_lists: row.display_in_summary_lists,
        include_in_generated_instructions: row.include_in_generated_instructions,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

fn valid_instrument_row(instrument: &ValidInstrument) -> ValidInstrumentRow {
    ValidInstrumentRow {
        id: instrument.id.clone(),
        name: instrument.name.clone(),
        plural_name: instrument.plural_name.clone(),
        description: instrument.description.clone(),
        icon_path: instrument.icon_path.clone(),
        slug: instrument.slug.clone(),
        usable_for_storage: instrument.usable_for_storage,
        display_in_summary_lists: instrument.display_in_summary_lists,
        include_in_generated_instructions: instrument.include_in_generated_instructions,
        last_indexed_at: instrument.last_indexed_at,
        created_at: instrument.created_at,
        last_updated_at: instrument.last_updated_at,
        archived_at: instrument.archived_at,
    }
}

pub(crate) fn valid_measurement_unit_from_row(row: ValidMeasurementUnitRow) -> ValidMeasurementUnit {
    ValidMeasurementUnit {
        id: row.id,
        name: row.name,
        plural_name: row.plural_name,
        description: row.description,
        icon_path: row.icon_path,
        slug: row.slug,
        volumetric: row.volumetric,
        universal: row.universal,
        metric: row.metric,
        imperial: row.imperial,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

fn valid_measurement_unit_row(unit: &ValidMeasurementUnit) -> ValidMeasurementUnitRow {
    ValidMeasurementUnitRow {
        id: unit.id.clone(),
        name: unit.name.clone(),
        plural_name: unit.plural_name.clone(),
        description: unit.description.clone(),
        icon_path: unit.icon_path.clone(),
        slug: unit.slug.clone(),
        volumetric: unit.volumetric,
        universal: unit.universal,
        metric: unit.metric,
        imperial: unit.imperial,
        last_indexed_at: unit.last_indexed_at,
        created_at: unit.created_at,
        last_updated_at: unit.last_updated_at,
        archived_at: unit.archived_at,
    }
}

pub(crate) fn valid_preparation_from_row(row: ValidPreparationRow) -> DbResult<ValidPreparation> {
    Ok(ValidPreparation {
        ingredient_count: uint16_range_with_optional_max(
            "ingredient_count",
            row.minimum_ingredient_count,
            row.maximum_ingredient_count,
        )?,
        instrument_count: uint16_range_with_optional_max(
            "instrument_count",
            row.minimum_instrument_count,
            row.maximum_instrument_count,
        )?,
        vessel_count: uint16_range_with_optional_max(
            "vessel_count",
            row.minimum_vessel_count,
            row.maximum_vessel_count,
        )?,
        id: row.id,
        name: row.name,
        past_tense: row.past_tense,
        description: row.description,
        icon_path: row.icon_path,
        slug: row.slug,
        yields_nothing: row.yields_nothing,
        restrict_to_ingredients: row.restrict_to_ingredients,
        temperature_required: row.temperature_required,
        time_estimate_required: row.time_estimate_required,
        condition_expression_required: row.condition_expression_required,
        consumes_vessel: row.consumes_vessel,
        only_for_vessels: row.only_for_vessels,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_preparation_row(preparation: &ValidPreparation) -> ValidPreparationRow {
    ValidPreparationRow {
        id: preparation.id.clone(),
        name: preparation.name.clone(),
        past_tense: preparation.past_tense.clone(),
        description: preparation.description.clone(),
        icon_path: preparation.icon_path.clone(),
        slug: preparation.slug.clone(),
        yields_nothing: preparation.yields_nothing,
        restrict_to_ingredients: preparation.restrict_to_ingredients,
        minimum_ingredient_count: i32::from(preparation.ingredient_count.min),
        maximum_ingredient_count: preparation.ingredient_count.max.map(i32::from),
        minimum_instrument_count: i32::from(preparation.instrument_count.min),
        maximum_instrument_count: preparation.instrument_count.max.map(i32::from),
        minimum_vessel_count: i32::from(preparation.vessel_count.min),
        maximum_vessel_count: preparation.vessel_count.max.map(i32::from),
        temperature_required: preparation.temperature_required,
        time_estimate_required: preparation.time_estimate_required,
        condition_expression_required: preparation.condition_expression_required,
        consumes_vessel: preparation.consumes_vessel,
        only_for_vessels: preparation.only_for_vessels,
        last_indexed_at: preparation.last_indexed_at,
        created_at: preparation.created_at,
        last_updated_at: preparation.last_updated_at,
        archived_at: preparation.archived_at,
    }
}

/// Decodes a vessel with its (optional) joined capacity unit.
pub(crate) fn valid_vessel_from_row(
    (row, unit): ValidVesselWithUnitRow,
) -> DbResult<ValidVessel> {
    // The unit may have been archived out from under the vessel; keep the
    // reference rather than dropping it.
    let capacity_unit = match (unit, row.capacity_unit) {
        (Some(unit), _) => Some(valid_measurement_unit_from_row(unit)),
        (None, Some(id)) => Some(ValidMeasurementUnit {
            id,
            ..Default::default()
        }),
        (None, None) => None,
    };

    Ok(ValidVessel {
        capacity: f32_from_decimal("capacity", row.capacity)?,
        width_in_millimeters: optional_f32_from_decimal("width_in_millimeters", row.width_in_millimeters)?,
        length_in_millimeters: optional_f32_from_decimal(
            "length_in_millimeters",
            row.length_in_millimeters,
        )?,
        height_in_millimeters: optional_f32_from_decimal(
            "height_in_millimeters",
            row.height_in_millimeters,
        )?,
        shape: parse_enum("shape", &row.shape)?,
        capacity_unit,
        id: row.id,
        name: row.name,
        plural_name: row.plural_name,
        description: row.description,
        icon_path: row.icon_path,
        slug: row.slug,
        usable_for_storage: row.usable_for_storage,
        display_in_summary_lists: row.display_in_summary_lists,
        include_in_generated_instructions: row.include_in_generated_instructions,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_vessel_row(vessel: &ValidVessel) -> DbResult<ValidVesselRow> {
    Ok(ValidVesselRow {
        id: vessel.id.clone(),
        name: vessel.name.clone(),
        plural_name: vessel.plural_name.clone(),
        description: vessel.description.clone(),
        icon_path: vessel.icon_path.clone(),
        slug: vessel.slug.clone(),
        usable_for_storage: vessel.usable_for_storage,
        display_in_summary_lists: vessel.display_in_summary_lists,
        include_in_generated_instructions: vessel.include_in_generated_instructions,
        capacity: decimal_from_f32("capacity", vessel.capacity)?,
        capacity_unit: vessel.capacity_unit.as_ref().map(|unit| unit.id.clone()),
        width_in_millimeters: optional_decimal_from_f32("width_in_millimeters", vessel.width_in_millimeters)?,
        length_in_millimeters: optional_decimal_from_f32(
            "length_in_millimeters",
            vessel.length_in_millimeters,
        )?,
        height_in_millimeters: optional_decimal_from_f32(
            "height_in_millimeters",
            vessel.height_in_millimeters,
        )?,
        shape: vessel.shape.as_str().to_string(),
        last_indexed_at: vessel.last_indexed_at,
        created_at: vessel.created_at,
        last_updated_at: vessel.last_updated_at,
        archived_at: vessel.archived_at,
    })
}

pub(crate) fn valid_ingredient_state_from_row(
    row: ValidIngredientStateRow,
) -> DbResult<ValidIngredientState> {
    Ok(ValidIngredientState {
        attribute_type: parse_enum("attribute_type", &row.attribute_type)?,
        id: row.id,
        name: row.name,
        past_tense: row.past_tense,
        slug: row.slug,
        description: row.description,
        icon_path: row.icon_path,
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_ingredient_state_row(state: &ValidIngredientState) -> ValidIngredientStateRow {
    ValidIngredientStateRow {
        id: state.id.clone(),
        name: state.name.clone(),
        past_tense: state.past_tense.clone(),
        slug: state.slug.clone(),
        description: state.description.clone(),
        icon_path: state.icon_path.clone(),
        attribute_type: state.attribute_type.as_str().to_string(),
        last_indexed_at: state.last_indexed_at,
        created_at: state.created_at,
        last_updated_at: state.last_updated_at,
        archived_at: state.archived_at,
    }
}

fn valid_ingredient_group_from_row(row: ValidIngredientGroupRow) -> ValidIngredientGroup {
    ValidIngredientGroup {
        id: row.id,
        name: row.name,
        description: row.description,
        slug: row.slug,
        members: Vec::new(),
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    }
}

fn valid_ingredient_group_member_from_row(
    (member, ingredient): ValidIngredientGroupMemberWithIngredientRow,
) -> DbResult<ValidIngredientGroupMember> {
    Ok(ValidIngredientGroupMember {
        id: member.id,
        belongs_to_group: member.belongs_to_group,
        valid_ingredient: valid_ingredient_from_row(ingredient)?,
        created_at: member.created_at,
        archived_at: member.archived_at,
    })
}

impl Querier {
    // =========================================================================
    // Ingredients
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_ingredient_exists(&self, valid_ingredient_id: &str) -> DbResult<bool> {
        require_id(valid_ingredient_id)?;

        q::valid_ingredient_exists(self.pool(), valid_ingredient_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient(&self, valid_ingredient_id: &str) -> DbResult<ValidIngredient> {
        require_id(valid_ingredient_id)?;

        q::get_valid_ingredient(self.pool(), valid_ingredient_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_ingredient_from_row)
            .map_err(|err| prepare_error(err, "fetching valid ingredient"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredients(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredient>> {
        let filter = filter_or_default(filter);

        q::get_valid_ingredients(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredients"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_ingredients(&self, query: &str) -> DbResult<Vec<ValidIngredient>> {
        require_query(query)?;

        q::search_for_valid_ingredients(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(valid_ingredient_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for valid ingredients"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_ingredient(
        &self,
        input: &ValidIngredientDatabaseCreationInput,
    ) -> DbResult<ValidIngredient> {
        input.validate()?;

        let ingredient = ValidIngredient {
            id: self.new_id(),
            name: input.name.clone(),
            plural_name: input.plural_name.clone(),
            description: input.description.clone(),
            warning: input.warning.clone(),
            icon_path: input.icon_path.clone(),
            slug: input.slug.clone(),
            shopping_suggestions: input.shopping_suggestions.clone(),
            storage_instructions: input.storage_instructions.clone(),
            storage_temperature_in_celsius: input.storage_temperature_in_celsius,
            contains_egg: input.contains_egg,
            contains_dairy: input.contains_dairy,
            contains_peanut: input.contains_peanut,
            contains_tree_nut: input.contains_tree_nut,
            contains_soy: input.contains_soy,
            contains_wheat: input.contains_wheat,
            contains_shellfish: input.contains_shellfish,
            contains_sesame: input.contains_sesame,
            contains_fish: input.contains_fish,
            contains_gluten: input.contains_gluten,
            contains_alcohol: input.contains_alcohol,
            animal_flesh: input.animal_flesh,
            animal_derived: input.animal_derived,
            volumetric: input.volumetric,
            is_liquid: input.is_liquid,
            restrict_to_preparations: input.restrict_to_preparations,
            is_starch: input.is_starch,
            is_protein: input.is_protein,
            is_grain: input.is_grain,
            is_fruit: input.is_fruit,
            is_salt: input.is_salt,
            is_fat: input.is_fat,
            is_acid: input.is_acid,
            is_heat: input.is_heat,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = valid_ingredient_row(&ingredient)?;

        q::create_valid_ingredient(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating valid ingredient"))?;

        info!(id = %ingredient.id, name = %ingredient.name, "Created valid ingredient");
        Ok(ingredient)
    }

    #[instrument(skip(self, ingredient), fields(id = %ingredient.id))]
    pub async fn update_valid_ingredient(&self, ingredient: &ValidIngredient) -> DbResult<()> {
        require_id(&ingredient.id)?;
        let row = valid_ingredient_row(ingredient)?;

        q::update_valid_ingredient(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid ingredient"))?;

        debug!(id = %ingredient.id, "Updated valid ingredient");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient(&self, valid_ingredient_id: &str) -> DbResult<()> {
        require_id(valid_ingredient_id)?;

        q::archive_valid_ingredient(self.pool(), valid_ingredient_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid ingredient"))?;

        info!(id = %valid_ingredient_id, "Archived valid ingredient");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_ingredient_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid ingredient IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_ingredient_last_indexed_at(&self, valid_ingredient_id: &str) -> DbResult<()> {
        require_id(valid_ingredient_id)?;

        q::update_valid_ingredient_last_indexed_at(self.pool(), valid_ingredient_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid ingredient as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Instruments
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_instrument_exists(&self, valid_instrument_id: &str) -> DbResult<bool> {
        require_id(valid_instrument_id)?;

        q::valid_instrument_exists(self.pool(), valid_instrument_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid instrument existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_instrument(&self, valid_instrument_id: &str) -> DbResult<ValidInstrument> {
        require_id(valid_instrument_id)?;

        q::get_valid_instrument(self.pool(), valid_instrument_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map(valid_instrument_from_row)
            .map_err(|err| prepare_error(err, "fetching valid instrument"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_instruments(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidInstrument>> {
        let filter = filter_or_default(filter);

        q::get_valid_instruments(self.pool(), &filter)
            .await
            .and_then(|rows| {
                into_filtered_result(rows, &filter, |row| Ok(valid_instrument_from_row(row)))
            })
            .map_err(|err| prepare_error(err, "fetching valid instruments"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_instruments(&self, query: &str) -> DbResult<Vec<ValidInstrument>> {
        require_query(query)?;

        let rows = q::search_for_valid_instruments(self.pool(), query, SEARCH_LIMIT)
            .await
            .map_err(|err| prepare_error(err, "searching for valid instruments"))?;
        Ok(rows.into_iter().map(valid_instrument_from_row).collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_instrument(
        &self,
        input: &ValidInstrumentDatabaseCreationInput,
    ) -> DbResult<ValidInstrument> {
        input.validate()?;

        let instrument = ValidInstrument {
            id: self.new_id(),
            name: input.name.clone(),
            plural_name: input.plural_name.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            slug: input.slug.clone(),
            usable_for_storage: input.usable_for_storage,
            display_in_summary_lists: input.display_in_summary_lists,
            include_in_generated_instructions: input.include_in_generated_instructions,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_instrument(self.pool(), &valid_instrument_row(&instrument))
            .await
            .map_err(|err| prepare_error(err, "creating valid instrument"))?;

        info!(id = %instrument.id, name = %instrument.name, "Created valid instrument");
        Ok(instrument)
    }

    #[instrument(skip(self, instrument), fields(id = %instrument.id))]
    pub async fn update_valid_instrument(&self, instrument: &ValidInstrument) -> DbResult<()> {
        require_id(&instrument.id)?;

        q::update_valid_instrument(self.pool(), &valid_instrument_row(instrument), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid instrument"))?;

        debug!(id = %instrument.id, "Updated valid instrument");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_instrument(&self, valid_instrument_id: &str) -> DbResult<()> {
        require_id(valid_instrument_id)?;

        q::archive_valid_instrument(self.pool(), valid_instrument_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid instrument"))?;

        info!(id = %valid_instrument_id, "Archived valid instrument");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_instrument_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_instrument_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid instrument IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_instrument_last_indexed_at(&self, valid_instrument_id: &str) -> DbResult<()> {
        require_id(valid_instrument_id)?;

        q::update_valid_instrument_last_indexed_at(self.pool(), valid_instrument_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid instrument as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Measurement Units
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_measurement_unit_exists(&self, valid_measurement_unit_id: &str) -> DbResult<bool> {
        require_id(valid_measurement_unit_id)?;

        q::valid_measurement_unit_exists(self.pool(), valid_measurement_unit_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid measurement unit existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_measurement_unit(
        &self,
        valid_measurement_unit_id: &str,
    ) -> DbResult<ValidMeasurementUnit> {
        require_id(valid_measurement_unit_id)?;

        q::get_valid_measurement_unit(self.pool(), valid_measurement_unit_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .map(valid_measurement_unit_from_row)
            .map_err(|err| prepare_error(err, "fetching valid measurement unit"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_measurement_units(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidMeasurementUnit>> {
        let filter = filter_or_default(filter);

        q::get_valid_measurement_units(self.pool(), &filter)
            .await
            .and_then(|rows| {
                into_filtered_result(rows, &filter, |row| Ok(valid_measurement_unit_from_row(row)))
            })
            .map_err(|err| prepare_error(err, "fetching valid measurement units"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_measurement_units(
        &self,
        query: &str,
    ) -> DbResult<Vec<ValidMeasurementUnit>> {
        require_query(query)?;

        let rows = q::search_for_valid_measurement_units(self.pool(), query, SEARCH_LIMIT)
            .await
            .map_err(|err| prepare_error(err, "searching for valid measurement units"))?;
        Ok(rows.into_iter().map(valid_measurement_unit_from_row).collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_measurement_unit(
        &self,
        input: &ValidMeasurementUnitDatabaseCreationInput,
    ) -> DbResult<ValidMeasurementUnit> {
        input.validate()?;

        let unit = ValidMeasurementUnit {
            id: self.new_id(),
            name: input.name.clone(),
            plural_name: input.plural_name.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            slug: input.slug.clone(),
            volumetric: input.volumetric,
            universal: input.universal,
            metric: input.metric,
            imperial: input.imperial,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_measurement_unit(self.pool(), &valid_measurement_unit_row(&unit))
            .await
            .map_err(|err| prepare_error(err, "creating valid measurement unit"))?;

        info!(id = %unit.id, name = %unit.name, "Created valid measurement unit");
        Ok(unit)
    }

    #[instrument(skip(self, unit), fields(id = %unit.id))]
    pub async fn update_valid_measurement_unit(&self, unit: &ValidMeasurementUnit) -> DbResult<()> {
        require_id(&unit.id)?;

        q::update_valid_measurement_unit(self.pool(), &valid_measurement_unit_row(unit), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid measurement unit"))?;

        debug!(id = %unit.id, "Updated valid measurement unit");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_measurement_unit(&self, valid_measurement_unit_id: &str) -> DbResult<()> {
        require_id(valid_measurement_unit_id)?;

        q::archive_valid_measurement_unit(self.pool(), valid_measurement_unit_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid measurement unit"))?;

        info!(id = %valid_measurement_unit_id, "Archived valid measurement unit");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_measurement_unit_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_measurement_unit_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid measurement unit IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_measurement_unit_last_indexed_at(
        &self,
        valid_measurement_unit_id: &str,
    ) -> DbResult<()> {
        require_id(valid_measurement_unit_id)?;

        q::update_valid_measurement_unit_last_indexed_at(self.pool(), valid_measurement_unit_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid measurement unit as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Preparations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_preparation_exists(&self, valid_preparation_id: &str) -> DbResult<bool> {
        require_id(valid_preparation_id)?;

        q::valid_preparation_exists(self.pool(), valid_preparation_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid preparation existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_preparation(&self, valid_preparation_id: &str) -> DbResult<ValidPreparation> {
        require_id(valid_preparation_id)?;

        q::get_valid_preparation(self.pool(), valid_preparation_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_preparation_from_row)
            .map_err(|err| prepare_error(err, "fetching valid preparation"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparations(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparation>> {
        let filter = filter_or_default(filter);

        q::get_valid_preparations(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparations"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_preparations(&self, query: &str) -> DbResult<Vec<ValidPreparation>> {
        require_query(query)?;

        q::search_for_valid_preparations(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(valid_preparation_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for valid preparations"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_preparation(
        &self,
        input: &ValidPreparationDatabaseCreationInput,
    ) -> DbResult<ValidPreparation> {
        input.validate()?;

        let preparation = ValidPreparation {
            id: self.new_id(),
            name: input.name.clone(),
            past_tense: input.past_tense.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            slug: input.slug.clone(),
            yields_nothing: input.yields_nothing,
            restrict_to_ingredients: input.restrict_to_ingredients,
            ingredient_count: input.ingredient_count,
            instrument_count: input.instrument_count,
            vessel_count: input.vessel_count,
            temperature_required: input.temperature_required,
            time_estimate_required: input.time_estimate_required,
            condition_expression_required: input.condition_expression_required,
            consumes_vessel: input.consumes_vessel,
            only_for_vessels: input.only_for_vessels,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_preparation(self.pool(), &valid_preparation_row(&preparation))
            .await
            .map_err(|err| prepare_error(err, "creating valid preparation"))?;

        info!(id = %preparation.id, name = %preparation.name, "Created valid preparation");
        Ok(preparation)
    }

    #[instrument(skip(self, preparation), fields(id = %preparation.id))]
    pub async fn update_valid_preparation(&self, preparation: &ValidPreparation) -> DbResult<()> {
        require_id(&preparation.id)?;

        q::update_valid_preparation(self.pool(), &valid_preparation_row(preparation), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid preparation"))?;

        debug!(id = %preparation.id, "Updated valid preparation");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_preparation(&self, valid_preparation_id: &str) -> DbResult<()> {
        require_id(valid_preparation_id)?;

        q::archive_valid_preparation(self.pool(), valid_preparation_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid preparation"))?;

        info!(id = %valid_preparation_id, "Archived valid preparation");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_preparation_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_preparation_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid preparation IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_preparation_last_indexed_at(&self, valid_preparation_id: &str) -> DbResult<()> {
        require_id(valid_preparation_id)?;

        q::update_valid_preparation_last_indexed_at(self.pool(), valid_preparation_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid preparation as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Vessels
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_vessel_exists(&self, valid_vessel_id: &str) -> DbResult<bool> {
        require_id(valid_vessel_id)?;

        q::valid_vessel_exists(self.pool(), valid_vessel_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid vessel existence"))
    }

    /// Fetches a vessel with its capacity unit resolved.
    #[instrument(skip(self))]
    pub async fn get_valid_vessel(&self, valid_vessel_id: &str) -> DbResult<ValidVessel> {
        require_id(valid_vessel_id)?;

        q::get_valid_vessel(self.pool(), valid_vessel_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_vessel_from_row)
            .map_err(|err| prepare_error(err, "fetching valid vessel"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_vessels(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidVessel>> {
        let filter = filter_or_default(filter);

        q::get_valid_vessels(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_vessel_from_row))
            .map_err(|err| prepare_error(err, "fetching valid vessels"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_vessels(&self, query: &str) -> DbResult<Vec<ValidVessel>> {
        require_query(query)?;

        q::search_for_valid_vessels(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(valid_vessel_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for valid vessels"))
    }

    /// The returned vessel carries only the ID of its capacity unit.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_vessel(&self, input: &ValidVesselDatabaseCreationInput) -> DbResult<ValidVessel> {
        input.validate()?;

        let vessel = ValidVessel {
            id: self.new_id(),
            name: input.name.clone(),
            plural_name: input.plural_name.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            slug: input.slug.clone(),
            usable_for_storage: input.usable_for_storage,
            display_in_summary_lists: input.display_in_summary_lists,
            include_in_generated_instructions: input.include_in_generated_instructions,
            capacity: input.capacity,
            capacity_unit: input.capacity_unit_id.as_ref().map(|id| ValidMeasurementUnit {
                id: id.clone(),
                ..Default::default()
            }),
            width_in_millimeters: input.width_in_millimeters,
            length_in_millimeters: input.length_in_millimeters,
            height_in_millimeters: input.height_in_millimeters,
            shape: input.shape,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = valid_vessel_row(&vessel)?;

        q::create_valid_vessel(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating valid vessel"))?;

        info!(id = %vessel.id, name = %vessel.name, "Created valid vessel");
        Ok(vessel)
    }

    #[instrument(skip(self, vessel), fields(id = %vessel.id))]
    pub async fn update_valid_vessel(&self, vessel: &ValidVessel) -> DbResult<()> {
        require_id(&vessel.id)?;
        let row = valid_vessel_row(vessel)?;

        q::update_valid_vessel(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid vessel"))?;

        debug!(id = %vessel.id, "Updated valid vessel");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_vessel(&self, valid_vessel_id: &str) -> DbResult<()> {
        require_id(valid_vessel_id)?;

        q::archive_valid_vessel(self.pool(), valid_vessel_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid vessel"))?;

        info!(id = %valid_vessel_id, "Archived valid vessel");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_vessel_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_vessel_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid vessel IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_vessel_last_indexed_at(&self, valid_vessel_id: &str) -> DbResult<()> {
        require_id(valid_vessel_id)?;

        q::update_valid_vessel_last_indexed_at(self.pool(), valid_vessel_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid vessel as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Ingredient States
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_ingredient_state_exists(&self, valid_ingredient_state_id: &str) -> DbResult<bool> {
        require_id(valid_ingredient_state_id)?;

        q::valid_ingredient_state_exists(self.pool(), valid_ingredient_state_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient state existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_state(
        &self,
        valid_ingredient_state_id: &str,
    ) -> DbResult<ValidIngredientState> {
        require_id(valid_ingredient_state_id)?;

        q::get_valid_ingredient_state(self.pool(), valid_ingredient_state_id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_ingredient_state_from_row)
            .map_err(|err| prepare_error(err, "fetching valid ingredient state"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_states(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientState>> {
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_states(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_state_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient states"))
    }

    #[instrument(skip(self))]
    pub async fn search_for_valid_ingredient_states(
        &self,
        query: &str,
    ) -> DbResult<Vec<ValidIngredientState>> {
        require_query(query)?;

        q::search_for_valid_ingredient_states(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(valid_ingredient_state_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for valid ingredient states"))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_valid_ingredient_state(
        &self,
        input: &ValidIngredientStateDatabaseCreationInput,
    ) -> DbResult<ValidIngredientState> {
        input.validate()?;

        let state = ValidIngredientState {
            id: self.new_id(),
            name: input.name.clone(),
            past_tense: input.past_tense.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            attribute_type: input.attribute_type,
            last_indexed_at: None,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_ingredient_state(self.pool(), &valid_ingredient_state_row(&state))
            .await
            .map_err(|err| prepare_error(err, "creating valid ingredient state"))?;

        info!(id = %state.id, name = %state.name, "Created valid ingredient state");
        Ok(state)
    }

    #[instrument(skip(self, state), fields(id = %state.id))]
    pub async fn update_valid_ingredient_state(&self, state: &ValidIngredientState) -> DbResult<()> {
        require_id(&state.id)?;

        q::update_valid_ingredient_state(self.pool(), &valid_ingredient_state_row(state), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid ingredient state"))?;

        debug!(id = %state.id, "Updated valid ingredient state");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient_state(&self, valid_ingredient_state_id: &str) -> DbResult<()> {
        require_id(valid_ingredient_state_id)?;

        q::archive_valid_ingredient_state(self.pool(), valid_ingredient_state_id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid ingredient state"))?;

        info!(id = %valid_ingredient_state_id, "Archived valid ingredient state");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_state_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_valid_ingredient_state_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching valid ingredient state IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_valid_ingredient_state_last_indexed_at(
        &self,
        valid_ingredient_state_id: &str,
    ) -> DbResult<()> {
        require_id(valid_ingredient_state_id)?;

        q::update_valid_ingredient_state_last_indexed_at(self.pool(), valid_ingredient_state_id)
            .await
            .map_err(|err| prepare_error(err, "marking valid ingredient state as indexed"))?;
        Ok(())
    }

    // =========================================================================
    // Ingredient Groups
    // =========================================================================

    /// Loads members for every group in one query and attaches them.
    async fn attach_group_members(&self, groups: &mut [ValidIngredientGroup]) -> DbResult<()> {
        if groups.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = groups.iter().map(|g| g.id.clone()).collect();
        let rows = q::get_valid_ingredient_group_members(self.pool(), &ids).await?;

        let mut by_group: BTreeMap<String, Vec<ValidIngredientGroupMember>> = BTreeMap::new();
        for row in rows {
            let member = valid_ingredient_group_member_from_row(row)?;
            by_group
                .entry(member.belongs_to_group.clone())
                .or_default()
                .push(member);
        }
        for group in groups.iter_mut() {
            group.members = by_group.remove(&group.id).unwrap_or_default();
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn valid_ingredient_group_exists(&self, valid_ingredient_group_id: &str) -> DbResult<bool> {
        require_id(valid_ingredient_group_id)?;

        q::valid_ingredient_group_exists(self.pool(), valid_ingredient_group_id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient group existence"))
    }

    /// Fetches a group with its members and their ingredients.
    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_group(
        &self,
        valid_ingredient_group_id: &str,
    ) -> DbResult<ValidIngredientGroup> {
        require_id(valid_ingredient_group_id)?;

        let result: DbResult<ValidIngredientGroup> = async {
            let row = q::get_valid_ingredient_group(self.pool(), valid_ingredient_group_id)
                .await?
                .ok_or(DbError::NotFound)?;
            let mut groups = [valid_ingredient_group_from_row(row)];
            self.attach_group_members(&mut groups).await?;
            let [group] = groups;
            Ok(group)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching valid ingredient group"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_groups(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientGroup>> {
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<ValidIngredientGroup>> = async {
            let rows = q::get_valid_ingredient_groups(self.pool(), &filter).await?;
            let mut page = into_filtered_result(rows, &filter, |row| {
                Ok(valid_ingredient_group_from_row(row))
            })?;
            self.attach_group_members(&mut page.data).await?;
            Ok(page)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching valid ingredient groups"))
    }

    /// Creates a group and its member rows in one transaction.
    ///
    /// Members in the returned group carry only their ingredient ID.
    #[instrument(skip(self, input), fields(name = %input.name, members = input.members.len()))]
    pub async fn create_valid_ingredient_group(
        &self,
        input: &ValidIngredientGroupDatabaseCreationInput,
    ) -> DbResult<ValidIngredientGroup> {
        input.validate()?;
        for ingredient_id in &input.members {
            require_id(ingredient_id)?;
        }

        let now = self.now();
        let row = ValidIngredientGroupRow {
            id: self.new_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            slug: input.slug.clone(),
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let members: Vec<ValidIngredientGroupMemberRow> = input
            .members
            .iter()
            .map(|ingredient_id| ValidIngredientGroupMemberRow {
                id: self.new_id(),
                belongs_to_group: row.id.clone(),
                valid_ingredient: ingredient_id.clone(),
                created_at: now,
                archived_at: None,
            })
            .collect();

        let mut tx = self.begin("beginning valid ingredient group creation transaction").await?;
        let outcome: DbResult<()> = async {
            q::create_valid_ingredient_group(&mut *tx, &row).await?;
            for (index, member) in members.iter().enumerate() {
                q::create_valid_ingredient_group_member(&mut *tx, member)
                    .await
                    .map_err(|err| err.context(format!("creating valid ingredient group member #{}", index + 1)))?;
            }
            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => {
                Querier::commit(tx, "committing valid ingredient group creation transaction").await?;
                info!(id = %row.id, name = %row.name, "Created valid ingredient group");
            }
            Err(err) => {
                Querier::rollback(tx).await;
                return Err(prepare_error(err, "creating valid ingredient group"));
            }
        }

        let mut group = valid_ingredient_group_from_row(row);
        group.members = members
            .into_iter()
            .map(|member| ValidIngredientGroupMember {
                id: member.id,
                belongs_to_group: member.belongs_to_group,
                valid_ingredient: ValidIngredient {
                    id: member.valid_ingredient,
                    ..Default::default()
                },
                created_at: member.created_at,
                archived_at: None,
            })
            .collect();
        Ok(group)
    }

    /// Updates the group's own fields. Membership is fixed at creation.
    #[instrument(skip(self, group), fields(id = %group.id))]
    pub async fn update_valid_ingredient_group(&self, group: &ValidIngredientGroup) -> DbResult<()> {
        require_id(&group.id)?;

        let row = ValidIngredientGroupRow {
            id: group.id.clone(),
            name: group.name.clone(),
            description: group.description.clone(),
            slug: group.slug.clone(),
            created_at: group.created_at,
            last_updated_at: group.last_updated_at,
            archived_at: group.archived_at,
        };

        q::update_valid_ingredient_group(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid ingredient group"))?;

        debug!(id = %group.id, "Updated valid ingredient group");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient_group(&self, valid_ingredient_group_id: &str) -> DbResult<()> {
        require_id(valid_ingredient_group_id)?;

        let mut tx = self.begin("beginning valid ingredient group archive transaction").await?;
        let outcome: DbResult<u64> = async {
            q::archive_valid_ingredient_group(&mut *tx, valid_ingredient_group_id).await?;
            q::archive_valid_ingredient_group_members(&mut *tx, valid_ingredient_group_id).await
        }
        .await;

        match outcome {
            Ok(members) => {
                Querier::commit(tx, "committing valid ingredient group archive transaction").await?;
                info!(id = %valid_ingredient_group_id, members, "Archived valid ingredient group");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving valid ingredient group"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::{
        IngredientAttributeType, OptionalFloat32Range, Uint16RangeWithOptionalMax, VesselShape,
    };
    use rust_decimal::Decimal;

    fn vessel_row() -> ValidVesselRow {
        ValidVesselRow {
            id: "vessel".to_string(),
            name: "sheet pan".to_string(),
            plural_name: "sheet pans".to_string(),
            description: String::new(),
            icon_path: String::new(),
            slug: "sheet-pan".to_string(),
            usable_for_storage: false,
            display_in_summary_lists: true,
            include_in_generated_instructions: true,
            capacity: Decimal::new(45, 1),
            capacity_unit: Some("unit".to_string()),
            width_in_millimeters: Some(Decimal::new(330, 0)),
            length_in_millimeters: None,
            height_in_millimeters: None,
            shape: "rectangle".to_string(),
            last_indexed_at: None,
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    #[test]
    fn test_vessel_without_joined_unit_keeps_reference() {
        let vessel = valid_vessel_from_row((vessel_row(), None)).unwrap();

        assert_eq!(vessel.shape, VesselShape::Rectangle);
        assert_eq!(vessel.capacity, 4.5);
        assert_eq!(vessel.capacity_unit.unwrap().id, "unit");
        assert_eq!(vessel.width_in_millimeters, Some(330.0));
    }

    #[test]
    fn test_vessel_with_unknown_shape_is_integrity_error() {
        let mut row = vessel_row();
        row.shape = "dodecahedron".to_string();

        let err = valid_vessel_from_row((row, None)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }

    #[test]
    fn test_preparation_counts_round_trip_through_columns() {
        let preparation = ValidPreparation {
            id: "dice".to_string(),
            ingredient_count: Uint16RangeWithOptionalMax::new(1, Some(3)),
            instrument_count: Uint16RangeWithOptionalMax::new(1, None),
            vessel_count: Uint16RangeWithOptionalMax::new(0, Some(1)),
            ..Default::default()
        };

        let row = valid_preparation_row(&preparation);
        assert_eq!(row.maximum_ingredient_count, Some(3));
        assert_eq!(row.maximum_instrument_count, None);

        let decoded = valid_preparation_from_row(row).unwrap();
        assert_eq!(decoded.ingredient_count, preparation.ingredient_count);
        assert_eq!(decoded.vessel_count, preparation.vessel_count);
    }

    #[test]
    fn test_ingredient_storage_temperature_maps_to_column_pair() {
        let ingredient = ValidIngredient {
            id: "butter".to_string(),
            storage_temperature_in_celsius: OptionalFloat32Range::new(Some(1.5), None),
            ..Default::default()
        };

        let row = valid_ingredient_row(&ingredient).unwrap();
        assert_eq!(row.minimum_ideal_storage_temperature_in_celsius, Some(Decimal::new(15, 1)));
        assert_eq!(row.maximum_ideal_storage_temperature_in_celsius, None);
    }

    #[test]
    fn test_ingredient_state_attribute_type_is_checked_on_read() {
        let state = ValidIngredientState {
            id: "melted".to_string(),
            name: "melted".to_string(),
            attribute_type: IngredientAttributeType::Consistency,
            ..Default::default()
        };

        let mut row = valid_ingredient_state_row(&state);
        assert_eq!(row.attribute_type, "consistency");
        assert_eq!(valid_ingredient_state_from_row(row.clone()).unwrap(), state);

        row.attribute_type = "crunchiness".to_string();
        let err = valid_ingredient_state_from_row(row).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Integrity);
    }
}
