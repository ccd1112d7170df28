//! # Valid Mapping Repository
//!
//! Links between valid enumerations. Reads return both sides fully
//! populated; creates return the link with ID-only sides.

use dinner_core::{
    QueryFilter, QueryFilteredResult, ValidIngredient, ValidIngredientMeasurementUnit,
    ValidIngredientMeasurementUnitDatabaseCreationInput, ValidIngredientPreparation,
    ValidIngredientPreparationDatabaseCreationInput, ValidIngredientState,
    ValidIngredientStateIngredient, ValidIngredientStateIngredientDatabaseCreationInput,
    ValidInstrument, ValidMeasurementUnit, ValidMeasurementUnitConversion,
    ValidMeasurementUnitConversionDatabaseCreationInput, ValidPreparation,
    ValidPreparationInstrument, ValidPreparationInstrumentDatabaseCreationInput,
    ValidPreparationVessel, ValidPreparationVesselDatabaseCreationInput, ValidVessel,
};
use tracing::{debug, info, instrument};

use crate::codec::{
    decimal_from_f32, f32_from_decimal, float32_range_with_optional_max, DecimalPair,
};
use crate::error::{require_id, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::valid_mappings::{
    self as q, FromUnitRow, ToUnitRow, ValidIngredientMeasurementUnitRow,
    ValidIngredientMeasurementUnitWideRow, ValidIngredientPreparationRow,
    ValidIngredientPreparationWideRow, ValidIngredientStateIngredientRow,
    ValidIngredientStateIngredientWideRow, ValidMeasurementUnitConversionRow,
    ValidMeasurementUnitConversionWideRow, ValidPreparationInstrumentRow,
    ValidPreparationInstrumentWideRow, ValidPreparationVesselRow, ValidPreparationVesselWideRow,
};
use crate::repository::valid_enumerations::{
    valid_ingredient_from_row, valid_ingredient_state_from_row, valid_instrument_from_row,
    valid_measurement_unit_from_row, valid_preparation_from_row, valid_vessel_from_row,
};
use crate::repository::{filter_or_default, into_filtered_result};

// =============================================================================
// Conversions
// =============================================================================

fn valid_ingredient_measurement_unit_from_row(
    (row, ingredient, unit): ValidIngredientMeasurementUnitWideRow,
) -> DbResult<ValidIngredientMeasurementUnit> {
    Ok(ValidIngredientMeasurementUnit {
        allowable_quantity: float32_range_with_optional_max(
            "allowable_quantity",
            row.minimum_allowable_quantity,
            row.maximum_allowable_quantity,
        )?,
        ingredient: valid_ingredient_from_row(ingredient)?,
        measurement_unit: valid_measurement_unit_from_row(unit),
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_ingredient_measurement_unit_row(
    link: &ValidIngredientMeasurementUnit,
) -> DbResult<ValidIngredientMeasurementUnitRow> {
    let quantity =
        DecimalPair::from_float32_range_with_optional_max("allowable_quantity", &link.allowable_quantity)?;

    Ok(ValidIngredientMeasurementUnitRow {
        id: link.id.clone(),
        notes: link.notes.clone(),
        valid_ingredient_id: link.ingredient.id.clone(),
        valid_measurement_unit_id: link.measurement_unit.id.clone(),
        minimum_allowable_quantity: quantity.min.unwrap_or_default(),
        maximum_allowable_quantity: quantity.max,
        created_at: link.created_at,
        last_updated_at: link.last_updated_at,
        archived_at: link.archived_at,
    })
}

fn valid_ingredient_preparation_from_row(
    (row, preparation, ingredient): ValidIngredientPreparationWideRow,
) -> DbResult<ValidIngredientPreparation> {
    Ok(ValidIngredientPreparation {
        preparation: valid_preparation_from_row(preparation)?,
        ingredient: valid_ingredient_from_row(ingredient)?,
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_ingredient_preparation_row(link: &ValidIngredientPreparation) -> ValidIngredientPreparationRow {
    ValidIngredientPreparationRow {
        id: link.id.clone(),
        notes: link.notes.clone(),
        valid_preparation_id: link.preparation.id.clone(),
        valid_ingredient_id: link.ingredient.id.clone(),
        created_at: link.created_at,
        last_updated_at: link.last_updated_at,
        archived_at: link.archived_at,
    }
}

fn valid_preparation_instrument_from_row(
    (row, preparation, instrument): ValidPreparationInstrumentWideRow,
) -> DbResult<ValidPreparationInstrument> {
    Ok(ValidPreparationInstrument {
        preparation: valid_preparation_from_row(preparation)?,
        instrument: valid_instrument_from_row(instrument),
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_preparation_instrument_row(link: &ValidPreparationInstrument) -> ValidPreparationInstrumentRow {
    ValidPreparationInstrumentRow {
        id: link.id.clone(),
        notes: link.notes.clone(),
        valid_preparation_id: link.preparation.id.clone(),
        valid_instrument_id: link.instrument.id.clone(),
        created_at: link.created_at,
        last_updated_at: link.last_updated_at,
        archived_at: link.archived_at,
    }
}

fn valid_preparation_vessel_from_row(
    (row, preparation, vessel): ValidPreparationVesselWideRow,
) -> DbResult<ValidPreparationVessel> {
    Ok(ValidPreparationVessel {
        preparation: valid_preparation_from_row(preparation)?,
        vessel: valid_vessel_from_row(vessel)?,
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_preparation_vessel_row(link: &ValidPreparationVessel) -> ValidPreparationVesselRow {
    ValidPreparationVesselRow {
        id: link.id.clone(),
        notes: link.notes.clone(),
        valid_preparation_id: link.preparation.id.clone(),
        valid_vessel_id: link.vessel.id.clone(),
        created_at: link.created_at,
        last_updated_at: link.last_updated_at,
        archived_at: link.archived_at,
    }
}

fn valid_ingredient_state_ingredient_from_row(
    (row, state, ingredient): ValidIngredientStateIngredientWideRow,
) -> DbResult<ValidIngredientStateIngredient> {
    Ok(ValidIngredientStateIngredient {
        ingredient_state: valid_ingredient_state_from_row(state)?,
        ingredient: valid_ingredient_from_row(ingredient)?,
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_ingredient_state_ingredient_row(
    link: &ValidIngredientStateIngredient,
) -> ValidIngredientStateIngredientRow {
    ValidIngredientStateIngredientRow {
        id: link.id.clone(),
        notes: link.notes.clone(),
        valid_ingredient_state_id: link.ingredient_state.id.clone(),
        valid_ingredient_id: link.ingredient.id.clone(),
        created_at: link.created_at,
        last_updated_at: link.last_updated_at,
        archived_at: link.archived_at,
    }
}

fn valid_measurement_unit_conversion_from_row(
    (row, FromUnitRow(from), ToUnitRow(to), ingredient): ValidMeasurementUnitConversionWideRow,
) -> DbResult<ValidMeasurementUnitConversion> {
    Ok(ValidMeasurementUnitConversion {
        modifier: f32_from_decimal("modifier", row.modifier)?,
        only_for_ingredient: ingredient.map(valid_ingredient_from_row).transpose()?,
        from: valid_measurement_unit_from_row(from),
        to: valid_measurement_unit_from_row(to),
        id: row.id,
        notes: row.notes,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn valid_measurement_unit_conversion_row(
    conversion: &ValidMeasurementUnitConversion,
) -> DbResult<ValidMeasurementUnitConversionRow> {
    Ok(ValidMeasurementUnitConversionRow {
        id: conversion.id.clone(),
        from_unit: conversion.from.id.clone(),
        to_unit: conversion.to.id.clone(),
        only_for_ingredient: conversion
            .only_for_ingredient
            .as_ref()
            .map(|ingredient| ingredient.id.clone()),
        modifier: decimal_from_f32("modifier", conversion.modifier)?,
        notes: conversion.notes.clone(),
        created_at: conversion.created_at,
        last_updated_at: conversion.last_updated_at,
        archived_at: conversion.archived_at,
    })
}

impl Querier {
    // =========================================================================
    // Ingredient ⇄ measurement unit
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_ingredient_measurement_unit_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_ingredient_measurement_unit_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient measurement unit existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_measurement_unit(
        &self,
        id: &str,
    ) -> DbResult<ValidIngredientMeasurementUnit> {
        require_id(id)?;

        q::get_valid_ingredient_measurement_unit(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_ingredient_measurement_unit_from_row)
            .map_err(|err| prepare_error(err, "fetching valid ingredient measurement unit"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_measurement_units(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientMeasurementUnit>> {
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_measurement_units(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_measurement_unit_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient measurement units"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_measurement_units_for_ingredient(
        &self,
        valid_ingredient_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientMeasurementUnit>> {
        require_id(valid_ingredient_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_measurement_units_for_ingredient(self.pool(), &filter, valid_ingredient_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_measurement_unit_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient measurement units for ingredient"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_measurement_units_for_measurement_unit(
        &self,
        valid_measurement_unit_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientMeasurementUnit>> {
        require_id(valid_measurement_unit_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_measurement_units_for_measurement_unit(
            self.pool(),
            &filter,
            valid_measurement_unit_id,
        )
        .await
        .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_measurement_unit_from_row))
        .map_err(|err| {
            prepare_error(err, "fetching valid ingredient measurement units for measurement unit")
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create_valid_ingredient_measurement_unit(
        &self,
        input: &ValidIngredientMeasurementUnitDatabaseCreationInput,
    ) -> DbResult<ValidIngredientMeasurementUnit> {
        input.validate()?;

        let link = ValidIngredientMeasurementUnit {
            id: self.new_id(),
            notes: input.notes.clone(),
            ingredient: ValidIngredient {
                id: input.valid_ingredient_id.clone(),
                ..Default::default()
            },
            measurement_unit: ValidMeasurementUnit {
                id: input.valid_measurement_unit_id.clone(),
                ..Default::default()
            },
            allowable_quantity: input.allowable_quantity,
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = valid_ingredient_measurement_unit_row(&link)?;

        q::create_valid_ingredient_measurement_unit(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating valid ingredient measurement unit"))?;

        info!(id = %link.id, "Created valid ingredient measurement unit");
        Ok(link)
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    pub async fn update_valid_ingredient_measurement_unit(
        &self,
        link: &ValidIngredientMeasurementUnit,
    ) -> DbResult<()> {
        require_id(&link.id)?;
        link.allowable_quantity.validate("allowable_quantity")?;
        let row = valid_ingredient_measurement_unit_row(link)?;

        q::update_valid_ingredient_measurement_unit(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid ingredient measurement unit"))?;

        debug!(id = %link.id, "Updated valid ingredient measurement unit");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient_measurement_unit(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_ingredient_measurement_unit(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid ingredient measurement unit"))?;

        info!(id = %id, "Archived valid ingredient measurement unit");
        Ok(())
    }

    // =========================================================================
    // Ingredient ⇄ preparation
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_ingredient_preparation_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_ingredient_preparation_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient preparation existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_preparation(&self, id: &str) -> DbResult<ValidIngredientPreparation> {
        require_id(id)?;

        q::get_valid_ingredient_preparation(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_ingredient_preparation_from_row)
            .map_err(|err| prepare_error(err, "fetching valid ingredient preparation"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_preparations(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientPreparation>> {
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_preparations(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_preparation_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient preparations"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_preparations_for_ingredient(
        &self,
        valid_ingredient_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientPreparation>> {
        require_id(valid_ingredient_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_preparations_for_ingredient(self.pool(), &filter, valid_ingredient_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_preparation_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient preparations for ingredient"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_preparations_for_preparation(
        &self,
        valid_preparation_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientPreparation>> {
        require_id(valid_preparation_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_preparations_for_preparation(self.pool(), &filter, valid_preparation_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_preparation_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient preparations for preparation"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_valid_ingredient_preparation(
        &self,
        input: &ValidIngredientPreparationDatabaseCreationInput,
    ) -> DbResult<ValidIngredientPreparation> {
        input.validate()?;

        let link = ValidIngredientPreparation {
            id: self.new_id(),
            notes: input.notes.clone(),
            preparation: ValidPreparation {
                id: input.valid_preparation_id.clone(),
                ..Default::default()
            },
            ingredient: ValidIngredient {
                id: input.valid_ingredient_id.clone(),
                ..Default::default()
            },
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_ingredient_preparation(self.pool(), &valid_ingredient_preparation_row(&link))
            .await
            .map_err(|err| prepare_error(err, "creating valid ingredient preparation"))?;

        info!(id = %link.id, "Created valid ingredient preparation");
        Ok(link)
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    pub async fn update_valid_ingredient_preparation(&self, link: &ValidIngredientPreparation) -> DbResult<()> {
        require_id(&link.id)?;

        q::update_valid_ingredient_preparation(
            self.pool(),
            &valid_ingredient_preparation_row(link),
            self.now(),
        )
        .await
        .map_err(|err| prepare_error(err, "updating valid ingredient preparation"))?;

        debug!(id = %link.id, "Updated valid ingredient preparation");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient_preparation(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_ingredient_preparation(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid ingredient preparation"))?;

        info!(id = %id, "Archived valid ingredient preparation");
        Ok(())
    }

    // =========================================================================
    // Preparation ⇄ instrument
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_preparation_instrument_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_preparation_instrument_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid preparation instrument existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_preparation_instrument(&self, id: &str) -> DbResult<ValidPreparationInstrument> {
        require_id(id)?;

        q::get_valid_preparation_instrument(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_preparation_instrument_from_row)
            .map_err(|err| prepare_error(err, "fetching valid preparation instrument"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_instruments(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationInstrument>> {
        let filter = filter_or_default(filter);

        q::get_valid_preparation_instruments(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_instrument_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation instruments"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_instruments_for_preparation(
        &self,
        valid_preparation_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationInstrument>> {
        require_id(valid_preparation_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_preparation_instruments_for_preparation(self.pool(), &filter, valid_preparation_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_instrument_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation instruments for preparation"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_instruments_for_instrument(
        &self,
        valid_instrument_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationInstrument>> {
        require_id(valid_instrument_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_preparation_instruments_for_instrument(self.pool(), &filter, valid_instrument_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_instrument_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation instruments for instrument"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_valid_preparation_instrument(
        &self,
        input: &ValidPreparationInstrumentDatabaseCreationInput,
    ) -> DbResult<ValidPreparationInstrument> {
        input.validate()?;

        let link = ValidPreparationInstrument {
            id: self.new_id(),
            notes: input.notes.clone(),
            preparation: ValidPreparation {
                id: input.valid_preparation_id.clone(),
                ..Default::default()
            },
            instrument: ValidInstrument {
                id: input.valid_instrument_id.clone(),
                ..Default::default()
            },
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_preparation_instrument(self.pool(), &valid_preparation_instrument_row(&link))
            .await
            .map_err(|err| prepare_error(err, "creating valid preparation instrument"))?;

        info!(id = %link.id, "Created valid preparation instrument");
        Ok(link)
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    pub async fn update_valid_preparation_instrument(&self, link: &ValidPreparationInstrument) -> DbResult<()> {
        require_id(&link.id)?;

        q::update_valid_preparation_instrument(
            self.pool(),
            &valid_preparation_instrument_row(link),
            self.now(),
        )
        .await
        .map_err(|err| prepare_error(err, "updating valid preparation instrument"))?;

        debug!(id = %link.id, "Updated valid preparation instrument");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_preparation_instrument(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_preparation_instrument(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid preparation instrument"))?;

        info!(id = %id, "Archived valid preparation instrument");
        Ok(())
    }

    // =========================================================================
    // Preparation ⇄ vessel
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_preparation_vessel_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_preparation_vessel_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid preparation vessel existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_preparation_vessel(&self, id: &str) -> DbResult<ValidPreparationVessel> {
        require_id(id)?;

        q::get_valid_preparation_vessel(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_preparation_vessel_from_row)
            .map_err(|err| prepare_error(err, "fetching valid preparation vessel"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_vessels(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationVessel>> {
        let filter = filter_or_default(filter);

        q::get_valid_preparation_vessels(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_vessel_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation vessels"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_vessels_for_preparation(
        &self,
        valid_preparation_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationVessel>> {
        require_id(valid_preparation_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_preparation_vessels_for_preparation(self.pool(), &filter, valid_preparation_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_vessel_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation vessels for preparation"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_preparation_vessels_for_vessel(
        &self,
        valid_vessel_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidPreparationVessel>> {
        require_id(valid_vessel_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_preparation_vessels_for_vessel(self.pool(), &filter, valid_vessel_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_preparation_vessel_from_row))
            .map_err(|err| prepare_error(err, "fetching valid preparation vessels for vessel"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_valid_preparation_vessel(
        &self,
        input: &ValidPreparationVesselDatabaseCreationInput,
    ) -> DbResult<ValidPreparationVessel> {
        input.validate()?;

        let link = ValidPreparationVessel {
            id: self.new_id(),
            notes: input.notes.clone(),
            preparation: ValidPreparation {
                id: input.valid_preparation_id.clone(),
                ..Default::default()
            },
            vessel: ValidVessel {
                id: input.valid_vessel_id.clone(),
                ..Default::default()
            },
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_preparation_vessel(self.pool(), &valid_preparation_vessel_row(&link))
            .await
            .map_err(|err| prepare_error(err, "creating valid preparation vessel"))?;

        info!(id = %link.id, "Created valid preparation vessel");
        Ok(link)
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    pub async fn update_valid_preparation_vessel(&self, link: &ValidPreparationVessel) -> DbResult<()> {
        require_id(&link.id)?;

        q::update_valid_preparation_vessel(self.pool(), &valid_preparation_vessel_row(link), self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid preparation vessel"))?;

        debug!(id = %link.id, "Updated valid preparation vessel");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_preparation_vessel(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_preparation_vessel(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid preparation vessel"))?;

        info!(id = %id, "Archived valid preparation vessel");
        Ok(())
    }

    // =========================================================================
    // Ingredient state ⇄ ingredient
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_ingredient_state_ingredient_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_ingredient_state_ingredient_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid ingredient state ingredient existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_ingredient_state_ingredient(
        &self,
        id: &str,
    ) -> DbResult<ValidIngredientStateIngredient> {
        require_id(id)?;

        q::get_valid_ingredient_state_ingredient(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_ingredient_state_ingredient_from_row)
            .map_err(|err| prepare_error(err, "fetching valid ingredient state ingredient"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_state_ingredients(
        &self,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientStateIngredient>> {
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_state_ingredients(self.pool(), &filter)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_state_ingredient_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient state ingredients"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_state_ingredients_for_ingredient_state(
        &self,
        valid_ingredient_state_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientStateIngredient>> {
        require_id(valid_ingredient_state_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_state_ingredients_for_ingredient_state(
            self.pool(),
            &filter,
            valid_ingredient_state_id,
        )
        .await
        .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_state_ingredient_from_row))
        .map_err(|err| {
            prepare_error(err, "fetching valid ingredient state ingredients for ingredient state")
        })
    }

    #[instrument(skip(self, filter))]
    pub async fn get_valid_ingredient_state_ingredients_for_ingredient(
        &self,
        valid_ingredient_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<ValidIngredientStateIngredient>> {
        require_id(valid_ingredient_id)?;
        let filter = filter_or_default(filter);

        q::get_valid_ingredient_state_ingredients_for_ingredient(self.pool(), &filter, valid_ingredient_id)
            .await
            .and_then(|rows| into_filtered_result(rows, &filter, valid_ingredient_state_ingredient_from_row))
            .map_err(|err| prepare_error(err, "fetching valid ingredient state ingredients for ingredient"))
    }

    #[instrument(skip(self, input))]
    pub async fn create_valid_ingredient_state_ingredient(
        &self,
        input: &ValidIngredientStateIngredientDatabaseCreationInput,
    ) -> DbResult<ValidIngredientStateIngredient> {
        input.validate()?;

        let link = ValidIngredientStateIngredient {
            id: self.new_id(),
            notes: input.notes.clone(),
            ingredient_state: ValidIngredientState {
                id: input.valid_ingredient_state_id.clone(),
                ..Default::default()
            },
            ingredient: ValidIngredient {
                id: input.valid_ingredient_id.clone(),
                ..Default::default()
            },
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };

        q::create_valid_ingredient_state_ingredient(self.pool(), &valid_ingredient_state_ingredient_row(&link))
            .await
            .map_err(|err| prepare_error(err, "creating valid ingredient state ingredient"))?;

        info!(id = %link.id, "Created valid ingredient state ingredient");
        Ok(link)
    }

    #[instrument(skip(self, link), fields(id = %link.id))]
    pub async fn update_valid_ingredient_state_ingredient(
        &self,
        link: &ValidIngredientStateIngredient,
    ) -> DbResult<()> {
        require_id(&link.id)?;

        q::update_valid_ingredient_state_ingredient(
            self.pool(),
            &valid_ingredient_state_ingredient_row(link),
            self.now(),
        )
        .await
        .map_err(|err| prepare_error(err, "updating valid ingredient state ingredient"))?;

        debug!(id = %link.id, "Updated valid ingredient state ingredient");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_ingredient_state_ingredient(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_ingredient_state_ingredient(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid ingredient state ingredient"))?;

        info!(id = %id, "Archived valid ingredient state ingredient");
        Ok(())
    }

    // =========================================================================
    // Measurement unit conversions
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn valid_measurement_unit_conversion_exists(&self, id: &str) -> DbResult<bool> {
        require_id(id)?;

        q::valid_measurement_unit_conversion_exists(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "checking valid measurement unit conversion existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_valid_measurement_unit_conversion(
        &self,
        id: &str,
    ) -> DbResult<ValidMeasurementUnitConversion> {
        require_id(id)?;

        q::get_valid_measurement_unit_conversion(self.pool(), id)
            .await
            .and_then(|row| row.ok_or(DbError::NotFound))
            .and_then(valid_measurement_unit_conversion_from_row)
            .map_err(|err| prepare_error(err, "fetching valid measurement unit conversion"))
    }

    /// Conversions whose `from` side is the given unit.
    #[instrument(skip(self))]
    pub async fn get_valid_measurement_unit_conversions_from_unit(
        &self,
        valid_measurement_unit_id: &str,
    ) -> DbResult<Vec<ValidMeasurementUnitConversion>> {
        require_id(valid_measurement_unit_id)?;

        q::get_valid_measurement_unit_conversions_from_unit(self.pool(), valid_measurement_unit_id)
            .await
            .and_then(|rows| rows.into_iter().map(valid_measurement_unit_conversion_from_row).collect())
            .map_err(|err| prepare_error(err, "fetching valid measurement unit conversions from unit"))
    }

    /// Conversions whose `to` side is the given unit.
    #[instrument(skip(self))]
    pub async fn get_valid_measurement_unit_conversions_to_unit(
        &self,
        valid_measurement_unit_id: &str,
    ) -> DbResult<Vec<ValidMeasurementUnitConversion>> {
        require_id(valid_measurement_unit_id)?;

        q::get_valid_measurement_unit_conversions_to_unit(self.pool(), valid_measurement_unit_id)
            .await
            .and_then(|rows| rows.into_iter().map(valid_measurement_unit_conversion_from_row).collect())
            .map_err(|err| prepare_error(err, "fetching valid measurement unit conversions to unit"))
    }

    #[instrument(skip(self, input), fields(from = %input.from, to = %input.to))]
    pub async fn create_valid_measurement_unit_conversion(
        &self,
        input: &ValidMeasurementUnitConversionDatabaseCreationInput,
    ) -> DbResult<ValidMeasurementUnitConversion> {
        input.validate()?;

        let conversion = ValidMeasurementUnitConversion {
            id: self.new_id(),
            from: ValidMeasurementUnit {
                id: input.from.clone(),
                ..Default::default()
            },
            to: ValidMeasurementUnit {
                id: input.to.clone(),
                ..Default::default()
            },
            only_for_ingredient: input.only_for_ingredient.as_ref().map(|id| ValidIngredient {
                id: id.clone(),
                ..Default::default()
            }),
            modifier: input.modifier,
            notes: input.notes.clone(),
            created_at: self.now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = valid_measurement_unit_conversion_row(&conversion)?;

        q::create_valid_measurement_unit_conversion(self.pool(), &row)
            .await
            .map_err(|err| prepare_error(err, "creating valid measurement unit conversion"))?;

        info!(id = %conversion.id, "Created valid measurement unit conversion");
        Ok(conversion)
    }

    #[instrument(skip(self, conversion), fields(id = %conversion.id))]
    pub async fn update_valid_measurement_unit_conversion(
        &self,
        conversion: &ValidMeasurementUnitConversion,
    ) -> DbResult<()> {
        require_id(&conversion.id)?;
        conversion.validate()?;
        let row = valid_measurement_unit_conversion_row(conversion)?;

        q::update_valid_measurement_unit_conversion(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating valid measurement unit conversion"))?;

        debug!(id = %conversion.id, "Updated valid measurement unit conversion");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn archive_valid_measurement_unit_conversion(&self, id: &str) -> DbResult<()> {
        require_id(id)?;

        q::archive_valid_measurement_unit_conversion(self.pool(), id)
            .await
            .map_err(|err| prepare_error(err, "archiving valid measurement unit conversion"))?;

        info!(id = %id, "Archived valid measurement unit conversion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::Float32RangeWithOptionalMax;
    use rust_decimal::Decimal;

    use crate::queries::valid_enumerations::ValidMeasurementUnitRow;

    #[test]
    fn test_allowable_quantity_maps_to_column_pair() {
        let link = ValidIngredientMeasurementUnit {
            id: "link".to_string(),
            notes: String::new(),
            ingredient: ValidIngredient {
                id: "flour".to_string(),
                ..Default::default()
            },
            measurement_unit: ValidMeasurementUnit {
                id: "cup".to_string(),
                ..Default::default()
            },
            allowable_quantity: Float32RangeWithOptionalMax::new(0.25, Some(8.0)),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let row = valid_ingredient_measurement_unit_row(&link).unwrap();
        assert_eq!(row.valid_ingredient_id, "flour");
        assert_eq!(row.valid_measurement_unit_id, "cup");
        assert_eq!(row.minimum_allowable_quantity, Decimal::new(25, 2));
        assert_eq!(row.maximum_allowable_quantity, Some(Decimal::new(8, 0)));
    }

    fn unit_row(id: &str) -> ValidMeasurementUnitRow {
        ValidMeasurementUnitRow {
            id: id.to_string(),
            name: id.to_string(),
            plural_name: format!("{id}s"),
            description: String::new(),
            icon_path: String::new(),
            slug: id.to_string(),
            volumetric: true,
            universal: false,
            metric: false,
            imperial: true,
            last_indexed_at: None,
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        }
    }

    #[test]
    fn test_conversion_sides_decode_from_their_aliases() {
        let row = ValidMeasurementUnitConversionRow {
            id: "conversion".to_string(),
            from_unit: "cup".to_string(),
            to_unit: "tablespoon".to_string(),
            only_for_ingredient: None,
            modifier: Decimal::new(16, 0),
            notes: String::new(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let conversion = valid_measurement_unit_conversion_from_row((
            row,
            FromUnitRow(unit_row("cup")),
            ToUnitRow(unit_row("tablespoon")),
            None,
        ))
        .unwrap();

        assert_eq!(conversion.from.id, "cup");
        assert_eq!(conversion.to.id, "tablespoon");
        assert_eq!(conversion.modifier, 16.0);
        assert!(conversion.only_for_ingredient.is_none());
    }

    #[test]
    fn test_conversion_ingredient_maps_to_nullable_column() {
        let conversion = ValidMeasurementUnitConversion {
            id: "conversion".to_string(),
            from: ValidMeasurementUnit {
                id: "cup".to_string(),
                ..Default::default()
            },
            to: ValidMeasurementUnit {
                id: "gram".to_string(),
                ..Default::default()
            },
            only_for_ingredient: Some(ValidIngredient {
                id: "flour".to_string(),
                ..Default::default()
            }),
            modifier: 120.0,
            notes: String::new(),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let row = valid_measurement_unit_conversion_row(&conversion).unwrap();
        assert_eq!(row.only_for_ingredient.as_deref(), Some("flour"));
        assert_eq!(row.modifier, Decimal::new(120, 0));

        let row = valid_measurement_unit_conversion_row(&ValidMeasurementUnitConversion {
            modifier: f32::NAN,
            ..conversion
        });
        assert!(row.is_err());
    }
}
