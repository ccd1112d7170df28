//! Column lists, one macro per table.
//!
//! Each expands to a `&'static str` of `table.col AS {prefix}col` pairs and
//! must list exactly the fields of the matching row record; the tests at the
//! bottom hold them together.

macro_rules! user_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "username", "first_name", "last_name", "email_address",
            "email_address_verified_at", "avatar_src", "birthday", "hashed_password",
            "password_last_changed_at", "requires_password_change", "two_factor_secret",
            "two_factor_secret_verified_at", "service_role", "user_account_status",
            "user_account_status_explanation", "last_accepted_terms_of_service",
            "last_accepted_privacy_policy", "last_indexed_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! household_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "billing_status", "contact_phone", "address_line_1",
            "address_line_2", "city", "state", "zip_code", "country", "latitude",
            "longitude", "belongs_to_user", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! household_user_membership_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_household", "belongs_to_user", "household_role",
            "default_household", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! household_invitation_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "destination_household", "from_user", "to_user", "to_name", "to_email",
            "note", "status", "status_note", "token", "expires_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! audit_log_entry_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "resource_type", "relevant_id", "event_type", "changes",
            "belongs_to_user", "belongs_to_household", "created_at",
        ])
    };
}

macro_rules! service_setting_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "setting_type", "description", "default_value", "enumeration",
            "admins_only", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! service_setting_configuration_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "value", "notes", "service_setting_id", "belongs_to_user",
            "belongs_to_household", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! webhook_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "content_type", "url", "method", "events", "data_types",
            "belongs_to_household", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

// -----------------------------------------------------------------------------
// Valid enumerations
// -----------------------------------------------------------------------------

macro_rules! valid_ingredient_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "plural_name", "description", "warning", "icon_path", "slug",
            "shopping_suggestions", "storage_instructions",
            "minimum_ideal_storage_temperature_in_celsius",
            "maximum_ideal_storage_temperature_in_celsius",
            "contains_egg", "contains_dairy", "contains_peanut", "contains_tree_nut",
            "contains_soy", "contains_wheat", "contains_shellfish", "contains_sesame",
            "contains_fish", "contains_gluten", "contains_alcohol", "animal_flesh",
            "animal_derived", "volumetric", "is_liquid", "restrict_to_preparations",
            "is_starch", "is_protein", "is_grain", "is_fruit", "is_salt", "is_fat",
            "is_acid", "is_heat", "last_indexed_at", "created_at", "last_updated_at",
            "archived_at",
        ])
    };
}

macro_rules! valid_instrument_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "plural_name", "description", "icon_path", "slug",
            "usable_for_storage", "display_in_summary_lists",
            "include_in_generated_instructions", "last_indexed_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_measurement_unit_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "plural_name", "description", "icon_path", "slug", "volumetric",
            "universal", "metric", "imperial", "last_indexed_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_preparation_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "past_tense", "description", "icon_path", "slug",
            "yields_nothing", "restrict_to_ingredients", "minimum_ingredient_count",
            "maximum_ingredient_count", "minimum_instrument_count",
            "maximum_instrument_count", "minimum_vessel_count", "maximum_vessel_count",
            "temperature_required", "time_estimate_required",
            "condition_expression_required", "consumes_vessel", "only_for_vessels",
            "last_indexed_at", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_vessel_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "plural_name", "description", "icon_path", "slug",
            "usable_for_storage", "display_in_summary_lists",
            "include_in_generated_instructions", "capacity", "capacity_unit",
            "width_in_millimeters", "length_in_millimeters", "height_in_millimeters",
            "shape", "last_indexed_at", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_group_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "description", "slug", "created_at", "last_updated_at",
            "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_group_member_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_group", "valid_ingredient", "created_at", "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_measurement_unit_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "valid_ingredient_id", "valid_measurement_unit_id",
            "minimum_allowable_quantity", "maximum_allowable_quantity", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_preparation_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "valid_preparation_id", "valid_ingredient_id", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_preparation_instrument_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "valid_preparation_id", "valid_instrument_id", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_preparation_vessel_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "valid_preparation_id", "valid_vessel_id", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_state_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "past_tense", "slug", "description", "icon_path",
            "attribute_type", "last_indexed_at", "created_at", "last_updated_at",
            "archived_at",
        ])
    };
}

macro_rules! valid_ingredient_state_ingredient_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "valid_ingredient_state_id", "valid_ingredient_id", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! valid_measurement_unit_conversion_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "from_unit", "to_unit", "only_for_ingredient", "modifier", "notes",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

// -----------------------------------------------------------------------------
// Recipes
// -----------------------------------------------------------------------------

macro_rules! recipe_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "slug", "source", "description", "inspired_by_recipe_id",
            "min_estimated_portions", "max_estimated_portions", "portion_name",
            "plural_portion_name", "seal_of_approval", "eligible_for_meals",
            "yields_component_type", "created_by_user", "last_indexed_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "index", "preparation_id", "minimum_estimated_time_in_seconds",
            "maximum_estimated_time_in_seconds", "minimum_temperature_in_celsius",
            "maximum_temperature_in_celsius", "notes", "explicit_instructions",
            "condition_expression", "optional", "start_timer_automatically",
            "belongs_to_recipe", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_product_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "product_type", "measurement_unit", "minimum_quantity_value",
            "maximum_quantity_value", "quantity_notes", "compostable",
            "minimum_storage_duration_in_seconds", "maximum_storage_duration_in_seconds",
            "minimum_storage_temperature_in_celsius",
            "maximum_storage_temperature_in_celsius", "storage_instructions", "is_liquid",
            "is_waste", "index", "contained_in_vessel_index", "belongs_to_recipe_step",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_ingredient_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "optional", "ingredient_id", "measurement_unit",
            "minimum_quantity_value", "maximum_quantity_value", "quantity_notes",
            "ingredient_notes", "recipe_step_product_id", "option_index", "vessel_index",
            "product_percentage_to_use", "to_taste", "belongs_to_recipe_step",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_instrument_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "instrument_id", "recipe_step_product_id", "name", "notes",
            "preference_rank", "optional", "option_index", "minimum_quantity",
            "maximum_quantity", "belongs_to_recipe_step", "created_at", "last_updated_at",
            "archived_at",
        ])
    };
}

macro_rules! recipe_step_vessel_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "valid_vessel_id", "recipe_step_product_id", "name", "notes",
            "vessel_preposition", "minimum_quantity", "maximum_quantity",
            "unavailable_after_step", "belongs_to_recipe_step", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_completion_condition_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "ingredient_state", "notes", "optional", "belongs_to_recipe_step",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_step_completion_condition_ingredient_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_recipe_step_completion_condition", "recipe_step_ingredient",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_prep_task_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "description", "notes", "optional", "explicit_storage_instructions",
            "minimum_storage_temperature_in_celsius", "maximum_storage_temperature_in_celsius",
            "storage_type", "minimum_time_buffer_before_recipe_in_seconds",
            "maximum_time_buffer_before_recipe_in_seconds", "belongs_to_recipe", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! recipe_prep_task_step_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_recipe_step", "belongs_to_recipe_prep_task",
            "satisfies_recipe_step",
        ])
    };
}

macro_rules! recipe_media_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_recipe", "belongs_to_recipe_step", "mime_type",
            "internal_path", "external_path", "index", "created_at", "last_updated_at",
            "archived_at",
        ])
    };
}

macro_rules! recipe_rating_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "recipe_id", "taste", "difficulty", "cleanup", "instructions", "overall",
            "notes", "by_user", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

// -----------------------------------------------------------------------------
// Meals & meal plans
// -----------------------------------------------------------------------------

macro_rules! meal_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "name", "description", "min_estimated_portions", "max_estimated_portions",
            "eligible_for_meal_plans", "created_by_user", "last_indexed_at", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_component_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "meal_id", "recipe_id", "meal_component_type", "recipe_scale",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_plan_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "status", "voting_deadline", "election_method",
            "belongs_to_household", "created_by_user", "grocery_list_initialized",
            "tasks_created", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_plan_event_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "starts_at", "ends_at", "meal_name", "belongs_to_meal_plan",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_plan_option_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "meal_id", "notes", "meal_scale", "chosen", "tiebroken", "assigned_cook",
            "assigned_dishwasher", "belongs_to_meal_plan_event", "created_at",
            "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_plan_option_vote_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "rank", "abstain", "notes", "by_user", "belongs_to_meal_plan_option",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! meal_plan_task_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_meal_plan_option", "belongs_to_recipe_prep_task",
            "creation_explanation", "status", "status_explanation", "assigned_to_user",
            "completed_at", "created_at", "last_updated_at",
        ])
    };
}

macro_rules! meal_plan_grocery_list_item_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "belongs_to_meal_plan", "valid_ingredient", "valid_measurement_unit",
            "minimum_quantity_needed", "maximum_quantity_needed", "quantity_purchased",
            "purchased_measurement_unit", "purchased_upc", "purchase_price",
            "status_explanation", "status", "created_at", "last_updated_at", "archived_at",
        ])
    };
}

// -----------------------------------------------------------------------------
// Preferences & ownership
// -----------------------------------------------------------------------------

macro_rules! user_ingredient_preference_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "ingredient", "rating", "notes", "allergy", "belongs_to_user",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

macro_rules! household_instrument_ownership_columns {
    ($t:literal, $p:literal) => {
        columns!($t, $p, [
            "id", "notes", "quantity", "valid_instrument_id", "belongs_to_household",
            "created_at", "last_updated_at", "archived_at",
        ])
    };
}

#[cfg(test)]
mod tests {
    use crate::queries::audit_log_entries::AuditLogEntryRow;
    use crate::queries::households::{
        HouseholdInvitationRow, HouseholdRow, HouseholdUserMembershipRow,
    };
    use crate::queries::meal_plan_grocery_list_items::MealPlanGroceryListItemRow;
    use crate::queries::meal_plan_tasks::MealPlanTaskRow;
    use crate::queries::meal_plans::{
        MealPlanEventRow, MealPlanOptionRow, MealPlanOptionVoteRow, MealPlanRow,
    };
    use crate::queries::meals::{MealComponentRow, MealRow};
    use crate::queries::preferences::{
        HouseholdInstrumentOwnershipRow, UserIngredientPreferenceRow,
    };
    use crate::queries::recipe_step_children::{
        RecipeStepCompletionConditionIngredientRow, RecipeStepCompletionConditionRow,
        RecipeStepIngredientRow, RecipeStepInstrumentRow, RecipeStepProductRow,
        RecipeStepVesselRow,
    };
    use crate::queries::recipe_prep_tasks::{RecipePrepTaskRow, RecipePrepTaskStepRow};
    use crate::queries::recipes::{RecipeMediaRow, RecipeRatingRow, RecipeRow, RecipeStepRow};
    use crate::queries::service_settings::{ServiceSettingConfigurationRow, ServiceSettingRow};
    use crate::queries::users::UserRow;
    use crate::queries::valid_enumerations::{
        ValidIngredientGroupMemberRow, ValidIngredientGroupRow, ValidIngredientRow,
        ValidIngredientStateRow, ValidInstrumentRow, ValidMeasurementUnitRow,
        ValidPreparationRow, ValidVesselRow,
    };
    use crate::queries::valid_mappings::{
        ValidIngredientMeasurementUnitRow, ValidIngredientPreparationRow,
        ValidIngredientStateIngredientRow, ValidMeasurementUnitConversionRow,
        ValidPreparationInstrumentRow, ValidPreparationVesselRow,
    };
    use crate::queries::webhooks::WebhookRow;

    /// Rebuilds the list a column macro should have produced.
    fn expected(table: &str, prefix: &str, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|field| format!("{table}.{field} AS {prefix}{field}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    macro_rules! assert_columns_match {
        ($($macro:ident => $row:ty,)+) => {
            $(
                assert_eq!(
                    $macro!("t", "p_"),
                    expected("t", "p_", <$row>::COLUMNS),
                    "{} is out of sync with {}",
                    stringify!($macro),
                    stringify!($row),
                );
            )+
        };
    }

    #[test]
    fn test_column_lists_match_row_records() {
        assert_columns_match! {
            user_columns => UserRow,
            household_columns => HouseholdRow,
            household_user_membership_columns => HouseholdUserMembershipRow,
            household_invitation_columns => HouseholdInvitationRow,
            audit_log_entry_columns => AuditLogEntryRow,
            service_setting_columns => ServiceSettingRow,
            service_setting_configuration_columns => ServiceSettingConfigurationRow,
            webhook_columns => WebhookRow,
            valid_ingredient_columns => ValidIngredientRow,
            valid_instrument_columns => ValidInstrumentRow,
            valid_measurement_unit_columns => ValidMeasurementUnitRow,
            valid_preparation_columns => ValidPreparationRow,
            valid_vessel_columns => ValidVesselRow,
            valid_ingredient_group_columns => ValidIngredientGroupRow,
            valid_ingredient_group_member_columns => ValidIngredientGroupMemberRow,
            valid_ingredient_measurement_unit_columns => ValidIngredientMeasurementUnitRow,
            valid_ingredient_preparation_columns => ValidIngredientPreparationRow,
            valid_preparation_instrument_columns => ValidPreparationInstrumentRow,
            valid_preparation_vessel_columns => ValidPreparationVesselRow,
            valid_ingredient_state_columns => ValidIngredientStateRow,
            valid_ingredient_state_ingredient_columns => ValidIngredientStateIngredientRow,
            valid_measurement_unit_conversion_columns => ValidMeasurementUnitConversionRow,
            recipe_columns => RecipeRow,
            recipe_step_columns => RecipeStepRow,
            recipe_step_product_columns => RecipeStepProductRow,
            recipe_step_ingredient_columns => RecipeStepIngredientRow,
            recipe_step_instrument_columns => RecipeStepInstrumentRow,
            recipe_step_vessel_columns => RecipeStepVesselRow,
            recipe_step_completion_condition_columns => RecipeStepCompletionConditionRow,
            recipe_step_completion_condition_ingredient_columns => RecipeStepCompletionConditionIngredientRow,
            recipe_media_columns => RecipeMediaRow,
            recipe_rating_columns => RecipeRatingRow,
            recipe_prep_task_columns => RecipePrepTaskRow,
            recipe_prep_task_step_columns => RecipePrepTaskStepRow,
            meal_columns => MealRow,
            meal_component_columns => MealComponentRow,
            meal_plan_columns => MealPlanRow,
            meal_plan_event_columns => MealPlanEventRow,
            meal_plan_option_columns => MealPlanOptionRow,
            meal_plan_option_vote_columns => MealPlanOptionVoteRow,
            meal_plan_task_columns => MealPlanTaskRow,
            meal_plan_grocery_list_item_columns => MealPlanGroceryListItemRow,
            user_ingredient_preference_columns => UserIngredientPreferenceRow,
            household_instrument_ownership_columns => HouseholdInstrumentOwnershipRow,
        }
    }

    /// PostgreSQL truncates identifiers past 63 bytes.
    #[test]
    fn test_joined_aliases_fit_in_an_identifier() {
        let longest = ValidIngredientRow::COLUMNS
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(0);
        assert!("valid_ingredient_".len() + longest <= 63);

        let longest = ValidMeasurementUnitRow::COLUMNS
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(0);
        assert!("valid_vessel_valid_measurement_unit_".len() + longest <= 63);
        assert!("purchased_measurement_unit_".len() + longest <= 63);

        let longest = RecipePrepTaskRow::COLUMNS
            .iter()
            .map(|c| c.len())
            .max()
            .unwrap_or(0);
        assert!("recipe_prep_task_".len() + longest <= 63);
    }
}
