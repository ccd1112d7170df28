//! # Meal Repository
//!
//! Meals and their components. Every read, lists included, comes back with
//! components attached; each component carries its recipe without steps.

use std::collections::BTreeMap;

use dinner_core::{
    Meal, MealComponent, MealDatabaseCreationInput, QueryFilter, QueryFilteredResult, Recipe,
};
use tracing::{debug, info, instrument};

use crate::codec::{decimal_from_f32, f32_from_decimal, float32_range_with_optional_max, parse_enum, DecimalPair};
use crate::error::{require_id, require_ids, DbError, DbResult};
use crate::observability::prepare_error;
use crate::pool::Querier;
use crate::queries::meals::{self as q, MealComponentRow, MealComponentWithRecipeRow, MealRow};
use crate::queries::Counted;
use crate::repository::recipes::recipe_from_row;
use crate::repository::{filter_or_default, into_filtered_result, SEARCH_LIMIT};

pub(crate) fn meal_from_row(row: MealRow) -> DbResult<Meal> {
    Ok(Meal {
        estimated_portions: float32_range_with_optional_max(
            "estimated_portions",
            row.min_estimated_portions,
            row.max_estimated_portions,
        )?,
        id: row.id,
        name: row.name,
        description: row.description,
        eligible_for_meal_plans: row.eligible_for_meal_plans,
        created_by_user: row.created_by_user,
        components: Vec::new(),
        last_indexed_at: row.last_indexed_at,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
        archived_at: row.archived_at,
    })
}

fn meal_row(meal: &Meal) -> DbResult<MealRow> {
    let portions = DecimalPair::from_float32_range_with_optional_max("estimated_portions", &meal.estimated_portions)?;

    Ok(MealRow {
        id: meal.id.clone(),
        name: meal.name.clone(),
        description: meal.description.clone(),
        min_estimated_portions: portions.min.unwrap_or_default(),
        max_estimated_portions: portions.max,
        eligible_for_meal_plans: meal.eligible_for_meal_plans,
        created_by_user: meal.created_by_user.clone(),
        last_indexed_at: meal.last_indexed_at,
        created_at: meal.created_at,
        last_updated_at: meal.last_updated_at,
        archived_at: meal.archived_at,
    })
}

/// Decodes a component and returns it with the meal it belongs to.
fn meal_component_from_row((row, recipe): MealComponentWithRecipeRow) -> DbResult<(String, MealComponent)> {
    let component = MealComponent {
        recipe: recipe_from_row(recipe)?,
        recipe_scale: f32_from_decimal("recipe_scale", row.recipe_scale)?,
        component_type: parse_enum("meal_component_type", &row.meal_component_type)?,
    };
    Ok((row.meal_id, component))
}

impl Querier {
    async fn attach_meal_components(&self, meals: &mut [Meal]) -> DbResult<()> {
        if meals.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = meals.iter().map(|m| m.id.clone()).collect();

        let mut by_meal: BTreeMap<String, Vec<MealComponent>> = BTreeMap::new();
        for row in q::get_meal_components_for_meals(self.pool(), &ids).await? {
            let (meal_id, component) = meal_component_from_row(row)?;
            by_meal.entry(meal_id).or_default().push(component);
        }
        for meal in meals.iter_mut() {
            meal.components = by_meal.remove(&meal.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn meal_page(
        &self,
        rows: Vec<Counted<MealRow>>,
        filter: &QueryFilter,
    ) -> DbResult<QueryFilteredResult<Meal>> {
        let mut page = into_filtered_result(rows, filter, meal_from_row)?;
        self.attach_meal_components(&mut page.data).await?;
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn meal_exists(&self, meal_id: &str) -> DbResult<bool> {
        require_id(meal_id)?;

        q::meal_exists(self.pool(), meal_id)
            .await
            .map_err(|err| prepare_error(err, "checking meal existence"))
    }

    #[instrument(skip(self))]
    pub async fn get_meal(&self, meal_id: &str) -> DbResult<Meal> {
        require_id(meal_id)?;

        let result: DbResult<Meal> = async {
            let row = q::get_meal(self.pool(), meal_id).await?.ok_or(DbError::NotFound)?;
            let mut meals = [meal_from_row(row)?];
            self.attach_meal_components(&mut meals).await?;
            let [meal] = meals;
            Ok(meal)
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meal"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meals(&self, filter: Option<&QueryFilter>) -> DbResult<QueryFilteredResult<Meal>> {
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<Meal>> = async {
            let rows = q::get_meals(self.pool(), &filter).await?;
            self.meal_page(rows, &filter).await
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meals"))
    }

    #[instrument(skip(self, filter))]
    pub async fn get_meals_created_by_user(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> DbResult<QueryFilteredResult<Meal>> {
        require_id(user_id)?;
        let filter = filter_or_default(filter);

        let result: DbResult<QueryFilteredResult<Meal>> = async {
            let rows = q::get_meals_created_by_user(self.pool(), &filter, user_id).await?;
            self.meal_page(rows, &filter).await
        }
        .await;

        result.map_err(|err| prepare_error(err, "fetching meals created by user"))
    }

    /// Name search; results carry no components.
    #[instrument(skip(self))]
    pub async fn search_for_meals(&self, query: &str) -> DbResult<Vec<Meal>> {
        if query.trim().is_empty() {
            return Err(DbError::NilInput);
        }

        q::search_for_meals(self.pool(), query, SEARCH_LIMIT)
            .await
            .and_then(|rows| rows.into_iter().map(meal_from_row).collect())
            .map_err(|err| prepare_error(err, "searching for meals"))
    }

    /// Creates a meal and its components in one transaction.
    #[instrument(skip(self, input), fields(name = %input.name, components = input.components.len()))]
    pub async fn create_meal(&self, input: &MealDatabaseCreationInput) -> DbResult<Meal> {
        input.validate()?;
        for component in &input.components {
            require_id(&component.recipe_id)?;
        }

        let now = self.now();
        let mut meal = Meal {
            id: self.new_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            estimated_portions: input.estimated_portions,
            eligible_for_meal_plans: input.eligible_for_meal_plans,
            created_by_user: input.created_by_user.clone(),
            components: Vec::with_capacity(input.components.len()),
            last_indexed_at: None,
            created_at: now,
            last_updated_at: None,
            archived_at: None,
        };
        let row = meal_row(&meal)?;

        let mut tx = self.begin("beginning meal creation transaction").await?;
        let outcome: DbResult<Vec<MealComponent>> = async {
            q::create_meal(&mut *tx, &row).await?;

            let mut components = Vec::with_capacity(input.components.len());
            for (index, component) in input.components.iter().enumerate() {
                let component_row = MealComponentRow {
                    id: self.new_id(),
                    meal_id: row.id.clone(),
                    recipe_id: component.recipe_id.clone(),
                    meal_component_type: component.component_type.as_str().to_string(),
                    recipe_scale: decimal_from_f32("recipe_scale", component.recipe_scale)?,
                    created_at: now,
                    last_updated_at: None,
                    archived_at: None,
                };
                q::create_meal_component(&mut *tx, &component_row)
                    .await
                    .map_err(|err| err.context(format!("creating meal component #{}", index + 1)))?;

                components.push(MealComponent {
                    recipe: Recipe {
                        id: component.recipe_id.clone(),
                        ..Default::default()
                    },
                    recipe_scale: component.recipe_scale,
                    component_type: component.component_type,
                });
            }
            Ok(components)
        }
        .await;

        match outcome {
            Ok(components) => {
                Querier::commit(tx, "committing meal creation transaction").await?;
                meal.components = components;
                info!(id = %meal.id, components = meal.components.len(), "Created meal");
                Ok(meal)
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "creating meal"))
            }
        }
    }

    /// Updates the meal's own fields. Components are fixed at creation.
    #[instrument(skip(self, meal), fields(id = %meal.id))]
    pub async fn update_meal(&self, meal: &Meal) -> DbResult<()> {
        require_ids(&[&meal.id, &meal.created_by_user])?;
        meal.estimated_portions.validate("estimated_portions")?;
        let row = meal_row(meal)?;

        q::update_meal(self.pool(), &row, self.now())
            .await
            .map_err(|err| prepare_error(err, "updating meal"))?;

        debug!(id = %meal.id, "Updated meal");
        Ok(())
    }

    /// Archives a meal and its components.
    #[instrument(skip(self))]
    pub async fn archive_meal(&self, user_id: &str, meal_id: &str) -> DbResult<()> {
        require_ids(&[user_id, meal_id])?;

        let mut tx = self.begin("beginning meal archive transaction").await?;
        let outcome: DbResult<u64> = async {
            let archived = q::archive_meal(&mut *tx, user_id, meal_id).await?;
            if archived == 0 {
                return Ok(0);
            }
            Ok(archived + q::archive_meal_components(&mut *tx, meal_id).await?)
        }
        .await;

        match outcome {
            Ok(touched) => {
                Querier::commit(tx, "committing meal archive transaction").await?;
                info!(id = %meal_id, touched, "Archived meal");
                Ok(())
            }
            Err(err) => {
                Querier::rollback(tx).await;
                Err(prepare_error(err, "archiving meal"))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_meal_ids_needing_indexing(&self) -> DbResult<Vec<String>> {
        q::get_meal_ids_needing_indexing(self.pool(), self.reindex_window_seconds())
            .await
            .map_err(|err| prepare_error(err, "fetching meal IDs needing indexing"))
    }

    #[instrument(skip(self))]
    pub async fn update_meal_last_indexed_at(&self, meal_id: &str) -> DbResult<()> {
        require_id(meal_id)?;

        q::update_meal_last_indexed_at(self.pool(), meal_id)
            .await
            .map_err(|err| prepare_error(err, "marking meal as indexed"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinner_core::{ComponentType, Float32RangeWithOptionalMax};
    use rust_decimal::Decimal;

    #[test]
    fn test_meal_row_keeps_open_ended_portions() {
        let meal = Meal {
            id: "m".to_string(),
            name: "taco night".to_string(),
            estimated_portions: Float32RangeWithOptionalMax::new(4.0, None),
            created_by_user: "u".to_string(),
            ..Default::default()
        };

        let row = meal_row(&meal).unwrap();
        assert_eq!(row.min_estimated_portions, Decimal::new(4, 0));
        assert!(row.max_estimated_portions.is_none());
        assert_eq!(meal_from_row(row).unwrap(), meal);
    }

    #[test]
    fn test_component_carries_its_meal_id() {
        let recipe = crate::queries::recipes::RecipeRow {
            id: "r".to_string(),
            name: "salsa".to_string(),
            slug: String::new(),
            source: String::new(),
            description: String::new(),
            inspired_by_recipe_id: None,
            min_estimated_portions: Decimal::ONE,
            max_estimated_portions: None,
            portion_name: String::new(),
            plural_portion_name: String::new(),
            seal_of_approval: false,
            eligible_for_meals: true,
            yields_component_type: "side".to_string(),
            created_by_user: "u".to_string(),
            last_indexed_at: None,
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };
        let row = MealComponentRow {
            id: "c".to_string(),
            meal_id: "m".to_string(),
            recipe_id: "r".to_string(),
            meal_component_type: "side".to_string(),
            recipe_scale: Decimal::new(15, 1),
            created_at: Utc::now(),
            last_updated_at: None,
            archived_at: None,
        };

        let (meal_id, component) = meal_component_from_row((row, recipe)).unwrap();
        assert_eq!(meal_id, "m");
        assert_eq!(component.recipe.name, "salsa");
        assert_eq!(component.recipe_scale, 1.5);
        assert_eq!(component.component_type, ComponentType::Side);
    }
}
