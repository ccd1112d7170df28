//! Recipe step aggregates against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use std::sync::Arc;

use dinner_core::{
    Float32RangeWithOptionalMax, RecipeStepCompletionConditionDatabaseCreationInput,
    RecipeStepDatabaseCreationInput, RecipeStepIngredientDatabaseCreationInput,
};
use dinner_db::{ErrorKind, SequentialIdGenerator};

use common::{
    create_ingredient, create_measurement_unit, create_preparation, create_recipe, create_user, querier, unique,
    with_ids,
};

fn ingredient_input(ingredient_id: &str, measurement_unit_id: &str) -> RecipeStepIngredientDatabaseCreationInput {
    RecipeStepIngredientDatabaseCreationInput {
        name: "ingredient".to_string(),
        ingredient_id: Some(ingredient_id.to_string()),
        measurement_unit_id: measurement_unit_id.to_string(),
        quantity: Float32RangeWithOptionalMax::new(1.0, Some(2.0)),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_create_recipe_step_with_children() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let preparation = create_preparation(&querier).await;
    let unit = create_measurement_unit(&querier).await;
    let onion = create_ingredient(&querier).await;
    let garlic = create_ingredient(&querier).await;

    let step = querier
        .create_recipe_step(&RecipeStepDatabaseCreationInput {
            index: 0,
            preparation_id: preparation.id.clone(),
            belongs_to_recipe: recipe.id.clone(),
            notes: "chop finely".to_string(),
            ingredients: vec![
                ingredient_input(&onion.id, &unit.id),
                ingredient_input(&garlic.id, &unit.id),
            ],
            completion_conditions: vec![RecipeStepCompletionConditionDatabaseCreationInput {
                ingredient_state: "translucent".to_string(),
                ingredient_indices: vec![1],
                ..Default::default()
            }],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(step.ingredients.len(), 2);
    assert_eq!(step.completion_conditions.len(), 1);
    assert_eq!(step.completion_conditions[0].ingredients.len(), 1);
    assert_eq!(
        step.completion_conditions[0].ingredients[0].recipe_step_ingredient,
        step.ingredients[1].id
    );

    let fetched = querier.get_recipe_step(&recipe.id, &step.id).await.unwrap();
    assert_eq!(fetched.preparation.name, preparation.name);
    assert_eq!(fetched.notes, "chop finely");
    let mut fetched_ingredients: Vec<_> = fetched.ingredients.iter().map(|i| i.id.clone()).collect();
    let mut created_ingredients: Vec<_> = step.ingredients.iter().map(|i| i.id.clone()).collect();
    fetched_ingredients.sort();
    created_ingredients.sort();
    assert_eq!(fetched_ingredients, created_ingredients);
    assert_eq!(fetched.completion_conditions.len(), 1);

    let full = querier.get_recipe(&recipe.id).await.unwrap();
    assert_eq!(full.steps.len(), 1);
    assert_eq!(full.steps[0].ingredients.len(), 2);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_recipe_step_failure_rolls_back_every_child() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let preparation = create_preparation(&querier).await;
    let unit = create_measurement_unit(&querier).await;
    let first = create_ingredient(&querier).await;
    let third = create_ingredient(&querier).await;

    let prefix = unique("step");
    let sequenced = with_ids(&querier, Arc::new(SequentialIdGenerator::new(prefix.clone())));
    let err = sequenced
        .create_recipe_step(&RecipeStepDatabaseCreationInput {
            index: 0,
            preparation_id: preparation.id.clone(),
            belongs_to_recipe: recipe.id.clone(),
            ingredients: vec![
                ingredient_input(&first.id, &unit.id),
                ingredient_input(&unique("no-such-ingredient"), &unit.id),
                ingredient_input(&third.id, &unit.id),
            ],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("creating recipe step ingredient #2"),
        "unexpected error: {err}"
    );

    // The step took the first generated ID, its first ingredient the second.
    let step_id = format!("{prefix}-1");
    assert!(!querier.recipe_step_exists(&recipe.id, &step_id).await.unwrap());
    assert!(!querier
        .recipe_step_ingredient_exists(&recipe.id, &step_id, &format!("{prefix}-2"))
        .await
        .unwrap());
    let steps = querier.get_recipe_steps(&recipe.id, None).await.unwrap();
    assert!(steps.data.is_empty());
    assert_eq!(steps.total_count(), 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_recipe_step_requires_its_recipe() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let other = create_recipe(&querier, &user.id).await;
    let preparation = create_preparation(&querier).await;

    let step = querier
        .create_recipe_step(&RecipeStepDatabaseCreationInput {
            preparation_id: preparation.id.clone(),
            belongs_to_recipe: recipe.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(querier.recipe_step_exists(&recipe.id, &step.id).await.unwrap());
    assert!(!querier.recipe_step_exists(&other.id, &step.id).await.unwrap());
    let err = querier.get_recipe_step(&other.id, &step.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    querier.archive_recipe(&user.id, &recipe.id).await.unwrap();
    assert!(!querier.recipe_exists(&recipe.id).await.unwrap());
    assert!(!querier.recipe_step_exists(&recipe.id, &step.id).await.unwrap());
}
