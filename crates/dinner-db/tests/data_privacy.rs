//! Whole-user export against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use dinner_core::UserIngredientPreferenceDatabaseCreationInput;
use dinner_db::ErrorKind;

use common::{create_ingredient, create_recipe, create_user, querier, unique};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_aggregate_user_data_collects_owned_records() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let household_id = querier.get_default_household_id_for_user(&user.id).await.unwrap();
    let recipe = create_recipe(&querier, &user.id).await;
    let ingredient = create_ingredient(&querier).await;
    querier
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_id: ingredient.id.clone(),
            rating: 7,
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    let report_id = unique("report");
    let collection = querier.aggregate_user_data(&user.id, &report_id).await.unwrap();

    assert_eq!(collection.report_id, report_id);
    assert_eq!(collection.user.id, user.id);
    assert_eq!(collection.recipes.len(), 1);
    assert_eq!(collection.recipes[0].id, recipe.id);
    assert_eq!(collection.user_ingredient_preferences.len(), 1);
    assert_eq!(collection.user_ingredient_preferences[0].ingredient.id, ingredient.id);
    assert!(collection.meals.is_empty());

    let household = collection
        .households
        .get(&household_id)
        .expect("default household should be exported");
    assert_eq!(household.household.id, household_id);
    assert!(household.meal_plans.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_aggregate_user_data_for_unknown_user() {
    let querier = querier().await;

    let err = querier
        .aggregate_user_data(&unique("nobody"), &unique("report"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
