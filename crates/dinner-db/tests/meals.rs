//! List pagination and archive visibility against PostgreSQL, using meals.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use chrono::{Duration, Utc};
use dinner_core::{
    ComponentType, Float32RangeWithOptionalMax, Meal, MealComponentDatabaseCreationInput,
    MealDatabaseCreationInput, QueryFilter,
};
use dinner_db::{ErrorKind, Querier};

use common::{create_recipe, create_user, querier, unique};

async fn create_meal(querier: &Querier, user_id: &str, recipe_id: &str) -> Meal {
    querier
        .create_meal(&MealDatabaseCreationInput {
            name: unique("meal"),
            description: String::new(),
            estimated_portions: Float32RangeWithOptionalMax::new(2.0, None),
            eligible_for_meal_plans: true,
            created_by_user: user_id.to_string(),
            components: vec![MealComponentDatabaseCreationInput {
                recipe_id: recipe_id.to_string(),
                recipe_scale: 1.0,
                component_type: ComponentType::Main,
            }],
        })
        .await
        .expect("meal should be created")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_list_pagination_invariants() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;

    let mut meals = Vec::new();
    for _ in 0..25 {
        meals.push(create_meal(&querier, &user.id, &recipe.id).await);
    }

    let first = querier
        .get_meals_created_by_user(&user.id, Some(&QueryFilter::page(1, 10)))
        .await
        .unwrap();
    assert_eq!(first.data.len(), 10);
    assert!(first.total_count() >= 25);
    assert!(first.filtered_count() >= 25);
    assert!(first.filtered_count() <= first.total_count());
    assert!(first.data.iter().all(|meal| meal.components.len() == 1));

    let third = querier
        .get_meals_created_by_user(&user.id, Some(&QueryFilter::page(3, 10)))
        .await
        .unwrap();
    assert!(third.data.len() >= 5);

    let before = querier
        .get_meals_created_by_user(&user.id, None)
        .await
        .unwrap()
        .total_count();
    querier.archive_meal(&user.id, &meals[0].id).await.unwrap();

    let after = querier
        .get_meals_created_by_user(&user.id, None)
        .await
        .unwrap();
    assert_eq!(after.total_count(), before - 1);

    let with_archived = querier
        .get_meals_created_by_user(&user.id, Some(&QueryFilter::default().with_archived(true)))
        .await
        .unwrap();
    assert_eq!(with_archived.total_count(), before);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_archived_meal_disappears() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let meal = create_meal(&querier, &user.id, &recipe.id).await;

    assert!(querier.meal_exists(&meal.id).await.unwrap());
    querier.archive_meal(&user.id, &meal.id).await.unwrap();

    assert!(!querier.meal_exists(&meal.id).await.unwrap());
    let err = querier.get_meal(&meal.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let listed = querier
        .get_meals_created_by_user(&user.id, None)
        .await
        .unwrap();
    assert!(listed.data.iter().all(|m| m.id != meal.id));

    let archived = querier
        .get_meals_created_by_user(&user.id, Some(&QueryFilter::default().with_archived(true)))
        .await
        .unwrap();
    assert!(archived.data.iter().any(|m| m.id == meal.id));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_never_updated_rows_ignore_update_windows() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let untouched = create_meal(&querier, &user.id, &recipe.id).await;
    let touched = create_meal(&querier, &user.id, &recipe.id).await;

    let mut renamed = querier.get_meal(&touched.id).await.unwrap();
    renamed.name = unique("renamed");
    querier.update_meal(&renamed).await.unwrap();

    let future = QueryFilter {
        updated_after: Some(Utc::now() + Duration::days(1)),
        ..Default::default()
    };
    let listed = querier
        .get_meals_created_by_user(&user.id, Some(&future))
        .await
        .unwrap();
    assert!(listed.data.iter().any(|m| m.id == untouched.id));
    assert!(listed.data.iter().all(|m| m.id != touched.id));

    let past = QueryFilter {
        updated_before: Some(Utc::now() - Duration::days(1)),
        ..Default::default()
    };
    let listed = querier
        .get_meals_created_by_user(&user.id, Some(&past))
        .await
        .unwrap();
    assert!(listed.data.iter().any(|m| m.id == untouched.id));
    assert!(listed.data.iter().all(|m| m.id != touched.id));

    let fetched = querier.get_meal(&touched.id).await.unwrap();
    assert_eq!(fetched.name, renamed.name);
    assert!(fetched.last_updated_at.is_some());
}
