//! Grocery lists, prep tasks and meal plan tasks against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use chrono::{Duration, Utc};
use dinner_core::{
    ComponentType, Float32RangeWithOptionalMax, GroceryListItemStatus, MealComponentDatabaseCreationInput,
    MealDatabaseCreationInput, MealName, MealPlan, MealPlanDatabaseCreationInput,
    MealPlanEventDatabaseCreationInput, MealPlanGroceryListItemDatabaseCreationInput,
    MealPlanOptionDatabaseCreationInput, MealPlanOptionWinner, MealPlanTaskDatabaseCreationInput,
    MealPlanTaskStatus, MealPlanTaskStatusChangeRequestInput, Recipe, RecipePrepTaskDatabaseCreationInput,
    RecipePrepTaskStepDatabaseCreationInput, RecipeStepDatabaseCreationInput, Uint32RangeWithOptionalMax,
    ValidElectionMethod,
};
use dinner_db::{ErrorKind, Querier};

use common::{
    create_ingredient, create_measurement_unit, create_preparation, create_recipe, create_user, querier, unique,
};

/// A finalized plan with one event whose only option serves `recipe`.
async fn finalized_plan(querier: &Querier, user_id: &str, recipe: &Recipe) -> (String, MealPlan) {
    let household_id = querier.get_default_household_id_for_user(user_id).await.unwrap();
    let meal = querier
        .create_meal(&MealDatabaseCreationInput {
            name: unique("meal"),
            description: String::new(),
            estimated_portions: Float32RangeWithOptionalMax::new(2.0, None),
            eligible_for_meal_plans: true,
            created_by_user: user_id.to_string(),
            components: vec![MealComponentDatabaseCreationInput {
                recipe_id: recipe.id.clone(),
                recipe_scale: 1.0,
                component_type: ComponentType::Main,
            }],
        })
        .await
        .unwrap();

    let starts_at = Utc::now() + Duration::days(2);
    let plan = querier
        .create_meal_plan(&MealPlanDatabaseCreationInput {
            notes: String::new(),
            voting_deadline: Utc::now() + Duration::days(1),
            election_method: ValidElectionMethod::Schulze,
            belongs_to_household: household_id.clone(),
            created_by_user: user_id.to_string(),
            events: vec![MealPlanEventDatabaseCreationInput {
                notes: String::new(),
                starts_at,
                ends_at: starts_at + Duration::hours(2),
                meal_name: MealName::Dinner,
                belongs_to_meal_plan: String::new(),
                options: vec![MealPlanOptionDatabaseCreationInput {
                    meal_id: meal.id.clone(),
                    notes: String::new(),
                    meal_scale: 1.0,
                    assigned_cook: None,
                    assigned_dishwasher: None,
                    belongs_to_meal_plan_event: String::new(),
                }],
            }],
        })
        .await
        .unwrap();

    let event = &plan.events[0];
    let winner = MealPlanOptionWinner {
        meal_plan_event_id: event.id.clone(),
        meal_plan_option_id: event.options[0].id.clone(),
        tiebroken: false,
    };
    assert!(querier
        .finalize_meal_plan(&household_id, &plan.id, std::slice::from_ref(&winner))
        .await
        .unwrap());

    (household_id, plan)
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_grocery_list_creation_initializes_the_plan() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let onion = create_ingredient(&querier).await;
    let unit = create_measurement_unit(&querier).await;
    let (household_id, plan) = finalized_plan(&querier, &user.id, &recipe).await;

    let pending = querier
        .get_finalized_meal_plans_without_initialized_grocery_lists()
        .await
        .unwrap();
    assert!(pending.iter().any(|pending| pending.id == plan.id));

    let items = querier
        .create_meal_plan_grocery_list_items_for_meal_plan(
            &plan.id,
            &[MealPlanGroceryListItemDatabaseCreationInput {
                belongs_to_meal_plan: unique("ignored"),
                valid_ingredient_id: onion.id.clone(),
                valid_measurement_unit_id: unit.id.clone(),
                quantity_needed: Float32RangeWithOptionalMax::new(2.0, Some(3.0)),
                status: GroceryListItemStatus::Needs,
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].belongs_to_meal_plan, plan.id);

    let fetched = querier
        .get_meal_plan_grocery_list_items_for_meal_plan(&plan.id)
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].ingredient.name, onion.name);
    assert_eq!(fetched[0].measurement_unit.name, unit.name);
    assert_eq!(fetched[0].purchased_measurement_unit, None);
    assert_eq!(fetched[0].status, GroceryListItemStatus::Needs);

    let reloaded = querier.get_meal_plan(&household_id, &plan.id).await.unwrap();
    assert!(reloaded.grocery_list_initialized);
    let pending = querier
        .get_finalized_meal_plans_without_initialized_grocery_lists()
        .await
        .unwrap();
    assert!(pending.iter().all(|pending| pending.id != plan.id));

    let mut item = fetched[0].clone();
    item.quantity_purchased = Some(1.0);
    item.purchased_measurement_unit = Some(unit.clone());
    item.status = GroceryListItemStatus::Acquired;
    querier.update_meal_plan_grocery_list_item(&item).await.unwrap();
    let updated = querier
        .get_meal_plan_grocery_list_item(&plan.id, &item.id)
        .await
        .unwrap();
    assert_eq!(updated.status, GroceryListItemStatus::Acquired);
    assert_eq!(
        updated.purchased_measurement_unit.map(|unit| unit.id),
        Some(unit.id.clone())
    );

    querier
        .archive_meal_plan_grocery_list_item(&plan.id, &item.id)
        .await
        .unwrap();
    assert!(!querier
        .meal_plan_grocery_list_item_exists(&plan.id, &item.id)
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_grocery_list_for_missing_plan_writes_nothing() {
    let querier = querier().await;
    let onion = create_ingredient(&querier).await;
    let unit = create_measurement_unit(&querier).await;

    let err = querier
        .create_meal_plan_grocery_list_items_for_meal_plan(
            &unique("no-such-plan"),
            &[MealPlanGroceryListItemDatabaseCreationInput {
                valid_ingredient_id: onion.id.clone(),
                valid_measurement_unit_id: unit.id.clone(),
                quantity_needed: Float32RangeWithOptionalMax::new(1.0, None),
                ..Default::default()
            }],
        )
        .await
        .unwrap_err();

    // The foreign key on belongs_to_meal_plan trips before the plan flag does.
    assert!(
        err.to_string().contains("creating grocery list item #1"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_meal_plan_tasks_follow_their_status() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let recipe = create_recipe(&querier, &user.id).await;
    let preparation = create_preparation(&querier).await;
    let step = querier
        .create_recipe_step(&RecipeStepDatabaseCreationInput {
            index: 0,
            preparation_id: preparation.id.clone(),
            belongs_to_recipe: recipe.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    let prep_task = querier
        .create_recipe_prep_task(&RecipePrepTaskDatabaseCreationInput {
            name: "soak the beans".to_string(),
            time_buffer_before_recipe_in_seconds: Uint32RangeWithOptionalMax::new(8 * 3600, None),
            belongs_to_recipe: recipe.id.clone(),
            task_steps: vec![RecipePrepTaskStepDatabaseCreationInput {
                belongs_to_recipe_step: step.id.clone(),
                satisfies_recipe_step: true,
            }],
            ..Default::default()
        })
        .await
        .unwrap();
    let fetched_prep = querier
        .get_recipe_prep_task(&recipe.id, &prep_task.id)
        .await
        .unwrap();
    assert_eq!(fetched_prep.task_steps.len(), 1);
    assert_eq!(fetched_prep.task_steps[0].belongs_to_recipe_step, step.id);

    let (household_id, plan) = finalized_plan(&querier, &user.id, &recipe).await;
    let option_id = plan.events[0].options[0].id.clone();

    let tasks = querier
        .create_meal_plan_tasks_for_meal_plan(
            &plan.id,
            &[MealPlanTaskDatabaseCreationInput {
                meal_plan_option_id: option_id.clone(),
                recipe_prep_task_id: prep_task.id.clone(),
                creation_explanation: "beans need a night in water".to_string(),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    assert_eq!(tasks[0].status, MealPlanTaskStatus::Unfinished);
    assert!(querier.get_meal_plan(&household_id, &plan.id).await.unwrap().tasks_created);

    let listed = querier.get_meal_plan_tasks_for_meal_plan(&plan.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].meal_plan_option.id, option_id);
    assert_eq!(listed[0].recipe_prep_task.task_steps.len(), 1);
    assert_eq!(
        querier.get_incomplete_meal_plan_tasks_for_option(&option_id).await.unwrap().len(),
        1
    );

    querier
        .change_meal_plan_task_status(&MealPlanTaskStatusChangeRequestInput {
            id: tasks[0].id.clone(),
            status: MealPlanTaskStatus::Finished,
            status_explanation: "soaked".to_string(),
        })
        .await
        .unwrap();

    let finished = querier.get_meal_plan_task(&plan.id, &tasks[0].id).await.unwrap();
    assert_eq!(finished.status, MealPlanTaskStatus::Finished);
    assert!(finished.completed_at.is_some());
    assert!(querier
        .get_incomplete_meal_plan_tasks_for_option(&option_id)
        .await
        .unwrap()
        .is_empty());

    let err = querier
        .change_meal_plan_task_status(&MealPlanTaskStatusChangeRequestInput {
            id: unique("no-such-task"),
            status: MealPlanTaskStatus::Canceled,
            status_explanation: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
