//! Meal plan voting and finalization against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use chrono::{Duration, Utc};
use dinner_core::{
    ComponentType, Float32RangeWithOptionalMax, MealComponentDatabaseCreationInput, MealDatabaseCreationInput,
    MealName, MealPlanDatabaseCreationInput, MealPlanEventDatabaseCreationInput,
    MealPlanOptionDatabaseCreationInput, MealPlanOptionVoteCreationInput, MealPlanOptionVotesDatabaseCreationInput,
    MealPlanOptionWinner, MealPlanStatus, ValidElectionMethod,
};
use dinner_db::ErrorKind;

use common::{create_recipe, create_user, querier, unique};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_vote_and_finalize_meal_plan() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let household_id = querier.get_default_household_id_for_user(&user.id).await.unwrap();
    let recipe = create_recipe(&querier, &user.id).await;

    let mut meal_ids = Vec::new();
    for _ in 0..2 {
        let meal = querier
            .create_meal(&MealDatabaseCreationInput {
                name: unique("meal"),
                description: String::new(),
                estimated_portions: Float32RangeWithOptionalMax::new(4.0, None),
                eligible_for_meal_plans: true,
                created_by_user: user.id.clone(),
                components: vec![MealComponentDatabaseCreationInput {
                    recipe_id: recipe.id.clone(),
                    recipe_scale: 1.0,
                    component_type: ComponentType::Main,
                }],
            })
            .await
            .unwrap();
        meal_ids.push(meal.id);
    }

    let starts_at = Utc::now() + Duration::days(2);
    let plan = querier
        .create_meal_plan(&MealPlanDatabaseCreationInput {
            notes: "next week".to_string(),
            voting_deadline: Utc::now() + Duration::days(1),
            election_method: ValidElectionMethod::Schulze,
            belongs_to_household: household_id.clone(),
            created_by_user: user.id.clone(),
            events: vec![MealPlanEventDatabaseCreationInput {
                notes: String::new(),
                starts_at,
                ends_at: starts_at + Duration::hours(2),
                meal_name: MealName::Dinner,
                belongs_to_meal_plan: String::new(),
                options: meal_ids
                    .iter()
                    .map(|meal_id| MealPlanOptionDatabaseCreationInput {
                        meal_id: meal_id.clone(),
                        notes: String::new(),
                        meal_scale: 1.0,
                        assigned_cook: None,
                        assigned_dishwasher: None,
                        belongs_to_meal_plan_event: String::new(),
                    })
                    .collect(),
            }],
        })
        .await
        .unwrap();
    assert_eq!(plan.status, MealPlanStatus::AwaitingVotes);
    let event = &plan.events[0];
    assert_eq!(event.options.len(), 2);

    let votes = querier
        .create_meal_plan_option_votes(&MealPlanOptionVotesDatabaseCreationInput {
            by_user: user.id.clone(),
            votes: event
                .options
                .iter()
                .enumerate()
                .map(|(rank, option)| MealPlanOptionVoteCreationInput {
                    rank: rank as u8,
                    abstain: false,
                    notes: String::new(),
                    belongs_to_meal_plan_option: option.id.clone(),
                })
                .collect(),
        })
        .await
        .unwrap();
    assert_eq!(votes.len(), 2);

    let fetched = querier.get_meal_plan(&household_id, &plan.id).await.unwrap();
    assert_eq!(fetched.events.len(), 1);
    assert_eq!(fetched.votes_by(&user.id).count(), 2);

    let winner = MealPlanOptionWinner {
        meal_plan_event_id: event.id.clone(),
        meal_plan_option_id: event.options[0].id.clone(),
        tiebroken: false,
    };
    assert!(querier
        .finalize_meal_plan(&household_id, &plan.id, std::slice::from_ref(&winner))
        .await
        .unwrap());
    assert!(!querier
        .finalize_meal_plan(&household_id, &plan.id, std::slice::from_ref(&winner))
        .await
        .unwrap());

    let finalized = querier.get_meal_plan(&household_id, &plan.id).await.unwrap();
    assert_eq!(finalized.status, MealPlanStatus::Finalized);
    let chosen: Vec<_> = finalized.events[0]
        .options
        .iter()
        .filter(|option| option.chosen)
        .map(|option| option.id.clone())
        .collect();
    assert_eq!(chosen, vec![event.options[0].id.clone()]);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_meal_plan_children_require_their_parent() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let household_id = querier.get_default_household_id_for_user(&user.id).await.unwrap();

    let mut plans = Vec::new();
    for _ in 0..2 {
        let starts_at = Utc::now() + Duration::days(3);
        let plan = querier
            .create_meal_plan(&MealPlanDatabaseCreationInput {
                notes: String::new(),
                voting_deadline: Utc::now() + Duration::days(1),
                election_method: ValidElectionMethod::InstantRunoff,
                belongs_to_household: household_id.clone(),
                created_by_user: user.id.clone(),
                events: vec![MealPlanEventDatabaseCreationInput {
                    notes: String::new(),
                    starts_at,
                    ends_at: starts_at + Duration::hours(1),
                    meal_name: MealName::Lunch,
                    belongs_to_meal_plan: String::new(),
                    options: Vec::new(),
                }],
            })
            .await
            .unwrap();
        plans.push(plan);
    }

    let event_id = &plans[0].events[0].id;
    assert!(querier.meal_plan_event_exists(&plans[0].id, event_id).await.unwrap());
    assert!(!querier.meal_plan_event_exists(&plans[1].id, event_id).await.unwrap());
    let err = querier
        .get_meal_plan_event(&plans[1].id, event_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = querier
        .create_meal_plan_option_votes(&MealPlanOptionVotesDatabaseCreationInput {
            by_user: user.id.clone(),
            votes: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NilInput);
}
