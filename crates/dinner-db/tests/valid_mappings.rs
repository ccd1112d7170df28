//! Ingredient states and measurement unit conversions against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use dinner_core::{
    IngredientAttributeType, ValidIngredientStateDatabaseCreationInput,
    ValidIngredientStateIngredientDatabaseCreationInput, ValidMeasurementUnitConversionDatabaseCreationInput,
};
use dinner_db::ErrorKind;

use common::{create_ingredient, create_measurement_unit, querier, unique};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_conversions_list_from_and_to_their_units() {
    let querier = querier().await;
    let cup = create_measurement_unit(&querier).await;
    let millilitre = create_measurement_unit(&querier).await;
    let flour = create_ingredient(&querier).await;

    let general = querier
        .create_valid_measurement_unit_conversion(&ValidMeasurementUnitConversionDatabaseCreationInput {
            from: cup.id.clone(),
            to: millilitre.id.clone(),
            only_for_ingredient: None,
            modifier: 236.6,
            notes: String::new(),
        })
        .await
        .unwrap();
    let for_flour = querier
        .create_valid_measurement_unit_conversion(&ValidMeasurementUnitConversionDatabaseCreationInput {
            from: cup.id.clone(),
            to: millilitre.id.clone(),
            only_for_ingredient: Some(flour.id.clone()),
            modifier: 240.0,
            notes: "sifted".to_string(),
        })
        .await
        .unwrap();

    let fetched = querier
        .get_valid_measurement_unit_conversion(&for_flour.id)
        .await
        .unwrap();
    assert_eq!(fetched.from.name, cup.name);
    assert_eq!(fetched.to.name, millilitre.name);
    assert_eq!(fetched.only_for_ingredient.map(|i| i.id), Some(flour.id.clone()));

    let from_cup: Vec<_> = querier
        .get_valid_measurement_unit_conversions_from_unit(&cup.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(from_cup.len(), 2);
    assert!(from_cup.contains(&general.id) && from_cup.contains(&for_flour.id));
    assert!(querier
        .get_valid_measurement_unit_conversions_to_unit(&cup.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        querier
            .get_valid_measurement_unit_conversions_to_unit(&millilitre.id)
            .await
            .unwrap()
            .len(),
        2
    );

    querier
        .archive_valid_measurement_unit_conversion(&general.id)
        .await
        .unwrap();
    assert!(!querier
        .valid_measurement_unit_conversion_exists(&general.id)
        .await
        .unwrap());
    assert_eq!(
        querier
            .get_valid_measurement_unit_conversions_from_unit(&cup.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_conversion_to_the_same_unit_is_rejected() {
    let querier = querier().await;
    let cup = create_measurement_unit(&querier).await;

    let err = querier
        .create_valid_measurement_unit_conversion(&ValidMeasurementUnitConversionDatabaseCreationInput {
            from: cup.id.clone(),
            to: cup.id.clone(),
            only_for_ingredient: None,
            modifier: 1.0,
            notes: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_ingredient_states_link_to_ingredients() {
    let querier = querier().await;
    let onion = create_ingredient(&querier).await;
    let name = unique("caramelized");
    let state = querier
        .create_valid_ingredient_state(&ValidIngredientStateDatabaseCreationInput {
            past_tense: format!("{name}d"),
            slug: name.clone(),
            name: name.clone(),
            attribute_type: IngredientAttributeType::Color,
            ..Default::default()
        })
        .await
        .unwrap();

    let found = querier.search_for_valid_ingredient_states(&name).await.unwrap();
    assert!(found.iter().any(|found| found.id == state.id));

    let link = querier
        .create_valid_ingredient_state_ingredient(&ValidIngredientStateIngredientDatabaseCreationInput {
            notes: "low and slow".to_string(),
            valid_ingredient_state_id: state.id.clone(),
            valid_ingredient_id: onion.id.clone(),
        })
        .await
        .unwrap();

    let fetched = querier
        .get_valid_ingredient_state_ingredient(&link.id)
        .await
        .unwrap();
    assert_eq!(fetched.ingredient_state.attribute_type, IngredientAttributeType::Color);
    assert_eq!(fetched.ingredient.name, onion.name);

    let for_state = querier
        .get_valid_ingredient_state_ingredients_for_ingredient_state(&state.id, None)
        .await
        .unwrap();
    assert_eq!(for_state.total_count(), 1);
    let for_onion = querier
        .get_valid_ingredient_state_ingredients_for_ingredient(&onion.id, None)
        .await
        .unwrap();
    assert_eq!(for_onion.data.len(), 1);
    assert_eq!(for_onion.data[0].id, link.id);

    querier
        .archive_valid_ingredient_state_ingredient(&link.id)
        .await
        .unwrap();
    assert!(!querier
        .valid_ingredient_state_ingredient_exists(&link.id)
        .await
        .unwrap());
}
