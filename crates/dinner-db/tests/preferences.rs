//! Ingredient preference lifecycle and group expansion against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use dinner_core::{
    QueryFilter, UserIngredientPreferenceDatabaseCreationInput, ValidIngredientGroupDatabaseCreationInput,
};
use dinner_db::{ErrorKind, IdGenerator, SequentialIdGenerator};

use common::{create_ingredient, create_user, querier, unique, with_ids};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_create_get_archive_ingredient_preference() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let ingredient = create_ingredient(&querier).await;

    let created = querier
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_id: ingredient.id.clone(),
            rating: 3,
            notes: "n".to_string(),
            allergy: false,
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    let preference = &created[0];
    assert_eq!(preference.ingredient.id, ingredient.id);
    assert!(preference.ingredient.name.is_empty());

    let fetched = querier
        .get_user_ingredient_preference(&user.id, &preference.id)
        .await
        .unwrap();
    assert_eq!(fetched.id, preference.id);
    assert_eq!(fetched.rating, 3);
    assert_eq!(fetched.notes, "n");
    assert!(!fetched.allergy);
    assert_eq!(fetched.belongs_to_user, user.id);
    assert_eq!(fetched.ingredient.name, ingredient.name);

    let mut changed = fetched.clone();
    changed.rating = -2;
    changed.notes = "changed my mind".to_string();
    querier.update_user_ingredient_preference(&changed).await.unwrap();
    let refetched = querier
        .get_user_ingredient_preference(&user.id, &preference.id)
        .await
        .unwrap();
    assert_eq!(refetched.rating, -2);
    assert_eq!(refetched.notes, "changed my mind");
    assert!(refetched.last_updated_at.is_some());

    querier
        .archive_user_ingredient_preference(&user.id, &preference.id)
        .await
        .unwrap();
    assert!(!querier
        .user_ingredient_preference_exists(&user.id, &preference.id)
        .await
        .unwrap());
    let err = querier
        .get_user_ingredient_preference(&user.id, &preference.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_group_expansion_creates_one_preference_per_member() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let members = vec![
        create_ingredient(&querier).await.id,
        create_ingredient(&querier).await.id,
        create_ingredient(&querier).await.id,
    ];
    let name = unique("group");
    let group = querier
        .create_valid_ingredient_group(&ValidIngredientGroupDatabaseCreationInput {
            slug: name.clone(),
            name,
            description: String::new(),
            members: members.clone(),
        })
        .await
        .unwrap();

    let created = querier
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_group_id: Some(group.id.clone()),
            rating: 5,
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.len(), 3);
    let targeted: HashSet<String> = created.iter().map(|p| p.ingredient.id.clone()).collect();
    assert_eq!(targeted, members.iter().cloned().collect());

    let listed = querier
        .get_user_ingredient_preferences(&user.id, None)
        .await
        .unwrap();
    let listed_ids: HashSet<String> = listed.data.iter().map(|p| p.ingredient.id.clone()).collect();
    assert!(listed.data.len() >= 3);
    assert!(members.iter().all(|id| listed_ids.contains(id)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_group_expansion_rolls_back_on_failed_insert() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let ingredient = create_ingredient(&querier).await;
    let name = unique("group");
    let group = querier
        .create_valid_ingredient_group(&ValidIngredientGroupDatabaseCreationInput {
            slug: name.clone(),
            name,
            description: String::new(),
            members: vec![
                create_ingredient(&querier).await.id,
                create_ingredient(&querier).await.id,
            ],
        })
        .await
        .unwrap();

    // Occupy "{prefix}-2" so the second insert of the group collides.
    let prefix = unique("pref");
    let occupying_ids = Arc::new(SequentialIdGenerator::new(prefix.clone()));
    occupying_ids.new_id();
    let occupied = with_ids(&querier, occupying_ids)
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_id: ingredient.id.clone(),
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(occupied[0].id, format!("{prefix}-2"));

    let colliding = with_ids(&querier, Arc::new(SequentialIdGenerator::new(prefix.clone())));
    let err = colliding
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_group_id: Some(group.id.clone()),
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniqueViolation);
    assert!(err.to_string().contains("creating user ingredient preference #2"));

    assert!(!querier
        .user_ingredient_preference_exists(&user.id, &format!("{prefix}-1"))
        .await
        .unwrap());
    let listed = querier
        .get_user_ingredient_preferences(&user.id, Some(&QueryFilter::page(1, 50)))
        .await
        .unwrap();
    assert_eq!(listed.data.len(), 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_unknown_group_is_not_found() {
    let querier = querier().await;
    let user = create_user(&querier).await;

    let err = querier
        .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
            valid_ingredient_group_id: Some(unique("missing")),
            belongs_to_user: user.id.clone(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_update_windows_apply_to_updated_preferences() {
    let querier = querier().await;
    let user = create_user(&querier).await;
    let mut ids = Vec::new();
    for _ in 0..2 {
        let ingredient = create_ingredient(&querier).await;
        let created = querier
            .create_user_ingredient_preference(&UserIngredientPreferenceDatabaseCreationInput {
                valid_ingredient_id: ingredient.id.clone(),
                rating: 1,
                belongs_to_user: user.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(created[0].id.clone());
    }

    let mut updated = querier
        .get_user_ingredient_preference(&user.id, &ids[1])
        .await
        .unwrap();
    updated.rating = 4;
    querier.update_user_ingredient_preference(&updated).await.unwrap();

    let listed_ids = |result: dinner_core::QueryFilteredResult<dinner_core::UserIngredientPreference>| {
        result.data.into_iter().map(|p| p.id).collect::<HashSet<_>>()
    };

    let future = QueryFilter {
        updated_after: Some(Utc::now() + Duration::days(1)),
        ..Default::default()
    };
    let listed = listed_ids(
        querier
            .get_user_ingredient_preferences(&user.id, Some(&future))
            .await
            .unwrap(),
    );
    assert!(listed.contains(&ids[0]));
    assert!(!listed.contains(&ids[1]));

    let past = QueryFilter {
        updated_after: Some(Utc::now() - Duration::days(1)),
        ..Default::default()
    };
    let listed = listed_ids(
        querier
            .get_user_ingredient_preferences(&user.id, Some(&past))
            .await
            .unwrap(),
    );
    assert!(listed.contains(&ids[0]));
    assert!(listed.contains(&ids[1]));
}
