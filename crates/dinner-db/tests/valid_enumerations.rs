//! Valid enumeration updates and the search reindex pair against PostgreSQL.
//!
//! Run with `cargo test -p dinner-db -- --ignored` and `DATABASE_URL` set.

mod common;

use dinner_core::ValidInstrumentDatabaseCreationInput;
use dinner_db::ErrorKind;

use common::{create_ingredient, querier, unique};

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_update_round_trips_every_field() {
    let querier = querier().await;
    let created = create_ingredient(&querier).await;

    let fetched = querier.get_valid_ingredient(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, created.name);
    assert!(fetched.last_updated_at.is_none());

    let mut changed = fetched.clone();
    changed.description = "sharp and sweet once cooked".to_string();
    changed.warning = "cut on a dry board".to_string();
    changed.contains_egg = true;
    changed.is_liquid = Some(false);
    changed.is_acid = true;
    querier.update_valid_ingredient(&changed).await.unwrap();

    let refetched = querier.get_valid_ingredient(&created.id).await.unwrap();
    assert!(refetched.last_updated_at.is_some());
    assert_eq!(refetched.created_at, fetched.created_at);

    changed.last_updated_at = refetched.last_updated_at;
    assert_eq!(refetched, changed);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_fresh_rows_need_indexing_until_marked() {
    let querier = querier().await;
    let ingredient = create_ingredient(&querier).await;

    let candidates = querier.get_valid_ingredient_ids_needing_indexing().await.unwrap();
    assert!(candidates.contains(&ingredient.id));

    querier
        .update_valid_ingredient_last_indexed_at(&ingredient.id)
        .await
        .unwrap();

    let candidates = querier.get_valid_ingredient_ids_needing_indexing().await.unwrap();
    assert!(!candidates.contains(&ingredient.id));
    let fetched = querier.get_valid_ingredient(&ingredient.id).await.unwrap();
    assert!(fetched.last_indexed_at.is_some());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_archived_rows_are_never_reindexed() {
    let querier = querier().await;
    let name = unique("instrument");
    let instrument = querier
        .create_valid_instrument(&ValidInstrumentDatabaseCreationInput {
            plural_name: format!("{name}s"),
            slug: name.clone(),
            name,
            ..Default::default()
        })
        .await
        .unwrap();

    let candidates = querier.get_valid_instrument_ids_needing_indexing().await.unwrap();
    assert!(candidates.contains(&instrument.id));

    querier.archive_valid_instrument(&instrument.id).await.unwrap();
    let candidates = querier.get_valid_instrument_ids_needing_indexing().await.unwrap();
    assert!(!candidates.contains(&instrument.id));

    let err = querier.get_valid_instrument(&instrument.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
