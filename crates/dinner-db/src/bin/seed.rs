//! # Seed Data Generator
//!
//! Populates the valid-enumeration tables with a small kitchen vocabulary
//! for local development.
//!
//! ## Usage
//! ```bash
//! # Connect with DINNER_DONE_BETTER_DATABASE_* variables
//! cargo run -p dinner-db --bin seed
//!
//! # Or read a TOML config first
//! cargo run -p dinner-db --bin seed -- --config ./config/database.toml
//! ```
//!
//! ## Seeded Records
//! - Instruments, measurement units, preparations and ingredients
//! - One ingredient group (alliums)
//! - Preparation ↔ ingredient and preparation ↔ instrument pairings
//!
//! Seeding is skipped when any valid instrument already exists.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use dinner_core::{
    OptionalFloat32Range, Uint16RangeWithOptionalMax, ValidIngredientDatabaseCreationInput,
    ValidIngredientGroupDatabaseCreationInput, ValidIngredientPreparationDatabaseCreationInput,
    ValidInstrumentDatabaseCreationInput, ValidMeasurementUnitDatabaseCreationInput,
    ValidPreparationDatabaseCreationInput, ValidPreparationInstrumentDatabaseCreationInput,
};
use dinner_db::{DatabaseConfig, Querier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, plural name)
const INSTRUMENTS: &[(&str, &str)] = &[
    ("chef's knife", "chef's knives"),
    ("cutting board", "cutting boards"),
    ("whisk", "whisks"),
    ("skillet", "skillets"),
    ("oven", "ovens"),
    ("wooden spoon", "wooden spoons"),
];

/// (name, plural name, metric, imperial, volumetric)
const MEASUREMENT_UNITS: &[(&str, &str, bool, bool, bool)] = &[
    ("gram", "grams", true, false, false),
    ("milliliter", "milliliters", true, false, true),
    ("cup", "cups", false, true, true),
    ("tablespoon", "tablespoons", false, true, true),
    ("teaspoon", "teaspoons", false, true, true),
    ("unit", "units", false, false, false),
];

/// (name, past tense, minimum ingredients, minimum instruments)
const PREPARATIONS: &[(&str, &str, u16, u16)] = &[
    ("chop", "chopped", 1, 1),
    ("mince", "minced", 1, 1),
    ("whisk", "whisked", 1, 1),
    ("saute", "sauteed", 1, 1),
    ("bake", "baked", 1, 1),
    ("boil", "boiled", 1, 0),
];

/// (name, plural name, contains dairy, contains egg, contains wheat, liquid)
const INGREDIENTS: &[(&str, &str, bool, bool, bool, bool)] = &[
    ("onion", "onions", false, false, false, false),
    ("garlic", "garlic", false, false, false, false),
    ("shallot", "shallots", false, false, false, false),
    ("leek", "leeks", false, false, false, false),
    ("egg", "eggs", false, true, false, false),
    ("butter", "butter", true, false, false, false),
    ("milk", "milk", true, false, false, true),
    ("all-purpose flour", "all-purpose flour", false, false, true, false),
    ("olive oil", "olive oil", false, false, false, true),
    ("salt", "salt", false, false, false, false),
];

const ALLIUMS: &[&str] = &["onion", "garlic", "shallot", "leek"];

/// (preparation, ingredient)
const INGREDIENT_PREPARATIONS: &[(&str, &str)] = &[
    ("chop", "onion"),
    ("chop", "shallot"),
    ("chop", "leek"),
    ("mince", "garlic"),
    ("mince", "shallot"),
    ("whisk", "egg"),
    ("whisk", "milk"),
    ("saute", "onion"),
    ("saute", "garlic"),
];

/// (preparation, instrument)
const PREPARATION_INSTRUMENTS: &[(&str, &str)] = &[
    ("chop", "chef's knife"),
    ("chop", "cutting board"),
    ("mince", "chef's knife"),
    ("whisk", "whisk"),
    ("saute", "skillet"),
    ("saute", "wooden spoon"),
    ("bake", "oven"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dinner Done Better Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  TOML database config (environment overrides still apply)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = DatabaseConfig::load(config_path.as_deref())?.run_migrations(true);
    let querier = Querier::provide(config).await?;
    info!("Connected and migrated");

    let existing = querier.get_valid_instruments(None).await?;
    if existing.total_count() > 0 {
        warn!(
            instruments = existing.total_count(),
            "Valid instruments already present, skipping seed"
        );
        querier.close().await;
        return Ok(());
    }

    let mut instruments = HashMap::new();
    for (name, plural_name) in INSTRUMENTS {
        let instrument = querier
            .create_valid_instrument(&ValidInstrumentDatabaseCreationInput {
                name: name.to_string(),
                plural_name: plural_name.to_string(),
                slug: slug(name),
                display_in_summary_lists: true,
                include_in_generated_instructions: true,
                ..Default::default()
            })
            .await?;
        instruments.insert(*name, instrument.id);
    }
    info!(count = instruments.len(), "Seeded valid instruments");

    for (name, plural_name, metric, imperial, volumetric) in MEASUREMENT_UNITS {
        querier
            .create_valid_measurement_unit(&ValidMeasurementUnitDatabaseCreationInput {
                name: name.to_string(),
                plural_name: plural_name.to_string(),
                slug: slug(name),
                metric: *metric,
                imperial: *imperial,
                volumetric: *volumetric,
                universal: !metric && !imperial,
                ..Default::default()
            })
            .await?;
    }
    info!(count = MEASUREMENT_UNITS.len(), "Seeded valid measurement units");

    let mut preparations = HashMap::new();
    for (name, past_tense, min_ingredients, min_instruments) in PREPARATIONS {
        let preparation = querier
            .create_valid_preparation(&ValidPreparationDatabaseCreationInput {
                name: name.to_string(),
                past_tense: past_tense.to_string(),
                slug: slug(name),
                ingredient_count: Uint16RangeWithOptionalMax::new(*min_ingredients, None),
                instrument_count: Uint16RangeWithOptionalMax::new(*min_instruments, None),
                vessel_count: Uint16RangeWithOptionalMax::new(0, None),
                ..Default::default()
            })
            .await?;
        preparations.insert(*name, preparation.id);
    }
    info!(count = preparations.len(), "Seeded valid preparations");

    let mut ingredients = HashMap::new();
    for (name, plural_name, dairy, egg, wheat, liquid) in INGREDIENTS {
        let ingredient = querier
            .create_valid_ingredient(&ValidIngredientDatabaseCreationInput {
                name: name.to_string(),
                plural_name: plural_name.to_string(),
                slug: slug(name),
                contains_dairy: *dairy,
                contains_egg: *egg,
                contains_wheat: *wheat,
                contains_gluten: *wheat,
                animal_derived: *dairy || *egg,
                volumetric: *liquid,
                is_liquid: Some(*liquid),
                storage_temperature_in_celsius: OptionalFloat32Range::default(),
                ..Default::default()
            })
            .await?;
        ingredients.insert(*name, ingredient.id);
    }
    info!(count = ingredients.len(), "Seeded valid ingredients");

    let group = querier
        .create_valid_ingredient_group(&ValidIngredientGroupDatabaseCreationInput {
            name: "alliums".to_string(),
            description: "Onions and their relatives".to_string(),
            slug: "alliums".to_string(),
            members: lookup_all(&ingredients, ALLIUMS)?,
        })
        .await?;
    info!(id = %group.id, members = group.members.len(), "Seeded valid ingredient group");

    for (preparation, ingredient) in INGREDIENT_PREPARATIONS {
        querier
            .create_valid_ingredient_preparation(&ValidIngredientPreparationDatabaseCreationInput {
                notes: String::new(),
                valid_preparation_id: lookup(&preparations, preparation)?,
                valid_ingredient_id: lookup(&ingredients, ingredient)?,
            })
            .await?;
    }

    for (preparation, instrument) in PREPARATION_INSTRUMENTS {
        querier
            .create_valid_preparation_instrument(&ValidPreparationInstrumentDatabaseCreationInput {
                notes: String::new(),
                valid_preparation_id: lookup(&preparations, preparation)?,
                valid_instrument_id: lookup(&instruments, instrument)?,
            })
            .await?;
    }
    info!(
        ingredient_preparations = INGREDIENT_PREPARATIONS.len(),
        preparation_instruments = PREPARATION_INSTRUMENTS.len(),
        "Seeded valid pairings"
    );

    let found = querier.search_for_valid_ingredients("oni").await?;
    info!(results = found.len(), "Search 'oni'");

    querier.close().await;
    info!("Seed complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info with debug for this crate.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,dinner_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn slug(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            ' ' | '-' => Some('_'),
            _ => None,
        })
        .collect()
}

fn lookup(ids: &HashMap<&str, String>, name: &str) -> Result<String, String> {
    ids.get(name).cloned().ok_or_else(|| format!("no seeded record named {name}"))
}

fn lookup_all(ids: &HashMap<&str, String>, names: &[&str]) -> Result<Vec<String>, String> {
    names.iter().map(|name| lookup(ids, name)).collect()
}
