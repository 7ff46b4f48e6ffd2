//! A small demo binary: loads a JSON seed file describing component types
//! and components, adds them to an in-process [`InMemoryGateway`], and
//! prints the named component's snapshot.

use std::{fs, path::PathBuf};

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Result, ResultExt};
use graph_gateway::{memory::InMemoryGateway, AbortToken};
use layout_graph::{
    cache::Cache,
    entities::{Component, ComponentType},
    logging::init_logging,
};
use serde::Deserialize;
use temporal_versioning::Timestamp;
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Inspect a time-versioned instrument configuration graph")]
struct Args {
    /// Path to a JSON seed file (see `demos/seed.json`).
    #[arg(long, env = "LAYOUT_GRAPH_SEED")]
    seed: PathBuf,

    /// Name of the component to print a snapshot of.
    #[arg(long, env = "LAYOUT_GRAPH_COMPONENT")]
    component: String,
}

#[derive(Debug, Deserialize)]
struct Seed {
    component_types: Vec<SeedComponentType>,
    components: Vec<SeedComponent>,
}

#[derive(Debug, Deserialize)]
struct SeedComponentType {
    name: String,
    #[serde(default)]
    comments: String,
}

#[derive(Debug, Deserialize)]
struct SeedComponent {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Display, Error)]
enum CliError {
    #[display("could not read seed file")]
    ReadSeed,
    #[display("seed file is not valid JSON")]
    ParseSeed,
    #[display("the demo graph rejected a seed operation")]
    Seeding,
}

fn main() -> Result<(), CliError> {
    init_logging();
    run(&Args::parse())
}

fn run(args: &Args) -> Result<(), CliError> {
    let gateway = InMemoryGateway::new();
    let cache = Cache::new();
    let abort = AbortToken::new();

    let raw = fs::read_to_string(&args.seed).change_context(CliError::ReadSeed)?;
    let seed: Seed = serde_json::from_str(&raw).change_context(CliError::ParseSeed)?;

    for seed_type in seed.component_types {
        let component_type = ComponentType::new(seed_type.name, seed_type.comments);
        component_type.add(&cache, &gateway, &abort).change_context(CliError::Seeding)?;
        info!(name = %component_type.name(), "seeded component type");
    }

    for seed_component in seed.components {
        let Some(component_type) = ComponentType::from_name(&cache, &gateway, &seed_component.type_name, &abort).change_context(CliError::Seeding)?
        else {
            continue;
        };
        let component = Component::new(seed_component.name, component_type, None);
        component.add(&cache, &gateway, &abort).change_context(CliError::Seeding)?;
        info!(name = %component.name(), "seeded component");
    }

    let component = Component::from_name(&cache, &gateway, &args.component, &abort).change_context(CliError::Seeding)?;
    let Some(component) = component else {
        println!("no such component: {}", args.component);
        return Ok(());
    };

    let snapshot = component.as_dict(Some(Timestamp::now()), &cache, &gateway, &abort).change_context(CliError::Seeding)?;
    println!("{snapshot:#?}");
    Ok(())
}
