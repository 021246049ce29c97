// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands everything else to Layer 2 (application).
//
//   1. `geocode` — annotated text → geocoded map features
//   2. `groups`  — annotated text → location groups only

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GeocodeArgs, GroupsArgs};

#[derive(Parser, Debug)]
#[command(
    name = "text2map",
    version = "0.1.0",
    about = "Turn entity-annotated text into geocoded points and region polygons."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the use case; never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Geocode(args) => run_geocode(args),
            Commands::Groups(args)  => run_groups(args),
        }
    }
}

fn run_geocode(args: GeocodeArgs) -> Result<()> {
    use crate::application::geocode_use_case::GeocodeUseCase;

    let use_case = GeocodeUseCase::new(args.into())?;
    let report   = use_case.execute()?;

    println!(
        "{} records → {} location groups ({} without entities, {} over the cap), {} geocoded",
        report.records, report.groups, report.empty_key_records, report.truncated_groups, report.geocoded
    );
    println!("Total locations processed: {}", report.locations);
    println!("  region polygons: {}", report.polygons);
    println!(
        "  unresolved:      {} not found, {} timed out, {} failed",
        report.not_found, report.timed_out, report.failed
    );
    println!("  GeoJSON:         {}", report.geojson.display());
    if let Some(legacy) = &report.shapefile {
        println!("  Shapefile:       {}", legacy.points.display());
        if let Some(regions) = &legacy.regions {
            println!("  Shapefile:       {}", regions.display());
        }
    }
    println!("  CSV:             {}", report.csv.display());
    Ok(())
}

fn run_groups(args: GroupsArgs) -> Result<()> {
    use crate::application::groups_use_case::GroupsUseCase;

    let grouped = GroupsUseCase::new(args.into()).execute()?;

    for g in &grouped.groups {
        println!("{:>6}  {}", g.count, g.key.address());
    }
    println!(
        "{} groups from {} records ({} without entities, {} over the cap)",
        grouped.groups.len(),
        grouped.total_records,
        grouped.empty_key_records,
        grouped.truncated_groups
    );
    Ok(())
}
