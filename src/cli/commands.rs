// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `geocode` and `groups`, and all
// their configurable flags.
//
// Defaults come from the application layer so the CLI and a
// programmatic PipelineConfig::default() never disagree.

use clap::{Args, Subcommand};

use crate::application::{
    geocode_use_case::PipelineConfig,
    groups_use_case::GroupsConfig,
};
use crate::data::aggregator::DEFAULT_MAX_ROWS;
use crate::spatial::geocoding::DEFAULT_LOOKUP_TIMEOUT;
use crate::infra::{
    boundary_store::DEFAULT_BOUNDARY_PATH,
    nominatim::{DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve annotated text to map features and export them
    Geocode(GeocodeArgs),

    /// Show how records group by location, without geocoding
    Groups(GroupsArgs),
}

/// All arguments for the `geocode` command.
#[derive(Args, Debug)]
pub struct GeocodeArgs {
    /// JSON Lines file of annotated records ({"text": ..., "label": [[start, end, type], ...]})
    #[arg(long)]
    pub input: String,

    /// Administrative boundary dataset (.shp, .geojson or .json)
    #[arg(long, default_value = DEFAULT_BOUNDARY_PATH)]
    pub boundaries: String,

    /// Keep only locations inside these regions (repeatable or comma-separated)
    #[arg(long = "regions", value_delimiter = ',')]
    pub target_regions: Vec<String>,

    /// Cap on location groups sent to the geocoder; 0 disables the cap
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    #[arg(long, default_value = "data/processed")]
    pub output_dir: String,

    #[arg(long, default_value = "geometry.geojson")]
    pub geojson_name: String,

    /// Defaults to the GeoJSON name with a .shp extension
    #[arg(long)]
    pub shapefile_name: Option<String>,

    /// Do not write the legacy Shapefile
    #[arg(long)]
    pub skip_shapefile: bool,

    /// Nominatim-compatible search endpoint
    #[arg(long, default_value = DEFAULT_NOMINATIM_URL)]
    pub geocoder_url: String,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-lookup timeout in seconds
    #[arg(long, default_value_t = DEFAULT_LOOKUP_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

/// Boundary between Layer 1 and Layer 2: the application
/// layer never sees clap types.
impl From<GeocodeArgs> for PipelineConfig {
    fn from(a: GeocodeArgs) -> Self {
        PipelineConfig {
            input:          a.input,
            boundaries:     a.boundaries,
            target_regions: a.target_regions,
            max_rows:       a.max_rows,
            output_dir:     a.output_dir,
            geojson_name:   a.geojson_name,
            shapefile_name: a.shapefile_name,
            skip_shapefile: a.skip_shapefile,
            geocoder_url:   a.geocoder_url,
            user_agent:     a.user_agent,
            timeout_secs:   a.timeout_secs,
        }
    }
}

/// All arguments for the `groups` command
#[derive(Args, Debug)]
pub struct GroupsArgs {
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Write the groups as CSV instead of only printing them
    #[arg(long)]
    pub output: Option<String>,
}

impl From<GroupsArgs> for GroupsConfig {
    fn from(a: GroupsArgs) -> Self {
        GroupsConfig {
            input:    a.input,
            max_rows: a.max_rows,
            output:   a.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_geocode_defaults_match_config() {
        let cli = Cli::try_parse_from(["text2map", "geocode", "--input", "tweets.jsonl"]).unwrap();
        let Commands::Geocode(args) = cli.command else {
            panic!("expected geocode");
        };
        let config: PipelineConfig = args.into();
        let defaults = PipelineConfig::default();

        assert_eq!(config.input, "tweets.jsonl");
        assert_eq!(config.boundaries, defaults.boundaries);
        assert_eq!(config.max_rows, defaults.max_rows);
        assert_eq!(config.output_dir, defaults.output_dir);
        assert_eq!(config.geojson_name, defaults.geojson_name);
        assert_eq!(config.timeout_secs, defaults.timeout_secs);
        assert!(config.target_regions.is_empty());
        assert!(!config.skip_shapefile);
    }

    #[test]
    fn test_regions_accept_commas_and_repeats() {
        let cli = Cli::try_parse_from([
            "text2map", "geocode", "--input", "x.jsonl",
            "--regions", "Florida,Georgia", "--regions", "Alabama",
        ])
        .unwrap();
        let Commands::Geocode(args) = cli.command else {
            panic!("expected geocode");
        };
        assert_eq!(args.target_regions, vec!["Florida", "Georgia", "Alabama"]);
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["text2map", "groups"]).is_err());
    }
}
