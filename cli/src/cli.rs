use std::path::PathBuf;

use catchmap::CatchmentId;

/// Catchment scenario explorer (JSON on stdout)
#[derive(clap::Parser, Debug)]
#[command(name = "catchmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// List queryable attribute names
    Columns(StoreArgs),

    /// List configured scenarios
    Scenarios(StoreArgs),

    /// Precomputed domain range of an attribute
    Domain(DomainArgs),

    /// Summary statistics of an attribute in one scenario
    Stats(StatsArgs),

    /// Catchments intersecting a box, with one attribute value each
    Choropleth(ChoroplethArgs),

    /// Dissolve catchments into one boundary
    Dissolve(IdsArgs),

    /// Area and attribute values for each catchment
    Indicators(IdsArgs),

    /// Every attribute value of one catchment
    Identify(IdentifyArgs),

    /// Decode a GeoPackage binary geometry blob to GeoJSON
    Decode(DecodeArgs),

    /// Write the GeoJSON column and spatial index of a datapack
    Materialize(StoreArgs),
}

#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Datapack GeoPackage
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub gpkg: PathBuf,

    /// JSON storage layout, defaults to the standard datapack layout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DomainArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    pub attribute: String,
}

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    pub scenario: String,

    pub attribute: String,
}

#[derive(clap::Args, Debug)]
pub struct ChoroplethArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    pub scenario: String,

    pub attribute: String,

    #[arg(allow_negative_numbers = true)]
    pub min_x: f64,

    #[arg(allow_negative_numbers = true)]
    pub min_y: f64,

    #[arg(allow_negative_numbers = true)]
    pub max_x: f64,

    #[arg(allow_negative_numbers = true)]
    pub max_y: f64,
}

#[derive(clap::Args, Debug)]
pub struct IdsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Catchment ids
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<CatchmentId>,
}

#[derive(clap::Args, Debug)]
pub struct IdentifyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    pub id: CatchmentId,
}

#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    /// File holding one raw geometry blob
    #[arg(value_hint = clap::ValueHint::FilePath, required_unless_present = "hex")]
    pub input: Option<PathBuf>,

    /// Blob as a hex string instead of a file
    #[arg(long, conflicts_with = "input")]
    pub hex: Option<String>,

    /// Also print the decoded header
    #[arg(long)]
    pub header: bool,
}
