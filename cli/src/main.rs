mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{attributes, boundary, codec, query};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Columns(args) => attributes::columns(args),
        Commands::Scenarios(args) => attributes::scenarios(args),
        Commands::Domain(args) => attributes::domain(args),
        Commands::Stats(args) => attributes::stats(args),
        Commands::Identify(args) => attributes::identify(args),
        Commands::Choropleth(args) => query::choropleth(args),
        Commands::Dissolve(args) => boundary::dissolve(args),
        Commands::Indicators(args) => boundary::indicators(args),
        Commands::Decode(args) => codec::decode(args),
        Commands::Materialize(args) => codec::materialize(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> { run() }
