pub mod attributes;
pub mod boundary;
pub mod codec;
pub mod query;

use std::io::Write;

use anyhow::{Context, Result};
use catchmap::{CatchmentStore, StoreConfig};
use serde::Serialize;

use crate::cli::StoreArgs;

pub(crate) fn load_config(args: &StoreArgs) -> Result<StoreConfig> {
    match &args.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("read config {}", path.display())),
        None => Ok(StoreConfig::default()),
    }
}

pub(crate) fn open_store(args: &StoreArgs) -> Result<CatchmentStore> {
    let config = load_config(args)?;
    CatchmentStore::open(&args.gpkg, config)
        .with_context(|| format!("open datapack {}", args.gpkg.display()))
}

/// Pretty-print a value as JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
