use std::fs;

use anyhow::{Context, Result};
use catchmap::io::{geojson, gpb};
use serde_json::json;

use crate::cli::{DecodeArgs, StoreArgs};
use crate::commands::{load_config, print_json};

pub fn decode(args: &DecodeArgs) -> Result<()> {
    let bytes = match (&args.hex, &args.input) {
        (Some(text), _) => hex::decode(text.trim()).context("parse hex blob")?,
        (None, Some(path)) => fs::read(path).with_context(|| format!("read {}", path.display()))?,
        (None, None) => anyhow::bail!("provide an input file or --hex"),
    };

    let (header, shape) = gpb::read(&bytes)?;
    let geometry = geojson::to_value(&shape);
    if !args.header {
        return print_json(&geometry);
    }
    print_json(&json!({
        "header": {
            "version": header.version,
            "flags": header.flags,
            "byteOrder": format!("{:?}", header.byte_order),
            "srsId": header.srs_id,
            "envelope": header.envelope,
            "empty": header.is_empty,
        },
        "geometry": geometry,
    }))
}

pub fn materialize(args: &StoreArgs) -> Result<()> {
    let config = load_config(args)?;
    let report = catchmap::store::materialize(&args.gpkg, &config)
        .with_context(|| format!("materialize {}", args.gpkg.display()))?;
    print_json(&report)
}
