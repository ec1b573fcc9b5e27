use anyhow::Result;
use catchmap::{BoundaryComposer, SiteBoundary};
use serde_json::json;

use crate::cli::IdsArgs;
use crate::commands::{open_store, print_json};

pub fn dissolve(args: &IdsArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let composer = BoundaryComposer::new(&store);
    let site = SiteBoundary::from_catchments(&composer, &args.ids)?;
    let composed = site.composed();

    print_json(&json!({
        "geometry": composed.geometry,
        "boundingBox": composed.bounding_box,
        "areaKm2": composed.area_km2,
        "catchmentIds": site.catchment_ids,
    }))
}

pub fn indicators(args: &IdsArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    print_json(&BoundaryComposer::new(&store).aggregate_indicators(&args.ids)?)
}
