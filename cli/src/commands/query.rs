use anyhow::Result;
use catchmap::BoundingBox;

use crate::cli::ChoroplethArgs;
use crate::commands::{open_store, print_json};

pub fn choropleth(args: &ChoroplethArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let bbox = BoundingBox::new(args.min_x, args.min_y, args.max_x, args.max_y);
    let result = store.choropleth(&args.scenario, &args.attribute, bbox)?;

    if result.collection.len() == catchmap::MAX_FEATURES {
        log::warn!("[choropleth] Result hit the {} feature cap; zoom in for complete coverage", catchmap::MAX_FEATURES);
    }
    print_json(&result)
}
