use anyhow::Result;
use serde_json::json;

use crate::cli::{DomainArgs, IdentifyArgs, StatsArgs, StoreArgs};
use crate::commands::{open_store, print_json};

pub fn columns(args: &StoreArgs) -> Result<()> {
    print_json(&open_store(args)?.columns()?)
}

pub fn scenarios(args: &StoreArgs) -> Result<()> {
    print_json(&open_store(args)?.scenarios())
}

pub fn domain(args: &DomainArgs) -> Result<()> {
    let range = open_store(&args.store)?.domain_range(&args.attribute)?;
    print_json(&json!({ "attribute": args.attribute, "min": range.min, "max": range.max }))
}

pub fn stats(args: &StatsArgs) -> Result<()> {
    print_json(&open_store(&args.store)?.stats(&args.scenario, &args.attribute)?)
}

pub fn identify(args: &IdentifyArgs) -> Result<()> {
    let store = open_store(&args.store)?;
    let mut feature = serde_json::to_value(store.catchment_feature(args.id)?)?;
    feature["properties"]["scenarios"] = serde_json::to_value(store.catchment_attributes(args.id)?)?;
    print_json(&feature)
}
