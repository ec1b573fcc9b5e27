use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage layout of a catchment datapack.
///
/// Every table and column the loader touches is named here; nothing about the
/// layout is hard-coded elsewhere. Scenario names map explicitly to tables, so
/// an alias such as `"future" -> "scenario_current"` is a configuration choice
/// rather than a fallback in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Catchment geometry table.
    pub geometry_table: String,
    /// Row id of the geometry table, as referenced by the spatial index.
    pub fid_column: String,
    /// Catchment identifier column; also the id property name in features.
    pub id_column: String,
    /// Pre-materialized GeoJSON text column.
    pub geojson_column: String,
    /// GeoPackage binary geometry column.
    pub geometry_column: String,
    /// Optional precomputed area column, in km².
    pub area_column: Option<String>,
    /// Optional bounding-box index table with `id, minx, maxx, miny, maxy`.
    pub spatial_index_table: Option<String>,
    /// Catchment identifier column in the scenario tables.
    pub scenario_id_column: String,
    /// Scenario name -> attribute table.
    pub scenarios: BTreeMap<String, String>,
    /// Table whose columns define the attribute allow-list. Defaults to the
    /// table of the first scenario.
    pub schema_table: Option<String>,
    /// Single-row table of per-attribute domain minima.
    pub domain_min_table: String,
    /// Single-row table of per-attribute domain maxima.
    pub domain_max_table: String,
    /// Identifier columns that are never exposed as attributes.
    pub excluded_columns: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            geometry_table: "catchments_lev12".to_string(),
            fid_column: "fid".to_string(),
            id_column: "HYBAS_ID".to_string(),
            geojson_column: "geojson".to_string(),
            geometry_column: "geom".to_string(),
            area_column: Some("SUB_AREA".to_string()),
            spatial_index_table: Some("rtree_catchments_lev12_geom".to_string()),
            scenario_id_column: "catchment_id".to_string(),
            scenarios: BTreeMap::from([
                ("current".to_string(), "scenario_current".to_string()),
                ("reference".to_string(), "scenario_reference".to_string()),
            ]),
            schema_table: None,
            domain_min_table: "domain_minima".to_string(),
            domain_max_table: "domain_maxima".to_string(),
            excluded_columns: ["catchment_id", "fid", "ogc_fid", "catchment_id_int"]
                .into_iter().map(String::from).collect(),
        }
    }
}

impl StoreConfig {
    /// Read a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: StoreConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the layout is usable.
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(Error::Config("at least one scenario must be configured".into()));
        }
        for (name, value) in [
            ("geometry_table", &self.geometry_table),
            ("fid_column", &self.fid_column),
            ("id_column", &self.id_column),
            ("geojson_column", &self.geojson_column),
            ("scenario_id_column", &self.scenario_id_column),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }
        if let Some((scenario, _)) = self.scenarios.iter().find(|(_, table)| table.is_empty()) {
            return Err(Error::Config(format!("scenario {scenario:?} has no table")));
        }
        Ok(())
    }

    /// Table backing a scenario.
    pub fn table_for(&self, scenario: &str) -> Result<&str> {
        self.scenarios.get(scenario)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownScenario(scenario.to_string()))
    }

    /// Table whose columns define the attribute allow-list.
    pub fn schema_table(&self) -> Result<&str> {
        match &self.schema_table {
            Some(table) => Ok(table),
            None => self.scenarios.values().next()
                .map(String::as_str)
                .ok_or_else(|| Error::Config("no scenario tables configured".into())),
        }
    }

    /// True for identifier columns that are not attributes.
    pub(crate) fn is_excluded(&self, column: &str) -> bool {
        column == self.scenario_id_column || self.excluded_columns.iter().any(|c| c == column)
    }
}
