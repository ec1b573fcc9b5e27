//! Per-scenario attribute lookups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{CatchmentId, CatchmentStore};

/// Precomputed dataset-wide bounds of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainRange {
    pub min: f64,
    pub max: f64,
}

/// Summary statistics over the present values of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStats {
    pub scenario: String,
    pub attribute: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl CatchmentStore {
    /// Attribute names that may be queried, in schema order.
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.read()?.columns.names().to_vec())
    }

    /// Configured scenario names.
    pub fn scenarios(&self) -> Vec<String> {
        self.config().scenarios.keys().cloned().collect()
    }

    /// Present values of `attribute` in `scenario`. Catchments without a
    /// value are absent from the map.
    pub fn scenario_data(&self, scenario: &str, attribute: &str) -> Result<BTreeMap<CatchmentId, f64>> {
        let data = self.read()?;
        let pos = data.columns.position(attribute)?;
        let table = data.scenario(scenario)?;
        Ok(table.iter()
            .filter_map(|(id, values)| values[pos].map(|v| (id, v)))
            .collect())
    }

    /// Inner join of two scenarios on catchment id: only catchments with a
    /// present value on both sides appear, as `(left, right)`.
    pub fn comparison_data(&self, left: &str, right: &str, attribute: &str) -> Result<BTreeMap<CatchmentId, (f64, f64)>> {
        let data = self.read()?;
        let pos = data.columns.position(attribute)?;
        let (lhs, rhs) = (data.scenario(left)?, data.scenario(right)?);
        Ok(lhs.iter()
            .filter_map(|(id, values)| Some((id, (values[pos]?, rhs.value(id, pos)?))))
            .collect())
    }

    /// Precomputed bounds of `attribute`.
    pub fn domain_range(&self, attribute: &str) -> Result<DomainRange> {
        self.read()?.domains.get(attribute)
            .copied()
            .ok_or_else(|| Error::AttributeNotFound(attribute.to_string()))
    }

    /// Count, extrema, mean and standard deviation of `attribute` in `scenario`.
    pub fn stats(&self, scenario: &str, attribute: &str) -> Result<AttributeStats> {
        let values: Vec<f64> = self.scenario_data(scenario, attribute)?.into_values().collect();
        if values.is_empty() {
            return Err(Error::NoData { scenario: scenario.to_string(), attribute: attribute.to_string() });
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Ok(AttributeStats {
            scenario: scenario.to_string(),
            attribute: attribute.to_string(),
            count,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Every present attribute value of one catchment, by scenario. Scenarios
    /// with no values for the catchment are left out.
    pub fn catchment_attributes(&self, id: CatchmentId) -> Result<BTreeMap<String, BTreeMap<String, f64>>> {
        let data = self.read()?;
        let result: BTreeMap<_, _> = data.scenarios.iter()
            .map(|(name, table)| {
                let values: BTreeMap<String, f64> = data.columns.names().iter().enumerate()
                    .filter_map(|(pos, column)| Some((column.clone(), table.value(id, pos)?)))
                    .collect();
                (name.clone(), values)
            })
            .filter(|(_, values)| !values.is_empty())
            .collect();

        if result.is_empty() && data.catchment(id).is_none() {
            return Err(Error::CatchmentNotFound(id));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{fixtures, StoreConfig};

    #[test]
    fn columns_exclude_identifiers() {
        let store = fixtures::store();
        assert_eq!(store.columns().unwrap(), vec!["rainfall", "runoff"]);
        assert_eq!(store.scenarios(), vec!["current", "reference"]);
    }

    #[test]
    fn scenario_data_leaves_missing_values_out() {
        let store = fixtures::store();
        let runoff = store.scenario_data("current", "runoff").unwrap();
        assert_eq!(runoff.len(), 2);
        assert_eq!(runoff[&CatchmentId(101)], 1.0);
        assert!(!runoff.contains_key(&CatchmentId(102)));
    }

    #[test]
    fn unknown_names_are_rejected_before_lookup() {
        let store = fixtures::store();
        assert!(matches!(store.scenario_data("current", "rainfall'; DROP TABLE x; --"), Err(Error::InvalidAttribute(_))));
        assert!(matches!(store.scenario_data("future", "rainfall"), Err(Error::UnknownScenario(_))));
        assert!(matches!(store.comparison_data("reference", "current", "rain\"fall"), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn comparison_is_an_inner_join() {
        let store = fixtures::store();
        let pairs = store.comparison_data("reference", "current", "rainfall").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[&CatchmentId(101)], (8.0, 10.0));
        assert_eq!(pairs[&CatchmentId(102)], (20.0, 20.0));

        // 102 has no current runoff, 103 no reference row.
        let runoff = store.comparison_data("reference", "current", "runoff").unwrap();
        assert_eq!(runoff.keys().copied().collect::<Vec<_>>(), vec![CatchmentId(101)]);
    }

    #[test]
    fn comparing_identical_scenarios_pairs_equal_values() {
        let config = StoreConfig {
            scenarios: [("current", "scenario_current"), ("reference", "scenario_current")]
                .into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..StoreConfig::default()
        };
        let store = CatchmentStore::from_connection(&fixtures::connection(), config).unwrap();
        let pairs = store.comparison_data("reference", "current", "rainfall").unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.values().all(|(l, r)| l == r));
    }

    #[test]
    fn domain_range_reads_precomputed_bounds() {
        let store = fixtures::store();
        assert_eq!(store.domain_range("rainfall").unwrap(), DomainRange { min: 0.0, max: 50.0 });
        assert!(matches!(store.domain_range("snow"), Err(Error::AttributeNotFound(_))));
    }

    #[test]
    fn stats_use_population_deviation() {
        let store = fixtures::store();
        let stats = store.stats("current", "rainfall").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!((stats.min, stats.max, stats.mean), (10.0, 30.0, 20.0));
        assert!((stats.std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn stats_without_values_is_no_data() {
        let conn = fixtures::connection();
        conn.execute_batch("UPDATE scenario_reference SET runoff = NULL;").unwrap();
        let store = CatchmentStore::from_connection(&conn, StoreConfig::default()).unwrap();
        assert!(matches!(store.stats("reference", "runoff"), Err(Error::NoData { .. })));
    }

    #[test]
    fn catchment_attributes_groups_by_scenario() {
        let store = fixtures::store();
        let attrs = store.catchment_attributes(CatchmentId(103)).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["current"]["runoff"], 3.0);
        assert!(matches!(store.catchment_attributes(CatchmentId(999)), Err(Error::CatchmentNotFound(_))));
    }
}
