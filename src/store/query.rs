//! Viewport queries over the catchment index.

use serde::Serialize;
use serde_json::{value::RawValue, Map, Value};

use crate::error::{Error, Result};
use crate::geom::BoundingBox;
use crate::store::{Catchment, CatchmentId, CatchmentStore, StoreData};

/// Most features a single viewport query returns.
///
/// Matches beyond this are dropped (in ingest order) to keep map redraws
/// interactive. Clients are expected to query only at zoom levels where the
/// cap is not visually limiting; raising it trades interactivity for
/// completeness and should not be done casually.
pub const MAX_FEATURES: usize = 2000;

/// A GeoJSON feature with the stored geometry passed through verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub id: CatchmentId,
    pub geometry: Box<RawValue>,
    pub properties: Map<String, Value>,
}

impl Feature {
    fn new(id_property: &str, catchment: &Catchment) -> Self {
        let mut properties = Map::new();
        properties.insert(id_property.to_string(), Value::from(catchment.id.0));
        Self { kind: "Feature", id: catchment.id, geometry: catchment.geometry.clone(), properties }
    }

    /// Attach an attribute value; absent values leave the property out.
    fn with_value(mut self, attribute: &str, value: Option<f64>) -> Self {
        if let Some(value) = value {
            self.properties.insert(attribute.to_string(), Value::from(value));
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    fn new(features: Vec<Feature>) -> Self {
        Self { kind: "FeatureCollection", features }
    }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }
}

/// A feature collection carrying the attribute's domain for color scaling.
#[derive(Debug, Clone, Serialize)]
pub struct Choropleth {
    #[serde(flatten)]
    pub collection: FeatureCollection,
    pub domain_min: f64,
    pub domain_max: f64,
}

impl CatchmentStore {
    /// Catchments whose bounding box intersects `bbox`, each carrying the
    /// value of `attribute` in `scenario` when present.
    ///
    /// At most [`MAX_FEATURES`] features are returned, the earliest ingested
    /// first.
    pub fn query(&self, scenario: &str, attribute: &str, bbox: BoundingBox) -> Result<FeatureCollection> {
        self.collect_features(&*self.read()?, scenario, attribute, bbox)
    }

    fn collect_features(&self, data: &StoreData, scenario: &str, attribute: &str, bbox: BoundingBox) -> Result<FeatureCollection> {
        let pos = data.columns.position(attribute)?;
        let table = data.scenario(scenario)?;

        let bbox = BoundingBox::new(bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y);
        let hits = data.index.query(&bbox);
        let matched = hits.len();

        let id_property = &self.config().id_column;
        let features: Vec<Feature> = hits.into_iter()
            .take(MAX_FEATURES)
            .map(|idx| {
                let catchment = &data.catchments[idx];
                Feature::new(id_property, catchment).with_value(attribute, table.value(catchment.id, pos))
            })
            .collect();

        if matched > MAX_FEATURES {
            log::debug!("[store::query] {scenario}/{attribute}: {matched} of {} matches truncated to {MAX_FEATURES}", data.index.len());
        } else {
            log::debug!("[store::query] {scenario}/{attribute}: {matched} of {} matches", data.index.len());
        }
        Ok(FeatureCollection::new(features))
    }

    /// [`query`](Self::query) plus the attribute's domain range. A missing
    /// domain is reported as `0..0`.
    ///
    /// Features and domain come from the same snapshot, even across a
    /// concurrent [`reload`](Self::reload).
    pub fn choropleth(&self, scenario: &str, attribute: &str, bbox: BoundingBox) -> Result<Choropleth> {
        let data = self.read()?;
        let collection = self.collect_features(&data, scenario, attribute, bbox)?;
        let (domain_min, domain_max) = match data.domains.get(attribute) {
            Some(range) => (range.min, range.max),
            None => {
                log::warn!("[store::query] No domain range for {attribute}; using 0..0");
                (0.0, 0.0)
            }
        };
        Ok(Choropleth { collection, domain_min, domain_max })
    }

    /// One catchment as a feature carrying only its id.
    pub fn catchment_feature(&self, id: CatchmentId) -> Result<Feature> {
        let data = self.read()?;
        let catchment = data.catchment(id).ok_or(Error::CatchmentNotFound(id))?;
        Ok(Feature::new(&self.config().id_column, catchment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{fixtures, StoreConfig};
    use rusqlite::Connection;

    fn ids(collection: &FeatureCollection) -> Vec<i64> {
        collection.features.iter().map(|f| f.id.0).collect()
    }

    #[test]
    fn returns_intersecting_catchments_in_ingest_order() {
        let store = fixtures::store();
        let result = store.query("current", "rainfall", BoundingBox::new(1.5, 0.2, 2.5, 0.8)).unwrap();
        assert_eq!(ids(&result), vec![102, 103]);

        // Touching edges count as overlap.
        let result = store.query("current", "rainfall", BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(ids(&result), vec![101, 102]);
    }

    #[test]
    fn disjoint_box_returns_no_features() {
        let store = fixtures::store();
        let result = store.query("current", "rainfall", BoundingBox::new(10.0, 10.0, 11.0, 11.0)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn swapped_corners_are_normalised() {
        let store = fixtures::store();
        let bbox = BoundingBox { min_x: 2.5, min_y: 0.8, max_x: 1.5, max_y: 0.2 };
        assert_eq!(ids(&store.query("current", "rainfall", bbox).unwrap()), vec![102, 103]);
    }

    #[test]
    fn absent_values_are_omitted_from_properties() {
        let store = fixtures::store();
        let result = store.query("current", "runoff", BoundingBox::new(0.0, 0.0, 3.0, 1.0)).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["properties"]["HYBAS_ID"], 101);
        assert_eq!(json["features"][0]["properties"]["runoff"], 1.0);
        assert!(json["features"][1]["properties"].get("runoff").is_none());
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
    }

    #[test]
    fn invalid_attribute_never_reaches_the_data() {
        let store = fixtures::store();
        let bbox = BoundingBox::new(0.0, 0.0, 3.0, 1.0);
        assert!(matches!(store.query("current", "rainfall\" FROM x --", bbox), Err(Error::InvalidAttribute(_))));
        assert!(matches!(store.query("future", "rainfall", bbox), Err(Error::UnknownScenario(_))));
    }

    #[test]
    fn caps_results_at_max_features() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(fixtures::SCHEMA).unwrap();
        conn.execute_batch("BEGIN").unwrap();
        {
            let mut insert = conn.prepare("INSERT INTO catchments_lev12 VALUES (?1, ?2, ?3, NULL)").unwrap();
            let mut index = conn.prepare("INSERT INTO rtree_catchments_lev12_geom VALUES (?1, ?2, ?2 + 1, 0, 1)").unwrap();
            for fid in 1..=2500i64 {
                let x = (fid % 50) as f64;
                insert.execute(rusqlite::params![fid, 1000 + fid, fixtures::square_geojson(x)]).unwrap();
                index.execute(rusqlite::params![fid, x]).unwrap();
            }
        }
        conn.execute_batch("COMMIT").unwrap();

        let store = CatchmentStore::from_connection(&conn, StoreConfig::default()).unwrap();
        let result = store.query("current", "rainfall", BoundingBox::new(-1.0, -1.0, 60.0, 2.0)).unwrap();
        assert_eq!(result.len(), MAX_FEATURES);
        assert_eq!(result.features[0].id, CatchmentId(1001));
        assert_eq!(result.features[MAX_FEATURES - 1].id, CatchmentId(1000 + MAX_FEATURES as i64));
    }

    #[test]
    fn choropleth_carries_domain_fields() {
        let store = fixtures::store();
        let json = serde_json::to_value(
            store.choropleth("reference", "rainfall", BoundingBox::new(0.0, 0.0, 3.0, 1.0)).unwrap()
        ).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"].as_array().unwrap().len(), 3);
        assert_eq!((json["domain_min"].as_f64(), json["domain_max"].as_f64()), (Some(0.0), Some(50.0)));
    }

    #[test]
    fn choropleth_without_domain_falls_back_to_zero() {
        let conn = fixtures::connection();
        conn.execute_batch("DROP TABLE domain_maxima;").unwrap();
        let store = CatchmentStore::from_connection(&conn, StoreConfig::default()).unwrap();
        let result = store.choropleth("current", "rainfall", BoundingBox::new(0.0, 0.0, 3.0, 1.0)).unwrap();
        assert_eq!((result.domain_min, result.domain_max), (0.0, 0.0));
    }

    fn file_store(dir: &tempfile::TempDir) -> (std::path::PathBuf, CatchmentStore) {
        let path = dir.path().join("datapack.gpkg");
        fixtures::populate(&Connection::open(&path).unwrap());
        let store = CatchmentStore::open(&path, StoreConfig::default()).unwrap();
        (path, store)
    }

    #[test]
    fn choropleth_reads_features_and_domain_from_one_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (path, store) = file_store(&dir);
        let bbox = BoundingBox::new(0.0, 0.0, 5.0, 1.0);
        assert_eq!(store.choropleth("current", "rainfall", bbox).unwrap().domain_max, 50.0);

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!("
            INSERT INTO catchments_lev12 VALUES (4, 104, '{}', NULL);
            INSERT INTO rtree_catchments_lev12_geom VALUES (4, 3, 4, 0, 1);
            UPDATE domain_maxima SET rainfall = 90.0;
        ", fixtures::square_geojson(3.0))).unwrap();
        drop(conn);
        store.reload().unwrap();

        let result = store.choropleth("current", "rainfall", bbox).unwrap();
        assert_eq!(ids(&result.collection), vec![101, 102, 103, 104]);
        assert_eq!((result.domain_min, result.domain_max), (0.0, 90.0));
        assert!(matches!(store.choropleth("current", "nope", bbox), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn concurrent_readers_see_consistent_results() {
        let dir = tempfile::tempdir().unwrap();
        let (_, store) = file_store(&dir);
        let bbox = BoundingBox::new(0.5, 0.0, 2.5, 1.0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        assert_eq!(ids(&store.query("current", "rainfall", bbox).unwrap()), vec![101, 102, 103]);
                        let result = store.choropleth("reference", "runoff", bbox).unwrap();
                        assert_eq!(ids(&result.collection), vec![101, 102, 103]);
                        assert_eq!(result.domain_max, 5.0);
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..5 {
                    store.reload().unwrap();
                }
            });
        });
        assert_eq!(store.catchment_count().unwrap(), 3);
    }

    #[test]
    fn single_catchment_feature() {
        let store = fixtures::store();
        let feature = store.catchment_feature(CatchmentId(102)).unwrap();
        assert_eq!(feature.properties.len(), 1);
        assert!(matches!(store.catchment_feature(CatchmentId(1)), Err(Error::CatchmentNotFound(_))));
    }
}
