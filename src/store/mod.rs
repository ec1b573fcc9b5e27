//! In-memory catchment store backed by a datapack GeoPackage.
//!
//! The datapack is read once at open time: catchment geometries as GeoJSON
//! text, their bounding boxes, every scenario's attribute rows and the domain
//! tables. Queries never touch SQLite afterwards; attribute names are
//! resolved against the schema-derived allow-list and bbox search goes
//! through an R-tree.

mod attributes;
mod catchment_id;
mod columns;
mod config;
mod load;
mod materialize;
mod query;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard},
};

use ahash::AHashMap;
use rusqlite::Connection;
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::geom::{BoundingBox, Shape, SpatialIndex};
use crate::io::geojson;

pub use attributes::{AttributeStats, DomainRange};
pub use catchment_id::CatchmentId;
pub use config::StoreConfig;
pub use materialize::{materialize, MaterializeReport};
pub use query::{Choropleth, Feature, FeatureCollection, MAX_FEATURES};

use columns::Columns;

/// One catchment geometry as loaded from the datapack.
#[derive(Debug)]
pub(crate) struct Catchment {
    pub(crate) id: CatchmentId,
    /// GeoJSON geometry text, passed through to responses verbatim.
    pub(crate) geometry: Box<RawValue>,
    pub(crate) bbox: BoundingBox,
    /// Precomputed area, when the datapack carries one.
    pub(crate) area_km2: Option<f64>,
}

impl Catchment {
    /// Parse the stored GeoJSON into a canonical shape.
    pub(crate) fn shape(&self) -> Result<Shape> {
        Ok(geojson::decode(self.geometry.get().as_bytes())?)
    }
}

/// Attribute rows of one scenario, keyed by catchment. Values are laid out
/// in [`Columns`] order; `None` marks an absent value.
#[derive(Debug, Default)]
pub(crate) struct ScenarioTable {
    rows: AHashMap<CatchmentId, Box<[Option<f64>]>>,
}

impl ScenarioTable {
    pub(crate) fn new(rows: AHashMap<CatchmentId, Box<[Option<f64>]>>) -> Self {
        Self { rows }
    }

    #[inline]
    pub(crate) fn value(&self, id: CatchmentId, pos: usize) -> Option<f64> {
        self.rows.get(&id).and_then(|values| values.get(pos).copied().flatten())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CatchmentId, &[Option<f64>])> {
        self.rows.iter().map(|(id, values)| (*id, &values[..]))
    }
}

/// Everything a loaded datapack holds.
#[derive(Debug, Default)]
pub(crate) struct StoreData {
    pub(crate) columns: Columns,
    /// Catchments in ingest (row id) order.
    pub(crate) catchments: Vec<Catchment>,
    pub(crate) by_id: AHashMap<CatchmentId, usize>,
    pub(crate) index: SpatialIndex,
    pub(crate) scenarios: BTreeMap<String, ScenarioTable>,
    pub(crate) domains: AHashMap<String, DomainRange>,
}

impl StoreData {
    pub(crate) fn new(
        columns: Columns,
        catchments: Vec<Catchment>,
        scenarios: BTreeMap<String, ScenarioTable>,
        domains: AHashMap<String, DomainRange>,
    ) -> Self {
        let mut by_id = AHashMap::with_capacity(catchments.len());
        for (idx, catchment) in catchments.iter().enumerate() {
            if by_id.insert(catchment.id, idx).is_some() {
                log::warn!("[store] Duplicate catchment id {}; later rows shadow earlier ones", catchment.id);
            }
        }
        let index = SpatialIndex::new(catchments.iter().enumerate().map(|(idx, c)| (idx, c.bbox)));
        Self { columns, catchments, by_id, index, scenarios, domains }
    }

    pub(crate) fn catchment(&self, id: CatchmentId) -> Option<&Catchment> {
        self.by_id.get(&id).map(|&idx| &self.catchments[idx])
    }

    pub(crate) fn scenario(&self, name: &str) -> Result<&ScenarioTable> {
        self.scenarios.get(name).ok_or_else(|| Error::UnknownScenario(name.to_string()))
    }
}

/// Read-mostly catchment store shared by every request handler.
///
/// All query methods take `&self` and may run concurrently; [`reload`]
/// swaps in freshly loaded data under a short write lock.
///
/// [`reload`]: CatchmentStore::reload
#[derive(Debug)]
pub struct CatchmentStore {
    source: Option<PathBuf>,
    config: StoreConfig,
    data: RwLock<StoreData>,
}

impl CatchmentStore {
    /// Open a datapack read-only and load it into memory.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        log::info!("[store] Opening datapack {}", path.display());
        let conn = load::open_read_only(path)?;
        let data = load::load(&conn, &config)?;
        Ok(Self { source: Some(path.to_path_buf()), config, data: RwLock::new(data) })
    }

    /// Load from an already open connection. The store keeps no reference to
    /// it, so [`reload`](Self::reload) is unavailable.
    pub fn from_connection(conn: &Connection, config: StoreConfig) -> Result<Self> {
        let data = load::load(conn, &config)?;
        Ok(Self { source: None, config, data: RwLock::new(data) })
    }

    /// Re-read the backing datapack. Readers see either the old or the new
    /// data, never a mix.
    pub fn reload(&self) -> Result<()> {
        let path = self.source.as_deref()
            .ok_or_else(|| Error::Config("store was not opened from a file".into()))?;
        let conn = load::open_read_only(path)?;
        let fresh = load::load(&conn, &self.config)?;
        *self.data.write().map_err(|_| Error::LockPoisoned)? = fresh;
        log::info!("[store] Reloaded {}", path.display());
        Ok(())
    }

    #[inline] pub fn config(&self) -> &StoreConfig { &self.config }

    /// Number of catchments with usable geometry.
    pub fn catchment_count(&self) -> Result<usize> {
        Ok(self.read()?.catchments.len())
    }

    /// Decoded geometry of one catchment.
    pub fn catchment_shape(&self, id: CatchmentId) -> Result<Shape> {
        self.read()?.catchment(id).ok_or(Error::CatchmentNotFound(id))?.shape()
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, StoreData>> {
        self.data.read().map_err(|_| Error::LockPoisoned)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture_datapack() {
        let store = fixtures::store();
        assert_eq!(store.catchment_count().unwrap(), 3);
        let data = store.read().unwrap();
        assert_eq!(data.columns.names(), ["rainfall", "runoff"]);
        assert_eq!(data.index.len(), 3);
        assert_eq!(data.catchment(CatchmentId(102)).unwrap().bbox, BoundingBox::new(1.0, 0.0, 2.0, 1.0));
        assert_eq!(data.catchment(CatchmentId(103)).unwrap().area_km2, None);
    }

    #[test]
    fn catchment_shape_decodes_stored_geojson() {
        let store = fixtures::store();
        let shape = store.catchment_shape(CatchmentId(101)).unwrap();
        assert_eq!(shape.bounds(), Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        assert!(matches!(store.catchment_shape(CatchmentId(9)), Err(Error::CatchmentNotFound(CatchmentId(9)))));
    }

    #[test]
    fn bad_rows_are_skipped_and_boxes_fall_back_to_geometry() {
        let conn = fixtures::connection();
        conn.execute_batch(&format!("
            DELETE FROM rtree_catchments_lev12_geom WHERE id = 3;
            INSERT INTO catchments_lev12 VALUES (4, 104, 'not json', NULL);
            INSERT INTO catchments_lev12 VALUES (5, NULL, '{}', NULL);
        ", fixtures::square_geojson(7.0))).unwrap();

        let store = CatchmentStore::from_connection(&conn, StoreConfig::default()).unwrap();
        let data = store.read().unwrap();
        assert_eq!(data.catchments.len(), 3);
        assert_eq!(data.catchment(CatchmentId(103)).unwrap().bbox, BoundingBox::new(2.0, 0.0, 3.0, 1.0));
    }

    #[test]
    fn reload_swaps_in_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datapack.gpkg");
        let conn = Connection::open(&path).unwrap();
        fixtures::populate(&conn);
        drop(conn);

        let store = CatchmentStore::open(&path, StoreConfig::default()).unwrap();
        assert_eq!(store.catchment_count().unwrap(), 3);

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO catchments_lev12 VALUES (4, 104, ?1, NULL)",
            [fixtures::square_geojson(3.0)],
        ).unwrap();
        drop(conn);

        store.reload().unwrap();
        assert_eq!(store.catchment_count().unwrap(), 4);
    }

    #[test]
    fn reload_needs_a_backing_file() {
        assert!(matches!(fixtures::store().reload(), Err(Error::Config(_))));
    }
}
