//! Offline preparation of a datapack for serving.
//!
//! Decoding GeoPackage binary on every viewport query is too slow, so each
//! geometry is decoded once here and stored as GeoJSON text next to the
//! blob, with its bounding box written to the spatial index table.

use std::path::Path;

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::{geojson, gpb};
use crate::store::{
    columns::quote_ident,
    load::{table_columns, table_exists},
    StoreConfig,
};

/// Outcome of a [`materialize`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub written: usize,
    pub skipped: usize,
}

/// Fill the GeoJSON column and spatial index of a datapack from its binary
/// geometry column. Rows that fail to decode are logged and skipped.
pub fn materialize(path: &Path, config: &StoreConfig) -> Result<MaterializeReport> {
    config.validate()?;
    let mut conn = Connection::open(path)?;

    let table = &config.geometry_table;
    if !table_exists(&conn, table)? {
        return Err(Error::Config(format!("geometry table {table} not found")));
    }
    let present = table_columns(&conn, table)?;
    if !present.contains(&config.geometry_column) {
        return Err(Error::Config(format!("{table} has no {} column", config.geometry_column)));
    }
    if !present.contains(&config.geojson_column) {
        log::info!("[store::materialize] Adding column {}.{}", table, config.geojson_column);
        conn.execute(
            &format!("ALTER TABLE {} ADD COLUMN {} TEXT", quote_ident(table), quote_ident(&config.geojson_column)),
            [],
        )?;
    }
    if let Some(index) = &config.spatial_index_table {
        if !table_exists(&conn, index)? {
            log::info!("[store::materialize] Creating spatial index {index}");
            conn.execute(
                &format!("CREATE VIRTUAL TABLE {} USING rtree(id, minx, maxx, miny, maxy)", quote_ident(index)),
                [],
            )?;
        }
    }

    let fid = quote_ident(&config.fid_column);
    let blobs: Vec<(i64, Option<Vec<u8>>)> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT {fid}, {} FROM {} ORDER BY {fid}",
            quote_ident(&config.geometry_column), quote_ident(table),
        ))?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?
    };

    let mut report = MaterializeReport::default();
    let tx = conn.transaction()?;
    {
        let mut update = tx.prepare(&format!(
            "UPDATE {} SET {} = ?1 WHERE {fid} = ?2",
            quote_ident(table), quote_ident(&config.geojson_column),
        ))?;
        let mut insert_box = match &config.spatial_index_table {
            Some(index) => Some(tx.prepare(&format!(
                "INSERT OR REPLACE INTO {} (id, minx, maxx, miny, maxy) VALUES (?1, ?2, ?3, ?4, ?5)",
                quote_ident(index),
            ))?),
            None => None,
        };

        for (row_id, blob) in blobs {
            let Some(blob) = blob else {
                report.skipped += 1;
                continue;
            };
            let shape = match gpb::decode(&blob) {
                Ok(shape) => shape,
                Err(e) => {
                    log::warn!("[store::materialize] Row {row_id}: {e}, skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            let text = String::from_utf8_lossy(&geojson::encode(&shape)).into_owned();
            update.execute(params![text, row_id])?;
            if let (Some(insert), Some(bbox)) = (insert_box.as_mut(), shape.bounds()) {
                insert.execute(params![row_id, bbox.min_x, bbox.max_x, bbox.min_y, bbox.max_y])?;
            }
            report.written += 1;
        }
    }
    tx.commit()?;

    log::info!("[store::materialize] Wrote {} geometries, skipped {}", report.written, report.skipped);
    Ok(report)
}
