//! One-time load of a datapack GeoPackage into memory.
//!
//! Dynamic SQL here only ever interpolates identifiers that come from the
//! configuration or from the schema itself, always through [`quote_ident`].

use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use rusqlite::{types::ValueRef, Connection, OpenFlags};
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::geom::BoundingBox;
use crate::io::geojson;
use crate::store::{
    columns::{quote_ident, Columns},
    Catchment, CatchmentId, DomainRange, ScenarioTable, StoreConfig, StoreData,
};

pub(crate) fn open_read_only(path: &Path) -> Result<Connection> {
    Ok(Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)?)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Column names of a table, in schema order.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Interpret a SQL value as a finite number; anything else is absent.
fn numeric(value: ValueRef<'_>) -> Option<f64> {
    let number: f64 = match value {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok()?,
        ValueRef::Null | ValueRef::Blob(_) => return None,
    };
    number.is_finite().then_some(number)
}

/// Load everything the query paths need.
pub(crate) fn load(conn: &Connection, config: &StoreConfig) -> Result<StoreData> {
    config.validate()?;

    let columns = load_columns(conn, config)?;
    let catchments = load_catchments(conn, config)?;
    let scenarios = config.scenarios.iter()
        .map(|(name, table)| Ok((name.clone(), load_scenario(conn, config, table, &columns)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    let domains = load_domains(conn, config)?;

    log::info!(
        "[store::load] Loaded {} attribute columns, {} catchments, {} scenarios, {} domain ranges",
        columns.len(), catchments.len(), scenarios.len(), domains.len(),
    );

    Ok(StoreData::new(columns, catchments, scenarios, domains))
}

fn load_columns(conn: &Connection, config: &StoreConfig) -> Result<Columns> {
    let table = config.schema_table()?;
    if !table_exists(conn, table)? {
        log::warn!("[store::load] Schema table {table} not found; no attributes available");
        return Ok(Columns::default());
    }
    let names = table_columns(conn, table)?.into_iter()
        .filter(|name| !config.is_excluded(name))
        .collect();
    Ok(Columns::new(names))
}

fn load_index(conn: &Connection, table: &str) -> Result<AHashMap<i64, BoundingBox>> {
    let mut stmt = conn.prepare(&format!("SELECT id, minx, maxx, miny, maxy FROM {}", quote_ident(table)))?;
    let boxes = stmt.query_map([], |row| {
        let (min_x, max_x, min_y, max_y) = (row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?);
        Ok((row.get::<_, i64>(0)?, BoundingBox::new(min_x, min_y, max_x, max_y)))
    })?
    .collect::<rusqlite::Result<AHashMap<_, _>>>()?;
    Ok(boxes)
}

fn load_catchments(conn: &Connection, config: &StoreConfig) -> Result<Vec<Catchment>> {
    let table = &config.geometry_table;
    if !table_exists(conn, table)? {
        return Err(Error::Config(format!("geometry table {table} not found")));
    }
    let present = table_columns(conn, table)?;
    if !present.contains(&config.geojson_column) {
        return Err(Error::Config(format!(
            "{table} has no {} column; materialize the datapack first", config.geojson_column,
        )));
    }

    let bboxes = match &config.spatial_index_table {
        Some(index) if table_exists(conn, index)? => load_index(conn, index)?,
        Some(index) => {
            log::warn!("[store::load] Spatial index {index} not found; deriving boxes from geometry");
            AHashMap::new()
        }
        None => AHashMap::new(),
    };

    let area = match &config.area_column {
        Some(col) if present.contains(col) => quote_ident(col),
        _ => "NULL".to_string(),
    };
    let geojson_col = quote_ident(&config.geojson_column);
    let fid = quote_ident(&config.fid_column);
    let sql = format!(
        "SELECT {fid}, {id}, {geojson_col}, {area} FROM {table} WHERE {geojson_col} IS NOT NULL ORDER BY {fid}",
        id = quote_ident(&config.id_column),
        table = quote_ident(table),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut catchments = Vec::new();
    let mut skipped = 0usize;

    while let Some(row) = rows.next()? {
        let fid: i64 = row.get(0)?;
        let Some(id) = CatchmentId::from_sql(row.get_ref(1)?) else {
            log::warn!("[store::load] Row {fid}: unreadable catchment id, skipping");
            skipped += 1;
            continue;
        };
        let text = match row.get_ref(2)? {
            ValueRef::Text(bytes) if !bytes.is_empty() => String::from_utf8_lossy(bytes).into_owned(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let geometry = match RawValue::from_string(text) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("[store::load] Catchment {id}: invalid GeoJSON, skipping: {e}");
                skipped += 1;
                continue;
            }
        };
        let bbox = match bboxes.get(&fid) {
            Some(bbox) => *bbox,
            None => match geojson::decode(geometry.get().as_bytes()) {
                Ok(shape) => match shape.bounds() {
                    Some(bbox) => bbox,
                    None => {
                        log::warn!("[store::load] Catchment {id}: empty geometry, skipping");
                        skipped += 1;
                        continue;
                    }
                },
                Err(e) => {
                    log::warn!("[store::load] Catchment {id}: {e}, skipping");
                    skipped += 1;
                    continue;
                }
            },
        };

        catchments.push(Catchment { id, geometry, bbox, area_km2: numeric(row.get_ref(3)?) });
    }

    if skipped > 0 {
        log::warn!("[store::load] Skipped {skipped} catchment rows");
    }
    Ok(catchments)
}

fn load_scenario(conn: &Connection, config: &StoreConfig, table: &str, columns: &Columns) -> Result<ScenarioTable> {
    if !table_exists(conn, table)? {
        log::warn!("[store::load] Scenario table {table} not found");
        return Ok(ScenarioTable::default());
    }

    // Columns missing from this table simply stay absent for every row.
    let present = table_columns(conn, table)?;
    let selected: Vec<usize> = (0..columns.len())
        .filter(|&pos| present.contains(&columns.names()[pos]))
        .collect();

    let mut select_list = quote_ident(&config.scenario_id_column);
    for &pos in &selected {
        select_list.push_str(", ");
        select_list.push_str(&quote_ident(&columns.names()[pos]));
    }
    let mut stmt = conn.prepare(&format!("SELECT {select_list} FROM {}", quote_ident(table)))?;
    let mut rows = stmt.query([])?;

    let mut table_rows = AHashMap::new();
    while let Some(row) = rows.next()? {
        let Some(id) = CatchmentId::from_sql(row.get_ref(0)?) else { continue };
        let mut values = vec![None; columns.len()];
        for (k, &pos) in selected.iter().enumerate() {
            values[pos] = numeric(row.get_ref(k + 1)?);
        }
        table_rows.insert(id, values.into_boxed_slice());
    }

    log::debug!("[store::load] {table}: {} rows, {}/{} columns", table_rows.len(), selected.len(), columns.len());
    Ok(ScenarioTable::new(table_rows))
}

/// Read every numeric column of the first row of a single-row table.
fn load_single_row(conn: &Connection, table: &str) -> Result<AHashMap<String, f64>> {
    if !table_exists(conn, table)? {
        log::warn!("[store::load] Domain table {table} not found");
        return Ok(AHashMap::new());
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT 1", quote_ident(table)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;

    let mut values = AHashMap::new();
    if let Some(row) = rows.next()? {
        for (i, name) in names.into_iter().enumerate() {
            if let Some(value) = numeric(row.get_ref(i)?) {
                values.insert(name, value);
            }
        }
    }
    Ok(values)
}

fn load_domains(conn: &Connection, config: &StoreConfig) -> Result<AHashMap<String, DomainRange>> {
    let minima = load_single_row(conn, &config.domain_min_table)?;
    let maxima = load_single_row(conn, &config.domain_max_table)?;
    Ok(minima.into_iter()
        .filter_map(|(name, min)| maxima.get(&name).map(|&max| (name, DomainRange { min, max })))
        .collect())
}
