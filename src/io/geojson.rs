//! GeoJSON encoding of canonical shapes.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

use crate::error::CodecError;
use crate::geom::Shape;

fn ring_to_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_to_json(poly: &Polygon<f64>) -> Value {
    if poly.exterior().0.is_empty() {
        return json!([]);
    }
    let mut rings = Vec::with_capacity(1 + poly.interiors().len());
    rings.push(ring_to_json(poly.exterior()));
    rings.extend(poly.interiors().iter().map(ring_to_json));
    Value::Array(rings)
}

/// Shape as a GeoJSON geometry object.
pub fn to_value(shape: &Shape) -> Value {
    match shape {
        Shape::Polygon(poly) => json!({
            "type": "Polygon",
            "coordinates": polygon_to_json(poly),
        }),
        Shape::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_to_json).collect::<Vec<_>>(),
        }),
    }
}

/// Shape as GeoJSON text.
pub fn encode(shape: &Shape) -> Vec<u8> {
    to_value(shape).to_string().into_bytes()
}

fn invalid(msg: impl Into<String>) -> CodecError {
    CodecError::InvalidGeoJson(msg.into())
}

fn array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, CodecError> {
    value.as_array().ok_or_else(|| invalid(format!("{what} must be an array")))
}

fn ring_from_json(value: &Value) -> Result<LineString<f64>, CodecError> {
    array(value, "ring")?.iter()
        .map(|pos| {
            let pos = array(pos, "position")?;
            match (pos.first().and_then(Value::as_f64), pos.get(1).and_then(Value::as_f64)) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(invalid("position needs two numbers")),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::from)
}

fn polygon_from_json(value: &Value) -> Result<Polygon<f64>, CodecError> {
    let mut rings = array(value, "polygon")?.iter()
        .map(ring_from_json)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

/// Parse a GeoJSON Polygon or MultiPolygon (optionally wrapped in a Feature).
pub fn from_value(value: &Value) -> Result<Shape, CodecError> {
    let kind = value.get("type").and_then(Value::as_str)
        .ok_or_else(|| invalid("missing \"type\""))?;
    match kind {
        "Feature" => from_value(value.get("geometry").ok_or_else(|| invalid("feature without geometry"))?),
        "Polygon" => {
            let coords = value.get("coordinates").ok_or_else(|| invalid("missing coordinates"))?;
            Ok(Shape::Polygon(polygon_from_json(coords)?))
        }
        "MultiPolygon" => {
            let coords = value.get("coordinates").ok_or_else(|| invalid("missing coordinates"))?;
            let parts = array(coords, "coordinates")?.iter()
                .map(polygon_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Shape::MultiPolygon(MultiPolygon::new(parts)))
        }
        other => Err(invalid(format!("unsupported geometry type {other:?}"))),
    }
}

/// Parse GeoJSON text.
pub fn decode(bytes: &[u8]) -> Result<Shape, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
    from_value(&value)
}

impl serde::Serialize for Shape {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&to_value(self), serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Shape {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        from_value(&value).map_err(serde::de::Error::custom)
    }
}
