// src/datatypes/values.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Earth's mean radius in meters (the unit `point.distance` reports for WGS-84)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Runtime value bound to a query parameter or used as a schema constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Point(Point),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Duration(chrono::Duration),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int64(_) => "integer",
            Value::Float64(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Point(_) => "point",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Duration(_) => "duration",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// ============================================================================
// Points
// ============================================================================

/// A spatial point. `srid` follows the graph database's coordinate reference
/// system identifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub srid: u32,
}

impl Point {
    pub const WGS84_2D: u32 = 4326;
    pub const WGS84_3D: u32 = 4979;
    pub const CARTESIAN_2D: u32 = 7203;
    pub const CARTESIAN_3D: u32 = 9157;

    pub fn geographic(longitude: f64, latitude: f64) -> Self {
        Point {
            x: longitude,
            y: latitude,
            z: None,
            srid: Self::WGS84_2D,
        }
    }

    pub fn cartesian(x: f64, y: f64) -> Self {
        Point {
            x,
            y,
            z: None,
            srid: Self::CARTESIAN_2D,
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.srid == Self::WGS84_2D || self.srid == Self::WGS84_3D
    }

    /// Build a point from the map shape accepted by Cypher's `point()`:
    /// `{longitude, latitude[, height]}` or `{x, y[, z]}`.
    pub fn from_map(map: &BTreeMap<String, Value>) -> Option<Point> {
        let get = |key: &str| map.get(key).and_then(Value::as_f64);
        if let (Some(lon), Some(lat)) = (get("longitude"), get("latitude")) {
            let height = get("height");
            return Some(Point {
                x: lon,
                y: lat,
                z: height,
                srid: if height.is_some() {
                    Self::WGS84_3D
                } else {
                    Self::WGS84_2D
                },
            });
        }
        if let (Some(x), Some(y)) = (get("x"), get("y")) {
            let z = get("z");
            return Some(Point {
                x,
                y,
                z,
                srid: if z.is_some() {
                    Self::CARTESIAN_3D
                } else {
                    Self::CARTESIAN_2D
                },
            });
        }
        None
    }

    /// Distance between two points of the same reference system: haversine
    /// meters for geographic points, euclidean otherwise.
    pub fn distance(&self, other: &Point) -> Option<f64> {
        if self.is_geographic() != other.is_geographic() {
            return None;
        }
        if self.is_geographic() {
            let lat1 = self.y.to_radians();
            let lat2 = other.y.to_radians();
            let delta_lat = (other.y - self.y).to_radians();
            let delta_lon = (other.x - self.x).to_radians();
            let a = (delta_lat / 2.0).sin().powi(2)
                + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
            Some(EARTH_RADIUS_M * 2.0 * a.sqrt().asin())
        } else {
            let dz = match (self.z, other.z) {
                (Some(a), Some(b)) => b - a,
                _ => 0.0,
            };
            let dx = other.x - self.x;
            let dy = other.y - self.y;
            Some((dx * dx + dy * dy + dz * dz).sqrt())
        }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.is_geographic() {
            map.serialize_entry("longitude", &self.x)?;
            map.serialize_entry("latitude", &self.y)?;
            if let Some(z) = self.z {
                map.serialize_entry("height", &z)?;
            }
        } else {
            map.serialize_entry("x", &self.x)?;
            map.serialize_entry("y", &self.y)?;
            if let Some(z) = self.z {
                map.serialize_entry("z", &z)?;
            }
        }
        map.serialize_entry("srid", &self.srid)?;
        map.end()
    }
}

// ============================================================================
// Serialization (driver-facing parameter encoding)
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int64(i) => serializer.serialize_i64(*i),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Point(p) => p.serialize(serializer),
            Value::DateTime(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::Duration(d) => serializer.serialize_str(&format_duration(d)),
        }
    }
}

/// ISO-8601 rendering of a duration in seconds form (`PT90S`, `-PT1.5S`).
pub fn format_duration(d: &chrono::Duration) -> String {
    let negative = *d < chrono::Duration::zero();
    let abs = if negative { -*d } else { *d };
    let secs = abs.num_seconds();
    let nanos = (abs - chrono::Duration::seconds(secs))
        .num_nanoseconds()
        .unwrap_or(0);
    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        format!("{}PT{}S", sign, secs)
    } else {
        let frac = format!("{:09}", nanos);
        format!("{}PT{}.{}S", sign, secs, frac.trim_end_matches('0'))
    }
}
