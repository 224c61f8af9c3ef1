use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extent::Extent;

/// `[x, y]`, GeoJSON style.
pub type Position = [f64; 2];

/// A linear ring or line string.
pub type Ring = Vec<Position>;

/// Geometry variants supported by the renderer, GeoJSON shaped on the wire:
/// `{"type": "Polygon", "coordinates": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    /// Outer ring first, then holes.
    Polygon(Vec<Ring>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    NotAnObject,
    MissingType,
    UnsupportedType(String),
    InvalidCoordinates { kind: GeometryKind, reason: String },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NotAnObject => write!(f, "geometry must be an object"),
            GeometryError::MissingType => write!(f, "geometry missing type"),
            GeometryError::UnsupportedType(ty) => write!(f, "unsupported geometry type: {ty}"),
            GeometryError::InvalidCoordinates { kind, reason } => {
                write!(f, "invalid {kind:?} coordinates: {reason}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Anything with a bounding box.
pub trait Bounded {
    /// `None` when there is nothing to bound (no coordinates).
    fn extent(&self) -> Option<Extent>;
}

impl Bounded for [Position] {
    fn extent(&self) -> Option<Extent> {
        Extent::from_positions(self)
    }
}

impl Bounded for Geometry {
    fn extent(&self) -> Option<Extent> {
        match self {
            Geometry::Point(p) => Some(Extent::from_point(*p)),
            Geometry::LineString(line) => line.as_slice().extent(),
            Geometry::Polygon(rings) => Extent::from_positions(rings.iter().flatten()),
        }
    }
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
        }
    }

    /// Build from a GeoJSON geometry object, or from a feature object carrying
    /// a `geometry` member.
    pub fn from_geojson(value: &Value) -> Result<Self, GeometryError> {
        let obj = value.as_object().ok_or(GeometryError::NotAnObject)?;
        if let Some(inner) = obj.get("geometry") {
            return Self::from_geojson(inner);
        }
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeometryError::MissingType)?;
        let coords = obj.get("coordinates").unwrap_or(&Value::Null);

        match ty {
            "Point" => parse_position(coords)
                .map(Geometry::Point)
                .map_err(|reason| invalid(GeometryKind::Point, reason)),
            "LineString" => parse_positions(coords)
                .map(Geometry::LineString)
                .map_err(|reason| invalid(GeometryKind::LineString, reason)),
            "Polygon" => parse_rings(coords)
                .map(Geometry::Polygon)
                .map_err(|reason| invalid(GeometryKind::Polygon, reason)),
            other => Err(GeometryError::UnsupportedType(other.to_string())),
        }
    }

    pub fn to_geojson(&self) -> Value {
        serde_json::json!({
            "type": self.type_name(),
            "coordinates": match self {
                Geometry::Point(p) => serde_json::json!(p),
                Geometry::LineString(line) => serde_json::json!(line),
                Geometry::Polygon(rings) => serde_json::json!(rings),
            },
        })
    }

    /// Append a vertex to a line string. Other variants are left untouched and
    /// `false` is returned.
    pub fn append_coordinate(&mut self, p: Position) -> bool {
        match self {
            Geometry::LineString(line) => {
                line.push(p);
                true
            }
            _ => false,
        }
    }
}

fn invalid(kind: GeometryKind, reason: String) -> GeometryError {
    GeometryError::InvalidCoordinates { kind, reason }
}

fn parse_position(value: &Value) -> Result<Position, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| "position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [x, y]".to_string());
    }
    let x = arr[0].as_f64().ok_or_else(|| "x must be a number".to_string())?;
    let y = arr[1].as_f64().ok_or_else(|| "y must be a number".to_string())?;
    Ok([x, y])
}

fn parse_positions(value: &Value) -> Result<Vec<Position>, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| "coordinates must be an array".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_rings(value: &Value) -> Result<Vec<Ring>, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| "polygon coordinates must be an array of rings".to_string())?;
    arr.iter().map(parse_positions).collect()
}

#[cfg(test)]
mod tests {
    use super::{Bounded, Geometry, GeometryError, GeometryKind};
    use crate::extent::Extent;
    use serde_json::json;

    #[test]
    fn parses_geojson_geometries() {
        let g = Geometry::from_geojson(&json!({"type": "Point", "coordinates": [1.0, 2.0]})).unwrap();
        assert_eq!(g, Geometry::Point([1.0, 2.0]));

        let feature = json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [3, 4]]},
        });
        let g = Geometry::from_geojson(&feature).unwrap();
        assert_eq!(g, Geometry::LineString(vec![[0.0, 0.0], [3.0, 4.0]]));
        assert_eq!(g.kind(), GeometryKind::LineString);
    }

    #[test]
    fn rejects_unknown_shapes() {
        let err = Geometry::from_geojson(&json!({"type": "Torus", "coordinates": []})).unwrap_err();
        assert_eq!(err, GeometryError::UnsupportedType("Torus".to_string()));

        let err = Geometry::from_geojson(&json!({"coordinates": []})).unwrap_err();
        assert_eq!(err, GeometryError::MissingType);

        let err = Geometry::from_geojson(&json!({"type": "Point", "coordinates": ["a", 1]}))
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidCoordinates {
                kind: GeometryKind::Point,
                ..
            }
        ));
    }

    #[test]
    fn extent_covers_all_rings() {
        let g = Geometry::Polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 0.0]],
            vec![[-1.0, 2.0], [1.0, 7.0], [2.0, 2.0]],
        ]);
        assert_eq!(g.extent(), Some(Extent::new(-1.0, 0.0, 10.0, 7.0)));
        assert_eq!(Geometry::LineString(vec![]).extent(), None);
    }

    #[test]
    fn serde_shape_matches_geojson() {
        let g = Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]);
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(v, g.to_geojson());
        assert_eq!(v["type"], "Polygon");
        let back: Geometry = serde_json::from_value(v).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn append_coordinate_only_extends_lines() {
        let mut line = Geometry::LineString(vec![[0.0, 0.0]]);
        assert!(line.append_coordinate([1.0, 1.0]));
        assert_eq!(line, Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]));

        let mut point = Geometry::Point([0.0, 0.0]);
        assert!(!point.append_coordinate([1.0, 1.0]));
    }
}
