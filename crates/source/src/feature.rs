use foundation::{Bounded, Extent, Geometry, GeometryError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature identity. Numeric ids found in GeoJSON are kept as their decimal
/// string so lookups never depend on the source number type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct FeatureId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
    Float(f64),
}

impl From<RawId> for FeatureId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => FeatureId(s),
            RawId::Int(i) => FeatureId(i.to_string()),
            RawId::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => FeatureId(format!("{}", f as i64)),
            RawId::Float(f) => FeatureId(f.to_string()),
        }
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId(s.to_string())
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A geometry plus free-form properties. `properties.style` and
/// `properties.params` are the objects render programs read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Layer-level `style` and `params` merged under every feature before it is
/// handed to a channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDefaults {
    pub style: Map<String, Value>,
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    NotAnObject,
    MissingId,
    Geometry(GeometryError),
    Properties(String),
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::NotAnObject => write!(f, "feature must be an object"),
            FeatureError::MissingId => write!(f, "feature missing id"),
            FeatureError::Geometry(e) => write!(f, "feature geometry: {e}"),
            FeatureError::Properties(msg) => write!(f, "feature properties: {msg}"),
        }
    }
}

impl std::error::Error for FeatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeatureError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for FeatureError {
    fn from(e: GeometryError) -> Self {
        FeatureError::Geometry(e)
    }
}

impl Bounded for Feature {
    fn extent(&self) -> Option<Extent> {
        self.geometry.extent()
    }
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Parse a GeoJSON feature object. An `id` is required, either top-level
    /// or as `properties.id`.
    pub fn from_geojson(value: &Value) -> Result<Self, FeatureError> {
        Self::parse(value, None)
    }

    fn parse(value: &Value, fallback_id: Option<FeatureId>) -> Result<Self, FeatureError> {
        let obj = value.as_object().ok_or(FeatureError::NotAnObject)?;
        let properties = match obj.get("properties") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => return Err(FeatureError::Properties("must be an object".to_string())),
        };
        let raw_id = obj.get("id").or_else(|| properties.get("id"));
        let id = match raw_id {
            Some(v) => serde_json::from_value::<FeatureId>(v.clone()).map_err(|_| FeatureError::MissingId)?,
            None => fallback_id.ok_or(FeatureError::MissingId)?,
        };
        let geometry = Geometry::from_geojson(obj.get("geometry").unwrap_or(&Value::Null))?;
        Ok(Self {
            id,
            geometry,
            properties,
        })
    }

    pub fn style(&self) -> Option<&Map<String, Value>> {
        self.properties.get("style").and_then(Value::as_object)
    }

    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.properties.get("params").and_then(Value::as_object)
    }

    /// Copy of this feature with `style` and `params` shallow-merged over the
    /// defaults. Keys present on the feature win.
    pub fn with_defaults(&self, defaults: &StyleDefaults) -> Feature {
        let mut out = self.clone();
        for (key, base) in [("style", &defaults.style), ("params", &defaults.params)] {
            if base.is_empty() {
                continue;
            }
            let mut merged = base.clone();
            if let Some(own) = self.properties.get(key).and_then(Value::as_object) {
                for (k, v) in own {
                    merged.insert(k.clone(), v.clone());
                }
            }
            out.properties.insert(key.to_string(), Value::Object(merged));
        }
        out
    }

    pub fn to_geojson(&self) -> Value {
        serde_json::json!({
            "type": "Feature",
            "id": self.id.0,
            "geometry": self.geometry.to_geojson(),
            "properties": self.properties,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionError {
    Json(String),
    NotACollection,
    Feature { index: usize, source: FeatureError },
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionError::Json(msg) => write!(f, "invalid json: {msg}"),
            CollectionError::NotACollection => {
                write!(f, "expected a FeatureCollection, a Feature or an array of features")
            }
            CollectionError::Feature { index, source } => write!(f, "feature #{index}: {source}"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// An ordered list of features as read from GeoJSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Accepts a `FeatureCollection`, a single `Feature`, or a bare array of
    /// features. Features without an id get their position as id.
    pub fn from_geojson_str(input: &str) -> Result<Self, CollectionError> {
        let value: Value = serde_json::from_str(input).map_err(|e| CollectionError::Json(e.to_string()))?;
        Self::from_geojson(&value)
    }

    pub fn from_geojson(value: &Value) -> Result<Self, CollectionError> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("FeatureCollection") => obj
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or(CollectionError::NotACollection)?
                    .iter()
                    .collect(),
                Some("Feature") => vec![value],
                _ => return Err(CollectionError::NotACollection),
            },
            _ => return Err(CollectionError::NotACollection),
        };

        let features = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Feature::parse(item, Some(FeatureId(index.to_string())))
                    .map_err(|source| CollectionError::Feature { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features as sent over a channel: defaults merged, GeoJSON shaped.
    pub fn to_wire(&self, defaults: &StyleDefaults) -> Vec<Feature> {
        self.features.iter().map(|f| f.with_defaults(defaults)).collect()
    }
}
