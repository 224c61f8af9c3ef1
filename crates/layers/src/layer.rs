use foundation::ProjectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use source::StyleDefaults;
use text::AutoSizeConfig;

use crate::program::ProgramKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl Default for LayerId {
    fn default() -> Self {
        Self("layer".to_string())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-layer rendering configuration, usually read from JSON:
///
/// ```json
/// {"id": "parcels", "program": "hatch", "style": {"strokeStyle": "#333"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub id: LayerId,
    pub visible: bool,
    pub program: ProgramKind,
    /// Plane the view is laid out in. Features are stored unprojected.
    pub projection: ProjectionKind,
    /// Defaults merged under every feature's `properties.style`.
    pub style: Map<String, Value>,
    /// Defaults merged under every feature's `properties.params`.
    pub params: Map<String, Value>,
    pub autosize: AutoSizeConfig,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            id: LayerId::default(),
            visible: true,
            program: ProgramKind::default(),
            projection: ProjectionKind::default(),
            style: Map::new(),
            params: Map::new(),
            autosize: AutoSizeConfig::default(),
        }
    }
}

impl LayerConfig {
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn defaults(&self) -> StyleDefaults {
        StyleDefaults {
            style: self.style.clone(),
            params: self.params.clone(),
        }
    }
}
