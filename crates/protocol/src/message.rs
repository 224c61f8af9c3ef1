use foundation::Extent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use source::Feature;

use crate::draw::DrawEvent;
use crate::error::{ProtocolError, malformed};
use crate::render_id::RenderId;

/// Message posted by the host to an execution unit.
///
/// Wire form: `{"name": "update:view", "args": [renderId, extent4, matrix6]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum HostMessage {
    /// Full feature set; the unit rebuilds its own source.
    InitData(Vec<Feature>),
    /// Features replacing or extending the unit's copy.
    UpdateData(Vec<Feature>),
    UpdateView {
        render_id: RenderId,
        extent: Extent,
        matrix: [f64; 6],
    },
}

impl HostMessage {
    pub fn name(&self) -> &'static str {
        match self {
            HostMessage::InitData(_) => "init:data",
            HostMessage::UpdateData(_) => "update:data",
            HostMessage::UpdateView { .. } => "update:view",
        }
    }

    pub fn to_wire(&self) -> Value {
        let args = match self {
            HostMessage::InitData(features) | HostMessage::UpdateData(features) => json!([features]),
            HostMessage::UpdateView {
                render_id,
                extent,
                matrix,
            } => json!([render_id, extent, matrix]),
        };
        json!({ "name": self.name(), "args": args })
    }

    pub fn from_wire(value: &Value) -> Result<Self, ProtocolError> {
        let obj = value
            .as_object()
            .ok_or_else(|| malformed("host message must be an object"))?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("host message missing name"))?;
        let no_args = Vec::new();
        let args = match obj.get("args") {
            None | Some(Value::Null) => &no_args,
            Some(Value::Array(args)) => args,
            Some(_) => return Err(malformed("args must be an array")),
        };
        let arg = |i: usize, what: &str| {
            args.get(i)
                .cloned()
                .ok_or_else(|| malformed(format!("{name}: missing {what}")))
        };

        match name {
            "init:data" | "update:data" => {
                let features: Vec<Feature> = serde_json::from_value(arg(0, "features")?)
                    .map_err(|e| malformed(format!("{name}: features: {e}")))?;
                if name == "init:data" {
                    Ok(HostMessage::InitData(features))
                } else {
                    Ok(HostMessage::UpdateData(features))
                }
            }
            "update:view" => {
                let render_id = serde_json::from_value(arg(0, "render id")?)
                    .map_err(|e| malformed(format!("update:view: render id: {e}")))?;
                let extent = serde_json::from_value(arg(1, "extent")?)
                    .map_err(|e| malformed(format!("update:view: extent: {e}")))?;
                let matrix = serde_json::from_value(arg(2, "matrix")?)
                    .map_err(|e| malformed(format!("update:view: matrix: {e}")))?;
                Ok(HostMessage::UpdateView {
                    render_id,
                    extent,
                    matrix,
                })
            }
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }

    /// Parse raw JSON text as received from a transport.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        Self::from_wire(&value)
    }
}

impl TryFrom<Value> for HostMessage {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_wire(&value)
    }
}

impl From<HostMessage> for Value {
    fn from(msg: HostMessage) -> Self {
        msg.to_wire()
    }
}

/// Message emitted by an execution unit.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitMessage {
    /// `init:data` processed.
    DataInit,
    /// `update:data` processed.
    DataUpdate,
    /// Wire form: `[renderId, eventName, ...args]`.
    Draw { render_id: RenderId, event: DrawEvent },
    /// Every event of `render_id` has been emitted.
    FrameEnd { render_id: RenderId },
    /// Malformed message or program failure. `render_id` is set when the
    /// failure happened while serving a render request.
    Error {
        render_id: Option<RenderId>,
        payload: Value,
    },
}

impl UnitMessage {
    pub fn render_id(&self) -> Option<RenderId> {
        match self {
            UnitMessage::Draw { render_id, .. } | UnitMessage::FrameEnd { render_id } => Some(*render_id),
            UnitMessage::Error { render_id, .. } => *render_id,
            UnitMessage::DataInit | UnitMessage::DataUpdate => None,
        }
    }

    pub fn to_wire(&self) -> Value {
        match self {
            UnitMessage::DataInit => json!({ "eventName": "data:init" }),
            UnitMessage::DataUpdate => json!({ "eventName": "data:update" }),
            UnitMessage::Draw { render_id, event } => {
                let mut out = vec![json!(render_id), json!(event.name())];
                out.extend(event.args());
                Value::Array(out)
            }
            UnitMessage::FrameEnd { render_id } => {
                json!({ "eventName": "frame:end", "renderId": render_id })
            }
            UnitMessage::Error { render_id, payload } => match render_id {
                Some(id) => json!({ "eventName": "error", "renderId": id, "payload": payload }),
                None => json!({ "eventName": "error", "payload": payload }),
            },
        }
    }

    pub fn from_wire(value: &Value) -> Result<Self, ProtocolError> {
        if let Some(items) = value.as_array() {
            let (id, rest) = items
                .split_first()
                .ok_or_else(|| malformed("drawing event is empty"))?;
            let render_id: RenderId = serde_json::from_value(id.clone())
                .map_err(|e| malformed(format!("drawing event render id: {e}")))?;
            let (name, args) = rest
                .split_first()
                .ok_or_else(|| malformed("drawing event missing name"))?;
            let name = name
                .as_str()
                .ok_or_else(|| malformed("drawing event name must be a string"))?;
            let event = DrawEvent::from_args(name, args)?;
            return Ok(UnitMessage::Draw { render_id, event });
        }

        let obj = value
            .as_object()
            .ok_or_else(|| malformed("unit message must be an array or an object"))?;
        let name = obj
            .get("eventName")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("unit message missing eventName"))?;
        let render_id = match obj.get("renderId") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                serde_json::from_value::<RenderId>(v.clone())
                    .map_err(|e| malformed(format!("{name}: render id: {e}")))?,
            ),
        };

        match name {
            "data:init" => Ok(UnitMessage::DataInit),
            "data:update" => Ok(UnitMessage::DataUpdate),
            "frame:end" => Ok(UnitMessage::FrameEnd {
                render_id: render_id.ok_or_else(|| malformed("frame:end missing renderId"))?,
            }),
            "error" => Ok(UnitMessage::Error {
                render_id,
                payload: obj.get("payload").cloned().unwrap_or(Value::Null),
            }),
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HostMessage, UnitMessage};
    use crate::draw::{DrawEvent, PathOp};
    use crate::error::ProtocolError;
    use crate::render_id::RenderId;
    use foundation::{Extent, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use source::Feature;

    #[test]
    fn host_messages_use_name_and_args() {
        let msg = HostMessage::UpdateView {
            render_id: RenderId::new(1, 4),
            extent: Extent::new(0.0, 0.0, 10.0, 5.0),
            matrix: [1.0, 0.0, 0.0, -1.0, 5.0, 5.0],
        };
        let wire = msg.to_wire();
        assert_eq!(
            wire,
            json!({
                "name": "update:view",
                "args": ["1.4", [0.0, 0.0, 10.0, 5.0], [1.0, 0.0, 0.0, -1.0, 5.0, 5.0]]
            })
        );
        assert_eq!(HostMessage::from_wire(&wire).unwrap(), msg);

        let init = HostMessage::InitData(vec![Feature::new("a", Geometry::Point([1.0, 2.0]))]);
        let wire = init.to_wire();
        assert_eq!(wire["args"][0][0]["id"], "a");
        assert_eq!(serde_json::from_value::<HostMessage>(wire).unwrap(), init);
    }

    #[test]
    fn malformed_host_messages_are_errors() {
        assert!(matches!(HostMessage::parse("{not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            HostMessage::parse(r#"{"name": "update:world", "args": []}"#),
            Err(ProtocolError::UnknownMessage(_))
        ));
        assert!(matches!(
            HostMessage::parse(r#"{"name": "update:view", "args": ["1.1", [0, 0, 1, 1]]}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            HostMessage::parse(r#"{"name": "init:data", "args": [[{"id": "x"}]]}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn drawing_events_are_tagged_arrays() {
        let msg = UnitMessage::Draw {
            render_id: RenderId::new(0, 9),
            event: DrawEvent::Context(PathOp::LineTo([1.0, 2.0])),
        };
        assert_eq!(msg.to_wire(), json!(["0.9", "context", "lineTo", 1.0, 2.0]));
        assert_eq!(UnitMessage::from_wire(&msg.to_wire()).unwrap(), msg);
        assert_eq!(msg.render_id(), Some(RenderId::new(0, 9)));
    }

    #[test]
    fn control_events_round_trip() {
        let messages = vec![
            UnitMessage::DataInit,
            UnitMessage::DataUpdate,
            UnitMessage::FrameEnd {
                render_id: RenderId::new(2, 1),
            },
            UnitMessage::Error {
                render_id: None,
                payload: json!("boom"),
            },
            UnitMessage::Error {
                render_id: Some(RenderId::new(2, 2)),
                payload: json!({"feature": "a"}),
            },
        ];
        for msg in messages {
            assert_eq!(UnitMessage::from_wire(&msg.to_wire()).unwrap(), msg);
        }
        assert_eq!(UnitMessage::DataInit.to_wire(), json!({"eventName": "data:init"}));
    }
}
