use foundation::{Position, Ring, Transform};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ProtocolError, malformed};

/// A single raw path or paint operation, canvas style.
///
/// Wire form is a flat array: `["moveTo", x, y]`, `["transform", a, b, c, d, e, f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum PathOp {
    Save,
    Restore,
    /// Multiply the surface transform by `[a, b, c, d, e, f]`.
    Transform([f64; 6]),
    BeginPath,
    MoveTo(Position),
    LineTo(Position),
    BezierCurveTo(Position, Position, Position),
    QuadraticCurveTo(Position, Position),
    ClosePath,
    Stroke,
    Fill,
    Clip,
}

impl PathOp {
    pub fn name(&self) -> &'static str {
        match self {
            PathOp::Save => "save",
            PathOp::Restore => "restore",
            PathOp::Transform(_) => "transform",
            PathOp::BeginPath => "beginPath",
            PathOp::MoveTo(_) => "moveTo",
            PathOp::LineTo(_) => "lineTo",
            PathOp::BezierCurveTo(..) => "bezierCurveTo",
            PathOp::QuadraticCurveTo(..) => "quadraticCurveTo",
            PathOp::ClosePath => "closePath",
            PathOp::Stroke => "stroke",
            PathOp::Fill => "fill",
            PathOp::Clip => "clip",
        }
    }

    fn numbers(&self) -> Vec<f64> {
        match *self {
            PathOp::Transform(m) => m.to_vec(),
            PathOp::MoveTo(p) | PathOp::LineTo(p) => p.to_vec(),
            PathOp::BezierCurveTo(c1, c2, p) => vec![c1[0], c1[1], c2[0], c2[1], p[0], p[1]],
            PathOp::QuadraticCurveTo(c, p) => vec![c[0], c[1], p[0], p[1]],
            _ => Vec::new(),
        }
    }

    /// Same op with every coordinate mapped through `t`. `Transform` ops are
    /// returned unchanged.
    pub fn map(&self, t: &Transform) -> PathOp {
        match *self {
            PathOp::MoveTo(p) => PathOp::MoveTo(t.map_vec2(p)),
            PathOp::LineTo(p) => PathOp::LineTo(t.map_vec2(p)),
            PathOp::BezierCurveTo(c1, c2, p) => {
                PathOp::BezierCurveTo(t.map_vec2(c1), t.map_vec2(c2), t.map_vec2(p))
            }
            PathOp::QuadraticCurveTo(c, p) => PathOp::QuadraticCurveTo(t.map_vec2(c), t.map_vec2(p)),
            other => other,
        }
    }

    /// `[name, ...numbers]` items appended to `out`.
    fn push_wire(&self, out: &mut Vec<Value>) {
        out.push(Value::from(self.name()));
        out.extend(self.numbers().into_iter().map(Value::from));
    }

    pub fn to_wire(&self) -> Value {
        let mut out = Vec::new();
        self.push_wire(&mut out);
        Value::Array(out)
    }

    pub fn from_wire(value: &Value) -> Result<Self, ProtocolError> {
        let items = value
            .as_array()
            .ok_or_else(|| malformed("path op must be an array"))?;
        Self::from_items(items)
    }

    fn from_items(items: &[Value]) -> Result<Self, ProtocolError> {
        let (name, args) = items
            .split_first()
            .ok_or_else(|| malformed("path op is empty"))?;
        let name = name
            .as_str()
            .ok_or_else(|| malformed("path op name must be a string"))?;
        let n = args
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| malformed(format!("{name}: arguments must be numbers")))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let need = |count: usize| {
            if n.len() < count {
                Err(malformed(format!("{name} expects {count} arguments, got {}", n.len())))
            } else {
                Ok(())
            }
        };

        let op = match name {
            "save" => PathOp::Save,
            "restore" => PathOp::Restore,
            "transform" => {
                need(6)?;
                PathOp::Transform([n[0], n[1], n[2], n[3], n[4], n[5]])
            }
            "beginPath" => PathOp::BeginPath,
            "moveTo" => {
                need(2)?;
                PathOp::MoveTo([n[0], n[1]])
            }
            "lineTo" => {
                need(2)?;
                PathOp::LineTo([n[0], n[1]])
            }
            "bezierCurveTo" => {
                need(6)?;
                PathOp::BezierCurveTo([n[0], n[1]], [n[2], n[3]], [n[4], n[5]])
            }
            "quadraticCurveTo" => {
                need(4)?;
                PathOp::QuadraticCurveTo([n[0], n[1]], [n[2], n[3]])
            }
            "closePath" => PathOp::ClosePath,
            "stroke" => PathOp::Stroke,
            "fill" => PathOp::Fill,
            "clip" => PathOp::Clip,
            other => return Err(ProtocolError::UnknownOp(other.to_string())),
        };
        Ok(op)
    }
}

impl TryFrom<Value> for PathOp {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_wire(&value)
    }
}

impl From<PathOp> for Value {
    fn from(op: PathOp) -> Self {
        op.to_wire()
    }
}

/// Terminal operations applied after a polygon path is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathEnd {
    ClosePath,
    Stroke,
    Fill,
    Clip,
}

impl PathEnd {
    /// Used when a polygon command carries no explicit ends.
    pub const DEFAULT: [PathEnd; 3] = [PathEnd::ClosePath, PathEnd::Stroke, PathEnd::Fill];

    pub fn as_op(self) -> PathOp {
        match self {
            PathEnd::ClosePath => PathOp::ClosePath,
            PathEnd::Stroke => PathOp::Stroke,
            PathEnd::Fill => PathOp::Fill,
            PathEnd::Clip => PathOp::Clip,
        }
    }
}

/// Semantic shapes, in geographic coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Polygon {
        coordinates: Vec<Ring>,
        ends: Option<Vec<PathEnd>>,
    },
    Line {
        coordinates: Vec<Position>,
    },
    Raw(PathOp),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipCommand {
    Begin(Vec<Ring>),
    End,
}

/// One drawing instruction as emitted by a render program.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Draw(DrawCommand),
    /// Graphics state property, e.g. `strokeStyle` or `lineWidth`.
    Set { property: String, value: Value },
    Clip(ClipCommand),
    /// A single raw op with unmapped coordinates.
    Context(PathOp),
    /// A batch of raw ops applied verbatim (glyph outlines).
    Instructions(Vec<PathOp>),
}

impl DrawEvent {
    pub fn set(property: impl Into<String>, value: impl Into<Value>) -> Self {
        DrawEvent::Set {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn polygon(coordinates: Vec<Ring>) -> Self {
        DrawEvent::Draw(DrawCommand::Polygon {
            coordinates,
            ends: None,
        })
    }

    pub fn line(coordinates: Vec<Position>) -> Self {
        DrawEvent::Draw(DrawCommand::Line { coordinates })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DrawEvent::Draw(_) => "draw",
            DrawEvent::Set { .. } => "set",
            DrawEvent::Clip(_) => "clip",
            DrawEvent::Context(_) => "context",
            DrawEvent::Instructions(_) => "instructions",
        }
    }

    /// Arguments following the event name on the wire.
    pub fn args(&self) -> Vec<Value> {
        match self {
            DrawEvent::Draw(DrawCommand::Polygon { coordinates, ends }) => {
                let mut out = vec![json!("polygon"), json!(coordinates)];
                if let Some(ends) = ends {
                    out.push(json!(ends));
                }
                out
            }
            DrawEvent::Draw(DrawCommand::Line { coordinates }) => vec![json!("line"), json!(coordinates)],
            DrawEvent::Draw(DrawCommand::Raw(op)) | DrawEvent::Context(op) => {
                let mut out = Vec::new();
                op.push_wire(&mut out);
                out
            }
            DrawEvent::Set { property, value } => vec![json!(property), value.clone()],
            DrawEvent::Clip(ClipCommand::Begin(coordinates)) => vec![json!("begin"), json!(coordinates)],
            DrawEvent::Clip(ClipCommand::End) => vec![json!("end")],
            DrawEvent::Instructions(ops) => {
                vec![Value::Array(ops.iter().map(PathOp::to_wire).collect())]
            }
        }
    }

    pub fn from_args(name: &str, args: &[Value]) -> Result<Self, ProtocolError> {
        let first_str = || {
            args.first()
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("{name}: first argument must be a string")))
        };
        match name {
            "draw" => match first_str()? {
                "polygon" => Ok(DrawEvent::Draw(DrawCommand::Polygon {
                    coordinates: decode(args.get(1), "polygon coordinates")?,
                    ends: match args.get(2) {
                        Some(v) if !v.is_null() => Some(decode(Some(v), "polygon ends")?),
                        _ => None,
                    },
                })),
                "line" => Ok(DrawEvent::Draw(DrawCommand::Line {
                    coordinates: decode(args.get(1), "line coordinates")?,
                })),
                _ => Ok(DrawEvent::Draw(DrawCommand::Raw(PathOp::from_items(args)?))),
            },
            "set" => Ok(DrawEvent::Set {
                property: first_str()?.to_string(),
                value: args.get(1).cloned().unwrap_or(Value::Null),
            }),
            "clip" => match first_str()? {
                "begin" => Ok(DrawEvent::Clip(ClipCommand::Begin(decode(
                    args.get(1),
                    "clip coordinates",
                )?))),
                "end" => Ok(DrawEvent::Clip(ClipCommand::End)),
                other => Err(malformed(format!("unknown clip command {other:?}"))),
            },
            "context" => Ok(DrawEvent::Context(PathOp::from_items(args)?)),
            "instructions" => {
                let ops = args
                    .first()
                    .and_then(Value::as_array)
                    .ok_or_else(|| malformed("instructions: expected an array of ops"))?;
                Ok(DrawEvent::Instructions(
                    ops.iter().map(PathOp::from_wire).collect::<Result<_, _>>()?,
                ))
            }
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Option<&Value>, what: &str) -> Result<T, ProtocolError> {
    let value = value.ok_or_else(|| malformed(format!("missing {what}")))?;
    serde_json::from_value(value.clone()).map_err(|e| malformed(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::{ClipCommand, DrawCommand, DrawEvent, PathEnd, PathOp};
    use foundation::Transform;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn path_ops_use_flat_wire_arrays() {
        let op = PathOp::BezierCurveTo([1.0, 2.0], [3.0, 4.0], [5.0, 6.0]);
        assert_eq!(op.to_wire(), json!(["bezierCurveTo", 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        assert_eq!(PathOp::from_wire(&json!(["lineTo", 3, 4])).unwrap(), PathOp::LineTo([3.0, 4.0]));
        assert_eq!(PathOp::from_wire(&json!(["fill"])).unwrap(), PathOp::Fill);
        assert!(PathOp::from_wire(&json!(["moveTo", 1])).is_err());
        assert!(PathOp::from_wire(&json!(["arcTo", 1, 2])).is_err());
    }

    #[test]
    fn map_moves_coordinates_only() {
        let mut t = Transform::new();
        t.translate(10.0, 0.0);
        assert_eq!(PathOp::MoveTo([1.0, 1.0]).map(&t), PathOp::MoveTo([11.0, 1.0]));
        assert_eq!(
            PathOp::QuadraticCurveTo([0.0, 0.0], [1.0, 0.0]).map(&t),
            PathOp::QuadraticCurveTo([10.0, 0.0], [11.0, 0.0])
        );
        assert_eq!(PathOp::Transform([1.0; 6]).map(&t), PathOp::Transform([1.0; 6]));
    }

    #[test]
    fn events_survive_the_wire() {
        let events = vec![
            DrawEvent::Draw(DrawCommand::Polygon {
                coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]],
                ends: Some(vec![PathEnd::ClosePath, PathEnd::Stroke]),
            }),
            DrawEvent::line(vec![[0.0, 0.0], [2.0, 2.0]]),
            DrawEvent::Draw(DrawCommand::Raw(PathOp::Stroke)),
            DrawEvent::set("lineWidth", 2.5),
            DrawEvent::Clip(ClipCommand::Begin(vec![vec![[0.0, 0.0], [1.0, 1.0]]])),
            DrawEvent::Clip(ClipCommand::End),
            DrawEvent::Context(PathOp::MoveTo([4.0, 5.0])),
            DrawEvent::Instructions(vec![PathOp::BeginPath, PathOp::LineTo([1.0, 2.0]), PathOp::Fill]),
        ];
        for event in events {
            let back = DrawEvent::from_args(event.name(), &event.args()).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn polygon_args_match_canvas_protocol() {
        let e = DrawEvent::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0]]]);
        assert_eq!(e.args(), vec![json!("polygon"), json!([[[0.0, 0.0], [1.0, 0.0]]])]);
        assert_eq!(
            DrawEvent::set("strokeStyle", "red").args(),
            vec![json!("strokeStyle"), json!("red")]
        );
    }

    #[test]
    fn rejects_unknown_events() {
        assert!(DrawEvent::from_args("explode", &[]).is_err());
        assert!(DrawEvent::from_args("clip", &[json!("sideways")]).is_err());
        assert!(DrawEvent::from_args("draw", &[json!("polygon"), json!("nope")]).is_err());
    }
}
