use protocol::PathOp;
use serde::Serialize;
use serde_json::Value;

/// A 2D drawing target with canvas semantics. Coordinates reaching a surface
/// are already in pixels.
pub trait Surface {
    /// Erase everything painted so far.
    fn clear(&mut self);

    /// Set a graphics state property (`strokeStyle`, `lineWidth`, ...).
    fn set(&mut self, property: &str, value: &Value);

    fn apply(&mut self, op: &PathOp);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceOp {
    Clear,
    Set { property: String, value: Value },
    Path(PathOp),
}

/// Surface that records every call, for tests and for dumping a frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    /// Current `save` nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Ops recorded since the last `clear`.
    pub fn since_clear(&self) -> &[SurfaceOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn set(&mut self, property: &str, value: &Value) {
        self.ops.push(SurfaceOp::Set {
            property: property.to_string(),
            value: value.clone(),
        });
    }

    fn apply(&mut self, op: &PathOp) {
        match op {
            PathOp::Save => self.depth += 1,
            PathOp::Restore => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.ops.push(SurfaceOp::Path(*op));
    }
}
