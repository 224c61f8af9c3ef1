use std::sync::Arc;

use foundation::{Geometry, Position, Projection, ProjectionKind, Ring, Transform};
use protocol::{DrawEvent, PathOp};
use serde::{Deserialize, Serialize};
use source::{Feature, FeatureId};
use text::{BoxFont, Font, Hyphenator, NoHyphenation, TextLayout};

use crate::hatch::Hatch;
use crate::label::Label;
use crate::outline::Outline;
use crate::symbology::process_style;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgramError {
    /// A polygon without rings or a line without vertices.
    EmptyGeometry { feature: FeatureId },
    /// A param exists but has the wrong type.
    InvalidParam {
        feature: FeatureId,
        key: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::EmptyGeometry { feature } => write!(f, "feature {feature}: empty geometry"),
            ProgramError::InvalidParam { feature, key, expected } => {
                write!(f, "feature {feature}: param {key} must be {expected}")
            }
        }
    }
}

impl std::error::Error for ProgramError {}

/// Fonts, hyphenation and layout shared by every render of a unit.
#[derive(Clone)]
pub struct TextResources {
    pub font: Arc<dyn Font>,
    pub hyphenator: Arc<dyn Hyphenator>,
    pub layout: TextLayout,
}

impl TextResources {
    pub fn new(font: Arc<dyn Font>, hyphenator: Arc<dyn Hyphenator>, layout: TextLayout) -> Self {
        Self {
            font,
            hyphenator,
            layout,
        }
    }
}

impl Default for TextResources {
    fn default() -> Self {
        Self::new(Arc::new(BoxFont), Arc::new(NoHyphenation), TextLayout::default())
    }
}

impl std::fmt::Debug for TextResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextResources")
            .field("units_per_em", &self.font.units_per_em())
            .field("layout", &self.layout)
            .finish()
    }
}

/// Everything a program sees while rendering one request: the view matrix,
/// the projection, text resources and the event sink.
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub transform: Transform,
    pub projection: ProjectionKind,
    pub text: &'a TextResources,
    events: Vec<DrawEvent>,
}

impl<'a> RenderContext<'a> {
    pub fn new(transform: Transform, projection: ProjectionKind, text: &'a TextResources) -> Self {
        Self {
            transform,
            projection,
            text,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: DrawEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DrawEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop everything emitted since the last `take_events`.
    pub fn discard(&mut self) {
        self.events.clear();
    }

    /// Length in view units of one pixel along x.
    pub fn pixel_size(&self) -> f64 {
        let sx = self.transform.get_scale()[0].abs();
        if sx > 0.0 { 1.0 / sx } else { 1.0 }
    }

    pub fn project_line(&self, coordinates: &[Position]) -> Vec<Position> {
        coordinates.iter().map(|p| self.projection.forward(*p)).collect()
    }

    pub fn project_rings(&self, rings: &[Ring]) -> Vec<Ring> {
        rings.iter().map(|ring| self.project_line(ring)).collect()
    }
}

/// A rendering strategy. Coordinates handed to the hooks are already
/// projected; events carrying shapes stay in projected units and are mapped
/// to pixels by the painter.
pub trait Program: Send + Sync {
    fn name(&self) -> &'static str;

    fn point(&self, _ctx: &mut RenderContext<'_>, _position: Position, _feature: &Feature) -> Result<(), ProgramError> {
        Ok(())
    }

    fn line_string(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Position>, feature: &Feature) -> Result<(), ProgramError>;

    fn polygon(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Ring>, feature: &Feature) -> Result<(), ProgramError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    #[default]
    Outline,
    Hatch,
    Label,
}

static OUTLINE: Outline = Outline;
static HATCH: Hatch = Hatch;
static LABEL: Label = Label;

impl ProgramKind {
    pub fn program(self) -> &'static dyn Program {
        match self {
            ProgramKind::Outline => &OUTLINE,
            ProgramKind::Hatch => &HATCH,
            ProgramKind::Label => &LABEL,
        }
    }
}

/// Style, then the geometry hook, then `restore`. On error the events of
/// this feature are discarded.
pub fn render_feature(program: &dyn Program, feature: &Feature, ctx: &mut RenderContext<'_>) -> Result<(), ProgramError> {
    let start = ctx.events.len();
    process_style(feature, ctx);
    let result = match &feature.geometry {
        Geometry::Point(p) => {
            let p = ctx.projection.forward(*p);
            program.point(ctx, p, feature)
        }
        Geometry::LineString(line) => {
            if line.is_empty() {
                Err(ProgramError::EmptyGeometry {
                    feature: feature.id.clone(),
                })
            } else {
                let line = ctx.project_line(line);
                program.line_string(ctx, line, feature)
            }
        }
        Geometry::Polygon(rings) => {
            if rings.iter().all(Vec::is_empty) {
                Err(ProgramError::EmptyGeometry {
                    feature: feature.id.clone(),
                })
            } else {
                let rings = ctx.project_rings(rings);
                program.polygon(ctx, rings, feature)
            }
        }
    };
    match result {
        Ok(()) => {
            ctx.emit(DrawEvent::Context(PathOp::Restore));
            Ok(())
        }
        Err(e) => {
            ctx.events.truncate(start);
            Err(e)
        }
    }
}
