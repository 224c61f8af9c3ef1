use std::path::Path;
use std::sync::Arc;

use protocol::PathOp;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

/// One glyph in font units (y up, origin on the baseline).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub id: u16,
    pub advance: f64,
    pub outline: Vec<PathOp>,
}

/// Glyph source used by the text engine.
pub trait Font: Send + Sync {
    fn units_per_em(&self) -> f64;

    /// Glyph for `c`; characters the font lacks map to its fallback glyph.
    fn glyph(&self, c: char) -> Glyph;

    /// Sum of advances in font units.
    fn advance(&self, s: &str) -> f64 {
        s.chars().map(|c| self.glyph(c).advance).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FontError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontError::Io(msg) => write!(f, "font io: {msg}"),
            FontError::Parse(msg) => write!(f, "font parse: {msg}"),
        }
    }
}

impl std::error::Error for FontError {}

/// TrueType/OpenType font read with `ttf-parser`.
#[derive(Debug, Clone)]
pub struct TtfFont {
    data: Arc<Vec<u8>>,
    units_per_em: f64,
}

impl TtfFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let face = Face::parse(&data, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let units_per_em = f64::from(face.units_per_em());
        Ok(Self {
            data: Arc::new(data),
            units_per_em,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FontError::Io(format!("{}: {e}", path.display())))?;
        Self::from_bytes(data)
    }
}

impl Font for TtfFont {
    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn glyph(&self, c: char) -> Glyph {
        // Bytes were validated in `from_bytes`.
        let Ok(face) = Face::parse(&self.data, 0) else {
            return Glyph::default();
        };
        let id = face.glyph_index(c).unwrap_or(GlyphId(0));
        let advance = face.glyph_hor_advance(id).map(f64::from).unwrap_or(0.0);
        let mut collector = OutlineCollector::default();
        face.outline_glyph(id, &mut collector);
        Glyph {
            id: id.0,
            advance,
            outline: collector.ops,
        }
    }
}

#[derive(Default)]
struct OutlineCollector {
    ops: Vec<PathOp>,
}

impl OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.ops.push(PathOp::MoveTo([x.into(), y.into()]));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.ops.push(PathOp::LineTo([x.into(), y.into()]));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.ops
            .push(PathOp::QuadraticCurveTo([x1.into(), y1.into()], [x.into(), y.into()]));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.ops.push(PathOp::BezierCurveTo(
            [x1.into(), y1.into()],
            [x2.into(), y2.into()],
            [x.into(), y.into()],
        ));
    }

    fn close(&mut self) {
        self.ops.push(PathOp::ClosePath);
    }
}

/// Draws every visible character as a filled box.
///
/// Used when no font file is configured. Metrics: 1000 units per em, 600
/// units advance, 300 for whitespace, boxes 500 wide and 700 tall.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxFont;

impl BoxFont {
    pub const UNITS_PER_EM: f64 = 1000.0;
    pub const ADVANCE: f64 = 600.0;
    pub const SPACE_ADVANCE: f64 = 300.0;
}

impl Font for BoxFont {
    fn units_per_em(&self) -> f64 {
        Self::UNITS_PER_EM
    }

    fn glyph(&self, c: char) -> Glyph {
        if c.is_whitespace() {
            return Glyph {
                id: 1,
                advance: Self::SPACE_ADVANCE,
                outline: Vec::new(),
            };
        }
        Glyph {
            id: 2,
            advance: Self::ADVANCE,
            outline: vec![
                PathOp::MoveTo([50.0, 0.0]),
                PathOp::LineTo([550.0, 0.0]),
                PathOp::LineTo([550.0, 700.0]),
                PathOp::LineTo([50.0, 700.0]),
                PathOp::ClosePath,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxFont, Font, FontError, TtfFont};

    #[test]
    fn box_font_metrics() {
        assert_eq!(BoxFont.advance("ab c"), 600.0 * 3.0 + 300.0);
        assert!(BoxFont.glyph(' ').outline.is_empty());
        assert_eq!(BoxFont.glyph('x').outline.len(), 5);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(TtfFont::from_bytes(vec![0, 1, 2, 3]), Err(FontError::Parse(_))));
        assert!(matches!(
            TtfFont::from_file("/definitely/not/here.ttf"),
            Err(FontError::Io(_))
        ));
    }
}
