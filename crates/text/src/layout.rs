use foundation::{Position, Ring, Transform, Vec2};
use protocol::PathOp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::segments::{Segment, get_writable_segments};
use crate::text::{PlacedGlyph, Text};

/// Font-size search bounds and line metrics for text laid into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSizeConfig {
    /// Smallest font size tried by the search.
    pub min_size: u32,
    /// Largest font size tried by the search.
    pub max_size: u32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
    /// Writable length is weighted by `1 - ln(fs) / decay`.
    pub decay: f64,
}

impl Default for AutoSizeConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 1_000_000,
            line_height_factor: 1.2,
            decay: 100.0,
        }
    }
}

/// Binary search over `[min, max]` driven by a comparison-style predicate:
/// positive means "too big", negative "too small", zero stops on `pivot`.
///
/// Returns `min` when `max <= min`.
pub fn binary_search(min: u32, max: u32, mut predicate: impl FnMut(u32) -> f64) -> u32 {
    let (mut lo, mut hi) = (min, max);
    loop {
        if hi <= lo {
            return lo;
        }
        let pivot = lo + (hi - lo) / 2;
        let verdict = predicate(pivot);
        if verdict > 0.0 {
            hi = pivot;
        } else if verdict < 0.0 {
            lo = pivot + 1;
        } else {
            return pivot;
        }
    }
}

/// Lays text into polygons and along lines, producing raw path ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    pub config: AutoSizeConfig,
}

impl TextLayout {
    pub fn new(config: AutoSizeConfig) -> Self {
        Self { config }
    }

    pub fn line_height(&self, font_size: f64) -> f64 {
        font_size * self.config.line_height_factor
    }

    /// Fill `polygon` line by line at `font_size`, starting one line below its
    /// top. Glyph outlines are mapped through `t`; each glyph becomes
    /// `beginPath`, its path, `fill`.
    pub fn draw_text_in_polygon(&self, t: &Transform, polygon: &[Ring], text: &Text, font_size: f64) -> Vec<PathOp> {
        let lh = self.line_height(font_size);
        let k = font_size / text.font().units_per_em();
        let mut ops = Vec::new();
        let mut cursor = Some(text.cursor());
        let mut line = 1;

        while let Some(segments) = get_writable_segments(polygon, lh, line) {
            let Some(current) = cursor else {
                break;
            };
            if segments.is_empty() {
                line += 1;
                continue;
            }
            let (next, placed) = text.draw(font_size, &segments, current, false);
            cursor = next;
            for g in &placed {
                push_mapped_glyph(&mut ops, t, g, k);
            }
            line += 1;
        }
        ops
    }

    /// Total writable length inside `polygon` at `font_size`, weighted by the
    /// decay term.
    pub fn segments_length(&self, polygon: &[Ring], font_size: f64) -> f64 {
        let lh = self.line_height(font_size);
        let mut total = 0.0;
        let mut line = 1;
        while let Some(segments) = get_writable_segments(polygon, lh, line) {
            total += segments
                .iter()
                .map(|s| Vec2::from(s[0]).distance(Vec2::from(s[1])))
                .sum::<f64>();
            line += 1;
        }
        total * (1.0 - font_size.ln() / self.config.decay)
    }

    /// Largest font size whose flat text length fits the polygon's weighted
    /// writable length.
    ///
    /// The search converges on the first size that no longer fits; that size
    /// is stepped down once unless it is already `min_size`.
    pub fn fit_font_size(&self, polygon: &[Ring], text: &Text) -> u32 {
        let base = text.flat_length(1.0);
        let overflow = |pivot: u32| {
            let fs = f64::from(pivot);
            (base * fs - self.segments_length(polygon, fs)).floor()
        };
        let found = binary_search(self.config.min_size, self.config.max_size, &overflow);
        if found > self.config.min_size && overflow(found) > 0.0 {
            found - 1
        } else {
            found
        }
    }

    /// [`draw_text_in_polygon`](Self::draw_text_in_polygon) at the size found
    /// by [`fit_font_size`](Self::fit_font_size).
    pub fn draw_text_in_polygon_auto(&self, t: &Transform, polygon: &[Ring], text: &Text) -> (u32, Vec<PathOp>) {
        let fs = self.fit_font_size(polygon, text);
        debug!(font_size = fs, text = text.as_str(), "auto-sized text");
        (fs, self.draw_text_in_polygon(t, polygon, text, f64::from(fs)))
    }

    /// Glyphs along `coordinates`, one op group per glyph:
    /// `save`, `transform`, `beginPath`, glyph path in font units, `fill`,
    /// `restore`. The transform keeps each baseline tangent to its segment.
    pub fn draw_text_on_line(&self, t: &Transform, coordinates: &[Position], text: &Text, font_size: f64) -> Vec<Vec<PathOp>> {
        let segments: Vec<Segment> = coordinates.windows(2).map(|w| [w[0], w[1]]).collect();
        if segments.is_empty() {
            return Vec::new();
        }
        let k = font_size / text.font().units_per_em();
        let (_, placed) = text.draw(font_size, &segments, text.cursor(), true);

        placed
            .iter()
            .filter(|g| !g.glyph.outline.is_empty())
            .map(|g| {
                let angle = Vec2::from(g.segment[0]).angle_to(Vec2::from(g.segment[1]));
                let mut tt = *t;
                tt.translate(g.pos[0], g.pos[1]).rotate(angle, None).scale(k, k, None);

                let mut group = Vec::with_capacity(g.glyph.outline.len() + 5);
                group.push(PathOp::Save);
                group.push(PathOp::Transform(tt.flat()));
                group.push(PathOp::BeginPath);
                group.extend(g.glyph.outline.iter().copied());
                group.push(PathOp::Fill);
                group.push(PathOp::Restore);
                group
            })
            .collect()
    }
}

fn push_mapped_glyph(ops: &mut Vec<PathOp>, t: &Transform, g: &PlacedGlyph, k: f64) {
    if g.glyph.outline.is_empty() {
        return;
    }
    let mut local = *t;
    local.translate(g.pos[0], g.pos[1]).scale(k, k, None);
    ops.push(PathOp::BeginPath);
    ops.extend(g.glyph.outline.iter().map(|op| op.map(&local)));
    ops.push(PathOp::Fill);
}
