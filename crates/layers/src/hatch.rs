use foundation::{Extent, Position, Ring};
use protocol::{ClipCommand, DrawEvent};
use source::Feature;

use crate::program::{Program, ProgramError, RenderContext};

/// Number of horizontal strokes in the hatch pattern.
pub const HATCH_LINES: usize = 24;

/// Polygons are filled with a zig-zag hatch clipped to their outline; lines
/// are stroked.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hatch;

/// Zig-zag running from bottom to top of `extent`, one horizontal stroke per
/// step, alternating direction.
pub fn hatch_pattern(extent: &Extent, lines: usize) -> Vec<Position> {
    let step = extent.height() / lines as f64;
    let (left, right, bottom) = (extent.min_x, extent.max_x, extent.min_y);
    let mut out = vec![[left, bottom]];
    let mut turn = false;
    for i in 0..lines {
        let y = bottom + i as f64 * step;
        let (from, to) = if turn { (right, left) } else { (left, right) };
        if i > 0 {
            out.push([from, y]);
        }
        out.push([to, y]);
        turn = !turn;
    }
    out
}

impl Program for Hatch {
    fn name(&self) -> &'static str {
        "hatch"
    }

    fn line_string(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Position>, _feature: &Feature) -> Result<(), ProgramError> {
        ctx.emit(DrawEvent::line(coordinates));
        Ok(())
    }

    fn polygon(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Ring>, feature: &Feature) -> Result<(), ProgramError> {
        let extent = Extent::from_positions(coordinates.iter().flatten()).ok_or_else(|| ProgramError::EmptyGeometry {
            feature: feature.id.clone(),
        })?;
        let pattern = hatch_pattern(&extent, HATCH_LINES);
        ctx.emit(DrawEvent::Clip(ClipCommand::Begin(coordinates)));
        ctx.emit(DrawEvent::line(pattern));
        ctx.emit(DrawEvent::Clip(ClipCommand::End));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HATCH_LINES, hatch_pattern};
    use crate::program::{ProgramKind, RenderContext, TextResources, render_feature};
    use foundation::{Extent, Geometry, ProjectionKind, Transform};
    use protocol::{ClipCommand, DrawCommand, DrawEvent};
    use source::Feature;

    #[test]
    fn pattern_zigzags_upward() {
        let p = hatch_pattern(&Extent::new(0.0, 0.0, 10.0, 4.0), 4);
        assert_eq!(
            p,
            vec![
                [0.0, 0.0],
                [10.0, 0.0],
                [10.0, 1.0],
                [0.0, 1.0],
                [0.0, 2.0],
                [10.0, 2.0],
                [10.0, 3.0],
                [0.0, 3.0],
            ]
        );
    }

    #[test]
    fn polygon_is_clipped_around_the_pattern() {
        let res = TextResources::default();
        let mut ctx = RenderContext::new(Transform::new(), ProjectionKind::Identity, &res);
        let ring = vec![[0.0, 0.0], [24.0, 0.0], [24.0, 24.0], [0.0, 24.0], [0.0, 0.0]];
        let f = Feature::new("h", Geometry::Polygon(vec![ring.clone()]));
        render_feature(ProgramKind::Hatch.program(), &f, &mut ctx).unwrap();
        let events = ctx.take_events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[1], DrawEvent::Clip(ClipCommand::Begin(vec![ring])));
        let DrawEvent::Draw(DrawCommand::Line { coordinates }) = &events[2] else {
            panic!("expected hatch line, got {:?}", events[2]);
        };
        assert_eq!(coordinates.len(), 2 * HATCH_LINES);
        assert_eq!(coordinates.last(), Some(&[0.0, 23.0]));
        assert_eq!(events[3], DrawEvent::Clip(ClipCommand::End));
    }

    #[test]
    fn points_draw_nothing() {
        let res = TextResources::default();
        let mut ctx = RenderContext::new(Transform::new(), ProjectionKind::Identity, &res);
        let f = Feature::new("pt", Geometry::Point([1.0, 1.0]));
        render_feature(ProgramKind::Hatch.program(), &f, &mut ctx).unwrap();
        assert_eq!(ctx.events().len(), 2);
    }
}
