use foundation::{Position, Ring};
use protocol::DrawEvent;
use source::Feature;

use crate::program::{Program, ProgramError, RenderContext};

/// Side of the square drawn for a point, in pixels, unless `params.pointSize`
/// says otherwise.
pub const DEFAULT_POINT_SIZE: f64 = 4.0;

/// Polygons are closed, stroked and filled; lines are stroked; points become
/// small squares.
#[derive(Debug, Default, Clone, Copy)]
pub struct Outline;

impl Program for Outline {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn point(&self, ctx: &mut RenderContext<'_>, position: Position, feature: &Feature) -> Result<(), ProgramError> {
        let size = match feature.params().and_then(|p| p.get("pointSize")) {
            None => DEFAULT_POINT_SIZE,
            Some(v) => v.as_f64().ok_or_else(|| ProgramError::InvalidParam {
                feature: feature.id.clone(),
                key: "pointSize".to_string(),
                expected: "a number",
            })?,
        };
        let half = size * ctx.pixel_size() / 2.0;
        let [x, y] = position;
        ctx.emit(DrawEvent::polygon(vec![vec![
            [x - half, y - half],
            [x + half, y - half],
            [x + half, y + half],
            [x - half, y + half],
        ]]));
        Ok(())
    }

    fn line_string(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Position>, _feature: &Feature) -> Result<(), ProgramError> {
        ctx.emit(DrawEvent::line(coordinates));
        Ok(())
    }

    fn polygon(&self, ctx: &mut RenderContext<'_>, coordinates: Vec<Ring>, _feature: &Feature) -> Result<(), ProgramError> {
        ctx.emit(DrawEvent::polygon(coordinates));
        Ok(())
    }
}
