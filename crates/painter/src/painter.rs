use foundation::{Position, Ring, Transform};
use protocol::{ClipCommand, DrawCommand, DrawEvent, PathEnd, PathOp};
use serde_json::Value;
use tracing::trace;

use crate::surface::Surface;
use crate::view::View;

/// Interprets drawing events against a surface.
///
/// The view transform is captured when the painter is created (or on
/// `reset_transform`) and applied point by point, so line widths are never
/// scaled by a surface transform.
#[derive(Debug)]
pub struct Painter<S: Surface> {
    surface: S,
    transform: Transform,
}

impl<S: Surface> Painter<S> {
    pub fn new(surface: S, view: &View) -> Self {
        Self {
            surface,
            transform: *view.transform(),
        }
    }

    pub fn reset_transform(&mut self, view: &View) {
        self.transform = *view.transform();
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    pub fn set(&mut self, property: &str, value: &Value) {
        self.surface.set(property, value);
    }

    fn map(&self, p: Position) -> Position {
        self.transform.map_vec2(p)
    }

    fn trace_path<'a>(&mut self, points: impl IntoIterator<Item = &'a Position>) {
        for (i, p) in points.into_iter().enumerate() {
            let p = self.map(*p);
            if i == 0 {
                self.surface.apply(&PathOp::MoveTo(p));
            } else {
                self.surface.apply(&PathOp::LineTo(p));
            }
        }
    }

    /// One path for all rings (outer ring then holes), then `ends`.
    pub fn draw_polygon(&mut self, coordinates: &[Ring], ends: &[PathEnd]) {
        self.surface.apply(&PathOp::BeginPath);
        for ring in coordinates {
            self.trace_path(ring);
        }
        for end in ends {
            self.surface.apply(&end.as_op());
        }
    }

    pub fn draw_line(&mut self, coordinates: &[Position]) {
        self.surface.apply(&PathOp::BeginPath);
        self.trace_path(coordinates);
        self.surface.apply(&PathOp::Stroke);
    }

    /// `Begin` saves state and intersects the clip region; `End` restores.
    pub fn clip(&mut self, command: &ClipCommand) {
        match command {
            ClipCommand::Begin(coordinates) => {
                self.surface.apply(&PathOp::Save);
                self.draw_polygon(coordinates, &[PathEnd::Clip]);
            }
            ClipCommand::End => self.surface.apply(&PathOp::Restore),
        }
    }

    /// A single raw op with unmapped coordinates.
    pub fn context(&mut self, op: &PathOp) {
        let mapped = op.map(&self.transform);
        self.surface.apply(&mapped);
    }

    /// A batch already expressed in pixels, or carrying its own `transform`.
    pub fn instructions(&mut self, ops: &[PathOp]) {
        for op in ops {
            self.surface.apply(op);
        }
    }

    pub fn handle(&mut self, event: &DrawEvent) {
        trace!(event = event.name(), "paint");
        match event {
            DrawEvent::Draw(DrawCommand::Polygon { coordinates, ends }) => {
                let default = PathEnd::DEFAULT;
                self.draw_polygon(coordinates, ends.as_deref().unwrap_or(&default));
            }
            DrawEvent::Draw(DrawCommand::Line { coordinates }) => self.draw_line(coordinates),
            DrawEvent::Draw(DrawCommand::Raw(op)) | DrawEvent::Context(op) => self.context(op),
            DrawEvent::Set { property, value } => self.set(property, value),
            DrawEvent::Clip(command) => self.clip(command),
            DrawEvent::Instructions(ops) => self.instructions(ops),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Painter;
    use crate::surface::{RecordingSurface, SurfaceOp};
    use crate::view::{PixelRect, View};
    use foundation::Extent;
    use pretty_assertions::assert_eq;
    use protocol::{ClipCommand, DrawCommand, DrawEvent, PathEnd, PathOp};
    use serde_json::json;

    fn painter() -> Painter<RecordingSurface> {
        // 10 px per unit, y flipped, origin at the bottom-left corner
        let view = View::new(PixelRect::new(100.0, 100.0), Extent::new(0.0, 0.0, 10.0, 10.0));
        Painter::new(RecordingSurface::new(), &view)
    }

    fn paths(p: &Painter<RecordingSurface>) -> Vec<PathOp> {
        p.surface()
            .ops()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Path(op) => Some(*op),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn polygon_maps_points_and_applies_default_ends() {
        let mut p = painter();
        p.handle(&DrawEvent::polygon(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]]));
        assert_eq!(
            paths(&p),
            vec![
                PathOp::BeginPath,
                PathOp::MoveTo([0.0, 100.0]),
                PathOp::LineTo([100.0, 100.0]),
                PathOp::LineTo([100.0, 0.0]),
                PathOp::ClosePath,
                PathOp::Stroke,
                PathOp::Fill,
            ]
        );
    }

    #[test]
    fn holes_start_new_subpaths() {
        let mut p = painter();
        p.draw_polygon(
            &[
                vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]],
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0]],
            ],
            &[PathEnd::Fill],
        );
        let moves = paths(&p)
            .iter()
            .filter(|op| matches!(op, PathOp::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
        assert_eq!(paths(&p).last(), Some(&PathOp::Fill));
    }

    #[test]
    fn line_is_stroked_not_closed() {
        let mut p = painter();
        p.handle(&DrawEvent::line(vec![[0.0, 10.0], [5.0, 5.0]]));
        assert_eq!(
            paths(&p),
            vec![
                PathOp::BeginPath,
                PathOp::MoveTo([0.0, 0.0]),
                PathOp::LineTo([50.0, 50.0]),
                PathOp::Stroke,
            ]
        );
    }

    #[test]
    fn clip_brackets_with_save_restore() {
        let mut p = painter();
        p.handle(&DrawEvent::Clip(ClipCommand::Begin(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]])));
        assert_eq!(p.surface().depth(), 1);
        p.handle(&DrawEvent::Clip(ClipCommand::End));
        assert_eq!(p.surface().depth(), 0);
        let ops = paths(&p);
        assert_eq!(ops.first(), Some(&PathOp::Save));
        assert_eq!(ops[ops.len() - 2], PathOp::Clip);
        assert_eq!(ops.last(), Some(&PathOp::Restore));
    }

    #[test]
    fn context_is_mapped_but_instructions_are_verbatim() {
        let mut p = painter();
        p.handle(&DrawEvent::Context(PathOp::MoveTo([1.0, 1.0])));
        p.handle(&DrawEvent::Draw(DrawCommand::Raw(PathOp::LineTo([2.0, 2.0]))));
        p.handle(&DrawEvent::Instructions(vec![PathOp::MoveTo([1.0, 1.0]), PathOp::Fill]));
        assert_eq!(
            paths(&p),
            vec![
                PathOp::MoveTo([10.0, 90.0]),
                PathOp::LineTo([20.0, 80.0]),
                PathOp::MoveTo([1.0, 1.0]),
                PathOp::Fill,
            ]
        );
    }

    #[test]
    fn set_reaches_the_surface() {
        let mut p = painter();
        p.handle(&DrawEvent::set("strokeStyle", "red"));
        assert_eq!(
            p.surface().ops(),
            &[SurfaceOp::Set {
                property: "strokeStyle".to_string(),
                value: json!("red"),
            }]
        );
    }

    #[test]
    fn transform_is_captured_not_live() {
        let mut view = View::new(PixelRect::new(100.0, 100.0), Extent::new(0.0, 0.0, 10.0, 10.0));
        let mut p = Painter::new(RecordingSurface::new(), &view);
        view.set_extent(Extent::new(0.0, 0.0, 100.0, 100.0));
        p.context(&PathOp::MoveTo([10.0, 10.0]));
        p.reset_transform(&view);
        p.context(&PathOp::MoveTo([10.0, 10.0]));
        assert_eq!(
            paths(&p),
            vec![PathOp::MoveTo([100.0, 0.0]), PathOp::MoveTo([10.0, 90.0])]
        );
    }
}
