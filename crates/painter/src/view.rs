use foundation::{Extent, Position, Projection, Transform};

/// Target rectangle in pixels. Pixel y grows downward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Position {
        [self.x + self.width / 2.0, self.y + self.height / 2.0]
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Maps a geographic extent onto a pixel rectangle.
///
/// The stored extent is the requested one grown on its looser axis so its
/// aspect ratio matches the rectangle: the whole requested area is always
/// visible.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    rect: PixelRect,
    extent: Extent,
    transform: Transform,
}

impl View {
    pub fn new(rect: PixelRect, extent: Extent) -> Self {
        let mut view = Self {
            rect,
            extent,
            transform: Transform::new(),
        };
        view.set_extent(extent);
        view
    }

    pub fn rect(&self) -> &PixelRect {
        &self.rect
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Fit `extent` into the rectangle and rebuild the transform.
    pub fn set_extent(&mut self, mut extent: Extent) {
        extent.normalize();
        if extent.width() == 0.0 && extent.height() == 0.0 {
            extent.buffer(1.0);
            if extent.width() == 0.0 {
                let c = extent.center();
                extent = Extent::new(c[0] - 0.5, c[1] - 0.5, c[0] + 0.5, c[1] + 0.5);
            }
        }
        if !self.rect.is_empty() {
            let sx = self.rect.width / extent.width();
            let sy = self.rect.height / extent.height();
            let center = extent.center();
            if sx < sy {
                let half = extent.width() * self.rect.height / self.rect.width / 2.0;
                extent.min_y = center[1] - half;
                extent.max_y = center[1] + half;
            } else {
                let half = extent.height() * self.rect.width / self.rect.height / 2.0;
                extent.min_x = center[0] - half;
                extent.max_x = center[0] + half;
            }
        }
        self.extent = extent;
        self.set_transform();
    }

    /// Resize the target rectangle, keeping the current extent in view.
    pub fn set_rect(&mut self, rect: PixelRect) {
        self.rect = rect;
        self.set_extent(self.extent);
    }

    /// Translate + scale with y flipped, extent center onto rect center.
    pub fn set_transform(&mut self) {
        let mut t = Transform::new();
        if !self.rect.is_empty() {
            let s = (self.rect.width / self.extent.width()).min(self.rect.height / self.extent.height());
            let rc = self.rect.center();
            let ec = self.extent.center();
            t.translate(rc[0], rc[1]).scale(s, -s, None).translate(-ec[0], -ec[1]);
        }
        self.transform = t;
    }

    pub fn geo_to_pixel(&self, p: Position) -> Position {
        self.transform.map_vec2(p)
    }

    /// `None` when the transform is singular.
    pub fn pixel_to_geo(&self, p: Position) -> Option<Position> {
        self.transform.invert().map(|inv| inv.map_vec2(p))
    }

    /// Geographic extent covered by the rectangle, unprojected with
    /// `projection`.
    pub fn get_geo_extent(&self, projection: &dyn Projection) -> Extent {
        let r = &self.rect;
        let (bl, tr) = match self.transform.invert() {
            Some(inv) if !r.is_empty() => (
                inv.map_vec2([r.x, r.y + r.height]),
                inv.map_vec2([r.x + r.width, r.y]),
            ),
            _ => (self.extent.bottom_left(), self.extent.top_right()),
        };
        let bl = projection.inverse(bl);
        let tr = projection.inverse(tr);
        let mut out = Extent::new(bl[0], bl[1], tr[0], tr[1]);
        out.normalize();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelRect, View};
    use foundation::{Extent, Identity, Projection, WebMercator};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn extent_center_lands_on_rect_center() {
        for (rect, extent) in [
            (PixelRect::new(800.0, 600.0), Extent::new(0.0, 0.0, 10.0, 5.0)),
            (PixelRect::new(300.0, 900.0), Extent::new(-180.0, -90.0, 180.0, 90.0)),
            (PixelRect::new(512.0, 512.0), Extent::new(4.3, 50.8, 4.4, 50.9)),
        ] {
            let view = View::new(rect, extent);
            let c = view.geo_to_pixel(view.extent().center());
            assert_close(c[0], rect.center()[0], 1e-6);
            assert_close(c[1], rect.center()[1], 1e-6);
        }
    }

    #[test]
    fn fit_contains_requested_extent_and_matches_aspect() {
        let requested = Extent::new(0.0, 0.0, 10.0, 5.0);
        let view = View::new(PixelRect::new(400.0, 400.0), requested);
        let e = view.extent();
        assert_close(e.width() / e.height(), 1.0, 1e-12);
        assert!(e.min_x <= requested.min_x && e.max_x >= requested.max_x);
        assert!(e.min_y <= requested.min_y && e.max_y >= requested.max_y);
        assert_eq!(*e, Extent::new(0.0, -2.5, 10.0, 7.5));

        let tall = View::new(PixelRect::new(100.0, 400.0), requested);
        assert_eq!(*tall.extent(), Extent::new(0.0, -17.5, 10.0, 22.5));
    }

    #[test]
    fn y_axis_is_flipped() {
        let view = View::new(PixelRect::new(100.0, 100.0), Extent::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(view.geo_to_pixel([0.0, 10.0]), [0.0, 0.0]);
        assert_eq!(view.geo_to_pixel([10.0, 0.0]), [100.0, 100.0]);
        let back = view.pixel_to_geo([50.0, 25.0]).unwrap();
        assert_close(back[0], 5.0, 1e-12);
        assert_close(back[1], 7.5, 1e-12);
    }

    #[test]
    fn geo_extent_inverts_the_rect() {
        let view = View::new(PixelRect::new(200.0, 100.0), Extent::new(0.0, 0.0, 20.0, 10.0));
        let e = view.get_geo_extent(&Identity);
        assert_close(e.min_x, 0.0, 1e-9);
        assert_close(e.min_y, 0.0, 1e-9);
        assert_close(e.max_x, 20.0, 1e-9);
        assert_close(e.max_y, 10.0, 1e-9);

        let bl = WebMercator.forward([4.0, 50.0]);
        let tr = WebMercator.forward([5.0, 51.0]);
        let view = View::new(PixelRect::new(256.0, 256.0), Extent::new(bl[0], bl[1], tr[0], tr[1]));
        let geo = view.get_geo_extent(&WebMercator);
        assert!(geo.min_x <= 4.0 + 1e-9 && geo.max_x >= 5.0 - 1e-9);
        assert!(geo.min_y <= 50.0 + 1e-9 && geo.max_y >= 51.0 - 1e-9);
    }

    #[test]
    fn resize_keeps_extent_visible() {
        let mut view = View::new(PixelRect::new(100.0, 100.0), Extent::new(0.0, 0.0, 10.0, 10.0));
        view.set_rect(PixelRect::new(200.0, 100.0));
        assert_eq!(*view.extent(), Extent::new(-5.0, 0.0, 15.0, 10.0));
        let c = view.geo_to_pixel([5.0, 5.0]);
        assert_eq!(c, [100.0, 50.0]);
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        let view = View::new(PixelRect::new(100.0, 100.0), Extent::new(3.0, 3.0, 3.0, 3.0));
        let p = view.geo_to_pixel([3.0, 3.0]);
        assert_close(p[0], 50.0, 1e-9);
        assert_close(p[1], 50.0, 1e-9);

        let empty = View::new(PixelRect::new(0.0, 0.0), Extent::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(empty.geo_to_pixel([1.0, 1.0]), [1.0, 1.0]);
        assert_eq!(empty.get_geo_extent(&Identity), Extent::new(0.0, 0.0, 1.0, 1.0));
    }
}
