use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, Position};

/// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]`.
///
/// The derived operations (`add`, `bound`, `buffer`, `max_square`, `normalize`)
/// mutate in place and return `&mut Self` so they can be chained.
///
/// On the wire an extent is always the flat array `[minX, minY, maxX, maxY]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Degenerate extent covering a single position.
    pub const fn from_point(p: Position) -> Self {
        Self::new(p[0], p[1], p[0], p[1])
    }

    /// Smallest extent containing every position, or `None` for an empty input.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut out = Self::from_point(*first);
        for p in iter {
            out.min_x = out.min_x.min(p[0]);
            out.min_y = out.min_y.min(p[1]);
            out.max_x = out.max_x.max(p[0]);
            out.max_y = out.max_y.max(p[1]);
        }
        Some(out)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// A valid extent has `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Swap components so that `min <= max` on both axes.
    pub fn normalize(&mut self) -> &mut Self {
        if self.min_x > self.max_x {
            std::mem::swap(&mut self.min_x, &mut self.max_x);
        }
        if self.min_y > self.max_y {
            std::mem::swap(&mut self.min_y, &mut self.max_y);
        }
        self
    }

    /// Inclusive overlap test. A point converts into a degenerate rectangle.
    pub fn intersects(&self, other: impl Into<Extent>) -> bool {
        let r = other.into();
        self.min_x <= r.max_x && r.min_x <= self.max_x && self.min_y <= r.max_y && r.min_y <= self.max_y
    }

    pub fn contains(&self, p: Position) -> bool {
        self.intersects(p)
    }

    /// Union.
    pub fn add(&mut self, other: impl Into<Extent>) -> &mut Self {
        let o = other.into();
        self.min_x = self.min_x.min(o.min_x);
        self.min_y = self.min_y.min(o.min_y);
        self.max_x = self.max_x.max(o.max_x);
        self.max_y = self.max_y.max(o.max_y);
        self
    }

    /// Intersection. Disjoint inputs leave `self` invalid; check `is_valid`.
    pub fn bound(&mut self, other: impl Into<Extent>) -> &mut Self {
        let o = other.into();
        self.min_x = self.min_x.max(o.min_x);
        self.min_y = self.min_y.max(o.min_y);
        self.max_x = self.max_x.min(o.max_x);
        self.max_y = self.max_y.min(o.max_y);
        self
    }

    /// Grow (or shrink, for a negative `delta`) the diagonal by `delta` while
    /// keeping the aspect ratio and the center.
    pub fn buffer(&mut self, delta: f64) -> &mut Self {
        let w = self.width();
        let h = self.height();
        let d = (w * w + h * h).sqrt();
        if d == 0.0 {
            return self;
        }
        let factor = (d + delta) / d;
        let wn = w * factor;
        let hn = h * factor;
        let c = self.center();
        self.min_x = c[0] - wn / 2.0;
        self.min_y = c[1] - hn / 2.0;
        self.max_x = c[0] + wn / 2.0;
        self.max_y = c[1] + hn / 2.0;
        self
    }

    /// Extend the shorter side about the center so the extent becomes square.
    pub fn max_square(&mut self) -> &mut Self {
        let w = self.width();
        let h = self.height();
        if w < h {
            let bw = (h - w) / 2.0;
            self.min_x -= bw;
            self.max_x += bw;
        } else if h < w {
            let bh = (w - h) / 2.0;
            self.min_y -= bh;
            self.max_y += bh;
        }
        self
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).abs()
    }

    pub fn surface(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Position {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    pub fn bottom_left(&self) -> Position {
        [self.min_x, self.min_y]
    }

    pub fn bottom_right(&self) -> Position {
        [self.max_x, self.min_y]
    }

    pub fn top_left(&self) -> Position {
        [self.min_x, self.max_y]
    }

    pub fn top_right(&self) -> Position {
        [self.max_x, self.max_y]
    }

    /// Closed outer ring, counter-clockwise from the bottom-left corner.
    pub fn to_polygon(&self) -> Geometry {
        Geometry::Polygon(vec![vec![
            self.bottom_left(),
            self.bottom_right(),
            self.top_right(),
            self.top_left(),
            self.bottom_left(),
        ]])
    }
}

impl From<[f64; 4]> for Extent {
    fn from(e: [f64; 4]) -> Self {
        Self::new(e[0], e[1], e[2], e[3])
    }
}

impl From<[f64; 2]> for Extent {
    fn from(p: [f64; 2]) -> Self {
        Self::from_point(p)
    }
}

impl From<&Extent> for Extent {
    fn from(e: &Extent) -> Self {
        *e
    }
}

impl From<Extent> for [f64; 4] {
    fn from(e: Extent) -> Self {
        e.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::Extent;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn normalize_orders_components() {
        let mut e = Extent::new(10.0, 5.0, -2.0, -7.0);
        e.normalize();
        assert_eq!(e, Extent::new(-2.0, -7.0, 10.0, 5.0));
        assert!(e.is_valid());

        let mut already = Extent::new(0.0, 0.0, 1.0, 1.0);
        already.normalize();
        assert_eq!(already, Extent::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn intersects_treats_points_as_degenerate_rects() {
        let e = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(e.intersects([5.0, 5.0]));
        assert!(e.intersects([10.0, 0.0]));
        assert!(!e.intersects([10.5, 0.0]));
        assert!(e.intersects([9.0, 9.0, 20.0, 20.0]));
        assert!(!e.intersects([11.0, 11.0, 20.0, 20.0]));
    }

    #[test]
    fn add_is_union_and_bound_is_intersection() {
        let mut u = Extent::new(0.0, 0.0, 2.0, 2.0);
        u.add([1.0, -1.0, 5.0, 1.0]);
        assert_eq!(u, Extent::new(0.0, -1.0, 5.0, 2.0));

        let mut b = Extent::new(0.0, 0.0, 2.0, 2.0);
        b.bound([1.0, -1.0, 5.0, 1.0]);
        assert_eq!(b, Extent::new(1.0, 0.0, 2.0, 1.0));
        assert!(b.is_valid());

        let mut disjoint = Extent::new(0.0, 0.0, 1.0, 1.0);
        disjoint.bound([2.0, 2.0, 3.0, 3.0]);
        assert!(!disjoint.is_valid());
    }

    #[test]
    fn buffer_grows_diagonal_about_center() {
        let mut e = Extent::new(0.0, 0.0, 10.0, 5.0);
        e.buffer(5.0);
        assert_close(e.min_x, -2.236, 1e-3);
        assert_close(e.min_y, -1.118, 1e-3);
        assert_close(e.max_x, 12.236, 1e-3);
        assert_close(e.max_y, 6.118, 1e-3);
        assert_close(e.center()[0], 5.0, 1e-12);
        assert_close(e.center()[1], 2.5, 1e-12);
    }

    #[test]
    fn buffer_preserves_aspect_ratio() {
        for delta in [-3.0, -0.5, 0.0, 1.0, 7.5, 120.0] {
            let mut e = Extent::new(-4.0, 3.0, 8.0, 6.5);
            let ratio = e.width() / e.height();
            e.buffer(delta);
            assert_close(e.width() / e.height(), ratio, 1e-9);
        }
    }

    #[test]
    fn max_square_extends_shorter_side() {
        let mut e = Extent::new(0.0, 0.0, 10.0, 4.0);
        e.max_square();
        assert_eq!(e, Extent::new(0.0, -3.0, 10.0, 7.0));

        let mut tall = Extent::new(0.0, 0.0, 2.0, 6.0);
        tall.max_square();
        assert_eq!(tall, Extent::new(-2.0, 0.0, 4.0, 6.0));
    }

    #[test]
    fn serializes_as_flat_array() {
        let e = Extent::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: Extent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
