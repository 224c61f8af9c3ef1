use crate::geometry::Position;

/// 2D affine transform stored as a 3x3 homogeneous matrix.
///
/// Points are column vectors: `p' = M * p`. Every operation right-multiplies
/// onto the accumulated matrix (`m = m * op`), the same convention as a 2D
/// canvas context: after `translate(10, 0).scale(2, 2)` the scale is applied
/// to a point first, then the translation.
///
/// The flat form `[a, b, c, d, e, f]` maps `x' = a*x + c*y + e` and
/// `y' = b*x + d*y + f`; it is the representation carried on the wire.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    m: [[f64; 3]; 3],
}

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub const fn new() -> Self {
        Self { m: IDENTITY }
    }

    pub const fn from_flat(flat: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = flat;
        Self {
            m: [[a, c, e], [b, d, f], [0.0, 0.0, 1.0]],
        }
    }

    pub fn flat(&self) -> [f64; 6] {
        [
            self.m[0][0],
            self.m[1][0],
            self.m[0][1],
            self.m[1][1],
            self.m[0][2],
            self.m[1][2],
        ]
    }

    pub fn multiply(&mut self, other: &Transform) -> &mut Self {
        let mut product = [[0.0; 3]; 3];
        for (row, out_row) in product.iter_mut().enumerate() {
            for (col, out) in out_row.iter_mut().enumerate() {
                *out = (0..3).map(|k| self.m[row][k] * other.m[k][col]).sum();
            }
        }
        self.m = product;
        self
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.multiply(&Self::from_flat([1.0, 0.0, 0.0, 1.0, tx, ty]))
    }

    /// Scale, optionally about `origin` instead of `(0, 0)`.
    pub fn scale(&mut self, sx: f64, sy: f64, origin: Option<Position>) -> &mut Self {
        let op = Self::from_flat([sx, 0.0, 0.0, sy, 0.0, 0.0]);
        self.about(origin, &op)
    }

    /// Counter-clockwise rotation in degrees (y axis pointing up), optionally
    /// about `origin`.
    pub fn rotate(&mut self, degrees: f64, origin: Option<Position>) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let op = Self::from_flat([cos, sin, -sin, cos, 0.0, 0.0]);
        self.about(origin, &op)
    }

    fn about(&mut self, origin: Option<Position>, op: &Transform) -> &mut Self {
        match origin {
            Some(o) => self.translate(o[0], o[1]).multiply(op).translate(-o[0], -o[1]),
            None => self.multiply(op),
        }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let [a, b, c, d, e, f] = self.flat();
        let inv_det = 1.0 / det;
        Some(Self::from_flat([
            d * inv_det,
            -b * inv_det,
            -c * inv_det,
            a * inv_det,
            (c * f - d * e) * inv_det,
            (b * e - a * f) * inv_det,
        ]))
    }

    pub fn map_vec2(&self, v: Position) -> Position {
        [
            v[0] * self.m[0][0] + v[1] * self.m[0][1] + self.m[0][2],
            v[0] * self.m[1][0] + v[1] * self.m[1][1] + self.m[1][2],
        ]
    }

    /// Map every position in place.
    pub fn map_coordinates(&self, coordinates: &mut [Position]) {
        for p in coordinates.iter_mut() {
            *p = self.map_vec2(*p);
        }
    }

    pub fn get_scale(&self) -> [f64; 2] {
        [self.m[0][0], self.m[1][1]]
    }

    pub fn get_translate(&self) -> [f64; 2] {
        [self.m[0][2], self.m[1][2]]
    }

    pub fn reset_translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.m[0][2] = tx;
        self.m[1][2] = ty;
        self
    }
}
