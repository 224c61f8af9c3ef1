use crate::geometry::Position;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Point `distance` units from `self` towards `target`.
    ///
    /// Returns `self` when both points coincide.
    pub fn advance_towards(self, target: Self, distance: f64) -> Self {
        let len = self.distance(target);
        if len <= 0.0 {
            return self;
        }
        self + (target - self).scale(distance / len)
    }

    /// Angle of the vector `self -> other` in degrees, counter-clockwise from +x.
    pub fn angle_to(self, other: Self) -> f64 {
        let d = other - self;
        d.y.atan2(d.x).to_degrees()
    }

    pub fn to_position(self) -> Position {
        [self.x, self.y]
    }
}

impl From<Position> for Vec2 {
    fn from(p: Position) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        v.to_position()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::Vec2;

    #[test]
    fn vec2_add_sub() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(-0.5, 4.0);
        assert_eq!(a + b, Vec2::new(0.5, 6.0));
        assert_eq!(a - b, Vec2::new(1.5, -2.0));
    }

    #[test]
    fn advance_towards_walks_along_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        let p = a.advance_towards(b, 2.5);
        assert_eq!(p, Vec2::new(1.5, 2.0));
        assert_eq!(a.advance_towards(a, 1.0), a);
    }

    #[test]
    fn angle_is_counter_clockwise_degrees() {
        let o = Vec2::new(0.0, 0.0);
        assert_eq!(o.angle_to(Vec2::new(1.0, 0.0)), 0.0);
        assert_eq!(o.angle_to(Vec2::new(0.0, 1.0)), 90.0);
        assert_eq!(o.angle_to(Vec2::new(-1.0, 0.0)), 180.0);
    }
}
