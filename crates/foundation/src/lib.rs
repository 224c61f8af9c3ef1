pub mod extent;
pub mod geometry;
pub mod math;
pub mod transform;

// Foundation crate: pure value math shared by every other crate.
pub use extent::Extent;
pub use geometry::{Bounded, Geometry, GeometryError, GeometryKind, Position, Ring};
pub use math::*;
pub use transform::Transform;
