pub mod feature;
pub mod index;
pub mod source;

pub use feature::*;
pub use index::{IndexEntry, SpatialIndex};
pub use source::SpatialSource;
