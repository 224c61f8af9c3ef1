pub mod painter;
pub mod surface;
pub mod view;

pub use painter::Painter;
pub use surface::{RecordingSurface, Surface, SurfaceOp};
pub use view::{PixelRect, View};
