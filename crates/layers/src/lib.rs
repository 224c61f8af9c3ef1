//! Layer configuration and the render programs executed inside a channel's
//! unit.
//!
//! A program turns one feature into drawing events. Programs form a closed
//! set selected by [`ProgramKind`] in the layer configuration.

pub mod hatch;
pub mod label;
pub mod layer;
pub mod outline;
pub mod program;
pub mod symbology;

pub use hatch::Hatch;
pub use label::Label;
pub use layer::{LayerConfig, LayerId};
pub use outline::Outline;
pub use program::{Program, ProgramError, ProgramKind, RenderContext, TextResources, render_feature};
pub use symbology::{get_property, path_key, process_style};
