//! Wire protocol between a renderer and its execution unit.
//!
//! This crate defines:
//! - host messages (`init:data`, `update:data`, `update:view`)
//! - unit messages (`data:init`, `data:update`, drawing events, `frame:end`, `error`)
//! - the drawing event vocabulary consumed by a painter
//!
//! In-process channels carry the typed enums; `to_wire`/`from_wire` give the
//! JSON shapes for any transport.

pub mod draw;
pub mod error;
pub mod message;
pub mod render_id;

pub use draw::*;
pub use error::ProtocolError;
pub use message::*;
pub use render_id::RenderId;
