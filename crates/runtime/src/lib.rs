//! Worker channel and renderer.
//!
//! A [`WorkerChannel`] runs a layer program in an isolated tokio task; a
//! [`Renderer`] drives it, keeps only the latest render id and paints the
//! resulting events.

pub mod metrics;
pub mod renderer;
pub mod worker;

pub use metrics::{Histogram, Metrics, MetricsSnapshot};
pub use renderer::{RenderEvent, Renderer, RendererConfig};
pub use worker::{ChannelError, ChannelState, DEFAULT_BATCH_SIZE, UnitConfig, WorkerChannel};
