use std::sync::Arc;

use foundation::Extent;
use layers::{LayerConfig, TextResources};
use painter::{Painter, PixelRect, Surface, View};
use protocol::{RenderId, UnitMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use source::{Feature, SpatialSource};
use tracing::{debug, error, info, trace};

use crate::metrics::{
    EVENTS_DISCARDED_STALE, EVENTS_PAINTED, FRAME_EVENTS, Metrics, RENDER_COMPLETED, RENDER_FAILED, RENDER_REQUESTED,
    SOURCE_FEATURES,
};
use crate::worker::{ChannelError, ChannelState, DEFAULT_BATCH_SIZE, UnitConfig, WorkerChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// First component of every render id issued by this renderer.
    pub channel_id: u32,
    /// Features the unit renders between two yields.
    pub batch_size: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            channel_id: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What handling one unit message amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    DataReady,
    DataUpdated,
    Painted(RenderId),
    /// Output of a superseded request, dropped.
    Discarded(RenderId),
    Completed(RenderId),
    Failed {
        render_id: Option<RenderId>,
        payload: Value,
    },
}

/// One visible layer: a source, a view, a channel running the layer's
/// program and a painter.
///
/// Only the latest issued render id is ever painted. The surface is cleared
/// on the first event of a new render id (or at its `frame:end` when it
/// drew nothing), so a failed render leaves the previous frame in place.
#[derive(Debug)]
pub struct Renderer<S: Surface> {
    layer: LayerConfig,
    source: SpatialSource,
    view: View,
    painter: Painter<S>,
    channel: WorkerChannel,
    generation: u64,
    current: Option<RenderId>,
    painted: Option<RenderId>,
    frame_events: u64,
    pending_update: bool,
    metrics: Metrics,
}

impl<S: Surface> Renderer<S> {
    pub fn new(
        config: RendererConfig,
        layer: LayerConfig,
        source: SpatialSource,
        view: View,
        surface: S,
        text: Arc<TextResources>,
    ) -> Self {
        let unit = UnitConfig::from_layer(&layer, text).with_batch_size(config.batch_size);
        let painter = Painter::new(surface, &view);
        Self {
            layer,
            source,
            view,
            painter,
            channel: WorkerChannel::new(config.channel_id, unit),
            generation: 0,
            current: None,
            painted: None,
            frame_events: 0,
            pending_update: false,
            metrics: Metrics::new(),
        }
    }

    pub fn layer(&self) -> &LayerConfig {
        &self.layer
    }

    pub fn source(&self) -> &SpatialSource {
        &self.source
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn surface(&self) -> &S {
        self.painter.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.painter.surface_mut()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Latest issued render id.
    pub fn current_render(&self) -> Option<RenderId> {
        self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending_update
    }

    fn wire_features(&self, features: &[Feature]) -> Vec<Feature> {
        let defaults = self.layer.defaults();
        features.iter().map(|f| f.with_defaults(&defaults)).collect()
    }

    /// Start the unit and send it the whole feature set.
    pub fn start(&mut self) -> Result<(), ChannelError> {
        self.channel.start()?;
        let features = self.wire_features(self.source.features());
        self.metrics.set_gauge(SOURCE_FEATURES, features.len() as i64);
        info!(layer = %self.layer.id, features = features.len(), "renderer started");
        self.channel.init_data(features)
    }

    pub fn stop(&mut self) {
        self.channel.stop();
        self.current = None;
    }

    /// Add or replace features here and in the unit. The unit answers with
    /// `data:update`, which triggers a render.
    pub fn update_features(&mut self, features: Vec<Feature>) -> Result<(), ChannelError> {
        let wire = self.wire_features(&features);
        for feature in features {
            self.source.add_feature(feature, false);
        }
        self.metrics.set_gauge(SOURCE_FEATURES, self.source.len() as i64);
        self.channel.update_data(wire)
    }

    /// Hiding clears the surface and orphans any render in flight.
    pub fn set_visible(&mut self, visible: bool) {
        self.layer.visible = visible;
        if !visible {
            self.current = None;
            self.painted = None;
            self.painter.clear();
        }
    }

    pub fn set_view_extent(&mut self, extent: Extent) {
        self.view.set_extent(extent);
    }

    pub fn set_view_rect(&mut self, rect: PixelRect) {
        self.view.set_rect(rect);
    }

    /// Issue a render request for the current view.
    ///
    /// Returns `None` when the layer is hidden, or when the unit has no data
    /// yet; in the latter case the request is issued on `data:init`.
    pub fn render(&mut self) -> Result<Option<RenderId>, ChannelError> {
        if !self.layer.visible {
            self.set_visible(false);
            return Ok(None);
        }
        if !self.channel.is_ready() {
            self.pending_update = true;
            return Ok(None);
        }
        self.pending_update = false;

        let render_id = RenderId::new(self.channel.id(), self.generation + 1);
        let extent = self.view.get_geo_extent(&self.layer.projection);
        self.channel.update_view(render_id, extent, self.view.transform().flat())?;
        self.generation += 1;
        self.current = Some(render_id);
        self.frame_events = 0;
        self.painter.reset_transform(&self.view);
        self.metrics.inc_counter(RENDER_REQUESTED, 1);
        debug!(%render_id, extent = ?extent.to_array(), "render requested");
        Ok(Some(render_id))
    }

    fn is_current(&self, render_id: RenderId) -> bool {
        self.current == Some(render_id)
    }

    fn begin_frame(&mut self, render_id: RenderId) {
        if self.painted != Some(render_id) {
            self.painter.clear();
            self.painted = Some(render_id);
        }
    }

    pub fn handle(&mut self, msg: UnitMessage) -> Result<RenderEvent, ChannelError> {
        match msg {
            UnitMessage::DataInit => {
                debug!(layer = %self.layer.id, "data:init");
                if self.pending_update {
                    self.render()?;
                }
                Ok(RenderEvent::DataReady)
            }
            UnitMessage::DataUpdate => {
                debug!(layer = %self.layer.id, "data:update");
                self.render()?;
                Ok(RenderEvent::DataUpdated)
            }
            UnitMessage::Draw { render_id, event } => {
                if !self.is_current(render_id) {
                    self.metrics.inc_counter(EVENTS_DISCARDED_STALE, 1);
                    trace!(%render_id, event = event.name(), "stale event dropped");
                    return Ok(RenderEvent::Discarded(render_id));
                }
                self.begin_frame(render_id);
                self.painter.handle(&event);
                self.frame_events += 1;
                self.metrics.inc_counter(EVENTS_PAINTED, 1);
                Ok(RenderEvent::Painted(render_id))
            }
            UnitMessage::FrameEnd { render_id } => {
                if !self.is_current(render_id) {
                    return Ok(RenderEvent::Discarded(render_id));
                }
                self.begin_frame(render_id);
                self.metrics.inc_counter(RENDER_COMPLETED, 1);
                self.metrics.record_histogram(FRAME_EVENTS, self.frame_events as i64);
                debug!(%render_id, events = self.frame_events, "frame complete");
                Ok(RenderEvent::Completed(render_id))
            }
            UnitMessage::Error { render_id, payload } => {
                error!(layer = %self.layer.id, render_id = ?render_id, %payload, "channel error");
                if render_id.is_some_and(|id| self.is_current(id)) {
                    self.metrics.inc_counter(RENDER_FAILED, 1);
                }
                Ok(RenderEvent::Failed { render_id, payload })
            }
        }
    }

    /// Wait for the next unit message and handle it. `None` once the channel
    /// has nothing more to deliver.
    pub async fn next_event(&mut self) -> Result<Option<RenderEvent>, ChannelError> {
        match self.channel.recv().await {
            Some(msg) => self.handle(msg).map(Some),
            None => Ok(None),
        }
    }

    /// Request a render and drive the channel until the latest request
    /// completes or fails. `None` when the layer is hidden.
    pub async fn render_frame(&mut self) -> Result<Option<RenderEvent>, ChannelError> {
        if self.render()?.is_none() && !self.pending_update {
            return Ok(None);
        }
        loop {
            let Some(event) = self.next_event().await? else {
                return Err(match self.channel.state() {
                    ChannelState::Created => ChannelError::NotStarted,
                    ChannelState::Stopped => ChannelError::Stopped,
                    _ => ChannelError::Disconnected,
                });
            };
            match &event {
                RenderEvent::Completed(id) if self.is_current(*id) => return Ok(Some(event)),
                RenderEvent::Failed {
                    render_id: Some(id), ..
                } if self.is_current(*id) => return Ok(Some(event)),
                _ => {}
            }
        }
    }
}
