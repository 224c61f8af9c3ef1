use std::collections::VecDeque;
use std::sync::Arc;

use foundation::{Extent, ProjectionKind, Transform};
use layers::{LayerConfig, ProgramKind, RenderContext, TextResources, render_feature};
use protocol::{HostMessage, RenderId, UnitMessage};
use serde_json::json;
use source::{Feature, SpatialSource};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Features rendered between two yields of the unit.
pub const DEFAULT_BATCH_SIZE: usize = 512;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Created,
    /// Unit running, waiting for `data:init`.
    Started,
    Ready,
    /// A render request is in flight.
    Rendering,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    NotStarted,
    AlreadyStarted,
    Stopped,
    /// The unit task is gone.
    Disconnected,
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::NotStarted => write!(f, "channel not started"),
            ChannelError::AlreadyStarted => write!(f, "channel already started"),
            ChannelError::Stopped => write!(f, "channel stopped"),
            ChannelError::Disconnected => write!(f, "execution unit disconnected"),
        }
    }
}

impl std::error::Error for ChannelError {}

/// What the execution unit loads when the channel starts.
#[derive(Debug, Clone)]
pub struct UnitConfig {
    pub program: ProgramKind,
    pub projection: ProjectionKind,
    pub text: Arc<TextResources>,
    pub batch_size: usize,
}

impl UnitConfig {
    pub fn new(program: ProgramKind, projection: ProjectionKind, text: Arc<TextResources>) -> Self {
        Self {
            program,
            projection,
            text,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn from_layer(layer: &LayerConfig, text: Arc<TextResources>) -> Self {
        Self::new(layer.program, layer.projection, text)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[derive(Debug)]
enum Inbound {
    Message(HostMessage),
    Raw(String),
}

/// Host side of an isolated execution unit.
///
/// The unit is a spawned task owning its own copy of the features; the two
/// sides share nothing and talk through unbounded channels. Posting never
/// blocks.
#[derive(Debug)]
pub struct WorkerChannel {
    id: u32,
    config: UnitConfig,
    state: ChannelState,
    latest: Option<RenderId>,
    tx: Option<UnboundedSender<Inbound>>,
    rx: Option<UnboundedReceiver<UnitMessage>>,
    task: Option<JoinHandle<()>>,
}

impl WorkerChannel {
    pub fn new(id: u32, config: UnitConfig) -> Self {
        Self {
            id,
            config,
            state: ChannelState::Created,
            latest: None,
            tx: None,
            rx: None,
            task: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ChannelState::Ready | ChannelState::Rendering)
    }

    /// Spawn the unit. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), ChannelError> {
        match self.state {
            ChannelState::Created => {}
            ChannelState::Stopped => return Err(ChannelError::Stopped),
            _ => return Err(ChannelError::AlreadyStarted),
        }
        let (host_tx, unit_rx) = mpsc::unbounded_channel();
        let (unit_tx, host_rx) = mpsc::unbounded_channel();
        let unit = Unit {
            config: self.config.clone(),
            source: SpatialSource::new(),
            backlog: VecDeque::new(),
            inbox: unit_rx,
            outbox: unit_tx,
        };
        self.task = Some(tokio::spawn(unit.run()));
        self.tx = Some(host_tx);
        self.rx = Some(host_rx);
        self.state = ChannelState::Started;
        info!(channel = self.id, program = self.config.program.program().name(), "channel started");
        Ok(())
    }

    fn send(&self, inbound: Inbound) -> Result<(), ChannelError> {
        let tx = match self.state {
            ChannelState::Created => return Err(ChannelError::NotStarted),
            ChannelState::Stopped => return Err(ChannelError::Stopped),
            _ => self.tx.as_ref().ok_or(ChannelError::NotStarted)?,
        };
        tx.send(inbound).map_err(|_| ChannelError::Disconnected)
    }

    pub fn post(&mut self, msg: HostMessage) -> Result<(), ChannelError> {
        if let HostMessage::UpdateView { render_id, .. } = &msg {
            let render_id = *render_id;
            self.send(Inbound::Message(msg))?;
            self.latest = Some(render_id);
            if self.state == ChannelState::Ready {
                self.state = ChannelState::Rendering;
            }
            return Ok(());
        }
        self.send(Inbound::Message(msg))
    }

    /// Post wire JSON as received from a transport. Malformed input comes
    /// back as an `error` event.
    pub fn post_raw(&mut self, raw: impl Into<String>) -> Result<(), ChannelError> {
        self.send(Inbound::Raw(raw.into()))
    }

    pub fn init_data(&mut self, features: Vec<Feature>) -> Result<(), ChannelError> {
        debug!(channel = self.id, features = features.len(), "posting init:data");
        self.post(HostMessage::InitData(features))
    }

    pub fn update_data(&mut self, features: Vec<Feature>) -> Result<(), ChannelError> {
        debug!(channel = self.id, features = features.len(), "posting update:data");
        self.post(HostMessage::UpdateData(features))
    }

    pub fn update_view(&mut self, render_id: RenderId, extent: Extent, matrix: [f64; 6]) -> Result<(), ChannelError> {
        self.post(HostMessage::UpdateView {
            render_id,
            extent,
            matrix,
        })
    }

    fn observe(&mut self, msg: &UnitMessage) {
        match msg {
            UnitMessage::DataInit if self.state == ChannelState::Started => {
                self.state = ChannelState::Ready;
            }
            UnitMessage::FrameEnd { render_id }
            | UnitMessage::Error {
                render_id: Some(render_id),
                ..
            } if self.state == ChannelState::Rendering && self.latest == Some(*render_id) => {
                self.state = ChannelState::Ready;
            }
            _ => {}
        }
    }

    /// Next message from the unit; `None` once the channel is stopped or the
    /// unit has exited.
    pub async fn recv(&mut self) -> Option<UnitMessage> {
        let msg = self.rx.as_mut()?.recv().await?;
        self.observe(&msg);
        Some(msg)
    }

    pub fn try_recv(&mut self) -> Option<UnitMessage> {
        let msg = self.rx.as_mut()?.try_recv().ok()?;
        self.observe(&msg);
        Some(msg)
    }

    /// Terminate the unit. Work in flight is dropped and no further message
    /// is delivered.
    pub fn stop(&mut self) {
        if self.state == ChannelState::Stopped {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.tx = None;
        self.rx = None;
        self.state = ChannelState::Stopped;
        info!(channel = self.id, "channel stopped");
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The host dropped its receiver.
struct HostGone;

struct Unit {
    config: UnitConfig,
    source: SpatialSource,
    backlog: VecDeque<Inbound>,
    inbox: UnboundedReceiver<Inbound>,
    outbox: UnboundedSender<UnitMessage>,
}

/// Move everything already posted into `backlog` and report whether a newer
/// view request is waiting. Raw messages are only inspected when handled.
fn newer_view_queued(inbox: &mut UnboundedReceiver<Inbound>, backlog: &mut VecDeque<Inbound>) -> bool {
    while let Ok(msg) = inbox.try_recv() {
        backlog.push_back(msg);
    }
    backlog
        .iter()
        .any(|msg| matches!(msg, Inbound::Message(HostMessage::UpdateView { .. })))
}

impl Unit {
    async fn run(mut self) {
        loop {
            let inbound = match self.backlog.pop_front() {
                Some(msg) => msg,
                None => match self.inbox.recv().await {
                    Some(msg) => msg,
                    None => break,
                },
            };
            if self.handle(inbound).await.is_err() {
                break;
            }
        }
        debug!("execution unit finished");
    }

    fn send(&self, msg: UnitMessage) -> Result<(), HostGone> {
        self.outbox.send(msg).map_err(|_| HostGone)
    }

    async fn handle(&mut self, inbound: Inbound) -> Result<(), HostGone> {
        let msg = match inbound {
            Inbound::Message(msg) => msg,
            Inbound::Raw(raw) => match HostMessage::parse(&raw) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "malformed host message");
                    return self.send(UnitMessage::Error {
                        render_id: None,
                        payload: json!({ "message": e.to_string(), "raw": raw }),
                    });
                }
            },
        };

        match msg {
            HostMessage::InitData(features) => {
                self.source = SpatialSource::from_features(features);
                debug!(features = self.source.len(), "init:data");
                self.send(UnitMessage::DataInit)
            }
            HostMessage::UpdateData(features) => {
                debug!(features = features.len(), "update:data");
                for feature in features {
                    self.source.add_feature(feature, false);
                }
                self.send(UnitMessage::DataUpdate)
            }
            HostMessage::UpdateView {
                render_id,
                extent,
                matrix,
            } => self.render(render_id, extent, matrix).await,
        }
    }

    /// Run the program over every feature overlapping `extent`, in batches.
    /// A newer queued view request abandons the render without `frame:end`.
    async fn render(&mut self, render_id: RenderId, extent: Extent, matrix: [f64; 6]) -> Result<(), HostGone> {
        let program = self.config.program.program();
        let features = self.source.get_features(Some(&extent));
        debug!(%render_id, features = features.len(), program = program.name(), "update:view");

        let mut ctx = RenderContext::new(Transform::from_flat(matrix), self.config.projection, &self.config.text);
        for batch in features.chunks(self.config.batch_size.max(1)) {
            for feature in batch {
                if let Err(e) = render_feature(program, feature, &mut ctx) {
                    warn!(%render_id, error = %e, "program failed");
                    return self.send(UnitMessage::Error {
                        render_id: Some(render_id),
                        payload: json!({ "message": e.to_string(), "feature": feature.id }),
                    });
                }
                for event in ctx.take_events() {
                    self.send(UnitMessage::Draw { render_id, event })?;
                }
            }
            tokio::task::yield_now().await;
            if newer_view_queued(&mut self.inbox, &mut self.backlog) {
                debug!(%render_id, "render superseded");
                return Ok(());
            }
        }
        self.send(UnitMessage::FrameEnd { render_id })
    }
}
