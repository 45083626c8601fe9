use crate::common::{AgentId, LocalFrame};
use crate::domains::gossip::GossipPayload;
use tokio::sync::watch;

/// Read side of an agent's published state. Cloning is cheap and reading
/// never waits on the owning agent's ticks.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    id: AgentId,
    payload: watch::Receiver<GossipPayload>,
    frame: watch::Receiver<LocalFrame>,
}

impl AgentHandle {
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Snapshot of what this agent currently advertises to peers.
    pub fn published_payload(&self) -> GossipPayload {
        self.payload.borrow().clone()
    }

    /// Snapshot of this agent's current position estimate.
    pub fn published_frame(&self) -> LocalFrame {
        self.frame.borrow().clone()
    }
}

/// Write side, owned by the agent (single writer).
#[derive(Debug)]
pub struct Publisher {
    id: AgentId,
    payload: watch::Sender<GossipPayload>,
    frame: watch::Sender<LocalFrame>,
}

impl Publisher {
    pub fn new(id: AgentId) -> Self {
        let (payload, _) = watch::channel(GossipPayload::empty(id));
        let (frame, _) = watch::channel(LocalFrame::anchored(id));
        Self { id, payload, frame }
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            id: self.id,
            payload: self.payload.subscribe(),
            frame: self.frame.subscribe(),
        }
    }

    pub fn publish_payload(&self, payload: GossipPayload) {
        self.payload.send_replace(payload);
    }

    pub fn publish_frame(&self, frame: LocalFrame) {
        self.frame.send_replace(frame);
    }
}

/// Every agent taking part in the run.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    handles: Vec<AgentHandle>,
}

impl Roster {
    pub fn new(handles: Vec<AgentHandle>) -> Self {
        Self { handles }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentHandle> {
        self.handles.iter()
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentHandle> {
        self.handles.iter().find(|h| h.id == id)
    }

    /// Everyone except `own`.
    pub fn others(&self, own: AgentId) -> impl Iterator<Item = &AgentHandle> {
        self.handles.iter().filter(move |h| h.id != own)
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.handles.iter().map(|h| h.id).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
