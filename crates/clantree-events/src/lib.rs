use clantree_core::MemberId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

/// Notifications the engine raises for its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Pointer
    /// Pointer pressed and released inside one node's card.
    NodeClicked {
        id: MemberId,
    },
    /// Pointer pressed and released on the canvas without dragging.
    BackgroundClicked,

    // Snapshot
    SnapshotApplied {
        node_count: usize,
    },
    /// The snapshot was malformed; the previous one is still shown.
    SnapshotRejected {
        reason: String,
    },

    // Focus
    FocusStarted {
        id: MemberId,
    },
    FocusCompleted {
        id: MemberId,
    },
    FocusFailed {
        id: MemberId,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!("Publishing {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Take every pending event without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for processing events in the UI loop.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
