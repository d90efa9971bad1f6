use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::item::ItemId;

/// Emitted after every successful store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum StoreEvent {
    Created {
        id: ItemId,
        parent: ItemId,
    },
    Renamed {
        id: ItemId,
        name: String,
    },
    Deleted {
        ids: Vec<ItemId>,
    },
    Moved {
        id: ItemId,
        from: ItemId,
        to: ItemId,
    },
    Copied {
        source: ItemId,
        copy: ItemId,
        parent: ItemId,
        count: usize,
    },
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::Created { .. } => "created",
            StoreEvent::Renamed { .. } => "renamed",
            StoreEvent::Deleted { .. } => "deleted",
            StoreEvent::Moved { .. } => "moved",
            StoreEvent::Copied { .. } => "copied",
        }
    }
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// In-process change listeners. The presentation layer registers one to
/// learn when to re-render.
#[derive(Default)]
pub struct ChangeHooks {
    listeners: Vec<Listener>,
}

impl ChangeHooks {
    pub fn register<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
        debug!(count = self.listeners.len(), "registered change listener");
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn emit(&mut self, event: &StoreEvent) {
        if self.listeners.is_empty() {
            return;
        }
        debug!(count = self.listeners.len(), "notifying change listeners");
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for ChangeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHooks")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
