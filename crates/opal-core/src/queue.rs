//! Command queues.

use std::sync::{Arc, Weak};

use opal_backend::{Backend, PeerHandle};

use crate::context::{Context, ContextInner};
use crate::resource::{HandleGuard, Resource};

/// An in-order command queue on a context.
///
/// Holds a non-owning back-reference to its context for attribute lookups;
/// the queue's own native handle is released when the queue drops.
pub struct Queue {
    context: Weak<ContextInner>,
    guard: HandleGuard,
}

impl Queue {
    pub(crate) fn from_parts(context: Weak<ContextInner>, guard: HandleGuard) -> Self {
        Self { context, guard }
    }

    /// The owning context, if it is still alive.
    pub fn context(&self) -> Option<Context> {
        self.context.upgrade().map(Context::from_inner)
    }
}

impl Resource for Queue {
    fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        self.guard.backend()
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.guard.handle() == other.guard.handle()
    }
}

impl Eq for Queue {}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("handle", &self.guard.handle())
            .finish()
    }
}
