//! Shared lifecycle machinery for owned resources.

use std::sync::Arc;

use opal_backend::{Backend, PeerHandle};

/// Capability shared by every resource that wraps a native handle.
///
/// Implementors hold the backend by shared reference and exclusively own
/// their peer handle; release happens on drop, exactly once, on every exit
/// path including teardown of a partially constructed parent chain.
pub trait Resource {
    /// The wrapped native handle.
    fn handle(&self) -> PeerHandle;

    /// The backend this resource belongs to.
    fn backend(&self) -> &Arc<dyn Backend>;
}

/// Which release call frees a handle on drop.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ReleaseKind {
    Generic,
    Context,
}

/// Owns one peer handle and releases it exactly once on drop.
///
/// Declared as the last field of each resource struct so sibling resources
/// (a context's default queue) release before the parent handle does.
pub(crate) struct HandleGuard {
    backend: Arc<dyn Backend>,
    handle: PeerHandle,
    kind: ReleaseKind,
}

impl HandleGuard {
    pub(crate) fn new(backend: Arc<dyn Backend>, handle: PeerHandle) -> Self {
        Self {
            backend,
            handle,
            kind: ReleaseKind::Generic,
        }
    }

    pub(crate) fn for_context(backend: Arc<dyn Backend>, handle: PeerHandle) -> Self {
        Self {
            backend,
            handle,
            kind: ReleaseKind::Context,
        }
    }

    pub(crate) fn handle(&self) -> PeerHandle {
        self.handle
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        match self.kind {
            ReleaseKind::Generic => self.backend.release(self.handle),
            ReleaseKind::Context => self.backend.release_context(self.handle),
        }
    }
}

impl std::fmt::Debug for HandleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleGuard")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .finish()
    }
}
