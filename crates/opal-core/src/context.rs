//! Contexts: the allocation scope for queues, buffers, images, and programs.

use std::sync::{Arc, Weak};

use opal_backend::{Backend, PeerHandle};

use crate::buffer::{Buffer, BufferDesc};
use crate::device::Device;
use crate::error::Result;
use crate::image::{Image, ImageDesc};
use crate::program::Program;
use crate::queue::Queue;
use crate::resource::{HandleGuard, Resource};

/// Shared state behind a [`Context`].
///
/// Children (queues, buffers, images, programs) hold a `Weak` to this for
/// attribute lookups; only the `Context` itself and its clones own it.
/// Field order matters on drop: the default queue releases before the
/// context handle does.
pub(crate) struct ContextInner {
    device: Device,
    default_queue: Queue,
    guard: HandleGuard,
}

impl ContextInner {
    pub(crate) fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        self.guard.backend()
    }

    pub(crate) fn device(&self) -> &Device {
        &self.device
    }
}

/// A compute context bound to one device for its whole lifetime.
///
/// Every context eagerly creates one default in-order queue; dropping the
/// context releases that queue's native handle and then the context's own.
/// Explicitly created queues and other children outlive the context only
/// as husks: their parent lookups start returning `None` and further
/// factory calls fail, but their own handles are still released on drop.
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub(crate) fn new(device: &Device) -> Result<Self> {
        let backend = device.backend().clone();
        let handle = backend.context_handle(device.handle())?;
        // The guard takes over immediately: if default-queue creation fails
        // below, the context handle is still released on unwind.
        let guard = HandleGuard::for_context(backend.clone(), handle);
        let queue_handle = backend.queue_handle(device.handle(), handle, true)?;

        let inner = Arc::new_cyclic(|weak: &Weak<ContextInner>| ContextInner {
            device: device.clone(),
            default_queue: Queue::from_parts(
                weak.clone(),
                HandleGuard::new(backend.clone(), queue_handle),
            ),
            guard,
        });
        Ok(Self { inner })
    }

    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    /// The device this context is bound to.
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    /// The queue created with this context.
    pub fn default_queue(&self) -> &Queue {
        &self.inner.default_queue
    }

    /// Creates an additional in-order queue on this context.
    pub fn create_queue(&self) -> Result<Queue> {
        let backend = self.inner.backend();
        let handle = backend.queue_handle(self.inner.device.handle(), self.inner.handle(), true)?;
        Ok(Queue::from_parts(
            Arc::downgrade(&self.inner),
            HandleGuard::new(backend.clone(), handle),
        ))
    }

    /// Creates a buffer described by `desc`.
    ///
    /// Shape parameters are validated before the backend is invoked; see
    /// [`BufferDesc`] for the defaults.
    pub fn create_buffer(&self, desc: BufferDesc) -> Result<Buffer> {
        Buffer::create(&self.inner, desc)
    }

    /// Creates a 1D, 2D, or 3D image described by `desc`.
    ///
    /// Dimensionality is inferred from the number of extents supplied.
    pub fn create_image(&self, desc: ImageDesc) -> Result<Image> {
        Image::create(&self.inner, desc)
    }

    /// Creates an empty program; attach sources, then build it.
    pub fn create_program(&self) -> Program {
        Program::new(Arc::downgrade(&self.inner))
    }
}

impl Resource for Context {
    fn handle(&self) -> PeerHandle {
        self.inner.handle()
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        self.inner.backend()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("handle", &self.inner.handle())
            .field("device", &self.inner.device.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opal::Opal;
    use opal_backend::{AllocationKind, BackendError, MockBackend, MockDevice};

    fn single_gpu() -> (Arc<MockBackend>, Device) {
        let backend = Arc::new(MockBackend::new().with_platform("p", vec![MockDevice::gpu("g")]));
        let device = Opal::new(backend.clone()).all_devices().unwrap().remove(0);
        (backend, device)
    }

    #[test]
    fn test_context_creates_exactly_one_default_queue() {
        let (backend, device) = single_gpu();
        let context = device.create_context().unwrap();

        let records = backend.allocations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, AllocationKind::Context);
        assert_eq!(records[1].kind, AllocationKind::Queue);

        let extra = context.create_queue().unwrap();
        assert_ne!(extra, *context.default_queue());
    }

    #[test]
    fn test_drop_releases_default_queue_then_context() {
        let (backend, device) = single_gpu();
        let context = device.create_context().unwrap();
        let context_handle = context.handle();
        let queue_handle = context.default_queue().handle();

        drop(context);
        assert_eq!(backend.released_handles(), vec![queue_handle, context_handle]);
    }

    #[test]
    fn test_context_allocation_failure_constructs_nothing() {
        let (backend, device) = single_gpu();
        backend.fail_next_allocation(BackendError::OutOfDeviceMemory);

        let result = device.create_context();
        assert!(result.is_err());
        assert_eq!(backend.allocation_count(), 0);
        assert!(backend.released_handles().is_empty());
    }

    #[test]
    fn test_default_queue_failure_releases_context_handle() {
        let (backend, device) = single_gpu();
        // Context allocation (call 0) succeeds, default queue (call 1) fails.
        backend.fail_nth_allocation(1, BackendError::OutOfDeviceMemory);

        assert!(device.create_context().is_err());
        assert_eq!(backend.allocation_count(), 1);
        let context_handle = backend.allocations()[0].handle;
        assert!(backend.was_released(context_handle));
    }

    #[test]
    fn test_queue_parent_lookup() {
        let (_backend, device) = single_gpu();
        let context = device.create_context().unwrap();
        let queue = context.create_queue().unwrap();

        let parent = queue.context().unwrap();
        assert_eq!(parent.device().name(), "g");

        drop(parent);
        drop(context);
        assert!(queue.context().is_none());
    }
}
