//! Device memory buffers.

use std::sync::{Arc, Weak};

use opal_backend::{AccessPolicy, Backend, MemAlloc, NativeType, PeerHandle};

use crate::context::{Context, ContextInner};
use crate::error::{Error, Result};
use crate::resource::{HandleGuard, Resource};

/// Shape and policy of a buffer to create.
///
/// Defaults: host and kernel access both read-write, plain device
/// allocation. Adjust the public fields before passing the descriptor to
/// [`Context::create_buffer`].
#[derive(Clone, Debug)]
pub struct BufferDesc {
    /// Element type.
    pub native_type: NativeType,
    /// Length in elements. Must be positive.
    pub length: u64,
    /// Access from the calling program.
    pub host_access: AccessPolicy,
    /// Access from code running on the device.
    pub kernel_access: AccessPolicy,
    /// How backing memory is obtained.
    pub mem_alloc: MemAlloc,
}

impl BufferDesc {
    /// A read-write buffer of `length` elements of `native_type`.
    pub fn new(native_type: NativeType, length: u64) -> Self {
        Self {
            native_type,
            length,
            host_access: AccessPolicy::ReadWrite,
            kernel_access: AccessPolicy::ReadWrite,
            mem_alloc: MemAlloc::None,
        }
    }
}

/// A linear device memory allocation of typed elements.
pub struct Buffer {
    context: Weak<ContextInner>,
    native_type: NativeType,
    length: u64,
    size_in_bytes: u64,
    host_access: AccessPolicy,
    kernel_access: AccessPolicy,
    guard: HandleGuard,
}

impl Buffer {
    pub(crate) fn create(inner: &Arc<ContextInner>, desc: BufferDesc) -> Result<Self> {
        if desc.length == 0 {
            return Err(Error::InvalidBufferLength);
        }
        if desc.host_access == AccessPolicy::None && desc.kernel_access == AccessPolicy::None {
            return Err(Error::InvalidAccessCombination);
        }
        let size_in_bytes = desc
            .length
            .checked_mul(desc.native_type.size_in_bytes())
            .ok_or(Error::SizeOverflow)?;

        let backend = inner.backend();
        let handle = backend.buffer_handle(
            inner.handle(),
            desc.host_access,
            desc.kernel_access,
            desc.mem_alloc,
            size_in_bytes,
        )?;
        Ok(Self {
            context: Arc::downgrade(inner),
            native_type: desc.native_type,
            length: desc.length,
            size_in_bytes,
            host_access: desc.host_access,
            kernel_access: desc.kernel_access,
            guard: HandleGuard::new(backend.clone(), handle),
        })
    }

    /// Element type.
    pub fn native_type(&self) -> NativeType {
        self.native_type
    }

    /// Length in elements.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Total size: length times element size.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// Access policy from the calling program.
    pub fn host_access(&self) -> AccessPolicy {
        self.host_access
    }

    /// Access policy from device code.
    pub fn kernel_access(&self) -> AccessPolicy {
        self.kernel_access
    }

    /// The owning context, if it is still alive.
    pub fn context(&self) -> Option<Context> {
        self.context.upgrade().map(Context::from_inner)
    }
}

impl Resource for Buffer {
    fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        self.guard.backend()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.guard.handle())
            .field("native_type", &self.native_type)
            .field("length", &self.length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opal::Opal;
    use opal_backend::{MockBackend, MockDevice};

    fn context() -> (Arc<MockBackend>, Context) {
        let backend = Arc::new(MockBackend::new().with_platform("p", vec![MockDevice::gpu("g")]));
        let device = Opal::new(backend.clone()).all_devices().unwrap().remove(0);
        let context = device.create_context().unwrap();
        (backend, context)
    }

    #[test]
    fn test_size_is_length_times_element_size() {
        let (_backend, context) = context();
        for (native_type, size) in [
            (NativeType::U8, 1),
            (NativeType::I16, 2),
            (NativeType::F32, 4),
            (NativeType::F64, 8),
        ] {
            let buffer = context
                .create_buffer(BufferDesc::new(native_type, 1000))
                .unwrap();
            assert_eq!(buffer.length(), 1000);
            assert_eq!(buffer.size_in_bytes(), 1000 * size);
        }
    }

    #[test]
    fn test_zero_length_rejected_before_backend_call() {
        let (backend, context) = context();
        let allocations_before = backend.allocation_count();

        let result = context.create_buffer(BufferDesc::new(NativeType::F32, 0));
        assert_eq!(result.unwrap_err(), Error::InvalidBufferLength);
        assert_eq!(backend.allocation_count(), allocations_before);
    }

    #[test]
    fn test_size_overflow_rejected() {
        let (backend, context) = context();
        let allocations_before = backend.allocation_count();

        let result = context.create_buffer(BufferDesc::new(NativeType::F64, u64::MAX / 2));
        assert_eq!(result.unwrap_err(), Error::SizeOverflow);
        assert_eq!(backend.allocation_count(), allocations_before);
    }

    #[test]
    fn test_inaccessible_buffer_rejected() {
        let (_backend, context) = context();
        let mut desc = BufferDesc::new(NativeType::F32, 16);
        desc.host_access = AccessPolicy::None;
        desc.kernel_access = AccessPolicy::None;
        assert_eq!(
            context.create_buffer(desc).unwrap_err(),
            Error::InvalidAccessCombination
        );
    }

    #[test]
    fn test_drop_releases_handle() {
        let (backend, context) = context();
        let buffer = context
            .create_buffer(BufferDesc::new(NativeType::F32, 16))
            .unwrap();
        let handle = buffer.handle();

        assert!(!backend.was_released(handle));
        drop(buffer);
        assert!(backend.was_released(handle));
    }

    #[test]
    fn test_parent_lookup_through_buffer() {
        let (_backend, context) = context();
        let buffer = context
            .create_buffer(BufferDesc::new(NativeType::F32, 16))
            .unwrap();

        // A buffer can report its context's device name without owning
        // either the context or the device.
        let name = buffer.context().unwrap().device().name().to_string();
        assert_eq!(name, "g");

        drop(context);
        assert!(buffer.context().is_none());
    }
}
