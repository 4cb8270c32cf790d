//! The backend trait driver bindings implement.

use crate::error::BackendError;
use crate::types::{AccessPolicy, ChannelDataType, ChannelOrder, DeviceType, ImageType, MemAlloc};

/// Opaque identifier for one native resource instance.
///
/// A handle is minted by a [`Backend`] and carries a pointer-sized,
/// backend-specific value. The resource layer guarantees that at most one
/// live resource wraps a given handle; once that resource releases it, the
/// handle must never reach the backend again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerHandle(u64);

impl PeerHandle {
    /// Wraps a raw backend-specific value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend-specific value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A native compute driver, as seen by the resource layer.
///
/// Implementations perform the actual driver calls; the resource layer owns
/// lifecycles and never interprets handle values. All calls are synchronous
/// and blocking. The trait is `Send + Sync` so one backend instance can be
/// shared by reference across an application's whole object graph; the
/// resource layer itself never issues concurrent calls against it.
///
/// Enumeration methods must be deterministic: repeated calls against
/// unchanged driver state return the same counts and the same handles in
/// the same order.
pub trait Backend: Send + Sync {
    /// Short name of the driver binding, for diagnostics.
    fn name(&self) -> &str;

    /// Number of available platforms.
    fn num_platforms(&self) -> Result<usize, BackendError>;

    /// Handle for the platform at `index`.
    fn platform_handle(&self, index: usize) -> Result<PeerHandle, BackendError>;

    /// Human-readable platform name.
    fn platform_name(&self, platform: PeerHandle) -> Result<String, BackendError>;

    /// Number of devices on a platform.
    fn num_devices(&self, platform: PeerHandle) -> Result<usize, BackendError>;

    /// Handle for device `index` on a platform.
    fn device_handle(&self, platform: PeerHandle, index: usize)
        -> Result<PeerHandle, BackendError>;

    /// Reported category of a device.
    fn device_type(&self, device: PeerHandle) -> Result<DeviceType, BackendError>;

    /// Vendor/name string of a device.
    fn device_name(&self, device: PeerHandle) -> Result<String, BackendError>;

    /// Global memory size of a device, in bytes.
    fn device_global_memory(&self, device: PeerHandle) -> Result<u64, BackendError>;

    /// Number of parallel compute units.
    fn device_compute_units(&self, device: PeerHandle) -> Result<u32, BackendError>;

    /// Maximum clock frequency, in MHz.
    fn device_clock_frequency(&self, device: PeerHandle) -> Result<u32, BackendError>;

    /// Allocates a context on a device.
    fn context_handle(&self, device: PeerHandle) -> Result<PeerHandle, BackendError>;

    /// Allocates a command queue on a context.
    fn queue_handle(
        &self,
        device: PeerHandle,
        context: PeerHandle,
        in_order: bool,
    ) -> Result<PeerHandle, BackendError>;

    /// Allocates a buffer of `size_bytes` on a context.
    fn buffer_handle(
        &self,
        context: PeerHandle,
        host_access: AccessPolicy,
        kernel_access: AccessPolicy,
        mem_alloc: MemAlloc,
        size_bytes: u64,
    ) -> Result<PeerHandle, BackendError>;

    /// Allocates an image on a context.
    ///
    /// `dimensions` carries one extent per axis; its length matches
    /// `image_type`'s dimensionality (the resource layer validates this
    /// before calling).
    #[allow(clippy::too_many_arguments)]
    fn image_handle(
        &self,
        context: PeerHandle,
        host_access: AccessPolicy,
        kernel_access: AccessPolicy,
        image_type: ImageType,
        channel_order: ChannelOrder,
        channel_data_type: ChannelDataType,
        dimensions: &[u64],
    ) -> Result<PeerHandle, BackendError>;

    /// Creates and builds a program from concatenated source fragments.
    fn program_handle(
        &self,
        context: PeerHandle,
        sources: &[String],
    ) -> Result<PeerHandle, BackendError>;

    /// Extracts a kernel by name from a built program.
    fn kernel_handle(&self, program: PeerHandle, name: &str) -> Result<PeerHandle, BackendError>;

    /// Releases a context handle.
    fn release_context(&self, handle: PeerHandle);

    /// Releases any other handle kind.
    fn release(&self, handle: PeerHandle);
}
