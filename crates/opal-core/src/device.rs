//! Compute devices and their selection-relevant properties.

use std::sync::Arc;

use opal_backend::{Backend, DeviceType, PeerHandle};

use crate::context::Context;
use crate::error::Result;
use crate::resource::Resource;

/// Immutable snapshot of a device's selection-relevant properties.
///
/// Taken once at enumeration time; selection never goes back to the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Reported device category.
    pub device_type: DeviceType,
    /// Vendor/name string, used to blacklist known-bad configurations.
    pub name: String,
    /// Global memory size in bytes.
    pub global_memory: u64,
    /// Number of parallel compute units.
    pub compute_units: u32,
    /// Maximum clock frequency in MHz.
    pub clock_frequency_mhz: u32,
    /// Index of the owning platform in enumeration order.
    pub platform_index: usize,
    /// Index of this device within its platform.
    pub device_index: usize,
}

struct DeviceInner {
    backend: Arc<dyn Backend>,
    handle: PeerHandle,
    info: DeviceInfo,
}

/// One compute device.
///
/// Devices are cheap to clone and immutable; platform and device handles
/// are driver-owned, so nothing is released when the last clone drops.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    pub(crate) fn new(backend: Arc<dyn Backend>, handle: PeerHandle, info: DeviceInfo) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                backend,
                handle,
                info,
            }),
        }
    }

    /// The property snapshot taken at enumeration time.
    pub fn info(&self) -> &DeviceInfo {
        &self.inner.info
    }

    /// Reported device category.
    pub fn device_type(&self) -> DeviceType {
        self.inner.info.device_type
    }

    /// Vendor/name string.
    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Global memory size in bytes.
    pub fn global_memory(&self) -> u64 {
        self.inner.info.global_memory
    }

    /// Relative speed metric: compute units times clock frequency.
    ///
    /// A throughput proxy, meaningful only for comparing devices against
    /// each other.
    pub fn speed(&self) -> u64 {
        self.inner.info.compute_units as u64 * self.inner.info.clock_frequency_mhz as u64
    }

    /// Creates a context bound to this device.
    ///
    /// The context eagerly creates its default queue.
    pub fn create_context(&self) -> Result<Context> {
        Context::new(self)
    }
}

impl Resource for Device {
    fn handle(&self) -> PeerHandle {
        self.inner.handle
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Device {}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.inner.handle)
            .field("info", &self.inner.info)
            .finish()
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = &self.inner.info;
        write!(
            f,
            "{} [{:?}] {} units @ {} MHz, {} MB",
            info.name,
            info.device_type,
            info.compute_units,
            info.clock_frequency_mhz,
            info.global_memory >> 20
        )
    }
}
