//! Driver platforms.

use std::sync::Arc;

use opal_backend::{Backend, PeerHandle};

use crate::device::{Device, DeviceInfo};
use crate::error::Result;
use crate::resource::Resource;

/// One driver platform (a vendor's installed runtime).
///
/// Platform handles are driver-owned and never released by this layer.
pub struct Platform {
    backend: Arc<dyn Backend>,
    handle: PeerHandle,
    index: usize,
}

impl Platform {
    pub(crate) fn new(backend: Arc<dyn Backend>, handle: PeerHandle, index: usize) -> Self {
        Self {
            backend,
            handle,
            index,
        }
    }

    /// Human-readable platform name.
    pub fn name(&self) -> Result<String> {
        Ok(self.backend.platform_name(self.handle)?)
    }

    /// Index of this platform in enumeration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of devices on this platform.
    pub fn num_devices(&self) -> Result<usize> {
        Ok(self.backend.num_devices(self.handle)?)
    }

    /// Returns device `index`, with its property snapshot taken eagerly.
    pub fn device(&self, index: usize) -> Result<Device> {
        let handle = self.backend.device_handle(self.handle, index)?;
        let info = DeviceInfo {
            device_type: self.backend.device_type(handle)?,
            name: self.backend.device_name(handle)?,
            global_memory: self.backend.device_global_memory(handle)?,
            compute_units: self.backend.device_compute_units(handle)?,
            clock_frequency_mhz: self.backend.device_clock_frequency(handle)?,
            platform_index: self.index,
            device_index: index,
        };
        Ok(Device::new(self.backend.clone(), handle, info))
    }
}

impl Resource for Platform {
    fn handle(&self) -> PeerHandle {
        self.handle
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("index", &self.index)
            .field("handle", &self.handle)
            .finish()
    }
}
