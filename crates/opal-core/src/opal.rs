//! The entry point: enumeration and best-device presets.

use std::sync::Arc;

use opal_backend::Backend;

use crate::device::Device;
use crate::error::Result;
use crate::platform::Platform;
use crate::selector::{
    self, BadDeviceSelector, DeviceSelector, DeviceTypeSelector, FastestDeviceSelector,
    GlobalMemorySelector,
};

/// Root of the resource graph for one driver backend.
///
/// Construct one `Opal` per backend and keep it for the life of the
/// application; everything else (platforms, devices, contexts, resources)
/// is obtained from it.
pub struct Opal {
    backend: Arc<dyn Backend>,
}

impl Opal {
    /// Creates an instance over the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The shared backend reference.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Number of available platforms.
    pub fn num_platforms(&self) -> Result<usize> {
        Ok(self.backend.num_platforms()?)
    }

    /// Returns the platform at `index`.
    pub fn platform(&self, index: usize) -> Result<Platform> {
        let handle = self.backend.platform_handle(index)?;
        Ok(Platform::new(self.backend.clone(), handle, index))
    }

    /// All devices across all platforms, in driver enumeration order.
    ///
    /// Walks platforms and devices in ascending index order and preserves
    /// the driver's ordering; the result is stable across calls against
    /// unchanged driver state. Nothing is cached: every call re-queries
    /// the backend.
    pub fn all_devices(&self) -> Result<Vec<Device>> {
        let mut devices = Vec::new();
        for platform_index in 0..self.num_platforms()? {
            let platform = self.platform(platform_index)?;
            for device_index in 0..platform.num_devices()? {
                devices.push(platform.device(device_index)?);
            }
        }
        Ok(devices)
    }

    /// Applies a selector chain to all devices and returns the survivors.
    ///
    /// Selectors run in the given order, each seeing only the survivors of
    /// the previous one. Filtering stops as soon as a single candidate
    /// remains, so later selectors may never run at all. The result
    /// preserves enumeration order and may be empty; an empty result is
    /// absence, not an error.
    pub fn best_devices(
        &self,
        mut selectors: Vec<Box<dyn DeviceSelector>>,
    ) -> Result<Vec<Device>> {
        Ok(selector::run_pipeline(self.all_devices()?, &mut selectors))
    }

    /// The first survivor of [`best_devices`](Opal::best_devices), if any.
    pub fn best_device(&self, selectors: Vec<Box<dyn DeviceSelector>>) -> Result<Option<Device>> {
        Ok(self.best_devices(selectors)?.into_iter().next())
    }

    /// The fastest GPU, avoiding slow integrated parts (Iris is tolerated).
    pub fn fastest_gpu_device(&self) -> Result<Option<Device>> {
        self.best_device(vec![
            Box::new(DeviceTypeSelector::gpu()),
            Box::new(BadDeviceSelector::NotSlowIntegratedIntel),
            Box::new(FastestDeviceSelector::new()),
        ])
    }

    /// The GPU with the most global memory, excluding integrated parts.
    pub fn largest_gpu_device(&self) -> Result<Option<Device>> {
        self.best_device(vec![
            Box::new(DeviceTypeSelector::gpu()),
            Box::new(BadDeviceSelector::NotIntegratedIntel),
            Box::new(GlobalMemorySelector::new()),
        ])
    }

    /// The fastest CPU device.
    pub fn best_cpu_device(&self) -> Result<Option<Device>> {
        self.best_device(vec![
            Box::new(DeviceTypeSelector::cpu()),
            Box::new(FastestDeviceSelector::new()),
        ])
    }
}

impl std::fmt::Debug for Opal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opal")
            .field("backend", &self.backend.name())
            .finish()
    }
}
