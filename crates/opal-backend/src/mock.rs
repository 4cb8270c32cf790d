//! In-memory backend for tests and driverless runs.
//!
//! [`MockBackend`] implements [`Backend`] over a caller-described table of
//! platforms and devices. It mints deterministic handles, validates that
//! parent handles are known, and records every allocation and release so
//! tests can assert on backend traffic.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::backend::{Backend, PeerHandle};
use crate::error::BackendError;
use crate::types::{AccessPolicy, ChannelDataType, ChannelOrder, DeviceType, ImageType, MemAlloc};

const PLATFORM_BASE: u64 = 0x1000;
const DEVICE_BASE: u64 = 0x2000;
const ALLOC_BASE: u64 = 0x1_0000_0000;

/// Description of one simulated device.
#[derive(Clone, Debug)]
pub struct MockDevice {
    pub device_type: DeviceType,
    pub name: String,
    pub global_memory: u64,
    pub compute_units: u32,
    pub clock_frequency_mhz: u32,
}

impl MockDevice {
    /// Creates a device with middling defaults (4 GiB, 16 units, 1000 MHz).
    pub fn new(device_type: DeviceType, name: impl Into<String>) -> Self {
        Self {
            device_type,
            name: name.into(),
            global_memory: 4 << 30,
            compute_units: 16,
            clock_frequency_mhz: 1000,
        }
    }

    /// A GPU device with default properties.
    pub fn gpu(name: impl Into<String>) -> Self {
        Self::new(DeviceType::Gpu, name)
    }

    /// A CPU device with default properties.
    pub fn cpu(name: impl Into<String>) -> Self {
        Self::new(DeviceType::Cpu, name)
    }

    /// Sets the global memory size in bytes.
    pub fn global_memory(mut self, bytes: u64) -> Self {
        self.global_memory = bytes;
        self
    }

    /// Sets the compute unit count.
    pub fn compute_units(mut self, units: u32) -> Self {
        self.compute_units = units;
        self
    }

    /// Sets the clock frequency in MHz.
    pub fn clock_frequency_mhz(mut self, mhz: u32) -> Self {
        self.clock_frequency_mhz = mhz;
        self
    }
}

/// What a recorded allocation created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationKind {
    Context,
    Queue,
    Buffer,
    Image,
    Program,
    Kernel,
}

/// One allocation performed by the mock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationRecord {
    pub kind: AllocationKind,
    pub handle: PeerHandle,
}

struct MockPlatform {
    name: String,
    handle: PeerHandle,
    devices: Vec<(PeerHandle, MockDevice)>,
}

#[derive(Default)]
struct MockState {
    next_alloc: u64,
    allocations: Vec<AllocationRecord>,
    released: Vec<PeerHandle>,
    live: HashSet<u64>,
    fail_next: Option<BackendError>,
    fail_at: Option<(usize, BackendError)>,
}

/// In-memory [`Backend`] implementation.
///
/// Platform and device handles are fixed at construction time, so
/// enumeration is stable across calls. Allocated handles are sequential.
pub struct MockBackend {
    platforms: Vec<MockPlatform>,
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Creates a backend with no platforms.
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Adds a platform with the given devices.
    pub fn with_platform(mut self, name: impl Into<String>, devices: Vec<MockDevice>) -> Self {
        let platform_index = self.platforms.len() as u64;
        let devices = devices
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                (
                    PeerHandle::new(DEVICE_BASE + platform_index * 0x100 + i as u64),
                    d,
                )
            })
            .collect();
        self.platforms.push(MockPlatform {
            name: name.into(),
            handle: PeerHandle::new(PLATFORM_BASE + platform_index),
            devices,
        });
        self
    }

    /// Makes the next allocating call fail with `error`.
    pub fn fail_next_allocation(&self, error: BackendError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Makes the allocating call fail once the mock has already performed
    /// `count` allocations. Useful for failing mid-way through a multi-step
    /// construction (a context's default queue, say).
    pub fn fail_nth_allocation(&self, count: usize, error: BackendError) {
        self.state.lock().unwrap().fail_at = Some((count, error));
    }

    /// Number of allocations performed so far.
    pub fn allocation_count(&self) -> usize {
        self.state.lock().unwrap().allocations.len()
    }

    /// All allocations performed so far, in order.
    pub fn allocations(&self) -> Vec<AllocationRecord> {
        self.state.lock().unwrap().allocations.clone()
    }

    /// All released handles, in release order.
    pub fn released_handles(&self) -> Vec<PeerHandle> {
        self.state.lock().unwrap().released.clone()
    }

    /// Returns `true` if the given handle has been released.
    pub fn was_released(&self, handle: PeerHandle) -> bool {
        self.state.lock().unwrap().released.contains(&handle)
    }

    fn find_platform(&self, handle: PeerHandle) -> Result<&MockPlatform, BackendError> {
        self.platforms
            .iter()
            .find(|p| p.handle == handle)
            .ok_or(BackendError::UnknownHandle)
    }

    fn find_device(&self, handle: PeerHandle) -> Result<&MockDevice, BackendError> {
        self.platforms
            .iter()
            .flat_map(|p| p.devices.iter())
            .find(|(h, _)| *h == handle)
            .map(|(_, d)| d)
            .ok_or(BackendError::UnknownHandle)
    }

    fn check_live(&self, handle: PeerHandle) -> Result<(), BackendError> {
        if self.state.lock().unwrap().live.contains(&handle.raw()) {
            Ok(())
        } else {
            Err(BackendError::UnknownHandle)
        }
    }

    fn mint(&self, kind: AllocationKind) -> Result<PeerHandle, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let fail_now = matches!(&state.fail_at, Some((count, _)) if *count == state.allocations.len());
        if fail_now {
            let (_, error) = state.fail_at.take().expect("checked above");
            return Err(error);
        }
        let handle = PeerHandle::new(ALLOC_BASE + state.next_alloc);
        state.next_alloc += 1;
        state.allocations.push(AllocationRecord { kind, handle });
        state.live.insert(handle.raw());
        Ok(handle)
    }

    fn record_release(&self, handle: PeerHandle) {
        let mut state = self.state.lock().unwrap();
        state.live.remove(&handle.raw());
        state.released.push(handle);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn num_platforms(&self) -> Result<usize, BackendError> {
        Ok(self.platforms.len())
    }

    fn platform_handle(&self, index: usize) -> Result<PeerHandle, BackendError> {
        self.platforms
            .get(index)
            .map(|p| p.handle)
            .ok_or(BackendError::NoSuchPlatform(index))
    }

    fn platform_name(&self, platform: PeerHandle) -> Result<String, BackendError> {
        Ok(self.find_platform(platform)?.name.clone())
    }

    fn num_devices(&self, platform: PeerHandle) -> Result<usize, BackendError> {
        Ok(self.find_platform(platform)?.devices.len())
    }

    fn device_handle(
        &self,
        platform: PeerHandle,
        index: usize,
    ) -> Result<PeerHandle, BackendError> {
        self.find_platform(platform)?
            .devices
            .get(index)
            .map(|(h, _)| *h)
            .ok_or(BackendError::NoSuchDevice(index))
    }

    fn device_type(&self, device: PeerHandle) -> Result<DeviceType, BackendError> {
        Ok(self.find_device(device)?.device_type)
    }

    fn device_name(&self, device: PeerHandle) -> Result<String, BackendError> {
        Ok(self.find_device(device)?.name.clone())
    }

    fn device_global_memory(&self, device: PeerHandle) -> Result<u64, BackendError> {
        Ok(self.find_device(device)?.global_memory)
    }

    fn device_compute_units(&self, device: PeerHandle) -> Result<u32, BackendError> {
        Ok(self.find_device(device)?.compute_units)
    }

    fn device_clock_frequency(&self, device: PeerHandle) -> Result<u32, BackendError> {
        Ok(self.find_device(device)?.clock_frequency_mhz)
    }

    fn context_handle(&self, device: PeerHandle) -> Result<PeerHandle, BackendError> {
        self.find_device(device)?;
        self.mint(AllocationKind::Context)
    }

    fn queue_handle(
        &self,
        device: PeerHandle,
        context: PeerHandle,
        _in_order: bool,
    ) -> Result<PeerHandle, BackendError> {
        self.find_device(device)?;
        self.check_live(context)?;
        self.mint(AllocationKind::Queue)
    }

    fn buffer_handle(
        &self,
        context: PeerHandle,
        _host_access: AccessPolicy,
        _kernel_access: AccessPolicy,
        _mem_alloc: MemAlloc,
        _size_bytes: u64,
    ) -> Result<PeerHandle, BackendError> {
        self.check_live(context)?;
        self.mint(AllocationKind::Buffer)
    }

    fn image_handle(
        &self,
        context: PeerHandle,
        _host_access: AccessPolicy,
        _kernel_access: AccessPolicy,
        _image_type: ImageType,
        _channel_order: ChannelOrder,
        _channel_data_type: ChannelDataType,
        _dimensions: &[u64],
    ) -> Result<PeerHandle, BackendError> {
        self.check_live(context)?;
        self.mint(AllocationKind::Image)
    }

    fn program_handle(
        &self,
        context: PeerHandle,
        sources: &[String],
    ) -> Result<PeerHandle, BackendError> {
        self.check_live(context)?;
        if sources.is_empty() {
            return Err(BackendError::BuildFailed("no source".into()));
        }
        self.mint(AllocationKind::Program)
    }

    fn kernel_handle(&self, program: PeerHandle, _name: &str) -> Result<PeerHandle, BackendError> {
        self.check_live(program)?;
        self.mint(AllocationKind::Kernel)
    }

    fn release_context(&self, handle: PeerHandle) {
        self.record_release(handle);
    }

    fn release(&self, handle: PeerHandle) {
        self.record_release(handle);
    }
}
