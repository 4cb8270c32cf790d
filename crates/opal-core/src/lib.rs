//! Typed resource handles and device selection atop a compute driver.
//!
//! opal wraps a native heterogeneous-compute driver (exposed as the
//! [`Backend`] trait from `opal-backend`) in an ownership-safe resource
//! graph, and picks "the right" device among heterogeneous candidates with
//! a composable selector pipeline instead of hand-rolled driver quirks.
//!
//! # Core Types
//!
//! - [`Opal`] - Root: enumeration and best-device presets
//! - [`Device`] / [`Platform`] - Enumeration results with property snapshots
//! - [`DeviceSelector`] - Filtering/ranking predicate, composed into chains
//! - [`Context`] - Allocation scope, bound to one device, with a default [`Queue`]
//! - [`Buffer`] / [`Image`] / [`Program`] / [`Kernel`] - Owned resources
//!
//! Every resource releases its native handle on drop, exactly once, on
//! every exit path. Children hold non-owning back-references to parents;
//! the one exception is a context's default queue, which the context owns
//! and releases before its own handle.
//!
//! # Quick Start
//!
//! ```
//! use opal_core::{BufferDesc, NativeType, Opal};
//! use opal_backend::{MockBackend, MockDevice};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(
//!     MockBackend::new().with_platform("sim", vec![MockDevice::gpu("Sim GPU")]),
//! );
//! let opal = Opal::new(backend);
//!
//! let device = opal.fastest_gpu_device()?.expect("a GPU is present");
//! let context = device.create_context()?;
//! let buffer = context.create_buffer(BufferDesc::new(NativeType::F32, 1024))?;
//! assert_eq!(buffer.size_in_bytes(), 4096);
//! # Ok::<(), opal_core::Error>(())
//! ```
//!
//! # Selector chains
//!
//! Selectors apply strictly in the order given, each seeing only the
//! survivors of the previous one, and the pipeline stops as soon as one
//! candidate remains — a later selector may never run. The presets on
//! [`Opal`] are fixed chains of the built-in selectors.

mod buffer;
mod context;
mod device;
mod error;
mod image;
mod opal;
mod platform;
mod program;
mod queue;
mod resource;
mod selector;

pub use buffer::{Buffer, BufferDesc};
pub use context::Context;
pub use device::{Device, DeviceInfo};
pub use error::{Error, Result};
pub use image::{Image, ImageDesc};
pub use opal::Opal;
pub use platform::Platform;
pub use program::{Kernel, Program};
pub use queue::Queue;
pub use resource::Resource;
pub use selector::{
    BadDeviceSelector, DeviceSelector, DeviceTypeSelector, FastestDeviceSelector,
    GlobalMemorySelector,
};

// Re-export the backend vocabulary for convenience.
pub use opal_backend::{
    AccessPolicy, Backend, BackendError, ChannelDataType, ChannelOrder, DeviceType, ImageType,
    MemAlloc, NativeType, PeerHandle,
};
