//! Driver boundary for opal.
//!
//! This crate defines the contract between the opal resource layer and a
//! native heterogeneous-compute driver (OpenCL, Level Zero, a simulator...).
//! Driver bindings implement [`Backend`]; everything above this crate talks
//! to the driver exclusively through that trait and the opaque [`PeerHandle`]
//! identifiers it mints.
//!
//! # Core Types
//!
//! - [`Backend`] - Trait a driver binding implements
//! - [`PeerHandle`] - Opaque identifier for one native resource
//! - [`BackendError`] - Driver-level failure taxonomy
//! - [`MockBackend`] - In-memory backend for tests and driverless runs
//!
//! # Quick Start
//!
//! ```
//! use opal_backend::{Backend, MockBackend, MockDevice};
//!
//! let backend = MockBackend::new()
//!     .with_platform("sim", vec![MockDevice::gpu("Sim GPU")]);
//!
//! assert_eq!(backend.num_platforms().unwrap(), 1);
//! ```

mod backend;
mod error;
mod mock;
mod types;

pub use backend::{Backend, PeerHandle};
pub use error::BackendError;
pub use mock::{AllocationKind, AllocationRecord, MockBackend, MockDevice};
pub use types::{
    AccessPolicy, ChannelDataType, ChannelOrder, DeviceType, ImageType, MemAlloc, NativeType,
};
