//! Backend error types.

use thiserror::Error;

/// Errors surfaced by a driver backend.
///
/// These propagate unchanged through the resource layer: opal performs no
/// retries and no fallback beyond what a selector chain expresses.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Platform index out of range.
    #[error("no such platform: index {0}")]
    NoSuchPlatform(usize),

    /// Device index out of range for the platform.
    #[error("no such device: index {0}")]
    NoSuchDevice(usize),

    /// Handle does not refer to a live native resource.
    #[error("unknown handle")]
    UnknownHandle,

    /// The device has no memory left for the requested allocation.
    #[error("out of device memory")]
    OutOfDeviceMemory,

    /// The driver rejected the channel order / data type combination.
    #[error("unsupported image format")]
    UnsupportedImageFormat,

    /// Program build failed; the payload carries the driver's build log.
    #[error("program build failed: {0}")]
    BuildFailed(String),

    /// No kernel with the given name exists in the built program.
    #[error("kernel not found: {0}")]
    KernelNotFound(String),

    /// Any other driver-level failure.
    #[error("driver error: {0}")]
    Driver(String),
}
