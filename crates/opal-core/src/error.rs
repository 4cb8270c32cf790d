//! Resource-layer error types.

use opal_backend::BackendError;
use thiserror::Error;

/// Errors from the resource layer.
///
/// Argument validation happens before any backend call, so an invalid shape
/// never reaches the driver. Backend failures pass through unchanged via
/// [`Error::Backend`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Buffer length must be at least one element.
    #[error("buffer length must be positive")]
    InvalidBufferLength,

    /// Images take one, two, or three extents.
    #[error("images take 1 to 3 dimensions, got {0}")]
    InvalidImageDimensions(usize),

    /// Every image extent must be at least one.
    #[error("image extents must be positive")]
    InvalidImageExtent,

    /// The computed byte size does not fit in a u64.
    #[error("resource byte size overflows")]
    SizeOverflow,

    /// A resource no side can touch is a caller mistake.
    #[error("host and kernel access cannot both be None")]
    InvalidAccessCombination,

    /// Sources cannot be added to a program that was already built.
    #[error("program is already built")]
    AlreadyBuilt,

    /// Kernels can only be extracted from a built program.
    #[error("program is not built")]
    NotBuilt,

    /// Building a program with no attached sources.
    #[error("program has no sources")]
    NoSources,

    /// The parent context was released before this operation.
    #[error("context has been released")]
    ContextReleased,

    /// Driver-level failure, propagated unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for resource-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
