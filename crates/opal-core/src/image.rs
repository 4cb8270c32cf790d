//! Device images.

use std::sync::{Arc, Weak};

use opal_backend::{
    AccessPolicy, Backend, ChannelDataType, ChannelOrder, ImageType, PeerHandle,
};

use crate::context::{Context, ContextInner};
use crate::error::{Error, Result};
use crate::resource::{HandleGuard, Resource};

/// Shape and policy of an image to create.
///
/// Dimensionality is inferred from how many extents are supplied: one for
/// 1D, two for 2D, three for 3D. Defaults: host and kernel access both
/// read-write.
#[derive(Clone, Debug)]
pub struct ImageDesc {
    /// Channel layout per pixel.
    pub channel_order: ChannelOrder,
    /// Per-channel storage type.
    pub channel_data_type: ChannelDataType,
    /// One extent per axis, each positive.
    pub dimensions: Vec<u64>,
    /// Access from the calling program.
    pub host_access: AccessPolicy,
    /// Access from code running on the device.
    pub kernel_access: AccessPolicy,
}

impl ImageDesc {
    /// A read-write image with the given format and extents.
    pub fn new(
        channel_order: ChannelOrder,
        channel_data_type: ChannelDataType,
        dimensions: &[u64],
    ) -> Self {
        Self {
            channel_order,
            channel_data_type,
            dimensions: dimensions.to_vec(),
            host_access: AccessPolicy::ReadWrite,
            kernel_access: AccessPolicy::ReadWrite,
        }
    }
}

/// A 1D, 2D, or 3D device image.
pub struct Image {
    context: Weak<ContextInner>,
    image_type: ImageType,
    channel_order: ChannelOrder,
    channel_data_type: ChannelDataType,
    dimensions: Vec<u64>,
    size_in_bytes: u64,
    host_access: AccessPolicy,
    kernel_access: AccessPolicy,
    guard: HandleGuard,
}

impl Image {
    pub(crate) fn create(inner: &Arc<ContextInner>, desc: ImageDesc) -> Result<Self> {
        let image_type = ImageType::from_dimension_count(desc.dimensions.len())
            .ok_or(Error::InvalidImageDimensions(desc.dimensions.len()))?;
        if desc.dimensions.iter().any(|&extent| extent == 0) {
            return Err(Error::InvalidImageExtent);
        }
        if desc.host_access == AccessPolicy::None && desc.kernel_access == AccessPolicy::None {
            return Err(Error::InvalidAccessCombination);
        }
        let pixels = desc
            .dimensions
            .iter()
            .try_fold(1u64, |acc, &extent| acc.checked_mul(extent))
            .ok_or(Error::SizeOverflow)?;
        let pixel_size = desc.channel_order.channel_count() as u64
            * desc.channel_data_type.size_in_bytes();
        let size_in_bytes = pixels.checked_mul(pixel_size).ok_or(Error::SizeOverflow)?;

        let backend = inner.backend();
        let handle = backend.image_handle(
            inner.handle(),
            desc.host_access,
            desc.kernel_access,
            image_type,
            desc.channel_order,
            desc.channel_data_type,
            &desc.dimensions,
        )?;
        Ok(Self {
            context: Arc::downgrade(inner),
            image_type,
            channel_order: desc.channel_order,
            channel_data_type: desc.channel_data_type,
            dimensions: desc.dimensions,
            size_in_bytes,
            host_access: desc.host_access,
            kernel_access: desc.kernel_access,
            guard: HandleGuard::new(backend.clone(), handle),
        })
    }

    /// Inferred dimensionality.
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Channel layout per pixel.
    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    /// Per-channel storage type.
    pub fn channel_data_type(&self) -> ChannelDataType {
        self.channel_data_type
    }

    /// Extents, one per axis.
    pub fn dimensions(&self) -> &[u64] {
        &self.dimensions
    }

    /// Extent along the first axis.
    pub fn width(&self) -> u64 {
        self.dimensions[0]
    }

    /// Extent along the second axis, 1 for 1D images.
    pub fn height(&self) -> u64 {
        self.dimensions.get(1).copied().unwrap_or(1)
    }

    /// Extent along the third axis, 1 for 1D and 2D images.
    pub fn depth(&self) -> u64 {
        self.dimensions.get(2).copied().unwrap_or(1)
    }

    /// Total size: pixel count times channels times channel size.
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

impl Resource for Image {
    fn handle(&self) -> PeerHandle {
        self.guard.handle()
    }

    fn backend(&self) -> &Arc<dyn Backend> {
        self.guard.backend()
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.guard.handle())
            .field("image_type", &self.image_type)
            .field("dimensions", &self.dimensions)
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
    fn test_dimensionality_inference() {
        let (_backend, context) = context();
        let desc = |dims: &[u64]| ImageDesc::new(ChannelOrder::R, ChannelDataType::Float, dims);

        let image_1d = context.create_image(desc(&[64])).unwrap();
        assert_eq!(image_1d.image_type(), ImageType::Image1d);
        assert_eq!((image_1d.width(), image_1d.height(), image_1d.depth()), (64, 1, 1));

        let image_2d = context.create_image(desc(&[64, 32])).unwrap();
        assert_eq!(image_2d.image_type(), ImageType::Image2d);

        let image_3d = context.create_image(desc(&[64, 32, 8])).unwrap();
        assert_eq!(image_3d.image_type(), ImageType::Image3d);
        assert_eq!(image_3d.depth(), 8);
    }

    #[test]
    fn test_invalid_dimension_counts_rejected() {
        let (backend, context) = context();
        let allocations_before = backend.allocation_count();

        let empty = ImageDesc::new(ChannelOrder::R, ChannelDataType::Float, &[]);
        assert_eq!(
            context.create_image(empty).unwrap_err(),
            Error::InvalidImageDimensions(0)
        );

        let four = ImageDesc::new(ChannelOrder::R, ChannelDataType::Float, &[2, 2, 2, 2]);
        assert_eq!(
            context.create_image(four).unwrap_err(),
            Error::InvalidImageDimensions(4)
        );
        assert_eq!(backend.allocation_count(), allocations_before);
    }

    #[test]
    fn test_zero_extent_rejected() {
        let (_backend, context) = context();
        let desc = ImageDesc::new(ChannelOrder::R, ChannelDataType::Float, &[64, 0]);
        assert_eq!(
            context.create_image(desc).unwrap_err(),
            Error::InvalidImageExtent
        );
    }

    #[test]
    fn test_size_computation() {
        let (_backend, context) = context();
        let desc = ImageDesc::new(ChannelOrder::Rgba, ChannelDataType::UnsignedInt8, &[16, 16]);
        let image = context.create_image(desc).unwrap();
        assert_eq!(image.size_in_bytes(), 16 * 16 * 4);
    }

    #[test]
    fn test_drop_releases_handle() {
        let (backend, context) = context();
        let image = context
            .create_image(ImageDesc::new(ChannelOrder::R, ChannelDataType::Float, &[8]))
            .unwrap();
        let handle = image.handle();
        drop(image);
        assert!(backend.was_released(handle));
    }
}
