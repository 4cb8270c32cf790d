//! Shared vocabulary between the resource layer and driver backends.

/// Broad category of a compute device, as reported by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// Discrete or integrated GPU.
    Gpu,
    /// Host CPU exposed as a compute device.
    Cpu,
    /// Dedicated accelerator (FPGA, DSP, ...).
    Accelerator,
    /// Anything the driver does not classify.
    Other,
}

/// Declared read/write capability of a memory resource.
///
/// Used twice per resource: once for the calling program (host access) and
/// once for code executing on the device (kernel access).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessPolicy {
    /// No access from this side.
    None,
    /// Read-only.
    ReadOnly,
    /// Write-only.
    WriteOnly,
    /// Read and write.
    #[default]
    ReadWrite,
}

/// How backing memory for a buffer is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemAlloc {
    /// Plain device allocation.
    #[default]
    None,
    /// Ask the driver to also allocate pinned host-visible memory.
    AllocateHostPointer,
}

/// Element type of a buffer, with its size in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F16,
    F32,
    F64,
}

impl NativeType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(self) -> u64 {
        match self {
            NativeType::I8 | NativeType::U8 => 1,
            NativeType::I16 | NativeType::U16 | NativeType::F16 => 2,
            NativeType::I32 | NativeType::U32 | NativeType::F32 => 4,
            NativeType::I64 | NativeType::U64 | NativeType::F64 => 8,
        }
    }
}

/// Dimensionality of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageType {
    Image1d,
    Image2d,
    Image3d,
}

impl ImageType {
    /// Infers the image type from the number of supplied extents.
    ///
    /// Returns `None` for anything other than 1, 2, or 3 extents.
    pub fn from_dimension_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ImageType::Image1d),
            2 => Some(ImageType::Image2d),
            3 => Some(ImageType::Image3d),
            _ => None,
        }
    }

    /// Number of extents this image type carries.
    pub fn dimension_count(self) -> usize {
        match self {
            ImageType::Image1d => 1,
            ImageType::Image2d => 2,
            ImageType::Image3d => 3,
        }
    }
}

/// Channel layout of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Intensity,
    Luminance,
    R,
    Rg,
    Rgb,
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// Number of channels per pixel.
    pub fn channel_count(self) -> usize {
        match self {
            ChannelOrder::Intensity | ChannelOrder::Luminance | ChannelOrder::R => 1,
            ChannelOrder::Rg => 2,
            ChannelOrder::Rgb => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra => 4,
        }
    }
}

/// Per-channel storage type of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelDataType {
    SignedInt8,
    SignedInt16,
    SignedInt32,
    UnsignedInt8,
    UnsignedInt16,
    UnsignedInt32,
    SignedNormalizedInt8,
    SignedNormalizedInt16,
    UnsignedNormalizedInt8,
    UnsignedNormalizedInt16,
    HalfFloat,
    Float,
}

impl ChannelDataType {
    /// Size of one channel in bytes.
    pub fn size_in_bytes(self) -> u64 {
        match self {
            ChannelDataType::SignedInt8
            | ChannelDataType::UnsignedInt8
            | ChannelDataType::SignedNormalizedInt8
            | ChannelDataType::UnsignedNormalizedInt8 => 1,
            ChannelDataType::SignedInt16
            | ChannelDataType::UnsignedInt16
            | ChannelDataType::SignedNormalizedInt16
            | ChannelDataType::UnsignedNormalizedInt16
            | ChannelDataType::HalfFloat => 2,
            ChannelDataType::SignedInt32 | ChannelDataType::UnsignedInt32 | ChannelDataType::Float => 4,
        }
    }
}
