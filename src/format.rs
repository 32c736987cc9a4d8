//! Pixel formats of the scanout buffers and their hardware encoding

use log::warn;

/// Four character code of a buffer pixel format (DRM fourcc layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fourcc(pub u32);

impl Fourcc {
    /// Builds a code from its four characters
    pub const fn new(code: &[u8; 4]) -> Fourcc {
        Fourcc(
            code[0] as u32 | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24,
        )
    }

    /// XRGB 4:4:4:4 little endian
    pub const XRGB4444: Fourcc = Fourcc::new(b"XR12");
    /// XBGR 4:4:4:4 little endian
    pub const XBGR4444: Fourcc = Fourcc::new(b"XB12");
    /// RGBX 4:4:4:4 little endian
    pub const RGBX4444: Fourcc = Fourcc::new(b"RX12");
    /// BGRX 4:4:4:4 little endian
    pub const BGRX4444: Fourcc = Fourcc::new(b"BX12");
    /// ARGB 4:4:4:4 little endian
    pub const ARGB4444: Fourcc = Fourcc::new(b"AR12");
    /// ABGR 4:4:4:4 little endian
    pub const ABGR4444: Fourcc = Fourcc::new(b"AB12");
    /// RGBA 4:4:4:4 little endian
    pub const RGBA4444: Fourcc = Fourcc::new(b"RA12");
    /// BGRA 4:4:4:4 little endian
    pub const BGRA4444: Fourcc = Fourcc::new(b"BA12");
    /// XRGB 1:5:5:5 little endian
    pub const XRGB1555: Fourcc = Fourcc::new(b"XR15");
    /// XBGR 1:5:5:5 little endian
    pub const XBGR1555: Fourcc = Fourcc::new(b"XB15");
    /// RGBX 5:5:5:1 little endian
    pub const RGBX5551: Fourcc = Fourcc::new(b"RX15");
    /// BGRX 5:5:5:1 little endian
    pub const BGRX5551: Fourcc = Fourcc::new(b"BX15");
    /// ARGB 1:5:5:5 little endian
    pub const ARGB1555: Fourcc = Fourcc::new(b"AR15");
    /// ABGR 1:5:5:5 little endian
    pub const ABGR1555: Fourcc = Fourcc::new(b"AB15");
    /// RGBA 5:5:5:1 little endian
    pub const RGBA5551: Fourcc = Fourcc::new(b"RA15");
    /// BGRA 5:5:5:1 little endian
    pub const BGRA5551: Fourcc = Fourcc::new(b"BA15");
    /// RGB 5:6:5 little endian
    pub const RGB565: Fourcc = Fourcc::new(b"RG16");
    /// BGR 5:6:5 little endian
    pub const BGR565: Fourcc = Fourcc::new(b"BG16");
    /// XRGB 8:8:8:8 little endian
    pub const XRGB8888: Fourcc = Fourcc::new(b"XR24");
    /// XBGR 8:8:8:8 little endian
    pub const XBGR8888: Fourcc = Fourcc::new(b"XB24");
    /// RGBX 8:8:8:8 little endian
    pub const RGBX8888: Fourcc = Fourcc::new(b"RX24");
    /// BGRX 8:8:8:8 little endian
    pub const BGRX8888: Fourcc = Fourcc::new(b"BX24");
    /// ARGB 8:8:8:8 little endian
    pub const ARGB8888: Fourcc = Fourcc::new(b"AR24");
    /// ABGR 8:8:8:8 little endian
    pub const ABGR8888: Fourcc = Fourcc::new(b"AB24");
    /// RGBA 8:8:8:8 little endian
    pub const RGBA8888: Fourcc = Fourcc::new(b"RA24");
    /// BGRA 8:8:8:8 little endian
    pub const BGRA8888: Fourcc = Fourcc::new(b"BA24");
    /// ARGB 2:10:10:10 little endian
    pub const ARGB2101010: Fourcc = Fourcc::new(b"AR30");
    /// ABGR 2:10:10:10 little endian
    pub const ABGR2101010: Fourcc = Fourcc::new(b"AB30");
    /// RGBA 10:10:10:2 little endian
    pub const RGBA1010102: Fourcc = Fourcc::new(b"RA30");
    /// BGRA 10:10:10:2 little endian
    pub const BGRA1010102: Fourcc = Fourcc::new(b"BA30");

    /// Bytes per pixel of the first plane, None for unknown formats
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            Fourcc::XRGB4444
            | Fourcc::XBGR4444
            | Fourcc::RGBX4444
            | Fourcc::BGRX4444
            | Fourcc::ARGB4444
            | Fourcc::ABGR4444
            | Fourcc::RGBA4444
            | Fourcc::BGRA4444
            | Fourcc::XRGB1555
            | Fourcc::XBGR1555
            | Fourcc::RGBX5551
            | Fourcc::BGRX5551
            | Fourcc::ARGB1555
            | Fourcc::ABGR1555
            | Fourcc::RGBA5551
            | Fourcc::BGRA5551
            | Fourcc::RGB565
            | Fourcc::BGR565 => Some(2),
            Fourcc::XRGB8888
            | Fourcc::XBGR8888
            | Fourcc::RGBX8888
            | Fourcc::BGRX8888
            | Fourcc::ARGB8888
            | Fourcc::ABGR8888
            | Fourcc::RGBA8888
            | Fourcc::BGRA8888
            | Fourcc::ARGB2101010
            | Fourcc::ABGR2101010
            | Fourcc::RGBA1010102
            | Fourcc::BGRA1010102 => Some(4),
            _ => None,
        }
    }
}

/// Color formats understood by the plane fetch unit
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ColorFormat {
    X4R4G4B4 = 0,
    A4R4G4B4 = 1,
    X1R5G5B5 = 2,
    A1R5G5B5 = 3,
    R5G6B5 = 4,
    X8R8G8B8 = 5,
    A8R8G8B8 = 6,
    Yuy2 = 7,
    Uyvy = 8,
    Index8 = 9,
    Monochrome = 10,
    Yv12 = 0xF,
    A8 = 0x10,
    Nv12 = 0x11,
    Nv16 = 0x12,
    Rg16 = 0x13,
    R8 = 0x14,
    Nv12TenBit = 0x15,
    A2R10G10B10 = 0x16,
    Nv16TenBit = 0x17,
    Index1 = 0x18,
    Index2 = 0x19,
    Index4 = 0x1A,
    P010 = 0x1B,
    Yuv444 = 0x1C,
    Yuv444TenBit = 0x1D,
}

/// Channel order of the fetched pixels
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Swizzle {
    Argb = 0,
    Rgba = 1,
    Abgr = 2,
    Bgra = 3,
}

/// Hardware description of a buffer pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// hardware color code, None if the buffer format is not recognized
    pub color: Option<ColorFormat>,
    /// channel order
    pub swizzle: Swizzle,
    /// swap U and V, only meaningful for YUV formats
    pub uv_swizzle: bool,
}

impl FormatDescriptor {
    /// Translates a buffer format, unknown formats are logged and keep the color unset
    pub fn from_fourcc(format: Fourcc) -> FormatDescriptor {
        let color = match format {
            Fourcc::XRGB4444 | Fourcc::RGBX4444 | Fourcc::XBGR4444 | Fourcc::BGRX4444 => {
                Some(ColorFormat::X4R4G4B4)
            }
            Fourcc::ARGB4444 | Fourcc::RGBA4444 | Fourcc::ABGR4444 | Fourcc::BGRA4444 => {
                Some(ColorFormat::A4R4G4B4)
            }
            Fourcc::XRGB1555 | Fourcc::RGBX5551 | Fourcc::XBGR1555 | Fourcc::BGRX5551 => {
                Some(ColorFormat::X1R5G5B5)
            }
            Fourcc::ARGB1555 | Fourcc::RGBA5551 | Fourcc::ABGR1555 | Fourcc::BGRA5551 => {
                Some(ColorFormat::A1R5G5B5)
            }
            Fourcc::RGB565 | Fourcc::BGR565 => Some(ColorFormat::R5G6B5),
            Fourcc::XRGB8888 | Fourcc::RGBX8888 | Fourcc::XBGR8888 | Fourcc::BGRX8888 => {
                Some(ColorFormat::X8R8G8B8)
            }
            Fourcc::ARGB8888 | Fourcc::RGBA8888 | Fourcc::ABGR8888 | Fourcc::BGRA8888 => {
                Some(ColorFormat::A8R8G8B8)
            }
            Fourcc::ARGB2101010
            | Fourcc::RGBA1010102
            | Fourcc::ABGR2101010
            | Fourcc::BGRA1010102 => Some(ColorFormat::A2R10G10B10),
            _ => {
                warn!("Unexpected buffer format {:#010x}", format.0);
                None
            }
        };

        let swizzle = match format {
            Fourcc::RGBX4444
            | Fourcc::RGBA4444
            | Fourcc::RGBX5551
            | Fourcc::RGBA5551
            | Fourcc::RGBX8888
            | Fourcc::RGBA8888
            | Fourcc::RGBA1010102 => Swizzle::Rgba,
            Fourcc::XBGR4444
            | Fourcc::ABGR4444
            | Fourcc::XBGR1555
            | Fourcc::ABGR1555
            | Fourcc::BGR565
            | Fourcc::XBGR8888
            | Fourcc::ABGR8888
            | Fourcc::ABGR2101010 => Swizzle::Abgr,
            Fourcc::BGRX4444
            | Fourcc::BGRA4444
            | Fourcc::BGRX5551
            | Fourcc::BGRA5551
            | Fourcc::BGRX8888
            | Fourcc::BGRA8888
            | Fourcc::BGRA1010102 => Swizzle::Bgra,
            // also the value for YUV formats
            _ => Swizzle::Argb,
        };

        FormatDescriptor {
            color,
            swizzle,
            uv_swizzle: false,
        }
    }
}
