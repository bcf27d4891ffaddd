//! USB LCD 镜像库的公共类型定义。

use std::fmt;

use image::imageops::FilterType;

use crate::modules::error::{MirrorError, Result};

/// USB 设备标识（VID/PID）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    /// 厂商 ID。
    pub vendor_id: u16,
    /// 产品 ID。
    pub product_id: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// 是否与给定的 VID/PID 完全匹配。
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    pub(crate) fn not_found(&self) -> MirrorError {
        MirrorError::DeviceNotFound(self.vendor_id, self.product_id)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// 设备上报的屏幕信息。每个会话只查询一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    /// 宽度（像素）。
    pub width: u16,
    /// 高度（像素）。
    pub height: u16,
    /// 屏幕方向。
    pub orientation: u8,
    /// 旋转。
    pub rotation: u8,
    /// 亮度。
    pub brightness: u16,
}

/// 发送给设备的像素格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 每像素 3 字节，B G R，无透明通道。
    Bgr888,
    /// 每像素 4 字节，R G B A，保持源通道顺序。
    Rgba8888,
    /// 每像素 4 字节，B G R A，设备通道顺序。
    Bgra8888,
}

impl PixelFormat {
    /// 每像素字节数。
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr888 => 3,
            PixelFormat::Rgba8888 | PixelFormat::Bgra8888 => 4,
        }
    }

    /// 给定分辨率下一帧所需的字节数。
    pub fn frame_len(self, width: u16, height: u16) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Bgr888 => "BGR888",
            PixelFormat::Rgba8888 => "RGBA8888",
            PixelFormat::Bgra8888 => "BGRA8888",
        };
        f.write_str(name)
    }
}

/// 运行模式：速度与画质的取舍。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// 最大速度，低延迟。
    #[default]
    SpeedFirst,
    /// 最高画质。
    QualityFirst,
    /// 均衡。
    Balanced,
}

/// 模式对应的转换参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeProfile {
    pub format: PixelFormat,
    pub filter: FilterType,
}

/// 按 [`Mode`] 声明顺序排列的转换参数。
const MODE_PROFILES: [ModeProfile; 3] = [
    ModeProfile {
        format: PixelFormat::Bgr888,
        filter: FilterType::Nearest,
    },
    ModeProfile {
        format: PixelFormat::Rgba8888,
        filter: FilterType::CatmullRom,
    },
    ModeProfile {
        format: PixelFormat::Bgra8888,
        filter: FilterType::Triangle,
    },
];

impl Mode {
    /// 查表得到模式的转换参数。
    pub fn profile(self) -> ModeProfile {
        let index = match self {
            Mode::SpeedFirst => 0,
            Mode::QualityFirst => 1,
            Mode::Balanced => 2,
        };
        MODE_PROFILES[index]
    }

    /// 模式对应的像素格式。
    pub fn format(self) -> PixelFormat {
        self.profile().format
    }
}

impl TryFrom<u8> for Mode {
    type Error = MirrorError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Mode::SpeedFirst),
            2 => Ok(Mode::QualityFirst),
            3 => Ok(Mode::Balanced),
            other => Err(MirrorError::InvalidMode(other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::SpeedFirst => "speed-first",
            Mode::QualityFirst => "quality-first",
            Mode::Balanced => "balanced",
        };
        f.write_str(name)
    }
}

/// 待发送的一帧像素数据。
///
/// 只能通过 [`FrameBuffer::new`] 构造，数据长度总是等于
/// `width * height * bytes_per_pixel(format)`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    format: PixelFormat,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// 校验尺寸与长度后创建帧。
    pub fn new(width: u16, height: u16, format: PixelFormat, bytes: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MirrorError::InvalidDisplayInfo { width, height });
        }
        let expected = format.frame_len(width, height);
        if bytes.len() != expected {
            return Err(MirrorError::FrameSize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            bytes,
        })
    }

    /// 纯色填充的帧（颜色按 R G B 给出）。
    pub fn solid(width: u16, height: u16, format: PixelFormat, rgb: (u8, u8, u8)) -> Result<Self> {
        let (r, g, b) = rgb;
        let pixel: &[u8] = match format {
            PixelFormat::Bgr888 => &[b, g, r],
            PixelFormat::Rgba8888 => &[r, g, b, 0xFF],
            PixelFormat::Bgra8888 => &[b, g, r, 0xFF],
        };
        let bytes = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, format, bytes)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// 获取原始像素数据。
    pub fn as_data(&self) -> &[u8] {
        &self.bytes
    }
}
