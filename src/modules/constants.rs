//! USB LCD 镜像库的常量定义。

use crate::modules::types::DeviceIdentity;

/// 运行时固件下的 LCD 设备标识。
pub const RUNTIME_IDENTITY: DeviceIdentity = DeviceIdentity::new(0x2E09, 0x0030);

/// 引导模式（未加载固件）下的设备标识。
pub const BOOTLOADER_IDENTITY: DeviceIdentity = DeviceIdentity::new(0x03E7, 0x2150);

/// 默认固件文件名。
pub const DEFAULT_FIRMWARE: &str = "G25_MainFW_1.9.2.decrypted.img";

/// 使用的 USB 配置与接口。
pub const USB_CONFIGURATION: u8 = 1;
pub const USB_INTERFACE: u8 = 0;

/// 批量输出端点（帧数据与固件共用）。
pub const BULK_OUT_ENDPOINT: u8 = 0x01;

/// 屏幕信息查询的控制传输参数。
pub const INFO_REQUEST_TYPE: u8 = 0xA1;
pub const INFO_REQUEST: u8 = 0x04;
pub const INFO_VALUE: u16 = 0x0000;
pub const INFO_INDEX: u16 = 0x0003;
pub const INFO_LENGTH: usize = 8;

/// 帧头长度与固定标记。
pub const HEADER_SIZE: usize = 16;
pub const HEADER_TAG: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// USB 超时时间（毫秒）。
pub const CONTROL_TIMEOUT_MS: u64 = 1000;
pub const FRAME_TIMEOUT_MS: u64 = 1000;
pub const FIRMWARE_TIMEOUT_MS: u64 = 10_000;

/// 刷写固件后等待运行时设备出现的参数（毫秒）。
pub const BOOTSTRAP_POLL_MS: u64 = 100;
pub const BOOTSTRAP_TIMEOUT_MS: u64 = 5000;

/// 默认目标帧率。
pub const DEFAULT_FPS: u32 = 30;

/// 瞬时传输错误的最大重试次数与重试间隔。
pub const MAX_TRANSFER_RETRIES: u32 = 3;
pub const RETRY_BACKOFF_MS: u64 = 10;

/// 测试图案的默认源分辨率与色块参数。
pub const PATTERN_WIDTH: u32 = 1920;
pub const PATTERN_HEIGHT: u32 = 1080;
pub const PATTERN_BLOCK_SIZE: u32 = 40;
pub const PATTERN_INTERVAL_MS: u64 = 2000;
