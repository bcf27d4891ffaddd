//! USB LCD 副屏镜像库。
//!
//! 把采集到的画面按目标帧率推送到 USB 外接 LCD：
//!
//! 1. （可选）设备处于引导模式时刷写固件，等待运行时设备出现；
//! 2. 打开设备，通过控制传输查询屏幕分辨率；
//! 3. 循环采集、缩放转换、批量传输（16 字节帧头 + 像素）。
//!
//! ```rust,ignore
//! use lcd_mirror::{
//!     pipeline, CancelToken, DeviceSession, ImageConverter, Mode, StreamConfig,
//!     TestPatternSource, UsbLocator, RUNTIME_IDENTITY,
//! };
//!
//! let locator = UsbLocator::new()?;
//! let mut session = DeviceSession::open(&locator, RUNTIME_IDENTITY)?;
//! session.get_info()?;
//!
//! let config = StreamConfig::new(Mode::Balanced);
//! let mut source = TestPatternSource::new(1920, 1080, 40, std::time::Duration::from_secs(2));
//! let converter = ImageConverter::new(config.filter());
//! pipeline::run(&mut session, &mut source, &converter, &config, &CancelToken::new())?;
//! ```

pub mod modules;

pub use modules::constants::{BOOTLOADER_IDENTITY, RUNTIME_IDENTITY};
pub use modules::error::{MirrorError, Result};
pub use modules::firmware::{bootstrap, load_firmware, FirmwareStatus};
pub use modules::handoff::LatestFrame;
pub use modules::image::{FrameConverter, ImageConverter};
pub use modules::pipeline::{self, Pacer, StreamConfig, StreamStats};
pub use modules::poll::{wait_until, CancelToken, PollOutcome};
pub use modules::protocol::{build_frame_payload, parse_display_info, TransferHeader};
pub use modules::session::{DeviceSession, SessionState};
pub use modules::source::{FrameSource, ImageFileSource, TestPatternSource};
pub use modules::transport::{Transport, UsbTransport};
pub use modules::types::{DeviceIdentity, DisplayInfo, FrameBuffer, Mode, ModeProfile, PixelFormat};
pub use modules::usb::{AttachedDevice, DeviceLocator, UsbLocator};
