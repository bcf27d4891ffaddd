//! 把画面推送到 USB LCD 副屏。
//!
//! 未接入系统屏幕采集时，使用随机色块测试图案或静态图片作为画面来源。

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use lcd_mirror::modules::constants::{
    BOOTSTRAP_TIMEOUT_MS, DEFAULT_FIRMWARE, DEFAULT_FPS, PATTERN_BLOCK_SIZE, PATTERN_HEIGHT,
    PATTERN_INTERVAL_MS, PATTERN_WIDTH,
};
use lcd_mirror::{
    bootstrap, pipeline, CancelToken, DeviceSession, FirmwareStatus, FrameSource, ImageConverter,
    ImageFileSource, MirrorError, Mode, PixelFormat, StreamConfig, TestPatternSource, UsbLocator,
    BOOTLOADER_IDENTITY, RUNTIME_IDENTITY,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    /// 3 字节 B G R
    Bgr888,
    /// 4 字节 R G B A
    Rgba8888,
    /// 4 字节 B G R A
    Bgra8888,
}

impl From<CliFormat> for PixelFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Bgr888 => PixelFormat::Bgr888,
            CliFormat::Rgba8888 => PixelFormat::Rgba8888,
            CliFormat::Bgra8888 => PixelFormat::Bgra8888,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lcd-mirror")]
#[command(about = "录制屏幕并将其输出到 USB LCD")]
#[command(version)]
struct Args {
    /// 运行模式：1 - 最大速度，2 - 最高质量，3 - 均衡模式
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    mode: u8,

    /// 目标帧率（0 表示不限速）
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// 覆盖模式默认的像素格式
    #[arg(long, value_enum)]
    format: Option<CliFormat>,

    /// 设备处于引导模式时先刷写该固件（省略路径时使用默认固件名）
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_FIRMWARE)]
    firmware: Option<PathBuf>,

    /// 刷写后等待运行时设备的超时（毫秒）
    #[arg(long, default_value_t = BOOTSTRAP_TIMEOUT_MS)]
    bootstrap_timeout_ms: u64,

    /// 使用单线程顺序循环（采集与发送不重叠）
    #[arg(long)]
    sequential: bool,

    /// 用静态图片代替测试图案
    #[arg(long)]
    image: Option<PathBuf>,

    /// 测试图案宽度
    #[arg(long, default_value_t = PATTERN_WIDTH)]
    source_width: u32,

    /// 测试图案高度
    #[arg(long, default_value_t = PATTERN_HEIGHT)]
    source_height: u32,

    /// 列出所有 USB 设备后退出
    #[arg(long)]
    list: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(()) | Err(MirrorError::Cancelled) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Error during execution: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> lcd_mirror::Result<()> {
    let locator = UsbLocator::new()?;

    if args.list {
        for dev in locator.scan_devices()? {
            let tag = if dev.identity == RUNTIME_IDENTITY {
                " <-- LCD"
            } else if dev.identity == BOOTLOADER_IDENTITY {
                " <-- LCD (bootloader)"
            } else {
                ""
            };
            println!("bus {:03} device {:03}: {}{}", dev.bus, dev.address, dev.identity, tag);
        }
        return Ok(());
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            log::warn!("Failed to install Ctrl+C handler: {}", e);
        }
    }

    if let Some(firmware) = &args.firmware {
        let status = bootstrap(
            &locator,
            BOOTLOADER_IDENTITY,
            RUNTIME_IDENTITY,
            firmware,
            Duration::from_millis(args.bootstrap_timeout_ms),
            Some(&cancel),
        )?;
        if let FirmwareStatus::Flashed { bytes, elapsed } = status {
            log::info!("Firmware bootstrap done ({} bytes, {:?})", bytes, elapsed);
        }
    }

    let mode = Mode::try_from(args.mode)?;
    let config = StreamConfig {
        mode,
        target_fps: args.fps,
        format_override: args.format.map(PixelFormat::from),
        ..StreamConfig::default()
    };
    log::info!("Mode: {}", mode);

    let mut session = DeviceSession::open(&locator, RUNTIME_IDENTITY)?;
    session.get_info()?;

    let mut source: Box<dyn FrameSource + Send> = match &args.image {
        Some(path) => Box::new(ImageFileSource::open(path)?),
        None => Box::new(TestPatternSource::new(
            args.source_width,
            args.source_height,
            PATTERN_BLOCK_SIZE,
            Duration::from_millis(PATTERN_INTERVAL_MS),
        )),
    };
    let converter = ImageConverter::new(config.filter());

    log::info!("Starting capture and display to LCD...");
    let stats = if args.sequential {
        pipeline::run(&mut session, source.as_mut(), &converter, &config, &cancel)?
    } else {
        pipeline::run_decoupled(&mut session, source.as_mut(), &converter, &config, &cancel)?
    };
    log::info!(
        "Sent {} frames ({} KiB), dropped {}, retries {}",
        stats.frames_sent,
        stats.bytes_sent / 1024,
        stats.frames_dropped,
        stats.retries
    );

    session.close();
    Ok(())
}
