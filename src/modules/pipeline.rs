//! 推流循环：采集、转换、发送、控速。
//!
//! [`run`] 是单线程的顺序循环，每帧发送完成后才开始下一次采集。
//! [`run_decoupled`] 把采集与发送拆成两个阶段，中间用 [`LatestFrame`]
//! 交接，发送慢时丢弃旧帧而不是累积延迟。

use std::thread;
use std::time::{Duration, Instant};

use image::imageops::FilterType;

use crate::modules::constants::{DEFAULT_FPS, MAX_TRANSFER_RETRIES, RETRY_BACKOFF_MS};
use crate::modules::error::Result;
use crate::modules::handoff::LatestFrame;
use crate::modules::image::FrameConverter;
use crate::modules::poll::CancelToken;
use crate::modules::session::DeviceSession;
use crate::modules::source::FrameSource;
use crate::modules::transport::Transport;
use crate::modules::types::{DisplayInfo, FrameBuffer, Mode, PixelFormat};

/// 推流参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    pub mode: Mode,
    pub target_fps: u32,
    /// 覆盖模式默认的像素格式。
    pub format_override: Option<PixelFormat>,
    /// 瞬时传输错误的最大重试次数。
    pub max_transfer_retries: u32,
}

impl StreamConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// 实际使用的像素格式。
    pub fn format(&self) -> PixelFormat {
        self.format_override.unwrap_or_else(|| self.mode.format())
    }

    pub fn filter(&self) -> FilterType {
        self.mode.profile().filter
    }

    /// 目标帧间隔。帧率为 0 时不控速。
    pub fn period(&self) -> Duration {
        if self.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / self.target_fps as f64)
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            target_fps: DEFAULT_FPS,
            format_override: None,
            max_transfer_retries: MAX_TRANSFER_RETRIES,
        }
    }
}

/// 帧间隔控制。
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    period: Duration,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 休眠 `max(0, period - elapsed)`，返回实际休眠时间。
    pub fn pace(&self, started: Instant) -> Duration {
        let remaining = self.period.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        remaining
    }
}

/// 推流统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames_captured: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub bytes_sent: u64,
    pub retries: u64,
}

/// 每秒输出一次帧率与带宽。
struct RateLog {
    window_start: Instant,
    frames: u64,
    bytes: u64,
}

impl RateLog {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            bytes: 0,
        }
    }

    fn record(&mut self, bytes: usize) {
        self.frames += 1;
        self.bytes += bytes as u64;

        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let secs = elapsed.as_secs_f64();
            log::info!(
                "USB Tx: {:.1} fps, {:.0} kB/s",
                self.frames as f64 / secs,
                self.bytes as f64 / 1000.0 / secs
            );
            *self = Self::new();
        }
    }
}

/// 发送一帧，瞬时错误有限次重试；致命错误关闭会话。
fn send_with_retry<T: Transport>(
    session: &mut DeviceSession<T>,
    frame: &FrameBuffer,
    max_retries: u32,
    stats: &mut StreamStats,
) -> Result<usize> {
    let mut attempt = 0;
    loop {
        match session.send_frame(frame) {
            Ok(written) => return Ok(written),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                stats.retries += 1;
                log::warn!("Frame transfer retry {}/{}: {}", attempt, max_retries, e);
                thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS));
            }
            Err(e) => {
                log::error!("Failed to write image data to LCD: {}", e);
                session.close();
                return Err(e);
            }
        }
    }
}

fn log_start(info: &DisplayInfo, config: &StreamConfig) {
    log::info!(
        "Streaming to {}x{} LCD: mode={}, format={}, target {} fps",
        info.width,
        info.height,
        config.mode,
        config.format(),
        config.target_fps
    );
}

/// 顺序推流，直到取消或发生致命错误。
///
/// 每次迭代：采集、转换到屏幕分辨率、发送、按目标帧率休眠。
/// 取消标志在每次迭代开始时检查，正在进行的传输不会被打断。
pub fn run<T, S, C>(
    session: &mut DeviceSession<T>,
    source: &mut S,
    converter: &C,
    config: &StreamConfig,
    cancel: &CancelToken,
) -> Result<StreamStats>
where
    T: Transport,
    S: FrameSource + ?Sized,
    C: FrameConverter + ?Sized,
{
    let info = session.get_info()?;
    let format = config.format();
    let pacer = Pacer::new(config.period());
    let mut stats = StreamStats::default();
    let mut rate = RateLog::new();

    log_start(&info, config);
    while !cancel.is_cancelled() {
        let started = Instant::now();

        let captured = source.capture()?;
        stats.frames_captured += 1;
        let frame = converter.convert(&captured, format, info.width, info.height)?;

        let written = send_with_retry(session, &frame, config.max_transfer_retries, &mut stats)?;
        stats.frames_sent += 1;
        stats.bytes_sent += written as u64;
        rate.record(written);

        pacer.pace(started);
    }

    log::info!("Streaming stopped after {} frames", stats.frames_sent);
    Ok(stats)
}

/// 采集阶段：按目标帧率采集并转换，结果放入最新帧槽位。
fn capture_stage<S, C>(
    source: &mut S,
    converter: &C,
    format: PixelFormat,
    info: DisplayInfo,
    pacer: Pacer,
    slot: &LatestFrame<FrameBuffer>,
    cancel: &CancelToken,
) -> Result<u64>
where
    S: FrameSource + ?Sized,
    C: FrameConverter + ?Sized,
{
    let mut captured = 0;
    while !cancel.is_cancelled() && !slot.is_closed() {
        let started = Instant::now();

        let image = source.capture()?;
        let frame = converter.convert(&image, format, info.width, info.height)?;
        captured += 1;
        if slot.publish(frame) {
            log::debug!("Transfer behind capture, dropped stale frame");
        }

        pacer.pace(started);
    }
    Ok(captured)
}

/// 两阶段推流：采集在独立线程中进行，发送在当前线程进行。
///
/// 会话只由当前线程访问。任一阶段出错都会停止另一阶段，
/// 返回最先发生的错误。
pub fn run_decoupled<T, S, C>(
    session: &mut DeviceSession<T>,
    source: &mut S,
    converter: &C,
    config: &StreamConfig,
    cancel: &CancelToken,
) -> Result<StreamStats>
where
    T: Transport,
    S: FrameSource + Send + ?Sized,
    C: FrameConverter + Sync + ?Sized,
{
    let info = session.get_info()?;
    let format = config.format();
    let pacer = Pacer::new(config.period());
    let slot = LatestFrame::new();
    let mut stats = StreamStats::default();
    let mut rate = RateLog::new();
    let wait = pacer.period().max(Duration::from_millis(50));

    log_start(&info, config);
    let (transfer_result, capture_result) = thread::scope(|scope| {
        let slot = &slot;
        let capture = scope.spawn(move || {
            let result = capture_stage(source, converter, format, info, pacer, slot, cancel);
            slot.close();
            result
        });

        let mut transfer = || -> Result<()> {
            while !cancel.is_cancelled() {
                match slot.take_timeout(wait) {
                    Some(frame) => {
                        let written =
                            send_with_retry(session, &frame, config.max_transfer_retries, &mut stats)?;
                        stats.frames_sent += 1;
                        stats.bytes_sent += written as u64;
                        rate.record(written);
                    }
                    None if slot.is_closed() => break,
                    None => {}
                }
            }
            Ok(())
        };
        let transfer_result = transfer();
        slot.close();

        let capture_result = match capture.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (transfer_result, capture_result)
    });

    stats.frames_dropped = slot.dropped();
    transfer_result?;
    stats.frames_captured = capture_result?;

    log::info!(
        "Streaming stopped after {} frames ({} dropped)",
        stats.frames_sent,
        stats.frames_dropped
    );
    Ok(stats)
}
