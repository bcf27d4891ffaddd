//! 引导模式设备的固件刷写。
//!
//! 设备上电后若处于引导模式（[`BOOTLOADER_IDENTITY`]），需要把完整固件
//! 一次性写入批量端点 1，随后设备以运行时标识重新枚举。
//!
//! [`BOOTLOADER_IDENTITY`]: crate::modules::constants::BOOTLOADER_IDENTITY

use std::path::Path;
use std::time::{Duration, Instant};

use crate::modules::constants::{BOOTSTRAP_POLL_MS, BULK_OUT_ENDPOINT, FIRMWARE_TIMEOUT_MS};
use crate::modules::error::{MirrorError, Result};
use crate::modules::poll::{wait_until, CancelToken, PollOutcome};
use crate::modules::transport::Transport;
use crate::modules::types::DeviceIdentity;
use crate::modules::usb::DeviceLocator;

/// 刷写结果。
#[derive(Debug, Clone, PartialEq)]
pub enum FirmwareStatus {
    /// 未发现引导模式设备，认为运行时设备已就绪。
    BootloaderNotFound,
    /// 已刷写并等到运行时设备出现。
    Flashed {
        bytes: usize,
        elapsed: Duration,
    },
}

/// 读取完整的固件文件。
pub fn load_firmware<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| MirrorError::Firmware {
        path: path.to_path_buf(),
        source,
    })
}

/// 刷写固件并等待运行时设备出现。
///
/// 只有发现引导模式设备时才读取固件文件。固件写入只尝试一次；
/// 等待阶段每 100 ms 检查一次，超过 `timeout` 返回
/// [`MirrorError::BootloaderTimeout`]。
pub fn bootstrap<L, P>(
    locator: &L,
    bootloader: DeviceIdentity,
    runtime: DeviceIdentity,
    firmware: P,
    timeout: Duration,
    cancel: Option<&CancelToken>,
) -> Result<FirmwareStatus>
where
    L: DeviceLocator,
    P: AsRef<Path>,
{
    if !locator.is_present(bootloader)? {
        log::info!("Bootloader device {} not present, skipping firmware upload", bootloader);
        return Ok(FirmwareStatus::BootloaderNotFound);
    }

    log::info!("Bootloader device {} found, uploading firmware...", bootloader);
    let mut transport = locator.open(bootloader)?;
    let image = load_firmware(firmware.as_ref())?;
    log::debug!("Firmware {:?} loaded, {} bytes", firmware.as_ref(), image.len());

    let start = Instant::now();
    let result = transport.write_bulk(
        BULK_OUT_ENDPOINT,
        &image,
        Duration::from_millis(FIRMWARE_TIMEOUT_MS),
    );
    let elapsed = start.elapsed();
    transport.release();
    drop(transport);

    let written = result.map_err(|e| {
        log::error!("Firmware upload failed: {}", e);
        MirrorError::Transfer(e)
    })?;
    if written != image.len() {
        log::error!("Firmware upload incomplete: {} of {}", written, image.len());
        return Err(MirrorError::IncompleteTransfer {
            written,
            expected: image.len(),
        });
    }

    let kib = written as f64 / 1024.0;
    let secs = elapsed.as_secs_f64();
    let throughput = if secs > 0.0 { kib / secs } else { 0.0 };
    log::info!(
        "Firmware uploaded: {:.1} KiB in {:.3} s ({:.1} KiB/s)",
        kib,
        secs,
        throughput
    );

    log::info!("Waiting for runtime device {}...", runtime);
    let mut probe_error = None;
    let outcome = wait_until(
        Duration::from_millis(BOOTSTRAP_POLL_MS),
        timeout,
        cancel,
        || match locator.is_present(runtime) {
            Ok(present) => present,
            Err(e) => {
                log::debug!("Runtime device probe failed: {}", e);
                probe_error = Some(e);
                false
            }
        },
    );

    match outcome {
        PollOutcome::Ready => {
            log::info!("Runtime device {} is up", runtime);
            Ok(FirmwareStatus::Flashed {
                bytes: written,
                elapsed,
            })
        }
        PollOutcome::TimedOut => {
            if let Some(e) = probe_error {
                log::warn!("Last runtime device probe error: {}", e);
            }
            log::error!(
                "Runtime device {} did not appear within {} ms",
                runtime,
                timeout.as_millis()
            );
            Err(MirrorError::BootloaderTimeout {
                waited_ms: timeout.as_millis() as u64,
            })
        }
        PollOutcome::Cancelled => Err(MirrorError::Cancelled),
    }
}
