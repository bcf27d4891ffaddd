//! USB LCD 镜像库的错误类型定义。

use std::path::PathBuf;

use thiserror::Error;

/// 使用 [`MirrorError`] 的结果类型。
pub type Result<T> = std::result::Result<T, MirrorError>;

/// 与 LCD 设备通信或推流时可能发生的错误。
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("未找到设备 (VID={0:04x}, PID={1:04x})")]
    DeviceNotFound(u16, u16),

    #[error("刷写固件后运行时设备未在 {waited_ms} ms 内出现")]
    BootloaderTimeout { waited_ms: u64 },

    #[error("查询屏幕信息失败: {0}")]
    InfoQuery(#[source] rusb::Error),

    #[error("屏幕信息响应过短: {0} 字节")]
    InfoTooShort(usize),

    #[error("屏幕尺寸无效: {width}x{height}")]
    InvalidDisplayInfo { width: u16, height: u16 },

    #[error("发送帧数据失败: {0}")]
    Transfer(#[source] rusb::Error),

    #[error("发送不完整: {written} / {expected} 字节")]
    IncompleteTransfer { written: usize, expected: usize },

    #[error("USB 错误: {0}")]
    Usb(#[from] rusb::Error),

    #[error("读取固件失败 {path:?}: {source}")]
    Firmware {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("帧数据长度错误: 需要 {expected} 字节, 实际 {actual} 字节")]
    FrameSize { expected: usize, actual: usize },

    #[error("帧分辨率 {actual:?} 与屏幕分辨率 {expected:?} 不符")]
    FrameResolution {
        expected: (u16, u16),
        actual: (u16, u16),
    },

    #[error("图片错误: {0}")]
    Image(String),

    #[error("采集失败: {0}")]
    Capture(String),

    #[error("无效的模式: {0} (可选 1, 2, 3)")]
    InvalidMode(u8),

    #[error("设备状态错误: 当前为 {0}")]
    InvalidState(&'static str),

    #[error("未连接到设备")]
    NotConnected,

    #[error("操作已取消")]
    Cancelled,
}

impl MirrorError {
    /// 是否为可重试的瞬时传输错误（设备忙、超时、被中断）。
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MirrorError::Transfer(rusb::Error::Busy)
                | MirrorError::Transfer(rusb::Error::Timeout)
                | MirrorError::Transfer(rusb::Error::Interrupted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_limited_to_transfers() {
        assert!(MirrorError::Transfer(rusb::Error::Busy).is_transient());
        assert!(MirrorError::Transfer(rusb::Error::Timeout).is_transient());
        assert!(MirrorError::Transfer(rusb::Error::Interrupted).is_transient());

        assert!(!MirrorError::Transfer(rusb::Error::NoDevice).is_transient());
        assert!(!MirrorError::Transfer(rusb::Error::Pipe).is_transient());
        assert!(!MirrorError::InfoQuery(rusb::Error::Busy).is_transient());
        assert!(!MirrorError::Usb(rusb::Error::Timeout).is_transient());
    }

    #[test]
    fn device_not_found_formats_identity() {
        let msg = MirrorError::DeviceNotFound(0x2E09, 0x0030).to_string();
        assert!(msg.contains("2e09"));
        assert!(msg.contains("0030"));
    }
}
