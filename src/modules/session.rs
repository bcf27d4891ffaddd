//! LCD 设备会话：屏幕信息查询与帧发送。

use std::time::Duration;

use crate::modules::constants::{
    BULK_OUT_ENDPOINT, CONTROL_TIMEOUT_MS, FRAME_TIMEOUT_MS, INFO_INDEX, INFO_LENGTH, INFO_REQUEST,
    INFO_REQUEST_TYPE, INFO_VALUE,
};
use crate::modules::error::{MirrorError, Result};
use crate::modules::protocol::{build_frame_payload, parse_display_info};
use crate::modules::transport::Transport;
use crate::modules::types::{DeviceIdentity, DisplayInfo, FrameBuffer};
use crate::modules::usb::DeviceLocator;

/// 会话状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    /// 设备已打开，尚未查询屏幕信息。
    Open,
    /// 已获得屏幕信息，可以发送帧。
    Ready,
    /// 已成功发送过帧。
    Streaming,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Closed => "closed",
            SessionState::Open => "open",
            SessionState::Ready => "ready",
            SessionState::Streaming => "streaming",
        }
    }
}

/// 独占设备句柄的会话。
///
/// 句柄只在 [`DeviceSession::close`]（或析构）时释放一次；
/// 任何致命错误都会关闭会话。
pub struct DeviceSession<T: Transport> {
    transport: Option<T>,
    info: Option<DisplayInfo>,
    state: SessionState,
}

impl<T: Transport> DeviceSession<T> {
    /// 通过查找器打开设备。
    pub fn open<L>(locator: &L, identity: DeviceIdentity) -> Result<Self>
    where
        L: DeviceLocator<Transport = T>,
    {
        let transport = locator.open(identity)?;
        Ok(Self::from_transport(transport))
    }

    /// 包装一个已打开的传输层。
    pub fn from_transport(transport: T) -> Self {
        Self {
            transport: Some(transport),
            info: None,
            state: SessionState::Open,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 已缓存的屏幕信息。
    pub fn display_info(&self) -> Option<DisplayInfo> {
        self.info
    }

    /// 查询屏幕信息。
    ///
    /// 第一次成功后缓存结果，之后直接返回缓存值。会话关闭后返回
    /// [`MirrorError::NotConnected`]。
    pub fn get_info(&mut self) -> Result<DisplayInfo> {
        if self.state == SessionState::Closed || self.transport.is_none() {
            return Err(MirrorError::NotConnected);
        }
        if let Some(info) = self.info {
            return Ok(info);
        }

        let transport = self.transport.as_mut().ok_or(MirrorError::NotConnected)?;
        let mut buf = [0u8; INFO_LENGTH];
        let result = transport
            .read_control(
                INFO_REQUEST_TYPE,
                INFO_REQUEST,
                INFO_VALUE,
                INFO_INDEX,
                &mut buf,
                Duration::from_millis(CONTROL_TIMEOUT_MS),
            )
            .map_err(MirrorError::InfoQuery)
            .and_then(|read| parse_display_info(&buf[..read]));

        match result {
            Ok(info) => {
                log::info!(
                    "LCD info: width: {}, height: {}, orientation: {}, rotation: {}, brightness: {}",
                    info.width,
                    info.height,
                    info.orientation,
                    info.rotation,
                    info.brightness
                );
                self.info = Some(info);
                self.state = SessionState::Ready;
                Ok(info)
            }
            Err(e) => {
                log::error!("Failed to get LCD info: {}", e);
                self.close();
                Err(e)
            }
        }
    }

    /// 发送一帧：16 字节帧头 + 像素数据，一次批量写入。
    ///
    /// 不做内部重试，失败时由调用方决定是否终止推流。
    pub fn send_frame(&mut self, frame: &FrameBuffer) -> Result<usize> {
        let info = match self.state {
            SessionState::Ready | SessionState::Streaming => {
                self.info.ok_or(MirrorError::InvalidState(self.state.name()))?
            }
            state => return Err(MirrorError::InvalidState(state.name())),
        };

        if (frame.width(), frame.height()) != (info.width, info.height) {
            return Err(MirrorError::FrameResolution {
                expected: (info.width, info.height),
                actual: (frame.width(), frame.height()),
            });
        }

        let transport = self.transport.as_mut().ok_or(MirrorError::NotConnected)?;
        let payload = build_frame_payload(frame);
        let written = transport
            .write_bulk(
                BULK_OUT_ENDPOINT,
                &payload,
                Duration::from_millis(FRAME_TIMEOUT_MS),
            )
            .map_err(MirrorError::Transfer)?;

        if written != payload.len() {
            log::warn!("Frame transfer incomplete: {} of {}", written, payload.len());
            return Err(MirrorError::IncompleteTransfer {
                written,
                expected: payload.len(),
            });
        }

        self.state = SessionState::Streaming;
        Ok(written)
    }

    /// 释放设备。可重复调用。
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.release();
            log::info!("Device session closed");
        }
        self.state = SessionState::Closed;
    }
}

impl<T: Transport> Drop for DeviceSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
