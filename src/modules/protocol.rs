//! LCD 传输协议的编码与解析。
//!
//! 帧数据格式（批量传输，端点 0x01）：
//! - 4 字节宽度（小端）
//! - 4 字节高度（小端）
//! - 8 字节固定标记 `01 00 00 00 00 00 00 00`
//! - 像素数据
//!
//! 屏幕信息（控制传输 0xA1/0x04，8 字节响应）：
//! 宽度 u16、高度 u16、方向 u8、旋转 u8、亮度 u16，均为小端。

use crate::modules::constants::{HEADER_SIZE, HEADER_TAG, INFO_LENGTH};
use crate::modules::error::{MirrorError, Result};
use crate::modules::types::{DisplayInfo, FrameBuffer};

/// 帧头。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferHeader {
    pub width: u32,
    pub height: u32,
}

impl TransferHeader {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: width as u32,
            height: height as u32,
        }
    }

    /// 编码为 16 字节。
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.width.to_le_bytes());
        buf[4..8].copy_from_slice(&self.height.to_le_bytes());
        buf[8..16].copy_from_slice(&HEADER_TAG);
        buf
    }

    /// 从字节解析帧头。长度不足或标记不符时返回 `None`。
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE || bytes[8..16] != HEADER_TAG {
            return None;
        }
        let width = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let height = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Some(Self { width, height })
    }
}

/// 解析屏幕信息响应。
pub fn parse_display_info(data: &[u8]) -> Result<DisplayInfo> {
    if data.len() < INFO_LENGTH {
        return Err(MirrorError::InfoTooShort(data.len()));
    }

    let info = DisplayInfo {
        width: u16::from_le_bytes([data[0], data[1]]),
        height: u16::from_le_bytes([data[2], data[3]]),
        orientation: data[4],
        rotation: data[5],
        brightness: u16::from_le_bytes([data[6], data[7]]),
    };

    if info.width == 0 || info.height == 0 {
        return Err(MirrorError::InvalidDisplayInfo {
            width: info.width,
            height: info.height,
        });
    }
    Ok(info)
}

/// 组装一次批量传输的完整负载：帧头 + 像素。
pub fn build_frame_payload(frame: &FrameBuffer) -> Vec<u8> {
    let header = TransferHeader::new(frame.width(), frame.height());
    let pixels = frame.as_data();

    let mut payload = Vec::with_capacity(HEADER_SIZE + pixels.len());
    payload.extend_from_slice(&header.encode());
    payload.extend_from_slice(pixels);
    payload
}
