//! 设备传输层：控制读取与批量写入。

use std::time::Duration;

use rusb::{Context, DeviceHandle};

/// 会话所需的最小 USB 能力。
///
/// 实际设备由 [`UsbTransport`] 实现，测试中可替换为模拟设备。
pub trait Transport {
    /// 控制传输（设备到主机），返回读取的字节数。
    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    /// 批量写入，返回写入的字节数。
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, rusb::Error>;

    /// 释放设备资源。多次调用无副作用。
    fn release(&mut self) {}
}

/// 已打开并声明接口的 USB 设备句柄。
pub struct UsbTransport {
    /// 设备句柄。
    handle: DeviceHandle<Context>,
    /// 已声明的接口号。
    interface: u8,
    released: bool,
}

impl UsbTransport {
    pub fn new(handle: DeviceHandle<Context>, interface: u8) -> Self {
        Self {
            handle,
            interface,
            released: false,
        }
    }
}

impl Transport for UsbTransport {
    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let read = self
            .handle
            .read_control(request_type, request, value, index, buf, timeout)?;
        log::debug!(
            "USB control in: type=0x{:02x} req=0x{:02x}, {} bytes received",
            request_type,
            request,
            read
        );
        Ok(read)
    }

    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, rusb::Error> {
        match self.handle.write_bulk(endpoint, data, timeout) {
            Ok(written) => {
                log::debug!("USB bulk out 0x{:02x}: {} bytes sent", endpoint, written);
                Ok(written)
            }
            Err(e) => {
                log::error!("USB bulk out 0x{:02x} failed: {}", endpoint, e);
                Err(e)
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.handle.release_interface(self.interface) {
            log::warn!("Failed to release interface {}: {}", self.interface, e);
        }
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.release();
    }
}
