//! 测试用的模拟 USB 设备。

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lcd_mirror::{DeviceIdentity, DeviceLocator, MirrorError, Result, Transport};

/// 一次控制传输请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: usize,
}

/// 一次批量写入。
#[derive(Debug, Clone)]
pub struct BulkWrite {
    pub identity: DeviceIdentity,
    pub endpoint: u8,
    pub data: Vec<u8>,
    pub at: Instant,
}

/// 模拟总线：已连接的设备与所有传输记录。
#[derive(Debug)]
pub struct Bus {
    /// 设备及其出现的时刻。
    pub devices: Vec<(DeviceIdentity, Instant)>,
    pub controls: Vec<ControlRequest>,
    pub writes: Vec<BulkWrite>,
    pub released: usize,
    /// 收到第一次批量写入后，指定设备在延迟后出现。
    pub re_enumerate: Option<(DeviceIdentity, Duration)>,
    /// 每次批量写入前依次返回的错误。
    pub write_errors: VecDeque<rusb::Error>,
    /// 每次批量写入耗时。
    pub write_delay: Duration,
    /// 控制传输返回的数据或错误。
    pub info: std::result::Result<Vec<u8>, rusb::Error>,
    /// 批量写入少报的字节数。
    pub short_by: usize,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            controls: Vec::new(),
            writes: Vec::new(),
            released: 0,
            re_enumerate: None,
            write_errors: VecDeque::new(),
            write_delay: Duration::ZERO,
            info: Ok(Vec::new()),
            short_by: 0,
        }
    }
}

pub type SharedBus = Arc<Mutex<Bus>>;

/// 屏幕信息的 8 字节响应。
pub fn info_bytes(width: u16, height: u16, orientation: u8, rotation: u8, brightness: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(8);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.push(orientation);
    data.push(rotation);
    data.extend_from_slice(&brightness.to_le_bytes());
    data
}

pub fn bus_with(devices: &[DeviceIdentity], info: Vec<u8>) -> SharedBus {
    let now = Instant::now();
    Arc::new(Mutex::new(Bus {
        devices: devices.iter().map(|id| (*id, now)).collect(),
        info: Ok(info),
        ..Bus::default()
    }))
}

pub struct MockTransport {
    identity: DeviceIdentity,
    bus: SharedBus,
    released: bool,
}

impl MockTransport {
    pub fn new(identity: DeviceIdentity, bus: SharedBus) -> Self {
        Self {
            identity,
            bus,
            released: false,
        }
    }
}

impl Transport for MockTransport {
    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> std::result::Result<usize, rusb::Error> {
        let mut bus = self.bus.lock().unwrap();
        bus.controls.push(ControlRequest {
            request_type,
            request,
            value,
            index,
            length: buf.len(),
        });
        let data = bus.info.clone()?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn write_bulk(
        &mut self,
        endpoint: u8,
        data: &[u8],
        _timeout: Duration,
    ) -> std::result::Result<usize, rusb::Error> {
        let delay = self.bus.lock().unwrap().write_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut bus = self.bus.lock().unwrap();
        if let Some(e) = bus.write_errors.pop_front() {
            return Err(e);
        }
        bus.writes.push(BulkWrite {
            identity: self.identity,
            endpoint,
            data: data.to_vec(),
            at: Instant::now(),
        });
        if let Some((identity, after)) = bus.re_enumerate.take() {
            bus.devices.push((identity, Instant::now() + after));
        }
        Ok(data.len() - bus.short_by.min(data.len()))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.bus.lock().unwrap().released += 1;
        }
    }
}

pub struct MockLocator {
    pub bus: SharedBus,
}

impl MockLocator {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }
}

impl DeviceLocator for MockLocator {
    type Transport = MockTransport;

    fn is_present(&self, identity: DeviceIdentity) -> Result<bool> {
        let now = Instant::now();
        let bus = self.bus.lock().unwrap();
        Ok(bus
            .devices
            .iter()
            .any(|(id, since)| *id == identity && *since <= now))
    }

    fn open(&self, identity: DeviceIdentity) -> Result<MockTransport> {
        if self.is_present(identity)? {
            Ok(MockTransport::new(identity, Arc::clone(&self.bus)))
        } else {
            Err(MirrorError::DeviceNotFound(
                identity.vendor_id,
                identity.product_id,
            ))
        }
    }
}
