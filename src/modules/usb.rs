//! USB 设备发现与打开。

use rusb::{Context, Device, UsbContext};

use crate::modules::constants::{USB_CONFIGURATION, USB_INTERFACE};
use crate::modules::error::{MirrorError, Result};
use crate::modules::transport::{Transport, UsbTransport};
use crate::modules::types::DeviceIdentity;

/// 按 VID/PID 查找并打开设备。
pub trait DeviceLocator {
    type Transport: Transport;

    /// 单次枚举，判断设备是否已连接。
    fn is_present(&self, identity: DeviceIdentity) -> Result<bool>;

    /// 打开设备并完成配置。设备不存在时返回 `DeviceNotFound`。
    fn open(&self, identity: DeviceIdentity) -> Result<Self::Transport>;
}

/// 枚举到的设备。
#[derive(Debug, Clone)]
pub struct AttachedDevice {
    pub identity: DeviceIdentity,
    pub bus: u8,
    pub address: u8,
}

/// 基于 libusb 的设备查找器。
pub struct UsbLocator {
    context: Context,
}

impl UsbLocator {
    pub fn new() -> Result<Self> {
        let context = Context::new().map_err(|e| {
            log::error!("Failed to create USB context: {}", e);
            e
        })?;
        Ok(Self { context })
    }

    /// 单次枚举查找设备，不重试。
    pub fn find(&self, identity: DeviceIdentity) -> Result<Device<Context>> {
        for device in self.context.devices()?.iter() {
            if let Ok(desc) = device.device_descriptor() {
                if identity.matches(desc.vendor_id(), desc.product_id()) {
                    return Ok(device);
                }
            }
        }
        Err(identity.not_found())
    }

    /// 列出所有已连接的 USB 设备。
    pub fn scan_devices(&self) -> Result<Vec<AttachedDevice>> {
        log::info!("Scanning USB devices...");
        let mut devices = Vec::new();
        for device in self.context.devices()?.iter() {
            if let Ok(desc) = device.device_descriptor() {
                devices.push(AttachedDevice {
                    identity: DeviceIdentity::new(desc.vendor_id(), desc.product_id()),
                    bus: device.bus_number(),
                    address: device.address(),
                });
            }
        }
        log::info!("Found {} USB devices", devices.len());
        Ok(devices)
    }
}

impl DeviceLocator for UsbLocator {
    type Transport = UsbTransport;

    fn is_present(&self, identity: DeviceIdentity) -> Result<bool> {
        match self.find(identity) {
            Ok(_) => Ok(true),
            Err(MirrorError::DeviceNotFound(..)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn open(&self, identity: DeviceIdentity) -> Result<UsbTransport> {
        let device = self.find(identity).map_err(|e| {
            log::error!("Device {} not found", identity);
            e
        })?;
        log::info!(
            "Found device {} at bus {} device {}",
            identity,
            device.bus_number(),
            device.address()
        );

        let handle = device.open().map_err(|e| {
            log::error!("Failed to open device {}: {}", identity, e);
            e
        })?;

        // 如果有内核驱动附着，先分离
        if let Ok(true) = handle.kernel_driver_active(USB_INTERFACE) {
            log::info!("Detaching kernel driver from interface {}...", USB_INTERFACE);
            if let Err(e) = handle.detach_kernel_driver(USB_INTERFACE) {
                log::warn!("Failed to detach kernel driver: {}", e);
            }
        }

        match handle.active_configuration() {
            Ok(config) if config == USB_CONFIGURATION => {
                log::debug!("Configuration {} already active", config);
            }
            _ => {
                log::debug!("Setting configuration {}", USB_CONFIGURATION);
                handle.set_active_configuration(USB_CONFIGURATION)?;
            }
        }

        handle.claim_interface(USB_INTERFACE).map_err(|e| {
            log::error!("Failed to claim interface {}: {}", USB_INTERFACE, e);
            e
        })?;
        log::info!("Device {} opened, interface {} claimed", identity, USB_INTERFACE);

        Ok(UsbTransport::new(handle, USB_INTERFACE))
    }
}
