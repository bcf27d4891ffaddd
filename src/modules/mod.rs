//! USB LCD 镜像库的模块声明。

// 常量
pub mod constants;

// 错误类型
pub mod error;

// 公共类型
pub mod types;

// 传输协议编码
pub mod protocol;

// 传输层
pub mod transport;

// USB 设备发现
pub mod usb;

// 取消与轮询等待
pub mod poll;

// 固件刷写
pub mod firmware;

// 设备会话
pub mod session;

// 图片转换
pub mod image;

// 帧来源
pub mod source;

// 最新帧交接
pub mod handoff;

// 推流循环
pub mod pipeline;
