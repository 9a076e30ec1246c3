#![no_std]

//! AM2320 / DHT11 / DHT22 单总线温湿度传感器驱动
//!
//! 主机先在数据线上发出起始信号，传感器应答后以脉宽编码发送 40 位数据：
//! 16 位湿度 + 16 位温度 + 8 位校验和。脉冲宽度由脉冲计时外设（ESP32 上为 RMT）
//! 以 1us 分辨率采集，再交给帧解码器还原成温湿度数值。
//!
//! 模块划分：
//! - [`line`]：数据线 GPIO 抽象
//! - [`capture`]：脉冲计时采集抽象
//! - [`frame`]：40 位数据帧解码与校验
//! - [`driver`]：一次完整的读取事务（握手 + 采集 + 解码）
//! - [`retry`]：带重试的读取流程
//! - `esp`：ESP32-S3 上基于 `esp-hal` 的实现（`esp32s3` feature）

#[macro_use]
mod fmt;

pub mod capture;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod line;
pub mod profile;
pub mod reading;
pub mod retry;

#[cfg(feature = "esp32s3")]
pub mod esp;

#[cfg(test)]
mod testing;

pub use capture::{CaptureConfig, CaptureError, PulseCapture, PulseSample};
pub use config::SensorConfig;
pub use driver::SensorDriver;
pub use error::SensorError;
pub use profile::SensorProfile;
pub use reading::SensorReading;
pub use retry::{ReadStats, RetryPolicy, Sensor, Transact};
