//! ESP32-S3 实现
//!
//! 数据线使用 `Flex` 引脚（开漏 + 上拉），脉冲计时使用 RMT 接收通道，
//! 两者共用同一个 GPIO：RMT 通过 GPIO 矩阵读取 `Flex` 的输入信号。

use core::ops::RangeInclusive;

use esp_hal::delay::Delay;
use esp_hal::gpio::Flex;

use crate::config::SensorConfig;
use crate::driver::SensorDriver;
use crate::error::SensorError;
use crate::retry::Sensor;

mod capture;
mod line;

pub use capture::{RmtCapture, open_capture, rx_config};
pub use line::data_line;

/// ESP32-S3 最大 GPIO 编号
pub const MAX_GPIO: u8 = 48;

/// ESP32-S3 的 RMT 接收通道
pub const RX_CHANNELS: RangeInclusive<u8> = 4..=7;

pub type EspSensorDriver = SensorDriver<Flex<'static>, RmtCapture<'static>, Delay>;
pub type EspSensor = Sensor<EspSensorDriver, embassy_time::Delay>;

/// 检查引脚和采集通道是否存在于本芯片
pub fn validate(config: &SensorConfig) -> Result<(), SensorError> {
    if config.gpio_pin > MAX_GPIO || !RX_CHANNELS.contains(&config.capture_channel) {
        error!("Invalid sensor configuration: {}", config);
        return Err(SensorError::PeripheralConfig);
    }
    Ok(())
}
