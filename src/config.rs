//! 默认配置常量与传感器配置

/// 传感器数据线默认 GPIO
pub const SENSOR_GPIO: u8 = 4;

/// 默认 RMT 接收通道（ESP32-S3 的接收通道为 4~7）
pub const CAPTURE_CHANNEL: u8 = 4;

/// RMT 源时钟频率 (MHz)
pub const RMT_SOURCE_MHZ: u32 = 80;

/// 周期读取间隔（秒），不得小于传感器要求的 2 秒
pub const READ_PERIOD_SECS: u64 = 5;

/// 采集缓冲区容量（脉冲数），大于一帧所需的 41 个
pub const CAPTURE_CAPACITY: usize = 48;

/// 采集时钟：1 tick = 1us
pub const TICK_DURATION_US: u32 = 1;

/// 空闲阈值：1000 tick (1ms) 内无跳变即结束采集
pub const IDLE_TIMEOUT_TICKS: u16 = 1000;

/// 失败后的重试次数（总共尝试 3 次）
pub const RETRIES: u8 = 2;

/// 两次尝试之间的等待时间 (ms)，传感器需要至少 2 秒复位
pub const RETRY_DELAY_MS: u32 = 2000;

/// 传感器配置
///
/// 指定使用哪个 GPIO 引脚以及哪个脉冲采集通道。创建后不再修改，
/// 在多次读取之间必须保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    /// 数据线 GPIO 编号
    pub gpio_pin: u8,
    /// 脉冲采集通道编号
    pub capture_channel: u8,
}

impl SensorConfig {
    pub const fn new(gpio_pin: u8, capture_channel: u8) -> Self {
        Self {
            gpio_pin,
            capture_channel,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::new(SENSOR_GPIO, CAPTURE_CHANNEL)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SensorConfig {{ gpio: {}, channel: {} }}",
            self.gpio_pin,
            self.capture_channel
        );
    }
}

impl core::fmt::Display for SensorConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "SensorConfig {{ gpio: {}, channel: {} }}",
            self.gpio_pin, self.capture_channel
        )
    }
}
