//! 传感器读取错误类型

use core::fmt;

/// 传感器读取错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// 外设拒绝配置（引脚无效、通道被占用等），不重试
    PeripheralConfig,
    /// 起始信号后传感器没有拉高数据线
    NoResponse,
    /// 传感器已应答，但采集窗口内没有收到数据
    CaptureTimeout,
    /// 采集到的脉冲少于一帧所需的 41 个
    InsufficientData { captured: usize },
    /// 校验和错误
    Checksum { expected: u8, received: u8 },
    /// 所有尝试均失败
    TotalFailure { attempts: u8 },
}

impl SensorError {
    /// 该错误是否应由重试流程重新尝试
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SensorError::PeripheralConfig | SensorError::TotalFailure { .. }
        )
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::PeripheralConfig => f.write_str("Peripheral rejected configuration"),
            SensorError::NoResponse => f.write_str("No response from sensor"),
            SensorError::CaptureTimeout => f.write_str("Timeout waiting for pulse data"),
            SensorError::InsufficientData { captured } => {
                write!(f, "Insufficient data: {} pulses captured", captured)
            }
            SensorError::Checksum { expected, received } => write!(
                f,
                "Checksum mismatch: expected {:#04x}, received {:#04x}",
                expected, received
            ),
            SensorError::TotalFailure { attempts } => {
                write!(f, "Sensor read failed after {} attempts", attempts)
            }
        }
    }
}

impl core::error::Error for SensorError {}

// 为SensorError实现defmt::Format trait，以便可以使用defmt打印错误
#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SensorError::PeripheralConfig => {
                defmt::write!(f, "Peripheral rejected configuration");
            }
            SensorError::NoResponse => {
                defmt::write!(f, "No response from sensor");
            }
            SensorError::CaptureTimeout => {
                defmt::write!(f, "Timeout waiting for pulse data");
            }
            SensorError::InsufficientData { captured } => {
                defmt::write!(f, "Insufficient data: {} pulses captured", captured);
            }
            SensorError::Checksum { expected, received } => {
                defmt::write!(
                    f,
                    "Checksum mismatch: expected {=u8:#x}, received {=u8:#x}",
                    *expected,
                    *received
                );
            }
            SensorError::TotalFailure { attempts } => {
                defmt::write!(f, "Sensor read failed after {} attempts", attempts);
            }
        }
    }
}
