//! 传感器型号参数
//!
//! AM2320、DHT22 与 DHT11 共用同一套单总线时序和 40 位帧格式，
//! 区别只在于湿度/温度字段的定点格式。这里用一个小的参数对象描述这些差异，
//! 由帧解码器根据型号选择换算方式。

/// 湿度字段编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityEncoding {
    /// 16 位整数，单位 0.1 %RH（AM2320 / DHT22）
    Tenths,
    /// 高字节为整数部分，低字节为小数部分（DHT11）
    IntegralDecimal,
}

/// 温度字段编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureEncoding {
    /// 最高位为符号位，其余 15 位为 0.1°C 的绝对值（AM2320 / DHT22）
    SignMagnitudeTenths,
    /// 高字节为整数部分，低字节为小数部分，无符号位（DHT11）
    IntegralDecimal,
}

/// 传感器型号参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    /// 型号名称，用于日志
    pub name: &'static str,
    /// 起始信号低电平保持时间 (ms)
    pub start_low_ms: u32,
    /// 位判决阈值 (us)：`PulseSample::low` 小于该值为 0，否则为 1
    pub bit_threshold_us: u16,
    pub humidity: HumidityEncoding,
    pub temperature: TemperatureEncoding,
}

impl SensorProfile {
    pub const AM2320: SensorProfile = SensorProfile {
        name: "AM2320",
        start_low_ms: 18,
        bit_threshold_us: 50,
        humidity: HumidityEncoding::Tenths,
        temperature: TemperatureEncoding::SignMagnitudeTenths,
    };

    pub const DHT22: SensorProfile = SensorProfile {
        name: "DHT22",
        ..Self::AM2320
    };

    pub const DHT11: SensorProfile = SensorProfile {
        name: "DHT11",
        start_low_ms: 18,
        bit_threshold_us: 50,
        humidity: HumidityEncoding::IntegralDecimal,
        temperature: TemperatureEncoding::IntegralDecimal,
    };

    /// 原始湿度字段换算为 %RH
    pub fn humidity_percent(&self, raw: u16) -> f32 {
        match self.humidity {
            HumidityEncoding::Tenths => raw as f32 * 0.1,
            HumidityEncoding::IntegralDecimal => integral_decimal(raw),
        }
    }

    /// 原始温度字段换算为 °C
    pub fn temperature_celsius(&self, raw: u16) -> f32 {
        match self.temperature {
            TemperatureEncoding::SignMagnitudeTenths => {
                let magnitude = (raw & 0x7FFF) as f32 * 0.1;
                if raw & 0x8000 != 0 {
                    -magnitude
                } else {
                    magnitude
                }
            }
            TemperatureEncoding::IntegralDecimal => integral_decimal(raw),
        }
    }
}

fn integral_decimal(raw: u16) -> f32 {
    let [high, low] = raw.to_be_bytes();
    high as f32 + low as f32 * 0.1
}
