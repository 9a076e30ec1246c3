//! 温湿度读数

/// 温湿度数据
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// 相对湿度 (%RH)
    pub humidity_percent: f32,
    /// 温度 (°C)
    pub temperature_celsius: f32,
}

impl core::fmt::Display for SensorReading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Temperature: {:.1}°C, Humidity: {:.1}%RH",
            self.temperature_celsius, self.humidity_percent
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Temperature: {}°C, Humidity: {}%RH",
            self.temperature_celsius,
            self.humidity_percent
        );
    }
}
