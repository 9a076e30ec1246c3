//! 40 位数据帧解码
//!
//! 数据格式为 40 位：[湿度 16 位] [温度 16 位] [校验和 8 位]，高位在前。
//! 采集序列的第一个脉冲是传感器开始发送的标志，之后每个脉冲对应一位：
//! 窄脉冲为 0，宽脉冲为 1。
//!
//! 校验和 = 湿度高位 + 湿度低位 + 温度高位 + 温度低位（取低 8 位）

use crate::capture::PulseSample;
use crate::error::SensorError;
use crate::profile::SensorProfile;
use crate::reading::SensorReading;

/// 数据位数
pub const FRAME_BITS: usize = 40;

/// 一帧所需的最少脉冲数：1 个起始标志 + 40 个数据位
pub const MIN_SAMPLES: usize = FRAME_BITS + 1;

/// 解码后的原始数据帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFrame {
    pub humidity_raw: u16,
    pub temperature_raw: u16,
    pub checksum: u8,
}

impl SensorFrame {
    /// 从脉冲序列中提取数据帧（不校验）
    ///
    /// # 参数
    /// * `samples` - 采集到的脉冲序列，包含起始标志
    /// * `threshold_us` - 位判决阈值
    ///
    /// # 返回值
    /// * `Ok(SensorFrame)` - 提取出的原始字段
    /// * `Err(SensorError::InsufficientData)` - 脉冲数不足 41 个
    pub fn from_samples(samples: &[PulseSample], threshold_us: u16) -> Result<Self, SensorError> {
        if samples.len() < MIN_SAMPLES {
            return Err(SensorError::InsufficientData {
                captured: samples.len(),
            });
        }

        // 跳过起始标志
        let bits = &samples[1..MIN_SAMPLES];
        let (humidity, rest) = bits.split_at(16);
        let (temperature, checksum) = rest.split_at(16);

        Ok(SensorFrame {
            humidity_raw: accumulate(humidity, threshold_us) as u16,
            temperature_raw: accumulate(temperature, threshold_us) as u16,
            checksum: accumulate(checksum, threshold_us) as u8,
        })
    }

    /// 根据湿度和温度字段计算应有的校验和
    pub fn expected_checksum(&self) -> u8 {
        let [h_high, h_low] = self.humidity_raw.to_be_bytes();
        let [t_high, t_low] = self.temperature_raw.to_be_bytes();
        h_high
            .wrapping_add(h_low)
            .wrapping_add(t_high)
            .wrapping_add(t_low)
    }

    /// 校验数据帧
    pub fn verify(&self) -> Result<(), SensorError> {
        let expected = self.expected_checksum();
        if expected != self.checksum {
            return Err(SensorError::Checksum {
                expected,
                received: self.checksum,
            });
        }
        Ok(())
    }

    /// 按型号参数换算为物理量
    pub fn to_reading(&self, profile: &SensorProfile) -> SensorReading {
        SensorReading {
            humidity_percent: profile.humidity_percent(self.humidity_raw),
            temperature_celsius: profile.temperature_celsius(self.temperature_raw),
        }
    }
}

/// 单个脉冲的位值：低相位时长小于阈值为 0，否则为 1
#[inline]
pub fn decode_bit(sample: &PulseSample, threshold_us: u16) -> bool {
    sample.low >= threshold_us
}

// 高位在前
fn accumulate(samples: &[PulseSample], threshold_us: u16) -> u32 {
    samples
        .iter()
        .fold(0, |acc, sample| (acc << 1) | decode_bit(sample, threshold_us) as u32)
}

/// 解码脉冲序列
///
/// # 参数
/// * `profile` - 传感器型号参数
/// * `samples` - 采集到的脉冲序列
///
/// # 返回值
/// * `Ok(SensorReading)` - 校验通过后的温湿度
/// * `Err(SensorError)` - 数据不足或校验失败，不返回部分数据
pub fn decode(profile: &SensorProfile, samples: &[PulseSample]) -> Result<SensorReading, SensorError> {
    let frame = SensorFrame::from_samples(samples, profile.bit_threshold_us)?;
    if let Err(err) = frame.verify() {
        warn!(
            "{} frame rejected: checksum {} != {}",
            profile.name,
            frame.checksum,
            frame.expected_checksum()
        );
        return Err(err);
    }
    trace!(
        "{} frame: humidity {}, temperature {}",
        profile.name,
        frame.humidity_raw,
        frame.temperature_raw
    );
    Ok(frame.to_reading(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{checksum_for, encode_frame, ONE_LOW_US, ZERO_LOW_US};

    extern crate std;
    use std::vec::Vec;

    fn assert_reading(reading: SensorReading, humidity: f32, temperature: f32) {
        assert!(
            (reading.humidity_percent - humidity).abs() < 0.1,
            "humidity {} != {}",
            reading.humidity_percent,
            humidity
        );
        assert!(
            (reading.temperature_celsius - temperature).abs() < 0.1,
            "temperature {} != {}",
            reading.temperature_celsius,
            temperature
        );
    }

    #[test]
    fn test_decode_am2320_round_trip() {
        let cases = [
            (0x0000, 0x0000, 0.0, 0.0),
            (652, 0x00E6, 65.2, 23.0),
            (0x03E8, 0x8065, 100.0, -10.1),
            (0x0190, 0x01F4, 40.0, 50.0),
        ];
        for (humidity, temperature, expected_h, expected_t) in cases {
            let samples = encode_frame(humidity, temperature, checksum_for(humidity, temperature));
            let reading = decode(&SensorProfile::AM2320, &samples).unwrap();
            assert_reading(reading, expected_h, expected_t);
        }
    }

    #[test]
    fn test_decode_am2320_round_trip_over_range() {
        for humidity in (0u16..=1000).step_by(7) {
            for magnitude in (0u16..=800).step_by(53) {
                for sign in [0x0000, 0x8000] {
                    let temperature = magnitude | sign;
                    let samples =
                        encode_frame(humidity, temperature, checksum_for(humidity, temperature));
                    let frame = SensorFrame::from_samples(&samples, 50).unwrap();
                    assert_eq!(frame.humidity_raw, humidity);
                    assert_eq!(frame.temperature_raw, temperature);

                    let expected_t = if sign == 0 {
                        magnitude as f32 / 10.0
                    } else {
                        -(magnitude as f32) / 10.0
                    };
                    let reading = decode(&SensorProfile::AM2320, &samples).unwrap();
                    assert_reading(reading, humidity as f32 / 10.0, expected_t);
                }
            }
        }
    }

    #[test]
    fn test_decode_dht11_round_trip_over_range() {
        for integral in 0u16..=95 {
            for decimal in 0u16..=9 {
                let humidity = (integral << 8) | decimal;
                let temperature = ((integral / 2) << 8) | (9 - decimal);
                let samples =
                    encode_frame(humidity, temperature, checksum_for(humidity, temperature));
                let reading = decode(&SensorProfile::DHT11, &samples).unwrap();
                assert_reading(
                    reading,
                    integral as f32 + decimal as f32 * 0.1,
                    (integral / 2) as f32 + (9 - decimal) as f32 * 0.1,
                );
            }
        }
    }

    #[test]
    fn test_decode_dht11_round_trip() {
        // 45.0 %RH, 23.4°C
        let samples = encode_frame(0x2D00, 0x1704, checksum_for(0x2D00, 0x1704));
        let reading = decode(&SensorProfile::DHT11, &samples).unwrap();
        assert_reading(reading, 45.0, 23.4);
    }

    #[test]
    fn test_sign_handling() {
        let negative = encode_frame(0x0100, 0x8032, checksum_for(0x0100, 0x8032));
        let positive = encode_frame(0x0100, 0x0032, checksum_for(0x0100, 0x0032));
        assert_reading(decode(&SensorProfile::AM2320, &negative).unwrap(), 25.6, -5.0);
        assert_reading(decode(&SensorProfile::AM2320, &positive).unwrap(), 25.6, 5.0);
    }

    #[test]
    fn test_checksum_single_bit_flip_rejected() {
        let (humidity, temperature) = (652, 0x00E6);
        let good = checksum_for(humidity, temperature);
        for bit in 0..8 {
            let samples = encode_frame(humidity, temperature, good ^ (1 << bit));
            let result = decode(&SensorProfile::AM2320, &samples);
            assert_eq!(
                result,
                Err(SensorError::Checksum {
                    expected: good,
                    received: good ^ (1 << bit)
                })
            );
        }
    }

    #[test]
    fn test_insufficient_data_boundary() {
        let samples = encode_frame(652, 0x00E6, checksum_for(652, 0x00E6));
        assert_eq!(samples.len(), MIN_SAMPLES);
        for len in 0..MIN_SAMPLES {
            assert_eq!(
                decode(&SensorProfile::AM2320, &samples[..len]),
                Err(SensorError::InsufficientData { captured: len })
            );
        }
        assert!(decode(&SensorProfile::AM2320, &samples).is_ok());
    }

    #[test]
    fn test_trailing_samples_ignored() {
        let mut samples = encode_frame(652, 0x00E6, checksum_for(652, 0x00E6));
        samples.push(PulseSample::new(50, 0));
        samples.push(PulseSample::new(0, 0));
        assert_reading(decode(&SensorProfile::AM2320, &samples).unwrap(), 65.2, 23.0);
    }

    #[test]
    fn test_bit_threshold_edge() {
        assert!(!decode_bit(&PulseSample::new(50, 49), 50));
        assert!(decode_bit(&PulseSample::new(50, 50), 50));
    }

    #[test]
    fn test_start_marker_skipped() {
        // 起始标志为宽脉冲，不能被当成数据位
        let mut samples = encode_frame(0, 0, 0);
        samples[0] = PulseSample::new(80, 80);
        let frame = SensorFrame::from_samples(&samples, 50).unwrap();
        assert_eq!(frame.humidity_raw, 0);
        assert_eq!(frame.checksum, 0);
    }

    #[test]
    fn test_frame_field_order() {
        let mut samples: Vec<PulseSample> = Vec::new();
        samples.push(PulseSample::new(80, 80));
        // 湿度最高位为 1，其余为 0；温度最低位为 1；校验和全 1
        for i in 0..FRAME_BITS {
            let one = i == 0 || i == 31 || i >= 32;
            samples.push(PulseSample::new(50, if one { ONE_LOW_US } else { ZERO_LOW_US }));
        }
        let frame = SensorFrame::from_samples(&samples, 50).unwrap();
        assert_eq!(frame.humidity_raw, 0x8000);
        assert_eq!(frame.temperature_raw, 0x0001);
        assert_eq!(frame.checksum, 0xFF);
        assert_eq!(frame.expected_checksum(), 0x81);
    }
}
