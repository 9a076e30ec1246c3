//! 带重试的读取流程
//!
//! 单总线协议本身不可靠，一次事务失败后等待传感器复位（至少 2 秒）再重试，
//! 最多重试 2 次。重试间隔固定，不做退避。

use embedded_hal_async::delay::DelayNs;

use crate::config::{RETRIES, RETRY_DELAY_MS};
use crate::error::SensorError;
use crate::reading::SensorReading;

/// 可重试的单次读取事务
#[allow(async_fn_in_trait)]
pub trait Transact {
    async fn transact(&mut self) -> Result<SensorReading, SensorError>;
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 失败后的重试次数
    pub retries: u8,
    /// 两次尝试之间的等待时间 (ms)
    pub retry_delay_ms: u32,
}

impl RetryPolicy {
    /// 传感器复位所需的最短等待时间 (ms)
    pub const MIN_RETRY_DELAY_MS: u32 = RETRY_DELAY_MS;

    /// 创建重试策略，等待时间不足 2 秒时按 2 秒处理
    pub fn new(retries: u8, retry_delay_ms: u32) -> Self {
        Self {
            retries,
            retry_delay_ms: retry_delay_ms.max(Self::MIN_RETRY_DELAY_MS),
        }
    }

    /// 总尝试次数
    pub fn attempts(&self) -> u8 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RETRIES, RETRY_DELAY_MS)
    }
}

/// 读取状态
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReadState {
    /// 正在进行第 n 次尝试（从 1 开始）
    Attempting(u8),
    /// 第 n 次尝试失败，等待后重试
    WaitingToRetry(u8),
    Succeeded(SensorReading),
    Failed(SensorError),
}

/// 读取统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// 读取周期数（每次调用 `read` 计一次）
    pub cycles: u32,
    pub successes: u32,
    /// 所有尝试都失败的周期数
    pub failures: u32,
    /// 重试次数
    pub retries: u32,
    /// 最近一次尝试失败的原因
    pub last_error: Option<SensorError>,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ReadStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ReadStats {{ cycles: {}, successes: {}, failures: {}, retries: {} }}",
            self.cycles,
            self.successes,
            self.failures,
            self.retries
        );
    }
}

impl core::fmt::Display for ReadStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "ReadStats {{ cycles: {}, successes: {}, failures: {}, retries: {} }}",
            self.cycles, self.successes, self.failures, self.retries
        )
    }
}

/// 读取传感器，失败时按策略重试
///
/// # 参数
/// * `sensor` - 单次读取事务
/// * `delay` - 协作式延时，用于重试间隔
/// * `policy` - 重试策略
/// * `stats` - 读取统计
///
/// # 返回值
/// * `Ok(SensorReading)` - 读取成功
/// * `Err(SensorError::TotalFailure)` - 所有尝试均失败
/// * `Err(SensorError::PeripheralConfig)` - 外设配置错误，不重试
pub async fn read<T, D>(
    sensor: &mut T,
    delay: &mut D,
    policy: &RetryPolicy,
    stats: &mut ReadStats,
) -> Result<SensorReading, SensorError>
where
    T: Transact,
    D: DelayNs,
{
    stats.cycles = stats.cycles.wrapping_add(1);
    let mut state = ReadState::Attempting(1);

    loop {
        state = match state {
            ReadState::Attempting(attempt) => match sensor.transact().await {
                Ok(reading) => ReadState::Succeeded(reading),
                Err(err) => {
                    stats.last_error = Some(err);
                    if !err.is_retryable() {
                        error!("Sensor read aborted: {}", err);
                        ReadState::Failed(err)
                    } else if attempt >= policy.attempts() {
                        ReadState::Failed(SensorError::TotalFailure { attempts: attempt })
                    } else {
                        warn!("Attempt {} failed: {}", attempt, err);
                        ReadState::WaitingToRetry(attempt)
                    }
                }
            },
            ReadState::WaitingToRetry(attempt) => {
                delay.delay_ms(policy.retry_delay_ms).await;
                stats.retries = stats.retries.wrapping_add(1);
                ReadState::Attempting(attempt + 1)
            }
            ReadState::Succeeded(reading) => {
                stats.successes = stats.successes.wrapping_add(1);
                return Ok(reading);
            }
            ReadState::Failed(err) => {
                stats.failures = stats.failures.wrapping_add(1);
                return Err(err);
            }
        };
    }
}

/// 带重试策略的传感器
pub struct Sensor<T, D> {
    transact: T,
    delay: D,
    policy: RetryPolicy,
    stats: ReadStats,
}

impl<T, D> Sensor<T, D>
where
    T: Transact,
    D: DelayNs,
{
    /// 创建一个使用默认重试策略的传感器
    pub fn new(transact: T, delay: D) -> Self {
        Self::with_policy(transact, delay, RetryPolicy::default())
    }

    pub fn with_policy(transact: T, delay: D, policy: RetryPolicy) -> Self {
        Self {
            transact,
            delay,
            policy,
            stats: ReadStats::default(),
        }
    }

    /// 读取温湿度，失败时自动重试
    pub async fn read(&mut self) -> Result<SensorReading, SensorError> {
        read(
            &mut self.transact,
            &mut self.delay,
            &self.policy,
            &mut self.stats,
        )
        .await
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &T {
        &self.transact
    }
}
