//! 脉冲计时采集
//!
//! 采集外设把数据线上的电平跳变转换成按时间顺序排列的 (高电平时长, 低电平时长)
//! 序列，以 tick 为单位。默认配置下 1 tick = 1us，空闲 1000 tick (1ms) 后结束采集。

use crate::config::{IDLE_TIMEOUT_TICKS, TICK_DURATION_US};
use crate::error::SensorError;
use crate::line::PinState;

/// 一个数据位的两段时长 (tick)
///
/// `low` 是判决位值所用的脉宽，`high` 是两位之间的固定间隔。
/// 采集实现负责把线上携带数据的那一段放进 `low`，见 [`assemble_pulses`]。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PulseSample {
    pub high: u16,
    pub low: u16,
}

impl PulseSample {
    pub const fn new(high: u16, low: u16) -> Self {
        Self { high, low }
    }
}

/// 采集错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// 等待数据超时
    Timeout,
    /// 未调用 `start` 就开始接收
    NotStarted,
    /// 采集窗口已打开
    Busy,
    /// 外设驱动返回错误
    Peripheral,
}

impl From<CaptureError> for SensorError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Timeout => SensorError::CaptureTimeout,
            CaptureError::NotStarted | CaptureError::Busy | CaptureError::Peripheral => {
                SensorError::PeripheralConfig
            }
        }
    }
}

/// 采集外设配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// 每个 tick 的时长 (us)
    pub tick_duration_us: u32,
    /// 空闲阈值 (tick)，超过该时长没有跳变即结束采集
    pub idle_timeout_ticks: u16,
}

impl CaptureConfig {
    /// RMT 空闲阈值寄存器为 15 位
    pub const MAX_IDLE_TICKS: u16 = 0x7FFF;

    /// 根据源时钟频率计算分频系数
    ///
    /// # 参数
    /// * `source_mhz` - 采集外设源时钟频率 (MHz)
    ///
    /// # 返回值
    /// * `Ok(u8)` - 分频系数
    /// * `Err(SensorError::PeripheralConfig)` - 分频系数或空闲阈值超出范围
    pub fn clock_divider(&self, source_mhz: u32) -> Result<u8, SensorError> {
        if self.idle_timeout_ticks == 0 || self.idle_timeout_ticks > Self::MAX_IDLE_TICKS {
            return Err(SensorError::PeripheralConfig);
        }
        let divider = source_mhz
            .checked_mul(self.tick_duration_us)
            .ok_or(SensorError::PeripheralConfig)?;
        match u8::try_from(divider) {
            Ok(0) | Err(_) => Err(SensorError::PeripheralConfig),
            Ok(divider) => Ok(divider),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tick_duration_us: TICK_DURATION_US,
            idle_timeout_ticks: IDLE_TIMEOUT_TICKS,
        }
    }
}

/// 脉冲计时采集外设
///
/// 一个实例独占一个采集通道。采集窗口由 `start` 打开、`stop` 关闭；
/// `receive` 把数据写入调用者提供的缓冲区，使用完毕后必须调用 `release`
/// 把外设缓冲区交还。
#[allow(async_fn_in_trait)]
pub trait PulseCapture {
    /// 打开采集窗口
    fn start(&mut self) -> Result<(), CaptureError>;

    /// 等待一批脉冲数据，返回写入 `samples` 的数量
    async fn receive(
        &mut self,
        samples: &mut [PulseSample],
        timeout_ms: u32,
    ) -> Result<usize, CaptureError>;

    /// 交还外设缓冲区
    fn release(&mut self);

    /// 关闭采集窗口
    fn stop(&mut self);

    /// 在第一次真正读取前走一遍 `start` / `stop`，
    /// 让配置错误在创建驱动时就暴露出来
    fn prime(&mut self) -> Result<(), CaptureError> {
        self.start()?;
        self.stop();
        Ok(())
    }
}

/// 把按时间顺序排列的电平段组装成脉冲序列，返回写入 `samples` 的数量
///
/// 传感器发送每一位时先拉低约 50us，再释放为高电平，高电平宽度决定位值
/// （约 26us 为 0，约 70us 为 1）。每个高电平段生成一个 `PulseSample`：
/// 高电平宽度放进 `low`，其后的低电平间隔放进 `high`。长度为 0 的段是结束标志。
///
/// 第一个高电平段是传感器的应答脉冲，即起始标志。如果第一段就是低电平，
/// 说明采集是在应答高电平的下降沿才开始记录的，此时补一个空的起始标志。
pub fn assemble_pulses<I>(segments: I, samples: &mut [PulseSample]) -> usize
where
    I: IntoIterator<Item = (PinState, u16)>,
{
    let mut segments = segments
        .into_iter()
        .take_while(|&(_, ticks)| ticks > 0)
        .peekable();
    let mut written = 0;

    if matches!(segments.peek(), Some((PinState::Low, _))) && !samples.is_empty() {
        samples[0] = PulseSample::default();
        written = 1;
    }

    while let Some((level, ticks)) = segments.next() {
        if level == PinState::Low {
            continue;
        }
        if written == samples.len() {
            break;
        }
        let gap = match segments.peek() {
            Some(&(PinState::Low, gap)) => gap,
            _ => 0,
        };
        samples[written] = PulseSample::new(gap, ticks);
        written += 1;
    }
    written
}
