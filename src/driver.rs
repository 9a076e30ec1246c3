//! 单次读取事务
//!
//! 一次事务的步骤：
//! 1. 数据线切换为上拉输入，稳定 10ms
//! 2. 主机拉低数据线 18ms（起始信号），然后释放并等待 30us
//! 3. 等待传感器拉低应答，再等待它释放为高电平（各最多 90us），超时即传感器无响应
//! 4. 打开采集窗口，等待脉冲数据（最多 100ms）
//! 5. 解码脉冲序列
//! 6. 交还采集缓冲区并关闭采集窗口（任何退出路径都会执行）
//!
//! 步骤 1~3 使用忙等延时，不让出调度器。其中释放总线到应答结束这段只有几十到
//! 两百微秒，精度小于调度器的 tick，在临界区内完成，期间不能被抢占。

use embedded_hal::delay::DelayNs;

use crate::capture::{PulseCapture, PulseSample};
use crate::config::{CAPTURE_CAPACITY, SensorConfig};
use crate::error::SensorError;
use crate::frame;
use crate::line::{DataLine, Direction, PinState};
use crate::profile::SensorProfile;
use crate::reading::SensorReading;
use crate::retry::Transact;

/// 上电后总线稳定时间 (ms)
const SETTLE_MS: u32 = 10;
/// 释放总线后等待传感器响应的时间 (us)
const RELEASE_WAIT_US: u32 = 30;
/// 等待传感器应答每个电平的超时 (us)
const RESPONSE_TIMEOUT_US: u32 = 90;
/// 采集窗口超时 (ms)
const RECEIVE_TIMEOUT_MS: u32 = 100;

/// 单总线温湿度传感器驱动
///
/// 驱动独占数据线和采集通道，同一通道上不会有两个事务同时进行。
pub struct SensorDriver<L, C, D> {
    config: SensorConfig,
    profile: SensorProfile,
    line: L,
    capture: C,
    delay: D,
}

impl<L, C, D> SensorDriver<L, C, D>
where
    L: DataLine,
    C: PulseCapture,
    D: DelayNs,
{
    /// 创建驱动并预热采集外设
    ///
    /// # 参数
    /// * `config` - 引脚与采集通道
    /// * `profile` - 传感器型号参数
    /// * `line` - 数据线
    /// * `capture` - 已配置好的采集外设
    /// * `delay` - 忙等延时
    ///
    /// # 返回值
    /// * `Ok(SensorDriver)` - 驱动实例
    /// * `Err(SensorError::PeripheralConfig)` - 采集外设预热失败
    pub fn new(
        config: SensorConfig,
        profile: SensorProfile,
        mut line: L,
        mut capture: C,
        delay: D,
    ) -> Result<Self, SensorError> {
        capture.prime()?;
        line.release();
        info!("{} ready on {}", profile.name, config);
        Ok(Self {
            config,
            profile,
            line,
            capture,
            delay,
        })
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn profile(&self) -> &SensorProfile {
        &self.profile
    }

    /// 拆出数据线、采集外设和延时
    pub fn into_parts(self) -> (L, C, D) {
        (self.line, self.capture, self.delay)
    }

    /// 执行一次完整的读取事务
    ///
    /// # 返回值
    /// * `Ok(SensorReading)` - 校验通过的温湿度数据
    /// * `Err(SensorError)` - 本次事务失败，由调用者决定是否重试
    pub async fn transact(&mut self) -> Result<SensorReading, SensorError> {
        self.handshake()?;

        self.capture.start()?;
        let mut session = scopeguard::guard((&mut self.capture, false), |(capture, received)| {
            if received {
                capture.release();
            }
            capture.stop();
        });

        let mut samples = [PulseSample::default(); CAPTURE_CAPACITY];
        let (capture, received) = &mut *session;
        let captured = capture.receive(&mut samples, RECEIVE_TIMEOUT_MS).await?;
        *received = true;
        debug!("{} pulses captured", captured);

        frame::decode(&self.profile, &samples[..captured])
    }

    /// 起始信号与应答检测
    fn handshake(&mut self) -> Result<(), SensorError> {
        let line = &mut self.line;
        let delay = &mut self.delay;

        // 上拉输入，稳定总线
        line.release();
        delay.delay_ms(SETTLE_MS);

        // 主机拉低数据线
        line.set_direction(Direction::Output);
        line.write(PinState::Low);
        delay.delay_ms(self.profile.start_low_ms);

        critical_section::with(|_cs| {
            line.release();
            delay.delay_us(RELEASE_WAIT_US);

            // 释放后上拉先把总线拉高，传感器应答时先拉低 80us 再释放 80us
            wait_for_level(line, PinState::Low, RESPONSE_TIMEOUT_US, delay)?;
            wait_for_level(line, PinState::High, RESPONSE_TIMEOUT_US, delay)
        })
        .inspect_err(|_| warn!("{} did not answer the start signal", self.profile.name))
    }
}

impl<L, C, D> Transact for SensorDriver<L, C, D>
where
    L: DataLine,
    C: PulseCapture,
    D: DelayNs,
{
    async fn transact(&mut self) -> Result<SensorReading, SensorError> {
        SensorDriver::transact(self).await
    }
}

/// 等待引脚达到目标电平，超时返回错误（单位：微秒）
fn wait_for_level<L: DataLine, D: DelayNs>(
    line: &mut L,
    target: PinState,
    timeout_us: u32,
    delay: &mut D,
) -> Result<(), SensorError> {
    for _ in 0..timeout_us {
        if line.read() == target {
            return Ok(());
        }
        delay.delay_us(1);
    }
    Err(SensorError::NoResponse)
}
