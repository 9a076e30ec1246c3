use embassy_futures::select::{Either, select};
use embassy_time::Timer;
use esp_hal::Async;
use esp_hal::gpio::{Flex, Level};
use esp_hal::peripherals::RMT;
use esp_hal::rmt::{Channel, PulseCode, Rmt, Rx, RxChannelConfig, RxChannelCreator};
use esp_hal::time::Rate;

use crate::capture::{CaptureConfig, CaptureError, PulseCapture, PulseSample, assemble_pulses};
use crate::config::{CAPTURE_CAPACITY, RMT_SOURCE_MHZ, SensorConfig};
use crate::error::SensorError;
use crate::line::PinState;

/// 根据采集配置生成 RMT 接收通道配置
pub fn rx_config(config: &CaptureConfig) -> Result<RxChannelConfig, SensorError> {
    let divider = config.clock_divider(RMT_SOURCE_MHZ)?;
    Ok(RxChannelConfig::default()
        .with_clk_divider(divider)
        .with_idle_threshold(config.idle_timeout_ticks))
}

/// 在数据线上打开 RMT 接收通道
///
/// # 参数
/// * `rmt` - RMT 外设
/// * `line` - 传感器数据线
/// * `config` - 传感器配置，`capture_channel` 必须是 4~7
/// * `capture` - 采集时钟与空闲阈值
///
/// # 返回值
/// * `Ok(RmtCapture)` - 已配置好的采集外设
/// * `Err(SensorError::PeripheralConfig)` - 通道无效或驱动拒绝配置
pub fn open_capture<'d>(
    rmt: RMT<'d>,
    line: &Flex<'d>,
    config: &SensorConfig,
    capture: &CaptureConfig,
) -> Result<RmtCapture<'d>, SensorError> {
    super::validate(config)?;
    let rx_config = rx_config(capture)?;
    let rmt = Rmt::new(rmt, Rate::from_mhz(RMT_SOURCE_MHZ))
        .map_err(|_| SensorError::PeripheralConfig)?
        .into_async();

    let input = line.peripheral_input();
    let channel = match config.capture_channel {
        4 => rmt.channel4.configure_rx(input, rx_config),
        5 => rmt.channel5.configure_rx(input, rx_config),
        6 => rmt.channel6.configure_rx(input, rx_config),
        7 => rmt.channel7.configure_rx(input, rx_config),
        _ => return Err(SensorError::PeripheralConfig),
    }
    .map_err(|_| SensorError::PeripheralConfig)?;

    info!(
        "RMT channel {} armed on GPIO{}",
        config.capture_channel, config.gpio_pin
    );
    Ok(RmtCapture::new(channel))
}

/// 基于 RMT 接收通道的脉冲采集
pub struct RmtCapture<'d> {
    channel: Channel<'d, Async, Rx>,
    codes: [PulseCode; CAPTURE_CAPACITY],
    armed: bool,
}

impl<'d> RmtCapture<'d> {
    pub fn new(channel: Channel<'d, Async, Rx>) -> Self {
        Self {
            channel,
            codes: [PulseCode::default(); CAPTURE_CAPACITY],
            armed: false,
        }
    }
}

// RMT 在 `receive` 中才开始接收，`start` / `stop` 只维护采集窗口状态
impl PulseCapture for RmtCapture<'_> {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.armed {
            return Err(CaptureError::Busy);
        }
        self.armed = true;
        Ok(())
    }

    async fn receive(
        &mut self,
        samples: &mut [PulseSample],
        timeout_ms: u32,
    ) -> Result<usize, CaptureError> {
        if !self.armed {
            return Err(CaptureError::NotStarted);
        }

        let received = select(
            self.channel.receive(&mut self.codes),
            Timer::after_millis(u64::from(timeout_ms)),
        )
        .await;
        let count = match received {
            Either::First(Ok(count)) => count.min(CAPTURE_CAPACITY),
            Either::First(Err(_)) => return Err(CaptureError::Peripheral),
            Either::Second(()) => return Err(CaptureError::Timeout),
        };

        let written = assemble_pulses(segments(&self.codes[..count]), samples);
        trace!("RMT received {} symbols, {} pulses", count, written);
        Ok(written)
    }

    fn release(&mut self) {
        self.codes.fill(PulseCode::default());
    }

    fn stop(&mut self) {
        self.armed = false;
    }
}

/// 把 RMT 符号展开为 (电平, 时长) 段，每个符号包含前后两段
fn segments(codes: &[PulseCode]) -> impl Iterator<Item = (PinState, u16)> + '_ {
    codes.iter().flat_map(|code| {
        [
            (to_pin_state(code.level1()), code.length1() as u16),
            (to_pin_state(code.level2()), code.length2() as u16),
        ]
    })
}

fn to_pin_state(level: Level) -> PinState {
    match level {
        Level::High => PinState::High,
        Level::Low => PinState::Low,
    }
}
