//! 单元测试用的数据线、采集外设与延时替身

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::capture::{CaptureError, PulseCapture, PulseSample};
use crate::line::{DataLine, Direction, PinState};

/// 数据位 0 的判决脉宽 (us)
pub const ZERO_LOW_US: u16 = 26;
/// 数据位 1 的判决脉宽 (us)
pub const ONE_LOW_US: u16 = 70;

pub fn checksum_for(humidity: u16, temperature: u16) -> u8 {
    let [a, b] = humidity.to_be_bytes();
    let [c, d] = temperature.to_be_bytes();
    a.wrapping_add(b).wrapping_add(c).wrapping_add(d)
}

/// 按脉宽编码生成一帧采集数据：起始标志 + 40 位
pub fn encode_frame(humidity: u16, temperature: u16, checksum: u8) -> Vec<PulseSample> {
    let mut samples = Vec::with_capacity(41);
    samples.push(PulseSample::new(80, 50));
    let bits = (u64::from(humidity) << 24) | (u64::from(temperature) << 8) | u64::from(checksum);
    for i in (0..40).rev() {
        let low = if (bits >> i) & 1 == 1 { ONE_LOW_US } else { ZERO_LOW_US };
        samples.push(PulseSample::new(50, low));
    }
    samples
}

/// 数据线操作与忙等延时，按发生顺序记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    Direction(Direction),
    Write(PinState),
    Pullup,
    Read,
    /// 忙等延时 (us)
    Wait(u32),
}

type Trace = Rc<RefCell<Vec<LineOp>>>;

/// 按脚本返回电平的数据线
///
/// 每次主机拉低总线（起始信号）后重新开始脚本：第 n 次读取返回 `script[n]`，
/// 脚本用完后返回 `idle`。
pub struct FakeLine {
    trace: Trace,
    script: Vec<PinState>,
    idle: PinState,
    position: usize,
    reads: usize,
}

impl FakeLine {
    fn scripted(script: Vec<PinState>, idle: PinState) -> Self {
        Self {
            trace: Trace::default(),
            script,
            idle,
            position: 0,
            reads: 0,
        }
    }

    /// 释放后上拉先保持高电平，随后传感器拉低应答，再释放为高电平
    pub fn responding() -> Self {
        use PinState::{High, Low};
        Self::scripted(std::vec![High, High, Low, Low, Low], High)
    }

    /// 传感器不应答，上拉一直保持高电平
    pub fn silent() -> Self {
        Self::scripted(Vec::new(), PinState::High)
    }

    /// 传感器拉低应答后不再释放
    pub fn stuck_low() -> Self {
        use PinState::{High, Low};
        Self::scripted(std::vec![High, Low], Low)
    }

    /// 与数据线共用操作记录的忙等延时
    pub fn delay(&self) -> TracingDelay {
        TracingDelay {
            trace: self.trace.clone(),
        }
    }

    pub fn ops(&self) -> Vec<LineOp> {
        self.trace.borrow().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    fn record(&self, op: LineOp) {
        self.trace.borrow_mut().push(op);
    }
}

impl DataLine for FakeLine {
    fn set_direction(&mut self, direction: Direction) {
        self.record(LineOp::Direction(direction));
    }

    fn write(&mut self, state: PinState) {
        self.record(LineOp::Write(state));
        if state == PinState::Low {
            self.position = 0;
        }
    }

    fn read(&mut self) -> PinState {
        self.record(LineOp::Read);
        let level = self.script.get(self.position).copied().unwrap_or(self.idle);
        self.position += 1;
        self.reads += 1;
        level
    }

    fn enable_pullup(&mut self) {
        self.record(LineOp::Pullup);
    }
}

/// 把每次忙等记录到数据线操作序列中的延时
pub struct TracingDelay {
    trace: Trace,
}

impl embedded_hal::delay::DelayNs for TracingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(LineOp::Wait(ns / 1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.borrow_mut().push(LineOp::Wait(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(LineOp::Wait(ms * 1_000));
    }
}

/// 返回预设数据的采集外设，统计各操作的调用次数
#[derive(Default)]
pub struct FakeCapture {
    pub payload: Vec<PulseSample>,
    pub fail_receive: Option<CaptureError>,
    pub fail_start: Option<CaptureError>,
    pub starts: usize,
    pub stops: usize,
    pub receives: usize,
    pub releases: usize,
    pub last_timeout_ms: Option<u32>,
    armed: bool,
}

impl FakeCapture {
    pub fn with_payload(payload: Vec<PulseSample>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn failing(err: CaptureError) -> Self {
        Self {
            fail_receive: Some(err),
            ..Self::default()
        }
    }

    pub fn failing_start(err: CaptureError) -> Self {
        Self {
            fail_start: Some(err),
            ..Self::default()
        }
    }
}

impl PulseCapture for FakeCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if let Some(err) = self.fail_start {
            return Err(err);
        }
        if self.armed {
            return Err(CaptureError::Busy);
        }
        self.armed = true;
        self.starts += 1;
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
        self.receives += 1;
        self.last_timeout_ms = Some(timeout_ms);
        if let Some(err) = self.fail_receive {
            return Err(err);
        }
        let count = self.payload.len().min(samples.len());
        samples[..count].copy_from_slice(&self.payload[..count]);
        Ok(count)
    }

    fn release(&mut self) {
        self.releases += 1;
    }

    fn stop(&mut self) {
        self.armed = false;
        self.stops += 1;
    }
}

/// 记录每次毫秒级等待的异步延时
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}
