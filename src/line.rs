//! 单总线数据线抽象
//!
//! 握手阶段需要在输入（上拉释放）与输出（主机拉低）之间切换同一根引脚。

pub use embedded_hal::digital::PinState;

/// 引脚方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// 数据线操作
///
/// 与 `esp-hal` 的 `Flex` 一致，这些操作不会失败。
pub trait DataLine {
    /// 设置引脚方向
    fn set_direction(&mut self, direction: Direction);

    /// 设置输出电平
    fn write(&mut self, state: PinState);

    /// 读取当前电平
    fn read(&mut self) -> PinState;

    /// 使能内部上拉
    fn enable_pullup(&mut self);

    /// 释放总线：切换为输入并上拉
    fn release(&mut self) {
        self.set_direction(Direction::Input);
        self.enable_pullup();
    }
}
