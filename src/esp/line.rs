use esp_hal::gpio::{DriveMode, Flex, InputConfig, InputPin, Level, OutputConfig, OutputPin, Pull};

use crate::line::{DataLine, Direction, PinState};

/// 初始化传感器数据线
///
/// 配置为开漏输出并上拉，输入始终使能，以便 RMT 能采集同一引脚上的信号。
pub fn data_line<'d>(pin: impl OutputPin + InputPin + 'd) -> Flex<'d> {
    let mut flex = Flex::new(pin);
    flex.set_high();
    flex.apply_output_config(
        &OutputConfig::default()
            .with_drive_mode(DriveMode::OpenDrain)
            .with_pull(Pull::Up),
    );
    flex.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
    flex.set_input_enable(true);
    flex
}

impl DataLine for Flex<'_> {
    fn set_direction(&mut self, direction: Direction) {
        self.set_output_enable(direction == Direction::Output);
        self.set_input_enable(true);
    }

    fn write(&mut self, state: PinState) {
        self.set_level(Level::from(bool::from(state)));
    }

    fn read(&mut self) -> PinState {
        PinState::from(self.is_high())
    }

    fn enable_pullup(&mut self) {
        self.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
    }
}
