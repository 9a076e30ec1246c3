//! 温湿度传感器任务
//!
//! 传感器实例保存在静态互斥锁中，由周期任务读取并打印。

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as EmbassyMutex;
use embassy_time::Timer;
use esp_hal::delay::Delay;
use esp_hal::gpio::{InputPin, OutputPin};
use esp_hal::peripherals::RMT;
use esp_th_sensor::config::READ_PERIOD_SECS;
use esp_th_sensor::esp::{self, EspSensor};
use esp_th_sensor::{CaptureConfig, Sensor, SensorConfig, SensorDriver, SensorError, SensorProfile};

/// 传感器静态变量
static SENSOR: EmbassyMutex<CriticalSectionRawMutex, Option<EspSensor>> =
    EmbassyMutex::new(None);

/// 初始化传感器
///
/// # 参数
/// * `rmt` - RMT 外设
/// * `pin` - 数据线引脚，须与 `SensorConfig::default()` 中的 GPIO 一致
///
/// # 返回值
/// * `Ok(())` - 初始化成功
/// * `Err(SensorError::PeripheralConfig)` - 引脚或 RMT 通道配置失败
pub async fn sensor_init(
    rmt: RMT<'static>,
    pin: impl OutputPin + InputPin + 'static,
) -> Result<(), SensorError> {
    let config = SensorConfig::default();
    let line = esp::data_line(pin);
    let capture = esp::open_capture(rmt, &line, &config, &CaptureConfig::default())?;
    let driver = SensorDriver::new(config, SensorProfile::AM2320, line, capture, Delay::new())?;

    SENSOR
        .lock()
        .await
        .replace(Sensor::new(driver, embassy_time::Delay));
    info!("Sensor init done");
    Ok(())
}

/// 传感器任务，定期读取并打印温湿度数据
#[embassy_executor::task]
pub async fn sensor_task() {
    loop {
        {
            let mut guard = SENSOR.lock().await;
            if let Some(sensor) = guard.as_mut() {
                let reading = match sensor.read().await {
                    Ok(reading) => Some(reading),
                    Err(e) => {
                        warn!("Failed to read sensor: {}", e);
                        None
                    }
                };

                // 读取失败时不沿用旧值，也不当作 0
                match reading {
                    Some(reading) => info!("{}", reading),
                    None => warn!("No reading available this cycle"),
                }
                info!("{}", sensor.stats());
            }
        }

        // 传感器每次读取后必须等待至少2秒才能进行下一次读取
        Timer::after_secs(READ_PERIOD_SECS).await;
    }
}
