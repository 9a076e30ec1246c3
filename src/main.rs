#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use {esp_backtrace as _, esp_println as _};

mod sensor;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let time_g0_timer = peripherals.TIMG0;
    let time_g0 = TimerGroup::new(time_g0_timer);
    esp_rtos::start(time_g0.timer0);

    info!("Embassy initialized!");

    // 数据线 GPIO4，RMT 接收通道 4
    match sensor::sensor_init(peripherals.RMT, peripherals.GPIO4).await {
        Ok(()) => spawner
            .spawn(sensor::sensor_task())
            .expect("failed to spawn sensor task"),
        Err(e) => error!("Sensor init failed: {}", e),
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
