//! eepromfs 固件 - ESP32-S3 上的串口 EEPROM 文件存储
//!
//! 1KB EEPROM 由 SPI Flash 存储分区中的一个窗口模拟，
//! 通过 UART0 (9600 baud) 上的行协议操作:
//!
//! ```text
//! WRITE <n> <data...>
//! READ <n>
//! LIST
//! WRITE_NAME <n> <name>
//! DELETE <n>
//! FORMAT
//! ```
//!
//! # 运行
//! ```bash
//! cargo run --release --features dev --target xtensa-esp32s3-none-elf
//! ```

#![no_std]
#![no_main]

esp_bootloader_esp_idf::esp_app_desc!();

mod tasks;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_hal::{
    timer::timg::TimerGroup,
    uart::{Config as UartConfig, Uart},
};
use esp_storage::FlashStorage;
use static_cell::StaticCell;

use eepromfs::config::BAUD_RATE;
use eepromfs::fs::{EepromConfig, EepromWindow, FileStore};
use eepromfs::sync::{CriticalStore, SharedStore};
use eepromfs::{log_error, log_info};

use crate::tasks::console::FirmwareEeprom;

// ===== Panic Handler =====
#[cfg(feature = "dev")]
use esp_backtrace as _;

#[cfg(not(feature = "dev"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop { core::hint::spin_loop(); }
}

// ===== 静态分配 =====
/// 文件存储 - 控制台任务持有 'static 引用
static STORE: StaticCell<CriticalStore<FirmwareEeprom>> = StaticCell::new();

/// 出错后停在这里，保持系统存活
async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

// ===== 主入口点 =====
#[esp_rtos::main]
async fn main(spawner: Spawner) {
    // ========================================
    // 1. 硬件初始化
    // ========================================
    let peripherals = esp_hal::init(esp_hal::Config::default());

    log_info!("{} v{} starting on ESP32-S3", eepromfs::NAME, eepromfs::VERSION);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // ========================================
    // 2. 挂载 Flash 模拟的 EEPROM
    // ========================================
    let device = EepromWindow::new(FlashStorage::new(peripherals.FLASH), EepromConfig::default());
    if !device.fits() {
        log_error!("EEPROM window does not fit in flash");
        halt().await;
    }

    let store = match FileStore::mount(device) {
        Ok(store) => store,
        Err(_) => {
            log_error!("EEPROM mount failed");
            halt().await
        }
    };
    let store = STORE.init(SharedStore::new(store));

    // ========================================
    // 3. UART0 控制台
    // ========================================
    let config = UartConfig::default().with_baudrate(BAUD_RATE);
    let uart = match Uart::new(peripherals.UART0, config) {
        Ok(uart) => uart
            .with_rx(peripherals.GPIO44)
            .with_tx(peripherals.GPIO43)
            .into_async(),
        Err(_) => {
            log_error!("UART0 configuration rejected");
            halt().await
        }
    };

    spawner.spawn(tasks::console::console_task(uart, store)).ok();

    log_info!("Console ready on UART0 @ {} baud", BAUD_RATE);

    // ========================================
    // 4. 主循环 - 空闲
    // ========================================
    halt().await
}
