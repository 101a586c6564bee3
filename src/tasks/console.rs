//! UART 控制台任务
//!
//! 从 UART 接收字节，拼装命令行，在存储锁内执行命令，
//! 再把响应写回 UART。一条命令完全处理完之后才处理下一条。

use esp_hal::{uart::Uart, Async};
use esp_storage::FlashStorage;

use eepromfs::config::{MAX_LINE_LEN, RESPONSE_CAPACITY};
use eepromfs::fs::EepromWindow;
use eepromfs::sync::CriticalStore;
use eepromfs::{execute, log_info, log_warn, LineAssembler};

/// Flash 模拟的 EEPROM
pub type FirmwareEeprom = EepromWindow<FlashStorage<'static>>;

/// UART 单次接收缓冲区大小
const RX_CHUNK: usize = 64;

/// 控制台任务
///
/// 运行在主执行器，非实时敏感
#[embassy_executor::task]
pub async fn console_task(
    mut uart: Uart<'static, Async>,
    store: &'static CriticalStore<FirmwareEeprom>,
) {
    log_info!("Console task started");

    let mut assembler: LineAssembler<MAX_LINE_LEN> = LineAssembler::new();
    let mut response: heapless::Vec<u8, RESPONSE_CAPACITY> = heapless::Vec::new();
    let mut rx = [0u8; RX_CHUNK];

    loop {
        let received = match uart.read_async(&mut rx).await {
            Ok(n) => n,
            Err(_) => {
                log_warn!("UART receive error, dropping partial line");
                assembler.reset();
                continue;
            }
        };

        for &byte in &rx[..received] {
            let Some(line) = assembler.push(byte) else {
                continue;
            };

            response.clear();
            let _ = store.lock(|fs| execute(fs, line, &mut response));

            if !response.is_empty() {
                write_all(&mut uart, &response).await;
            }
        }
    }
}

/// 写出全部响应字节
async fn write_all(uart: &mut Uart<'static, Async>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match uart.write_async(bytes).await {
            Ok(0) => break,
            Ok(n) => bytes = &bytes[n..],
            Err(_) => {
                log_warn!("UART transmit error, response truncated");
                break;
            }
        }
    }
}
