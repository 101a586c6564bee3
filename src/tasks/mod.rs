//! 固件任务模块
//!
//! - `console`: UART 命令控制台

pub mod console;
