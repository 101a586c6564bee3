//! 串口控制台模块
//!
//! 行协议命令处理:
//! - `line`: 串口字节流拼装为命令行
//! - `command`: 命令行解析
//! - `dispatch`: 命令分发与响应输出
//! - `client`: 主机端编解码辅助

pub mod client;
pub mod command;
pub mod dispatch;
pub mod line;

pub use command::Command;
pub use dispatch::{dispatch, execute, Sink, FORMAT_CONFIRMATION, LINE_END};
pub use line::LineAssembler;
