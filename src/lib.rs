//! eepromfs - 1KB EEPROM 上的固定槽位文件存储
//!
//! 本库提供以下核心功能:
//! - 固定地址布局 (数据区 + 元数据区)
//! - 定宽元数据记录编解码
//! - 文件存储操作 (写入/读取/删除/重命名/格式化)
//! - 串口行协议命令分发
//! - 条件编译日志系统

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod fs;
pub mod sync;
pub mod util;

// ===== 重导出常用类型 =====
pub use console::{execute, Command, LineAssembler, Sink};
pub use fs::{FileStore, MetadataTable, Outcome, Rejection, StoreError};
pub use sync::SharedStore;

// ===== 版本信息 =====
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 系统配置常量
pub mod config {
    /// 文件槽位数量
    pub const FILE_COUNT: usize = 3;

    /// 每个槽位的数据容量 (字节)
    pub const FILE_SIZE: usize = 300;

    /// 持久化设备总容量 (字节)
    pub const DEVICE_CAPACITY: usize = 1024;

    /// 文件名最大有效长度
    pub const NAME_MAX_LEN: usize = 9;

    /// 文件名字段宽度 (含 null 结尾)
    pub const NAME_FIELD_LEN: usize = NAME_MAX_LEN + 1;

    /// 单行命令最大长度: `WRITE <n> ` 前缀 + 满载数据，留有余量
    ///
    /// 更长的行被截断到这个长度，WRITE 数据随之截断到 FILE_SIZE
    pub const MAX_LINE_LEN: usize = FILE_SIZE + 64;

    /// READ 时每次从设备读取的块大小
    pub const READ_CHUNK: usize = 32;

    /// 串口波特率
    pub const BAUD_RATE: u32 = 9600;

    /// LIST 单行最大长度: `NNN: ` + 名称 + ` (NNNNN bytes)\r\n`
    pub const LIST_LINE_MAX: usize = 5 + NAME_MAX_LEN + 16;

    /// 单条命令响应的最大长度
    pub const RESPONSE_CAPACITY: usize = FILE_SIZE + FILE_COUNT * LIST_LINE_MAX;
}
