//! 文件系统模块
//!
//! 1KB EEPROM 上的固定槽位文件存储，特性：
//! - 固定地址布局: 数据区在前，元数据区在后
//! - 12 字节定宽元数据记录 (名称 + 小端长度)
//! - 先写数据、后写元数据的更新顺序
//! - 基于 `embedded-storage` 的设备抽象

pub mod layout;
pub mod record;
pub mod storage;
pub mod store;
pub mod table;

pub use record::FileRecord;
pub use storage::{EepromConfig, EepromWindow, RamEeprom, StorageError};
pub use store::{FileReader, FileStore, Outcome, Rejection, StoreError};
pub use table::MetadataTable;
