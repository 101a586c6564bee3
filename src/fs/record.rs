//! 元数据记录编解码
//!
//! 设备上每个槽位对应一条 12 字节定宽记录:
//!
//! | 偏移 | 长度 | 内容 |
//! |------|------|------|
//! | 0    | 9    | 名称 (不足补 0) |
//! | 9    | 1    | null 结尾 (始终为 0) |
//! | 10   | 2    | 有效数据长度 (u16, 小端) |
//!
//! 这是设备格式的唯一定义处，读写两端都只经过 [`FileRecord::from_bytes`]
//! 和 [`FileRecord::to_bytes`]。

use core::fmt;

use super::layout::RECORD_SIZE;
use crate::config::{FILE_SIZE, NAME_FIELD_LEN, NAME_MAX_LEN};

/// 单个槽位的元数据
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    /// 名称字段 (最后一字节始终为 0)
    name: [u8; NAME_FIELD_LEN],
    /// 有效数据长度, 不超过 FILE_SIZE
    length: u16,
}

impl FileRecord {
    /// 空记录: 无名称, 长度 0
    pub const EMPTY: Self = Self {
        name: [0; NAME_FIELD_LEN],
        length: 0,
    };

    /// 从设备原始字节解码
    ///
    /// 损坏的内容不会报错，而是被强制整形:
    /// - 第 10 字节强制为 null 结尾
    /// - 超过 FILE_SIZE 的长度被截到 FILE_SIZE (例如擦除后的 0xFFFF)
    pub fn from_bytes(data: &[u8; RECORD_SIZE]) -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        name[..NAME_MAX_LEN].copy_from_slice(&data[..NAME_MAX_LEN]);
        name[NAME_MAX_LEN] = 0;

        let length = u16::from_le_bytes([data[NAME_FIELD_LEN], data[NAME_FIELD_LEN + 1]]);

        Self {
            name,
            length: length.min(FILE_SIZE as u16),
        }
    }

    /// 编码为设备原始字节
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut data = [0u8; RECORD_SIZE];
        data[..NAME_MAX_LEN].copy_from_slice(&self.name[..NAME_MAX_LEN]);
        data[NAME_MAX_LEN] = 0;
        data[NAME_FIELD_LEN..].copy_from_slice(&self.length.to_le_bytes());
        data
    }

    /// 名称有效部分 (第一个 null 之前)
    pub fn name(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_MAX_LEN);
        &self.name[..len]
    }

    /// 完整名称字段, 含 null 填充
    pub fn name_field(&self) -> &[u8; NAME_FIELD_LEN] {
        &self.name
    }

    /// 设置名称: 截断到 NAME_MAX_LEN 字节, 其余补 0
    pub fn set_name(&mut self, text: &[u8]) {
        let len = text.len().min(NAME_MAX_LEN);
        self.name = [0; NAME_FIELD_LEN];
        self.name[..len].copy_from_slice(&text[..len]);
    }

    /// 有效数据长度
    pub fn length(&self) -> u16 {
        self.length
    }

    /// 设置有效数据长度, 超过容量时截断
    pub fn set_length(&mut self, length: usize) {
        self.length = length.min(FILE_SIZE) as u16;
    }

    /// 是否未命名 (未使用或已删除)
    pub fn is_unnamed(&self) -> bool {
        self.name[0] == 0
    }

    /// 重置为空记录
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }
}

impl Default for FileRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("name", &core::str::from_utf8(self.name()).unwrap_or("<binary>"))
            .field("length", &self.length)
            .finish()
    }
}
