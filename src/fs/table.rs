//! 元数据表
//!
//! 元数据区的内存镜像。挂载时加载一次，之后每次修改都由调用者
//! 通过 [`MetadataTable::save`] 或 [`MetadataTable::save_slot`] 写回。

use embedded_storage::{ReadStorage, Storage};

use super::layout::{is_valid_slot, meta_address, RECORD_SIZE};
use super::record::FileRecord;
use crate::config::FILE_COUNT;

/// 全部槽位的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    records: [FileRecord; FILE_COUNT],
}

impl MetadataTable {
    /// 全空的表
    pub const fn new() -> Self {
        Self {
            records: [FileRecord::EMPTY; FILE_COUNT],
        }
    }

    /// 从元数据区加载，完全覆盖内存中的表
    pub fn load<D: ReadStorage>(&mut self, device: &mut D) -> Result<(), D::Error> {
        for (slot, record) in self.records.iter_mut().enumerate() {
            let mut raw = [0u8; RECORD_SIZE];
            device.read(meta_address(slot), &mut raw)?;
            *record = FileRecord::from_bytes(&raw);
        }
        Ok(())
    }

    /// 把整张表写回元数据区
    pub fn save<D: Storage>(&self, device: &mut D) -> Result<(), D::Error> {
        for slot in 0..FILE_COUNT {
            self.save_slot(device, slot)?;
        }
        Ok(())
    }

    /// 只写回单个槽位的记录
    ///
    /// 单槽位修改后与 [`save`](Self::save) 的结果相同。越界槽位不做任何事。
    pub fn save_slot<D: Storage>(&self, device: &mut D, slot: usize) -> Result<(), D::Error> {
        match self.records.get(slot) {
            Some(record) => device.write(meta_address(slot), &record.to_bytes()),
            None => Ok(()),
        }
    }

    /// 设置名称 (不持久化)
    ///
    /// 返回 false 表示槽位越界
    pub fn set_name(&mut self, slot: usize, text: &[u8]) -> bool {
        match self.records.get_mut(slot) {
            Some(record) => {
                record.set_name(text);
                true
            }
            None => false,
        }
    }

    /// 获取记录
    pub fn get(&self, slot: usize) -> Option<&FileRecord> {
        self.records.get(slot)
    }

    /// 获取可变记录
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut FileRecord> {
        if is_valid_slot(slot) {
            self.records.get_mut(slot)
        } else {
            None
        }
    }

    /// 按槽位顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FileRecord)> {
        self.records.iter().enumerate()
    }

    /// 所有记录
    pub fn records(&self) -> &[FileRecord; FILE_COUNT] {
        &self.records
    }

    /// 已命名的槽位数
    pub fn named_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_unnamed()).count()
    }
}

impl Default for MetadataTable {
    fn default() -> Self {
        Self::new()
    }
}
