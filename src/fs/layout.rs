//! 地址空间布局
//!
//! 设备地址空间被划分为两个连续区域:
//!
//! ```text
//! 0                    META_ADDR                      REQUIRED_CAPACITY
//! | slot0 | slot1 | .. | rec0 | rec1 | .. |  (未使用)  |
//!   FILE_SIZE 字节/槽      RECORD_SIZE 字节/记录
//! ```
//!
//! 纯地址计算，无状态。调用者负责先用 [`is_valid_slot`] 校验槽位。

use crate::config::{DEVICE_CAPACITY, FILE_COUNT, FILE_SIZE, NAME_FIELD_LEN};

/// 单条元数据记录大小: 名称字段 + u16 长度
pub const RECORD_SIZE: usize = NAME_FIELD_LEN + core::mem::size_of::<u16>();

/// 数据区总长度
pub const DATA_REGION_LEN: usize = FILE_SIZE * FILE_COUNT;

/// 元数据区起始地址 (紧跟数据区)
pub const META_ADDR: usize = DATA_REGION_LEN;

/// 元数据区总长度
pub const META_REGION_LEN: usize = FILE_COUNT * RECORD_SIZE;

/// 布局占用的总字节数
pub const REQUIRED_CAPACITY: usize = META_ADDR + META_REGION_LEN;

// 编译期检查布局
const _: () = assert!(REQUIRED_CAPACITY <= DEVICE_CAPACITY, "layout exceeds device capacity");
const _: () = assert!(FILE_SIZE <= u16::MAX as usize, "file length must fit in u16");
const _: () = assert!(FILE_COUNT > 0, "at least one slot is required");

/// 槽位是否在 `[0, FILE_COUNT)` 内
#[inline]
pub const fn is_valid_slot(slot: usize) -> bool {
    slot < FILE_COUNT
}

/// 槽位数据区起始地址
#[inline]
pub const fn data_address(slot: usize) -> u32 {
    (slot * FILE_SIZE) as u32
}

/// 槽位元数据记录起始地址
#[inline]
pub const fn meta_address(slot: usize) -> u32 {
    (META_ADDR + slot * RECORD_SIZE) as u32
}
