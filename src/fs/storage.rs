//! 持久化存储抽象层
//!
//! 文件存储只依赖 `embedded_storage::Storage`:
//! - [`RamEeprom`]: RAM 中的字节数组，用于主机测试和仿真
//! - [`EepromWindow`]: 把 1KB EEPROM 映射到更大存储 (SPI Flash) 的一个窗口

use core::fmt;

use embedded_storage::{ReadStorage, Storage};

use crate::config::DEVICE_CAPACITY;

/// 存储操作错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// 读取失败
    ReadError,
    /// 写入失败
    WriteError,
    /// 地址越界
    OutOfBounds,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadError => write!(f, "EEPROM read error"),
            Self::WriteError => write!(f, "EEPROM write error"),
            Self::OutOfBounds => write!(f, "Address out of bounds"),
        }
    }
}

/// 检查 `[offset, offset + len)` 是否落在容量内
#[inline]
fn check_range(offset: u32, len: usize, capacity: usize) -> Result<usize, StorageError> {
    let start = offset as usize;
    match start.checked_add(len) {
        Some(end) if end <= capacity => Ok(start),
        _ => Err(StorageError::OutOfBounds),
    }
}

/// EEPROM 窗口配置
#[derive(Debug, Clone, Copy)]
pub struct EepromConfig {
    /// 窗口在底层存储中的起始偏移
    pub offset: u32,
    /// 窗口容量 (字节)
    pub capacity: u32,
}

impl Default for EepromConfig {
    fn default() -> Self {
        Self {
            offset: 0x410000,                  // 默认存储分区偏移
            capacity: DEVICE_CAPACITY as u32,  // 1KB
        }
    }
}

/// RAM 模拟 EEPROM
///
/// 写入立即生效，没有磨损，越界访问返回 [`StorageError::OutOfBounds`]
#[derive(Clone)]
pub struct RamEeprom<const N: usize = DEVICE_CAPACITY> {
    cells: [u8; N],
}

impl<const N: usize> RamEeprom<N> {
    /// 全 0 内容
    pub const fn new() -> Self {
        Self { cells: [0; N] }
    }

    /// 全 0xFF 内容 (出厂/擦除状态)
    pub const fn erased() -> Self {
        Self { cells: [0xFF; N] }
    }

    /// 从已有镜像创建
    pub const fn from_image(cells: [u8; N]) -> Self {
        Self { cells }
    }

    /// 设备镜像
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.cells
    }

    /// 可变设备镜像 (用于模拟损坏)
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.cells
    }
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReadStorage for RamEeprom<N> {
    type Error = StorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = check_range(offset, bytes.len(), N)?;
        bytes.copy_from_slice(&self.cells[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for RamEeprom<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = check_range(offset, bytes.len(), N)?;
        self.cells[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// 存储窗口
///
/// 把底层存储 `[offset, offset + capacity)` 暴露为从 0 开始的独立设备。
/// 底层错误统一映射为 [`StorageError::ReadError`] / [`StorageError::WriteError`]。
pub struct EepromWindow<S> {
    /// 底层存储
    inner: S,
    /// 配置
    config: EepromConfig,
}

impl<S: Storage> EepromWindow<S> {
    /// 创建窗口
    pub fn new(inner: S, config: EepromConfig) -> Self {
        Self { inner, config }
    }

    /// 获取配置
    pub fn config(&self) -> &EepromConfig {
        &self.config
    }

    /// 窗口是否完整落在底层存储内
    pub fn fits(&self) -> bool {
        (self.config.offset as usize)
            .checked_add(self.config.capacity as usize)
            .is_some_and(|end| end <= self.inner.capacity())
    }

    /// 获取内部存储引用
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// 取回内部存储
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// 将窗口内偏移转换为底层绝对地址
    fn to_absolute(&self, offset: u32, len: usize) -> Result<u32, StorageError> {
        check_range(offset, len, self.config.capacity as usize)?;
        self.config
            .offset
            .checked_add(offset)
            .ok_or(StorageError::OutOfBounds)
    }
}

impl<S: Storage> ReadStorage for EepromWindow<S> {
    type Error = StorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let address = self.to_absolute(offset, bytes.len())?;
        self.inner
            .read(address, bytes)
            .map_err(|_| StorageError::ReadError)
    }

    fn capacity(&self) -> usize {
        self.config.capacity as usize
    }
}

impl<S: Storage> Storage for EepromWindow<S> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let address = self.to_absolute(offset, bytes.len())?;
        self.inner
            .write(address, bytes)
            .map_err(|_| StorageError::WriteError)
    }
}
