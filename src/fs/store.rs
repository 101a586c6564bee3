//! 固定槽位文件存储
//!
//! 提供基于固定地址布局的文件操作 API。所有修改操作遵循同一顺序:
//! 校验槽位 → 写数据区 → 更新内存记录 → 写回元数据区。
//!
//! 越界等无效请求不是错误，而是返回 [`Outcome::Rejected`]；
//! 只有设备读写失败才返回 `Err`。

use core::fmt;

use embedded_storage::{ReadStorage, Storage};

use super::layout::{data_address, is_valid_slot, REQUIRED_CAPACITY};
use super::record::FileRecord;
use super::table::MetadataTable;
use crate::config::{FILE_COUNT, FILE_SIZE};

/// 删除/格式化时写入的全零块
static ZEROES: [u8; FILE_SIZE] = [0; FILE_SIZE];

/// 存储层错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError<E> {
    /// 设备读写错误
    Device(E),
    /// 设备容量不足以容纳布局
    DeviceTooSmall {
        /// 布局所需字节数
        required: usize,
        /// 设备实际容量
        capacity: usize,
    },
}

impl<E> From<E> for StoreError<E> {
    fn from(e: E) -> Self {
        Self::Device(e)
    }
}

impl<E: fmt::Debug> fmt::Display for StoreError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "Device error: {:?}", e),
            Self::DeviceTooSmall { required, capacity } => write!(
                f,
                "Device too small: layout needs {} bytes, device has {}",
                required, capacity
            ),
        }
    }
}

/// 请求被拒绝的原因
///
/// 在协议边界上所有拒绝都表现为"无输出、无状态变化"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// 槽位不在 `[0, FILE_COUNT)` 内
    SlotOutOfRange,
    /// 槽位参数不是十进制数字
    InvalidSlot,
    /// 缺少必需参数
    MissingArgument,
    /// 无参数命令带了参数
    UnexpectedArgument,
    /// 未知命令
    UnknownVerb,
    /// 空行
    EmptyLine,
    /// 设备读写失败
    DeviceFault,
}

impl Rejection {
    /// 日志用的简短描述
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SlotOutOfRange => "slot out of range",
            Self::InvalidSlot => "invalid slot number",
            Self::MissingArgument => "missing argument",
            Self::UnexpectedArgument => "unexpected argument",
            Self::UnknownVerb => "unknown verb",
            Self::EmptyLine => "empty line",
            Self::DeviceFault => "device fault",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作结果: 已执行 / 被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    /// 已执行
    Applied(T),
    /// 被拒绝，没有任何状态变化
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    /// 是否已执行
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// 是否被拒绝
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// 拒绝原因
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// 取出执行结果
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// 转换执行结果
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Applied(value) => Outcome::Applied(f(value)),
            Self::Rejected(reason) => Outcome::Rejected(reason),
        }
    }
}

/// 文件读取器
///
/// 一次性的顺序读取器，恰好产生记录长度个字节，不可重置。
pub struct FileReader<'a, D> {
    /// 设备引用
    device: &'a mut D,
    /// 槽位数据区起始地址
    base: u32,
    /// 当前位置
    position: usize,
    /// 有效长度
    len: usize,
}

impl<'a, D: ReadStorage> FileReader<'a, D> {
    /// 有效长度
    pub fn len(&self) -> usize {
        self.len
    }

    /// 文件是否为空
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 剩余字节数
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// 读取数据
    ///
    /// 返回实际读取的字节数，0 表示已读完
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError<D::Error>> {
        let to_read = buffer.len().min(self.remaining());
        if to_read == 0 {
            return Ok(0);
        }

        self.device
            .read(self.base + self.position as u32, &mut buffer[..to_read])?;
        self.position += to_read;

        Ok(to_read)
    }
}

impl<'a, D: ReadStorage> Iterator for FileReader<'a, D> {
    type Item = Result<u8, StoreError<D::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(0) => None,
            Ok(_) => Some(Ok(byte[0])),
            Err(e) => {
                // 出错后不再继续产生数据
                self.position = self.len;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

/// 固定槽位文件存储
///
/// 独占持有设备和元数据表。单个操作返回之前，元数据区已与内存表一致。
pub struct FileStore<D> {
    /// 持久化设备
    device: D,
    /// 元数据内存镜像
    table: MetadataTable,
}

impl<D: Storage> FileStore<D> {
    /// 挂载存储: 检查容量并加载元数据表
    pub fn mount(mut device: D) -> Result<Self, StoreError<D::Error>> {
        let capacity = device.capacity();
        if capacity < REQUIRED_CAPACITY {
            crate::log_error!(
                "EEPROM too small: need {} bytes, have {}",
                REQUIRED_CAPACITY,
                capacity
            );
            return Err(StoreError::DeviceTooSmall {
                required: REQUIRED_CAPACITY,
                capacity,
            });
        }

        let mut table = MetadataTable::new();
        table.load(&mut device)?;

        crate::log_info!(
            "EEPROM store mounted: {} slots x {} bytes, {} named",
            FILE_COUNT,
            FILE_SIZE,
            table.named_count()
        );

        Ok(Self { device, table })
    }

    /// 重新从元数据区加载 (模拟重启)
    pub fn reload(&mut self) -> Result<(), StoreError<D::Error>> {
        self.table.load(&mut self.device)?;
        Ok(())
    }

    /// 元数据表
    pub fn table(&self) -> &MetadataTable {
        &self.table
    }

    /// 单个槽位的记录
    pub fn record(&self, slot: usize) -> Option<&FileRecord> {
        self.table.get(slot)
    }

    /// 设备引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 取回设备
    pub fn into_device(self) -> D {
        self.device
    }

    /// 写入文件
    ///
    /// 超过 FILE_SIZE 的部分被静默截断。名称不变。
    ///
    /// 注意: 不清除新长度之后的旧数据。缩短的文件在数据区仍留有旧尾部，
    /// 但长度字段保证它们永远不会被读出。
    pub fn write(
        &mut self,
        slot: usize,
        payload: &[u8],
    ) -> Result<Outcome<usize>, StoreError<D::Error>> {
        if !is_valid_slot(slot) {
            return Ok(Outcome::Rejected(Rejection::SlotOutOfRange));
        }

        let len = payload.len().min(FILE_SIZE);
        self.device.write(data_address(slot), &payload[..len])?;
        self.commit(slot, |table| {
            if let Some(record) = table.get_mut(slot) {
                record.set_length(len);
            }
        })?;

        crate::log_trace!("slot {}: wrote {} bytes", slot, len);
        Ok(Outcome::Applied(len))
    }

    /// 打开文件读取器
    pub fn read(&mut self, slot: usize) -> Outcome<FileReader<'_, D>> {
        let Some(record) = self.table.get(slot) else {
            return Outcome::Rejected(Rejection::SlotOutOfRange);
        };

        Outcome::Applied(FileReader {
            len: record.length() as usize,
            device: &mut self.device,
            base: data_address(slot),
            position: 0,
        })
    }

    /// 删除文件: 清零整个槽位数据区并重置记录
    pub fn delete(&mut self, slot: usize) -> Result<Outcome, StoreError<D::Error>> {
        if !is_valid_slot(slot) {
            return Ok(Outcome::Rejected(Rejection::SlotOutOfRange));
        }

        self.device.write(data_address(slot), &ZEROES)?;
        self.commit(slot, |table| {
            if let Some(record) = table.get_mut(slot) {
                record.clear();
            }
        })?;

        crate::log_trace!("slot {}: deleted", slot);
        Ok(Outcome::Applied(()))
    }

    /// 重命名: 名称截断到 9 字节
    pub fn rename(&mut self, slot: usize, name: &[u8]) -> Result<Outcome, StoreError<D::Error>> {
        if !is_valid_slot(slot) {
            return Ok(Outcome::Rejected(Rejection::SlotOutOfRange));
        }

        self.commit(slot, |table| {
            table.set_name(slot, name);
        })?;

        crate::log_trace!("slot {}: renamed", slot);
        Ok(Outcome::Applied(()))
    }

    /// 格式化: 清零所有槽位，最后一次性写回整张表
    pub fn format(&mut self) -> Result<(), StoreError<D::Error>> {
        for slot in 0..FILE_COUNT {
            self.device.write(data_address(slot), &ZEROES)?;
            if let Some(record) = self.table.get_mut(slot) {
                record.clear();
            }
        }

        if let Err(e) = self.table.save(&mut self.device) {
            // 尽量恢复为设备上的实际内容
            if self.table.load(&mut self.device).is_err() {
                crate::log_error!("metadata reload after failed format also failed");
            }
            return Err(e.into());
        }

        crate::log_info!("EEPROM formatted");
        Ok(())
    }

    /// 修改单条记录并写回；写回失败时恢复内存中的旧记录
    fn commit<F>(&mut self, slot: usize, update: F) -> Result<(), StoreError<D::Error>>
    where
        F: FnOnce(&mut MetadataTable),
    {
        let Some(previous) = self.table.get(slot).copied() else {
            return Ok(());
        };

        update(&mut self.table);

        if let Err(e) = self.table.save_slot(&mut self.device, slot) {
            if let Some(record) = self.table.get_mut(slot) {
                *record = previous;
            }
            return Err(e.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::layout::{meta_address, DATA_REGION_LEN, META_ADDR};
    use crate::fs::storage::{RamEeprom, StorageError};
    use std::cell::Cell;
    use std::rc::Rc;

    fn mounted() -> FileStore<RamEeprom> {
        FileStore::mount(RamEeprom::new()).unwrap()
    }

    fn read_all(store: &mut FileStore<RamEeprom>, slot: usize) -> Vec<u8> {
        let reader = store.read(slot).applied().unwrap();
        reader.collect::<Result<Vec<u8>, _>>().unwrap()
    }

    #[test]
    fn test_round_trip_all_slots() {
        let mut store = mounted();
        for slot in 0..FILE_COUNT {
            for len in [0, 1, 17, FILE_SIZE - 1, FILE_SIZE] {
                let payload: Vec<u8> = (0..len).map(|i| (i * 7 + slot) as u8).collect();
                assert_eq!(store.write(slot, &payload).unwrap(), Outcome::Applied(len));
                assert_eq!(read_all(&mut store, slot), payload);
            }
        }
    }

    #[test]
    fn test_oversized_payload_is_truncated() {
        let mut store = mounted();
        let payload: Vec<u8> = (0..FILE_SIZE + 50).map(|i| i as u8).collect();

        assert_eq!(store.write(1, &payload).unwrap(), Outcome::Applied(FILE_SIZE));
        assert_eq!(read_all(&mut store, 1), &payload[..FILE_SIZE]);
        assert_eq!(store.record(1).unwrap().length() as usize, FILE_SIZE);
    }

    #[test]
    fn test_write_keeps_name() {
        let mut store = mounted();
        store.rename(0, b"diary").unwrap();
        store.write(0, b"dear diary").unwrap();
        assert_eq!(store.record(0).unwrap().name(), b"diary");
    }

    #[test]
    fn test_shrinking_write_leaves_stale_tail() {
        let mut store = mounted();
        store.write(0, b"hello world").unwrap();
        store.write(0, b"bye").unwrap();

        assert_eq!(read_all(&mut store, 0), b"bye");
        // 旧尾部仍在数据区，但不会被读出
        assert_eq!(&store.device().as_bytes()[3..11], b"lo world");
    }

    #[test]
    fn test_delete_scrubs_slot() {
        let mut store = mounted();
        store.rename(1, b"secret").unwrap();
        store.write(1, &[0xAB; FILE_SIZE]).unwrap();

        for _ in 0..2 {
            assert!(store.delete(1).unwrap().is_applied());
            assert!(read_all(&mut store, 1).is_empty());
            assert!(store.record(1).unwrap().is_unnamed());
            assert_eq!(store.record(1).unwrap().length(), 0);
        }

        let start = data_address(1) as usize;
        assert!(store.device().as_bytes()[start..start + FILE_SIZE]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_persists_across_reload() {
        let mut store = mounted();
        store.write(0, b"hello").unwrap();
        store.rename(0, b"greeting").unwrap();

        // 模拟重启: 从设备镜像重新挂载
        let device = store.into_device();
        let mut store = FileStore::mount(device).unwrap();
        assert_eq!(store.record(0).unwrap().length(), 5);
        assert_eq!(store.record(0).unwrap().name(), b"greeting");
        assert_eq!(read_all(&mut store, 0), b"hello");

        store.reload().unwrap();
        assert_eq!(read_all(&mut store, 0), b"hello");
    }

    #[test]
    fn test_slot_isolation() {
        let mut store = mounted();
        store.write(0, b"first").unwrap();
        store.rename(0, b"one").unwrap();
        store.write(2, b"third").unwrap();
        store.rename(2, b"three").unwrap();

        let before = *store.device().as_bytes();
        store.write(1, &[0x55; FILE_SIZE + 10]).unwrap();
        store.rename(1, b"two").unwrap();
        let after = store.device().as_bytes();

        for slot in [0, 2] {
            let data = data_address(slot) as usize..data_address(slot) as usize + FILE_SIZE;
            assert_eq!(before[data.clone()], after[data]);
            let meta = meta_address(slot) as usize..meta_address(slot) as usize + 12;
            assert_eq!(before[meta.clone()], after[meta]);
        }
        assert_eq!(read_all(&mut store, 0), b"first");
        assert_eq!(read_all(&mut store, 2), b"third");
    }

    #[test]
    fn test_format_clears_everything() {
        let mut store = FileStore::mount(RamEeprom::<1024>::erased()).unwrap();
        for slot in 0..FILE_COUNT {
            store.write(slot, b"junk").unwrap();
            store.rename(slot, b"name").unwrap();
        }

        store.format().unwrap();

        assert_eq!(store.table(), &MetadataTable::new());
        let image = store.device().as_bytes();
        assert!(image[..DATA_REGION_LEN].iter().all(|&b| b == 0));
        assert!(image[META_ADDR..REQUIRED_CAPACITY].iter().all(|&b| b == 0));
        // 布局之外的字节不被触碰
        assert!(image[REQUIRED_CAPACITY..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut store = mounted();
        store.write(0, b"keep").unwrap();
        let before = *store.device().as_bytes();

        assert_eq!(
            store.write(FILE_COUNT, b"x").unwrap(),
            Outcome::Rejected(Rejection::SlotOutOfRange)
        );
        assert!(store.read(FILE_COUNT).is_rejected());
        assert_eq!(
            store.delete(99).unwrap().rejection(),
            Some(Rejection::SlotOutOfRange)
        );
        assert_eq!(
            store.rename(FILE_COUNT, b"x").unwrap().rejection(),
            Some(Rejection::SlotOutOfRange)
        );

        assert_eq!(&before, store.device().as_bytes());
    }

    #[test]
    fn test_reader_chunks() {
        let mut store = mounted();
        store.write(2, b"0123456789").unwrap();

        let mut reader = store.read(2).applied().unwrap();
        assert_eq!(reader.len(), 10);

        let mut buffer = [0u8; 4];
        assert_eq!(reader.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer, b"0123");
        assert_eq!(reader.remaining(), 6);
        assert_eq!(reader.read(&mut buffer).unwrap(), 4);
        assert_eq!(reader.read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer[..2], b"89");
        assert_eq!(reader.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_mount_rejects_small_device() {
        let device: RamEeprom<512> = RamEeprom::new();
        match FileStore::mount(device) {
            Err(StoreError::DeviceTooSmall { required, capacity }) => {
                assert_eq!(required, REQUIRED_CAPACITY);
                assert_eq!(capacity, 512);
            }
            _ => panic!("expected DeviceTooSmall"),
        }
    }

    #[test]
    fn test_mount_coerces_garbage() {
        // 未初始化的 EEPROM: 名称没有结尾, 长度为 0xFFFF
        let mut store = FileStore::mount(RamEeprom::<1024>::erased()).unwrap();
        let record = store.record(0).unwrap();
        assert_eq!(record.name().len(), 9);
        assert_eq!(record.length() as usize, FILE_SIZE);
        assert_eq!(read_all(&mut store, 0).len(), FILE_SIZE);
    }

    /// 元数据区写入可被设置为失败的设备
    struct FlakyEeprom {
        inner: RamEeprom,
        fail_meta: Rc<Cell<bool>>,
    }

    impl ReadStorage for FlakyEeprom {
        type Error = StorageError;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            self.inner.read(offset, bytes)
        }

        fn capacity(&self) -> usize {
            self.inner.capacity()
        }
    }

    impl Storage for FlakyEeprom {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.fail_meta.get() && offset as usize >= META_ADDR {
                return Err(StorageError::WriteError);
            }
            self.inner.write(offset, bytes)
        }
    }

    #[test]
    fn test_failed_metadata_write_restores_record() {
        let fail_meta = Rc::new(Cell::new(false));
        let device = FlakyEeprom {
            inner: RamEeprom::new(),
            fail_meta: fail_meta.clone(),
        };
        let mut store = FileStore::mount(device).unwrap();
        store.write(0, b"hello").unwrap();
        store.rename(0, b"greeting").unwrap();

        fail_meta.set(true);
        assert_eq!(
            store.write(0, b"hello world"),
            Err(StoreError::Device(StorageError::WriteError))
        );
        assert_eq!(store.record(0).unwrap().length(), 5);

        assert!(store.rename(0, b"other").is_err());
        assert_eq!(store.record(0).unwrap().name(), b"greeting");

        assert!(store.format().is_err());
        assert_eq!(store.record(0).unwrap().name(), b"greeting");
        assert_eq!(store.record(0).unwrap().length(), 5);
    }

    #[test]
    fn test_rename_truncates_and_persists() {
        let mut store = mounted();
        assert!(store.rename(2, b"a-very-long-name").unwrap().is_applied());
        assert_eq!(store.record(2).unwrap().name(), b"a-very-lo");

        let start = meta_address(2) as usize;
        assert_eq!(&store.device().as_bytes()[start..start + 10], b"a-very-lo\0");
    }

    /// 元数据区读写都失败的设备
    struct DeadMetaEeprom {
        inner: RamEeprom,
        dead: Rc<Cell<bool>>,
    }

    impl ReadStorage for DeadMetaEeprom {
        type Error = StorageError;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            if self.dead.get() && offset as usize >= META_ADDR {
                return Err(StorageError::ReadError);
            }
            self.inner.read(offset, bytes)
        }

        fn capacity(&self) -> usize {
            self.inner.capacity()
        }
    }

    impl Storage for DeadMetaEeprom {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.dead.get() && offset as usize >= META_ADDR {
                return Err(StorageError::WriteError);
            }
            self.inner.write(offset, bytes)
        }
    }

    #[test]
    fn test_format_reports_save_error_when_reload_fails() {
        let dead = Rc::new(Cell::new(false));
        let device = DeadMetaEeprom {
            inner: RamEeprom::new(),
            dead: dead.clone(),
        };
        let mut store = FileStore::mount(device).unwrap();
        store.write(1, b"data").unwrap();

        dead.set(true);
        assert_eq!(
            store.format(),
            Err(StoreError::Device(StorageError::WriteError))
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::<StorageError>::DeviceTooSmall {
            required: 936,
            capacity: 512,
        };
        assert_eq!(
            err.to_string(),
            "Device too small: layout needs 936 bytes, device has 512"
        );
        assert_eq!(
            StoreError::from(StorageError::ReadError).to_string(),
            "Device error: ReadError"
        );
    }
}
