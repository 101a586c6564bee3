//! 同步原语封装
//!
//! 存储本身只在一个上下文中使用。需要从多个上下文 (中断、多个任务、
//! 测试线程) 访问时，用 [`SharedStore`] 把每个完整操作
//! (校验 → 写数据 → 写元数据) 放进同一个临界区。

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{
    raw::{CriticalSectionRawMutex, NoopRawMutex, RawMutex},
    Mutex,
};

use crate::fs::FileStore;

/// 互斥保护的文件存储
pub struct SharedStore<M: RawMutex, D> {
    inner: Mutex<M, RefCell<FileStore<D>>>,
}

/// 临界区保护 - 可跨中断/多核共享
///
/// # Example
/// ```ignore
/// static STORE: StaticCell<CriticalStore<MyEeprom>> = StaticCell::new();
/// let store = STORE.init(SharedStore::new(FileStore::mount(eeprom)?));
///
/// store.lock(|fs| execute(fs, b"LIST", &mut response));
/// ```
pub type CriticalStore<D> = SharedStore<CriticalSectionRawMutex, D>;

/// 无锁版本 - 仅单执行器内共享
pub type LocalStore<D> = SharedStore<NoopRawMutex, D>;

impl<M: RawMutex, D> SharedStore<M, D> {
    /// 包装已挂载的存储
    pub const fn new(store: FileStore<D>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(store)),
        }
    }

    /// 在锁内执行一个完整操作
    ///
    /// # Warning
    /// 闭包内不能再次调用同一个 SharedStore 的 lock (RefCell 会 panic)
    #[inline]
    pub fn lock<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut FileStore<D>) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// 取回内部存储
    pub fn into_inner(self) -> FileStore<D> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FILE_SIZE;
    use crate::console::execute;
    use crate::fs::RamEeprom;

    #[test]
    fn test_local_store() {
        let store: LocalStore<RamEeprom> =
            SharedStore::new(FileStore::mount(RamEeprom::new()).unwrap());
        store.lock(|fs| fs.write(0, b"abc").unwrap());
        let len = store.lock(|fs| fs.record(0).unwrap().length());
        assert_eq!(len, 3);
    }

    #[test]
    fn test_concurrent_writers_keep_table_consistent() {
        let store: CriticalStore<RamEeprom> =
            SharedStore::new(FileStore::mount(RamEeprom::new()).unwrap());

        std::thread::scope(|scope| {
            for slot in 0..3usize {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..50usize {
                        let len = (slot * 50 + round) % FILE_SIZE + 1;
                        let payload = vec![b'a' + slot as u8; len];
                        store.lock(|fs| {
                            let mut out: heapless::Vec<u8, 8> = heapless::Vec::new();
                            let prefix = [b'1' + slot as u8, b' '];
                            let line =
                                [b"WRITE ".as_slice(), &prefix[..], payload.as_slice()].concat();
                            assert!(execute(fs, &line, &mut out).is_applied());
                        });
                    }
                });
            }
        });

        // 每个操作结束时内存表与元数据区一致
        let mut fs = store.into_inner();
        let table = fs.table().clone();
        fs.reload().unwrap();
        assert_eq!(fs.table(), &table);
        for slot in 0..3usize {
            let len = (slot * 50 + 49) % FILE_SIZE + 1;
            assert_eq!(fs.record(slot).unwrap().length() as usize, len);
        }
    }
}
