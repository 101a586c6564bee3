//! 同步原语模块
//!
//! 基于 embassy-sync 的阻塞互斥锁封装:
//! - `SharedStore`: 互斥保护的文件存储
//! - `CriticalStore`: 临界区版本，可跨中断共享
//! - `LocalStore`: 无锁版本，仅单执行器内使用

pub mod primitives;

pub use primitives::{CriticalStore, LocalStore, SharedStore};
