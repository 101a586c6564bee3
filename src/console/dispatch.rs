//! 命令分发
//!
//! 把已解析的命令映射到文件存储操作，并生成响应文本。
//! 被拒绝的命令和设备错误只记录日志，不产生任何输出。

use core::fmt::{self, Write as _};

use embedded_storage::Storage;

use super::command::Command;
use crate::config::READ_CHUNK;
use crate::fs::{FileStore, Outcome, Rejection, StoreError};

/// 响应行结尾 (串口控制台习惯)
pub const LINE_END: &str = "\r\n";

/// FORMAT 的确认行
pub const FORMAT_CONFIRMATION: &str = "EEPROM formatted";

/// LIST 中未命名槽位的显示
pub const EMPTY_NAME: &[u8] = b"(empty)";

/// 响应输出端
///
/// 传输层视为不会失败
pub trait Sink {
    /// 输出原始字节
    fn emit(&mut self, bytes: &[u8]);
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, bytes: &[u8]) {
        (**self).emit(bytes)
    }
}

/// 定长缓冲区，写满后丢弃多余字节
impl<const N: usize> Sink for heapless::Vec<u8, N> {
    fn emit(&mut self, bytes: &[u8]) {
        let room = N - self.len();
        let _ = self.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
}

/// 让 `write!` 直接输出到 Sink
struct TextWriter<'s, S: ?Sized>(&'s mut S);

impl<S: Sink + ?Sized> fmt::Write for TextWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.emit(s.as_bytes());
        Ok(())
    }
}

/// 执行一行命令: 解析 → 分发 → 记录日志
pub fn execute<D, S>(store: &mut FileStore<D>, line: &[u8], out: &mut S) -> Outcome
where
    D: Storage,
    S: Sink + ?Sized,
{
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(reason) => {
            if reason != Rejection::EmptyLine {
                crate::log_debug!("command ignored: {}", reason.as_str());
            }
            return Outcome::Rejected(reason);
        }
    };

    crate::log_trace!("command: {}", command.verb());

    match dispatch(store, &command, out) {
        Ok(Outcome::Applied(())) => Outcome::Applied(()),
        Ok(Outcome::Rejected(reason)) => {
            crate::log_debug!("{} ignored: {}", command.verb(), reason.as_str());
            Outcome::Rejected(reason)
        }
        Err(_e) => {
            crate::log_error!("{} failed: EEPROM access error", command.verb());
            Outcome::Rejected(Rejection::DeviceFault)
        }
    }
}

/// 分发已解析的命令
///
/// 只有 READ / LIST / FORMAT 产生输出
pub fn dispatch<D, S>(
    store: &mut FileStore<D>,
    command: &Command<'_>,
    out: &mut S,
) -> Result<Outcome, StoreError<D::Error>>
where
    D: Storage,
    S: Sink + ?Sized,
{
    match *command {
        Command::Write { slot, payload } => Ok(store.write(slot, payload)?.map(|_| ())),
        Command::Read { slot } => read(store, slot, out),
        Command::List => {
            list(store, out);
            Ok(Outcome::Applied(()))
        }
        Command::WriteName { slot, name } => store.rename(slot, name),
        Command::Delete { slot } => store.delete(slot),
        Command::Format => {
            store.format()?;
            let mut writer = TextWriter(out);
            let _ = write!(writer, "{}{}", FORMAT_CONFIRMATION, LINE_END);
            Ok(Outcome::Applied(()))
        }
    }
}

/// 按块读出文件内容，原样输出，无分帧
fn read<D, S>(
    store: &mut FileStore<D>,
    slot: usize,
    out: &mut S,
) -> Result<Outcome, StoreError<D::Error>>
where
    D: Storage,
    S: Sink + ?Sized,
{
    let mut reader = match store.read(slot) {
        Outcome::Applied(reader) => reader,
        Outcome::Rejected(reason) => return Ok(Outcome::Rejected(reason)),
    };

    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.emit(&chunk[..n]);
    }

    Ok(Outcome::Applied(()))
}

/// 每个槽位一行: `<n>: <名称或 (empty)> (<长度> bytes)`
fn list<D, S>(store: &FileStore<D>, out: &mut S)
where
    D: Storage,
    S: Sink + ?Sized,
{
    for (slot, record) in store.table().iter() {
        let name = if record.is_unnamed() { EMPTY_NAME } else { record.name() };

        let mut writer = TextWriter(&mut *out);
        let _ = write!(writer, "{}: ", slot + 1);
        writer.0.emit(name);
        let _ = write!(writer, " ({} bytes){}", record.length(), LINE_END);
    }
}
