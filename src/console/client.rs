//! 主机端客户端编解码
//!
//! 图形/命令行客户端通过串口驱动存储时使用的辅助工具:
//! - 多行文本转义为单行 WRITE 数据，读出后还原
//! - 渲染命令行
//! - 解析 LIST 响应

use core::fmt::Write as _;

use super::command::Command;
use super::dispatch::{Sink, EMPTY_NAME};

/// 转义: `\` → `\\`，换行 → `\n`，回车 → `\r`
pub fn escape(input: &[u8]) -> Escape<'_> {
    Escape {
        input: input.iter(),
        pending: None,
    }
}

/// 还原 [`escape`] 的结果
///
/// 未知转义产生被转义的字符本身，末尾孤立的 `\` 原样保留
pub fn unescape(input: &[u8]) -> Unescape<'_> {
    Unescape { input: input.iter() }
}

/// 只保留可打印 ASCII 和换行
pub fn printable(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes
        .iter()
        .copied()
        .filter(|&b| (32..=126).contains(&b) || b == b'\n')
}

/// 转义迭代器
pub struct Escape<'a> {
    input: core::slice::Iter<'a, u8>,
    pending: Option<u8>,
}

impl Iterator for Escape<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if let Some(byte) = self.pending.take() {
            return Some(byte);
        }

        let byte = *self.input.next()?;
        let escaped = match byte {
            b'\\' => b'\\',
            b'\n' => b'n',
            b'\r' => b'r',
            other => return Some(other),
        };
        self.pending = Some(escaped);
        Some(b'\\')
    }
}

/// 反转义迭代器
pub struct Unescape<'a> {
    input: core::slice::Iter<'a, u8>,
}

impl Iterator for Unescape<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = *self.input.next()?;
        if byte != b'\\' {
            return Some(byte);
        }

        match self.input.next() {
            Some(b'n') => Some(b'\n'),
            Some(b'r') => Some(b'\r'),
            Some(&other) => Some(other),
            None => Some(b'\\'),
        }
    }
}

/// 渲染命令行 (槽位号从 1 开始，带换行符)
///
/// WRITE 的数据原样输出，需要多行文本时先经过 [`escape`]
pub fn render<S: Sink + ?Sized>(command: &Command<'_>, out: &mut S) {
    let mut slot_text: heapless::String<24> = heapless::String::new();
    let verb = command.verb().as_bytes();

    match *command {
        Command::List | Command::Format => out.emit(verb),
        Command::Read { slot } | Command::Delete { slot } => {
            let _ = write!(slot_text, " {}", slot + 1);
            out.emit(verb);
            out.emit(slot_text.as_bytes());
        }
        Command::Write { slot, payload: tail } | Command::WriteName { slot, name: tail } => {
            let _ = write!(slot_text, " {} ", slot + 1);
            out.emit(verb);
            out.emit(slot_text.as_bytes());
            out.emit(tail);
        }
    }
    out.emit(b"\n");
}

/// LIST 响应中的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry<'a> {
    /// 槽位号 (从 1 开始)
    pub slot: usize,
    /// 名称，未命名时为 None
    pub name: Option<&'a str>,
    /// 数据长度
    pub length: u16,
}

impl<'a> ListEntry<'a> {
    /// 解析 `<n>: <name> (<len> bytes)`
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (index, rest) = line.split_once(": ")?;
        let slot = index.trim().parse::<usize>().ok()?;

        let (name, size) = rest.rsplit_once(" (")?;
        let length = size.strip_suffix(" bytes)")?.parse::<u16>().ok()?;

        let name = if name.as_bytes() == EMPTY_NAME {
            None
        } else {
            Some(name)
        };

        Some(Self { slot, name, length })
    }
}

/// 解析完整的 LIST 响应，跳过无法识别的行
pub fn parse_listing(text: &str) -> impl Iterator<Item = ListEntry<'_>> {
    text.lines().filter_map(ListEntry::parse)
}
