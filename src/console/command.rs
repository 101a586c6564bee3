//! 命令行解析
//!
//! 一行一条命令，动词区分大小写:
//!
//! ```text
//! WRITE <n> <data...>      数据一直到行尾，可以包含空格，可以为空
//! READ <n>
//! LIST
//! WRITE_NAME <n> <name>    名称去掉首尾空白
//! DELETE <n>
//! FORMAT
//! ```
//!
//! `<n>` 是从 1 开始的十进制槽位号，解析后转换为从 0 开始的槽位索引。

use crate::fs::Rejection;

/// 已解析的命令
///
/// 槽位均为从 0 开始的内部索引
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// 写入文件
    Write { slot: usize, payload: &'a [u8] },
    /// 读取文件
    Read { slot: usize },
    /// 列出所有槽位
    List,
    /// 重命名
    WriteName { slot: usize, name: &'a [u8] },
    /// 删除文件
    Delete { slot: usize },
    /// 格式化
    Format,
}

impl<'a> Command<'a> {
    /// 解析一行命令
    pub fn parse(line: &'a [u8]) -> Result<Self, Rejection> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Err(Rejection::EmptyLine);
        }

        let (verb, args) = split_word(line);
        let args = args.map(<[u8]>::trim_ascii_start).filter(|a| !a.is_empty());

        match verb {
            b"WRITE" => {
                let (slot, payload) = split_word(args.ok_or(Rejection::MissingArgument)?);
                Ok(Self::Write {
                    slot: parse_slot(slot)?,
                    payload: payload.unwrap_or_default(),
                })
            }
            b"READ" => Ok(Self::Read {
                slot: parse_slot(first_word(args)?)?,
            }),
            b"LIST" => no_args(args, Self::List),
            b"WRITE_NAME" => {
                let (slot, name) = split_word(args.ok_or(Rejection::MissingArgument)?);
                Ok(Self::WriteName {
                    slot: parse_slot(slot)?,
                    name: name.ok_or(Rejection::MissingArgument)?.trim_ascii(),
                })
            }
            b"DELETE" => Ok(Self::Delete {
                slot: parse_slot(first_word(args)?)?,
            }),
            b"FORMAT" => no_args(args, Self::Format),
            _ => Err(Rejection::UnknownVerb),
        }
    }

    /// 命令动词
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Write { .. } => "WRITE",
            Self::Read { .. } => "READ",
            Self::List => "LIST",
            Self::WriteName { .. } => "WRITE_NAME",
            Self::Delete { .. } => "DELETE",
            Self::Format => "FORMAT",
        }
    }
}

/// 在第一个空白处切分，只消耗一个分隔字节
fn split_word(input: &[u8]) -> (&[u8], Option<&[u8]>) {
    match input.iter().position(u8::is_ascii_whitespace) {
        Some(at) => (&input[..at], Some(&input[at + 1..])),
        None => (input, None),
    }
}

/// 参数中的第一个词，其余忽略
fn first_word(args: Option<&[u8]>) -> Result<&[u8], Rejection> {
    let args = args.ok_or(Rejection::MissingArgument)?;
    Ok(split_word(args).0)
}

fn no_args<'a>(args: Option<&[u8]>, command: Command<'a>) -> Result<Command<'a>, Rejection> {
    match args {
        None => Ok(command),
        Some(_) => Err(Rejection::UnexpectedArgument),
    }
}

/// 解析从 1 开始的槽位号
///
/// 0 转换后为负数，按越界处理；上界由文件存储检查
fn parse_slot(token: &[u8]) -> Result<usize, Rejection> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return Err(Rejection::InvalidSlot);
    }

    let number = core::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        // 超出 usize 的数字同样越界
        .ok_or(Rejection::SlotOutOfRange)?;

    number.checked_sub(1).ok_or(Rejection::SlotOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write() {
        assert_eq!(
            Command::parse(b"WRITE 2 hello world"),
            Ok(Command::Write { slot: 1, payload: b"hello world" })
        );
        // 数据保留内部和开头多余的空格
        assert_eq!(
            Command::parse(b"WRITE 1  two  spaces"),
            Ok(Command::Write { slot: 0, payload: b" two  spaces" })
        );
        // 动词和槽位之间的多余空白被跳过
        assert_eq!(
            Command::parse(b"WRITE   3 x\r\n"),
            Ok(Command::Write { slot: 2, payload: b"x" })
        );
    }

    #[test]
    fn test_parse_write_empty_payload() {
        assert_eq!(Command::parse(b"WRITE 1"), Ok(Command::Write { slot: 0, payload: b"" }));
        assert_eq!(Command::parse(b"WRITE 2   \r"), Ok(Command::Write { slot: 1, payload: b"" }));
        // 没有槽位仍然是缺少参数
        assert_eq!(Command::parse(b"WRITE"), Err(Rejection::MissingArgument));
        assert_eq!(Command::parse(b"WRITE x"), Err(Rejection::InvalidSlot));
    }

    #[test]
    fn test_parse_slot_commands() {
        assert_eq!(Command::parse(b"READ 1"), Ok(Command::Read { slot: 0 }));
        assert_eq!(Command::parse(b"  DELETE 3  "), Ok(Command::Delete { slot: 2 }));
        assert_eq!(Command::parse(b"READ 2 trailing"), Ok(Command::Read { slot: 1 }));
        // 上界不在解析阶段检查
        assert_eq!(Command::parse(b"DELETE 99"), Ok(Command::Delete { slot: 98 }));
        assert_eq!(Command::parse(b"READ"), Err(Rejection::MissingArgument));
    }

    #[test]
    fn test_parse_slot_numbers() {
        assert_eq!(Command::parse(b"READ 0"), Err(Rejection::SlotOutOfRange));
        assert_eq!(Command::parse(b"READ -1"), Err(Rejection::InvalidSlot));
        assert_eq!(Command::parse(b"READ one"), Err(Rejection::InvalidSlot));
        assert_eq!(
            Command::parse(b"READ 99999999999999999999999"),
            Err(Rejection::SlotOutOfRange)
        );
    }

    #[test]
    fn test_parse_write_name() {
        assert_eq!(
            Command::parse(b"WRITE_NAME 1   my notes  "),
            Ok(Command::WriteName { slot: 0, name: b"my notes" })
        );
        assert_eq!(Command::parse(b"WRITE_NAME 1"), Err(Rejection::MissingArgument));
    }

    #[test]
    fn test_parse_no_arg_commands() {
        assert_eq!(Command::parse(b"LIST"), Ok(Command::List));
        assert_eq!(Command::parse(b"FORMAT\r"), Ok(Command::Format));
        assert_eq!(Command::parse(b"FORMAT now"), Err(Rejection::UnexpectedArgument));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse(b"list"), Err(Rejection::UnknownVerb));
        assert_eq!(Command::parse(b"WRITENAME 1 x"), Err(Rejection::UnknownVerb));
        assert_eq!(Command::parse(b"   "), Err(Rejection::EmptyLine));
        assert_eq!(Command::parse(b""), Err(Rejection::EmptyLine));
    }

    #[test]
    fn test_verb() {
        assert_eq!(Command::List.verb(), "LIST");
        assert_eq!(Command::Write { slot: 0, payload: b"" }.verb(), "WRITE");
    }
}
