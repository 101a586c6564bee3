//! 串口行缓冲
//!
//! 把逐字节到达的串口数据拼成以 `\n` 结尾的命令行。
//! 超长的行只保留前 N 字节，其余部分丢弃到下一个换行符为止。

/// 行拼装器
pub struct LineAssembler<const N: usize> {
    /// 当前行内容
    buf: heapless::Vec<u8, N>,
    /// 上一次 push 已返回完整行，下一次 push 前清空
    complete: bool,
    /// 当前行已写满，丢弃到行尾
    overflowed: bool,
}

impl<const N: usize> LineAssembler<N> {
    /// 创建空的拼装器
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            complete: false,
            overflowed: false,
        }
    }

    /// 输入一个字节
    ///
    /// 遇到 `\n` 时返回完整的一行 (不含换行符，超长时截断到 N 字节)，
    /// 返回的切片在下一次 push 前有效
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }

        if byte == b'\n' {
            self.overflowed = false;
            self.complete = true;
            return Some(self.buf.as_slice());
        }

        if self.overflowed {
            return None;
        }

        if self.buf.push(byte).is_err() {
            crate::log_warn!("command line longer than {} bytes truncated", N);
            self.overflowed = true;
        }

        None
    }

    /// 批量输入，每拼出一行调用一次回调
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_line: F)
    where
        F: FnMut(&[u8]),
    {
        for &byte in bytes {
            if let Some(line) = self.push(byte) {
                on_line(line);
            }
        }
    }

    /// 丢弃未完成的行
    pub fn reset(&mut self) {
        self.buf.clear();
        self.complete = false;
        self.overflowed = false;
    }

    /// 当前缓存的字节数
    pub fn pending(&self) -> usize {
        if self.complete {
            0
        } else {
            self.buf.len()
        }
    }
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}
