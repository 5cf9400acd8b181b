//! 带边界检查的大端字节游标。
//!
//! # 教案定位（Why）
//! - 字段表的全部标量（定长整数、浮点位模式、长度前缀、原始字节）都经由这里读写；
//! - 所有读写都对照缓冲的真实长度做检查，嵌套结构声明的长度再大也无法越界，
//!   调用方因此不必额外信任外层长度字段。
//!
//! # 契约说明（What）
//! - [`ReadCursor`] 读取失败返回 [`FieldTableError::Truncated`]，失败时位置不变；
//! - [`WriteCursor`] 写入失败返回 [`FieldTableError::BufferTooSmall`]，失败时不写入任何字节；
//! - 浮点值不在此处解码：上层按整数读取后通过 `from_bits` 还原位模式。

use crate::error::FieldTableError;

/// 只读游标，借用原始输入，读出的字节切片与输入同生命周期。
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// 从缓冲起点开始读取。
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// 从指定偏移开始读取；偏移超出末尾时后续任何读取都会报告截断。
    #[must_use]
    pub const fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// 当前读取位置。
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// 底层缓冲总长度。
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// 底层缓冲是否为空。
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 剩余可读字节数。
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// 读取 `len` 个原始字节，返回借用输入的切片。
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], FieldTableError> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(FieldTableError::Truncated {
                offset: start,
                needed: len,
                available: self.remaining(),
            })?;
        self.pos = end;
        Ok(&self.buf[start..end])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FieldTableError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// 读取 1 字节。
    pub fn read_u8(&mut self) -> Result<u8, FieldTableError> {
        self.read_array::<1>().map(|b| b[0])
    }

    /// 读取大端 `u16`。
    pub fn read_u16(&mut self) -> Result<u16, FieldTableError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// 读取大端 `u32`。
    pub fn read_u32(&mut self) -> Result<u32, FieldTableError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// 读取大端 `u64`。
    pub fn read_u64(&mut self) -> Result<u64, FieldTableError> {
        self.read_array().map(u64::from_be_bytes)
    }
}

/// 写入固定大小切片的游标，支持预留长度字段后回填。
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    /// 从指定偏移开始写入。
    #[must_use]
    pub fn at(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// 当前写入位置。
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可写字节数。
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// 校验 `[pos, pos + needed)` 落在缓冲内，返回区间末尾。
    ///
    /// 起点越过末尾时，即便 `needed == 0` 也报告空间不足。
    fn span_end(&self, needed: usize) -> Result<usize, FieldTableError> {
        self.pos
            .checked_add(needed)
            .filter(|end| *end <= self.buf.len())
            .ok_or(FieldTableError::BufferTooSmall {
                needed,
                available: self.remaining(),
            })
    }

    /// 写入原始字节。
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<(), FieldTableError> {
        let end = self.span_end(src.len())?;
        self.buf[self.pos..end].copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    /// 写入 1 字节。
    pub fn write_u8(&mut self, value: u8) -> Result<(), FieldTableError> {
        self.write_bytes(&[value])
    }

    /// 写入大端 `u16`。
    pub fn write_u16(&mut self, value: u16) -> Result<(), FieldTableError> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// 写入大端 `u32`。
    pub fn write_u32(&mut self, value: u32) -> Result<(), FieldTableError> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// 写入大端 `u64`。
    pub fn write_u64(&mut self, value: u64) -> Result<(), FieldTableError> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// 预留 4 字节长度字段，返回其偏移，稍后由 [`patch_u32`](Self::patch_u32) 回填。
    pub fn reserve_u32(&mut self) -> Result<usize, FieldTableError> {
        let at = self.pos;
        self.write_u32(0)?;
        Ok(at)
    }

    /// 在已写区域的 `at` 处回填大端 `u32`。
    ///
    /// - **前置条件**：`at + 4 <= position()`，即只能回填已经写过的字节。
    pub fn patch_u32(&mut self, at: usize, value: u32) -> Result<(), FieldTableError> {
        let end = at.checked_add(4).filter(|end| *end <= self.pos).ok_or(
            FieldTableError::BufferTooSmall {
                needed: 4,
                available: self.pos.saturating_sub(at),
            },
        )?;
        self.buf[at..end].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}
