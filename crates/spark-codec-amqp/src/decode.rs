//! 字段表、字段数组与字段值的解码。
//!
//! # 教案定位（Why）
//! - 三个解码例程互相递归（表 → 值 → 数组 → 值 → 表 …），因此集中在同一个 [`Decoder`] 上实现，
//!   由它统一持有游标、深度计数与长度策略；
//! - 解码产物借用输入缓冲，字符串、字节串与表键都不复制。
//!
//! # 实现策略（How）
//! 1. 容器先读取 4 字节长度，得到声明边界 `limit`；
//! 2. 条目逐个解码后追加到临时缓冲 [`Scratch`]：首次分配 16 个槽位，写满后容量翻倍，所有分配均可失败；
//! 3. 读取位置到达 `limit` 即停止；严格模式下若越过边界则报告 [`FieldTableError::LengthMismatch`]；
//! 4. 整个容器成功后，才把临时缓冲物化为精确长度的 `Box<[T]>`。出错时临时缓冲随栈帧释放，
//!    不会有部分结果流出。
//!
//! # 注意事项（Trade-offs）
//! - 布尔值把任何非零字节视为 `true`，再编码时写回 `1`；因此只有规范的 0/1 布尔值满足字节级往返。

use alloc::{borrow::Cow, boxed::Box, vec::Vec};

use tracing::{debug, trace};

use crate::{
    cursor::ReadCursor,
    error::{Container, FieldTableError},
    kind::FieldKind,
    options::{DecodeOptions, DepthBudget, LengthPolicy, Nested},
    value::{Decimal, FieldArray, FieldTable, FieldValue, TableEntry},
};

/// 临时缓冲的初始容量（条目数）。
pub const INITIAL_SCRATCH_CAPACITY: usize = 16;

/// 从 `buf[*offset..]` 解码一张字段表（默认配置）。
///
/// # 调用契约（What）
/// - **输入**：`offset` 指向表的 4 字节长度字段；
/// - **输出**：成功时返回借用 `buf` 的表，并把 `offset` 推进到表末尾；失败时 `offset` 不变；
/// - **错误**：未知标签 → `UnknownKind`；截断 → `Truncated`；长度不符 → `LengthMismatch`；
///   嵌套过深 → `DepthExceeded`；分配失败 → `OutOfMemory`。
pub fn decode_table<'a>(buf: &'a [u8], offset: &mut usize) -> Result<FieldTable<'a>, FieldTableError> {
    decode_table_with(buf, offset, &DecodeOptions::new())
}

/// 按指定配置解码字段表。
///
/// # 调用契约（What）
/// - 与 [`decode_table`] 相同，深度上限与长度策略取自 `options`；
/// - [`LengthPolicy::Lenient`] 下不再报告 `LengthMismatch`，声明长度越过输入末尾时仍会在读取中以 `Truncated` 失败；
/// - 放宽 `max_depth` 后若需再编码，应以相同上限调用 `encode_table_with`/`encode_table_to_bytes_with`。
pub fn decode_table_with<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    options: &DecodeOptions,
) -> Result<FieldTable<'a>, FieldTableError> {
    run(buf, offset, options, Decoder::table)
}

/// 从 `buf[*offset..]` 解码一个字段数组（默认配置）。
///
/// # 调用契约（What）
/// - **输入**：`offset` 指向数组的 4 字节长度字段；
/// - **输出**：成功时返回借用 `buf` 的数组并推进 `offset`；失败时 `offset` 不变；
/// - **错误**：同 [`decode_table`]，长度不符时 `LengthMismatch` 的容器为 [`Container::Array`]。
pub fn decode_array<'a>(buf: &'a [u8], offset: &mut usize) -> Result<FieldArray<'a>, FieldTableError> {
    decode_array_with(buf, offset, &DecodeOptions::new())
}

/// 按指定配置解码字段数组，契约同 [`decode_array`]，深度上限与长度策略取自 `options`。
pub fn decode_array_with<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    options: &DecodeOptions,
) -> Result<FieldArray<'a>, FieldTableError> {
    run(buf, offset, options, Decoder::array)
}

/// 从 `buf[*offset..]` 解码一个带标签的字段值（默认配置）。
///
/// # 调用契约（What）
/// - **输入**：`offset` 指向 1 字节类型标签；
/// - **输出**：成功时 `offset` 推进到负载末尾；失败时不变；
/// - **错误**：未知标签 → `UnknownKind`，其 `offset` 为标签在 `buf` 中的绝对位置；其余同 [`decode_table`]。
pub fn decode_value<'a>(buf: &'a [u8], offset: &mut usize) -> Result<FieldValue<'a>, FieldTableError> {
    decode_value_with(buf, offset, &DecodeOptions::new())
}

/// 按指定配置解码字段值，契约同 [`decode_value`]，深度上限与长度策略取自 `options`。
pub fn decode_value_with<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    options: &DecodeOptions,
) -> Result<FieldValue<'a>, FieldTableError> {
    run(buf, offset, options, Decoder::value)
}

fn run<'a, T>(
    buf: &'a [u8],
    offset: &mut usize,
    options: &DecodeOptions,
    step: impl FnOnce(&mut Decoder<'a>) -> Result<T, FieldTableError>,
) -> Result<T, FieldTableError> {
    let mut decoder = Decoder::new(buf, *offset, options);
    match step(&mut decoder) {
        Ok(decoded) => {
            *offset = decoder.cursor.position();
            Ok(decoded)
        }
        Err(error) => {
            debug!(offset = *offset, input_len = buf.len(), %error, "field table decode failed");
            Err(error)
        }
    }
}

/// 仅在解码期间存在的可增长缓冲。
struct Scratch<T> {
    items: Vec<T>,
}

impl<T> Scratch<T> {
    const fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn push(&mut self, item: T) -> Result<(), FieldTableError> {
        let capacity = self.items.capacity();
        if self.items.len() == capacity {
            let grow = if capacity == 0 {
                INITIAL_SCRATCH_CAPACITY
            } else {
                capacity
            };
            self.items
                .try_reserve_exact(grow)
                .map_err(|_| FieldTableError::OutOfMemory {
                    requested: capacity.saturating_add(grow),
                })?;
        }
        self.items.push(item);
        Ok(())
    }

    /// 物化为精确长度的序列；零条目不分配。
    ///
    /// 唯一可能失败的分配是这里的 `try_reserve_exact(len)`。`into_boxed_slice` 只在容量大于长度时
    /// 才会再分配（且失败即中止），因此两条路径都必须在容量恰好等于长度时调用它。
    /// `Vec` 的容量记录的是请求值而非分配器实际给出的大小，`try_reserve_exact` 成功后该前提成立。
    fn materialize(self) -> Result<Box<[T]>, FieldTableError> {
        let len = self.items.len();
        if len == self.items.capacity() {
            return Ok(self.items.into_boxed_slice());
        }
        let mut exact = Vec::new();
        exact
            .try_reserve_exact(len)
            .map_err(|_| FieldTableError::OutOfMemory { requested: len })?;
        debug_assert!(
            core::mem::size_of::<T>() == 0 || exact.capacity() == len,
            "exact reservation must not leave slack for into_boxed_slice to shrink"
        );
        exact.extend(self.items);
        Ok(exact.into_boxed_slice())
    }
}

/// 声明边界：容器负载的起止位置。
#[derive(Debug, Clone, Copy)]
struct Bounds {
    start: usize,
    limit: usize,
}

pub(crate) struct Decoder<'a> {
    cursor: ReadCursor<'a>,
    depth: DepthBudget,
    policy: LengthPolicy,
}

impl Nested for Decoder<'_> {
    fn depth_mut(&mut self) -> &mut DepthBudget {
        &mut self.depth
    }
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8], offset: usize, options: &DecodeOptions) -> Self {
        Self {
            cursor: ReadCursor::at(buf, offset),
            depth: DepthBudget::new(options.max_depth()),
            policy: options.length_policy(),
        }
    }

    fn value(&mut self) -> Result<FieldValue<'a>, FieldTableError> {
        let at = self.cursor.position();
        let tag = self.cursor.read_u8()?;
        let kind = FieldKind::from_tag_at(tag, at)?;
        self.payload(kind)
    }

    fn payload(&mut self, kind: FieldKind) -> Result<FieldValue<'a>, FieldTableError> {
        let value = match kind {
            FieldKind::Boolean => FieldValue::Boolean(self.cursor.read_u8()? != 0),
            FieldKind::I8 => FieldValue::I8(self.cursor.read_u8()? as i8),
            FieldKind::U8 => FieldValue::U8(self.cursor.read_u8()?),
            FieldKind::I16 => FieldValue::I16(self.cursor.read_u16()? as i16),
            FieldKind::U16 => FieldValue::U16(self.cursor.read_u16()?),
            FieldKind::I32 => FieldValue::I32(self.cursor.read_u32()? as i32),
            FieldKind::U32 => FieldValue::U32(self.cursor.read_u32()?),
            FieldKind::I64 => FieldValue::I64(self.cursor.read_u64()? as i64),
            FieldKind::U64 => FieldValue::U64(self.cursor.read_u64()?),
            // 位模式重解释，不是数值转换。
            FieldKind::F32 => FieldValue::F32(f32::from_bits(self.cursor.read_u32()?)),
            FieldKind::F64 => FieldValue::F64(f64::from_bits(self.cursor.read_u64()?)),
            FieldKind::Decimal => {
                let scale = self.cursor.read_u8()?;
                let value = self.cursor.read_u32()?;
                FieldValue::Decimal(Decimal { scale, value })
            }
            FieldKind::Utf8 => FieldValue::Utf8(Cow::Borrowed(self.long_bytes()?)),
            FieldKind::Bytes => FieldValue::Bytes(Cow::Borrowed(self.long_bytes()?)),
            FieldKind::Timestamp => FieldValue::Timestamp(self.cursor.read_u64()?),
            FieldKind::Void => FieldValue::Void,
            FieldKind::Array => FieldValue::Array(self.array()?),
            FieldKind::Table => FieldValue::Table(self.table()?),
        };
        Ok(value)
    }

    fn long_bytes(&mut self) -> Result<&'a [u8], FieldTableError> {
        let len = self.cursor.read_u32()? as usize;
        self.cursor.read_bytes(len)
    }

    fn array(&mut self) -> Result<FieldArray<'a>, FieldTableError> {
        let mut scope = self.enter()?;
        let bounds = scope.open()?;
        let mut scratch = Scratch::new();
        while scope.cursor.position() < bounds.limit {
            let value = scope.value()?;
            scratch.push(value)?;
        }
        scope.close(Container::Array, bounds, scratch.len())?;
        Ok(FieldArray::from_boxed(scratch.materialize()?))
    }

    fn table(&mut self) -> Result<FieldTable<'a>, FieldTableError> {
        let mut scope = self.enter()?;
        let bounds = scope.open()?;
        let mut scratch = Scratch::new();
        while scope.cursor.position() < bounds.limit {
            let key_len = scope.cursor.read_u8()? as usize;
            let key = scope.cursor.read_bytes(key_len)?;
            let value = scope.value()?;
            scratch.push(TableEntry {
                key: Cow::Borrowed(key),
                value,
            })?;
        }
        scope.close(Container::Table, bounds, scratch.len())?;
        Ok(FieldTable::from_boxed(scratch.materialize()?))
    }

    fn open(&mut self) -> Result<Bounds, FieldTableError> {
        let declared = self.cursor.read_u32()? as usize;
        let start = self.cursor.position();
        let overrun = FieldTableError::Truncated {
            offset: start,
            needed: declared,
            available: self.cursor.remaining(),
        };
        let limit = start.checked_add(declared).ok_or(overrun.clone())?;
        if self.policy == LengthPolicy::Strict && limit > self.cursor.len() {
            return Err(overrun);
        }
        Ok(Bounds { start, limit })
    }

    fn close(
        &self,
        container: Container,
        bounds: Bounds,
        entries: usize,
    ) -> Result<(), FieldTableError> {
        let end = self.cursor.position();
        if self.policy == LengthPolicy::Strict && end != bounds.limit {
            return Err(FieldTableError::LengthMismatch {
                container,
                declared: bounds.limit - bounds.start,
                consumed: end - bounds.start,
            });
        }
        trace!(
            %container,
            entries,
            bytes = end - bounds.start,
            depth = self.depth.current(),
            "field container decoded"
        );
        Ok(())
    }
}
