//! 字段表、字段数组与字段值的编码。
//!
//! # 实现策略（How）
//! - 容器先在当前位置预留 4 字节长度，依次编码条目，最后回填实际写入的字节数（不含长度字段本身）；
//! - 浮点值按 `to_bits` 得到的整数写出，与解码侧的位模式重解释对称；
//! - 表键超过 255 字节、或任何负载超过 `u32::MAX` 字节时拒绝编码，而不是截断长度字段。
//!
//! # 契约说明（What）
//! - 成功时 `offset` 推进到写入末尾；失败时 `offset` 不变，但 `dst` 中可能残留部分写入的字节；
//! - 写入不会越过 `dst` 末尾，空间不足返回 [`FieldTableError::BufferTooSmall`]。
//!   需要一次性分配输出时，先用 `encoded_len` 计算长度，或直接调用 [`encode_table_to_bytes`]。

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::{
    cursor::WriteCursor,
    error::FieldTableError,
    options::{DepthBudget, EncodeOptions, Nested},
    value::{FieldArray, FieldTable, FieldValue},
};

/// 表键的最大长度（1 字节长度前缀）。
pub const MAX_KEY_LEN: usize = u8::MAX as usize;

/// 把字段表编码到 `dst[*offset..]`（默认配置）。
///
/// # 调用契约（What）
/// - **输入**：`offset` 指向写入起点，`dst` 至少需要 `table.encoded_len()` 字节的剩余空间；
/// - **输出**：成功时 `offset` 推进到表末尾，长度字段已回填；失败时 `offset` 不变，
///   `dst[*offset..]` 可能残留部分写入的字节；
/// - **错误**：空间不足 → `BufferTooSmall`；键超过 255 字节 → `KeyTooLong`；
///   负载超过 `u32::MAX` → `PayloadTooLong`；嵌套超过 [`DEFAULT_MAX_DEPTH`](crate::DEFAULT_MAX_DEPTH) → `DepthExceeded`。
pub fn encode_table(
    dst: &mut [u8],
    offset: &mut usize,
    table: &FieldTable<'_>,
) -> Result<(), FieldTableError> {
    encode_table_with(dst, offset, table, &EncodeOptions::new())
}

/// 按指定配置编码字段表。
///
/// # 调用契约（What）
/// - 与 [`encode_table`] 相同，唯一区别是深度上限取自 `options`；
/// - 解码时放宽了 `max_depth` 的调用方，应以相同上限再编码，否则深层结构会以 `DepthExceeded` 失败。
pub fn encode_table_with(
    dst: &mut [u8],
    offset: &mut usize,
    table: &FieldTable<'_>,
    options: &EncodeOptions,
) -> Result<(), FieldTableError> {
    run(dst, offset, options, |encoder| encoder.table(table))
}

/// 把字段数组编码到 `dst[*offset..]`（默认配置）。
///
/// # 调用契约（What）
/// - **输入**：`offset` 指向写入起点，`dst` 至少需要 `array.encoded_len()` 字节的剩余空间；
/// - **输出**：成功时 `offset` 推进到数组末尾；失败时 `offset` 不变；
/// - **错误**：同 [`encode_table`]，嵌套表中的键同样受 255 字节限制。
pub fn encode_array(
    dst: &mut [u8],
    offset: &mut usize,
    array: &FieldArray<'_>,
) -> Result<(), FieldTableError> {
    encode_array_with(dst, offset, array, &EncodeOptions::new())
}

/// 按指定配置编码字段数组，契约同 [`encode_array`]，深度上限取自 `options`。
pub fn encode_array_with(
    dst: &mut [u8],
    offset: &mut usize,
    array: &FieldArray<'_>,
    options: &EncodeOptions,
) -> Result<(), FieldTableError> {
    run(dst, offset, options, |encoder| encoder.array(array))
}

/// 把带标签的字段值编码到 `dst[*offset..]`（默认配置）。
///
/// # 调用契约（What）
/// - **输出**：先写 1 字节类型标签，再写负载；成功时 `offset` 推进 `value.encoded_len()` 字节，失败时不变；
/// - **错误**：同 [`encode_table`]；标量值只可能因 `BufferTooSmall` 失败。
pub fn encode_value(
    dst: &mut [u8],
    offset: &mut usize,
    value: &FieldValue<'_>,
) -> Result<(), FieldTableError> {
    encode_value_with(dst, offset, value, &EncodeOptions::new())
}

/// 按指定配置编码字段值，契约同 [`encode_value`]，深度上限取自 `options`。
pub fn encode_value_with(
    dst: &mut [u8],
    offset: &mut usize,
    value: &FieldValue<'_>,
    options: &EncodeOptions,
) -> Result<(), FieldTableError> {
    run(dst, offset, options, |encoder| encoder.value(value))
}

/// 把字段表编码为独立的 [`Bytes`]，输出恰好 `table.encoded_len()` 字节（默认配置）。
///
/// # 调用契约（What）
/// - **输出**：一次性按 `encoded_len` 分配，因此不会出现 `BufferTooSmall`；
/// - **错误**：`KeyTooLong`、`PayloadTooLong` 或 `DepthExceeded`。
pub fn encode_table_to_bytes(table: &FieldTable<'_>) -> Result<Bytes, FieldTableError> {
    encode_table_to_bytes_with(table, &EncodeOptions::new())
}

/// 按指定配置把字段表编码为 [`Bytes`]。
///
/// # 调用契约（What）
/// - 与 [`encode_table_to_bytes`] 相同，深度上限取自 `options`；
/// - 以 `decode_table_with` 放宽深度解码得到的表，用相同上限调用本函数即可原样写回。
pub fn encode_table_to_bytes_with(
    table: &FieldTable<'_>,
    options: &EncodeOptions,
) -> Result<Bytes, FieldTableError> {
    let mut buf = BytesMut::zeroed(table.encoded_len());
    let mut offset = 0;
    encode_table_with(&mut buf, &mut offset, table, options)?;
    buf.truncate(offset);
    Ok(buf.freeze())
}

/// 把字段数组编码为独立的 [`Bytes`]（默认配置），契约同 [`encode_table_to_bytes`]。
pub fn encode_array_to_bytes(array: &FieldArray<'_>) -> Result<Bytes, FieldTableError> {
    encode_array_to_bytes_with(array, &EncodeOptions::new())
}

/// 按指定配置把字段数组编码为 [`Bytes`]，契约同 [`encode_table_to_bytes_with`]。
pub fn encode_array_to_bytes_with(
    array: &FieldArray<'_>,
    options: &EncodeOptions,
) -> Result<Bytes, FieldTableError> {
    let mut buf = BytesMut::zeroed(array.encoded_len());
    let mut offset = 0;
    encode_array_with(&mut buf, &mut offset, array, options)?;
    buf.truncate(offset);
    Ok(buf.freeze())
}

impl FieldTable<'_> {
    /// 编码为 [`Bytes`]，等价于 [`encode_table_to_bytes`]。
    pub fn to_bytes(&self) -> Result<Bytes, FieldTableError> {
        encode_table_to_bytes(self)
    }
}

impl FieldArray<'_> {
    /// 编码为 [`Bytes`]，等价于 [`encode_array_to_bytes`]。
    pub fn to_bytes(&self) -> Result<Bytes, FieldTableError> {
        encode_array_to_bytes(self)
    }
}

fn run(
    dst: &mut [u8],
    offset: &mut usize,
    options: &EncodeOptions,
    step: impl FnOnce(&mut Encoder<'_>) -> Result<(), FieldTableError>,
) -> Result<(), FieldTableError> {
    let capacity = dst.len();
    let mut encoder = Encoder {
        cursor: WriteCursor::at(dst, *offset),
        depth: DepthBudget::new(options.max_depth()),
    };
    match step(&mut encoder) {
        Ok(()) => {
            *offset = encoder.cursor.position();
            Ok(())
        }
        Err(error) => {
            debug!(offset = *offset, capacity, %error, "field table encode failed");
            Err(error)
        }
    }
}

fn long_len(len: usize) -> Result<u32, FieldTableError> {
    u32::try_from(len).map_err(|_| FieldTableError::PayloadTooLong { len })
}

pub(crate) struct Encoder<'b> {
    cursor: WriteCursor<'b>,
    depth: DepthBudget,
}

impl Nested for Encoder<'_> {
    fn depth_mut(&mut self) -> &mut DepthBudget {
        &mut self.depth
    }
}

impl Encoder<'_> {
    fn value(&mut self, value: &FieldValue<'_>) -> Result<(), FieldTableError> {
        self.cursor.write_u8(value.kind().tag())?;
        match value {
            FieldValue::Boolean(flag) => self.cursor.write_u8(u8::from(*flag)),
            FieldValue::I8(v) => self.cursor.write_u8(*v as u8),
            FieldValue::U8(v) => self.cursor.write_u8(*v),
            FieldValue::I16(v) => self.cursor.write_u16(*v as u16),
            FieldValue::U16(v) => self.cursor.write_u16(*v),
            FieldValue::I32(v) => self.cursor.write_u32(*v as u32),
            FieldValue::U32(v) => self.cursor.write_u32(*v),
            FieldValue::I64(v) => self.cursor.write_u64(*v as u64),
            FieldValue::U64(v) => self.cursor.write_u64(*v),
            FieldValue::F32(v) => self.cursor.write_u32(v.to_bits()),
            FieldValue::F64(v) => self.cursor.write_u64(v.to_bits()),
            FieldValue::Decimal(decimal) => {
                self.cursor.write_u8(decimal.scale)?;
                self.cursor.write_u32(decimal.value)
            }
            FieldValue::Utf8(data) | FieldValue::Bytes(data) => {
                self.cursor.write_u32(long_len(data.len())?)?;
                self.cursor.write_bytes(data)
            }
            FieldValue::Timestamp(v) => self.cursor.write_u64(*v),
            FieldValue::Array(array) => self.array(array),
            FieldValue::Table(table) => self.table(table),
            FieldValue::Void => Ok(()),
        }
    }

    fn array(&mut self, array: &FieldArray<'_>) -> Result<(), FieldTableError> {
        let mut scope = self.enter()?;
        let length_at = scope.cursor.reserve_u32()?;
        for value in array {
            scope.value(value)?;
        }
        scope.seal(length_at)
    }

    fn table(&mut self, table: &FieldTable<'_>) -> Result<(), FieldTableError> {
        let mut scope = self.enter()?;
        let length_at = scope.cursor.reserve_u32()?;
        for entry in table {
            let key_len = u8::try_from(entry.key.len())
                .map_err(|_| FieldTableError::KeyTooLong {
                    len: entry.key.len(),
                })?;
            scope.cursor.write_u8(key_len)?;
            scope.cursor.write_bytes(&entry.key)?;
            scope.value(&entry.value)?;
        }
        scope.seal(length_at)
    }

    /// 回填容器长度：自长度字段之后到当前位置的字节数。
    fn seal(&mut self, length_at: usize) -> Result<(), FieldTableError> {
        let written = self.cursor.position() - length_at - 4;
        self.cursor.patch_u32(length_at, long_len(written)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Decimal, TableEntry};
    use alloc::{borrow::Cow, vec, vec::Vec};
    use tracing_test::traced_test;

    #[test]
    fn single_boolean_entry_matches_wire_layout() {
        let table = FieldTable::from(vec![TableEntry::new("x", true)]);
        let bytes = table.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0, 0, 0, 4, 1, b'x', b't', 1]);
    }

    #[test]
    fn floats_are_written_as_bit_patterns() {
        let mut buf = [0u8; 14];
        let mut offset = 0;
        encode_value(&mut buf, &mut offset, &FieldValue::F32(-0.0)).unwrap();
        encode_value(&mut buf, &mut offset, &FieldValue::F64(f64::from_bits(0x7ff8_0000_0000_0001)))
            .unwrap();
        assert_eq!(offset, 14);
        assert_eq!(&buf[..5], &[b'f', 0x80, 0, 0, 0]);
        assert_eq!(&buf[5..], &[b'd', 0x7f, 0xf8, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn signed_and_decimal_payloads() {
        let array = FieldArray::from(vec![
            FieldValue::I8(-2),
            FieldValue::I16(-2),
            FieldValue::Decimal(Decimal::new(3, 7)),
        ]);
        let bytes = array.to_bytes().unwrap();
        let expected: Vec<u8> = vec![
            0, 0, 0, 11, //
            b'b', 0xfe, //
            b's', 0xff, 0xfe, //
            b'D', 3, 0, 0, 0, 7,
        ];
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn nested_lengths_are_back_patched() {
        let inner = FieldTable::from(vec![TableEntry::new("k", FieldValue::Void)]);
        let table = FieldTable::from(vec![TableEntry::new("t", inner)]);
        let bytes = table.to_bytes().unwrap();
        assert_eq!(
            &bytes[..],
            &[0, 0, 0, 10, 1, b't', b'F', 0, 0, 0, 3, 1, b'k', b'V']
        );
    }

    #[test]
    fn over_long_key_is_rejected() {
        let key = vec![b'k'; MAX_KEY_LEN + 1];
        let table = FieldTable::from(vec![TableEntry::with_raw_key(key, FieldValue::Void)]);
        let err = table.to_bytes().unwrap_err();
        assert_eq!(err, FieldTableError::KeyTooLong { len: 256 });
        assert_eq!(err.kind(), crate::ErrorKind::InvalidEncoding);
    }

    #[test]
    fn max_length_key_is_accepted() {
        let key: Cow<'_, [u8]> = Cow::Owned(vec![b'k'; MAX_KEY_LEN]);
        let table = FieldTable::from(vec![TableEntry::with_raw_key(key, FieldValue::Void)]);
        let bytes = table.to_bytes().unwrap();
        assert_eq!(bytes.len(), 4 + 1 + MAX_KEY_LEN + 1);
        assert_eq!(bytes[4], 0xff);
    }

    #[test]
    fn short_buffer_keeps_offset() {
        let table = FieldTable::from(vec![TableEntry::new("x", 1u64)]);
        let mut buf = [0u8; 8];
        let mut offset = 2;
        assert_eq!(
            encode_table(&mut buf, &mut offset, &table),
            Err(FieldTableError::BufferTooSmall {
                needed: 1,
                available: 0,
            })
        );
        assert_eq!(offset, 2);
    }

    #[test]
    #[traced_test]
    fn encode_failures_are_logged() {
        let mut buf = [0u8; 2];
        assert!(encode_value(&mut buf, &mut 0, &FieldValue::U32(1)).is_err());
        assert!(logs_contain("field table encode failed"));
    }
}
