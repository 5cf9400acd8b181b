//! 字段表的结构化数据模型。
//!
//! # 教案定位（Why）
//! - 以一个和类型表达“标签 + 负载”，每个变体只携带与其类型相关的数据，非法的标签/负载组合无法构造；
//! - 解码产物借用原始输入（`Cow::Borrowed`），避免复制字符串与字节串；手工构造的值可以持有自己的字节。
//!
//! # 契约说明（What）
//! - [`FieldTable`]/[`FieldArray`] 内部是精确长度的 `Box<[T]>`，构造后不可变；条目顺序与线上一致，
//!   重复键合法且原样保留；
//! - 相等性是结构相等：浮点按位比较，因此 NaN 负载也满足 `decode(encode(x)) == x`；
//! - `encoded_len` 返回编码时恰好写入的字节数（含标签与长度前缀）。

use alloc::{borrow::Cow, boxed::Box, vec::Vec};
use core::{slice, str};

use crate::{compare::compare_entries, kind::FieldKind};

/// 定点小数：`value × 10^-scale`。不做范围校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    /// 小数位数。
    pub scale: u8,
    /// 未缩放的整数值。
    pub value: u32,
}

impl Decimal {
    /// 构造定点小数。
    #[must_use]
    pub const fn new(scale: u8, value: u32) -> Self {
        Self { scale, value }
    }
}

/// 单个带类型的字段值。
///
/// `F32`/`F64` 保存的是线上位模式对应的浮点数：编解码时使用 `to_bits`/`from_bits`，
/// 从不做数值转换，这是与对端保持字节级兼容的前提。
#[derive(Debug, Clone)]
pub enum FieldValue<'a> {
    /// 布尔值。
    Boolean(bool),
    /// 有符号 8 位整数。
    I8(i8),
    /// 无符号 8 位整数。
    U8(u8),
    /// 有符号 16 位整数。
    I16(i16),
    /// 无符号 16 位整数。
    U16(u16),
    /// 有符号 32 位整数。
    I32(i32),
    /// 无符号 32 位整数。
    U32(u32),
    /// 有符号 64 位整数。
    I64(i64),
    /// 无符号 64 位整数。
    U64(u64),
    /// 单精度浮点。
    F32(f32),
    /// 双精度浮点。
    F64(f64),
    /// 定点小数。
    Decimal(Decimal),
    /// 长字符串，字节未经 UTF-8 校验。
    Utf8(Cow<'a, [u8]>),
    /// 不透明字节串。
    Bytes(Cow<'a, [u8]>),
    /// 嵌套数组。
    Array(FieldArray<'a>),
    /// 时间戳（epoch 秒），本层不附加语义。
    Timestamp(u64),
    /// 嵌套字段表。
    Table(FieldTable<'a>),
    /// 空值。
    Void,
}

impl<'a> FieldValue<'a> {
    /// 以借用的字符串构造 `Utf8` 值。
    #[must_use]
    pub fn utf8(text: &'a str) -> Self {
        FieldValue::Utf8(Cow::Borrowed(text.as_bytes()))
    }

    /// 以借用的字节构造 `Bytes` 值。
    #[must_use]
    pub fn bytes(data: &'a [u8]) -> Self {
        FieldValue::Bytes(Cow::Borrowed(data))
    }

    /// 值的类型标签。
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::I8(_) => FieldKind::I8,
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::I16(_) => FieldKind::I16,
            FieldValue::U16(_) => FieldKind::U16,
            FieldValue::I32(_) => FieldKind::I32,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::I64(_) => FieldKind::I64,
            FieldValue::U64(_) => FieldKind::U64,
            FieldValue::F32(_) => FieldKind::F32,
            FieldValue::F64(_) => FieldKind::F64,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::Utf8(_) => FieldKind::Utf8,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Array(_) => FieldKind::Array,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Table(_) => FieldKind::Table,
            FieldValue::Void => FieldKind::Void,
        }
    }

    /// 若为 `Utf8` 且内容是合法 UTF-8，返回字符串视图。
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Utf8(data) => str::from_utf8(data).ok(),
            _ => None,
        }
    }

    /// `Utf8`/`Bytes` 的原始字节。
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Utf8(data) | FieldValue::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// 嵌套字段表。
    #[must_use]
    pub fn as_table(&self) -> Option<&FieldTable<'a>> {
        match self {
            FieldValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// 嵌套数组。
    #[must_use]
    pub fn as_array(&self) -> Option<&FieldArray<'a>> {
        match self {
            FieldValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// 编码后的字节数，含 1 字节标签。
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + self.payload_len()
    }

    pub(crate) fn payload_len(&self) -> usize {
        match self {
            FieldValue::Utf8(data) | FieldValue::Bytes(data) => 4 + data.len(),
            FieldValue::Array(array) => array.encoded_len(),
            FieldValue::Table(table) => table.encoded_len(),
            other => other.kind().fixed_width().unwrap_or(0),
        }
    }

    /// 深拷贝为不再借用输入缓冲的值。
    #[must_use]
    pub fn into_owned(self) -> FieldValue<'static> {
        match self {
            FieldValue::Boolean(v) => FieldValue::Boolean(v),
            FieldValue::I8(v) => FieldValue::I8(v),
            FieldValue::U8(v) => FieldValue::U8(v),
            FieldValue::I16(v) => FieldValue::I16(v),
            FieldValue::U16(v) => FieldValue::U16(v),
            FieldValue::I32(v) => FieldValue::I32(v),
            FieldValue::U32(v) => FieldValue::U32(v),
            FieldValue::I64(v) => FieldValue::I64(v),
            FieldValue::U64(v) => FieldValue::U64(v),
            FieldValue::F32(v) => FieldValue::F32(v),
            FieldValue::F64(v) => FieldValue::F64(v),
            FieldValue::Decimal(v) => FieldValue::Decimal(v),
            FieldValue::Utf8(data) => FieldValue::Utf8(Cow::Owned(data.into_owned())),
            FieldValue::Bytes(data) => FieldValue::Bytes(Cow::Owned(data.into_owned())),
            FieldValue::Array(array) => FieldValue::Array(array.into_owned()),
            FieldValue::Timestamp(v) => FieldValue::Timestamp(v),
            FieldValue::Table(table) => FieldValue::Table(table.into_owned()),
            FieldValue::Void => FieldValue::Void,
        }
    }
}

impl PartialEq for FieldValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::I8(a), FieldValue::I8(b)) => a == b,
            (FieldValue::U8(a), FieldValue::U8(b)) => a == b,
            (FieldValue::I16(a), FieldValue::I16(b)) => a == b,
            (FieldValue::U16(a), FieldValue::U16(b)) => a == b,
            (FieldValue::I32(a), FieldValue::I32(b)) => a == b,
            (FieldValue::U32(a), FieldValue::U32(b)) => a == b,
            (FieldValue::I64(a), FieldValue::I64(b)) => a == b,
            (FieldValue::U64(a), FieldValue::U64(b)) => a == b,
            (FieldValue::F32(a), FieldValue::F32(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::F64(a), FieldValue::F64(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a == b,
            (FieldValue::Utf8(a), FieldValue::Utf8(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            (FieldValue::Array(a), FieldValue::Array(b)) => a == b,
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a == b,
            (FieldValue::Table(a), FieldValue::Table(b)) => a == b,
            (FieldValue::Void, FieldValue::Void) => true,
            _ => false,
        }
    }
}

impl Eq for FieldValue<'_> {}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue<'_> {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(text: &'a str) -> Self {
        FieldValue::utf8(text)
    }
}

impl<'a> From<FieldTable<'a>> for FieldValue<'a> {
    fn from(table: FieldTable<'a>) -> Self {
        FieldValue::Table(table)
    }
}

impl<'a> From<FieldArray<'a>> for FieldValue<'a> {
    fn from(array: FieldArray<'a>) -> Self {
        FieldValue::Array(array)
    }
}

/// 字段数组：有序、可异构的字段值序列。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldArray<'a> {
    entries: Box<[FieldValue<'a>]>,
}

impl<'a> FieldArray<'a> {
    /// 空数组，不分配内存。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_boxed(entries: Box<[FieldValue<'a>]>) -> Self {
        Self { entries }
    }

    /// 元素个数。
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按位置取元素。
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FieldValue<'a>> {
        self.entries.get(index)
    }

    /// 按线上顺序遍历。
    pub fn iter(&self) -> slice::Iter<'_, FieldValue<'a>> {
        self.entries.iter()
    }

    /// 全部元素。
    #[must_use]
    pub fn as_slice(&self) -> &[FieldValue<'a>] {
        &self.entries
    }

    /// 编码后的字节数，含 4 字节长度前缀。
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + self.entries.iter().map(FieldValue::encoded_len).sum::<usize>()
    }

    /// 深拷贝为不再借用输入缓冲的数组。
    #[must_use]
    pub fn into_owned(self) -> FieldArray<'static> {
        FieldArray {
            entries: self
                .entries
                .into_vec()
                .into_iter()
                .map(FieldValue::into_owned)
                .collect(),
        }
    }
}

impl<'a> From<Vec<FieldValue<'a>>> for FieldArray<'a> {
    fn from(entries: Vec<FieldValue<'a>>) -> Self {
        Self {
            entries: entries.into_boxed_slice(),
        }
    }
}

impl<'a> FromIterator<FieldValue<'a>> for FieldArray<'a> {
    fn from_iter<I: IntoIterator<Item = FieldValue<'a>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'s, 'a> IntoIterator for &'s FieldArray<'a> {
    type Item = &'s FieldValue<'a>;
    type IntoIter = slice::Iter<'s, FieldValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 字段表条目：键 + 值。
///
/// 键长度必须不超过 255 字节；构造时不检查，编码时超长返回
/// [`FieldTableError::KeyTooLong`](crate::FieldTableError::KeyTooLong)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry<'a> {
    /// 键的原始字节。
    pub key: Cow<'a, [u8]>,
    /// 值。
    pub value: FieldValue<'a>,
}

impl<'a> TableEntry<'a> {
    /// 以借用的键构造条目。
    #[must_use]
    pub fn new(key: &'a str, value: impl Into<FieldValue<'a>>) -> Self {
        Self {
            key: Cow::Borrowed(key.as_bytes()),
            value: value.into(),
        }
    }

    /// 以任意字节键构造条目。
    #[must_use]
    pub fn with_raw_key(key: impl Into<Cow<'a, [u8]>>, value: FieldValue<'a>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// 编码后的字节数：1 字节键长 + 键 + 值。
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + self.key.len() + self.value.encoded_len()
    }

    /// 深拷贝为不再借用输入缓冲的条目。
    #[must_use]
    pub fn into_owned(self) -> TableEntry<'static> {
        TableEntry {
            key: Cow::Owned(self.key.into_owned()),
            value: self.value.into_owned(),
        }
    }
}

/// 字段表：有序的 `(键, 值)` 序列，保留插入顺序与重复键。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldTable<'a> {
    entries: Box<[TableEntry<'a>]>,
}

impl<'a> FieldTable<'a> {
    /// 空表，不分配内存。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_boxed(entries: Box<[TableEntry<'a>]>) -> Self {
        Self { entries }
    }

    /// 条目个数。
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 返回第一个键等于 `key` 的值。
    #[must_use]
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&FieldValue<'a>> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|entry| entry.key.as_ref() == key)
            .map(|entry| &entry.value)
    }

    /// 按线上顺序遍历。
    pub fn iter(&self) -> slice::Iter<'_, TableEntry<'a>> {
        self.entries.iter()
    }

    /// 全部条目。
    #[must_use]
    pub fn as_slice(&self) -> &[TableEntry<'a>] {
        &self.entries
    }

    /// 编码后的字节数，含 4 字节长度前缀。
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + self.entries.iter().map(TableEntry::encoded_len).sum::<usize>()
    }

    /// 返回按键字典序稳定排序的副本，供需要规范顺序（哈希、签名）的调用方使用。
    ///
    /// 重复键保持原有相对顺序；编解码本身从不排序。
    #[must_use]
    pub fn sorted_by_key(&self) -> FieldTable<'a> {
        let mut entries = self.entries.to_vec();
        entries.sort_by(compare_entries);
        Self::from(entries)
    }

    /// 深拷贝为不再借用输入缓冲的表。
    #[must_use]
    pub fn into_owned(self) -> FieldTable<'static> {
        FieldTable {
            entries: self
                .entries
                .into_vec()
                .into_iter()
                .map(TableEntry::into_owned)
                .collect(),
        }
    }
}

impl<'a> From<Vec<TableEntry<'a>>> for FieldTable<'a> {
    fn from(entries: Vec<TableEntry<'a>>) -> Self {
        Self {
            entries: entries.into_boxed_slice(),
        }
    }
}

impl<'a> FromIterator<TableEntry<'a>> for FieldTable<'a> {
    fn from_iter<I: IntoIterator<Item = TableEntry<'a>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'s, 'a> IntoIterator for &'s FieldTable<'a> {
    type Item = &'s TableEntry<'a>;
    type IntoIter = slice::Iter<'s, TableEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
