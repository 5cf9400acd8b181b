//! 字段类型标签（kind tag）定义。
//!
//! # 教案定位（Why）
//! - AMQP 0-9-1 字段表的每个值都以 1 字节类型标签开头，标签到类型的映射由协议外部规定，必须逐位复现；
//! - 将映射集中在一个封闭枚举中，解码与编码两端共享同一张表，避免在分派逻辑中散落魔法字符。
//!
//! # 契约说明（What）
//! - [`FieldKind::tag`] 返回线上字节；[`FieldKind::try_from`] 将线上字节还原为枚举，未知标签返回
//!   [`FieldTableError::UnknownKind`](crate::FieldTableError::UnknownKind)。
//! - 标签取值与 RabbitMQ/librabbitmq 使用的字段表方言一致（`s` 为 I16、`u` 为 U16、`x` 为 Bytes 等）。

use core::fmt;

use crate::error::FieldTableError;

/// 字段值的类型标签，枚举值即线上字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldKind {
    /// 布尔值。
    Boolean = b't',
    /// 有符号 8 位整数。
    I8 = b'b',
    /// 无符号 8 位整数。
    U8 = b'B',
    /// 有符号 16 位整数。
    I16 = b's',
    /// 无符号 16 位整数。
    U16 = b'u',
    /// 有符号 32 位整数。
    I32 = b'I',
    /// 无符号 32 位整数。
    U32 = b'i',
    /// 有符号 64 位整数。
    I64 = b'l',
    /// 无符号 64 位整数。
    U64 = b'L',
    /// IEEE-754 单精度浮点。
    F32 = b'f',
    /// IEEE-754 双精度浮点。
    F64 = b'd',
    /// 定点小数。
    Decimal = b'D',
    /// 长字符串（按 UTF-8 解释，但不做校验）。
    Utf8 = b'S',
    /// 字段数组。
    Array = b'A',
    /// 64 位时间戳（epoch 秒）。
    Timestamp = b'T',
    /// 嵌套字段表。
    Table = b'F',
    /// 空值。
    Void = b'V',
    /// 不透明字节串。
    Bytes = b'x',
}

impl FieldKind {
    /// 全部已知类型，按协议表顺序排列。
    pub const ALL: [FieldKind; 18] = [
        FieldKind::Boolean,
        FieldKind::I8,
        FieldKind::U8,
        FieldKind::I16,
        FieldKind::U16,
        FieldKind::I32,
        FieldKind::U32,
        FieldKind::I64,
        FieldKind::U64,
        FieldKind::F32,
        FieldKind::F64,
        FieldKind::Decimal,
        FieldKind::Utf8,
        FieldKind::Array,
        FieldKind::Timestamp,
        FieldKind::Table,
        FieldKind::Void,
        FieldKind::Bytes,
    ];

    /// 返回写入线上的标签字节。
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// 定长标量的负载字节数；变长或容器类型返回 `None`。
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldKind::Boolean | FieldKind::I8 | FieldKind::U8 => Some(1),
            FieldKind::I16 | FieldKind::U16 => Some(2),
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => Some(4),
            FieldKind::Decimal => Some(5),
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 | FieldKind::Timestamp => Some(8),
            FieldKind::Void => Some(0),
            FieldKind::Utf8 | FieldKind::Bytes | FieldKind::Array | FieldKind::Table => None,
        }
    }

    /// 是否为可嵌套的容器类型。
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, FieldKind::Array | FieldKind::Table)
    }

    /// 按标签字节查找类型，`offset` 仅用于错误定位。
    pub(crate) fn from_tag_at(tag: u8, offset: usize) -> Result<Self, FieldTableError> {
        let kind = match tag {
            b't' => FieldKind::Boolean,
            b'b' => FieldKind::I8,
            b'B' => FieldKind::U8,
            b's' => FieldKind::I16,
            b'u' => FieldKind::U16,
            b'I' => FieldKind::I32,
            b'i' => FieldKind::U32,
            b'l' => FieldKind::I64,
            b'L' => FieldKind::U64,
            b'f' => FieldKind::F32,
            b'd' => FieldKind::F64,
            b'D' => FieldKind::Decimal,
            b'S' => FieldKind::Utf8,
            b'A' => FieldKind::Array,
            b'T' => FieldKind::Timestamp,
            b'F' => FieldKind::Table,
            b'V' => FieldKind::Void,
            b'x' => FieldKind::Bytes,
            _ => return Err(FieldTableError::UnknownKind { tag, offset }),
        };
        Ok(kind)
    }
}

impl TryFrom<u8> for FieldKind {
    type Error = FieldTableError;

    /// 校验调用方提供的原始标签；失败时 `offset` 记为 0。
    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag_at(tag, 0)
    }
}

impl From<FieldKind> for u8 {
    fn from(kind: FieldKind) -> Self {
        kind.tag()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Boolean => "boolean",
            FieldKind::I8 => "i8",
            FieldKind::U8 => "u8",
            FieldKind::I16 => "i16",
            FieldKind::U16 => "u16",
            FieldKind::I32 => "i32",
            FieldKind::U32 => "u32",
            FieldKind::I64 => "i64",
            FieldKind::U64 => "u64",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Decimal => "decimal",
            FieldKind::Utf8 => "utf8",
            FieldKind::Array => "array",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Table => "table",
            FieldKind::Void => "void",
            FieldKind::Bytes => "bytes",
        };
        write!(f, "{name}('{}')", self.tag() as char)
    }
}
