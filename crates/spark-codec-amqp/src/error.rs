//! 字段表编解码错误类型定义。
//!
//! # 教案定位（Why）
//! - 字段表直接暴露在不可信的网络输入之下，调用方需要区分“内存不足”“编码非法”“长度损坏”“嵌套过深”，
//!   以便决定是关闭连接还是仅丢弃当前帧；
//! - 与 `decode`/`encode` 模块解耦，保持解析流程只关心字节处理。
//!
//! # 使用契约（What）
//! - [`FieldTableError`] 携带定位信息（偏移、声明长度等），便于排障；
//! - [`FieldTableError::kind`] 将细分变体折叠为 [`ErrorKind`]，调用方通常只需对其分派；
//! - 所有变体均实现 `Clone`/`PartialEq`，测试可直接断言具体错误。

use core::fmt;

use thiserror::Error;

/// 发生长度不一致的容器类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// 字段表。
    Table,
    /// 字段数组。
    Array,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Table => f.write_str("table"),
            Container::Array => f.write_str("array"),
        }
    }
}

/// 粗粒度错误分类，对应调用方可采取的处置策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 临时缓冲或最终序列分配失败。
    OutOfMemory,
    /// 类型标签未知，或手工构造的值无法按协议表达（键过长、负载超过 `u32`）。
    InvalidEncoding,
    /// 输入被截断或长度字段与实际内容不符。
    Malformed,
    /// 嵌套深度超过配置上限。
    DepthExceeded,
    /// 编码目标缓冲不足。
    BufferTooSmall,
}

/// 字段表编解码过程中可能出现的错误。
///
/// ## 契约定义（What）
/// - 任一错误都表示本次调用整体失败：调用方的偏移量保持不变，不会得到部分结果；
/// - 解码路径上的错误通常意味着整帧不可用，协议客户端应据此中止该帧的解析。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldTableError {
    /// 临时缓冲扩容或最终序列物化时分配失败。
    #[error("allocation of {requested} entries failed")]
    OutOfMemory {
        /// 请求的条目数。
        requested: usize,
    },
    /// 遇到未登记的类型标签。
    #[error("unknown field kind tag 0x{tag:02x} at offset {offset}")]
    UnknownKind {
        /// 读到的标签字节。
        tag: u8,
        /// 标签所在偏移。
        offset: usize,
    },
    /// 表键超过 255 字节，无法用 1 字节长度表达。
    #[error("table key of {len} bytes exceeds 255")]
    KeyTooLong {
        /// 键的实际长度。
        len: usize,
    },
    /// 字符串、字节串或容器负载超过 `u32::MAX` 字节。
    #[error("payload of {len} bytes exceeds the 32-bit length field")]
    PayloadTooLong {
        /// 负载实际长度。
        len: usize,
    },
    /// 读取越过输入末尾。
    #[error("truncated input: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// 读取起点。
        offset: usize,
        /// 需要的字节数。
        needed: usize,
        /// 起点之后实际剩余的字节数。
        available: usize,
    },
    /// 容器内容与声明长度不一致（严格模式）。
    #[error("{container} declared {declared} bytes but its entries span {consumed}")]
    LengthMismatch {
        /// 出错的容器类型。
        container: Container,
        /// 长度字段声明的字节数。
        declared: usize,
        /// 条目实际占用的字节数。
        consumed: usize,
    },
    /// 嵌套深度超过上限。
    #[error("nesting depth exceeds configured limit {limit}")]
    DepthExceeded {
        /// 配置的最大深度。
        limit: u16,
    },
    /// 编码输出缓冲空间不足。
    #[error("output buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall {
        /// 需要写入的字节数。
        needed: usize,
        /// 剩余可写字节数。
        available: usize,
    },
}

impl FieldTableError {
    /// 返回错误所属的粗粒度分类。
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::UnknownKind { .. } | Self::KeyTooLong { .. } | Self::PayloadTooLong { .. } => {
                ErrorKind::InvalidEncoding
            }
            Self::Truncated { .. } | Self::LengthMismatch { .. } => ErrorKind::Malformed,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
        }
    }
}
