#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # spark-codec-amqp
//!
//! ## 教案目的（Why）
//! - **定位**：AMQP 0-9-1 字段表（field table）与字段数组（field array）的二进制编解码，承载消息头与连接属性等任意类型化元数据。
//! - **架构角色**：协议客户端中唯一处理递归数据、变长变体编码并直接面对不可信网络输入的部分；帧组装、连接/信道状态机等在其上层。
//! - **设计策略**：以和类型表达带标签的值，解码借用输入缓冲，容器在临时缓冲中增长、成功后物化为精确长度的不可变序列。
//!
//! ## 交互契约（What）
//! - **输入**：任意 `&[u8]` 加偏移量；解码结果的生命周期与输入绑定，可用 `into_owned` 脱离；
//! - **输出**：`decode_*` 返回 [`FieldTable`]/[`FieldArray`]/[`FieldValue`]；`encode_*` 写入 `&mut [u8]`，
//!   或经 [`encode_table_to_bytes`] 得到 [`bytes::Bytes`]；
//! - **往返性质**：`decode(encode(x)) == x`；对规范输入（布尔值为 0/1）`encode(decode(buf)) == buf`，条目顺序与类型标签原样保留。
//!
//! ## 实现策略（How）
//! - `cursor`：带边界检查的大端标量读写，所有越界读取都报告截断；
//! - `decode`/`encode`：表、数组、值三者互递归，共享一个深度计数器，超过 [`DecodeOptions::max_depth`] 即失败；
//! - `compare`：表键字典序，供需要规范顺序的调用方使用，编解码本身从不排序。
//!
//! ## 风险提示（Trade-offs）
//! - **严格长度**：默认要求容器恰好结束于声明长度；与不规范的对端互通时可切换 [`LengthPolicy::Lenient`]；
//! - **UTF-8**：`Utf8` 与 `Bytes` 线上布局相同，本层不做 UTF-8 校验，[`FieldValue::as_str`] 按需校验。
//!
//! ```
//! use spark_codec_amqp::{FieldTable, FieldValue, TableEntry, decode_table};
//!
//! let table = FieldTable::from(vec![TableEntry::new("x", true)]);
//! let wire = table.to_bytes()?;
//! assert_eq!(&wire[..], &[0, 0, 0, 4, 1, b'x', b't', 1]);
//!
//! let mut offset = 0;
//! let decoded = decode_table(&wire, &mut offset)?;
//! assert_eq!(decoded.get("x"), Some(&FieldValue::Boolean(true)));
//! assert_eq!(offset, wire.len());
//! # Ok::<(), spark_codec_amqp::FieldTableError>(())
//! ```

extern crate alloc;

mod compare;
mod cursor;
mod decode;
mod encode;
mod error;
mod kind;
mod options;
mod value;

pub use crate::{
    compare::{compare_entries, compare_keys},
    cursor::{ReadCursor, WriteCursor},
    decode::{
        INITIAL_SCRATCH_CAPACITY, decode_array, decode_array_with, decode_table,
        decode_table_with, decode_value, decode_value_with,
    },
    encode::{
        MAX_KEY_LEN, encode_array, encode_array_to_bytes, encode_array_to_bytes_with,
        encode_array_with, encode_table, encode_table_to_bytes, encode_table_to_bytes_with,
        encode_table_with, encode_value, encode_value_with,
    },
    error::{Container, ErrorKind, FieldTableError},
    kind::FieldKind,
    options::{DEFAULT_MAX_DEPTH, DecodeOptions, EncodeOptions, LengthPolicy},
    value::{Decimal, FieldArray, FieldTable, FieldValue, TableEntry},
};
