//! 表键的字典序比较。
//!
//! 逐字节比较公共前缀，前缀相同则较短的键在前；等价于把短键视为以低于任何字节的值补齐。
//! 编解码从不调用本模块，它只服务于需要规范顺序的调用方。

use core::cmp::Ordering;

use crate::value::TableEntry;

/// 比较两个原始键。
#[must_use]
pub fn compare_keys(a: &[u8], b: &[u8]) -> Ordering {
    let shared = a.len().min(b.len());
    match a[..shared].cmp(&b[..shared]) {
        Ordering::Equal => a.len().cmp(&b.len()),
        decided => decided,
    }
}

/// 仅按键比较两个条目，与值及条目在表中的位置无关。
#[must_use]
pub fn compare_entries(a: &TableEntry<'_>, b: &TableEntry<'_>) -> Ordering {
    compare_keys(&a.key, &b.key)
}
