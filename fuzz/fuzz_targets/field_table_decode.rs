#![no_main]

use core::num::NonZeroU16;

use libfuzzer_sys::fuzz_target;
use spark_codec_amqp::{
    DecodeOptions, EncodeOptions, LengthPolicy, decode_table_with, encode_table_to_bytes_with,
};

/// 首字节选择解码配置，其余字节作为字段表输入。
///
/// # 教案式注解
/// - **意图 (Why)**：字段表是协议客户端中唯一直接解析不可信递归数据的部分，任何 panic、越界或栈溢出都是缺陷；
/// - **策略 (How)**：
///   1. 低位决定长度策略，高位映射为 1..=128 的深度上限，让两种策略与浅/深上限都被覆盖；
///   2. 解码成功后以相同深度上限再编码，再解码，要求结构相等；布尔值可能非规范，因此不比较字节；
/// - **契约 (What)**：失败时偏移量必须保持为 0；成功时偏移量不超过输入长度。
fn options_from(selector: u8) -> DecodeOptions {
    let policy = if selector & 1 == 0 {
        LengthPolicy::Strict
    } else {
        LengthPolicy::Lenient
    };
    let depth = NonZeroU16::new(u16::from(selector >> 1) + 1).unwrap_or(NonZeroU16::MIN);
    DecodeOptions::new()
        .with_length_policy(policy)
        .with_max_depth(depth)
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, wire)) = data.split_first() else {
        return;
    };
    let options = options_from(selector);

    let mut offset = 0;
    match decode_table_with(wire, &mut offset, &options) {
        Ok(table) => {
            assert!(offset <= wire.len());
            let encode = EncodeOptions::new().with_max_depth(options.max_depth());
            let encoded = encode_table_to_bytes_with(&table, &encode)
                .expect("decoded tables re-encode under the same depth limit");
            let strict = DecodeOptions::new().with_max_depth(options.max_depth());
            let again = decode_table_with(&encoded, &mut 0, &strict)
                .expect("encoder output is well formed");
            assert_eq!(again, table);
        }
        Err(_) => assert_eq!(offset, 0),
    }
});
