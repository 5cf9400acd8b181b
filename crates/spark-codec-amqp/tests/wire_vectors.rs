//! 字段表线上格式的固定向量回归。
//!
//! # 教案式说明
//! - **Why**：以手写字节序列锁定线上布局（标签字节、长度前缀、回填位置），任何编码漂移都会在这里暴露；
//! - **How**：每个用例同时验证“字节 → 结构”与“结构 → 字节”两个方向；
//! - **What**：向量均为规范输入，因此要求解码后再编码得到完全相同的字节。

use std::borrow::Cow;

use spark_codec_amqp::{
    Decimal, FieldArray, FieldKind, FieldTable, FieldValue, INITIAL_SCRATCH_CAPACITY, TableEntry,
    decode_array, decode_table, decode_value, encode_table, encode_table_to_bytes,
};

fn reencode(table: &FieldTable<'_>) -> Vec<u8> {
    encode_table_to_bytes(table).unwrap().to_vec()
}

#[test]
fn single_boolean_entry() {
    let wire = [0, 0, 0, 4, 1, b'x', b't', 1];
    let mut offset = 0;
    let table = decode_table(&wire, &mut offset).unwrap();

    assert_eq!(offset, wire.len());
    assert_eq!(table.len(), 1);
    let entry = &table.as_slice()[0];
    assert_eq!(entry.key.as_ref(), b"x");
    assert_eq!(entry.value, FieldValue::Boolean(true));

    assert_eq!(reencode(&table), wire);
    assert_eq!(
        reencode(&FieldTable::from(vec![TableEntry::new("x", true)])),
        wire
    );
}

#[test]
fn empty_containers_are_four_zero_bytes() {
    let wire = [0u8, 0, 0, 0];

    let table = decode_table(&wire, &mut 0).unwrap();
    assert!(table.is_empty());
    assert_eq!(reencode(&table), wire);

    let array = decode_array(&wire, &mut 0).unwrap();
    assert!(array.is_empty());
    assert_eq!(array.to_bytes().unwrap().as_ref(), &wire);
}

#[test]
fn decoding_starts_at_the_given_offset() {
    let wire = [0xaa, 0xbb, 0, 0, 0, 3, b'u', 0x01, 0x02];
    let mut offset = 2;
    let array = decode_array(&wire, &mut offset).unwrap();
    assert_eq!(offset, wire.len());
    assert_eq!(array.as_slice(), &[FieldValue::U16(0x0102)]);
}

#[test]
fn encoding_starts_at_the_given_offset() {
    let table = FieldTable::from(vec![TableEntry::new("n", FieldValue::I32(-1))]);
    let mut buf = [0x55u8; 16];
    let mut offset = 3;
    encode_table(&mut buf, &mut offset, &table).unwrap();

    assert_eq!(offset, 3 + table.encoded_len());
    assert_eq!(&buf[..3], &[0x55; 3]);
    assert_eq!(
        &buf[3..offset],
        &[0, 0, 0, 7, 1, b'n', b'I', 0xff, 0xff, 0xff, 0xff]
    );
}

#[test]
fn duplicate_keys_and_order_survive() {
    let wire = [
        0, 0, 0, 14, //
        1, b'b', b'B', 1, //
        1, b'a', b'B', 2, //
        1, b'b', b'V', //
        1, b'a', b'V', //
    ];
    let table = decode_table(&wire, &mut 0).unwrap();
    let keys: Vec<&[u8]> = table.iter().map(|entry| entry.key.as_ref()).collect();
    assert_eq!(keys, [&b"b"[..], b"a", b"b", b"a"]);
    assert_eq!(table.get("b"), Some(&FieldValue::U8(1)));
    assert_eq!(reencode(&table), wire);
}

#[test]
fn table_holding_array_holding_table() {
    let wire = [
        0, 0, 0, 19, // 外层表
        4, b'l', b'i', b's', b't', b'A', //
        0, 0, 0, 9, // 数组
        b'F', 0, 0, 0, 4, // 内层表
        1, b'k', b'b', 0x80,
    ];
    let table = decode_table(&wire, &mut 0).unwrap();

    let array = table.get("list").and_then(FieldValue::as_array).unwrap();
    assert_eq!(array.len(), 1);
    let inner = array.get(0).and_then(FieldValue::as_table).unwrap();
    assert_eq!(inner.get("k"), Some(&FieldValue::I8(-128)));

    assert_eq!(reencode(&table), wire);
}

#[test]
fn every_kind_round_trips_inside_an_array() {
    let nested = FieldTable::from(vec![TableEntry::new("inner", "text")]);
    let values = vec![
        FieldValue::Boolean(false),
        FieldValue::I8(i8::MIN),
        FieldValue::U8(u8::MAX),
        FieldValue::I16(i16::MIN),
        FieldValue::U16(u16::MAX),
        FieldValue::I32(i32::MIN),
        FieldValue::U32(u32::MAX),
        FieldValue::I64(i64::MIN),
        FieldValue::U64(u64::MAX),
        FieldValue::F32(f32::NAN),
        FieldValue::F64(f64::NEG_INFINITY),
        FieldValue::Decimal(Decimal::new(255, u32::MAX)),
        FieldValue::Utf8(Cow::Owned("héllo".as_bytes().to_vec())),
        FieldValue::Array(FieldArray::new()),
        FieldValue::Timestamp(1_700_000_000),
        FieldValue::Table(nested),
        FieldValue::Void,
        FieldValue::bytes(&[0, 1, 2, 0xff]),
    ];
    let kinds: Vec<FieldKind> = values.iter().map(FieldValue::kind).collect();
    assert_eq!(kinds, FieldKind::ALL);

    let array = FieldArray::from(values);
    let wire = array.to_bytes().unwrap();
    assert_eq!(wire.len(), array.encoded_len());

    let decoded = decode_array(&wire, &mut 0).unwrap();
    assert_eq!(decoded, array);
    assert_eq!(decoded.to_bytes().unwrap(), wire);
}

#[test]
fn growth_path_preserves_count_and_order() {
    fn build(count: usize) -> FieldTable<'static> {
        (0..count)
            .map(|n| {
                TableEntry::with_raw_key(format!("k{n:03}").into_bytes(), FieldValue::U32(n as u32))
            })
            .collect()
    }

    for count in [
        INITIAL_SCRATCH_CAPACITY - 1,
        INITIAL_SCRATCH_CAPACITY,
        INITIAL_SCRATCH_CAPACITY + 1,
        INITIAL_SCRATCH_CAPACITY * 4 + 3,
    ] {
        let table = build(count);
        let wire = table.to_bytes().unwrap();
        let decoded = decode_table(&wire, &mut 0).unwrap();

        assert_eq!(decoded.len(), count);
        for (n, entry) in decoded.iter().enumerate() {
            assert_eq!(entry.key.as_ref(), format!("k{n:03}").as_bytes());
            assert_eq!(entry.value, FieldValue::U32(n as u32));
        }
        assert_eq!(decoded, table);
    }
}

#[test]
fn non_canonical_boolean_normalizes_to_one() {
    let wire = [b't', 0x7f];
    let value = decode_value(&wire, &mut 0).unwrap();
    assert_eq!(value, FieldValue::Boolean(true));

    let table = FieldTable::from(vec![TableEntry::new("b", value)]);
    assert_eq!(reencode(&table)[7], 1);
}

#[test]
fn decoded_tree_can_outlive_its_buffer() {
    let owned: FieldTable<'static> = {
        let wire = vec![0, 0, 0, 9, 1, b's', b'S', 0, 0, 0, 2, b'o', b'k'];
        decode_table(&wire, &mut 0).unwrap().into_owned()
    };
    assert_eq!(owned.get("s").and_then(FieldValue::as_str), Some("ok"));
}
