use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use spark_codec_amqp::{FieldArray, FieldTable, FieldValue, TableEntry, decode_table};

/// 构造一张接近真实消息头的字段表：若干短字符串与整数，外加一层嵌套的 `x-death` 风格数组。
fn headers(entries: usize) -> FieldTable<'static> {
    let death = FieldTable::from(vec![
        TableEntry::new("count", FieldValue::I64(3)),
        TableEntry::new("queue", "orders.retry"),
        TableEntry::new("reason", "expired"),
    ]);
    let mut table: Vec<TableEntry<'static>> = (0..entries)
        .map(|n| {
            TableEntry::with_raw_key(
                format!("x-header-{n}").into_bytes(),
                FieldValue::I32(n as i32),
            )
        })
        .collect();
    table.push(TableEntry::new(
        "x-death",
        FieldArray::from(vec![FieldValue::Table(death)]),
    ));
    FieldTable::from(table)
}

/// 解码与编码的吞吐基准。
///
/// # 设计目的（Why）
/// - 对比少量条目（不触发扩容）与大量条目（多次翻倍扩容）两种形状，观察临时缓冲策略的开销；
/// - 编码基准每轮复用同一块输出缓冲，只衡量写入本身。
fn bench_field_table(c: &mut Criterion) {
    for entries in [8usize, 256] {
        let table = headers(entries);
        let wire = table.to_bytes().expect("benchmark table encodes");

        c.bench_function(&format!("decode_table/{entries}"), |b| {
            b.iter(|| decode_table(black_box(&wire), &mut 0).expect("valid wire"));
        });

        c.bench_function(&format!("encode_table/{entries}"), |b| {
            b.iter_batched_ref(
                || vec![0u8; table.encoded_len()],
                |buf| {
                    spark_codec_amqp::encode_table(buf, &mut 0, black_box(&table))
                        .expect("buffer sized by encoded_len")
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(codec_benches, bench_field_table);
criterion_main!(codec_benches);
