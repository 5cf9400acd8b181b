//! 消息头的构造、编码、解码与规范排序演示。
//!
//! 运行：`RUST_LOG=spark_codec_amqp=trace cargo run --example headers`，
//! 可以看到每个容器解码完成时的 trace 事件，以及故意截断输入后的 debug 事件。

use spark_codec_amqp::{
    FieldArray, FieldTable, FieldTableError, FieldValue, TableEntry, decode_table,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), FieldTableError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let properties = FieldTable::from(vec![
        TableEntry::new("publisher_confirms", true),
        TableEntry::new("consumer_cancel_notify", true),
    ]);
    let headers = FieldTable::from(vec![
        TableEntry::new("x-priority", FieldValue::U8(5)),
        TableEntry::new("content-origin", "billing"),
        TableEntry::new(
            "x-tags",
            FieldArray::from(vec![FieldValue::utf8("urgent"), FieldValue::utf8("eu")]),
        ),
        TableEntry::new("capabilities", properties),
        TableEntry::new("x-retry", FieldValue::Void),
    ]);

    let wire = headers.to_bytes()?;
    info!(bytes = wire.len(), entries = headers.len(), "headers encoded");

    let mut offset = 0;
    let decoded = decode_table(&wire, &mut offset)?;
    info!(offset, "headers decoded");

    for entry in decoded.sorted_by_key().iter() {
        let key = String::from_utf8_lossy(&entry.key);
        info!(%key, kind = %entry.value.kind(), "entry");
    }

    if let Some(origin) = decoded.get("content-origin").and_then(FieldValue::as_str) {
        info!(origin, "lookup");
    }

    let truncated = &wire[..wire.len() - 1];
    if let Err(error) = decode_table(truncated, &mut 0) {
        info!(%error, kind = ?error.kind(), "truncated input rejected");
    }

    Ok(())
}
