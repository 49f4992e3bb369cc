use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use ragdb_core::types::ChunkMetadata;

/// Chunk table: id, text, one nullable column per metadata field, embedding.
pub fn build_chunk_schema(dim: usize) -> Arc<Schema> {
    let mut fields = vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
    ];
    fields.extend(ChunkMetadata::FIELD_NAMES.iter().map(|name| Field::new(*name, DataType::Utf8, true)));
    fields.push(Field::new(
        "vector",
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32),
        true,
    ));
    Arc::new(Schema::new(fields))
}

/// Columns read back on `get`/`query`; the vector itself is never returned.
pub fn projected_columns() -> Vec<&'static str> {
    let mut cols = vec!["id", "text"];
    cols.extend(ChunkMetadata::FIELD_NAMES);
    cols
}
