use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ORDINAL: &str = "ordinal";
pub const SOURCE_ID: &str = "source_id";
pub const TEXT: &str = "text";
pub const SEQUENCE_INDEX: &str = "sequence_index";
pub const CHAR_OFFSET: &str = "char_offset";
pub const EMBEDDING: &str = "embedding";

/// Row layout of an index table with `dim`-wide embeddings.
///
/// `ordinal` is the insertion position and breaks score ties at query time.
pub fn chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ORDINAL, DataType::Int64, false),
        Field::new(SOURCE_ID, DataType::Utf8, false),
        Field::new(TEXT, DataType::Utf8, false),
        Field::new(SEQUENCE_INDEX, DataType::Int32, false),
        Field::new(CHAR_OFFSET, DataType::Int64, false),
        Field::new(EMBEDDING, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}

/// Embedding width declared by a table schema.
pub fn embedding_dim(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(EMBEDDING).ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}
