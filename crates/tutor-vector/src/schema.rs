use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const POSITION_COL: &str = "position";
pub const ID_COL: &str = "id";
pub const AREA_COL: &str = "learning_area";
pub const LEVEL_COL: &str = "level";
pub const TEXT_COL: &str = "text";
pub const VECTOR_COL: &str = "vector";
pub const DISTANCE_COL: &str = "_distance";

/// One row per corpus chunk; `position` is the chunk's offset in the corpus store.
pub fn build_index_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(POSITION_COL, DataType::Int64, false),
		Field::new(ID_COL, DataType::Utf8, false),
		Field::new(AREA_COL, DataType::Utf8, false),
		Field::new(LEVEL_COL, DataType::Utf8, false),
		Field::new(TEXT_COL, DataType::Utf8, false),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Vector width recorded in a table schema.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COL).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
