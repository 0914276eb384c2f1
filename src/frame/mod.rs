mod column_set;
mod row;
mod scalar;

pub use column_set::{ColumnSet, Field, FieldType, FrameMeta};
pub use row::Row;
pub use scalar::Scalar;
