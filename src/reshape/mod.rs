mod raw;
mod series;

pub use raw::reshape_raw;
pub use series::{
    reshape_to_series, SeriesReshape, SkippedRows, SEGMENT_FIELD, TARGET_FIELD, TIMESTAMP_FIELD,
};

use crate::frame::{ColumnSet, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReshapeMode {
    /// One field per result column.
    Raw,
    /// One frame per `segment` value.
    #[default]
    Pivot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub frames: Vec<ColumnSet>,
    pub warnings: Vec<String>,
}

pub fn reshape(mode: ReshapeMode, ref_id: &str, rows: Vec<Row>) -> Reshaped {
    match mode {
        ReshapeMode::Raw => Reshaped {
            frames: vec![reshape_raw(ref_id, rows)],
            warnings: Vec::new(),
        },
        ReshapeMode::Pivot => {
            let SeriesReshape { frames, skipped } = reshape_to_series(ref_id, rows);
            Reshaped {
                frames,
                warnings: skipped
                    .iter()
                    .map(|s| format!("{}: {}", ref_id, s))
                    .collect(),
            }
        }
    }
}
