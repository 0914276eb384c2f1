use crate::frame::{ColumnSet, Field, FieldType, Row, Scalar};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const SEGMENT_FIELD: &str = "segment";
pub const TARGET_FIELD: &str = "target";

const REQUIRED_FIELDS: [&str; 3] = [TIMESTAMP_FIELD, SEGMENT_FIELD, TARGET_FIELD];

/// Rows left out of pivoting because they lacked the same required columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRows {
    pub missing: Vec<&'static str>,
    pub count: usize,
    pub first_row: usize,
}

impl fmt::Display for SkippedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row(s) missing {} (first at row {})",
            self.count,
            self.missing.join(", "),
            self.first_row
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReshape {
    pub frames: Vec<ColumnSet>,
    pub skipped: Vec<SkippedRows>,
}

struct SeriesGroup {
    name: String,
    timestamps: Vec<Scalar>,
    targets: Vec<Scalar>,
}

/// Pivots `timestamp`/`segment`/`target` rows into one frame per segment.
///
/// Segments are keyed by their display text, so `1` and `'1'` share a
/// frame. They appear in first-seen order and each keeps its rows in input
/// order. Rows missing any of the three columns are skipped and reported
/// once per distinct set of missing columns; present-but-null values are kept.
pub fn reshape_to_series(ref_id: &str, rows: Vec<Row>) -> SeriesReshape {
    let mut groups: Vec<SeriesGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut skipped: Vec<SkippedRows> = Vec::new();

    for (row_index, row) in rows.into_iter().enumerate() {
        let (timestamp, segment, target) = match (
            row.get(TIMESTAMP_FIELD),
            row.get(SEGMENT_FIELD),
            row.get(TARGET_FIELD),
        ) {
            (Some(timestamp), Some(segment), Some(target)) => (timestamp, segment, target),
            _ => {
                let missing: Vec<&'static str> = REQUIRED_FIELDS
                    .iter()
                    .copied()
                    .filter(|name| !row.contains(name))
                    .collect();
                match skipped.iter_mut().find(|s| s.missing == missing) {
                    Some(entry) => entry.count += 1,
                    None => skipped.push(SkippedRows {
                        missing,
                        count: 1,
                        first_row: row_index,
                    }),
                }
                continue;
            }
        };

        let name = segment.to_string();
        let idx = match group_index.get(&name) {
            Some(&i) => i,
            None => {
                groups.push(SeriesGroup {
                    name: name.clone(),
                    timestamps: Vec::new(),
                    targets: Vec::new(),
                });
                group_index.insert(name, groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.timestamps.push(timestamp.clone());
        group.targets.push(target.clone());
    }

    for entry in &skipped {
        warn!(
            ref_id,
            missing = ?entry.missing,
            count = entry.count,
            first_row = entry.first_row,
            "Skipping rows without series columns"
        );
    }

    let frames = groups
        .into_iter()
        .map(|group| {
            ColumnSet::new(ref_id)
                .with_name(group.name.clone())
                .with_field(Field::new(TIMESTAMP_FIELD, group.timestamps).with_type(FieldType::Time))
                .with_field(Field::new(group.name, group.targets).with_type(FieldType::Number))
        })
        .collect();

    SeriesReshape { frames, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(segment: &str, timestamp: &str, target: i64) -> Row {
        let mut row = Row::new();
        row.insert(SEGMENT_FIELD, segment);
        row.insert(TIMESTAMP_FIELD, timestamp);
        row.insert(TARGET_FIELD, target);
        row
    }

    #[test]
    fn test_btc_eth_scenario() {
        let rows = vec![
            point("btc", "2020-01-01", 10),
            point("eth", "2020-01-01", 20),
            point("btc", "2020-01-02", 12),
        ];

        let result = reshape_to_series("A", rows);

        assert!(result.skipped.is_empty());
        assert_eq!(result.frames.len(), 2);

        let btc = &result.frames[0];
        assert_eq!(btc.ref_id, "A");
        assert_eq!(btc.name.as_deref(), Some("btc"));
        assert_eq!(btc.fields[0].name, "timestamp");
        assert_eq!(btc.fields[0].field_type, Some(FieldType::Time));
        assert_eq!(
            btc.fields[0].values,
            vec![Scalar::from("2020-01-01"), Scalar::from("2020-01-02")]
        );
        assert_eq!(btc.fields[1].name, "btc");
        assert_eq!(btc.fields[1].field_type, Some(FieldType::Number));
        assert_eq!(btc.fields[1].values, vec![Scalar::Int(10), Scalar::Int(12)]);

        let eth = &result.frames[1];
        assert_eq!(eth.name.as_deref(), Some("eth"));
        assert_eq!(eth.fields[0].values, vec![Scalar::from("2020-01-01")]);
        assert_eq!(eth.fields[1].values, vec![Scalar::Int(20)]);
    }

    #[test]
    fn test_one_frame_per_segment_and_all_rows_accounted() {
        let rows: Vec<Row> = (0..30)
            .map(|i| point(["a", "b", "c"][i % 3], "2020-01-01", i as i64))
            .collect();

        let result = reshape_to_series("A", rows);

        assert_eq!(result.frames.len(), 3);
        let total: usize = result.frames.iter().map(|f| f.fields[0].len()).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn test_row_missing_columns_is_skipped() {
        let mut partial = Row::new();
        partial.insert(SEGMENT_FIELD, "btc");
        partial.insert("value", 3i64);

        let rows = vec![point("btc", "2020-01-01", 1), partial, point("btc", "2020-01-03", 2)];

        let result = reshape_to_series("A", rows);

        assert_eq!(result.frames.len(), 1);
        assert_eq!(result.frames[0].fields[1].values, vec![Scalar::Int(1), Scalar::Int(2)]);
        assert_eq!(
            result.skipped,
            vec![SkippedRows {
                missing: vec![TIMESTAMP_FIELD, TARGET_FIELD],
                count: 1,
                first_row: 1,
            }]
        );
        assert_eq!(
            result.skipped[0].to_string(),
            "1 row(s) missing timestamp, target (first at row 1)"
        );
    }

    #[test]
    fn test_skipped_rows_collapse_per_missing_set() {
        let mut rows: Vec<Row> = (0..1000)
            .map(|i| [("id", Scalar::Int(i))].into_iter().collect())
            .collect();
        let no_target: Row = point("btc", "2020-01-01", 0)
            .into_iter()
            .filter(|(name, _)| name != TARGET_FIELD)
            .collect();
        rows.insert(3, no_target);

        let result = reshape_to_series("A", rows);

        assert!(result.frames.is_empty());
        assert_eq!(
            result.skipped,
            vec![
                SkippedRows {
                    missing: vec![TIMESTAMP_FIELD, SEGMENT_FIELD, TARGET_FIELD],
                    count: 1000,
                    first_row: 0,
                },
                SkippedRows {
                    missing: vec![TARGET_FIELD],
                    count: 1,
                    first_row: 3,
                },
            ]
        );
    }

    #[test]
    fn test_null_values_are_kept() {
        let mut row = point("btc", "2020-01-01", 0);
        row.insert(TARGET_FIELD, Scalar::Null);

        let result = reshape_to_series("A", vec![row]);

        assert!(result.skipped.is_empty());
        assert_eq!(result.frames[0].fields[1].values, vec![Scalar::Null]);
    }

    #[test]
    fn test_segments_keyed_by_display_text() {
        let mut numeric = Row::new();
        numeric.insert(SEGMENT_FIELD, 1i64);
        numeric.insert(TIMESTAMP_FIELD, "t");
        numeric.insert(TARGET_FIELD, 1i64);

        let mut null_segment = point("x", "t", 3);
        null_segment.insert(SEGMENT_FIELD, Scalar::Null);

        let rows = vec![numeric.clone(), point("1", "t", 2), null_segment, point("null", "t", 4)];

        let result = reshape_to_series("A", rows);

        let names: Vec<&str> = result.frames.iter().filter_map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec!["1", "null"]);
        assert_eq!(result.frames[0].fields[1].values, vec![Scalar::Int(1), Scalar::Int(2)]);
        assert_eq!(result.frames[1].fields[1].values, vec![Scalar::Int(3), Scalar::Int(4)]);
    }
}
