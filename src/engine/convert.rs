use crate::error::Result;
use crate::frame::{Row, Scalar};
use chrono::DateTime;
use duckdb::types::ValueRef;
use duckdb::Connection;

const SECONDS_PER_DAY: i64 = 86_400;

pub(crate) fn scalar_from_value_ref(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Boolean(b) => Scalar::Bool(b),
        ValueRef::TinyInt(i) => Scalar::Int(i as i64),
        ValueRef::SmallInt(i) => Scalar::Int(i as i64),
        ValueRef::Int(i) => Scalar::Int(i as i64),
        ValueRef::BigInt(i) => Scalar::Int(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(i as f64)),
        ValueRef::UTinyInt(i) => Scalar::Int(i as i64),
        ValueRef::USmallInt(i) => Scalar::Int(i as i64),
        ValueRef::UInt(i) => Scalar::Int(i as i64),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(i as f64)),
        ValueRef::Float(f) => Scalar::Float(f as f64),
        ValueRef::Double(f) => Scalar::Float(f),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or(Scalar::Text(text))
        }
        ValueRef::Text(s) => Scalar::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Scalar::Text(String::from_utf8_lossy(b).into_owned()),
        ValueRef::Date32(days) => DateTime::from_timestamp(days as i64 * SECONDS_PER_DAY, 0)
            .map(Scalar::Timestamp)
            .unwrap_or(Scalar::Null),
        ValueRef::Timestamp(unit, value) => DateTime::from_timestamp_micros(unit.to_micros(value))
            .map(Scalar::Timestamp)
            .unwrap_or(Scalar::Null),
        other => Scalar::Text(format!("{:?}", other)),
    }
}

/// Runs one statement and collects every result row.
pub(crate) fn fetch_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    let mut columns: Option<Vec<String>> = None;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let names = columns.get_or_insert_with(|| row.as_ref().column_names());
        let mut record = Row::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            record.insert(name.clone(), scalar_from_value_ref(row.get_ref(i)?));
        }
        records.push(record);
    }

    Ok(records)
}
