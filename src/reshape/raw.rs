use crate::frame::{ColumnSet, Field, FieldType, Row};
use std::collections::HashMap;

/// One field per distinct column name, in first-seen order across `rows`.
///
/// Rows that lack a column contribute nothing to that column's values, so
/// fields of a heterogeneous result may differ in length.
pub fn reshape_raw(ref_id: &str, rows: Vec<Row>) -> ColumnSet {
    let capacity = rows.len();
    let mut fields: Vec<Field> = Vec::new();
    let mut field_index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        for (name, value) in row {
            let idx = match field_index.get(&name) {
                Some(&i) => i,
                None => {
                    fields.push(Field::new(name.clone(), Vec::with_capacity(capacity)));
                    field_index.insert(name, fields.len() - 1);
                    fields.len() - 1
                }
            };

            let field = &mut fields[idx];
            if field.field_type.is_none() {
                field.field_type = FieldType::infer(&value);
            }
            field.values.push(value);
        }
    }

    ColumnSet {
        fields,
        ..ColumnSet::new(ref_id)
    }
}
