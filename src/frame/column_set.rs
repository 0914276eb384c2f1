use super::scalar::Scalar;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Number,
    String,
    Boolean,
}

impl FieldType {
    pub fn infer(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(FieldType::Boolean),
            Scalar::Int(_) | Scalar::Float(_) => Some(FieldType::Number),
            Scalar::Text(_) => Some(FieldType::String),
            Scalar::Timestamp(_) => Some(FieldType::Time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    pub values: Vec<Scalar>,
}

impl Field {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            values,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_query_string: Option<String>,
}

/// The unit handed to a panel: named value sequences for one query or segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSet {
    pub ref_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl ColumnSet {
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            name: None,
            fields: Vec::new(),
            meta: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_executed_query(mut self, sql: impl Into<String>) -> Self {
        self.meta
            .get_or_insert_with(FrameMeta::default)
            .executed_query_string = Some(sql.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Length of the longest field. Raw-mode fields may differ in length.
    pub fn row_count(&self) -> usize {
        self.fields.iter().map(Field::len).max().unwrap_or(0)
    }
}
