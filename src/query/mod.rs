mod macros;

pub use macros::interpolate;

use crate::reshape::ReshapeMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generator used when a query arrives without text: 100 daily points
/// alternating between the `btc` and `eth` segments.
pub const DEFAULT_QUERY: &str = "select
timestamp '2020-01-01' + to_days(n::int) as timestamp,
case when n % 2 = 0 then 'btc' else 'eth' end as segment,
random() * 100 as target
from generate_series(1, 100) tbl(n)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub ref_id: String,
    #[serde(default)]
    pub query_text: String,
    /// Long-format rows that should be pivoted per segment. Unset means pivot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<bool>,
    #[serde(default)]
    pub hide: bool,
}

impl Query {
    pub fn new(ref_id: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_text: query_text.into(),
            ..Default::default()
        }
    }

    pub fn with_long(mut self, long: bool) -> Self {
        self.long = Some(long);
        self
    }

    pub fn is_blank(&self) -> bool {
        self.query_text.trim().is_empty()
    }

    /// The text to execute: the user's SQL, or the generator when blank.
    pub fn effective_text(&self) -> &str {
        if self.is_blank() {
            DEFAULT_QUERY
        } else {
            &self.query_text
        }
    }

    pub fn reshape_mode(&self) -> ReshapeMode {
        match self.long {
            Some(false) => ReshapeMode::Raw,
            _ => ReshapeMode::Pivot,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub targets: Vec<Query>,
    #[serde(default)]
    pub range: Option<TimeRange>,
}

impl QueryRequest {
    pub fn new(targets: Vec<Query>) -> Self {
        Self {
            targets,
            range: None,
        }
    }

    pub fn with_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.range = Some(TimeRange { from, to });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_uses_generator() {
        assert_eq!(Query::new("A", "").effective_text(), DEFAULT_QUERY);
        assert_eq!(Query::new("A", "  \n ").effective_text(), DEFAULT_QUERY);
        assert_eq!(Query::new("A", "SELECT 1").effective_text(), "SELECT 1");
    }

    #[test]
    fn test_reshape_mode_from_long_flag() {
        assert_eq!(Query::new("A", "").reshape_mode(), ReshapeMode::Pivot);
        assert_eq!(Query::new("A", "").with_long(true).reshape_mode(), ReshapeMode::Pivot);
        assert_eq!(Query::new("A", "").with_long(false).reshape_mode(), ReshapeMode::Raw);
    }

    #[test]
    fn test_deserialize_host_request() {
        let json = r#"{
            "targets": [
                { "refId": "A", "queryText": "SELECT 1", "long": false },
                { "refId": "B" }
            ],
            "range": { "from": "2024-01-01T00:00:00Z", "to": "2024-01-02T00:00:00Z" }
        }"#;

        let request: QueryRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.targets.len(), 2);
        assert_eq!(request.targets[0].long, Some(false));
        assert!(request.targets[1].is_blank());
        assert!(!request.targets[1].hide);
        let range = request.range.unwrap();
        assert!(range.from < range.to);
    }
}
