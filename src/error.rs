use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuckPanelError {
    #[error("Engine bootstrap failed: {0}")]
    EngineBootstrap(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("{} table(s) failed to bootstrap: {}", .0.len(), describe_table_errors(.0))]
    TableBootstrap(Vec<TableError>),

    #[error("Invalid table alias: '{0}'")]
    InvalidAlias(String),

    #[error("Query '{ref_id}' failed: {source}")]
    Query {
        ref_id: String,
        #[source]
        source: Box<DuckPanelError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Database handle poisoned")]
    Poisoned,
}

/// A single `DataFrameLink` that could not be turned into a table.
#[derive(Debug)]
pub struct TableError {
    pub alias: String,
    pub url: String,
    pub error: DuckPanelError,
}

fn describe_table_errors(errors: &[TableError]) -> String {
    errors
        .iter()
        .map(|e| format!("'{}' ({}): {}", e.alias, e.url, e.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DuckPanelError {
    pub fn query(ref_id: impl Into<String>, source: DuckPanelError) -> Self {
        Self::Query {
            ref_id: ref_id.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, DuckPanelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_bootstrap_message_lists_every_link() {
        let err = DuckPanelError::TableBootstrap(vec![
            TableError {
                alias: "prices".to_string(),
                url: "missing.csv".to_string(),
                error: DuckPanelError::Config("not found".to_string()),
            },
            TableError {
                alias: "bad alias".to_string(),
                url: "x.csv".to_string(),
                error: DuckPanelError::InvalidAlias("bad alias".to_string()),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("2 table(s) failed to bootstrap"));
        assert!(message.contains("'prices' (missing.csv)"));
        assert!(message.contains("Invalid table alias: 'bad alias'"));
    }

    #[test]
    fn test_query_error_keeps_ref_id() {
        let err = DuckPanelError::query("A", DuckPanelError::Config("boom".to_string()));
        assert_eq!(err.to_string(), "Query 'A' failed: Configuration error: boom");
    }
}
