pub mod config;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod frame;
pub mod query;
pub mod reshape;

pub use config::{DataFrameLink, DataSourceSettings, EngineConfig};
pub use datasource::{DataSource, HealthCheck, HealthStatus, QueryResponse};
pub use engine::{create_table_sql, validate_alias, ConnectionManager, Database, RowSource};
pub use error::{DuckPanelError, Result, TableError};
pub use frame::{ColumnSet, Field, FieldType, FrameMeta, Row, Scalar};
pub use query::{interpolate, Query, QueryRequest, TimeRange, DEFAULT_QUERY};
pub use reshape::{
    reshape, reshape_raw, reshape_to_series, ReshapeMode, Reshaped, SeriesReshape, SkippedRows,
};
