mod convert;
mod manager;
mod tables;

pub use manager::{ConnectionManager, Database};
pub use tables::{create_table_sql, validate_alias};

use crate::error::Result;
use crate::frame::Row;
use async_trait::async_trait;

/// Where query rows come from.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>>;

    /// Opens and closes a connection.
    async fn ping(&self) -> Result<()>;
}
