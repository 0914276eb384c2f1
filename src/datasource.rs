use crate::config::DataSourceSettings;
use crate::engine::{ConnectionManager, RowSource};
use crate::error::{DuckPanelError, Result};
use crate::frame::ColumnSet;
use crate::query::{interpolate, Query, QueryRequest, TimeRange};
use crate::reshape::reshape;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: Vec<ColumnSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
}

pub struct DataSource<S = ConnectionManager> {
    source: S,
}

impl DataSource<ConnectionManager> {
    pub fn from_settings(settings: &DataSourceSettings) -> Self {
        Self::new(ConnectionManager::from_settings(settings))
    }
}

impl<S: RowSource> DataSource<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs every visible target in order; the first failure fails the request.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let range = request.range.as_ref();
        let results: Vec<(Vec<ColumnSet>, Vec<String>)> = stream::iter(&request.targets)
            .filter(|target| futures::future::ready(!target.hide))
            .then(|target| self.run_target(target, range))
            .try_collect()
            .await?;

        let mut response = QueryResponse::default();
        for (frames, warnings) in results {
            response.data.extend(frames);
            response.warnings.extend(warnings);
        }
        Ok(response)
    }

    async fn run_target(
        &self,
        target: &Query,
        range: Option<&TimeRange>,
    ) -> Result<(Vec<ColumnSet>, Vec<String>)> {
        if target.is_blank() {
            info!(ref_id = %target.ref_id, "Empty query text, running generator query");
        }
        let sql = interpolate(target.effective_text(), range);

        let rows = self
            .source
            .fetch_rows(&sql)
            .await
            .map_err(|e| DuckPanelError::query(&target.ref_id, e))?;
        let row_count = rows.len();

        let mode = target.reshape_mode();
        let reshaped = reshape(mode, &target.ref_id, rows);
        info!(
            ref_id = %target.ref_id,
            ?mode,
            rows = row_count,
            frames = reshaped.frames.len(),
            "Query complete"
        );

        let frames = reshaped
            .frames
            .into_iter()
            .map(|frame| frame.with_executed_query(sql.as_str()))
            .collect();
        Ok((frames, reshaped.warnings))
    }

    pub async fn test_datasource(&self) -> HealthCheck {
        match self.source.ping().await {
            Ok(()) => HealthCheck {
                status: HealthStatus::Success,
                message: "Success".to_string(),
            },
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthCheck {
                    status: HealthStatus::Error,
                    message: e.to_string(),
                }
            }
        }
    }
}
