use crate::collectors::endpoint::{
    bounded,
    CollectOptions,
};
use chrono::{
    DateTime,
    Utc,
};
use futures::future::join_all;
use pipeline_monitor_client::{
    EndpointHandle,
    QueryError,
    ServerHandle,
};
use tracing::{
    debug,
    warn,
};

/// One discovered pipeline with its children and the results of the
/// pipeline-level setup wave.
pub struct PipelineRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub latency_stats_enabled: bool,
    /// More than one child element usually means a player is attached.
    pub has_player: bool,
    pub endpoints: Vec<EndpointHandle>,
}

/// Everything discovered in one pass. The run-wide endpoint total lives
/// here, accumulated once at discovery, so later stages never re-count.
pub struct Inventory {
    pub pipelines: Vec<PipelineRecord>,
    pub endpoints_total: usize,
}

/// List pipelines and their children. The pipeline listing itself failing
/// is the only hard error; per-pipeline setup and child listing degrade
/// with a warning.
pub async fn discover(server: &ServerHandle, options: &CollectOptions) -> Result<Inventory, QueryError> {
    let pipelines = server.get_pipelines().await?;
    debug!(count = pipelines.len(), "pipelines listed");

    // First wave: latency instrumentation and creation time for every
    // pipeline, joined before any endpoint work starts.
    let setup = join_all(pipelines.iter().map(|pipeline| async move {
        let (latency, created_at) = tokio::join!(
            bounded(options.query_timeout, pipeline.set_latency_stats(true)),
            bounded(options.query_timeout, pipeline.get_creation_time()),
        );
        let latency_stats_enabled = match latency {
            Ok(()) => true,
            Err(e) => {
                warn!(pipeline = pipeline.id(), "could not enable latency instrumentation: {e}");
                false
            }
        };
        let created_at = match created_at {
            Ok(timestamp) => Some(timestamp),
            Err(e) => {
                warn!(pipeline = pipeline.id(), "creation time unavailable: {e}");
                None
            }
        };
        (latency_stats_enabled, created_at)
    }))
    .await;

    // Child listing, all pipelines concurrently. A failed listing degrades
    // that pipeline to zero endpoints.
    let children = join_all(pipelines.iter().map(|pipeline| async move {
        match bounded(options.query_timeout, pipeline.get_children()).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(pipeline = pipeline.id(), "child listing failed: {e}");
                Vec::new()
            }
        }
    }))
    .await;

    let mut endpoints_total = 0;
    let records = pipelines
        .iter()
        .zip(setup)
        .zip(children)
        .map(|((pipeline, (latency_stats_enabled, created_at)), endpoints)| {
            endpoints_total += endpoints.len();
            PipelineRecord {
                id: pipeline.id().to_string(),
                created_at,
                latency_stats_enabled,
                has_player: endpoints.len() > 1,
                endpoints,
            }
        })
        .collect();

    Ok(Inventory {
        pipelines: records,
        endpoints_total,
    })
}
