use crate::{
    collectors::{
        endpoint::{
            self,
            CollectOptions,
        },
        inventory,
    },
    config::Config,
    metrics::{
        aggregate::{
            aggregate,
            AggregateReport,
            PipelineObservation,
        },
        classify::classify,
    },
};
use futures::future::join_all;
use pipeline_monitor_client::{
    MediaServerClient,
    QueryError,
    ServerHandle,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Drives one run: discovery, concurrent endpoint collection across every
/// pipeline, classification, aggregation.
pub struct Monitor {
    server: ServerHandle,
    config: Config,
}

impl Monitor {
    /// Resolve the server manager and confirm the server answers.
    pub async fn new(client: &MediaServerClient, config: Config) -> Result<Self, QueryError> {
        let server = client.server_manager().await?;
        let info = server.get_info().await?;
        info!(version = %info.version, "connected to media server");
        Ok(Self { server, config })
    }

    pub async fn collect(&self) -> Result<AggregateReport, QueryError> {
        let options = CollectOptions {
            deep_stats: self.config.deep_stats,
            query_timeout: self.config.query_timeout,
        };

        let inventory = inventory::discover(&self.server, &options).await?;
        info!(
            pipelines = inventory.pipelines.len(),
            endpoints = inventory.endpoints_total,
            "inventory discovered"
        );
        for pipeline in &inventory.pipelines {
            debug!(
                pipeline = %pipeline.id,
                created_at = ?pipeline.created_at,
                has_player = pipeline.has_player,
                latency_stats = pipeline.latency_stats_enabled,
                children = pipeline.endpoints.len(),
                "pipeline discovered"
            );
        }

        // Second wave: every endpoint of every pipeline at once. Each
        // endpoint's query group joins independently; one endpoint failing
        // costs that endpoint, not the report.
        let observations = join_all(inventory.pipelines.iter().map(|pipeline| async move {
            let results = join_all(
                pipeline
                    .endpoints
                    .iter()
                    .map(|endpoint| endpoint::collect(endpoint, &options)),
            )
            .await;

            let mut endpoints = Vec::with_capacity(results.len());
            let mut incomplete = 0u32;
            for result in results {
                match result {
                    Ok(snapshot) => endpoints.push(classify(&snapshot, options.deep_stats)),
                    Err(e) => {
                        warn!("{e}");
                        incomplete += 1;
                    }
                }
            }
            PipelineObservation { endpoints, incomplete }
        }))
        .await;

        Ok(aggregate(&observations, inventory.endpoints_total, self.config.deep_stats))
    }
}
