use std::time::Duration;
use url::Url;

/// Well-known local control endpoint of the media server.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8888/kurento";

/// Run configuration, assembled from CLI arguments. One value per run;
/// nothing is read from disk.
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket address of the media server's control endpoint.
    pub server_url: Url,
    /// Collect per-endpoint stat records (loss and jitter detail). Disabled,
    /// the probe only reports structural counts, which keeps the query load
    /// at O(pipelines) instead of O(endpoints) remote calls.
    pub deep_stats: bool,
    /// Upper bound for each individual remote query.
    pub query_timeout: Duration,
    /// Optional path for a JSON export of the report.
    pub output_file: Option<String>,
}
