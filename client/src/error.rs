use tokio_tungstenite::tungstenite;
use url::Url;

/// Failure to establish the WebSocket session with the media server.
///
/// This is the only fatal error the client produces; everything after the
/// handshake is a per-call [`QueryError`].
#[derive(thiserror::Error, Debug)]
#[error("could not reach media server at {url}: {source}")]
pub struct ConnectError {
    pub url: Url,
    #[source]
    pub source: tungstenite::Error,
}

/// A single remote call failed. Callers decide whether the owning
/// pipeline or endpoint degrades or the run aborts.
#[derive(thiserror::Error, Debug, Clone)]
pub enum QueryError {
    #[error("media server rejected {operation}: {message} (code {code})")]
    Rpc {
        operation: String,
        code: i64,
        message: String,
    },
    #[error("malformed response for {operation}: {reason}")]
    Malformed { operation: String, reason: String },
    #[error("connection to the media server was lost: {0}")]
    ConnectionLost(String),
}
