use chrono::{
    DateTime,
    Utc,
};
use pipeline_monitor_client::{
    ConnectionState,
    EndpointHandle,
    MediaType,
    QueryError,
    StatRecord,
};
use std::{
    future::Future,
    time::Duration,
};
use tracing::debug;

/// Transport protocol an endpoint speaks, read off its identifier. Server
/// object ids embed the element class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Protocol {
    #[strum(serialize = "rtp")]
    Rtp,
    #[strum(serialize = "webrtc")]
    WebRtc,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl Protocol {
    pub fn from_endpoint_id(id: &str) -> Self {
        if id.contains("RtpEndpoint") {
            Protocol::Rtp
        } else if id.contains("WebRtcEndpoint") {
            Protocol::WebRtc
        } else {
            Protocol::Unknown
        }
    }
}

/// What one media type of an endpoint looked like at collection time.
#[derive(Debug, Clone, Default)]
pub struct ChannelSnapshot {
    pub flowing_in: bool,
    pub flowing_out: bool,
    /// Raw stat records; empty when deep stats are disabled.
    pub stats: Vec<StatRecord>,
}

#[derive(Debug, Clone)]
pub struct EndpointSnapshot {
    pub id: String,
    pub protocol: Protocol,
    pub created_at: DateTime<Utc>,
    pub state: ConnectionState,
    pub audio: ChannelSnapshot,
    pub video: ChannelSnapshot,
}

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("query timed out")]
    Timeout,
}

/// An endpoint whose query group did not fully complete. Surfaced as a
/// count in the report, never as a run failure.
#[derive(thiserror::Error, Debug)]
#[error("endpoint {id} left incomplete: {source}")]
pub struct IncompleteEndpoint {
    pub id: String,
    #[source]
    pub source: CollectError,
}

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub deep_stats: bool,
    pub query_timeout: Duration,
}

/// Bound one remote query by the configured timeout. An expired timer
/// counts as the query failing; the run itself never stalls on one
/// unresponsive element.
pub(crate) async fn bounded<T>(
    limit: Duration,
    query: impl Future<Output = Result<T, QueryError>>,
) -> Result<T, CollectError> {
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(CollectError::from),
        Err(_) => Err(CollectError::Timeout),
    }
}

/// Issue the endpoint's queries concurrently and join on the whole group:
/// creation time, flowing-in and flowing-out per media type, raw stats per
/// media type, connection state. Any failure leaves this endpoint
/// incomplete; the caller keeps going with the rest.
pub async fn collect(endpoint: &EndpointHandle, options: &CollectOptions) -> Result<EndpointSnapshot, IncompleteEndpoint> {
    let limit = options.query_timeout;
    let stats = |media: MediaType| async move {
        if options.deep_stats {
            bounded(limit, endpoint.get_stats(media)).await
        } else {
            Ok(Vec::new())
        }
    };

    let (created_at, in_audio, in_video, out_audio, out_video, stats_audio, stats_video, state) = tokio::join!(
        bounded(limit, endpoint.get_creation_time()),
        bounded(limit, endpoint.is_flowing_in(MediaType::Audio)),
        bounded(limit, endpoint.is_flowing_in(MediaType::Video)),
        bounded(limit, endpoint.is_flowing_out(MediaType::Audio)),
        bounded(limit, endpoint.is_flowing_out(MediaType::Video)),
        stats(MediaType::Audio),
        stats(MediaType::Video),
        bounded(limit, endpoint.get_connection_state()),
    );

    let id = endpoint.id().to_string();
    let snapshot = EndpointSnapshot {
        protocol: Protocol::from_endpoint_id(&id),
        created_at: created_at.map_err(|source| fail(&id, source))?,
        state: state.map_err(|source| fail(&id, source))?,
        audio: ChannelSnapshot {
            flowing_in: in_audio.map_err(|source| fail(&id, source))?,
            flowing_out: out_audio.map_err(|source| fail(&id, source))?,
            stats: stats_audio.map_err(|source| fail(&id, source))?,
        },
        video: ChannelSnapshot {
            flowing_in: in_video.map_err(|source| fail(&id, source))?,
            flowing_out: out_video.map_err(|source| fail(&id, source))?,
            stats: stats_video.map_err(|source| fail(&id, source))?,
        },
        id,
    };

    if snapshot.state == ConnectionState::Disconnected {
        debug!(endpoint = %snapshot.id, "endpoint reports disconnected transport");
    }
    debug!(
        endpoint = %snapshot.id,
        protocol = %snapshot.protocol,
        created_at = %snapshot.created_at,
        "endpoint snapshot complete"
    );
    Ok(snapshot)
}

fn fail(id: &str, source: CollectError) -> IncompleteEndpoint {
    IncompleteEndpoint {
        id: id.to_string(),
        source,
    }
}
