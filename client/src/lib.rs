//! # Media Server Client
//!
//! Typed handles over the control protocol of a media-processing server
//! (JSON-RPC 2.0 on a WebSocket).
//!
//! The object graph mirrors the server's: a [`MediaServerClient`] yields the
//! [`ServerHandle`] (the well-known manager object), which lists
//! [`PipelineHandle`]s, which list [`EndpointHandle`]s. Every remote
//! operation is an `invoke` on an object id; all handles share one
//! [`RpcTransport`], so tests can swap the WebSocket for a scripted
//! transport.

#[macro_use]
extern crate tracing;

pub mod error;
pub mod transport;
pub mod types;
pub mod ws;

pub use error::{
    ConnectError,
    QueryError,
};
pub use transport::RpcTransport;
pub use types::*;

use chrono::{
    DateTime,
    Utc,
};
use serde::de::DeserializeOwned;
use serde_json::{
    json,
    Value,
};
use std::{
    collections::BTreeMap,
    sync::Arc,
};
use url::Url;

const SERVER_MANAGER_ID: &str = "manager_ServerManager";

#[derive(Clone)]
pub struct MediaServerClient {
    transport: Arc<dyn RpcTransport>,
}

impl MediaServerClient {
    /// Establish the WebSocket session. This is the only fallible step that
    /// aborts a run; everything later degrades per call.
    pub async fn connect(url: &Url) -> Result<Self, ConnectError> {
        let transport = ws::WsTransport::connect(url).await?;
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Build a client over an already-established transport.
    pub fn from_transport(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Resolve the server manager, the root of the remote object graph.
    pub async fn server_manager(&self) -> Result<ServerHandle, QueryError> {
        self.transport
            .call("describe", json!({ "object": SERVER_MANAGER_ID }))
            .await?;
        debug!(object = SERVER_MANAGER_ID, "server manager resolved");
        Ok(ServerHandle {
            inner: ObjectRef {
                transport: self.transport.clone(),
                id: SERVER_MANAGER_ID.to_string(),
            },
        })
    }
}

/// A reference to one remote object; all operations go through `invoke`.
#[derive(Clone)]
struct ObjectRef {
    transport: Arc<dyn RpcTransport>,
    id: String,
}

impl ObjectRef {
    fn child(&self, id: String) -> ObjectRef {
        ObjectRef {
            transport: self.transport.clone(),
            id,
        }
    }

    async fn invoke(&self, operation: &str, operation_params: Value) -> Result<Value, QueryError> {
        let result = self
            .transport
            .call(
                "invoke",
                json!({
                    "object": self.id,
                    "operation": operation,
                    "operationParams": operation_params,
                }),
            )
            .await?;
        // Void operations answer without a value member.
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    fn decode<T: DeserializeOwned>(&self, operation: &str, value: Value) -> Result<T, QueryError> {
        serde_json::from_value(value).map_err(|e| QueryError::Malformed {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    async fn creation_time(&self) -> Result<DateTime<Utc>, QueryError> {
        let value = self.invoke("getCreationTime", json!({})).await?;
        let seconds: i64 = self.decode("getCreationTime", value)?;
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| QueryError::Malformed {
            operation: "getCreationTime".to_string(),
            reason: format!("timestamp {seconds} out of range"),
        })
    }
}

#[derive(Clone)]
pub struct ServerHandle {
    inner: ObjectRef,
}

impl ServerHandle {
    pub async fn get_info(&self) -> Result<ServerInfo, QueryError> {
        let value = self.inner.invoke("getInfo", json!({})).await?;
        self.inner.decode("getInfo", value)
    }

    pub async fn get_pipelines(&self) -> Result<Vec<PipelineHandle>, QueryError> {
        let value = self.inner.invoke("getPipelines", json!({})).await?;
        let ids: Vec<String> = self.inner.decode("getPipelines", value)?;
        Ok(ids
            .into_iter()
            .map(|id| PipelineHandle {
                inner: self.inner.child(id),
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PipelineHandle {
    inner: ObjectRef,
}

impl PipelineHandle {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Enable or disable latency instrumentation on the pipeline. The one
    /// write this client performs.
    pub async fn set_latency_stats(&self, enabled: bool) -> Result<(), QueryError> {
        self.inner
            .invoke("setLatencyStats", json!({ "latencyStats": enabled }))
            .await?;
        Ok(())
    }

    pub async fn get_creation_time(&self) -> Result<DateTime<Utc>, QueryError> {
        self.inner.creation_time().await
    }

    pub async fn get_children(&self) -> Result<Vec<EndpointHandle>, QueryError> {
        let value = self.inner.invoke("getChildren", json!({})).await?;
        let ids: Vec<String> = self.inner.decode("getChildren", value)?;
        Ok(ids
            .into_iter()
            .map(|id| EndpointHandle {
                inner: self.inner.child(id),
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct EndpointHandle {
    inner: ObjectRef,
}

impl EndpointHandle {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub async fn get_creation_time(&self) -> Result<DateTime<Utc>, QueryError> {
        self.inner.creation_time().await
    }

    pub async fn is_flowing_in(&self, media: MediaType) -> Result<bool, QueryError> {
        let value = self
            .inner
            .invoke("isMediaFlowingIn", json!({ "mediaType": media.to_string() }))
            .await?;
        self.inner.decode("isMediaFlowingIn", value)
    }

    pub async fn is_flowing_out(&self, media: MediaType) -> Result<bool, QueryError> {
        let value = self
            .inner
            .invoke("isMediaFlowingOut", json!({ "mediaType": media.to_string() }))
            .await?;
        self.inner.decode("isMediaFlowingOut", value)
    }

    /// Raw statistics records for one media type, in the server's stat-id
    /// order.
    pub async fn get_stats(&self, media: MediaType) -> Result<Vec<StatRecord>, QueryError> {
        let value = self
            .inner
            .invoke("getStats", json!({ "mediaType": media.to_string() }))
            .await?;
        let records: BTreeMap<String, StatRecord> = self.inner.decode("getStats", value)?;
        Ok(records.into_values().collect())
    }

    pub async fn get_connection_state(&self) -> Result<ConnectionState, QueryError> {
        let value = self.inner.invoke("getConnectionState", json!({})).await?;
        let raw: String = self.inner.decode("getConnectionState", value)?;
        Ok(ConnectionState::from_wire(&raw))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::CallFuture;
    use std::sync::Mutex;

    /// Records every call and answers from a queue of canned results.
    struct Scripted {
        calls: Mutex<Vec<(String, Value)>>,
        responses: Mutex<Vec<Result<Value, QueryError>>>,
    }

    impl Scripted {
        fn answering(responses: Vec<Result<Value, QueryError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(responses),
            })
        }

        fn call_at(&self, index: usize) -> (String, Value) {
            self.calls.lock().unwrap()[index].clone()
        }
    }

    impl RpcTransport for Scripted {
        fn call(&self, method: &str, params: Value) -> CallFuture<'_> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            let response = self.responses.lock().unwrap().remove(0);
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn server_manager_describes_the_well_known_object() {
        let transport = Scripted::answering(vec![Ok(json!({ "sessionId": "s-1" }))]);
        let client = MediaServerClient::from_transport(transport.clone());

        client.server_manager().await.unwrap();

        let (method, params) = transport.call_at(0);
        assert_eq!(method, "describe");
        assert_eq!(params["object"], "manager_ServerManager");
    }

    #[tokio::test]
    async fn get_pipelines_builds_handles_from_ids() {
        let transport = Scripted::answering(vec![
            Ok(json!({})),
            Ok(json!({ "value": ["p1", "p2"] })),
        ]);
        let client = MediaServerClient::from_transport(transport.clone());

        let manager = client.server_manager().await.unwrap();
        let pipelines = manager.get_pipelines().await.unwrap();

        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[0].id(), "p1");
        let (method, params) = transport.call_at(1);
        assert_eq!(method, "invoke");
        assert_eq!(params["object"], "manager_ServerManager");
        assert_eq!(params["operation"], "getPipelines");
    }

    #[tokio::test]
    async fn flow_queries_carry_the_media_type() {
        let transport = Scripted::answering(vec![Ok(json!({ "value": true }))]);
        let endpoint = EndpointHandle {
            inner: ObjectRef {
                transport: transport.clone(),
                id: "ep1".to_string(),
            },
        };

        assert!(endpoint.is_flowing_in(MediaType::Audio).await.unwrap());
        let (_, params) = transport.call_at(0);
        assert_eq!(params["operation"], "isMediaFlowingIn");
        assert_eq!(params["operationParams"]["mediaType"], "AUDIO");
    }

    #[tokio::test]
    async fn get_stats_collects_record_values() {
        let transport = Scripted::answering(vec![Ok(json!({
            "value": {
                "ep1_audio_a": { "type": "inboundrtp", "bytesReceived": 100, "packetsReceived": 50 },
                "ep1_audio_b": { "type": "endpoint" }
            }
        }))]);
        let endpoint = EndpointHandle {
            inner: ObjectRef {
                transport,
                id: "ep1".to_string(),
            },
        };

        let records = endpoint.get_stats(MediaType::Audio).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, StatKind::InboundRtp);
        assert_eq!(records[1].kind, StatKind::Other);
    }

    #[tokio::test]
    async fn decode_failures_surface_as_malformed() {
        let transport = Scripted::answering(vec![Ok(json!({ "value": "not-a-number" }))]);
        let pipeline = PipelineHandle {
            inner: ObjectRef {
                transport,
                id: "p1".to_string(),
            },
        };

        match pipeline.get_creation_time().await {
            Err(QueryError::Malformed { operation, .. }) => assert_eq!(operation, "getCreationTime"),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }
}
