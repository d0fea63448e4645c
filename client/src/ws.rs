//! JSON-RPC 2.0 over a WebSocket, the protocol media servers speak.
//!
//! One request/response exchange per [`RpcTransport::call`]. Responses are
//! matched to callers by request id; the server-assigned session id is
//! captured from the first response and attached to every later request.

use crate::{
    error::{
        ConnectError,
        QueryError,
    },
    transport::{
        CallFuture,
        RpcTransport,
    },
};
use futures::{
    SinkExt,
    StreamExt,
};
use serde::Deserialize;
use serde_json::{
    json,
    Value,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
};
use tokio::sync::{
    mpsc,
    oneshot,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
};
use url::Url;

type ResponseSender = oneshot::Sender<Result<Value, QueryError>>;
type Pending = Arc<Mutex<HashMap<u64, (String, ResponseSender)>>>;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

pub struct WsTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Pending,
    session: Arc<Mutex<Option<String>>>,
    next_id: AtomicU64,
}

impl WsTransport {
    pub async fn connect(url: &Url) -> Result<Self, ConnectError> {
        let (stream, _response) = connect_async(url.as_str()).await.map_err(|source| ConnectError {
            url: url.clone(),
            source,
        })?;
        debug!(%url, "websocket connected");

        let (mut sink, mut stream) = stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let session = Arc::new(Mutex::new(None));

        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    error!("error sending request: {e}");
                    break;
                }
            }
            debug!("send task completed");
        });

        let recv_pending = pending.clone();
        let recv_session = session.clone();
        tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Text(text)) => dispatch(&recv_pending, &recv_session, text.as_str()),
                    Ok(Message::Close(_)) => {
                        debug!("server closed the connection");
                        break;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(other) => {
                        trace!(?other, "ignoring non-text frame");
                    }
                    Err(e) => {
                        error!("error receiving response: {e}");
                        break;
                    }
                }
            }
            // The socket is gone; fail whatever is still waiting so callers
            // resolve instead of hanging until their timeout.
            let drained: Vec<_> = lock(&recv_pending).drain().collect();
            for (_, (operation, tx)) in drained {
                let _ = tx.send(Err(QueryError::ConnectionLost(format!(
                    "socket closed before {operation} completed"
                ))));
            }
            debug!("receive task completed");
        });

        Ok(Self {
            outgoing,
            pending,
            session,
            next_id: AtomicU64::new(1),
        })
    }
}

impl RpcTransport for WsTransport {
    fn call(&self, method: &str, params: Value) -> CallFuture<'_> {
        let method = method.to_owned();
        let mut params = params;
        Box::pin(async move {
            // Error messages name the remote operation where there is one;
            // plain methods (describe) are their own label.
            let operation = params
                .get("operation")
                .and_then(Value::as_str)
                .unwrap_or(method.as_str())
                .to_owned();

            if let Some(session) = lock(&self.session).clone() {
                if let Value::Object(map) = &mut params {
                    map.insert("sessionId".to_string(), Value::String(session));
                }
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let request = json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            });

            let (tx, rx) = oneshot::channel();
            lock(&self.pending).insert(id, (operation.clone(), tx));

            if self.outgoing.send(Message::Text(request.to_string().into())).is_err() {
                lock(&self.pending).remove(&id);
                return Err(QueryError::ConnectionLost(format!(
                    "send task gone before {operation} was written"
                )));
            }
            trace!(id, %operation, "request sent");

            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(QueryError::ConnectionLost(format!("no response for {operation}"))),
            }
        })
    }
}

fn dispatch(pending: &Pending, session: &Arc<Mutex<Option<String>>>, text: &str) {
    let response: RpcResponse = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            warn!("undecodable frame from server: {e}");
            return;
        }
    };

    let Some(id) = response.id else {
        // Server-initiated notifications (onEvent) carry no id.
        trace!("ignoring server notification");
        return;
    };

    if let Some(session_id) = response
        .result
        .as_ref()
        .and_then(|result| result.get("sessionId"))
        .and_then(Value::as_str)
    {
        *lock(session) = Some(session_id.to_string());
    }

    let Some((operation, tx)) = lock(pending).remove(&id) else {
        trace!(id, "response for unknown request id");
        return;
    };

    let outcome = match (response.result, response.error) {
        (_, Some(error)) => Err(QueryError::Rpc {
            operation,
            code: error.code,
            message: error.message,
        }),
        (Some(result), None) => Ok(result),
        (None, None) => Err(QueryError::Malformed {
            operation,
            reason: "response carried neither result nor error".to_string(),
        }),
    };
    let _ = tx.send(outcome);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
