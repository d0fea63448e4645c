use crate::error::QueryError;
use serde_json::Value;
use std::{
    future::Future,
    pin::Pin,
};

pub type CallFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, QueryError>> + Send + 'a>>;

/// A single JSON-RPC exchange with the media server.
///
/// The typed handles in this crate are written against this seam so that
/// tests can script responses without a socket. The production
/// implementation is [`crate::ws::WsTransport`].
pub trait RpcTransport: Send + Sync {
    /// Issue `method` with `params` and resolve to the response's `result`
    /// member.
    fn call(&self, method: &str, params: Value) -> CallFuture<'_>;
}
