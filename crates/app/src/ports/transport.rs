//! Transport port: delivers outbound calls to peer controllers.

use std::future::Future;

use relaylogic_domain::error::CallError;
use relaylogic_domain::rpc::OutboundCall;

/// Sends one direct or batched call and returns the peer's JSON answer.
///
/// Implementations must not retry; the runtime applies its own timeout on
/// top of whatever the transport does.
pub trait RpcTransport: Send + Sync + 'static {
    fn send(
        &self,
        call: &OutboundCall,
    ) -> impl Future<Output = Result<serde_json::Value, CallError>> + Send;
}
