//! reqwest implementation of [`RpcTransport`].

use std::future::Future;
use std::time::Duration;

use relaylogic_app::ports::RpcTransport;
use relaylogic_domain::error::CallError;
use relaylogic_domain::rpc::OutboundCall;

use crate::error::{TransportError, call_error};

/// Delivers calls to peer controllers over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpRpcTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRpcTransport {
    /// Build a transport whose every request times out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("relaylogic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client, timeout })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, call: &OutboundCall) -> reqwest::RequestBuilder {
        match call {
            OutboundCall::Direct { params, .. } => {
                self.client.get(call.url()).query(&params.query_pairs())
            }
            OutboundCall::Batch { frames, .. } => self.client.post(call.url()).json(frames),
        }
    }
}

impl RpcTransport for HttpRpcTransport {
    fn send(
        &self,
        call: &OutboundCall,
    ) -> impl Future<Output = Result<serde_json::Value, CallError>> + Send {
        let request = self.request(call);
        let timeout = self.timeout;
        let label = call.to_string();
        async move {
            let response = request
                .send()
                .await
                .map_err(|err| call_error(&err, timeout))?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!(call = %label, %status, "peer rejected call");
                return Err(CallError::Status(status.as_u16()));
            }
            let body = response
                .bytes()
                .await
                .map_err(|err| call_error(&err, timeout))?;
            if body.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_slice(&body)
                .map_err(|err| CallError::Network(format!("invalid response body: {err}")))
        }
    }
}
