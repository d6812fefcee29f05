//! Call router: local calls stay in-process, remote calls are batched per
//! address.

use relaylogic_domain::rpc::{ResolvedCall, RpcFrame};
use relaylogic_domain::settings::BrightnessPresets;

/// Calls bound for one remote address, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBatch {
    pub address: String,
    pub calls: Vec<ResolvedCall>,
}

impl RemoteBatch {
    /// Wire frames with 1-based ids, resolved against the night flag.
    #[must_use]
    pub fn frames(&self, night: bool, presets: &BrightnessPresets) -> Vec<RpcFrame> {
        (1..)
            .zip(&self.calls)
            .map(|(id, call)| RpcFrame {
                id,
                method: call.method,
                params: call.materialize(night, presets),
            })
            .collect()
    }
}

/// Output of [`CallRouter::route`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedCalls {
    pub local: Vec<ResolvedCall>,
    /// One batch per address, ordered by first appearance.
    pub remote: Vec<RemoteBatch>,
}

impl RoutedCalls {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }

    /// Number of dispatcher submissions one firing costs.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.local.len() + self.remote.len()
    }
}

/// Partitions resolved calls by where they run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallRouter;

impl CallRouter {
    /// Split `calls` into direct calls on `owner` and per-address batches.
    #[must_use]
    pub fn route(calls: Vec<ResolvedCall>, owner: &str) -> RoutedCalls {
        let mut routed = RoutedCalls::default();
        for call in calls {
            if call.device == owner {
                routed.local.push(call);
                continue;
            }
            match routed
                .remote
                .iter_mut()
                .find(|batch| batch.address == call.address)
            {
                Some(batch) => batch.calls.push(call),
                None => routed.remote.push(RemoteBatch {
                    address: call.address.clone(),
                    calls: vec![call],
                }),
            }
        }
        routed
    }
}
