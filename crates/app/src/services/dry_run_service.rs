//! Dry-run service: compile one device and replay input events against it
//! on the host runtime, over a real or fake peer network.

use std::sync::Arc;
use std::time::Duration;

use relaylogic_domain::error::RelayLogicError;
use relaylogic_domain::event::ReplayStep;
use relaylogic_domain::settings::CompileSettings;

use crate::compiler::Compiler;
use crate::ports::{Clock, FactSource, RpcTransport};
use crate::runtime::{ControllerRuntime, RuntimeStats};

/// Application service for one dry run.
pub struct DryRunService<F, T, K> {
    facts: F,
    transport: Arc<T>,
    clock: K,
    settings: CompileSettings,
}

impl<F, T, K> DryRunService<F, T, K>
where
    F: FactSource,
    T: RpcTransport,
    K: Clock,
{
    pub fn new(facts: F, transport: Arc<T>, clock: K, settings: CompileSettings) -> Self {
        Self {
            facts,
            transport,
            clock,
            settings,
        }
    }

    /// Replay `steps` against the program of `device`.
    ///
    /// After the last step the runtime is given one call timeout plus one
    /// drain interval to finish its calls; debounce timers still pending at
    /// that point are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the facts cannot be loaded, the device does not
    /// compile, or the runtime stops before the replay ends.
    #[tracing::instrument(skip(self, steps), fields(steps = steps.len()))]
    pub async fn run(
        self,
        device: &str,
        steps: Vec<ReplayStep>,
    ) -> Result<RuntimeStats, RelayLogicError> {
        let registry = self.facts.load_devices().await?;
        let rules = self.facts.load_rules().await?;
        let compiler = Compiler::new(registry, rules, self.settings.clone())?;
        let program = compiler.build_program(device)?;
        tracing::info!(blocks = program.blocks.len(), "program built");

        let grace = self.settings.dispatch.call_timeout() + self.settings.dispatch.drain_interval();
        let (handle, join) =
            ControllerRuntime::spawn(program, self.settings, self.transport, self.clock);
        for step in steps {
            tokio::time::sleep(Duration::from_millis(step.after_ms)).await;
            tracing::debug!(component = %step.event.component, event = %step.event.event, "replaying");
            handle.input(step.event)?;
        }
        tokio::time::sleep(grace).await;
        drop(handle);

        let stats = join.await.map_err(|_| RelayLogicError::RuntimeStopped)?;
        tracing::info!(?stats, "dry run finished");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Mutex;

    use relaylogic_domain::brightness::BrightnessSpec;
    use relaylogic_domain::device::{Device, DeviceKind, DeviceRegistry};
    use relaylogic_domain::error::{CallError, ConfigError};
    use relaylogic_domain::event::InputEvent;
    use relaylogic_domain::rpc::OutboundCall;
    use relaylogic_domain::rule::{Action, Rule, RuleSet, TriggerCase};

    use super::*;
    use crate::ports::clock::FixedClock;

    struct InMemoryFacts {
        devices: Vec<Device>,
        rules: Vec<Rule>,
    }

    impl FactSource for InMemoryFacts {
        fn load_devices(
            &self,
        ) -> impl Future<Output = Result<DeviceRegistry, RelayLogicError>> + Send {
            let result = DeviceRegistry::from_devices(self.devices.clone()).map_err(Into::into);
            async { result }
        }

        fn load_rules(&self) -> impl Future<Output = Result<RuleSet, RelayLogicError>> + Send {
            let result = RuleSet::new(self.rules.clone());
            async { Ok(result) }
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<OutboundCall>>,
    }

    impl RpcTransport for RecordingTransport {
        fn send(
            &self,
            call: &OutboundCall,
        ) -> impl Future<Output = Result<serde_json::Value, CallError>> + Send {
            self.calls.lock().unwrap().push(call.clone());
            async { Ok(serde_json::Value::Null) }
        }
    }

    fn facts() -> InMemoryFacts {
        InMemoryFacts {
            devices: vec![
                Device::builder()
                    .name("D1")
                    .address("10.0.0.11")
                    .kind(DeviceKind::Dimmer)
                    .input(0, "Hall switch")
                    .output(0, "Hall")
                    .build()
                    .unwrap(),
                Device::builder()
                    .name("R1")
                    .address("10.0.0.51")
                    .kind(DeviceKind::Relay)
                    .output(0, "Porch")
                    .build()
                    .unwrap(),
            ],
            rules: vec![Rule {
                device: "D1".to_string(),
                input: 0,
                actions: vec![TriggerCase::new(
                    "single_push",
                    vec![
                        Action::new("D1", 0, BrightnessSpec::On),
                        Action::new("R1", 0, BrightnessSpec::On),
                    ],
                )],
            }],
        }
    }

    fn push(after_ms: u64) -> ReplayStep {
        ReplayStep {
            after_ms,
            event: InputEvent::named(0, "single_push"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_send_every_call_of_replayed_events() {
        let transport = Arc::new(RecordingTransport::default());
        let service = DryRunService::new(
            facts(),
            Arc::clone(&transport),
            FixedClock(12),
            CompileSettings::default(),
        );

        let stats = service
            .run("D1", vec![push(0), push(500), ReplayStep {
                after_ms: 0,
                event: InputEvent::named(0, "long_push"),
            }])
            .await
            .unwrap();

        assert_eq!(stats.dispatched, 4);
        assert_eq!(stats.succeeded, 4);
        let calls = transport.calls.lock().unwrap();
        assert!(calls.iter().any(|call| call.address() == "10.0.0.51"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_when_device_is_unknown() {
        let service = DryRunService::new(
            facts(),
            Arc::new(RecordingTransport::default()),
            FixedClock(12),
            CompileSettings::default(),
        );

        let err = service.run("Ghost", vec![push(0)]).await.unwrap_err();

        assert!(matches!(
            err,
            RelayLogicError::Config(ConfigError::UnknownDevice { device }) if device == "Ghost"
        ));
    }
}
