//! Controller runtime: executes a compiled [`Program`] on one event loop.
//!
//! A single tokio task owns the [`CallDispatcher`] and the
//! [`MotionDebouncer`]. Input events, call completions, drain ticks and
//! debounce expiries all arrive on one channel and are handled one at a
//! time, so neither state machine needs a lock. Outbound calls and timers
//! run on spawned tasks that report back through a weak sender; once every
//! [`ControllerHandle`] is dropped the loop winds down.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use relaylogic_domain::error::{CallError, RelayLogicError};
use relaylogic_domain::event::InputEvent;
use relaylogic_domain::rpc::OutboundCall;
use relaylogic_domain::settings::CompileSettings;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use super::debouncer::{MotionDebouncer, TimerToken};
use super::dispatcher::{Admission, CallDispatcher, Rejected};
use crate::compiler::program::{EventMatch, Program};
use crate::compiler::router::RoutedCalls;
use crate::ports::{Clock, RpcTransport};

/// Receives the outcome of one call, at most once.
pub type Continuation = Box<dyn FnOnce(Result<serde_json::Value, CallError>) + Send>;

/// Counters returned when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rejected: usize,
}

struct Job {
    call: OutboundCall,
    continuation: Option<Continuation>,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.call.fmt(f)
    }
}

enum Message {
    Input(InputEvent),
    Submit(Job),
    Finished {
        call: OutboundCall,
        result: Result<serde_json::Value, CallError>,
        continuation: Option<Continuation>,
    },
    DrainTick,
    DebounceElapsed(TimerToken),
}

/// Sending side of a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl ControllerHandle {
    /// Deliver an input event.
    ///
    /// # Errors
    ///
    /// Returns [`RelayLogicError::RuntimeStopped`] if the loop has exited.
    pub fn input(&self, event: InputEvent) -> Result<(), RelayLogicError> {
        self.send(Message::Input(event))
    }

    /// Submit an ad-hoc call through the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`RelayLogicError::RuntimeStopped`] if the loop has exited.
    pub fn submit(
        &self,
        call: OutboundCall,
        continuation: Option<Continuation>,
    ) -> Result<(), RelayLogicError> {
        self.send(Message::Submit(Job { call, continuation }))
    }

    fn send(&self, message: Message) -> Result<(), RelayLogicError> {
        self.tx
            .send(message)
            .map_err(|_| RelayLogicError::RuntimeStopped)
    }
}

/// An armed debounce timer and the block it fires on expiry.
struct DebounceTimer {
    handle: AbortHandle,
    body: RoutedCalls,
}

/// Event loop state of one controller.
pub struct ControllerRuntime<T, K> {
    program: Program,
    settings: CompileSettings,
    transport: Arc<T>,
    clock: K,
    dispatcher: CallDispatcher<Job>,
    debouncer: MotionDebouncer,
    timers: HashMap<TimerToken, DebounceTimer>,
    stats: RuntimeStats,
    tx: mpsc::WeakUnboundedSender<Message>,
}

impl<T, K> ControllerRuntime<T, K>
where
    T: RpcTransport,
    K: Clock,
{
    /// Start the event loop of `program` on the current tokio runtime.
    ///
    /// The returned join handle resolves to the loop's counters once every
    /// handle has been dropped and the queued messages are processed.
    #[must_use]
    pub fn spawn(
        program: Program,
        settings: CompileSettings,
        transport: Arc<T>,
        clock: K,
    ) -> (ControllerHandle, JoinHandle<RuntimeStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            dispatcher: CallDispatcher::new(&settings.dispatch),
            debouncer: MotionDebouncer::new(),
            program,
            settings,
            transport,
            clock,
            timers: HashMap::new(),
            stats: RuntimeStats::default(),
            tx: tx.downgrade(),
        };
        let join = tokio::spawn(runtime.run(rx));
        (ControllerHandle { tx }, join)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) -> RuntimeStats {
        tracing::debug!(owner = %self.program.owner, blocks = self.program.blocks.len(), "controller started");
        while let Some(message) = rx.recv().await {
            match message {
                Message::Input(event) => self.on_input(&event),
                Message::Submit(job) => self.submit(job),
                Message::Finished {
                    call,
                    result,
                    continuation,
                } => self.on_finished(&call, result, continuation),
                Message::DrainTick => self.on_drain_tick(),
                Message::DebounceElapsed(token) => self.on_debounce_elapsed(token),
            }
        }
        for timer in self.timers.values() {
            timer.handle.abort();
        }
        tracing::debug!(owner = %self.program.owner, stats = ?self.stats, "controller stopped");
        self.stats
    }

    fn is_night(&self) -> bool {
        self.settings.night.contains(self.clock.local_hour())
    }

    fn on_input(&mut self, event: &InputEvent) {
        let night = self.is_night();
        let Some(block) = self.program.first_match(event, night).cloned() else {
            tracing::trace!(component = %event.component, event = %event.event, "no rule matches");
            return;
        };
        match block.guard.event {
            EventMatch::Named(_) => self.fire(&block.body),
            EventMatch::Motion(edge) => {
                let transition = self.debouncer.motion(block.guard.input, edge);
                if let Some(token) = transition.cancel {
                    self.cancel_timer(token);
                }
                if let Some(token) = transition.arm {
                    self.arm_timer(token, block.body.clone());
                }
                if transition.issue.is_some() {
                    self.fire(&block.body);
                }
            }
        }
    }

    fn on_debounce_elapsed(&mut self, token: TimerToken) {
        let timer = self.timers.remove(&token);
        if !self.debouncer.timer_fired(token) {
            tracing::trace!(input = token.input, generation = token.generation, "stale debounce timer");
            return;
        }
        if let Some(timer) = timer {
            self.fire(&timer.body);
        }
    }

    /// Resolve clock-dependent parameters and submit one call per local call
    /// and per remote batch.
    fn fire(&mut self, body: &RoutedCalls) {
        let night = self.is_night();
        let presets = self.settings.presets;
        let local = body.local.iter().map(|call| OutboundCall::Direct {
            address: call.address.clone(),
            method: call.method,
            params: call.materialize(night, &presets),
        });
        let remote = body.remote.iter().map(|batch| OutboundCall::Batch {
            address: batch.address.clone(),
            frames: batch.frames(night, &presets),
        });
        let calls: Vec<_> = local.chain(remote).collect();
        for call in calls {
            self.submit(Job {
                call,
                continuation: None,
            });
        }
    }

    fn submit(&mut self, job: Job) {
        match self.dispatcher.submit(job) {
            Ok(Admission::Dispatch(job)) => self.start(job),
            Ok(Admission::Queued { arm_drain_timer }) => {
                tracing::debug!(pending = self.dispatcher.pending_len(), "call queued");
                if arm_drain_timer {
                    self.schedule_drain();
                }
            }
            Err(Rejected { error, call }) => {
                self.stats.rejected += 1;
                tracing::warn!(%error, "call dropped");
                if let Some(continuation) = call.continuation {
                    continuation(Err(error.into()));
                }
            }
        }
    }

    fn start(&mut self, job: Job) {
        self.stats.dispatched += 1;
        tracing::debug!(call = %job.call, active = self.dispatcher.active(), "dispatching call");
        let transport = Arc::clone(&self.transport);
        let timeout = self.settings.dispatch.call_timeout();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, transport.send(&job.call))
                .await
                .unwrap_or_else(|_| Err(CallError::Timeout(timeout)));
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::Finished {
                    call: job.call,
                    result,
                    continuation: job.continuation,
                });
            }
        });
    }

    fn on_finished(
        &mut self,
        call: &OutboundCall,
        result: Result<serde_json::Value, CallError>,
        continuation: Option<Continuation>,
    ) {
        match &result {
            Ok(_) => self.stats.succeeded += 1,
            Err(error) => {
                self.stats.failed += 1;
                tracing::warn!(%call, %error, "call failed");
            }
        }
        if let Some(continuation) = continuation {
            continuation(result);
        }
        if let Some(next) = self.dispatcher.complete() {
            self.start(next);
        }
    }

    fn on_drain_tick(&mut self) {
        let tick = self.dispatcher.drain_tick();
        if let Some(job) = tick.released {
            self.start(job);
        }
        if tick.rearm {
            self.schedule_drain();
        }
    }

    fn schedule_drain(&self) {
        self.schedule(self.settings.dispatch.drain_interval(), Message::DrainTick);
    }

    fn arm_timer(&mut self, token: TimerToken, body: RoutedCalls) {
        let handle = self.schedule(self.settings.debounce(), Message::DebounceElapsed(token));
        self.timers.insert(token, DebounceTimer { handle, body });
    }

    fn cancel_timer(&mut self, token: TimerToken) {
        if let Some(timer) = self.timers.remove(&token) {
            timer.handle.abort();
        }
    }

    fn schedule(&self, delay: Duration, message: Message) -> AbortHandle {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(message);
            }
        })
        .abort_handle()
    }
}
