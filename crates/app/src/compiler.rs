//! Rule compiler: one standalone program per device.
//!
//! ```text
//! RuleSet + DeviceRegistry
//!   → ActionResolver (action → call)
//!   → CallRouter     (local calls / per-address batches)
//!   → ProgramEmitter (guarded blocks → program text)
//! ```
//!
//! Compilation is pure: no IO, no clock, no shared mutable state between
//! devices. A failing device never prevents the others from compiling.

pub mod emitter;
pub mod program;
pub mod resolver;
pub mod router;
pub mod template;

use std::collections::BTreeSet;

use relaylogic_domain::device::DeviceRegistry;
use relaylogic_domain::error::ConfigError;
use relaylogic_domain::program::CompiledProgram;
use relaylogic_domain::rule::RuleSet;
use relaylogic_domain::settings::CompileSettings;

pub use emitter::ProgramEmitter;
pub use program::Program;
pub use resolver::ActionResolver;
pub use router::CallRouter;
pub use template::Template;

/// A device whose program could not be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailure {
    pub device: String,
    pub error: ConfigError,
}

/// Outcome of compiling the whole fact base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Successful programs, in device-name order.
    pub programs: Vec<CompiledProgram>,
    pub failures: Vec<DeviceFailure>,
}

impl CompileReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the facts and settings of one compilation run.
#[derive(Debug, Clone)]
pub struct Compiler {
    registry: DeviceRegistry,
    rules: RuleSet,
    settings: CompileSettings,
    template: Template,
}

impl Compiler {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] when `settings` are out of
    /// range.
    pub fn new(
        registry: DeviceRegistry,
        rules: RuleSet,
        settings: CompileSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            registry,
            rules,
            settings,
            template: Template,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> &CompileSettings {
        &self.settings
    }

    fn emitter(&self) -> ProgramEmitter<'_> {
        ProgramEmitter::new(
            ActionResolver::new(&self.registry, &self.settings),
            &self.settings,
            &self.template,
        )
    }

    /// IR of `device`, as executed by the host runtime.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownDevice`] for an unregistered device, otherwise
    /// whatever [`ProgramEmitter::build`] returns.
    pub fn build_program(&self, device: &str) -> Result<Program, ConfigError> {
        let owner = self.registry.require(device)?;
        self.emitter().build(owner, self.rules.for_device(device))
    }

    /// Program text of `device`.
    ///
    /// # Errors
    ///
    /// Same as [`build_program`](Self::build_program).
    pub fn compile_device(&self, device: &str) -> Result<CompiledProgram, ConfigError> {
        let owner = self.registry.require(device)?;
        self.emitter().emit(owner, self.rules.for_device(device))
    }

    /// Compile every registered device.
    ///
    /// Rules whose source device is not registered are reported as failures
    /// of that device name.
    #[tracing::instrument(skip_all, fields(devices = self.registry.len(), rules = self.rules.len()))]
    pub fn compile_all(&self) -> CompileReport {
        let mut report = CompileReport::default();

        for device in self.registry.iter() {
            match self.compile_device(&device.name) {
                Ok(program) => {
                    tracing::debug!(device = %device.name, bytes = program.source.len(), "program emitted");
                    report.programs.push(program);
                }
                Err(error) => {
                    tracing::warn!(device = %device.name, %error, "device skipped");
                    report.failures.push(DeviceFailure {
                        device: device.name.clone(),
                        error,
                    });
                }
            }
        }

        let orphans: BTreeSet<&str> = self
            .rules
            .iter()
            .map(|rule| rule.device.as_str())
            .filter(|device| self.registry.get(device).is_none())
            .collect();
        for device in orphans {
            let error = ConfigError::UnknownDevice {
                device: device.to_string(),
            };
            tracing::warn!(%device, %error, "rules reference an unregistered source device");
            report.failures.push(DeviceFailure {
                device: device.to_string(),
                error,
            });
        }

        report
    }
}
