//! Compile service: load facts, compile every device, store the programs.

use relaylogic_domain::error::RelayLogicError;
use relaylogic_domain::settings::CompileSettings;

use crate::compiler::{CompileReport, Compiler};
use crate::ports::{FactSource, ProgramSink};

/// Application service for one load → compile → write run.
pub struct CompileService<F, S> {
    facts: F,
    sink: S,
    settings: CompileSettings,
}

impl<F: FactSource, S: ProgramSink> CompileService<F, S> {
    /// Create a new service over the given fact source and program sink.
    pub fn new(facts: F, sink: S, settings: CompileSettings) -> Self {
        Self {
            facts,
            sink,
            settings,
        }
    }

    /// Compile the whole fact base and write every successful program.
    ///
    /// Devices that fail to compile are listed in the returned report and
    /// nothing is written for them; the other devices are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the facts cannot be loaded, the settings are
    /// invalid, or a program cannot be written.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<CompileReport, RelayLogicError> {
        let registry = self.facts.load_devices().await?;
        let rules = self.facts.load_rules().await?;
        tracing::info!(devices = registry.len(), rules = rules.len(), "facts loaded");

        let compiler = Compiler::new(registry, rules, self.settings.clone())?;
        let report = compiler.compile_all();

        for program in &report.programs {
            self.sink.write(program).await?;
        }
        tracing::info!(
            written = report.programs.len(),
            failed = report.failures.len(),
            "compilation finished"
        );
        Ok(report)
    }
}
