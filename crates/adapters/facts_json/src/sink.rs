//! Directory implementation of [`ProgramSink`].

use std::future::Future;
use std::path::PathBuf;

use relaylogic_app::ports::ProgramSink;
use relaylogic_domain::error::RelayLogicError;
use relaylogic_domain::program::CompiledProgram;

use crate::error::FactsError;

/// Writes each program to `<dir>/<owner>.js`, creating `dir` on demand.
#[derive(Debug, Clone)]
pub struct DirectoryProgramSink {
    dir: PathBuf,
}

impl DirectoryProgramSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProgramSink for DirectoryProgramSink {
    fn write(
        &self,
        program: &CompiledProgram,
    ) -> impl Future<Output = Result<(), RelayLogicError>> + Send {
        let path = self.dir.join(program.file_name());
        let source = program.source.clone();
        async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|source| FactsError::Io {
                    path: self.dir.clone(),
                    source,
                })?;
            tokio::fs::write(&path, source)
                .await
                .map_err(|source| FactsError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), "program written");
            Ok(())
        }
    }
}
