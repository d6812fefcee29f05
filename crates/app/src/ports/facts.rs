//! Fact ports: where the compiler's input comes from and its output goes.

use std::future::Future;

use relaylogic_domain::device::DeviceRegistry;
use relaylogic_domain::error::RelayLogicError;
use relaylogic_domain::program::CompiledProgram;
use relaylogic_domain::rule::RuleSet;

/// Read-only access to the device registry and rule set.
pub trait FactSource: Send + Sync {
    /// Load and validate every device.
    fn load_devices(&self) -> impl Future<Output = Result<DeviceRegistry, RelayLogicError>> + Send;

    /// Load the rule set in declaration order.
    fn load_rules(&self) -> impl Future<Output = Result<RuleSet, RelayLogicError>> + Send;
}

/// Destination for compiled programs (consumed later by the deployer).
pub trait ProgramSink: Send + Sync {
    /// Store one program, replacing any previous program for the same owner.
    fn write(
        &self,
        program: &CompiledProgram,
    ) -> impl Future<Output = Result<(), RelayLogicError>> + Send;
}
