//! Engine-level commands that write to a model root.

use dr_core::diff::model::ModelDiff;
use dr_core::LayerName;
use dr_store::errors::Result;

use crate::manager::{CommitReceipt, ModelManager, MutationRequest};

/// Every write the engine accepts
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Add, update or remove an element
    Mutate(MutationRequest),
    EnableLayer { layer: LayerName },
    DisableLayer { layer: LayerName },
    /// Re-read the model root from disk
    Reload,
}

impl EngineCommand {
    /// Operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            EngineCommand::Mutate(request) => request.command.op_name(),
            EngineCommand::EnableLayer { .. } => "enable_layer",
            EngineCommand::DisableLayer { .. } => "disable_layer",
            EngineCommand::Reload => "reload_model",
        }
    }
}

/// Result of applying an engine command
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Committed(Box<CommitReceipt>),
    /// `changed` is false when the layer was already in the requested state
    LayerToggled { layer: LayerName, changed: bool },
    Reloaded(ModelDiff),
}

impl EngineCommandResult {
    /// Diff to broadcast for this result, if any elements changed
    pub fn diff(&self) -> Option<&ModelDiff> {
        match self {
            EngineCommandResult::Committed(receipt) => Some(&receipt.diff),
            EngineCommandResult::Reloaded(diff) => Some(diff),
            EngineCommandResult::LayerToggled { .. } => None,
        }
    }
}

/// Apply one command to the manager. Runs to a terminal state; nothing is
/// retried.
///
/// # Errors
///
/// Whatever the underlying manager operation returns.
pub fn apply_engine_command(
    manager: &mut ModelManager,
    cmd: EngineCommand,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::Mutate(request) => manager
            .submit(request)
            .map(|r| EngineCommandResult::Committed(Box::new(r))),
        EngineCommand::EnableLayer { layer } => manager
            .enable_layer(layer)
            .map(|changed| EngineCommandResult::LayerToggled { layer, changed }),
        EngineCommand::DisableLayer { layer } => manager
            .disable_layer(layer)
            .map(|changed| EngineCommandResult::LayerToggled { layer, changed }),
        EngineCommand::Reload => manager.reload().map(EngineCommandResult::Reloaded),
    }
}
