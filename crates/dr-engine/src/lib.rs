//! dr-engine - Model Manager
//!
//! Coordinates the in-memory kernel (`dr-core`) with on-disk persistence
//! (`dr-store`): load, mutate, validate, persist, and graph queries over the
//! committed model.

pub mod commands;
pub mod manager;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use manager::{CommitReceipt, ModelManager, MutationRequest, ScanReport};
