//! Command orchestration layer.
//!
//! A single command type covers everything that changes a model, so a
//! caller that serializes writes (the sync server) can queue them uniformly.

pub mod engine_command;
