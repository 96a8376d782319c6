//! Sync server configuration
//!
//! Read from a TOML file or built from defaults. Every key is optional;
//! unknown keys are rejected so a typo cannot silently fall back to a default.
//!
//! ```toml
//! debounce_ms = 200
//! observer_channel_capacity = 512
//! echo_annotations = true
//! ```

use std::path::Path;
use std::time::Duration;

use dr_core::errors::{ExError, ExErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Quiet period after the last file event before a reload runs
    pub debounce_ms: u64,
    /// Messages buffered per observer before it is disconnected; a session
    /// opens with two messages, so at least 2
    pub observer_channel_capacity: usize,
    /// Requests buffered for the writer before callers wait
    pub request_queue_capacity: usize,
    /// Send an observer's own annotations back to it
    pub echo_annotations: bool,
    /// Watch the model root for external edits
    pub watch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            observer_channel_capacity: 256,
            request_queue_capacity: 64,
            echo_annotations: false,
            watch: true,
        }
    }
}

impl SyncConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML or unknown keys, `InvalidInput` for
    /// capacities too small to operate.
    pub fn from_toml_str(text: &str) -> Result<Self, ExError> {
        let config: SyncConfig = toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Parse)
                .with_op("load_sync_config")
                .with_message(e.message().to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`SyncConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ExError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_sync_config")
                .with_location(path.display().to_string(), None)
                .with_message(e.to_string())
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_location(path.display().to_string(), None))
    }

    pub(crate) fn validate(&self) -> Result<(), ExError> {
        if self.observer_channel_capacity < 2 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_sync_config")
                .with_message("observer_channel_capacity must be at least 2"));
        }
        if self.request_queue_capacity == 0 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_sync_config")
                .with_message("request_queue_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_echo_annotations(mut self, echo: bool) -> Self {
        self.echo_annotations = echo;
        self
    }

    pub fn with_observer_channel_capacity(mut self, capacity: usize) -> Self {
        self.observer_channel_capacity = capacity;
        self
    }
}
