//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production (long-running sync server)
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "dr=debug",
            Profile::Production => "dr=info",
            Profile::Test => "dr=trace",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at process start. `RUST_LOG` overrides the profile's default
/// filter directive.
///
/// ```
/// use dr_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()));
        // A subscriber installed earlier (e.g. the test capture layer) wins
        match profile {
            Profile::Development => {
                let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
            }
            Profile::Production => {
                let _ = tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .try_init();
            }
            Profile::Test => {
                let _ = tracing_subscriber::registry().try_init();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_profile_directives() {
        assert_eq!(Profile::Development.default_directive(), "dr=debug");
        assert_eq!(Profile::Production.default_directive(), "dr=info");
        assert_ne!(Profile::Development, Profile::Production);
    }
}
