//! Field names and event values shared by every log event.
//!
//! `tracing` field names must be literals at the call site, so the macros in
//! `dr_core::logging_facility` spell them out; these constants are what
//! readers of captured events (tests, log processors) match against.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_OBSERVER_ID: &str = "observer_id";
pub const FIELD_ELEMENT_ID: &str = "element_id";
pub const FIELD_REVISION: &str = "revision";
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

/// Value of `event` on the first event of an operation
pub const EVENT_START: &str = "start";
/// Value of `event` when an operation succeeds
pub const EVENT_END: &str = "end";
/// Value of `event` when an operation fails or is rejected
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events_differ_from_start() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_error_fields_share_prefix() {
        assert!(FIELD_ERR_KIND.starts_with("err."));
        assert!(FIELD_ERR_CODE.starts_with("err."));
    }
}
