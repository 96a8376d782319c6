//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.
//! Every operation emits exactly one `start` event and exactly one of
//! `end` or `end_error`.

/// Log the start of an operation
///
/// ```
/// # use dr_core::log_op_start;
/// log_op_start!("add_element");
/// log_op_start!("add_element", element_id = "goal-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use dr_core::log_op_end;
/// log_op_end!("add_element", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into [`ExError`](crate::errors::ExError).
///
/// ```
/// # use dr_core::{log_op_error, errors::DrError};
/// let err = DrError::ElementNotFound { element_id: "goal-9".to_string() };
/// log_op_error!("remove_element", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Log a mutation that ended in the `Rejected` state
///
/// Rejections are expected user-facing outcomes, so they end the operation at
/// `warn` level rather than `error`.
#[macro_export]
macro_rules! log_op_rejected {
    ($op:expr, issue_count = $count:expr, duration_ms = $duration:expr) => {
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = dr_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.code = "ERR_MUTATION_REJECTED",
            issue_count = $count,
        );
    };
}
