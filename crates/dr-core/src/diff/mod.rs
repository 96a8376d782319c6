//! Model diff engine.
//!
//! Compares two element stores and lists added, removed and changed element
//! ids. Used by the sync server to turn a reload into a broadcastable event.
//!
//! ## Guarantees
//!
//! - **Determinism**: added and changed follow the newer store's order,
//!   removed follows the older store's order.
//! - **Full values**: added and changed entries carry the new element.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::compute_diff;
pub use human_summary::render_human_summary;
pub use model::ModelDiff;
