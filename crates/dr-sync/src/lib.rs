//! dr-sync - Live view of a model for connected observers
//!
//! [`SyncServer::start`] takes over a [`dr_engine::ModelManager`] and
//! serializes every write against it: commands from handles, observer
//! annotations and reloads triggered by the file watcher. Observers get a
//! full snapshot when they join and diffs afterwards.

pub mod annotations;
pub mod config;
pub mod observers;
pub mod protocol;
pub mod server;
pub mod watcher;

pub use annotations::{Annotation, AnnotationStore};
pub use config::SyncConfig;
pub use protocol::{ClientMessage, ServerMessage};
pub use server::{Subscription, SyncHandle, SyncServer};
