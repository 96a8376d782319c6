pub mod projection;
pub mod store;

pub use projection::{project, Projection, ProjectionFilter};
pub use store::ElementStore;
