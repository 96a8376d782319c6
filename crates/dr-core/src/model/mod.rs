pub mod element;
pub mod layer;
pub mod manifest;

pub use element::{Element, LinkField, PropertyValue};
pub use layer::LayerName;
pub use manifest::{LayerEntry, Manifest, SPEC_VERSION};
