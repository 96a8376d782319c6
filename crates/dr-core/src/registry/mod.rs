//! Declarative catalogs: which link fields exist between which layers, and
//! what shape each element type has. Both are read-only after construction.

pub mod catalog;
pub mod links;
pub mod schemas;

pub use links::{
    Cardinality, LinkRegistry, LinkRule, PredicateCategory, PredicateDef, PredicateInfo, Strength,
};
pub use schemas::{AttributeKind, AttributeRule, SchemaRegistry, TypeSchema};

/// Both catalogs, as handed to validators and the mutation pipeline
#[derive(Debug, Clone)]
pub struct Registries {
    pub links: LinkRegistry,
    pub schemas: SchemaRegistry,
}

impl Registries {
    pub fn builtin() -> Self {
        Self {
            links: LinkRegistry::builtin(),
            schemas: SchemaRegistry::builtin(),
        }
    }

    pub fn new(links: LinkRegistry, schemas: SchemaRegistry) -> Self {
        Self { links, schemas }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::builtin()
    }
}
