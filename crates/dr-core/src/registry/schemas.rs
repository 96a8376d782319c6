//! Schema Registry: element types per layer and their attribute rules.

use std::collections::BTreeMap;

use crate::model::LayerName;

/// Declared primitive type of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Text,
    Integer,
    /// Integer or float
    Number,
    Boolean,
    List,
    /// String restricted to the listed values
    Enum(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRule {
    pub name: String,
    pub kind: AttributeKind,
    pub required: bool,
    /// Character bounds, only checked for text and enum values
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

impl AttributeRule {
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            min_len: None,
            max_len: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }
}

/// Shape of one element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    pub layer: LayerName,
    pub name: String,
    /// Attribute rules in declaration order
    pub attributes: Vec<AttributeRule>,
    /// Link fields of which at least one must be populated for the element
    /// to trace upward. Empty when the type has no traceability requirement.
    pub trace_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: BTreeMap<LayerName, Vec<TypeSchema>>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<TypeSchema>) -> Self {
        let mut types: BTreeMap<LayerName, Vec<TypeSchema>> = BTreeMap::new();
        for schema in schemas {
            types.entry(schema.layer).or_default().push(schema);
        }
        Self { types }
    }

    /// The twelve-layer catalog shipped with the engine
    pub fn builtin() -> Self {
        Self::new(super::catalog::builtin_types())
    }

    pub fn type_schema(&self, layer: LayerName, element_type: &str) -> Option<&TypeSchema> {
        self.types
            .get(&layer)
            .and_then(|types| types.iter().find(|t| t.name == element_type))
    }

    pub fn types_in(&self, layer: LayerName) -> &[TypeSchema] {
        self.types.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn type_names(&self, layer: LayerName) -> Vec<&str> {
        self.types_in(layer).iter().map(|t| t.name.as_str()).collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
