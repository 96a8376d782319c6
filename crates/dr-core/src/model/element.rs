use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::layer::LayerName;

/// Primitive attribute value as found in a layer document.
///
/// The schema validator decides whether a value fits the attribute rule
/// declared for the element's (layer, type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Short type name used in issue messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Float(_) => "number",
            PropertyValue::Text(_) => "string",
            PropertyValue::List(_) => "list",
        }
    }
}

/// A named link field and the element ids it targets, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkField {
    pub field: String,
    pub targets: Vec<String>,
}

/// Element - the atomic modeled unit.
///
/// Owned by exactly one layer. Links are not stored on their own; they are
/// derived from `links` plus the link registry's field declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Globally unique id, stable across edits
    pub id: String,

    /// Owning layer
    pub layer: LayerName,

    /// Type name scoped to the layer (e.g. `goal`, `service`)
    pub element_type: String,

    /// Display name
    pub name: String,

    /// Free-form documentation
    pub documentation: Option<String>,

    /// Layer-specific attributes
    pub properties: BTreeMap<String, PropertyValue>,

    /// Link fields in declaration order
    pub links: Vec<LinkField>,

    /// Category document (file stem) the element is persisted in
    pub category: String,
}

impl Element {
    /// Create an element with no attributes or links; the category defaults
    /// to the plural of its type (`goal` -> `goals`).
    pub fn new(
        id: impl Into<String>,
        layer: LayerName,
        element_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let element_type = element_type.into();
        Self {
            id: id.into(),
            layer,
            category: default_category(&element_type),
            element_type,
            name: name.into(),
            documentation: None,
            properties: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    /// Builder: append targets to a link field (creating it if absent)
    pub fn with_link<I, S>(mut self, field: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_link(field, targets.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set an attribute
    pub fn with_property(mut self, key: &str, value: PropertyValue) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Replace the targets of a link field, keeping its position if present
    pub fn set_link(&mut self, field: &str, targets: Vec<String>) {
        match self.links.iter_mut().find(|l| l.field == field) {
            Some(existing) => existing.targets = targets,
            None => self.links.push(LinkField {
                field: field.to_string(),
                targets,
            }),
        }
    }

    /// Targets of a link field, empty if the field is absent
    pub fn link_targets(&self, field: &str) -> &[String] {
        self.links
            .iter()
            .find(|l| l.field == field)
            .map(|l| l.targets.as_slice())
            .unwrap_or(&[])
    }

    /// True when any link field targets `id`
    pub fn references(&self, id: &str) -> bool {
        self.links.iter().any(|l| l.targets.iter().any(|t| t == id))
    }

    /// Remove `id` from every link field; fields left empty are dropped.
    ///
    /// Returns the names of the fields that were touched.
    pub fn clear_target(&mut self, id: &str) -> Vec<String> {
        let mut touched = Vec::new();
        for link in &mut self.links {
            let before = link.targets.len();
            link.targets.retain(|t| t != id);
            if link.targets.len() != before {
                touched.push(link.field.clone());
            }
        }
        self.links.retain(|l| !l.targets.is_empty());
        touched
    }
}

/// Default category document for a type: `service` -> `services`
pub fn default_category(element_type: &str) -> String {
    if element_type.is_empty() {
        return "elements".to_string();
    }
    if element_type.ends_with('s') {
        format!("{}es", element_type)
    } else if let Some(stem) = element_type.strip_suffix('y') {
        format!("{}ies", stem)
    } else {
        format!("{}s", element_type)
    }
}
