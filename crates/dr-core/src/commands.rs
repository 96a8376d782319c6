//! Command types for every model mutation
//!
//! Commands are processed by the `apply()` function, which validates the
//! proposed post-mutation model and returns it, or rejects and leaves the
//! current model untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::element::default_category;
use crate::model::{Element, LayerName, LinkField, PropertyValue};

/// Caller-supplied content for a new or updated element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDraft {
    /// Explicit id; generated from type and name when absent
    #[serde(default)]
    pub id: Option<String>,
    pub element_type: String,
    pub name: String,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub links: Vec<LinkField>,
    /// Category document; defaults to the type's plural (or the current
    /// category on update)
    #[serde(default)]
    pub category: Option<String>,
}

impl ElementDraft {
    pub fn new(element_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            element_type: element_type.into(),
            name: name.into(),
            documentation: None,
            properties: BTreeMap::new(),
            links: Vec::new(),
            category: None,
        }
    }

    /// Start a draft from an existing element, keeping all of its content
    pub fn from_element(element: &Element) -> Self {
        Self {
            id: Some(element.id.clone()),
            element_type: element.element_type.clone(),
            name: element.name.clone(),
            documentation: element.documentation.clone(),
            properties: element.properties.clone(),
            links: element.links.clone(),
            category: Some(element.category.clone()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: PropertyValue) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn with_link<I, S>(mut self, field: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        match self.links.iter_mut().find(|l| l.field == field) {
            Some(existing) => existing.targets = targets,
            None => self.links.push(LinkField {
                field: field.to_string(),
                targets,
            }),
        }
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Materialize the draft as an element of `layer` with the given id
    pub fn into_element(self, id: String, layer: LayerName) -> Element {
        let category = self
            .category
            .unwrap_or_else(|| default_category(&self.element_type));
        Element {
            id,
            layer,
            element_type: self.element_type,
            name: self.name,
            documentation: self.documentation,
            properties: self.properties,
            links: self.links,
            category,
        }
    }
}

/// Every mutation the model manager accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Add a new element to an enabled layer
    AddElement { layer: LayerName, draft: ElementDraft },

    /// Replace an element's content; its id and layer never change
    UpdateElement { id: String, draft: ElementDraft },

    /// Remove an element. With `cascade`, link fields of dependents that
    /// target it are cleared instead of blocking the removal.
    RemoveElement {
        id: String,
        #[serde(default)]
        cascade: bool,
    },
}

impl Command {
    /// Operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::AddElement { .. } => "add_element",
            Command::UpdateElement { .. } => "update_element",
            Command::RemoveElement { .. } => "remove_element",
        }
    }

    /// Id of the existing element the command targets; `None` for adds
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Command::AddElement { .. } => None,
            Command::UpdateElement { id, .. } | Command::RemoveElement { id, .. } => Some(id),
        }
    }
}
