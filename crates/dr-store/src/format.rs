//! Category document format
//!
//! A category file is a YAML mapping keyed by element id. Element order in
//! the file is significant and survives a load/save cycle; the layer comes
//! from the directory and the category from the file stem.
//!
//! ```yaml
//! goal-revenue:
//!   type: goal
//!   name: Grow revenue
//!   properties:
//!     priority: high
//!   links:
//!     parent-goal: goal-mission
//! ```

use crate::errors::{parse_error, serialize_error, Result};
use dr_core::model::{Element, LayerName, LinkField, PropertyValue};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// String-keyed mapping that keeps document order and rejects duplicate keys
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<V>(pub Vec<(String, V)>);

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Ordered<V> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping keyed by id")
            }

            // An empty document is an empty category
            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Ordered::default())
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries: Vec<(String, V)> = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    let value = map.next_value()?;
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

/// Link targets: a single id or a list of ids on input, always a list on output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Targets(pub Vec<String>);

impl Serialize for Targets {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Targets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TargetsVisitor;

        impl<'de> Visitor<'de> for TargetsVisitor {
            type Value = Targets;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an element id or a list of element ids")
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Targets, E>
            where
                E: de::Error,
            {
                Ok(Targets(vec![value.to_string()]))
            }

            fn visit_unit<E>(self) -> std::result::Result<Targets, E>
            where
                E: de::Error,
            {
                Ok(Targets::default())
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Targets, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut ids = Vec::new();
                while let Some(id) = seq.next_element::<String>()? {
                    ids.push(id);
                }
                Ok(Targets(ids))
            }
        }

        deserializer.deserialize_any(TargetsVisitor)
    }
}

/// Body of one element inside a category document
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementBody {
    #[serde(rename = "type")]
    pub element_type: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,

    #[serde(default, skip_serializing_if = "Ordered::is_empty")]
    pub links: Ordered<Targets>,
}

impl ElementBody {
    pub fn from_element(element: &Element) -> Self {
        Self {
            element_type: element.element_type.clone(),
            name: element.name.clone(),
            documentation: element.documentation.clone(),
            properties: element.properties.clone(),
            links: Ordered(
                element
                    .links
                    .iter()
                    .map(|l| (l.field.clone(), Targets(l.targets.clone())))
                    .collect(),
            ),
        }
    }

    pub fn into_element(self, id: String, layer: LayerName, category: &str) -> Element {
        Element {
            id,
            layer,
            element_type: self.element_type,
            name: self.name,
            documentation: self.documentation,
            properties: self.properties,
            links: self
                .links
                .0
                .into_iter()
                .map(|(field, targets)| LinkField {
                    field,
                    targets: targets.0,
                })
                .collect(),
            category: category.to_string(),
        }
    }
}

/// A parsed category file
pub type CategoryDocument = Ordered<ElementBody>;

/// Parse a category document; `path` is only used for error locations
pub fn parse_category(text: &str, path: &Path) -> Result<CategoryDocument> {
    if text.trim().is_empty() {
        return Ok(CategoryDocument::default());
    }
    serde_yaml::from_str(text).map_err(|e| parse_error(path, &e))
}

/// Render elements of one category in the given order
pub fn render_category<'a, I>(elements: I, path: &Path) -> Result<String>
where
    I: IntoIterator<Item = &'a Element>,
{
    let doc: CategoryDocument = Ordered(
        elements
            .into_iter()
            .map(|e| (e.id.clone(), ElementBody::from_element(e)))
            .collect(),
    );
    serde_yaml::to_string(&doc).map_err(|e| serialize_error(path, &e))
}
