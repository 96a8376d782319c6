//! Link Registry.
//!
//! A predicate is a named relationship with an optional inverse. A link rule
//! binds a predicate to a link field on a source (layer, types) and restricts
//! the target to one layer and a set of types. Links are never stored; they
//! are read off element link fields through these rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DrError, Result};
use crate::model::LayerName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Advisory weight of a relationship. Surfaced in reports, never a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strength::Low => "low",
            Strength::Medium => "medium",
            Strength::High => "high",
            Strength::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Grouping used by projection filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateCategory {
    Traceability,
    Dependency,
    Realization,
    Structural,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDef {
    pub name: String,
    #[serde(default)]
    pub inverse: Option<String>,
    pub category: PredicateCategory,
}

/// A link field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRule {
    pub field: String,
    pub source_layer: LayerName,
    /// Source types the field applies to; empty means every type in the layer
    #[serde(default)]
    pub source_types: Vec<String>,
    pub target_layer: LayerName,
    /// Allowed target types; empty means every type in the target layer
    #[serde(default)]
    pub target_types: Vec<String>,
    pub predicate: String,
    pub cardinality: Cardinality,
    pub strength: Strength,
}

impl LinkRule {
    pub fn applies_to(&self, layer: LayerName, element_type: &str) -> bool {
        self.source_layer == layer
            && (self.source_types.is_empty() || self.source_types.iter().any(|t| t == element_type))
    }

    pub fn accepts_target(&self, layer: LayerName, element_type: &str) -> bool {
        self.target_layer == layer
            && (self.target_types.is_empty() || self.target_types.iter().any(|t| t == element_type))
    }
}

/// One entry of a `predicates_for` answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateInfo<'a> {
    pub predicate: &'a str,
    pub inverse: Option<&'a str>,
    pub cardinality: Cardinality,
    pub strength: Strength,
    pub field: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    predicates: Vec<PredicateDef>,
    links: Vec<LinkRule>,
}

/// Catalog of predicates and link fields
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    predicates: BTreeMap<String, PredicateDef>,
    rules: Vec<LinkRule>,
}

impl LinkRegistry {
    /// Build a registry, checking every rule names a known predicate.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPredicate` for the first rule whose predicate is not
    /// declared.
    pub fn new(predicates: Vec<PredicateDef>, rules: Vec<LinkRule>) -> Result<Self> {
        let predicates: BTreeMap<String, PredicateDef> = predicates
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        if let Some(rule) = rules.iter().find(|r| !predicates.contains_key(&r.predicate)) {
            return Err(DrError::UnknownPredicate {
                predicate: rule.predicate.clone(),
            });
        }
        Ok(Self { predicates, rules })
    }

    /// The catalog shipped with the engine
    pub fn builtin() -> Self {
        let (predicates, rules) = super::catalog::builtin_links();
        Self {
            predicates: predicates.into_iter().map(|p| (p.name.clone(), p)).collect(),
            rules,
        }
    }

    /// Load a custom catalog from YAML with top-level `predicates` and `links`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` on malformed YAML and `UnknownPredicate` when a
    /// link rule names an undeclared predicate.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_yaml::from_str(text)?;
        Self::new(doc.predicates, doc.links)
    }

    /// Look up a predicate by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPredicate` when the name is absent from the catalog.
    pub fn predicate(&self, name: &str) -> Result<&PredicateDef> {
        self.predicates
            .get(name)
            .ok_or_else(|| DrError::UnknownPredicate {
                predicate: name.to_string(),
            })
    }

    /// Predicates registered from `source` to `target`, in rule order
    pub fn predicates_for(&self, source: LayerName, target: LayerName) -> Vec<PredicateInfo<'_>> {
        self.rules
            .iter()
            .filter(|r| r.source_layer == source && r.target_layer == target)
            .map(|r| PredicateInfo {
                predicate: &r.predicate,
                inverse: self
                    .predicates
                    .get(&r.predicate)
                    .and_then(|p| p.inverse.as_deref()),
                cardinality: r.cardinality,
                strength: r.strength,
                field: &r.field,
            })
            .collect()
    }

    /// The rule governing `field` on an element of (`layer`, `element_type`)
    pub fn field_rule(&self, layer: LayerName, element_type: &str, field: &str) -> Option<&LinkRule> {
        self.rules
            .iter()
            .find(|r| r.field == field && r.applies_to(layer, element_type))
    }

    /// Category of a predicate, if registered
    pub fn category_of(&self, predicate: &str) -> Option<PredicateCategory> {
        self.predicates.get(predicate).map(|p| p.category)
    }

    /// Link rules declared on a source (layer, type), in catalog order
    pub fn rules_for(&self, layer: LayerName, element_type: &str) -> Vec<&LinkRule> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(layer, element_type))
            .collect()
    }

    /// True when any rule lets `source` link into `target`
    pub fn links_between(&self, source: LayerName, target: LayerName) -> bool {
        self.rules
            .iter()
            .any(|r| r.source_layer == source && r.target_layer == target)
    }

    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
