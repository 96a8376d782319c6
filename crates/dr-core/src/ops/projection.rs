//! Projection Engine.
//!
//! A projection is the seed plus everything reachable from it, then filtered
//! by layer and predicate category. Filtering happens after reachability, so
//! an element can appear because a path to it runs through elements that the
//! filter later removes.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::LayerName;
use crate::ops::ElementStore;
use crate::registry::PredicateCategory;
use crate::traversal::{DependencyTracker, Direction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionFilter {
    /// Keep only elements of these layers (the seed is always kept)
    pub layers: Option<BTreeSet<LayerName>>,
    /// Keep only edges whose predicate falls in these categories
    pub predicate_categories: Option<BTreeSet<PredicateCategory>>,
    pub direction: Direction,
    pub max_depth: Option<usize>,
}

impl Default for ProjectionFilter {
    /// Everything that links into the seed, at any depth
    fn default() -> Self {
        Self {
            layers: None,
            predicate_categories: None,
            direction: Direction::Backward,
            max_depth: None,
        }
    }
}

impl ProjectionFilter {
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = LayerName>) -> Self {
        self.layers = Some(layers.into_iter().collect());
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = PredicateCategory>) -> Self {
        self.predicate_categories = Some(categories.into_iter().collect());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedNode {
    pub id: String,
    pub layer: LayerName,
    pub element_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    pub source: String,
    pub target: String,
    pub predicate: String,
    pub category: PredicateCategory,
}

/// Derived subgraph around a seed element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub seed: String,
    /// Seed first, then discovery order
    pub nodes: Vec<ProjectedNode>,
    /// Graph edge order
    pub edges: Vec<ProjectedEdge>,
}

impl Projection {
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

/// Compute a projection. Pure; reads the store and graph only.
///
/// # Errors
///
/// Returns `ElementNotFound` if the seed is unknown.
pub fn project(
    store: &ElementStore,
    tracker: &DependencyTracker,
    seed: &str,
    filter: &ProjectionFilter,
) -> Result<Projection> {
    let seed_element = store.require(seed)?;
    let reached = tracker.reachable_from(seed, filter.direction, filter.max_depth)?;

    let layer_ok = |layer: LayerName| filter.layers.as_ref().map_or(true, |ls| ls.contains(&layer));

    let mut nodes: Vec<ProjectedNode> = std::iter::once(seed_element)
        .chain(reached.iter().filter_map(|id| store.get(id)))
        .enumerate()
        .filter(|(i, e)| *i == 0 || layer_ok(e.layer))
        .map(|(_, e)| ProjectedNode {
            id: e.id.clone(),
            layer: e.layer,
            element_type: e.element_type.clone(),
        })
        .collect();

    let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: Vec<ProjectedEdge> = tracker
        .edges()
        .iter()
        .filter(|e| {
            filter
                .predicate_categories
                .as_ref()
                .map_or(true, |cs| cs.contains(&e.category))
        })
        .filter_map(|e| {
            let source = tracker.node_id(e.source)?;
            let target = tracker.node_id(e.target)?;
            (kept.contains(source) && kept.contains(target)).then(|| ProjectedEdge {
                source: source.to_string(),
                target: target.to_string(),
                predicate: e.predicate.clone(),
                category: e.category,
            })
        })
        .collect();

    if filter.predicate_categories.is_some() {
        let touched: HashSet<&str> = edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        nodes.retain(|n| n.id == seed || touched.contains(n.id.as_str()));
    }

    Ok(Projection {
        seed: seed.to_string(),
        nodes,
        edges,
    })
}
