use crate::diff::model::ModelDiff;
use crate::ops::ElementStore;

/// Compute the diff that takes `old` to `new`.
///
/// An element is "changed" when any of its fields differ, including a move
/// to another category document.
pub fn compute_diff(old: &ElementStore, new: &ElementStore, from_revision: u64, to_revision: u64) -> ModelDiff {
    let mut diff = ModelDiff {
        from_revision,
        to_revision,
        ..ModelDiff::default()
    };

    for element in new.iter() {
        match old.get(&element.id) {
            None => diff.added.push(element.clone()),
            Some(previous) if previous != element => diff.changed.push(element.clone()),
            Some(_) => {}
        }
    }

    diff.removed = old
        .iter()
        .filter(|e| !new.contains(&e.id))
        .map(|e| e.id.clone())
        .collect();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, LayerName};

    fn store(elements: &[Element]) -> ElementStore {
        let mut store = ElementStore::new(&[LayerName::Motivation]);
        for e in elements {
            store.insert(e.clone()).unwrap();
        }
        store
    }

    fn goal(id: &str, name: &str) -> Element {
        Element::new(id, LayerName::Motivation, "goal", name)
    }

    #[test]
    fn test_identical_stores_give_empty_diff() {
        let a = store(&[goal("g1", "One")]);
        let diff = compute_diff(&a, &a.clone(), 1, 2);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_added_removed_changed() {
        let old = store(&[goal("g1", "One"), goal("g2", "Two")]);
        let new = store(&[goal("g2", "Two!"), goal("g3", "Three")]);

        let diff = compute_diff(&old, &new, 4, 5);

        assert_eq!(diff.added_ids(), vec!["g3"]);
        assert_eq!(diff.removed, vec!["g1".to_string()]);
        assert_eq!(diff.changed_ids(), vec!["g2"]);
        assert_eq!(diff.changed[0].name, "Two!");
        assert_eq!((diff.from_revision, diff.to_revision), (4, 5));
        assert_eq!(diff.len(), 3);
    }
}
