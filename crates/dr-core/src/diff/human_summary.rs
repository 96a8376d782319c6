//! Human-readable summary renderer for model diffs.

use crate::diff::model::ModelDiff;

/// One-line summary, e.g. `rev 3 -> 4: +1 added, -0 removed, ~2 changed`,
/// followed by one indented line per touched id.
///
/// Informational only; used in logs and for tooling.
pub fn render_human_summary(diff: &ModelDiff) -> String {
    let mut out = format!(
        "rev {} -> {}: +{} added, -{} removed, ~{} changed",
        diff.from_revision,
        diff.to_revision,
        diff.added.len(),
        diff.removed.len(),
        diff.changed.len()
    );

    if diff.is_empty() {
        out.push_str("\n  (no changes)");
        return out;
    }

    for element in &diff.added {
        out.push_str(&format!("\n  + {} ({} {})", element.id, element.layer, element.element_type));
    }
    for id in &diff.removed {
        out.push_str(&format!("\n  - {}", id));
    }
    for element in &diff.changed {
        out.push_str(&format!("\n  ~ {} ({} {})", element.id, element.layer, element.element_type));
    }

    out
}
