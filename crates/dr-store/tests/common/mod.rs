use std::fs;
use std::path::Path;

use dr_core::LayerName;
use tempfile::TempDir;

/// Model root with motivation and business layers and a few hand-written
/// category files
#[allow(dead_code)]
pub fn seeded_model() -> TempDir {
    let dir = TempDir::new().unwrap();
    dr_store::init_model(dir.path(), "shop", &[LayerName::Motivation, LayerName::Business])
        .unwrap();

    write(
        dir.path(),
        "01_motivation/goals.yaml",
        "\
goal-growth:
  type: goal
  name: Grow revenue
  properties:
    priority: high
goal-retention:
  type: goal
  name: Keep customers
  links:
    parent-goal: goal-growth
",
    );
    write(
        dir.path(),
        "02_business/services.yaml",
        "\
service-checkout:
  type: service
  name: Checkout
  documentation: Takes payment for a basket
  properties:
    owner: payments team
  links:
    supports-goals: [goal-growth, goal-retention]
",
    );
    dir
}

#[allow(dead_code)]
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
