//! Model Manager
//!
//! The only component that mutates a model. Every mutation runs the
//! validate chain in `dr_core::apply`, persists the touched layers, and only
//! then swaps the committed store in. A rejected or failed mutation leaves
//! both memory and disk as they were.
//!
//! ## Logging Ownership
//!
//! The manager owns lifecycle logging for its operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_rejected!` when the validate chain rejects a mutation
//! - `log_op_error!` on any other failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use dr_core::apply::{apply, layer_removal_issues, MutationKind};
use dr_core::diff::engine::compute_diff;
use dr_core::diff::model::ModelDiff;
use dr_core::errors::{DrError, ExError, ExErrorKind};
use dr_core::ops::{project, Projection, ProjectionFilter};
use dr_core::rules::{validate_model, ValidationIssue, ValidationReport};
use dr_core::{
    log_op_end, log_op_error, log_op_rejected, log_op_start, Command, DependencyTracker,
    Direction, ElementDraft, ElementStore, LayerName, Manifest, ModelSnapshot, Registries,
};
use dr_core_types::correlation::RequestId;
use dr_store::errors::Result;

/// A mutation plus the revision it was prepared against
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub command: Command,
    /// Model revision the caller last saw. `None` skips the conflict check,
    /// so concurrent unbased writes to one element resolve as last write wins.
    pub base_revision: Option<u64>,
    pub request_id: Option<RequestId>,
}

impl MutationRequest {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            base_revision: None,
            request_id: None,
        }
    }

    pub fn with_base_revision(mut self, revision: u64) -> Self {
        self.base_revision = Some(revision);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Id whose commit history decides conflicts: the target of an update or
    /// removal, or the explicit id of an add
    fn conflict_key(&self) -> Option<&str> {
        match &self.command {
            Command::AddElement { draft, .. } => draft.id.as_deref(),
            other => other.target_id(),
        }
    }
}

/// What a committed mutation changed
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Model revision after the commit
    pub revision: u64,
    pub kind: MutationKind,
    pub element_id: String,
    /// Ids whose content changed, including cascade-cleared dependents
    pub touched: Vec<String>,
    /// Non-blocking issues on the affected elements
    pub warnings: Vec<ValidationIssue>,
    pub diff: ModelDiff,
}

/// Result of an on-demand scan of a model root
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Files that could not be loaded, reported apart from validation issues
    pub failures: Vec<ExError>,
    /// Validation of everything that did load
    pub report: ValidationReport,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.report.is_clean()
    }

    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.report.has_errors()
    }
}

/// Owner of one model root's committed state
#[derive(Debug)]
pub struct ModelManager {
    root: PathBuf,
    registries: Registries,
    manifest: Manifest,
    store: ElementStore,
    tracker: DependencyTracker,
    revision: u64,
    /// Revision at which each id was last added, changed or removed
    committed_at: HashMap<String, u64>,
}

impl ModelManager {
    /// Initialize a new model root and open it
    ///
    /// # Errors
    ///
    /// `Persistence` if the root already holds a model, `Io` on write failure.
    pub fn init(root: impl Into<PathBuf>, name: &str, layers: &[LayerName]) -> Result<Self> {
        let root = root.into();
        run_logged("init_model", || {
            let manifest = dr_store::init_model(&root, name, layers)?;
            let store = ElementStore::for_manifest(&manifest);
            Ok(Self::from_parts(root.clone(), Registries::builtin(), manifest, store))
        })
    }

    /// Open an existing model root with the built-in registries
    ///
    /// # Errors
    ///
    /// `Parse` for the first malformed file, `Persistence` without a manifest.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(root, Registries::builtin())
    }

    /// Open an existing model root with custom registries
    ///
    /// # Errors
    ///
    /// Same as [`ModelManager::open`].
    pub fn open_with(root: impl Into<PathBuf>, registries: Registries) -> Result<Self> {
        let root = root.into();
        run_logged("open_model", || {
            let (manifest, store) = Self::read_state(&root)?;
            let manager = Self::from_parts(root.clone(), registries, manifest, store);
            tracing::debug!(elements = manager.store.len(), "model opened");
            Ok(manager)
        })
    }

    fn from_parts(
        root: PathBuf,
        registries: Registries,
        manifest: Manifest,
        store: ElementStore,
    ) -> Self {
        let tracker = DependencyTracker::build(&store, &registries.links);
        Self {
            root,
            registries,
            manifest,
            store,
            tracker,
            revision: 1,
            committed_at: HashMap::new(),
        }
    }

    /// Read a model root from disk without touching any manager.
    ///
    /// Blocking I/O; the sync server calls this off its writer task and then
    /// hands the result to [`ModelManager::install`].
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be loaded.
    pub fn read_state(root: &Path) -> Result<(Manifest, ElementStore)> {
        dr_store::load_model(root)?.into_strict()
    }

    /// Load and validate a model root without opening it.
    ///
    /// Malformed files are reported in `failures` and the rest of the model
    /// is still validated.
    ///
    /// # Errors
    ///
    /// Only a missing or unreadable manifest fails the scan.
    pub fn scan(root: &Path, registries: &Registries) -> Result<ScanReport> {
        run_logged("scan_model", || {
            let loaded = dr_store::load_model(root)?;
            let report = validate_model(&loaded.store, &registries.links, &registries.schemas);
            Ok(ScanReport {
                failures: loaded.failures,
                report,
            })
        })
    }

    /// Swap in freshly read state, returning what changed.
    ///
    /// The revision advances only when the element set or the manifest
    /// changed.
    pub fn install(&mut self, manifest: Manifest, store: ElementStore) -> ModelDiff {
        let next = self.revision + 1;
        let mut diff = compute_diff(&self.store, &store, self.revision, next);
        if diff.is_empty() && manifest == self.manifest {
            diff.to_revision = self.revision;
            return diff;
        }

        for id in diff
            .added_ids()
            .into_iter()
            .chain(diff.changed_ids())
            .chain(diff.removed.iter().map(String::as_str))
        {
            self.committed_at.insert(id.to_string(), next);
        }
        self.manifest = manifest;
        self.store = store;
        self.tracker = DependencyTracker::build(&self.store, &self.registries.links);
        self.revision = next;
        diff
    }

    /// Re-read the model root, keeping the current state if the read fails
    ///
    /// # Errors
    ///
    /// `Parse`/`Io` from the read; the committed state is untouched.
    pub fn reload(&mut self) -> Result<ModelDiff> {
        let root = self.root.clone();
        run_logged("reload_model", || {
            let (manifest, store) = Self::read_state(&root)?;
            Ok(self.install(manifest, store))
        })
    }

    /// Run one mutation to a terminal state
    ///
    /// # Errors
    ///
    /// * `ConcurrencyConflict` - the target was committed after `base_revision`;
    ///   never raised for requests without one
    /// * `MutationRejected` - the validate chain found error-severity issues
    /// * `NotFound`, `DuplicateId`, `LayerDisabled`, `InvalidInput` - bad command
    /// * `Io`/`Serialization` - persisting failed; nothing was swapped in
    pub fn submit(&mut self, request: MutationRequest) -> Result<CommitReceipt> {
        let op = request.command.op_name();
        let request_id = request.request_id.clone();
        run_logged(op, || {
            self.commit(request).map_err(|e| match &request_id {
                Some(id) => e.with_request_id(id.clone()),
                None => e,
            })
        })
    }

    fn commit(&mut self, request: MutationRequest) -> Result<CommitReceipt> {
        self.check_base(&request)?;

        let outcome = apply(&self.store, request.command, &self.registries)?;

        let mut layers = BTreeSet::new();
        if let Some(layer) = outcome.store.layer_of(&outcome.element_id) {
            layers.insert(layer);
        }
        if let Some(removed) = &outcome.removed {
            layers.insert(removed.layer);
        }
        layers.extend(outcome.touched.iter().filter_map(|id| outcome.store.layer_of(id)));
        let layers: Vec<LayerName> = layers.into_iter().collect();

        // Disk first: a failed write must leave the committed store in place
        dr_store::save_layers(&self.root, &self.manifest, &outcome.store, &layers)?;

        let next = self.revision + 1;
        let diff = compute_diff(&self.store, &outcome.store, self.revision, next);
        self.store = outcome.store;
        self.tracker = DependencyTracker::build(&self.store, &self.registries.links);
        self.revision = next;
        self.committed_at.insert(outcome.element_id.clone(), next);
        for id in &outcome.touched {
            self.committed_at.insert(id.clone(), next);
        }

        tracing::debug!(
            element_id = %outcome.element_id,
            revision = next,
            warnings = outcome.warnings.len(),
            "mutation committed"
        );
        Ok(CommitReceipt {
            revision: next,
            kind: outcome.kind,
            element_id: outcome.element_id,
            touched: outcome.touched,
            warnings: outcome.warnings,
            diff,
        })
    }

    fn check_base(&self, request: &MutationRequest) -> Result<()> {
        let Some(base) = request.base_revision else {
            return Ok(());
        };
        if base > self.revision {
            return Err(ExError::new(ExErrorKind::InvalidInput).with_message(format!(
                "Base revision {} is ahead of the model (revision {})",
                base, self.revision
            )));
        }
        let Some(id) = request.conflict_key() else {
            return Ok(());
        };
        match self.committed_at.get(id) {
            Some(&committed) if committed > base => Err(DrError::ConcurrencyConflict {
                element_id: id.to_string(),
                base_revision: base,
                committed_revision: committed,
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Add an element to an enabled layer
    ///
    /// # Errors
    ///
    /// See [`ModelManager::submit`].
    pub fn add_element(&mut self, layer: LayerName, draft: ElementDraft) -> Result<CommitReceipt> {
        self.submit(MutationRequest::new(Command::AddElement { layer, draft }))
    }

    /// Replace an element's content
    ///
    /// # Errors
    ///
    /// See [`ModelManager::submit`].
    pub fn update_element(&mut self, id: &str, draft: ElementDraft) -> Result<CommitReceipt> {
        self.submit(MutationRequest::new(Command::UpdateElement {
            id: id.to_string(),
            draft,
        }))
    }

    /// Remove an element; `cascade` clears dependents' link fields
    ///
    /// # Errors
    ///
    /// See [`ModelManager::submit`]; without `cascade`, inbound links reject
    /// the removal with `would-dangle` issues.
    pub fn remove_element(&mut self, id: &str, cascade: bool) -> Result<CommitReceipt> {
        self.submit(MutationRequest::new(Command::RemoveElement {
            id: id.to_string(),
            cascade,
        }))
    }

    /// Full validation of the committed model. Never blocks reads and never
    /// fails; issues from earlier edits are reported, not rejected.
    pub fn validate(&self) -> ValidationReport {
        log_op_start!("validate_model");
        let start = Instant::now();
        let report = validate_model(&self.store, &self.registries.links, &self.registries.schemas);
        log_op_end!(
            "validate_model",
            duration_ms = start.elapsed().as_millis() as u64,
            issue_count = report.issues.len()
        );
        report
    }

    /// Enable a catalog layer, creating its directory.
    /// Returns false if it was already enabled.
    ///
    /// # Errors
    ///
    /// `Io` if the manifest or directory cannot be written.
    pub fn enable_layer(&mut self, layer: LayerName) -> Result<bool> {
        run_logged("enable_layer", || {
            let mut manifest = self.manifest.clone();
            if !manifest.enable(layer) {
                return Ok(false);
            }
            let mut store = self.store.clone();
            store.add_layer(layer);
            if let Some(entry) = manifest.entry(layer) {
                // Files left from an earlier enable come back with the layer
                let dir = dr_store::manifest::layer_dir(&self.root, entry);
                for element in dr_store::load_layer(&dir, layer)? {
                    store.insert(element)?;
                }
            }
            dr_store::update_manifest(&self.root, &manifest)?;
            self.install(manifest, store);
            Ok(true)
        })
    }

    /// Disable a layer. Its files stay on disk; its elements leave the model.
    /// Returns false if it was not enabled.
    ///
    /// # Errors
    ///
    /// `MutationRejected` with `would-dangle` issues while elements of other
    /// enabled layers still link into it.
    pub fn disable_layer(&mut self, layer: LayerName) -> Result<bool> {
        run_logged("disable_layer", || {
            if !self.manifest.is_enabled(layer) {
                return Ok(false);
            }
            let issues = layer_removal_issues(&self.store, layer);
            if !issues.is_empty() {
                return Err(ExError::from(DrError::MutationRejected {
                    element_id: layer.to_string(),
                    issues,
                })
                .with_layer(layer.as_str()));
            }
            let mut manifest = self.manifest.clone();
            manifest.disable(layer);
            dr_store::update_manifest(&self.root, &manifest)?;

            let mut store = self.store.clone();
            store.remove_layer(layer);
            self.install(manifest, store);
            Ok(true)
        })
    }

    /// Elements `id` leads up to by following its links
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn trace_upward(&self, id: &str, max_depth: Option<usize>) -> Result<Vec<String>> {
        Ok(self.tracker.reachable_from(id, Direction::Forward, max_depth)?)
    }

    /// Elements that lead up to `id`
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn trace_downward(&self, id: &str, max_depth: Option<usize>) -> Result<Vec<String>> {
        Ok(self.tracker.reachable_from(id, Direction::Backward, max_depth)?)
    }

    /// Everything that directly or transitively depends on `id`
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn impact(&self, id: &str) -> Result<Vec<String>> {
        self.trace_downward(id, None)
    }

    /// Shortest link path between two elements, following links forward
    /// first and against their direction otherwise
    ///
    /// # Errors
    ///
    /// `NotFound` if either id is unknown.
    pub fn path_between(&self, from: &str, to: &str) -> Result<Option<Vec<String>>> {
        if let Some(path) = self.tracker.shortest_path(from, to)? {
            return Ok(Some(path));
        }
        Ok(self.tracker.shortest_path_in(from, to, Direction::Backward)?)
    }

    /// Filtered cross-layer view around a seed element
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown seed.
    pub fn project(&self, seed: &str, filter: &ProjectionFilter) -> Result<Projection> {
        Ok(project(&self.store, &self.tracker, seed, filter)?)
    }

    /// Validated, read-only copy of the committed model
    ///
    /// # Errors
    ///
    /// `Serialization` if the digest cannot be computed.
    pub fn snapshot(&self) -> Result<ModelSnapshot> {
        let report = validate_model(&self.store, &self.registries.links, &self.registries.schemas);
        Ok(ModelSnapshot::capture(
            self.revision,
            self.manifest.clone(),
            self.store.clone(),
            report,
        )?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Bracket an operation with start and end/end_error events
fn run_logged<T>(op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    log_op_start!(op);
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = elapsed);
        }
        Err(e) if e.kind() == ExErrorKind::MutationRejected => {
            log_op_rejected!(op, issue_count = e.issues().len(), duration_ms = elapsed);
        }
        Err(e) => {
            log_op_error!(op, e.clone(), duration_ms = elapsed);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_core::IssueCode;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ModelManager {
        ModelManager::init(dir.path(), "shop", &[LayerName::Motivation, LayerName::Business])
            .unwrap()
    }

    #[test]
    fn test_revision_advances_per_commit() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        assert_eq!(m.revision(), 1);

        let receipt = m
            .add_element(LayerName::Motivation, ElementDraft::new("goal", "Grow"))
            .unwrap();

        assert_eq!(receipt.revision, 2);
        assert_eq!(m.revision(), 2);
        assert_eq!(receipt.diff.added_ids(), vec!["goal-grow"]);
    }

    #[test]
    fn test_stale_base_revision_conflicts() {
        // Given: goal-1 committed at revision 2
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        m.add_element(LayerName::Motivation, ElementDraft::new("goal", "G").with_id("goal-1"))
            .unwrap();
        let base = 1;

        // When: an update prepared against revision 1 arrives
        let request = MutationRequest::new(Command::UpdateElement {
            id: "goal-1".into(),
            draft: ElementDraft::new("goal", "Renamed"),
        })
        .with_base_revision(base);
        let err = m.submit(request).unwrap_err();

        // Then: it is rejected, not merged
        assert_eq!(err.kind(), ExErrorKind::ConcurrencyConflict);
        assert_eq!(m.store().get("goal-1").unwrap().name, "G");
    }

    #[test]
    fn test_current_base_revision_commits() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        m.add_element(LayerName::Motivation, ElementDraft::new("goal", "G").with_id("goal-1"))
            .unwrap();

        let request = MutationRequest::new(Command::UpdateElement {
            id: "goal-1".into(),
            draft: ElementDraft::new("goal", "Renamed"),
        })
        .with_base_revision(m.revision());

        assert!(m.submit(request).is_ok());
    }

    #[test]
    fn test_future_base_revision_is_invalid() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        let request = MutationRequest::new(Command::RemoveElement {
            id: "goal-1".into(),
            cascade: false,
        })
        .with_base_revision(99);

        let err = m.submit(request).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_request_id_attached_to_errors() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        let request_id = RequestId::new();
        let request = MutationRequest::new(Command::RemoveElement {
            id: "missing".into(),
            cascade: false,
        })
        .with_request_id(request_id.clone());

        let err = m.submit(request).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.request_id(), Some(&request_id));
    }

    #[test]
    fn test_install_without_changes_keeps_revision() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        let manifest = m.manifest().clone();
        let store = m.store().clone();

        let diff = m.install(manifest, store);

        assert!(diff.is_empty());
        assert_eq!(m.revision(), 1);
    }

    #[test]
    fn test_disable_layer_with_inbound_links_rejected() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        m.add_element(LayerName::Motivation, ElementDraft::new("goal", "G").with_id("goal-1"))
            .unwrap();
        m.add_element(
            LayerName::Business,
            ElementDraft::new("service", "S")
                .with_id("service-1")
                .with_link("supports-goals", ["goal-1"]),
        )
        .unwrap();

        let err = m.disable_layer(LayerName::Motivation).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::MutationRejected);
        assert!(err.has_issue(IssueCode::WouldDangle));
        assert!(m.manifest().is_enabled(LayerName::Motivation));
    }
}
