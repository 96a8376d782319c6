//! Visualization sync server
//!
//! One writer thread owns the [`ModelManager`], the observer registry and
//! every change to the annotation map. Requests reach it through a bounded
//! queue and run one at a time in arrival order: commands from handles,
//! annotation requests from observers and file-change batches from the
//! watcher all take the same path.
//!
//! Reads never wait for the writer. The current [`ModelSnapshot`] sits
//! behind an `RwLock<Arc<_>>` that the writer only holds long enough to
//! swap in a snapshot it has already built.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Instant;

use dr_core::diff::{compute_diff, render_human_summary};
use dr_core::diff::model::ModelDiff;
use dr_core::errors::{DrError, ExError, ExErrorKind};
use dr_core::snapshot::ModelSnapshot;
use dr_core::{log_op_end, log_op_error, log_op_start};
use dr_core_types::{ObserverId, RequestContext};
use dr_engine::{
    apply_engine_command, EngineCommand, EngineCommandResult, ModelManager, MutationRequest,
};
use tokio::sync::{mpsc, oneshot};

use crate::annotations::{Annotation, AnnotationStore};
use crate::config::SyncConfig;
use crate::observers::{MessageReceiver, MessageSender, ObserverRegistry};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::watcher::ModelWatcher;

pub type Result<T> = std::result::Result<T, ExError>;

type SharedSnapshot = Arc<RwLock<Arc<ModelSnapshot>>>;
type SharedAnnotations = Arc<RwLock<AnnotationStore>>;

enum Request {
    Subscribe {
        label: Option<String>,
        messages: MessageSender,
        reply: oneshot::Sender<ObserverId>,
    },
    Unsubscribe {
        observer: ObserverId,
        reply: oneshot::Sender<bool>,
    },
    AddAnnotation {
        origin: Option<ObserverId>,
        element_id: String,
        author: String,
        text: String,
        reply: oneshot::Sender<Result<Annotation>>,
    },
    Submit {
        command: EngineCommand,
        origin: Option<ObserverId>,
        reply: oneshot::Sender<Result<EngineCommandResult>>,
    },
    FilesChanged {
        paths: Vec<PathBuf>,
        reply: Option<oneshot::Sender<Result<ModelDiff>>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// An observer session: its id and the messages addressed to it.
///
/// The first two messages are always `subscribed` and `snapshot`. The
/// stream ends when the observer unsubscribes, falls behind, or the server
/// stops.
#[derive(Debug)]
pub struct Subscription {
    pub id: ObserverId,
    pub messages: MessageReceiver,
}

pub struct SyncServer;

impl SyncServer {
    /// Take ownership of `manager` and start the writer thread, plus the
    /// file watcher when `config.watch` is set.
    ///
    /// Needs no runtime to start; the returned handle's methods are async.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - unusable configuration
    /// * `Serialization` - the initial snapshot cannot be built
    /// * `Io` - the watcher or the writer thread cannot be started
    pub fn start(manager: ModelManager, config: SyncConfig) -> Result<SyncHandle> {
        config.validate()?;
        let start = Instant::now();
        log_op_start!("sync_start", root = %manager.root().display());

        let snapshot: SharedSnapshot = Arc::new(RwLock::new(Arc::new(manager.snapshot()?)));
        let annotations: SharedAnnotations = Arc::new(RwLock::new(AnnotationStore::new()));
        let (requests_tx, requests_rx) = mpsc::channel(config.request_queue_capacity);

        let watcher = if config.watch {
            let weak = requests_tx.downgrade();
            Some(ModelWatcher::start(
                manager.root(),
                config.debounce(),
                move |paths| {
                    // The handles are gone once every strong sender is dropped
                    let Some(requests) = weak.upgrade() else {
                        return false;
                    };
                    requests
                        .blocking_send(Request::FilesChanged { paths, reply: None })
                        .is_ok()
                },
            )?)
        } else {
            None
        };

        let writer = Writer {
            manager,
            config: config.clone(),
            observers: ObserverRegistry::new(),
            snapshot: snapshot.clone(),
            annotations: annotations.clone(),
        };
        thread::Builder::new()
            .name("dr-sync-writer".to_string())
            .spawn(move || writer.run(requests_rx, watcher))
            .map_err(|e| {
                ExError::new(ExErrorKind::Io)
                    .with_op("sync_start")
                    .with_message(e.to_string())
            })?;

        log_op_end!("sync_start", duration_ms = start.elapsed().as_millis() as u64);
        Ok(SyncHandle {
            requests: requests_tx,
            snapshot,
            annotations,
            config: Arc::new(config),
        })
    }
}

/// Cloneable access to a running server
#[derive(Clone)]
pub struct SyncHandle {
    requests: mpsc::Sender<Request>,
    snapshot: SharedSnapshot,
    annotations: SharedAnnotations,
    config: Arc<SyncConfig>,
}

impl SyncHandle {
    /// Join as an observer
    ///
    /// # Errors
    ///
    /// `ServerUnavailable` once the server has stopped.
    pub async fn subscribe(&self, label: Option<String>) -> Result<Subscription> {
        let (messages_tx, messages) = mpsc::channel(self.config.observer_channel_capacity);
        let (reply, rx) = oneshot::channel();
        self.request(
            Request::Subscribe {
                label,
                messages: messages_tx,
                reply,
            },
            rx,
        )
        .await
        .map(|id| Subscription { id, messages })
    }

    /// Leave; returns false if the observer was not connected
    ///
    /// # Errors
    ///
    /// `ServerUnavailable` once the server has stopped.
    pub async fn unsubscribe(&self, observer: ObserverId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Unsubscribe { observer, reply }, rx).await
    }

    /// Attach a note to an element and tell the other observers.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no element with that id in the current model
    /// * `ServerUnavailable` - the server has stopped
    pub async fn add_annotation(
        &self,
        origin: Option<ObserverId>,
        element_id: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Annotation> {
        let (reply, rx) = oneshot::channel();
        let request = Request::AddAnnotation {
            origin,
            element_id: element_id.into(),
            author: author.into(),
            text: text.into(),
            reply,
        };
        self.request(request, rx).await?
    }

    pub fn annotations_for(&self, element_id: &str) -> Vec<Annotation> {
        read_lock(&self.annotations).for_element(element_id).to_vec()
    }

    /// Queue an engine command behind every earlier request.
    ///
    /// # Errors
    ///
    /// Whatever the engine returns for the command, or `ServerUnavailable`.
    pub async fn submit(
        &self,
        command: EngineCommand,
        origin: Option<ObserverId>,
    ) -> Result<EngineCommandResult> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Request::Submit {
                command,
                origin,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Reload the model root now, as if the watcher had fired. Returns the
    /// diff that was broadcast (empty when nothing changed).
    ///
    /// # Errors
    ///
    /// `Parse`/`Io` when the root cannot be read; the previous snapshot stays
    /// current and observers get an `error` message.
    pub async fn notify_changed(&self) -> Result<ModelDiff> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Request::FilesChanged {
                paths: Vec::new(),
                reply: Some(reply),
            },
            rx,
        )
        .await?
    }

    /// Current committed snapshot
    pub fn snapshot(&self) -> Arc<ModelSnapshot> {
        read_lock(&self.snapshot).clone()
    }

    /// Handle one message from an observer's transport. Returns an
    /// immediate reply for that observer, if there is one; everything else
    /// arrives on its subscription.
    pub async fn dispatch(&self, observer: ObserverId, message: ClientMessage) -> Option<ServerMessage> {
        let outcome = match message {
            ClientMessage::Subscribe { .. } => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("dispatch")
                .with_message(format!("{} is already subscribed", observer))),
            ClientMessage::Unsubscribe => self.unsubscribe(observer).await.map(|_| ()),
            ClientMessage::AddAnnotation {
                element_id,
                author,
                text,
            } => self
                .add_annotation(Some(observer), element_id, author, text)
                .await
                .map(|_| ()),
            ClientMessage::Mutate {
                command,
                base_revision,
            } => {
                let mut request = MutationRequest::new(command);
                if let Some(revision) = base_revision {
                    request = request.with_base_revision(revision);
                }
                self.submit(EngineCommand::Mutate(request), Some(observer))
                    .await
                    .map(|_| ())
            }
        };
        outcome.err().map(|e| ServerMessage::from_error(&e))
    }

    /// Stop the writer and the watcher. Observer streams end; later calls
    /// fail with `ServerUnavailable`.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.requests.send(Request::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn request<T>(&self, request: Request, reply: oneshot::Receiver<T>) -> Result<T> {
        self.requests
            .send(request)
            .await
            .map_err(|_| unavailable())?;
        reply.await.map_err(|_| unavailable())
    }
}

fn unavailable() -> ExError {
    ExError::new(ExErrorKind::ServerUnavailable).with_message("Sync server has stopped")
}

// A panicking writer must not take the read side down with it
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Writer {
    manager: ModelManager,
    config: SyncConfig,
    observers: ObserverRegistry,
    snapshot: SharedSnapshot,
    annotations: SharedAnnotations,
}

impl Writer {
    fn run(mut self, mut requests: mpsc::Receiver<Request>, mut watcher: Option<ModelWatcher>) {
        let mut shutdown_reply = None;
        while let Some(request) = requests.blocking_recv() {
            match request {
                Request::Subscribe {
                    label,
                    messages,
                    reply,
                } => {
                    let _ = reply.send(self.subscribe(label, messages));
                }
                Request::Unsubscribe { observer, reply } => {
                    let _ = reply.send(self.observers.unregister(observer));
                }
                Request::AddAnnotation {
                    origin,
                    element_id,
                    author,
                    text,
                    reply,
                } => {
                    let _ = reply.send(self.add_annotation(origin, element_id, author, text));
                }
                Request::Submit {
                    command,
                    origin,
                    reply,
                } => {
                    let _ = reply.send(self.submit(command, origin));
                }
                Request::FilesChanged { paths, reply } => {
                    let result = self.reload(paths);
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                Request::Shutdown { reply } => {
                    shutdown_reply = Some(reply);
                    break;
                }
            }
        }

        // Close the queue first so a watcher blocked on a full queue wakes up
        requests.close();
        if let Some(mut watcher) = watcher.take() {
            watcher.stop();
        }
        tracing::info!(observers = self.observers.len(), "sync server stopped");
        drop(self);
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn subscribe(&mut self, label: Option<String>, messages: MessageSender) -> ObserverId {
        let start = Instant::now();
        log_op_start!("subscribe");
        let snapshot = read_lock(&self.snapshot).clone();
        let observer = self.observers.register(label, messages);

        // Nothing else can reach the observer before these two
        let delivered = self.observers.send_to(
            observer,
            Arc::new(ServerMessage::Subscribed {
                observer,
                revision: snapshot.revision,
            }),
        ) && self.observers.send_to(
            observer,
            Arc::new(ServerMessage::Snapshot {
                snapshot: snapshot.document(),
                annotations: read_lock(&self.annotations).all(),
            }),
        );
        if !delivered {
            tracing::warn!(observer_id = %observer, "observer dropped before snapshot delivery");
        }

        log_op_end!(
            "subscribe",
            duration_ms = start.elapsed().as_millis() as u64,
            observer_id = %observer,
            revision = snapshot.revision
        );
        observer
    }

    fn add_annotation(
        &mut self,
        origin: Option<ObserverId>,
        element_id: String,
        author: String,
        text: String,
    ) -> Result<Annotation> {
        let start = Instant::now();
        log_op_start!("add_annotation", element_id = %element_id);

        if !self.manager.store().contains(&element_id) {
            let err = ExError::from(DrError::ElementNotFound {
                element_id: element_id.clone(),
            })
            .with_op("add_annotation");
            log_op_error!("add_annotation", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
            return Err(err);
        }

        let annotation = Annotation::new(element_id, author, text);
        write_lock(&self.annotations).add(annotation.clone());

        let reached = self.observers.broadcast(
            Arc::new(ServerMessage::AnnotationAdded {
                annotation: annotation.clone(),
                echo: false,
            }),
            origin,
        );
        if let (true, Some(origin)) = (self.config.echo_annotations, origin) {
            self.observers.send_to(
                origin,
                Arc::new(ServerMessage::AnnotationAdded {
                    annotation: annotation.clone(),
                    echo: true,
                }),
            );
        }

        log_op_end!(
            "add_annotation",
            duration_ms = start.elapsed().as_millis() as u64,
            observers_reached = reached
        );
        Ok(annotation)
    }

    fn submit(&mut self, command: EngineCommand, origin: Option<ObserverId>) -> Result<EngineCommandResult> {
        let start = Instant::now();
        let command_op = command.op_name();
        let ctx = origin.map(RequestContext::for_observer).unwrap_or_default();
        let command = match command {
            EngineCommand::Mutate(request) if request.request_id.is_none() => {
                EngineCommand::Mutate(request.with_request_id(ctx.request_id.clone()))
            }
            other => other,
        };
        log_op_start!("sync_submit", command = command_op, request_id = %ctx.request_id);

        let result = match apply_engine_command(&mut self.manager, command) {
            Ok(result) => result,
            Err(err) => {
                log_op_error!("sync_submit", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
                return Err(err);
            }
        };
        if let Err(err) = self.publish(origin) {
            log_op_error!("sync_submit", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
            return Err(err);
        }

        if let (Some(origin), EngineCommandResult::Committed(receipt)) = (origin, &result) {
            self.observers.send_to(
                origin,
                Arc::new(ServerMessage::MutationCommitted {
                    revision: receipt.revision,
                    element_id: receipt.element_id.clone(),
                    warnings: receipt.warnings.clone(),
                }),
            );
        }

        log_op_end!(
            "sync_submit",
            duration_ms = start.elapsed().as_millis() as u64,
            revision = self.manager.revision()
        );
        Ok(result)
    }

    fn reload(&mut self, paths: Vec<PathBuf>) -> Result<ModelDiff> {
        let start = Instant::now();
        log_op_start!("sync_reload", files = paths.len());

        let outcome = self.manager.reload().and_then(|_| self.publish(None));
        match outcome {
            Ok(diff) => {
                log_op_end!(
                    "sync_reload",
                    duration_ms = start.elapsed().as_millis() as u64,
                    changed = diff.len()
                );
                Ok(diff)
            }
            Err(err) => {
                // The previous snapshot stays current
                self.observers
                    .broadcast(Arc::new(ServerMessage::from_error(&err)), None);
                log_op_error!("sync_reload", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
                Err(err)
            }
        }
    }

    /// Swap in a snapshot of the manager's state if its revision moved,
    /// broadcasting the diff when elements changed
    fn publish(&mut self, origin: Option<ObserverId>) -> Result<ModelDiff> {
        let previous = read_lock(&self.snapshot).clone();
        if previous.revision == self.manager.revision() {
            return Ok(ModelDiff {
                from_revision: previous.revision,
                to_revision: previous.revision,
                ..ModelDiff::default()
            });
        }

        let next = Arc::new(self.manager.snapshot()?);
        let diff = compute_diff(&previous.store, &next.store, previous.revision, next.revision);
        *write_lock(&self.snapshot) = next.clone();

        // Every revision is announced, element-free ones included, so observers
        // always see a contiguous from/to chain
        let reached = self.observers.broadcast(
            Arc::new(ServerMessage::Diff {
                diff: diff.clone(),
                digest: next.digest.clone(),
                issues: next.report.issues.clone(),
                origin,
            }),
            None,
        );
        tracing::debug!(
            revision = next.revision,
            observers_reached = reached,
            summary = %render_human_summary(&diff),
            "diff broadcast"
        );
        Ok(diff)
    }
}
