//! Persistence coordinator.
//!
//! Loads the workspace through a remote → local → default fallback chain and
//! persists every change: synchronously to the local cache, and to the remote
//! store through a debounced background writer that only ever sends the
//! latest snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use casefile_core::CaseError;
use casefile_core::error::Result;
use casefile_core::repository::{
    LocalCaseCache, PersistedCase, RemoteCaseRecord, RemoteCaseStore, UserSession,
};
use casefile_infrastructure::CaseFileCodec;

const REMOTE_SYNC_SERVICE: &str = "remote_sync";

/// Where a loaded workspace came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
    Default,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Remote => "remote",
            LoadSource::Local => "local",
            LoadSource::Default => "default",
        }
    }
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedCase {
    pub persisted: PersistedCase,
    pub source: LoadSource,
}

enum WriterCommand {
    Schedule(RemoteCaseRecord),
    Cancel,
    Flush(oneshot::Sender<()>),
    /// Drops the pending record and deletes the remote copy once any
    /// in-flight save has finished.
    Delete {
        user_id: String,
        ack: oneshot::Sender<Result<()>>,
    },
}

struct RemoteSync {
    store: Arc<dyn RemoteCaseStore>,
    session: UserSession,
    commands: mpsc::UnboundedSender<WriterCommand>,
    worker: JoinHandle<()>,
}

pub struct PersistenceCoordinator {
    codec: Arc<CaseFileCodec>,
    local: Arc<dyn LocalCaseCache>,
    remote: Option<RemoteSync>,
}

impl PersistenceCoordinator {
    pub fn new(codec: Arc<CaseFileCodec>, local: Arc<dyn LocalCaseCache>) -> Self {
        Self {
            codec,
            local,
            remote: None,
        }
    }

    /// Attaches a remote store for `session` and starts the debounced writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_remote(
        mut self,
        store: Arc<dyn RemoteCaseStore>,
        session: UserSession,
        debounce: Duration,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_remote_writer(store.clone(), receiver, debounce));
        tracing::info!(user_id = %session.user_id, debounce_ms = debounce.as_millis() as u64, "Remote sync enabled");
        self.remote = Some(RemoteSync {
            store,
            session,
            commands,
            worker,
        });
        self
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.remote.as_ref().map(|r| &r.session)
    }

    /// Loads the workspace. Never fails: unusable sources are logged and skipped.
    pub async fn load(&self) -> LoadedCase {
        if let Some(remote) = &self.remote {
            match remote.store.load(&remote.session.user_id).await {
                Ok(Some(record)) => match self.codec.decode(&record.content) {
                    Ok(persisted) => {
                        tracing::info!(source = "remote", user_id = %remote.session.user_id, "Loaded case file");
                        return LoadedCase {
                            persisted,
                            source: LoadSource::Remote,
                        };
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Remote case file unreadable, falling back to local")
                    }
                },
                Ok(None) => tracing::debug!("No remote case file, falling back to local"),
                Err(e) => tracing::warn!(error = %e, "Remote load failed, falling back to local"),
            }
        }

        match self.local.load() {
            Ok(Some(blob)) => match self.codec.decode(&blob) {
                Ok(persisted) => {
                    tracing::info!(source = "local", "Loaded case file");
                    return LoadedCase {
                        persisted,
                        source: LoadSource::Local,
                    };
                }
                Err(e) => tracing::warn!(error = %e, "Local case file unreadable, using defaults"),
            },
            Ok(None) => tracing::debug!("No local case file, using defaults"),
            Err(e) => tracing::warn!(error = %e, "Local load failed, using defaults"),
        }

        tracing::info!(source = "default", "Starting with a new case file");
        LoadedCase {
            persisted: PersistedCase::default(),
            source: LoadSource::Default,
        }
    }

    /// Writes the snapshot locally and schedules a debounced remote write.
    ///
    /// Failures are logged and never returned to the editing caller.
    pub fn persist(&self, persisted: &PersistedCase) {
        let blob = match self.codec.encode(persisted) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize case file");
                return;
            }
        };

        if let Err(e) = self.local.save(&blob) {
            tracing::warn!(error = %e, "Local save failed");
        }

        if let Some(remote) = &self.remote {
            let record = RemoteCaseRecord {
                user_id: remote.session.user_id.clone(),
                content: blob,
                updated_at: Utc::now(),
            };
            if remote.commands.send(WriterCommand::Schedule(record)).is_err() {
                tracing::warn!("Remote writer stopped, dropping remote save");
            }
        }
    }

    /// Drops a scheduled remote write that has not fired yet.
    pub fn cancel_pending(&self) {
        if let Some(remote) = &self.remote {
            let _ = remote.commands.send(WriterCommand::Cancel);
        }
    }

    /// Sends a scheduled remote write immediately and waits for it.
    pub async fn flush(&self) {
        if let Some(remote) = &self.remote {
            let (ack, done) = oneshot::channel();
            if remote.commands.send(WriterCommand::Flush(ack)).is_ok() {
                let _ = done.await;
            }
        }
    }

    /// Erases both the local and the remote copy.
    ///
    /// The remote delete is queued behind any save the writer is still
    /// sending, so a late save cannot bring the record back.
    pub async fn clear_all(&self) -> Result<()> {
        let local = self.local.clear();

        let remote = match &self.remote {
            Some(remote) => {
                let (ack, done) = oneshot::channel();
                let command = WriterCommand::Delete {
                    user_id: remote.session.user_id.clone(),
                    ack,
                };
                match remote.commands.send(command) {
                    Ok(()) => match done.await {
                        Ok(result) => result,
                        Err(_) => Err(CaseError::service(
                            REMOTE_SYNC_SERVICE,
                            "remote writer stopped before deleting",
                        )),
                    },
                    Err(_) => remote.store.delete(&remote.session.user_id).await,
                }
            }
            None => Ok(()),
        };

        match (local, remote) {
            (Ok(()), Ok(())) => {
                tracing::info!("Cleared local and remote case files");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to clear case files");
                Err(e)
            }
        }
    }

    /// Flushes any pending remote write and stops the writer.
    pub async fn shutdown(self) {
        if let Some(remote) = self.remote {
            drop(remote.commands);
            if let Err(e) = remote.worker.await {
                tracing::error!(error = %e, "Remote writer task failed");
            }
        }
    }
}

/// Holds at most one pending record; every new record restarts the quiet period.
async fn run_remote_writer(
    store: Arc<dyn RemoteCaseStore>,
    mut commands: mpsc::UnboundedReceiver<WriterCommand>,
    debounce: Duration,
) {
    let mut pending: Option<(RemoteCaseRecord, Instant)> = None;

    loop {
        let deadline = pending.as_ref().map(|(_, deadline)| *deadline);

        tokio::select! {
            command = commands.recv() => match command {
                Some(WriterCommand::Schedule(record)) => {
                    pending = Some((record, Instant::now() + debounce));
                }
                Some(WriterCommand::Cancel) => {
                    if pending.take().is_some() {
                        tracing::debug!("Cancelled pending remote write");
                    }
                }
                Some(WriterCommand::Flush(ack)) => {
                    if let Some((record, _)) = pending.take() {
                        write_remote(store.as_ref(), record).await;
                    }
                    let _ = ack.send(());
                }
                Some(WriterCommand::Delete { user_id, ack }) => {
                    if pending.take().is_some() {
                        tracing::debug!("Dropped pending remote write before delete");
                    }
                    let _ = ack.send(store.delete(&user_id).await);
                }
                None => {
                    if let Some((record, _)) = pending.take() {
                        write_remote(store.as_ref(), record).await;
                    }
                    break;
                }
            },
            () = async {
                if let Some(deadline) = deadline {
                    time::sleep_until(deadline).await;
                }
            }, if deadline.is_some() => {
                if let Some((record, _)) = pending.take() {
                    write_remote(store.as_ref(), record).await;
                }
            }
        }
    }
}

async fn write_remote(store: &dyn RemoteCaseStore, record: RemoteCaseRecord) {
    let user_id = record.user_id.clone();
    match store.save(record).await {
        Ok(()) => tracing::debug!(user_id = %user_id, "Remote save completed"),
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Remote save failed"),
    }
}
