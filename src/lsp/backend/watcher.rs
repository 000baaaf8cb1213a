//! Filesystem watching
//!
//! `notify` delivers raw events on a std channel. A blocking task collects
//! them into batches that close after 100 ms without new events, and an
//! async task applies each batch to the resource index, one event at a time,
//! in arrival order.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;
use tracing::{debug, info, warn};

use super::state::CfxBackend;
use crate::resources::WorkspaceEvent;

const BATCH_WINDOW: Duration = Duration::from_millis(100);

/// Translate one `notify` event into index events.
pub(crate) fn workspace_events(event: Event) -> Vec<WorkspaceEvent> {
    let Event { kind, mut paths, .. } = event;
    match kind {
        EventKind::Create(_) => paths.into_iter().map(WorkspaceEvent::Created).collect(),
        EventKind::Remove(_) => paths.into_iter().map(WorkspaceEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            let to = paths.pop();
            let from = paths.pop();
            match (from, to) {
                (Some(from), Some(to)) => vec![WorkspaceEvent::Renamed { from, to }],
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.into_iter().map(WorkspaceEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.into_iter().map(WorkspaceEvent::Created).collect()
        }
        // Platforms that cannot pair renames report each side separately
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    WorkspaceEvent::Created(path)
                } else {
                    WorkspaceEvent::Removed(path)
                }
            })
            .collect(),
        EventKind::Modify(_) => paths.into_iter().map(WorkspaceEvent::Changed).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Append `incoming`, dropping exact repeats of the previous event.
fn push_coalesced(batch: &mut Vec<WorkspaceEvent>, incoming: Vec<WorkspaceEvent>) {
    for event in incoming {
        if batch.last() != Some(&event) {
            batch.push(event);
        }
    }
}

impl CfxBackend {
    /// Watch every workspace root recursively and keep the index in sync.
    pub(super) fn start_file_watcher(&self, roots: &[PathBuf]) -> notify::Result<()> {
        if roots.is_empty() {
            debug!("No workspace roots, file watcher not started");
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;
        for root in roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            info!("Watching {}", root.display());
        }
        *self.file_watcher.lock() = Some(watcher);

        let (batch_tx, mut batch_rx) = tokio::sync::mpsc::unbounded_channel::<Vec<WorkspaceEvent>>();
        Self::spawn_event_batcher(self.shutdown_tx.subscribe(), rx, batch_tx);

        let index = Arc::clone(&self.index);
        tokio::spawn(async move {
            while let Some(batch) = batch_rx.recv().await {
                debug!("Applying batch of {} filesystem event(s)", batch.len());
                for event in batch {
                    index.apply_event(event).await;
                }
            }
            debug!("File event applier terminated");
        });

        Ok(())
    }

    fn spawn_event_batcher(
        mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
        events: Receiver<notify::Result<Event>>,
        batches: UnboundedSender<Vec<WorkspaceEvent>>,
    ) {
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let shutdown_flag_clone = Arc::clone(&shutdown_flag);

        tokio::spawn(async move {
            let _ = shutdown_rx.recv().await;
            shutdown_flag_clone.store(true, Ordering::Relaxed);
            info!("File watcher received shutdown signal");
        });

        task::spawn_blocking(move || {
            let mut pending: Vec<WorkspaceEvent> = Vec::new();
            let mut last_event_time = Instant::now();

            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    info!("File watcher task exiting gracefully");
                    break;
                }

                match events.recv_timeout(BATCH_WINDOW) {
                    Ok(Ok(event)) => {
                        push_coalesced(&mut pending, workspace_events(event));
                        last_event_time = Instant::now();
                    }
                    Ok(Err(e)) => warn!("File watcher error: {}", e),
                    Err(RecvTimeoutError::Timeout) => {
                        if !pending.is_empty() && last_event_time.elapsed() >= BATCH_WINDOW {
                            info!("Processing batch of {} file change(s)", pending.len());
                            if batches.send(std::mem::take(&mut pending)).is_err() {
                                break;
                            }
                        }
                    }
                    // the watcher was dropped
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("File watcher task terminated");
        });
    }
}
