//! Refresh scheduler: serializes snapshot builds onto one worker thread
//!
//! Refresh requests may arrive from any thread (timer ticks, manual
//! requests, several widget instances at once). They are queued in
//! arrival order and executed one at a time by a single worker that owns
//! the snapshot builder and the displayer.

use super::SnapshotBuilder;
use anyhow::{Context, Result};
use bg_widget_core::BoxedDisplayer;
use chrono::Utc;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, error, trace, warn};
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Instant;

/// One queued refresh for one widget instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub widget_id: u32,
    /// What triggered the refresh, for logging
    pub from: String,
}

/// Commands for the refresh worker
enum WorkerCommand {
    Refresh(RefreshRequest),
    Shutdown,
}

/// Cloneable handle for enqueueing refreshes from other threads
#[derive(Clone)]
pub struct RefreshHandle {
    sender: Sender<WorkerCommand>,
}

impl RefreshHandle {
    /// Enqueue one refresh per widget id, in order
    pub fn request_refresh(&self, widget_ids: &[u32], from: &str) {
        enqueue(&self.sender, widget_ids, from);
    }
}

fn enqueue(sender: &Sender<WorkerCommand>, widget_ids: &[u32], from: &str) {
    for &widget_id in widget_ids {
        let request = RefreshRequest {
            widget_id,
            from: from.to_string(),
        };
        if sender.send(WorkerCommand::Refresh(request)).is_err() {
            warn!("Refresh worker stopped, dropping refresh for widget {}", widget_id);
            return;
        }
    }
}

/// Owns the refresh worker thread
///
/// Created once at start-up and handed to whatever issues refreshes.
/// Dropping the scheduler drains the queue and joins the worker.
pub struct RefreshScheduler {
    sender: Sender<WorkerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawn the worker thread
    pub fn new(builder: SnapshotBuilder, displayer: BoxedDisplayer) -> Result<Self> {
        let (sender, receiver) = unbounded::<WorkerCommand>();

        let worker = std::thread::Builder::new()
            .name("widget-refresh".to_string())
            .spawn(move || run_worker(receiver, builder, displayer))
            .context("Failed to spawn refresh worker")?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// Handle that can be moved to other threads, `None` after shutdown
    pub fn handle(&self) -> Option<RefreshHandle> {
        self.worker.as_ref().map(|_| RefreshHandle {
            sender: self.sender.clone(),
        })
    }

    /// Enqueue one refresh per widget id, in order
    pub fn request_refresh(&self, widget_ids: &[u32], from: &str) {
        if self.worker.is_none() {
            warn!("Refresh requested after shutdown (from {})", from);
            return;
        }
        enqueue(&self.sender, widget_ids, from);
    }

    /// Run everything already queued, then stop and join the worker
    ///
    /// Live [`RefreshHandle`] clones do not keep the worker alive; requests
    /// they send after this point are dropped.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            // Queued behind every request sent so far
            let _ = self.sender.send(WorkerCommand::Shutdown);
            if let Err(e) = worker.join() {
                error!("Refresh worker panicked: {:?}", e);
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    receiver: Receiver<WorkerCommand>,
    builder: SnapshotBuilder,
    mut displayer: BoxedDisplayer,
) {
    debug!("Refresh worker started (displayer: {})", displayer.id());

    for command in receiver.iter() {
        let request = match command {
            WorkerCommand::Refresh(request) => request,
            WorkerCommand::Shutdown => {
                debug!("Refresh worker received shutdown signal");
                break;
            }
        };

        if !builder.providers().status.is_initialized() {
            debug!(
                "Host not initialized, skipping refresh for widget {} (from {})",
                request.widget_id, request.from
            );
            continue;
        }

        debug!(
            "Refreshing widget {} (from {})",
            request.widget_id, request.from
        );
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let snapshot = builder.build(Utc::now());
            displayer.render(request.widget_id, &snapshot)
        }));

        match outcome {
            Ok(Ok(())) => trace!(
                "Widget {} refreshed in {:?}",
                request.widget_id,
                start.elapsed()
            ),
            Ok(Err(e)) => error!("Failed to render widget {}: {:#}", request.widget_id, e),
            Err(_) => error!("Refresh for widget {} panicked", request.widget_id),
        }
    }

    debug!("Refresh worker exiting");
}
