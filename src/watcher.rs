//! File watcher for a local workbook
//!
//! Watches the workbook's directory, filters events to the workbook file and
//! re-reads every cached worksheet once the writes settle.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::cache::{RefreshSummary, SheetCache};
use crate::error::DashboardError;

/// Debounce window for file system events
const DEBOUNCE_MS: u64 = 500;

/// Start watching `workbook` for changes.
///
/// Spawns a background task that:
/// 1. Watches the workbook's parent directory (editors replace files on save)
/// 2. Ignores events for any other file
/// 3. Debounces rapid changes (500ms window)
/// 4. Refreshes every cached worksheet and sends the summary
///
/// The task stops when the returned receiver is dropped. Must be called
/// from within a tokio runtime.
pub fn start_workbook_watcher(
    workbook: &Path,
    cache: Arc<SheetCache>,
) -> Result<mpsc::Receiver<RefreshSummary>, DashboardError> {
    let file_name = workbook.file_name().map(OsString::from).ok_or_else(|| {
        DashboardError::Configuration(format!(
            "Cannot watch '{}': not a file path",
            workbook.display()
        ))
    })?;
    let dir = watch_dir(workbook);

    // Channel for forwarding notify events to the async debouncer
    let (fs_tx, mut fs_rx) = mpsc::channel::<()>(64);
    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| {
            if let Ok(event) = result {
                if is_workbook_change(&event, &file_name) {
                    let _ = fs_tx.try_send(());
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| {
        DashboardError::Configuration(format!("Failed to create file watcher: {}", e))
    })?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| {
            DashboardError::Configuration(format!("Failed to watch {}: {}", dir.display(), e))
        })?;
    log::info!("Watcher: watching {} for changes", workbook.display());

    let (summary_tx, summary_rx) = mpsc::channel::<RefreshSummary>(8);
    tokio::spawn(async move {
        // Keep the watcher alive for as long as the task runs.
        let _watcher = watcher;

        // Debounce loop: coalesce rapid events into a single refresh
        while fs_rx.recv().await.is_some() {
            sleep(Duration::from_millis(DEBOUNCE_MS)).await;
            while fs_rx.try_recv().is_ok() {}

            let summary = cache.refresh_cached().await;
            log::info!(
                "Watcher: workbook changed, refreshed {} worksheet(s), {} failed",
                summary.refreshed.len(),
                summary.failed.len()
            );
            if summary_tx.send(summary).await.is_err() {
                break; // Receiver dropped
            }
        }

        log::info!("Watcher: stopped");
    });

    Ok(summary_rx)
}

fn watch_dir(workbook: &Path) -> PathBuf {
    match workbook.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_workbook_change(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
