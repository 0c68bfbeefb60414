// Housekeeping - periodic removal of stale downloads

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

/// Result of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: usize,
    /// Listed but gone before we got to it
    pub already_gone: usize,
    pub kept: usize,
}

/// Process-owned housekeeping state, shared with the status endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct HousekeepingState {
    /// Unix seconds of the last completed sweep
    pub last_sweep: Option<i64>,
    pub last_report: Option<SweepReport>,
    pub removed_total: u64,
}

#[derive(Clone)]
pub struct Housekeeper {
    dir: PathBuf,
    max_age: Duration,
    state: Arc<Mutex<HousekeepingState>>,
}

impl Housekeeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            state: Arc::new(Mutex::new(HousekeepingState::default())),
        }
    }

    pub fn snapshot(&self) -> HousekeepingState {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Delete every regular file older than `max_age` and record the result.
    pub async fn sweep(&self) -> io::Result<SweepReport> {
        let report = sweep_dir(&self.dir, self.max_age, SystemTime::now()).await?;

        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.last_sweep = Some(OffsetDateTime::now_utc().unix_timestamp());
        state.last_report = Some(report);
        state.removed_total += report.removed as u64;

        Ok(report)
    }

    /// Sweep now and then every `interval` until the task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep().await {
                    Ok(report) if report.removed > 0 => {
                        tracing::info!(removed = report.removed, kept = report.kept, "removed stale downloads");
                    }
                    Ok(_) => tracing::debug!(dir = %self.dir.display(), "nothing to clean up"),
                    Err(e) => tracing::warn!(dir = %self.dir.display(), error = %e, "housekeeping sweep failed"),
                }
            }
        })
    }
}

async fn sweep_dir(dir: &Path, max_age: Duration, now: SystemTime) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.already_gone += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            continue;
        }

        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or(Duration::ZERO);

        if age < max_age {
            report.kept += 1;
            continue;
        }

        if remove_stale(&path).await? {
            report.removed += 1;
        } else {
            report.already_gone += 1;
        }
    }

    Ok(report)
}

/// Remove `path`; `Ok(false)` if it was already gone.
pub async fn remove_stale(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
