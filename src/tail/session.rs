//! A background follower for one file.
//!
//! The follower polls the file at a fixed interval, tracking a byte offset it
//! exclusively owns. Growth is read as exactly the byte range
//! `[offset, size)`; shrinkage, or an mtime advance at an unchanged size, is
//! treated as truncate-or-rewrite and resets the offset to zero so the
//! rewritten content is captured as new. Tailing starts from the end of the
//! file; historical content is delivered once by [`load_full_content`].
//!
//! Transient stat/read errors are logged and retried on the next tick; they
//! never terminate the session. Stop is observable within one poll interval
//! and no file handle stays open between reads.

use crate::error::{Result, TaillogError};
use crate::tail::protocol::TailEvent;
use log::{debug, warn};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default poll interval, matching the responsiveness of a typical tail -f.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One-shot full read of a file, decoded with lossy UTF-8.
///
/// This is the only place historical content is read; the follower never
/// re-reads it. A missing file is a `FileNotFound` error for the caller.
pub fn load_full_content(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(TaillogError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)
        .map_err(|e| TaillogError::file_error(format!("Failed to read {}", path.display()), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Offset bookkeeping shared between the handle and the follower task.
/// The follower loop is the only writer while it runs.
#[derive(Debug, Default)]
struct FollowState {
    /// Next byte to read; `None` until first start. Survives stop so that a
    /// resumed session does not re-emit already-seen content.
    byte_offset: Option<u64>,
    last_modified: Option<SystemTime>,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

struct SessionInner {
    path: PathBuf,
    poll_interval: Duration,
    events: UnboundedSender<TailEvent>,
    state: Mutex<FollowState>,
}

/// Handle to one file's follower. Cheap to clone; all clones share the same
/// offset state and follower task.
#[derive(Clone)]
pub struct TailSession {
    inner: Arc<SessionInner>,
}

impl TailSession {
    pub fn new(
        path: PathBuf,
        poll_interval: Duration,
        events: UnboundedSender<TailEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                path,
                poll_interval,
                events,
                state: Mutex::new(FollowState::default()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Current follower offset, if the session has ever started.
    pub fn byte_offset(&self) -> Option<u64> {
        self.inner.state.lock().byte_offset
    }

    /// Whether a follower task is currently running.
    pub fn is_following(&self) -> bool {
        self.inner
            .state
            .lock()
            .task
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Start (or resume) the follower.
    ///
    /// Starting an already-following session is a no-op. On first start the
    /// offset initializes to the current file length so tailing begins at the
    /// end; a resumed session keeps its preserved offset. A missing file is
    /// reported both on the event channel and to the caller, and the session
    /// stays stopped.
    pub fn start(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state
            .task
            .as_ref()
            .is_some_and(|t| !t.is_finished())
        {
            return Ok(());
        }

        let metadata = match std::fs::metadata(&self.inner.path) {
            Ok(m) => m,
            Err(_) => {
                let error = TaillogError::FileNotFound {
                    path: self.inner.path.clone(),
                };
                let _ = self.inner.events.send(TailEvent::Error {
                    path: self.inner.path.clone(),
                    error,
                });
                return Err(TaillogError::FileNotFound {
                    path: self.inner.path.clone(),
                });
            }
        };

        if state.byte_offset.is_none() {
            state.byte_offset = Some(metadata.len());
            state.last_modified = metadata.modified().ok();
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(follow_loop(inner, stop_rx));

        state.stop_tx = Some(stop_tx);
        state.task = Some(task);
        Ok(())
    }

    /// Stop the follower and wait for it to exit. Offset state is preserved.
    pub async fn stop(&self) {
        let (stop_tx, task) = {
            let mut state = self.inner.state.lock();
            (state.stop_tx.take(), state.task.take())
        };

        if let Some(tx) = stop_tx {
            let _ = tx.send(true);
        }
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("follower task for {} panicked: {e}", self.inner.path.display());
            }
        }
    }
}

/// The poll loop. Runs until the stop signal flips; the sleep is
/// interruptible so shutdown latency is bounded by one interval.
async fn follow_loop(inner: Arc<SessionInner>, mut stop_rx: watch::Receiver<bool>) {
    debug!("following {}", inner.path.display());

    loop {
        if *stop_rx.borrow() {
            break;
        }

        if let Err(e) = poll_once(&inner) {
            // Locked file, permission blip, or briefly missing file:
            // retry on the next tick.
            debug!("transient poll error on {}: {e}", inner.path.display());
        }

        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(inner.poll_interval) => {}
        }
    }

    debug!("stopped following {}", inner.path.display());
}

/// One poll tick: stat, detect truncate/rewrite, read and emit growth.
fn poll_once(inner: &SessionInner) -> Result<()> {
    let metadata = std::fs::metadata(&inner.path)?;
    let current_size = metadata.len();
    let current_modified = metadata.modified().ok();

    let (mut offset, last_modified) = {
        let state = inner.state.lock();
        (state.byte_offset.unwrap_or(current_size), state.last_modified)
    };

    let modified_advanced = match (current_modified, last_modified) {
        (Some(current), Some(last)) => current > last,
        _ => false,
    };

    if current_size < offset || (modified_advanced && current_size == offset) {
        offset = 0;
        inner.state.lock().byte_offset = Some(0);
        let _ = inner.events.send(TailEvent::TruncateReset {
            path: inner.path.clone(),
        });
    }

    if current_size > offset {
        let text = read_range(&inner.path, offset, current_size)?;
        if !text.is_empty() {
            let _ = inner.events.send(TailEvent::Append {
                path: inner.path.clone(),
                text,
            });
        }
        offset = current_size;
        inner.state.lock().byte_offset = Some(offset);
    }

    inner.state.lock().last_modified = current_modified;
    Ok(())
}

/// Read exactly `[start, end)` from the file, decoded with lossy UTF-8 so an
/// undecodable sequence never drops the whole increment.
fn read_range(path: &Path, start: u64, end: u64) -> Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;

    let mut buffer = Vec::with_capacity((end - start) as usize);
    file.take(end - start).read_to_end(&mut buffer)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
