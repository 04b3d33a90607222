//! Ownership and coordination of tail sessions.
//!
//! The registry is the only mutator of the path→session map: at most one
//! Following session exists per file path, and at most one path is the
//! foreground (displayed) one. Switching stops every other follower before
//! the target starts, so "one follower per displayed file" holds across
//! switches that race with a prior switch still winding down.

use crate::error::Result;
use crate::tail::protocol::TailEvent;
use crate::tail::session::{load_full_content, TailSession, DEFAULT_POLL_INTERVAL};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Owns every active [`TailSession`] and the foreground selection.
///
/// All methods are called from the foreground task; followers themselves
/// never touch the registry.
pub struct SessionRegistry {
    sessions: HashMap<PathBuf, TailSession>,
    foreground: Option<PathBuf>,
    events: UnboundedSender<TailEvent>,
    poll_interval: Duration,
    /// Bumped on every manual tailing-state change so a deferred auto-resume
    /// can detect it raced with the user and no-op.
    epoch: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new(events: UnboundedSender<TailEvent>) -> Self {
        Self::with_poll_interval(events, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(events: UnboundedSender<TailEvent>, poll_interval: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            foreground: None,
            events,
            poll_interval,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The currently displayed path, if any.
    pub fn foreground(&self) -> Option<&Path> {
        self.foreground.as_deref()
    }

    /// Session handle for a path, if one is open.
    pub fn session(&self, path: &Path) -> Option<&TailSession> {
        self.sessions.get(path)
    }

    pub fn open_paths(&self) -> impl Iterator<Item = &Path> {
        self.sessions.keys().map(PathBuf::as_path)
    }

    /// Open a file as the foreground: one-shot full load onto the event
    /// channel, then a follower starting from the current end of file.
    ///
    /// Re-opening an already-open path resumes its follower from the
    /// preserved offset instead of re-reading seen content. A missing file
    /// surfaces `FileNotFound` to the caller and leaves the registry
    /// unchanged.
    pub async fn open_file(&mut self, path: &Path) -> Result<()> {
        self.stop_others(path).await;

        match self.sessions.get(path) {
            Some(session) if session.is_following() => {
                debug!("open_file: {} already foreground", path.display());
            }
            Some(session) => {
                session.start()?;
            }
            None => {
                let text = load_full_content(path)?;
                let _ = self.events.send(TailEvent::InitialLoad {
                    path: path.to_path_buf(),
                    text,
                });

                let session =
                    TailSession::new(path.to_path_buf(), self.poll_interval, self.events.clone());
                session.start()?;
                self.sessions.insert(path.to_path_buf(), session);
            }
        }

        self.foreground = Some(path.to_path_buf());
        self.bump_epoch();
        Ok(())
    }

    /// Stop a file's follower and discard its session (offset included).
    pub async fn close_file(&mut self, path: &Path) {
        if let Some(session) = self.sessions.remove(path) {
            session.stop().await;
        }
        if self.foreground.as_deref() == Some(path) {
            self.foreground = None;
        }
        self.bump_epoch();
    }

    /// Make `path` the foreground file.
    ///
    /// Every other session is stopped (and awaited) first, preserving its
    /// offset so re-selection later resumes without re-reading; content
    /// appended while a path was backgrounded arrives as a normal append on
    /// the first poll after resumption. A new path gets the full open
    /// treatment. Idempotent: switching to the already-following foreground
    /// path changes nothing.
    pub async fn switch_to(&mut self, path: &Path) -> Result<()> {
        self.open_file(path).await
    }

    /// Pause the foreground follower. Offset is preserved; resuming picks up
    /// from where tailing stopped.
    pub async fn pause(&mut self) {
        if let Some(session) = self.foreground_session() {
            session.stop().await;
        }
        self.bump_epoch();
    }

    /// Resume the foreground follower after a pause.
    pub async fn resume(&mut self) -> Result<()> {
        self.bump_epoch();
        match self.foreground_session() {
            Some(session) => session.start(),
            None => Ok(()),
        }
    }

    /// Pause tailing and schedule an automatic resume after `delay` (the
    /// interactive-search heuristic; the duration is a tunable).
    ///
    /// The deferred resume is cancellable: any manual start/stop/switch
    /// before the delay elapses bumps the epoch and the resume no-ops.
    pub async fn pause_with_auto_resume(&mut self, delay: Duration) {
        let session = match self.foreground_session() {
            Some(session) => session.clone(),
            None => return,
        };

        session.stop().await;
        let scheduled_epoch = self.bump_epoch();
        let epoch = Arc::clone(&self.epoch);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if epoch.load(Ordering::SeqCst) != scheduled_epoch {
                debug!("auto-resume cancelled by manual state change");
                return;
            }
            if let Err(e) = session.start() {
                warn!("auto-resume failed: {e}");
            }
        });
    }

    /// Stop and await every open session. Offsets are discarded with the
    /// registry itself.
    pub async fn shutdown(&mut self) {
        for session in self.sessions.values() {
            session.stop().await;
        }
        self.sessions.clear();
        self.foreground = None;
        self.bump_epoch();
    }

    async fn stop_others(&mut self, keep: &Path) {
        for (path, session) in &self.sessions {
            if path != keep {
                session.stop().await;
            }
        }
    }

    fn foreground_session(&self) -> Option<&TailSession> {
        self.foreground
            .as_ref()
            .and_then(|path| self.sessions.get(path))
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaillogError;
    use tokio::sync::mpsc;

    fn registry() -> (SessionRegistry, mpsc::UnboundedReceiver<TailEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SessionRegistry::with_poll_interval(tx, Duration::from_millis(20)),
            rx,
        )
    }

    #[tokio::test]
    async fn open_missing_file_surfaces_not_found() {
        let (mut registry, _rx) = registry();
        let err = registry
            .open_file(Path::new("/no/such/file.log"))
            .await
            .unwrap_err();

        assert!(matches!(err, TaillogError::FileNotFound { .. }));
        assert!(registry.foreground().is_none());
    }

    #[tokio::test]
    async fn open_file_emits_initial_load_and_follows() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "existing\n").unwrap();

        let (mut registry, mut rx) = registry();
        registry.open_file(file.path()).await.unwrap();

        match rx.recv().await.unwrap() {
            TailEvent::InitialLoad { text, .. } => assert_eq!(text, "existing\n"),
            other => panic!("unexpected event: {other:?}"),
        }

        let session = registry.session(file.path()).unwrap();
        assert!(session.is_following());
        assert_eq!(session.byte_offset(), Some("existing\n".len() as u64));

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn switch_stops_other_followers_and_preserves_offsets() {
        let file_a = tempfile::NamedTempFile::new().unwrap();
        let file_b = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file_a.path(), "aaa\n").unwrap();
        std::fs::write(file_b.path(), "bbbbb\n").unwrap();

        let (mut registry, _rx) = registry();
        registry.open_file(file_a.path()).await.unwrap();
        registry.switch_to(file_b.path()).await.unwrap();

        let session_a = registry.session(file_a.path()).unwrap();
        let session_b = registry.session(file_b.path()).unwrap();
        assert!(!session_a.is_following());
        assert!(session_b.is_following());
        assert_eq!(registry.foreground(), Some(file_b.path()));

        // Offset survives the stop for later resumption
        assert_eq!(session_a.byte_offset(), Some(4));

        // Switching back resumes without a fresh initial load
        registry.switch_to(file_a.path()).await.unwrap();
        assert!(registry.session(file_a.path()).unwrap().is_following());
        assert!(!registry.session(file_b.path()).unwrap().is_following());

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn switch_to_foreground_is_idempotent() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "x\n").unwrap();

        let (mut registry, mut rx) = registry();
        registry.open_file(file.path()).await.unwrap();
        let _ = rx.recv().await; // initial load

        registry.switch_to(file.path()).await.unwrap();
        registry.switch_to(file.path()).await.unwrap();

        assert!(registry.session(file.path()).unwrap().is_following());
        // No duplicate initial loads were queued
        assert!(rx.try_recv().is_err());

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn close_file_discards_the_session() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "x\n").unwrap();

        let (mut registry, _rx) = registry();
        registry.open_file(file.path()).await.unwrap();
        registry.close_file(file.path()).await;

        assert!(registry.session(file.path()).is_none());
        assert!(registry.foreground().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_resume_restarts_after_delay() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "x\n").unwrap();

        let (mut registry, _rx) = registry();
        registry.open_file(file.path()).await.unwrap();

        registry
            .pause_with_auto_resume(Duration::from_secs(3))
            .await;
        assert!(!registry.session(file.path()).unwrap().is_following());

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(registry.session(file.path()).unwrap().is_following());

        registry.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_resume_noops_after_manual_change() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "x\n").unwrap();

        let (mut registry, _rx) = registry();
        registry.open_file(file.path()).await.unwrap();

        registry
            .pause_with_auto_resume(Duration::from_secs(3))
            .await;

        // User changes tailing state before the delay elapses
        registry.pause().await;

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(
            !registry.session(file.path()).unwrap().is_following(),
            "deferred resume must detect the manual change and no-op"
        );

        registry.shutdown().await;
    }
}
