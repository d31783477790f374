//! Per-session selection state.
//!
//! Each interactive session owns one ordered [`SelectionSet`]. Sessions are
//! partitioned by [`SessionId`]; no session can read or change another's
//! selection.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::export::{ExportBuilder, ExportError, SelectedEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Entries a user has queued for export, in the order they were chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<SelectedEntry>,
}

impl SelectionSet {
    /// Adds an entry. Selecting the same link twice keeps the first choice.
    pub fn select(&mut self, entry: SelectedEntry) -> bool {
        if self.contains(&entry.link) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn deselect(&mut self, link: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.link != link);
        before != self.entries.len()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries.iter().any(|e| e.link == link)
    }

    pub fn entries(&self) -> &[SelectedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SelectionSet>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_session(&self) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed).saturating_add(1));
        self.lock().insert(id, SelectionSet::default());
        tracing::debug!(session = %id, "Session opened");
        id
    }

    /// Ends a session and discards its selection.
    pub fn close(&self, id: SessionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "Session closed");
        }
        removed
    }

    pub fn select(&self, id: SessionId, entry: SelectedEntry) -> Result<bool, SessionError> {
        self.with_selection(id, |set| set.select(entry))
    }

    pub fn deselect(&self, id: SessionId, link: &str) -> Result<bool, SessionError> {
        self.with_selection(id, |set| set.deselect(link))
    }

    /// Snapshot of the session's selection.
    pub fn selection(&self, id: SessionId) -> Result<Vec<SelectedEntry>, SessionError> {
        self.with_selection(id, |set| set.entries().to_vec())
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Exports the session's selection to `path`.
    ///
    /// The selection is cleared only after the file is in place; on any
    /// error (including an empty selection) it is left as it was.
    pub fn export(
        &self,
        id: SessionId,
        builder: &ExportBuilder,
        path: &Path,
    ) -> Result<usize, SessionError> {
        let snapshot = self.selection(id)?;
        let count = builder.export(&snapshot, path)?;

        // Entries selected while the file was being written stay queued.
        self.with_selection(id, |set| {
            for exported in &snapshot {
                set.deselect(&exported.link);
            }
        })?;
        Ok(count)
    }

    fn with_selection<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SelectionSet) -> T,
    ) -> Result<T, SessionError> {
        let mut sessions = self.lock();
        let set = sessions
            .get_mut(&id)
            .ok_or(SessionError::UnknownSession(id))?;
        Ok(f(set))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SelectionSet>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pick(title: &str) -> SelectedEntry {
        SelectedEntry {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            description: String::new(),
            tags: vec![],
        }
    }

    #[test]
    fn test_selection_keeps_order_and_ignores_duplicates() {
        let store = SessionStore::new();
        let id = store.open_session();

        assert!(store.select(id, pick("b")).unwrap());
        assert!(store.select(id, pick("a")).unwrap());
        assert!(!store.select(id, pick("b")).unwrap());

        let titles: Vec<_> = store
            .selection(id)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let alice = store.open_session();
        let bob = store.open_session();
        assert_ne!(alice, bob);

        store.select(alice, pick("x")).unwrap();
        assert!(store.selection(bob).unwrap().is_empty());
        assert!(!store.deselect(bob, "https://example.com/x").unwrap());
        assert_eq!(store.selection(alice).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_and_closed_sessions_rejected() {
        let store = SessionStore::new();
        let id = store.open_session();
        assert!(store.close(id));
        assert!(!store.close(id));
        assert!(matches!(
            store.select(id, pick("x")),
            Err(SessionError::UnknownSession(_))
        ));
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_export_clears_selection_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let store = SessionStore::new();
        let id = store.open_session();
        store.select(id, pick("one")).unwrap();
        store.select(id, pick("two")).unwrap();

        let count = store.export(id, &ExportBuilder::new(), &path).unwrap();
        assert_eq!(count, 2);
        assert!(path.exists());
        assert!(store.selection(id).unwrap().is_empty());
    }

    #[test]
    fn test_export_failure_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        let store = SessionStore::new();
        let id = store.open_session();
        store.select(id, pick("one")).unwrap();

        let err = store.export(id, &ExportBuilder::new(), &path).unwrap_err();
        assert!(matches!(err, SessionError::Export(ExportError::Write { .. })));
        assert_eq!(store.selection(id).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_export_signals_nothing_to_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let store = SessionStore::new();
        let id = store.open_session();

        let err = store.export(id, &ExportBuilder::new(), &path).unwrap_err();
        assert!(matches!(err, SessionError::Export(ExportError::Empty)));
        assert!(!path.exists());
    }
}
