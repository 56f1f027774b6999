//! Session lifecycle: the single in-progress session, its dirty state, and
//! the rules deciding when it becomes persisted history.
//!
//! Every edit is mirrored to the scratch store so a crash loses nothing;
//! history in the durable store is only written on an explicit commit or an
//! autosave.

use std::time::Instant;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};
use crate::domain::{
    history, AppState, DomainResult, HistoryEntry, ImportEngine, ImportMode, MergeReport, Session,
    TrackerError, DATA_VERSION,
};
use crate::infrastructure::{KeyValueStore, CURRENT_SESSION_KEY, DATA_BACKUP_KEY, DATA_KEY};
use super::scheduler::{AutosaveScheduler, AutosaveTiming};

/// Whether the current session has changes the durable store lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// Nothing to save.
    Clean,
    /// Edited since the last save; eligible for autosave.
    Dirty,
    /// Adopted from the scratch store after a restart. Saved only on an
    /// explicit commit or once edited again.
    Recovered,
}

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub mode: ImportMode,
    pub merged: MergeReport,
}

impl std::fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            ImportMode::Merge => write!(
                f,
                "{} ({} sessions, {} workouts added)",
                self.mode, self.merged.sessions_added, self.merged.workouts_added
            ),
            ImportMode::Replace => write!(f, "{}", self.mode),
        }
    }
}

/// Owns the application document and the current session.
pub struct SessionManager {
    state: AppState,
    current: Option<Session>,
    dirty: DirtyState,
    last_saved_at: Option<DateTime<Local>>,
    durable: Box<dyn KeyValueStore>,
    scratch: Box<dyn KeyValueStore>,
    scheduler: AutosaveScheduler,
}

impl SessionManager {
    /// Opens the durable document, creating it from the default catalog when
    /// it is missing, corrupt or of a foreign version.
    ///
    /// An unusable document is copied to a backup key before being replaced.
    /// Store failures here are logged and never abort startup.
    pub fn open(
        durable: Box<dyn KeyValueStore>,
        scratch: Box<dyn KeyValueStore>,
        timing: AutosaveTiming,
        now: Instant,
    ) -> Self {
        let mut manager = Self {
            state: AppState::default(),
            current: None,
            dirty: DirtyState::Clean,
            last_saved_at: None,
            durable,
            scratch,
            scheduler: AutosaveScheduler::new(timing, now),
        };
        manager.state = manager.load_or_init();
        manager
    }

    fn load_or_init(&mut self) -> AppState {
        let raw = match self.durable.get(DATA_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "durable store unreadable, using defaults in memory");
                return AppState::default();
            }
        };

        if let Some(text) = raw {
            match serde_json::from_str::<AppState>(&text) {
                Ok(state) if state.version == DATA_VERSION => {
                    info!(sessions = state.sessions.len(), "loaded workout log");
                    return state;
                }
                Ok(state) => warn!(found = state.version, "stored document has a foreign version"),
                Err(e) => warn!(error = %e, "stored document is corrupt"),
            }
            if let Err(e) = self.durable.set(DATA_BACKUP_KEY, &text) {
                warn!(error = %e, "could not back up unusable document");
            }
        }

        let state = AppState::default();
        info!("initializing workout log with default catalog");
        if let Err(e) = Self::write_state(self.durable.as_mut(), &state) {
            warn!(error = %e, "could not write initial document");
        }
        state
    }

    fn write_state(store: &mut dyn KeyValueStore, state: &AppState) -> DomainResult<()> {
        let json = serde_json::to_string(state)?;
        store.set(DATA_KEY, &json)?;
        Ok(())
    }

    fn persist(&mut self) -> DomainResult<()> {
        Self::write_state(self.durable.as_mut(), &self.state)
    }

    fn mirror_current(&mut self) -> DomainResult<()> {
        if let Some(session) = &self.current {
            let json = serde_json::to_string(session)?;
            self.scratch.set(CURRENT_SESSION_KEY, &json)?;
        }
        Ok(())
    }

    fn mirror_or_warn(&mut self) {
        if let Err(e) = self.mirror_current() {
            warn!(error = %e, "could not mirror session to scratch store");
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Local>> {
        self.last_saved_at
    }

    pub fn durable(&self) -> &dyn KeyValueStore {
        self.durable.as_ref()
    }

    pub fn scratch(&self) -> &dyn KeyValueStore {
        self.scratch.as_ref()
    }

    /// When the event loop must wake up next to run [`SessionManager::tick`].
    pub fn next_deadline(&self) -> Instant {
        self.scheduler.next_deadline()
    }

    /// Starts a new session from the catalog entry `workout_key`.
    ///
    /// Any previous in-memory session is discarded; confirming that with the
    /// user is the caller's job. Unknown keys are ignored and yield `None`.
    pub fn start(&mut self, workout_key: &str) -> Option<&Session> {
        let Some(plan) = self.state.workouts.get(workout_key) else {
            warn!(workout_key, "unknown workout, start ignored");
            return None;
        };

        let session = Session::from_plan(workout_key, plan, Utc::now());
        info!(session_id = %session.id, workout_key, "session started");
        self.current = Some(session);
        self.dirty = DirtyState::Clean;
        self.scheduler.cancel();
        self.mirror_or_warn();
        self.current.as_ref()
    }

    /// Applies one edit to the current session.
    ///
    /// Marks the session dirty, restarts the autosave debounce and mirrors
    /// the session to the scratch store. A scratch failure is reported after
    /// the edit itself has been applied.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::NoActiveSession`] if no session is in progress
    /// * [`TrackerError::Persistence`] if the scratch mirror failed
    pub fn record_edit<F>(&mut self, now: Instant, mutate: F) -> DomainResult<()>
    where
        F: FnOnce(&mut Session),
    {
        let session = self.current.as_mut().ok_or(TrackerError::NoActiveSession)?;
        mutate(session);
        debug!(session_id = %session.id, "edit recorded");

        self.dirty = DirtyState::Dirty;
        self.scheduler.arm(now);
        self.mirror_current()
    }

    /// Explicitly saves the current session into history.
    ///
    /// Committing the same session again updates its history entry rather
    /// than adding a second one.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::NoActiveSession`] if no session is in progress
    /// * [`TrackerError::EmptySession`] if no exercise has any set
    /// * [`TrackerError::Persistence`] if the durable write failed; the
    ///   session stays in memory and remains dirty
    pub fn commit(&mut self) -> DomainResult<()> {
        let session = self.current.as_ref().ok_or(TrackerError::NoActiveSession)?;
        if session.total_sets() == 0 {
            return Err(TrackerError::EmptySession);
        }
        self.save_current()
    }

    /// Saves when there are unsaved edits carrying a real weight or rep
    /// count. Returns whether a save happened.
    pub fn auto_save(&mut self) -> DomainResult<bool> {
        if self.dirty != DirtyState::Dirty {
            return Ok(false);
        }
        match &self.current {
            Some(session) if session.has_meaningful_data() => {}
            _ => return Ok(false),
        }
        self.save_current().map(|()| true)
    }

    fn save_current(&mut self) -> DomainResult<()> {
        let session = self.current.as_ref().ok_or(TrackerError::NoActiveSession)?;
        self.state.upsert_session(session);
        let session_id = session.id.clone();

        match self.persist() {
            Ok(()) => {
                self.dirty = DirtyState::Clean;
                self.last_saved_at = Some(Local::now());
                self.scheduler.cancel();
                info!(session_id = %session_id, "session saved");
                Ok(())
            }
            Err(e) => {
                self.dirty = DirtyState::Dirty;
                warn!(session_id = %session_id, error = %e, "session save failed");
                Err(e)
            }
        }
    }

    /// Runs the autosave if the debounce or the periodic poll is due.
    /// Triggers due at the same moment collapse into one attempt.
    pub fn tick(&mut self, now: Instant) -> DomainResult<bool> {
        let due = self.scheduler.take_due(now);
        if !due.any() {
            return Ok(false);
        }
        debug!(debounce = due.debounce, poll = due.poll, "autosave due");
        self.auto_save()
    }

    /// Reopens a committed session as a new, independent copy.
    ///
    /// The copy gets a fresh id and the current time; committing it adds a
    /// second history entry and leaves the original untouched.
    pub fn load_for_edit(&mut self, session_id: &str) -> DomainResult<&Session> {
        let original = self
            .state
            .find_session(session_id)
            .ok_or_else(|| TrackerError::NotFound(session_id.to_string()))?;
        let copy = original.clone_as_new(Utc::now());
        info!(from = session_id, session_id = %copy.id, "session loaded for edit");

        self.current = Some(copy);
        self.dirty = DirtyState::Clean;
        self.scheduler.cancel();
        self.mirror_or_warn();
        self.current.as_ref().ok_or(TrackerError::NoActiveSession)
    }

    /// Removes a committed session permanently.
    pub fn delete_session(&mut self, session_id: &str) -> DomainResult<()> {
        self.state
            .remove_session(session_id)
            .ok_or_else(|| TrackerError::NotFound(session_id.to_string()))?;
        info!(session_id, "session deleted");
        self.persist()
    }

    /// Adopts the session left in the scratch store by a previous run.
    ///
    /// Missing, unreadable or corrupt scratch content yields `None`.
    pub fn recover_on_startup(&mut self) -> Option<&Session> {
        let raw = match self.scratch.get(CURRENT_SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "scratch store unreadable, nothing recovered");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                info!(session_id = %session.id, "recovered in-progress session");
                self.current = Some(session);
                self.dirty = DirtyState::Recovered;
                self.current.as_ref()
            }
            Err(e) => {
                warn!(error = %e, "scratch session is corrupt, nothing recovered");
                None
            }
        }
    }

    /// Parses, validates and applies an interchange document.
    ///
    /// Parse and version failures leave the state untouched.
    pub fn import_document(&mut self, text: &str, mode: ImportMode) -> DomainResult<ImportOutcome> {
        let incoming = ImportEngine::parse(text)?;
        self.apply_import(incoming, mode)
    }

    /// Applies an already validated document and persists the result.
    pub fn apply_import(&mut self, incoming: AppState, mode: ImportMode) -> DomainResult<ImportOutcome> {
        let merged = match mode {
            ImportMode::Merge => ImportEngine::merge(&mut self.state, incoming),
            ImportMode::Replace => {
                ImportEngine::replace(&mut self.state, incoming);
                MergeReport::default()
            }
        };
        info!(?mode, sessions_added = merged.sessions_added, workouts_added = merged.workouts_added, "import applied");
        self.persist()?;
        Ok(ImportOutcome { mode, merged })
    }

    pub fn export_document(&self) -> DomainResult<String> {
        ImportEngine::export(&self.state)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        history(&self.state)
    }

    pub fn status(&self) -> String {
        if let Some(at) = self.last_saved_at {
            return format!("Auto-saved {}", at.format("%H:%M:%S"));
        }
        match self.dirty {
            DirtyState::Recovered => "Recovered – not yet saved".to_string(),
            DirtyState::Dirty => "Editing…".to_string(),
            DirtyState::Clean => "Not yet saved".to_string(),
        }
    }

    /// Makes a last attempt to save unsaved edits, then clears the scratch
    /// entry.
    ///
    /// The scratch entry is kept while the session is still dirty or was
    /// recovered and never saved, so it can be recovered on the next start.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        if self.dirty == DirtyState::Dirty {
            if let Err(e) = self.auto_save() {
                warn!(error = %e, "final autosave failed");
            }
        }
        if self.dirty != DirtyState::Clean {
            info!(state = ?self.dirty, "unsaved session kept in scratch store");
            return;
        }
        if let Err(e) = self.scratch.remove(CURRENT_SESSION_KEY) {
            warn!(error = %e, "could not clear scratch store");
        }
    }
}
