//! Application state management for the terminal workout log.
//!
//! This module contains the UI-facing state (mode, selection, input buffers)
//! and forwards every data change to the [`SessionManager`].

use std::path::PathBuf;
use std::time::Instant;
use chrono::Local;
use tracing::warn;
use crate::domain::{parse_reps, parse_weight, AppState, HistoryEntry, ImportEngine, ImportMode, TrackerError};
use crate::infrastructure::{read_import_file, write_export_file};
use super::lifecycle::SessionManager;

/// Represents the current mode of the application.
///
/// The mode determines how key presses are interpreted and which popup, if
/// any, is drawn over the session view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    /// Navigating the current session
    Normal,
    /// Typing into a weight, reps or notes cell
    Editing,
    /// Help screen is displayed
    Help,
    /// Workout catalog picker is open
    SelectWorkout,
    /// Asking whether to discard the current session for a new one
    ConfirmNewSession,
    /// History list is open
    History,
    /// Asking whether to delete the highlighted history entry
    ConfirmDelete,
    /// Typing the path of a file to import
    ImportPath,
    /// Asking whether to merge or replace with the parsed import
    ImportChoice,
}

/// Editable column of a set row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Weight,
    Reps,
    Notes,
}

impl SetField {
    pub fn next(self) -> Self {
        match self {
            SetField::Weight => SetField::Reps,
            SetField::Reps => SetField::Notes,
            SetField::Notes => SetField::Notes,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            SetField::Weight => SetField::Weight,
            SetField::Reps => SetField::Weight,
            SetField::Notes => SetField::Reps,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SetField::Weight => "weight",
            SetField::Reps => "reps",
            SetField::Notes => "notes",
        }
    }
}

/// A visible line of the session view: an exercise header or one of its sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    Exercise(usize),
    Set { exercise: usize, set: usize },
}

impl RowRef {
    pub fn exercise(self) -> usize {
        match self {
            RowRef::Exercise(exercise) | RowRef::Set { exercise, .. } => exercise,
        }
    }
}

/// Main application state: the session manager plus everything the terminal
/// UI needs to render and interpret input.
pub struct App {
    /// Owner of the workout log and the in-progress session
    pub manager: SessionManager,
    /// Current application mode
    pub mode: AppMode,
    /// Index into [`App::rows`]
    pub selected_row: usize,
    /// Column edited when pressing Enter on a set row
    pub selected_field: SetField,
    /// First row visible in the viewport
    pub scroll_row: usize,
    /// Cell input buffer (editing mode)
    pub input: String,
    /// Cursor position within the active input buffer, in characters
    pub cursor_position: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Highlighted entry of the workout picker
    pub catalog_index: usize,
    /// Highlighted entry of the history list
    pub history_index: usize,
    /// Input buffer for the import path
    pub filename_input: String,
    /// Directory exports are written to
    pub export_dir: PathBuf,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Viewport height in rows
    pub viewport_rows: usize,
    pending_workout: Option<String>,
    pending_import: Option<AppState>,
}

impl App {
    pub fn new(manager: SessionManager, export_dir: PathBuf) -> Self {
        Self {
            manager,
            mode: AppMode::Normal,
            selected_row: 0,
            selected_field: SetField::Weight,
            scroll_row: 0,
            input: String::new(),
            cursor_position: 0,
            status_message: None,
            catalog_index: 0,
            history_index: 0,
            filename_input: String::new(),
            export_dir,
            help_scroll: 0,
            viewport_rows: 20,
            pending_workout: None,
            pending_import: None,
        }
    }

    fn report(&mut self, result: Result<String, TrackerError>) {
        self.status_message = Some(match result {
            Ok(message) => message,
            Err(err) => err.to_string(),
        });
    }

    /// All lines of the session view, in display order.
    pub fn rows(&self) -> Vec<RowRef> {
        let Some(session) = self.manager.current() else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for (exercise, log) in session.exercises.iter().enumerate() {
            rows.push(RowRef::Exercise(exercise));
            rows.extend((0..log.sets.len()).map(|set| RowRef::Set { exercise, set }));
        }
        rows
    }

    pub fn selected(&self) -> Option<RowRef> {
        self.rows().get(self.selected_row).copied()
    }

    fn select(&mut self, target: RowRef) {
        if let Some(index) = self.rows().iter().position(|r| *r == target) {
            self.selected_row = index;
            self.ensure_cursor_visible();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        self.selected_row = self.selected_row.min(len.saturating_sub(1));
        self.ensure_cursor_visible();
    }

    pub fn move_up(&mut self) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_row + 1 < self.rows().len() {
            self.selected_row += 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn ensure_cursor_visible(&mut self) {
        if self.selected_row < self.scroll_row {
            self.scroll_row = self.selected_row;
        } else if self.viewport_rows > 0 && self.selected_row >= self.scroll_row + self.viewport_rows {
            self.scroll_row = self.selected_row + 1 - self.viewport_rows;
        }
    }

    /// Switches to editing mode for the selected set cell.
    ///
    /// Zero weights and reps load as an empty buffer.
    pub fn start_editing(&mut self) {
        let Some(RowRef::Set { exercise, set }) = self.selected() else {
            return;
        };
        let Some(entry) = self
            .manager
            .current()
            .and_then(|s| s.exercises.get(exercise))
            .and_then(|log| log.sets.get(set))
        else {
            return;
        };

        self.input = match self.selected_field {
            SetField::Weight if entry.weight > 0.0 => entry.weight.to_string(),
            SetField::Reps if entry.reps > 0 => entry.reps.to_string(),
            SetField::Notes => entry.notes.clone(),
            _ => String::new(),
        };
        self.cursor_position = self.input.chars().count();
        self.mode = AppMode::Editing;
    }

    /// Writes the input buffer into the selected cell and returns to normal
    /// mode.
    pub fn finish_editing(&mut self, now: Instant) {
        if let Some(RowRef::Set { exercise, set }) = self.selected() {
            let field = self.selected_field;
            let input = std::mem::take(&mut self.input);
            let result = self.manager.record_edit(now, |session| match field {
                SetField::Weight => session.set_weight(exercise, set, parse_weight(&input)),
                SetField::Reps => session.set_reps(exercise, set, parse_reps(&input)),
                SetField::Notes => session.set_notes(exercise, set, &input),
            });
            if let Err(err) = result {
                self.status_message = Some(err.to_string());
            }
        }
        self.cancel_editing();
    }

    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Appends a blank set to the exercise under the cursor and selects it.
    pub fn add_set(&mut self, now: Instant) {
        let Some(row) = self.selected() else {
            return;
        };
        let exercise = row.exercise();
        let mut added = None;
        let result = self.manager.record_edit(now, |session| {
            added = session.add_set(exercise);
        });
        match (result, added) {
            (Err(err), _) => self.status_message = Some(err.to_string()),
            (Ok(()), Some(set)) => self.select(RowRef::Set { exercise, set }),
            (Ok(()), None) => {}
        }
    }

    /// Deletes the set under the cursor; remaining sets are renumbered.
    pub fn delete_set(&mut self, now: Instant) {
        let Some(RowRef::Set { exercise, set }) = self.selected() else {
            return;
        };
        if let Err(err) = self.manager.record_edit(now, |session| {
            session.delete_set(exercise, set);
        }) {
            self.status_message = Some(err.to_string());
        }
        self.clamp_selection();
    }

    pub fn commit(&mut self) {
        let result = self.manager.commit().map(|()| "Session saved".to_string());
        self.report(result);
    }

    /// Runs due autosaves; failures become the status message.
    pub fn tick(&mut self, now: Instant) {
        if let Err(err) = self.manager.tick(now) {
            self.status_message = Some(err.to_string());
        }
    }

    pub fn autosave_status(&self) -> String {
        self.manager.status()
    }

    pub fn catalog_keys(&self) -> Vec<String> {
        self.manager.state().workouts.keys().cloned().collect()
    }

    pub fn open_workout_picker(&mut self) {
        let keys = self.catalog_keys();
        self.catalog_index = self
            .manager
            .current()
            .and_then(|s| keys.iter().position(|k| *k == s.workout_key))
            .unwrap_or(0);
        self.status_message = None;
        self.mode = AppMode::SelectWorkout;
    }

    pub fn catalog_next(&mut self) {
        if self.catalog_index + 1 < self.catalog_keys().len() {
            self.catalog_index += 1;
        }
    }

    pub fn catalog_previous(&mut self) {
        self.catalog_index = self.catalog_index.saturating_sub(1);
    }

    /// Picks the highlighted workout. With a session in progress the user is
    /// asked first, since starting discards it.
    pub fn choose_workout(&mut self) {
        let Some(key) = self.catalog_keys().get(self.catalog_index).cloned() else {
            self.mode = AppMode::Normal;
            return;
        };
        if self.manager.current().is_some() {
            self.pending_workout = Some(key);
            self.mode = AppMode::ConfirmNewSession;
        } else {
            self.start_workout(&key);
        }
    }

    pub fn confirm_new_session(&mut self, confirmed: bool) {
        match self.pending_workout.take() {
            Some(key) if confirmed => self.start_workout(&key),
            _ => self.mode = AppMode::Normal,
        }
    }

    fn start_workout(&mut self, key: &str) {
        self.mode = AppMode::Normal;
        if self.manager.start(key).is_some() {
            self.selected_row = 0;
            self.scroll_row = 0;
            self.selected_field = SetField::Weight;
            self.status_message = Some("New session started".to_string());
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.manager.history()
    }

    pub fn open_history(&mut self) {
        self.history_index = 0;
        self.status_message = None;
        self.mode = AppMode::History;
    }

    pub fn close_history(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn history_next(&mut self) {
        if self.history_index + 1 < self.manager.state().sessions.len() {
            self.history_index += 1;
        }
    }

    pub fn history_previous(&mut self) {
        self.history_index = self.history_index.saturating_sub(1);
    }

    fn highlighted_history_id(&self) -> Option<String> {
        self.history().get(self.history_index).map(|e| e.id.clone())
    }

    /// Loads the highlighted history entry as a new working copy.
    pub fn load_selected_history(&mut self) {
        let Some(id) = self.highlighted_history_id() else {
            return;
        };
        let result = self
            .manager
            .load_for_edit(&id)
            .map(|_| "Loaded into new session".to_string());
        if result.is_ok() {
            self.selected_row = 0;
            self.scroll_row = 0;
            self.mode = AppMode::Normal;
        }
        self.report(result);
    }

    pub fn request_delete(&mut self) {
        if self.highlighted_history_id().is_some() {
            self.mode = AppMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self, confirmed: bool) {
        if confirmed {
            if let Some(id) = self.highlighted_history_id() {
                let result = self.manager.delete_session(&id).map(|()| "Deleted".to_string());
                self.report(result);
                let len = self.manager.state().sessions.len();
                self.history_index = self.history_index.min(len.saturating_sub(1));
            }
        }
        self.mode = AppMode::History;
    }

    pub fn start_import(&mut self) {
        self.mode = AppMode::ImportPath;
        self.filename_input = ImportEngine::export_filename(Local::now().date_naive());
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    pub fn cancel_filename_input(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
        self.pending_import = None;
    }

    /// Reads and validates the import file, then asks for merge or replace.
    pub fn submit_import_path(&mut self) {
        let path = PathBuf::from(self.filename_input.trim());
        let parsed = read_import_file(&path).and_then(|text| ImportEngine::parse(&text));
        match parsed {
            Ok(incoming) => {
                self.pending_import = Some(incoming);
                self.mode = AppMode::ImportChoice;
                self.status_message = None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "import rejected");
                self.cancel_filename_input();
                self.status_message = Some(err.to_string());
            }
        }
    }

    pub fn choose_import_mode(&mut self, mode: ImportMode) {
        if let Some(incoming) = self.pending_import.take() {
            let result = self.manager.apply_import(incoming, mode).map(|o| o.to_string());
            self.report(result);
        }
        self.cancel_filename_input();
        self.clamp_selection();
    }

    /// Writes the whole log to `fitness-tracker-export-YYYYMMDD.json`.
    pub fn export(&mut self) {
        let filename = ImportEngine::export_filename(Local::now().date_naive());
        let result = self
            .manager
            .export_document()
            .and_then(|doc| write_export_file(&self.export_dir, &filename, &doc))
            .map(|path| format!("Exported JSON to {}", path.display()));
        self.report(result);
    }

    pub fn shutdown(&mut self) {
        self.manager.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AutosaveTiming;
    use crate::infrastructure::MemoryStore;
    use tempfile::TempDir;

    fn test_app() -> App {
        let manager = SessionManager::open(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            AutosaveTiming::default(),
            Instant::now(),
        );
        App::new(manager, PathBuf::from("."))
    }

    fn app_with_session(key: &str) -> App {
        let mut app = test_app();
        app.open_workout_picker();
        app.catalog_index = app.catalog_keys().iter().position(|k| k == key).unwrap();
        app.choose_workout();
        app
    }

    #[test]
    fn test_app_default_state() {
        let app = test_app();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.rows().is_empty());
        assert!(app.selected().is_none());
        assert_eq!(app.autosave_status(), "Not yet saved");
    }

    #[test]
    fn test_rows_include_headers_and_sets() {
        let app = app_with_session("session1");
        let rows = app.rows();

        assert_eq!(rows[0], RowRef::Exercise(0));
        assert_eq!(rows[1], RowRef::Set { exercise: 0, set: 0 });
        assert_eq!(rows[5], RowRef::Exercise(1));
        assert_eq!(rows.len(), 6 + 4 + 3 + 4 + 4 + 5 + 4);
        assert_eq!(app.status_message.as_deref(), Some("New session started"));
    }

    #[test]
    fn test_edit_weight_and_reps() {
        let mut app = app_with_session("session1");
        let now = Instant::now();
        app.move_down();

        app.start_editing();
        assert_eq!(app.mode, AppMode::Editing);
        assert!(app.input.is_empty());
        app.input = "60".to_string();
        app.finish_editing(now);

        app.selected_field = app.selected_field.next();
        app.start_editing();
        app.input = "10".to_string();
        app.finish_editing(now);

        let set = &app.manager.current().unwrap().exercises[0].sets[0];
        assert_eq!(set.weight, 60.0);
        assert_eq!(set.reps, 10);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.autosave_status(), "Editing…");
    }

    #[test]
    fn test_start_editing_loads_existing_value() {
        let mut app = app_with_session("session1");
        app.move_down();
        app.start_editing();
        app.input = "42.5".to_string();
        app.finish_editing(Instant::now());

        app.start_editing();
        assert_eq!(app.input, "42.5");
        assert_eq!(app.cursor_position, 4);
        app.cancel_editing();
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_start_editing_on_header_does_nothing() {
        let mut app = app_with_session("session1");
        app.start_editing();
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_add_and_delete_set() {
        let mut app = app_with_session("session2");
        let now = Instant::now();

        app.add_set(now);
        assert_eq!(app.selected(), Some(RowRef::Set { exercise: 0, set: 4 }));
        assert_eq!(app.manager.current().unwrap().exercises[0].sets.len(), 5);

        app.delete_set(now);
        let sets = &app.manager.current().unwrap().exercises[0].sets;
        assert_eq!(sets.len(), 4);
        assert_eq!(sets.last().unwrap().n, 4);
    }

    #[test]
    fn test_commit_reports_status() {
        let mut app = app_with_session("session1");
        app.commit();
        assert_eq!(app.status_message.as_deref(), Some("Session saved"));
        assert_eq!(app.manager.state().sessions.len(), 1);
    }

    #[test]
    fn test_commit_without_session_reports_error() {
        let mut app = test_app();
        app.commit();
        assert_eq!(app.status_message.as_deref(), Some("No active session"));
    }

    #[test]
    fn test_new_session_requires_confirmation() {
        let mut app = app_with_session("session1");
        let first_id = app.manager.current().unwrap().id.clone();

        app.open_workout_picker();
        app.catalog_next();
        app.choose_workout();
        assert_eq!(app.mode, AppMode::ConfirmNewSession);

        app.confirm_new_session(false);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.manager.current().unwrap().id, first_id);

        app.open_workout_picker();
        app.catalog_next();
        app.choose_workout();
        app.confirm_new_session(true);
        assert_eq!(app.manager.current().unwrap().workout_key, "session2");
    }

    #[test]
    fn test_history_load_and_delete() {
        let mut app = app_with_session("session3");
        app.commit();
        let committed = app.manager.current().unwrap().id.clone();

        app.open_history();
        app.load_selected_history();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.status_message.as_deref(), Some("Loaded into new session"));
        assert_ne!(app.manager.current().unwrap().id, committed);

        app.open_history();
        app.request_delete();
        assert_eq!(app.mode, AppMode::ConfirmDelete);
        app.confirm_delete(true);
        assert_eq!(app.mode, AppMode::History);
        assert!(app.manager.state().sessions.is_empty());
    }

    #[test]
    fn test_import_flow_merge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.json");
        let mut doc = AppState::default();
        doc.workouts.insert(
            "extra".to_string(),
            crate::domain::WorkoutPlan {
                name: "Extra".to_string(),
                exercises: vec![crate::domain::ExerciseSpec::named("Plank")],
            },
        );
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let mut app = test_app();
        app.start_import();
        assert_eq!(app.mode, AppMode::ImportPath);
        app.filename_input = path.display().to_string();
        app.submit_import_path();
        assert_eq!(app.mode, AppMode::ImportChoice);

        app.choose_import_mode(ImportMode::Merge);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.manager.state().workouts.contains_key("extra"));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Merged data (0 sessions, 1 workouts added)")
        );
    }

    #[test]
    fn test_import_bad_file_reports_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"version": 2, "workouts": {}, "sessions": []}"#).unwrap();

        let mut app = test_app();
        app.start_import();
        app.filename_input = path.display().to_string();
        app.submit_import_path();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Version mismatch: expected 1, found 2")
        );
    }

    #[test]
    fn test_export_writes_dated_file() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app();
        app.export_dir = dir.path().to_path_buf();

        app.export();

        let name = ImportEngine::export_filename(Local::now().date_naive());
        let written = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(ImportEngine::parse(&written).unwrap(), *app.manager.state());
        assert!(app.status_message.unwrap().starts_with("Exported JSON to "));
    }
}
