//! Import/merge engine and other pure services over the workout log.
//!
//! Everything in this module works on plain values: parsing an interchange
//! document, folding it into an existing [`AppState`], summarizing history and
//! interpreting raw text typed into a set row. Persistence is left to the
//! application layer.

use std::collections::HashSet;
use chrono::{DateTime, NaiveDate, Utc};
use super::errors::{DomainResult, TrackerError};
use super::models::{AppState, DATA_VERSION};

/// How an imported document is combined with the existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep everything already present, add only unknown sessions and workouts.
    Merge,
    /// Throw the existing data away and adopt the incoming document.
    Replace,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportMode::Merge => write!(f, "Merged data"),
            ImportMode::Replace => write!(f, "Replaced data"),
        }
    }
}

/// Counts of what a merge actually added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub sessions_added: usize,
    pub workouts_added: usize,
}

/// Validates and applies interchange documents.
///
/// # Examples
///
/// ```
/// use fitlog::domain::{AppState, ImportEngine};
///
/// let mut state = AppState::default();
/// let exported = serde_json::to_string(&state).unwrap();
///
/// let incoming = ImportEngine::parse(&exported).unwrap();
/// let report = ImportEngine::merge(&mut state, incoming);
/// assert_eq!(report.sessions_added, 0);
/// assert_eq!(report.workouts_added, 0);
/// ```
pub struct ImportEngine;

impl ImportEngine {
    /// Parses and validates an interchange document.
    ///
    /// The schema version is checked before the rest of the document, so a
    /// foreign export is reported as a version mismatch even when its shape
    /// differs as well.
    ///
    /// # Errors
    ///
    /// * [`TrackerError::MalformedImport`] if the text is not JSON or does not
    ///   describe an [`AppState`]
    /// * [`TrackerError::VersionMismatch`] if `version` is missing or differs
    ///   from [`DATA_VERSION`]
    pub fn parse(text: &str) -> DomainResult<AppState> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| TrackerError::MalformedImport(e.to_string()))?;

        let found = value.get("version").and_then(serde_json::Value::as_i64);
        if found != Some(i64::from(DATA_VERSION)) {
            return Err(TrackerError::VersionMismatch {
                expected: DATA_VERSION,
                found,
            });
        }

        serde_json::from_value(value).map_err(|e| TrackerError::MalformedImport(e.to_string()))
    }

    /// Adds incoming sessions with unseen ids and incoming workouts with
    /// unseen keys. Existing entries always win; content is never compared.
    pub fn merge(state: &mut AppState, incoming: AppState) -> MergeReport {
        let mut report = MergeReport::default();
        let mut known: HashSet<String> = state.sessions.iter().map(|s| s.id.clone()).collect();

        for session in incoming.sessions {
            if known.insert(session.id.clone()) {
                state.sessions.push(session);
                report.sessions_added += 1;
            }
        }

        for (key, plan) in incoming.workouts {
            if !state.workouts.contains_key(&key) {
                state.workouts.insert(key, plan);
                report.workouts_added += 1;
            }
        }

        report
    }

    pub fn replace(state: &mut AppState, incoming: AppState) {
        *state = incoming;
    }

    /// Serializes the whole state, pretty-printed, as the interchange format.
    pub fn export(state: &AppState) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(state)?)
    }

    /// File name used for an export taken on `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use fitlog::domain::ImportEngine;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    /// assert_eq!(ImportEngine::export_filename(date), "fitness-tracker-export-20240307.json");
    /// ```
    pub fn export_filename(date: NaiveDate) -> String {
        format!("fitness-tracker-export-{}.json", date.format("%Y%m%d"))
    }
}

/// One line of the history list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub workout_name: String,
    pub total_sets: usize,
}

/// Committed sessions, newest first.
pub fn history(state: &AppState) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = state
        .sessions
        .iter()
        .map(|s| HistoryEntry {
            id: s.id.clone(),
            date: s.date,
            workout_name: state.workout_name(&s.workout_key).to_string(),
            total_sets: s.total_sets(),
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

/// Interprets a typed weight. Anything that is not a finite, non-negative
/// number counts as zero.
pub fn parse_weight(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(w) if w.is_finite() && w > 0.0 => w,
        _ => 0.0,
    }
}

/// Interprets a typed rep count from its leading digits, so `"10.5"` is 10.
pub fn parse_reps(input: &str) -> u32 {
    let trimmed = input.trim();
    let digits = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| &trimmed[..i])
        .unwrap_or(trimmed);
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExerciseSpec, Session, WorkoutPlan};
    use chrono::TimeZone;

    fn session_on(day: u32) -> Session {
        let state = AppState::default();
        let plan = &state.workouts["session2"];
        let date = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
        Session::from_plan("session2", plan, date)
    }

    #[test]
    fn test_parse_rejects_version_off_by_one() {
        let mut doc = AppState::default();
        doc.version = DATA_VERSION + 1;
        let text = serde_json::to_string(&doc).unwrap();

        let err = ImportEngine::parse(&text).unwrap_err();
        assert_eq!(
            err,
            TrackerError::VersionMismatch {
                expected: DATA_VERSION,
                found: Some(i64::from(DATA_VERSION) + 1)
            }
        );
    }

    #[test]
    fn test_parse_missing_version_is_mismatch() {
        let err = ImportEngine::parse(r#"{"workouts":{},"sessions":[]}"#).unwrap_err();
        assert!(matches!(err, TrackerError::VersionMismatch { found: None, .. }));
    }

    #[test]
    fn test_parse_invalid_json_is_malformed() {
        let err = ImportEngine::parse("{not json").unwrap_err();
        assert!(matches!(err, TrackerError::MalformedImport(_)));
    }

    #[test]
    fn test_parse_wrong_shape_is_malformed() {
        let err = ImportEngine::parse(r#"{"version":1,"workouts":[],"sessions":[]}"#).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedImport(_)));
    }

    #[test]
    fn test_parse_accepts_browser_style_export() {
        let text = r#"{
            "version": 1,
            "workouts": {
                "legs": { "name": "Legs", "exercises": ["Squat", { "name": "Lunge", "plan": ["10"] }] }
            },
            "sessions": [{
                "id": "abc",
                "date": "2024-05-01T09:00:00.000Z",
                "workoutKey": "legs",
                "exercises": [{
                    "name": "Lunge",
                    "plan": ["10"],
                    "sets": [{ "n": 1, "target": "10", "weight": 20, "reps": 10, "notes": "" },
                             { "n": 2, "target": "", "weight": 0, "reps": 0, "notes": "" }]
                }]
            }]
        }"#;

        let state = ImportEngine::parse(text).unwrap();
        assert_eq!(state.workouts["legs"].exercises[0], ExerciseSpec::named("Squat"));
        assert_eq!(state.sessions[0].workout_key, "legs");
        assert_eq!(state.sessions[0].exercises[0].sets[0].weight, 20.0);
        assert_eq!(state.sessions[0].exercises[0].sets[1].target.as_deref(), Some(""));
    }

    #[test]
    fn test_merge_dedups_by_session_id() {
        let existing = session_on(1);
        let mut state = AppState::default();
        state.sessions.push(existing.clone());

        let mut changed_copy = existing.clone();
        changed_copy.set_reps(0, 0, 99);
        let novel = session_on(2);

        let mut incoming = AppState::default();
        incoming.sessions = vec![changed_copy, novel.clone(), novel.clone()];

        let report = ImportEngine::merge(&mut state, incoming);

        assert_eq!(report.sessions_added, 1);
        assert_eq!(state.sessions.len(), 2);
        assert_eq!(state.sessions[0], existing);
        assert_eq!(state.sessions[1].id, novel.id);
    }

    #[test]
    fn test_merge_never_overwrites_workouts() {
        let mut state = AppState::default();
        let original = state.workouts["session1"].clone();

        let mut incoming = AppState::default();
        incoming.workouts.get_mut("session1").unwrap().name = "Renamed".to_string();
        incoming.workouts.insert(
            "arms".to_string(),
            WorkoutPlan {
                name: "Arms".to_string(),
                exercises: vec![ExerciseSpec::named("Curl")],
            },
        );

        let report = ImportEngine::merge(&mut state, incoming);

        assert_eq!(report.workouts_added, 1);
        assert_eq!(state.workouts["session1"], original);
        assert_eq!(state.workouts["arms"].name, "Arms");
    }

    #[test]
    fn test_replace_adopts_incoming() {
        let mut state = AppState::default();
        state.sessions.push(session_on(1));

        let mut incoming = AppState::default();
        incoming.workouts.clear();
        ImportEngine::replace(&mut state, incoming.clone());

        assert_eq!(state, incoming);
    }

    #[test]
    fn test_export_is_pretty_and_round_trips() {
        let mut state = AppState::default();
        state.sessions.push(session_on(3));

        let text = ImportEngine::export(&state).unwrap();
        assert!(text.contains("\n  \"version\": 1"));
        assert_eq!(ImportEngine::parse(&text).unwrap(), state);
    }

    #[test]
    fn test_history_sorted_newest_first() {
        let mut state = AppState::default();
        state.sessions = vec![session_on(1), session_on(9), session_on(4)];
        state.sessions[1].workout_key = "gone".to_string();

        let entries = history(&state);
        let days: Vec<_> = entries.iter().map(|e| e.date.format("%d").to_string()).collect();
        assert_eq!(days, vec!["09", "04", "01"]);
        assert_eq!(entries[0].workout_name, "gone");
        assert_eq!(entries[1].workout_name, "Session 2 – Lower Body");
        assert_eq!(entries[1].total_sets, 20);
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("62.5"), 62.5);
        assert_eq!(parse_weight(" 40 "), 40.0);
        assert_eq!(parse_weight("-5"), 0.0);
        assert_eq!(parse_weight("abc"), 0.0);
        assert_eq!(parse_weight(""), 0.0);
        assert_eq!(parse_weight("inf"), 0.0);
    }

    #[test]
    fn test_parse_reps() {
        assert_eq!(parse_reps("10"), 10);
        assert_eq!(parse_reps("10.5"), 10);
        assert_eq!(parse_reps(" 8 reps"), 8);
        assert_eq!(parse_reps("x"), 0);
        assert_eq!(parse_reps(""), 0);
        assert_eq!(parse_reps("99999999999"), 0);
    }
}
