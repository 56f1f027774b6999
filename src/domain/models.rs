use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Schema version of the persisted document. Documents carrying any other
/// version are treated as foreign.
pub const DATA_VERSION: u32 = 1;

/// One exercise prescribed by a workout plan.
///
/// The optional `plan` lists rep-scheme targets (e.g. `"8-12"`) and seeds the
/// sets of a freshly started session. It is advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExerciseSpec")]
pub struct ExerciseSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<String>>,
}

/// Accepted on-disk shapes of an exercise: a bare name or a full object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExerciseSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        plan: Option<Vec<String>>,
    },
}

impl From<RawExerciseSpec> for ExerciseSpec {
    fn from(raw: RawExerciseSpec) -> Self {
        match raw {
            RawExerciseSpec::Name(name) => ExerciseSpec::named(name),
            RawExerciseSpec::Full { name, plan } => ExerciseSpec { name, plan },
        }
    }
}

impl ExerciseSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), plan: None }
    }

    pub fn planned<I, S>(name: impl Into<String>, plan: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            plan: Some(plan.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub name: String,
    pub exercises: Vec<ExerciseSpec>,
}

/// A single recorded set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    /// 1-based position inside the exercise, kept contiguous.
    pub n: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "non_negative_weight")]
    pub weight: f64,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub notes: String,
}

/// Weights are never negative; anything else reads as 0.
fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 { weight } else { 0.0 }
}

fn non_negative_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_weight)
}

impl SetEntry {
    pub fn blank(n: usize, target: Option<String>) -> Self {
        Self {
            n,
            target,
            weight: 0.0,
            reps: 0,
            notes: String::new(),
        }
    }

    /// True once the user entered a real weight or rep count.
    pub fn has_input(&self) -> bool {
        self.weight > 0.0 || self.reps > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<String>>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

impl ExerciseLog {
    /// Builds the log for a new session, one blank set per plan entry.
    pub fn from_spec(spec: &ExerciseSpec) -> Self {
        let sets = spec
            .plan
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, target)| SetEntry::blank(i + 1, Some(target.clone())))
            .collect();
        Self {
            name: spec.name.clone(),
            plan: spec.plan.clone(),
            sets,
        }
    }

    fn renumber(&mut self) {
        for (i, set) in self.sets.iter_mut().enumerate() {
            set.n = i + 1;
        }
    }
}

/// One workout instance, either in progress or committed to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub date: DateTime<Utc>,
    pub workout_key: String,
    pub exercises: Vec<ExerciseLog>,
}

impl Session {
    /// Starts a fresh session from a catalog plan.
    pub fn from_plan(workout_key: &str, plan: &WorkoutPlan, date: DateTime<Utc>) -> Self {
        Self {
            id: new_session_id(),
            date,
            workout_key: workout_key.to_string(),
            exercises: plan.exercises.iter().map(ExerciseLog::from_spec).collect(),
        }
    }

    /// Deep copy under a new identity, used when a past session is reopened.
    pub fn clone_as_new(&self, date: DateTime<Utc>) -> Self {
        Self {
            id: new_session_id(),
            date,
            ..self.clone()
        }
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn has_meaningful_data(&self) -> bool {
        self.exercises
            .iter()
            .any(|e| e.sets.iter().any(SetEntry::has_input))
    }

    pub fn set_mut(&mut self, exercise: usize, set: usize) -> Option<&mut SetEntry> {
        self.exercises.get_mut(exercise)?.sets.get_mut(set)
    }

    pub fn set_weight(&mut self, exercise: usize, set: usize, weight: f64) {
        if let Some(entry) = self.set_mut(exercise, set) {
            entry.weight = clamp_weight(weight);
        }
    }

    pub fn set_reps(&mut self, exercise: usize, set: usize, reps: u32) {
        if let Some(entry) = self.set_mut(exercise, set) {
            entry.reps = reps;
        }
    }

    pub fn set_notes(&mut self, exercise: usize, set: usize, notes: &str) {
        if let Some(entry) = self.set_mut(exercise, set) {
            entry.notes = notes.trim().to_string();
        }
    }

    /// Appends an untargeted blank set and returns its index.
    pub fn add_set(&mut self, exercise: usize) -> Option<usize> {
        let log = self.exercises.get_mut(exercise)?;
        let n = log.sets.len() + 1;
        log.sets.push(SetEntry::blank(n, None));
        Some(n - 1)
    }

    /// Removes a set and renumbers the remaining ones 1..=len.
    pub fn delete_set(&mut self, exercise: usize, set: usize) -> Option<SetEntry> {
        let log = self.exercises.get_mut(exercise)?;
        if set >= log.sets.len() {
            return None;
        }
        let removed = log.sets.remove(set);
        log.renumber();
        Some(removed)
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Root document persisted in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub version: u32,
    pub workouts: BTreeMap<String, WorkoutPlan>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            workouts: super::catalog::default_workouts(),
            sessions: Vec::new(),
        }
    }
}

impl AppState {
    pub fn find_session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Appends `session`, or overwrites the entry sharing its id.
    pub fn upsert_session(&mut self, session: &Session) {
        match self.sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => self.sessions.push(session.clone()),
        }
    }

    pub fn remove_session(&mut self, id: &str) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(index))
    }

    pub fn workout_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.workouts.get(key).map(|w| w.name.as_str()).unwrap_or(key)
    }
}
