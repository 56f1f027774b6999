//! Built-in workout catalog used on first run.

use std::collections::BTreeMap;
use super::models::{ExerciseSpec, WorkoutPlan};

const HYPERTROPHY_4: [&str; 4] = ["8-12", "8-12", "5-8", "5-8"];
const VOLUME_3: [&str; 3] = ["8-12", "8-12", "8-12"];

pub fn default_workouts() -> BTreeMap<String, WorkoutPlan> {
    let mut workouts = BTreeMap::new();

    workouts.insert(
        "session1".to_string(),
        WorkoutPlan {
            name: "Session 1 – Push (Chest/Shoulders/Arms)".to_string(),
            exercises: vec![
                ExerciseSpec::planned("Bench Press (Bar or DB)", HYPERTROPHY_4),
                ExerciseSpec::planned("DB Incline Press or Chest Fly", VOLUME_3),
                ExerciseSpec::planned("Seated Shoulder Press", HYPERTROPHY_4),
                ExerciseSpec::planned("Tricep Pushdown", HYPERTROPHY_4),
                ExerciseSpec::planned(
                    "Lateral / Front Raise (Alt)",
                    ["10-15 L", "10-15 F", "10-15 L", "10-15 F", "10-15 L"],
                ),
                ExerciseSpec::planned("Katanas or Overheads", ["10-15"; 4]),
            ],
        },
    );

    workouts.insert(
        "session2".to_string(),
        WorkoutPlan {
            name: "Session 2 – Lower Body".to_string(),
            exercises: vec![
                ExerciseSpec::planned("Hack Squat", HYPERTROPHY_4),
                ExerciseSpec::planned("Trap Bar Deadlift or Leg Extensions", VOLUME_3),
                ExerciseSpec::planned("Leg Press", HYPERTROPHY_4),
                ExerciseSpec::planned("Calf Raises (Seated)", VOLUME_3),
                ExerciseSpec::planned("Box Step Ups", VOLUME_3),
                ExerciseSpec::planned("Hip Extensions", VOLUME_3),
            ],
        },
    );

    workouts.insert(
        "session3".to_string(),
        WorkoutPlan {
            name: "Session 3 – Pull (Back/Arms)".to_string(),
            exercises: vec![
                ExerciseSpec::planned("T Bar Row or Cable Row", HYPERTROPHY_4),
                ExerciseSpec::planned("EZY Bar Barbell Curl", VOLUME_3),
                ExerciseSpec::planned("Lat Pulldown", HYPERTROPHY_4),
                ExerciseSpec::planned("Seated Hammer Curl", VOLUME_3),
                ExerciseSpec::planned("Single Arm DB Row", VOLUME_3),
                ExerciseSpec::planned("Rear Delt DB Fly or Pull Up Machine", ["10-15"; 3]),
            ],
        },
    );

    workouts
}
