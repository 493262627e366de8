//! Exercise catalog entries.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::ids::ExerciseId;

string_enum! {
    /// How prepared a user must be to perform an exercise.
    pub enum LevelPreparation as "exercise level" {
        Beginner => "beginner",
        Medium => "medium",
        Sportsman => "sportsman",
    }
}

string_enum! {
    pub enum ExerciseType as "exercise type" {
        Cardio => "cardio",
        UpperBody => "upper_body",
        LowerBody => "lower_body",
        FullBody => "full_body",
        Flexibility => "flexibility",
    }
}

string_enum! {
    pub enum PlaceExercise as "exercise place" {
        Street => "street",
        Gym => "gym",
        Home => "home",
    }
}

string_enum! {
    /// Progress of a single planned exercise inside a workout.
    pub enum ExerciseStatus as "exercise status" {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
        Skipped => "skipped",
    }
}

/// A catalog entry. Reference data: not owned by any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub level: LevelPreparation,
    pub name: String,
    pub exercise_type: ExerciseType,
    pub description: String,
    pub base_count_reps: u32,
    /// Number of sets.
    pub steps: u32,
    pub link_gif: String,
    pub place: PlaceExercise,
    pub avg_calories_per: f64,
    pub base_relax_secs: u32,
}

impl Exercise {
    /// Checks the numeric invariants that the unsigned fields cannot express.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid("exercise", "name must not be empty"));
        }
        if !self.avg_calories_per.is_finite() || self.avg_calories_per < 0.0 {
            return Err(DomainError::invalid(
                "exercise",
                format!("avg_calories_per must be non-negative, got {}", self.avg_calories_per),
            ));
        }
        Ok(())
    }

    pub fn is_cardio(&self) -> bool {
        self.exercise_type == ExerciseType::Cardio
    }

    pub fn is_strength(&self) -> bool {
        matches!(
            self.exercise_type,
            ExerciseType::UpperBody | ExerciseType::LowerBody | ExerciseType::FullBody
        )
    }

    /// Strength work burns per repetition, everything else per minute.
    pub fn calculate_calories(&self, duration_minutes: f64, repetitions: u32) -> f64 {
        if self.is_strength() {
            self.avg_calories_per * f64::from(repetitions)
        } else {
            self.avg_calories_per * duration_minutes
        }
    }

    pub fn recommended_rest_secs(&self) -> u32 {
        if self.base_relax_secs > 0 {
            return self.base_relax_secs;
        }

        match self.exercise_type {
            ExerciseType::Cardio => 30,
            ExerciseType::UpperBody | ExerciseType::LowerBody | ExerciseType::FullBody => 60,
            ExerciseType::Flexibility => 15,
        }
    }

    pub fn can_be_done_at(&self, place: PlaceExercise) -> bool {
        self.place == place
    }

    pub fn apply(&mut self, update: ExerciseUpdate) -> Result<(), DomainError> {
        let mut next = self.clone();
        if let Some(level) = update.level {
            next.level = level;
        }
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(reps) = update.base_count_reps {
            next.base_count_reps = reps;
        }
        if let Some(steps) = update.steps {
            next.steps = steps;
        }
        if let Some(link) = update.link_gif {
            next.link_gif = link;
        }
        if let Some(calories) = update.avg_calories_per {
            next.avg_calories_per = calories;
        }
        if let Some(relax) = update.base_relax_secs {
            next.base_relax_secs = relax;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial update of a catalog entry. Type and place are fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseUpdate {
    pub level: Option<LevelPreparation>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_count_reps: Option<u32>,
    pub steps: Option<u32>,
    pub link_gif: Option<String>,
    pub avg_calories_per: Option<f64>,
    pub base_relax_secs: Option<u32>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::exercise;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::beginner("beginner", LevelPreparation::Beginner)]
    #[case::medium("medium", LevelPreparation::Medium)]
    #[case::sportsman("sportsman", LevelPreparation::Sportsman)]
    fn level_parses_from_wire_name(#[case] raw: &str, #[case] expected: LevelPreparation) {
        assert_eq!(raw.parse::<LevelPreparation>().unwrap(), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn unknown_place_is_a_validation_error() {
        let err = "moon".parse::<PlaceExercise>().unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnknownVariant { kind: "exercise place", ref value } if value == "moon"
        ));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ExerciseType::UpperBody).unwrap();
        assert_eq!(json, "\"upper_body\"");
    }

    #[rstest]
    #[case::cardio(ExerciseType::Cardio, 30)]
    #[case::strength(ExerciseType::LowerBody, 60)]
    #[case::flexibility(ExerciseType::Flexibility, 15)]
    fn rest_falls_back_to_type_default(#[case] exercise_type: ExerciseType, #[case] expected: u32) {
        let e = exercise("x", exercise_type, PlaceExercise::Home);
        assert_eq!(e.recommended_rest_secs(), expected);
    }

    #[test]
    fn explicit_rest_wins() {
        let mut e = exercise("plank", ExerciseType::Flexibility, PlaceExercise::Home);
        e.base_relax_secs = 45;
        assert_eq!(e.recommended_rest_secs(), 45);
    }

    #[test]
    fn strength_calories_scale_by_reps_cardio_by_minutes() {
        let squat = exercise("squat", ExerciseType::LowerBody, PlaceExercise::Gym);
        let run = exercise("run", ExerciseType::Cardio, PlaceExercise::Street);

        assert_eq!(squat.calculate_calories(2.0, 30), 15.0);
        assert_eq!(run.calculate_calories(2.0, 30), 1.0);
    }

    #[test]
    fn type_and_place_helpers() {
        let run = exercise("run", ExerciseType::Cardio, PlaceExercise::Street);
        let stretch = exercise("stretch", ExerciseType::Flexibility, PlaceExercise::Home);

        assert!(run.is_cardio() && !run.is_strength());
        assert!(!stretch.is_cardio() && !stretch.is_strength());
        assert!(run.can_be_done_at(PlaceExercise::Street));
        assert!(!run.can_be_done_at(PlaceExercise::Gym));
    }

    #[test]
    fn update_rejects_negative_calories_and_keeps_old_state() {
        let mut e = exercise("burpee", ExerciseType::FullBody, PlaceExercise::Home);
        let before = e.clone();

        let err = e
            .apply(ExerciseUpdate {
                name: Some("new name".into()),
                avg_calories_per: Some(-1.0),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Invalid { .. }));
        assert_eq!(e, before);
    }
}
