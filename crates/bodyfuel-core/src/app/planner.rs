//! Turns a selection of catalog exercises into a workout.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{
    AnalyzeWorkoutStats, Exercise, ExerciseStatus, UserParams, Workout, WorkoutExercise, WorkoutId,
    WorkoutLevel, WorkoutStatus,
};

/// Time budget of a single repetition.
pub const SECONDS_PER_REP: u64 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkoutPlanner;

impl WorkoutPlanner {
    pub fn plan(
        &self,
        workout_id: WorkoutId,
        params: &UserParams,
        stats: &AnalyzeWorkoutStats,
        exercises: &[Exercise],
        now: DateTime<Utc>,
    ) -> Workout {
        let coef = params.lifestyle.rep_coefficient();

        let mut duration_secs = 0u64;
        let mut prediction = 0u32;
        let planned: Vec<WorkoutExercise> = exercises
            .iter()
            .map(|e| {
                let reps = ((f64::from(e.base_count_reps) * coef).round() as u32).max(1);
                let sets = e.steps.max(1);
                let rest_secs = e.recommended_rest_secs();

                let total_reps = sets.saturating_mul(reps);
                let work_secs = u64::from(total_reps) * SECONDS_PER_REP;
                duration_secs += work_secs + u64::from(sets) * u64::from(rest_secs);

                let calories = e.calculate_calories(work_secs as f64 / 60.0, total_reps).round() as u32;
                prediction = prediction.saturating_add(calories);

                WorkoutExercise {
                    exercise_id: e.id,
                    name: e.name.clone(),
                    sets,
                    reps,
                    rest_secs,
                    calories,
                    status: ExerciseStatus::NotStarted,
                }
            })
            .collect();

        Workout {
            id: workout_id,
            user_id: params.user_id,
            level: WorkoutLevel::from(params.level_preparation()),
            status: WorkoutStatus::Created,
            total_calories: 0,
            prediction_calories: prediction,
            duration: Duration::from_secs(duration_secs),
            focus: stats.popular_exercise_type,
            place: stats.popular_place,
            exercises: planned,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exercise::fixtures::exercise;
    use crate::domain::user::fixtures::params;
    use crate::domain::{ExerciseType, Lifestyle, PlaceExercise, UserId};
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    fn plan(lifestyle: Lifestyle, exercises: &[Exercise]) -> Workout {
        let user = UserId::from_ulid(Ulid::new());
        let p = params(user, lifestyle);
        let stats = AnalyzeWorkoutStats::empty(user);
        WorkoutPlanner.plan(WorkoutId::from_ulid(Ulid::new()), &p, &stats, exercises, now())
    }

    #[rstest]
    #[case::not_active(Lifestyle::NotActive, 8)]
    #[case::active(Lifestyle::Active, 10)]
    #[case::sportive(Lifestyle::Sportive, 13)]
    fn reps_scale_with_lifestyle(#[case] lifestyle: Lifestyle, #[case] reps: u32) {
        let w = plan(lifestyle, &[exercise("push-up", ExerciseType::UpperBody, PlaceExercise::Home)]);

        assert_eq!(w.exercises[0].reps, reps);
        assert_eq!(w.exercises[0].sets, 3);
    }

    #[test]
    fn duration_and_calories_add_up() {
        let w = plan(
            Lifestyle::Active,
            &[
                exercise("push-up", ExerciseType::UpperBody, PlaceExercise::Home),
                exercise("jumping jacks", ExerciseType::Cardio, PlaceExercise::Home),
            ],
        );

        // push-up: 3x10 reps = 90s work + 3x60s rest, 0.5 kcal x 30 reps
        // jumping jacks: 90s work + 3x30s rest, 0.5 kcal x 1.5 min
        assert_eq!(w.duration, Duration::from_secs(270 + 180));
        assert_eq!(w.exercises[0].calories, 15);
        assert_eq!(w.exercises[1].calories, 1);
        assert_eq!(w.prediction_calories, 16);
    }

    #[test]
    fn zero_base_values_still_produce_one_rep_and_one_set() {
        let mut e = exercise("plank", ExerciseType::Flexibility, PlaceExercise::Home);
        e.base_count_reps = 0;
        e.steps = 0;

        let w = plan(Lifestyle::NotActive, &[e]);

        assert_eq!(w.exercises[0].reps, 1);
        assert_eq!(w.exercises[0].sets, 1);
    }

    #[test]
    fn workout_starts_created_with_level_from_lifestyle() {
        let w = plan(Lifestyle::Sportive, &[]);

        assert_eq!(w.status, WorkoutStatus::Created);
        assert_eq!(w.level, WorkoutLevel::Hard);
        assert_eq!(w.place, PlaceExercise::Home);
        assert_eq!(w.focus, ExerciseType::UpperBody);
        assert_eq!(w.created_at, now());
        assert!(w.exercises.is_empty());
    }
}
