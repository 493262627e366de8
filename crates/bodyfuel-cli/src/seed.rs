//! Demo data: a small exercise catalog and a few users.

use anyhow::Result;
use bodyfuel_core::app::{NewExercise, NewUser, NewUserParams, ProfileService};
use bodyfuel_core::domain::{ExerciseType, LevelPreparation, Lifestyle, PlaceExercise, UserId, Want};
use chrono::{Duration, Utc};

struct Template {
    name: &'static str,
    exercise_type: ExerciseType,
    base_count_reps: u32,
    steps: u32,
    avg_calories_per: f64,
}

const TEMPLATES: &[Template] = &[
    Template { name: "push-up", exercise_type: ExerciseType::UpperBody, base_count_reps: 12, steps: 3, avg_calories_per: 0.5 },
    Template { name: "pike press", exercise_type: ExerciseType::UpperBody, base_count_reps: 10, steps: 3, avg_calories_per: 0.6 },
    Template { name: "squat", exercise_type: ExerciseType::LowerBody, base_count_reps: 15, steps: 3, avg_calories_per: 0.45 },
    Template { name: "lunge", exercise_type: ExerciseType::LowerBody, base_count_reps: 12, steps: 3, avg_calories_per: 0.5 },
    Template { name: "burpee", exercise_type: ExerciseType::FullBody, base_count_reps: 8, steps: 4, avg_calories_per: 1.2 },
    Template { name: "jumping jacks", exercise_type: ExerciseType::Cardio, base_count_reps: 30, steps: 2, avg_calories_per: 8.0 },
    Template { name: "high knees", exercise_type: ExerciseType::Cardio, base_count_reps: 30, steps: 2, avg_calories_per: 9.0 },
    Template { name: "hamstring stretch", exercise_type: ExerciseType::Flexibility, base_count_reps: 5, steps: 2, avg_calories_per: 2.0 },
];

/// Fills the catalog for every level and place, then registers one user
/// per lifestyle. Returns the new user ids.
pub async fn seed(profile: &ProfileService) -> Result<Vec<UserId>> {
    for level in LevelPreparation::ALL {
        for place in PlaceExercise::ALL {
            for t in TEMPLATES {
                profile
                    .create_exercise(NewExercise {
                        level: *level,
                        name: format!("{} ({level}, {place})", t.name),
                        exercise_type: t.exercise_type,
                        description: format!("{} for {level} level", t.name),
                        base_count_reps: t.base_count_reps,
                        steps: t.steps,
                        link_gif: String::new(),
                        place: *place,
                        avg_calories_per: t.avg_calories_per,
                        base_relax_secs: 0,
                    })
                    .await?;
            }
        }
    }

    let users = [
        ("neo", Lifestyle::NotActive, Want::LoseWeight, 92.0),
        ("trinity", Lifestyle::Active, Want::StayFit, 61.0),
        ("morpheus", Lifestyle::Sportive, Want::BuildMuscle, 88.0),
    ];

    let mut ids = Vec::with_capacity(users.len());
    for (username, lifestyle, want, weight) in users {
        let user = profile
            .register_user(NewUser {
                username: username.into(),
                name: username.into(),
                surname: "Demo".into(),
                password_hash: String::new(),
                email: format!("{username}@bodyfuel.local"),
                phone: "+10000000000".into(),
            })
            .await?;

        profile
            .create_params(
                user.id,
                NewUserParams {
                    height: 178,
                    photo: String::new(),
                    want,
                    lifestyle,
                    target_weight: weight - 3.0,
                    target_workouts_weeks: 3,
                    target_calories_daily: 2200,
                },
            )
            .await?;
        profile
            .add_weight(user.id, weight, Some(Utc::now() - Duration::days(1)))
            .await?;

        ids.push(user.id);
    }

    tracing::info!(
        exercises = LevelPreparation::ALL.len() * PlaceExercise::ALL.len() * TEMPLATES.len(),
        users = ids.len(),
        "demo data seeded"
    );
    Ok(ids)
}
