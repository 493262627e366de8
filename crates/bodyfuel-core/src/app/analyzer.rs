//! Workout history analysis: decides whether a user gets a new workout
//! and what it should look like.

use chrono::{DateTime, Duration, Utc};

use super::config::AnalyzerConfig;
use crate::domain::{AnalyzeWorkoutStats, UserId, Workout, WorkoutStatus};

pub const ACTIVE_WORKOUT_REASON: &str = "found workout with active status, it must finish first";

#[derive(Debug, Clone, Default)]
pub struct WorkoutAnalyzer {
    config: AnalyzerConfig,
}

impl WorkoutAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn history_limit(&self) -> usize {
        self.config.history_limit
    }

    /// `recent` must be ordered newest first.
    ///
    /// Checks run in order and the first match wins:
    /// 1. no history: defaults, no skip;
    /// 2. newest workout is in progress: skip;
    /// 3. newest workout was touched within the rest window: skip;
    /// 4. otherwise aggregate the whole slice.
    pub fn analyze(&self, user_id: UserId, recent: &[Workout], now: DateTime<Utc>) -> AnalyzeWorkoutStats {
        let Some(newest) = recent.first() else {
            return AnalyzeWorkoutStats::empty(user_id);
        };

        if newest.status == WorkoutStatus::InActive {
            return AnalyzeWorkoutStats::skipped(user_id, newest.created_at, ACTIVE_WORKOUT_REASON);
        }

        let rest = self.config.rest_window();
        // an unrepresentable end of rest means the user never gets rested
        let rested_at = newest.updated_at.checked_add_signed(rest).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if rested_at > now {
            let reason = format!(
                "last workout was at {}, need {} rest ({} remaining)",
                newest.updated_at.to_rfc3339(),
                human_duration(rest),
                human_duration(rested_at - now),
            );
            return AnalyzeWorkoutStats::skipped(user_id, newest.created_at, reason);
        }

        let week_start = now
            .checked_sub_signed(self.config.week_window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let count = |status: WorkoutStatus| recent.iter().filter(|w| w.status == status).count();

        AnalyzeWorkoutStats {
            user_id,
            total_workouts: saturating_u32(recent.len()),
            total_finished: saturating_u32(count(WorkoutStatus::Done)),
            total_cancelled: saturating_u32(count(WorkoutStatus::Failed)),
            total_new: saturating_u32(count(WorkoutStatus::Created)),
            finished_this_week: saturating_u32(
                recent
                    .iter()
                    .filter(|w| w.status == WorkoutStatus::Done)
                    .filter(|w| w.created_at >= week_start && w.created_at <= now)
                    .count(),
            ),
            average_level: dominant(recent.iter().map(|w| w.level)).unwrap_or(newest.level),
            popular_exercise_type: dominant(recent.iter().map(|w| w.focus)).unwrap_or(newest.focus),
            popular_place: dominant(recent.iter().map(|w| w.place)).unwrap_or(newest.place),
            last_generation: Some(newest.created_at),
            skip: false,
            skip_reason: None,
        }
    }
}

/// Most frequent value. On a tie the value that reached the top count
/// first (in iteration order) wins.
fn dominant<T: Copy + PartialEq>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    let mut best: Option<(T, usize)> = None;

    for value in values {
        let count = match counts.iter_mut().find(|(v, _)| *v == value) {
            Some(entry) => {
                entry.1 += 1;
                entry.1
            }
            None => {
                counts.push((value, 1));
                1
            }
        };
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }

    best.map(|(value, _)| value)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// "8h", "1h30m", "45s".
fn human_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (h, m, s) = (total / 3600, total % 3600 / 60, total % 60);

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workout::fixtures::workout;
    use crate::domain::{ExerciseType, PlaceExercise, WorkoutLevel};
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    fn user() -> UserId {
        UserId::from_ulid(Ulid::new())
    }

    fn analyzer() -> WorkoutAnalyzer {
        WorkoutAnalyzer::default()
    }

    #[test]
    fn empty_history_gets_defaults() {
        let user = user();
        let stats = analyzer().analyze(user, &[], now());

        assert_eq!(stats, AnalyzeWorkoutStats::empty(user));
        assert_eq!(stats.average_level, WorkoutLevel::Light);
        assert_eq!(stats.popular_place, PlaceExercise::Home);
        assert_eq!(stats.popular_exercise_type, ExerciseType::UpperBody);
        assert!(!stats.skip);
    }

    #[test]
    fn active_workout_skips_regardless_of_age() {
        let user = user();
        let old = now() - Duration::days(30);
        let history = [workout(user, WorkoutStatus::InActive, old)];

        let stats = analyzer().analyze(user, &history, now());

        assert!(stats.skip);
        assert_eq!(stats.skip_reason.as_deref(), Some(ACTIVE_WORKOUT_REASON));
        assert_eq!(stats.last_generation, Some(old));
        assert_eq!(stats.total_workouts, 0);
    }

    #[rstest]
    #[case::done(WorkoutStatus::Done)]
    #[case::failed(WorkoutStatus::Failed)]
    #[case::created(WorkoutStatus::Created)]
    fn recent_workout_needs_rest(#[case] status: WorkoutStatus) {
        let user = user();
        let history = [workout(user, status, now() - Duration::hours(1))];

        let stats = analyzer().analyze(user, &history, now());

        assert!(stats.skip);
        let reason = stats.skip_reason.unwrap();
        assert!(reason.starts_with("last workout was at 2024-06-15T17:00:00+00:00"), "{reason}");
        assert!(reason.ends_with("need 8h rest (7h remaining)"), "{reason}");
    }

    #[test]
    fn rested_user_is_aggregated() {
        let user = user();
        let mut history = vec![
            workout(user, WorkoutStatus::Done, now() - Duration::hours(9)),
            workout(user, WorkoutStatus::Failed, now() - Duration::days(2)),
            workout(user, WorkoutStatus::Done, now() - Duration::days(6)),
            workout(user, WorkoutStatus::Created, now() - Duration::days(7)),
            workout(user, WorkoutStatus::Done, now() - Duration::days(8)),
        ];
        history[1].place = PlaceExercise::Gym;
        history[2].place = PlaceExercise::Gym;
        history[3].place = PlaceExercise::Gym;
        history[0].focus = ExerciseType::Cardio;

        let stats = analyzer().analyze(user, &history, now());

        assert!(!stats.skip);
        assert_eq!(stats.total_workouts, 5);
        assert_eq!(stats.total_finished, 3);
        assert_eq!(stats.total_cancelled, 1);
        assert_eq!(stats.total_new, 1);
        assert_eq!(stats.finished_this_week, 2);
        assert_eq!(stats.popular_place, PlaceExercise::Gym);
        assert_eq!(stats.popular_exercise_type, ExerciseType::UpperBody);
        assert_eq!(stats.last_generation, Some(now() - Duration::hours(9)));
    }

    #[test]
    fn week_window_is_inclusive() {
        let user = user();
        let history = [
            workout(user, WorkoutStatus::Done, now() - Duration::hours(8)),
            workout(user, WorkoutStatus::Done, now() - Duration::days(7)),
            workout(user, WorkoutStatus::Done, now() - Duration::days(7) - Duration::seconds(1)),
        ];

        let stats = analyzer().analyze(user, &history, now());

        assert_eq!(stats.finished_this_week, 2);
    }

    #[test]
    fn huge_windows_saturate_instead_of_overflowing() {
        let user = user();
        let analyzer = WorkoutAnalyzer::new(AnalyzerConfig {
            rest_window_secs: u64::MAX,
            week_window_days: u32::MAX,
            ..Default::default()
        });
        let history = [workout(user, WorkoutStatus::Done, now() - Duration::days(400))];

        let stats = analyzer.analyze(user, &history, now());
        assert!(stats.skip);
        assert!(stats.skip_reason.unwrap().starts_with("last workout was at"));

        let analyzer = WorkoutAnalyzer::new(AnalyzerConfig {
            week_window_days: u32::MAX,
            ..Default::default()
        });
        let stats = analyzer.analyze(user, &history, now());
        assert!(!stats.skip);
        assert_eq!(stats.finished_this_week, 1);
    }

    #[test]
    fn mode_ties_go_to_the_first_value_to_reach_the_top() {
        let user = user();
        let mut history: Vec<Workout> = (0..4)
            .map(|i| workout(user, WorkoutStatus::Done, now() - Duration::days(i + 1)))
            .collect();
        history[0].place = PlaceExercise::Street;
        history[1].place = PlaceExercise::Gym;
        history[2].place = PlaceExercise::Gym;
        history[3].place = PlaceExercise::Street;

        let stats = analyzer().analyze(user, &history, now());

        // Gym reaches 2 before Street does.
        assert_eq!(stats.popular_place, PlaceExercise::Gym);
    }

    #[test]
    fn dominant_prefers_the_first_to_reach_a_count() {
        assert_eq!(dominant([1, 2, 2, 1]), Some(2));
        assert_eq!(dominant([1, 2]), Some(1));
        assert_eq!(dominant(Vec::<u8>::new()), None);
    }

    #[rstest]
    #[case::hours(Duration::hours(8), "8h")]
    #[case::mixed(Duration::minutes(90), "1h30m")]
    #[case::seconds(Duration::seconds(45), "45s")]
    #[case::zero(Duration::zero(), "0s")]
    fn durations_are_compact(#[case] d: Duration, #[case] expected: &str) {
        assert_eq!(human_duration(d), expected);
    }
}
