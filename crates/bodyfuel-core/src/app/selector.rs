//! Weighted random exercise selection.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use super::config::SelectorConfig;
use crate::domain::{Exercise, ExerciseType};

#[derive(Debug, Clone, Default)]
pub struct ExerciseSelector {
    config: SelectorConfig,
}

impl ExerciseSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Configured number of exercises per workout.
    pub fn default_count(&self) -> usize {
        self.config.count
    }

    /// Pick up to `count` distinct exercises, biased toward `preferred`.
    ///
    /// A pool no larger than `count` is returned as is. Otherwise every
    /// preferred-type exercise enters the draw `preferred_weight` times and
    /// every other one once; after a shuffle the first `count` distinct
    /// entries win.
    pub fn select<R: Rng + ?Sized>(
        &self,
        pool: &[Exercise],
        preferred: ExerciseType,
        count: usize,
        rng: &mut R,
    ) -> Vec<Exercise> {
        if pool.len() <= count {
            return pool.to_vec();
        }

        let weight = self.config.preferred_weight.max(1);
        let mut draw: Vec<usize> = pool
            .iter()
            .enumerate()
            .flat_map(|(i, e)| {
                let copies = if e.exercise_type == preferred { weight } else { 1 };
                std::iter::repeat_n(i, copies)
            })
            .collect();
        draw.shuffle(rng);

        let mut seen = HashSet::with_capacity(count);
        draw.into_iter()
            .filter(|&i| seen.insert(pool[i].id))
            .take(count)
            .map(|i| pool[i].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlaceExercise;
    use crate::domain::exercise::fixtures::exercise;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(preferred: usize, others: usize) -> Vec<Exercise> {
        let mut pool: Vec<Exercise> = (0..preferred)
            .map(|i| exercise(&format!("cardio-{i}"), ExerciseType::Cardio, PlaceExercise::Home))
            .collect();
        pool.extend(
            (0..others).map(|i| exercise(&format!("upper-{i}"), ExerciseType::UpperBody, PlaceExercise::Home)),
        );
        pool
    }

    #[test]
    fn small_pool_is_returned_unchanged() {
        let pool = pool(1, 3);
        let mut rng = StdRng::seed_from_u64(1);

        let got = ExerciseSelector::default().select(&pool, ExerciseType::Cardio, 5, &mut rng);

        assert_eq!(got, pool);
    }

    #[test]
    fn selection_has_count_distinct_members_of_the_pool() {
        let pool = pool(3, 9);
        let selector = ExerciseSelector::default();
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..200 {
            let got = selector.select(&pool, ExerciseType::Cardio, 5, &mut rng);

            assert_eq!(got.len(), 5);
            let ids: HashSet<_> = got.iter().map(|e| e.id).collect();
            assert_eq!(ids.len(), 5);
            assert!(got.iter().all(|e| pool.contains(e)));
        }
    }

    #[test]
    fn preferred_type_is_picked_more_often() {
        let pool = pool(2, 8);
        let selector = ExerciseSelector::default();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;

        let mut preferred_hits = 0usize;
        let mut other_hits = 0usize;
        for _ in 0..trials {
            for e in selector.select(&pool, ExerciseType::Cardio, 5, &mut rng) {
                if e.exercise_type == ExerciseType::Cardio {
                    preferred_hits += 1;
                } else {
                    other_hits += 1;
                }
            }
        }

        // per-exercise inclusion rates
        let preferred_rate = preferred_hits as f64 / (2 * trials) as f64;
        let other_rate = other_hits as f64 / (8 * trials) as f64;
        assert!(
            preferred_rate > other_rate * 1.5,
            "preferred {preferred_rate:.3} vs other {other_rate:.3}"
        );
    }

    #[test]
    fn zero_count_selects_nothing() {
        let pool = pool(2, 2);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(ExerciseSelector::default()
            .select(&pool, ExerciseType::Cardio, 0, &mut rng)
            .is_empty());
    }
}
