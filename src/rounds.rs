use crate::error::{GameError, Result};
use crate::manifest::LocationRecord;
use rand::seq::SliceRandom;
use rand::Rng;

/// Pick `count` distinct locations from the pool, in play order.
pub fn select_rounds(pool: &[LocationRecord], count: usize) -> Result<Vec<LocationRecord>> {
    select_rounds_with(pool, count, &mut rand::thread_rng())
}

/// Like [`select_rounds`] but drawing from the given generator.
///
/// The whole pool is shuffled (Fisher-Yates, every permutation equally
/// likely) and then truncated, so no location repeats within a session.
pub fn select_rounds_with<R: Rng + ?Sized>(
    pool: &[LocationRecord],
    count: usize,
    rng: &mut R,
) -> Result<Vec<LocationRecord>> {
    if count > pool.len() {
        return Err(GameError::InsufficientPool {
            requested: count,
            available: pool.len(),
        });
    }

    let mut rounds = pool.to_vec();
    rounds.shuffle(rng);
    rounds.truncate(count);
    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn create_test_pool(n: usize) -> Vec<LocationRecord> {
        (0..n)
            .map(|i| LocationRecord::new(format!("img{i}.jpg"), 22.25 + i as f64 * 0.001, 84.90))
            .collect()
    }

    #[test]
    fn test_select_returns_distinct_pool_members() {
        let pool = create_test_pool(6);
        let rounds = select_rounds(&pool, 5).unwrap();

        assert_eq!(rounds.len(), 5);
        let names: HashSet<_> = rounds.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names.len(), 5, "rounds must not repeat");
        for r in &rounds {
            assert!(pool.contains(r));
        }
    }

    #[test]
    fn test_select_whole_pool_is_permutation() {
        let pool = create_test_pool(4);
        let mut rounds = select_rounds(&pool, 4).unwrap();
        rounds.sort_by(|a, b| a.filename.cmp(&b.filename));
        assert_eq!(rounds, pool);
    }

    #[test]
    fn test_select_zero_rounds() {
        let pool = create_test_pool(3);
        assert!(select_rounds(&pool, 0).unwrap().is_empty());
    }

    #[test]
    fn test_select_insufficient_pool() {
        let pool = create_test_pool(3);
        assert_eq!(
            select_rounds(&pool, 5),
            Err(GameError::InsufficientPool {
                requested: 5,
                available: 3
            })
        );
    }

    #[test]
    fn test_select_is_reproducible_with_seed() {
        let pool = create_test_pool(10);
        let a = select_rounds_with(&pool, 5, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = select_rounds_with(&pool, 5, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_frequency_is_roughly_uniform() {
        let pool = create_test_pool(6);
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 6000;
        let mut counts: HashMap<String, usize> = HashMap::new();

        for _ in 0..trials {
            for r in select_rounds_with(&pool, 3, &mut rng).unwrap() {
                *counts.entry(r.filename).or_insert(0) += 1;
            }
        }

        // each element expected in half of the draws: 3000 appearances
        let expected = trials * 3 / 6;
        for record in &pool {
            let seen = counts.get(&record.filename).copied().unwrap_or(0);
            assert!(
                seen.abs_diff(expected) < expected / 10,
                "{} appeared {seen} times, expected about {expected}",
                record.filename
            );
        }
    }

    #[test]
    fn test_select_first_position_is_roughly_uniform() {
        let pool = create_test_pool(4);
        let mut rng = StdRng::seed_from_u64(9);
        let trials = 4000;
        let mut firsts: HashMap<String, usize> = HashMap::new();

        for _ in 0..trials {
            let rounds = select_rounds_with(&pool, 1, &mut rng).unwrap();
            *firsts.entry(rounds[0].filename.clone()).or_insert(0) += 1;
        }

        let expected = trials / 4;
        assert_eq!(firsts.len(), 4);
        for seen in firsts.values() {
            assert!(seen.abs_diff(expected) < expected / 5);
        }
    }
}
