//! Uniform shuffling with an injected RNG.
//!
//! Both the per-turn acting-agent selection and the initial placement draw
//! from the same Fisher-Yates routine so that a seed fully determines a run.

use rand::Rng;

/// Shuffle `items` uniformly in place (Fisher-Yates).
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let len = items.len();
    for i in 0..len.saturating_sub(1) {
        let j = rng.random_range(i..len);
        items.swap(i, j);
    }
}

/// Shuffle `items` and keep the first `count`.
pub fn sample<T, R: Rng + ?Sized>(mut items: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    fisher_yates(&mut items, rng);
    items.truncate(count);
    items
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn same_seed_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        fisher_yates(&mut a, &mut StdRng::seed_from_u64(3));
        fisher_yates(&mut b, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn every_position_is_reachable() {
        // Each of 3 items should land first at least once over many draws.
        let mut rng = StdRng::seed_from_u64(1);
        let mut firsts = [0_u32; 3];
        for _ in 0..600 {
            let mut items = [0_usize, 1, 2];
            fisher_yates(&mut items, &mut rng);
            firsts[items[0]] += 1;
        }
        assert!(firsts.iter().all(|&n| n > 100), "skewed: {firsts:?}");
    }

    #[test]
    fn sample_truncates() {
        let picked = sample((0..10).collect::<Vec<u32>>(), 3, &mut StdRng::seed_from_u64(5));
        assert_eq!(picked.len(), 3);
        let all = sample(vec![1, 2], 5, &mut StdRng::seed_from_u64(5));
        assert_eq!(all.len(), 2);
    }
}
