//! Six-sided dice.
//!
//! Everything in this system is rolled on d6; checks use the sum of two.

pub mod roll;

pub use roll::RollResult;

use rand::Rng;
use rand::rngs::StdRng;

/// Faces on every die.
pub const D6_SIDES: u32 = 6;

/// Roll `count` d6.
pub fn roll_d6(rng: &mut StdRng, count: usize) -> RollResult {
    let faces = (0..count)
        .map(|_| rng.random_range(1..=D6_SIDES))
        .collect::<Vec<u32>>();
    RollResult::from_d6(faces)
}

/// Roll two d6.
pub fn roll_2d6(rng: &mut StdRng) -> RollResult {
    roll_d6(rng, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn faces_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let r = roll_d6(&mut rng, 10);
        assert_eq!(r.count(), 10);
        assert!(r.faces().iter().all(|f| (1..=6).contains(f)));
    }

    #[test]
    fn same_seed_same_roll() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(roll_d6(&mut a, 3), roll_d6(&mut b, 3));
    }

    #[test]
    fn two_d6_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let total = roll_2d6(&mut rng).total();
            assert!((2..=12).contains(&total), "rolled {total}");
        }
    }

    #[test]
    fn two_d6_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 1000;
        let mut seen = HashSet::new();
        let mut sum = 0u32;
        for _ in 0..trials {
            let total = roll_2d6(&mut rng).total();
            seen.insert(total);
            sum += total;
        }
        let mean = f64::from(sum) / f64::from(trials);
        assert!(seen.len() >= 5, "only {} distinct totals", seen.len());
        assert!((mean - 7.0).abs() < 0.5, "mean {mean}");
    }
}
