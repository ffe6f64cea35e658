//! Seeded train/test partitioning.

use crate::error::{AppError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a hold-out split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with `seed` and withholds `ceil(n * test_fraction)` rows.
///
/// Both sides must end up non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<HoldoutSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AppError::Model(format!(
            "test fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::Model(format!(
            "{} rows cannot be split with test fraction {}",
            n, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(HoldoutSplit {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(5, 1, 4)]
    #[case(10, 2, 8)]
    #[case(11, 3, 8)]
    #[case(60, 12, 48)]
    fn split_sizes(#[case] n: usize, #[case] test: usize, #[case] train: usize) {
        let split = train_test_split(n, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), test);
        assert_eq!(split.train.len(), train);
    }

    #[test]
    fn split_is_a_seeded_partition() {
        let a = train_test_split(40, 0.2, 42).unwrap();
        let b = train_test_split(40, 0.2, 42).unwrap();
        assert_eq!(a, b);

        let mut all: Vec<usize> = a.train.iter().chain(&a.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..40).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(0, 0.2)]
    #[case(1, 0.2)]
    #[case(10, 0.0)]
    #[case(10, 1.0)]
    fn invalid_splits(#[case] n: usize, #[case] fraction: f64) {
        assert!(train_test_split(n, fraction, 42).is_err());
    }
}
