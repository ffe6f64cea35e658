//! Random-forest regression.
//!
//! Each tree is a CART regression tree grown on a bootstrap sample of the
//! training rows until its leaves are pure or hold fewer than
//! `min_samples_split` rows. Splits maximize the reduction in squared error
//! and use the midpoint between neighbouring feature values as threshold.
//! The forest predicts the mean over all trees. All randomness comes from a
//! single `StdRng` seeded once per fit, so identical inputs give identical
//! models.

use crate::config::ModelSettings;
use crate::error::{AppError, Result};
use crate::ml::{FeatureRow, FittedModel, Regressor, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Configuration of the forest; fitting produces a `RandomForest`.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    n_estimators: usize,
    seed: u64,
    min_samples_split: usize,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            seed,
            min_samples_split: 2,
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self::new(settings.n_estimators, settings.seed)
    }

    /// Fits the forest and returns the concrete model type.
    pub fn fit_forest(&self, features: &[FeatureRow], target: &[f64]) -> Result<RandomForest> {
        if features.is_empty() {
            return Err(AppError::Model("cannot fit a forest on zero rows".into()));
        }
        if features.len() != target.len() {
            return Err(AppError::Model(format!(
                "feature rows ({}) and target values ({}) differ in length",
                features.len(),
                target.len()
            )));
        }
        if self.n_estimators == 0 {
            return Err(AppError::Model("forest needs at least one tree".into()));
        }
        if features.iter().flatten().chain(target).any(|v| !v.is_finite()) {
            return Err(AppError::Model("training data contains non-finite values".into()));
        }

        let n = features.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let trees = (0..self.n_estimators)
            .map(|_| {
                let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(features, target, &mut sample, self.min_samples_split)
            })
            .collect::<Vec<_>>();

        let forest = RandomForest { trees };
        debug!(
            "Fitted forest of {} trees on {} rows ({} nodes total)",
            forest.tree_count(),
            n,
            forest.trees.iter().map(|t| t.nodes.len()).sum::<usize>()
        );
        Ok(forest)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&self, features: &[FeatureRow], target: &[f64]) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.fit_forest(features, target)?))
    }

    fn name(&self) -> &str {
        "random-forest"
    }
}

/// A fitted forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl FittedModel for RandomForest {
    fn predict(&self, features: &[FeatureRow]) -> Vec<f64> {
        let count = self.trees.len() as f64;
        features
            .iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / count)
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of rows going left, in order sorted by `feature`.
    position: usize,
}

impl RegressionTree {
    fn fit(x: &[FeatureRow], y: &[f64], sample: &mut [usize], min_samples_split: usize) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample, min_samples_split.max(2));
        tree
    }

    /// Grows the subtree for `rows` and returns its node index.
    fn grow(&mut self, x: &[FeatureRow], y: &[f64], rows: &mut [usize], min_samples_split: usize) -> usize {
        let id = self.nodes.len();
        let value = mean_of(y, rows);
        self.nodes.push(Node::Leaf { value });

        if rows.len() < min_samples_split || is_constant(y, rows) {
            return id;
        }
        let Some(split) = best_split(x, y, rows) else {
            return id;
        };

        rows.sort_by(|&a, &b| x[a][split.feature].total_cmp(&x[b][split.feature]));
        let (left_rows, right_rows) = rows.split_at_mut(split.position);
        let left = self.grow(x, y, left_rows, min_samples_split);
        let right = self.grow(x, y, right_rows, min_samples_split);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn predict_row(&self, row: &FeatureRow) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                },
            }
        }
    }
}

/// Finds the split with the largest squared-error reduction.
///
/// Maximizing `S_l²/n_l + S_r²/n_r` (S = sum of targets) is equivalent to
/// minimizing the summed squared error of both children.
fn best_split(x: &[FeatureRow], y: &[f64], rows: &[usize]) -> Option<BestSplit> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&i| y[i]).sum();
    let mut best: Option<(f64, BestSplit)> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..FEATURE_COUNT {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for position in 1..n {
            left_sum += y[sorted[position - 1]];
            let lo = x[sorted[position - 1]][feature];
            let hi = x[sorted[position]][feature];
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / position as f64
                + right_sum * right_sum / (n - position) as f64;

            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((
                    score,
                    BestSplit {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        position,
                    },
                ));
            }
        }
    }

    best.map(|(_, split)| split)
}

fn mean_of(y: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64
}

fn is_constant(y: &[f64], rows: &[usize]) -> bool {
    let first = y[rows[0]];
    rows.iter().all(|&i| y[i] == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly_features(years: std::ops::RangeInclusive<i32>) -> Vec<FeatureRow> {
        years
            .flat_map(|y| (1..=12).map(move |m| [y as f64, m as f64]))
            .collect()
    }

    #[test]
    fn learns_a_seasonal_step() {
        let x = monthly_features(2015..=2020);
        let y: Vec<f64> = x
            .iter()
            .map(|r| if r[1] <= 6.0 { 10.0 } else { 20.0 })
            .collect();

        let forest = RandomForestRegressor::new(50, 42).fit_forest(&x, &y).unwrap();
        let pred = forest.predict(&[[2030.0, 1.0], [2030.0, 12.0]]);

        assert!((pred[0] - 10.0).abs() < 1e-9);
        assert!((pred[1] - 20.0).abs() < 1e-9);
        assert_eq!(forest.tree_count(), 50);
    }

    #[test]
    fn constant_target_predicts_constant() {
        let x = monthly_features(2019..=2020);
        let y = vec![7.5; x.len()];
        let forest = RandomForestRegressor::new(10, 1).fit_forest(&x, &y).unwrap();
        for p in forest.predict(&[[2050.0, 3.0], [1990.0, 11.0]]) {
            assert!((p - 7.5).abs() < 1e-12);
        }
    }

    #[test]
    fn same_seed_gives_identical_predictions() {
        let x = monthly_features(2010..=2020);
        let y: Vec<f64> = x
            .iter()
            .map(|r| 26.0 + (r[1] * 0.7).sin() + (r[0] - 2010.0) * 0.03)
            .collect();
        let grid = monthly_features(2025..=2027);

        let a = RandomForestRegressor::new(30, 42).fit_forest(&x, &y).unwrap();
        let b = RandomForestRegressor::new(30, 42).fit_forest(&x, &y).unwrap();
        assert_eq!(a.predict(&grid), b.predict(&grid));
    }

    #[test]
    fn predictions_stay_within_target_range() {
        let x = monthly_features(2012..=2016);
        let y: Vec<f64> = (0..x.len()).map(|i| (i % 9) as f64).collect();
        let forest = RandomForestRegressor::new(20, 3).fit_forest(&x, &y).unwrap();
        for p in forest.predict(&monthly_features(2025..=2026)) {
            assert!((0.0..=8.0).contains(&p));
        }
    }

    #[test]
    fn rejects_bad_input() {
        let reg = RandomForestRegressor::new(5, 0);
        assert!(reg.fit_forest(&[], &[]).is_err());
        assert!(reg.fit_forest(&[[2020.0, 1.0]], &[1.0, 2.0]).is_err());
        assert!(reg.fit_forest(&[[2020.0, 1.0]], &[f64::NAN]).is_err());
        assert!(RandomForestRegressor::new(0, 0)
            .fit_forest(&[[2020.0, 1.0]], &[1.0])
            .is_err());
    }

    #[test]
    fn single_row_becomes_a_leaf() {
        let forest = RandomForestRegressor::new(3, 9)
            .fit_forest(&[[2020.0, 5.0]], &[4.0])
            .unwrap();
        assert_eq!(forest.predict(&[[2070.0, 1.0]]), vec![4.0]);
    }
}
