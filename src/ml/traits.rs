//! Interfaces between the pipeline and a regression backend.

use crate::error::Result;

/// Number of predictors: (year, month).
pub const FEATURE_COUNT: usize = 2;

/// One feature vector: `[year, month]`.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// A trained model mapping feature rows to predicted values.
pub trait FittedModel {
    fn predict(&self, features: &[FeatureRow]) -> Vec<f64>;
}

/// A regression algorithm that can be fitted to data.
///
/// Implementations must be deterministic for identical inputs so that
/// re-running the pipeline reproduces the same forecast.
pub trait Regressor {
    fn fit(&self, features: &[FeatureRow], target: &[f64]) -> Result<Box<dyn FittedModel>>;

    fn name(&self) -> &str;
}
