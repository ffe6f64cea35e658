//! Regression backend used by the forecast model bank.
//!
//! Includes:
//! - `traits`: the `Regressor` / `FittedModel` seam the pipeline is written against.
//! - `forest`: a seeded random-forest regressor built from CART trees.
//! - `split`: the seeded hold-out split.
//! - `metrics`: RMSE and R² for hold-out evaluation.

mod forest;
mod metrics;
mod split;
mod traits;

pub use forest::*;
pub use metrics::*;
pub use split::*;
pub use traits::*;
