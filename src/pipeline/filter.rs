//! Year/month selection over daily observations.

use crate::error::{AppError, Result};
use crate::models::{Dataset, Observation};
use std::collections::BTreeSet;

/// The years and months a user has chosen to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub months: BTreeSet<u32>,
}

impl FilterSelection {
    /// Every year present in `dataset` and all twelve months.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            years: dataset.years().into_iter().collect(),
            months: (1..=12).collect(),
        }
    }

    /// Builds a selection from optional user lists; `None` means "everything".
    pub fn from_lists(
        dataset: &Dataset,
        years: Option<&[i32]>,
        months: Option<&[u32]>,
    ) -> Result<Self> {
        let mut selection = Self::all(dataset);
        if let Some(years) = years {
            selection.years = years.iter().copied().collect();
        }
        if let Some(months) = months {
            if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
                return Err(AppError::Cli(format!(
                    "Month {} is out of range, expected 1-12",
                    bad
                )));
            }
            selection.months = months.iter().copied().collect();
        }
        Ok(selection)
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        self.years.contains(&observation.year) && self.months.contains(&observation.month)
    }
}

/// Observations whose year and month are both selected, in input order.
pub fn apply<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> Vec<&'a Observation> {
    dataset
        .observations
        .iter()
        .filter(|o| selection.matches(o))
        .collect()
}
