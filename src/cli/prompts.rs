//! Interactive prompts for the session menu.

use crate::error::Result;
use crate::models::Variable;
use dialoguer::{theme::ColorfulTheme, FuzzySelect, Input, MultiSelect};
use std::collections::BTreeSet;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Multi-select over the years present in the data. `None` if cancelled.
pub fn prompt_years(available: &[i32], current: &BTreeSet<i32>) -> Result<Option<BTreeSet<i32>>> {
    let items: Vec<String> = available.iter().map(|y| y.to_string()).collect();
    let defaults: Vec<bool> = available.iter().map(|y| current.contains(y)).collect();

    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select years (space to toggle, enter to confirm)")
        .items(&items)
        .defaults(&defaults)
        .interact_opt()?;

    Ok(chosen.map(|indices| indices.into_iter().map(|i| available[i]).collect()))
}

/// Multi-select over the twelve months. `None` if cancelled.
pub fn prompt_months(current: &BTreeSet<u32>) -> Result<Option<BTreeSet<u32>>> {
    let defaults: Vec<bool> = (1..=12).map(|m| current.contains(&m)).collect();

    let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select months (space to toggle, enter to confirm)")
        .items(&MONTH_NAMES)
        .defaults(&defaults)
        .interact_opt()?;

    Ok(chosen.map(|indices| indices.into_iter().map(|i| i as u32 + 1).collect()))
}

/// Picks one variable by its label. `None` if cancelled.
pub fn prompt_variable(prompt: &str, variables: &[Variable]) -> Result<Option<Variable>> {
    let labels: Vec<&str> = variables.iter().map(|v| v.label()).collect();
    let chosen = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(chosen.map(|i| variables[i]))
}

/// Asks where to write the forecast export.
pub fn prompt_export_path(default: &str) -> Result<String> {
    let path = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Save forecast CSV to")
        .default(default.to_string())
        .interact_text()?;
    Ok(path)
}
