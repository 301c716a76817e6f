use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cartwise_core::domain::interaction::InteractionEvent;
use cartwise_core::metrics::{measure_success_metrics, ShownItem};
use serde::Deserialize;

use crate::commands::{to_data, CommandResult};

const COMMAND: &str = "metrics";

#[derive(Debug, Deserialize)]
struct MetricsInput {
    #[serde(default)]
    recommendations: Vec<ShownItem>,
    #[serde(default)]
    interactions: Vec<InteractionEvent>,
    #[serde(default)]
    baseline_aov: Option<f64>,
}

fn load_input(path: &Path) -> Result<MetricsInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read metrics input `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse metrics input `{}`", path.display()))
}

pub fn run(input: &Path) -> CommandResult {
    let input = match load_input(input) {
        Ok(input) => input,
        Err(error) => {
            return CommandResult::failure(COMMAND, "input_file", format!("{error:#}"), 3);
        }
    };

    let metrics =
        measure_success_metrics(&input.recommendations, &input.interactions, input.baseline_aov);

    match to_data(COMMAND, &metrics.to_map()) {
        Ok(data) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "scored {} recommendation(s) against {} interaction(s)",
                input.recommendations.len(),
                input.interactions.len()
            ),
            data,
        ),
        Err(failure) => failure,
    }
}
