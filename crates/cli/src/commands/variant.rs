use cartwise_core::pilot::ExperimentConfig;
use serde_json::json;

use crate::commands::CommandResult;

const COMMAND: &str = "variant";

pub fn run(customer_id: &str, percentage: Option<f64>, seed: Option<&str>) -> CommandResult {
    let mut experiment = match percentage {
        Some(percentage) => match ExperimentConfig::new(percentage) {
            Ok(experiment) => experiment,
            Err(error) => {
                return CommandResult::failure(COMMAND, "invalid_input", error.to_string(), 2);
            }
        },
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = seed {
        experiment = experiment.with_seed(seed);
    }

    let variant = experiment.assign_variant(customer_id);
    CommandResult::success_with_data(
        COMMAND,
        format!("customer `{customer_id}` is assigned to `{variant}`"),
        json!({
            "customer_id": customer_id,
            "variant": variant,
            "seed": experiment.seed,
            "test_percentage": experiment.test_percentage,
        }),
    )
}
