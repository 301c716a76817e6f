pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use cartwise_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "cartwise",
    about = "Cartwise operator CLI",
    long_about = "Inspect configuration, generate freshness-aware add-on recommendations from an \
                  order history, score recommendation outcomes, and check A/B variant assignment.",
    after_help = "Examples:\n  cartwise config\n  cartwise recommend --orders orders.json --cart \"Traditional Wings\" --customer c-1\n  cartwise metrics --input outcomes.json\n  cartwise variant --customer c-1 --percentage 0.2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Build features from an orders file and run recommendation sessions")]
    Recommend {
        #[arg(long, help = "JSON array of orders with an `items` list or delimited string")]
        orders: PathBuf,
        #[arg(long = "cart", help = "Item already in the cart (repeatable)")]
        cart: Vec<String>,
        #[arg(long, help = "Customer identifier used for freshness history")]
        customer: String,
        #[arg(long, default_value = "app", help = "app | web | kiosk")]
        platform: String,
        #[arg(long, help = "guest | registered | special")]
        customer_type: Option<String>,
        #[arg(long)]
        store: Option<String>,
        #[arg(long, help = "Override the platform's list length")]
        count: Option<usize>,
        #[arg(long, default_value_t = 1, help = "Consecutive sessions sharing one history")]
        sessions: usize,
        #[arg(long, help = "Seed for trending-slot sampling")]
        seed: Option<u64>,
    },
    #[command(about = "Compute success metrics from shown items and tracked interactions")]
    Metrics {
        #[arg(long, help = "JSON object with `recommendations`, `interactions`, `baseline_aov`")]
        input: PathBuf,
    },
    #[command(about = "Show the A/B variant a customer is assigned to")]
    Variant {
        #[arg(long)]
        customer: String,
        #[arg(long, help = "Fraction of customers eligible for a test variant")]
        percentage: Option<f64>,
        #[arg(long)]
        seed: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Recommend {
            orders,
            cart,
            customer,
            platform,
            customer_type,
            store,
            count,
            sessions,
            seed,
        } => commands::recommend::run(&commands::recommend::RecommendArgs {
            orders,
            cart,
            customer,
            platform,
            customer_type,
            store,
            count,
            sessions,
            seed,
        }),
        Command::Metrics { input } => commands::metrics::run(&input),
        Command::Variant { customer, percentage, seed } => {
            commands::variant::run(&customer, percentage, seed.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Events go to stderr so stdout stays parseable JSON.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
