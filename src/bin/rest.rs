//! rest CLI - Command-line interface for BetterRest
//!
//! Commands:
//! - estimate: Recommend a bedtime for one set of inputs
//! - sweep: Show how the bedtime moves across the caffeine range
//! - model: Print the built-in model document
//! - doctor: Diagnose model loading and configuration

use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use better_rest::config::{Config, ModelSource};
use better_rest::encoder::BedtimeReport;
use better_rest::error::{ConfigError, InputError, ModelError};
use better_rest::model::LinearSleepModel;
use better_rest::types::{MAX_CAFFEINE_UNITS, MIN_CAFFEINE_UNITS};
use better_rest::{
    BedtimeCalculator, CaffeineIntake, Normalizer, SleepGoal, WakeTime, PRODUCER_NAME,
    REST_VERSION,
};

/// rest - Find the bedtime that gets you the sleep you actually need
#[derive(Parser)]
#[command(name = "rest")]
#[command(author = "BetterRest Contributors")]
#[command(version = REST_VERSION)]
#[command(about = "Estimate a recommended bedtime", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a bedtime
    Estimate {
        /// Wake-up time (HH:MM, 24-hour clock)
        #[arg(short, long, default_value = "07:00")]
        wake: String,

        /// Desired hours of sleep (4 to 12, in 0.25 steps)
        #[arg(short, long, default_value = "8.0")]
        sleep: f64,

        /// Daily cups of coffee (1 to 20)
        #[arg(short, long, default_value = "1")]
        coffee: u32,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the bedtime for every caffeine count from 1 to 20
    Sweep {
        /// Wake-up time (HH:MM, 24-hour clock)
        #[arg(short, long, default_value = "07:00")]
        wake: String,

        /// Desired hours of sleep (4 to 12, in 0.25 steps)
        #[arg(short, long, default_value = "8.0")]
        sleep: f64,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the built-in model document
    Model {
        /// Print the JSON schema for model documents instead
        #[arg(long)]
        json_schema: bool,
    },

    /// Diagnose model loading and configuration
    Doctor {
        /// Model document to check
        #[arg(long)]
        model: Option<PathBuf>,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Wake-up date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Model document to load instead of the built-in model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// strftime pattern for the bedtime (overrides config)
    #[arg(long)]
    time_format: Option<String>,

    /// Output as JSON (default when stdout is not a terminal)
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG takes precedence over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("better_rest={level},rest={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}

fn run(cli: Cli) -> Result<(), RestCliError> {
    match cli.command {
        Commands::Estimate {
            wake,
            sleep,
            coffee,
            common,
        } => cmd_estimate(&wake, sleep, coffee, &common),

        Commands::Sweep {
            wake,
            sleep,
            common,
        } => cmd_sweep(&wake, sleep, &common),

        Commands::Model { json_schema } => cmd_model(json_schema),

        Commands::Doctor {
            model,
            config,
            json,
        } => cmd_doctor(model.as_deref(), config.as_deref(), json),
    }
}

fn cmd_estimate(wake: &str, sleep: f64, coffee: u32, common: &CommonArgs) -> Result<(), RestCliError> {
    let wake = WakeTime::parse(wake)?;
    let sleep_goal = SleepGoal::new(sleep)?;
    let caffeine = CaffeineIntake::new(coffee)?;

    let calculator = BedtimeCalculator::from_config(&resolve_config(common)?);
    let date = common.date.unwrap_or_else(|| Local::now().date_naive());
    let report = calculator.calculate_on(date, wake, &Local, sleep_goal, caffeine);

    if wants_json(common.json) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Wake up:  {wake}");
        println!("Sleep:    {sleep_goal}");
        println!("Coffee:   {caffeine}");
        println!();
        println!("{}", report.title);
        println!("{}", report.message);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(RestCliError::EstimationFailed)
    }
}

fn cmd_sweep(wake: &str, sleep: f64, common: &CommonArgs) -> Result<(), RestCliError> {
    let wake = WakeTime::parse(wake)?;
    let sleep_goal = SleepGoal::new(sleep)?;

    let calculator = BedtimeCalculator::from_config(&resolve_config(common)?);
    let date = common.date.unwrap_or_else(|| Local::now().date_naive());

    let rows: Vec<SweepRow> = (MIN_CAFFEINE_UNITS..=MAX_CAFFEINE_UNITS)
        .map(|units| {
            let caffeine = CaffeineIntake::new_unchecked(units);
            SweepRow {
                caffeine_units: units,
                report: calculator.calculate_on(date, wake, &Local, sleep_goal, caffeine),
            }
        })
        .collect();

    if wants_json(common.json) {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("Wake up {wake}, {sleep_goal} of sleep");
        println!();
        println!("  Coffee   Bedtime");
        for row in &rows {
            println!("  {:>6}   {}", row.caffeine_units, row.report.message);
        }
    }

    if rows.iter().all(|row| row.report.is_success()) {
        Ok(())
    } else {
        Err(RestCliError::EstimationFailed)
    }
}

fn cmd_model(json_schema: bool) -> Result<(), RestCliError> {
    if json_schema {
        println!("{}", get_model_json_schema());
    } else {
        println!("{}", LinearSleepModel::default().to_json()?);
    }
    Ok(())
}

fn cmd_doctor(model: Option<&Path>, config: Option<&Path>, json: bool) -> Result<(), RestCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{PRODUCER_NAME} version {REST_VERSION}"),
    });

    let mut resolved = match config {
        Some(path) => match Config::load(path) {
            Ok(config) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Loaded {}", path.display()),
                });
                config
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                Config::default()
            }
        },
        None => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "No config file given, using defaults".to_string(),
            });
            Config::default()
        }
    };

    if let Some(path) = model {
        resolved.model = ModelSource::File {
            path: path.to_path_buf(),
        };
    }

    match resolved.model.loader().load() {
        Ok(loaded) => {
            checks.push(DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Ok,
                message: format!("Loaded {} model ({:?})", loaded.name(), resolved.model),
            });

            let probe = Normalizer::normalize(
                &WakeTime::default(),
                SleepGoal::default(),
                CaffeineIntake::default(),
            );
            checks.push(match loaded.predict(&probe) {
                Ok(hours) => DoctorCheck {
                    name: "probe".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Waking at 07:00 with an 8 hour goal and 1 cup predicts {hours:.2} hours of sleep"),
                },
                Err(e) => DoctorCheck {
                    name: "probe".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            });
        }
        Err(e) => checks.push(DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: REST_VERSION.to_string(),
        checks,
    };

    if wants_json(json) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("rest Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RestCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn resolve_config(common: &CommonArgs) -> Result<Config, RestCliError> {
    let mut config = match &common.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(path) = &common.model {
        config.model = ModelSource::File { path: path.clone() };
    }
    if let Some(time_format) = &common.time_format {
        config.time_format = time_format.clone();
    }
    config.validate()?;
    Ok(config)
}

fn wants_json(flag: bool) -> bool {
    flag || !atty::is(atty::Stream::Stdout)
}

fn get_model_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "better-rest model",
        "description": "Linear model predicting actual sleep hours",
        "type": "object",
        "required": ["kind", "intercept", "wake_hours_weight", "sleep_goal_weight", "caffeine_weight"],
        "properties": {
            "kind": { "type": "string", "const": "linear" },
            "intercept": { "type": "number" },
            "wake_hours_weight": { "type": "number" },
            "sleep_goal_weight": { "type": "number" },
            "caffeine_weight": { "type": "number" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum RestCliError {
    Input(InputError),
    Config(ConfigError),
    Model(ModelError),
    Json(serde_json::Error),
    EstimationFailed,
    DoctorFailed,
}

impl From<InputError> for RestCliError {
    fn from(e: InputError) -> Self {
        RestCliError::Input(e)
    }
}

impl From<ConfigError> for RestCliError {
    fn from(e: ConfigError) -> Self {
        RestCliError::Config(e)
    }
}

impl From<ModelError> for RestCliError {
    fn from(e: ModelError) -> Self {
        RestCliError::Model(e)
    }
}

impl From<serde_json::Error> for RestCliError {
    fn from(e: serde_json::Error) -> Self {
        RestCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RestCliError> for CliError {
    fn from(e: RestCliError) -> Self {
        match e {
            RestCliError::Input(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Wake time is HH:MM, sleep 4-12 in 0.25 steps, coffee 1-20".to_string()),
            },
            RestCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the config file path, JSON syntax and time format".to_string()),
            },
            RestCliError::Model(e) => CliError {
                code: "MODEL_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            RestCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            RestCliError::EstimationFailed => CliError {
                code: "ESTIMATION_FAILED".to_string(),
                message: "Bedtime estimation failed".to_string(),
                hint: Some("Run 'rest doctor' to check the model".to_string()),
            },
            RestCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct SweepRow {
    caffeine_units: u32,
    report: BedtimeReport,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
