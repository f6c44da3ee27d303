use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use glparity_harness::ParityError;
use glparity_harness::config::{CaptureInputs, DEFAULT_CATALOG_PATH, HarnessConfig};
use glparity_harness::diff::DEFAULT_TIMESTAMP_TOLERANCE_SECS;
use glparity_harness::runner::{compare_capture, load_capture, refresh_capture, write_json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compare,
    Refresh,
    Events,
}

#[derive(Debug, Clone)]
struct Config {
    command: Command,
    harness: HarnessConfig,
    scenario: Option<String>,
    inputs: CaptureInputs,
    summary_json: Option<PathBuf>,
}

impl Config {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::parse_from(&args)
    }

    #[allow(clippy::too_many_lines)]
    fn parse_from(args: &[String]) -> Result<Self, String> {
        let workspace_root = env::current_dir()
            .map_err(|error| format!("workspace_root_unavailable: {error}"))?;
        let mut harness = HarnessConfig::new(workspace_root);
        let mut command: Option<Command> = None;
        let mut scenario: Option<String> = None;
        let mut console_log: Option<PathBuf> = None;
        let mut metadata: Option<PathBuf> = None;
        let mut summary_json: Option<PathBuf> = None;

        let mut index = 0_usize;
        while index < args.len() {
            match args[index].as_str() {
                "--catalog" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --catalog".to_owned())?;
                    harness.catalog_path = PathBuf::from(value);
                }
                "--workspace-root" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --workspace-root".to_owned())?;
                    harness.workspace_root = PathBuf::from(value);
                }
                "--console-log" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --console-log".to_owned())?;
                    console_log = Some(PathBuf::from(value));
                }
                "--metadata" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --metadata".to_owned())?;
                    metadata = Some(PathBuf::from(value));
                }
                "--timestamp-tolerance" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --timestamp-tolerance".to_owned())?;
                    let seconds = value.parse::<f64>().map_err(|error| {
                        format!("invalid --timestamp-tolerance value={value}: {error}")
                    })?;
                    if !seconds.is_finite() || seconds < 0.0 {
                        return Err(format!(
                            "invalid --timestamp-tolerance value={value}: must be a non-negative number"
                        ));
                    }
                    harness.timestamp_tolerance_secs = seconds;
                }
                "--summary-json" => {
                    index += 1;
                    let value = args
                        .get(index)
                        .ok_or_else(|| "missing value for --summary-json".to_owned())?;
                    summary_json = Some(PathBuf::from(value));
                }
                "--verbose" | "-v" => harness.verbose = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown_argument: {other}"));
                }
                positional => {
                    if command.is_none() {
                        command = Some(match positional {
                            "compare" => Command::Compare,
                            "refresh" => Command::Refresh,
                            "events" => Command::Events,
                            other => return Err(format!("unknown_command: {other}")),
                        });
                    } else if scenario.is_none() {
                        scenario = Some(positional.to_owned());
                    } else {
                        return Err(format!("unexpected_argument: {positional}"));
                    }
                }
            }
            index += 1;
        }

        let command = command.ok_or_else(|| "missing command (compare|refresh|events)".to_owned())?;
        match command {
            Command::Compare | Command::Refresh if scenario.is_none() => {
                return Err("missing scenario id".to_owned());
            }
            Command::Events if scenario.is_some() => {
                return Err("events does not take a scenario id".to_owned());
            }
            _ => {}
        }
        if summary_json.is_some() && command != Command::Compare {
            return Err("--summary-json is only valid with compare".to_owned());
        }
        let console_log = console_log.ok_or_else(|| "missing --console-log".to_owned())?;
        let metadata = metadata.ok_or_else(|| "missing --metadata".to_owned())?;

        Ok(Self {
            command,
            harness,
            scenario,
            inputs: CaptureInputs::new(console_log, metadata),
            summary_json,
        })
    }

    fn scenario(&self) -> &str {
        self.scenario.as_deref().unwrap_or_default()
    }
}

fn print_help() {
    println!(
        "\
engine_log_harness: engine console log parity oracle

USAGE:
  engine_log_harness [--catalog PATH] compare <SCENARIO> --console-log PATH --metadata PATH
                     [--timestamp-tolerance SECS] [--verbose] [--summary-json PATH]
  engine_log_harness [--catalog PATH] refresh <SCENARIO> --console-log PATH --metadata PATH [--verbose]
  engine_log_harness events --console-log PATH --metadata PATH

OPTIONS:
  --catalog <PATH>                    Scenario catalogue (default: {DEFAULT_CATALOG_PATH})
  --workspace-root <PATH>             Root for relative paths (default: current directory)
  --console-log <PATH>                Captured console output
  --metadata <PATH>                   Run metadata JSON
  --timestamp-tolerance <SECS>        Allowed timestamp drift (default: {DEFAULT_TIMESTAMP_TOLERANCE_SECS})
  --summary-json <PATH>               Write the comparison summary as JSON
  -v, --verbose                       Print the report even when the comparison passes
  -h, --help                          Show help

EXIT STATUS:
  0 match (or refresh written), 1 mismatch, 2 usage or configuration error
"
    );
}

#[derive(Debug)]
enum RunError {
    Usage(String),
    Parity(ParityError),
}

impl From<ParityError> for RunError {
    fn from(error: ParityError) -> Self {
        Self::Parity(error)
    }
}

fn run() -> Result<bool, RunError> {
    let config = Config::parse().map_err(RunError::Usage)?;
    match config.command {
        Command::Compare => {
            let outcome = compare_capture(&config.harness, config.scenario(), &config.inputs)?;
            if let Some(path) = &config.summary_json {
                let path = config.harness.resolve(path);
                write_json(&path, &outcome.summary)?;
                tracing::info!(path = %path.display(), "summary written");
            }
            if config.harness.verbose {
                println!("{}", outcome.report);
            } else if !outcome.ok() {
                eprintln!("{}", outcome.report);
            }
            Ok(outcome.ok())
        }
        Command::Refresh => {
            let summary = refresh_capture(&config.harness, config.scenario(), &config.inputs)?;
            if config.harness.verbose {
                println!(
                    "Scenario '{}' refreshed with {} events.",
                    summary.scenario, summary.events
                );
            }
            Ok(true)
        }
        Command::Events => {
            let capture = load_capture(&config.harness, &config.inputs)?;
            for event in &capture.events {
                let line = serde_json::to_string(event)
                    .map_err(|error| ParityError::internal(format!("event_serialize_failed: {error}")))?;
                println!("{line}");
            }
            Ok(true)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(RunError::Usage(error)) => {
            eprintln!("ERROR engine_log_harness usage: {error}");
            eprintln!("  (run with --help for usage)");
            ExitCode::from(ParityError::EXIT_CODE)
        }
        Err(RunError::Parity(error)) => {
            eprintln!("ERROR engine_log_harness failed: {error}");
            if let Some(hint) = error.suggestion() {
                eprintln!("  hint: {hint}");
            }
            ExitCode::from(ParityError::EXIT_CODE)
        }
    }
}
