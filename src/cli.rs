//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::DetectorConfig;
use crate::domain::config_validation::validate_detector_config;
use crate::domain::detector::{Detection, Detector};
use crate::domain::error::SmartMoneyError;
use crate::domain::summary::{summarize, Summary};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "smartmoney", about = "Smart money manipulation detector")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run detection for one symbol and print its summary
    Analyze {
        /// Directory holding `{SYMBOL}.csv` and optional `{SYMBOL}_big_orders.csv`
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the annotated series as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Estimate big orders from the bars even if a record file exists
        #[arg(long)]
        estimate_big_orders: bool,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Validate a detector configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Log to stderr, level from `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            data_dir,
            symbol,
            config,
            output,
            json,
            estimate_big_orders,
        } => run_analyze(
            &data_dir,
            &symbol,
            config.as_ref(),
            output.as_deref(),
            json,
            estimate_big_orders,
        ),
        Command::ListSymbols { data_dir } => run_list_symbols(data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SmartMoneyError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Validated detector thresholds from `path`, or the defaults without one.
pub fn build_detector_config(path: Option<&PathBuf>) -> Result<DetectorConfig, ExitCode> {
    let Some(path) = path else {
        return Ok(DetectorConfig::default());
    };
    let adapter = load_config(path)?;
    if let Err(e) = validate_detector_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(DetectorConfig::from_port(&adapter))
}

/// Result of analyzing one symbol.
#[derive(Debug)]
pub struct Analysis {
    pub detection: Detection,
    pub summary: Summary,
}

/// Load, detect, optionally export, and summarize one symbol.
pub fn run_analysis(
    data_port: &dyn DataPort,
    detector: &Detector,
    symbol: &str,
    use_big_orders: bool,
    report: Option<(&dyn ReportPort, &Path)>,
) -> Result<Analysis, SmartMoneyError> {
    let bars = data_port.fetch_bars(symbol)?;
    if bars.is_empty() {
        return Err(SmartMoneyError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let big_orders = if use_big_orders {
        data_port.fetch_big_orders(symbol)?
    } else {
        None
    };

    let detection = detector.detect(symbol, bars, big_orders.as_deref());
    for cause in &detection.degraded {
        eprintln!("warning: {cause}");
    }

    if let Some((port, path)) = report {
        port.write(&detection.result, path)?;
        eprintln!("Annotated series written to {}", path.display());
    }

    let summary = summarize(&detection.result).map_err(|e| SmartMoneyError::Incomplete {
        symbol: symbol.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Analysis { detection, summary })
}

fn run_analyze(
    data_dir: &Path,
    symbol: &str,
    config_path: Option<&PathBuf>,
    output_path: Option<&Path>,
    json: bool,
    estimate_big_orders: bool,
) -> ExitCode {
    if let Some(path) = config_path {
        eprintln!("Loading config from {}", path.display());
    }
    let config = match build_detector_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let detector = Detector::new(config);
    let report_port = CsvReportAdapter::new();
    let report = output_path.map(|p| (&report_port as &dyn ReportPort, p));

    let analysis = match run_analysis(
        &data_port,
        &detector,
        symbol,
        !estimate_big_orders,
        report,
    ) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if json {
        match serde_json::to_string_pretty(&analysis.summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                let err = SmartMoneyError::Report {
                    reason: e.to_string(),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        }
    } else {
        println!("{}", analysis.summary);
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: PathBuf) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir);
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match build_detector_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("  volume_threshold:             {}", config.volume_threshold);
    eprintln!("  volume_window:                {}", config.volume_window);
    eprintln!(
        "  price_manipulation_window:    {}",
        config.price_manipulation_window
    );
    eprintln!("  big_order_threshold:          {}", config.big_order_threshold);
    eprintln!(
        "  concentration_threshold:      {}",
        config.concentration_threshold
    );
    eprintln!(
        "  manipulation_score_threshold: {}",
        config.manipulation_score_threshold
    );
    eprintln!("\nDetector configuration is valid.");
    ExitCode::SUCCESS
}
