//! CLI integration tests.
//!
//! Tests cover:
//! - Detector config loading and validation from INI files on disk
//! - Argument parsing for every subcommand
//! - `analyze` end to end over a CSV data directory, with CSV export
//! - `list-symbols` and `validate` exit codes

mod common;

use clap::Parser;
use common::*;
use smartmoney::cli::{self, Cli, Command};
use smartmoney::domain::config::DetectorConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_bars_csv(dir: &Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut writer = csv::Writer::from_path(dir.join(format!("{symbol}.csv"))).unwrap();
    for bar in bars {
        writer.serialize(bar).unwrap();
    }
    writer.flush().unwrap();
}

/// ExitCode has no PartialEq; compare debug renderings instead.
fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

const VALID_INI: &str = r#"
[detector]
volume_threshold = 2.5
volume_window = 30
price_manipulation_window = 15
big_order_threshold = 250000
concentration_threshold = 0.5
manipulation_score_threshold = 60
"#;

mod config_loading {
    use super::*;

    #[test]
    fn no_config_file_uses_defaults() {
        assert_eq!(
            cli::build_detector_config(None).unwrap(),
            DetectorConfig::default()
        );
    }

    #[test]
    fn config_file_overrides_every_key() {
        let file = write_temp_ini(VALID_INI);
        let config = cli::build_detector_config(Some(&PathBuf::from(file.path()))).unwrap();
        assert_eq!(config.volume_threshold, 2.5);
        assert_eq!(config.volume_window, 30);
        assert_eq!(config.price_manipulation_window, 15);
        assert_eq!(config.big_order_threshold, 250_000.0);
        assert_eq!(config.concentration_threshold, 0.5);
        assert_eq!(config.manipulation_score_threshold, 60.0);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let file = write_temp_ini("[detector]\nvolume_threshold = 4\n");
        let config = cli::build_detector_config(Some(&PathBuf::from(file.path()))).unwrap();
        assert_eq!(config.volume_threshold, 4.0);
        assert_eq!(config.volume_window, 20);
        assert_eq!(config.manipulation_score_threshold, 70.0);
    }

    #[test]
    fn invalid_value_is_rejected() {
        let file = write_temp_ini("[detector]\nconcentration_threshold = 1.5\n");
        let err = cli::build_detector_config(Some(&PathBuf::from(file.path()))).unwrap_err();
        assert!(same_code(err, ExitCode::from(2)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let path = PathBuf::from("/nonexistent/path/detector.ini");
        let err = cli::build_detector_config(Some(&path)).unwrap_err();
        assert!(same_code(err, ExitCode::from(2)));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn analyze_with_all_flags() {
        let cli = Cli::try_parse_from([
            "smartmoney",
            "analyze",
            "--data-dir",
            "data",
            "--symbol",
            "BHP",
            "--config",
            "detector.ini",
            "--output",
            "out.csv",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                data_dir,
                symbol,
                config,
                output,
                json,
                estimate_big_orders,
            } => {
                assert_eq!(data_dir, PathBuf::from("data"));
                assert_eq!(symbol, "BHP");
                assert_eq!(config, Some(PathBuf::from("detector.ini")));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(json);
                assert!(!estimate_big_orders);
            }
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_symbol() {
        assert!(Cli::try_parse_from(["smartmoney", "analyze", "-d", "data"]).is_err());
    }

    #[test]
    fn list_symbols_and_validate_parse() {
        let cli = Cli::try_parse_from(["smartmoney", "list-symbols", "-d", "data"]).unwrap();
        assert!(matches!(cli.command, Command::ListSymbols { .. }));
        let cli = Cli::try_parse_from(["smartmoney", "validate", "-c", "d.ini"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));
    }
}

mod analyze_command {
    use super::*;

    fn analyze(data_dir: &Path, symbol: &str, output: Option<PathBuf>, json: bool) -> ExitCode {
        cli::run(Cli {
            command: Command::Analyze {
                data_dir: data_dir.to_path_buf(),
                symbol: symbol.to_string(),
                config: None,
                output,
                json,
                estimate_big_orders: false,
            },
        })
    }

    #[test]
    fn writes_annotated_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BHP", &generate_bars(80, 30.0));
        let output = dir.path().join("BHP_annotated.csv");

        let code = analyze(dir.path(), "BHP", Some(output.clone()), false);
        assert!(same_code(code, ExitCode::SUCCESS));

        let mut rdr = csv::Reader::from_path(&output).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == "manipulation_score"));
        assert!(headers.iter().any(|h| h == "big_order_net_inflow_5d"));
        assert_eq!(rdr.records().count(), 80);
    }

    #[test]
    fn json_summary_succeeds() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "CBA", &generate_bars(40, 60.0));
        assert!(same_code(
            analyze(dir.path(), "CBA", None, true),
            ExitCode::SUCCESS
        ));
    }

    #[test]
    fn missing_symbol_file_is_a_data_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(same_code(
            analyze(dir.path(), "XYZ", None, false),
            ExitCode::from(3)
        ));
    }

    #[test]
    fn header_only_file_is_no_data() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("EMPTY.csv"),
            "date,open,high,low,close,volume\n",
        )
        .unwrap();
        assert!(same_code(
            analyze(dir.path(), "EMPTY", None, false),
            ExitCode::from(5)
        ));
    }
}

mod other_commands {
    use super::*;

    #[test]
    fn list_symbols_succeeds_on_data_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BHP", &generate_bars(5, 10.0));
        let code = cli::run(Cli {
            command: Command::ListSymbols {
                data_dir: dir.path().to_path_buf(),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn list_symbols_missing_dir_fails() {
        let code = cli::run(Cli {
            command: Command::ListSymbols {
                data_dir: PathBuf::from("/nonexistent/data"),
            },
        });
        assert!(same_code(code, ExitCode::from(3)));
    }

    #[test]
    fn validate_accepts_valid_and_rejects_invalid() {
        let valid = write_temp_ini(VALID_INI);
        let code = cli::run(Cli {
            command: Command::Validate {
                config: PathBuf::from(valid.path()),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));

        let invalid = write_temp_ini("[detector]\nvolume_window = 1\n");
        let code = cli::run(Cli {
            command: Command::Validate {
                config: PathBuf::from(invalid.path()),
            },
        });
        assert!(same_code(code, ExitCode::from(2)));
    }
}
