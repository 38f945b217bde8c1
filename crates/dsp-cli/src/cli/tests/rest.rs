//! Tests for status and config-path.

use super::parse;
use clap::Parser;
use crate::cli::CliCommand;
use std::path::Path;

#[test]
fn cli_parse_status() {
    match parse(&["dsp", "status"]) {
        CliCommand::Status { target_dir } => assert!(target_dir.is_none()),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_status_target_dir() {
    match parse(&["dsp", "status", "--target-dir", "test_data/x"]) {
        CliCommand::Status { target_dir } => {
            assert_eq!(target_dir.as_deref(), Some(Path::new("test_data/x")))
        }
        _ => panic!("expected Status with --target-dir"),
    }
}

#[test]
fn cli_parse_config_path() {
    match parse(&["dsp", "config-path"]) {
        CliCommand::ConfigPath { init } => assert!(!init),
        _ => panic!("expected ConfigPath"),
    }
}

#[test]
fn cli_parse_config_path_init() {
    match parse(&["dsp", "config-path", "--init"]) {
        CliCommand::ConfigPath { init } => assert!(init),
        _ => panic!("expected ConfigPath with --init"),
    }
}

#[test]
fn cli_requires_subcommand() {
    assert!(super::Cli::try_parse_from(["dsp"]).is_err());
}
