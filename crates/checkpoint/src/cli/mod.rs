//! Command-line interface for the checkpoint registry.
//!
//! This module provides the CLI structure and command handlers for the
//! `chkpt` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_cargo_line, CheckCommand, ConfigCommand, DirectionArg, LogCommand, RecordCommand,
    RoleArg, WantedCommand, WatchCommand,
};

/// chkpt - Border-checkpoint crossing registry
///
/// Records crossings of persons and vehicles, links passengers to drivers,
/// and screens every identity against the wanted and watch lists.
#[derive(Debug, Parser)]
#[command(name = "chkpt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a crossing
    Record(RecordCommand),

    /// Screen an identity against both lists without recording
    Check(CheckCommand),

    /// Show the recent crossing journal
    Log(LogCommand),

    /// Administer the wanted list
    #[command(subcommand)]
    Wanted(WantedCommand),

    /// Administer the watch list
    #[command(subcommand)]
    Watch(WatchCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "chkpt");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record() {
        let args = vec![
            "chkpt",
            "record",
            "--last-name",
            "Петров",
            "--first-name",
            "Иван",
            "--dob",
            "01.01.1990",
            "--document",
            "AB123456",
            "--destination",
            "ГОРОД",
            "--cargo",
            "ЯБЛОКИ:120:КГ",
            "--yes",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Record(record) = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(record.last_name, "Петров");
        assert_eq!(record.direction, DirectionArg::In);
        assert_eq!(record.role, RoleArg::Pedestrian);
        assert_eq!(record.cargo.len(), 1);
        assert!(record.yes);
    }

    #[test]
    fn test_parse_check() {
        let args = vec![
            "chkpt",
            "check",
            "--last-name",
            "Петров",
            "--first-name",
            "Иван",
            "--dob",
            "01.01.1990",
            "--json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Check(c) if c.json));
    }

    #[test]
    fn test_parse_log_with_filters() {
        let args = vec!["chkpt", "log", "--limit", "5", "--last-name", "ПЕТ"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Log(log) = cli.command else {
            panic!("expected log command");
        };
        assert_eq!(log.limit, 5);
        assert_eq!(log.last_name.as_deref(), Some("ПЕТ"));
    }

    #[test]
    fn test_parse_wanted_add() {
        let args = vec![
            "chkpt",
            "wanted",
            "add",
            "--last-name",
            "СИДОРОВ",
            "--first-name",
            "ПАВЕЛ",
            "--dob",
            "05.05.1985",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Wanted(WantedCommand::Add { .. })
        ));
    }

    #[test]
    fn test_parse_watch_remove() {
        let args = vec!["chkpt", "watch", "remove", "3"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Watch(WatchCommand::Remove { id: 3 })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["chkpt", "-c", "/custom/config.toml", "log"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_verbosity_flags() {
        let quiet = Cli::try_parse_from(vec!["chkpt", "-q", "log"]).unwrap();
        assert_eq!(quiet.verbosity(), crate::logging::Verbosity::Quiet);

        let normal = Cli::try_parse_from(vec!["chkpt", "log"]).unwrap();
        assert_eq!(normal.verbosity(), crate::logging::Verbosity::Normal);

        let verbose = Cli::try_parse_from(vec!["chkpt", "-v", "log"]).unwrap();
        assert_eq!(verbose.verbosity(), crate::logging::Verbosity::Verbose);

        let trace = Cli::try_parse_from(vec!["chkpt", "-vv", "log"]).unwrap();
        assert_eq!(trace.verbosity(), crate::logging::Verbosity::Trace);
    }
}
