//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DashboardCommand, DeleteCommand, ExportCommand, FacingArg, GroupArg,
    ListCommand, MaritalStatusArg, OutputFormat, RegisterCommand, ShowCommand,
};

use crate::logging::Verbosity;

/// rollcall - Register members with their photo and signature
///
/// Records biographical data, a photo (from a file or a camera frame) and a
/// traced signature into a local database.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
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
    /// Register a new member
    Register(Box<RegisterCommand>),

    /// List registered members
    List(ListCommand),

    /// Show one member
    Show(ShowCommand),

    /// Delete a member
    Delete(DeleteCommand),

    /// Write a member's photo or signature to a file
    Export(ExportCommand),

    /// Show registration totals per group
    Dashboard(DashboardCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "rollcall");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["rollcall", "-q", "dashboard"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["rollcall", "dashboard"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["rollcall", "-v", "dashboard"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["rollcall", "-vv", "dashboard"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_register() {
        let cli = parse(&[
            "rollcall",
            "register",
            "--name",
            "Ana Ruiz",
            "--group",
            "fju",
            "--marital-status",
            "union-libre",
            "--birth-date",
            "1990-06-01",
            "--camera-frame",
            "frame.png",
            "--facing",
            "back",
            "--signature",
            "strokes.json",
        ]);
        let Command::Register(cmd) = cli.command else {
            panic!("expected register");
        };
        assert_eq!(cmd.name, "Ana Ruiz");
        assert_eq!(cmd.group, Some(GroupArg::Fju));
        assert_eq!(cmd.marital_status, Some(MaritalStatusArg::UnionLibre));
        assert_eq!(cmd.facing, Some(FacingArg::Back));
        assert_eq!(cmd.camera_frame, Some(PathBuf::from("frame.png")));
        assert_eq!(cmd.signature, Some(PathBuf::from("strokes.json")));
    }

    #[test]
    fn test_register_rejects_two_photo_sources() {
        let result = Cli::try_parse_from([
            "rollcall",
            "register",
            "--name",
            "Ana",
            "--photo",
            "a.jpg",
            "--camera-frame",
            "b.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_register_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "rollcall",
            "register",
            "--name",
            "Ana",
            "--birth-date",
            "01/06/1990",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list() {
        let cli = parse(&["rollcall", "list", "--search", "ana", "-g", "ebi", "-f", "json"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(cmd.search.as_deref(), Some("ana"));
        assert_eq!(cmd.group, Some(GroupArg::Ebi));
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_export_requires_one_image() {
        assert!(Cli::try_parse_from(["rollcall", "export", "3", "--out", "x.png"]).is_err());
        assert!(Cli::try_parse_from([
            "rollcall",
            "export",
            "3",
            "--photo",
            "--signature",
            "--out",
            "x.png"
        ])
        .is_err());

        let cli = parse(&["rollcall", "export", "3", "--signature", "--out", "sig.png"]);
        assert!(matches!(
            cli.command,
            Command::Export(ExportCommand {
                id: 3,
                signature: true,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_delete() {
        let cli = parse(&["rollcall", "delete", "7", "--yes"]);
        assert!(matches!(cli.command, Command::Delete(DeleteCommand { id: 7, yes: true })));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["rollcall", "-c", "/custom/config.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
