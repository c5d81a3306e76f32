//! CLI module for autodial - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for queue generation,
//! dialing sessions, DNC and settings management, stats and export.

pub mod commands;
pub mod session;

pub use commands::Cli;
