//! CLI Adapter
//!
//! Command-line interface for the boosted token screener.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    execute, init_logging, load_app_config, CheckCmd, CliApp, Command, OutputFormat, RefreshCmd,
    TokenCmd, WatchCmd,
};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
