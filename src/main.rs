//! Main application entry point.
//!
//! Parses arguments, handles help/version and one-shot commands, and hands
//! normal runs to [`Phlux`].

use anyhow::Result;
use std::path::PathBuf;

use phlux::args::{self, CliAction, ParsedArgs};
use phlux::commands;
use phlux::config::ConfigPaths;
use phlux::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use phlux::logger::{Log, LoggerGuard};
use phlux::{Phlux, log_end, log_error_exit, log_indented, log_pipe};

fn main() {
    let parsed = ParsedArgs::from_env();
    // Outlives dispatch so a failing run's error still reaches the log file
    let mut log_guard: Option<LoggerGuard> = None;

    let code = match dispatch(parsed.action, &mut log_guard) {
        Ok(code) => code,
        Err(e) => {
            log_pipe!();
            log_error_exit!("{e}");
            for cause in e.chain().skip(1) {
                log_indented!("Caused by: {cause}");
            }
            log_end!();
            EXIT_FAILURE
        }
    };

    // process::exit skips destructors; flush the log file first
    drop(log_guard);
    std::process::exit(code);
}

fn resolve_paths(config_dir: Option<String>) -> Result<ConfigPaths> {
    ConfigPaths::resolve(config_dir.map(PathBuf::from))
}

fn dispatch(action: CliAction, log_guard: &mut Option<LoggerGuard>) -> Result<i32> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(EXIT_FAILURE)
        }
        CliAction::Status {
            debug_enabled,
            config_dir,
            overrides,
        } => {
            Log::set_debug(debug_enabled);
            commands::status::handle_status_command(&resolve_paths(config_dir)?, &overrides)?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Forget {
            debug_enabled,
            config_dir,
            gateway_id,
        } => {
            Log::set_debug(debug_enabled);
            commands::forget::handle_forget_command(&resolve_paths(config_dir)?, &gateway_id)?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            overrides,
            forever,
            log_file,
        } => {
            Log::set_debug(debug_enabled);
            if let Some(path) = log_file {
                *log_guard = Some(Log::start_file_logging(path)?);
            }

            Phlux::new(resolve_paths(config_dir)?)
                .with_overrides(overrides)
                .forever(forever)
                .run()?;
            Ok(EXIT_SUCCESS)
        }
    }
}
