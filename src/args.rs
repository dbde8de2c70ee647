//! Command-line argument parsing.
//!
//! Flags may be given as `--name value`, `--name=value`, or with a single
//! dash (`-latitude 40.7`). Unknown or malformed arguments produce
//! [`CliAction::ShowHelpDueToError`].

use crate::config::CliOverrides;

/// What the process was asked to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Update lights once, or periodically with `--forever`
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        overrides: CliOverrides,
        forever: bool,
        log_file: Option<String>,
    },
    /// Show the current solar phase and target without touching bridges
    Status {
        debug_enabled: bool,
        config_dir: Option<String>,
        overrides: CliOverrides,
    },
    /// Remove the stored credential for a bridge
    Forget {
        debug_enabled: bool,
        config_dir: Option<String>,
        gateway_id: String,
    },
    ShowHelp,
    ShowVersion,
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Run,
    Status,
    Forget,
    Help,
}

/// Split `--name=value` and normalise single-dash long flags.
fn split_flag(arg: &str) -> (String, Option<String>) {
    let normalized = if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 2 {
        format!("-{arg}")
    } else {
        arg.to_string()
    };

    match normalized.split_once('=') {
        Some((name, value)) if name.starts_with("--") => (name.to_string(), Some(value.to_string())),
        _ => (normalized, None),
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Option<T> {
    match value {
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                log_warning!("Invalid value for {flag}: {raw}");
                None
            }
        },
        None => {
            log_warning!("Missing value for {flag}");
            None
        }
    }
}

impl ParsedArgs {
    /// Parse the full argument list, including the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut forever = false;
        let mut error = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut overrides = CliOverrides::default();
        let mut command: Option<Command> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut args = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string());

        while let Some(arg) = args.next() {
            let (flag, inline) = split_flag(&arg);
            let mut value = || inline.clone().or_else(|| args.next());

            match flag.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--forever" => forever = true,
                "--config" | "-c" => match value() {
                    Some(dir) => config_dir = Some(dir),
                    None => {
                        log_warning!("Missing directory for {flag}");
                        error = true;
                    }
                },
                "--log" => match value() {
                    Some(path) => log_file = Some(path),
                    None => {
                        log_warning!("Missing file for --log");
                        error = true;
                    }
                },
                "--latitude" | "--lat" => {
                    overrides.latitude = parse_value(&flag, value());
                    error |= overrides.latitude.is_none();
                }
                "--longitude" | "--lon" => {
                    overrides.longitude = parse_value(&flag, value());
                    error |= overrides.longitude.is_none();
                }
                "--interval" => {
                    overrides.interval = parse_value(&flag, value());
                    error |= overrides.interval.is_none();
                }
                "--transition-time" | "--transitionTime" => {
                    overrides.transition_time = parse_value(&flag, value());
                    error |= overrides.transition_time.is_none();
                }
                other if other.starts_with('-') => {
                    log_warning!("Unknown argument: {other}");
                    error = true;
                }
                _ if command.is_none() => {
                    command = match arg.as_str() {
                        "run" => Some(Command::Run),
                        "status" | "s" => Some(Command::Status),
                        "forget" | "f" => Some(Command::Forget),
                        "help" | "h" => Some(Command::Help),
                        other => {
                            log_warning!("Unknown command: {other}");
                            error = true;
                            None
                        }
                    };
                }
                _ => positional.push(arg),
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help || command == Some(Command::Help) {
            CliAction::ShowHelp
        } else if error {
            CliAction::ShowHelpDueToError
        } else {
            match command.unwrap_or(Command::Run) {
                Command::Forget => match positional.as_slice() {
                    [gateway_id] => CliAction::Forget {
                        debug_enabled,
                        config_dir,
                        gateway_id: gateway_id.clone(),
                    },
                    _ => {
                        log_warning!("Usage: phlux forget <bridge-id>");
                        CliAction::ShowHelpDueToError
                    }
                },
                _ if !positional.is_empty() => {
                    log_warning!("Unexpected argument: {}", positional.join(" "));
                    CliAction::ShowHelpDueToError
                }
                Command::Status => CliAction::Status {
                    debug_enabled,
                    config_dir,
                    overrides,
                },
                Command::Run | Command::Help => CliAction::Run {
                    debug_enabled,
                    config_dir,
                    overrides,
                    forever,
                    log_file,
                },
            }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("phlux [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("    --latitude <deg>         Override configured latitude");
    log_indented!("    --longitude <deg>        Override configured longitude");
    log_indented!("    --interval <secs>        Seconds between updates with --forever");
    log_indented!("    --transition-time <ds>   Fade duration in deciseconds");
    log_indented!("    --forever                Keep updating until interrupted");
    log_indented!("    --log <file>             Write output to a file instead of stdout");
    log_indented!("-c, --config <dir>           Use custom configuration directory");
    log_indented!("-d, --debug                  Enable detailed debug output");
    log_indented!("-h, --help                   Print help information");
    log_indented!("-V, --version                Print version information");
    log_block_start!("Commands:");
    log_indented!("run                          Update lights (default)");
    log_indented!("status, s                    Show sunrise, sunset and the current target");
    log_indented!("forget, f <bridge-id>        Remove the stored credential for a bridge");
    log_indented!("help, h                      Print help information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_action() -> CliAction {
        CliAction::Run {
            debug_enabled: false,
            config_dir: None,
            overrides: CliOverrides::default(),
            forever: false,
            log_file: None,
        }
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["phlux"]);
        assert_eq!(parsed.action, run_action());
    }

    #[test]
    fn test_parse_run_flags() {
        let parsed = ParsedArgs::parse(vec![
            "phlux",
            "--latitude",
            "40.7128",
            "--longitude=-74.006",
            "--interval",
            "60",
            "--transition-time",
            "20",
            "--forever",
            "-d",
            "--log",
            "/tmp/phlux.log",
        ]);

        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: None,
                overrides: CliOverrides {
                    latitude: Some(40.7128),
                    longitude: Some(-74.006),
                    interval: Some(60),
                    transition_time: Some(20),
                },
                forever: true,
                log_file: Some("/tmp/phlux.log".to_string()),
            }
        );
    }

    #[test]
    fn test_negative_value_as_separate_argument() {
        let parsed = ParsedArgs::parse(vec!["phlux", "--longitude", "-71.1675"]);
        let CliAction::Run { overrides, .. } = parsed.action else {
            panic!("expected run action");
        };
        assert_eq!(overrides.longitude, Some(-71.1675));
    }

    #[test]
    fn test_single_dash_long_flags() {
        let parsed = ParsedArgs::parse(vec!["phlux", "-latitude", "51.5", "-transitionTime", "4", "-forever"]);
        let CliAction::Run {
            overrides, forever, ..
        } = parsed.action
        else {
            panic!("expected run action");
        };
        assert_eq!(overrides.latitude, Some(51.5));
        assert_eq!(overrides.transition_time, Some(4));
        assert!(forever);
    }

    #[test]
    fn test_config_dir() {
        let parsed = ParsedArgs::parse(vec!["phlux", "-c", "/etc/phlux", "status"]);
        assert_eq!(
            parsed.action,
            CliAction::Status {
                debug_enabled: false,
                config_dir: Some("/etc/phlux".to_string()),
                overrides: CliOverrides::default(),
            }
        );
    }

    #[test]
    fn test_forget_command() {
        let parsed = ParsedArgs::parse(vec!["phlux", "forget", "001788FFFE6A1B2C"]);
        assert_eq!(
            parsed.action,
            CliAction::Forget {
                debug_enabled: false,
                config_dir: None,
                gateway_id: "001788FFFE6A1B2C".to_string(),
            }
        );

        let missing = ParsedArgs::parse(vec!["phlux", "forget"]);
        assert_eq!(missing.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(ParsedArgs::parse(vec!["phlux", "--help"]).action, CliAction::ShowHelp);
        assert_eq!(ParsedArgs::parse(vec!["phlux", "help"]).action, CliAction::ShowHelp);
        assert_eq!(ParsedArgs::parse(vec!["phlux", "-V"]).action, CliAction::ShowVersion);
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["phlux", "--help", "--version", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_invalid_values() {
        for args in [
            vec!["phlux", "--latitude", "north"],
            vec!["phlux", "--interval"],
            vec!["phlux", "--transition-time", "-4"],
            vec!["phlux", "--bogus"],
            vec!["phlux", "dance"],
            vec!["phlux", "status", "extra"],
        ] {
            assert_eq!(
                ParsedArgs::parse(args.clone()).action,
                CliAction::ShowHelpDueToError,
                "{args:?}"
            );
        }
    }
}
