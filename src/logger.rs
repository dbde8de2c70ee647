//! Structured logging system with visual formatting.
//!
//! Every line phlux prints goes through this module so the output keeps a
//! single visual style: a vertical pipe on the left, `┣` for entries, and
//! `[LEVEL]` tags for semantic messages.
//!
//! ```text
//! ┏ phlux v0.3.0 ━━╸
//! ┃
//! ┣ Found 1 bridge(s)
//! ┃   192.168.1.20 (001788fffe6a1b2c)
//! ┣[INFO] Daytime, targeting 6500K
//! ╹
//! ```
//!
//! Output can be switched off entirely (tests, scripted use) and redirected
//! to a file with `--log <file>`, in which case ANSI colors are stripped and
//! every line carries a wall-clock timestamp.

use anyhow::Context;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// The visual shape of a single log entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Line {
    /// `┃` then `┣ message`, opening a new block
    BlockStart,
    /// `┣ message`
    Decorated,
    /// `┃   message`, detail belonging to the previous entry
    Indented,
    /// `┃`
    Pipe,
    /// `╹`
    End,
    Info,
    Warning,
    Error,
    /// `┃` then `┗[ERROR] message`, the last thing printed before exiting
    ErrorExit,
    Critical,
    Debug,
}

/// Main logging interface.
///
/// ## Logging Conventions
///
/// - `log_block_start!` opens a new conceptual block (a bridge, a config
///   summary). Related follow-up lines use `log_decorated!` or
///   `log_indented!`.
/// - `log_indented!` is for nested details such as a fixture's range.
/// - `log_pipe!` inserts vertical spacing, typically before a
///   `log_warning!`/`log_error!` that starts its own block.
/// - `log_version!` and `log_end!` frame a whole run.
/// - `log_debug!` only prints when `--debug` is active.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Start file logging to the specified path.
    ///
    /// All subsequent output is sent to a writer thread until the returned
    /// guard is dropped. Fails without touching the logger if the file
    /// cannot be opened.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .with_context(|| format!("Failed to open log file {file_path}"))?;

        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for file output; terminal output has none.
    fn timestamp_prefix() -> String {
        if LOG_CHANNEL.get().is_some() {
            format!("[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Skip until the terminating 'm'
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Render one entry without any timestamp prefix.
pub fn render(line: Line, message: &str) -> String {
    match line {
        Line::BlockStart => format!("┃\n┣ {message}\n"),
        Line::Decorated => format!("┣ {message}\n"),
        Line::Indented => format!("┃   {message}\n"),
        Line::Pipe => "┃\n".to_string(),
        Line::End => "╹\n".to_string(),
        Line::Info => format!("┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        Line::Warning => format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Line::Error => format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        Line::ErrorExit => format!("┃\n┗[\x1b[31mERROR\x1b[0m] {message}\n"),
        Line::Critical => format!("┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
        Line::Debug => format!("┣[\x1b[36mDEBUG\x1b[0m] {message}\n"),
    }
}

/// Format and route a log entry. Used by the logging macros.
pub fn emit(line: Line, args: std::fmt::Arguments<'_>) {
    if !Log::is_enabled() || (line == Line::Debug && !Log::is_debug()) {
        return;
    }

    let rendered = render(line, &args.to_string());
    let prefix = Log::timestamp_prefix();
    let text = if prefix.is_empty() {
        rendered
    } else {
        rendered
            .lines()
            .map(|l| format!("{prefix}{l}\n"))
            .collect()
    };
    write_output(&text);
}

// Routes output to the file logger when active, stdout otherwise.
pub fn write_output(text: &str) {
    let unsent = match LOG_CHANNEL.get() {
        Some(tx) => forward(tx, text),
        None => Some(text),
    };

    if let Some(text) = unsent {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// Hands text to the writer thread; gives it back once the writer has stopped.
fn forward<'a>(tx: &Sender<LogMessage>, text: &'a str) -> Option<&'a str> {
    tx.send(LogMessage::Formatted(strip_ansi_codes(text)))
        .err()
        .map(|_| text)
}

// # Logging Macros

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Decorated, format_args!($($arg)*))
    };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Indented, format_args!($($arg)*))
    };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::Line::Pipe, format_args!(""))
    };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::BlockStart, format_args!($($arg)*))
    };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        if $crate::logger::Log::is_enabled() {
            $crate::logger::write_output(concat!("┏ phlux v", env!("CARGO_PKG_VERSION"), " ━━╸\n"));
        }
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::Line::End, format_args!(""))
    };
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Info, format_args!($($arg)*))
    };
}

/// Log a warning message with yellow-colored level tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Warning, format_args!($($arg)*))
    };
}

/// Log an error message with red-colored level tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Error, format_args!($($arg)*))
    };
}

/// Log an error that ends the run, closing the pipe with a corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::ErrorExit, format_args!($($arg)*))
    };
}

/// Log a critical message.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Critical, format_args!($($arg)*))
    };
}

/// Log a debug message, shown only with `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Debug, format_args!($($arg)*))
    };
}
