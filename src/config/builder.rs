//! Default configuration file creation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Write a commented default `phlux.toml` to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

pub fn default_config_content() -> String {
    let content = ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "latitude",
            &format!("{DEFAULT_LATITUDE:.6}"),
            "Latitude in degrees (-90 to 90)",
        )
        .add_setting(
            "longitude",
            &format!("{DEFAULT_LONGITUDE:.6}"),
            "Longitude in degrees (-180 to 180)",
        )
        .add_section("Schedule")
        .add_setting(
            "interval",
            &DEFAULT_INTERVAL.to_string(),
            &format!(
                "Seconds between updates with --forever ({MINIMUM_INTERVAL}-{MAXIMUM_INTERVAL})"
            ),
        )
        .add_comment(&format!(
            "transition_time = 4  # Fade duration in deciseconds (0-{MAXIMUM_TRANSITION_TIME})"
        ))
        .add_section("Bridges")
        .add_comment("bridges = [\"192.168.1.20\"]  # Skip discovery and use these hosts")
        .build();

    format!("{content}\n")
}

struct ConfigBuilder {
    entries: Vec<EntryType>,
}

enum EntryType {
    Section(String),
    Setting { line: String, comment: String },
    Comment(String),
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(EntryType::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A commented-out optional setting.
    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(EntryType::Comment(format!("# {text}")));
        self
    }

    fn build(self) -> String {
        // Align trailing comments one space past the longest setting
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                EntryType::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                EntryType::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                EntryType::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
                EntryType::Comment(text) => result.push(text),
            }
        }

        result.join("\n")
    }
}
