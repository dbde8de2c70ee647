//! Gateway credential storage.
//!
//! Credentials are bridge "usernames": opaque tokens issued once per bridge
//! after the link button has been pressed. They are kept in
//! `credentials.toml` next to the main configuration file:
//!
//! ```toml
//! [[bridges]]
//! id = "001788fffe6a1b2c"
//! token = "2a9c0b0d7e1f..."
//! ```
//!
//! The file is loaded wholesale and rewritten wholesale on every change.
//! In memory the table is a map keyed by gateway id, so each bridge has at
//! most one credential and a later write replaces an earlier one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};


/// Stable identifier of a gateway, normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GatewayId(String);

impl GatewayId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GatewayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token granting access to a gateway.
///
/// `Debug` and `Display` only show a short prefix so tokens never end up in
/// logs verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The full token, for use on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}…")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({})", self.redacted())
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// One persisted `{id, token}` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    bridges: Vec<CredentialRecord>,
}

/// Lookup and persistence of credentials per gateway.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    fn lookup(&self, id: &GatewayId) -> Option<Credential>;

    /// Record `credential` for `id`, replacing any previous one, and persist
    /// the change.
    fn store(&mut self, id: &GatewayId, credential: &Credential) -> Result<()>;
}

/// In-memory credential table keyed by gateway id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialTable {
    entries: BTreeMap<GatewayId, Credential>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &GatewayId) -> Option<&Credential> {
        self.entries.get(id)
    }

    /// Insert or replace, returning the previous credential if any.
    pub fn insert(&mut self, id: GatewayId, credential: Credential) -> Option<Credential> {
        self.entries.insert(id, credential)
    }

    pub fn remove(&mut self, id: &GatewayId) -> Option<Credential> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &GatewayId> {
        self.entries.keys()
    }

    pub fn records(&self) -> Vec<CredentialRecord> {
        self.entries
            .iter()
            .map(|(id, credential)| CredentialRecord {
                id: id.as_str().to_string(),
                token: credential.expose().to_string(),
            })
            .collect()
    }

    /// Build a table from records; a repeated id keeps its last token.
    ///
    /// Ids are normalised through [`GatewayId::new`], so an id stored in
    /// uppercase is written back lowercased on the next rewrite.
    pub fn from_records(records: impl IntoIterator<Item = CredentialRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(GatewayId::new(&record.id), Credential::new(record.token));
        }
        table
    }

    pub fn to_toml(&self) -> Result<String> {
        let file = CredentialFile {
            bridges: self.records(),
        };
        toml::to_string(&file).context("Failed to serialize credential table")
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CredentialFile =
            toml::from_str(content).context("Failed to parse credential table")?;
        Ok(Self::from_records(file.bridges))
    }
}

impl CredentialStore for CredentialTable {
    fn lookup(&self, id: &GatewayId) -> Option<Credential> {
        self.get(id).cloned()
    }

    fn store(&mut self, id: &GatewayId, credential: &Credential) -> Result<()> {
        self.insert(id.clone(), credential.clone());
        Ok(())
    }
}

/// Credential table backed by a TOML file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    table: CredentialTable,
}

impl FileCredentialStore {
    /// Load the table from `path`. A missing file is an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
            CredentialTable::from_toml(&content)
                .with_context(|| format!("Invalid credentials file {}", path.display()))?
        } else {
            CredentialTable::new()
        };

        Ok(Self { path, table })
    }

    pub fn table(&self) -> &CredentialTable {
        &self.table
    }

    /// Remove the credential for `id`. Returns whether one was stored.
    pub fn forget(&mut self, id: &GatewayId) -> Result<bool> {
        let mut next = self.table.clone();
        if next.remove(id).is_none() {
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    /// Write `next` to disk, then adopt it as the in-memory table. On error
    /// the current table is left untouched.
    fn commit(&mut self, next: CredentialTable) -> Result<()> {
        self.write(&next)?;
        self.table = next;
        Ok(())
    }

    /// Rewrite the whole file atomically.
    ///
    /// The table is written to a temporary file in the same directory (which
    /// `tempfile` creates with mode 0600) and then renamed over the target.
    fn write(&self, table: &CredentialTable) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let content = table.to_toml()?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(content.as_bytes())
            .context("Failed to write credential table")?;
        temp.flush().context("Failed to flush credential table")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write credentials to {}", self.path.display()))?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn lookup(&self, id: &GatewayId) -> Option<Credential> {
        self.table.lookup(id)
    }

    fn store(&mut self, id: &GatewayId, credential: &Credential) -> Result<()> {
        let mut next = self.table.clone();
        next.insert(id.clone(), credential.clone());
        self.commit(next)
    }
}
