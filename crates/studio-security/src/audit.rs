//! ---
//! studio_section: "06-security-access-control"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Access-control lattice, capability rules and audit trail."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, IntoStaticStr};

const GENESIS_HASH_LEN: usize = 64;

/// Mutations the console records after the backend confirmed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
pub enum ConsoleAction {
    /// A managed user's role changed.
    #[serde(rename = "profile.role_change")]
    #[strum(serialize = "profile.role_change")]
    RoleChange,
    /// A managed user's full name changed.
    #[serde(rename = "profile.rename")]
    #[strum(serialize = "profile.rename")]
    Rename,
    /// An account was deleted through the privileged function.
    #[serde(rename = "user.delete")]
    #[strum(serialize = "user.delete")]
    UserDelete,
    /// An invitation was sent.
    #[serde(rename = "user.invite")]
    #[strum(serialize = "user.invite")]
    Invite,
    /// A gallery item, blog post or team member entry was removed.
    #[serde(rename = "content.delete")]
    #[strum(serialize = "content.delete")]
    ContentDelete,
    /// A blog post was edited.
    #[serde(rename = "content.update")]
    #[strum(serialize = "content.update")]
    ContentUpdate,
}

/// Entry recorded in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// When the backend confirmed the mutation.
    pub timestamp: DateTime<Utc>,
    /// Account that performed it.
    pub actor: String,
    /// What was done.
    pub action: ConsoleAction,
    /// Account or record acted upon.
    pub subject: String,
    /// Details such as old and new role.
    pub metadata: serde_json::Value,
    /// SHA-256 over this entry's fields and the previous hash.
    pub hash: String,
    /// Hash of the previous entry, zeros for the first one.
    pub previous_hash: String,
}

impl AuditEntry {
    fn compute_hash(
        timestamp: DateTime<Utc>,
        actor: &str,
        action: ConsoleAction,
        subject: &str,
        metadata: &serde_json::Value,
        previous_hash: &str,
    ) -> String {
        let action: &'static str = action.into();
        let mut hasher = Sha256::new();
        hasher.update(
            timestamp
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_be_bytes(),
        );
        hasher.update(actor.as_bytes());
        hasher.update(action.as_bytes());
        hasher.update(subject.as_bytes());
        hasher.update(metadata.to_string().as_bytes());
        hasher.update(previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn recomputed_hash(&self, previous_hash: &str) -> String {
        Self::compute_hash(
            self.timestamp,
            &self.actor,
            self.action,
            &self.subject,
            &self.metadata,
            previous_hash,
        )
    }
}

/// Hash-chained audit trail stored as newline-delimited JSON.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    last_hash: String,
}

impl AuditLog {
    /// Open (or lazily create) the log at `path`, resuming from the last entry's hash.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut log = Self {
            path,
            last_hash: "0".repeat(GENESIS_HASH_LEN),
        };
        if let Some(last) = log.entries()?.pop() {
            log.last_hash = last.hash;
        }
        Ok(log)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry and advance the chain.
    pub fn record(
        &mut self,
        actor: &str,
        action: ConsoleAction,
        subject: &str,
        metadata: serde_json::Value,
    ) -> Result<AuditEntry> {
        let timestamp = Utc::now();
        let hash = AuditEntry::compute_hash(
            timestamp,
            actor,
            action,
            subject,
            &metadata,
            &self.last_hash,
        );
        let entry = AuditEntry {
            timestamp,
            actor: actor.to_owned(),
            action,
            subject: subject.to_owned(),
            metadata,
            hash: hash.clone(),
            previous_hash: self.last_hash.clone(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("unable to create audit directory {}", parent.display())
            })?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("unable to open audit log {}", self.path.display()))?;
        file.write_all(serde_json::to_string(&entry)?.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        self.last_hash = hash;
        Ok(entry)
    }

    /// Read every entry in order.
    pub fn entries(&self) -> Result<Vec<AuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)
            .with_context(|| format!("unable to read audit log {}", self.path.display()))?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Recompute the chain and report whether any entry was altered.
    pub fn verify(&self) -> Result<bool> {
        let mut previous = "0".repeat(GENESIS_HASH_LEN);
        for entry in self.entries()? {
            if entry.previous_hash != previous || entry.recomputed_hash(&previous) != entry.hash {
                return Ok(false);
            }
            previous = entry.hash;
        }
        Ok(true)
    }
}
