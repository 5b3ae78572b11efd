//! Immutable, monotonically numbered document versions.
//!
//! ```text
//! versions/
//!   document.v0001.md     complete snapshot, never rewritten
//!   document.v0002.md
//!   manifest.jsonl        one VersionRecord per committed version
//!   .lock                 present only while a commit is in flight
//! ```
//!
//! A commit reads the latest version, applies one batch in memory and writes
//! the next version, all inside one lock scope. An aborted batch leaves no
//! partial version behind.

use crate::jsonl::{
    JsonlError, ensure_parent, read_records_from_path, read_text_from_path, tmp_write_path,
};
use chrono::{DateTime, Utc};
use compendium_kernel::{Applier, BatchReport, BlockSource, DocumentError, InsertionOperation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.jsonl";
pub const LOCK_FILE: &str = ".lock";
const SNAPSHOT_PREFIX: &str = "document.v";
const SNAPSHOT_SUFFIX: &str = ".md";

#[derive(Debug, thiserror::Error)]
pub enum VersionStoreError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("version {version} is not a valid document: {source}")]
    Document {
        version: u32,
        #[source]
        source: DocumentError,
    },

    #[error("version store lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("version {version} already exists at {path}")]
    VersionExists { version: u32, path: String },

    #[error("version {0} not found")]
    NotFound(u32),
}

impl VersionStoreError {
    fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Manifest row describing one committed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: u32,
    pub file: String,
    pub digest: String,
    pub requested: usize,
    pub inserted: usize,
    pub created_at: DateTime<Utc>,
}

/// One stored version and its full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u32,
    pub path: PathBuf,
    pub text: String,
}

/// Options for one batch commit.
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Title line seeded into the very first version.
    pub title: Option<String>,
    /// Apply and report without writing a version.
    pub dry_run: bool,
}

/// Result of applying one batch against the latest version.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub base_version: Option<u32>,
    /// `None` for dry runs and for batches that inserted nothing.
    pub record: Option<VersionRecord>,
    pub report: BatchReport,
    pub text: String,
}

/// Directory of numbered snapshots plus manifest.
#[derive(Debug, Clone)]
pub struct VersionStore {
    root: PathBuf,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, version: u32) -> PathBuf {
        self.root.join(snapshot_file_name(version))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Version numbers present on disk, ascending.
    pub fn versions(&self) -> Result<Vec<u32>, VersionStoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut versions: Vec<u32> = fs::read_dir(&self.root)
            .map_err(|e| VersionStoreError::io(&self.root, e))?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str().and_then(parse_snapshot_name))
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn load(&self, version: u32) -> Result<Snapshot, VersionStoreError> {
        let path = self.snapshot_path(version);
        if !path.exists() {
            return Err(VersionStoreError::NotFound(version));
        }
        let text = read_text_from_path(&path)?;
        Ok(Snapshot {
            version,
            path,
            text,
        })
    }

    pub fn latest(&self) -> Result<Option<Snapshot>, VersionStoreError> {
        match self.versions()?.last() {
            Some(version) => self.load(*version).map(Some),
            None => Ok(None),
        }
    }

    /// Manifest rows in commit order; empty when nothing was committed yet.
    pub fn manifest(&self) -> Result<Vec<VersionRecord>, VersionStoreError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_records_from_path(path)?)
    }

    /// Apply one batch to the latest version and commit the next version.
    ///
    /// The latest version is read, validated and indexed before any mutation;
    /// a corrupt version aborts the batch. Batches that insert nothing do not
    /// produce a new version.
    pub fn apply<S>(
        &self,
        operations: &[InsertionOperation],
        source: &S,
        options: &CommitOptions,
    ) -> Result<CommitOutcome, VersionStoreError>
    where
        S: BlockSource + ?Sized,
    {
        let _guard = if options.dry_run {
            None
        } else {
            Some(VersionLockGuard::acquire(&self.lock_path())?)
        };

        let (base_version, base_text) = match self.latest()? {
            Some(snapshot) => (Some(snapshot.version), snapshot.text),
            None => (None, seed_text(options.title.as_deref())),
        };

        let mut applier =
            Applier::from_text(&base_text).map_err(|err| VersionStoreError::Document {
                version: base_version.unwrap_or(0),
                source: err,
            })?;
        let report = applier.apply(operations, source);
        let text = applier.render();

        if options.dry_run || report.inserted == 0 {
            tracing::info!(
                base = ?base_version,
                dry_run = options.dry_run,
                inserted = report.inserted,
                "no version committed"
            );
            return Ok(CommitOutcome {
                base_version,
                record: None,
                report,
                text,
            });
        }

        let version = base_version.map_or(1, |v| v + 1);
        let record = self.write_version(version, &text, &report)?;
        Ok(CommitOutcome {
            base_version,
            record: Some(record),
            report,
            text,
        })
    }

    fn write_version(
        &self,
        version: u32,
        text: &str,
        report: &BatchReport,
    ) -> Result<VersionRecord, VersionStoreError> {
        let path = self.snapshot_path(version);
        ensure_parent(&path)?;

        // Stage the full text, then link it into place: the final name either
        // points at a complete snapshot or does not exist.
        let staged = tmp_write_path(&path);
        let staged_result = (|| -> std::io::Result<()> {
            let mut file = File::create(&staged)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()
        })();
        if let Err(err) = staged_result {
            let _ = fs::remove_file(&staged);
            return Err(VersionStoreError::io(&staged, err));
        }
        let linked = fs::hard_link(&staged, &path);
        let _ = fs::remove_file(&staged);
        match linked {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VersionStoreError::VersionExists {
                    version,
                    path: path.display().to_string(),
                });
            }
            Err(err) => return Err(VersionStoreError::io(&path, err)),
        }

        let record = VersionRecord {
            version,
            file: snapshot_file_name(version),
            digest: content_digest(text),
            requested: report.requested,
            inserted: report.inserted,
            created_at: Utc::now(),
        };
        self.append_manifest(&record)?;
        tracing::info!(
            version,
            digest = %record.digest,
            inserted = record.inserted,
            "version committed"
        );
        Ok(record)
    }

    fn append_manifest(&self, record: &VersionRecord) -> Result<(), VersionStoreError> {
        let path = self.manifest_path();
        let line = serde_json::to_string(record)
            .map_err(|e| JsonlError::Serialize(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| VersionStoreError::io(&path, e))?;
        writeln!(file, "{line}").map_err(|e| VersionStoreError::io(&path, e))?;
        file.sync_all().map_err(|e| VersionStoreError::io(&path, e))
    }
}

/// Hex SHA-256 of a snapshot's text.
pub fn content_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

fn seed_text(title: Option<&str>) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("# {title}\n"),
        None => String::new(),
    }
}

fn snapshot_file_name(version: u32) -> String {
    format!("{SNAPSHOT_PREFIX}{version:04}{SNAPSHOT_SUFFIX}")
}

fn parse_snapshot_name(name: &str) -> Option<u32> {
    name.strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_SUFFIX)?
        .parse()
        .ok()
}

struct VersionLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl VersionLockGuard {
    fn acquire(lock_path: &Path) -> Result<Self, VersionStoreError> {
        ensure_parent(lock_path)?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path: lock_path.to_path_buf(),
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(VersionStoreError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(err) => Err(VersionStoreError::io(lock_path, err)),
        }
    }
}

impl Drop for VersionLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
