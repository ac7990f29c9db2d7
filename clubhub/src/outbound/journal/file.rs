//! File-backed checkout journal.
//!
//! Each record lives in `<dir>/<checkout id>.json`. Writes go to a hidden
//! temporary file in the same directory which is synced and renamed over the
//! target, so readers see either the previous or the next record, never a
//! partial one. Filesystem work runs on the blocking pool.

use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::checkout::{CheckoutId, CheckoutRecord};
use crate::domain::idempotency::PurchaseFingerprint;
use crate::domain::ports::{CheckoutJournal, CheckoutJournalError};

const RECORD_SUFFIX: &str = ".json";

/// Journal storing one JSON file per checkout.
#[derive(Debug, Clone)]
pub struct FileCheckoutJournal {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl FileCheckoutJournal {
    /// Open (creating if needed) the journal directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutJournalError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, CheckoutJournalError> {
        let root = path.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Directory the journal writes to.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, CheckoutJournalError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &Utf8Path) -> Result<T, CheckoutJournalError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || work(&dir, &root))
            .await
            .map_err(|error| CheckoutJournalError::io(format!("journal task failed: {error}")))?
    }
}

fn io_error(path: &Utf8Path, error: &io::Error) -> CheckoutJournalError {
    CheckoutJournalError::io(format!("{path}: {error}"))
}

fn file_name(id: &CheckoutId) -> String {
    format!("{id}{RECORD_SUFFIX}")
}

fn encode(record: &CheckoutRecord) -> Result<Vec<u8>, CheckoutJournalError> {
    serde_json::to_vec_pretty(record).map_err(|error| {
        CheckoutJournalError::serialization(format!("checkout {}: {error}", record.id))
    })
}

fn decode(name: &str, bytes: &[u8]) -> Result<CheckoutRecord, CheckoutJournalError> {
    serde_json::from_slice(bytes)
        .map_err(|error| CheckoutJournalError::serialization(format!("{name}: {error}")))
}

fn write_atomic(
    dir: &Dir,
    root: &Utf8Path,
    name: &str,
    contents: &[u8],
) -> Result<(), CheckoutJournalError> {
    let tmp_name = format!(".{name}.tmp.{}", Uuid::new_v4().simple());
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    let written = dir.open_with(&tmp_name, &options).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(error) = written.and_then(|()| dir.rename(&tmp_name, dir, name)) {
        // The temporary file may never have been created.
        if let Err(cleanup_error) = dir.remove_file(&tmp_name) {
            debug!(file = %tmp_name, error = %cleanup_error, "temporary checkout file not removed");
        }
        return Err(io_error(&root.join(name), &error));
    }
    if let Err(sync_error) = dir.open(".").and_then(|handle| handle.sync_all()) {
        debug!(dir = %root, error = %sync_error, "checkout journal directory not synced");
    }
    Ok(())
}

fn read_record(
    dir: &Dir,
    root: &Utf8Path,
    name: &str,
) -> Result<Option<CheckoutRecord>, CheckoutJournalError> {
    match dir.read(name) {
        Ok(bytes) => decode(name, &bytes).map(Some),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(io_error(&root.join(name), &error)),
    }
}

/// Every readable record. Unreadable files are logged and skipped so one
/// corrupt record cannot hide the others from operators.
fn read_all(dir: &Dir, root: &Utf8Path) -> Result<Vec<CheckoutRecord>, CheckoutJournalError> {
    let mut records = Vec::new();
    for item in dir.entries().map_err(|error| io_error(root, &error))? {
        let entry = item.map_err(|error| io_error(root, &error))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') || !name.ends_with(RECORD_SUFFIX) {
            continue;
        }
        match read_record(dir, root, &name) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(error) => warn!(file = %name, error = %error, "skipping unreadable checkout record"),
        }
    }
    records.sort_by_key(|record| record.created_at);
    Ok(records)
}

#[async_trait]
impl CheckoutJournal for FileCheckoutJournal {
    async fn save(&self, record: &CheckoutRecord) -> Result<(), CheckoutJournalError> {
        let contents = encode(record)?;
        let name = file_name(&record.id);
        self.blocking(move |dir, root| write_atomic(dir, root, &name, &contents))
            .await
    }

    async fn load(&self, id: &CheckoutId) -> Result<Option<CheckoutRecord>, CheckoutJournalError> {
        let name = file_name(id);
        self.blocking(move |dir, root| read_record(dir, root, &name))
            .await
    }

    async fn find_in_flight(
        &self,
        fingerprint: &PurchaseFingerprint,
    ) -> Result<Option<CheckoutRecord>, CheckoutJournalError> {
        let wanted = fingerprint.clone();
        let records = self.blocking(read_all).await?;
        Ok(records
            .into_iter()
            .find(|record| record.is_in_flight() && record.fingerprint == wanted))
    }

    async fn list(&self) -> Result<Vec<CheckoutRecord>, CheckoutJournalError> {
        self.blocking(read_all).await
    }

    async fn remove(&self, id: &CheckoutId) -> Result<(), CheckoutJournalError> {
        let name = file_name(id);
        self.blocking(move |dir, root| match dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&root.join(&name), &error)),
        })
        .await
    }
}
