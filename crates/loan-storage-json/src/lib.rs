//! loan-storage-json
//!
//! Filesystem-backed JSON persistence for loans and notification state.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use loan_core::storage::{loan_warnings, LoanBackupInfo, LoanStore, StoreError, StoreResult};
use loan_domain::{Loan, LoanDraft, LoanId, LoanRecord, NotificationState};

const JSON_EXTENSION: &str = "json";
const LOANS_FILE: &str = "loans.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";
const BACKUP_PREFIX: &str = "loans";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const MAX_NAME_ATTEMPTS: i64 = 1_000;
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Directory layout used by [`JsonLoanStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// Places data files in `base` and backups in `base/backups`.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let data_root = base.into();
        let backup_root = data_root.join("backups");
        Self {
            data_root,
            backup_root,
        }
    }

    pub fn loans_file(&self) -> PathBuf {
        self.data_root.join(LOANS_FILE)
    }

    pub fn notifications_file(&self) -> PathBuf {
        self.data_root.join(NOTIFICATIONS_FILE)
    }
}

/// Stores every loan in a single JSON array, backing up the previous file
/// before each write.
#[derive(Debug)]
pub struct JsonLoanStore {
    paths: StoragePaths,
    retention: usize,
    guard: Mutex<()>,
}

impl JsonLoanStore {
    pub fn new(paths: StoragePaths) -> StoreResult<Self> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> StoreResult<Self> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
            guard: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn loans_path(&self) -> PathBuf {
        self.paths.loans_file()
    }

    /// Writes a labelled copy of the current loans file into the backup directory.
    pub fn backup(&self, note: Option<&str>) -> StoreResult<LoanBackupInfo> {
        let _lock = self.lock()?;
        let loans = self.read_loans()?;
        let info = self.write_backup(&serialize_loans(&loans)?, note)?;
        self.prune_backups()?;
        Ok(info)
    }

    /// Lists backups, newest first.
    pub fn list_backups(&self) -> StoreResult<Vec<LoanBackupInfo>> {
        let dir = &self.paths.backup_root;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let created_at = parse_backup_timestamp(file_name)
                    .map(|stamp| stamp.to_rfc3339())
                    .unwrap_or_default();
                entries.push(LoanBackupInfo {
                    id: file_name.to_string(),
                    created_at,
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse(parse_backup_timestamp(&info.id)));
        Ok(entries)
    }

    /// Replaces the live loans file with a backup and returns its loans.
    pub fn restore_backup(&self, backup: &LoanBackupInfo) -> StoreResult<Vec<Loan>> {
        let _lock = self.lock()?;
        if !backup.path.exists() {
            return Err(StoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let restored = load_loans_from_path(&backup.path)?;
        self.write_loans(&restored)?;
        Ok(restored)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| StoreError::Storage("loan file lock poisoned".into()))
    }

    fn read_loans(&self) -> StoreResult<Vec<Loan>> {
        let path = self.loans_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        load_loans_from_path(&path)
    }

    fn write_loans(&self, loans: &[Loan]) -> StoreResult<()> {
        let path = self.loans_path();
        if path.exists() {
            let previous = fs::read_to_string(&path)?;
            self.write_backup(&previous, None)?;
            self.prune_backups()?;
        }
        save_loans_to_path(loans, &path)
    }

    fn write_backup(&self, data: &str, note: Option<&str>) -> StoreResult<LoanBackupInfo> {
        fs::create_dir_all(&self.paths.backup_root)?;
        let mut stem = BACKUP_PREFIX.to_string();
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let (now, file_name, path) = self.free_backup_name(&stem)?;
        write_atomic(&path, data)?;
        debug!(backup = %file_name, "wrote loans backup");
        Ok(LoanBackupInfo {
            id: file_name,
            created_at: now.to_rfc3339(),
            path,
        })
    }

    /// Picks the first unused millisecond at or after now, so writes in quick
    /// succession never overwrite each other's backup.
    fn free_backup_name(&self, stem: &str) -> StoreResult<(DateTime<Utc>, String, PathBuf)> {
        let start = Utc::now();
        for offset in 0..MAX_NAME_ATTEMPTS {
            let stamp = start + Duration::milliseconds(offset);
            let file_name = format!(
                "{}_{}.{}",
                stem,
                stamp.format(BACKUP_TIMESTAMP_FORMAT),
                JSON_EXTENSION
            );
            let path = self.paths.backup_root.join(&file_name);
            if !path.exists() {
                return Ok((stamp, file_name, path));
            }
        }
        Err(StoreError::Storage(format!(
            "no free backup name for `{}`",
            stem
        )))
    }

    fn prune_backups(&self) -> StoreResult<()> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, error = %err, "failed to prune loans backup");
            }
        }
        Ok(())
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut Vec<Loan>) -> StoreResult<T>) -> StoreResult<T> {
        let _lock = self.lock()?;
        let mut loans = self.read_loans()?;
        let result = apply(&mut loans)?;
        self.write_loans(&loans)?;
        Ok(result)
    }
}

impl LoanStore for JsonLoanStore {
    fn list(&self) -> StoreResult<Vec<Loan>> {
        let _lock = self.lock()?;
        self.read_loans()
    }

    fn get(&self, id: LoanId) -> StoreResult<Loan> {
        self.list()?
            .into_iter()
            .find(|loan| loan.id() == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn create(&self, draft: LoanDraft) -> StoreResult<Loan> {
        self.mutate(|loans| {
            let loan = Loan::from_draft(Uuid::new_v4(), draft);
            loans.push(loan.clone());
            Ok(loan)
        })
    }

    fn update(&self, id: LoanId, loan: &Loan) -> StoreResult<Loan> {
        if loan.id() != id {
            return Err(StoreError::Storage(format!(
                "loan id {} does not match update target {}",
                loan.id(),
                id
            )));
        }
        self.mutate(|loans| {
            let slot = loans
                .iter_mut()
                .find(|existing| existing.id() == id)
                .ok_or(StoreError::NotFound(id))?;
            *slot = loan.clone();
            Ok(loan.clone())
        })
    }

    /// Applies every replacement in one file write; nothing is written when
    /// any id is unknown.
    fn update_many(&self, updated: &[Loan]) -> StoreResult<Vec<Loan>> {
        self.mutate(|loans| {
            for loan in updated {
                if !loans.iter().any(|existing| existing.id() == loan.id()) {
                    return Err(StoreError::NotFound(loan.id()));
                }
            }
            for loan in updated {
                if let Some(slot) = loans.iter_mut().find(|existing| existing.id() == loan.id()) {
                    *slot = loan.clone();
                }
            }
            Ok(updated.to_vec())
        })
    }

    fn remove(&self, id: LoanId) -> StoreResult<()> {
        self.mutate(|loans| {
            let before = loans.len();
            loans.retain(|loan| loan.id() != id);
            if loans.len() == before {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
    }
}

/// Persists [`NotificationState`] between sessions.
#[derive(Debug, Clone)]
pub struct NotificationStateFile {
    path: PathBuf,
}

impl NotificationStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_paths(paths: &StoragePaths) -> Self {
        Self::new(paths.notifications_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved state; a missing file yields an empty state.
    pub fn load(&self) -> StoreResult<NotificationState> {
        if !self.path.exists() {
            return Ok(NotificationState::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| StoreError::Serde(err.to_string()))
    }

    pub fn save(&self, state: &NotificationState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|err| StoreError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Saves loans to an arbitrary path on disk.
pub fn save_loans_to_path(loans: &[Loan], path: &Path) -> StoreResult<()> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_loans(loans)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads loans from the provided path, migrating legacy records on the way.
pub fn load_loans_from_path(path: &Path) -> StoreResult<Vec<Loan>> {
    let data = fs::read_to_string(path)?;
    let records: Vec<LoanRecord> =
        serde_json::from_str(&data).map_err(|err| StoreError::Serde(err.to_string()))?;
    let loans: Vec<Loan> = records
        .into_iter()
        .map(|record| {
            for note in record.migration_notes() {
                warn!(path = %path.display(), "{note}");
            }
            Loan::from(record)
        })
        .collect();
    for warning in loan_warnings(&loans) {
        debug!(path = %path.display(), "{warning}");
    }
    Ok(loans)
}

fn serialize_loans(loans: &[Loan]) -> StoreResult<String> {
    serde_json::to_string_pretty(loans).map_err(|err| StoreError::Serde(err.to_string()))
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", JSON_EXTENSION))?;
    let mut segments = trimmed.rsplit('_');
    let time = segments.next()?;
    let date = segments.next()?;
    // HHMMSS from older backups, HHMMSSmmm otherwise.
    let millis = match time.len() {
        6 if is_digits(time, 6) => 0,
        9 if is_digits(time, 9) => time[6..].parse::<i64>().ok()?,
        _ => return None,
    };
    if !is_digits(date, 8) {
        return None;
    }
    let raw = format!("{}{}", date, &time[..6]);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::milliseconds(millis))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
