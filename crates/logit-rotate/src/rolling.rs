//! Size, age and count based rolling log file

use chrono::{NaiveDateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sink::RotatingSink;

/// Timestamp embedded in backup names, e.g. `app-2024-03-01T10-15-00.250.log`
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

const COMPRESS_SUFFIX: &str = ".gz";

const MEGABYTE: u64 = 1024 * 1024;

/// Size used when no maximum is configured (100MB)
pub const DEFAULT_MAX_SIZE: u64 = 100 * MEGABYTE;

/// Rolling file configuration
#[derive(Debug, Clone)]
pub struct RollingFileConfig {
    /// Path of the active log file
    pub path: PathBuf,
    /// Maximum size in bytes before the file is rotated (0 = default)
    pub max_size: u64,
    /// Maximum number of backups to keep (0 = keep all)
    pub max_backups: usize,
    /// Maximum age of backups (None = keep regardless of age)
    pub max_age: Option<Duration>,
    /// Gzip backups after rotation
    pub compress: bool,
}

impl RollingFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size: DEFAULT_MAX_SIZE,
            max_backups: 0,
            max_age: None,
            compress: false,
        }
    }

    pub fn max_size_mb(mut self, mb: u64) -> Self {
        self.max_size = mb.saturating_mul(MEGABYTE);
        self
    }

    pub fn max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn max_age_days(mut self, days: u64) -> Self {
        self.max_age = (days > 0).then(|| Duration::from_secs(days.saturating_mul(86_400)));
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn effective_max_size(&self) -> u64 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }
}

/// A rotated-out log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
    pub compressed: bool,
}

/// Log file that rotates by size and prunes backups by count and age
pub struct RollingFile {
    config: RollingFileConfig,
    file: Option<BufWriter<File>>,
    size: u64,
    last_backup: Option<NaiveDateTime>,
    retention_error: Option<io::Error>,
}

impl RollingFile {
    /// Create a rolling file. Nothing is opened until the first write.
    pub fn new(config: RollingFileConfig) -> Self {
        Self {
            config,
            file: None,
            size: 0,
            last_backup: None,
            retention_error: None,
        }
    }

    /// Get the active log file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Bytes written to the active file
    pub fn current_size(&self) -> u64 {
        self.size
    }

    pub fn config(&self) -> &RollingFileConfig {
        &self.config
    }

    /// Most recent retention failure since the last call.
    ///
    /// Pruning and compression run after a rotation has already switched
    /// files, so their errors are held here instead of failing the rotation.
    pub fn take_retention_error(&mut self) -> Option<io::Error> {
        self.retention_error.take()
    }

    /// List backups of this file, newest first
    pub fn backups(&self) -> io::Result<Vec<BackupFile>> {
        let dir = self.dir();
        let (prefix, suffix) = self.backup_affixes();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            let (stem, compressed) = match name.strip_suffix(COMPRESS_SUFFIX) {
                Some(stem) => (stem, true),
                None => (&*name, false),
            };

            let Some(stamp) = stem
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str()))
            else {
                continue;
            };

            if let Ok(timestamp) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                backups.push(BackupFile {
                    path: entry.path(),
                    timestamp,
                    compressed,
                });
            }
        }

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    fn dir(&self) -> PathBuf {
        self.config
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Backup names are `<stem>-<timestamp><.ext>`
    fn backup_affixes(&self) -> (String, String) {
        let stem = self
            .config
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = self
            .config
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (format!("{}-", stem), suffix)
    }

    fn backup_path(&self, timestamp: NaiveDateTime) -> PathBuf {
        let (prefix, suffix) = self.backup_affixes();
        self.dir().join(format!(
            "{}{}{}",
            prefix,
            timestamp.format(BACKUP_TIME_FORMAT),
            suffix
        ))
    }

    /// Pick a backup name that sorts after the previous backup and does not
    /// collide with an existing file
    fn next_backup_path(&mut self) -> PathBuf {
        let step = chrono::Duration::milliseconds(1);
        let mut timestamp = Utc::now().naive_utc();
        if let Some(last) = self.last_backup {
            if timestamp <= last {
                timestamp = last + step;
            }
        }
        loop {
            let candidate = self.backup_path(timestamp);
            if !candidate.exists() && !with_compress_suffix(&candidate).exists() {
                self.last_backup = Some(timestamp);
                return candidate;
            }
            timestamp += step;
        }
    }

    fn open_new(&mut self) -> io::Result<()> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.config.path)?;

        self.file = Some(BufWriter::new(file));
        self.size = 0;
        Ok(())
    }

    /// Open the active file for the first write, appending when it still has room
    fn open_existing_or_new(&mut self, write_len: u64) -> io::Result<()> {
        match fs::metadata(&self.config.path) {
            Ok(meta) if meta.len() + write_len <= self.config.effective_max_size() => {
                let file = OpenOptions::new().append(true).open(&self.config.path)?;
                self.file = Some(BufWriter::new(file));
                self.size = meta.len();
                Ok(())
            }
            Ok(_) => {
                self.roll()?;
                self.apply_retention();
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.open_new(),
            Err(e) => Err(e),
        }
    }

    /// Move the active file aside and open a fresh one.
    /// If the rename fails the previous handle stays in place.
    fn roll(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }

        if self.config.path.exists() {
            let backup = self.next_backup_path();
            fs::rename(&self.config.path, &backup)?;
            // the old handle now points at the backup
            self.file = None;
            self.size = 0;
        }

        self.open_new()
    }

    /// Apply count, age and compression policy to existing backups
    fn prune(&self) -> io::Result<()> {
        if self.config.max_backups == 0 && self.config.max_age.is_none() && !self.config.compress {
            return Ok(());
        }

        let mut backups = self.backups()?;
        let mut expired = Vec::new();

        if self.config.max_backups > 0 && backups.len() > self.config.max_backups {
            expired.extend(backups.split_off(self.config.max_backups));
        }

        if let Some(max_age) = self.config.max_age {
            if let Ok(max_age) = chrono::Duration::from_std(max_age) {
                let cutoff = Utc::now().naive_utc() - max_age;
                let (old, keep): (Vec<_>, Vec<_>) =
                    backups.into_iter().partition(|b| b.timestamp < cutoff);
                expired.extend(old);
                backups = keep;
            }
        }

        let mut first_error = None;

        for backup in &expired {
            if let Err(e) = fs::remove_file(&backup.path) {
                first_error.get_or_insert(e);
            }
        }

        if self.config.compress {
            for backup in backups.iter().filter(|b| !b.compressed) {
                if let Err(e) = compress_file(&backup.path) {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Retention never fails a write or a rotation; see [`Self::take_retention_error`]
    fn apply_retention(&mut self) {
        if let Err(e) = self.prune() {
            self.retention_error = Some(e);
        }
    }
}

impl RotatingSink for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        let max_size = self.config.effective_max_size();
        if len > max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, max_size
                ),
            ));
        }

        if self.file.is_none() {
            self.open_existing_or_new(len)?;
        } else if self.size + len > max_size {
            self.roll()?;
            self.apply_retention();
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file is not open"))?;
        file.write_all(buf)?;
        file.flush()?;
        self.size += len;

        Ok(buf.len())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.roll()?;
        self.apply_retention();
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn with_compress_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

/// Gzip `src` next to itself and remove the original
fn compress_file(src: &Path) -> io::Result<()> {
    let dst = with_compress_suffix(src);

    let result = (|| {
        let mut input = File::open(src)?;
        let output = File::create(&dst)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.sync_all()
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&dst);
        return Err(e);
    }

    fs::remove_file(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn rolling(dir: &TempDir) -> RollingFileConfig {
        RollingFileConfig::new(dir.path().join("app.log"))
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/app.log");

        let mut file = RollingFile::new(RollingFileConfig::new(&path));
        assert!(!path.exists());

        file.write(b"hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(file.current_size(), 6);
    }

    #[test]
    fn test_reopens_existing_file_in_append_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "first\n").unwrap();

        let mut file = RollingFile::new(RollingFileConfig::new(&path));
        file.write(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert_eq!(file.current_size(), 13);
    }

    #[test]
    fn test_size_based_rotation() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir).max_size_bytes(10));

        file.write(b"aaaaaaaa\n").unwrap();
        file.write(b"bbbbbbbb\n").unwrap();

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "aaaaaaaa\n");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "bbbbbbbb\n");
    }

    #[test]
    fn test_oversized_write_rejected() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir).max_size_bytes(4));

        let err = file.write(b"too long").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_explicit_rotate() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir));

        file.write(b"before\n").unwrap();
        file.rotate().unwrap();
        file.write(b"after\n").unwrap();

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "after\n");
    }

    #[test]
    fn test_rotate_before_first_write_opens_file() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir));

        file.rotate().unwrap();
        assert!(file.path().exists());
        assert!(file.backups().unwrap().is_empty());
    }

    #[test]
    fn test_max_backups() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir).max_backups(2));

        for i in 0..5 {
            file.write(format!("line {}\n", i).as_bytes()).unwrap();
            file.rotate().unwrap();
        }

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 2);
        // newest first
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "line 4\n");
        assert_eq!(fs::read_to_string(&backups[1].path).unwrap(), "line 3\n");
    }

    #[test]
    fn test_max_age_removes_old_backups() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("app-2001-01-01T00-00-00.000.log");
        fs::write(&stale, "ancient\n").unwrap();

        let mut file = RollingFile::new(rolling(&dir).max_age_days(1));
        file.write(b"fresh\n").unwrap();
        file.rotate().unwrap();

        assert!(!stale.exists());
        assert_eq!(file.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_compress_backups() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir).compress(true));

        file.write(b"squeeze me\n").unwrap();
        file.rotate().unwrap();

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].compressed);
        assert!(backups[0].path.to_string_lossy().ends_with(".log.gz"));

        let mut decoded = String::new();
        GzDecoder::new(File::open(&backups[0].path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "squeeze me\n");
    }

    /// Directory squatting on the `.gz` name of an old backup, so compressing it fails
    fn block_compression(dir: &TempDir) -> PathBuf {
        let stuck = dir.path().join("app-2001-01-01T00-00-00.000.log");
        fs::write(&stuck, "stuck\n").unwrap();
        fs::create_dir(dir.path().join("app-2001-01-01T00-00-00.000.log.gz")).unwrap();
        stuck
    }

    #[test]
    fn test_retention_failure_does_not_fail_rotate() {
        let dir = TempDir::new().unwrap();
        let stuck = block_compression(&dir);
        let mut file = RollingFile::new(rolling(&dir).compress(true));

        file.write(b"before\n").unwrap();
        file.rotate().unwrap();
        file.write(b"after\n").unwrap();

        assert!(file.take_retention_error().is_some());
        assert!(file.take_retention_error().is_none());
        assert!(stuck.exists());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "after\n");

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].compressed);
    }

    #[test]
    fn test_retention_failure_on_size_rotation() {
        let dir = TempDir::new().unwrap();
        block_compression(&dir);
        let mut file = RollingFile::new(rolling(&dir).max_size_bytes(10).compress(true));

        file.write(b"aaaaaaaa\n").unwrap();
        assert_eq!(file.write(b"bbbbbbbb\n").unwrap(), 9);

        assert!(file.take_retention_error().is_some());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "bbbbbbbb\n");
    }

    #[test]
    fn test_write_after_rotate_never_reaches_backup() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir));

        file.write(b"old\n").unwrap();
        file.rotate().unwrap();
        fs::remove_file(file.path()).unwrap();
        file.rotate().unwrap();
        file.write(b"new\n").unwrap();

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "old\n");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "new\n");
    }

    #[test]
    fn test_backups_ignore_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app-notes.log"), "x").unwrap();
        fs::write(dir.path().join("other-2024-01-01T00-00-00.000.log"), "x").unwrap();
        fs::write(dir.path().join("app-2024-01-01T00-00-00.000.log"), "x").unwrap();

        let file = RollingFile::new(rolling(&dir));
        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(!backups[0].compressed);
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut file = RollingFile::new(rolling(&dir));

        assert!(file.close().is_ok());
        file.write(b"data\n").unwrap();
        assert!(file.close().is_ok());
        assert!(file.close().is_ok());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "data\n");
    }

    #[test]
    fn test_backup_path_format() {
        let file = RollingFile::new(RollingFileConfig::new("/var/log/app.log"));
        let ts = NaiveDateTime::parse_from_str("2024-03-01T10-15-00.250", BACKUP_TIME_FORMAT)
            .unwrap();
        assert_eq!(
            file.backup_path(ts),
            PathBuf::from("/var/log/app-2024-03-01T10-15-00.250.log")
        );
    }
}
