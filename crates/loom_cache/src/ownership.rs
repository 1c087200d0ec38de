//! Single-writer ownership of the cache directory.
//!
//! Only the owner populates the cache; every process may read it. Ownership
//! is a lease: [`FileLease`] records a holder and an expiry in a small JSON
//! file, and a lease whose holder stopped renewing it can be taken over.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::OwnershipError;

/// A lease deciding which process may populate the cache.
pub trait OwnershipLock: Send + Sync {
    /// Attempts to become the owner. Returns `true` when ownership is held
    /// after the call.
    fn try_acquire(&self) -> Result<bool, OwnershipError>;

    /// Gives up ownership, if held.
    fn release(&self) -> Result<(), OwnershipError>;

    /// Whether ownership is currently held. Never blocks on I/O.
    fn is_owner(&self) -> bool;

    /// Extends a held lease. Returns `false` when ownership was lost.
    fn renew(&self) -> Result<bool, OwnershipError>;
}

/// Ownership for a process that is the only writer of its cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoleOwner;

impl OwnershipLock for SoleOwner {
    fn try_acquire(&self) -> Result<bool, OwnershipError> {
        Ok(true)
    }

    fn release(&self) -> Result<(), OwnershipError> {
        Ok(())
    }

    fn is_owner(&self) -> bool {
        true
    }

    fn renew(&self) -> Result<bool, OwnershipError> {
        Ok(true)
    }
}

/// Contents of a lease file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct LeaseRecord {
    holder: String,
    expires_at_ms: u64,
}

/// A time-limited lease stored in a file.
///
/// A record is always published whole: it is written to a temporary file and
/// linked into place only if no lease file exists. Taking over an expired or
/// unreadable lease first moves that exact file aside, so of several
/// contenders only the one whose move removed the stale record goes on to
/// publish its own.
#[derive(Debug)]
pub struct FileLease {
    path: PathBuf,
    holder: String,
    duration: Duration,
    /// The record this instance published, while it holds the lease.
    held: Mutex<Option<LeaseRecord>>,
}

impl FileLease {
    /// Name of the lease file inside a cache directory.
    pub const FILE_NAME: &'static str = "owner.lease";

    /// Creates a lease handle; nothing is acquired until [`try_acquire`](OwnershipLock::try_acquire).
    pub fn new(path: impl Into<PathBuf>, holder: impl Into<String>, duration: Duration) -> Self {
        Self {
            path: path.into(),
            holder: holder.into(),
            duration,
            held: Mutex::new(None),
        }
    }

    /// A lease at `<cache_dir>/owner.lease` held on behalf of this process.
    pub fn for_process(cache_dir: &Path, duration: Duration) -> Self {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        Self::new(
            cache_dir.join(Self::FILE_NAME),
            format!("pid-{}-{nonce:08x}", std::process::id()),
            duration,
        )
    }

    /// The lease file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// This handle's holder id.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn record(&self, now: u64) -> LeaseRecord {
        LeaseRecord {
            holder: self.holder.clone(),
            expires_at_ms: now.saturating_add(self.duration.as_millis() as u64),
        }
    }

    fn io_err(&self, source: std::io::Error) -> OwnershipError {
        OwnershipError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn encode(record: &LeaseRecord) -> Result<Vec<u8>, OwnershipError> {
        serde_json::to_vec(record).map_err(|e| OwnershipError::Encode {
            reason: e.to_string(),
        })
    }

    /// Publishes `record` unless a lease file exists. Returns whether it did.
    fn publish(&self, record: &LeaseRecord) -> Result<bool, OwnershipError> {
        let mut temp = tempfile::NamedTempFile::new_in(self.dir()).map_err(|e| self.io_err(e))?;
        temp.write_all(&Self::encode(record)?)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| self.io_err(e))?;
        match temp.persist_noclobber(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(self.io_err(e.error)),
        }
    }

    /// Removes the lease file if it still contains `expected`.
    ///
    /// The file is renamed to a unique name before it is compared, so two
    /// callers never both remove the same record. A file that changed since
    /// it was read is put back.
    fn remove_if_unchanged(&self, expected: &[u8]) -> Result<bool, OwnershipError> {
        let aside = tempfile::Builder::new()
            .prefix(".owner-stale")
            .tempfile_in(self.dir())
            .map_err(|e| self.io_err(e))?
            .into_temp_path();
        match std::fs::rename(&self.path, &aside) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.io_err(e)),
        }
        if std::fs::read(&aside).is_ok_and(|moved| moved == expected) {
            return Ok(true);
        }
        if let Err(e) = aside.persist_noclobber(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e.error, "could not restore a lease replaced during takeover");
        }
        Ok(false)
    }

    /// Whether the lease file in `bytes` may be replaced at `now`.
    fn is_replaceable(&self, bytes: &[u8], now: u64) -> bool {
        match serde_json::from_slice::<LeaseRecord>(bytes) {
            Ok(current) => current.holder == self.holder || current.expires_at_ms <= now,
            Err(_) => true,
        }
    }
}

impl OwnershipLock for FileLease {
    /// A lease file that disappears between the failed publish and the read
    /// belongs to a holder that is releasing or being replaced; the call
    /// returns `false` and may be retried.
    fn try_acquire(&self) -> Result<bool, OwnershipError> {
        let now = now_ms();
        let record = self.record(now);

        let acquired = if self.publish(&record)? {
            true
        } else {
            match std::fs::read(&self.path) {
                Ok(current) if self.is_replaceable(&current, now) => {
                    self.remove_if_unchanged(&current)? && self.publish(&record)?
                }
                Ok(_) => false,
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(self.io_err(e)),
            }
        };

        if acquired {
            tracing::debug!(path = %self.path.display(), holder = %self.holder, "acquired cache ownership");
        }
        *self.held.lock() = acquired.then_some(record);
        Ok(acquired)
    }

    fn release(&self) -> Result<(), OwnershipError> {
        let Some(held) = self.held.lock().take() else {
            return Ok(());
        };
        self.remove_if_unchanged(&Self::encode(&held)?)?;
        Ok(())
    }

    fn is_owner(&self) -> bool {
        let now = now_ms();
        self.held
            .lock()
            .as_ref()
            .is_some_and(|held| held.expires_at_ms > now)
    }

    fn renew(&self) -> Result<bool, OwnershipError> {
        let Some(held) = self.held.lock().clone() else {
            return Ok(false);
        };
        let record = self.record(now_ms());
        let renewed =
            self.remove_if_unchanged(&Self::encode(&held)?)? && self.publish(&record)?;
        if !renewed {
            tracing::warn!(path = %self.path.display(), "cache ownership lost to another holder");
        }
        *self.held.lock() = renewed.then_some(record);
        Ok(renewed)
    }
}

impl Drop for FileLease {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::debug!(error = %e, "failed to release cache ownership");
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lease(dir: &Path, holder: &str, duration: Duration) -> FileLease {
        FileLease::new(dir.join(FileLease::FILE_NAME), holder, duration)
    }

    #[test]
    fn sole_owner_always_owns() {
        let owner = SoleOwner;
        assert!(owner.is_owner());
        assert!(owner.try_acquire().unwrap());
        assert!(owner.renew().unwrap());
        owner.release().unwrap();
        assert!(owner.is_owner());
    }

    #[test]
    fn first_acquirer_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let a = lease(tmp.path(), "a", Duration::from_secs(60));
        let b = lease(tmp.path(), "b", Duration::from_secs(60));
        assert!(!a.is_owner());
        assert!(a.try_acquire().unwrap());
        assert!(!b.try_acquire().unwrap());
        assert!(a.is_owner());
        assert!(!b.is_owner());
    }

    #[test]
    fn release_lets_another_acquire() {
        let tmp = tempfile::tempdir().unwrap();
        let a = lease(tmp.path(), "a", Duration::from_secs(60));
        let b = lease(tmp.path(), "b", Duration::from_secs(60));
        assert!(a.try_acquire().unwrap());
        a.release().unwrap();
        assert!(!a.is_owner());
        assert!(!a.path().exists());
        assert!(b.try_acquire().unwrap());
    }

    #[test]
    fn expired_lease_is_taken_over() {
        let tmp = tempfile::tempdir().unwrap();
        let a = lease(tmp.path(), "a", Duration::ZERO);
        let b = lease(tmp.path(), "b", Duration::from_secs(60));
        assert!(a.try_acquire().unwrap());
        assert!(!a.is_owner());
        assert!(b.try_acquire().unwrap());
        assert!(b.is_owner());
        assert!(!a.renew().unwrap());
    }

    #[test]
    fn corrupt_lease_is_taken_over() {
        let tmp = tempfile::tempdir().unwrap();
        let a = lease(tmp.path(), "a", Duration::from_secs(60));
        std::fs::write(a.path(), b"{ not json").unwrap();
        assert!(a.try_acquire().unwrap());
        let record: LeaseRecord =
            serde_json::from_slice(&std::fs::read(a.path()).unwrap()).unwrap();
        assert_eq!(record.holder, "a");
    }

    /// Races four handles for one lease file and returns the holders that
    /// report ownership afterwards.
    fn race_for_lease(dir: &Path) -> Vec<String> {
        let leases: Vec<FileLease> = (0..4)
            .map(|i| lease(dir, &format!("contender-{i}"), Duration::from_secs(60)))
            .collect();
        let barrier = std::sync::Barrier::new(leases.len());
        let acquired: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = leases
                .iter()
                .map(|l| {
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        l.try_acquire().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (lease, won) in leases.iter().zip(&acquired) {
            assert_eq!(lease.is_owner(), *won);
        }
        let owners: Vec<String> = leases
            .iter()
            .filter(|l| l.is_owner())
            .map(|l| l.holder().to_string())
            .collect();
        if let [owner] = owners.as_slice() {
            let record: LeaseRecord =
                serde_json::from_slice(&std::fs::read(dir.join(FileLease::FILE_NAME)).unwrap())
                    .unwrap();
            assert_eq!(&record.holder, owner);
        }
        owners
    }

    #[test]
    fn racing_fresh_acquirers_have_one_owner() {
        for _ in 0..200 {
            let tmp = tempfile::tempdir().unwrap();
            let owners = race_for_lease(tmp.path());
            assert_eq!(owners.len(), 1, "owners: {owners:?}");
        }
    }

    #[test]
    fn racing_takeovers_of_expired_lease_have_one_owner() {
        for _ in 0..200 {
            let tmp = tempfile::tempdir().unwrap();
            let stale = LeaseRecord {
                holder: "crashed".to_string(),
                expires_at_ms: 0,
            };
            std::fs::write(
                tmp.path().join(FileLease::FILE_NAME),
                serde_json::to_vec(&stale).unwrap(),
            )
            .unwrap();
            let owners = race_for_lease(tmp.path());
            assert_eq!(owners.len(), 1, "owners: {owners:?}");
        }
    }

    #[test]
    fn takeover_leaves_no_stray_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(FileLease::FILE_NAME), b"").unwrap();
        let a = lease(tmp.path(), "a", Duration::from_secs(60));
        assert!(a.try_acquire().unwrap());
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(FileLease::FILE_NAME)]);
    }

    #[test]
    fn renew_extends_held_lease() {
        let tmp = tempfile::tempdir().unwrap();
        let a = lease(tmp.path(), "a", Duration::from_secs(60));
        assert!(!a.renew().unwrap());
        assert!(a.try_acquire().unwrap());
        assert!(a.renew().unwrap());
        assert!(a.is_owner());
    }

    #[test]
    fn drop_releases() {
        let tmp = tempfile::tempdir().unwrap();
        let path = {
            let a = lease(tmp.path(), "a", Duration::from_secs(60));
            assert!(a.try_acquire().unwrap());
            a.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn process_holder_ids_differ_by_pid_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let a = FileLease::for_process(tmp.path(), Duration::from_secs(1));
        assert!(a.holder().starts_with(&format!("pid-{}-", std::process::id())));
        assert_eq!(a.path(), tmp.path().join("owner.lease"));
    }
}
