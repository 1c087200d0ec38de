//! Per-path mutual exclusion within one process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// A table of mutexes keyed by output path.
///
/// Entries exist only while some thread holds or waits for a path, so the
/// table does not grow with the number of distinct paths ever seen.
#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `path`.
    ///
    /// Spellings of one file (`out/x.bin`, `./out/x.bin`) share a lock.
    pub fn with_lock<R>(&self, path: &Path, f: impl FnOnce() -> R) -> R {
        let key = lock_key(path);
        let entry = Arc::clone(self.table.lock().entry(key.clone()).or_default());
        let result = {
            let _guard = entry.lock();
            f()
        };
        // Clones are only made and dropped under the table lock, so a count
        // of one means nobody else holds or waits for the path.
        let mut table = self.table.lock();
        drop(entry);
        if table.get(&key).is_some_and(|e| Arc::strong_count(e) == 1) {
            table.remove(&key);
        }
        result
    }

    /// Whether some thread currently holds or waits for `path`.
    pub fn is_locked(&self, path: &Path) -> bool {
        self.table.lock().contains_key(&lock_key(path))
    }

    /// Number of paths currently held or awaited.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Whether no path is held.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

/// The canonical directory joined with the file name. Falls back to a
/// lexically cleaned path while the directory does not exist.
fn lock_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.components().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn entry_removed_after_use() {
        let locks = PathLocks::new();
        let seen = locks.with_lock(Path::new("a.bin"), || locks.is_locked(Path::new("a.bin")));
        assert!(seen);
        assert!(locks.is_empty());
    }

    #[test]
    fn same_path_is_serialized() {
        let locks = PathLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    locks.with_lock(Path::new("same.bin"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn entries_do_not_outlive_contention() {
        let locks = PathLocks::new();
        for _ in 0..200 {
            let barrier = Barrier::new(4);
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        barrier.wait();
                        locks.with_lock(Path::new("busy.bin"), || {});
                    });
                }
            });
            assert!(locks.is_empty(), "entry left behind for an unheld path");
        }
    }

    #[test]
    fn spellings_of_one_file_share_a_lock() {
        let tmp = tempfile::tempdir().unwrap();
        let plain = tmp.path().join("out.bin");
        let dotted = tmp.path().join(".").join("out.bin");
        let nested = tmp.path().join("sub").join("..").join("out.bin");
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        locks_share(&plain, &dotted);
        locks_share(&plain, &nested);
    }

    fn locks_share(a: &Path, b: &Path) {
        let locks = PathLocks::new();
        locks.with_lock(a, || {
            assert!(locks.is_locked(b));
            assert_eq!(locks.len(), 1);
        });
        assert!(!locks.is_locked(b));
    }

    #[test]
    fn different_paths_do_not_block() {
        let locks = PathLocks::new();
        locks.with_lock(Path::new("outer.bin"), || {
            // A different path can be taken while the first is held.
            locks.with_lock(Path::new("inner.bin"), || {
                assert_eq!(locks.len(), 2);
            });
        });
        assert!(locks.is_empty());
    }
}
