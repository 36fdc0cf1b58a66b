//! Credential storage: where tokens live between runs.
//!
//! A persisted session is just two strings, an access token and a
//! refresh token. The client saves them so the next launch can resume
//! without asking the player to sign in again. [`CredentialStore`]
//! abstracts WHERE they are persisted: a directory on disk in
//! production, plain memory in tests.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage key for the access token. Kept stable across releases so
/// existing installs keep their sessions.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A stored token pair.
///
/// Always both or neither: half a pair cannot restore a session, so
/// stores report it as nothing stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Persists credentials between runs.
///
/// Methods are synchronous: the values are two short strings, and the
/// store is only touched on authenticate, refresh, restore, and logout.
///
/// # Trait bounds
///
/// - `Send + Sync` → the store is shared across async tasks.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the client that owns it.
pub trait CredentialStore: Send + Sync + 'static {
    /// Saves the pair, replacing whatever was stored before.
    fn save(&self, credentials: &Credentials) -> io::Result<()>;

    /// Loads the stored pair.
    ///
    /// Returns `Ok(None)` when nothing (or only half a pair) is stored.
    /// Absence is not an error.
    fn load(&self) -> io::Result<Option<Credentials>>;

    /// Removes any stored credentials. Clearing an empty store succeeds.
    fn clear(&self) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// Stores each credential as a small file under a directory.
///
/// One file per key: `<dir>/access_token` and `<dir>/refresh_token`.
/// The directory is created lazily on the first save, so constructing
/// a store never touches the filesystem.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read_key(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credentials: &Credentials) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(ACCESS_TOKEN_KEY), &credentials.access_token)?;
        fs::write(self.path(REFRESH_TOKEN_KEY), &credentials.refresh_token)
    }

    fn load(&self) -> io::Result<Option<Credentials>> {
        let access = self.read_key(ACCESS_TOKEN_KEY)?;
        let refresh = self.read_key(REFRESH_TOKEN_KEY)?;
        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(Credentials {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }

    fn clear(&self) -> io::Result<()> {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            match fs::remove_file(self.path(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and ephemeral sessions.
///
/// Clones share the same slot, so a test can hand the store to a client
/// and still inspect what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<Option<Credentials>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Credentials>> {
        // A panic while holding this lock leaves plain data behind,
        // so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credentials: &Credentials) -> io::Result<()> {
        *self.slot() = Some(credentials.clone());
        Ok(())
    }

    fn load(&self) -> io::Result<Option<Credentials>> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Credentials {
        Credentials {
            access_token: "access-abc".into(),
            refresh_token: "refresh-xyz".into(),
        }
    }

    // =====================================================================
    // FileCredentialStore
    // =====================================================================

    #[test]
    fn test_file_store_save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileCredentialStore::new(dir.path());

        store.save(&pair()).expect("save should succeed");

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded, Some(pair()));
    }

    #[test]
    fn test_file_store_load_empty_dir_returns_none() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileCredentialStore::new(dir.path());

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_file_store_missing_directory_is_not_an_error() {
        // The directory is only created on save, so a fresh install
        // loads (and clears) against a directory that doesn't exist.
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileCredentialStore::new(dir.path().join("never-created"));

        assert_eq!(store.load().expect("load should succeed"), None);
        store.clear().expect("clear should succeed");
    }

    #[test]
    fn test_file_store_save_creates_directory() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let nested = dir.path().join("a").join("b");
        let store = FileCredentialStore::new(&nested);

        store.save(&pair()).expect("save should create the directory");

        assert!(nested.join(ACCESS_TOKEN_KEY).exists());
        assert!(nested.join(REFRESH_TOKEN_KEY).exists());
    }

    #[test]
    fn test_file_store_half_pair_loads_as_none() {
        // Only the access token on disk: not restorable, so load
        // reports nothing stored rather than a broken pair.
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileCredentialStore::new(dir.path());
        std::fs::write(dir.path().join(ACCESS_TOKEN_KEY), "lonely").unwrap();

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_file_store_clear_removes_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileCredentialStore::new(dir.path());
        store.save(&pair()).unwrap();

        store.clear().expect("clear should succeed");
        assert_eq!(store.load().unwrap(), None);

        // Clearing again (nothing stored) should still succeed.
        store.clear().expect("second clear should succeed");
    }

    // =====================================================================
    // MemoryCredentialStore
    // =====================================================================

    #[test]
    fn test_memory_store_round_trip_and_clear() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryCredentialStore::new();
        let observer = store.clone();

        store.save(&pair()).unwrap();

        assert_eq!(
            observer.load().unwrap(),
            Some(pair()),
            "clones should see the same slot"
        );
    }
}
