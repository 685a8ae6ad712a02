//! File-backed key/value storage for the session token.
//!
//! The file holds a flat JSON object, e.g. `{"auth_token": "..."}`. A missing
//! file is an empty store. Writes go to a private temporary file in the same
//! directory which is then renamed over the target.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::application::session::{StoreError, TokenStore};

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn access_error(&self, err: impl std::fmt::Display) -> StoreError {
        StoreError::Access {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(self.access_error(err)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })
    }

    /// Entries to rewrite from, and whether corrupt contents were discarded.
    fn read_for_update(&self) -> Result<(BTreeMap<String, String>, bool), StoreError> {
        match self.read_all() {
            Ok(entries) => Ok((entries, false)),
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!(
                    target = "folio::token_store",
                    error = %err,
                    "replacing unreadable session file"
                );
                Ok((BTreeMap::new(), true))
            }
            Err(err) => Err(err),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|err| self.access_error(err))?;
                parent
            }
            None => Path::new("."),
        };
        let body = serde_json::to_string_pretty(entries).map_err(|err| self.access_error(err))?;

        let mut staged = NamedTempFile::new_in(parent).map_err(|err| self.access_error(err))?;
        restrict_permissions(staged.path()).map_err(|err| self.access_error(err))?;
        staged
            .write_all(body.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| self.access_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.access_error(err.error))?;

        debug!(target = "folio::token_store", path = %self.path.display(), "session file written");
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let (mut entries, _) = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let (mut entries, discarded) = self.read_for_update()?;
        if entries.remove(key).is_none() && !discarded {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::AUTH_TOKEN_KEY;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let store = FileTokenStore::new(dir.path().join("nested/session.json"));
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        store.remove(AUTH_TOKEN_KEY).expect("remove on empty");
        assert!(!store.path().exists());
    }

    #[test]
    fn set_then_remove_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested/session.json");
        let store = FileTokenStore::new(&path);

        store.set(AUTH_TOKEN_KEY, "a.b.c").expect("set");
        store.set("theme", "dark").expect("set");

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.get(AUTH_TOKEN_KEY).expect("get").as_deref(),
            Some("a.b.c")
        );

        reopened.remove(AUTH_TOKEN_KEY).expect("remove");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
        assert_eq!(store.get("theme").expect("get").as_deref(), Some("dark"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").expect("write");

        let err = FileTokenStore::new(&path)
            .get(AUTH_TOKEN_KEY)
            .expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn writes_replace_a_corrupt_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"auth_tok"#).expect("write");
        let store = FileTokenStore::new(&path);

        store.set(AUTH_TOKEN_KEY, "a.b.c").expect("set over corrupt file");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get").as_deref(), Some("a.b.c"));

        fs::write(&path, r#"{"auth_tok"#).expect("write");
        store.remove(AUTH_TOKEN_KEY).expect("remove over corrupt file");
        assert_eq!(store.get(AUTH_TOKEN_KEY).expect("get"), None);
    }

    #[test]
    fn writes_leave_no_staging_files_behind() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.set(AUTH_TOKEN_KEY, "a.b.c").expect("set");
        store.set("theme", "dark").expect("set");
        store.remove(AUTH_TOKEN_KEY).expect("remove");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn rewriting_a_world_readable_file_makes_it_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        FileTokenStore::new(&path)
            .set(AUTH_TOKEN_KEY, "a.b.c")
            .expect("set");
        let mode = fs::metadata(&path).expect("meta").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.json");
        FileTokenStore::new(&path)
            .set(AUTH_TOKEN_KEY, "a.b.c")
            .expect("set");
        let mode = fs::metadata(&path).expect("meta").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
