//! On-disk credential storage.

use crate::error::{AuthError, AuthResult};
use crate::token::TokenRecord;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Name of the credential file inside the config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Reads and writes the single JSON credential record.
///
/// The file is the sole durable source of truth between invocations; there
/// is no in-memory cache across them. Writes go through a temp file in the
/// same directory followed by a rename, so a reader only ever observes the
/// old or the new full content. No cross-process locking is provided; a race
/// between two concurrent invocations is last-writer-wins.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store rooted at the given config directory.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(CREDENTIALS_FILE),
        }
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record.
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that exists
    /// but does not parse yields [`AuthError::Parse`]; callers treat that
    /// the same as absent and force re-authentication.
    pub async fn load(&self) -> AuthResult<Option<TokenRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let record =
            serde_json::from_str::<TokenRecord>(&content).map_err(|e| AuthError::Parse {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Some(record))
    }

    /// Persist a record, replacing any prior one.
    ///
    /// The file is created with owner-only permission bits; they are set at
    /// creation time on the temp file, not applied afterwards.
    pub async fn save(&self, record: &TokenRecord) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o700);

        let mut file = options.open(&tmp).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = ?self.path, "Wrote credentials file");
        Ok(())
    }

    /// Remove the credential file if present.
    ///
    /// Returns `true` if a file was removed. This only clears local state;
    /// the token itself is not revoked.
    pub async fn remove(&self) -> AuthResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&self.path).await?;
        debug!(path = ?self.path, "Removed credentials file");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (CredentialStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path());
        (store, dir)
    }

    fn record_with_expiry(token: &str, expires_at: Option<u64>) -> TokenRecord {
        let mut record = TokenRecord::bearer(token);
        record.refresh_token = Some("refresh".to_string());
        record.expires_at = expires_at;
        record
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let (store, _dir) = test_store();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, _dir) = test_store();

        let record = record_with_expiry("tok", Some(1_700_000_000_000));
        store.save(&record).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, record);
        // Validity evaluates identically before and after the round trip.
        let now = crate::current_time_ms();
        assert_eq!(loaded.is_valid_at(now), record.is_valid_at(now));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_record() {
        let (store, _dir) = test_store();

        store.save(&TokenRecord::bearer("old")).await.unwrap();
        store.save(&TokenRecord::bearer("new")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "new");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let (store, dir) = test_store();

        tokio::fs::write(dir.path().join(CREDENTIALS_FILE), "{not json")
            .await
            .unwrap();

        match store.load().await {
            Err(AuthError::Parse { path, .. }) => {
                assert!(path.ends_with(CREDENTIALS_FILE));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _dir) = test_store();
        store.save(&TokenRecord::bearer("tok")).await.unwrap();

        let mode = std::fs::metadata(store.path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _dir) = test_store();

        assert!(!store.remove().await.unwrap());

        store.save(&TokenRecord::bearer("tok")).await.unwrap();
        assert!(store.remove().await.unwrap());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let (store, dir) = test_store();
        store.save(&TokenRecord::bearer("tok")).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
