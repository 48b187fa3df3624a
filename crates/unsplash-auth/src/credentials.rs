//! Persistent storage for the bearer token
//!
//! The token lives in a small JSON file under a fixed key. All writes use
//! atomic temp-file + rename so a crash mid-write never leaves a torn file,
//! and the file is created 0600 so other users cannot read it. A tokio
//! Mutex serializes writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use common::BearerToken;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::constants::TOKEN_KEY;
use crate::error::{Error, Result};

/// On-disk credential store holding a single opaque bearer token.
///
/// Contents are never validated: whatever `set` receives, `get` returns.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl TokenStore {
    /// Load the store from `path`.
    ///
    /// If the file doesn't exist, creates it as `{}` (first launch, no
    /// token), along with any missing parent directories.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let entries: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(
                path = %path.display(),
                has_token = entries.contains_key(TOKEN_KEY),
                "loaded credentials"
            );
            entries
        } else {
            info!(path = %path.display(), "credential file not found, starting signed out");
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;
            }
            let entries = HashMap::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Current bearer token, if one is stored.
    pub async fn get(&self) -> Option<BearerToken> {
        let state = self.state.lock().await;
        state.get(TOKEN_KEY).map(BearerToken::new)
    }

    /// Store `token` and persist to disk.
    pub async fn set(&self, token: &BearerToken) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(TOKEN_KEY.to_owned(), token.expose().to_owned());
        debug!("stored bearer token");
        write_atomic(&self.path, &state).await
    }

    /// Remove the token and persist to disk.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.remove(TOKEN_KEY);
        debug!("cleared bearer token");
        write_atomic(&self.path, &state).await
    }
}

/// Write the credential map to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets permissions to 0600 (owner read/write only) since the
/// file holds a bearer token.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
