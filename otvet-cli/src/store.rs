//! On-disk session storage.
//!
//! The auth snapshot is the only state the CLI persists. It carries the
//! portal cookie, so the file is written with owner-only permissions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use otvet_client::AuthSnapshot;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/otvet`
/// - Linux: `~/.config/otvet`
/// - Windows: `%APPDATA%\otvet`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("otvet"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("otvet"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default session file path.
pub fn default_session_path() -> PathBuf {
    default_config_dir().join("session.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600); // Owner read/write only
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

// ============================================================================
// Snapshot Operations
// ============================================================================

/// Saves the snapshot, creating parent directories as needed.
///
/// The file is written atomically (temp file + rename) and, on Unix, is
/// readable by the owner only.
pub async fn save_snapshot(path: &Path, snapshot: &AuthSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json)
        .await
        .with_context(|| format!("writing {}", temp_path.display()))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))?;
    set_restrictive_permissions(path).await?;

    debug!(path = %path.display(), "session saved");
    Ok(())
}

/// Loads the snapshot; `None` when no session was saved.
pub async fn load_snapshot(path: &Path) -> Result<Option<AuthSnapshot>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("reading {}", path.display()));
        }
    };

    let snapshot =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), "session loaded");
    Ok(Some(snapshot))
}

/// Deletes the saved session. Returns whether a file was removed.
pub async fn delete_snapshot(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error).with_context(|| format!("removing {}", path.display())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> AuthSnapshot {
        AuthSnapshot {
            token: Some("tok".to_string()),
            salt: Some("slt".to_string()),
            user_id: Some(216_185_885),
            cookie: Some("sso-ticket".to_string()),
        }
    }

    #[test]
    fn test_default_session_path() {
        let path = default_session_path();
        assert!(path.ends_with("session.json"));
    }

    #[tokio::test]
    async fn test_save_load_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        assert_eq!(load_snapshot(&path).await.unwrap(), None);

        save_snapshot(&path, &snapshot()).await.unwrap();
        let loaded = load_snapshot(&path).await.unwrap();
        assert_eq!(loaded, Some(snapshot()));

        assert!(delete_snapshot(&path).await.unwrap());
        assert!(!delete_snapshot(&path).await.unwrap());
        assert_eq!(load_snapshot(&path).await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save_snapshot(&path, &snapshot()).await.unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert!(load_snapshot(&path).await.is_err());
    }
}
