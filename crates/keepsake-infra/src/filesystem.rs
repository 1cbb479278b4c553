//! Data directory resolution.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "KEEPSAKE_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `KEEPSAKE_DATA_DIR` environment variable
/// 2. `~/.keepsake`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".keepsake");
    }

    // Last resort: current directory
    PathBuf::from(".keepsake")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(dir: &std::path::Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_data_dir_ends_with_keepsake_or_override() {
        let dir = resolve_data_dir();
        match std::env::var(DATA_DIR_ENV) {
            Ok(value) => assert_eq!(dir, PathBuf::from(value)),
            Err(_) => assert!(dir.ends_with(".keepsake")),
        }
    }

    #[tokio::test]
    async fn test_ensure_data_dir_is_idempotent() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_data_dir(&nested).await.unwrap();
        ensure_data_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
