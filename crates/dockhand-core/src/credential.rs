//! Sudo password file handling.
//!
//! The password file holds the password on its first line. It must be
//! readable by its owner only: any group or other permission bit causes
//! the file to be rejected before a single step runs.

use crate::error::ConfigError;
use std::fmt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Permission bits that must be clear on a password file.
pub const FORBIDDEN_MODE_BITS: u32 = 0o077;

/// A sudo password. Never printed, never placed in an argument list.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret directly (used by tests and non-file callers).
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Validate `path` and read the password from its first line.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        validate_file(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let first = content.lines().next().unwrap_or("").trim_end_matches('\r');
        if first.is_empty() {
            return Err(ConfigError::EmptyCredential {
                path: path.to_path_buf(),
            });
        }
        Ok(Self(first.to_string()))
    }

    /// The secret itself, for writing to a privilege prompt.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Check that `path` exists and is not accessible by group or others.
pub fn validate_file(path: &Path) -> Result<(), ConfigError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::CredentialNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mode = meta.permissions().mode() & 0o7777;
    if mode & FORBIDDEN_MODE_BITS != 0 {
        return Err(ConfigError::InsecureCredentialFile {
            path: path.to_path_buf(),
            mode,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_with_mode(dir: &Path, content: &str, mode: u32) -> std::path::PathBuf {
        let path = dir.join("sudo-pass");
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_load_reads_first_line_only() {
        let dir = tempdir().unwrap();
        let path = write_with_mode(dir.path(), "hunter2\nsecond line\n", 0o600);
        let credential = Credential::load(&path).unwrap();
        assert_eq!(credential.expose(), "hunter2");
    }

    #[test]
    fn test_world_readable_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_with_mode(dir.path(), "hunter2\n", 0o644);
        let err = Credential::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureCredentialFile { mode: 0o644, .. }));
    }

    #[test]
    fn test_group_readable_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_with_mode(dir.path(), "hunter2\n", 0o640);
        assert!(matches!(
            validate_file(&path),
            Err(ConfigError::InsecureCredentialFile { .. })
        ));
    }

    #[test]
    fn test_missing_and_empty_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Credential::load(&dir.path().join("nope")),
            Err(ConfigError::CredentialNotFound { .. })
        ));
        let empty = write_with_mode(dir.path(), "\nignored\n", 0o400);
        assert!(matches!(
            Credential::load(&empty),
            Err(ConfigError::EmptyCredential { .. })
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::new("hunter2");
        assert!(!format!("{credential:?}").contains("hunter2"));
    }
}
