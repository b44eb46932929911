use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when no
/// `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Replace a leading `~` component with the home directory.
///
/// `~user` forms are left alone, as is everything when no home directory
/// can be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_tilde(Path::new("~/.docker_pass")), home.join(".docker_pass"));
        assert_eq!(expand_tilde(Path::new("~")), home);
        assert_eq!(expand_tilde(Path::new("/etc/pass")), PathBuf::from("/etc/pass"));
        assert_eq!(expand_tilde(Path::new("~bob/pass")), PathBuf::from("~bob/pass"));
    }
}
