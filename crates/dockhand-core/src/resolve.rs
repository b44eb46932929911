//! Configuration resolver.
//!
//! Layers, lowest to highest precedence: built-in defaults, base file,
//! override file, command-line flags. Every layer is a sparse
//! [`PartialConfig`]; the merged result is validated once and frozen into
//! an [`EffectiveConfig`].

use crate::credential::Credential;
use crate::error::ConfigError;
use crate::paths::{DEFAULT_CONFIG_FILE, expand_tilde};
use dockhand_schema::{EffectiveConfig, LogLevel, StepId};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

const PACKAGE_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9+._:-]*$";

/// Compiled once; `None` only if the pattern itself is broken.
static PACKAGE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(PACKAGE_NAME_PATTERN).ok());

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--steps`: enable exactly these steps.
    pub steps: Option<Vec<String>>,
    /// `--password-file`.
    pub password_file: Option<PathBuf>,
    /// `--log-level`.
    pub log_level: Option<String>,
    /// `--repo-url`.
    pub repo_url: Option<String>,
}

/// Everything [`resolve`] needs.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Explicit base configuration file; must exist when given.
    pub config_path: Option<PathBuf>,
    /// Override file layered on top of the base; must exist when given.
    pub override_path: Option<PathBuf>,
    /// Command-line values.
    pub cli: CliOverrides,
    /// Directory searched for `config.json` when `config_path` is `None`.
    pub search_dir: PathBuf,
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            config_path: None,
            override_path: None,
            cli: CliOverrides::default(),
            search_dir: PathBuf::from("."),
        }
    }
}

/// One sparse configuration layer, as read from a file.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    install_prerequisites: Option<bool>,
    install_docker_engine: Option<bool>,
    install_docker_compose: Option<bool>,
    install_additional_tools: Option<bool>,
    setup_service: Option<bool>,
    #[serde(alias = "add_user_to_docker_group")]
    add_user_to_group: Option<bool>,
    verify_installation: Option<bool>,
    password_file_path: Option<String>,
    log_level: Option<String>,
    docker_repo_url: Option<String>,
    additional_packages: Option<Vec<String>>,
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_json::Value>,
}

impl PartialConfig {
    fn step_toggles(&self) -> [(StepId, Option<bool>); 7] {
        [
            (StepId::Prerequisites, self.install_prerequisites),
            (StepId::Engine, self.install_docker_engine),
            (StepId::Compose, self.install_docker_compose),
            (StepId::Tools, self.install_additional_tools),
            (StepId::Service, self.setup_service),
            (StepId::Group, self.add_user_to_group),
            (StepId::Verify, self.verify_installation),
        ]
    }
}

/// Accumulated state while layers are applied.
#[derive(Debug)]
struct Merged {
    steps: BTreeMap<StepId, bool>,
    log_level: Option<String>,
    credential_file: Option<PathBuf>,
    repo_url: Option<String>,
    packages: Option<Vec<String>>,
}

impl Merged {
    fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
            log_level: None,
            credential_file: None,
            repo_url: None,
            packages: None,
        }
    }

    fn apply(&mut self, layer: PartialConfig) {
        for (step, enabled) in layer.step_toggles() {
            if let Some(enabled) = enabled {
                self.steps.insert(step, enabled);
            }
        }
        if let Some(level) = layer.log_level {
            self.log_level = Some(level);
        }
        if let Some(path) = layer.password_file_path {
            self.credential_file = credential_path(&path);
        }
        if let Some(url) = layer.docker_repo_url {
            self.repo_url = Some(url);
        }
        if let Some(packages) = layer.additional_packages {
            self.packages = Some(packages);
        }
    }

    fn apply_cli(&mut self, cli: CliOverrides) -> Result<(), ConfigError> {
        if let Some(names) = cli.steps {
            let selected = names
                .iter()
                .map(|name| name.parse::<StepId>())
                .collect::<Result<Vec<_>, _>>()?;
            for step in StepId::ALL {
                self.steps.insert(step, selected.contains(&step));
            }
        }
        if let Some(path) = cli.password_file {
            self.credential_file = credential_path(&path.to_string_lossy());
        }
        if let Some(level) = cli.log_level {
            self.log_level = Some(level);
        }
        if let Some(url) = cli.repo_url {
            self.repo_url = Some(url);
        }
        Ok(())
    }

    fn build(self) -> Result<EffectiveConfig, ConfigError> {
        let mut builder = EffectiveConfig::builder();
        for (step, enabled) in self.steps {
            builder = builder.step(step, enabled);
        }

        if let Some(level) = self.log_level {
            builder = builder.log_level(level.parse::<LogLevel>()?);
        }

        if let Some(url) = self.repo_url {
            let url = url.trim().to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidRepoUrl(url));
            }
            builder = builder.repository_base_url(url);
        }

        if let Some(packages) = self.packages {
            if let Some(bad) = packages.iter().find(|p| !is_valid_package_name(p)) {
                return Err(ConfigError::InvalidPackageName(bad.clone()));
            }
            builder = builder.additional_packages(packages);
        }

        if let Some(path) = &self.credential_file {
            // Load fully so an empty or unreadable file fails before planning
            Credential::load(path)?;
        }
        builder = builder.credential_file(self.credential_file);

        Ok(builder.build())
    }
}

fn credential_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        Some(expand_tilde(Path::new(raw)))
    }
}

/// Whether `name` is a plain package identifier.
pub fn is_valid_package_name(name: &str) -> bool {
    PACKAGE_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// Merge every layer and validate the result.
pub fn resolve(request: ResolveRequest) -> Result<EffectiveConfig, ConfigError> {
    let mut merged = Merged::new();

    let base = match &request.config_path {
        Some(path) => Some(expand_tilde(path)),
        None => {
            let implicit = request.search_dir.join(DEFAULT_CONFIG_FILE);
            implicit.is_file().then_some(implicit)
        }
    };
    if let Some(path) = base {
        merged.apply(load_layer(&path)?);
    } else {
        debug!("no configuration file; using built-in defaults");
    }

    if let Some(path) = &request.override_path {
        merged.apply(load_layer(&expand_tilde(path))?);
    }

    merged.apply_cli(request.cli)?;
    let config = merged.build()?;
    debug!(
        steps = ?config.enabled_steps(),
        log_level = %config.log_level(),
        repo = config.repository_base_url(),
        "resolved configuration"
    );
    Ok(config)
}

fn load_layer(path: &Path) -> Result<PartialConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let layer: PartialConfig = if is_toml {
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    for key in layer.unknown.keys() {
        warn!(file = %path.display(), key = %key, "ignoring unknown configuration key");
    }
    debug!(file = %path.display(), "loaded configuration layer");
    Ok(layer)
}

/// Write the default configuration document to `path`.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let document = EffectiveConfig::default().to_document();
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let rendered = if is_toml {
        toml::to_string_pretty(&document).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        let mut json = serde_json::to_string_pretty(&document).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        json.push('\n');
        json
    };
    std::fs::write(path, rendered).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn request(dir: &TempDir) -> ResolveRequest {
        ResolveRequest {
            search_dir: dir.path().to_path_buf(),
            ..ResolveRequest::default()
        }
    }

    #[test]
    fn test_defaults_without_any_file() {
        let dir = TempDir::new().unwrap();
        let config = resolve(request(&dir)).unwrap();
        assert_eq!(config, EffectiveConfig::default());
    }

    #[test]
    fn test_implicit_config_json_is_used() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), r#"{"setup_service": false}"#).unwrap();
        let config = resolve(request(&dir)).unwrap();
        assert!(!config.is_enabled(StepId::Service));
        assert!(config.is_enabled(StepId::Engine));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let req = ResolveRequest {
            config_path: Some(dir.path().join("nope.json")),
            ..request(&dir)
        };
        assert!(matches!(resolve(req), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_layer_precedence() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.json");
        fs::write(
            &base,
            r#"{"log_level": "DEBUG", "install_docker_compose": false, "docker_repo_url": "https://a.example/linux"}"#,
        )
        .unwrap();
        let over = dir.path().join("override.toml");
        fs::write(&over, "log_level = \"ERROR\"\ndocker_repo_url = \"https://b.example/linux\"\n").unwrap();

        let req = ResolveRequest {
            config_path: Some(base),
            override_path: Some(over),
            cli: CliOverrides {
                repo_url: Some("https://c.example/linux".to_string()),
                ..CliOverrides::default()
            },
            ..request(&dir)
        };
        let config = resolve(req).unwrap();
        assert_eq!(config.log_level(), LogLevel::Error);
        assert_eq!(config.repository_base_url(), "https://c.example/linux");
        assert!(!config.is_enabled(StepId::Compose));
    }

    #[test]
    fn test_steps_flag_enables_exactly_listed() {
        let dir = TempDir::new().unwrap();
        let req = ResolveRequest {
            cli: CliOverrides {
                steps: Some(vec!["verify".to_string(), "docker".to_string()]),
                ..CliOverrides::default()
            },
            ..request(&dir)
        };
        let config = resolve(req).unwrap();
        assert_eq!(config.enabled_steps(), vec![StepId::Engine, StepId::Verify]);
    }

    #[test]
    fn test_unknown_step_is_config_error() {
        let dir = TempDir::new().unwrap();
        let req = ResolveRequest {
            cli: CliOverrides {
                steps: Some(vec!["kubernetes".to_string()]),
                ..CliOverrides::default()
            },
            ..request(&dir)
        };
        assert!(matches!(resolve(req), Err(ConfigError::UnknownStep(_))));
    }

    #[test]
    fn test_group_alias_and_unknown_keys() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"add_user_to_docker_group": false, "theme": "dark"}"#,
        )
        .unwrap();
        let config = resolve(request(&dir)).unwrap();
        assert!(!config.is_enabled(StepId::Group));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"additional_packages": ["htop", "curl; rm -rf /"]}"#,
        )
        .unwrap();
        assert!(matches!(
            resolve(request(&dir)),
            Err(ConfigError::InvalidPackageName(name)) if name == "curl; rm -rf /"
        ));

        fs::write(dir.path().join("config.json"), r#"{"log_level": "LOUD"}"#).unwrap();
        assert!(matches!(resolve(request(&dir)), Err(ConfigError::InvalidLogLevel(_))));

        fs::write(dir.path().join("config.json"), r#"{"docker_repo_url": "ftp://x"}"#).unwrap();
        assert!(matches!(resolve(request(&dir)), Err(ConfigError::InvalidRepoUrl(_))));

        fs::write(dir.path().join("config.json"), "{not json").unwrap();
        assert!(matches!(resolve(request(&dir)), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_insecure_credential_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let pass = dir.path().join("pass");
        fs::write(&pass, "hunter2\n").unwrap();
        fs::set_permissions(&pass, fs::Permissions::from_mode(0o644)).unwrap();
        let req = ResolveRequest {
            cli: CliOverrides {
                password_file: Some(pass.clone()),
                ..CliOverrides::default()
            },
            ..request(&dir)
        };
        assert!(matches!(
            resolve(req.clone()),
            Err(ConfigError::InsecureCredentialFile { .. })
        ));

        fs::set_permissions(&pass, fs::Permissions::from_mode(0o600)).unwrap();
        let config = resolve(req).unwrap();
        assert_eq!(config.credential_file(), Some(pass.as_path()));
    }

    #[test]
    fn test_empty_password_path_means_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), r#"{"password_file_path": ""}"#).unwrap();
        assert!(resolve(request(&dir)).unwrap().credential_file().is_none());
    }

    #[test]
    fn test_package_names() {
        assert!(is_valid_package_name("docker-buildx-plugin"));
        assert!(is_valid_package_name("libstdc++6"));
        assert!(is_valid_package_name("python3.11:amd64"));
        assert!(!is_valid_package_name("-y"));
        assert!(!is_valid_package_name(""));
        assert!(!is_valid_package_name("a b"));
    }

    #[test]
    fn test_package_name_pattern_compiles_once() {
        assert!(PACKAGE_NAME.is_some());
        let first = PACKAGE_NAME.as_ref().unwrap();
        for name in ["jq", "htop", "git"] {
            assert!(is_valid_package_name(name));
        }
        assert!(std::ptr::eq(first, PACKAGE_NAME.as_ref().unwrap()));
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        write_default_config(&path, false).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["install_prerequisites"], true);
        assert!(matches!(
            write_default_config(&path, false),
            Err(ConfigError::AlreadyExists { .. })
        ));
        write_default_config(&path, true).unwrap();
    }
}
