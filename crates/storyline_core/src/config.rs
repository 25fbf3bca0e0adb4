//! Host configuration persisted as JSON.
//!
//! # Responsibility
//! - Hold logging preferences and the recently opened project list.
//! - Read and write the configuration file without touching project data.
//!
//! # Invariants
//! - `recent_projects` holds at most `MAX_RECENT_PROJECTS` paths, most recent
//!   first, without duplicates.
//! - A missing configuration file loads as defaults.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const MAX_RECENT_PROJECTS: usize = 10;

/// Errors from configuration load/save.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "config io error at `{}`: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "invalid config json at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

/// Persisted host preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorylineConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub last_project: Option<PathBuf>,
    pub recent_projects: Vec<PathBuf>,
}

impl Default for StorylineConfig {
    fn default() -> Self {
        Self {
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            last_project: None,
            recent_projects: Vec::new(),
        }
    }
}

impl StorylineConfig {
    /// Marks `path` as the most recently opened project.
    pub fn remember_project(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.recent_projects.retain(|existing| existing != &path);
        self.recent_projects.insert(0, path.clone());
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
        self.last_project = Some(path);
    }
}

/// Reads configuration from `path`, or defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<StorylineConfig, ConfigError> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StorylineConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut config: StorylineConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    normalize_recent(&mut config.recent_projects);
    Ok(config)
}

/// Writes `config` to `path` as pretty JSON, creating parent directories.
pub fn save_config(path: impl AsRef<Path>, config: &StorylineConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let content = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(io_error)
}

// Hand-edited files may break the bound or repeat paths.
fn normalize_recent(recent: &mut Vec<PathBuf>) {
    let mut seen = Vec::with_capacity(recent.len());
    recent.retain(|path| {
        if seen.contains(path) {
            false
        } else {
            seen.push(path.clone());
            true
        }
    });
    recent.truncate(MAX_RECENT_PROJECTS);
}

#[cfg(test)]
mod tests {
    use super::{load_config, save_config, StorylineConfig, MAX_RECENT_PROJECTS};
    use std::path::PathBuf;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, StorylineConfig::default());
    }

    #[test]
    fn remember_project_moves_existing_path_to_front() {
        let mut config = StorylineConfig::default();
        config.remember_project("/a.db");
        config.remember_project("/b.db");
        config.remember_project("/a.db");

        assert_eq!(
            config.recent_projects,
            vec![PathBuf::from("/a.db"), PathBuf::from("/b.db")]
        );
        assert_eq!(config.last_project, Some(PathBuf::from("/a.db")));
    }

    #[test]
    fn recent_projects_are_bounded() {
        let mut config = StorylineConfig::default();
        for index in 0..(MAX_RECENT_PROJECTS + 5) {
            config.remember_project(format!("/p{index}.db"));
        }
        assert_eq!(config.recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(config.recent_projects[0], PathBuf::from("/p14.db"));
    }

    #[test]
    fn save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = StorylineConfig::default();
        config.log_level = "warn".to_string();
        config.remember_project("/novel.db");

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn sparse_and_duplicated_json_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"recent_projects": ["/x.db", "/x.db", "/y.db"]}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.recent_projects,
            vec![PathBuf::from("/x.db"), PathBuf::from("/y.db")]
        );
        assert_eq!(config.last_project, None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
