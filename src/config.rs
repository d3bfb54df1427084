use crate::storage::DEFAULT_BOARD_FILE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Board file used when `--board` is not given.
    pub board_path: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Reads `explicit` if given, which must exist, otherwise the platform
    /// config file when present.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        match explicit {
            Some(path) => Config::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Config::from_file(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Config> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Config::parse(&data).with_context(|| format!("parsing config {:?}", path))
    }

    fn parse(data: &str) -> Result<Config> {
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn board_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.board_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARD_FILE))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "dodone")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_keys() {
        let config = Config::parse("board_path: /tmp/b.json\nlog_level: debug\nlog_dir: /tmp/logs\n")
            .unwrap();
        assert_eq!(
            config,
            Config {
                board_path: Some(PathBuf::from("/tmp/b.json")),
                log_level: Some("debug".into()),
                log_dir: Some(PathBuf::from("/tmp/logs")),
            }
        );
    }

    #[test]
    fn empty_and_partial_files_use_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        let config = Config::parse("log_level: warn\n").unwrap();
        assert_eq!(config.board_path, None);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(Config::parse("- just\n- a list\n").is_err());
    }

    #[test]
    fn board_path_precedence() {
        let config = Config {
            board_path: Some(PathBuf::from("from-config.json")),
            ..Config::default()
        };
        assert_eq!(
            config.board_path(Some(PathBuf::from("cli.json"))),
            PathBuf::from("cli.json")
        );
        assert_eq!(config.board_path(None), PathBuf::from("from-config.json"));
        assert_eq!(
            Config::default().board_path(None),
            PathBuf::from(DEFAULT_BOARD_FILE)
        );
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.yml"))).is_err());
        let path = dir.path().join("config.yml");
        fs::write(&path, "board_path: here.json\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.board_path(None), PathBuf::from("here.json"));
    }
}
