use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::store::Backend;

pub const API_URL_ENV: &str = "DRAFTJOBS_API_URL";
const SETTINGS_FILE: &str = ".draftjobs.json";
const DEFAULT_STORE_FILE: &str = ".draftjobs-jobs.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Terminal,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Terminal => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
            ThemePreference::Light => ThemePreference::Terminal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Terminal => "terminal",
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Home directory not found")]
    HomeNotFound,
    #[error("Cannot write settings: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot encode settings: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_drafting_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Settings {
    pub fn drafting_rate(&self) -> f64 {
        self.default_drafting_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(0.0)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn settings_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(SETTINGS_FILE);
    Some(path)
}

pub fn default_store_path() -> PathBuf {
    match dirs::home_dir() {
        Some(mut path) => {
            path.push(DEFAULT_STORE_FILE);
            path
        }
        None => PathBuf::from(DEFAULT_STORE_FILE),
    }
}

pub fn load() -> Settings {
    settings_path()
        .map(|path| load_from(&path))
        .unwrap_or_default()
}

pub fn save(settings: &Settings) -> Result<(), SettingsError> {
    let path = settings_path().ok_or(SettingsError::HomeNotFound)?;
    save_to(&path, settings)
}

pub fn load_from(path: &Path) -> Settings {
    let Ok(contents) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str(&contents) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {err}");
            Settings::default()
        }
    }
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn resolve_backend(
    cli_store: Option<PathBuf>,
    cli_api: Option<String>,
    env_api: Option<String>,
    settings: &Settings,
) -> Backend {
    let non_empty = |value: &String| !value.trim().is_empty();

    if let Some(url) = cli_api.filter(non_empty) {
        return Backend::Api(url);
    }
    if let Some(path) = cli_store {
        return Backend::File(path);
    }
    if let Some(url) = env_api.filter(non_empty) {
        return Backend::Api(url);
    }
    if let Some(url) = settings.api_url.clone().filter(non_empty) {
        return Backend::Api(url);
    }
    if let Some(path) = settings.store_path.clone() {
        return Backend::File(path);
    }
    Backend::File(default_store_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_corrupt_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_from(&path), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_from(&path), Settings::default());
    }

    #[test]
    fn settings_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            theme: ThemePreference::Dark,
            default_drafting_rate: Some(42.5),
            export_dir: Some(PathBuf::from("/tmp/reports")),
            ..Settings::default()
        };
        save_to(&path, &settings).unwrap();
        assert_eq!(load_from(&path), settings);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"theme\": \"dark\""));
        assert!(!raw.contains("api_url"));
    }

    #[test]
    fn unusable_default_rate_is_zero() {
        let mut settings = Settings {
            default_drafting_rate: Some(-3.0),
            ..Settings::default()
        };
        assert_eq!(settings.drafting_rate(), 0.0);
        settings.default_drafting_rate = Some(f64::NAN);
        assert_eq!(settings.drafting_rate(), 0.0);
        settings.default_drafting_rate = Some(65.0);
        assert_eq!(settings.drafting_rate(), 65.0);
    }

    #[test]
    fn backend_precedence() {
        let settings = Settings {
            api_url: Some("http://settings".to_string()),
            store_path: Some(PathBuf::from("/settings/jobs.json")),
            ..Settings::default()
        };

        assert_eq!(
            resolve_backend(
                Some(PathBuf::from("/cli/jobs.json")),
                None,
                Some("http://env".to_string()),
                &settings
            ),
            Backend::File(PathBuf::from("/cli/jobs.json"))
        );
        assert_eq!(
            resolve_backend(None, Some("http://cli".to_string()), None, &settings),
            Backend::Api("http://cli".to_string())
        );
        assert_eq!(
            resolve_backend(None, None, Some("http://env".to_string()), &settings),
            Backend::Api("http://env".to_string())
        );
        assert_eq!(
            resolve_backend(None, None, Some("  ".to_string()), &settings),
            Backend::Api("http://settings".to_string())
        );

        let file_only = Settings {
            store_path: Some(PathBuf::from("/settings/jobs.json")),
            ..Settings::default()
        };
        assert_eq!(
            resolve_backend(None, None, None, &file_only),
            Backend::File(PathBuf::from("/settings/jobs.json"))
        );
        assert_eq!(
            resolve_backend(None, None, None, &Settings::default()),
            Backend::File(default_store_path())
        );
    }

    #[test]
    fn theme_cycles_through_all_choices() {
        let start = ThemePreference::Terminal;
        let cycled = start.next().next().next();
        assert_eq!(cycled, start);
        assert_eq!(start.next().label(), "dark");
    }
}
