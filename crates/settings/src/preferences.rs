use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub editor: EditorPreferences,
    #[serde(default)]
    pub ui: UiPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            editor: EditorPreferences::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.editor.sanitize();
        self.ui.sanitize();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorPreferences {
    #[serde(default = "default_true")]
    pub autosave_enabled: bool,
    /// Seconds between autosave snapshots; the applets shipped with 60.
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u16,
}

fn default_true() -> bool {
    true
}

fn default_autosave_interval() -> u32 {
    60
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u16 {
    12
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            autosave_enabled: true,
            autosave_interval_secs: default_autosave_interval(),
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

impl EditorPreferences {
    fn sanitize(&mut self) {
        if self.autosave_interval_secs == 0 {
            self.autosave_interval_secs = default_autosave_interval();
        }
        self.autosave_interval_secs = self.autosave_interval_secs.clamp(10, 3600);
        if self.font_family.trim().is_empty() {
            self.font_family = default_font_family();
        }
        self.font_size = self.font_size.clamp(6, 96);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "Nova Dark".to_string()
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            theme: default_theme(),
        }
    }
}

impl UiPreferences {
    fn sanitize(&mut self) {
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, mut preferences: Preferences) -> Self {
        preferences.sanitize();
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, payload.as_bytes())
            .map_err(|source| PreferencesError::Write { path, source })
    }

    /// Replaces the stored preferences with the contents of `source`,
    /// keeping a `.bak` copy of the previous file.
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let source = source.as_ref().to_path_buf();
        let contents = fs::read_to_string(&source).map_err(|err| PreferencesError::Read {
            path: source.clone(),
            source: err,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|err| PreferencesError::Parse {
                path: source.clone(),
                source: err,
            })?;
        data.sanitize();
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), PreferencesError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| PreferencesError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_applets() {
        let prefs = Preferences::default();
        assert!(prefs.editor.autosave_enabled);
        assert_eq!(prefs.editor.autosave_interval_secs, 60);
        assert_eq!(prefs.editor.font_size, 12);
        assert_eq!(prefs.editor.font_family, "Arial");
        assert!(prefs.ui.dark_mode);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut prefs = Preferences {
            version: 0,
            editor: EditorPreferences {
                autosave_enabled: true,
                autosave_interval_secs: 0,
                font_family: "  ".into(),
                font_size: 400,
            },
            ui: UiPreferences {
                dark_mode: false,
                theme: "".into(),
            },
        };
        prefs.sanitize();
        assert_eq!(prefs.version, 1);
        assert_eq!(prefs.editor.autosave_interval_secs, 60);
        assert_eq!(prefs.editor.font_family, "Arial");
        assert_eq!(prefs.editor.font_size, 96);
        assert_eq!(prefs.ui.theme, "Nova Dark");
    }
}
