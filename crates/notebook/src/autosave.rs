use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

use crate::json::write_atomic;
use crate::model::Notebook;
use crate::xml::{self, XmlError};

/// 原始程式固定寫入的自動儲存檔名。 / The fixed autosave file name of the original applet.
pub const AUTOSAVE_FILE: &str = "autosave.xml";

/// 自動儲存流程的錯誤型別。 / Error type for the autosave routines.
#[derive(Debug, Error)]
pub enum AutosaveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("autosave snapshot error: {0}")]
    Xml(#[from] XmlError),
    #[error("invalid autosave metadata: {0}")]
    InvalidMetadata(String),
}

/// 週期性觸發器；由 GUI 的更新迴圈驅動。 /
/// Interval gate driven from the GUI update loop.
#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    interval: Duration,
    last: Instant,
}

impl AutosaveTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// 時間到則回傳 `true` 並重新計時。 / Returns `true` once per elapsed interval, rearming itself.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// 將筆記本快照寫到固定位置，並在側檔記錄來源路徑。 /
/// Writes notebook snapshots to a fixed location with a sidecar recording the source path.
#[derive(Debug, Clone)]
pub struct Autosaver {
    path: PathBuf,
}

impl Autosaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 建立快照；`source` 為筆記本目前關聯的檔案（若有）。 /
    /// Takes a snapshot; `source` is the file the notebook is associated with, if any.
    pub fn snapshot(
        &self,
        notebook: &Notebook,
        source: Option<&Path>,
    ) -> Result<(), AutosaveError> {
        let payload = xml::to_xml(notebook)?;
        write_atomic(&self.path, payload.as_bytes())?;

        let metadata = compose_metadata(source, timestamp_ms(SystemTime::now()));
        write_atomic(&self.meta_path(), metadata.as_bytes())?;
        Ok(())
    }

    /// 還原最近的快照；不存在時回傳 `None`。 /
    /// Restores the latest snapshot, or `None` when no snapshot exists.
    pub fn restore(&self) -> Result<Option<(Notebook, Option<PathBuf>)>, AutosaveError> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let notebook = xml::load_xml(&self.path)?;
        let source = match fs::read_to_string(self.meta_path()) {
            Ok(contents) => parse_metadata(&contents)?.source,
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(AutosaveError::Io(err)),
        };
        Ok(Some((notebook, source)))
    }

    /// 移除快照與側檔。 / Removes the snapshot and its sidecar.
    pub fn clear(&self) -> Result<(), AutosaveError> {
        for path in [self.path.clone(), self.meta_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(AutosaveError::Io(err)),
            }
        }
        Ok(())
    }

    fn meta_path(&self) -> PathBuf {
        self.path.with_extension("meta")
    }
}

struct ParsedMetadata {
    source: Option<PathBuf>,
}

fn compose_metadata(source: Option<&Path>, timestamp_ms: u64) -> String {
    let encoded = source
        .map(|path| BASE64.encode(path.to_string_lossy().as_bytes()))
        .unwrap_or_default();
    format!("source={encoded}\ntimestamp={timestamp_ms}\n")
}

fn parse_metadata(contents: &str) -> Result<ParsedMetadata, AutosaveError> {
    let mut source = None;
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            AutosaveError::InvalidMetadata(format!("malformed line: {trimmed}"))
        })?;
        match key {
            "source" => {
                if !value.is_empty() {
                    let decoded = BASE64.decode(value.as_bytes()).map_err(|_| {
                        AutosaveError::InvalidMetadata("failed to decode source path".into())
                    })?;
                    let text = String::from_utf8(decoded).map_err(|_| {
                        AutosaveError::InvalidMetadata("source path is not valid UTF-8".into())
                    })?;
                    source = Some(PathBuf::from(text));
                }
            }
            "timestamp" => {
                value.parse::<u64>().map_err(|_| {
                    AutosaveError::InvalidMetadata("timestamp must be an integer".into())
                })?;
            }
            other => {
                return Err(AutosaveError::InvalidMetadata(format!(
                    "unexpected metadata key: {other}"
                )));
            }
        }
    }
    Ok(ParsedMetadata { source })
}

fn timestamp_ms(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn timer_fires_once_per_interval() {
        let mut timer = AutosaveTimer::new(Duration::from_secs(60));
        let start = Instant::now();
        assert!(!timer.due(start + Duration::from_secs(30)));
        assert!(timer.due(start + Duration::from_secs(61)));
        // 觸發後重新計時。 / Rearmed after firing.
        assert!(!timer.due(start + Duration::from_secs(90)));
        assert!(timer.due(start + Duration::from_secs(121)));
    }

    #[test]
    fn snapshot_and_restore_round_trip() {
        let dir = tempdir().unwrap();
        let autosaver = Autosaver::new(dir.path().join(AUTOSAVE_FILE));

        let mut notebook = Notebook::new();
        notebook.add_page(Some("Draft".into()));
        notebook
            .active_page_mut()
            .unwrap()
            .body
            .replace_text("unsaved work\n");

        let source = dir.path().join("mybook.json");
        autosaver.snapshot(&notebook, Some(&source)).unwrap();

        let (restored, restored_source) = autosaver.restore().unwrap().unwrap();
        assert_eq!(restored.pages()[0].title, "Draft");
        assert_eq!(restored.pages()[0].body.text(), "unsaved work\n");
        assert_eq!(restored_source, Some(source));
    }

    #[test]
    fn restore_without_snapshot_is_none() {
        let dir = tempdir().unwrap();
        let autosaver = Autosaver::new(dir.path().join(AUTOSAVE_FILE));
        assert!(autosaver.restore().unwrap().is_none());
    }

    #[test]
    fn snapshot_of_untitled_notebook_has_no_source() {
        let dir = tempdir().unwrap();
        let autosaver = Autosaver::new(dir.path().join(AUTOSAVE_FILE));

        let mut notebook = Notebook::new();
        notebook.add_page(None);
        autosaver.snapshot(&notebook, None).unwrap();

        let (_, source) = autosaver.restore().unwrap().unwrap();
        assert!(source.is_none());
    }

    #[test]
    fn clear_removes_snapshot_and_sidecar() {
        let dir = tempdir().unwrap();
        let autosaver = Autosaver::new(dir.path().join(AUTOSAVE_FILE));

        let mut notebook = Notebook::new();
        notebook.add_page(None);
        autosaver.snapshot(&notebook, None).unwrap();
        autosaver.clear().unwrap();
        assert!(autosaver.restore().unwrap().is_none());
        // 重複清除不視為錯誤。 / Clearing twice is not an error.
        autosaver.clear().unwrap();
    }
}
