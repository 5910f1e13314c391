use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Notebook, Page};

/// JSON 格式錯誤。 / Errors for the JSON notebook format.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("notebook JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 磁碟上的筆記本結構：`{"pages": [{"title", "content"}]}`。 /
/// On-disk notebook shape: `{"pages": [{"title", "content"}]}`.
#[derive(Debug, Serialize, Deserialize)]
struct NotebookWire {
    #[serde(default)]
    pages: Vec<PageWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PageWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

fn to_wire(notebook: &Notebook) -> NotebookWire {
    NotebookWire {
        pages: notebook
            .pages()
            .iter()
            .map(|page| PageWire {
                title: page.title.clone(),
                content: page.body.text().to_owned(),
            })
            .collect(),
    }
}

fn from_wire(wire: NotebookWire) -> Notebook {
    let mut notebook = Notebook::new();
    notebook.replace_pages(
        wire.pages
            .into_iter()
            .map(|page| Page::with_content(page.title, page.content))
            .collect(),
    );
    notebook
}

/// 輸出縮排 JSON（原始程式使用 indent=2）。 / Pretty JSON, as the original wrote with indent=2.
pub fn to_json(notebook: &Notebook) -> Result<String, JsonError> {
    Ok(serde_json::to_string_pretty(&to_wire(notebook))?)
}

pub fn from_json(input: &str) -> Result<Notebook, JsonError> {
    let wire: NotebookWire = serde_json::from_str(input)?;
    Ok(from_wire(wire))
}

pub fn save_json(notebook: &Notebook, path: impl AsRef<Path>) -> Result<(), JsonError> {
    let payload = to_json(notebook)?;
    write_atomic(path.as_ref(), payload.as_bytes())?;
    Ok(())
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Notebook, JsonError> {
    let contents = fs::read_to_string(path)?;
    from_json(&contents)
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_titles_and_content() {
        let mut notebook = Notebook::new();
        notebook.add_page(Some("Notes".into()));
        notebook
            .active_page_mut()
            .unwrap()
            .body
            .replace_text("first line\nsecond line\n");
        notebook.add_page(None);

        let json = to_json(&notebook).unwrap();
        let reloaded = from_json(&json).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.pages()[0].title, "Notes");
        assert_eq!(reloaded.pages()[0].body.text(), "first line\nsecond line\n");
        assert_eq!(reloaded.pages()[1].title, "Page 2");
    }

    #[test]
    fn styling_does_not_survive_serialisation() {
        use novasuite_core::Attr;

        let mut notebook = Notebook::new();
        notebook.add_page(Some("Styled".into()));
        let page = notebook.active_page_mut().unwrap();
        page.body.replace_text("bold words here");
        page.body.apply(0..4, Attr::Bold);

        let json = to_json(&notebook).unwrap();
        let reloaded = from_json(&json).unwrap();
        assert!(reloaded.pages()[0].body.spans().is_empty());
    }

    #[test]
    fn accepts_missing_fields() {
        let notebook = from_json(r#"{"pages": [{"title": "Only title"}, {}]}"#).unwrap();
        assert_eq!(notebook.pages()[0].body.text(), "");
        assert_eq!(notebook.pages()[1].title, "");
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");

        let mut notebook = Notebook::new();
        notebook.add_page(Some("Disk".into()));
        save_json(&notebook, &path).unwrap();

        let reloaded = load_json(&path).unwrap();
        assert_eq!(reloaded.pages()[0].title, "Disk");
    }
}
