use std::fs;
use std::io;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::json::write_atomic;
use crate::model::{Notebook, Page};

/// XML 格式錯誤。 / Errors for the XML notebook format.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("notebook XML is malformed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("page is missing its <{element}> element")]
    MissingField { element: &'static str },
    #[error("unexpected element <{0}> in notebook XML")]
    UnexpectedElement(String),
}

/// 輸出 `<notebook><page><title/><content/></page></notebook>`，含 XML 宣告。 /
/// Emits `<notebook><page><title/><content/></page></notebook>` with an XML declaration.
pub fn to_xml(notebook: &Notebook) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("notebook")))?;
    for page in notebook.pages() {
        writer.write_event(Event::Start(BytesStart::new("page")))?;
        writer.write_event(Event::Start(BytesStart::new("title")))?;
        writer.write_event(Event::Text(BytesText::new(&page.title)))?;
        writer.write_event(Event::End(BytesEnd::new("title")))?;
        writer.write_event(Event::Start(BytesStart::new("content")))?;
        writer.write_event(Event::Text(BytesText::new(page.body.text())))?;
        writer.write_event(Event::End(BytesEnd::new("content")))?;
        writer.write_event(Event::End(BytesEnd::new("page")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("notebook")))?;

    let bytes = writer.into_inner();
    Ok(String::from_utf8(bytes).expect("writer output is always UTF-8"))
}

enum Field {
    Outside,
    Title,
    Content,
}

pub fn from_xml(input: &str) -> Result<Notebook, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut pages = Vec::new();
    let mut in_page = false;
    let mut title: Option<String> = None;
    let mut content: Option<String> = None;
    let mut field = Field::Outside;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"notebook" => {}
                b"page" => {
                    in_page = true;
                    title = None;
                    content = None;
                }
                b"title" if in_page => {
                    field = Field::Title;
                    title = Some(String::new());
                }
                b"content" if in_page => {
                    field = Field::Content;
                    content = Some(String::new());
                }
                other => {
                    return Err(XmlError::UnexpectedElement(
                        String::from_utf8_lossy(other).into_owned(),
                    ))
                }
            },
            Event::Empty(start) => match start.name().as_ref() {
                b"title" if in_page => title = Some(String::new()),
                b"content" if in_page => content = Some(String::new()),
                b"page" => return Err(XmlError::MissingField { element: "title" }),
                b"notebook" => {}
                other => {
                    return Err(XmlError::UnexpectedElement(
                        String::from_utf8_lossy(other).into_owned(),
                    ))
                }
            },
            Event::Text(text) => {
                let value = text.unescape()?;
                match field {
                    Field::Title => title.as_mut().expect("title buffer").push_str(&value),
                    Field::Content => content.as_mut().expect("content buffer").push_str(&value),
                    // 元素之間的空白（外部檔案的縮排）。 / Inter-element whitespace from indented files.
                    Field::Outside => {}
                }
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                match field {
                    Field::Title => title.as_mut().expect("title buffer").push_str(&value),
                    Field::Content => content.as_mut().expect("content buffer").push_str(&value),
                    Field::Outside => {}
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"title" | b"content" => field = Field::Outside,
                b"page" => {
                    in_page = false;
                    let title = title
                        .take()
                        .ok_or(XmlError::MissingField { element: "title" })?;
                    let content = content
                        .take()
                        .ok_or(XmlError::MissingField { element: "content" })?;
                    pages.push(Page::with_content(title, content));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let mut notebook = Notebook::new();
    notebook.replace_pages(pages);
    Ok(notebook)
}

pub fn save_xml(notebook: &Notebook, path: impl AsRef<Path>) -> Result<(), XmlError> {
    let payload = to_xml(notebook)?;
    write_atomic(path.as_ref(), payload.as_bytes())?;
    Ok(())
}

pub fn load_xml(path: impl AsRef<Path>) -> Result<Notebook, XmlError> {
    let contents = fs::read_to_string(path)?;
    from_xml(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_content_exactly() {
        let mut notebook = Notebook::new();
        notebook.add_page(Some("First".into()));
        notebook
            .active_page_mut()
            .unwrap()
            .body
            .replace_text("line one\nline two\n");
        notebook.add_page(Some("Second & <Third>".into()));

        let xml = to_xml(&notebook).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));

        let reloaded = from_xml(&xml).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.pages()[0].title, "First");
        assert_eq!(reloaded.pages()[0].body.text(), "line one\nline two\n");
        assert_eq!(reloaded.pages()[1].title, "Second & <Third>");
    }

    #[test]
    fn parses_indented_files_from_other_writers() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<notebook>
  <page>
    <title>Tidy</title>
    <content>body text</content>
  </page>
</notebook>
"#;
        let notebook = from_xml(xml).unwrap();
        assert_eq!(notebook.pages()[0].title, "Tidy");
        assert_eq!(notebook.pages()[0].body.text(), "body text");
    }

    #[test]
    fn empty_elements_become_empty_strings() {
        let xml = "<notebook><page><title/><content/></page></notebook>";
        let notebook = from_xml(xml).unwrap();
        assert_eq!(notebook.pages()[0].title, "");
        assert_eq!(notebook.pages()[0].body.text(), "");
    }

    #[test]
    fn page_without_title_is_rejected() {
        let xml = "<notebook><page><content>text</content></page></notebook>";
        assert!(matches!(
            from_xml(xml),
            Err(XmlError::MissingField { element: "title" })
        ));
    }

    #[test]
    fn unknown_elements_are_rejected() {
        let xml = "<notebook><chapter/></notebook>";
        assert!(matches!(from_xml(xml), Err(XmlError::UnexpectedElement(_))));
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xml");

        let mut notebook = Notebook::new();
        notebook.add_page(Some("Disk".into()));
        save_xml(&notebook, &path).unwrap();

        let reloaded = load_xml(&path).unwrap();
        assert_eq!(reloaded.pages()[0].title, "Disk");
    }
}
