use novasuite_notebook::{json, xml, Autosaver, Notebook};
use tempfile::tempdir;

fn sample_notebook() -> Notebook {
    let mut notebook = Notebook::new();
    notebook.add_page(Some("Meeting notes".into()));
    notebook
        .active_page_mut()
        .unwrap()
        .body
        .replace_text("agenda\n- budget & staffing\n- <q3 plan>\n");
    notebook.add_page(None);
    notebook
        .active_page_mut()
        .unwrap()
        .body
        .replace_text("第二頁的內容\n");
    notebook
}

/// The two on-disk formats carry identical data; converting through
/// either must preserve every page byte for byte.
#[test]
fn json_and_xml_agree_on_content() {
    let notebook = sample_notebook();

    let via_json = json::from_json(&json::to_json(&notebook).unwrap()).unwrap();
    let via_xml = xml::from_xml(&xml::to_xml(&notebook).unwrap()).unwrap();

    assert_eq!(via_json.len(), via_xml.len());
    for (a, b) in via_json.pages().iter().zip(via_xml.pages()) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.body.text(), b.body.text());
    }
}

#[test]
fn autosave_snapshot_survives_a_restart() {
    let dir = tempdir().unwrap();
    let autosave_path = dir.path().join("autosave.xml");

    {
        let autosaver = Autosaver::new(&autosave_path);
        autosaver.snapshot(&sample_notebook(), None).unwrap();
    }

    // 模擬重新啟動後的還原。 / Simulates the restore a fresh process performs.
    let autosaver = Autosaver::new(&autosave_path);
    let (restored, source) = autosaver.restore().unwrap().unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.pages()[0].title, "Meeting notes");
    assert_eq!(restored.pages()[1].body.text(), "第二頁的內容\n");
    assert!(source.is_none());
}
