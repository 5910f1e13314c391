use novasuite_settings::{Preferences, PreferencesStore};
use tempfile::tempdir;

#[test]
fn store_round_trips_edited_preferences() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config").join("preferences.json");

    {
        let mut store = PreferencesStore::load(&path).unwrap();
        assert_eq!(store.preferences(), &Preferences::default());
        store
            .update(|prefs| {
                prefs.editor.font_size = 16;
                prefs.editor.autosave_interval_secs = 120;
                prefs.ui.dark_mode = false;
            })
            .unwrap();
    }

    let store = PreferencesStore::load(&path).unwrap();
    assert_eq!(store.preferences().editor.font_size, 16);
    assert_eq!(store.preferences().editor.autosave_interval_secs, 120);
    assert!(!store.preferences().ui.dark_mode);
}

#[test]
fn load_sanitizes_hand_edited_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(
        &path,
        r#"{"version":1,"editor":{"autosave_interval_secs":1,"font_size":1},"ui":{"theme":""}}"#,
    )
    .unwrap();

    let store = PreferencesStore::load(&path).unwrap();
    assert_eq!(store.preferences().editor.autosave_interval_secs, 10);
    assert_eq!(store.preferences().editor.font_size, 6);
    assert_eq!(store.preferences().ui.theme, "Nova Dark");
}

#[test]
fn import_backs_up_the_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    let incoming = dir.path().join("incoming.json");

    let mut store = PreferencesStore::load(&path).unwrap();
    store.save().unwrap();

    std::fs::write(
        &incoming,
        r#"{"version":1,"editor":{"font_size":20},"ui":{"dark_mode":false}}"#,
    )
    .unwrap();

    store.import_from(&incoming).unwrap();
    assert_eq!(store.preferences().editor.font_size, 20);
    assert!(path.with_extension("bak").exists());
}

#[test]
fn import_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    let incoming = dir.path().join("broken.json");
    std::fs::write(&incoming, "{not json").unwrap();

    let mut store = PreferencesStore::load(&path).unwrap();
    assert!(store.import_from(&incoming).is_err());
    assert_eq!(store.preferences(), &Preferences::default());
}
