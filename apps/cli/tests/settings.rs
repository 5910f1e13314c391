use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn preferences_export_then_import_round_trips() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let prefs_path = dir.path().join("prefs.json");
    let exported = dir.path().join("exported.json");

    Command::cargo_bin("novasuite-cli")?
        .args([
            "--preferences-file",
            prefs_path.to_str().unwrap(),
            "preferences",
            "export",
            "--output",
            exported.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported preferences"));

    let payload = fs::read_to_string(&exported)?;
    assert!(payload.contains("\"autosave_interval_secs\": 60"));

    // 匯入時會先驗證並套用範圍限制。 / Imports are sanitized before being applied.
    fs::write(
        &exported,
        r#"{"version":1,"editor":{"font_size":500},"ui":{"dark_mode":false}}"#,
    )?;
    Command::cargo_bin("novasuite-cli")?
        .args([
            "--preferences-file",
            prefs_path.to_str().unwrap(),
            "preferences",
            "import",
            exported.to_str().unwrap(),
        ])
        .assert()
        .success();

    let stored = fs::read_to_string(&prefs_path)?;
    assert!(stored.contains("\"font_size\": 96"));
    assert!(stored.contains("\"dark_mode\": false"));
    Ok(())
}

#[test]
fn themes_list_shows_builtins() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("novasuite-cli")?
        .args(["themes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nova Dark"))
        .stdout(predicate::str::contains("Nova Light"));
    Ok(())
}

#[test]
fn themes_list_reads_a_theme_directory() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("custom.json"),
        r##"{
            "name": "Custom",
            "kind": "dark",
            "palette": {
                "window": "#111111",
                "toolbar": "#111111",
                "widget": "#222222",
                "field": "#1a1a1a",
                "text": "#eeeeee",
                "selection": "#333333",
                "canvas": "#101010"
            }
        }"##,
    )?;

    Command::cargo_bin("novasuite-cli")?
        .args(["themes", "list", "--dir", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Custom"));
    Ok(())
}
