use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// 驗證 JSON -> XML -> JSON 轉檔後內容不變。 /
/// Verifies that content survives a JSON -> XML -> JSON conversion chain.
#[test]
fn convert_round_trips_between_formats() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let json_path = dir.path().join("book.json");
    let xml_path = dir.path().join("book.xml");
    let back_path = dir.path().join("book_back.json");

    let original = r#"{
  "pages": [
    {
      "title": "第一頁",
      "content": "line one\nline two\n"
    },
    {
      "title": "Escapes & <tags>",
      "content": "a < b && c > d\n"
    }
  ]
}"#;
    fs::write(&json_path, original)?;

    Command::cargo_bin("novasuite-cli")?
        .args([
            "convert",
            json_path.to_str().unwrap(),
            "--to",
            "xml",
            "--output",
            xml_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pages"));

    let xml = fs::read_to_string(&xml_path)?;
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("&amp;&amp;"));

    Command::cargo_bin("novasuite-cli")?
        .args([
            "convert",
            xml_path.to_str().unwrap(),
            "--to",
            "json",
            "--output",
            back_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let round_trip = fs::read_to_string(&back_path)?;
    let value: serde_json::Value = serde_json::from_str(&round_trip)?;
    assert_eq!(value["pages"][0]["title"], "第一頁");
    assert_eq!(value["pages"][0]["content"], "line one\nline two\n");
    assert_eq!(value["pages"][1]["content"], "a < b && c > d\n");
    Ok(())
}

#[test]
fn convert_rejects_missing_input() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("novasuite-cli")?
        .args(["convert", "no_such_file.json", "--to", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
    Ok(())
}

#[test]
fn convert_defaults_output_to_sibling_extension() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let json_path = dir.path().join("notes.json");
    fs::write(
        &json_path,
        r#"{"pages": [{"title": "One", "content": "text\n"}]}"#,
    )?;

    Command::cargo_bin("novasuite-cli")?
        .args(["convert", json_path.to_str().unwrap(), "--to", "xml"])
        .assert()
        .success();

    assert!(dir.path().join("notes.xml").is_file());
    Ok(())
}
