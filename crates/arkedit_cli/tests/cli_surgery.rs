use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use arkedit_core::ObjectContainer;
use arkedit_core::object::{
    GameObject, INVENTORY_COMPONENT_PROP, Name, ObjectId, STATUS_COMPONENT_PROP,
};
use serde_json::Value;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_arkedit"))
        .args(args)
        .output()
        .expect("failed to run arkedit CLI")
}

fn temp_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.json", std::process::id(), nanos))
}

/// Writes a small world: a tribe flag, then a raptor with its two
/// component records.
fn write_sample_save(path: &PathBuf) {
    let mut container = ObjectContainer::new();
    container.push(GameObject::new(ObjectId(0), "TribeFlag_C"));

    let mut raptor = GameObject::new(ObjectId(1), "Raptor_Character_BP_C");
    raptor.set_reference(STATUS_COMPONENT_PROP, ObjectId(2));
    raptor.set_reference(INVENTORY_COMPONENT_PROP, ObjectId(3));
    let owner = raptor.names[0].clone();
    container.push(raptor);

    let mut status = GameObject::new(ObjectId(2), "DinoCharacterStatusComponent_BP_C");
    status.names = vec![
        Name::new("DinoCharacterStatusComponent_BP_C", 1),
        owner.clone(),
    ];
    container.push(status);

    let mut inventory = GameObject::new(ObjectId(3), "DinoTamedInventoryComponent_BP_C");
    inventory.names = vec![Name::new("DinoTamedInventoryComponent_BP_C", 1), owner];
    container.push(inventory);

    container.store_json(path).expect("failed to write save document");
}

fn read_document(path: &PathBuf) -> Vec<Value> {
    let text = fs::read_to_string(path).expect("failed to read output document");
    let document: Value = serde_json::from_str(&text).expect("output should be valid JSON");
    document
        .as_array()
        .expect("document should be an array of records")
        .clone()
}

#[test]
fn export_writes_a_dense_self_contained_subgraph() {
    let save = temp_path("arkedit_export_save");
    let out = temp_path("arkedit_export_out");
    write_sample_save(&save);

    let output = run_cli(&[
        save.to_string_lossy().as_ref(),
        "--export",
        "1",
        "--start-id",
        "0",
        "--output",
        out.to_string_lossy().as_ref(),
        "--summary",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("exported=3"));
    assert!(stdout.contains("unresolved=0"));
    assert!(stdout.contains("records=3"));

    let records = read_document(&out);
    assert_eq!(records.len(), 3);
    let ids: Vec<i64> = records
        .iter()
        .filter_map(|record| record["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
    // The flag was unreachable from the character root.
    assert!(
        records
            .iter()
            .all(|record| record["class_name"] != "TribeFlag_C")
    );

    fs::remove_file(&save).ok();
    fs::remove_file(&out).ok();
}

#[test]
fn merge_reconciles_names_between_documents() {
    let base = temp_path("arkedit_merge_base");
    let other = temp_path("arkedit_merge_other");
    let out = temp_path("arkedit_merge_out");
    write_sample_save(&base);
    write_sample_save(&other);

    let output = run_cli(&[
        base.to_string_lossy().as_ref(),
        "--merge",
        other.to_string_lossy().as_ref(),
        "--output",
        out.to_string_lossy().as_ref(),
        "--summary",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("merged=4"));
    assert!(stdout.contains("records=8"));

    let records = read_document(&out);
    assert_eq!(records.len(), 8);
    let raptor_names: Vec<&Value> = records
        .iter()
        .filter(|record| record["class_name"] == "Raptor_Character_BP_C")
        .map(|record| &record["names"][0])
        .collect();
    assert_eq!(raptor_names.len(), 2);
    assert_ne!(raptor_names[0], raptor_names[1]);

    fs::remove_file(&base).ok();
    fs::remove_file(&other).ok();
    fs::remove_file(&out).ok();
}

#[test]
fn profiles_merge_like_any_other_source() {
    let base = temp_path("arkedit_profile_base");
    let profile = temp_path("arkedit_profile_source");
    write_sample_save(&base);
    write_sample_save(&profile);

    let output = run_cli(&[
        base.to_string_lossy().as_ref(),
        "--profiles",
        profile.to_string_lossy().as_ref(),
        "--summary",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("merged=4"));
    assert!(stdout.contains("records=8"));

    fs::remove_file(&base).ok();
    fs::remove_file(&profile).ok();
}

#[test]
fn modify_applies_an_edit_script() {
    let save = temp_path("arkedit_modify_save");
    let script = temp_path("arkedit_modify_script");
    let out = temp_path("arkedit_modify_out");
    write_sample_save(&save);
    fs::write(&script, r#"{"delete": ["Raptor_Character_BP_C"]}"#)
        .expect("failed to write edit script");

    let output = run_cli(&[
        save.to_string_lossy().as_ref(),
        "--modify",
        script.to_string_lossy().as_ref(),
        "--output",
        out.to_string_lossy().as_ref(),
        "--summary",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("deleted=1"));
    assert!(stdout.contains("removed=3"));
    assert!(stdout.contains("records=1"));

    let records = read_document(&out);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["class_name"], "TribeFlag_C");

    fs::remove_file(&save).ok();
    fs::remove_file(&script).ok();
    fs::remove_file(&out).ok();
}

#[test]
fn transformed_document_dumps_to_stdout_without_output_flag() {
    let save = temp_path("arkedit_stdout_save");
    let script = temp_path("arkedit_stdout_script");
    write_sample_save(&save);
    fs::write(&script, r#"{"delete": ["TribeFlag_C"]}"#).expect("failed to write edit script");

    let output = run_cli(&[
        save.to_string_lossy().as_ref(),
        "--modify",
        script.to_string_lossy().as_ref(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let document: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(document.as_array().map(Vec::len), Some(3));

    fs::remove_file(&save).ok();
    fs::remove_file(&script).ok();
}

#[test]
fn missing_export_root_fails_with_an_error() {
    let save = temp_path("arkedit_badroot_save");
    write_sample_save(&save);

    let output = run_cli(&[save.to_string_lossy().as_ref(), "--export", "99"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));

    fs::remove_file(&save).ok();
}

#[test]
fn corrupt_merge_source_is_skipped() {
    let base = temp_path("arkedit_corrupt_base");
    let bad = temp_path("arkedit_corrupt_bad");
    write_sample_save(&base);
    fs::write(&bad, "{definitely not a save").expect("failed to write corrupt file");

    let output = run_cli(&[
        base.to_string_lossy().as_ref(),
        "--merge",
        bad.to_string_lossy().as_ref(),
        "--summary",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("records=4"));

    fs::remove_file(&base).ok();
    fs::remove_file(&bad).ok();
}
