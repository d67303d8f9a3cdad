//! Integration tests for the partlink CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// partlink command isolated from the user's global config and environment
fn partlink(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("partlink").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env("HOME", tmp.path())
        .env_remove("PARTLINK_LINK_KIND")
        .env_remove("PARTLINK_TAX_DISPLAY")
        .env_remove("PARTLINK_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp).arg("init").assert().success();
    tmp
}

fn add_entity(tmp: &TempDir, id: i64, sku: &str, extra: &[&str]) {
    let id = id.to_string();
    partlink(tmp)
        .args(["entity", "add", "--id", &id, "--sku", sku])
        .args(extra)
        .assert()
        .success();
}

/// Frame 1 with parts 5, 2 and 8 linked in that order
fn setup_parts_list() -> TempDir {
    let tmp = setup_test_project();
    add_entity(&tmp, 1, "FRAME", &["--name", "Frame", "--type", "bundle"]);
    add_entity(&tmp, 2, "BOLT", &["--name", "Bolt", "--price", "10", "--price-incl-tax", "11.9"]);
    add_entity(&tmp, 5, "NUT", &["--name", "Nut", "--price", "2"]);
    add_entity(&tmp, 8, "WASHER", &["--name", "Washer", "--price", "0.5"]);

    partlink(&tmp)
        .args(["link", "set", "1", "5:1:10", "2:2.5:20", "8:0:5"])
        .assert()
        .success();
    tmp
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Second TSV column (ID) of every data row
fn tsv_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split('\t').nth(1).map(str::to_string))
        .collect()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parts lists"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("partlink"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_command_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp)
        .args(["show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a partlink project"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    partlink(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".partlink/config.yaml").exists());
    assert!(tmp.path().join(".partlink/catalog.db").exists());
    assert!(tmp.path().join(".partlink/.gitignore").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_init_force_keeps_catalog() {
    let tmp = setup_test_project();
    add_entity(&tmp, 3, "KEEP-ME", &[]);

    partlink(&tmp).args(["init", "--force"]).assert().success();

    partlink(&tmp)
        .args(["entity", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KEEP-ME"));
}

// ============================================================================
// Entity Command Tests
// ============================================================================

#[test]
fn test_entity_add_assigns_next_id() {
    let tmp = setup_test_project();
    add_entity(&tmp, 7, "FIRST", &[]);

    partlink(&tmp)
        .args(["-q", "entity", "add", "--sku", "SECOND"])
        .assert()
        .success()
        .stdout("8\n");
}

#[test]
fn test_entity_list_json() {
    let tmp = setup_test_project();
    add_entity(&tmp, 4, "GEAR", &["--disabled", "--visibility", "search"]);

    let stdout = stdout_of(partlink(&tmp).args(["entity", "list", "-f", "json"]));
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let first = &json.as_array().unwrap()[0];
    assert_eq!(first["id"], 4);
    assert_eq!(first["sku"], "GEAR");
}

#[test]
fn test_entity_remove_unknown_fails() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .args(["entity", "remove", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_entity_id_must_be_positive() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .args(["entity", "add", "--id", "0", "--sku", "ZERO"])
        .assert()
        .failure();
}

// ============================================================================
// Link Command Tests
// ============================================================================

#[test]
fn test_link_list_shows_raw_rows_in_link_order() {
    let tmp = setup_parts_list();

    let stdout = stdout_of(partlink(&tmp).args(["link", "list", "1", "-f", "json"]));
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<i64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["linked_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 2, 8]);
    assert_eq!(rows[2]["qty"], 0.0);
}

#[test]
fn test_link_set_rejects_unknown_target() {
    let tmp = setup_parts_list();

    partlink(&tmp)
        .args(["link", "set", "1", "2", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    // Nothing was written
    let stdout = stdout_of(partlink(&tmp).args(["link", "list", "1", "-f", "tsv"]));
    assert_eq!(stdout.lines().count(), 4);
}

#[test]
fn test_link_set_replaces_only_its_kind() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 9, "SPRING", &[]);

    partlink(&tmp)
        .args(["link", "set", "1", "5", "--kind", "relation"])
        .assert()
        .success();

    partlink(&tmp)
        .args(["link", "set", "1", "2", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added: 9"))
        .stdout(predicate::str::contains("removed: 5, 8"));

    let partlists = stdout_of(partlink(&tmp).args(["link", "list", "1", "-f", "json"]));
    let rows: serde_json::Value = serde_json::from_str(&partlists).unwrap();
    let ids: Vec<i64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["linked_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 9]);

    partlink(&tmp)
        .args(["link", "list", "1", "--kind", "relation", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5\t"));
}

#[test]
fn test_link_set_skips_non_positive_ids() {
    let tmp = setup_parts_list();
    partlink(&tmp)
        .args(["link", "set", "1", "2", "-4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped 1 invalid link(s)"));
}

#[test]
fn test_link_set_without_links_clears_kind() {
    let tmp = setup_parts_list();
    partlink(&tmp).args(["link", "set", "1"]).assert().success();

    let stdout = stdout_of(partlink(&tmp).args(["link", "list", "1", "-f", "json"]));
    assert_eq!(stdout.trim(), "[]");
}

#[test]
fn test_link_copy() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 10, "FRAME-XL", &[]);

    partlink(&tmp).args(["link", "copy", "1", "10"]).assert().success();

    let stdout = stdout_of(partlink(&tmp).args(["show", "10", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["5", "2", "8"]);
}

// ============================================================================
// Show Command Tests
// ============================================================================

#[test]
fn test_show_keeps_link_order() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "-f", "tsv"]));
    assert!(stdout.starts_with("POS\tID\tSKU\tNAME\tQTY\tUNIT\tTOTAL\n"));
    assert_eq!(tsv_ids(&stdout), vec!["5", "2", "8"]);
}

#[test]
fn test_show_by_position() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "--by-position", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["8", "5", "2"]);
}

#[test]
fn test_show_display_qty_and_totals() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "-f", "json"]));
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    // Stored qty 0 is shown as 1
    assert_eq!(rows[2]["id"], 8);
    assert_eq!(rows[2]["qty"], 1.0);

    assert_eq!(rows[1]["qty"], 2.5);
    assert_eq!(rows[1]["unit_amount"], 10.0);
    assert_eq!(rows[1]["line_total"], 25.0);
}

#[test]
fn test_show_tax_display_including() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "--tax-display", "including_tax", "-f", "json"]));
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[1]["unit_amount"], 11.9);
}

#[test]
fn test_show_filters_disabled_and_missing() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 8, "WASHER", &["--disabled"]);
    partlink(&tmp).args(["entity", "remove", "5"]).assert().success();

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["2"]);

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "--show-disabled", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["2", "8"]);

    // Disabled entities still show their tax-included price
    let stdout = stdout_of(partlink(&tmp).args([
        "show",
        "1",
        "--show-disabled",
        "--tax-display",
        "including_tax",
        "-f",
        "json",
    ]));
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[0]["sku"], "BOLT");
    assert_eq!(rows[0]["unit_amount"], 11.9);
}

#[test]
fn test_show_hides_unsaleable_unless_show_all() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 2, "BOLT", &["--not-saleable"]);

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["5", "8"]);

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "--show-all", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["5", "2", "8"]);
}

#[test]
fn test_show_without_links_is_empty() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "2", "-f", "tsv"]));
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_show_unknown_entity_is_empty() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["show", "404", "-f", "json"]));
    assert_eq!(stdout.trim(), "[]");
}

// ============================================================================
// Qty Map / Query Tests
// ============================================================================

#[test]
fn test_qty_map_uses_raw_quantities() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["qty-map", "1", "-f", "json"]));
    let map: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(map["5"], 1.0);
    assert_eq!(map["2"], 2.5);
    assert_eq!(map["8"], 0.0);
}

#[test]
fn test_qty_map_ignores_filters() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 8, "WASHER", &["--disabled"]);
    let stdout = stdout_of(partlink(&tmp).args(["qty-map", "1", "-f", "json"]));
    let map: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(map.as_object().unwrap().len(), 3);
}

#[test]
fn test_query_sorted_by_position() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["query", "1"]));
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let items = response["items"].as_array().unwrap();

    let skus: Vec<&str> = items.iter().map(|i| i["product"]["sku"].as_str().unwrap()).collect();
    assert_eq!(skus, vec!["WASHER", "NUT", "BOLT"]);
    assert_eq!(items[0]["qty"], 0.0);
    assert_eq!(items[0]["position"], 5);
    assert_eq!(items[0]["product"]["type_id"], "simple");
}

#[test]
fn test_query_storefront_applies_filters() {
    let tmp = setup_parts_list();
    add_entity(&tmp, 8, "WASHER", &["--disabled"]);

    let admin = stdout_of(partlink(&tmp).args(["query", "1"]));
    assert!(admin.contains("WASHER"));

    let storefront = stdout_of(partlink(&tmp).args(["query", "1", "--storefront"]));
    assert!(!storefront.contains("WASHER"));
}

// ============================================================================
// Export / Import Tests
// ============================================================================

#[test]
fn test_export_to_stdout() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(partlink(&tmp).args(["-q", "export"]));
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("sku,_partlists_"));
    assert_eq!(lines.next(), Some("FRAME,\"NUT|1|10,BOLT|2.5|20,WASHER|0|5\""));
}

#[test]
fn test_export_import_round_trip() {
    let tmp = setup_parts_list();
    let file = tmp.path().join("links.csv");
    let file_arg = file.to_string_lossy().to_string();

    partlink(&tmp)
        .args(["export", "-o", &file_arg])
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported 3"));

    partlink(&tmp).args(["link", "set", "1"]).assert().success();

    partlink(&tmp)
        .args(["import", &file_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("Links written:    3"));

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "--by-position", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["8", "5", "2"]);
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let tmp = setup_parts_list();
    let file = tmp.path().join("links.csv");
    fs::write(&file, "sku,_partlists_\nBOLT,NUT|3|1\n").unwrap();

    partlink(&tmp)
        .args(["import", "--dry-run", &file.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    let stdout = stdout_of(partlink(&tmp).args(["link", "list", "2", "-f", "json"]));
    assert_eq!(stdout.trim(), "[]");
}

#[test]
fn test_import_counts_unknown_skus_and_applies_the_rest() {
    let tmp = setup_parts_list();
    let file = tmp.path().join("links.csv");
    fs::write(
        &file,
        "sku,_partlists_\nBOLT,\"NUT|3|1,GHOST|1|2\"\nNOBODY,NUT|1|1\nWASHER,\n",
    )
    .unwrap();

    partlink(&tmp)
        .args(["import", &file.to_string_lossy()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown entities: 1"))
        .stdout(predicate::str::contains("Unknown skus:     1"));

    let stdout = stdout_of(partlink(&tmp).args(["qty-map", "2", "-f", "json"]));
    let map: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(map["5"], 3.0);
}

#[test]
fn test_import_missing_file_fails() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .args(["import", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_keys_lists_link_kind() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("link_kind"))
        .stdout(predicate::str::contains("tax_display"));
}

#[test]
fn test_config_set_link_kind_changes_default() {
    let tmp = setup_parts_list();
    partlink(&tmp)
        .args(["link", "set", "1", "2", "--kind", "cross_sell"])
        .assert()
        .success();

    partlink(&tmp)
        .args(["config", "set", "link_kind", "cross_sell"])
        .assert()
        .success();

    partlink(&tmp)
        .args(["config", "show", "link_kind"])
        .assert()
        .success()
        .stdout("cross_sell\n");

    let stdout = stdout_of(partlink(&tmp).args(["show", "1", "-f", "tsv"]));
    assert_eq!(tsv_ids(&stdout), vec!["2"]);
}

#[test]
fn test_config_set_rejects_bad_value() {
    let tmp = setup_test_project();
    partlink(&tmp)
        .args(["config", "set", "show_all", "maybe"])
        .assert()
        .failure();
}

#[test]
fn test_env_overrides_link_kind() {
    let tmp = setup_parts_list();
    let stdout = stdout_of(
        partlink(&tmp)
            .env("PARTLINK_LINK_KIND", "up_sell")
            .args(["show", "1", "-f", "tsv"]),
    );
    assert!(tsv_ids(&stdout).is_empty());
}

#[test]
fn test_config_show_default_format() {
    let tmp = setup_parts_list();
    partlink(&tmp)
        .args(["config", "set", "default_format", "tsv"])
        .assert()
        .success();

    partlink(&tmp)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("POS\tID"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    partlink(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("partlink"));
}
