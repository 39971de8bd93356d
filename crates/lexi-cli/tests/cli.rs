use assert_cmd::Command;
use serde_json::Value;
use tempfile::tempdir;

fn lexi() -> Command {
    Command::cargo_bin("lexi").expect("binary built")
}

#[test]
fn help_lists_the_pipeline_subcommands() {
    let output = lexi().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for sub in ["import", "fetch", "expand", "pool", "filter", "enable", "disable"] {
        assert!(text.contains(sub), "help should mention {sub}");
    }
}

#[test]
fn languages_json_seeds_and_lists_the_baked_language() {
    let dir = tempdir().unwrap();
    let output = lexi()
        .args(["--json", "--data-dir"])
        .arg(dir.path())
        .arg("languages")
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["status"], "ok");
    let languages = payload["details"]["languages"].as_array().unwrap();
    assert!(languages.iter().any(|l| l["id"] == "en"));
    assert!(dir.path().join("languages.json").exists());
}

#[test]
fn invalid_variant_exits_one_with_a_stable_code() {
    let dir = tempdir().unwrap();
    let commit = "ab".repeat(20);
    let output = lexi()
        .args(["--json", "--data-dir"])
        .arg(dir.path())
        .args(["enable", "xx-XX", commit.as_str()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["details"]["code"], "INVALID_VARIANT");
}

#[test]
fn enable_without_artifacts_is_an_activation_error() {
    let dir = tempdir().unwrap();
    let commit = "ab".repeat(20);
    let output = lexi()
        .args(["--json", "--data-dir"])
        .arg(dir.path())
        .args(["enable", "en-US", commit.as_str()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["details"]["code"], "ACTIVATION_INCOMPLETE");
}

#[test]
fn config_set_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let set = lexi()
        .arg("--data-dir")
        .arg(dir.path())
        .args(["config", "set", "defaultLanguage", "en"])
        .output()
        .unwrap();
    assert!(set.status.success());

    let get = lexi()
        .args(["--json", "--data-dir"])
        .arg(dir.path())
        .args(["config", "get", "defaultLanguage"])
        .output()
        .unwrap();
    assert!(get.status.success());
    let payload: Value = serde_json::from_slice(&get.stdout).unwrap();
    assert_eq!(payload["details"]["value"], "en");
}

#[test]
fn jobs_starts_empty() {
    let dir = tempdir().unwrap();
    let output = lexi()
        .args(["--json", "--data-dir"])
        .arg(dir.path())
        .arg("jobs")
        .output()
        .unwrap();
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["details"]["jobs"].as_array().unwrap().len(), 0);
}
