use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn media_tools(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("media-tools").unwrap();
    cmd.env("HOME", config_home.path())
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("TOOLS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_binary_is_reported_before_any_work() {
    let home = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();
    std::fs::write(library.path().join("movie.mkv"), b"x").unwrap();

    media_tools(&home)
        .env("PATH", "")
        .args(["compat"])
        .arg(library.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ffprobe"));
}

#[test]
fn missing_input_folder_fails() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("does-not-exist");

    media_tools(&home)
        .args(["health-check", "-i"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn inverted_thresholds_fail() {
    let home = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();

    media_tools(&home)
        .arg("inspect")
        .arg(library.path())
        .args(["--lower-threshold", "120", "--upper-threshold", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Lower threshold"));
}

#[test]
fn invalid_delimiter_is_rejected() {
    let home = TempDir::new().unwrap();
    let library = TempDir::new().unwrap();

    media_tools(&home)
        .arg("inventory")
        .arg(library.path())
        .args(["--delimiter", "ab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single ASCII character"));
}

#[test]
fn missing_file_list_fails() {
    let home = TempDir::new().unwrap();

    media_tools(&home)
        .args(["link", "-f"])
        .arg(home.path().join("nope.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File list not found"));
}
