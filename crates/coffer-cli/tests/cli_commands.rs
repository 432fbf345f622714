use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("coffer"));
    cmd.env("COFFER_HOME", home)
        .env_remove("COFFER_ADDR")
        .env_remove("COFFER_PASSWORD");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn offline_note_lifecycle() {
    let home_dir = tempdir().expect("tempdir");
    let home = home_dir.path();

    let id = stdout_of(base_cmd(home).args([
        "add", "note", "--key", "k1", "--text", "hello", "--meta", "origin=test",
    ]))
    .trim()
    .to_string();
    assert_eq!(id.len(), 36);
    assert!(home.join("vault.db").exists());
    assert!(home.join("local.key").exists());

    base_cmd(home)
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("k1"))
        .stdout(predicate::str::contains("new"));

    base_cmd(home)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"text\": \"hello\""))
        .stdout(predicate::str::contains("\"origin\": \"test\""));

    base_cmd(home)
        .args(["update", &id, "note", "--text", "world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v2"));

    base_cmd(home).args(["rm", &id]).assert().success();

    base_cmd(home)
        .args(["show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: entry not found"));
}

#[test]
fn invalid_input_is_reported() {
    let home_dir = tempdir().expect("tempdir");
    let home = home_dir.path();

    base_cmd(home)
        .args(["add", "note", "--text", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: invalid input: key_required, data_required",
        ));

    base_cmd(home)
        .args(["rm", "not-an-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid input: id_invalid"));
}

#[test]
fn update_cannot_change_type() {
    let home_dir = tempdir().expect("tempdir");
    let home = home_dir.path();
    let id = stdout_of(base_cmd(home).args(["add", "note", "--key", "memo", "--text", "a"]))
        .trim()
        .to_string();

    base_cmd(home)
        .args([
            "update", &id, "password", "--login", "me", "--password", "pw",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("type_immutable"));
}

#[test]
fn sync_requires_login() {
    let home_dir = tempdir().expect("tempdir");

    base_cmd(home_dir.path())
        .args(["sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: not logged in"));
}

#[test]
fn login_then_sync_pushes_and_pulls() {
    let home_dir = tempdir().expect("tempdir");
    let home = home_dir.path();
    let mut server = Server::new();
    let pushed_id = "0190a5b0-0000-7000-8000-000000000001";
    let remote_id = "0190a5b0-0000-7000-8000-000000000002";

    server
        .mock("POST", "/v1/auth/login")
        .match_body(Matcher::PartialJson(json!({ "login": "alice" })))
        .with_status(200)
        .with_body(
            json!({ "access_token": "jwt-token", "expires_at": "2026-12-31T00:00:00Z" })
                .to_string(),
        )
        .create();
    let create = server
        .mock("POST", "/v1/entries")
        .match_header("authorization", "Bearer jwt-token")
        .match_body(Matcher::PartialJson(json!({ "key": "k1", "type": "note" })))
        .with_status(201)
        .with_body(json!({ "id": pushed_id, "version": 1, "key": "k1" }).to_string())
        .create();
    server
        .mock("POST", "/v1/entries/diff")
        .match_header("authorization", "Bearer jwt-token")
        .with_status(200)
        .with_body(
            json!({
                "create_ids": [remote_id],
                "update_ids": [],
                "delete_ids": [],
                "entries": [{
                    "id": remote_id,
                    "key": "from-server",
                    "type": "note",
                    "meta": {},
                    "data": "cmVtb3Rl",
                    "version": 4,
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-02T00:00:00Z"
                }]
            })
            .to_string(),
        )
        .create();

    base_cmd(home)
        .args(["add", "note", "--key", "k1", "--text", "hello"])
        .assert()
        .success();

    base_cmd(home)
        .args(["--addr", &server.url(), "login", "--login", "alice"])
        .env("COFFER_PASSWORD", "correct horse battery")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged in"));

    base_cmd(home)
        .args(["--addr", &server.url(), "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pushed: 1 created"))
        .stdout(predicate::str::contains("pulled: 1 created"));
    create.assert();

    base_cmd(home)
        .args(["show", pushed_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"text\": \"hello\""))
        .stdout(predicate::str::contains("\"global_version\": 1"));
    base_cmd(home)
        .args(["show", remote_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"text\": \"remote\""))
        .stdout(predicate::str::contains("\"version\": 4"));

    base_cmd(home).args(["logout"]).assert().success();
    base_cmd(home)
        .args(["--addr", &server.url(), "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: not logged in"));
}
