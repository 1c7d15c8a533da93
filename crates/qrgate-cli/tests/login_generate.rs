//! Account and generate commands against a mock auth server.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn seed_session(home: &Path) {
    let session = serde_json::json!({
        "access_token": "access-token-ada-0123456789",
        "refresh_token": "refresh-ada",
        "expires_at": now_secs() + 3600,
        "user": { "id": "ada", "email": "ada@example.com" }
    });
    fs::write(home.join("session.json"), session.to_string()).unwrap();
}

fn qrgate(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("qrgate");
    cmd.env("QRGATE_HOME", home.path())
        .env("QRGATE_AUTH_URL", server.uri())
        .env("QRGATE_ANON_KEY", "anon-key")
        .env_remove("QRGATE_PASSWORD");
    cmd
}

/// Width and height from the PNG IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (width, height)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-token-ada-0123456789",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-ada",
            "user": { "id": "ada", "email": "ada@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    qrgate(&home, &server)
        .args(["login", "--email", "ada@example.com", "--password", "correct horse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully signed in!"));

    assert!(home.path().join("session.json").exists());

    qrgate(&home, &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as ada@example.com"))
        .stdout(predicate::str::contains("0123456789").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_reads_password_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    qrgate(&home, &server)
        .args(["login", "--email", "bad@example.com"])
        .write_stdin("wrongpw\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password: "))
        .stderr(predicate::str::contains("Invalid login credentials"));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_when_already_signed_in() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .args(["login", "--email", "ada@example.com", "--password", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already signed in as ada@example.com"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out successfully"));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_requires_session() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();

    qrgate(&home, &server)
        .args(["generate", "hello", "--out"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));

    assert!(!out.path().join("qrcode.png").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_writes_sized_png() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .args(["generate", "hello", "--size", "300", "--level", "H", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(300x300)"));

    let png = fs::read(out.path().join("qrcode.png")).unwrap();
    assert_eq!(png_dimensions(&png), (300, 300));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_clamps_size_and_prints_data_uri() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .args(["generate", "hello", "--size", "-20", "--data-uri", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(128x128)"))
        .stdout(predicate::str::contains("data:image/png;base64,"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_rejects_empty_content() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .args(["generate", "", "--out"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("content is empty"));

    assert!(!out.path().join("qrcode.png").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_reports_content_too_long() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_session(home.path());

    qrgate(&home, &server)
        .args(["generate", &"x".repeat(4000), "--level", "H", "--out"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to render QR code"));

    assert!(!out.path().join("qrcode.png").exists());
}
