//! Integration tests for the web server.
//!
//! These tests bind a real socket and drive the API with an HTTP client,
//! covering the full upload, list and download cycle.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use chute::web::WebServer;
use chute::Config;
use serde_json::Value;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.storage.path = dir.path().join("blobs").to_string_lossy().into_owned();
    config
}

async fn start_server(config: Config) -> SocketAddr {
    let server = WebServer::new(&config).expect("Failed to create server");
    server.run_with_addr().await.expect("Failed to bind server")
}

/// Count regular files under a directory, recursively.
fn count_files(path: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };

    let mut count = 0;
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if entry_path.is_dir() {
            count += count_files(&entry_path);
        } else {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(test_config(&dir)).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(test_config(&dir)).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{}/api-docs/openapi.json", addr))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());

    let doc: Value = resp.json().await.unwrap();
    assert!(doc["paths"]["/api/upload"].is_object());
    assert!(doc["paths"]["/api/info/{code}"].is_object());
}

#[tokio::test]
async fn test_full_transfer_cycle() {
    let dir = TempDir::new().unwrap();
    let addr = start_server(test_config(&dir)).await;

    let client = reqwest::Client::new();

    // Upload two files
    let notes = b"meeting notes".to_vec();
    let image = vec![0xFFu8, 0xD8, 0xFF, 0xE0];
    let form = reqwest::multipart::Form::new()
        .part(
            "files",
            reqwest::multipart::Part::bytes(notes.clone())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        )
        .part(
            "files",
            reqwest::multipart::Part::bytes(image.clone())
                .file_name("scan.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        );

    let resp = client
        .post(format!("http://{}/api/upload", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 4);

    // Fetch the listing under the download path
    let resp = client
        .get(format!("http://{}/api/download/{}", addr, code))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let listing: Value = resp.json().await.unwrap();
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);

    // Download each file and compare the bytes
    let expected: [(&str, &[u8]); 2] = [("notes.txt", &notes), ("scan.jpg", &image)];
    for (entry, (name, content)) in files.iter().zip(expected) {
        assert_eq!(entry["originalname"], name);

        let file_id = entry["filename"].as_str().unwrap();
        let resp = client
            .get(format!("http://{}/api/download/{}/{}", addr, code, file_id))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.bytes().await.unwrap().as_ref(), content);
    }
}

#[tokio::test]
async fn test_reaper_removes_expired_groups_and_blobs() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.transfer.ttl_secs = 1;
    config.transfer.reap_interval_secs = 1;
    config.transfer.orphan_grace_secs = 3600;

    let addr = start_server(config).await;
    let blob_dir = dir.path().join("blobs");

    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "files",
        reqwest::multipart::Part::bytes(b"short lived".to_vec())
            .file_name("brief.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let resp = client
        .post(format!("http://{}/api/upload", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let code = resp.json::<Value>().await.unwrap()["code"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(count_files(&blob_dir), 1);

    // TTL is 1s and the reaper runs every second; after 2.5s the group
    // and its blob must both be gone
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(count_files(&blob_dir), 0);

    let resp = client
        .get(format!("http://{}/api/info/{}", addr, code))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
