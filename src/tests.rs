//! Integration tests for the advisor core backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, LogFormat};
use crate::db::{init_database, Repository};
use crate::storage::FilesystemStore;
use crate::{create_router, AppState};

const TOKEN: &str = "test-bridge-token";
const DOC_ID: &str = "0b6f1f4e-3c2a-4d8e-9a51-6f0c2b7d1e11";
const QA_ID: &str = "7d2c9a10-5e4b-4f3a-8c6d-2a1b0e9f8c77";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_token(Some(TOKEN.to_string())).await
    }

    async fn with_token(token: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let storage_path = temp_dir.path().join("objects");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize object store
        let storage = Arc::new(
            FilesystemStore::open(&storage_path, "test-bucket")
                .await
                .expect("Failed to init storage"),
        );

        // Create config
        let config = Config {
            project_name: "advisor-test".to_string(),
            env: "test".to_string(),
            bridge_token: token,
            db_path,
            storage_path,
            storage_bucket: "test-bucket".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            max_body_bytes: 1024 * 1024,
        };

        let state = AppState {
            repo,
            storage,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn import(&self, batch: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/sync/import"))
            .header("x-bridge-token", TOKEN)
            .json(batch)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

fn sample_batch() -> Value {
    json!({
        "batch_ts": "2024-05-01T10:00:00Z",
        "documents": [{
            "id": DOC_ID,
            "title": "Law on Enterprises",
            "doc_type": "law",
            "jurisdiction": "VN",
            "authority": "National Assembly",
            "effective_date": "2021-01-01",
            "legal_units": [
                {"unit_type": "article", "num_label": "1", "text_plain": "Scope", "order_index": 1},
                {"unit_type": "article", "num_label": "2", "text_plain": "Subjects", "order_index": 2}
            ]
        }],
        "qa_entries": [{
            "id": QA_ID,
            "question": "Who must register?",
            "answer": "Every enterprise.",
            "topic_tags": ["registration", "enterprise"],
            "quality_score": 0.9
        }]
    })
}

// ==================== SERVICE ====================

#[tokio::test]
async fn test_root_reports_service_info() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Welcome to advisor-test");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"], "test");
    assert_eq!(body["db"], true);
    assert_eq!(body["object_storage"], true);
}

// ==================== AUTH ====================

#[tokio::test]
async fn test_sync_without_token_header_is_unauthorized() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/sync/import"))
        .json(&sample_batch())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Nothing was stored
    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 0);
}

#[tokio::test]
async fn test_sync_with_wrong_token_is_forbidden() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/sync/import"))
        .header("x-bridge-token", "wrong-token")
        .json(&sample_batch())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 0);
    assert_eq!(stats["qa_entries"]["total"], 0);
}

#[tokio::test]
async fn test_sync_disabled_without_configured_token() {
    let fixture = TestFixture::with_token(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/sync/watermark"))
        .header("x-bridge-token", "anything")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "SYNC_DISABLED");

    // Public routes still work
    let (status, _) = fixture.get_json("/health").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let fixture = TestFixture::new().await;

    let (status, _) = fixture.get_json("/stats").await;
    assert_eq!(status, 200);
}

// ==================== IMPORT ====================

#[tokio::test]
async fn test_import_then_read_back() {
    let fixture = TestFixture::new().await;

    let resp = fixture.import(&sample_batch()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["imported"]["documents"], 1);
    assert_eq!(body["imported"]["qa_entries"], 1);
    assert_eq!(body["batch_ts"], "2024-05-01T10:00:00Z");

    let (status, doc) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(status, 200);
    assert_eq!(doc["id"], DOC_ID);
    assert_eq!(doc["title"], "Law on Enterprises");
    assert_eq!(doc["doc_type"], "law");
    assert_eq!(doc["status"], "published");
    assert_eq!(doc["effective_date"], "2021-01-01");
    assert_eq!(doc["legal_units"].as_array().unwrap().len(), 2);
    assert_eq!(doc["legal_units"][0]["num_label"], "1");
    assert_eq!(doc["legal_units"][1]["order_index"], 2);

    let (status, qa) = fixture.get_json(&format!("/qa-entries/{}", QA_ID)).await;
    assert_eq!(status, 200);
    assert_eq!(qa["question"], "Who must register?");
    assert_eq!(qa["topic_tags"], json!(["enterprise", "registration"]));
    assert_eq!(qa["licensing"], "allowed");
    assert_eq!(qa["pii_status"], "clean");
    assert_eq!(qa["moderation_status"], "published");

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 1);
    assert_eq!(stats["documents"]["by_status"]["published"], 1);
    assert_eq!(stats["documents"]["by_type"]["law"], 1);
    assert_eq!(stats["qa_entries"]["total"], 1);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let fixture = TestFixture::new().await;
    let batch = sample_batch();

    assert_eq!(fixture.import(&batch).await.status(), 200);
    let (_, before) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;

    let resp = fixture.import(&batch).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["imported"]["documents"], 1);

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 1);
    assert_eq!(stats["qa_entries"]["total"], 1);

    let (_, after) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(before["legal_units"], after["legal_units"]);
    assert_eq!(before["created_at"], after["created_at"]);
}

#[tokio::test]
async fn test_reimport_updates_in_place() {
    let fixture = TestFixture::new().await;
    assert_eq!(fixture.import(&sample_batch()).await.status(), 200);

    let mut batch = sample_batch();
    batch["documents"][0]["title"] = json!("Law on Enterprises (amended)");
    batch["documents"][0]["doc_type"] = json!("regulation");
    batch["documents"][0]["amended_date"] = json!("2023-06-15");
    batch["qa_entries"][0]["answer"] = json!("Every enterprise, within 15 days.");
    batch["qa_entries"][0]["topic_tags"] = json!(["deadline"]);
    assert_eq!(fixture.import(&batch).await.status(), 200);

    let (_, doc) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(doc["title"], "Law on Enterprises (amended)");
    assert_eq!(doc["doc_type"], "regulation");
    assert_eq!(doc["amended_date"], "2023-06-15");

    let (_, qa) = fixture.get_json(&format!("/qa-entries/{}", QA_ID)).await;
    assert_eq!(qa["answer"], "Every enterprise, within 15 days.");
    assert_eq!(qa["topic_tags"], json!(["deadline"]));

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 1);
    assert_eq!(stats["documents"]["by_type"]["regulation"], 1);
    assert!(stats["documents"]["by_type"].get("law").is_none());
}

#[tokio::test]
async fn test_legal_units_replaced_or_kept() {
    let fixture = TestFixture::new().await;
    assert_eq!(fixture.import(&sample_batch()).await.status(), 200);

    // A new list replaces the old one entirely
    let mut batch = sample_batch();
    batch["documents"][0]["legal_units"] =
        json!([{"unit_type": "chapter", "num_label": "I", "heading": "General"}]);
    assert_eq!(fixture.import(&batch).await.status(), 200);
    let (_, doc) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    let units = doc["legal_units"].as_array().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0]["unit_type"], "chapter");
    assert_eq!(units[0]["order_index"], Value::Null);

    // Omitting the list leaves stored units alone
    let mut batch = sample_batch();
    batch["documents"][0]
        .as_object_mut()
        .unwrap()
        .remove("legal_units");
    assert_eq!(fixture.import(&batch).await.status(), 200);
    let (_, doc) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(doc["legal_units"].as_array().unwrap().len(), 1);

    // An explicit empty list clears them
    let mut batch = sample_batch();
    batch["documents"][0]["legal_units"] = json!([]);
    assert_eq!(fixture.import(&batch).await.status(), 200);
    let (_, doc) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert!(doc["legal_units"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_item_rejects_whole_batch() {
    let fixture = TestFixture::new().await;

    let mut batch = sample_batch();
    batch["documents"]
        .as_array_mut()
        .unwrap()
        .push(json!({"id": "not-a-uuid", "title": "Broken", "doc_type": "law"}));

    let resp = fixture.import(&batch).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 0);
    assert_eq!(stats["qa_entries"]["total"], 0);

    let (status, _) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_unknown_enum_value_rejects_batch() {
    let fixture = TestFixture::new().await;

    let mut batch = sample_batch();
    batch["documents"][0]["doc_type"] = json!("decree");

    let resp = fixture.import(&batch).await;
    assert_eq!(resp.status(), 400);

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["qa_entries"]["total"], 0);
}

#[tokio::test]
async fn test_blank_required_field_rejects_batch() {
    let fixture = TestFixture::new().await;

    let mut batch = sample_batch();
    batch["qa_entries"][0]["question"] = json!("   ");

    let resp = fixture.import(&batch).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, stats) = fixture.get_json("/stats").await;
    assert_eq!(stats["documents"]["total"], 0);
}

// ==================== WATERMARK ====================

#[tokio::test]
async fn test_watermark_tracks_imports() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/sync/watermark"))
        .header("x-bridge-token", TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, Value::Null);

    assert_eq!(fixture.import(&sample_batch()).await.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/sync/watermark"))
        .header("x-bridge-token", TOKEN)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let first = chrono::DateTime::parse_from_rfc3339(body["last_imported_at"].as_str().unwrap())
        .unwrap();

    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    assert_eq!(fixture.import(&sample_batch()).await.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/sync/watermark"))
        .header("x-bridge-token", TOKEN)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let second = chrono::DateTime::parse_from_rfc3339(body["last_imported_at"].as_str().unwrap())
        .unwrap();
    assert!(second > first);
}

// ==================== FILES ====================

#[tokio::test]
async fn test_upload_and_download_file() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/sync/files/laws/2020/enterprises.pdf"))
        .header("x-bridge-token", TOKEN)
        .body(b"%PDF-1.7 sample".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["key"], "laws/2020/enterprises.pdf");
    assert_eq!(body["file_s3"], "s3://test-bucket/laws/2020/enterprises.pdf");
    assert_eq!(body["size"], 15);

    let resp = fixture
        .client
        .get(fixture.url("/files/laws/2020/enterprises.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "application/octet-stream"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.7 sample");
}

#[tokio::test]
async fn test_upload_requires_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/sync/files/notes.txt"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let (status, body) = fixture.get_json("/files/notes.txt").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ==================== NOT FOUND ====================

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json(&format!("/documents/{}", DOC_ID)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = fixture.get_json(&format!("/qa-entries/{}", QA_ID)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_non_uuid_path_is_validation_error() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/documents/not-a-uuid").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
