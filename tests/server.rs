//! HTTP-level tests for the conversion endpoint.
//!
//! The real poppler tools are replaced by small shell scripts so every
//! branch of the request flow (tool failure, swallowed image failure,
//! malformed image names, timeouts) can be exercised deterministically.
//! Each script records its arguments next to itself so tests can assert
//! what was (or was not) invoked.

#![cfg(unix)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use edgequake_pdf2json::{Server, ServerConfig};
use serde_json::Value;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf2json-test-boundary";
const THREE_PAGES: &str = "printf 'A\\fB\\fC'";
const IMAGES_OK: &str = "exit 0";

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Harness {
    tools: TempDir,
    work: TempDir,
    server: Server,
}

impl Harness {
    fn new(text_body: &str, images_body: &str) -> Self {
        Self::with_timeout(text_body, images_body, 10)
    }

    fn with_timeout(text_body: &str, images_body: &str, timeout_secs: u64) -> Self {
        Self::build(text_body, Some(images_body), timeout_secs)
    }

    /// `pdfimages` points at a program that does not exist.
    fn without_pdfimages(text_body: &str) -> Self {
        Self::build(text_body, None, 10)
    }

    fn build(text_body: &str, images_body: Option<&str>, timeout_secs: u64) -> Self {
        let tools = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let pdfimages = match images_body {
            Some(body) => fake_tool(tools.path(), "pdfimages", body),
            None => tools.path().join("missing-pdfimages"),
        };
        let config = ServerConfig::builder()
            .pdftotext_path(fake_tool(tools.path(), "pdftotext", text_body))
            .pdfimages_path(pdfimages)
            .work_dir(work.path())
            .tool_timeout_secs(timeout_secs)
            .build()
            .unwrap();
        Self {
            tools,
            work,
            server: Server::new(config),
        }
    }

    /// Arguments the named fake tool was last invoked with, if it ran.
    fn recorded_args(&self, tool: &str) -> Option<Vec<String>> {
        std::fs::read_to_string(self.tools.path().join(format!("{tool}.args")))
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }

    fn workspaces_left(&self) -> usize {
        std::fs::read_dir(self.work.path()).unwrap().count()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = self.server.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn upload(&self, query: &str) -> (StatusCode, Value) {
        self.upload_to("/", query).await
    }

    async fn upload_to(&self, path: &str, query: &str) -> (StatusCode, Value) {
        let (status, body) = self.send(upload_request(path, query, "file")).await;
        let json = serde_json::from_slice(&body)
            .unwrap_or_else(|e| panic!("non-JSON body ({e}): {}", String::from_utf8_lossy(&body)));
        (status, json)
    }
}

/// Executable shell script standing in for a poppler tool. It records its
/// arguments to `<dir>/<name>.args` before running `body`.
fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}/{name}.args'\n{body}\n",
        dir.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// `pdfimages` stand-in that writes one PNG per page number given.
fn images_for_pages(pages: &[u32]) -> String {
    let mut body = String::from("for last; do :; done\n");
    for (i, page) in pages.iter().enumerate() {
        body.push_str(&format!(
            "printf '\\211PNG\\r\\n\\032\\n' > \"$last-{page}-{i:03}.png\"\n"
        ));
    }
    body
}

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"doc.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(path: &str, query: &str, field: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("{path}{query}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, b"%PDF-1.4 test")))
        .unwrap()
}

fn page_summary(json: &Value) -> Vec<(u64, String, usize)> {
    json["pages"]
        .as_array()
        .expect("pages array")
        .iter()
        .map(|p| {
            (
                p["pageNumber"].as_u64().unwrap(),
                p["text"].as_str().unwrap().to_string(),
                p["images"].as_array().expect("images always present").len(),
            )
        })
        .collect()
}

// ── Success paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn splits_text_into_numbered_pages() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        page_summary(&json),
        vec![
            (1, "A".to_string(), 0),
            (2, "B".to_string(), 0),
            (3, "C".to_string(), 0)
        ]
    );
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn uploaded_bytes_reach_the_tool() {
    let h = Harness::new("cat \"$4\"", IMAGES_OK);
    let (status, json) = h.upload("").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"][0]["text"], "%PDF-1.4 test");
}

#[tokio::test]
async fn page_range_is_forwarded_and_numbers_pages() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?startPage=5&endPage=9").await;

    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<u64> = page_summary(&json).into_iter().map(|p| p.0).collect();
    assert_eq!(numbers, vec![5, 6, 7]);

    let args = h.recorded_args("pdftotext").expect("pdftotext ran");
    assert_eq!(&args[..5], &["-raw", "-f", "5", "-l", "9"]);
    assert!(args[5].ends_with("input.pdf"), "got: {args:?}");
    assert_eq!(args[6], "-");
}

#[tokio::test]
async fn largest_start_page_numbers_without_overflow() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    for start in [u32::MAX, u32::MAX - 1] {
        let (status, json) = h.upload(&format!("?startPage={start}")).await;

        assert_eq!(status, StatusCode::OK, "{start}");
        let numbers: Vec<u64> = page_summary(&json).into_iter().map(|p| p.0).collect();
        let first = u64::from(start);
        assert_eq!(numbers, vec![first, first + 1, first + 2]);
    }
}

#[tokio::test]
async fn start_page_above_u32_is_clamped() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?startPage=99999999999").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"][0]["pageNumber"], u64::from(u32::MAX));
    let args = h.recorded_args("pdftotext").unwrap();
    assert_eq!(&args[..3], &["-raw", "-f", "4294967295"]);
}

#[tokio::test]
async fn out_of_range_bounds_are_clamped() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?startPage=-3&endPage=-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"][0]["pageNumber"], 1);
    let args = h.recorded_args("pdftotext").unwrap();
    assert_eq!(&args[..3], &["-raw", "-f", "1"]);
    assert!(!args.contains(&"-l".to_string()), "got: {args:?}");
}

#[tokio::test]
async fn images_attached_only_to_existing_pages() {
    let h = Harness::new(THREE_PAGES, &images_for_pages(&[2, 2, 7]));
    let (status, json) = h.upload("?images=1").await;

    assert_eq!(status, StatusCode::OK);
    let counts: Vec<usize> = page_summary(&json).into_iter().map(|p| p.2).collect();
    assert_eq!(counts, vec![0, 2, 0]);

    let image = &json["pages"][1]["images"][0];
    assert!(image["data"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(image["mimetype"], "image/png");

    let args = h.recorded_args("pdfimages").expect("pdfimages ran");
    assert_eq!(&args[..4], &["-png", "-p", "-f", "1"]);
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn images_not_extracted_unless_requested() {
    let h = Harness::new(THREE_PAGES, &images_for_pages(&[1]));

    for query in ["", "?images=0", "?images=true"] {
        let (status, json) = h.upload(query).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page_summary(&json).iter().all(|p| p.2 == 0), "{query}");
    }
    assert!(h.recorded_args("pdfimages").is_none());
}

#[tokio::test]
async fn image_tool_failure_is_not_fatal() {
    let h = Harness::new(THREE_PAGES, "echo 'Syntax Error' >&2; exit 1");
    let (status, json) = h.upload("?images=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page_summary(&json).len(), 3);
    assert!(page_summary(&json).iter().all(|p| p.2 == 0));
}

#[tokio::test]
async fn post_to_any_path_converts() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload_to("/convert/doc", "?startPage=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"][0]["pageNumber"], 2);
    assert_eq!(page_summary(&json).len(), 3);
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn health_endpoint() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = h.send(req).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

// ── Validation failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn non_numeric_start_page_is_rejected_before_processing() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?startPage=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({"error": "invalid startPage argument"}));
    assert!(h.recorded_args("pdftotext").is_none());
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn non_numeric_end_page_is_rejected() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?endPage=last").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid endPage argument");
}

#[tokio::test]
async fn undecodable_query_gets_json_error() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, json) = h.upload("?startPage=%zz").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string(), "got: {json}");
    assert!(h.recorded_args("pdftotext").is_none());
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn missing_file_field_is_bad_request_and_cleans_up() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let (status, body) = h.send(upload_request("/", "", "attachment")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("file"), "got: {json}");
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = h.send(req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let req = Request::builder()
            .method(method.clone())
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, body) = h.send(req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert!(body.is_empty(), "{method}");
    }
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn other_methods_on_other_paths_are_not_allowed() {
    let h = Harness::new(THREE_PAGES, IMAGES_OK);
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let req = Request::builder()
            .method(method.clone())
            .uri("/anything/else")
            .body(Body::empty())
            .unwrap();
        let (status, body) = h.send(req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert!(body.is_empty(), "{method}");
    }
    assert!(h.recorded_args("pdftotext").is_none());
    assert_eq!(h.workspaces_left(), 0);
}

// ── Internal failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn text_tool_failure_is_internal_error() {
    let h = Harness::new("echo 'Syntax Error: broken xref' >&2; exit 1", IMAGES_OK);
    let (status, json) = h.upload("").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("pdftotext"), "got: {json}");
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn malformed_image_name_is_internal_error() {
    let h = Harness::new(
        THREE_PAGES,
        "for last; do :; done\nprintf x > \"$last.png\"",
    );
    let (status, json) = h.upload("?images=1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("img.png"), "got: {json}");
    assert_eq!(h.workspaces_left(), 0);
}

#[tokio::test]
async fn image_tool_that_cannot_start_is_internal_error() {
    let h = Harness::without_pdfimages(THREE_PAGES);
    let (status, json) = h.upload("?images=1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("missing-pdfimages"), "got: {json}");
    assert_eq!(h.workspaces_left(), 0);

    // Without images=1 the missing tool is never needed.
    let (status, _) = h.upload("").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn hung_tool_times_out() {
    let h = Harness::with_timeout("exec sleep 30", IMAGES_OK, 1);
    let (status, json) = h.upload("").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("timed out"), "got: {json}");
    assert_eq!(h.workspaces_left(), 0);
}
