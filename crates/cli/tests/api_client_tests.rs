#[path = "../src/api_client.rs"]
#[allow(dead_code)] // Some methods are used by the binary but not by tests
mod api_client;

use api_client::ApiClient;
use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

const VIEWER_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="folio-viewer"
     data-filename="report.pdf"
     data-token="0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
     data-secret="AAEC+w=="
     data-entitlement="preview"
     data-content-url="/v1/documents/content"></div>
</body>
</html>"#;

#[tokio::test]
async fn api_client_view_and_fetch() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let token = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    let view = server.mock(|when, then| {
        when.method(GET)
            .path("/view/report.pdf")
            .header("x-folio-subject", "42")
            .header("x-folio-roles", "subscriber,reader");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(VIEWER_HTML);
    });

    let content = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/documents/content")
            .query_param("token", token)
            .header("x-folio-subject", "42");
        then.status(200)
            .header("content-type", "application/octet-stream")
            .header("x-folio-entitlement", "preview")
            .body([1u8, 2, 3, 4]);
    });

    let client = ApiClient::new(&server.base_url())
        .unwrap()
        .with_subject(Some(42), vec!["subscriber".to_string(), "reader".to_string()]);

    let session = client.view("report.pdf").await.unwrap();
    assert_eq!(session.filename, "report.pdf");
    assert_eq!(session.token, token);
    assert_eq!(session.secret, "AAEC+w==");
    assert_eq!(session.entitlement, "preview");

    let fetched = client
        .fetch_content_at(&session.content_url, &session.token)
        .await
        .unwrap();
    assert_eq!(fetched.bytes, vec![1, 2, 3, 4]);
    assert_eq!(fetched.entitlement.as_deref(), Some("preview"));

    view.assert();
    content.assert();
}

#[tokio::test]
async fn api_client_anonymous_sends_no_session_headers() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v1/health").matches(|req| {
            req.headers.as_ref().is_none_or(|headers| {
                headers.iter().all(|(name, _)| {
                    !name.eq_ignore_ascii_case("x-folio-subject")
                        && !name.eq_ignore_ascii_case("x-folio-roles")
                })
            })
        });
        then.status(200).json_body(json!({
            "status": "ok",
            "version": "0.1.0",
            "active_tokens": 3,
            "cached_derivatives": 1
        }));
    });

    let client = ApiClient::new(&server.base_url()).unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.active_tokens, 3);
    assert_eq!(health.cached_derivatives, 1);
    mock.assert();
}

#[tokio::test]
async fn api_client_custom_session_headers() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/files/notes.txt")
            .header("x-user", "7")
            .header("x-groups", "admin");
        then.status(200).body("hello");
    });

    let client = ApiClient::new(&server.base_url())
        .unwrap()
        .with_subject(Some(7), vec!["admin".to_string()])
        .with_headers("x-user", "x-groups");
    let data = client.get_file("notes.txt").await.unwrap();
    assert_eq!(data, b"hello");
    mock.assert();
}

#[tokio::test]
async fn api_client_error_paths() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET)
            .path("/v1/documents/content")
            .query_param("token", "spent");
        then.status(403).json_body(json!({
            "code": "forbidden",
            "message": "invalid or expired token"
        }));
    });

    server.mock(|when, then| {
        when.method(GET).path("/view/absent.pdf");
        then.status(404).json_body(json!({
            "code": "not_found",
            "message": "document not found"
        }));
    });

    server.mock(|when, then| {
        when.method(GET).path("/files/secret.pdf");
        then.status(502).body("bad gateway");
    });

    let client = ApiClient::new(&server.base_url()).unwrap();

    let err = client.fetch_content("spent").await.unwrap_err().to_string();
    assert!(err.contains("403"), "{err}");
    assert!(err.contains("forbidden"), "{err}");

    let err = client.view("absent.pdf").await.unwrap_err().to_string();
    assert!(err.contains("not_found"), "{err}");
    assert!(err.contains("document not found"), "{err}");

    let err = client.get_file("secret.pdf").await.unwrap_err().to_string();
    assert!(err.contains("502"), "{err}");
    assert!(err.contains("bad gateway"), "{err}");
}

#[tokio::test]
async fn api_client_viewer_without_attributes_is_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/view/report.pdf");
        then.status(200).body("<html><body>maintenance</body></html>");
    });

    let client = ApiClient::new(&server.base_url()).unwrap();
    let err = client.view("report.pdf").await.unwrap_err().to_string();
    assert!(err.contains("data-"), "{err}");
}

#[test]
fn api_client_rejects_invalid_url() {
    assert!(ApiClient::new("not a url").is_err());
}
