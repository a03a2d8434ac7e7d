// Shared fixtures for the wiremock-backed tests.
//
// The client is blocking, so tests stay synchronous and only use a small
// tokio runtime to start the stub server and mount mocks on it.

use std::path::{Path, PathBuf};

use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::AdaClient;
use crate::config::AdaConfig;

pub const SESSION_COOKIE: &str = "sessionid=abc123";

pub fn stub_server() -> (Runtime, MockServer) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = rt.block_on(MockServer::start());
    (rt, server)
}

pub fn client_for(server: &MockServer) -> AdaClient {
    let config = AdaConfig::new(server.uri(), "me@example.com", "secret").unwrap();
    AdaClient::new(config).unwrap()
}

/// Login endpoint answering `status` and setting the session cookie.
pub fn login_mock(status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/v1/users/login"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("set-cookie", format!("{SESSION_COOKIE}; Path=/").as_str())
                .set_body_json(json!({"email": "me@example.com"})),
        )
}

/// Upload endpoint that only answers requests carrying the session cookie.
pub fn upload_mock(status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/v2/upload/"))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "id": 42,
            "file_name": "TestFile.csv",
            "file_url": "http://x/42"
        })))
}

pub fn write_upload_file(dir: &Path) -> PathBuf {
    let path = dir.join("TestFile.csv");
    std::fs::write(&path, "first_name,last_name,email\nAda,Lovelace,ada@example.com\n").unwrap();
    path
}
