// CampusHub
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Full HTTP round trips against a live server

use std::net::SocketAddr;
use std::path::PathBuf;

use campus_api::config::{CacheBackendKind, Config};
use campus_api::server::ApiServer;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpStream;

const POLICY: &str = "\
p, *, /api/auth/me, GET
p, student, /api/courses, GET
p, teacher, /api/courses, GET
p, teacher, /api/courses, POST
";

fn test_config(policy_path: PathBuf) -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        jwt_secret: "http-test-secret".to_string(),
        policy_path,
        token_ttl_secs: 3600,
        cache_backend: CacheBackendKind::Memory,
        cache_ttl_secs: 300,
        query_timeout_secs: 5,
    }
}

async fn start_server() -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let policy_path = dir.path().join("policy.csv");
    std::fs::write(&policy_path, POLICY).unwrap();

    let server = ApiServer::new(test_config(policy_path)).await.unwrap();
    let addr = server.bind_address();
    tokio::spawn(server.run());

    (addr, dir)
}

async fn send(addr: SocketAddr, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let io = TokioIo::new(stream);
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io).await.unwrap();
    tokio::spawn(connection);

    let mut builder = Request::builder().method(method).uri(path).header("host", "localhost").header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let request = builder.body(Full::new(Bytes::from(payload))).unwrap();

    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, value)
}

async fn register_and_login(addr: SocketAddr, username: &str) -> String {
    let (status, _) = send(
        addr,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": username, "email": format!("{}@campus.edu", username), "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        addr,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": username, "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");

    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_reachable_without_a_token() {
    let (addr, _policy_dir) = start_server().await;

    let (status, body) = send(addr, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_paths_reject_missing_and_bad_tokens() {
    let (addr, _policy_dir) = start_server().await;

    let (status, body) = send(addr, Method::GET, "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = send(addr, Method::GET, "/api/courses", Some("not-a-real-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registered_student_can_read_but_not_create_courses() {
    let (addr, _policy_dir) = start_server().await;
    let token = register_and_login(addr, "ada").await;

    let (status, body) = send(addr, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["role"], "student");

    let (status, body) = send(addr, Method::GET, "/api/courses?page=1&page_size=20", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    // No rule grants students POST /api/courses.
    let (status, body) = send(addr, Method::POST, "/api/courses", Some(&token), Some(json!({"name": "algebra", "capacity": 30}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn unknown_routes_stay_behind_the_gate() {
    let (addr, _policy_dir) = start_server().await;
    let token = register_and_login(addr, "grace").await;

    // Default-deny: a path no rule grants is forbidden, and the client
    // cannot tell whether the resource exists.
    let (status, _) = send(addr, Method::GET, "/api/schools", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(addr, Method::GET, "/api/schools", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (addr, _policy_dir) = start_server().await;
    register_and_login(addr, "alan").await;

    let (status, body) = send(
        addr,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "alan", "email": "alan2@campus.edu", "password": "s3cret"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (addr, _policy_dir) = start_server().await;
    register_and_login(addr, "edsger").await;

    let (status, _) = send(
        addr,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "edsger", "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
