//! Test helpers for ModelBridge server integration tests
//!
//! A single `wiremock` server stands in for the identity provider, the bucket
//! API, the signed storage URLs and the translation API. Helpers mount the
//! happy-path responses; tests add expectations on top.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use modelbridge_common::Scope;
use modelbridge_server::{
    aps::{http_client, Credential, Endpoints},
    config::{ApsConfig, Config, CorsConfig, ServerConfig},
};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const CLIENT_ID: &str = "TestClient";
pub const CLIENT_SECRET: &str = "test-secret";
pub const BUCKET: &str = "testclient-basic-app";

pub const INTERNAL_TOKEN: &str = "internal-token";
pub const PUBLIC_TOKEN: &str = "public-token";

/// Remote config pointing every endpoint at the mock server
pub fn aps_config(server: &MockServer) -> ApsConfig {
    ApsConfig {
        base_url: server.uri(),
        http_timeout_secs: 10,
        ..ApsConfig::new(CLIENT_ID, CLIENT_SECRET)
    }
}

pub fn config(server: &MockServer) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            shutdown_timeout_secs: 1,
            static_dir: None,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: false,
        },
        aps: aps_config(server),
    }
}

pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::new(&server.uri()).expect("mock server uri is a valid base")
}

pub fn client(server: &MockServer) -> reqwest::Client {
    http_client(&aps_config(server)).expect("Failed to build HTTP client")
}

/// A credential that stays valid for the whole test
pub fn internal_credential() -> Credential {
    Credential::new(INTERNAL_TOKEN, Utc::now() + Duration::hours(1), Scope::Internal)
}

pub fn object_id(key: &str) -> String {
    format!("urn:adsk.objects:os.object:{}/{}", BUCKET, key)
}

pub fn token_body(access_token: &str, expires_in: i64) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

/// Token endpoint matcher for one scope's permission string
pub fn token_request(scope: Scope) -> wiremock::MockBuilder {
    let marker = match scope {
        Scope::Internal => "data%3Awrite",
        Scope::Public => "viewables%3Aread",
    };
    Mock::given(method("POST"))
        .and(path("/authentication/v2/token"))
        .and(body_string_contains(marker))
}

pub async fn mount_token(server: &MockServer, scope: Scope, access_token: &str, expires_in: i64) {
    token_request(scope)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token, expires_in)))
        .mount(server)
        .await;
}

pub async fn mount_bucket_exists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/oss/v2/buckets/{}/details", BUCKET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bucketKey": BUCKET,
            "policyKey": "persistent"
        })))
        .mount(server)
        .await;
}

pub fn signed_upload_path(key: &str) -> String {
    format!("/oss/v2/buckets/{}/objects/{}/signeds3upload", BUCKET, key)
}

/// Mount the three steps of a signed upload for `key`
pub async fn mount_upload(server: &MockServer, key: &str) {
    Mock::given(method("GET"))
        .and(path(signed_upload_path(key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uploadKey": format!("upload-key-{}", key),
            "urls": [format!("{}/s3/{}", server.uri(), key)]
        })))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/s3/{}", key)))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(signed_upload_path(key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bucketKey": BUCKET,
            "objectId": object_id(key),
            "objectKey": key,
            "size": 13,
            "location": format!("https://developer.api.autodesk.com/oss/v2/buckets/{}/objects/{}", BUCKET, key)
        })))
        .mount(server)
        .await;
}

pub fn job_accepted(urn: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": "created",
        "urn": urn,
        "acceptedJobs": { "output": { "formats": [{ "type": "svf2", "views": ["2d", "3d"] }] } }
    }))
}

pub fn web_viewable_output() -> serde_json::Value {
    json!({ "formats": [{ "type": "svf2", "views": ["2d", "3d"] }] })
}
