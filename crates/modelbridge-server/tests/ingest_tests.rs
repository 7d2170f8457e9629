//! End-to-end tests for the ingestion façade
//!
//! Every remote service is mocked; these tests drive `IngestService` the way
//! the HTTP layer does and check the sequence of remote calls.

mod helpers;

use helpers::*;
use modelbridge_common::{ModelEntry, Scope, TranslationState, Urn};
use modelbridge_server::{
    error::{IngestError, TranslationError},
    ingest::IngestService,
};
use serde_json::json;
use modelbridge_server::config::ApsConfig;
use std::{collections::HashSet, time::Duration};
use wiremock::{
    matchers::{any, body_json, header, method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

const JOB_PATH: &str = "/modelderivative/v2/designdata/job";

fn service(server: &MockServer) -> IngestService {
    IngestService::new(&aps_config(server)).expect("Failed to create ingest service")
}

#[tokio::test]
async fn test_upload_single_file_and_poll() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;
    mount_upload(&server, "box.step").await;

    let urn = Urn::from_object_id(&object_id("box.step"));
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .and(body_json(json!({
            "input": { "urn": urn.as_str() },
            "output": web_viewable_output()
        })))
        .respond_with(job_accepted(urn.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/manifest$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "inprogress",
            "progress": "10% complete"
        })))
        .mount(&server)
        .await;

    let service = service(&server);
    let entry = service
        .upload_and_translate("box.step", b"ISO-10303-21;".to_vec(), None)
        .await
        .unwrap();

    assert_eq!(
        entry,
        ModelEntry {
            name: "box.step".to_string(),
            urn: urn.clone(),
        }
    );

    let status = service.get_status(&entry.urn).await.unwrap();
    assert_eq!(status.state, TranslationState::InProgress);
    assert_eq!(status.progress, "10% complete");
}

#[tokio::test]
async fn test_upload_archive_with_entrypoint() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;
    mount_upload(&server, "assembly.zip").await;

    let urn = Urn::from_object_id(&object_id("assembly.zip"));
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .and(body_json(json!({
            "input": {
                "urn": urn.as_str(),
                "compressedUrn": true,
                "rootFilename": "main.iam"
            },
            "output": web_viewable_output()
        })))
        .respond_with(job_accepted(urn.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    let entry = service(&server)
        .upload_and_translate("assembly.zip", b"PK\x03\x04".to_vec(), Some("main.iam"))
        .await
        .unwrap();

    assert_eq!(entry.name, "assembly.zip");
    assert_eq!(entry.urn, urn);
}

#[tokio::test]
async fn test_entrypoint_ignored_for_single_file() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;
    mount_upload(&server, "gear.ipt").await;

    let urn = Urn::from_object_id(&object_id("gear.ipt"));
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .and(body_json(json!({
            "input": { "urn": urn.as_str() },
            "output": web_viewable_output()
        })))
        .respond_with(job_accepted(urn.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .upload_and_translate("gear.ipt", b"gear".to_vec(), Some("main.iam"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_archive_without_entrypoint_makes_no_network_call() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server)
        .upload_and_translate("Assembly.ZIP", b"PK\x03\x04".to_vec(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Translation(TranslationError::MissingEntrypoint { ref name }) if name == "Assembly.ZIP"
    ));
}

#[tokio::test]
async fn test_empty_name_is_rejected_locally() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server)
        .upload_and_translate(" ", b"data".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::EmptyName));
}

#[tokio::test]
async fn test_failed_upload_never_submits_translation() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;

    Mock::given(method("GET"))
        .and(path(signed_upload_path("box.step")))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server)
        .upload_and_translate("box.step", b"data".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Upload(_)));
}

#[tokio::test]
async fn test_rejected_translation_after_successful_upload() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;
    mount_upload(&server, "box.step").await;

    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unsupported"))
        .mount(&server)
        .await;

    let err = service(&server)
        .upload_and_translate("box.step", b"data".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Translation(TranslationError::Rejected { .. })
    ));
}

#[tokio::test]
async fn test_auth_failure_stops_pipeline() {
    let server = MockServer::start().await;

    token_request(Scope::Internal)
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/oss/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server).list_models().await.unwrap_err();
    assert!(matches!(err, IngestError::Auth(_)));
}

#[tokio::test]
async fn test_list_models_is_stable() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/oss/v2/buckets/{}/objects", BUCKET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "objectKey": "a.step", "objectId": object_id("a.step") },
                { "objectKey": "assembly.zip", "objectId": object_id("assembly.zip") }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = service(&server);
    let first: HashSet<ModelEntry> = service.list_models().await.unwrap().into_iter().collect();
    let second: HashSet<ModelEntry> = service.list_models().await.unwrap().into_iter().collect();

    assert_eq!(first, second);
    assert!(first.contains(&ModelEntry {
        name: "assembly.zip".to_string(),
        urn: Urn::from_object_id(&object_id("assembly.zip")),
    }));
}

#[tokio::test]
async fn test_public_token_never_exposes_internal_credential() {
    let server = MockServer::start().await;

    token_request(Scope::Internal)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(INTERNAL_TOKEN, 3599)))
        .expect(0)
        .mount(&server)
        .await;
    token_request(Scope::Public)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(PUBLIC_TOKEN, 3599)))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let token = service.issue_public_token().await.unwrap();
    let again = service.issue_public_token().await.unwrap();

    assert_eq!(token.access_token, PUBLIC_TOKEN);
    assert_eq!(again.access_token, PUBLIC_TOKEN);
    assert!((3597..=3599).contains(&token.expires_in));
}

#[tokio::test]
async fn test_clones_share_the_token_cache() {
    let server = MockServer::start().await;

    token_request(Scope::Public)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(PUBLIC_TOKEN, 3599)))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let clone = service.clone();

    service.issue_public_token().await.unwrap();
    clone.issue_public_token().await.unwrap();
}

#[tokio::test]
async fn test_status_moves_from_not_found_to_complete() {
    let server = MockServer::start().await;
    mount_token(&server, Scope::Internal, INTERNAL_TOKEN, 3599).await;
    mount_bucket_exists(&server).await;
    mount_upload(&server, "box.step").await;

    let urn = Urn::from_object_id(&object_id("box.step"));
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .respond_with(job_accepted(urn.as_str()))
        .mount(&server)
        .await;

    let manifest_path = format!("/modelderivative/v2/designdata/{}/manifest", urn);
    Mock::given(method("GET"))
        .and(path(manifest_path.clone()))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(manifest_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "pending",
            "progress": "0% complete"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(manifest_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "progress": "complete",
            "derivatives": []
        })))
        .mount(&server)
        .await;

    let service = service(&server);
    let entry = service
        .upload_and_translate("box.step", b"ISO-10303-21;".to_vec(), None)
        .await
        .unwrap();

    let mut states = Vec::new();
    loop {
        let status = service.get_status(&entry.urn).await.unwrap();
        states.push(status.state);
        if status.state.is_terminal() {
            break;
        }
    }

    assert_eq!(
        states,
        vec![
            TranslationState::NotFound,
            TranslationState::Pending,
            TranslationState::Complete,
        ]
    );
}

#[tokio::test]
async fn test_translation_uses_credential_valid_after_slow_upload() {
    let server = MockServer::start().await;

    token_request(Scope::Internal)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("stale", 1)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    token_request(Scope::Internal)
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh", 3599)))
        .expect(1)
        .mount(&server)
        .await;
    mount_bucket_exists(&server).await;

    Mock::given(method("GET"))
        .and(path(signed_upload_path("box.step")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uploadKey": "k",
            "urls": [format!("{}/s3/box.step", server.uri())]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/s3/box.step"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(signed_upload_path("box.step")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": object_id("box.step"),
            "objectKey": "box.step"
        })))
        .mount(&server)
        .await;

    let urn = Urn::from_object_id(&object_id("box.step"));
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(job_accepted(urn.as_str()))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .with_priority(2)
        .expect(0)
        .mount(&server)
        .await;

    let config = ApsConfig {
        token_safety_margin_secs: 0,
        ..aps_config(&server)
    };
    let service = IngestService::new(&config).unwrap();

    let entry = service
        .upload_and_translate("box.step", b"ISO-10303-21;".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(entry.urn, urn);
}
