//! Translation jobs and their status
//!
//! [`TranslationSubmitter`] asks the service to convert an uploaded object
//! into web-viewable 2D and 3D views. [`StatusResolver`] reads the job
//! manifest back and normalizes it. A manifest that does not exist yet is
//! reported as [`TranslationState::NotFound`], not as an error, so a caller
//! polling right after submission can simply poll again.

use modelbridge_common::{
    archive::{is_archive, normalize_entrypoint},
    TranslationState, TranslationStatus, Urn,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{read_json, Credential, Endpoints};
use crate::error::{RemoteError, StatusQueryError, TranslationError};

/// Header selecting the region a job runs in
const REGION_HEADER: &str = "x-ads-region";

/// One requested output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub views: Vec<String>,
}

impl OutputFormat {
    /// The fixed output set: streamable 2D and 3D views
    pub fn web_viewable() -> Vec<OutputFormat> {
        vec![OutputFormat {
            kind: "svf2".to_string(),
            views: vec!["2d".to_string(), "3d".to_string()],
        }]
    }
}

/// Write-once record of a submitted job; the remote service owns what happens next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub urn: Urn,
    pub root_filename: Option<String>,
    pub output_formats: Vec<OutputFormat>,
}

impl TranslationJob {
    fn payload(&self) -> JobPayload<'_> {
        JobPayload {
            input: JobInput {
                urn: self.urn.as_str(),
                compressed_urn: self.root_filename.as_ref().map(|_| true),
                root_filename: self.root_filename.as_deref(),
            },
            output: JobOutput {
                formats: &self.output_formats,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct JobPayload<'a> {
    input: JobInput<'a>,
    output: JobOutput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobInput<'a> {
    urn: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    compressed_urn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_filename: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JobOutput<'a> {
    formats: &'a [OutputFormat],
}

/// Decide the root filename for an upload called `name`.
///
/// Archives require one (blank counts as missing); for anything else a
/// supplied value is ignored. Never touches the network.
pub fn root_filename_for(
    name: &str,
    entrypoint: Option<&str>,
) -> Result<Option<String>, TranslationError> {
    if !is_archive(name) {
        return Ok(None);
    }

    normalize_entrypoint(entrypoint)
        .map(|e| Some(e.to_string()))
        .ok_or_else(|| TranslationError::MissingEntrypoint {
            name: name.to_string(),
        })
}

/// Starts conversion jobs
pub struct TranslationSubmitter {
    http: Client,
    endpoints: Endpoints,
    region: String,
}

impl TranslationSubmitter {
    pub fn new(http: Client, endpoints: Endpoints, region: impl Into<String>) -> Self {
        Self {
            http,
            endpoints,
            region: region.into(),
        }
    }

    /// Request conversion of `object_id`.
    ///
    /// With a root filename the input is sent as a compressed archive whose
    /// primary document is that file. Without one it is a single design file,
    /// unless the object id names an archive, which fails before any request.
    #[instrument(skip(self, credential))]
    pub async fn submit(
        &self,
        credential: &Credential,
        object_id: &str,
        root_filename: Option<&str>,
    ) -> Result<TranslationJob, TranslationError> {
        let root_filename = match normalize_entrypoint(root_filename) {
            Some(root) => Some(root.to_string()),
            None if is_archive(object_id) => {
                return Err(TranslationError::MissingEntrypoint {
                    name: object_id.to_string(),
                })
            },
            None => None,
        };

        let job = TranslationJob {
            urn: Urn::from_object_id(object_id),
            root_filename,
            output_formats: OutputFormat::web_viewable(),
        };

        self.send(credential, &job)
            .await
            .map_err(|source| TranslationError::Rejected {
                object_id: object_id.to_string(),
                source,
            })?;

        info!(urn = %job.urn, compressed = job.root_filename.is_some(), "Translation job submitted");
        Ok(job)
    }

    async fn send(&self, credential: &Credential, job: &TranslationJob) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.endpoints.translation_job())
            .bearer_auth(credential.access_token())
            .header(REGION_HEADER, &self.region)
            .json(&job.payload())
            .send()
            .await?;

        let accepted: JobAccepted = read_json(response).await?;
        debug!(result = %accepted.result, remote_urn = ?accepted.urn, "Job accepted");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct JobAccepted {
    #[serde(default)]
    result: String,
    urn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    status: String,
    #[serde(default)]
    progress: String,
    #[serde(default)]
    messages: Vec<ManifestMessage>,
    #[serde(default)]
    derivatives: Vec<ManifestNode>,
}

#[derive(Debug, Deserialize)]
struct ManifestNode {
    #[serde(default)]
    messages: Vec<ManifestMessage>,
    #[serde(default)]
    children: Vec<ManifestNode>,
}

#[derive(Debug, Deserialize)]
struct ManifestMessage {
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
    /// A string or an array of strings, depending on the translator
    message: Option<Value>,
}

impl ManifestMessage {
    fn render(&self) -> Option<String> {
        let text = match &self.message {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(parts)) => Some(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => None,
        }
        .filter(|t| !t.is_empty())
        .or_else(|| self.code.clone())?;

        Some(match &self.kind {
            Some(kind) => format!("{}: {}", kind, text),
            None => text,
        })
    }
}

impl ManifestNode {
    fn collect_messages(&self, out: &mut Vec<String>) {
        out.extend(self.messages.iter().filter_map(ManifestMessage::render));
        for child in &self.children {
            child.collect_messages(out);
        }
    }
}

impl Manifest {
    fn into_status(self) -> Result<TranslationStatus, RemoteError> {
        let state = map_state(&self.status).ok_or_else(|| {
            RemoteError::InvalidResponse(format!("unknown manifest status '{}'", self.status))
        })?;

        let mut messages: Vec<String> = self.messages.iter().filter_map(ManifestMessage::render).collect();
        for derivative in &self.derivatives {
            derivative.collect_messages(&mut messages);
        }

        Ok(TranslationStatus {
            state,
            progress: self.progress,
            messages: Some(messages),
        })
    }
}

/// Map the service's manifest status onto the normalized states
pub fn map_state(remote: &str) -> Option<TranslationState> {
    match remote {
        "pending" => Some(TranslationState::Pending),
        "inprogress" => Some(TranslationState::InProgress),
        "success" => Some(TranslationState::Complete),
        "failed" | "timeout" => Some(TranslationState::Failed),
        _ => None,
    }
}

/// Reads translation manifests
pub struct StatusResolver {
    http: Client,
    endpoints: Endpoints,
}

impl StatusResolver {
    pub fn new(http: Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// Current status of the job targeting `urn`
    #[instrument(skip(self, credential, urn), fields(urn = %urn))]
    pub async fn get_status(
        &self,
        credential: &Credential,
        urn: &Urn,
    ) -> Result<TranslationStatus, StatusQueryError> {
        let status = self
            .query(credential, urn)
            .await
            .map_err(|source| StatusQueryError {
                urn: urn.to_string(),
                source,
            })?;

        debug!(
            state = %status.state,
            progress = %status.progress,
            terminal = status.state.is_terminal(),
            "Resolved translation status"
        );
        Ok(status)
    }

    async fn query(&self, credential: &Credential, urn: &Urn) -> Result<TranslationStatus, RemoteError> {
        let response = self
            .http
            .get(self.endpoints.manifest(urn.as_str()))
            .bearer_auth(credential.access_token())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(TranslationStatus::not_found());
        }

        let manifest: Manifest = read_json(response).await?;
        manifest.into_status()
    }
}
