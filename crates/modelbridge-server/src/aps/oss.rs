//! Object store client
//!
//! Uploads design files into a single bucket and lists what is there. The
//! bucket is created on first use if it does not exist yet. Uploading the same
//! name twice is not deduplicated locally; whatever object the service reports
//! back is returned as-is.

use modelbridge_common::StoredObject;
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::{ensure_success, read_json, Credential, Endpoints};
use crate::error::{RemoteError, UploadError};

/// Page size requested when listing objects
pub const LIST_PAGE_SIZE: u32 = 64;

/// Retention policy for a newly created bucket
pub const BUCKET_POLICY: &str = "persistent";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUpload {
    upload_key: String,
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDetails {
    object_key: String,
    object_id: String,
}

impl From<ObjectDetails> for StoredObject {
    fn from(details: ObjectDetails) -> Self {
        StoredObject::new(details.object_key, details.object_id)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectPage {
    #[serde(default)]
    items: Vec<ObjectDetails>,
    next: Option<String>,
}

impl ObjectPage {
    /// `startAt` cursor carried by the `next` link, if any
    fn next_cursor(&self) -> Option<String> {
        let next = reqwest::Url::parse(self.next.as_deref()?).ok()?;
        next.query_pairs()
            .find(|(name, _)| name == "startAt")
            .map(|(_, value)| value.into_owned())
    }
}

/// Bucket-backed store for uploaded design files
pub struct ObjectStore {
    http: Client,
    endpoints: Endpoints,
    bucket: String,
    bucket_ready: OnceCell<()>,
}

impl ObjectStore {
    pub fn new(http: Client, endpoints: Endpoints, bucket: impl Into<String>) -> Self {
        Self {
            http,
            endpoints,
            bucket: bucket.into(),
            bucket_ready: OnceCell::new(),
        }
    }

    /// Make sure the bucket exists; remembered after the first success
    async fn ensure_bucket(&self, credential: &Credential) -> Result<(), UploadError> {
        self.bucket_ready
            .get_or_try_init(|| async {
                self.create_bucket_if_missing(credential)
                    .await
                    .map_err(|source| UploadError::Bucket {
                        bucket: self.bucket.clone(),
                        source,
                    })
            })
            .await
            .map(|_| ())
    }

    async fn create_bucket_if_missing(&self, credential: &Credential) -> Result<(), RemoteError> {
        let response = self
            .http
            .get(self.endpoints.bucket_details(&self.bucket))
            .bearer_auth(credential.access_token())
            .send()
            .await?;

        if response.status() != StatusCode::NOT_FOUND {
            ensure_success(response).await?;
            debug!(bucket = %self.bucket, "Bucket exists");
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoints.buckets())
            .bearer_auth(credential.access_token())
            .json(&json!({ "bucketKey": self.bucket, "policyKey": BUCKET_POLICY }))
            .send()
            .await?;

        // Someone else created it between our two calls
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }

        ensure_success(response).await?;
        info!(bucket = %self.bucket, "Created bucket");
        Ok(())
    }

    /// Transfer `content` to the bucket under `name`
    #[instrument(skip(self, credential, content), fields(bucket = %self.bucket))]
    pub async fn upload<B>(
        &self,
        credential: &Credential,
        name: &str,
        content: B,
    ) -> Result<StoredObject, UploadError>
    where
        B: Into<Body>,
    {
        self.ensure_bucket(credential).await?;

        let object = self
            .signed_upload(credential, name, content.into())
            .await
            .map_err(|source| UploadError::Transfer {
                key: name.to_string(),
                source,
            })?;

        info!(object_key = %object.key, object_id = %object.object_id, "Uploaded object");
        Ok(object)
    }

    async fn signed_upload(
        &self,
        credential: &Credential,
        name: &str,
        content: Body,
    ) -> Result<StoredObject, RemoteError> {
        let url = self.endpoints.signed_upload(&self.bucket, name);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(credential.access_token())
            .send()
            .await?;
        let signed: SignedUpload = read_json(response).await?;

        let target = signed.urls.first().ok_or_else(|| {
            RemoteError::InvalidResponse("signed upload returned no URLs".to_string())
        })?;

        debug!("Sending object content to signed URL");
        // The signed URL carries its own authorization
        let response = self.http.put(target).body(content).send().await?;
        ensure_success(response).await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(credential.access_token())
            .json(&json!({ "uploadKey": signed.upload_key }))
            .send()
            .await?;
        let details: ObjectDetails = read_json(response).await?;

        Ok(details.into())
    }

    /// Enumerate every object in the bucket, following pagination
    #[instrument(skip(self, credential), fields(bucket = %self.bucket))]
    pub async fn list_objects(&self, credential: &Credential) -> Result<Vec<StoredObject>, UploadError> {
        self.ensure_bucket(credential).await?;

        self.list_all(credential)
            .await
            .map_err(|source| UploadError::List {
                bucket: self.bucket.clone(),
                source,
            })
    }

    async fn list_all(&self, credential: &Credential) -> Result<Vec<StoredObject>, RemoteError> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.endpoints.objects(&self.bucket))
                .bearer_auth(credential.access_token())
                .query(&[("limit", LIST_PAGE_SIZE.to_string())]);
            if let Some(start_at) = &cursor {
                request = request.query(&[("startAt", start_at)]);
            }

            let page: ObjectPage = read_json(request.send().await?).await?;
            let next = page.next_cursor();
            objects.extend(page.items.into_iter().map(StoredObject::from));

            match next {
                Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = objects.len(), "Listed objects");
        Ok(objects)
    }
}
