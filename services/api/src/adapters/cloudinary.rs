//! services/api/src/adapters/cloudinary.rs
//!
//! This module contains the adapter for the Cloudinary media service.
//! It implements the `MediaStore` port from the `core` crate.

use crate::config::{CloudinaryCredentials, SignatureAlgorithm};
use async_trait::async_trait;
use recipe_social_core::domain::{DestroyResult, UploadOptions, UploadResult, UploadSource};
use recipe_social_core::ports::{MediaStore, PortError, PortResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Signs a parameter set the way Cloudinary expects: `k=v` pairs sorted by key,
/// joined with `&`, the API secret appended, hex digest of the lot.
pub fn sign_params(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&joined, api_secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&joined, api_secret),
    }
}

fn hex_digest<D: Digest>(payload: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// A signed parameter set a client can use to upload straight to Cloudinary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpload {
    pub signature: String,
    pub timestamp: i64,
    pub cloud_name: String,
    pub api_key: String,
    pub folder: String,
    pub transformation: String,
}

impl SignedUpload {
    pub fn new(
        credentials: &CloudinaryCredentials,
        folder: &str,
        transformation: &str,
        timestamp: i64,
    ) -> Self {
        let mut params = BTreeMap::new();
        params.insert("folder", folder.to_string());
        params.insert("timestamp", timestamp.to_string());
        params.insert("transformation", transformation.to_string());
        Self {
            signature: sign_params(
                &params,
                &credentials.api_secret,
                credentials.signature_algorithm,
            ),
            timestamp,
            cloud_name: credentials.cloud_name.clone(),
            api_key: credentials.api_key.clone(),
            folder: folder.to_string(),
            transformation: transformation.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `MediaStore` port using Cloudinary's upload API.
#[derive(Clone)]
pub struct CloudinaryAdapter {
    client: reqwest::Client,
    credentials: CloudinaryCredentials,
    api_base: String,
}

impl CloudinaryAdapter {
    pub fn new(client: reqwest::Client, credentials: CloudinaryCredentials, api_base: &str) -> Self {
        Self {
            client,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.api_base, self.credentials.cloud_name, action
        )
    }

    /// Adds `api_key`, `timestamp` and `signature` to a form carrying `params`.
    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> Form {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(
            &params,
            &self.credentials.api_secret,
            self.credentials.signature_algorithm,
        );

        let mut form = Form::new()
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, url: String, form: Form) -> PortResult<T> {
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Remote(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PortError::Remote(e.to_string()))?;

        if !status.is_success() {
            // Cloudinary's own message is what callers see.
            let message = serde_json::from_slice::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Cloudinary returned {}", status));
            error!("Cloudinary request to {} failed: {}", url, message);
            return Err(PortError::Remote(message));
        }

        serde_json::from_slice(&body)
            .map_err(|e| PortError::Unexpected(format!("Malformed Cloudinary response: {}", e)))
    }
}

//=========================================================================================
// `MediaStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl MediaStore for CloudinaryAdapter {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> PortResult<UploadResult> {
        let mut params = BTreeMap::new();
        params.insert("folder", options.folder.clone());
        if let Some(transformation) = &options.transformation {
            params.insert("transformation", transformation.clone());
        }
        let form = self.signed_form(params);

        let form = match source {
            UploadSource::DataUri(uri) | UploadSource::Reference(uri) => form.text("file", uri),
            UploadSource::Bytes {
                data,
                file_name,
                content_type,
            } => {
                let length = data.len() as u64;
                let part = Part::stream_with_length(data, length)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| PortError::InvalidArgument(e.to_string()))?;
                form.part("file", part)
            }
        };

        let result: UploadResult = self.send(self.endpoint("upload"), form).await?;
        debug!("Uploaded {} ({} bytes)", result.public_id, result.bytes);
        Ok(result)
    }

    async fn destroy(&self, public_id: &str) -> PortResult<DestroyResult> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let form = self.signed_form(params);
        self.send(self.endpoint("destroy"), form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> CloudinaryCredentials {
        CloudinaryCredentials {
            cloud_name: "demo".into(),
            api_key: "123".into(),
            api_secret: "abcd".into(),
            signature_algorithm: SignatureAlgorithm::Sha1,
        }
    }

    fn published_example() -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("public_id", "sample_image".to_string());
        params.insert("timestamp", "1315060510".to_string());
        params
    }

    #[test]
    fn signs_cloudinarys_published_example_with_sha1() {
        assert_eq!(
            sign_params(&published_example(), "abcd", SignatureAlgorithm::Sha1),
            "b4ad47fb4e25c7bf5f92a20089f9db59bc302313"
        );
    }

    #[test]
    fn sha256_accounts_get_a_sha256_signature() {
        assert_eq!(
            sign_params(&published_example(), "abcd", SignatureAlgorithm::Sha256),
            "e3c44b54e67a3ecc918f5d7236ca5faa36250ea8a8cd6cbabfd2d6bb2453acac"
        );
    }

    #[test]
    fn signature_is_order_independent_and_secret_dependent() {
        let mut a = BTreeMap::new();
        a.insert("timestamp", "1315060510".to_string());
        a.insert("public_id", "sample_image".to_string());
        let mut b = BTreeMap::new();
        b.insert("public_id", "sample_image".to_string());
        b.insert("timestamp", "1315060510".to_string());

        let signature = sign_params(&a, "abcd", SignatureAlgorithm::Sha1);
        assert_eq!(signature, sign_params(&b, "abcd", SignatureAlgorithm::Sha1));
        assert_ne!(signature, sign_params(&a, "other", SignatureAlgorithm::Sha1));
        assert_eq!(signature.len(), 40);
    }

    #[test]
    fn signed_upload_covers_folder_timestamp_and_transformation() {
        let signed = SignedUpload::new(&credentials(), "recipe-app", "c_limit,w_10", 42);

        let mut expected = BTreeMap::new();
        expected.insert("folder", "recipe-app".to_string());
        expected.insert("timestamp", "42".to_string());
        expected.insert("transformation", "c_limit,w_10".to_string());
        assert_eq!(
            signed.signature,
            sign_params(&expected, "abcd", SignatureAlgorithm::Sha1)
        );
        assert_eq!(signed.cloud_name, "demo");
        assert_eq!(signed.api_key, "123");
    }
}
