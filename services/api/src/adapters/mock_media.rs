//! services/api/src/adapters/mock_media.rs
//!
//! A `MediaStore` used when no Cloudinary credentials are configured. Nothing
//! leaves the process; every upload yields a deterministic URL so the rest of
//! the system stays usable.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use recipe_social_core::domain::{DestroyResult, UploadOptions, UploadResult, UploadSource};
use recipe_social_core::ports::{MediaStore, PortError, PortResult};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

fn data_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:([A-Za-z0-9.+-]+)/([A-Za-z0-9.+-]+);base64,(.*)$")
            .expect("data URI pattern is valid")
    })
}

#[derive(Clone, Default)]
pub struct MockMediaStore;

impl MockMediaStore {
    pub fn new() -> Self {
        Self
    }
}

fn extension(file_name: &str, content_type: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => content_type
            .split('/')
            .nth(1)
            .unwrap_or("bin")
            .to_string(),
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(
        &self,
        source: UploadSource,
        _options: &UploadOptions,
    ) -> PortResult<UploadResult> {
        let id = Uuid::new_v4();
        let public_id = format!("mock/{}", id);

        let (secure_url, format, bytes) = match source {
            UploadSource::DataUri(uri) => {
                let captures = data_uri_pattern().captures(&uri).ok_or_else(|| {
                    PortError::InvalidArgument("Malformed data URI".to_string())
                })?;
                let format = captures[2].to_string();
                let decoded = STANDARD
                    .decode(captures[3].trim())
                    .map_err(|e| PortError::InvalidArgument(format!("Invalid base64 payload: {}", e)))?;
                (uri.clone(), Some(format), decoded.len() as u64)
            }
            UploadSource::Bytes {
                data,
                file_name,
                content_type,
            } => {
                let ext = extension(&file_name, &content_type);
                (
                    format!("/uploads/mock/{}.{}", id, ext),
                    Some(ext),
                    data.len() as u64,
                )
            }
            UploadSource::Reference(url) => (url, None, 0),
        };

        Ok(UploadResult {
            public_id,
            secure_url,
            width: None,
            height: None,
            format,
            bytes,
            resource_type: Some("image".to_string()),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        })
    }

    async fn destroy(&self, _public_id: &str) -> PortResult<DestroyResult> {
        Ok(DestroyResult {
            result: "ok".to_string(),
        })
    }
}
