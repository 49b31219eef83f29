//! services/api/src/web/protocol.rs
//!
//! Defines the JSON envelopes exchanged between clients and the API server.
//! Every response is either `{success: true, data}` or `{success: false, error}`.

use axum::Json;
use crate::adapters::cloudinary::SignedUpload;
use recipe_social_core::domain::{Notification, UploadResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Envelopes
//=========================================================================================

/// The success envelope wrapping every payload.
#[derive(Serialize, Deserialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// Wraps `data` in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// The failure envelope; the HTTP status carries the fault class.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

//=========================================================================================
// Upload Payloads
//=========================================================================================

/// The subset of an upload result returned to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub bytes: u64,
}

impl From<UploadResult> for UploadedImage {
    fn from(result: UploadResult) -> Self {
        Self {
            public_id: result.public_id,
            secure_url: result.secure_url,
            width: result.width,
            height: result.height,
            format: result.format,
            bytes: result.bytes,
        }
    }
}

/// The result of deleting an uploaded asset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct DeletedImage {
    pub result: String,
}

/// Parameters for uploading straight to the media service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignature {
    pub signature: String,
    pub timestamp: i64,
    pub cloud_name: String,
    pub api_key: String,
    pub folder: String,
    pub transformation: String,
}

impl From<SignedUpload> for UploadSignature {
    fn from(signed: SignedUpload) -> Self {
        Self {
            signature: signed.signature,
            timestamp: signed.timestamp,
            cloud_name: signed.cloud_name,
            api_key: signed.api_key,
            folder: signed.folder,
            transformation: signed.transformation,
        }
    }
}

//=========================================================================================
// Request Payloads
//=========================================================================================

/// `value` is taken as raw JSON so that a fractional or non-numeric rating
/// reaches validation instead of failing deserialization.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RatingRequest {
    #[serde(default)]
    #[schema(value_type = i64, minimum = 1, maximum = 5)]
    pub value: serde_json::Value,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub author: Option<String>,
    #[serde(rename = "includeDrafts")]
    pub include_drafts: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

//=========================================================================================
// Response Payloads
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
pub struct ToggleResponse {
    /// The membership state after the toggle.
    pub active: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub user_rating: Option<u8>,
    pub average: f64,
    pub count: u64,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
    pub followers: u64,
    pub following: u64,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: u64,
}
