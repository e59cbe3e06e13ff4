use std::time::Duration;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use tidepool_types::api::{UploadTargetRequest, UploadTargetResponse};

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Issues write-capable, time-limited upload targets for post images.
pub trait UploadTargetIssuer: Send + Sync {
    fn issue(&self, file_name: &str, file_type: &str) -> Result<UploadTargetResponse, ApiError>;
}

/// Signs `PUT` URLs against an object-storage endpoint that shares `secret`.
pub struct SignedUrlIssuer {
    upload_endpoint: String,
    public_base_url: String,
    secret: Vec<u8>,
    ttl: Duration,
}

impl SignedUrlIssuer {
    pub fn new(
        upload_endpoint: impl Into<String>,
        public_base_url: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        ttl: Duration,
    ) -> Self {
        Self {
            upload_endpoint: upload_endpoint.into().trim_end_matches('/').to_string(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            ttl,
        }
    }

    /// Hex HMAC-SHA256 over `PUT\n{key}\n{content_type}\n{expires}`.
    pub fn signature(&self, key: &str, content_type: &str, expires: i64) -> Result<String, ApiError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ApiError::Internal(format!("upload signing key rejected: {}", e)))?;
        mac.update(format!("PUT\n{}\n{}\n{}", key, content_type, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn issue_at(
        &self,
        file_name: &str,
        file_type: &str,
        now: DateTime<Utc>,
    ) -> Result<UploadTargetResponse, ApiError> {
        if file_name.trim().is_empty() {
            return Err(ApiError::BadRequest("file_name is required".into()));
        }
        if file_type.trim().is_empty() {
            return Err(ApiError::BadRequest("file_type is required".into()));
        }

        let key = format!("images/{}-{}", now.timestamp_millis(), sanitize_file_name(file_name));
        let expires = now.timestamp() + self.ttl.as_secs() as i64;
        let signature = self.signature(&key, file_type, expires)?;

        Ok(UploadTargetResponse {
            upload_url: format!(
                "{}/{}?expires={}&content_type={}&signature={}",
                self.upload_endpoint,
                key,
                expires,
                urlencoding::encode(file_type),
                signature
            ),
            file_url: format!("{}/{}", self.public_base_url, key),
        })
    }
}

impl UploadTargetIssuer for SignedUrlIssuer {
    fn issue(&self, file_name: &str, file_type: &str) -> Result<UploadTargetResponse, ApiError> {
        self.issue_at(file_name, file_type, Utc::now())
    }
}

/// Keep object keys to `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// POST /uploads
pub async fn issue_upload_target(
    State(state): State<AppState>,
    Json(req): Json<UploadTargetRequest>,
) -> Result<Json<UploadTargetResponse>, ApiError> {
    let target = state.uploads.issue(&req.file_name, &req.file_type)?;
    Ok(Json(target))
}
