use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::UploaderConfig;
use crate::error::UploadError;
use crate::format::UploadFormat;

/// Multipart field carrying the file.
pub const DATA_FIELD: &str = "data";

/// Body of every `/upload` response. Failures are reported here, never
/// through the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadResponse {
    Success { data: Value },
    Failed { message: String },
}

impl From<UploadError> for UploadResponse {
    fn from(err: UploadError) -> Self {
        UploadResponse::Failed {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for UploadResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug)]
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

pub async fn upload(
    State(config): State<Arc<UploaderConfig>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResponse {
    let result = match multipart {
        Ok(multipart) => handle(&config, multipart).await,
        Err(rejection) => Err(UploadError::Multipart(rejection.body_text())),
    };
    match result {
        Ok(data) => UploadResponse::Success { data },
        Err(err) => {
            warn!("upload rejected: {err}");
            err.into()
        }
    }
}

async fn handle(config: &UploaderConfig, mut multipart: Multipart) -> Result<Value, UploadError> {
    let file = read_data_field(&mut multipart, config.max_bytes).await?;
    let format = UploadFormat::detect(file.content_type.as_deref(), file.file_name.as_deref())?;
    info!(
        "parsing {} upload {:?} ({} bytes)",
        format.name(),
        file.file_name.as_deref().unwrap_or("<unnamed>"),
        file.data.len()
    );

    let data = file.data;
    tokio::task::spawn_blocking(move || format.parse(data))
        .await
        .map_err(|e| UploadError::parse(format, e))?
}

/// Buffers the `data` field, giving up as soon as it passes `max_bytes`.
async fn read_data_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<UploadedFile, UploadError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(DATA_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if buf.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            buf.extend_from_slice(&chunk);
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            data: buf.freeze(),
        });
    }
    Err(UploadError::MissingField)
}

fn multipart_error(err: MultipartError) -> UploadError {
    UploadError::Multipart(err.body_text())
}
