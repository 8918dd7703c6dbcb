use axum::Json;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Rejection for requests whose form data is unusable.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read form data: {0}")]
    Malformed(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "rejecting request");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// An uploaded file with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Parsed form fields from a document upload.
pub struct DocumentForm {
    pub file: UploadedFile,
    pub query: Option<String>,
}

/// Parse a multipart document upload: a `file` part plus an optional
/// `query` field.
pub async fn parse_document_form(mut multipart: Multipart) -> Result<DocumentForm, UploadError> {
    let mut file: Option<UploadedFile> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?
                    .to_vec();
                file = Some(UploadedFile { filename, data });
            }
            "query" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                query = Some(val);
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    let file = file.ok_or(UploadError::MissingField("file"))?;

    Ok(DocumentForm { file, query })
}

#[derive(Debug, Default, Deserialize)]
struct RawVoiceForm {
    text: Option<String>,
    lang: Option<String>,
}

/// `/voice` form fields, accepted urlencoded or as multipart.
#[derive(Debug)]
pub struct VoiceForm {
    pub text: String,
    /// `None` when absent or blank; the handler applies the default.
    pub lang: Option<String>,
}

impl<S> FromRequest<S> for VoiceForm
where
    S: Send + Sync,
{
    type Rejection = UploadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw = if is_multipart(req.headers()) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            parse_voice_multipart(multipart).await?
        } else {
            let Form(raw) = Form::<RawVoiceForm>::from_request(req, state)
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            raw
        };

        let text = raw.text.ok_or(UploadError::MissingField("text"))?;
        let lang = raw.lang.filter(|l| !l.trim().is_empty());
        Ok(VoiceForm { text, lang })
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

async fn parse_voice_multipart(mut multipart: Multipart) -> Result<RawVoiceForm, UploadError> {
    let mut raw = RawVoiceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "text" | "lang" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                if name == "text" {
                    raw.text = Some(val);
                } else {
                    raw.lang = Some(val);
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(raw)
}
