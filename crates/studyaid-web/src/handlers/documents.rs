use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use std::sync::Arc;

use studyaid_core::study::{NO_QUIZ_NOTE, NO_TEXT_NOTE};
use studyaid_core::{Document, SearchOutcome};

use crate::models::{QuizResponse, SearchResponse, SummaryResponse};
use crate::state::AppState;
use crate::upload::{self, DocumentForm, UploadError, UploadedFile};

pub async fn search(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, UploadError> {
    let DocumentForm { file, query } = read_form(multipart).await?;
    let query = query.ok_or(UploadError::MissingField("query"))?;

    let filename = file.filename.clone();
    let document = load_document(&state, file).await;

    let response = match document.search(&query) {
        SearchOutcome::Matches(results) => SearchResponse {
            results,
            note: None,
        },
        SearchOutcome::NoText => SearchResponse {
            results: Vec::new(),
            note: Some(NO_TEXT_NOTE.to_string()),
        },
    };

    tracing::info!(filename = %filename, query = %query, hits = response.results.len(), "search");
    Ok(Json(response))
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, UploadError> {
    let DocumentForm { file, .. } = read_form(multipart).await?;
    let filename = file.filename.clone();
    let document = load_document(&state, file).await;

    tracing::info!(filename = %filename, sentences = document.sentences.len(), "summarize");
    Ok(Json(SummaryResponse {
        summary: document.summary(),
    }))
}

pub async fn quiz(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QuizResponse>, UploadError> {
    let DocumentForm { file, .. } = read_form(multipart).await?;
    let filename = file.filename.clone();
    let document = load_document(&state, file).await;

    let quiz = document.quiz(&mut fastrand::Rng::new());
    let note = quiz.is_empty().then(|| NO_QUIZ_NOTE.to_string());

    tracing::info!(filename = %filename, items = quiz.len(), "quiz");
    Ok(Json(QuizResponse { quiz, note }))
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DocumentForm, UploadError> {
    let multipart = multipart.map_err(|e| UploadError::Malformed(e.body_text()))?;
    upload::parse_document_form(multipart).await
}

/// Extract and split the upload off the async runtime (MuPDF is blocking).
/// A failed task degrades to an empty document like any extraction failure.
async fn load_document(state: &Arc<AppState>, file: UploadedFile) -> Document {
    let backend = state.pdf_backend.clone();
    let tokenizer = state.tokenizer.clone();
    let filename = file.filename;
    let data = file.data;

    let result = tokio::task::spawn_blocking(move || {
        Document::from_pdf(&data, backend.as_ref(), tokenizer.as_ref())
    })
    .await;

    match result {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "document processing task failed");
            Document::default()
        }
    }
}
