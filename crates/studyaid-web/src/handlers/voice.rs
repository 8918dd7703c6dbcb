use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::models::VoiceResponse;
use crate::state::AppState;
use crate::upload::VoiceForm;

const NOT_SERVED_NOTE: &str = "Audio was stored but is not served by this server.";

pub async fn voice(State(state): State<Arc<AppState>>, form: VoiceForm) -> Json<VoiceResponse> {
    let lang = form.lang.unwrap_or_else(|| state.default_lang.clone());

    match state.voice.synthesize(&form.text, &lang).await {
        Ok(artifact) => Json(VoiceResponse::Audio {
            audio_url: artifact.url,
            note: (!state.serve_audio).then(|| NOT_SERVED_NOTE.to_string()),
        }),
        Err(e) => {
            tracing::warn!(lang = %lang, error = %e, "voice generation failed");
            Json(VoiceResponse::Failed {
                error: format!("Voice generation failed: {e}"),
            })
        }
    }
}
