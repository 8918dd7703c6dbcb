//! Text-to-speech synthesis.
//!
//! [`SpeechBackend`] turns text into MP3 bytes; [`VoiceSynthesizer`] validates
//! the request, calls the backend and stores the result under a per-request
//! file name so concurrent requests never share an artifact. Old artifacts
//! are swept according to an [`AudioRetention`] policy before each write.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_LANG: &str = "ta";
pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";
pub const DEFAULT_TTS_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_AUDIO_MAX_AGE: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_AUDIO_MAX_FILES: usize = 500;
/// The translate endpoint rejects longer inputs, so text is sent in pieces.
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; studyaid/0.1)";

/// Language codes accepted by the translate TTS endpoint.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et",
    "eu", "fi", "fr", "fr-CA", "gl", "gu", "ha", "hi", "hr", "hu", "id", "is", "it", "iw", "ja",
    "jw", "km", "kn", "ko", "la", "lt", "lv", "ml", "mr", "ms", "my", "ne", "nl", "no", "pa",
    "pl", "pt", "pt-PT", "ro", "ru", "si", "sk", "sq", "sr", "su", "sv", "sw", "ta", "te", "th",
    "tl", "tr", "uk", "ur", "vi", "yue", "zh", "zh-CN", "zh-TW",
];

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("No text to speak")]
    EmptyText,
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),
    #[error("speech service returned HTTP {status}")]
    Http { status: u16 },
    #[error("speech service request failed: {0}")]
    Request(String),
    #[error("failed to write audio file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SpeechFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, SpeechError>> + Send + 'a>>;

/// A speech synthesis service producing MP3 audio.
pub trait SpeechBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Synthesize `text` spoken in `lang`.
    fn synthesize<'a>(&'a self, text: &'a str, lang: &'a str) -> SpeechFuture<'a>;
}

/// Canonical spelling of `lang` if the endpoint supports it.
pub fn supported_language(lang: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|code| code.eq_ignore_ascii_case(lang.trim()))
}

/// Split `text` into pieces of at most `max_chars` characters, breaking at
/// whitespace. Words longer than `max_chars` are cut on char boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>());
            let mut last = pieces.next().unwrap_or_default();
            for piece in pieces {
                chunks.push(std::mem::replace(&mut last, piece));
            }
            current_len = last.chars().count();
            current = last;
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// The public Google Translate TTS endpoint.
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GoogleTts {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            timeout: DEFAULT_TTS_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        lang: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}&total={}&idx={}&textlen={}",
            self.endpoint,
            urlencoding::encode(lang),
            urlencoding::encode(chunk),
            total,
            idx,
            chunk.chars().count()
        );

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SpeechError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl SpeechBackend for GoogleTts {
    fn name(&self) -> &str {
        "google-translate"
    }

    fn synthesize<'a>(&'a self, text: &'a str, lang: &'a str) -> SpeechFuture<'a> {
        Box::pin(async move {
            let chunks = chunk_text(text, MAX_CHUNK_CHARS);
            let total = chunks.len();
            let mut audio = Vec::new();
            // MP3 frames concatenate cleanly, so the pieces play back as one file.
            for (idx, chunk) in chunks.iter().enumerate() {
                let bytes = self.fetch_chunk(chunk, lang, idx, total).await?;
                audio.extend_from_slice(&bytes);
            }
            Ok(audio)
        })
    }
}

/// A stored audio file and the URL path it is served under.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub id: Uuid,
    pub path: PathBuf,
    pub url: String,
}

/// How long stored audio is kept. `None` disables a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioRetention {
    pub max_age: Option<Duration>,
    pub max_files: Option<usize>,
}

impl Default for AudioRetention {
    fn default() -> Self {
        Self {
            max_age: Some(DEFAULT_AUDIO_MAX_AGE),
            max_files: Some(DEFAULT_AUDIO_MAX_FILES),
        }
    }
}

impl AudioRetention {
    /// Keep every file.
    pub fn unbounded() -> Self {
        Self {
            max_age: None,
            max_files: None,
        }
    }
}

/// Validates voice requests and stores synthesized audio.
#[derive(Clone)]
pub struct VoiceSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    audio_dir: PathBuf,
    url_prefix: String,
    retention: AudioRetention,
}

impl VoiceSynthesizer {
    pub fn new(backend: Arc<dyn SpeechBackend>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            audio_dir: audio_dir.into(),
            url_prefix: "/audio".to_string(),
            retention: AudioRetention::default(),
        }
    }

    pub fn with_retention(mut self, retention: AudioRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub async fn synthesize(&self, text: &str, lang: &str) -> Result<AudioArtifact, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let lang = supported_language(lang)
            .ok_or_else(|| SpeechError::UnsupportedLanguage(lang.to_string()))?;

        let audio = self.backend.synthesize(text, lang).await?;

        let id = Uuid::new_v4();
        let file_name = format!("{id}.mp3");
        let path = self.audio_dir.join(&file_name);

        let io_err = |source: std::io::Error| SpeechError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(io_err)?;
        if let Err(e) = self.sweep().await {
            tracing::warn!(dir = %self.audio_dir.display(), error = %e, "audio sweep failed");
        }
        tokio::fs::write(&path, &audio).await.map_err(io_err)?;

        tracing::info!(
            backend = self.backend.name(),
            lang,
            bytes = audio.len(),
            path = %path.display(),
            "stored synthesized audio"
        );

        Ok(AudioArtifact {
            id,
            url: format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name),
            path,
        })
    }

    /// Delete stored `.mp3` files that are past `max_age`, then the oldest
    /// ones until there is room for one more under `max_files`. Returns the
    /// number of files removed. Other files in the directory are left alone.
    pub async fn sweep(&self) -> std::io::Result<usize> {
        let AudioRetention { max_age, max_files } = self.retention;
        if max_age.is_none() && max_files.is_none() {
            return Ok(0);
        }

        let mut entries = match tokio::fs::read_dir(&self.audio_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let mut kept: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut expired = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("mp3") {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let modified = meta.modified().unwrap_or(now);
            let age = now.duration_since(modified).unwrap_or_default();
            if max_age.is_some_and(|max| age >= max) {
                expired.push(path);
            } else {
                kept.push((modified, path));
            }
        }

        if let Some(max) = max_files {
            let excess = (kept.len() + 1).saturating_sub(max.max(1));
            if excess > 0 {
                kept.sort_by_key(|(modified, _)| *modified);
                expired.extend(kept.drain(..excess).map(|(_, path)| path));
            }
        }

        let mut removed = 0;
        for path in expired {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // A concurrent sweep got there first.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        if removed > 0 {
            tracing::debug!(dir = %self.audio_dir.display(), removed, "swept stored audio");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSpeech;

    #[test]
    fn test_supported_language_canonicalizes() {
        assert_eq!(supported_language("ta"), Some("ta"));
        assert_eq!(supported_language("EN"), Some("en"));
        assert_eq!(supported_language("zh-cn"), Some("zh-CN"));
        assert_eq!(supported_language("xx"), None);
        assert_eq!(supported_language(""), None);
    }

    #[test]
    fn test_chunk_text_respects_limit() {
        let text = "word ".repeat(60);
        let chunks = chunk_text(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn test_chunk_text_short_and_empty() {
        assert_eq!(chunk_text("hello  world", 100), vec!["hello world"]);
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[test]
    fn test_chunk_text_splits_long_words() {
        assert_eq!(
            chunk_text("ab abcdefgh c", 3),
            vec!["ab", "abc", "def", "gh", "c"]
        );
        assert_eq!(chunk_text("தமிழ்மொழி", 4), vec!["தமிழ", "்மொழ", "ி"]);
    }

    #[tokio::test]
    async fn test_synthesize_writes_unique_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockSpeech::echo());
        let synth = VoiceSynthesizer::new(backend.clone(), dir.path().join("audio"));

        let first = synth.synthesize("hello", "ta").await.unwrap();
        let second = synth.synthesize("goodbye", "en").await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.url, format!("/audio/{}.mp3", first.id));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"hello");
        assert_eq!(std::fs::read(&second.path).unwrap(), b"goodbye");
        assert_eq!(
            backend.calls(),
            vec![
                ("hello".to_string(), "ta".to_string()),
                ("goodbye".to_string(), "en".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_synthesize_rejects_empty_text_and_bad_language() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockSpeech::echo());
        let synth = VoiceSynthesizer::new(backend.clone(), dir.path());

        let err = synth.synthesize("  \n ", "ta").await.unwrap_err();
        assert_eq!(err.to_string(), "No text to speak");

        let err = synth.synthesize("hello", "klingon").await.unwrap_err();
        assert_eq!(err.to_string(), "Language not supported: klingon");

        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_backend_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let synth = VoiceSynthesizer::new(
            Arc::new(MockSpeech::http_error(503)),
            dir.path().join("audio"),
        );
        let err = synth.synthesize("hello", "ta").await.unwrap_err();
        assert!(matches!(err, SpeechError::Http { status: 503 }));
        assert!(!dir.path().join("audio").exists());
    }

    fn mp3_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref().unwrap().path().extension().and_then(|x| x.to_str()) == Some("mp3")
            })
            .count()
    }

    #[tokio::test]
    async fn test_repeated_requests_stay_within_file_limit() {
        let dir = tempfile::tempdir().unwrap();
        let synth = VoiceSynthesizer::new(Arc::new(MockSpeech::echo()), dir.path())
            .with_retention(AudioRetention {
                max_age: None,
                max_files: Some(3),
            });

        let mut last = None;
        for _ in 0..20 {
            last = Some(synth.synthesize("same text", "ta").await.unwrap());
        }

        assert_eq!(mp3_count(dir.path()), 3);
        assert!(last.unwrap().path.exists());
    }

    #[tokio::test]
    async fn test_expired_audio_is_swept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();
        let synth = VoiceSynthesizer::new(Arc::new(MockSpeech::echo()), dir.path())
            .with_retention(AudioRetention {
                max_age: Some(Duration::ZERO),
                max_files: None,
            });

        let first = synth.synthesize("one", "en").await.unwrap();
        let second = synth.synthesize("two", "en").await.unwrap();

        assert!(!first.path.exists());
        assert!(second.path.exists());
        assert_eq!(mp3_count(dir.path()), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_unbounded_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let synth = VoiceSynthesizer::new(Arc::new(MockSpeech::echo()), dir.path())
            .with_retention(AudioRetention::unbounded());
        for _ in 0..5 {
            synth.synthesize("again", "ta").await.unwrap();
        }
        assert_eq!(mp3_count(dir.path()), 5);
        assert_eq!(synth.sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let synth = VoiceSynthesizer::new(Arc::new(MockSpeech::echo()), dir.path().join("absent"));
        assert_eq!(synth.sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_custom_url_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let synth = VoiceSynthesizer::new(Arc::new(MockSpeech::echo()), dir.path())
            .with_url_prefix("https://cdn.example.org/voice/");
        let artifact = synth.synthesize("hi", "en").await.unwrap();
        assert_eq!(
            artifact.url,
            format!("https://cdn.example.org/voice/{}.mp3", artifact.id)
        );
    }
}
