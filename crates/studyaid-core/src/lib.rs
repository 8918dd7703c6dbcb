use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod assets;
pub mod backend;
pub mod config_file;
pub mod document;
pub mod extract;
pub mod mock;
pub mod sentences;
pub mod study;
pub mod voice;

// Re-export for convenience
pub use assets::{AssetError, TokenizerAssets};
pub use backend::{BackendError, PdfBackend};
pub use document::{Document, SearchOutcome};
pub use extract::extract_document_text;
pub use sentences::{RuleTokenizer, SentenceTokenizer, TokenizeError, split_sentences};
pub use study::{QuizItem, Tag};
pub use voice::{AudioArtifact, AudioRetention, GoogleTts, SpeechBackend, SpeechError, VoiceSynthesizer};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Resolved service settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Directory holding provisioned tokenizer data.
    pub tokenizer_data_dir: PathBuf,
    /// Where to download the abbreviation list from on first start. When
    /// unset the bundled list is written instead.
    pub abbreviations_url: Option<String>,
    pub max_tokenizer_input_bytes: usize,
    pub audio_dir: PathBuf,
    pub default_lang: String,
    pub tts_endpoint: String,
    pub tts_timeout: Duration,
    /// Serve stored audio under `/audio` from this process.
    pub serve_audio: bool,
    pub audio_retention: voice::AudioRetention,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
            tokenizer_data_dir: dirs::data_dir()
                .map(|d| d.join("studyaid"))
                .unwrap_or_else(|| PathBuf::from("data")),
            abbreviations_url: None,
            max_tokenizer_input_bytes: sentences::DEFAULT_MAX_INPUT_BYTES,
            audio_dir: PathBuf::from("audio"),
            default_lang: voice::DEFAULT_LANG.to_string(),
            tts_endpoint: voice::DEFAULT_TTS_ENDPOINT.to_string(),
            tts_timeout: voice::DEFAULT_TTS_TIMEOUT,
            serve_audio: true,
            audio_retention: voice::AudioRetention::default(),
        }
    }
}

impl Settings {
    /// Overlay the values present in a config file onto the defaults.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let mut settings = Self::default();

        if let Some(server) = &file.server {
            if let Some(host) = &server.host {
                settings.host = host.clone();
            }
            if let Some(port) = server.port {
                settings.port = port;
            }
            if let Some(mb) = server.max_upload_mb {
                settings.max_upload_bytes = mb as usize * 1024 * 1024;
            }
        }

        if let Some(tokenizer) = &file.tokenizer {
            if let Some(dir) = &tokenizer.data_dir {
                settings.tokenizer_data_dir = PathBuf::from(dir);
            }
            if tokenizer.abbreviations_url.is_some() {
                settings.abbreviations_url = tokenizer.abbreviations_url.clone();
            }
            if let Some(max) = tokenizer.max_input_bytes {
                settings.max_tokenizer_input_bytes = max;
            }
        }

        if let Some(voice) = &file.voice {
            if let Some(dir) = &voice.audio_dir {
                settings.audio_dir = PathBuf::from(dir);
            }
            if let Some(lang) = &voice.default_lang {
                settings.default_lang = lang.clone();
            }
            if let Some(endpoint) = &voice.tts_endpoint {
                settings.tts_endpoint = endpoint.clone();
            }
            if let Some(secs) = voice.timeout_secs {
                settings.tts_timeout = Duration::from_secs(secs);
            }
            if let Some(serve) = voice.serve_audio {
                settings.serve_audio = serve;
            }
            if let Some(secs) = voice.max_age_secs {
                settings.audio_retention.max_age = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(max) = voice.max_files {
                settings.audio_retention.max_files = (max > 0).then_some(max);
            }
        }

        settings
    }

    /// Apply `STUDYAID_*` overrides, then validate the merged result.
    /// `lookup` is normally `std::env::var`.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("STUDYAID_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("STUDYAID_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "STUDYAID_PORT",
                value: port,
            })?;
        }
        if let Some(dir) = lookup("STUDYAID_AUDIO_DIR") {
            self.audio_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STUDYAID_DATA_DIR") {
            self.tokenizer_data_dir = PathBuf::from(dir);
        }
        let lang_key = match lookup("STUDYAID_DEFAULT_LANG") {
            Some(lang) => {
                self.default_lang = lang;
                "STUDYAID_DEFAULT_LANG"
            }
            None => "voice.default_lang",
        };
        if let Some(endpoint) = lookup("STUDYAID_TTS_ENDPOINT") {
            self.tts_endpoint = endpoint;
        }

        // The default language comes from the file or the environment; either
        // way every /voice request without a `lang` depends on it.
        match voice::supported_language(&self.default_lang) {
            Some(lang) => self.default_lang = lang.to_string(),
            None => {
                return Err(ConfigError::InvalidValue {
                    key: lang_key,
                    value: self.default_lang,
                });
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.default_lang, "ta");
        assert!(settings.serve_audio);
        assert_eq!(settings.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_from_file_overrides_only_present_fields() {
        let file: config_file::ConfigFile = toml::from_str(
            r#"
            [server]
            max_upload_mb = 5

            [voice]
            audio_dir = "/tmp/voices"
            timeout_secs = 3
            "#,
        )
        .unwrap();

        let settings = Settings::from_file(&file);
        assert_eq!(settings.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.audio_dir, PathBuf::from("/tmp/voices"));
        assert_eq!(settings.tts_timeout, Duration::from_secs(3));
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.default_lang, "ta");
        assert_eq!(settings.audio_retention, voice::AudioRetention::default());
    }

    #[test]
    fn test_from_file_audio_retention() {
        let file: config_file::ConfigFile = toml::from_str(
            r#"
            [voice]
            max_age_secs = 0
            max_files = 20
            "#,
        )
        .unwrap();

        let settings = Settings::from_file(&file);
        assert_eq!(
            settings.audio_retention,
            voice::AudioRetention {
                max_age: None,
                max_files: Some(20)
            }
        );
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::default()
            .apply_env(env(&[
                ("STUDYAID_PORT", "9100"),
                ("STUDYAID_DEFAULT_LANG", "en"),
                ("STUDYAID_AUDIO_DIR", "out"),
            ]))
            .unwrap();
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.default_lang, "en");
        assert_eq!(settings.audio_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_env_rejects_invalid_values() {
        let err = Settings::default()
            .apply_env(env(&[("STUDYAID_PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "STUDYAID_PORT",
                value: "eighty".into()
            }
        );

        let err = Settings::default()
            .apply_env(env(&[("STUDYAID_DEFAULT_LANG", "xx")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "STUDYAID_DEFAULT_LANG", .. }));
    }

    #[test]
    fn test_file_default_lang_is_validated() {
        let file: config_file::ConfigFile = toml::from_str(
            r#"
            [voice]
            default_lang = "xx"
            "#,
        )
        .unwrap();
        let err = Settings::from_file(&file).apply_env(env(&[])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "voice.default_lang",
                value: "xx".into()
            }
        );

        // A valid environment value replaces the bad file value.
        let settings = Settings::from_file(&file)
            .apply_env(env(&[("STUDYAID_DEFAULT_LANG", "EN")]))
            .unwrap();
        assert_eq!(settings.default_lang, "en");
    }
}
