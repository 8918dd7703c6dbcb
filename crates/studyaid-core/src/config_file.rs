use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerConfig>,
    pub tokenizer: Option<TokenizerConfig>,
    pub voice: Option<VoiceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub data_dir: Option<String>,
    pub abbreviations_url: Option<String>,
    pub max_input_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub audio_dir: Option<String>,
    pub default_lang: Option<String>,
    pub tts_endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub serve_audio: Option<bool>,
    /// Stored audio older than this is deleted. `0` keeps files forever.
    pub max_age_secs: Option<u64>,
    /// Upper bound on stored audio files. `0` means unbounded.
    pub max_files: Option<usize>,
}

/// Platform config directory path: `<config_dir>/studyaid/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("studyaid").join("config.toml"))
}

/// Load config by cascading CWD `.studyaid.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".studyaid.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// `overlay`'s field if set, else `base`'s.
fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (&base.server, &overlay.server);
    let (bt, ot) = (&base.tokenizer, &overlay.tokenizer);
    let (bv, ov) = (&base.voice, &overlay.voice);

    ConfigFile {
        server: Some(ServerConfig {
            host: pick(os, bs, |s| s.host.clone()),
            port: pick(os, bs, |s| s.port),
            max_upload_mb: pick(os, bs, |s| s.max_upload_mb),
        }),
        tokenizer: Some(TokenizerConfig {
            data_dir: pick(ot, bt, |t| t.data_dir.clone()),
            abbreviations_url: pick(ot, bt, |t| t.abbreviations_url.clone()),
            max_input_bytes: pick(ot, bt, |t| t.max_input_bytes),
        }),
        voice: Some(VoiceConfig {
            audio_dir: pick(ov, bv, |v| v.audio_dir.clone()),
            default_lang: pick(ov, bv, |v| v.default_lang.clone()),
            tts_endpoint: pick(ov, bv, |v| v.tts_endpoint.clone()),
            timeout_secs: pick(ov, bv, |v| v.timeout_secs),
            serve_audio: pick(ov, bv, |v| v.serve_audio),
            max_age_secs: pick(ov, bv, |v| v.max_age_secs),
            max_files: pick(ov, bv, |v| v.max_files),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config: ConfigFile = toml::from_str(
            r#"
            [server]
            port = 9000

            [voice]
            default_lang = "en"
            serve_audio = false
            "#,
        )
        .unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.port, Some(9000));
        assert_eq!(server.host, None);
        assert!(config.tokenizer.is_none());
        let voice = config.voice.unwrap();
        assert_eq!(voice.default_lang.as_deref(), Some("en"));
        assert_eq!(voice.serve_audio, Some(false));
    }

    #[test]
    fn test_merge_overlay_wins_field_by_field() {
        let base = ConfigFile {
            server: Some(ServerConfig {
                host: Some("127.0.0.1".into()),
                port: Some(8000),
                max_upload_mb: Some(10),
            }),
            voice: Some(VoiceConfig {
                default_lang: Some("ta".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            server: Some(ServerConfig {
                port: Some(9000),
                ..Default::default()
            }),
            tokenizer: Some(TokenizerConfig {
                abbreviations_url: Some("https://example.org/abbr.txt".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = merge(base, overlay);
        let server = merged.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(9000));
        assert_eq!(server.max_upload_mb, Some(10));
        assert_eq!(
            merged.tokenizer.unwrap().abbreviations_url.as_deref(),
            Some("https://example.org/abbr.txt")
        );
        assert_eq!(merged.voice.unwrap().default_lang.as_deref(), Some("ta"));
    }

    #[test]
    fn test_load_from_path_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.toml")).is_none());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[server\nport = ").unwrap();
        assert!(load_from_path(&bad).is_none());

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[tokenizer]\nmax_input_bytes = 1024\n").unwrap();
        let config = load_from_path(&good).unwrap();
        assert_eq!(config.tokenizer.unwrap().max_input_bytes, Some(1024));
    }
}
