//! Tokenizer data provisioning.
//!
//! The sentence splitter needs an abbreviation list before it can serve
//! requests. [`provision`] makes sure the list exists on disk (reusing an
//! existing file, downloading it, or writing the bundled copy) and loads it.
//! It runs once at startup so a missing asset fails the process early.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use thiserror::Error;

/// File name of the abbreviation list inside the tokenizer data directory.
pub const ABBREVIATIONS_FILE: &str = "abbreviations.txt";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const BUNDLED_ABBREVIATIONS: &str = "\
# One abbreviation per line, without the trailing period.
# Matching is case-insensitive.
mr
mrs
ms
dr
prof
sr
jr
st
mt
vs
etc
e.g
i.e
cf
viz
al
approx
ca
fig
figs
eq
eqs
vol
vols
ch
sec
pp
ed
eds
dept
univ
inc
ltd
co
corp
jan
feb
mar
apr
jun
jul
aug
sep
sept
oct
nov
dec
a.m
p.m
u.s
u.k
ph.d
";

static BUNDLED: Lazy<HashSet<String>> = Lazy::new(|| parse_abbreviations(BUNDLED_ABBREVIATIONS));

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("tokenizer data I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download tokenizer data from {url}: {message}")]
    Download { url: String, message: String },
    #[error("tokenizer data at {0} contains no abbreviations")]
    Empty(PathBuf),
}

/// Loaded tokenizer data.
#[derive(Debug, Clone)]
pub struct TokenizerAssets {
    pub path: PathBuf,
    pub abbreviations: HashSet<String>,
}

/// The abbreviation list shipped with the crate.
pub fn builtin_abbreviations() -> HashSet<String> {
    BUNDLED.clone()
}

/// Parse an abbreviation list: one entry per line, `#` comments, trailing
/// periods ignored, lowercased.
pub fn parse_abbreviations(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_end_matches('.').to_lowercase())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Ensure the abbreviation list exists under `data_dir`, then load it.
///
/// Idempotent: an existing file is reused untouched. Otherwise the list is
/// downloaded from `source_url` when given, or the bundled copy is written.
pub async fn provision(
    data_dir: &Path,
    source_url: Option<&str>,
    client: &reqwest::Client,
) -> Result<TokenizerAssets, AssetError> {
    let path = data_dir.join(ABBREVIATIONS_FILE);

    if path.is_file() {
        tracing::debug!(path = %path.display(), "tokenizer data already present");
        return load(&path);
    }

    let content = match source_url {
        Some(url) => {
            tracing::info!(url, "downloading tokenizer data");
            download(url, client).await?
        }
        None => BUNDLED_ABBREVIATIONS.to_string(),
    };

    if parse_abbreviations(&content).is_empty() {
        return Err(AssetError::Empty(path));
    }

    write_atomically(data_dir, &path, &content)?;
    tracing::info!(path = %path.display(), "provisioned tokenizer data");
    load(&path)
}

/// Load an abbreviation list from disk.
pub fn load(path: &Path) -> Result<TokenizerAssets, AssetError> {
    let content = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let abbreviations = parse_abbreviations(&content);
    if abbreviations.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    Ok(TokenizerAssets {
        path: path.to_path_buf(),
        abbreviations,
    })
}

async fn download(url: &str, client: &reqwest::Client) -> Result<String, AssetError> {
    let err = |message: String| AssetError::Download {
        url: url.to_string(),
        message,
    };

    let resp = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| err(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(err(format!("HTTP {}", status)));
    }

    resp.text().await.map_err(|e| err(e.to_string()))
}

/// Write via a temp file in the same directory so a crash never leaves a
/// half-written list behind for the next startup to reuse.
fn write_atomically(dir: &Path, path: &Path, content: &str) -> Result<(), AssetError> {
    let io_err = |source: std::io::Error| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
