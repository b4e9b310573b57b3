//! Release download and checksum verification
//!
//! Scrapes a release directory listing for `*.sha512` links, downloads each
//! distfile next to its checksum file, and verifies the SHA-512 digest.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha512};

use crate::error::{DeployError, Result};

pub const DEFAULT_BASE_URL: &str = "https://distfiles.rgm.io/blogc";

/// A distfile that passed verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedFile {
    pub name: String,
    pub path: PathBuf,
    pub sha512: String,
    /// False when an already-present copy was reused
    pub downloaded: bool,
}

/// Downloads release distfiles into `<dest>/<version>/`
pub struct ReleaseDownloader {
    client: reqwest::Client,
    base_url: String,
    dest_root: PathBuf,
}

impl ReleaseDownloader {
    pub fn new(base_url: impl Into<String>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dest_root: dest_root.into(),
        }
    }

    pub fn release_url(&self, version: &str) -> String {
        format!("{}/blogc-{}", self.base_url, version)
    }

    /// Download and verify every distfile of `version`
    pub async fn download(&self, version: &str) -> Result<Vec<VerifiedFile>> {
        let release_url = self.release_url(version);
        let listing = self.get_text(&format!("{}/", release_url)).await?;
        let distfiles = extract_distfiles(&listing);
        if distfiles.is_empty() {
            return Err(DeployError::Fetch(format!(
                "no distfiles listed at {}/",
                release_url
            )));
        }

        let dest = self.dest_root.join(version);
        tokio::fs::create_dir_all(&dest).await?;

        let mut verified = Vec::with_capacity(distfiles.len());
        for name in distfiles {
            verified.push(self.fetch_distfile(&release_url, &name, &dest).await?);
        }

        tracing::info!(
            "Verified {} distfiles for release {} in {}",
            verified.len(),
            version,
            dest.display()
        );
        Ok(verified)
    }

    async fn fetch_distfile(
        &self,
        release_url: &str,
        name: &str,
        dest: &Path,
    ) -> Result<VerifiedFile> {
        let file_url = format!("{}/{}", release_url, name);
        let checksum_name = format!("{}.sha512", name);

        let checksum_text = self.get_text(&format!("{}.sha512", file_url)).await?;
        tokio::fs::write(dest.join(&checksum_name), &checksum_text).await?;
        let expected = parse_checksum(&checksum_text, name)?;

        let path = dest.join(name);
        if path.exists() && sha512_file(&path).await? == expected {
            tracing::info!("{} already present and verified", name);
            return Ok(VerifiedFile {
                name: name.to_string(),
                path,
                sha512: expected,
                downloaded: false,
            });
        }

        tracing::info!("Downloading {}", file_url);
        let response = self.client.get(&file_url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        tokio::fs::write(&path, &body).await?;

        let actual = sha512_hex(&body);
        if actual != expected {
            return Err(DeployError::Checksum {
                file: name.to_string(),
                expected,
                actual,
            });
        }

        Ok(VerifiedFile {
            name: name.to_string(),
            path,
            sha512: actual,
            downloaded: true,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

static DISTFILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(blogc[^'"]+)\.sha512"#).unwrap());

/// Distfile names referenced as `<name>.sha512` in a directory listing
pub fn extract_distfiles(listing: &str) -> BTreeSet<String> {
    DISTFILE_PATTERN
        .captures_iter(listing)
        .map(|c| c[1].to_string())
        .collect()
}

/// Digest for `name` from `sha512sum` output (`<hex>  <name>` per line).
///
/// A single bare digest line is accepted as well.
pub fn parse_checksum(text: &str, name: &str) -> Result<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    for line in &lines {
        let mut parts = line.split_whitespace();
        let (Some(digest), file) = (parts.next(), parts.next()) else {
            continue;
        };
        let file = file.map(|f| f.trim_start_matches('*'));
        if file == Some(name) || (file.is_none() && lines.len() == 1) {
            let digest = digest.to_lowercase();
            if digest.len() != 128 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(DeployError::Fetch(format!(
                    "malformed sha512 digest for {}",
                    name
                )));
            }
            return Ok(digest);
        }
    }

    Err(DeployError::Fetch(format!(
        "checksum file has no entry for {}",
        name
    )))
}

pub fn sha512_hex(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

async fn sha512_file(path: &Path) -> Result<String> {
    let data = tokio::fs::read(path).await?;
    Ok(sha512_hex(&data))
}
