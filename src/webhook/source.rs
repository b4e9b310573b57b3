//! Source tarball retrieval

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::USER_AGENT;
use tar::{Archive, EntryType};

use super::credentials::Credentials;
use crate::config::DEFAULT_GITHUB_API;
use crate::error::{DeployError, Result};

/// Fetches a repository snapshot and returns its unpacked root
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(
        &self,
        full_name: &str,
        branch: &str,
        credentials: Option<&Credentials>,
    ) -> Result<PathBuf>;
}

/// Downloads `/repos/{owner}/{repo}/tarball/{branch}` from the GitHub API
pub struct GithubTarballFetcher {
    client: reqwest::Client,
    api_base: String,
    work_dir: PathBuf,
}

impl GithubTarballFetcher {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_api(DEFAULT_GITHUB_API, work_dir)
    }

    pub fn with_api(api_base: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            work_dir: work_dir.into(),
        }
    }

    pub fn tarball_url(&self, full_name: &str, branch: &str) -> String {
        format!("{}/repos/{}/tarball/{}", self.api_base, full_name, branch)
    }
}

#[async_trait]
impl SourceFetcher for GithubTarballFetcher {
    async fn fetch(
        &self,
        full_name: &str,
        branch: &str,
        credentials: Option<&Credentials>,
    ) -> Result<PathBuf> {
        let url = self.tarball_url(full_name, branch);
        tracing::info!("Fetching tarball {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, format!("sitedeploy/{}", crate::VERSION));
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(DeployError::Fetch(format!(
                "tarball request for {} returned {}",
                full_name, status
            )));
        }

        let tarball = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes for {}", tarball.len(), full_name);

        unpack_tarball(&tarball, &self.work_dir)
    }
}

/// Unpack a gzipped tarball into `dest`, replacing any stale copy of its
/// top-level directory. Returns that directory.
pub fn unpack_tarball(tarball: &[u8], dest: &Path) -> Result<PathBuf> {
    let root_name = find_root_dir(GzDecoder::new(tarball))?;
    let root = dest.join(&root_name);

    if root.is_dir() {
        tracing::debug!("Removing stale source tree {}", root.display());
        std::fs::remove_dir_all(&root)?;
    }
    std::fs::create_dir_all(dest)?;

    let mut archive = Archive::new(GzDecoder::new(tarball));
    archive
        .unpack(dest)
        .map_err(|e| DeployError::Fetch(format!("failed to unpack tarball: {}", e)))?;

    Ok(root)
}

/// Name of the first single-component entry
fn find_root_dir(reader: impl Read) -> Result<String> {
    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| DeployError::Fetch(format!("unreadable tarball: {}", e)))?;

    for entry in entries {
        let entry = entry.map_err(|e| DeployError::Fetch(format!("unreadable tarball: {}", e)))?;
        if matches!(
            entry.header().entry_type(),
            EntryType::XGlobalHeader | EntryType::XHeader
        ) {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| DeployError::Fetch(format!("bad entry path: {}", e)))?;
        let components: Vec<Component<'_>> = path.components().collect();
        if let [Component::Normal(name)] = components.as_slice() {
            return Ok(name.to_string_lossy().into_owned());
        }
    }

    Err(DeployError::Fetch(
        "Failed to find a directory in tarball".to_string(),
    ))
}
