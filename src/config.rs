//! Handler configuration read from the environment

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Build output directory, relative to the project root
pub const OUTPUT_DIR: &str = "_build";

/// Branch deployed when the payload does not name a default branch
pub const DEFAULT_BRANCH: &str = "master";

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Runtime configuration for the push handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Show build output instead of discarding it
    #[serde(default)]
    pub debug: bool,
    /// `user:pass`, or base64 ciphertext to be decrypted with KMS
    #[serde(default, skip_serializing)]
    pub github_auth: Option<String>,
    /// Path to the site compiler handed to the build
    pub compiler_path: PathBuf,
    /// Fallback default branch
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Where source tarballs are unpacked
    pub work_dir: PathBuf,
    /// GitHub API base URL
    #[serde(default = "default_github_api")]
    pub github_api: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_github_api() -> String {
    DEFAULT_GITHUB_API.to_string()
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            github_auth: None,
            compiler_path: PathBuf::from("blogc"),
            default_branch: default_branch(),
            work_dir: std::env::temp_dir(),
            github_api: default_github_api(),
        }
    }
}

impl HandlerConfig {
    /// Read `DEBUG`, `GITHUB_AUTH`, `BLOGC`, `SITEDEPLOY_DEFAULT_BRANCH`,
    /// `SITEDEPLOY_WORK_DIR` and `SITEDEPLOY_GITHUB_API`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let compiler_path = lookup("BLOGC")
            .map(PathBuf::from)
            .unwrap_or_else(default_compiler_path);

        Self {
            debug: lookup("DEBUG").is_some(),
            github_auth: lookup("GITHUB_AUTH").filter(|v| !v.is_empty()),
            compiler_path,
            default_branch: lookup("SITEDEPLOY_DEFAULT_BRANCH")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_branch),
            work_dir: lookup("SITEDEPLOY_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            github_api: lookup("SITEDEPLOY_GITHUB_API")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.github_api),
        }
    }
}

/// `blogc` next to the running executable
fn default_compiler_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("blogc")))
        .unwrap_or_else(|| PathBuf::from("blogc"))
}
