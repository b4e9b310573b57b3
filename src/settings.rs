//! Per-project deployment settings (`s3.json` in the project root)
//!
//! ```json
//! {"bucket": "other-bucket", "content-type": {"feed": "application/atom+xml"}}
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};
use crate::sync::{OverrideTable, ResolverChain};

/// Settings file name, relative to the project root
pub const SETTINGS_FILE: &str = "s3.json";

/// Deployment overrides read from the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Destination bucket, replacing the default
    #[serde(default)]
    pub bucket: Option<String>,
    /// Content type per published key
    #[serde(default, rename = "content-type")]
    pub content_types: HashMap<String, String>,
}

impl Settings {
    /// Load settings from `path`; a missing path or file yields defaults.
    ///
    /// Malformed JSON is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| DeployError::Settings(format!("{}: {}", path.display(), e)))?;
        settings
            .validate()
            .map_err(|e| DeployError::Settings(format!("{}: {}", path.display(), e)))?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self =
            serde_json::from_str(content).map_err(|e| DeployError::Settings(e.to_string()))?;
        settings.validate().map_err(DeployError::Settings)?;
        Ok(settings)
    }

    /// A present `bucket` must name one
    fn validate(&self) -> std::result::Result<(), String> {
        match self.bucket.as_deref() {
            Some(bucket) if bucket.trim().is_empty() => {
                Err("\"bucket\" is present but empty".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Destination bucket: the settings value if present, else `default`
    pub fn bucket_or(&self, default: &str) -> String {
        self.bucket.clone().unwrap_or_else(|| default.to_string())
    }

    /// Overrides first, extension guessing second
    pub fn resolver(&self) -> ResolverChain {
        ResolverChain::with_overrides(OverrideTable::new(self.content_types.clone()))
    }
}
