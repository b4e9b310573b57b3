//! Trigger events carrying a GitHub push payload

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeployError, Result};

/// Repository fields of a push payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub master_branch: Option<String>,
}

/// The parts of a push payload the handler reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub reference: String,
    pub repository: Repository,
}

impl PushPayload {
    /// Default branch named by the payload, else `fallback`
    pub fn default_branch<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.repository
            .default_branch
            .as_deref()
            .or(self.repository.master_branch.as_deref())
            .filter(|b| !b.is_empty())
            .unwrap_or(fallback)
    }

    /// Full ref of the default branch, e.g. `refs/heads/master`
    pub fn default_ref(&self, fallback: &str) -> String {
        format!("refs/heads/{}", self.default_branch(fallback))
    }

    /// Only pushes to the default branch are deployed
    pub fn should_deploy(&self, fallback: &str) -> bool {
        self.reference == self.default_ref(fallback)
    }
}

/// A trigger event, either SNS-wrapped or a bare payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub payload: PushPayload,
}

impl TriggerEvent {
    pub fn parse(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| DeployError::InvalidEvent(format!("not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Unwrap `Records[0].Sns.Message` when present
    pub fn from_value(value: Value) -> Result<Self> {
        let payload_value = match value.get("Records") {
            Some(records) => {
                let message = records
                    .get(0)
                    .and_then(|r| r.get("Sns"))
                    .and_then(|sns| sns.get("Message"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        DeployError::InvalidEvent(
                            "Records[0].Sns.Message missing or not a string".to_string(),
                        )
                    })?;
                serde_json::from_str(message).map_err(|e| {
                    DeployError::InvalidEvent(format!("SNS message is not JSON: {}", e))
                })?
            }
            None => value,
        };

        let payload: PushPayload = serde_json::from_value(payload_value)
            .map_err(|e| DeployError::InvalidEvent(format!("bad push payload: {}", e)))?;
        Ok(Self { payload })
    }
}
