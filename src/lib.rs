//! sitedeploy - static site deployment
//!
//! Builds a site when its repository is pushed and syncs the build output
//! to an object-storage bucket, uploading only what changed.

pub mod config;
pub mod error;
pub mod release;
pub mod settings;
pub mod sync;
pub mod types;
pub mod webhook;

pub use error::{DeployError, Result};
pub use settings::Settings;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
