//! GitHub push webhook handling
//!
//! A push to a repository's default branch fetches the source tarball, runs
//! the site build, and syncs the build output to the repository's bucket.
//! Every external collaborator sits behind a trait so the pipeline can run
//! against fakes.

pub mod builder;
pub mod credentials;
pub mod event;
mod handler;
pub mod source;

pub use builder::{run_build, Builder, MakeBuilder};
#[cfg(feature = "cloud")]
pub use credentials::{provider_from_auth, KmsCredentials};
pub use credentials::{CredentialProvider, Credentials, NoCredentials, StaticCredentials};
pub use event::{PushPayload, Repository, TriggerEvent};
pub use handler::{DeployOutcome, PushHandler};
pub use source::{unpack_tarball, GithubTarballFetcher, SourceFetcher};
