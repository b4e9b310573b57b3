//! External site build

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{DeployError, Result};

/// Runs the project's build, writing output to `output_dir` under the root
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(&self, source_root: &Path, output_dir: &str) -> Result<ExitStatus>;
}

/// `make -C <root> OUTPUT_DIR=<dir> BLOGC=<compiler>`
pub struct MakeBuilder {
    program: String,
    compiler: PathBuf,
    show_output: bool,
}

impl MakeBuilder {
    pub fn new(compiler: impl Into<PathBuf>, show_output: bool) -> Self {
        Self {
            program: "make".to_string(),
            compiler: compiler.into(),
            show_output,
        }
    }

    /// Use another executable in place of `make`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn args(&self, source_root: &Path, output_dir: &str) -> Vec<String> {
        vec![
            "-C".to_string(),
            source_root.display().to_string(),
            format!("OUTPUT_DIR={}", output_dir),
            format!("BLOGC={}", self.compiler.display()),
        ]
    }
}

#[async_trait]
impl Builder for MakeBuilder {
    async fn build(&self, source_root: &Path, output_dir: &str) -> Result<ExitStatus> {
        let args = self.args(source_root, output_dir);
        tracing::info!("Running {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(&args);
        if !self.show_output {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = command
            .status()
            .await
            .map_err(|e| DeployError::Build(format!("failed to run {}: {}", self.program, e)))?;
        Ok(status)
    }
}

/// Build and return the output directory, failing on a non-zero exit
pub async fn run_build(
    builder: &dyn Builder,
    source_root: &Path,
    output_dir: &str,
) -> Result<PathBuf> {
    let status = builder.build(source_root, output_dir).await?;
    if !status.success() {
        return Err(DeployError::Build(format!(
            "build of {} exited with {}",
            source_root.display(),
            status
        )));
    }
    Ok(source_root.join(output_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_arguments() {
        let builder = MakeBuilder::new("/opt/blogc", false);
        assert_eq!(
            builder.args(Path::new("/tmp/site"), "_build"),
            vec!["-C", "/tmp/site", "OUTPUT_DIR=_build", "BLOGC=/opt/blogc"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_checked() {
        let root = Path::new("/tmp");

        let ok = MakeBuilder::new("blogc", false).with_program("true");
        assert_eq!(run_build(&ok, root, "_build").await.unwrap(), root.join("_build"));

        let failing = MakeBuilder::new("blogc", false).with_program("false");
        let err = run_build(&failing, root, "_build").await.unwrap_err();
        assert!(matches!(err, DeployError::Build(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let builder = MakeBuilder::new("blogc", false).with_program("sitedeploy-no-such-make");
        let err = builder.build(Path::new("."), "_build").await.unwrap_err();
        assert!(matches!(err, DeployError::Build(_)));
    }
}
