//! sitedeploy CLI
//!
//! Sync a built site directory to a bucket, preview the plan, or fetch a
//! verified release.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitedeploy::error::Result;
use sitedeploy::release::{ReleaseDownloader, DEFAULT_BASE_URL};
use sitedeploy::settings::Settings;
use sitedeploy::sync::{execute_plan, plan_directory, translate, BucketConnector, S3Connector};

#[derive(Parser)]
#[command(name = "sitedeploy")]
#[command(about = "Static site deployment CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a sync would upload and delete
    Plan {
        /// Built site directory
        dir: PathBuf,
        /// Destination bucket
        #[arg(short, long, env = "SITEDEPLOY_BUCKET")]
        bucket: String,
        /// Settings file (s3.json)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Sync a directory to a bucket
    Sync {
        /// Built site directory
        dir: PathBuf,
        /// Destination bucket
        #[arg(short, long, env = "SITEDEPLOY_BUCKET")]
        bucket: String,
        /// Settings file (s3.json)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Print the published key for each path
    Translate {
        paths: Vec<String>,
    },
    /// Download and verify release distfiles
    Release {
        /// Release version, e.g. 0.20.0
        version: String,
        /// Release server base URL
        #[arg(long, env = "SITEDEPLOY_RELEASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Destination directory (files land in <dest>/<version>)
        #[arg(short, long, default_value = "releases")]
        dest: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan {
            dir,
            bucket,
            settings,
        } => {
            let settings = Settings::load(settings.as_deref())?;
            let bucket = settings.bucket_or(&bucket);
            let store = S3Connector::from_env().await.connect(&bucket).await?;

            let plan = plan_directory(&dir, store.as_ref()).await?;
            for file in &plan.to_upload {
                println!("upload  {} ({})", file.published_key, file.relative_path);
            }
            for object in &plan.to_delete {
                println!("delete  {}", object.key);
            }
            println!(
                "{} to upload, {} to delete, {} unchanged in {}",
                plan.to_upload.len(),
                plan.to_delete.len(),
                plan.unchanged.len(),
                bucket
            );
        }

        Commands::Sync {
            dir,
            bucket,
            settings,
        } => {
            let settings = Settings::load(settings.as_deref())?;
            let bucket = settings.bucket_or(&bucket);
            let store = S3Connector::from_env().await.connect(&bucket).await?;

            let plan = plan_directory(&dir, store.as_ref()).await?;
            let report = execute_plan(&plan, store.as_ref(), &settings.resolver()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Translate { paths } => {
            for path in paths {
                println!("{} -> {}", path, translate(&path));
            }
        }

        Commands::Release {
            version,
            base_url,
            dest,
        } => {
            let downloader = ReleaseDownloader::new(base_url, dest);
            for file in downloader.download(&version).await? {
                println!(
                    "{}  {}{}",
                    file.sha512,
                    file.path.display(),
                    if file.downloaded { "" } else { " (cached)" }
                );
            }
        }
    }

    Ok(())
}
