//! sitedeploy push handler
//!
//! Run with: sitedeploy-handler --event event.json (or the event on stdin)

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitedeploy::config::HandlerConfig;
use sitedeploy::error::Result;
use sitedeploy::sync::S3Connector;
use sitedeploy::webhook::{
    provider_from_auth, GithubTarballFetcher, MakeBuilder, PushHandler, TriggerEvent,
};

#[derive(Parser, Debug)]
#[command(name = "sitedeploy-handler")]
#[command(about = "Build and deploy a site on a GitHub push event")]
struct Args {
    /// Event file (SNS notification or bare push payload); stdin when omitted
    #[arg(long, env = "SITEDEPLOY_EVENT")]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // JSON lines on stderr; stdout carries the outcome
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Deployment failed: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> Result<()> {
    let input = match &args.event {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let event = TriggerEvent::parse(&input)?;

    let config = HandlerConfig::from_env();
    let handler = PushHandler::new(
        config.clone(),
        provider_from_auth(config.github_auth.as_deref()).await?,
        Box::new(GithubTarballFetcher::with_api(
            config.github_api.clone(),
            config.work_dir.clone(),
        )),
        Box::new(MakeBuilder::new(config.compiler_path.clone(), config.debug)),
        Box::new(S3Connector::from_env().await),
    );

    let outcome = handler.handle(&event).await?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
