use anyhow::Context;
use clap::Parser;
use task_state_snapshot::{
    config::{Config, DefaultReason, ProfileSource},
    presentation::cli::{self, Cli},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,task_state_snapshot=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match &config.profile.source {
        ProfileSource::Recognized { var, value } => {
            tracing::info!(profile = %config.profile.profile, %var, %value, "Profile selected");
        }
        ProfileSource::Defaulted(DefaultReason::Unset) => {
            tracing::warn!(
                profile = %config.profile.profile,
                "No profile variable set (APP_ENV / ENV), falling back to development"
            );
        }
        ProfileSource::Defaulted(DefaultReason::Unrecognized { var, value }) => {
            tracing::warn!(
                profile = %config.profile.profile,
                %var,
                %value,
                "Unrecognized profile value, falling back to development"
            );
        }
    }
    tracing::debug!(database = %config.database.redacted_url(), grouping = %config.grouping);

    cli::run(&config, cli.command.unwrap_or_default())
        .await
        .context("task state snapshot failed")
}
