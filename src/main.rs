use std::process::ExitCode;

use assign_reviewers::config::ActionConfig;
use assign_reviewers::run::{RunOutcome, run};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assign_reviewers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        let config = ActionConfig::from_env()?;
        tracing::debug!(?config, "loaded configuration");
        run(&config).await
    });

    match result {
        Ok(RunOutcome::SkippedDraft) => ExitCode::SUCCESS,
        Ok(RunOutcome::Reconciled(plan)) => {
            if plan.is_empty() {
                tracing::info!("reviewers already up to date");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "assigning reviewers failed");
            ExitCode::FAILURE
        }
    }
}
