use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use stackrun_notify::{GithubNotifier, Report};
use stackrun_provisioner::{
    run_all, CloudFormationProvider, DeploymentResult, LocalTemplateStore, Manifest, Mode,
    ParameterSet, S3TemplateStore, StackDriver, TemplateStore,
};
use tracing_subscriber::EnvFilter;

mod settings;

use settings::Settings;

/// Deploy the CloudFormation templates in manifest order.
#[derive(Debug, Parser)]
#[command(name = "stackrun", about)]
struct Cli {
    /// Compute and report change sets without executing them.
    #[arg(long)]
    dryrun: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mode = Mode::from_dryrun_flag(cli.dryrun);
    let settings = Settings::from_env()?;

    tracing::info!(
        env = %settings.deploy.environment,
        project = %settings.deploy.project,
        mode = %mode,
        "starting run"
    );

    let result = run(&settings, mode).await?;

    println!("result:\n{}", result.to_pretty_json()?);

    let failures = result.failures();
    if !failures.is_empty() {
        tracing::warn!(failed = ?failures, "some templates failed");
    }

    notify(&settings, mode, &result).await;

    Ok(())
}

async fn run(settings: &Settings, mode: Mode) -> eyre::Result<DeploymentResult> {
    let config = &settings.deploy;
    let params = ParameterSet::load(&config.parameter_file()).await?;

    let store: Arc<dyn TemplateStore> = match &config.template_bucket {
        Some(bucket) => {
            let s3 = stackrun_storage::client::build_client().await;
            Arc::new(S3TemplateStore::new(
                &config.template_dir,
                s3,
                bucket,
                config.staging_prefix(),
                &config.poll,
            ))
        }
        None => Arc::new(LocalTemplateStore::new(&config.template_dir)),
    };

    let manifest = Manifest::default_templates();
    let mut providers: HashMap<&str, CloudFormationProvider> = HashMap::new();
    for region in manifest.regions() {
        providers.insert(region, CloudFormationProvider::for_region(region).await);
    }

    let drivers: Vec<StackDriver> = manifest
        .templates
        .iter()
        .map(|spec| {
            let provider = providers[spec.region.as_str()].clone();
            StackDriver::new(spec.clone(), config, Box::new(provider), store.clone())
        })
        .collect();

    Ok(run_all(&drivers, &params, mode).await)
}

/// Post the report to the pull request. Failures are logged, not fatal: the
/// deployment itself has already happened.
async fn notify(settings: &Settings, mode: Mode, result: &DeploymentResult) {
    let notifier = match GithubNotifier::from_config(&settings.notify) {
        Ok(Some(notifier)) => notifier,
        Ok(None) => {
            tracing::debug!("no comments URL configured, skipping report");
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to build notifier");
            return;
        }
    };

    let report = match Report::render(&settings.deploy.environment, mode.as_str(), result) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "failed to render report");
            return;
        }
    };

    match notifier.publish(&report).await {
        Ok(summary) => tracing::info!(
            deleted = summary.deleted,
            comment_id = summary.posted.id,
            "report published"
        ),
        Err(e) => tracing::warn!(error = %e, "failed to publish report"),
    }
}
