use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certperm::catalog;
use certperm::config::Config;
use certperm::formatter::Formatter;
use certperm::{InClusterResolver, KubeReviewer, OverrideResolver, Verifier};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let resolver = OverrideResolver {
        namespace: config.namespace.clone(),
        service_account: config.service_account.clone(),
        fallback: InClusterResolver,
    };
    let reviewer = KubeReviewer::try_default().await?;
    let rules = match &config.rules {
        Some(path) => catalog::load_rules(path)?,
        None => catalog::cert_manager_rules(),
    };

    let report = Verifier::new(&resolver, &reviewer)
        .with_rules(rules)
        .with_timeout(config.timeout())
        .report()
        .await?;
    let missing = !report.warnings.is_empty();
    println!("{}", Formatter::new(&config, report));

    if missing {
        std::process::exit(2);
    }
    Ok(())
}
