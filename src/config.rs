use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Pretty,
    Json,
}

/// Checks that a service account may manage cert-manager certificates.
#[derive(Clone, Debug, Parser)]
#[command(name = "certperm", version)]
pub struct Config {
    /// Namespace of the service account, defaults to the one of the current pod
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Service account to check, defaults to $SERVICE_ACCOUNT_NAME
    #[arg(short, long)]
    pub service_account: Option<String>,

    /// JSON file with the policy rules to check instead of the cert-manager ones
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
    pub format: Format,

    /// Display the API group of each resource
    #[arg(short = 'g', long)]
    pub display_group: bool,

    /// Give up on the access reviews after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
