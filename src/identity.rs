use std::env;
use std::fs;

use tracing::debug;

use crate::constants;
use crate::error::IdentityError;
use crate::types::Identity;

/// Source of the namespace and service account the checks are run for.
pub trait IdentityResolver: Send + Sync {
    fn namespace(&self) -> Result<String, IdentityError>;
    fn service_account(&self) -> Result<String, IdentityError>;

    fn resolve(&self) -> Result<Identity, IdentityError> {
        let identity = Identity::new(self.namespace()?, self.service_account()?);
        debug!(%identity, "resolved identity");
        Ok(identity)
    }
}

/// Resolves the identity of the pod this process runs in.
#[derive(Clone, Debug, Default)]
pub struct InClusterResolver;

impl IdentityResolver for InClusterResolver {
    fn namespace(&self) -> Result<String, IdentityError> {
        if let Some(namespace) = env::var(constants::NAMESPACE_ENV)
            .ok()
            .filter(|ns| !ns.trim().is_empty())
        {
            return Ok(namespace.trim().to_string());
        }
        let namespace =
            fs::read_to_string(constants::NAMESPACE_FILE).map_err(|source| IdentityError::Read {
                path: constants::NAMESPACE_FILE.to_string(),
                source,
            })?;
        non_empty(namespace, "namespace")
    }

    fn service_account(&self) -> Result<String, IdentityError> {
        let service_account =
            env::var(constants::SERVICE_ACCOUNT_ENV).map_err(|_| IdentityError::MissingEnv {
                var: constants::SERVICE_ACCOUNT_ENV,
            })?;
        non_empty(service_account, "service account")
    }
}

/// Fixed identity, used when the caller already knows who to check.
#[derive(Clone, Debug)]
pub struct StaticResolver {
    namespace: String,
    service_account: String,
}

impl StaticResolver {
    pub fn new(namespace: impl Into<String>, service_account: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service_account: service_account.into(),
        }
    }
}

impl IdentityResolver for StaticResolver {
    fn namespace(&self) -> Result<String, IdentityError> {
        non_empty(self.namespace.clone(), "namespace")
    }

    fn service_account(&self) -> Result<String, IdentityError> {
        non_empty(self.service_account.clone(), "service account")
    }
}

/// Uses the overrides that are set and falls back to `fallback` for the rest.
pub struct OverrideResolver<R> {
    pub namespace: Option<String>,
    pub service_account: Option<String>,
    pub fallback: R,
}

impl<R: IdentityResolver> IdentityResolver for OverrideResolver<R> {
    fn namespace(&self) -> Result<String, IdentityError> {
        match &self.namespace {
            Some(namespace) => non_empty(namespace.clone(), "namespace"),
            None => self.fallback.namespace(),
        }
    }

    fn service_account(&self) -> Result<String, IdentityError> {
        match &self.service_account {
            Some(service_account) => non_empty(service_account.clone(), "service account"),
            None => self.fallback.service_account(),
        }
    }
}

fn non_empty(value: String, what: &'static str) -> Result<String, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        Err(IdentityError::Empty { what })
    } else {
        Ok(value.to_string())
    }
}
