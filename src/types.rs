use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Display;

use serde::Serialize;

use crate::constants;

/// The service account the checks are run for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub namespace: String,
    pub service_account: String,
}

impl Identity {
    pub fn new(namespace: impl Into<String>, service_account: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service_account: service_account.into(),
        }
    }

    /// Username the API server authenticates this service account as.
    pub fn username(&self) -> String {
        format!(
            "system:serviceaccount:{}:{}",
            self.namespace, self.service_account
        )
    }

    pub fn groups(&self) -> Vec<String> {
        vec![
            String::from("system:serviceaccounts"),
            format!("system:serviceaccounts:{}", self.namespace),
        ]
    }

    pub fn is_complete(&self) -> bool {
        !self.namespace.is_empty() && !self.service_account.is_empty()
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.service_account)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReviewTarget {
    Resource { group: String, resource: String },
    NonResourceUrl { path: String },
}

impl ReviewTarget {
    pub fn resource(group: impl Into<String>, resource: impl Into<String>) -> Self {
        ReviewTarget::Resource {
            group: group.into(),
            resource: resource.into(),
        }
    }

    pub fn non_resource_url(path: impl Into<String>) -> Self {
        ReviewTarget::NonResourceUrl { path: path.into() }
    }

    pub fn group(&self) -> &str {
        match self {
            ReviewTarget::Resource { group, .. } => group,
            ReviewTarget::NonResourceUrl { .. } => "",
        }
    }

    /// Name denials are grouped under: `group/resource`, or the bare
    /// resource for the core group.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Resource name without its group.
    pub fn name(&self) -> String {
        match self {
            ReviewTarget::Resource { resource, .. } => resource.clone(),
            ReviewTarget::NonResourceUrl { .. } => self.to_string(),
        }
    }
}

impl Display for ReviewTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewTarget::Resource { group, resource } if group.is_empty() => f.write_str(resource),
            ReviewTarget::Resource { group, resource } => write!(f, "{}/{}", group, resource),
            ReviewTarget::NonResourceUrl { path } => {
                write!(f, "{}{}", constants::NON_RESOURCE_URL_PREFIX, path)
            }
        }
    }
}

/// A single (target, verb) pair that has to be reviewed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReviewRequest {
    pub target: ReviewTarget,
    pub verb: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessReviewResult {
    pub target: ReviewTarget,
    pub verb: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<String>,
}

impl AccessReviewResult {
    pub fn allowed(request: ReviewRequest) -> Self {
        Self {
            target: request.target,
            verb: request.verb,
            allowed: true,
            denial_reason: None,
        }
    }

    pub fn denied(request: ReviewRequest, reason: Option<String>) -> Self {
        Self {
            target: request.target,
            verb: request.verb,
            allowed: false,
            denial_reason: reason,
        }
    }

    pub fn request(&self) -> ReviewRequest {
        ReviewRequest {
            target: self.target.clone(),
            verb: self.verb.clone(),
        }
    }
}

/// Denied verbs keyed by resource. Keys never map to an empty set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WarningSet {
    pub(crate) items: BTreeMap<String, BTreeSet<String>>,
}

impl WarningSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn verbs(&self, resource: &str) -> Option<&BTreeSet<String>> {
        self.items.get(resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn messages(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|(resource, verbs)| {
                format!(
                    "{}: missing verbs [{}]",
                    resource,
                    verbs.iter().cloned().collect::<Vec<String>>().join(", ")
                )
            })
            .collect()
    }
}

/// Everything a single check produced.
#[derive(Clone, Debug)]
pub struct Report {
    pub identity: Identity,
    pub results: Vec<AccessReviewResult>,
    pub warnings: Vec<String>,
}
