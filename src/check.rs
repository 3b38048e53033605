use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::api::authorization::v1::SubjectAccessReview;
use k8s_openapi::api::rbac::v1::PolicyRule;
use kube::api::{Api, PostParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

use crate::catalog;
use crate::error::ReviewError;
use crate::types::{AccessReviewResult, Identity, ReviewRequest, ReviewTarget};

/// Answers "can this identity do that" for every pair a rule set requires.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Returns exactly one result per (target, verb) pair of `catalog::expand(rules)`.
    async fn check_policy_rules(
        &self,
        identity: &Identity,
        rules: &[PolicyRule],
    ) -> Result<Vec<AccessReviewResult>, ReviewError>;
}

/// Reviewer backed by the Kubernetes `SubjectAccessReview` API.
#[derive(Clone)]
pub struct KubeReviewer {
    client: Client,
}

impl KubeReviewer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn try_default() -> Result<Self, ReviewError> {
        Ok(Self::new(Client::try_default().await?))
    }
}

fn subject_access_review(
    identity: &Identity,
    request: &ReviewRequest,
) -> Result<SubjectAccessReview, ReviewError> {
    let (resource_attributes, non_resource_attributes) = match &request.target {
        ReviewTarget::Resource { group, resource } => (
            Some(json!({
                "group": group,
                "resource": resource,
                "verb": request.verb,
            })),
            None,
        ),
        ReviewTarget::NonResourceUrl { path } => (
            None,
            Some(json!({
                "path": path,
                "verb": request.verb,
            })),
        ),
    };
    Ok(serde_json::from_value(json!({
        "apiVersion": "authorization.k8s.io/v1",
        "kind": "SubjectAccessReview",
        "metadata": {},
        "spec": {
            "user": identity.username(),
            "groups": identity.groups(),
            "resourceAttributes": resource_attributes,
            "nonResourceAttributes": non_resource_attributes,
        }
    }))?)
}

async fn check_request(
    api: &Api<SubjectAccessReview>,
    identity: &Identity,
    request: ReviewRequest,
) -> Result<AccessReviewResult, ReviewError> {
    let sar = subject_access_review(identity, &request)?;
    let res = api.create(&PostParams::default(), &sar).await?;
    let status = res
        .status
        .ok_or_else(|| ReviewError::empty_status(&request))?;
    if status.allowed {
        return Ok(AccessReviewResult::allowed(request));
    }
    let reason = status
        .reason
        .filter(|r| !r.is_empty())
        .or(status.evaluation_error.filter(|e| !e.is_empty()));
    debug!(review = %request.target, verb = %request.verb, ?reason, "access denied");
    Ok(AccessReviewResult::denied(request, reason))
}

#[async_trait]
impl Reviewer for KubeReviewer {
    async fn check_policy_rules(
        &self,
        identity: &Identity,
        rules: &[PolicyRule],
    ) -> Result<Vec<AccessReviewResult>, ReviewError> {
        if !identity.is_complete() {
            return Err(ReviewError::InvalidIdentity(identity.to_string()));
        }
        let requests = catalog::expand(rules);
        if requests.is_empty() {
            return Err(ReviewError::NoRules);
        }
        debug!(%identity, count = requests.len(), "issuing subject access reviews");
        let api: Api<SubjectAccessReview> = Api::all(self.client.clone());
        try_join_all(
            requests
                .into_iter()
                .map(|request| check_request(&api, identity, request)),
        )
        .await
    }
}
