use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use k8s_openapi::api::rbac::v1::PolicyRule;

use crate::constants;
use crate::types::{ReviewRequest, ReviewTarget};

/// Permissions needed to manage cert-manager certificates on behalf of users.
pub fn cert_manager_rules() -> Vec<PolicyRule> {
    vec![PolicyRule {
        api_groups: Some(vec![constants::CERT_MANAGER_GROUP.to_string()]),
        resources: Some(
            constants::CERT_MANAGER_RESOURCES
                .iter()
                .map(|r| r.to_string())
                .collect(),
        ),
        verbs: constants::CERT_MANAGER_VERBS
            .iter()
            .map(|v| v.to_string())
            .collect(),
        ..Default::default()
    }]
}

/// Reads a JSON list of policy rules.
pub fn load_rules(path: &Path) -> Result<Vec<PolicyRule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read rules from {}", path.display()))?;
    let rules: Vec<PolicyRule> = serde_json::from_str(&content)
        .with_context(|| format!("unable to parse rules from {}", path.display()))?;
    Ok(rules)
}

/// Every (target, verb) pair the rules require, each listed once.
///
/// A rule without API groups applies to the core group.
pub fn expand(rules: &[PolicyRule]) -> BTreeSet<ReviewRequest> {
    let core_group = vec![String::new()];
    let mut requests = BTreeSet::new();
    for rule in rules {
        let groups = match rule.api_groups.as_ref() {
            Some(groups) if !groups.is_empty() => groups,
            _ => &core_group,
        };
        for verb in &rule.verbs {
            for group in groups {
                for resource in rule.resources.iter().flatten() {
                    requests.insert(ReviewRequest {
                        target: ReviewTarget::resource(group.clone(), resource.clone()),
                        verb: verb.clone(),
                    });
                }
            }
            for path in rule.non_resource_urls.iter().flatten() {
                requests.insert(ReviewRequest {
                    target: ReviewTarget::non_resource_url(path.clone()),
                    verb: verb.clone(),
                });
            }
        }
    }
    requests
}
