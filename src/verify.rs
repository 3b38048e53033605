use std::collections::BTreeSet;
use std::time::Duration;

use k8s_openapi::api::rbac::v1::PolicyRule;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::catalog;
use crate::check::Reviewer;
use crate::error::{IdentityError, ReviewError, VerifyError};
use crate::identity::IdentityResolver;
use crate::types::{AccessReviewResult, Report, ReviewRequest};

/// Checks that an identity holds every permission of a rule catalog.
///
/// Missing permissions are reported as warnings, never as errors. Only a
/// failure to resolve the identity or to reach the reviewer is an error.
pub struct Verifier<'a> {
    pub resolver: &'a dyn IdentityResolver,
    pub reviewer: &'a dyn Reviewer,
    pub rules: Vec<PolicyRule>,
    pub timeout: Option<Duration>,
}

impl<'a> Verifier<'a> {
    pub fn new(resolver: &'a dyn IdentityResolver, reviewer: &'a dyn Reviewer) -> Self {
        Self {
            resolver,
            reviewer,
            rules: catalog::cert_manager_rules(),
            timeout: None,
        }
    }

    pub fn with_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the check and keeps every individual result.
    pub async fn report(&self) -> Result<Report, VerifyError> {
        let identity = self
            .resolver
            .resolve()
            .map_err(VerifyError::IdentityUnavailable)?;
        if identity.namespace.is_empty() {
            return Err(VerifyError::IdentityUnavailable(IdentityError::Empty {
                what: "namespace",
            }));
        }
        if identity.service_account.is_empty() {
            return Err(VerifyError::IdentityUnavailable(IdentityError::Empty {
                what: "service account",
            }));
        }
        if catalog::expand(&self.rules).is_empty() {
            return Err(VerifyError::ReviewBackendUnavailable(ReviewError::NoRules));
        }

        let review = self.reviewer.check_policy_rules(&identity, &self.rules);
        let results = match self.timeout {
            Some(after) => tokio::time::timeout(after, review)
                .await
                .map_err(|_| VerifyError::Cancelled { after })?,
            None => review.await,
        }
        .map_err(VerifyError::ReviewBackendUnavailable)?;

        ensure_coverage(&self.rules, &results).map_err(VerifyError::ReviewBackendUnavailable)?;

        let warnings = match aggregate::all_allowed(&results) {
            (true, _) => {
                info!(%identity, "all required permissions are granted");
                Vec::new()
            }
            (false, denied) => {
                let warnings = aggregate::group_by_resource(denied).messages();
                warn!(%identity, count = warnings.len(), "missing required permissions");
                warnings
            }
        };

        Ok(Report {
            identity,
            results,
            warnings,
        })
    }

    /// Returns one warning per resource the identity is missing verbs on.
    /// An empty list means the identity is fully authorized.
    pub async fn verify(&self) -> Result<Vec<String>, VerifyError> {
        Ok(self.report().await?.warnings)
    }
}

/// Checks the reviewer answered for exactly the pairs the rules require.
fn ensure_coverage(
    rules: &[PolicyRule],
    results: &[AccessReviewResult],
) -> Result<(), ReviewError> {
    let expected = catalog::expand(rules);
    let got = results
        .iter()
        .map(AccessReviewResult::request)
        .collect::<BTreeSet<ReviewRequest>>();
    let missing = expected.difference(&got).count();
    let unexpected = got.difference(&expected).count();
    // a pair answered twice counts as unexpected
    let duplicated = results.len() - got.len();
    if missing > 0 || unexpected + duplicated > 0 {
        debug!(missing, unexpected, duplicated, "reviewer results do not cover the rules");
        return Err(ReviewError::IncompleteReview {
            missing,
            unexpected: unexpected + duplicated,
        });
    }
    Ok(())
}

/// Checks the permissions needed to manage cert-manager certificates.
pub async fn check_cert_manager_permissions(
    resolver: &dyn IdentityResolver,
    reviewer: &dyn Reviewer,
) -> Result<Vec<String>, VerifyError> {
    Verifier::new(resolver, reviewer).verify().await
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::Phase;
    use crate::identity::StaticResolver;
    use crate::types::{Identity, ReviewTarget};

    /// Denies the listed (resource, verb) pairs and allows the rest.
    #[derive(Default)]
    struct MockReviewer {
        denied: HashSet<(&'static str, &'static str)>,
        fail: bool,
        delay: Option<Duration>,
        drop_one: bool,
        calls: AtomicUsize,
    }

    impl MockReviewer {
        fn denying(denied: &[(&'static str, &'static str)]) -> Self {
            Self {
                denied: denied.iter().cloned().collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Reviewer for MockReviewer {
        async fn check_policy_rules(
            &self,
            _identity: &Identity,
            rules: &[PolicyRule],
        ) -> Result<Vec<AccessReviewResult>, ReviewError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ReviewError::EmptyStatus {
                    target: String::from("issuers"),
                    verb: String::from("get"),
                });
            }
            let mut results = catalog::expand(rules)
                .into_iter()
                .map(|request| {
                    let denied = match &request.target {
                        ReviewTarget::Resource { resource, .. } => self
                            .denied
                            .iter()
                            .any(|(r, v)| *r == resource.as_str() && *v == request.verb),
                        ReviewTarget::NonResourceUrl { .. } => false,
                    };
                    if denied {
                        AccessReviewResult::denied(request, Some(String::from("forbidden")))
                    } else {
                        AccessReviewResult::allowed(request)
                    }
                })
                .collect::<Vec<AccessReviewResult>>();
            if self.drop_one {
                results.pop();
            }
            Ok(results)
        }
    }

    struct FailingResolver;

    impl IdentityResolver for FailingResolver {
        fn namespace(&self) -> Result<String, IdentityError> {
            Err(IdentityError::MissingEnv {
                var: "OPERATOR_NAMESPACE",
            })
        }

        fn service_account(&self) -> Result<String, IdentityError> {
            Ok(String::from("operator"))
        }
    }

    /// Resolver that skips validation and hands out empty strings.
    struct BlankResolver;

    impl IdentityResolver for BlankResolver {
        fn namespace(&self) -> Result<String, IdentityError> {
            Ok(String::new())
        }

        fn service_account(&self) -> Result<String, IdentityError> {
            Ok(String::new())
        }
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new("observability", "operator")
    }

    fn small_rules() -> Vec<PolicyRule> {
        vec![PolicyRule {
            resources: Some(vec![String::from("certificates"), String::from("issuers")]),
            verbs: vec![String::from("get"), String::from("create")],
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_all_allowed_returns_no_warnings() {
        let reviewer = MockReviewer::default();
        let warnings = check_cert_manager_permissions(&resolver(), &reviewer)
            .await
            .expect("check should succeed");
        assert!(warnings.is_empty());
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_denial_is_a_warning() {
        let resolver = resolver();
        let reviewer = MockReviewer::denying(&[("certificates", "create")]);
        let warnings = Verifier::new(&resolver, &reviewer)
            .with_rules(small_rules())
            .verify()
            .await
            .expect("denials are not errors");
        assert_eq!(warnings, vec!["certificates: missing verbs [create]"]);
    }

    #[tokio::test]
    async fn test_every_denial_lists_both_verbs() {
        let resolver = resolver();
        let reviewer = MockReviewer::denying(&[
            ("certificates", "get"),
            ("certificates", "create"),
            ("issuers", "get"),
            ("issuers", "create"),
        ]);
        let warnings = Verifier::new(&resolver, &reviewer)
            .with_rules(small_rules())
            .verify()
            .await
            .expect("denials are not errors");
        assert_eq!(
            warnings,
            vec![
                "certificates: missing verbs [create, get]",
                "issuers: missing verbs [create, get]",
            ]
        );
    }

    #[tokio::test]
    async fn test_report_keeps_every_result() {
        let resolver = resolver();
        let reviewer = MockReviewer::denying(&[("issuers", "delete")]);
        let report = Verifier::new(&resolver, &reviewer)
            .report()
            .await
            .expect("check should succeed");
        assert_eq!(report.identity, Identity::new("observability", "operator"));
        assert_eq!(report.results.len(), 21);
        assert_eq!(report.warnings, vec!["cert-manager.io/issuers: missing verbs [delete]"]);
    }

    #[tokio::test]
    async fn test_denials_in_different_groups_stay_apart() {
        let resolver = resolver();
        let reviewer = MockReviewer::denying(&[("deployments", "get")]);
        let rules = vec![PolicyRule {
            api_groups: Some(vec![String::from("apps"), String::from("extensions")]),
            resources: Some(vec![String::from("deployments")]),
            verbs: vec![String::from("get"), String::from("list")],
            ..Default::default()
        }];
        let warnings = Verifier::new(&resolver, &reviewer)
            .with_rules(rules)
            .verify()
            .await
            .expect("denials are not errors");
        assert_eq!(
            warnings,
            vec![
                "apps/deployments: missing verbs [get]",
                "extensions/deployments: missing verbs [get]",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_rules_are_rejected_before_review() {
        let resolver = resolver();
        let reviewer = MockReviewer::default();
        let err = Verifier::new(&resolver, &reviewer)
            .with_rules(Vec::new())
            .verify()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::ReviewBackendUnavailable(ReviewError::NoRules)
        ));
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 0);

        let rules = vec![PolicyRule {
            api_groups: Some(vec![String::from("apps")]),
            verbs: vec![String::from("get")],
            ..Default::default()
        }];
        let err = Verifier::new(&resolver, &reviewer)
            .with_rules(rules)
            .verify()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::ReviewBackendUnavailable(ReviewError::NoRules)
        ));
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_identity_is_rejected_before_review() {
        let reviewer = MockReviewer::default();
        let err = check_cert_manager_permissions(&BlankResolver, &reviewer)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Phase::Identity);
        assert!(matches!(
            err,
            VerifyError::IdentityUnavailable(IdentityError::Empty { what: "namespace" })
        ));
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identity_failure_skips_review() {
        let reviewer = MockReviewer::default();
        let err = check_cert_manager_permissions(&FailingResolver, &reviewer)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Phase::Identity);
        assert!(matches!(
            err,
            VerifyError::IdentityUnavailable(IdentityError::MissingEnv { .. })
        ));
        assert!(err
            .to_string()
            .starts_with("not possible to check RBAC rules: "));
        assert_eq!(reviewer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reviewer_failure_is_an_error() {
        let reviewer = MockReviewer {
            fail: true,
            ..Default::default()
        };
        let err = check_cert_manager_permissions(&resolver(), &reviewer)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Phase::Review);
        assert!(matches!(
            err,
            VerifyError::ReviewBackendUnavailable(ReviewError::EmptyStatus { .. })
        ));
        assert!(err.to_string().starts_with("unable to check rbac rules: "));
    }

    #[tokio::test]
    async fn test_incomplete_review_is_an_error() {
        let reviewer = MockReviewer {
            drop_one: true,
            ..Default::default()
        };
        let err = check_cert_manager_permissions(&resolver(), &reviewer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::ReviewBackendUnavailable(ReviewError::IncompleteReview {
                missing: 1,
                unexpected: 0
            })
        ));
    }

    #[tokio::test]
    async fn test_timeout_cancels_review() {
        let resolver = resolver();
        let reviewer = MockReviewer {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let err = Verifier::new(&resolver, &reviewer)
            .with_timeout(Some(Duration::from_millis(10)))
            .verify()
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::Cancelled { .. }));
    }

    #[test]
    fn test_ensure_coverage_rejects_duplicates() {
        let rules = small_rules();
        let mut results = catalog::expand(&rules)
            .into_iter()
            .map(AccessReviewResult::allowed)
            .collect::<Vec<AccessReviewResult>>();
        assert!(ensure_coverage(&rules, &results).is_ok());
        results.push(results[0].clone());
        assert!(matches!(
            ensure_coverage(&rules, &results),
            Err(ReviewError::IncompleteReview {
                missing: 0,
                unexpected: 1
            })
        ));
    }
}
