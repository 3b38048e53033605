use tracing::debug;

use crate::types::{AccessReviewResult, WarningSet};

/// Returns whether every result is allowed, along with the denied ones.
pub fn all_allowed(results: &[AccessReviewResult]) -> (bool, Vec<&AccessReviewResult>) {
    let denied = results
        .iter()
        .filter(|r| !r.allowed)
        .collect::<Vec<&AccessReviewResult>>();
    (denied.is_empty(), denied)
}

/// Folds denied results into one entry per resource listing its denied verbs.
pub fn group_by_resource<'a, I>(denied: I) -> WarningSet
where
    I: IntoIterator<Item = &'a AccessReviewResult>,
{
    let mut warnings = WarningSet::default();
    for result in denied.into_iter().filter(|r| !r.allowed) {
        debug!(
            review = %result.target,
            verb = %result.verb,
            reason = ?result.denial_reason,
            "missing permission"
        );
        warnings
            .items
            .entry(result.target.key())
            .or_default()
            .insert(result.verb.clone());
    }
    warnings
}
