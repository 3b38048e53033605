use std::time::Duration;

use thiserror::Error;

use crate::constants::{IDENTITY_PHASE_PREFIX, REVIEW_PHASE_PREFIX};
use crate::types::ReviewRequest;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{var} env variable not found")]
    MissingEnv { var: &'static str },
    #[error("unable to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{what} is empty")]
    Empty { what: &'static str },
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no policy rules to check")]
    NoRules,
    #[error("identity {0:?} is not fully resolved")]
    InvalidIdentity(String),
    #[error("access review request failed: {0}")]
    Kube(#[from] kube::Error),
    #[error("unable to build access review: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("access review for {verb} {target} came back without a status")]
    EmptyStatus { target: String, verb: String },
    #[error("reviewer returned {missing} missing and {unexpected} unexpected results")]
    IncompleteReview {
        missing: usize,
        unexpected: usize,
    },
}

impl ReviewError {
    pub(crate) fn empty_status(request: &ReviewRequest) -> Self {
        ReviewError::EmptyStatus {
            target: request.target.to_string(),
            verb: request.verb.clone(),
        }
    }
}

/// Which step of a permission check failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Identity,
    Review,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{}: {0}", IDENTITY_PHASE_PREFIX)]
    IdentityUnavailable(#[source] IdentityError),
    #[error("{}: {0}", REVIEW_PHASE_PREFIX)]
    ReviewBackendUnavailable(#[source] ReviewError),
    #[error("{}: cancelled after {after:?}", REVIEW_PHASE_PREFIX)]
    Cancelled { after: Duration },
}

impl VerifyError {
    pub fn phase(&self) -> Phase {
        match self {
            VerifyError::IdentityUnavailable(_) => Phase::Identity,
            VerifyError::ReviewBackendUnavailable(_) | VerifyError::Cancelled { .. } => {
                Phase::Review
            }
        }
    }
}
