//! Verifies that a service account holds the RBAC permissions a feature needs,
//! and explains what is missing, grouped by resource, when it does not.

pub mod aggregate;
pub mod catalog;
pub mod check;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod identity;
pub mod types;
pub mod verify;

pub use check::{KubeReviewer, Reviewer};
pub use error::{IdentityError, Phase, ReviewError, VerifyError};
pub use identity::{IdentityResolver, InClusterResolver, OverrideResolver, StaticResolver};
pub use verify::{check_cert_manager_permissions, Verifier};
