pub const CERT_MANAGER_VERBS: [&str; 7] = [CREATE, GET, LIST, WATCH, UPDATE, PATCH, DELETE];

pub const CERT_MANAGER_RESOURCES: [&str; 3] = ["issuers", "certificaterequests", "certificates"];

pub const CERT_MANAGER_GROUP: &str = "cert-manager.io";

pub const CREATE: &str = "create";
pub const GET: &str = "get";
pub const LIST: &str = "list";
pub const WATCH: &str = "watch";
pub const UPDATE: &str = "update";
pub const PATCH: &str = "patch";
pub const DELETE: &str = "delete";

/// Prefix of every error raised while resolving the calling identity.
pub const IDENTITY_PHASE_PREFIX: &str = "not possible to check RBAC rules";
/// Prefix of every error raised while talking to the authorization backend.
pub const REVIEW_PHASE_PREFIX: &str = "unable to check rbac rules";

pub const NAMESPACE_ENV: &str = "OPERATOR_NAMESPACE";
pub const SERVICE_ACCOUNT_ENV: &str = "SERVICE_ACCOUNT_NAME";
pub const NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

pub const NON_RESOURCE_URL_PREFIX: &str = "nonResourceURL: ";
