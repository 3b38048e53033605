use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use crate::types;

pub struct Json {
    result: JsonReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    identity: types::Identity,
    allowed: bool,
    warnings: Vec<String>,
    denied: BTreeMap<String, Vec<JsonDenial>>,
}

#[derive(Serialize)]
struct JsonDenial {
    verb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<types::Report> for JsonReport {
    fn from(value: types::Report) -> Self {
        let mut denied: BTreeMap<String, Vec<JsonDenial>> = BTreeMap::new();
        for result in value.results.into_iter().filter(|r| !r.allowed) {
            denied
                .entry(result.target.to_string())
                .or_default()
                .push(JsonDenial {
                    verb: result.verb,
                    reason: result.denial_reason,
                });
        }
        Self {
            identity: value.identity,
            allowed: value.warnings.is_empty(),
            warnings: value.warnings,
            denied,
        }
    }
}

impl Json {
    pub fn new(report: types::Report) -> Self {
        Self {
            result: report.into(),
        }
    }
}

impl Display for Json {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.result) {
            Ok(output) => f.write_str(&output),
            Err(_e) => Err(std::fmt::Error),
        }
    }
}
