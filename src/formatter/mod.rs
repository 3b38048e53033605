use std::fmt::Display;

use crate::config;
use crate::types;

mod json;
mod pretty;

pub enum Formatter {
    Pretty(pretty::Pretty),
    Json(json::Json),
}

impl Formatter {
    pub fn new(config: &config::Config, report: types::Report) -> Self {
        match config.format {
            config::Format::Json => Formatter::Json(json::Json::new(report)),
            config::Format::Pretty => {
                Formatter::Pretty(pretty::Pretty::new(config.display_group, report))
            }
        }
    }
}

impl Display for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formatter::Pretty(p) => p.fmt(f),
            Formatter::Json(j) => j.fmt(f),
        }
    }
}
