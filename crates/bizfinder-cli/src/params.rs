//! Search parameters supplied as JSON, inline or from a file.
//!
//! Unknown keys are ignored so parameter files written for other tools
//! still load.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::search::SearchArgs;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub(crate) struct SearchParams {
    pub(crate) search_term: Option<String>,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) radius: Option<f64>,
    pub(crate) sub_radius: Option<f64>,
    pub(crate) max_workers: Option<usize>,
}

impl SearchParams {
    pub(crate) fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("invalid JSON search parameters")
    }

    pub(crate) fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read parameter file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in parameter file {}", path.display()))
    }

    /// Overwrite every flag value this parameter set provides.
    pub(crate) fn apply_to(self, args: &mut SearchArgs) {
        if let Some(term) = self.search_term {
            args.search_term = term;
        }
        if self.latitude.is_some() {
            args.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            args.longitude = self.longitude;
        }
        if let Some(radius) = self.radius {
            args.radius = radius;
        }
        if self.sub_radius.is_some() {
            args.sub_radius = self.sub_radius;
        }
        if self.max_workers.is_some() {
            args.max_workers = self.max_workers;
        }
    }
}
