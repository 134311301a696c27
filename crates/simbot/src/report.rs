//! Report URLs and the machine-readable report payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

/// Path fragment present in the browser location once a simulation finishes.
pub const REPORT_PATH_MARKER: &str = "/simbot/report/";

static REPORT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:simbot/report|reports)/([A-Za-z0-9]+)").expect("valid regex")
});

/// Whether a browser location is a finished-report page.
pub fn is_report_location(location: &str) -> bool {
    location.contains(REPORT_PATH_MARKER)
}

/// A parsed finished-report URL.
///
/// Only the report id is kept. The host the URL names is discarded: report
/// data is always fetched from the configured service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUrl {
    id: String,
}

impl ReportUrl {
    /// Parse `https://host/simbot/report/{id}` (or the `/reports/{id}` form).
    ///
    /// Returns `None` for anything that is not an http(s) URL carrying a
    /// report id.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let id = REPORT_ID_RE
            .captures(url.path())?
            .get(1)?
            .as_str()
            .to_string();
        Some(Self { id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The JSON report endpoint: `{base}/reports/{id}/data.json`.
    pub fn data_json_url(&self, base_url: &str) -> String {
        format!("{}/reports/{}/data.json", base_url.trim_end_matches('/'), self.id)
    }
}

/// Numbers extracted from a finished report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedResult {
    pub mean_throughput: f64,
    pub gear_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReportDocument {
    sim: Option<SimSection>,
    #[serde(default)]
    players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
struct SimSection {
    #[serde(default)]
    players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
struct Player {
    collected_data: Option<CollectedData>,
    equipped_item_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CollectedData {
    dps: Option<Metric>,
}

#[derive(Debug, Deserialize)]
struct Metric {
    mean: Option<f64>,
}

/// Parse a report body.
///
/// Players are read from `sim.players` and fall back to a top-level
/// `players` array. Returns `Ok(None)` while the report has no mean DPS yet
/// (the service is still post-processing).
pub fn parse_report(body: &str) -> Result<Option<ExtractedResult>, serde_json::Error> {
    let doc: ReportDocument = serde_json::from_str(body)?;
    let players = match doc.sim {
        Some(sim) if !sim.players.is_empty() => sim.players,
        _ => doc.players,
    };
    let Some(player) = players.into_iter().next() else {
        return Ok(None);
    };

    let mean = player
        .collected_data
        .and_then(|c| c.dps)
        .and_then(|d| d.mean)
        .filter(|m| m.is_finite());

    Ok(mean.map(|mean_throughput| ExtractedResult {
        mean_throughput,
        gear_score: player.equipped_item_level,
    }))
}
