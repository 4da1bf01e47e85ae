use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::TrackersConfig;

use super::{TrackerError, TrackerSource};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Downloads a plain text announce list, one endpoint per line.
pub struct HttpTrackerSource {
    client: Client,
    url: String,
}

impl HttpTrackerSource {
    pub fn new(config: TrackersConfig) -> Result<Self, TrackerError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: config.url,
        })
    }
}

#[async_trait]
impl TrackerSource for HttpTrackerSource {
    async fn fetch(&self) -> Result<Vec<String>, TrackerError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let trackers = parse_tracker_list(&body);
        debug!(url = %self.url, count = trackers.len(), "Fetched tracker list");
        Ok(trackers)
    }
}

/// Parse a newline separated list, skipping blanks, comments and repeats.
pub(crate) fn parse_tracker_list(body: &str) -> Vec<String> {
    let mut trackers: Vec<String> = Vec::new();
    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !trackers.iter().any(|t| t == line) {
            trackers.push(line.to_string());
        }
    }
    trackers
}
