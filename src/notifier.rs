//! Best-effort error reporting to an external webhook.
//!
//! Nothing in here returns an error to the caller: a missing URL, a network
//! failure or a non-success status is logged and then ignored.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::render::truncate_chars;

const MAX_TRACE_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub trace: String,
    pub request_id: String,
    pub service: &'static str,
}

impl ErrorReport {
    pub fn new(err: &anyhow::Error, request_id: &str) -> Self {
        Self {
            title: "Upptime relay failure".to_string(),
            message: format!("{:#}", err),
            timestamp: Utc::now(),
            trace: truncate_chars(&format!("{:?}", err), MAX_TRACE_CHARS).to_string(),
            request_id: request_id.to_string(),
            service: env!("CARGO_PKG_NAME"),
        }
    }
}

pub struct ErrorNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl ErrorNotifier {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Self {
        // Building only fails if the TLS backend cannot initialise; fall back
        // to the default client rather than lose error reporting entirely.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build error webhook client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            webhook_url,
        }
    }

    pub fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn notify(&self, err: &anyhow::Error, request_id: &str) {
        let Some(url) = self.webhook_url.as_deref() else {
            warn!("Error webhook not configured, skipping error report");
            return;
        };

        let report = ErrorReport::new(err, request_id);

        match self.client.post(url).json(&report).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Error report {} sent", request_id);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("Error webhook returned {}: {}", status, body);
            }
            Err(e) => {
                error!("Failed to send error report: {}", e.without_url());
            }
        }
    }
}
