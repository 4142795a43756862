use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};

use crate::telegram::ChatSender;

/// Result of one fan-out. Every destination is attempted; none is retried.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, anyhow::Error)>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// The fan-out fails if any destination failed, even when others were
    /// delivered.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.failed.is_empty() {
            return Ok(self.delivered);
        }

        let attempted = self.attempted();
        let details = self
            .failed
            .iter()
            .map(|(dest, err)| format!("{}: {:#}", dest, err))
            .collect::<Vec<_>>()
            .join("; ");
        anyhow::bail!(
            "Failed to deliver to {} of {} destination(s) ({} delivered): {}",
            self.failed.len(),
            attempted,
            self.delivered.len(),
            details
        );
    }
}

/// Send `text` to every destination concurrently and wait for all of them.
pub async fn fan_out(
    sender: &dyn ChatSender,
    destinations: &[&str],
    text: &str,
    parse_mode: Option<&'static str>,
) -> DispatchReport {
    let sends = destinations.iter().map(|&dest| async move {
        let result = sender.send_message(dest, text, parse_mode).await;
        (dest, result)
    });

    let mut report = DispatchReport::default();
    for (dest, result) in join_all(sends).await {
        match result {
            Ok(()) => {
                info!("Delivered alert to {}", dest);
                report.delivered.push(dest.to_string());
            }
            Err(e) => {
                warn!("Delivery to {} failed: {:#}", dest, e);
                report.failed.push((dest.to_string(), e));
            }
        }
    }
    report
}
