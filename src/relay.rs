use std::sync::Arc;

use anyhow::{Context, Result};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::dispatch::fan_out;
use crate::extract::{extract_routing_key, extract_site_name};
use crate::payload::AlertPayload;
use crate::render::render;
use crate::telegram::ChatSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Every resolved destination accepted the message
    Delivered { destinations: Vec<String> },
    /// No routing key, or no route for it
    NoRoute,
    Unauthorized,
}

/// The alert router: authenticates, extracts, routes, renders and fans out.
pub struct AlertRouter {
    settings: Arc<Settings>,
    sender: Arc<dyn ChatSender>,
}

impl AlertRouter {
    pub fn new(settings: Arc<Settings>, sender: Arc<dyn ChatSender>) -> Self {
        Self { settings, sender }
    }

    pub async fn handle(&self, key: Option<&str>, body: &[u8]) -> Result<RelayOutcome> {
        let secret = self.settings.require_complete()?;

        match key {
            Some(key) if secrets_match(key, secret) => {}
            _ => {
                warn!("Rejected alert with missing or invalid key");
                return Ok(RelayOutcome::Unauthorized);
            }
        }

        let payload = AlertPayload::from_body(body);
        let message = payload.message();
        debug!("Alert message: {}", message);

        let Some(routing_key) = extract_routing_key(self.settings.strategy, &message) else {
            info!("No routing key in alert, skipping");
            return Ok(RelayOutcome::NoRoute);
        };

        let Some(route) = self.settings.table.resolve(&routing_key) else {
            info!("No route for {:?}, skipping", routing_key);
            return Ok(RelayOutcome::NoRoute);
        };

        let destinations = route.destinations();
        if destinations.is_empty() {
            info!("Route {:?} has no destinations, skipping", route.pattern);
            return Ok(RelayOutcome::NoRoute);
        }

        let site = route
            .name
            .as_deref()
            .unwrap_or_else(|| extract_site_name(&message));
        let text = render(
            self.settings.format,
            site,
            &message,
            self.settings.max_message_len,
        );

        info!(
            "Relaying alert for {} to {} destination(s)",
            site,
            destinations.len()
        );

        let delivered = fan_out(
            self.sender.as_ref(),
            &destinations,
            &text,
            self.settings.format.parse_mode(),
        )
        .await
        .into_result()
        .with_context(|| format!("Failed to relay alert for {}", site))?;

        Ok(RelayOutcome::Delivered {
            destinations: delivered,
        })
    }
}

/// Constant-time comparison of the query key against the shared secret.
fn secrets_match(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}
