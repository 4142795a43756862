use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::render::MIN_MESSAGE_LEN;
use crate::routing::{Route, RoutingTable};

/// How the routing key is pulled out of the alert text.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Parenthesised URL, matched by substring.
    #[default]
    Url,
    /// Site name, matched by prefix.
    Name,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStrategy::Url => write!(f, "url"),
            MatchStrategy::Name => write!(f, "name"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    #[default]
    MarkdownV2,
    Plain,
}

impl MessageFormat {
    /// Value for the Bot API `parse_mode` field, if any.
    pub fn parse_mode(self) -> Option<&'static str> {
        match self {
            MessageFormat::MarkdownV2 => Some("MarkdownV2"),
            MessageFormat::Plain => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_telegram_config")]
    pub telegram: TelegramConfig,
    #[serde(default = "default_router_config")]
    pub router: RouterConfig,
    #[serde(default = "default_error_webhook_config")]
    pub error_webhook: ErrorWebhookConfig,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Name of the environment variable holding the bot token
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// Name of the environment variable holding the shared secret
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
    #[serde(default)]
    pub strategy: MatchStrategy,
    #[serde(default)]
    pub format: MessageFormat,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ErrorWebhookConfig {
    #[serde(default = "default_error_webhook_env")]
    pub url_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    /// Optional display name used as the site label in rendered messages
    #[serde(default)]
    pub name: Option<String>,
    /// URL substring or site-name prefix, depending on the strategy
    pub pattern: String,
    /// Literal chat identifiers
    #[serde(default)]
    pub chat_ids: Vec<String>,
    /// Environment variables holding chat identifiers; all are required
    #[serde(default)]
    pub chat_id_envs: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

fn default_secret_env() -> String {
    "ROUTER_SECRET".to_string()
}

fn default_error_webhook_env() -> String {
    "ERROR_WEBHOOK_URL".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

// Telegram caps messages at 4096 characters.
fn default_max_message_len() -> usize {
    4000
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
    }
}

fn default_telegram_config() -> TelegramConfig {
    TelegramConfig {
        api_base_url: default_api_base_url(),
        bot_token_env: default_bot_token_env(),
        timeout_secs: default_timeout_secs(),
    }
}

fn default_router_config() -> RouterConfig {
    RouterConfig {
        secret_env: default_secret_env(),
        strategy: MatchStrategy::default(),
        format: MessageFormat::default(),
        max_message_len: default_max_message_len(),
    }
}

fn default_error_webhook_config() -> ErrorWebhookConfig {
    ErrorWebhookConfig {
        url_env: default_error_webhook_env(),
        timeout_secs: default_timeout_secs(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.router.max_message_len < MIN_MESSAGE_LEN {
            anyhow::bail!(
                "router.max_message_len must be at least {}, got {}",
                MIN_MESSAGE_LEN,
                config.router.max_message_len
            );
        }
        Ok(config)
    }
}

/// Configuration resolved against the environment. Built once at startup
/// and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub strategy: MatchStrategy,
    pub format: MessageFormat,
    pub max_message_len: usize,
    pub telegram_api_base_url: String,
    pub telegram_timeout: Duration,
    pub error_webhook_timeout: Duration,
    pub secret: Option<String>,
    pub bot_token: Option<String>,
    pub error_webhook_url: Option<String>,
    pub table: RoutingTable,
    /// Names of required values that were not set
    pub missing: Vec<String>,
}

impl Settings {
    pub fn from_env(config: &Config) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve `config` with `lookup` as the environment. Empty values count
    /// as unset.
    pub fn resolve<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut missing = Vec::new();

        let mut require = |name: &str| {
            let value = get(name);
            if value.is_none() && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
            value
        };

        let secret = require(&config.router.secret_env);
        let bot_token = require(&config.telegram.bot_token_env);

        let mut routes = Vec::with_capacity(config.routes.len());
        for route in &config.routes {
            // A skipped route must not make its chat envs required.
            if route.pattern.trim().is_empty() {
                warn!(
                    "Skipping route {:?} with an empty pattern",
                    route.name.as_deref().unwrap_or("<unnamed>")
                );
                continue;
            }

            let mut destinations = route.chat_ids.clone();
            for env_name in &route.chat_id_envs {
                if let Some(chat_id) = require(env_name) {
                    destinations.push(chat_id);
                }
            }

            routes.push(Route {
                name: route.name.clone(),
                pattern: route.pattern.clone(),
                destinations,
            });
        }

        let error_webhook_url = get(&config.error_webhook.url_env);

        Self {
            bind: config.server.bind.clone(),
            strategy: config.router.strategy,
            format: config.router.format,
            max_message_len: config.router.max_message_len,
            telegram_api_base_url: config.telegram.api_base_url.clone(),
            telegram_timeout: Duration::from_secs(config.telegram.timeout_secs),
            error_webhook_timeout: Duration::from_secs(config.error_webhook.timeout_secs),
            secret,
            bot_token,
            error_webhook_url,
            table: RoutingTable::new(routes),
            missing,
        }
    }

    /// The shared secret, or an error naming every missing required value.
    pub fn require_complete(&self) -> Result<&str> {
        if !self.missing.is_empty() {
            anyhow::bail!(
                "Missing required configuration: {}",
                self.missing.join(", ")
            );
        }
        self.secret
            .as_deref()
            .context("Missing required configuration: router secret")
    }
}
