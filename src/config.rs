use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_SERVICE_NAME: &str = "lms";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_EVENT_WEBHOOK_URL: &str = "http://localhost:8000/webhook/course-completed";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub service_name: String,
    pub inbound_secret: Option<String>,
    pub log_json: bool,
    /// Target of the direct call made after a certificate upsert.
    pub certificate_api: WebhookConfig,
    /// Target of the certificate created/changed event handlers.
    pub event_webhook: WebhookConfig,
}

/// Outbound webhook settings, resolved once and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    pub enabled: bool,
    pub timeout: Duration,
    pub bearer_token: Option<String>,
}

// Hand-written so the token never reaches the logs.
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("enabled", &self.enabled)
            .field("timeout", &self.timeout)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Why an outbound call was not attempted. Neither case is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ConfigDisabled,
    ConfigMissing,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            enabled: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bearer_token: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new("")
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Returns the reason to skip the outbound call, or `None` when the
    /// notifier may be invoked.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if !self.enabled {
            Some(SkipReason::ConfigDisabled)
        } else if self.url.trim().is_empty() {
            Some(SkipReason::ConfigMissing)
        } else {
            None
        }
    }

    fn from_lookup<F>(lookup: &F, prefix: &str, default_url: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Present but blank stays blank (ConfigMissing). Only an absent URL
        // takes the default.
        let url = match lookup(&format!("{}_URL", prefix)) {
            Some(raw) => raw.trim().to_string(),
            None => default_url.map(str::to_string).unwrap_or_default(),
        };
        let enabled = match lookup_non_empty(lookup, &format!("{}_ENABLED", prefix)) {
            Some(raw) => parse_bool(&format!("{}_ENABLED", prefix), &raw)?,
            None => true,
        };
        let timeout_secs = match lookup_non_empty(lookup, &format!("{}_TIMEOUT", prefix)) {
            Some(raw) => parse_timeout(&format!("{}_TIMEOUT", prefix), &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            url,
            enabled,
            timeout: Duration::from_secs(timeout_secs),
            bearer_token: None,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_address = lookup_non_empty(&lookup, "SERVER_ADDRESS")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        server_address.parse::<SocketAddr>().map_err(|e| {
            Error::Config(format!("Invalid value for SERVER_ADDRESS: {}", e))
        })?;

        let mut certificate_api =
            WebhookConfig::from_lookup(&lookup, "EXTERNAL_CERTIFICATE_API", None)?;
        certificate_api.bearer_token = lookup_non_empty(&lookup, "EXTERNAL_CERTIFICATE_API_KEY");

        let mut event_webhook =
            WebhookConfig::from_lookup(&lookup, "ICG_WEBHOOK", Some(DEFAULT_EVENT_WEBHOOK_URL))?;
        event_webhook.bearer_token = lookup_non_empty(&lookup, "ICG_WEBHOOK_TOKEN");

        Ok(Self {
            server_address,
            service_name: lookup_non_empty(&lookup, "SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            inbound_secret: lookup_non_empty(&lookup, "INBOUND_WEBHOOK_SECRET"),
            log_json: lookup_non_empty(&lookup, "LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            certificate_api,
            event_webhook,
        })
    }
}

fn lookup_non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "Invalid value for {}: expected a boolean, got {}",
            name, raw
        ))),
    }
}

fn parse_timeout(name: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    if secs == 0 {
        return Err(Error::Config(format!(
            "Invalid value for {}: timeout must be positive",
            name
        )));
    }
    Ok(secs)
}
