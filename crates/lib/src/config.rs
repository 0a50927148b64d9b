//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.lull/config.json`). Secrets
//! and forward URLs can be overridden from the environment so deployments
//! never need them on disk.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway (health + webhook) server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Responder settings (debounce window, history fetch, reply templates).
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Message bridge API settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Optional burst-event forwarding webhook.
    #[serde(default)]
    pub forward: ForwardConfig,
}

impl Config {
    /// Reject configurations the responder cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.responder.debounce_ms == 0 {
            bail!("responder.debounceMs must be a positive number of milliseconds");
        }
        if self.responder.fetch_limit == 0 {
            bail!("responder.fetchLimit must be a positive message count");
        }
        Ok(())
    }
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the HTTP health and webhook routes (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Shared secret required in X-Webhook-Secret on webhook POSTs.
    /// Overridden by LULL_WEBHOOK_SECRET env when set. Absent = no check.
    pub webhook_secret: Option<String>,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            webhook_secret: None,
        }
    }
}

/// Debounce window, history fetch limit, and reply templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderConfig {
    /// Quiet window after the last inbound message before a burst is
    /// considered settled, in milliseconds (default 4000).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How many recent items to fetch from the authoritative history when a
    /// burst looks settled (default 50).
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// The two canned replies.
    #[serde(default)]
    pub reply: ReplyTemplates,
}

fn default_debounce_ms() -> u64 {
    4000
}

fn default_fetch_limit() -> u32 {
    50
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            fetch_limit: default_fetch_limit(),
            reply: ReplyTemplates::default(),
        }
    }
}

/// Canned reply texts, selected by burst classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyTemplates {
    /// Sent when the burst contained at least one attachment.
    #[serde(default = "default_attachment_ack")]
    pub attachment_ack: String,

    /// Sent when the burst was text only.
    #[serde(default = "default_solicitation")]
    pub solicitation: String,
}

fn default_attachment_ack() -> String {
    "Your resume was received successfully! ✅\n\nIf an opening matches your profile, our team will be in touch.\n\nGood luck! 🚀".to_string()
}

fn default_solicitation() -> String {
    "Hello!\n\n*Send your resume to join the selection process!* 📩\n\nThanks for your interest! 🤗".to_string()
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self {
            attachment_ack: default_attachment_ack(),
            solicitation: default_solicitation(),
        }
    }
}

/// Message bridge API settings (base URL + token).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Base URL of the message bridge REST API (e.g. "http://127.0.0.1:8080").
    pub base_url: Option<String>,
    /// Bearer token for the bridge API. Overridden by LULL_BRIDGE_TOKEN env when set.
    pub api_token: Option<String>,
}

/// Burst-event forwarding webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardConfig {
    /// When set, burst events are POSTed here as JSON. Overridden by LULL_FORWARD_URL env.
    pub url: Option<String>,
    /// Optional bearer token for the forward webhook. Overridden by LULL_FORWARD_TOKEN env.
    pub token: Option<String>,
}

fn env_or(config_value: Option<&String>, env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            config_value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the bridge API token: env LULL_BRIDGE_TOKEN overrides config.
pub fn resolve_bridge_token(config: &Config) -> Option<String> {
    env_or(config.bridge.api_token.as_ref(), "LULL_BRIDGE_TOKEN")
}

/// Resolve the forward webhook URL: env LULL_FORWARD_URL overrides config.
pub fn resolve_forward_url(config: &Config) -> Option<String> {
    env_or(config.forward.url.as_ref(), "LULL_FORWARD_URL")
}

/// Resolve the forward webhook token: env LULL_FORWARD_TOKEN overrides config.
pub fn resolve_forward_token(config: &Config) -> Option<String> {
    env_or(config.forward.token.as_ref(), "LULL_FORWARD_TOKEN")
}

/// Resolve the inbound webhook secret: env LULL_WEBHOOK_SECRET overrides config.
pub fn resolve_webhook_secret(config: &Config) -> Option<String> {
    env_or(config.gateway.webhook_secret.as_ref(), "LULL_WEBHOOK_SECRET")
}

/// Resolve config path from env or default (~/.lull/config.json).
pub fn default_config_path() -> PathBuf {
    std::env::var("LULL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".lull").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or LULL_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.gateway.port, 3000);
        assert_eq!(c.gateway.bind, "127.0.0.1");
        assert_eq!(c.responder.debounce_ms, 4000);
        assert_eq!(c.responder.fetch_limit, 50);
        assert!(!c.responder.reply.attachment_ack.is_empty());
        assert!(!c.responder.reply.solicitation.is_empty());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_camel_case_json() {
        let c: Config = serde_json::from_str(
            r#"{
                "gateway": { "port": 4040, "webhookSecret": "s" },
                "responder": { "debounceMs": 1500, "fetchLimit": 10 },
                "bridge": { "baseUrl": "http://localhost:8080/" }
            }"#,
        )
        .expect("parse config");
        assert_eq!(c.gateway.port, 4040);
        assert_eq!(c.gateway.webhook_secret.as_deref(), Some("s"));
        assert_eq!(c.responder.debounce_ms, 1500);
        assert_eq!(c.responder.fetch_limit, 10);
        assert_eq!(c.bridge.base_url.as_deref(), Some("http://localhost:8080/"));
    }

    #[test]
    fn validate_rejects_zero_debounce() {
        let mut c = Config::default();
        c.responder.debounce_ms = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_fetch_limit() {
        let mut c = Config::default();
        c.responder.fetch_limit = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let path = std::env::temp_dir().join("lull-config-test-does-not-exist.json");
        let (config, used) = load_config(Some(path.clone())).expect("load");
        assert_eq!(used, path);
        assert_eq!(config.responder.debounce_ms, 4000);
    }
}
