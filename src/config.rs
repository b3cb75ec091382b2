use axum::http::HeaderValue;
use std::env;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use teloxide::types::ChatId;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://causal-miserably-yeti.ngrok-free.app";
pub const DEFAULT_INVOICE_CHAT_ID: i64 = 5620316173;
pub const DEFAULT_LINK_DOMAIN: &str = "t.me";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "{} environment variable is required", var)
            }
            ConfigError::Invalid { var, value } => {
                write!(f, "invalid value for {}: {:?}", var, value)
            }
        }
    }
}

impl Error for ConfigError {}

/// runtime settings for the bot and its http trigger endpoint
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub http_addr: SocketAddr,
    pub allowed_origin: HeaderValue,
    /// recipient of invoices created through the http endpoint
    pub invoice_chat_id: ChatId,
    pub link_domain: String,
    pub http_enabled: bool,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// builds the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let http_addr = parse_var(&lookup, "HTTP_ADDR", DEFAULT_HTTP_ADDR, |value| {
            value.parse::<SocketAddr>().ok()
        })?;

        let allowed_origin = parse_var(
            &lookup,
            "ALLOWED_ORIGIN",
            DEFAULT_ALLOWED_ORIGIN,
            |value| HeaderValue::from_str(value).ok(),
        )?;

        let invoice_chat_id = match lookup("INVOICE_CHAT_ID") {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map(ChatId)
                .map_err(|_| ConfigError::Invalid {
                    var: "INVOICE_CHAT_ID",
                    value,
                })?,
            None => ChatId(DEFAULT_INVOICE_CHAT_ID),
        };

        let link_domain =
            lookup("BOT_LINK_DOMAIN").unwrap_or_else(|| DEFAULT_LINK_DOMAIN.to_string());

        Ok(Self {
            bot_token,
            http_addr,
            allowed_origin,
            invoice_chat_id,
            link_domain,
            http_enabled: true,
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    default: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    parse(value.trim()).ok_or(ConfigError::Invalid { var, value })
}
