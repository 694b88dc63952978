use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Process-wide settings, read once at startup.
///
/// Sources, lowest precedence first: field defaults, an optional
/// `config/mailer.{yaml,toml,json}` file, a `.env` file, then the process
/// environment (`SMTP_HOST`, `RATE_LIMIT_PER_MINUTE`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_pass: Option<String>,
    /// Implicit TLS (SMTPS) instead of opportunistic STARTTLS
    #[serde(default)]
    pub smtp_secure: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Preview instead of sending (lenient boolean, default on)
    #[serde(default)]
    pub dry_run: Option<String>,
    /// Sends per minute; 0 disables pacing
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Image embedded in HTML mail, referenced as `cid:<inline_logo_cid>`
    #[serde(default)]
    pub inline_logo_path: Option<String>,
    #[serde(default = "default_logo_cid")]
    pub inline_logo_cid: String,
}

/// SMTP connection parameters handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Implicit TLS when true, opportunistic STARTTLS otherwise
    pub secure: bool,
}

impl SmtpConfig {
    /// Username and password, only when both are non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// Envelope and decoration applied to every outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub from: String,
    pub reply_to: Option<String>,
    pub inline_logo: Option<InlineLogo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineLogo {
    pub path: String,
    pub cid: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "Lead Mailer <no-reply@example.com>".to_string()
}

fn default_rate_limit() -> u32 {
    30
}

fn default_logo_cid() -> String {
    "logo".to_string()
}

/// Lenient boolean: `1`, `true`, `yes`, `y`, `on` (any case) are true,
/// anything else is false, absence yields `default`.
pub fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw {
        None => default,
        Some(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(File::with_name("config/mailer").required(false))
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize from an already assembled configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    /// Dry-run default before CLI overrides
    pub fn dry_run(&self) -> bool {
        parse_flag(self.dry_run.as_deref(), true)
    }

    pub fn smtp_secure(&self) -> bool {
        parse_flag(self.smtp_secure.as_deref(), false)
    }

    /// Transport parameters for send mode.
    ///
    /// Fails when the host is empty or the port is zero.
    pub fn smtp(&self) -> Result<SmtpConfig, AppError> {
        let host = self.smtp_host.trim();
        if host.is_empty() || self.smtp_port == 0 {
            return Err(AppError::MissingTransport(
                "set SMTP_HOST and SMTP_PORT or run with --dry-run".to_string(),
            ));
        }

        Ok(SmtpConfig {
            host: host.to_string(),
            port: self.smtp_port,
            username: non_empty(&self.smtp_user),
            password: self.smtp_pass.clone().filter(|p| !p.is_empty()),
            secure: self.smtp_secure(),
        })
    }

    pub fn sender(&self) -> SenderConfig {
        SenderConfig {
            from: self.smtp_from.clone(),
            reply_to: non_empty(&self.reply_to),
            inline_logo: non_empty(&self.inline_logo_path).map(|path| InlineLogo {
                path,
                cid: self.inline_logo_cid.clone(),
            }),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_pass: None,
            smtp_secure: None,
            smtp_from: default_smtp_from(),
            reply_to: None,
            dry_run: None,
            rate_limit_per_minute: default_rate_limit(),
            inline_logo_path: None,
            inline_logo_cid: default_logo_cid(),
        }
    }
}
