// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Bank-transfer details printed on every confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemittanceDetails {
  pub account_name: String,
  pub bank: String,
  pub account_number: String,
  pub branch: String,
}

impl Default for RemittanceDetails {
  fn default() -> Self {
    Self {
      account_name: "Tshwane East SDA Church".to_string(),
      bank: "ABSA Bank (Cheque Account)".to_string(),
      account_number: "4067428596".to_string(),
      branch: "Menlyn Park (632005)".to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
  pub host: String,
  pub port: u16,
  pub user: Option<String>,
  pub password: Option<String>,
  pub from_email: Option<String>,
  pub from_name: String,
  pub timeout: Duration,
}

impl SmtpConfig {
  /// Sending is enabled only when both relay credentials are present.
  pub fn credentials(&self) -> Option<(&str, &str)> {
    match (self.user.as_deref(), self.password.as_deref()) {
      (Some(user), Some(password)) => Some((user, password)),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: Option<String>,
  pub seed_items_path: Option<String>,
  pub catalog_cache_ttl: Duration,

  pub session_cookie_name: String,
  pub session_ttl_hours: i64,
  pub cookie_secure: bool,
  pub admin_username: Option<String>,
  pub admin_password_hash: Option<String>,

  pub smtp: SmtpConfig,
  pub remittance: RemittanceDetails,
  pub log_json: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. Empty values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let parse_num = |name: &str, default: u64| -> Result<u64> {
      match get_env(name) {
        Some(raw) => raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
      }
    };
    let parse_bool = |name: &str, default: bool| -> Result<bool> {
      match get_env(name) {
        Some(raw) => raw
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", name, e))),
        None => Ok(default),
      }
    };

    let server_port = u16::try_from(parse_num("SERVER_PORT", 8080)?)
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let smtp_port = u16::try_from(parse_num("SMTP_PORT", 587)?)
      .map_err(|e| AppError::Config(format!("Invalid SMTP_PORT: {}", e)))?;
    let session_ttl_hours = i64::try_from(parse_num("SESSION_TTL_HOURS", 12)?)
      .map_err(|e| AppError::Config(format!("Invalid SESSION_TTL_HOURS: {}", e)))?;

    let smtp_user = get_env("SMTP_USER");
    let remit_default = RemittanceDetails::default();

    let config = Self {
      server_host: get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
      server_port,
      database_url: get_env("DATABASE_URL"),
      seed_items_path: get_env("SEED_ITEMS_PATH"),
      catalog_cache_ttl: Duration::from_secs(parse_num("CATALOG_CACHE_TTL_SECS", 30)?),
      session_cookie_name: get_env("SESSION_COOKIE_NAME").unwrap_or_else(|| "pledge_session".to_string()),
      session_ttl_hours,
      cookie_secure: parse_bool("COOKIE_SECURE", false)?,
      admin_username: get_env("ADMIN_USERNAME"),
      admin_password_hash: get_env("ADMIN_PASSWORD_HASH"),
      smtp: SmtpConfig {
        host: get_env("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
        port: smtp_port,
        from_email: get_env("SMTP_FROM_EMAIL").or_else(|| smtp_user.clone()),
        user: smtp_user,
        password: get_env("SMTP_PASSWORD"),
        from_name: get_env("SMTP_FROM_NAME").unwrap_or_else(|| "Thanksgiving Pledge".to_string()),
        timeout: Duration::from_secs(parse_num("SMTP_TIMEOUT_SECS", 10)?),
      },
      remittance: RemittanceDetails {
        account_name: get_env("REMIT_ACCOUNT_NAME").unwrap_or(remit_default.account_name),
        bank: get_env("REMIT_BANK").unwrap_or(remit_default.bank),
        account_number: get_env("REMIT_ACCOUNT_NUMBER").unwrap_or(remit_default.account_number),
        branch: get_env("REMIT_BRANCH").unwrap_or(remit_default.branch),
      },
      log_json: get_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
    };

    Ok(config)
  }

  /// Secrets stay out of the log.
  pub fn log_summary(&self) {
    tracing::info!(
      server_host = %self.server_host,
      server_port = self.server_port,
      database = self.database_url.is_some(),
      smtp_enabled = self.smtp.credentials().is_some(),
      admin_login = self.admin_username.is_some() && self.admin_password_hash.is_some(),
      "Application configuration loaded."
    );
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(move |name| vars.get(name).cloned())
  }

  #[test]
  fn defaults_apply_when_nothing_is_set() {
    let cfg = config_from(&[]).unwrap();
    assert_eq!(cfg.server_address(), "127.0.0.1:8080");
    assert!(cfg.database_url.is_none());
    assert_eq!(cfg.catalog_cache_ttl, Duration::from_secs(30));
    assert_eq!(cfg.session_cookie_name, "pledge_session");
    assert_eq!(cfg.session_ttl_hours, 12);
    assert!(!cfg.cookie_secure);
    assert_eq!(cfg.smtp.host, "smtp.gmail.com");
    assert_eq!(cfg.smtp.port, 587);
    assert_eq!(cfg.smtp.from_name, "Thanksgiving Pledge");
    assert_eq!(cfg.smtp.timeout, Duration::from_secs(10));
    assert!(cfg.smtp.credentials().is_none());
    assert_eq!(cfg.remittance, RemittanceDetails::default());
    assert!(!cfg.log_json);
  }

  #[test]
  fn from_email_falls_back_to_smtp_user() {
    let cfg = config_from(&[("SMTP_USER", "church@example.org"), ("SMTP_PASSWORD", "pw")]).unwrap();
    assert_eq!(cfg.smtp.from_email.as_deref(), Some("church@example.org"));
    assert_eq!(cfg.smtp.credentials(), Some(("church@example.org", "pw")));
  }

  #[test]
  fn blank_values_count_as_unset() {
    let cfg = config_from(&[("SMTP_PASSWORD", "   "), ("SMTP_USER", "u")]).unwrap();
    assert!(cfg.smtp.credentials().is_none());
  }

  #[test]
  fn invalid_numbers_and_bools_are_config_errors() {
    assert!(matches!(config_from(&[("SERVER_PORT", "http")]), Err(AppError::Config(_))));
    assert!(matches!(config_from(&[("SERVER_PORT", "70000")]), Err(AppError::Config(_))));
    assert!(matches!(config_from(&[("COOKIE_SECURE", "yes")]), Err(AppError::Config(_))));
  }

  #[test]
  fn json_log_format_is_case_insensitive() {
    assert!(config_from(&[("LOG_FORMAT", "JSON")]).unwrap().log_json);
  }
}
