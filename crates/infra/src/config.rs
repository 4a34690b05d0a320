//! Process configuration read from environment variables.

use std::net::SocketAddr;

use chrono::FixedOffset;
use thiserror::Error;

use oysters_core::TenantId;
use oysters_notifications::EnvChannels;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-insecure-secret-change-me";
/// Tenant used when `STOREFRONT_TENANT_ID` is not set.
pub const DEV_STOREFRONT_TENANT: &str = "0191f3a0-0000-7000-8000-000000000001";
pub const DEFAULT_DELIVERY_OFFSET_HOURS: i32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentsConfig {
    /// `ENABLE_ONLINE_PAYMENTS` feature flag.
    pub online_enabled: bool,
    pub cloudpayments_public_id: Option<String>,
    pub cloudpayments_secret: Option<String>,
    pub yookassa_shop_id: Option<String>,
    pub yookassa_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub storefront_tenant_id: TenantId,
    /// Raw `LOG_FORMAT`; parsed by the observability crate.
    pub log_format: Option<String>,
    pub cron_secret: Option<String>,
    pub payments: PaymentsConfig,
    /// Time zone the delivery dates and slots are expressed in.
    pub delivery_offset: FixedOffset,
    pub notifications: EnvChannels,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let storefront_tenant_id = get("STOREFRONT_TENANT_ID")
            .unwrap_or_else(|| DEV_STOREFRONT_TENANT.to_string())
            .parse::<TenantId>()
            .map_err(|e| ConfigError::invalid("STOREFRONT_TENANT_ID", e.to_string()))?;

        let offset_hours = match get("DELIVERY_TZ_OFFSET_HOURS") {
            None => DEFAULT_DELIVERY_OFFSET_HOURS,
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|e| ConfigError::invalid("DELIVERY_TZ_OFFSET_HOURS", e.to_string()))?,
        };
        let delivery_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| ConfigError::invalid("DELIVERY_TZ_OFFSET_HOURS", "offset out of range"))?;

        let payments = PaymentsConfig {
            online_enabled: parse_bool("ENABLE_ONLINE_PAYMENTS", get("ENABLE_ONLINE_PAYMENTS"))?,
            cloudpayments_public_id: get("CLOUDPAYMENTS_PUBLIC_ID"),
            cloudpayments_secret: get("CLOUDPAYMENTS_SECRET_KEY"),
            yookassa_shop_id: get("YUKASSA_SHOP_ID"),
            yookassa_secret: get("YUKASSA_SECRET_KEY"),
        };

        let notifications = EnvChannels {
            sms_api_key: get("SMS_API_KEY"),
            sms_api_url: get("SMS_API_URL"),
            sms_sender_id: get("SMS_SENDER_ID"),
            email_smtp_url: get("EMAIL_SMTP_URL"),
            email_from: get("EMAIL_FROM"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_alert_chat_id: get("TELEGRAM_ALERT_CHAT_ID"),
            web_push_public_key: get("WEB_PUSH_PUBLIC_KEY"),
            web_push_private_key: get("WEB_PUSH_PRIVATE_KEY"),
            test_sms_phone: get("NOTIFY_TEST_SMS_PHONE"),
            test_email: get("NOTIFY_TEST_EMAIL"),
            test_telegram_chat: get("NOTIFY_TEST_TELEGRAM_CHAT"),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            storefront_tenant_id,
            log_format: get("LOG_FORMAT"),
            cron_secret: get("CRON_SECRET"),
            payments,
            delivery_offset,
            notifications,
        })
    }
}

fn parse_bool(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ConfigError::invalid(key, format!("expected true or false, got '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.storefront_tenant_id.to_string(), DEV_STOREFRONT_TENANT);
        assert_eq!(cfg.delivery_offset.local_minus_utc(), 3 * 3600);
        assert!(!cfg.payments.online_enabled);
        assert_eq!(cfg.notifications, EnvChannels::default());
    }

    #[test]
    fn reads_values_and_treats_blank_as_unset() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "   "),
            ("ENABLE_ONLINE_PAYMENTS", "TRUE"),
            ("CLOUDPAYMENTS_SECRET_KEY", "cp-secret"),
            ("TELEGRAM_BOT_TOKEN", " bot-token "),
            ("DELIVERY_TZ_OFFSET_HOURS", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.payments.online_enabled);
        assert_eq!(cfg.payments.cloudpayments_secret.as_deref(), Some("cp-secret"));
        assert_eq!(cfg.notifications.telegram_bot_token.as_deref(), Some("bot-token"));
        assert_eq!(cfg.delivery_offset.local_minus_utc(), 0);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            config(&[("ENABLE_ONLINE_PAYMENTS", "yes")]),
            Err(ConfigError::Invalid { key: "ENABLE_ONLINE_PAYMENTS", .. })
        ));
        assert!(matches!(
            config(&[("STOREFRONT_TENANT_ID", "tenant-1")]),
            Err(ConfigError::Invalid { key: "STOREFRONT_TENANT_ID", .. })
        ));
        assert!(matches!(
            config(&[("DELIVERY_TZ_OFFSET_HOURS", "30")]),
            Err(ConfigError::Invalid { key: "DELIVERY_TZ_OFFSET_HOURS", .. })
        ));
        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
