//! Notification channel settings: stored document plus environment fallback.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;

use oysters_core::TenantId;
use oysters_notifications::{
    EnvChannels, NotificationSettings, NotificationSettingsInput, SettingsValidationError, merge,
    sanitize, validate,
};

use crate::read_model::TenantStore;

pub const SETTINGS_KEY: &str = "notifications";
pub const CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct NotificationConfigService<S>
where
    S: TenantStore<String, JsonValue>,
{
    store: S,
    env: EnvChannels,
    ttl: Duration,
    cache: Mutex<HashMap<TenantId, (Instant, NotificationSettings)>>,
}

impl<S> NotificationConfigService<S>
where
    S: TenantStore<String, JsonValue>,
{
    pub fn new(store: S, env: EnvChannels) -> Self {
        Self::with_ttl(store, env, CACHE_TTL)
    }

    pub fn with_ttl(store: S, env: EnvChannels, ttl: Duration) -> Self {
        Self {
            store,
            env,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Only what an admin saved, without the environment fallback.
    pub fn stored(&self, tenant_id: TenantId) -> NotificationSettings {
        match self.store.get(tenant_id, &SETTINGS_KEY.to_string()) {
            None => NotificationSettings::default(),
            Some(raw) => match serde_json::from_value::<NotificationSettingsInput>(raw) {
                Ok(input) => sanitize(&input),
                Err(err) => {
                    tracing::warn!(%tenant_id, error = %err, "stored notification settings are unreadable; ignoring");
                    NotificationSettings::default()
                }
            },
        }
    }

    /// Effective settings: stored channels first, then the environment.
    /// Cached per tenant; `force` bypasses the cache.
    pub fn load(&self, tenant_id: TenantId, force: bool) -> NotificationSettings {
        if !force {
            if let Some(hit) = self.cached(tenant_id) {
                return hit;
            }
        }
        let merged = merge(self.stored(tenant_id), self.env.to_settings());
        self.remember(tenant_id, merged.clone());
        merged
    }

    /// Sanitize, validate, persist, then refresh the cache.
    /// Returns the sanitized document that was stored.
    pub fn save(
        &self,
        tenant_id: TenantId,
        input: &NotificationSettingsInput,
    ) -> Result<NotificationSettings, SettingsValidationError> {
        let sanitized = sanitize(input);
        validate(&sanitized)?;

        let raw = serde_json::to_value(&sanitized).unwrap_or(JsonValue::Null);
        self.store.upsert(tenant_id, SETTINGS_KEY.to_string(), raw);
        self.remember(tenant_id, merge(sanitized.clone(), self.env.to_settings()));

        tracing::info!(
            %tenant_id,
            sms = sanitized.sms.is_some(),
            email = sanitized.email.is_some(),
            telegram = sanitized.telegram.is_some(),
            push = sanitized.push.is_some(),
            "notification settings saved"
        );
        Ok(sanitized)
    }

    fn cached(&self, tenant_id: TenantId) -> Option<NotificationSettings> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(&tenant_id)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, settings)| settings.clone())
    }

    fn remember(&self, tenant_id: TenantId, settings: NotificationSettings) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(tenant_id, (Instant::now(), settings));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oysters_notifications::{SmsInput, TelegramInput};

    use crate::read_model::InMemoryTenantStore;

    fn env() -> EnvChannels {
        EnvChannels {
            sms_api_key: Some("env-sms-key".to_string()),
            telegram_bot_token: Some("env-bot-token".to_string()),
            telegram_alert_chat_id: Some("-1001".to_string()),
            ..Default::default()
        }
    }

    fn input_with_sms(key: &str) -> NotificationSettingsInput {
        NotificationSettingsInput {
            sms: Some(SmsInput {
                api_key: Some(format!("  {key}  ")),
                api_url: None,
                sender_id: Some("OYSTERS".to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn load_falls_back_to_environment() {
        let svc = NotificationConfigService::new(InMemoryTenantStore::new(), env());
        let settings = svc.load(TenantId::new(), false);
        assert_eq!(settings.sms.unwrap().api_key, "env-sms-key");
        assert_eq!(settings.telegram.unwrap().chat_id, "-1001");
        assert!(settings.email.is_none());
    }

    #[test]
    fn save_sanitizes_and_stored_channel_wins() {
        let svc = NotificationConfigService::new(InMemoryTenantStore::new(), env());
        let tenant_id = TenantId::new();

        let saved = svc.save(tenant_id, &input_with_sms("stored-sms-key")).unwrap();
        assert_eq!(saved.sms.as_ref().unwrap().api_key, "stored-sms-key");
        assert!(saved.telegram.is_none());

        let effective = svc.load(tenant_id, false);
        assert_eq!(effective.sms.unwrap().api_key, "stored-sms-key");
        assert_eq!(effective.telegram.unwrap().bot_token, "env-bot-token");
        assert_eq!(svc.stored(tenant_id), saved);
    }

    #[test]
    fn invalid_settings_are_not_persisted() {
        let svc = NotificationConfigService::new(InMemoryTenantStore::new(), EnvChannels::default());
        let tenant_id = TenantId::new();
        let err = svc.save(tenant_id, &input_with_sms("short")).unwrap_err();
        assert!(err.0.iter().any(|f| f.field == "sms.apiKey"));
        assert!(svc.stored(tenant_id).is_empty());
    }

    #[test]
    fn cache_serves_until_forced() {
        let store = std::sync::Arc::new(InMemoryTenantStore::new());
        let svc = NotificationConfigService::new(store.clone(), EnvChannels::default());
        let tenant_id = TenantId::new();
        assert!(svc.load(tenant_id, false).telegram.is_none());

        // Written behind the service's back.
        let behind = sanitize(&NotificationSettingsInput {
            telegram: Some(TelegramInput {
                bot_token: Some("direct-token-1".to_string()),
                chat_id: Some("42".to_string()),
            }),
            ..Default::default()
        });
        store.upsert(tenant_id, SETTINGS_KEY.to_string(), serde_json::to_value(&behind).unwrap());

        assert!(svc.load(tenant_id, false).telegram.is_none());
        assert!(svc.load(tenant_id, true).telegram.is_some());
    }

    #[test]
    fn zero_ttl_never_caches() {
        let store = std::sync::Arc::new(InMemoryTenantStore::new());
        let svc = NotificationConfigService::with_ttl(store.clone(), EnvChannels::default(), Duration::ZERO);
        let tenant_id = TenantId::new();
        svc.load(tenant_id, false);
        store.upsert(
            tenant_id,
            SETTINGS_KEY.to_string(),
            serde_json::json!({ "test": { "email": "qa@oysters.example" } }),
        );
        assert!(svc.load(tenant_id, false).test.is_some());
    }
}
