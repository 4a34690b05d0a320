//! Deployment-level channel credentials used when nothing is stored.

use serde::Deserialize;

use crate::settings::{
    EmailInput, NotificationSettings, NotificationSettingsInput, PushInput, SmsInput,
    TelegramInput, TestInput, sanitize,
};

/// Channel credentials taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvChannels {
    pub sms_api_key: Option<String>,
    pub sms_api_url: Option<String>,
    pub sms_sender_id: Option<String>,
    pub email_smtp_url: Option<String>,
    pub email_from: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_alert_chat_id: Option<String>,
    pub web_push_public_key: Option<String>,
    pub web_push_private_key: Option<String>,
    pub test_sms_phone: Option<String>,
    pub test_email: Option<String>,
    pub test_telegram_chat: Option<String>,
}

impl EnvChannels {
    /// Sanitized settings built from the environment values.
    pub fn to_settings(&self) -> NotificationSettings {
        let input = NotificationSettingsInput {
            sms: Some(SmsInput {
                api_key: self.sms_api_key.clone(),
                api_url: self.sms_api_url.clone(),
                sender_id: self.sms_sender_id.clone(),
            }),
            email: Some(EmailInput {
                smtp_url: self.email_smtp_url.clone(),
                from: self.email_from.clone(),
            }),
            telegram: Some(TelegramInput {
                bot_token: self.telegram_bot_token.clone(),
                chat_id: self.telegram_alert_chat_id.clone(),
            }),
            push: Some(PushInput {
                public_key: self.web_push_public_key.clone(),
                private_key: self.web_push_private_key.clone(),
            }),
            test: Some(TestInput {
                sms_phone: self.test_sms_phone.clone(),
                email: self.test_email.clone(),
                telegram_chat_id: self.test_telegram_chat.clone(),
            }),
        };
        sanitize(&input)
    }
}

/// Channel-by-channel union: a stored channel wins over the fallback one.
pub fn merge(stored: NotificationSettings, fallback: NotificationSettings) -> NotificationSettings {
    NotificationSettings {
        sms: stored.sms.or(fallback.sms),
        email: stored.email.or(fallback.email),
        telegram: stored.telegram.or(fallback.telegram),
        push: stored.push.or(fallback.push),
        test: stored.test.or(fallback.test),
    }
}
