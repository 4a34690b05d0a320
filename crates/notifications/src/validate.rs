//! Field rules applied to sanitized settings before they are stored.

use serde::Serialize;
use thiserror::Error;

use oysters_core::contact::{is_email, is_http_url};

use crate::settings::NotificationSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON path of the offending field (`"sms.apiKey"`).
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid notification settings: {}", summary(.0))]
pub struct SettingsValidationError(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

struct Checker(Vec<FieldError>);

impl Checker {
    fn min_len(&mut self, field: &'static str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.0.push(FieldError {
                field,
                message: format!("must be at least {min} characters"),
            });
        }
    }

    fn email(&mut self, field: &'static str, value: &str) {
        if !is_email(value) {
            self.0.push(FieldError {
                field,
                message: "must be an email address".to_string(),
            });
        }
    }

    fn url(&mut self, field: &'static str, value: &str) {
        if !is_http_url(value) {
            self.0.push(FieldError {
                field,
                message: "must be an http(s) URL".to_string(),
            });
        }
    }
}

/// Check credential shapes. Expects output of [`crate::sanitize`].
pub fn validate(settings: &NotificationSettings) -> Result<(), SettingsValidationError> {
    let mut c = Checker(Vec::new());

    if let Some(sms) = &settings.sms {
        c.min_len("sms.apiKey", &sms.api_key, 8);
        if let Some(url) = &sms.api_url {
            c.url("sms.apiUrl", url);
        }
    }
    if let Some(email) = &settings.email {
        c.min_len("email.smtpUrl", &email.smtp_url, 5);
        c.email("email.from", &email.from);
    }
    if let Some(telegram) = &settings.telegram {
        c.min_len("telegram.botToken", &telegram.bot_token, 10);
    }
    if let Some(push) = &settings.push {
        c.min_len("push.publicKey", &push.public_key, 10);
        c.min_len("push.privateKey", &push.private_key, 10);
    }
    if let Some(test) = &settings.test {
        if let Some(phone) = &test.sms_phone {
            c.min_len("test.smsPhone", phone, 6);
        }
        if let Some(email) = &test.email {
            c.email("test.email", email);
        }
        if let Some(chat) = &test.telegram_chat_id {
            c.min_len("test.telegramChatId", chat, 2);
        }
    }

    if c.0.is_empty() {
        Ok(())
    } else {
        Err(SettingsValidationError(c.0))
    }
}
