//! `oysters-notifications`: channel configuration and message planning.
//!
//! Pure logic: which channels are configured, what they look like after
//! cleanup, and which deliveries an order event should fan out to. Actual
//! transports sit behind [`Notifier`].

pub mod fallback;
pub mod notifier;
pub mod plan;
pub mod settings;
pub mod validate;

pub use fallback::{EnvChannels, merge};
pub use notifier::{FanoutNotifier, LoggingNotifier, Notifier, NotifyError, OutboxEntry, OutboxNotifier};
pub use plan::{Channel, Delivery, OrderNotice, Recipient, Trigger, plan};
pub use settings::{
    DEFAULT_EMAIL_FROM, EmailChannel, EmailInput, NotificationSettings, NotificationSettingsInput,
    PushChannel, PushInput, SmsChannel, SmsInput, TelegramChannel, TelegramInput, TestInput,
    TestTargets, sanitize,
};
pub use validate::{FieldError, SettingsValidationError, validate};
