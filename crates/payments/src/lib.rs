//! `oysters-payments`: online payment provider plumbing.
//!
//! Webhook authentication and payload parsing for CloudPayments and YooKassa,
//! plus hosted payment form links. Provider SDKs are not used; webhooks are
//! plain signed JSON.

pub mod link;
pub mod signature;
pub mod webhook;

pub use link::cloudpayments_widget_url;
pub use signature::{sign, verify_signature};
pub use webhook::{PaymentNotice, WebhookError, parse_cloudpayments, parse_yookassa};
