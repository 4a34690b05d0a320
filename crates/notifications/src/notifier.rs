//! Transport boundary for outgoing messages.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::plan::Delivery;
use crate::settings::NotificationSettings;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("channel '{0}' is not configured")]
    NotConfigured(&'static str),

    #[error("transport failed: {0}")]
    Transport(String),
}

/// Sends one planned delivery using the resolved channel settings.
///
/// Implementations must not block for long; workers call them inline.
pub trait Notifier: Send + Sync {
    fn send(&self, delivery: &Delivery, settings: &NotificationSettings) -> Result<(), NotifyError>;
}

/// Writes each delivery as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send(&self, delivery: &Delivery, settings: &NotificationSettings) -> Result<(), NotifyError> {
        if !delivery.channel.is_configured(settings) {
            return Err(NotifyError::NotConfigured(delivery.channel.as_str()));
        }
        tracing::info!(
            order_id = %delivery.order_id,
            channel = %delivery.channel,
            recipient = ?delivery.recipient,
            subject = delivery.subject.as_deref().unwrap_or_default(),
            "notification sent"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboxEntry {
    pub sent_at: DateTime<Utc>,
    #[serde(flatten)]
    pub delivery: Delivery,
}

/// Bounded in-memory outbox. Oldest entries are evicted first.
#[derive(Debug)]
pub struct OutboxNotifier {
    capacity: usize,
    entries: Mutex<VecDeque<OutboxEntry>>,
}

impl OutboxNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<OutboxEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().rev().take(limit).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OutboxNotifier {
    fn default() -> Self {
        Self::new(500)
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, delivery: &Delivery, settings: &NotificationSettings) -> Result<(), NotifyError> {
        if !delivery.channel.is_configured(settings) {
            return Err(NotifyError::NotConfigured(delivery.channel.as_str()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| NotifyError::Transport("outbox lock poisoned".to_string()))?;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(OutboxEntry {
            sent_at: Utc::now(),
            delivery: delivery.clone(),
        });
        Ok(())
    }
}

/// Hands every delivery to each inner notifier in order; the first error wins.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    inner: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(inner: Vec<Arc<dyn Notifier>>) -> Self {
        Self { inner }
    }
}

impl Notifier for FanoutNotifier {
    fn send(&self, delivery: &Delivery, settings: &NotificationSettings) -> Result<(), NotifyError> {
        let mut first_err = None;
        for n in &self.inner {
            if let Err(err) = n.send(delivery, settings) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
