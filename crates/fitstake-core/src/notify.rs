//! Outbound notification dispatch.
//!
//! Delivery is best-effort: a blocked recipient or transport error is
//! logged and swallowed so the state transition that triggered the
//! message always stands.

use thiserror::Error;
use tracing::warn;

/// Where a message goes: a user's private chat or the group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    User(i64),
    Chat(i64),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("recipient {0:?} unreachable: {1}")]
    Unreachable(Recipient, String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub trait Notifier {
    fn notify(&self, recipient: Recipient, message: &str) -> Result<(), DeliveryError>;
}

/// Fire a message and absorb any delivery failure.
pub fn notify_best_effort(notifier: &dyn Notifier, recipient: Recipient, message: &str) {
    if let Err(err) = notifier.notify(recipient, message) {
        warn!("notification to {recipient:?} failed: {err}");
    }
}

/// Notifier that prints to stdout. Used by the CLI.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, recipient: Recipient, message: &str) -> Result<(), DeliveryError> {
        match recipient {
            Recipient::User(id) => println!("[dm {id}] {message}"),
            Recipient::Chat(id) => println!("[chat {id}] {message}"),
        }
        Ok(())
    }
}

/// Notifier that records every message (for tests).
#[derive(Default)]
pub struct RecordingNotifier {
    messages: std::sync::Mutex<Vec<(Recipient, String)>>,
    /// Recipients that fail delivery, to exercise best-effort paths.
    failing: Vec<Recipient>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: Vec<Recipient>) -> Self {
        Self {
            messages: std::sync::Mutex::new(Vec::new()),
            failing: recipients,
        }
    }

    pub fn sent(&self) -> Vec<(Recipient, String)> {
        self.messages.lock().expect("notifier lock").clone()
    }

    pub fn sent_to(&self, recipient: Recipient) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| *r == recipient)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: Recipient, message: &str) -> Result<(), DeliveryError> {
        if self.failing.contains(&recipient) {
            return Err(DeliveryError::Unreachable(recipient, "blocked".into()));
        }
        self.messages
            .lock()
            .expect("notifier lock")
            .push((recipient, message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_swallows_failures() {
        let notifier =
            RecordingNotifier::failing_for(vec![Recipient::User(1)]);
        notify_best_effort(&notifier, Recipient::User(1), "hello");
        notify_best_effort(&notifier, Recipient::User(2), "hello");
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Recipient::User(2));
    }
}
