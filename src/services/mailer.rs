//! Outgoing mail. Delivery is pluggable; the default writes messages to the log.

use crate::errors::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub text: String,
}

pub trait Mailer: Send + Sync {
    /// # Errors
    /// Delivery failure.
    fn send(&self, message: &Message) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    #[must_use]
    pub fn new(from_name: &str, from_email: &str) -> Self {
        Self { from: format!("{from_name} <{from_email}>") }
    }
}

impl Mailer for LogMailer {
    fn send(&self, message: &Message) -> Result<(), ApiError> {
        log::info!(
            "mail from={} to={} subject=\"{}\"\n{}",
            self.from,
            message.to,
            message.subject,
            message.text
        );
        Ok(())
    }
}
