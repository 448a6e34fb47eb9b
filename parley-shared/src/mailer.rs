/// Confirmation-email dispatch seam
///
/// Actual delivery (SMTP, provider API) is an external concern; this trait is
/// the boundary the profile flow talks to. The resend-confirmation operation
/// reports success to the caller no matter what happens here, so
/// implementations should log their own failures.
use async_trait::async_trait;
use std::sync::Mutex;

/// Error type for mail dispatch
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// The dispatch backend rejected or failed the send
    #[error("Failed to dispatch mail: {0}")]
    DispatchError(String),
}

/// Dispatches account emails
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends confirmation instructions to an unconfirmed address
    async fn send_confirmation(&self, email: &str, name: Option<&str>) -> Result<(), MailerError>;
}

/// Mailer that only logs, for development and environments without a
/// delivery backend
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, email: &str, name: Option<&str>) -> Result<(), MailerError> {
        tracing::info!(email, name, "Would send confirmation instructions");
        Ok(())
    }
}

/// Mailer that records every dispatch, for tests
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses confirmation instructions were sent to, in order
    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }

    /// Number of dispatches recorded
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer lock poisoned").len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation(&self, email: &str, _name: Option<&str>) -> Result<(), MailerError> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(email.to_string());
        Ok(())
    }
}
