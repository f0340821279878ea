//! Outgoing mail: transport seam and the password-reset message.

mod reset;
mod template;

use async_trait::async_trait;
use tracing::info;

pub use reset::{reset_mail, reset_url};
pub use template::MailTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Transport that only records the mail in the log, for development setups
/// where no relay is reachable.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            bytes = mail.html.len(),
            "mail dispatched to log transport"
        );
        Ok(())
    }
}
