//! Email delivery of a computed result.

use async_trait::async_trait;
use cognitor_config::EmailConfig;
use cognitor_core::{
    BoundArguments, Capability, CapabilityError, CapabilityKind, CapabilityOutput, ParamSchema, ParamType,
};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use std::sync::Arc;
use tracing::info;

/// Something that can deliver a plain-text message to the configured recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Address the message goes to, if one is configured.
    fn recipient(&self) -> Option<&str>;

    async fn send(&self, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Why a message could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Missing GMAIL_ADDRESS, GMAIL_APP_PASSWORD, or RECIPIENT_EMAIL")]
    MissingCredentials,

    #[error("invalid {role} address \"{address}\": {reason}")]
    Address {
        role: &'static str,
        address: String,
        reason: String,
    },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP relay {host} unavailable: {reason}")]
    Relay { host: String, reason: String },

    #[error("SMTP send failed: {0}")]
    Transport(String),
}

/// SMTP delivery over implicit TLS.
pub struct SmtpMailer {
    config: EmailConfig,
}

struct Resolved<'a> {
    address: &'a str,
    password: &'a str,
    recipient: &'a str,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn resolved(&self) -> Result<Resolved<'_>, MailError> {
        match (
            present(&self.config.address),
            present(&self.config.app_password),
            present(&self.config.recipient),
        ) {
            (Some(address), Some(password), Some(recipient)) => Ok(Resolved {
                address,
                password,
                recipient,
            }),
            _ => Err(MailError::MissingCredentials),
        }
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, MailError> {
        let creds = self.resolved()?;
        let from = mailbox("sender", creds.address)?;
        let to = mailbox("recipient", creds.recipient)?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

fn mailbox(role: &'static str, address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        role,
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn recipient(&self) -> Option<&str> {
        self.config.recipient.as_deref()
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), MailError> {
        let message = self.build_message(subject, body)?;
        let creds = self.resolved()?;
        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| MailError::Relay {
                host: self.config.smtp_host.clone(),
                reason: e.to_string(),
            })?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(creds.address.to_string(), creds.password.to_string()))
            .build();

        // lettre's SmtpTransport is blocking.
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// `send_email(content)`: mails `content` to the configured recipient.
pub struct SendEmail {
    mailer: Arc<dyn Mailer>,
    subject: String,
    schema: ParamSchema,
}

impl SendEmail {
    pub fn new(mailer: Arc<dyn Mailer>, subject: impl Into<String>) -> Self {
        Self {
            mailer,
            subject: subject.into(),
            schema: ParamSchema::new().param("content", ParamType::String),
        }
    }

    pub fn from_config(config: &EmailConfig) -> Self {
        Self::new(Arc::new(SmtpMailer::new(config.clone())), config.subject.clone())
    }
}

#[async_trait]
impl Capability for SendEmail {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Email the given content to the configured recipient"
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::SideEffect
    }

    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
        let content = args.str("content")?;
        self.mailer
            .send(&self.subject, &content)
            .await
            .map_err(|e| CapabilityError::failed("send_email", e.to_string()))?;
        let recipient = self.mailer.recipient().unwrap_or_default();
        info!(recipient, "Email sent");
        Ok(CapabilityOutput::text(format!("Email sent successfully to {recipient}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognitor_core::bind;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn recipient(&self) -> Option<&str> {
            Some("someone@example.com")
        }

        async fn send(&self, subject: &str, body: &str) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((subject.into(), body.into()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn sends_content_with_configured_subject() {
        let mailer = Arc::new(RecordingMailer::default());
        let cap = SendEmail::new(mailer.clone(), "Math Agent Result");
        let args = bind("send_email", cap.schema(), &json!({"content": 42})).unwrap();
        let out = cap.execute(args).await.unwrap();

        assert_eq!(out.output, "Email sent successfully to someone@example.com");
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[("Math Agent Result".to_string(), "42".to_string())]);
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_connecting() {
        let cap = SendEmail::from_config(&EmailConfig::default());
        let args = bind("send_email", cap.schema(), &json!(["hello"])).unwrap();
        let err = cap.execute(args).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Missing GMAIL_ADDRESS, GMAIL_APP_PASSWORD, or RECIPIENT_EMAIL"));
    }

    #[test]
    fn message_builds_from_complete_config() {
        let mailer = SmtpMailer::new(EmailConfig {
            address: Some("me@example.com".into()),
            app_password: Some("secret".into()),
            recipient: Some("you@example.com".into()),
            ..EmailConfig::default()
        });
        assert!(mailer.build_message("subject", "body").is_ok());

        let blank = SmtpMailer::new(EmailConfig {
            address: Some(" ".into()),
            ..EmailConfig::default()
        });
        assert!(matches!(blank.build_message("s", "b"), Err(MailError::MissingCredentials)));

        let malformed = SmtpMailer::new(EmailConfig {
            address: Some("not-an-address".into()),
            app_password: Some("secret".into()),
            recipient: Some("you@example.com".into()),
            ..EmailConfig::default()
        });
        let err = malformed.build_message("s", "b").unwrap_err();
        assert!(matches!(err, MailError::Address { role: "sender", .. }));
        assert!(err.to_string().starts_with("invalid sender address \"not-an-address\""));
    }

    #[test]
    fn email_is_a_side_effect() {
        let cap = SendEmail::new(Arc::new(RecordingMailer::default()), "s");
        assert_eq!(cap.kind(), CapabilityKind::SideEffect);
    }
}
