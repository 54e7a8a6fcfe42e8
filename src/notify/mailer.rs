use async_trait::async_trait;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Email, MailError, Mailer};
use crate::config::SmtpConfig;

/// Display name on every outgoing message.
const SENDER_NAME: &str = "Task Manager";

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        log::info!(
            "Mail delivery disabled; would send \"{}\" to {}",
            email.subject,
            email.to
        );
        Ok(())
    }
}

/// `List-Unsubscribe` header, which lettre has no typed version of.
#[derive(Debug, Clone)]
struct ListUnsubscribe(String);

impl Header for ListUnsubscribe {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("List-Unsubscribe")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Delivers mail through an SMTP server.
///
/// The SMTP account doubles as sender and reply-to address.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    sender: Address,
}

impl SmtpMailer {
    /// Implicit TLS when `secure` is set, otherwise STARTTLS when the server offers it.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let sender: Address = config.username.parse()?;
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            let tls = TlsParameters::new(config.host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
                .tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(config.port);
        if let Some(password) = &config.password {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            sender,
        })
    }

    /// Opens a connection to the server and checks that it greets us.
    pub async fn verify(&self) -> Result<(), MailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::Unavailable(format!(
                "{} did not accept the connection",
                self.host
            )))
        }
    }

    fn message(&self, email: &Email) -> Result<Message, MailError> {
        let message = Message::builder()
            .from(Mailbox::new(Some(SENDER_NAME.to_string()), self.sender.clone()))
            .reply_to(Mailbox::new(None, self.sender.clone()))
            .to(email.to.parse()?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .header(ListUnsubscribe(format!("<mailto:{}>", self.sender)))
            .body(email.body.clone())?;
        Ok(message)
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.message(email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}
