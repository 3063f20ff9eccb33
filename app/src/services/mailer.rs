// src/services/mailer.rs

//! Outbound mail transport.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
  pub to_email: String,
  pub to_name: String,
  pub subject: String,
  pub text_body: String,
  pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from: Mailbox,
}

impl SmtpMailer {
  /// `None` when relay credentials are missing: sending is disabled.
  /// Port 465 speaks implicit TLS, every other port upgrades with STARTTLS.
  pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Option<Self>> {
    let Some((user, password)) = config.credentials() else {
      return Ok(None);
    };

    let builder = if config.port == 465 {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
    };
    let transport = builder
      .port(config.port)
      .credentials(Credentials::new(user.to_string(), password.to_string()))
      .timeout(Some(config.timeout))
      .build();

    let from_email = config.from_email.as_deref().unwrap_or(user);
    let from = Mailbox::new(Some(config.from_name.clone()), from_email.parse()?);
    Ok(Some(Self { transport, from }))
  }
}

#[async_trait]
impl Mailer for SmtpMailer {
  #[instrument(name = "SmtpMailer::send", skip_all, fields(to = %email.to_email))]
  async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
    let to = Mailbox::new(Some(email.to_name.clone()), email.to_email.parse()?);
    let message = Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(email.subject.clone())
      .multipart(
        MultiPart::alternative()
          .singlepart(
            SinglePart::builder()
              .header(ContentType::TEXT_PLAIN)
              .body(email.text_body.clone()),
          )
          .singlepart(
            SinglePart::builder()
              .header(ContentType::TEXT_HTML)
              .body(email.html_body.clone()),
          ),
      )?;

    let response = self.transport.send(message).await?;
    debug!(code = %response.code(), "SMTP relay accepted message.");
    Ok(())
  }
}
