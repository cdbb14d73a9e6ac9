use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{
    transport::smtp::authentication::Credentials,
    transport::smtp::client::{Tls, TlsParameters},
    Message, SmtpTransport, Transport,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::document_renderer::RenderedDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
        }
    }
}

impl EmailConfig {
    pub fn validate(&self) -> Result<()> {
        if self.smtp_server.is_empty() {
            return Err(anyhow!("Email smtp_server is required"));
        }
        if self.username.is_empty() {
            return Err(anyhow!("Email username is required"));
        }
        if self.password.is_empty() {
            return Err(anyhow!("Email password is required"));
        }
        if self.from_email.is_empty() {
            return Err(anyhow!("From email is required"));
        }
        Ok(())
    }
}

/// Emails the service knows how to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    SignedCra,
}

impl EmailTemplate {
    /// Subject and plain-text body for the given CRA data bag
    pub fn compose(&self, data: &Value) -> (String, String) {
        match self {
            EmailTemplate::SignedCra => {
                let consultant = data["consultant"]["name"].as_str().unwrap_or_default();
                let period = data["period"]["label"].as_str().unwrap_or_default();
                let project = data["consultant"]["project_name"].as_str().unwrap_or_default();

                let subject = format!("CRA {} - {} - signed by all parties", period, consultant);
                let mut body = format!(
                    "Hello,\n\nThe activity report of {} for {} has been signed by the consultant, the client and the manager.\n",
                    consultant, period
                );
                if !project.is_empty() {
                    body.push_str(&format!("Project: {}\n", project));
                }
                body.push_str(&format!(
                    "\nDays worked: {}\nWeekend days worked: {}\nAbsence days: {}\n\nThe signed document is attached.\n\nBest regards,\nCRA Signing",
                    data["summary"]["days_worked"], data["summary"]["weekend_worked"], data["summary"]["absence_days"]
                ));
                (subject, body)
            }
        }
    }
}

/// A message ready to hand to a transport
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub template: EmailTemplate,
    pub data: Value,
    pub recipients: Vec<String>,
    pub attachment: Option<RenderedDocument>,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// SMTP delivery through lettre
#[derive(Clone)]
pub struct SmtpEmailTransport {
    from_email: String,
    transport: SmtpTransport,
}

impl SmtpEmailTransport {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        info!("📧 Initializing email transport for SMTP server: {}:{}", config.smtp_server, config.smtp_port);

        let tls_params = TlsParameters::new(config.smtp_server.clone())
            .context("Failed to create TLS parameters")?;

        let transport = SmtpTransport::relay(&config.smtp_server)
            .context("Failed to create SMTP relay")?
            .port(config.smtp_port)
            .tls(Tls::Required(tls_params))
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self {
            from_email: config.from_email.clone(),
            transport,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = build_message(&self.from_email, email)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("Email task panicked")?
            .context("Failed to send email")?;

        info!("📧 CRA email sent to {} recipients", email.recipients.len());
        Ok(())
    }
}

/// Transport used when email is switched off in the configuration
#[derive(Debug, Clone, Default)]
pub struct DisabledEmailTransport;

#[async_trait]
impl EmailTransport for DisabledEmailTransport {
    async fn send(&self, _email: &OutgoingEmail) -> Result<()> {
        Err(anyhow!("Email delivery is disabled in the configuration"))
    }
}

pub fn transport_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailTransport>> {
    if !config.enabled {
        info!("📧 Email disabled, completed CRAs will be marked as failed deliveries");
        return Ok(Arc::new(DisabledEmailTransport));
    }
    config.validate()?;
    Ok(Arc::new(SmtpEmailTransport::new(config)?))
}

pub fn build_message(from_email: &str, email: &OutgoingEmail) -> Result<Message> {
    if email.recipients.is_empty() {
        return Err(anyhow!("Email has no recipients"));
    }
    let (subject, body) = email.template.compose(&email.data);

    let mut builder = Message::builder()
        .from(from_email.parse::<Mailbox>().context("Failed to parse from email")?)
        .subject(subject);
    for recipient in &email.recipients {
        builder = builder.to(recipient
            .parse::<Mailbox>()
            .with_context(|| format!("Failed to parse recipient email {}", recipient))?);
    }

    let message = match &email.attachment {
        Some(document) => {
            let content_type = ContentType::parse(document.content_type)
                .context("Failed to parse attachment content type")?;
            let attachment = Attachment::new(document.file_name.clone())
                .body(document.bytes.clone(), content_type);
            builder.multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(attachment),
            )
        }
        None => builder.body(body),
    };
    message.context("Failed to build email")
}
