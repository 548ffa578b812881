//! Customer notifications: order confirmations and welcome emails.
//!
//! Checkout and registration call the notifier after their unit of work
//! commits. Failures are logged by the caller and never undo the write.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use canvas_gallery_core::OrderNumber;

use crate::config::EmailConfig;
use crate::models::{Order, User};

/// What the buyer is told about a freshly placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub recipient: String,
    pub name: String,
    pub order_number: OrderNumber,
    /// Total with currency, e.g. `1500.00 INR`.
    pub amount: String,
}

impl OrderConfirmation {
    #[must_use]
    pub fn new(user: &User, order: &Order) -> Self {
        Self {
            recipient: user.email.as_str().to_string(),
            name: user.name.clone(),
            order_number: order.order_number.clone(),
            amount: format!("{} {}", order.total_amount, order.currency),
        }
    }

    #[must_use]
    pub fn subject(&self) -> String {
        format!("Order Confirmation - {}", self.order_number)
    }
}

/// Greeting sent to a freshly registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub recipient: String,
    pub name: String,
}

impl WelcomeMessage {
    pub const SUBJECT: &'static str = "Welcome to Canvas Gallery!";

    #[must_use]
    pub fn new(user: &User) -> Self {
        Self {
            recipient: user.email.as_str().to_string(),
            name: user.name.clone(),
        }
    }
}

/// Errors that can occur when notifying a customer.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sink for customer notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError>;

    async fn account_created(&self, welcome: &WelcomeMessage) -> Result<(), NotifyError>;
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    order_number: &'a str,
    amount: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    order_number: &'a str,
    amount: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
}

/// Renders the plain-text confirmation body.
///
/// # Errors
///
/// Returns `NotifyError::Template` if rendering fails.
pub fn render_text(confirmation: &OrderConfirmation) -> Result<String, NotifyError> {
    Ok(OrderConfirmationText {
        name: &confirmation.name,
        order_number: confirmation.order_number.as_str(),
        amount: &confirmation.amount,
    }
    .render()?)
}

fn render_html(confirmation: &OrderConfirmation) -> Result<String, NotifyError> {
    Ok(OrderConfirmationHtml {
        name: &confirmation.name,
        order_number: confirmation.order_number.as_str(),
        amount: &confirmation.amount,
    }
    .render()?)
}

/// Renders the plain-text welcome body.
///
/// # Errors
///
/// Returns `NotifyError::Template` if rendering fails.
pub fn render_welcome_text(welcome: &WelcomeMessage) -> Result<String, NotifyError> {
    Ok(WelcomeText { name: &welcome.name }.render()?)
}

fn render_welcome_html(welcome: &WelcomeMessage) -> Result<String, NotifyError> {
    Ok(WelcomeHtml { name: &welcome.name }.render()?)
}

/// Sends notifications over SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailNotifier {
    /// Create a notifier from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

impl EmailNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(recipient
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(recipient.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
        let text = render_text(confirmation)?;
        let html = render_html(confirmation)?;
        self.send(&confirmation.recipient, &confirmation.subject(), text, html)
            .await?;

        tracing::info!(
            to = %confirmation.recipient,
            order_number = %confirmation.order_number,
            "Order confirmation sent"
        );
        Ok(())
    }

    async fn account_created(&self, welcome: &WelcomeMessage) -> Result<(), NotifyError> {
        let text = render_welcome_text(welcome)?;
        let html = render_welcome_html(welcome)?;
        self.send(&welcome.recipient, WelcomeMessage::SUBJECT, text, html)
            .await?;

        tracing::info!(to = %welcome.recipient, "Welcome email sent");
        Ok(())
    }
}

/// Logs notifications instead of sending them. Used when SMTP is not
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
        let body = render_text(confirmation)?;
        tracing::info!(
            to = %confirmation.recipient,
            subject = %confirmation.subject(),
            order_number = %confirmation.order_number,
            body = %body,
            "Order confirmation (SMTP not configured)"
        );
        Ok(())
    }

    async fn account_created(&self, welcome: &WelcomeMessage) -> Result<(), NotifyError> {
        let body = render_welcome_text(welcome)?;
        tracing::info!(
            to = %welcome.recipient,
            subject = WelcomeMessage::SUBJECT,
            body = %body,
            "Welcome email (SMTP not configured)"
        );
        Ok(())
    }
}
