use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::services::reset_tokens::RESET_TOKEN_TTL_MINUTES;

/// Delivers password-reset links. Without an SMTP relay configured the link
/// is logged instead, which keeps the forgot-password flow usable in
/// development and in tests.
#[derive(Clone)]
pub enum Mailer {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    LogOnly,
}

impl Mailer {
    pub fn from_config(cfg: &EmailConfig) -> anyhow::Result<Self> {
        let Some(host) = cfg.smtp_host.as_deref() else {
            tracing::info!("No SMTP relay configured; password reset links will be logged");
            return Ok(Mailer::LogOnly);
        };

        let from = cfg
            .from_address
            .parse::<Mailbox>()
            .context("Invalid email.from_address")?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .context("Invalid email.smtp_host")?;
        if let (Some(username), Some(password)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Mailer::Smtp {
            transport: builder.build(),
            from,
        })
    }

    /// Sends (or logs) the reset link. Runs in a detached task after the
    /// generic response has already gone out, so failures are logged and
    /// never surface to the requester.
    pub async fn send_password_reset(&self, to: &str, reset_link: &str) {
        match self {
            Mailer::LogOnly => {
                tracing::info!("Password reset link for {}: {}", to, reset_link);
            }
            Mailer::Smtp { transport, from } => {
                let message = match build_reset_message(from, to, reset_link) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("Failed to build reset email for {}: {}", to, e);
                        return;
                    }
                };
                match transport.send(message).await {
                    Ok(_) => tracing::info!("Sent password reset email to {}", to),
                    Err(e) => tracing::error!("Failed to send reset email to {}: {}", to, e),
                }
            }
        }
    }
}

fn build_reset_message(from: &Mailbox, to: &str, reset_link: &str) -> anyhow::Result<Message> {
    let message = Message::builder()
        .from(from.clone())
        .to(to.parse().context("Invalid recipient address")?)
        .subject("Reset your password")
        .header(ContentType::TEXT_HTML)
        .body(format!(
            "<p>A password reset was requested for this address.</p>\
             <p><a href=\"{}\">Reset your password</a></p>\
             <p>The link expires in {} minutes. If you did not request this, you can ignore this email.</p>",
            reset_link, RESET_TOKEN_TTL_MINUTES
        ))?;
    Ok(message)
}
