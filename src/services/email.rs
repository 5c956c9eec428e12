//! Transactional email (ZeptoMail).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::EmailSettings;
use crate::error::{AppError, AppResult};

/// Message to a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// "Studio ready" notification sent after training completes.
pub fn studio_ready_email(to: &str, app_url: &str, studio_id: &str) -> EmailMessage {
    let link = format!("{}/dashboard/studio/{}", app_url.trim_end_matches('/'), studio_id);
    EmailMessage {
        to: to.to_string(),
        subject: "Your Studio is Ready! 🎉".to_string(),
        html_body: format!(
            r#"<p>Dear User,</p>
<p>Your AI Studio training is complete. You can access it with the link below:</p>
<p><a href="{link}" style="color: #007bff; text-decoration: underline;">Access Your Studio</a></p>
<p>If you still see 'Your headshots are being generated', it may take another 2-4 minutes to finish.
If the issue persists, please reach out to our support team.</p>
<p>Best Regards,</p>"#
        ),
    }
}

#[derive(Serialize)]
struct Address<'a> {
    address: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email_address: Address<'a>,
}

#[derive(Serialize)]
struct SendMailBody<'a> {
    from: Address<'a>,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    htmlbody: &'a str,
}

/// ZeptoMail HTTP API client.
#[derive(Clone)]
pub struct ZeptoMailer {
    client: reqwest::Client,
    url: Option<String>,
    token: Option<SecretString>,
    from_address: String,
    from_name: String,
}

impl ZeptoMailer {
    pub fn new(settings: &EmailSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            token: settings.token.clone(),
            from_address: settings.from_address.clone(),
            from_name: settings.from_name.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ZeptoMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let (Some(url), Some(token)) = (&self.url, &self.token) else {
            warn!(to = %message.to, "Email provider not configured; skipping send");
            return Ok(());
        };

        let body = SendMailBody {
            from: Address {
                address: &self.from_address,
                name: &self.from_name,
            },
            to: [Recipient {
                email_address: Address {
                    address: &message.to,
                    name: "User",
                },
            }],
            subject: &message.subject,
            htmlbody: &message.html_body,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("send failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Email(format!(
                "provider returned {}",
                response.status()
            )));
        }

        info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}
