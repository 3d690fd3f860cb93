// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email client.

use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;

#[derive(Serialize)]
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Clone)]
struct Credentials {
    api_key: String,
    sender_address: String,
}

/// Sends email through the provider's HTTP API.
#[derive(Clone)]
pub struct EmailService {
    http: reqwest::Client,
    api_url: String,
    sender_name: String,
    credentials: Option<Credentials>,
}

impl EmailService {
    pub fn from_config(config: &Config) -> Self {
        let credentials = match (&config.email_api_key, &config.email_sender_address) {
            (Some(api_key), Some(sender_address)) => Some(Credentials {
                api_key: api_key.clone(),
                sender_address: sender_address.clone(),
            }),
            _ => None,
        };

        Self {
            http: reqwest::Client::new(),
            api_url: config.email_api_url.clone(),
            sender_name: config.email_sender_name.clone(),
            credentials,
        }
    }

    /// Send one HTML email.
    pub async fn send(&self, to: &str, subject: &str, html_content: &str) -> Result<(), AppError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AppError::NotConfigured("Email provider credentials are not set".to_string())
        })?;

        let body = SendEmailBody {
            sender: Contact {
                email: &credentials.sender_address,
                name: Some(&self.sender_name),
            },
            to: vec![Contact {
                email: to,
                name: None,
            }],
            subject,
            html_content,
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("api-key", &credentials.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Email provider rejected message");
            return Err(AppError::Email(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(subject = %subject, "Email sent");
        Ok(())
    }
}

/// Minimal escaping for user-supplied text placed in email HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_send_fails() {
        let service = EmailService::from_config(&Config::test_default());

        let err = service.send("a@b.c", "Hi", "<p>x</p>").await.unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }

    #[test]
    fn test_body_uses_provider_field_names() {
        let body = SendEmailBody {
            sender: Contact {
                email: "noreply@subtrack.test",
                name: Some("SubTrack"),
            },
            to: vec![Contact {
                email: "a@b.c",
                name: None,
            }],
            subject: "Hi",
            html_content: "<p>x</p>",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["htmlContent"], "<p>x</p>");
        assert_eq!(json["to"][0]["email"], "a@b.c");
        assert!(json["to"][0].get("name").is_none());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
    }
}
