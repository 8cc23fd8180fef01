//! Outgoing verification mail.
//!
//! A thin wrapper over an async SMTP transport. The transport is built
//! once at startup from the configured relay (plain connection, matching
//! sandbox relays such as Mailtrap) and cloned into request handlers.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    /// Base URL for the verification link, e.g. `http://localhost:3001`.
    verify_base_url: String,
}

impl Mailer {
    pub fn new(smtp: &SmtpConfig, verify_base_url: &str) -> Self {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host).port(smtp.port);
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Self {
            transport: builder.build(),
            from: smtp.from.clone(),
            verify_base_url: verify_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn verification_link(&self, token: &str) -> String {
        format!("{}/verify/{}", self.verify_base_url, token)
    }

    /// Build the verification message; the link embeds the token.
    fn verification_message(&self, to: &str, token: &str) -> Result<Message> {
        let link = self.verification_link(token);
        Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject("Verify your email address")
            .header(ContentType::TEXT_HTML)
            .body(format!(
                "<p>Please click this link to verify your account:</p> <a href=\"{link}\">Verify</a>"
            ))
            .context("building verification mail")
    }

    pub async fn send_verification(&self, to: &str, token: &str) -> Result<()> {
        let message = self.verification_message(to, token)?;
        self.transport
            .send(message)
            .await
            .context("sending verification mail")?;
        tracing::info!(recipient = to, "verification mail dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn mailer() -> Mailer {
        Mailer::new(
            &SmtpConfig {
                host: "localhost".into(),
                port: 2525,
                username: None,
                password: None,
                from: "no-reply@mediflow.local".into(),
            },
            "http://localhost:3001/",
        )
    }

    #[test]
    fn verification_link_embeds_token_without_double_slash() {
        assert_eq!(
            mailer().verification_link("tok123"),
            "http://localhost:3001/verify/tok123"
        );
    }

    #[test]
    fn verification_message_builds() {
        assert!(mailer()
            .verification_message("alice@example.com", "tok123")
            .is_ok());
    }

    #[test]
    fn bad_recipient_is_an_error() {
        assert!(mailer().verification_message("not an address", "t").is_err());
    }
}
