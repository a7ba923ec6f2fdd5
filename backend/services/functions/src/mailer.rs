use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider not configured: {0}")]
    Unconfigured(String),
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail provider responded with HTTP {status}: {body}")]
    Provider { status: u16, body: String },
}

const DEFAULT_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct Mailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn from_env() -> Result<Self, MailError> {
        let api_key = std::env::var("EMAIL_API_KEY")
            .map_err(|_| MailError::Unconfigured("EMAIL_API_KEY is not set".to_string()))?;
        let endpoint =
            std::env::var("EMAIL_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let from = std::env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "Veranstaltungen <noreply@events.example.com>".to_string());

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key,
            from,
        })
    }

    /// One delivery attempt; the provider's JSON answer is passed back to the
    /// caller verbatim.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<Value, MailError> {
        let payload = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "text": text,
            "html": html,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MailError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Edit link sent to the submitter; the email address doubles as the edit
/// credential checked by the server's update endpoint.
pub fn edit_url(base_url: &str, event_id: i64, email: &str) -> String {
    let base = format!("{}/edit/{}", base_url.trim_end_matches('/'), event_id);
    match reqwest::Url::parse_with_params(&base, &[("email", email)]) {
        Ok(url) => url.to_string(),
        Err(_) => base,
    }
}

pub struct ConfirmationMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn render_confirmation(event_name: &str, edit_url: &str) -> ConfirmationMail {
    let subject = format!("Deine Veranstaltung „{}“ wurde eingereicht", event_name);

    let text = format!(
        "Hallo,\n\n\
         vielen Dank für deine Einreichung! Deine Veranstaltung „{event_name}“ wurde \
         erfolgreich übermittelt und wird von unserem Team geprüft. Sobald sie freigegeben \
         ist, erscheint sie im Veranstaltungskalender.\n\n\
         Du möchtest noch etwas ändern? Über diesen Link kannst du deine Angaben jederzeit \
         bearbeiten:\n{edit_url}\n\n\
         --\n\
         Thank you for your submission! Your event \"{event_name}\" has been received and \
         is awaiting review. You can edit your submission at any time using the link above.\n"
    );

    let html = format!(
        "<p>Hallo,</p>\
         <p>vielen Dank für deine Einreichung! Deine Veranstaltung <strong>„{event_name}“</strong> \
         wurde erfolgreich übermittelt und wird von unserem Team geprüft. Sobald sie freigegeben \
         ist, erscheint sie im Veranstaltungskalender.</p>\
         <p>Du möchtest noch etwas ändern? Über diesen Link kannst du deine Angaben jederzeit \
         bearbeiten:<br/><a href=\"{edit_url}\">{edit_url}</a></p>\
         <hr/>\
         <p>Thank you for your submission! Your event <strong>\"{event_name}\"</strong> has been \
         received and is awaiting review. You can edit your submission at any time using the \
         link above.</p>"
    );

    ConfirmationMail { subject, text, html }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_url_encodes_the_recipient() {
        let url = edit_url("https://events.example.com/", 17, "max.muster+test@example.com");
        assert!(url.starts_with("https://events.example.com/edit/17?email="));
        assert!(url.contains("max.muster%2Btest%40example.com"));
    }

    #[test]
    fn confirmation_embeds_name_and_link_in_both_bodies() {
        let mail = render_confirmation("Sommerfest", "https://events.example.com/edit/3?email=a%40b.c");

        assert!(mail.subject.contains("Sommerfest"));
        assert!(mail.text.contains("https://events.example.com/edit/3?email=a%40b.c"));
        assert!(mail.html.contains("https://events.example.com/edit/3?email=a%40b.c"));
        assert!(mail.text.contains("Sommerfest"));
        assert!(mail.html.contains("Sommerfest"));
    }
}
