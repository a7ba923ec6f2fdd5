use actix_web::{post, web, HttpResponse, Responder};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::mailer::{edit_url, render_confirmation, Mailer};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub event_id: i64,
    pub event_name: String,
    pub email: String,
}

/// Sends the submission confirmation with the personal edit link. One
/// attempt, no retry; a provider failure is reported straight back.
#[post("/send-confirmation")]
pub async fn send_confirmation(req: web::Json<ConfirmationRequest>) -> impl Responder {
    let mailer = match Mailer::from_env() {
        Ok(mailer) => mailer,
        Err(e) => {
            error!("Mailer unavailable: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": e.to_string()
            }));
        }
    };

    let base_url = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let link = edit_url(&base_url, req.event_id, &req.email);
    let mail = render_confirmation(&req.event_name, &link);

    match mailer.send(&req.email, &mail.subject, &mail.text, &mail.html).await {
        Ok(provider_response) => HttpResponse::Ok().json(json!({
            "success": true,
            "emailResponse": provider_response
        })),
        Err(e) => {
            error!("Confirmation mail to {} failed: {}", req.email, e);
            HttpResponse::InternalServerError().json(json!({
                "error": e.to_string()
            }))
        }
    }
}
