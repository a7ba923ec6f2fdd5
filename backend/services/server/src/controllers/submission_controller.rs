use actix_web::{post, put, web, HttpResponse, Responder};
use log::error;
use serde_json::json;
use sqlx::PgPool;

use crate::controllers::event_controller::invalidate_listing_cache;
use crate::types::event_types::{SubmitEventRequest, UpdateEventRequest};

/// External submission. New events always enter moderation as pending.
#[post("/events")]
pub async fn submit_event(
    db_pool: web::Data<PgPool>,
    req: web::Json<SubmitEventRequest>,
) -> impl Responder {
    if let Err(e) = req.validate_submission() {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "Validation failed",
            "errors": e
        }));
    }

    let dates = match serde_json::to_value(&req.dates) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize dates: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to store event"
            }));
        }
    };
    let links = serde_json::to_value(&req.links).unwrap_or_else(|_| json!([]));

    let event_id: i64 = match sqlx::query_scalar(
        r#"
        INSERT INTO events
            (name, category, subcategory, description, region, subregion, city, host,
             address, dates, image, price_type, price_amount, links, state, added_by,
             submitter_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                'pending', 'external', $15)
        RETURNING id
        "#,
    )
    .bind(&req.name)
    .bind(&req.category)
    .bind(&req.subcategory)
    .bind(&req.description)
    .bind(&req.region)
    .bind(&req.subregion)
    .bind(&req.city)
    .bind(&req.host)
    .bind(&req.address)
    .bind(dates)
    .bind(&req.image)
    .bind(req.price_type.as_str())
    .bind(req.price_amount)
    .bind(links)
    .bind(&req.submitter_email)
    .fetch_one(db_pool.get_ref())
    .await
    {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to insert event: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to store event"
            }));
        }
    };

    invalidate_listing_cache().await;

    HttpResponse::Created().json(json!({
        "status": "success",
        "message": "Event submitted for review",
        "eventId": event_id
    }))
}

/// Submitter edit via the confirmation-mail link. Only the original submitter
/// may edit, and every edit goes back through moderation.
#[put("/events/{event_id}")]
pub async fn update_event(
    db_pool: web::Data<PgPool>,
    path: web::Path<i64>,
    req: web::Json<UpdateEventRequest>,
) -> impl Responder {
    let event_id = path.into_inner();

    if let Err(e) = req.validate_update() {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "Validation failed",
            "errors": e
        }));
    }

    let stored_email: Option<String> = match sqlx::query_scalar::<_, Option<String>>(
        "SELECT submitter_email FROM events WHERE id = $1",
    )
    .bind(event_id)
    .fetch_optional(db_pool.get_ref())
    .await
    {
        Ok(Some(email)) => email,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({
                "status": "error",
                "message": "Event not found"
            }));
        }
        Err(e) => {
            error!("Failed to load event {}: {:?}", event_id, e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to load event"
            }));
        }
    };

    if stored_email.as_deref() != Some(req.submitter_email.as_str()) {
        return HttpResponse::Forbidden().json(json!({
            "status": "error",
            "message": "Only the original submitter may edit this event"
        }));
    }

    let dates = match serde_json::to_value(&req.dates) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize dates: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to update event"
            }));
        }
    };
    let links = serde_json::to_value(&req.links).unwrap_or_else(|_| json!([]));

    let result = sqlx::query(
        r#"
        UPDATE events
        SET name = $1, category = $2, subcategory = $3, description = $4, region = $5,
            subregion = $6, city = $7, host = $8, address = $9, dates = $10, image = $11,
            price_type = $12, price_amount = $13, links = $14,
            state = 'pending', updated_at = now()
        WHERE id = $15
        "#,
    )
    .bind(&req.name)
    .bind(&req.category)
    .bind(&req.subcategory)
    .bind(&req.description)
    .bind(&req.region)
    .bind(&req.subregion)
    .bind(&req.city)
    .bind(&req.host)
    .bind(&req.address)
    .bind(dates)
    .bind(&req.image)
    .bind(req.price_type.as_str())
    .bind(req.price_amount)
    .bind(links)
    .bind(event_id)
    .execute(db_pool.get_ref())
    .await;

    if let Err(e) = result {
        error!("Failed to update event {}: {:?}", event_id, e);
        return HttpResponse::InternalServerError().json(json!({
            "status": "error",
            "message": "Failed to update event"
        }));
    }

    invalidate_listing_cache().await;

    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Event updated and queued for review",
        "eventId": event_id
    }))
}
