use actix_web::{get, put, web, HttpResponse, Responder};
use log::error;
use serde_json::json;
use sqlx::PgPool;

use crate::controllers::event_controller::{invalidate_listing_cache, EVENT_COLUMNS};
use crate::models::event_model::{Event, EventRow, EventState};
use crate::types::admin_types::{BulkStateRequest, ConsolePageQuery, SetStateRequest, CONSOLE_PAGE_SIZE};

/// One page of the moderation console: events in a given state, split into
/// future (some date still ahead) and past (all dates gone by).
async fn fetch_console_page(
    db_pool: &PgPool,
    state: EventState,
    page: u32,
    future: bool,
) -> Result<(Vec<Event>, i64), sqlx::Error> {
    let date_clause = if future {
        "EXISTS (SELECT 1 FROM jsonb_array_elements(dates) AS d WHERE (d->>'date')::date >= CURRENT_DATE)"
    } else {
        "NOT EXISTS (SELECT 1 FROM jsonb_array_elements(dates) AS d WHERE (d->>'date')::date >= CURRENT_DATE)"
    };

    let count_sql = format!("SELECT COUNT(*) FROM events WHERE state = $1 AND {}", date_clause);
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(state.as_str())
        .fetch_one(db_pool)
        .await?;

    let offset = (i64::from(page) - 1) * CONSOLE_PAGE_SIZE;
    let select_sql = format!(
        "SELECT {} FROM events WHERE state = $1 AND {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        EVENT_COLUMNS, date_clause
    );
    let rows = sqlx::query_as::<_, EventRow>(&select_sql)
        .bind(state.as_str())
        .bind(CONSOLE_PAGE_SIZE)
        .bind(offset)
        .fetch_all(db_pool)
        .await?;

    Ok((rows.into_iter().map(Event::from_row).collect(), total))
}

fn console_page_response(
    events: Vec<Event>,
    total: i64,
    page: u32,
) -> HttpResponse {
    let total_pages = (total + CONSOLE_PAGE_SIZE - 1) / CONSOLE_PAGE_SIZE;
    let count = events.len();
    HttpResponse::Ok().json(json!({
        "status": "success",
        "events": events,
        "count": count,
        "page": page,
        "pageSize": CONSOLE_PAGE_SIZE,
        "total": total,
        "totalPages": total_pages
    }))
}

#[get("/events/future")]
pub async fn get_future_events_by_state(
    db_pool: web::Data<PgPool>,
    query: web::Query<ConsolePageQuery>,
) -> impl Responder {
    let state = match EventState::parse(&query.state) {
        Some(state) => state,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": format!("Unknown moderation state '{}'", query.state)
            }));
        }
    };
    let page = query.page.unwrap_or(1).max(1);

    match fetch_console_page(db_pool.get_ref(), state, page, true).await {
        Ok((events, total)) => console_page_response(events, total, page),
        Err(e) => {
            error!("Failed to fetch future {} events: {:?}", state.as_str(), e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to fetch events"
            }))
        }
    }
}

#[get("/events/past")]
pub async fn get_past_events_by_state(
    db_pool: web::Data<PgPool>,
    query: web::Query<ConsolePageQuery>,
) -> impl Responder {
    let state = match EventState::parse(&query.state) {
        Some(state) => state,
        None => {
            return HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": format!("Unknown moderation state '{}'", query.state)
            }));
        }
    };
    let page = query.page.unwrap_or(1).max(1);

    match fetch_console_page(db_pool.get_ref(), state, page, false).await {
        Ok((events, total)) => console_page_response(events, total, page),
        Err(e) => {
            error!("Failed to fetch past {} events: {:?}", state.as_str(), e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to fetch events"
            }))
        }
    }
}

#[put("/events/{event_id}/state")]
pub async fn set_event_state(
    db_pool: web::Data<PgPool>,
    path: web::Path<i64>,
    req: web::Json<SetStateRequest>,
) -> impl Responder {
    let event_id = path.into_inner();

    let result = sqlx::query("UPDATE events SET state = $1, updated_at = now() WHERE id = $2")
        .bind(req.state.as_str())
        .bind(event_id)
        .execute(db_pool.get_ref())
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => HttpResponse::NotFound().json(json!({
            "status": "error",
            "message": "Event not found"
        })),
        Ok(_) => {
            invalidate_listing_cache().await;
            HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Event state updated",
                "eventId": event_id,
                "state": req.state
            }))
        }
        Err(e) => {
            error!("Failed to update state of event {}: {:?}", event_id, e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to update event state"
            }))
        }
    }
}

/// Bulk transition. Requests over the limit are refused outright, before any
/// row is touched; the console shows the same warning client-side.
#[put("/events/state")]
pub async fn bulk_set_event_state(
    db_pool: web::Data<PgPool>,
    req: web::Json<BulkStateRequest>,
) -> impl Responder {
    if req.event_ids.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "No events selected"
        }));
    }

    if req.exceeds_limit() {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "Bulk actions are limited to 100 events at a time"
        }));
    }

    let result = sqlx::query("UPDATE events SET state = $1, updated_at = now() WHERE id = ANY($2)")
        .bind(req.state.as_str())
        .bind(&req.event_ids)
        .execute(db_pool.get_ref())
        .await;

    match result {
        Ok(done) => {
            invalidate_listing_cache().await;
            HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Event states updated",
                "updated": done.rows_affected(),
                "state": req.state
            }))
        }
        Err(e) => {
            error!("Bulk state update failed: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to update event states"
            }))
        }
    }
}
