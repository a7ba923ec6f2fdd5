use actix_web::{get, web, HttpResponse, Responder};
use log::{error, warn};
use redis_client::RedisManager;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::event_model::{Event, EventRow};
use crate::types::event_types::{EventListQuery, SimilarEventsQuery};

pub const EVENT_COLUMNS: &str = "id, name, category, subcategory, description, region, subregion, \
     city, host, address, dates, image, price_type, price_amount, links, state, added_by, \
     submitter_email, popularity_score, trust_score, created_at, updated_at";

pub const LISTING_CACHE_KEY: &str = "events:landing";
const CACHE_TTL: i64 = 86400; // 24 hours

/// Drops the cached landing page. Called after every mutation that can change
/// what the public listing shows; failures only get logged.
pub async fn invalidate_listing_cache() {
    if let Some(redis_manager) = RedisManager::global() {
        if let Err(e) = redis_manager.delete(LISTING_CACHE_KEY).await {
            warn!("Failed to invalidate listing cache: {:?}", e);
        }
    }
}

fn push_listing_filters(builder: &mut QueryBuilder<Postgres>, query: &EventListQuery) {
    builder.push(" WHERE state = 'approved'");

    if let Some(region) = &query.region {
        builder.push(" AND region = ").push_bind(region.clone());
    }
    if let Some(subregion) = &query.subregion {
        builder.push(" AND subregion = ").push_bind(subregion.clone());
    }
    if let Some(category) = &query.category {
        builder.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(text) = &query.q {
        let pattern = format!("%{}%", text);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if query.from.is_some() || query.to.is_some() {
        builder.push(" AND EXISTS (SELECT 1 FROM jsonb_array_elements(dates) AS d WHERE TRUE");
        if let Some(from) = query.from {
            builder.push(" AND (d->>'date')::date >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND (d->>'date')::date <= ").push_bind(to);
        }
        builder.push(")");
    }
}

#[get("/events")]
pub async fn get_events(
    db_pool: web::Data<PgPool>,
    query: web::Query<EventListQuery>,
) -> impl Responder {
    let query = query.into_inner();
    let cacheable = query.is_default_listing();

    if cacheable {
        if let Some(redis_manager) = RedisManager::global() {
            match redis_manager.get(LISTING_CACHE_KEY).await {
                Ok(Some(cached)) => {
                    if let Ok(response) = serde_json::from_str::<serde_json::Value>(&cached) {
                        return HttpResponse::Ok().json(response);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Redis cache read error: {:?}", e);
                }
            }
        }
    }

    let page = query.page.unwrap_or(1).max(1);
    let page_size = i64::from(query.page_size.unwrap_or(20).clamp(1, 100));
    let offset = (i64::from(page) - 1) * page_size;

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM events");
    push_listing_filters(&mut count_builder, &query);

    let total: i64 = match count_builder
        .build_query_scalar()
        .fetch_one(db_pool.get_ref())
        .await
    {
        Ok(total) => total,
        Err(e) => {
            error!("Failed to count events: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to fetch events"
            }));
        }
    };

    let mut select_builder =
        QueryBuilder::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
    push_listing_filters(&mut select_builder, &query);
    select_builder
        .push(" ORDER BY popularity_score DESC, created_at DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<EventRow> = match select_builder
        .build_query_as()
        .fetch_all(db_pool.get_ref())
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to fetch events: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to fetch events"
            }));
        }
    };

    let events: Vec<Event> = rows.into_iter().map(Event::from_row).collect();
    let count = events.len();

    let response_data = json!({
        "status": "success",
        "message": "Events fetched successfully",
        "events": events,
        "count": count,
        "page": page,
        "total": total
    });

    if cacheable {
        if let Some(redis_manager) = RedisManager::global() {
            if let Ok(response_json) = serde_json::to_string(&response_data) {
                if let Err(e) = redis_manager
                    .set_with_ttl(LISTING_CACHE_KEY, &response_json, CACHE_TTL)
                    .await
                {
                    warn!("Failed to cache landing page: {:?}", e);
                }
            }
        }
    }

    HttpResponse::Ok().json(response_data)
}

/// Similarity lookup behind the duplicate-submission warning: partial name
/// match within the same region and city. Rejected events are excluded, a
/// pending duplicate is still a duplicate.
#[get("/events/similar")]
pub async fn search_similar_events(
    db_pool: web::Data<PgPool>,
    query: web::Query<SimilarEventsQuery>,
) -> impl Responder {
    let query = query.into_inner();

    if query.name.trim().is_empty() || query.region.trim().is_empty() || query.city.trim().is_empty()
    {
        return HttpResponse::Ok().json(json!({
            "status": "success",
            "events": []
        }));
    }

    let sql = format!(
        "SELECT {} FROM events WHERE name ILIKE $1 AND region = $2 AND city ILIKE $3 \
         AND state <> 'rejected' ORDER BY created_at DESC LIMIT 5",
        EVENT_COLUMNS
    );

    let rows = match sqlx::query_as::<_, EventRow>(&sql)
        .bind(format!("%{}%", query.name.trim()))
        .bind(query.region.trim())
        .bind(query.city.trim())
        .fetch_all(db_pool.get_ref())
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!("Similarity search failed: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to search for similar events"
            }));
        }
    };

    let events: Vec<Event> = rows.into_iter().map(Event::from_row).collect();

    HttpResponse::Ok().json(json!({
        "status": "success",
        "events": events
    }))
}

#[get("/events/{event_id}")]
pub async fn get_event_by_id(db_pool: web::Data<PgPool>, path: web::Path<i64>) -> impl Responder {
    let event_id = path.into_inner();

    let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);

    let row = match sqlx::query_as::<_, EventRow>(&sql)
        .bind(event_id)
        .fetch_optional(db_pool.get_ref())
        .await
    {
        Ok(Some(row)) => row,
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

    HttpResponse::Ok().json(json!({
        "status": "success",
        "event": Event::from_row(row)
    }))
}
