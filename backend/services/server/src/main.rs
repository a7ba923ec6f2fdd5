mod controllers;
mod middleware;
mod models;
mod types;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use log::{info, warn};
use redis_client::RedisManager;
use sqlx::postgres::PgPoolOptions;
use std::env;

use crate::controllers::admin_event_controller::{
    bulk_set_event_state, get_future_events_by_state, get_past_events_by_state, set_event_state,
};
use crate::controllers::event_controller::{get_event_by_id, get_events, search_similar_events};
use crate::controllers::submission_controller::{submit_event, update_event};
use crate::middleware::admin::AdminMiddleware;

async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(r#"{"status": "Ok"}"#)
}

async fn run() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to create Postgres pool");

    info!("Connected to Postgres");

    let redis_url =
        env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let redis_manager =
        RedisManager::init_global(&redis_url).expect("Failed to initialize Redis manager");

    // The cache is an optimization; a dead Redis only costs the listing cache.
    if let Err(e) = redis_manager.connect().await {
        warn!("Redis unavailable, continuing without listing cache: {:?}", e);
    }

    let admin_key = env::var("ADMIN_API_KEY").expect("ADMIN_API_KEY must be set in .env");

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);

    HttpServer::new(move || {
        let admin_scope = web::scope("/admin")
            .wrap(AdminMiddleware::new(admin_key.clone()))
            .service(get_future_events_by_state)
            .service(get_past_events_by_state)
            .service(bulk_set_event_state)
            .service(set_event_state);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .service(admin_scope)
            // `/events/similar` must be registered ahead of `/events/{event_id}`.
            .service(search_similar_events)
            .service(get_events)
            .service(submit_event)
            .service(update_event)
            .service(get_event_by_id)
            .route("/health", web::get().to(health))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

fn main() -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime");
    runtime.block_on(run())
}
