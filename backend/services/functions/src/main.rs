mod handlers;
mod llm;
mod mailer;

use actix_cors::Cors;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use log::info;
use sqlx::postgres::PgPoolOptions;
use std::env;
use storage_client::StorageManager;

use crate::handlers::confirmation_email::send_confirmation;
use crate::handlers::migrate_images::migrate_images;
use crate::handlers::summarize::summarize_descriptions;

/// Maintenance endpoints: called rarely, from scripts or the admin UI, hence
/// the permissive CORS setup on every route.
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

    if let (Ok(storage_url), Ok(service_key)) =
        (env::var("STORAGE_URL"), env::var("STORAGE_SERVICE_KEY"))
    {
        let bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "event-images".to_string());
        StorageManager::init_global(&storage_url, &bucket, &service_key);
        info!("Storage client ready for bucket {}", bucket);
    }

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8100);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(actix_web::web::Data::new(pool.clone()))
            .service(migrate_images)
            .service(summarize_descriptions)
            .service(send_confirmation)
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
