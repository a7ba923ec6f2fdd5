use actix_web::{post, web, HttpResponse, Responder};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::future::join_all;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use sqlx::{FromRow, PgPool};
use storage_client::StorageManager;

static DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/([a-zA-Z0-9.+-]+);base64,(.+)$").unwrap());

/// Splits a `data:image/...;base64,...` URL into image subtype and payload.
pub fn parse_image_data_url(value: &str) -> Option<(String, &str)> {
    let captures = DATA_URL.captures(value)?;
    let subtype = captures.get(1)?.as_str().to_lowercase();
    let payload = captures.get(2)?.as_str();
    Some((subtype, payload))
}

/// Deterministic object name so a re-run overwrites instead of duplicating.
pub fn object_name(event_id: i64, subtype: &str) -> String {
    format!("migrated-{}.{}", event_id, subtype)
}

#[derive(Debug, FromRow)]
struct InlineImageRow {
    id: i64,
    image: String,
}

async fn migrate_row(db_pool: &PgPool, store: &StorageManager, row: &InlineImageRow) -> Result<(), String> {
    let (subtype, payload) = parse_image_data_url(&row.image)
        .ok_or_else(|| format!("event {}: image is not a well-formed data URL", row.id))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| format!("event {}: base64 decode failed: {}", row.id, e))?;

    let path = object_name(row.id, &subtype);
    let content_type = format!("image/{}", subtype);

    store
        .upload(&path, bytes, &content_type)
        .await
        .map_err(|e| format!("event {}: upload failed: {}", row.id, e))?;

    let public_url = store.public_url(&path);

    sqlx::query("UPDATE events SET image = $1, updated_at = now() WHERE id = $2")
        .bind(&public_url)
        .bind(row.id)
        .execute(db_pool)
        .await
        .map_err(|e| format!("event {}: row update failed: {}", row.id, e))?;

    Ok(())
}

/// One-shot batch job: move inline base64 images into the storage bucket and
/// rewrite each row to the resulting public URL. Migrated rows no longer match
/// the selection predicate, so re-running is safe.
#[post("/migrate-images")]
pub async fn migrate_images(db_pool: web::Data<PgPool>) -> impl Responder {
    let store = match StorageManager::global() {
        Some(store) => store,
        None => {
            return HttpResponse::InternalServerError().json(json!({
                "error": "Storage client is not configured",
                "success": false
            }));
        }
    };

    let rows: Vec<InlineImageRow> = match sqlx::query_as(
        "SELECT id, image FROM events WHERE image LIKE 'data:image/%'",
    )
    .fetch_all(db_pool.get_ref())
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to enumerate inline images: {:?}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": format!("Failed to enumerate inline images: {}", e),
                "success": false
            }));
        }
    };

    let outcomes = join_all(
        rows.iter()
            .map(|row| migrate_row(db_pool.get_ref(), store, row)),
    )
    .await;

    let mut migrated_count: u64 = 0;
    let mut error_count: u64 = 0;
    for outcome in outcomes {
        match outcome {
            Ok(()) => migrated_count += 1,
            Err(message) => {
                error!("{}", message);
                error_count += 1;
            }
        }
    }

    info!(
        "Image migration finished: {} migrated, {} failed",
        migrated_count, error_count
    );

    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image migration finished",
        "migratedCount": migrated_count,
        "errorCount": error_count
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_png_data_url() {
        let (subtype, payload) = parse_image_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(subtype, "png");
        assert_eq!(payload, "aGVsbG8=");
        assert_eq!(BASE64.decode(payload).unwrap(), b"hello");
    }

    #[test]
    fn normalizes_subtype_case() {
        let (subtype, _) = parse_image_data_url("data:image/JPEG;base64,Zm9v").unwrap();
        assert_eq!(subtype, "jpeg");
    }

    #[test]
    fn rejects_non_base64_and_foreign_urls() {
        assert!(parse_image_data_url("https://example.com/a.png").is_none());
        assert!(parse_image_data_url("data:text/plain;base64,Zm9v").is_none());
        assert!(parse_image_data_url("data:image/png,plain-payload").is_none());
    }

    #[test]
    fn migrated_url_no_longer_matches_selection_predicate() {
        // The SQL predicate is a LIKE on the data-URL prefix; a rewritten
        // public URL must not match it, or re-runs would loop forever.
        let store = StorageManager::new("https://backend.example.com", "event-images", "key");
        let url = store.public_url(&object_name(12, "png"));
        assert!(!url.starts_with("data:image/"));
        assert_eq!(
            url,
            "https://backend.example.com/storage/v1/object/public/event-images/migrated-12.png"
        );
    }

    #[test]
    fn object_names_are_deterministic() {
        assert_eq!(object_name(42, "webp"), "migrated-42.webp");
        assert_eq!(object_name(42, "webp"), object_name(42, "webp"));
    }
}
