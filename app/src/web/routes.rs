// src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use tracing::debug;

use crate::errors::AppError;
use crate::web::handlers::{admin_handlers, auth_handlers, item_handlers, pledge_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed or mistyped JSON bodies surface as a 400 in the app's error shape.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  debug!(error = %err, "Rejected request body.");
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().limit(64 * 1024).error_handler(json_error_handler)
}

/// Mounts the JSON API under `/api/v1` and the browser admin entry points.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(json_config())
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/items")
            .route("", web::get().to(item_handlers::list_items_handler))
            .route("/{item_id}", web::get().to(item_handlers::get_item_handler)),
        )
        .route("/pledges", web::post().to(pledge_handlers::create_pledge_handler))
        .service(
          web::scope("/admin")
            .route("/login", web::post().to(auth_handlers::admin_login_handler))
            .route("/pledges", web::get().to(admin_handlers::list_pledges_handler))
            .route("/pledges/export.csv", web::get().to(admin_handlers::export_csv_handler))
            .route("/stats", web::get().to(admin_handlers::stats_handler)),
        )
        .service(
          web::scope("/auth")
            .route("/me", web::get().to(auth_handlers::me_handler))
            .route("/logout", web::post().to(auth_handlers::logout_handler)),
        ),
    )
    .route("/admin", web::get().to(admin_handlers::admin_page_handler))
    .route("/admin/login", web::get().to(admin_handlers::login_page_handler));
}
