// src/web/handlers/admin_handlers.rs

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::admin_review;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, CurrentUser};

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
  #[serde(default)]
  pub q: String,
}

async fn review_payload(app_state: &AppState, query: &str) -> Result<serde_json::Value, AppError> {
  let records = app_state.repo.list_pledges().await?;
  let matching = admin_review::search(&records, query);
  Ok(json!({ "count": matching.len(), "pledges": matching }))
}

#[instrument(name = "handler::admin_pledges", skip(app_state, admin, query), fields(admin_id = admin.0.id, q = %query.q))]
pub async fn list_pledges_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let payload = review_payload(&app_state, &query.q).await?;
  Ok(HttpResponse::Ok().json(payload))
}

#[instrument(name = "handler::admin_export_csv", skip(app_state, admin, query), fields(admin_id = admin.0.id))]
pub async fn export_csv_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let records = app_state.repo.list_pledges().await?;
  let matching = admin_review::search(&records, &query.q);
  let filename = admin_review::csv_filename(Utc::now().date_naive());
  info!(rows = matching.len(), %filename, "Exporting pledges.");

  Ok(
    HttpResponse::Ok()
      .content_type("text/csv; charset=utf-8")
      .insert_header(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
      })
      .body(admin_review::export_csv(&matching)),
  )
}

#[instrument(name = "handler::admin_stats", skip(app_state, admin), fields(admin_id = admin.0.id))]
pub async fn stats_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let items = app_state.repo.list_items().await?;
  let records = app_state.repo.list_pledges().await?;
  Ok(HttpResponse::Ok().json(admin_review::stats(&items, &records)))
}

/// Browser entry point: anonymous visitors are sent to the login page.
#[instrument(name = "handler::admin_page", skip_all)]
pub async fn admin_page_handler(
  app_state: web::Data<AppState>,
  current: CurrentUser,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  match current.0 {
    None => Ok(
      HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/admin/login"))
        .finish(),
    ),
    Some(user) if !user.is_admin() => Err(AppError::Unauthorized),
    Some(_) => {
      let mut payload = review_payload(&app_state, &query.q).await?;
      let items = app_state.repo.list_items().await?;
      let records = app_state.repo.list_pledges().await?;
      payload["stats"] = serde_json::to_value(admin_review::stats(&items, &records))
        .map_err(|e| AppError::Internal(format!("Failed to encode stats: {}", e)))?;
      Ok(HttpResponse::Ok().json(payload))
    }
  }
}

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Admin Login</title></head>
<body>
  <h1>Admin Login</h1>
  <form id="login">
    <label>Username <input name="username" autocomplete="username" required></label>
    <label>Password <input name="password" type="password" autocomplete="current-password" required></label>
    <button type="submit">Sign in</button>
    <p id="error" role="alert"></p>
  </form>
  <script>
    document.getElementById("login").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const res = await fetch("/api/v1/admin/login", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ username: form.get("username"), password: form.get("password") }),
      });
      if (res.ok) {
        window.location.href = "/admin";
      } else {
        const body = await res.json().catch(() => ({}));
        document.getElementById("error").textContent = body.message || "Login failed.";
      }
    });
  </script>
</body>
</html>
"#;

pub async fn login_page_handler() -> HttpResponse {
  HttpResponse::Ok().content_type("text/html; charset=utf-8").body(LOGIN_PAGE)
}
