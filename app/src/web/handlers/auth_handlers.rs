// src/web/handlers/auth_handlers.rs

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use pledge_flow::{ContextData, Outcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::contexts::AdminLoginCtxData;
use crate::pipelines::login_pipeline::session_of;
use crate::state::AppState;
use crate::web::extractors::{session_token, CurrentUser};

#[derive(Deserialize)]
pub struct AdminLoginPayload {
  pub username: String,
  pub password: String,
}

pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
  Cookie::build(config.session_cookie_name.clone(), token)
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(config.cookie_secure)
    .max_age(CookieDuration::hours(config.session_ttl_hours))
    .finish()
}

fn cleared_cookie(config: &AppConfig) -> Cookie<'static> {
  let mut cookie = Cookie::build(config.session_cookie_name.clone(), "")
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(config.cookie_secure)
    .finish();
  cookie.make_removal();
  cookie
}

#[instrument(name = "handler::admin_login", skip(app_state, payload), fields(username = %payload.username))]
pub async fn admin_login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AdminLoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx_data = ContextData::new(AdminLoginCtxData::new(
    app_state.get_ref().clone(),
    payload.username,
    payload.password,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    Outcome::Completed => {
      let (token, user) = session_of(&ctx_data.read())?;
      info!(user_id = user.id, "Admin signed in.");
      Ok(
        HttpResponse::Ok()
          .cookie(session_cookie(&app_state.config, token))
          .json(json!({ "success": true, "user": user })),
      )
    }
    Outcome::Halted { step } => {
      warn!(%step, "Admin login flow was halted by a step.");
      Err(AppError::Auth("Authentication process was unexpectedly halted.".to_string()))
    }
  }
}

#[instrument(name = "handler::me", skip_all)]
pub async fn me_handler(current: CurrentUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "user": current.0 }))
}

#[instrument(name = "handler::logout", skip_all)]
pub async fn logout_handler(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  if let Some(token) = session_token(&req, &app_state) {
    app_state.repo.delete_session(&token).await?;
    info!("Session ended.");
  }
  Ok(
    HttpResponse::Ok()
      .cookie(cleared_cookie(&app_state.config))
      .json(json!({ "success": true })),
  )
}
