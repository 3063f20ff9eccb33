// src/web/extractors.rs

//! Session-cookie identity extractors.

use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

/// The signed-in user, if any. Never fails for anonymous requests.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// A signed-in admin. Anonymous requests fail with `AuthRequired`, other
/// users with `Unauthorized`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

pub fn session_token(req: &HttpRequest, state: &AppState) -> Option<String> {
  req
    .cookie(&state.config.session_cookie_name)
    .map(|c| c.value().to_string())
    .filter(|v| !v.is_empty())
}

fn app_state(req: &HttpRequest) -> Result<AppState, AppError> {
  req
    .app_data::<web::Data<AppState>>()
    .map(|data| data.get_ref().clone())
    .ok_or_else(|| AppError::Internal("AppState is not registered with the app.".to_string()))
}

async fn resolve_user(state: AppState, token: Option<String>) -> Result<Option<User>, AppError> {
  let Some(token) = token else {
    return Ok(None);
  };
  let user = state.repo.find_session_user(&token).await?;
  if user.is_none() {
    debug!("Session cookie present but no live session matches it.");
  }
  Ok(user)
}

impl FromRequest for CurrentUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = app_state(req);
    let token = state.as_ref().ok().and_then(|s| session_token(req, s));
    Box::pin(async move { Ok(CurrentUser(resolve_user(state?, token).await?)) })
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let current = CurrentUser::from_request(req, payload);
    Box::pin(async move {
      match current.await?.0 {
        None => Err(AppError::AuthRequired),
        Some(user) if user.is_admin() => Ok(AdminUser(user)),
        Some(user) => {
          warn!(user_id = user.id, "Non-admin attempted to access admin data.");
          Err(AppError::Unauthorized)
        }
      }
    })
  }
}
