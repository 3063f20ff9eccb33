// src/pipelines/login_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewIdentity, Role};
use crate::pipelines::contexts::{filled, AdminLoginCtxData};
use crate::services::auth_service;
use chrono::{Duration, Utc};
use pledge_flow::{ContextData, Control, Flow, FlowRegistry, StepDef};
use tracing::{event, info, warn, Level};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Registers the admin username/password login flow.
pub fn register_login_flow(registry: &FlowRegistry<AppError>) {
  let mut login_f = Flow::<AdminLoginCtxData, AppError>::new(
    "admin_login",
    vec![
      StepDef::required("validate_login_input"),
      StepDef::required("verify_admin_credentials"),
      StepDef::required("upsert_admin_identity"),
      StepDef::required("issue_session"),
    ],
  );

  login_f.on("validate_login_input", |ctx_data: ContextData<AdminLoginCtxData>| {
    Box::pin(async move {
      let (username_empty, password_empty) = {
        let guard = ctx_data.read();
        (guard.username.trim().is_empty(), guard.password.is_empty())
      };
      if username_empty || password_empty {
        warn!("Admin login rejected: missing username or password.");
        return Err(AppError::Validation("Username and password are required.".to_string()));
      }
      Ok::<_, AppError>(Control::Continue)
    })
  });

  login_f.on("verify_admin_credentials", |ctx_data: ContextData<AdminLoginCtxData>| {
    Box::pin(async move {
      let (username, password, config) = {
        let guard = ctx_data.read();
        (guard.username.trim().to_string(), guard.password.clone(), guard.app_state.config.clone())
      };

      let (Some(expected_username), Some(stored_hash)) = (&config.admin_username, &config.admin_password_hash) else {
        warn!("Admin login attempted but ADMIN_USERNAME / ADMIN_PASSWORD_HASH are not set.");
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
      };

      // Hash check runs whether or not the username matched.
      let password_ok = auth_service::verify_password(stored_hash, &password)?;
      if username != *expected_username || !password_ok {
        warn!(%username, "Admin login failed.");
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
      }
      event!(Level::DEBUG, %username, "Admin credentials verified.");
      Ok::<_, AppError>(Control::Continue)
    })
  });

  login_f.on("upsert_admin_identity", |ctx_data: ContextData<AdminLoginCtxData>| {
    Box::pin(async move {
      let (repo, username) = {
        let guard = ctx_data.read();
        (guard.app_state.repo.clone(), guard.username.trim().to_string())
      };

      let user = repo
        .upsert_user(NewIdentity {
          external_id: format!("local:{}", username),
          name: Some(username),
          email: None,
          login_method: Some("password".to_string()),
          role: Role::Admin,
        })
        .await?;
      event!(Level::INFO, user_id = user.id, "Admin identity upserted.");
      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(Control::Continue)
    })
  });

  login_f.on("issue_session", |ctx_data: ContextData<AdminLoginCtxData>| {
    Box::pin(async move {
      let (repo, user_id, ttl_hours) = {
        let guard = ctx_data.read();
        (
          guard.app_state.repo.clone(),
          filled(guard.user.as_ref(), "user")?.id,
          guard.app_state.config.session_ttl_hours,
        )
      };

      let token = auth_service::new_session_token();
      let expires_at = Utc::now() + Duration::hours(ttl_hours);
      repo.create_session(&token, user_id, expires_at).await?;

      {
        let mut guard = ctx_data.write();
        guard.session_token = Some(token);
        guard.session_expires_at = Some(expires_at);
      }
      info!(user_id, "Admin session issued.");
      Ok::<_, AppError>(Control::Continue)
    })
  });

  registry.register(login_f);
  info!("Admin login flow registered.");
}

/// Shorthand used by the handler once the flow completed.
pub fn session_of(data: &AdminLoginCtxData) -> AppResult<(String, crate::models::User)> {
  Ok((
    filled(data.session_token.clone(), "session token")?,
    filled(data.user.clone(), "user")?,
  ))
}
