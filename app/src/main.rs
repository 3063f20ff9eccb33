// src/main.rs

use pledge_server::config::AppConfig;
use pledge_server::db::{MemoryRepository, PgRepository, Repository};
use pledge_server::errors::AppError;
use pledge_server::seed;
use pledge_server::services::{auth_service, mailer::SmtpMailer, notifier::NotificationDispatcher};
use pledge_server::state::AppState;
use pledge_server::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn to_io(err: AppError) -> std::io::Error {
  std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

/// `pledge_server hash-password <password>` prints a value for `ADMIN_PASSWORD_HASH`.
fn run_hash_password(args: &[String]) -> std::io::Result<()> {
  let Some(password) = args.first() else {
    eprintln!("usage: pledge_server hash-password <password>");
    return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing password"));
  };
  println!("{}", auth_service::hash_password(password).map_err(to_io)?);
  Ok(())
}

async fn open_repository(config: &AppConfig) -> Result<Arc<dyn Repository>, AppError> {
  let Some(database_url) = config.database_url.as_deref() else {
    tracing::warn!("DATABASE_URL is not set. Using the in-memory store; data is lost on restart.");
    return Ok(Arc::new(MemoryRepository::new()));
  };

  let pool = PgPool::connect(database_url).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to connect to the database.");
    AppError::from(e)
  })?;
  tracing::info!("Successfully connected to the database.");

  let repo = PgRepository::new(pool);
  repo.migrate().await?;
  tracing::info!("Database migrations applied.");
  Ok(Arc::new(repo))
}

async fn prepare_data(config: &AppConfig, repo: &dyn Repository) -> Result<(), AppError> {
  if let Some(path) = config.seed_items_path.as_deref() {
    let items = seed::load_seed_file(Path::new(path))?;
    let report = seed::apply_seed(repo, items).await?;
    tracing::info!(inserted = report.inserted, images_backfilled = report.images_backfilled, "Seed applied.");
  }

  let repaired = repo.rebuild_item_totals().await?;
  if repaired > 0 {
    tracing::warn!(repaired, "Item totals were out of step with the pledge ledger and have been rebuilt.");
  }
  Ok(())
}

fn build_notifier(config: &AppConfig) -> NotificationDispatcher {
  match SmtpMailer::from_config(&config.smtp) {
    Ok(Some(mailer)) => {
      tracing::info!(host = %config.smtp.host, port = config.smtp.port, "SMTP mailer configured.");
      NotificationDispatcher::new(Some(Arc::new(mailer)), config.smtp.timeout, config.remittance.clone())
    }
    Ok(None) => {
      tracing::warn!("SMTP credentials not set. Confirmation emails are disabled.");
      NotificationDispatcher::disabled(config.remittance.clone())
    }
    Err(e) => {
      tracing::error!(error = %e, "Invalid SMTP settings. Confirmation emails are disabled.");
      NotificationDispatcher::disabled(config.remittance.clone())
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let args: Vec<String> = std::env::args().skip(1).collect();
  if args.first().map(String::as_str) == Some("hash-password") {
    return run_hash_password(&args[1..]);
  }

  let app_config = Arc::new(AppConfig::from_env().map_err(to_io)?);
  init_tracing(app_config.log_json);
  tracing::info!("Starting pledge server...");
  app_config.log_summary();

  let repo = open_repository(&app_config).await.map_err(to_io)?;
  prepare_data(&app_config, repo.as_ref()).await.map_err(to_io)?;

  let app_state = AppState::new(app_config.clone(), repo, build_notifier(&app_config));

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
