// src/web/handlers/pledge_handlers.rs

use actix_web::{web, HttpResponse};
use pledge_flow::{ContextData, Outcome};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{PledgeReceipt, PledgeRequest};
use crate::money::to_major_units;
use crate::pipelines::contexts::PledgeCtxData;
use crate::state::AppState;

/// Runs the pledge flow and turns its final context into a receipt.
pub async fn submit_pledge(app_state: &AppState, request: PledgeRequest) -> Result<PledgeReceipt, AppError> {
  let ctx_data = ContextData::new(PledgeCtxData::new(app_state.clone(), request));

  match app_state.flows.run(ctx_data.clone()).await? {
    Outcome::Completed => {
      let guard = ctx_data.read();
      let committed = guard.committed.as_ref().ok_or_else(|| {
        warn!("Pledge flow completed without a committed pledge.");
        AppError::Internal("Pledge completed without being recorded.".to_string())
      })?;
      Ok(PledgeReceipt {
        success: true,
        message: "Thank you for your pledge!".to_string(),
        pledge_reference: committed.pledge.reference.clone(),
        item_name: committed.item.name.clone(),
        amount: to_major_units(committed.pledge.amount_cents),
        email_sent: guard.email_sent,
      })
    }
    Outcome::Halted { step } => {
      warn!(%step, "Pledge flow was halted by a step.");
      Err(AppError::Internal("Pledge processing was halted.".to_string()))
    }
  }
}

#[instrument(name = "handler::create_pledge", skip(app_state, payload), fields(item_id = payload.item_id))]
pub async fn create_pledge_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PledgeRequest>,
) -> Result<HttpResponse, AppError> {
  let receipt = submit_pledge(app_state.get_ref(), payload.into_inner()).await?;
  info!(reference = %receipt.pledge_reference, email_sent = receipt.email_sent, "Pledge accepted.");
  Ok(HttpResponse::Created().json(receipt))
}
