// src/pipelines/pledge_pipeline.rs

//! Pledge acceptance.
//!
//! The steps up to `check_remaining` are cheap early exits read outside any
//! transaction. The guard is `commit_pledge`: the store re-runs the item,
//! lock and remaining-balance checks under the item's row lock, so two
//! concurrent submissions can never both squeeze past the cap.
//!
//! Confirmation email and its log entry are optional steps; whatever happens
//! there, a committed pledge is reported as a success.

use crate::errors::{AppError, Result as AppResult};
use crate::models::NewPledge;
use crate::pipelines::contexts::{filled, PledgeCtxData};
use crate::services::confirmation::PledgeConfirmation;
use crate::services::reference::generate_reference;
use pledge_flow::{ContextData, Control, Flow, FlowRegistry, StepDef};
use tracing::{event, info, instrument, warn, Level};
use validator::{Validate, ValidationErrors};

/// Fresh references tried before giving up on a commit.
pub const MAX_REFERENCE_ATTEMPTS: usize = 5;

pub fn build_pledge_flow() -> Flow<PledgeCtxData, AppError> {
  let mut flow = Flow::new(
    "pledge",
    vec![
      StepDef::required("require_consent"),
      StepDef::required("validate_pledger"),
      StepDef::required("load_item"),
      StepDef::required("resolve_amount"),
      StepDef::required("check_remaining"),
      StepDef::required("commit_pledge"),
      StepDef::required("invalidate_catalog"),
      StepDef::optional("send_confirmation"),
      StepDef::optional("record_notification").skip_if(|data: &PledgeCtxData| data.committed.is_none()),
    ],
  );

  flow
    .on("require_consent", require_consent)
    .on("validate_pledger", validate_pledger)
    .on("load_item", load_item)
    .on("resolve_amount", resolve_amount)
    .on("check_remaining", check_remaining)
    .on("commit_pledge", commit_pledge)
    .on("invalidate_catalog", invalidate_catalog)
    .on("send_confirmation", send_confirmation)
    .on("record_notification", record_notification);
  flow
}

pub fn register_pledge_flow(registry: &FlowRegistry<AppError>) {
  registry.register(build_pledge_flow());
  info!("Pledge flow registered.");
}

async fn require_consent(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let consented = ctx_data.read().request.popi_consent;
  if !consented {
    warn!("Pledge rejected: consent not given.");
    return Err(AppError::ConsentRequired);
  }
  Ok(Control::Continue)
}

fn first_message(errors: &ValidationErrors) -> String {
  let fields = errors.field_errors();
  ["full_name", "email", "cell_number"]
    .iter()
    .filter_map(|field| fields.get(*field))
    .flat_map(|errs| errs.iter())
    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
    .unwrap_or_else(|| "Invalid pledge details.".to_string())
}

async fn validate_pledger(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let result = ctx_data.update(|data| {
    let req = &mut data.request;
    req.full_name = req.full_name.trim().to_string();
    req.email = req.email.trim().to_string();
    req.cell_number = req.cell_number.trim().to_string();
    req.validate()
  });
  result.map_err(|errors| {
    event!(Level::DEBUG, %errors, "Pledge contact details rejected.");
    AppError::Validation(first_message(&errors))
  })?;
  Ok(Control::Continue)
}

async fn load_item(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let (catalog, item_id) = {
    let guard = ctx_data.read();
    (guard.app_state.catalog.clone(), guard.request.item_id)
  };

  let item = catalog.get_item(item_id).await?;
  if item.is_locked {
    event!(Level::INFO, item_id, "Pledge rejected: item already fully pledged.");
    return Err(AppError::AlreadyFulfilled);
  }
  ctx_data.write().item = Some(item);
  Ok(Control::Continue)
}

async fn resolve_amount(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let cents = ctx_data.read().request.amount.to_minor_units()?;
  ctx_data.write().amount_cents = Some(cents);
  Ok(Control::Continue)
}

async fn check_remaining(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let (repo, item, amount_cents) = {
    let guard = ctx_data.read();
    (
      guard.app_state.repo.clone(),
      filled(guard.item.clone(), "item")?,
      filled(guard.amount_cents, "amount")?,
    )
  };

  let current = repo.pledged_total(item.id).await?;
  let within_cap = current.checked_add(amount_cents).is_some_and(|total| total <= item.cap_cents());
  if !within_cap {
    let remaining_cents = (item.cap_cents() - current).max(0);
    event!(Level::INFO, item_id = item.id, amount_cents, remaining_cents, "Pledge rejected: exceeds remaining.");
    return Err(AppError::ExceedsRemaining { remaining_cents });
  }
  Ok(Control::Continue)
}

#[instrument(name = "pledge_step::commit", skip_all, err(Display))]
async fn commit_pledge(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let (repo, base) = {
    let guard = ctx_data.read();
    let req = &guard.request;
    let base = NewPledge {
      reference: String::new(),
      item_id: req.item_id,
      full_name: req.full_name.clone(),
      email: req.email.clone(),
      cell_number: req.cell_number.clone(),
      amount_cents: filled(guard.amount_cents, "amount")?,
      is_full: req.is_full,
    };
    (guard.app_state.repo.clone(), base)
  };

  for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
    let candidate = NewPledge {
      reference: generate_reference(),
      ..base.clone()
    };
    match repo.commit_pledge(candidate).await {
      Ok(committed) => {
        info!(
          reference = %committed.pledge.reference,
          item_id = committed.item.id,
          total_pledged_cents = committed.item.total_pledged_cents,
          locked = committed.item.is_locked,
          "Pledge recorded."
        );
        ctx_data.write().committed = Some(committed);
        return Ok(Control::Continue);
      }
      Err(AppError::DuplicateReference(reference)) => {
        warn!(attempt, %reference, "Pledge reference collision; retrying.");
      }
      Err(e) => return Err(e),
    }
  }
  Err(AppError::Internal(format!(
    "Could not allocate a unique pledge reference after {} attempts.",
    MAX_REFERENCE_ATTEMPTS
  )))
}

async fn invalidate_catalog(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let catalog = ctx_data.read().app_state.catalog.clone();
  catalog.invalidate().await;
  Ok(Control::Continue)
}

async fn send_confirmation(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let (notifier, confirmation) = {
    let guard = ctx_data.read();
    let committed = filled(guard.committed.as_ref(), "committed pledge")?;
    let confirmation = PledgeConfirmation {
      reference: committed.pledge.reference.clone(),
      full_name: committed.pledge.full_name.clone(),
      email: committed.pledge.email.clone(),
      item_name: committed.item.name.clone(),
      item_total_cents: committed.item.cap_cents(),
      is_full: committed.pledge.is_full,
      amount_cents: committed.pledge.amount_cents,
    };
    (guard.app_state.notifier.clone(), confirmation)
  };

  let sent = notifier.confirm_pledge(&confirmation).await;
  ctx_data.write().email_sent = sent;
  Ok(Control::Continue)
}

async fn record_notification(ctx_data: ContextData<PledgeCtxData>) -> AppResult<Control> {
  let (repo, pledge_id, sent) = {
    let guard = ctx_data.read();
    let pledge_id = filled(guard.committed.as_ref(), "committed pledge")?.pledge.id;
    (guard.app_state.repo.clone(), pledge_id, guard.email_sent)
  };
  repo.record_notification(pledge_id, sent).await?;
  Ok(Control::Continue)
}
