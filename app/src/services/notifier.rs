// src/services/notifier.rs

use crate::config::RemittanceDetails;
use crate::services::confirmation::PledgeConfirmation;
use crate::services::mailer::Mailer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Best-effort confirmation dispatch. Every outcome is a `bool`; nothing
/// here returns an error to the caller.
pub struct NotificationDispatcher {
  mailer: Option<Arc<dyn Mailer>>,
  timeout: Duration,
  remittance: RemittanceDetails,
}

impl NotificationDispatcher {
  pub fn new(mailer: Option<Arc<dyn Mailer>>, timeout: Duration, remittance: RemittanceDetails) -> Self {
    Self {
      mailer,
      timeout,
      remittance,
    }
  }

  pub fn disabled(remittance: RemittanceDetails) -> Self {
    Self::new(None, Duration::from_secs(0), remittance)
  }

  pub fn is_enabled(&self) -> bool {
    self.mailer.is_some()
  }

  #[instrument(name = "notifier::confirm_pledge", skip_all, fields(reference = %confirmation.reference))]
  pub async fn confirm_pledge(&self, confirmation: &PledgeConfirmation) -> bool {
    let Some(mailer) = &self.mailer else {
      warn!("SMTP not configured. Skipping confirmation email.");
      return false;
    };

    let email = confirmation.to_email(&self.remittance);
    match tokio::time::timeout(self.timeout, mailer.send(&email)).await {
      Ok(Ok(())) => {
        info!(to = %email.to_email, "Confirmation sent.");
        true
      }
      Ok(Err(e)) => {
        warn!(error = %e, "Failed to send confirmation.");
        false
      }
      Err(_) => {
        warn!(timeout_ms = self.timeout.as_millis() as u64, "Confirmation send timed out.");
        false
      }
    }
  }
}
