// tests/pledge_flow_tests.rs

mod common;

use common::*;
use pledge_server::config::RemittanceDetails;
use pledge_server::db::{MemoryRepository, Repository};
use pledge_server::errors::AppError;
use pledge_server::money::AmountInput;
use pledge_server::services::notifier::NotificationDispatcher;
use pledge_server::state::AppState;
use pledge_server::web::handlers::pledge_handlers::submit_pledge;
use rust_decimal::Decimal;
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn assert_ledger_matches(repo: &dyn Repository, item_id: i32) {
  let item = repo.get_item(item_id).await.unwrap().unwrap();
  let ledger = repo.pledged_total(item_id).await.unwrap();
  assert_eq!(item.total_pledged_cents, ledger, "aggregate drifted from the ledger");
  assert!(item.total_pledged_cents <= item.cap_cents());
  assert_eq!(item.is_locked, item.total_pledged_cents >= item.cap_cents());
}

#[tokio::test]
async fn partial_pledges_fill_then_lock_an_item() {
  let app = build_app_without_mail().await;

  // A: 600.00 of 1000.00
  let receipt = submit_pledge(&app.state, pledge_request(app.item_id, "600.00")).await.unwrap();
  assert!(receipt.success);
  assert!(receipt.pledge_reference.starts_with("PLG-"));
  assert_eq!(receipt.amount, Decimal::new(60_000, 2));
  assert_eq!(receipt.item_name, "Stackable chairs");
  let item = app.memory.get_item(app.item_id).await.unwrap().unwrap();
  assert_eq!(item.total_pledged_cents, 60_000);
  assert!(!item.is_locked);

  // B: 500.00 overshoots
  let err = submit_pledge(&app.state, pledge_request(app.item_id, "500.00")).await.unwrap_err();
  assert!(matches!(err, AppError::ExceedsRemaining { remaining_cents: 40_000 }));
  assert_eq!(err.to_string(), "Amount exceeds remaining balance. Remaining: R400.00");
  assert_eq!(app.memory.list_pledges().await.unwrap().len(), 1);

  // C: exactly the remainder
  submit_pledge(&app.state, pledge_request(app.item_id, 400)).await.unwrap();
  let item = app.memory.get_item(app.item_id).await.unwrap().unwrap();
  assert_eq!(item.total_pledged_cents, 100_000);
  assert!(item.is_locked);

  // D: anything after the lock, even a nonsense amount
  let err = submit_pledge(&app.state, pledge_request(app.item_id, "-3")).await.unwrap_err();
  assert!(matches!(err, AppError::AlreadyFulfilled));

  assert_ledger_matches(app.memory.as_ref(), app.item_id).await;
}

#[tokio::test]
async fn missing_consent_is_rejected_before_anything_else() {
  let app = build_app_without_mail().await;
  let mut request = pledge_request(9_999, "abc");
  request.popi_consent = false;

  for _ in 0..2 {
    let err = submit_pledge(&app.state, request.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::ConsentRequired));
  }
  assert!(app.memory.list_pledges().await.unwrap().is_empty());
  assert_eq!(app.memory.get_item(app.item_id).await.unwrap().unwrap().total_pledged_cents, 0);
}

#[tokio::test]
async fn contact_details_are_trimmed_and_validated() {
  let app = build_app_without_mail().await;

  let mut request = pledge_request(app.item_id, "10");
  request.full_name = " J ".to_string();
  let err = submit_pledge(&app.state, request).await.unwrap_err();
  assert!(matches!(&err, AppError::Validation(m) if m == "Please enter your full name."));

  let mut request = pledge_request(app.item_id, "10");
  request.email = "not-an-email".to_string();
  let err = submit_pledge(&app.state, request).await.unwrap_err();
  assert!(matches!(&err, AppError::Validation(m) if m == "Please enter a valid email address."));

  let mut request = pledge_request(app.item_id, "10");
  request.cell_number = "082 123".to_string();
  let err = submit_pledge(&app.state, request).await.unwrap_err();
  assert!(matches!(&err, AppError::Validation(m) if m == "Please enter a valid cell number."));

  let mut request = pledge_request(app.item_id, "10");
  request.full_name = "  Thandi Mokoena  ".to_string();
  submit_pledge(&app.state, request).await.unwrap();
  let records = app.memory.list_pledges().await.unwrap();
  assert_eq!(records[0].pledge.full_name, "Thandi Mokoena");
}

#[tokio::test]
async fn unknown_items_and_bad_amounts_are_typed_failures() {
  let app = build_app_without_mail().await;

  let err = submit_pledge(&app.state, pledge_request(app.item_id + 100, "10")).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound));

  for amount in ["0", "-5", "ten", "", "0.004"] {
    let err = submit_pledge(&app.state, pledge_request(app.item_id, amount)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount), "amount {amount:?} should be invalid");
  }
  assert!(app.memory.list_pledges().await.unwrap().is_empty());
}

#[tokio::test]
async fn huge_amounts_are_rejected_as_over_the_remaining_balance() {
  let app = build_app_without_mail().await;
  let largest_cents = "92233720368547758.07";

  let err = submit_pledge(&app.state, pledge_request(app.item_id, largest_cents)).await.unwrap_err();
  assert!(matches!(err, AppError::ExceedsRemaining { remaining_cents: 100_000 }));

  submit_pledge(&app.state, pledge_request(app.item_id, "600.00")).await.unwrap();
  let err = submit_pledge(&app.state, pledge_request(app.item_id, largest_cents)).await.unwrap_err();
  assert!(matches!(err, AppError::ExceedsRemaining { remaining_cents: 40_000 }));

  let err = submit_pledge(&app.state, pledge_request(app.item_id, "79228162514264337593543950335")).await.unwrap_err();
  assert!(matches!(err, AppError::InvalidAmount));

  assert_eq!(app.memory.list_pledges().await.unwrap().len(), 1);
  assert_eq!(app.memory.pledged_total(app.item_id).await.unwrap(), 60_000);
  assert_ledger_matches(app.memory.as_ref(), app.item_id).await;
}

#[tokio::test]
async fn amounts_round_half_to_even_at_cents() {
  let app = build_app_without_mail().await;

  let receipt = submit_pledge(&app.state, pledge_request(app.item_id, "10.005")).await.unwrap();
  assert_eq!(receipt.amount, Decimal::new(1_000, 2));
  let receipt = submit_pledge(&app.state, pledge_request(app.item_id, "10.015")).await.unwrap();
  assert_eq!(receipt.amount, Decimal::new(1_002, 2));
  let number: AmountInput = serde_json::from_str("12.5").unwrap();
  let receipt = submit_pledge(&app.state, pledge_request(app.item_id, number)).await.unwrap();
  assert_eq!(receipt.amount, Decimal::new(1_250, 2));

  assert_eq!(app.memory.pledged_total(app.item_id).await.unwrap(), 1_000 + 1_002 + 1_250);
}

#[tokio::test]
async fn confirmation_email_is_sent_and_logged() {
  let mailer = Arc::new(RecordingMailer::default());
  let app = build_app(notifier_with(mailer.clone())).await;

  let receipt = submit_pledge(&app.state, pledge_request(app.item_id, "250")).await.unwrap();
  assert!(receipt.email_sent);

  let sent = mailer.sent.lock();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to_email, "thandi@example.org");
  assert!(sent[0].text_body.contains(&receipt.pledge_reference));
  assert!(sent[0].text_body.contains("Your Pledge Amount: R250.00"));
  assert!(sent[0].text_body.contains("Item Total Cost: R1,000.00"));
  drop(sent);

  let records = app.memory.list_pledges().await.unwrap();
  assert!(records[0].email_sent);
}

#[tokio::test]
#[serial]
async fn mail_failures_never_fail_the_pledge() {
  let failing = build_app(notifier_with(Arc::new(FailingMailer))).await;
  let receipt = submit_pledge(&failing.state, pledge_request(failing.item_id, "100")).await.unwrap();
  assert!(receipt.success);
  assert!(!receipt.email_sent);
  assert!(!failing.memory.list_pledges().await.unwrap()[0].email_sent);

  let slow = build_app(notifier_with(Arc::new(SlowMailer(Duration::from_secs(5))))).await;
  let started = std::time::Instant::now();
  let receipt = submit_pledge(&slow.state, pledge_request(slow.item_id, "100")).await.unwrap();
  assert!(!receipt.email_sent);
  assert!(started.elapsed() < Duration::from_secs(2), "relay timeout was not enforced");

  let disabled = build_app(NotificationDispatcher::disabled(RemittanceDetails::default())).await;
  let receipt = submit_pledge(&disabled.state, pledge_request(disabled.item_id, "100")).await.unwrap();
  assert!(receipt.success);
  assert!(!receipt.email_sent);
}

#[tokio::test]
async fn reference_collisions_are_retried_with_fresh_references() {
  setup_tracing();
  let memory = Arc::new(MemoryRepository::new());
  let item = seed_chairs(&memory).await;
  let flaky = Arc::new(FlakyRepository::new(memory.clone(), 2));
  let state = AppState::new(
    Arc::new(test_config()),
    flaky.clone(),
    NotificationDispatcher::disabled(RemittanceDetails::default()),
  );

  let receipt = submit_pledge(&state, pledge_request(item.id, "75")).await.unwrap();
  assert!(receipt.success);
  assert_eq!(flaky.commit_attempts.load(Ordering::SeqCst), 3);
  assert_eq!(memory.list_pledges().await.unwrap().len(), 1);
}

#[tokio::test]
async fn persistent_collisions_give_up_without_writing() {
  setup_tracing();
  let memory = Arc::new(MemoryRepository::new());
  let item = seed_chairs(&memory).await;
  let flaky = Arc::new(FlakyRepository::new(memory.clone(), usize::MAX));
  let state = AppState::new(
    Arc::new(test_config()),
    flaky.clone(),
    NotificationDispatcher::disabled(RemittanceDetails::default()),
  );

  let err = submit_pledge(&state, pledge_request(item.id, "75")).await.unwrap_err();
  assert!(matches!(err, AppError::Internal(_)));
  assert_eq!(
    flaky.commit_attempts.load(Ordering::SeqCst),
    pledge_server::pipelines::pledge_pipeline::MAX_REFERENCE_ATTEMPTS
  );
  assert!(memory.list_pledges().await.unwrap().is_empty());
}

#[tokio::test]
async fn catalog_listing_reflects_committed_pledges() {
  let app = build_app_without_mail().await;
  let before = app.state.catalog.list_items().await.unwrap();
  assert_eq!(before[0].total_pledged_cents, 0);

  submit_pledge(&app.state, pledge_request(app.item_id, "300")).await.unwrap();
  let after = app.state.catalog.list_items().await.unwrap();
  assert_eq!(after[0].total_pledged_cents, 30_000);
  assert_eq!(after[0].remaining_cents(), 70_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_pledges_never_exceed_the_cap() {
  let app = build_app_without_mail().await;
  submit_pledge(&app.state, pledge_request(app.item_id, "600")).await.unwrap();

  // 300 + 300 both fit the remaining 400 on their own, but not together.
  let tasks: Vec<_> = (0..2)
    .map(|_| {
      let state = app.state.clone();
      let item_id = app.item_id;
      tokio::spawn(async move { submit_pledge(&state, pledge_request(item_id, "300")).await })
    })
    .collect();

  let mut ok = 0;
  let mut exceeded = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => ok += 1,
      Err(AppError::ExceedsRemaining { .. }) => exceeded += 1,
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!((ok, exceeded), (1, 1));
  assert_eq!(app.memory.pledged_total(app.item_id).await.unwrap(), 90_000);
  assert_ledger_matches(app.memory.as_ref(), app.item_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn many_racing_pledges_lock_exactly_at_the_cap() {
  let app = build_app_without_mail().await;

  let tasks: Vec<_> = (0..25)
    .map(|_| {
      let state = app.state.clone();
      let item_id = app.item_id;
      tokio::spawn(async move { submit_pledge(&state, pledge_request(item_id, "70")).await })
    })
    .collect();

  let mut accepted = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => accepted += 1,
      Err(AppError::ExceedsRemaining { .. }) | Err(AppError::AlreadyFulfilled) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  // 14 x 70 = 980; the 20.00 left over can never be reached by a 70.00 pledge.
  assert_eq!(accepted, 14);
  let item = app.memory.get_item(app.item_id).await.unwrap().unwrap();
  assert_eq!(item.total_pledged_cents, 98_000);
  assert!(!item.is_locked);
  assert_ledger_matches(app.memory.as_ref(), app.item_id).await;
}
