// src/services/mod.rs

pub mod admin_review;
pub mod auth_service;
pub mod catalog;
pub mod confirmation;
pub mod mailer;
pub mod notifier;
pub mod reference;
