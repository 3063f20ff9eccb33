// src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod auth_handlers;
pub mod item_handlers;
pub mod pledge_handlers;
