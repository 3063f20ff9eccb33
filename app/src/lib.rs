// src/lib.rs

//! Pledge tracking server: an item catalogue with per-item funding caps,
//! pledge intake with confirmation email, and a session-protected admin
//! review surface.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod money;
pub mod pipelines;
pub mod seed;
pub mod services;
pub mod state;
pub mod web;
