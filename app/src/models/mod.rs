// src/models/mod.rs

//! Data structures representing database entities.

pub mod item;
pub mod pledge;
pub mod user;

pub use item::{Item, NewItem};
pub use pledge::{CommittedPledge, NewPledge, Pledge, PledgeReceipt, PledgeRecord, PledgeRequest};
pub use user::{NewIdentity, Role, User};
