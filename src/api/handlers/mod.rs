//! HTTP handlers.

pub mod alerts;
pub mod events;
pub mod health;
pub mod records;
pub mod resolve;
