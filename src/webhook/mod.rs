//! Inbound order webhooks that trigger document generation.

pub mod handlers;
pub mod model;
