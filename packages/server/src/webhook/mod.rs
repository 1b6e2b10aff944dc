//! Reconciling provider completion callbacks against stored generations.

pub mod payload;
pub mod service;

pub use payload::{WebhookData, WebhookPayload};
pub use service::{WebhookOutcome, handle_webhook};
