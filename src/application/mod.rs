//! Application layer orchestrating the PIX payment lifecycle.
//!
//! `PaymentTracker` is the entry point used by a checkout: it creates intents
//! through a `PaymentBackend` port and drives one `PollHandle` per intent, a
//! spawned `tokio` task that polls for approval until it is reported or cancelled.

pub mod poller;
pub mod tracker;
