//! API endpoint handlers.
//!
//! Each module maps to one UI view or concern. Handlers only translate
//! HTTP to `CoreState` calls.

pub mod chat;
pub mod health;
pub mod intake;
pub mod session;
