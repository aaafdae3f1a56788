//! Protocol types for workpulse
//!
//! This crate defines the stable surface between workpulsed and its display clients:
//! - Push-channel envelopes (service -> subscribers)
//! - Inbound push-channel messages (subscribers -> service)
//! - HTTP response bodies
//! - Stats and timer snapshots

mod envelope;
mod http;
mod messages;
mod types;

pub use envelope::*;
pub use http::*;
pub use messages::*;
pub use types::*;
