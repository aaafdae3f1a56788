//! Core engine for workpulsed
//!
//! This crate contains:
//! - Status classification against the configured markers
//! - The Idle/Active work-timer state machine
//! - Session completion accounting into the ledger

mod classifier;
mod engine;
mod events;
mod session;

pub use classifier::*;
pub use engine::*;
pub use events::*;
pub use session::*;
