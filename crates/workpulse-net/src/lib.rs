//! Local network adapter selection
//!
//! Picks the adapter a display client should report as "this machine":
//! wired adapters first, with virtual, VPN, and wireless adapters excluded.

mod adapters;
mod select;

pub use adapters::*;
pub use select::*;
