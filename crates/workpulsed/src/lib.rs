//! workpulsed service wiring
//!
//! One service task owns the work timer and drives the broadcaster. The HTTP
//! ingress and the push server reach it only through channels, so status
//! submissions, ticks and subscriber registration never overlap.

mod handle;
mod service;

pub use handle::*;
pub use service::*;
