//! Caller authentication
//!
//! - **address**: exact / CIDR allow-list matching for IPv4 and IPv6
//! - **credential**: constant-time credential comparison and generation
//! - **gate**: the two-factor gate combining both

pub mod address;
pub mod credential;
pub mod gate;

pub use gate::{AllowListEntry, AuthGate, AuthenticatedCaller};
