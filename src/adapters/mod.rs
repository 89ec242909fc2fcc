// Adapters layer: concrete implementations of the domain ports (storage,
// identity, clock) and the HTTP surface.

pub mod auth;
pub mod clock;
pub mod http;
pub mod memory;
