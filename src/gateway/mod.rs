//! Usage: Gateway-facing event contracts consumed by the console engine.

pub mod events;
