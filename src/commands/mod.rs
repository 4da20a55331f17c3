//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `hook.rs` — the pre-receive run.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate verification logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod hook;

pub use hook::handle_hook;
