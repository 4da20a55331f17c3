//! Service layer containing verification logic and side-effect helpers.
//!
//! ## Service map
//! - `walker.rs` — pre-receive input parsing and commit walking.
//! - `checks.rs` — per-commit checks (time ordering, archive, LICENSE).
//! - `archive.rs` — reference and direct module archive builders.
//! - `modzip.rs` — module archive rules and the reference zip writer.
//! - `compare.rs` — archive equivalence check and name diff.
//! - `dirhash.rs` — h1 directory hash over zip contents.
//! - `pseudo.rs` — pseudo-version construction and parsing.
//! - `report.rs` — run aggregation and report rendering.
//! - `output.rs` — JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Repository access goes through `git::Repository`.
//! - Keep command handlers thin; delegate to services.

pub mod archive;
pub mod checks;
pub mod compare;
pub mod dirhash;
pub mod modzip;
pub mod output;
pub mod pseudo;
pub mod report;
pub mod walker;
