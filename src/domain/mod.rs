//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep hook input, commit and report structs in one place.
//! - Avoid cyclic imports between `git.rs` and `services/*`.
//! - Make JSON report schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs` — ref updates, commits, tree entries, report structs.
//! - `constants.rs` — protected ref, environment names, archive limits.
//! - `errors.rs` — policy-violation vs internal-error taxonomy.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/process side effects.
//!
//! ## Compatibility note
//! `VerifiedCommit` and `RunResult` back the `--json` report.

pub mod constants;
pub mod errors;
pub mod models;
