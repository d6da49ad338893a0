//! Model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for writes
//! - A `#[serde(flatten)]` wrapper where an entity is returned with its
//!   children
//!
//! Stage/action write payloads (`StageInput`, `ActionInput`) live in
//! `flowdef-core` so the validator stays database-free.

pub mod action;
pub mod stage;
pub mod workflow;
