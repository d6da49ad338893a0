//! Stage action models.

use flowdef_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `stage_actions` table.
///
/// `role_id`/`user_id` are per-action actor overrides. The validated write
/// paths always leave them NULL; workflow duplication copies them verbatim.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StageAction {
    pub id: DbId,
    pub stage_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub transition_type: String,
    pub target_stage_id: Option<DbId>,
    pub required_count: i32,
    pub role_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
