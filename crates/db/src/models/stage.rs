//! Workflow stage models.

use flowdef_core::presentation;
use flowdef_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::action::StageAction;

/// A row from the `workflow_stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stage {
    pub id: DbId,
    pub workflow_id: DbId,
    pub seq_no: i32,
    pub name: String,
    pub description: String,
    pub upload_count: i32,
    pub actor_type: String,
    pub role_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub actor_count: i32,
    pub decision_mode: String,
    pub conflict_check: i16,
    pub document_required: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A stage enriched with its actions.
#[derive(Debug, Clone, Serialize)]
pub struct StageWithActions {
    #[serde(flatten)]
    pub stage: Stage,
    pub actions: Vec<StageAction>,
}

impl StageWithActions {
    /// The camelCase shape handed to API clients.
    pub fn to_api(&self) -> Result<serde_json::Value, serde_json::Error> {
        presentation::to_api(self)
    }
}
