//! Workflow definition models.

use flowdef_core::presentation;
use flowdef_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::stage::StageWithActions;

/// A row from the `workflows` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflow {
    pub name: String,
    pub description: String,
    pub status: String,
}

/// DTO for replacing a workflow's scalar fields. Stages are untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkflow {
    pub name: String,
    pub description: String,
    pub status: String,
}

/// A workflow enriched with its full stage/action graph.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowWithStages {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub stages: Vec<StageWithActions>,
}

impl WorkflowWithStages {
    /// The camelCase shape handed to API clients.
    pub fn to_api(&self) -> Result<serde_json::Value, serde_json::Error> {
        presentation::to_api(self)
    }
}
