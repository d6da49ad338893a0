//! Repository for the `workflows` table and full-graph reads.

use sqlx::PgPool;

use flowdef_core::error::CoreError;
use flowdef_core::types::DbId;
use flowdef_core::workflow::validate_workflow_fields;

use crate::error::DbResult;
use crate::models::action::StageAction;
use crate::models::stage::{Stage, StageWithActions};
use crate::models::workflow::{CreateWorkflow, UpdateWorkflow, Workflow, WorkflowWithStages};
use crate::repositories::stage_repo::{ACTION_COLUMNS, STAGE_COLUMNS};

/// Column list for workflows queries.
pub(crate) const WORKFLOW_COLUMNS: &str = "id, name, description, status, created_at, updated_at";

/// Provides CRUD operations for workflow definitions.
pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Insert a new workflow. The stage list starts empty.
    pub async fn create(pool: &PgPool, input: &CreateWorkflow) -> DbResult<WorkflowWithStages> {
        validate_workflow_fields(&input.name, &input.description, &input.status)
            .map_err(CoreError::Validation)?;

        let query = format!(
            "INSERT INTO workflows (name, description, status)
             VALUES ($1, $2, $3)
             RETURNING {WORKFLOW_COLUMNS}"
        );
        let workflow = sqlx::query_as::<_, Workflow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(pool)
            .await?;

        tracing::info!(workflow_id = workflow.id, name = %workflow.name, "Workflow created");

        Ok(WorkflowWithStages {
            workflow,
            stages: Vec::new(),
        })
    }

    /// Find a workflow row by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> DbResult<Option<Workflow>> {
        let query = format!("SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE id = $1");
        let workflow = sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(workflow)
    }

    /// Get a workflow with its full stage/action graph.
    ///
    /// Stages are ordered by `seq_no`, ties broken by `id`; actions by `id`.
    pub async fn get(pool: &PgPool, id: DbId) -> DbResult<WorkflowWithStages> {
        let workflow = Self::find_by_id(pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Workflow",
                id,
            })?;
        let stages = Self::stages_with_actions(pool, id).await?;
        Ok(WorkflowWithStages { workflow, stages })
    }

    /// List all workflows with their full graphs, ordered by workflow id.
    pub async fn list(pool: &PgPool) -> DbResult<Vec<WorkflowWithStages>> {
        let query = format!("SELECT {WORKFLOW_COLUMNS} FROM workflows ORDER BY id");
        let workflows = sqlx::query_as::<_, Workflow>(&query).fetch_all(pool).await?;

        let mut result = Vec::with_capacity(workflows.len());
        for workflow in workflows {
            let stages = Self::stages_with_actions(pool, workflow.id).await?;
            result.push(WorkflowWithStages { workflow, stages });
        }
        Ok(result)
    }

    /// Replace a workflow's scalar fields. Stages are untouched.
    pub async fn update(pool: &PgPool, id: DbId, input: &UpdateWorkflow) -> DbResult<Workflow> {
        validate_workflow_fields(&input.name, &input.description, &input.status)
            .map_err(CoreError::Validation)?;

        let query = format!(
            "UPDATE workflows
             SET name = $1, description = $2, status = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {WORKFLOW_COLUMNS}"
        );
        let workflow = sqlx::query_as::<_, Workflow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Workflow",
                id,
            })?;

        tracing::info!(workflow_id = id, "Workflow updated");
        Ok(workflow)
    }

    /// Delete a workflow and everything it owns.
    ///
    /// One transaction, fixed order: the stages' actions, then the stages,
    /// then the workflow row. A zero-row match on the workflow row rolls
    /// everything back and reports not-found.
    pub async fn delete(pool: &PgPool, id: DbId) -> DbResult<()> {
        let mut tx = pool.begin().await?;

        let stage_rows: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM workflow_stages WHERE workflow_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let stage_ids: Vec<DbId> = stage_rows.into_iter().map(|row| row.0).collect();

        if !stage_ids.is_empty() {
            sqlx::query("DELETE FROM stage_actions WHERE stage_id = ANY($1)")
                .bind(&stage_ids)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM workflow_stages WHERE workflow_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::NotFound {
                entity: "Workflow",
                id,
            }
            .into());
        }

        tx.commit().await?;
        tracing::info!(workflow_id = id, stages = stage_ids.len(), "Workflow deleted");
        Ok(())
    }

    /// Load a workflow's stages with their actions, in stage order.
    async fn stages_with_actions(
        pool: &PgPool,
        workflow_id: DbId,
    ) -> Result<Vec<StageWithActions>, sqlx::Error> {
        let stage_query = format!(
            "SELECT {STAGE_COLUMNS} FROM workflow_stages
             WHERE workflow_id = $1
             ORDER BY seq_no, id"
        );
        let stages = sqlx::query_as::<_, Stage>(&stage_query)
            .bind(workflow_id)
            .fetch_all(pool)
            .await?;

        let action_query =
            format!("SELECT {ACTION_COLUMNS} FROM stage_actions WHERE stage_id = $1 ORDER BY id");
        let mut result = Vec::with_capacity(stages.len());
        for stage in stages {
            let actions = sqlx::query_as::<_, StageAction>(&action_query)
                .bind(stage.id)
                .fetch_all(pool)
                .await?;
            result.push(StageWithActions { stage, actions });
        }
        Ok(result)
    }
}
