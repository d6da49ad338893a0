//! Repository for the `workflow_stages` and `stage_actions` tables.
//!
//! Stage writes are whole-unit: the payload carries the stage's complete
//! action list, validation runs before any row is touched, and the stage
//! row plus its action set change together inside one transaction.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};

use flowdef_core::error::CoreError;
use flowdef_core::stage::{validate_stage, ActionInput, StageInput, TRANSITION_SPECIFIC};
use flowdef_core::types::DbId;

use crate::error::DbResult;
use crate::models::action::StageAction;
use crate::models::stage::{Stage, StageWithActions};

/// Column list for workflow_stages queries.
pub(crate) const STAGE_COLUMNS: &str = "id, workflow_id, seq_no, name, description, \
    upload_count, actor_type, role_id, user_id, actor_count, decision_mode, \
    conflict_check, document_required, created_at, updated_at";

/// Column list for stage_actions queries.
pub(crate) const ACTION_COLUMNS: &str = "id, stage_id, name, description, transition_type, \
    target_stage_id, required_count, role_id, user_id, created_at, updated_at";

/// Provides stage and action operations within a workflow.
pub struct StageRepo;

impl StageRepo {
    /// Add a stage (with its actions) to a workflow.
    ///
    /// One transaction: verify the workflow exists, validate the payload
    /// against the workflow's committed stage ids, insert the stage, then
    /// insert every action under the new stage id. A failure on any action
    /// insert rolls back the stage insert too.
    pub async fn add(
        pool: &PgPool,
        workflow_id: DbId,
        input: &StageInput,
    ) -> DbResult<StageWithActions> {
        let mut tx = pool.begin().await?;

        let workflow: Option<(DbId,)> = sqlx::query_as("SELECT id FROM workflows WHERE id = $1")
            .bind(workflow_id)
            .fetch_optional(&mut *tx)
            .await?;
        if workflow.is_none() {
            tx.rollback().await?;
            return Err(CoreError::NotFound {
                entity: "Workflow",
                id: workflow_id,
            }
            .into());
        }

        let allowed = Self::committed_stage_ids(&mut tx, workflow_id, None).await?;
        if let Err(err) = validate_stage(input, &allowed) {
            tx.rollback().await?;
            return Err(err.into());
        }

        let stage = Self::insert_stage(&mut tx, workflow_id, input).await?;
        let actions = Self::insert_actions(&mut tx, stage.id, &input.actions).await?;

        tx.commit().await?;
        tracing::info!(
            workflow_id,
            stage_id = stage.id,
            actions = actions.len(),
            "Stage added"
        );
        Ok(StageWithActions { stage, actions })
    }

    /// Replace a stage and its whole action set.
    ///
    /// The allowed `specific` targets are the workflow's committed stage
    /// ids without the stage under edit, plus that stage's own id: a stage
    /// may loop to itself. The old action set is deleted and the new set
    /// inserted in the same transaction, so no partial set can persist.
    pub async fn update(
        pool: &PgPool,
        workflow_id: DbId,
        stage_id: DbId,
        input: &StageInput,
    ) -> DbResult<StageWithActions> {
        let mut tx = pool.begin().await?;

        let mut allowed = Self::committed_stage_ids(&mut tx, workflow_id, Some(stage_id)).await?;
        allowed.insert(stage_id);
        if let Err(err) = validate_stage(input, &allowed) {
            tx.rollback().await?;
            return Err(err.into());
        }

        let query = format!(
            "UPDATE workflow_stages
             SET seq_no = $1, name = $2, description = $3, upload_count = $4,
                 actor_type = $5, role_id = $6, user_id = $7, actor_count = $8,
                 decision_mode = $9, conflict_check = $10, document_required = $11,
                 updated_at = NOW()
             WHERE id = $12 AND workflow_id = $13
             RETURNING {STAGE_COLUMNS}"
        );
        let stage = sqlx::query_as::<_, Stage>(&query)
            .bind(input.seq_no)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.upload_count)
            .bind(&input.actor_type)
            .bind(input.role_id)
            .bind(input.user_id)
            .bind(input.actor_count)
            .bind(&input.decision_mode)
            .bind(input.conflict_check)
            .bind(input.document_required)
            .bind(stage_id)
            .bind(workflow_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(stage) = stage else {
            tx.rollback().await?;
            return Err(CoreError::NotFound {
                entity: "Stage",
                id: stage_id,
            }
            .into());
        };

        sqlx::query("DELETE FROM stage_actions WHERE stage_id = $1")
            .bind(stage_id)
            .execute(&mut *tx)
            .await?;
        let actions = Self::insert_actions(&mut tx, stage_id, &input.actions).await?;

        tx.commit().await?;
        tracing::info!(
            workflow_id,
            stage_id,
            actions = actions.len(),
            "Stage updated"
        );
        Ok(StageWithActions { stage, actions })
    }

    /// Delete a stage and its actions.
    ///
    /// One transaction: actions first, then the stage row filtered by both
    /// ids. A zero-row match rolls back and reports not-found.
    pub async fn delete(pool: &PgPool, workflow_id: DbId, stage_id: DbId) -> DbResult<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM stage_actions WHERE stage_id = $1")
            .bind(stage_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM workflow_stages WHERE id = $1 AND workflow_id = $2")
            .bind(stage_id)
            .bind(workflow_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::NotFound {
                entity: "Stage",
                id: stage_id,
            }
            .into());
        }

        tx.commit().await?;
        tracing::info!(workflow_id, stage_id, "Stage deleted");
        Ok(())
    }

    /// Get a stage with its actions, filtered by both ids.
    pub async fn get(pool: &PgPool, workflow_id: DbId, stage_id: DbId) -> DbResult<StageWithActions> {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM workflow_stages WHERE id = $1 AND workflow_id = $2"
        );
        let stage = sqlx::query_as::<_, Stage>(&query)
            .bind(stage_id)
            .bind(workflow_id)
            .fetch_optional(pool)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Stage",
                id: stage_id,
            })?;

        let actions = Self::list_actions(pool, stage_id).await?;
        Ok(StageWithActions { stage, actions })
    }

    /// List a stage's actions, ordered by id.
    pub async fn list_actions(pool: &PgPool, stage_id: DbId) -> DbResult<Vec<StageAction>> {
        let query =
            format!("SELECT {ACTION_COLUMNS} FROM stage_actions WHERE stage_id = $1 ORDER BY id");
        let actions = sqlx::query_as::<_, StageAction>(&query)
            .bind(stage_id)
            .fetch_all(pool)
            .await?;
        Ok(actions)
    }

    /// Committed stage ids of a workflow, optionally excluding one stage.
    async fn committed_stage_ids(
        tx: &mut Transaction<'_, Postgres>,
        workflow_id: DbId,
        exclude: Option<DbId>,
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = match exclude {
            Some(stage_id) => {
                sqlx::query_as(
                    "SELECT id FROM workflow_stages WHERE workflow_id = $1 AND id <> $2",
                )
                .bind(workflow_id)
                .bind(stage_id)
                .fetch_all(&mut **tx)
                .await?
            }
            None => sqlx::query_as("SELECT id FROM workflow_stages WHERE workflow_id = $1")
                .bind(workflow_id)
                .fetch_all(&mut **tx)
                .await?,
        };
        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    /// Insert a stage row from a validated payload.
    async fn insert_stage(
        tx: &mut Transaction<'_, Postgres>,
        workflow_id: DbId,
        input: &StageInput,
    ) -> Result<Stage, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflow_stages
                (workflow_id, seq_no, name, description, upload_count, actor_type,
                 role_id, user_id, actor_count, decision_mode, conflict_check,
                 document_required)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {STAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Stage>(&query)
            .bind(workflow_id)
            .bind(input.seq_no)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.upload_count)
            .bind(&input.actor_type)
            .bind(input.role_id)
            .bind(input.user_id)
            .bind(input.actor_count)
            .bind(&input.decision_mode)
            .bind(input.conflict_check)
            .bind(input.document_required)
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert a stage's action set from validated payloads.
    ///
    /// Non-`specific` actions store a NULL target regardless of payload.
    /// The per-action actor override columns stay NULL on this path.
    async fn insert_actions(
        tx: &mut Transaction<'_, Postgres>,
        stage_id: DbId,
        inputs: &[ActionInput],
    ) -> Result<Vec<StageAction>, sqlx::Error> {
        let query = format!(
            "INSERT INTO stage_actions
                (stage_id, name, description, transition_type, target_stage_id,
                 required_count)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ACTION_COLUMNS}"
        );

        let mut actions = Vec::with_capacity(inputs.len());
        for input in inputs {
            let target = if input.transition_type == TRANSITION_SPECIFIC {
                input.target_stage_id
            } else {
                None
            };
            let action = sqlx::query_as::<_, StageAction>(&query)
                .bind(stage_id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(&input.transition_type)
                .bind(target)
                .bind(input.required_count)
                .fetch_one(&mut **tx)
                .await?;
            actions.push(action);
        }
        Ok(actions)
    }
}
