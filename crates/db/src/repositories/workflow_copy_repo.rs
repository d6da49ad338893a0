//! Workflow duplication.
//!
//! Copies a workflow's stage/action graph under fresh identifiers inside
//! one transaction. Stages are copied in sequence order while a map from
//! source to new stage ids is built up; `specific` transition targets are
//! rewritten through that map as it stands when each action is copied.
//! A target not yet in the map (a forward reference to a later stage)
//! becomes NULL; an old identifier must never leak into the new graph.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};

use flowdef_core::error::CoreError;
use flowdef_core::stage::TRANSITION_SPECIFIC;
use flowdef_core::types::DbId;
use flowdef_core::workflow::copy_name;

use crate::error::DbResult;
use crate::models::action::StageAction;
use crate::models::stage::{Stage, StageWithActions};
use crate::models::workflow::{Workflow, WorkflowWithStages};
use crate::repositories::stage_repo::{ACTION_COLUMNS, STAGE_COLUMNS};
use crate::repositories::workflow_repo::WORKFLOW_COLUMNS;

/// Duplicates a workflow definition with its full graph.
pub struct WorkflowCopyRepo;

impl WorkflowCopyRepo {
    /// Copy a workflow, returning the new graph with new ids throughout.
    ///
    /// The new workflow's name is the source name with a copy suffix;
    /// description and status are copied verbatim. Stage scalars (seq_no
    /// included) and action scalars (actor overrides included) are copied
    /// verbatim. Any failure rolls back the entire copy.
    pub async fn copy(pool: &PgPool, source_workflow_id: DbId) -> DbResult<WorkflowWithStages> {
        let mut tx = pool.begin().await?;

        let source_query = format!("SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE id = $1");
        let source = sqlx::query_as::<_, Workflow>(&source_query)
            .bind(source_workflow_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(source) = source else {
            tx.rollback().await?;
            return Err(CoreError::NotFound {
                entity: "Workflow",
                id: source_workflow_id,
            }
            .into());
        };

        let insert_workflow = format!(
            "INSERT INTO workflows (name, description, status)
             VALUES ($1, $2, $3)
             RETURNING {WORKFLOW_COLUMNS}"
        );
        let workflow = sqlx::query_as::<_, Workflow>(&insert_workflow)
            .bind(copy_name(&source.name))
            .bind(&source.description)
            .bind(&source.status)
            .fetch_one(&mut *tx)
            .await?;

        let stages_query = format!(
            "SELECT {STAGE_COLUMNS} FROM workflow_stages
             WHERE workflow_id = $1
             ORDER BY seq_no, id"
        );
        let source_stages = sqlx::query_as::<_, Stage>(&stages_query)
            .bind(source_workflow_id)
            .fetch_all(&mut *tx)
            .await?;

        // Source stage id -> new stage id, grown as stages are copied.
        let mut stage_map: HashMap<DbId, DbId> = HashMap::new();
        let mut stages = Vec::with_capacity(source_stages.len());

        for source_stage in &source_stages {
            let stage = Self::copy_stage(&mut tx, workflow.id, source_stage).await?;
            stage_map.insert(source_stage.id, stage.id);

            let actions =
                Self::copy_actions(&mut tx, stage.id, source_stage.id, &stage_map).await?;
            stages.push(StageWithActions { stage, actions });
        }

        tx.commit().await?;
        tracing::info!(
            source_workflow_id,
            new_workflow_id = workflow.id,
            stages = stages.len(),
            "Workflow copied"
        );
        Ok(WorkflowWithStages { workflow, stages })
    }

    /// Insert a copy of one stage under the new workflow.
    async fn copy_stage(
        tx: &mut Transaction<'_, Postgres>,
        new_workflow_id: DbId,
        source: &Stage,
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
            .bind(new_workflow_id)
            .bind(source.seq_no)
            .bind(&source.name)
            .bind(&source.description)
            .bind(source.upload_count)
            .bind(&source.actor_type)
            .bind(source.role_id)
            .bind(source.user_id)
            .bind(source.actor_count)
            .bind(&source.decision_mode)
            .bind(source.conflict_check)
            .bind(source.document_required)
            .fetch_one(&mut **tx)
            .await
    }

    /// Copy one source stage's actions under its new stage id.
    ///
    /// `stage_map` holds the ids of stages copied so far; a `specific`
    /// target is rewritten through it, and a missing entry (forward
    /// reference) degrades to NULL. Non-`specific` actions always store
    /// NULL.
    async fn copy_actions(
        tx: &mut Transaction<'_, Postgres>,
        new_stage_id: DbId,
        source_stage_id: DbId,
        stage_map: &HashMap<DbId, DbId>,
    ) -> Result<Vec<StageAction>, sqlx::Error> {
        let select = format!(
            "SELECT {ACTION_COLUMNS} FROM stage_actions WHERE stage_id = $1 ORDER BY id"
        );
        let source_actions = sqlx::query_as::<_, StageAction>(&select)
            .bind(source_stage_id)
            .fetch_all(&mut **tx)
            .await?;

        let insert = format!(
            "INSERT INTO stage_actions
                (stage_id, name, description, transition_type, target_stage_id,
                 required_count, role_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ACTION_COLUMNS}"
        );

        let mut actions = Vec::with_capacity(source_actions.len());
        for source_action in &source_actions {
            let target = if source_action.transition_type == TRANSITION_SPECIFIC {
                source_action
                    .target_stage_id
                    .and_then(|old| stage_map.get(&old).copied())
            } else {
                None
            };
            let action = sqlx::query_as::<_, StageAction>(&insert)
                .bind(new_stage_id)
                .bind(&source_action.name)
                .bind(&source_action.description)
                .bind(&source_action.transition_type)
                .bind(target)
                .bind(source_action.required_count)
                .bind(source_action.role_id)
                .bind(source_action.user_id)
                .fetch_one(&mut **tx)
                .await?;
            actions.push(action);
        }
        Ok(actions)
    }
}
