//! Integration tests for workflow duplication.
//!
//! The copy must preserve graph topology under fresh identifiers: equal
//! stage counts and scalars, `specific` targets remapped to the copied
//! stages, forward references degraded to NULL, and no identifier from the
//! source graph leaking into the copy.

use sqlx::PgPool;

use flowdef_core::stage::{ActionInput, StageInput};
use flowdef_core::types::DbId;
use flowdef_db::models::workflow::CreateWorkflow;
use flowdef_db::repositories::{StageRepo, WorkflowCopyRepo, WorkflowRepo};
use flowdef_db::ErrorKind;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn workflow(pool: &PgPool, name: &str, description: &str) -> DbId {
    WorkflowRepo::create(
        pool,
        &CreateWorkflow {
            name: name.to_string(),
            description: description.to_string(),
            status: "active".to_string(),
        },
    )
    .await
    .unwrap()
    .workflow
    .id
}

fn action(name: &str, transition_type: &str) -> ActionInput {
    ActionInput {
        name: name.to_string(),
        description: None,
        transition_type: transition_type.to_string(),
        target_stage_id: None,
        required_count: 1,
    }
}

fn specific_action(name: &str, target: DbId) -> ActionInput {
    ActionInput {
        name: name.to_string(),
        description: Some("jump".to_string()),
        transition_type: "specific".to_string(),
        target_stage_id: Some(target),
        required_count: 1,
    }
}

fn role_stage(seq_no: i32, name: &str, actions: Vec<ActionInput>) -> StageInput {
    StageInput {
        seq_no,
        name: name.to_string(),
        description: "review step".to_string(),
        upload_count: 1,
        actor_type: "role".to_string(),
        role_id: Some(7),
        user_id: None,
        actor_count: 2,
        decision_mode: "any".to_string(),
        conflict_check: 1,
        document_required: 0,
        actions,
    }
}

fn user_stage(seq_no: i32, name: &str, actions: Vec<ActionInput>) -> StageInput {
    StageInput {
        seq_no,
        name: name.to_string(),
        description: "final step".to_string(),
        upload_count: 0,
        actor_type: "user".to_string(),
        role_id: None,
        user_id: Some(3),
        actor_count: 1,
        decision_mode: "all".to_string(),
        conflict_check: 0,
        document_required: 1,
        actions,
    }
}

// ---------------------------------------------------------------------------
// Test: Basic copy semantics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_missing_workflow_not_found(pool: PgPool) {
    let err = WorkflowCopyRepo::copy(&pool, 4242).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_empty_workflow(pool: PgPool) {
    let wf = workflow(&pool, "Empty", "no stages yet").await;
    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    assert_eq!(copy.workflow.name, "Empty (Copy)");
    assert_eq!(copy.workflow.description, "no stages yet");
    assert_ne!(copy.workflow.id, wf);
    assert!(copy.stages.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_leave_approval_scenario(pool: PgPool) {
    let wf = workflow(&pool, "Leave Approval", "HR leave").await;
    StageRepo::add(&pool, wf, &role_stage(1, "Manager review", vec![action("Approve", "next")]))
        .await
        .unwrap();
    StageRepo::add(&pool, wf, &user_stage(2, "HR sign-off", vec![action("Finish", "complete")]))
        .await
        .unwrap();

    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    assert_eq!(copy.workflow.name, "Leave Approval (Copy)");
    assert_eq!(copy.workflow.description, "HR leave");
    assert_eq!(copy.workflow.status, "active");
    assert_eq!(copy.stages.len(), 2);
    assert_eq!(copy.stages[0].stage.seq_no, 1);
    assert_eq!(copy.stages[1].stage.seq_no, 2);
    assert_eq!(copy.stages[0].actions[0].transition_type, "next");
    assert_eq!(copy.stages[1].actions[0].transition_type, "complete");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_preserves_scalars_under_new_ids(pool: PgPool) {
    let wf = workflow(&pool, "Source", "original").await;
    let source = StageRepo::add(&pool, wf, &role_stage(3, "Checks", vec![action("Approve", "next")]))
        .await
        .unwrap();

    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();
    let copied = &copy.stages[0];

    // Fresh identifiers throughout.
    assert_ne!(copied.stage.id, source.stage.id);
    assert_eq!(copied.stage.workflow_id, copy.workflow.id);
    assert_ne!(copied.actions[0].id, source.actions[0].id);
    assert_eq!(copied.actions[0].stage_id, copied.stage.id);

    // Scalars copied verbatim, seq_no not renumbered.
    assert_eq!(copied.stage.seq_no, 3);
    assert_eq!(copied.stage.name, "Checks");
    assert_eq!(copied.stage.upload_count, 1);
    assert_eq!(copied.stage.actor_type, "role");
    assert_eq!(copied.stage.role_id, Some(7));
    assert_eq!(copied.stage.actor_count, 2);
    assert_eq!(copied.stage.decision_mode, "any");
    assert_eq!(copied.stage.conflict_check, 1);
    assert_eq!(copied.actions[0].name, "Approve");
    assert_eq!(copied.actions[0].required_count, 1);
}

// ---------------------------------------------------------------------------
// Test: Reference remapping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_remaps_backward_reference(pool: PgPool) {
    let wf = workflow(&pool, "Loop", "regression path").await;
    let first = StageRepo::add(&pool, wf, &role_stage(1, "First", vec![action("Approve", "next")]))
        .await
        .unwrap();
    StageRepo::add(
        &pool,
        wf,
        &role_stage(2, "Second", vec![specific_action("Back", first.stage.id)]),
    )
    .await
    .unwrap();

    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    let new_first = &copy.stages[0];
    let new_second = &copy.stages[1];
    // The backward reference points at the copied first stage, not the old id.
    assert_eq!(new_second.actions[0].target_stage_id, Some(new_first.stage.id));
    assert_ne!(new_second.actions[0].target_stage_id, Some(first.stage.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_nulls_forward_reference(pool: PgPool) {
    let wf = workflow(&pool, "Forward", "skip ahead").await;
    let first = StageRepo::add(&pool, wf, &role_stage(1, "First", vec![action("Approve", "next")]))
        .await
        .unwrap();
    let second = StageRepo::add(&pool, wf, &role_stage(2, "Second", vec![action("Finish", "complete")]))
        .await
        .unwrap();
    // Point the first stage at the second: a forward reference in sequence order.
    StageRepo::update(
        &pool,
        wf,
        first.stage.id,
        &role_stage(1, "First", vec![specific_action("Skip", second.stage.id)]),
    )
    .await
    .unwrap();

    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    // The second stage was not yet copied when the first stage's actions
    // were written, so the forward target degrades to NULL.
    assert_eq!(copy.stages[0].actions[0].transition_type, "specific");
    assert_eq!(copy.stages[0].actions[0].target_stage_id, None);
    // The old identifier must not leak into the copy.
    for stage in &copy.stages {
        for act in &stage.actions {
            assert_ne!(act.target_stage_id, Some(second.stage.id));
        }
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_remaps_self_reference(pool: PgPool) {
    let wf = workflow(&pool, "Self", "retry loop").await;
    let only = StageRepo::add(&pool, wf, &role_stage(1, "Only", vec![action("Approve", "next")]))
        .await
        .unwrap();
    StageRepo::update(
        &pool,
        wf,
        only.stage.id,
        &role_stage(1, "Only", vec![specific_action("Retry", only.stage.id)]),
    )
    .await
    .unwrap();

    let copy = WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    // A self-loop stays a self-loop under the new identifier.
    let copied = &copy.stages[0];
    assert_eq!(copied.actions[0].target_stage_id, Some(copied.stage.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_leaves_source_untouched(pool: PgPool) {
    let wf = workflow(&pool, "Stable", "unchanged").await;
    let source = StageRepo::add(&pool, wf, &role_stage(1, "Review", vec![action("Approve", "next")]))
        .await
        .unwrap();

    WorkflowCopyRepo::copy(&pool, wf).await.unwrap();

    let original = WorkflowRepo::get(&pool, wf).await.unwrap();
    assert_eq!(original.workflow.name, "Stable");
    assert_eq!(original.stages.len(), 1);
    assert_eq!(original.stages[0].stage.id, source.stage.id);
    assert_eq!(original.stages[0].actions.len(), 1);
}
