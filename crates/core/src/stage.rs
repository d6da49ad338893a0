//! Stage payload types and the structural validator for the stage/action graph.
//!
//! A stage payload arrives deserialized but unvalidated. [`validate_stage`]
//! checks every structural rule in a fixed order, short-circuiting on the
//! first violation, and reports the offending field in the error message.
//! It is pure logic: the caller supplies the set of stage ids that are legal
//! `specific` transition targets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// The stage is satisfied by members of a role.
pub const ACTOR_TYPE_ROLE: &str = "role";

/// The stage is satisfied by a single named user.
pub const ACTOR_TYPE_USER: &str = "user";

/// All valid actor types.
pub const VALID_ACTOR_TYPES: &[&str] = &[ACTOR_TYPE_ROLE, ACTOR_TYPE_USER];

/// One actor approval suffices.
pub const DECISION_MODE_ANY: &str = "any";

/// All required actors must approve.
pub const DECISION_MODE_ALL: &str = "all";

/// All valid decision modes.
pub const VALID_DECISION_MODES: &[&str] = &[DECISION_MODE_ANY, DECISION_MODE_ALL];

/// Advance to the next stage in sequence order.
pub const TRANSITION_NEXT: &str = "next";

/// Regress to the previous stage in sequence order.
pub const TRANSITION_PREV: &str = "prev";

/// Terminate the workflow.
pub const TRANSITION_COMPLETE: &str = "complete";

/// Jump to an explicitly named stage.
pub const TRANSITION_SPECIFIC: &str = "specific";

/// All valid transition types.
pub const VALID_TRANSITIONS: &[&str] = &[
    TRANSITION_NEXT,
    TRANSITION_PREV,
    TRANSITION_COMPLETE,
    TRANSITION_SPECIFIC,
];

/// Candidate payload for adding or replacing a stage, actions included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageInput {
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
    #[serde(default)]
    pub actions: Vec<ActionInput>,
}

/// Candidate payload for one action of a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInput {
    pub name: String,
    pub description: Option<String>,
    pub transition_type: String,
    pub target_stage_id: Option<DbId>,
    pub required_count: i32,
}

/// Validate a stage payload against the structural rules of the graph.
///
/// `allowed_targets` is the set of stage ids that a `specific` action may
/// name: the stages already committed in the target workflow. On update the
/// caller excludes the stage under edit from the committed pool and re-adds
/// its own id, so a stage may legally loop to itself.
///
/// Rules are checked in a fixed order and the first violation wins. A
/// `specific` target outside `allowed_targets` is a [`CoreError::Conflict`];
/// every other violation is a [`CoreError::Validation`].
pub fn validate_stage(
    input: &StageInput,
    allowed_targets: &HashSet<DbId>,
) -> Result<(), CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "name is required and must be non-empty".to_string(),
        ));
    }
    if input.description.trim().is_empty() {
        return Err(CoreError::Validation(
            "description is required and must be non-empty".to_string(),
        ));
    }
    if input.seq_no < 1 {
        return Err(CoreError::Validation(
            "seq_no must be a positive integer".to_string(),
        ));
    }
    if input.upload_count < 0 {
        return Err(CoreError::Validation(
            "upload_count must be non-negative".to_string(),
        ));
    }
    if !VALID_ACTOR_TYPES.contains(&input.actor_type.as_str()) {
        return Err(CoreError::Validation(format!(
            "actor_type must be one of: {}",
            VALID_ACTOR_TYPES.join(", ")
        )));
    }
    if input.actor_type == ACTOR_TYPE_ROLE && input.role_id.is_none() {
        return Err(CoreError::Validation(
            "role_id is required when actor_type is \"role\"".to_string(),
        ));
    }
    if input.actor_type == ACTOR_TYPE_USER && input.user_id.is_none() {
        return Err(CoreError::Validation(
            "user_id is required when actor_type is \"user\"".to_string(),
        ));
    }
    if input.actor_count < 1 {
        return Err(CoreError::Validation(
            "actor_count must be a positive integer".to_string(),
        ));
    }
    if !VALID_DECISION_MODES.contains(&input.decision_mode.as_str()) {
        return Err(CoreError::Validation(format!(
            "decision_mode must be one of: {}",
            VALID_DECISION_MODES.join(", ")
        )));
    }
    if input.conflict_check != 0 && input.conflict_check != 1 {
        return Err(CoreError::Validation(
            "conflict_check must be 0 or 1".to_string(),
        ));
    }
    if input.document_required != 0 && input.document_required != 1 {
        return Err(CoreError::Validation(
            "document_required must be 0 or 1".to_string(),
        ));
    }

    for action in &input.actions {
        validate_action(action, input.actor_count, allowed_targets)?;
    }

    Ok(())
}

/// Validate one action of a stage payload. Rule order: name, transition
/// type, `specific` target, required count.
fn validate_action(
    action: &ActionInput,
    actor_count: i32,
    allowed_targets: &HashSet<DbId>,
) -> Result<(), CoreError> {
    if action.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "action name is required and must be non-empty".to_string(),
        ));
    }
    if !VALID_TRANSITIONS.contains(&action.transition_type.as_str()) {
        return Err(CoreError::Validation(format!(
            "transition_type must be one of: {}",
            VALID_TRANSITIONS.join(", ")
        )));
    }
    if action.transition_type == TRANSITION_SPECIFIC {
        let target = action.target_stage_id.ok_or_else(|| {
            CoreError::Validation(
                "target_stage_id is required when transition_type is \"specific\"".to_string(),
            )
        })?;
        if !allowed_targets.contains(&target) {
            return Err(CoreError::Conflict(format!(
                "target_stage_id {target} does not correspond to a stage in this workflow"
            )));
        }
    }
    if action.required_count < 1 || action.required_count > actor_count {
        return Err(CoreError::Validation(format!(
            "required_count must be between 1 and {actor_count}"
        )));
    }
    Ok(())
}
