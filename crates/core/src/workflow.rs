//! Workflow status constants and validation functions.
//!
//! Defines the valid status values for a workflow definition and the name
//! suffix applied when a workflow is duplicated. Used by both the DB layer
//! and the API layer.

/// Workflow is live and selectable for new approval processes.
pub const STATUS_ACTIVE: &str = "active";

/// Workflow is retained but hidden from selection.
pub const STATUS_INACTIVE: &str = "inactive";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE];

/// Suffix appended to the name of a duplicated workflow.
pub const COPY_NAME_SUFFIX: &str = " (Copy)";

/// Validate that a status string is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

/// Validate the scalar fields of a workflow create/update payload.
///
/// Name and description must be non-empty text; status must be recognized.
pub fn validate_workflow_fields(
    name: &str,
    description: &str,
    status: &str,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name is required and must be non-empty".to_string());
    }
    if description.trim().is_empty() {
        return Err("description is required and must be non-empty".to_string());
    }
    validate_status(status)
}

/// Build the name of a duplicated workflow.
pub fn copy_name(source_name: &str) -> String {
    format!("{source_name}{COPY_NAME_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses_accepted() {
        assert!(validate_status(STATUS_ACTIVE).is_ok());
        assert!(validate_status(STATUS_INACTIVE).is_ok());
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = validate_status("archived");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status"));
    }

    #[test]
    fn test_empty_status_rejected() {
        assert!(validate_status("").is_err());
    }

    #[test]
    fn test_workflow_fields_accepted() {
        assert!(validate_workflow_fields("Leave Approval", "HR leave", "active").is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = validate_workflow_fields("", "HR leave", "active");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("name"));
    }

    #[test]
    fn test_blank_description_rejected() {
        let result = validate_workflow_fields("Leave Approval", "   ", "active");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("description"));
    }

    #[test]
    fn test_fields_check_status_last() {
        let result = validate_workflow_fields("Leave Approval", "HR leave", "paused");
        assert!(result.unwrap_err().contains("Invalid status"));
    }

    #[test]
    fn test_copy_name_appends_suffix() {
        assert_eq!(copy_name("Leave Approval"), "Leave Approval (Copy)");
    }
}
