//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Operations touching more than
//! one entity type run inside a single transaction; an error return before
//! commit rolls the whole operation back.

pub mod stage_repo;
pub mod workflow_copy_repo;
pub mod workflow_repo;

pub use stage_repo::StageRepo;
pub use workflow_copy_repo::WorkflowCopyRepo;
pub use workflow_repo::WorkflowRepo;
