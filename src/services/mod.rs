//! Business logic between the HTTP handlers and the stores.

pub mod assignments;
pub mod directory;
pub mod existence;
pub mod metadata;
pub mod pagination;
pub mod projection;
pub mod validation;

pub use assignments::{AssignmentService, AssignmentSpec};
pub use directory::DirectoryService;
pub use existence::ExistenceOracle;
pub use metadata::MetadataService;
pub use projection::Projector;
pub use validation::Validator;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the microsecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
