//! # Authorization
//!
//! Permission-level evaluation for the HR engine. See [`evaluator`] for the
//! decision procedure and [`table`] for the role → resource lattice.
//!
//! ## Usage
//! ```rust,no_run
//! use authz::{CheckOptions, PermissionEvaluator, Target};
//! use hr_core::{Action, EmptyDirectory, RequestContext, Resource, Role, UserId};
//!
//! let evaluator = PermissionEvaluator::new(EmptyDirectory);
//! let requestor = RequestContext::new(UserId::new("u1").unwrap(), Role::Employee);
//! let result = evaluator.check(
//!     &requestor,
//!     Resource::LeaveRequest,
//!     Action::Approve,
//!     Some(&Target::user(UserId::new("u2").unwrap())),
//!     CheckOptions::default()
//! );
//! assert!(!result.authorized);
//! ```

pub mod evaluator;
pub mod requirement;
pub mod result;
pub mod table;
pub mod target;

pub use evaluator::{
    DEFAULT_MAX_MANAGER_CHAIN_DEPTH, PermissionEvaluator, REASON_NO_CONTEXTUAL_PERMISSION,
    REASON_SYSTEM_ERROR,
};
pub use requirement::{Relation, action_default, required_level};
pub use result::{AuthorizationResult, DecisionContext, DecisionRule};
pub use table::PermissionTable;
pub use target::{CheckOptions, Target};
