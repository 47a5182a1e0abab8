//! Core traits for the engine's upstream collaborators

use errors::LookupError;

use crate::entities::{Employee, Organization, OrganizationMember, User};
use crate::types::{OrganizationId, UserId};

/// Read-only access to the entity store.
///
/// Lookups are synchronous and return `Ok(None)` for "not found"; `Err` is
/// reserved for store failures, which the evaluator treats as a denial.
pub trait EntityLookup: Send + Sync {
    fn user_by_id(&self, id: &UserId) -> Result<Option<User>, LookupError>;

    fn user_by_email(&self, email: &str) -> Result<Option<User>, LookupError>;

    fn employee_by_user_id(&self, user_id: &UserId) -> Result<Option<Employee>, LookupError>;

    fn membership(
        &self,
        user_id: &UserId,
        organization_id: &OrganizationId,
    ) -> Result<Option<OrganizationMember>, LookupError>;

    fn organization_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, LookupError>;
}

/// A directory that knows nobody.
///
/// Used where only static decisions are possible, e.g. offline CLI checks:
/// every contextual rule that needs a lookup simply finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDirectory;

impl EntityLookup for EmptyDirectory {
    fn user_by_id(&self, _id: &UserId) -> Result<Option<User>, LookupError> {
        Ok(None)
    }

    fn user_by_email(&self, _email: &str) -> Result<Option<User>, LookupError> {
        Ok(None)
    }

    fn employee_by_user_id(&self, _user_id: &UserId) -> Result<Option<Employee>, LookupError> {
        Ok(None)
    }

    fn membership(
        &self,
        _user_id: &UserId,
        _organization_id: &OrganizationId,
    ) -> Result<Option<OrganizationMember>, LookupError> {
        Ok(None)
    }

    fn organization_by_id(
        &self,
        _id: &OrganizationId,
    ) -> Result<Option<Organization>, LookupError> {
        Ok(None)
    }
}

impl<T: EntityLookup + ?Sized> EntityLookup for std::sync::Arc<T> {
    fn user_by_id(&self, id: &UserId) -> Result<Option<User>, LookupError> {
        (**self).user_by_id(id)
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, LookupError> {
        (**self).user_by_email(email)
    }

    fn employee_by_user_id(&self, user_id: &UserId) -> Result<Option<Employee>, LookupError> {
        (**self).employee_by_user_id(user_id)
    }

    fn membership(
        &self,
        user_id: &UserId,
        organization_id: &OrganizationId,
    ) -> Result<Option<OrganizationMember>, LookupError> {
        (**self).membership(user_id, organization_id)
    }

    fn organization_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, LookupError> {
        (**self).organization_by_id(id)
    }
}
