use hr_core::{Action, PermissionLevel, Resource};

/// How the target relates to the requestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// No target, or the requestor is the target.
    Own,
    /// Someone else's record.
    Other,
}

/// Default level an action needs before resource refinements.
pub fn action_default(action: Action) -> PermissionLevel {
    match action {
        Action::Read => PermissionLevel::ReadOwn,
        Action::Create | Action::Write => PermissionLevel::WriteOwn,
        Action::Delete | Action::Approve | Action::Reject => PermissionLevel::WriteTeam,
        Action::Admin => PermissionLevel::Admin,
    }
}

/// Minimum level for `action` on `resource`.
///
/// Resource refinements override the action default; crossing tenants lifts
/// the result to at least [`PermissionLevel::Admin`].
pub fn required_level(
    action: Action,
    resource: Resource,
    relation: Relation,
    cross_tenant: bool,
) -> PermissionLevel {
    let level = match (resource, action) {
        (Resource::TenantManagement, Action::Read) => PermissionLevel::ReadOwn,
        (Resource::TenantManagement, _) => PermissionLevel::Admin,
        (_, Action::Approve | Action::Reject) => PermissionLevel::WriteTeam,
        (Resource::OrganizationManagement, Action::Create | Action::Write | Action::Delete) => {
            PermissionLevel::WriteOrganization
        }
        (Resource::AuditLog, Action::Read) => PermissionLevel::ReadOrganization,
        (r, Action::Read) if r.is_personal() && relation == Relation::Other => {
            PermissionLevel::ReadTeam
        }
        (r, Action::Create | Action::Write) if r.is_personal() && relation == Relation::Other => {
            PermissionLevel::WriteTeam
        }
        (_, action) => action_default(action),
    };

    if cross_tenant {
        level.max(PermissionLevel::Admin)
    } else {
        level
    }
}
