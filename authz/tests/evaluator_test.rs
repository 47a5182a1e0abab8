use std::sync::Arc;

use authz::{
    CheckOptions, DecisionRule, PermissionEvaluator, REASON_NO_CONTEXTUAL_PERMISSION,
    REASON_SYSTEM_ERROR, Target,
};
use hr_core::{
    Action, MemberRole, OrganizationId, PermissionLevel, RequestContext, Resource, Role, RoleClaim,
    TenantId,
};
use observability::{AuditKind, MemoryAuditSink};
use strum::IntoEnumIterator;
use testing::{
    InMemoryDirectory, employee, member, organization_id, tenant_id, user, user_id,
};

fn requestor(id: &str, role: impl Into<RoleClaim>) -> RequestContext {
    RequestContext::new(user_id(id), role)
        .with_tenant(tenant_id("t1"), "t1")
        .with_organization(organization_id("o1"), "o1")
}

/// o1: hr1 (HR), boss -> lead -> dev (reporting chain), admin1 (owner)
fn directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .add_user(user("hr1", Role::Hr, "t1", "o1"))
        .add_user(user("boss", Role::Manager, "t1", "o1"))
        .add_user(user("lead", Role::Manager, "t1", "o1"))
        .add_user(user("dev", Role::Employee, "t1", "o1"))
        .add_employee(employee("boss", None, "t1", "o1"))
        .add_employee(employee("lead", Some("boss"), "t1", "o1"))
        .add_employee(employee("dev", Some("lead"), "t1", "o1"))
        .add_employee(employee("outsider", None, "t1", "o2"))
        .add_membership(member("hr1", "o1", MemberRole::Member))
        .add_membership(member("dev", "o1", MemberRole::Member))
        .add_membership(member("lead", "o1", MemberRole::Member))
        .add_membership(member("admin1", "o1", MemberRole::Owner))
        .add_membership(member("outsider", "o2", MemberRole::Member));
    directory
}

fn evaluator(directory: Arc<InMemoryDirectory>) -> PermissionEvaluator<Arc<InMemoryDirectory>> {
    PermissionEvaluator::new(directory)
}

fn target_user(id: &str) -> Target {
    Target::user(user_id(id))
}

#[test]
fn test_leave_approval_by_non_manager_is_denied() {
    let evaluator = evaluator(directory());
    let result = evaluator.check(
        &requestor("dev", Role::Employee),
        Resource::LeaveRequest,
        Action::Approve,
        Some(&target_user("lead")),
        CheckOptions::default(),
    );

    assert!(!result.authorized);
    assert_eq!(result.permission_level, PermissionLevel::WriteOwn);
    assert_eq!(result.required_level, PermissionLevel::WriteTeam);
    assert!(result.reason.contains("Insufficient permission level"));
    assert!(result.reason.contains("10"));
    assert!(result.reason.contains("20"));
}

#[test]
fn test_hr_reads_colleague_folder_in_same_organization() {
    let evaluator = evaluator(directory());
    let result = evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );

    assert!(result.authorized);
    assert_eq!(result.rule(), Some(DecisionRule::SameOrganization));
    assert!(result.reason.contains("Organization-scoped"));
}

#[test]
fn test_hr_cannot_read_other_organization() {
    let evaluator = evaluator(directory());
    let result = evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("outsider")),
        CheckOptions::default(),
    );
    assert!(!result.authorized);
    assert_eq!(result.reason, REASON_NO_CONTEXTUAL_PERMISSION);
}

#[test]
fn test_unknown_role_fails_closed() {
    let evaluator = evaluator(directory());
    let result = evaluator.check(
        &requestor("x", RoleClaim::parse("bogus")),
        Resource::EmployeeManagement,
        Action::Write,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );
    assert!(!result.authorized);
    assert_eq!(result.permission_level, PermissionLevel::None);
    assert!(result.reason.contains("bogus"));
}

#[test]
fn test_self_access_wins_whenever_read_own_passes() {
    let evaluator = evaluator(directory());
    for role in [Role::Admin, Role::Hr, Role::Manager, Role::Employee] {
        let me = requestor("dev", role);
        for resource in Resource::iter() {
            let base = evaluator.table().level(role, resource);
            let result = evaluator.check(
                &me,
                resource,
                Action::Read,
                Some(&target_user("dev")),
                CheckOptions::default(),
            );
            if base.satisfies(result.required_level) {
                assert!(result.authorized, "{role} reading own {resource}");
                assert_eq!(result.rule(), Some(DecisionRule::SelfAccess));
            } else {
                assert!(!result.authorized, "{role} reading own {resource}");
            }
        }
    }
}

#[test]
fn test_system_admin_bypass_ignores_target() {
    let directory = directory();
    directory.set_unavailable(true);
    let evaluator = evaluator(directory);
    let sysadmin = RequestContext::new(user_id("root"), Role::SystemAdmin);
    let foreign = target_user("anyone")
        .with_tenant(TenantId::new("t9").unwrap())
        .with_organization(OrganizationId::new("o9").unwrap());

    for resource in Resource::iter() {
        for action in Action::iter() {
            let result = evaluator.check(
                &sysadmin,
                resource,
                action,
                Some(&foreign),
                CheckOptions::cross_tenant(),
            );
            assert!(result.authorized);
            assert_eq!(result.permission_level, PermissionLevel::Sysadmin);
            assert_eq!(result.rule(), Some(DecisionRule::SystemAdmin));
        }
    }
}

#[test]
fn test_manager_reaches_direct_and_indirect_reports() {
    let evaluator = evaluator(directory());

    let direct = evaluator.check(
        &requestor("lead", Role::Manager),
        Resource::LeaveRequest,
        Action::Approve,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );
    assert!(direct.authorized);
    assert_eq!(direct.rule(), Some(DecisionRule::ManagerChain));

    let indirect = evaluator.check(
        &requestor("boss", Role::Manager),
        Resource::LeaveRequest,
        Action::Approve,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );
    assert!(indirect.authorized);

    let upward = evaluator.check(
        &requestor("dev", Role::Manager),
        Resource::LeaveRequest,
        Action::Approve,
        Some(&target_user("boss")),
        CheckOptions::default(),
    );
    assert!(!upward.authorized);
}

#[test]
fn test_manager_uses_pre_resolved_employee() {
    let evaluator = evaluator(Arc::new(InMemoryDirectory::new()));
    let target = Target::from(employee("new-hire", Some("lead"), "t1", "o1"));
    let result = evaluator.check(
        &requestor("lead", Role::Manager),
        Resource::UserFolder,
        Action::Read,
        Some(&target),
        CheckOptions::default(),
    );
    assert!(result.authorized);
}

#[test]
fn test_manager_chain_depth_and_cycles_are_bounded() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .add_employee(employee("a", Some("b"), "t1", "o1"))
        .add_employee(employee("b", Some("c"), "t1", "o1"))
        .add_employee(employee("c", Some("a"), "t1", "o1"))
        .add_employee(employee("d", Some("e"), "t1", "o1"))
        .add_employee(employee("e", Some("f"), "t1", "o1"))
        .add_employee(employee("f", Some("top"), "t1", "o1"));

    let cyclic = evaluator(Arc::clone(&directory)).check(
        &requestor("stranger", Role::Manager),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("a")),
        CheckOptions::default(),
    );
    assert!(!cyclic.authorized);

    let shallow = evaluator(Arc::clone(&directory)).with_max_manager_chain_depth(2);
    let too_deep = shallow.check(
        &requestor("top", Role::Manager),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("d")),
        CheckOptions::default(),
    );
    assert!(!too_deep.authorized);

    let deep_enough = evaluator(directory).check(
        &requestor("top", Role::Manager),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("d")),
        CheckOptions::default(),
    );
    assert!(deep_enough.authorized);
}

#[test]
fn test_organization_owner_manages_organization() {
    let evaluator = evaluator(directory());
    let org_target = Target::organization(organization_id("o1"));

    let hr_read = evaluator.check(
        &requestor("admin1", Role::Hr),
        Resource::OrganizationManagement,
        Action::Read,
        Some(&Target::organization(organization_id("o2"))),
        CheckOptions::default(),
    );
    assert!(!hr_read.authorized);

    let hr_owner_read = evaluator.check(
        &requestor("admin1", Role::Hr),
        Resource::OrganizationManagement,
        Action::Read,
        Some(&org_target),
        CheckOptions::default(),
    );
    assert!(hr_owner_read.authorized);

    let member_read = evaluator.check(
        &requestor("dev", Role::Hr),
        Resource::OrganizationManagement,
        Action::Read,
        Some(&Target::organization(organization_id("o2"))),
        CheckOptions::default(),
    );
    assert!(!member_read.authorized);

    let hr_write = evaluator.check(
        &requestor("admin1", Role::Hr),
        Resource::OrganizationManagement,
        Action::Write,
        Some(&org_target),
        CheckOptions::default(),
    );
    assert!(!hr_write.authorized);
    assert_eq!(hr_write.required_level, PermissionLevel::WriteOrganization);
}

#[test]
fn test_admin_is_confined_to_its_scope() {
    let evaluator = evaluator(directory());
    let in_org = target_user("dev")
        .with_tenant(tenant_id("t1"))
        .with_organization(organization_id("o1"));
    let other_org = target_user("outsider")
        .with_tenant(tenant_id("t1"))
        .with_organization(organization_id("o2"));

    let org_admin = requestor("a1", Role::Admin);
    assert!(
        evaluator
            .check(
                &org_admin,
                Resource::EmployeeManagement,
                Action::Write,
                Some(&in_org),
                CheckOptions::default(),
            )
            .authorized
    );
    let denied = evaluator.check(
        &org_admin,
        Resource::EmployeeManagement,
        Action::Write,
        Some(&other_org),
        CheckOptions::default(),
    );
    assert!(!denied.authorized);

    let tenant_admin = RequestContext::new(user_id("a2"), Role::Admin)
        .with_tenant(tenant_id("t1"), "t1");
    let granted = evaluator.check(
        &tenant_admin,
        Resource::EmployeeManagement,
        Action::Write,
        Some(&other_org),
        CheckOptions::default(),
    );
    assert!(granted.authorized);
    assert_eq!(granted.rule(), Some(DecisionRule::AdminScope));
}

#[test]
fn test_cross_tenant_requires_admin() {
    let evaluator = evaluator(directory());
    let foreign = target_user("dev").with_tenant(tenant_id("t2"));

    let hr = evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::UserFolder,
        Action::Read,
        Some(&foreign),
        CheckOptions::default(),
    );
    assert!(!hr.authorized);
    assert_eq!(hr.required_level, PermissionLevel::Admin);
    assert!(hr.context.cross_tenant);

    let flagged = evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::Reports,
        Action::Read,
        None,
        CheckOptions::cross_tenant(),
    );
    assert!(!flagged.authorized);

    let platform_admin = RequestContext::new(user_id("pa"), Role::Admin);
    let result = evaluator.check(
        &platform_admin,
        Resource::UserFolder,
        Action::Read,
        Some(&foreign),
        CheckOptions::default(),
    );
    assert!(result.authorized);
}

#[test]
fn test_lookup_failure_fails_closed() {
    let directory = directory();
    directory.set_unavailable(true);
    let evaluator = evaluator(directory);

    let result = evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );
    assert!(!result.authorized);
    assert_eq!(result.reason, REASON_SYSTEM_ERROR);
}

#[test]
fn test_every_check_is_audited() {
    let audit = Arc::new(MemoryAuditSink::new());
    let evaluator = evaluator(directory()).with_audit_sink(audit.clone());

    evaluator.check(
        &requestor("dev", Role::Employee),
        Resource::LeaveRequest,
        Action::Approve,
        Some(&target_user("lead")),
        CheckOptions::default(),
    );
    evaluator.check(
        &requestor("hr1", Role::Hr),
        Resource::UserFolder,
        Action::Read,
        Some(&target_user("dev")),
        CheckOptions::default(),
    );

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert!(
        records
            .iter()
            .all(|r| r.kind == AuditKind::AuthorizationDecision)
    );

    let denied = &records[0];
    assert_eq!(denied.requestor_id.as_deref(), Some("dev"));
    assert_eq!(denied.requestor_role.as_deref(), Some("employee"));
    assert_eq!(denied.resource.as_deref(), Some("leave-request"));
    assert_eq!(denied.action.as_deref(), Some("approve"));
    assert_eq!(denied.target.as_deref(), Some("lead"));
    assert_eq!(denied.authorized, Some(false));
    assert_eq!(denied.required_level, Some(20));

    assert_eq!(records[1].authorized, Some(true));
}
