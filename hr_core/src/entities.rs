//! Entity records read from the HR store.
//!
//! The engine never writes these; they arrive through [`crate::EntityLookup`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{OrganizationId, RoleClaim, TenantId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: RoleClaim,
    pub tenant_id: Option<TenantId>,
    pub organization_id: Option<OrganizationId>,
}

/// Employment record of a user. `manager_id` points at the manager's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub user_id: UserId,
    pub manager_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub tenant_id: TenantId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    #[must_use]
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMember {
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub role: MemberRole,
}
