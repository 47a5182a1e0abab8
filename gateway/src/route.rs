use hr_core::{AccessScope, Action, Resource};

/// Scope a route operates on. Same lattice as the caller's access scope.
pub type SecurityScope = AccessScope;

/// What a route demands from its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequirement {
    pub scope: SecurityScope,
    pub permission: Option<(Resource, Action)>,
}

impl Default for RouteRequirement {
    fn default() -> Self {
        Self::scope(SecurityScope::User)
    }
}

impl RouteRequirement {
    pub fn scope(scope: SecurityScope) -> Self {
        Self {
            scope,
            permission: None,
        }
    }

    #[must_use]
    pub fn with_permission(mut self, resource: Resource, action: Action) -> Self {
        self.permission = Some((resource, action));
        self
    }
}
