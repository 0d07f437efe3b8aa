//! Capability-based permission model.
//!
//! A decision depends on three things only: whether the principal is
//! active, whether it owns the resource, and whether it holds the
//! capability the action requires. The platform owner owns everything.

use slotwise_core::error::{DenyReason, SlotwiseError, SlotwiseResult};
use slotwise_core::models::principal::{Capability, Principal, Role};
use slotwise_core::models::tenant::Tenant;
use slotwise_core::repository::TenantRepository;
use tracing::warn;
use uuid::Uuid;

/// Everything a principal can ask to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateTenant,
    UpdateTenant,
    DeleteTenant,
    ViewTenant,
    ViewAnalytics,
    ManageServices,
    ManageProviders,
    ManageSchedule,
    ManageOperators,
}

impl Action {
    /// The single capability a mutating action needs. Reads need none.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Action::CreateTenant => Some(Capability::AddTenants),
            Action::UpdateTenant => Some(Capability::EditTenants),
            Action::DeleteTenant => Some(Capability::DeleteTenants),
            Action::ViewTenant => None,
            Action::ViewAnalytics => Some(Capability::ViewAnalytics),
            Action::ManageServices => Some(Capability::ManageServices),
            Action::ManageProviders => Some(Capability::ManageProviders),
            Action::ManageSchedule => Some(Capability::ManageSchedule),
            Action::ManageOperators => Some(Capability::ManageOperators),
        }
    }
}

/// What an action targets, reduced to the id of its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// An existing tenant and everything scoped to it.
    Tenant { owner_principal_id: Uuid },
    /// A tenant that does not exist yet; the creator will own it.
    NewTenant,
    /// An operator account, owned by the principal that manages it.
    Operator { owner_id: Option<Uuid> },
}

impl Resource {
    pub fn tenant(tenant: &Tenant) -> Self {
        Resource::Tenant {
            owner_principal_id: tenant.owner_principal_id,
        }
    }

    fn is_owned_by(&self, principal_id: Uuid) -> bool {
        match self {
            Resource::Tenant { owner_principal_id } => *owner_principal_id == principal_id,
            Resource::NewTenant => true,
            Resource::Operator { owner_id } => *owner_id == Some(principal_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Decide whether `principal` may perform `action` on `resource`.
pub fn authorize(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    if !principal.is_active {
        return Decision::Deny(DenyReason::InactivePrincipal);
    }

    match principal.role {
        Role::PlatformOwner => Decision::Allow,
        Role::ScopedOperator => {
            if !resource.is_owned_by(principal.id) {
                return Decision::Deny(DenyReason::NotOwner);
            }
            match action.required_capability() {
                Some(cap) if !principal.capabilities.grants(cap) => {
                    Decision::Deny(DenyReason::MissingCapability)
                }
                _ => Decision::Allow,
            }
        }
    }
}

/// [`authorize`], turned into an error and logged on denial.
pub fn require(principal: &Principal, action: Action, resource: &Resource) -> SlotwiseResult<()> {
    match authorize(principal, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                principal_id = %principal.id,
                ?action,
                %reason,
                "Action denied"
            );
            Err(SlotwiseError::denied(reason))
        }
    }
}

/// Reject inactive principals before any lookup happens.
pub(crate) fn require_active(principal: &Principal) -> SlotwiseResult<()> {
    if principal.is_active {
        Ok(())
    } else {
        warn!(principal_id = %principal.id, "Inactive principal rejected");
        Err(SlotwiseError::denied(DenyReason::InactivePrincipal))
    }
}

/// A lookup miss as seen by `principal`. Scoped operators cannot tell a
/// missing record from one they do not own.
pub(crate) fn mask_not_found(principal: &Principal, err: SlotwiseError) -> SlotwiseError {
    match err {
        SlotwiseError::NotFound { .. } if !principal.is_platform_owner() => {
            warn!(principal_id = %principal.id, "Lookup outside ownership");
            SlotwiseError::denied(DenyReason::NotOwner)
        }
        other => other,
    }
}

/// Load a tenant and check `action` against it in one step.
pub(crate) async fn authorize_tenant<T: TenantRepository>(
    tenants: &T,
    principal: &Principal,
    action: Action,
    tenant_id: Uuid,
) -> SlotwiseResult<Tenant> {
    require_active(principal)?;
    let tenant = tenants
        .get_by_id(tenant_id)
        .await
        .map_err(|e| mask_not_found(principal, e))?;
    require(principal, action, &Resource::tenant(&tenant))?;
    Ok(tenant)
}
