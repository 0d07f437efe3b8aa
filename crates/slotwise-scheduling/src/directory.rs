//! Tenant, operator and provider administration.

use slotwise_core::error::{SlotwiseError, SlotwiseResult};
use slotwise_core::models::calendar::OperatingHours;
use slotwise_core::models::principal::{
    CapabilitySet, CreatePrincipal, Principal, Role, UpdatePrincipal,
};
use slotwise_core::models::provider::{CreateProvider, Provider, UpdateProvider, WorkingHours};
use slotwise_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use slotwise_core::repository::{
    PaginatedResult, Pagination, PrincipalRepository, ProviderRepository, Repositories,
    TenantRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::permission::{Action, Resource, authorize_tenant, mask_not_found, require, require_active};

pub struct Directory<R: Repositories> {
    repos: R,
}

impl<R: Repositories> Directory<R> {
    pub fn new(repos: R) -> Self {
        Self { repos }
    }

    // -------------------------------------------------------------------
    // Tenants
    // -------------------------------------------------------------------

    /// Create a tenant owned by `principal`.
    pub async fn create_tenant(
        &self,
        principal: &Principal,
        name: impl Into<String>,
        operating_hours: OperatingHours,
    ) -> SlotwiseResult<Tenant> {
        require(principal, Action::CreateTenant, &Resource::NewTenant)?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SlotwiseError::validation("tenant name must not be blank"));
        }

        let tenant = self
            .repos
            .tenants()
            .create(CreateTenant {
                owner_principal_id: principal.id,
                name,
                operating_hours,
            })
            .await?;
        info!(tenant_id = %tenant.id, owner_id = %principal.id, "Tenant created");
        Ok(tenant)
    }

    pub async fn update_tenant(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        name: Option<String>,
        is_active: Option<bool>,
    ) -> SlotwiseResult<Tenant> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::UpdateTenant,
            tenant_id,
        )
        .await?;

        let tenant = self
            .repos
            .tenants()
            .update(
                tenant_id,
                UpdateTenant {
                    name,
                    is_active,
                    operating_hours: None,
                },
            )
            .await?;
        info!(tenant_id = %tenant_id, is_active = tenant.is_active, "Tenant updated");
        Ok(tenant)
    }

    pub async fn delete_tenant(&self, principal: &Principal, tenant_id: Uuid) -> SlotwiseResult<()> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::DeleteTenant,
            tenant_id,
        )
        .await?;

        self.repos.tenants().delete(tenant_id).await?;
        info!(tenant_id = %tenant_id, "Tenant deleted");
        Ok(())
    }

    pub async fn get_tenant(&self, principal: &Principal, tenant_id: Uuid) -> SlotwiseResult<Tenant> {
        authorize_tenant(self.repos.tenants(), principal, Action::ViewTenant, tenant_id).await
    }

    /// All tenants for the platform owner, owned tenants for everyone else.
    pub async fn list_tenants(
        &self,
        principal: &Principal,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<Tenant>> {
        require_active(principal)?;
        match principal.role {
            Role::PlatformOwner => self.repos.tenants().list(pagination).await,
            Role::ScopedOperator => {
                self.repos
                    .tenants()
                    .list_by_owner(principal.id, pagination)
                    .await
            }
        }
    }

    // -------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------

    /// Return the platform owner, creating it with every capability when
    /// none exists yet. The flag is true when it was created now.
    pub async fn ensure_platform_owner(
        &self,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> SlotwiseResult<(Principal, bool)> {
        if let Some(owner) = self.repos.principals().get_platform_owner().await? {
            return Ok((owner, false));
        }

        let owner = self
            .repos
            .principals()
            .create(CreatePrincipal {
                role: Role::PlatformOwner,
                owner_id: None,
                display_name: display_name.into(),
                email: email.into(),
                capabilities: CapabilitySet::all(),
            })
            .await?;
        info!(principal_id = %owner.id, "Platform owner created");
        Ok((owner, true))
    }

    /// Create a scoped operator managed by the platform owner.
    pub async fn create_operator(
        &self,
        principal: &Principal,
        display_name: impl Into<String>,
        email: impl Into<String>,
        capabilities: CapabilitySet,
    ) -> SlotwiseResult<Principal> {
        require_active(principal)?;
        let owner = self
            .repos
            .principals()
            .get_platform_owner()
            .await?
            .ok_or_else(|| SlotwiseError::not_found("principal", "platform owner"))?;
        require(
            principal,
            Action::ManageOperators,
            &Resource::Operator {
                owner_id: Some(owner.id),
            },
        )?;

        let operator = self
            .repos
            .principals()
            .create(CreatePrincipal {
                role: Role::ScopedOperator,
                owner_id: Some(owner.id),
                display_name: display_name.into(),
                email: email.into(),
                capabilities,
            })
            .await?;
        info!(operator_id = %operator.id, owner_id = %owner.id, "Operator created");
        Ok(operator)
    }

    pub async fn update_capabilities(
        &self,
        principal: &Principal,
        operator_id: Uuid,
        capabilities: CapabilitySet,
    ) -> SlotwiseResult<Principal> {
        self.authorized_operator(principal, operator_id).await?;

        let operator = self
            .repos
            .principals()
            .update(
                operator_id,
                UpdatePrincipal {
                    capabilities: Some(capabilities),
                    ..Default::default()
                },
            )
            .await?;
        info!(
            operator_id = %operator_id,
            granted = operator.capabilities.granted().count(),
            "Operator capabilities updated"
        );
        Ok(operator)
    }

    pub async fn deactivate_operator(
        &self,
        principal: &Principal,
        operator_id: Uuid,
    ) -> SlotwiseResult<Principal> {
        self.authorized_operator(principal, operator_id).await?;

        let operator = self
            .repos
            .principals()
            .update(
                operator_id,
                UpdatePrincipal {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        info!(operator_id = %operator_id, "Operator deactivated");
        Ok(operator)
    }

    /// Operators managed by `principal`.
    pub async fn list_operators(
        &self,
        principal: &Principal,
        pagination: Pagination,
    ) -> SlotwiseResult<PaginatedResult<Principal>> {
        require_active(principal)?;
        self.repos
            .principals()
            .list_by_owner(principal.id, pagination)
            .await
    }

    async fn authorized_operator(
        &self,
        principal: &Principal,
        operator_id: Uuid,
    ) -> SlotwiseResult<Principal> {
        require_active(principal)?;
        let operator = self
            .repos
            .principals()
            .get_by_id(operator_id)
            .await
            .map_err(|e| mask_not_found(principal, e))?;
        if operator.role == Role::PlatformOwner {
            return Err(SlotwiseError::validation(
                "the platform owner is not a managed operator",
            ));
        }
        require(
            principal,
            Action::ManageOperators,
            &Resource::Operator {
                owner_id: operator.owner_id,
            },
        )?;
        Ok(operator)
    }

    // -------------------------------------------------------------------
    // Providers
    // -------------------------------------------------------------------

    pub async fn add_provider(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        name: impl Into<String>,
        working_hours: WorkingHours,
    ) -> SlotwiseResult<Provider> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageProviders,
            tenant_id,
        )
        .await?;

        let provider = self
            .repos
            .providers()
            .create(CreateProvider {
                tenant_id,
                name: name.into(),
                working_hours,
            })
            .await?;
        info!(tenant_id = %tenant_id, provider_id = %provider.id, "Provider added");
        Ok(provider)
    }

    pub async fn update_provider_hours(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        provider_id: Uuid,
        working_hours: WorkingHours,
    ) -> SlotwiseResult<Provider> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageProviders,
            tenant_id,
        )
        .await?;

        let provider = self
            .repos
            .providers()
            .update(
                tenant_id,
                provider_id,
                UpdateProvider {
                    working_hours: Some(working_hours),
                    ..Default::default()
                },
            )
            .await?;
        info!(tenant_id = %tenant_id, provider_id = %provider_id, "Provider hours updated");
        Ok(provider)
    }

    pub async fn set_provider_active(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        provider_id: Uuid,
        is_active: bool,
    ) -> SlotwiseResult<Provider> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageProviders,
            tenant_id,
        )
        .await?;

        let provider = self
            .repos
            .providers()
            .update(
                tenant_id,
                provider_id,
                UpdateProvider {
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await?;
        info!(tenant_id = %tenant_id, provider_id = %provider_id, is_active, "Provider status changed");
        Ok(provider)
    }

    pub async fn list_providers(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
    ) -> SlotwiseResult<Vec<Provider>> {
        authorize_tenant(self.repos.tenants(), principal, Action::ViewTenant, tenant_id).await?;
        self.repos.providers().list(tenant_id).await
    }
}
