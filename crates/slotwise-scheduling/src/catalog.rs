//! Service catalog: the bookable offerings of each tenant.

use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::principal::Principal;
use slotwise_core::models::service::{CreateService, DurationType, Service, ServiceSpec};
use slotwise_core::repository::{Repositories, ServiceRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::SchedulingError;
use crate::permission::{Action, authorize_tenant};

/// Check that a spec is internally consistent before it is stored.
pub fn validate_spec(spec: &ServiceSpec, config: &SchedulingConfig) -> Result<(), SchedulingError> {
    if spec.name.trim().is_empty() {
        return Err(SchedulingError::BlankName);
    }
    match (spec.duration_type, spec.fixed_duration_minutes) {
        (DurationType::Fixed, None | Some(0)) => Err(SchedulingError::MissingFixedDuration),
        (DurationType::Fixed, Some(minutes)) => check_duration(minutes, config),
        (DurationType::Flexible, Some(_)) => Err(SchedulingError::UnexpectedFixedDuration),
        (DurationType::Flexible, None) => Ok(()),
    }
}

/// Reject durations outside the configured bounds.
pub fn check_duration(minutes: u32, config: &SchedulingConfig) -> Result<(), SchedulingError> {
    if minutes == 0 {
        return Err(SchedulingError::ZeroDuration);
    }
    if minutes < config.min_duration_minutes || minutes > config.max_duration_minutes {
        return Err(SchedulingError::DurationOutOfRange {
            min: config.min_duration_minutes,
            max: config.max_duration_minutes,
            actual: minutes,
        });
    }
    Ok(())
}

pub struct ServiceCatalog<R: Repositories> {
    repos: R,
    config: SchedulingConfig,
}

impl<R: Repositories> ServiceCatalog<R> {
    pub fn new(repos: R, config: SchedulingConfig) -> Self {
        Self { repos, config }
    }

    pub async fn define_service(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        spec: ServiceSpec,
    ) -> SlotwiseResult<Service> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageServices,
            tenant_id,
        )
        .await?;
        validate_spec(&spec, &self.config)?;

        let service = self
            .repos
            .services()
            .create(CreateService {
                tenant_id,
                name: spec.name,
                description: spec.description,
                duration_type: spec.duration_type,
                fixed_duration_minutes: spec.fixed_duration_minutes,
            })
            .await?;

        info!(
            tenant_id = %tenant_id,
            service_id = %service.id,
            duration_type = service.duration_type.as_str(),
            "Service defined"
        );
        Ok(service)
    }

    /// Existing bookings are left untouched; only new requests are refused.
    pub async fn deactivate(
        &self,
        principal: &Principal,
        tenant_id: Uuid,
        service_id: Uuid,
    ) -> SlotwiseResult<Service> {
        authorize_tenant(
            self.repos.tenants(),
            principal,
            Action::ManageServices,
            tenant_id,
        )
        .await?;

        let service = self
            .repos
            .services()
            .set_active(tenant_id, service_id, false)
            .await?;
        info!(tenant_id = %tenant_id, service_id = %service_id, "Service deactivated");
        Ok(service)
    }

    /// Customer-facing listing; no principal involved.
    pub async fn list_services(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> SlotwiseResult<Vec<Service>> {
        self.repos.services().list(tenant_id, active_only).await
    }
}
