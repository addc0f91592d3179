use serde::Serialize;
use uuid::Uuid;

use shared_models::scheduling::{ProviderProfile, ServiceTemplate};

use crate::error::{SchedulingError, ServiceDuration};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationBreakdown {
    pub total_minutes: i32,
    pub services: Vec<ServiceDuration>,
}

/// The provider's custom duration wins over the template default.
pub fn service_duration(provider: &ProviderProfile, template: &ServiceTemplate) -> Option<i32> {
    let offering = provider.offers(template.id)?;
    Some(
        offering
            .custom_duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(template.default_duration_minutes),
    )
}

/// Sums the durations of `service_ids` into one contiguous block.
///
/// `daily_limit` is enforced only when the caller is planning a concrete date.
pub fn aggregate(
    provider: &ProviderProfile,
    service_ids: &[Uuid],
    templates: &[ServiceTemplate],
    daily_limit: Option<i32>,
) -> Result<DurationBreakdown, SchedulingError> {
    let mut services = Vec::with_capacity(service_ids.len());

    for service_id in service_ids {
        let template = templates
            .iter()
            .find(|t| t.id == *service_id)
            .ok_or(SchedulingError::ServiceNotFound(*service_id))?;
        let minutes = service_duration(provider, template).ok_or(SchedulingError::ServiceNotOffered(*service_id))?;
        if minutes <= 0 {
            return Err(SchedulingError::InvalidDuration(minutes));
        }

        services.push(ServiceDuration {
            service_id: *service_id,
            name: template.name.clone(),
            duration_minutes: minutes,
        });
    }

    let total_minutes = services.iter().map(|s| s.duration_minutes).sum();

    if let Some(limit) = daily_limit {
        if total_minutes > limit {
            return Err(SchedulingError::DurationExceedsDailyLimit {
                total: total_minutes,
                limit,
                breakdown: services,
            });
        }
    }

    Ok(DurationBreakdown { total_minutes, services })
}
