use uuid::Uuid;

use availability_cell::engine::{aggregate, DurationBreakdown};
use availability_cell::SchedulingError;
use shared_models::scheduling::{ProviderProfile, ServiceTemplate};

/// Ratings above 5 are legacy fixed-point tenths (0-50).
pub fn normalize_rating(raw: f64) -> f64 {
    let rating = if raw > 5.0 { raw / 10.0 } else { raw };
    rating.clamp(0.0, 5.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Niche(Uuid),
    Category(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct QualificationCriteria {
    pub service_ids: Vec<Uuid>,
    pub min_rating: f64,
    pub membership: Option<Membership>,
    /// Duration used when no service is requested.
    pub fallback_duration: i32,
    /// Cap on the combined duration, set when ranking for a concrete date.
    pub daily_limit: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct QualifiedProvider {
    pub provider: ProviderProfile,
    pub rating: f64,
    pub duration: DurationBreakdown,
}

fn is_member(provider: &ProviderProfile, membership: Option<Membership>) -> bool {
    match membership {
        None => true,
        Some(Membership::Niche(niche_id)) => provider.niche_ids.contains(&niche_id),
        Some(Membership::Category(category_id)) => provider.category_ids.contains(&category_id),
    }
}

/// Keeps providers that offer every requested service, meet the rating floor
/// and belong to the requested niche or category.
pub fn qualify(
    providers: Vec<ProviderProfile>,
    templates: &[ServiceTemplate],
    criteria: &QualificationCriteria,
) -> Result<Vec<QualifiedProvider>, SchedulingError> {
    if let Some(missing) = criteria
        .service_ids
        .iter()
        .find(|id| !templates.iter().any(|t| t.id == **id))
    {
        return Err(SchedulingError::ServiceNotFound(*missing));
    }

    let mut qualified = Vec::new();
    for provider in providers {
        if !provider.is_active || !is_member(&provider, criteria.membership) {
            continue;
        }

        let rating = normalize_rating(provider.rating);
        if criteria.min_rating > 0.0 && rating < criteria.min_rating {
            continue;
        }

        let duration = if criteria.service_ids.is_empty() {
            DurationBreakdown {
                total_minutes: criteria.fallback_duration,
                services: vec![],
            }
        } else {
            match aggregate(&provider, &criteria.service_ids, templates, criteria.daily_limit) {
                Ok(duration) => duration,
                Err(SchedulingError::ServiceNotOffered(_)) => continue,
                Err(other) => return Err(other),
            }
        };

        qualified.push(QualifiedProvider { provider, rating, duration });
    }

    Ok(qualified)
}
