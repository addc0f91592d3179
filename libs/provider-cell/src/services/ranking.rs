use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::{DayRequest, SchedulingError, ServiceDuration, SlotEngine};
use shared_config::AppConfig;
use shared_database::SchedulingStore;

use super::geo::{haversine_km, Coordinates};
use super::qualification::{qualify, Membership, QualificationCriteria, QualifiedProvider};
use crate::error::RankingError;

const DISTANCE_WEIGHT: f64 = 0.5;
const RATING_WEIGHT: f64 = 0.3;
const AVAILABILITY_WEIGHT: f64 = 0.2;
/// Free slots needed for a full availability score.
const SLOTS_FOR_FULL_SCORE: f64 = 5.0;
/// Score used when either side has no coordinates.
const NEUTRAL_DISTANCE_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub service_ids: Vec<Uuid>,
    pub category_id: Option<Uuid>,
    pub niche_id: Option<Uuid>,
    /// Without a date providers are ranked on distance and rating only.
    pub date: Option<NaiveDate>,
    pub origin: Option<Coordinates>,
    pub min_rating: f64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderCandidate {
    pub provider_id: Uuid,
    pub name: String,
    pub rating: f64,
    pub distance_km: Option<f64>,
    pub total_service_duration: i32,
    pub services: Vec<ServiceDuration>,
    pub free_slot_count: Option<usize>,
    pub next_available_slot: Option<String>,
    pub distance_score: f64,
    pub rating_score: f64,
    pub availability_score: f64,
    pub recommendation_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedProviders {
    pub providers: Vec<ProviderCandidate>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub date: Option<NaiveDate>,
}

pub fn distance_score(distance_km: Option<f64>, max_distance_km: f64) -> f64 {
    match distance_km {
        Some(km) if max_distance_km > 0.0 => (100.0 - (km / max_distance_km) * 100.0).max(0.0),
        _ => NEUTRAL_DISTANCE_SCORE,
    }
}

pub fn rating_score(rating: f64) -> f64 {
    (rating / 5.0) * 100.0
}

pub fn availability_score(free_slot_count: usize) -> f64 {
    ((free_slot_count as f64 / SLOTS_FOR_FULL_SCORE) * 100.0).min(100.0)
}

pub fn recommendation_score(distance: f64, rating: f64, availability: f64) -> f64 {
    distance * DISTANCE_WEIGHT + rating * RATING_WEIGHT + availability * AVAILABILITY_WEIGHT
}

/// Availability of one provider on the target date.
struct DayAvailability {
    free_slot_count: usize,
    next_available_slot: Option<String>,
}

pub struct RankingEngine {
    config: Arc<AppConfig>,
    store: Arc<dyn SchedulingStore>,
    slots: SlotEngine,
}

impl RankingEngine {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        Self {
            slots: SlotEngine::new(config.clone(), store.clone()),
            config,
            store,
        }
    }

    #[instrument(skip(self, request), fields(services = request.service_ids.len(), date = ?request.date))]
    pub async fn rank(&self, request: RankingRequest) -> Result<RankedProviders, RankingError> {
        if let Some(origin) = request.origin {
            if !origin.is_valid() {
                return Err(RankingError::InvalidCoordinates {
                    latitude: origin.latitude,
                    longitude: origin.longitude,
                });
            }
        }
        if !(0.0..=5.0).contains(&request.min_rating) {
            return Err(RankingError::InvalidMinRating(request.min_rating));
        }

        let membership = self.membership(&request).await?;
        let (providers, templates) = tokio::try_join!(
            self.store.list_providers(),
            self.store.get_services(&request.service_ids),
        )?;

        let criteria = QualificationCriteria {
            service_ids: request.service_ids.clone(),
            min_rating: request.min_rating,
            membership,
            fallback_duration: self.config.default_slot_interval_minutes,
            daily_limit: request.date.map(|_| self.config.max_daily_minutes),
        };
        let qualified = qualify(providers, &templates, &criteria)?;
        debug!("{} providers qualified", qualified.len());

        let in_range: Vec<(QualifiedProvider, Option<f64>)> = qualified
            .into_iter()
            .filter_map(|candidate| {
                let distance = match (request.origin, candidate.provider.coordinates()) {
                    (Some(origin), Some((latitude, longitude))) => {
                        Some(haversine_km(origin, Coordinates::new(latitude, longitude)))
                    }
                    _ => None,
                };
                match distance {
                    Some(km) if km > self.config.max_distance_km => None,
                    _ => Some((candidate, distance)),
                }
            })
            .collect();

        let mut ranked = match request.date {
            Some(date) => self.score_with_availability(in_range, date).await?,
            None => in_range
                .into_iter()
                .map(|(candidate, distance)| self.score(candidate, distance, None))
                .collect(),
        };

        ranked.sort_by(|a, b| {
            b.recommendation_score
                .total_cmp(&a.recommendation_score)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.provider_id.cmp(&b.provider_id))
        });

        let total = ranked.len();
        let providers: Vec<ProviderCandidate> = ranked.into_iter().skip(request.offset).take(request.limit).collect();
        info!("Ranked {} providers, returning {}", total, providers.len());

        Ok(RankedProviders {
            providers,
            total,
            limit: request.limit,
            offset: request.offset,
            date: request.date,
        })
    }

    async fn membership(&self, request: &RankingRequest) -> Result<Option<Membership>, RankingError> {
        if let Some(category_id) = request.category_id {
            let category = self
                .store
                .get_category(category_id)
                .await?
                .ok_or(RankingError::CategoryNotFound(category_id))?;
            return Ok(Some(match category.niche_id {
                Some(niche_id) => Membership::Niche(niche_id),
                None => Membership::Category(category_id),
            }));
        }
        Ok(request.niche_id.map(Membership::Niche))
    }

    /// Computes every provider's day with at most `ranking_concurrency` in flight.
    async fn score_with_availability(
        &self,
        candidates: Vec<(QualifiedProvider, Option<f64>)>,
        date: NaiveDate,
    ) -> Result<Vec<ProviderCandidate>, RankingError> {
        let semaphore = Arc::new(Semaphore::new(self.config.ranking_concurrency.max(1)));

        let results = join_all(candidates.into_iter().map(|(candidate, distance)| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await;
                let availability = self.day_availability(&candidate, date).await;
                (candidate, distance, availability)
            }
        }))
        .await;

        let mut scored = Vec::new();
        for (candidate, distance, availability) in results {
            match availability? {
                Some(day) if day.free_slot_count > 0 => scored.push(self.score(candidate, distance, Some(day))),
                _ => debug!("Provider {} has no compatible opening on {}", candidate.provider.id, date),
            }
        }
        Ok(scored)
    }

    /// `Ok(None)` drops the provider; store failures and the daily cap abort the ranking.
    async fn day_availability(
        &self,
        candidate: &QualifiedProvider,
        date: NaiveDate,
    ) -> Result<Option<DayAvailability>, RankingError> {
        let request = DayRequest {
            provider_id: candidate.provider.id,
            date,
            service_ids: candidate.duration.services.iter().map(|s| s.service_id).collect(),
            duration_minutes: Some(candidate.duration.total_minutes),
            exclude_appointment: None,
        };

        match self.slots.compute_day_for(candidate.provider.clone(), &request).await {
            Ok(day) => {
                if day.compatible_free().next().is_none() {
                    return Ok(None);
                }
                Ok(Some(DayAvailability {
                    free_slot_count: day.available_count(),
                    next_available_slot: day.available_slots().next().map(|slot| slot.start_time.clone()),
                }))
            }
            Err(SchedulingError::Store(err)) => Err(err.into()),
            Err(err @ SchedulingError::DurationExceedsDailyLimit { .. }) => Err(err.into()),
            Err(err) => {
                warn!("Skipping provider {} for {}: {}", candidate.provider.id, date, err);
                Ok(None)
            }
        }
    }

    fn score(
        &self,
        candidate: QualifiedProvider,
        distance_km: Option<f64>,
        day: Option<DayAvailability>,
    ) -> ProviderCandidate {
        let distance = distance_score(distance_km, self.config.max_distance_km);
        let rating = rating_score(candidate.rating);
        let availability = day.as_ref().map(|d| availability_score(d.free_slot_count)).unwrap_or(0.0);

        ProviderCandidate {
            provider_id: candidate.provider.id,
            name: candidate.provider.name,
            rating: candidate.rating,
            distance_km,
            total_service_duration: candidate.duration.total_minutes,
            services: candidate.duration.services,
            free_slot_count: day.as_ref().map(|d| d.free_slot_count),
            next_available_slot: day.and_then(|d| d.next_available_slot),
            distance_score: distance,
            rating_score: rating,
            availability_score: availability,
            recommendation_score: recommendation_score(distance, rating, availability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_score() {
        assert_eq!(distance_score(Some(0.0), 50.0), 100.0);
        assert_eq!(distance_score(Some(25.0), 50.0), 50.0);
        assert_eq!(distance_score(Some(80.0), 50.0), 0.0);
        assert_eq!(distance_score(None, 50.0), NEUTRAL_DISTANCE_SCORE);
    }

    #[test]
    fn test_availability_score_caps_at_five_slots() {
        assert_eq!(availability_score(0), 0.0);
        assert_eq!(availability_score(2), 40.0);
        assert_eq!(availability_score(5), 100.0);
        assert_eq!(availability_score(12), 100.0);
    }

    #[test]
    fn test_weights() {
        let score = recommendation_score(80.0, rating_score(4.0), availability_score(5));
        assert!((score - (40.0 + 24.0 + 20.0)).abs() < 1e-9);
    }
}
