use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::{AvailabilityRule, NewAvailabilityRule};

use crate::engine::time_codec::to_range;
use crate::error::SchedulingError;

pub fn validate_rule(rule: &NewAvailabilityRule) -> Result<(), SchedulingError> {
    match (rule.day_of_week, rule.specific_date) {
        (Some(_), Some(_)) => {
            return Err(SchedulingError::InvalidRule(
                "a rule has either day_of_week or specific_date, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(SchedulingError::InvalidRule(
                "a rule needs day_of_week or specific_date".to_string(),
            ))
        }
        (Some(day), None) if !(0..=6).contains(&day) => {
            return Err(SchedulingError::InvalidRule(format!(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday), got {}",
                day
            )))
        }
        _ => {}
    }

    let (start, end) = to_range(&rule.start_time, &rule.end_time)?;
    if start >= end {
        return Err(SchedulingError::InvalidTimeRange {
            start: rule.start_time.clone(),
            end: rule.end_time.clone(),
        });
    }

    if let Some(interval) = rule.interval_minutes {
        if interval < 1 {
            return Err(SchedulingError::InvalidRule(format!(
                "interval_minutes must be at least 1, got {}",
                interval
            )));
        }
    }

    Ok(())
}

pub struct RuleService {
    store: Arc<dyn SchedulingStore>,
}

impl RuleService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, SchedulingError> {
        self.ensure_provider(provider_id).await?;
        Ok(self.store.list_availability_rules(provider_id).await?)
    }

    /// Swaps the provider's whole rule set in one store operation.
    pub async fn replace(
        &self,
        provider_id: Uuid,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>, SchedulingError> {
        for rule in &rules {
            validate_rule(rule)?;
        }
        self.ensure_provider(provider_id).await?;

        let count = rules.len();
        let created = self.store.replace_availability_rules(provider_id, rules).await?;
        info!("Replaced availability for provider {} with {} rules", provider_id, count);

        Ok(created)
    }

    async fn ensure_provider(&self, provider_id: Uuid) -> Result<(), SchedulingError> {
        match self.store.get_provider(provider_id).await? {
            Some(_) => Ok(()),
            None => Err(SchedulingError::ProviderNotFound(provider_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn weekly(day: i16, start: &str, end: &str) -> NewAvailabilityRule {
        NewAvailabilityRule {
            day_of_week: Some(day),
            specific_date: None,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_available: true,
            interval_minutes: Some(30),
        }
    }

    #[test]
    fn test_valid_rules() {
        assert!(validate_rule(&weekly(1, "08:00", "12:00")).is_ok());

        let mut dated = weekly(1, "08:00", "12:00");
        dated.day_of_week = None;
        dated.specific_date = NaiveDate::from_ymd_opt(2025, 12, 24);
        assert!(validate_rule(&dated).is_ok());
    }

    #[test]
    fn test_invalid_rules() {
        assert_matches!(validate_rule(&weekly(7, "08:00", "12:00")), Err(SchedulingError::InvalidRule(_)));
        assert_matches!(
            validate_rule(&weekly(1, "12:00", "12:00")),
            Err(SchedulingError::InvalidTimeRange { .. })
        );
        assert_matches!(validate_rule(&weekly(1, "8:00", "12:00")), Err(SchedulingError::InvalidTimeFormat(_)));

        let mut both = weekly(1, "08:00", "12:00");
        both.specific_date = NaiveDate::from_ymd_opt(2025, 12, 24);
        assert_matches!(validate_rule(&both), Err(SchedulingError::InvalidRule(_)));

        let mut zero_step = weekly(1, "08:00", "12:00");
        zero_step.interval_minutes = Some(0);
        assert_matches!(validate_rule(&zero_step), Err(SchedulingError::InvalidRule(_)));
    }
}
