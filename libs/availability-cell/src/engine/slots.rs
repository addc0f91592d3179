use serde::{Deserialize, Serialize};

use shared_models::scheduling::AvailabilityRule;

use super::occupancy::{conflicts_with_any, Interval};
use super::time_codec::{to_minutes, to_range, to_time_string};
use crate::error::SchedulingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub service_duration: i32,
}

impl CandidateSlot {
    pub fn interval(&self) -> Result<Interval, SchedulingError> {
        let (start, end) = to_range(&self.start_time, &self.end_time)?;
        Ok(Interval::new(start, end))
    }

    pub fn start_minutes(&self) -> Result<i32, SchedulingError> {
        to_minutes(&self.start_time)
    }
}

/// An open window for the day with its stepping interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    #[serde(flatten)]
    pub range: Interval,
    pub interval_minutes: i32,
}

/// Picks the windows that apply to `date`.
///
/// Date-specific rules replace the weekly ones outright; a date whose specific
/// rules are all `is_available = false` is closed.
pub fn select_windows(
    rules: &[AvailabilityRule],
    date: chrono::NaiveDate,
    day_of_week: u8,
    default_interval: i32,
) -> Result<Vec<AvailabilityWindow>, SchedulingError> {
    let specific: Vec<&AvailabilityRule> = rules.iter().filter(|r| r.specific_date == Some(date)).collect();

    let applicable: Vec<&AvailabilityRule> = if specific.is_empty() {
        rules
            .iter()
            .filter(|r| r.specific_date.is_none() && r.day_of_week == Some(day_of_week as i16))
            .collect()
    } else {
        specific
    };

    let mut windows = Vec::new();
    for rule in applicable.into_iter().filter(|r| r.is_available) {
        let (start, end) = to_range(&rule.start_time, &rule.end_time).map_err(|_| {
            SchedulingError::CorruptRecord(format!(
                "availability rule {} has times {}-{}",
                rule.id, rule.start_time, rule.end_time
            ))
        })?;
        if start >= end {
            continue;
        }
        windows.push(AvailabilityWindow {
            range: Interval::new(start, end),
            interval_minutes: rule.interval_minutes.unwrap_or(default_interval).max(1),
        });
    }

    windows.sort_by_key(|w| w.range);
    Ok(windows)
}

/// Candidate starts inside one window. A window shorter than `duration` yields nothing.
pub fn generate(window: &AvailabilityWindow, duration: i32) -> Vec<Interval> {
    let step = window.interval_minutes.max(1);
    let mut slots = Vec::new();

    if duration <= 0 {
        return slots;
    }

    let mut cursor = window.range.start;
    while cursor + duration <= window.range.end {
        slots.push(Interval::new(cursor, cursor + duration));
        cursor += step;
    }
    slots
}

/// Slots for every window, deduplicated by start, flagged against `busy`.
pub fn build_day_slots(windows: &[AvailabilityWindow], duration: i32, busy: &[Interval]) -> Vec<CandidateSlot> {
    let mut intervals: Vec<Interval> = windows.iter().flat_map(|w| generate(w, duration)).collect();
    intervals.sort();
    intervals.dedup_by_key(|i| i.start);

    intervals
        .into_iter()
        .map(|interval| CandidateSlot {
            start_time: to_time_string(interval.start),
            end_time: to_time_string(interval.end),
            is_available: !conflicts_with_any(&interval, busy),
            service_duration: duration,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn window(start: &str, end: &str, interval: i32) -> AvailabilityWindow {
        AvailabilityWindow {
            range: Interval::new(to_minutes(start).unwrap(), to_minutes(end).unwrap()),
            interval_minutes: interval,
        }
    }

    fn rule(day: Option<i16>, date: Option<NaiveDate>, start: &str, end: &str, open: bool) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            provider_id: Uuid::nil(),
            day_of_week: day,
            specific_date: date,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_available: open,
            interval_minutes: Some(30),
        }
    }

    #[test]
    fn test_morning_window_without_bookings() {
        let slots = build_day_slots(&[window("08:00", "12:00", 30)], 30, &[]);

        assert_eq!(slots.len(), 8);
        assert_eq!((slots[0].start_time.as_str(), slots[0].end_time.as_str()), ("08:00", "08:30"));
        assert_eq!((slots[7].start_time.as_str(), slots[7].end_time.as_str()), ("11:30", "12:00"));
        assert!(slots.iter().all(|s| s.is_available));
    }

    #[test]
    fn test_booked_half_hour_is_unavailable() {
        let busy = [Interval::new(540, 570)];
        let slots = build_day_slots(&[window("08:00", "12:00", 30)], 30, &busy);

        for slot in &slots {
            assert_eq!(slot.is_available, slot.start_time != "09:00", "{:?}", slot);
        }
    }

    #[test]
    fn test_ninety_minute_block_in_ninety_minute_window() {
        let slots = build_day_slots(&[window("08:00", "09:30", 30)], 90, &[]);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, "08:00");
        assert_eq!(slots[0].end_time, "09:30");
    }

    #[test]
    fn test_short_window_yields_no_slots() {
        assert!(generate(&window("08:00", "08:20", 30), 30).is_empty());
    }

    #[test]
    fn test_overlapping_windows_are_deduplicated() {
        let slots = build_day_slots(&[window("08:00", "10:00", 30), window("09:00", "11:00", 30)], 30, &[]);
        let starts: Vec<&str> = slots.iter().map(|s| s.start_time.as_str()).collect();
        assert_eq!(starts, vec!["08:00", "08:30", "09:00", "09:30", "10:00", "10:30"]);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let busy = [Interval::new(600, 645)];
        let windows = [window("13:00", "18:00", 15), window("08:00", "12:00", 20)];
        assert_eq!(build_day_slots(&windows, 45, &busy), build_day_slots(&windows, 45, &busy));
    }

    #[test]
    fn test_specific_date_replaces_weekly_rules() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let rules = vec![
            rule(Some(1), None, "08:00", "12:00", true),
            rule(None, Some(date), "14:00", "16:00", true),
        ];

        let windows = select_windows(&rules, date, 1, 30).unwrap();
        assert_eq!(windows, vec![window("14:00", "16:00", 30)]);
    }

    #[test]
    fn test_closed_specific_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let rules = vec![
            rule(Some(1), None, "08:00", "12:00", true),
            rule(None, Some(date), "00:00", "23:59", false),
        ];

        assert!(select_windows(&rules, date, 1, 30).unwrap().is_empty());
    }

    #[test]
    fn test_weekly_rules_for_other_days_are_ignored() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut other_day = rule(Some(2), None, "08:00", "12:00", true);
        other_day.interval_minutes = None;
        let rules = vec![other_day, rule(Some(1), None, "13:00", "15:00", true)];

        let windows = select_windows(&rules, date, 1, 30).unwrap();
        assert_eq!(windows, vec![window("13:00", "15:00", 30)]);
    }

    #[test]
    fn test_interval_floor() {
        let mut tight = rule(Some(1), None, "08:00", "08:05", true);
        tight.interval_minutes = Some(0);
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let windows = select_windows(&[tight], date, 1, 30).unwrap();
        assert_eq!(windows[0].interval_minutes, 1);
        assert_eq!(generate(&windows[0], 1).len(), 5);
    }
}
