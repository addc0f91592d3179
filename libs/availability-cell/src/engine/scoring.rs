//! Fragmentation-aware ordering for the smart slot listing.

use serde::Serialize;

use super::occupancy::Interval;
use super::slots::CandidateSlot;

const EDGE_BONUS: i32 = 50;
const STRANDED_GAP_PENALTY: i32 = 25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSlot {
    #[serde(flatten)]
    pub slot: CandidateSlot,
    pub score: i32,
}

/// Prefers slots flush against a window edge or a booking, and penalises
/// slots that would strand a gap too short for another booking of the same length.
pub fn score_slot(slot: &Interval, free: &[Interval]) -> i32 {
    let Some(container) = free.iter().find(|f| f.contains(slot)) else {
        return i32::MIN;
    };

    let duration = slot.len();
    [slot.start - container.start, container.end - slot.end]
        .into_iter()
        .map(|gap| match gap {
            0 => EDGE_BONUS,
            gap if gap < duration => -STRANDED_GAP_PENALTY,
            _ => 0,
        })
        .sum()
}

/// Available slots only, best score first, ties broken by start time.
pub fn rank_slots(slots: &[CandidateSlot], free: &[Interval]) -> Vec<ScoredSlot> {
    let mut scored: Vec<(i32, ScoredSlot)> = slots
        .iter()
        .filter(|slot| slot.is_available)
        .filter_map(|slot| {
            let interval = slot.interval().ok()?;
            Some((
                interval.start,
                ScoredSlot {
                    slot: slot.clone(),
                    score: score_slot(&interval, free),
                },
            ))
        })
        .collect();

    scored.sort_by(|(a_start, a), (b_start, b)| b.score.cmp(&a.score).then(a_start.cmp(b_start)));
    scored.into_iter().map(|(_, slot)| slot).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::occupancy::free_intervals;
    use crate::engine::slots::{build_day_slots, AvailabilityWindow};

    #[test]
    fn test_edges_and_neighbours_rank_first() {
        let window = AvailabilityWindow { range: Interval::new(480, 720), interval_minutes: 30 };
        let busy = [Interval::new(600, 630)];
        let slots = build_day_slots(&[window], 60, &busy);
        let free = free_intervals(window.range, &busy);

        let ranked = rank_slots(&slots, &free);
        let order: Vec<&str> = ranked.iter().map(|s| s.slot.start_time.as_str()).collect();

        // 08:00-09:00 touches the opening and leaves a full hour before the booking;
        // 09:00-10:00 ends flush against the booking.
        assert_eq!(&order[..2], &["08:00", "09:00"]);
        assert!(ranked.iter().all(|s| s.slot.is_available));
        assert_eq!(ranked.len(), slots.iter().filter(|s| s.is_available).count());
    }

    #[test]
    fn test_stranded_gap_penalty() {
        let free = [Interval::new(480, 600)];
        // Leaves 30 minutes on the left, less than the 60 minute duration.
        assert_eq!(score_slot(&Interval::new(510, 570), &free), -50);
        assert_eq!(score_slot(&Interval::new(480, 540), &free), 50);
        assert_eq!(score_slot(&Interval::new(480, 600), &free), 100);
    }
}
