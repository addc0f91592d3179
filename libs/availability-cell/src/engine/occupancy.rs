//! Busy/free interval arithmetic over half-open `[start, end)` minute ranges.

use serde::Serialize;

use shared_models::scheduling::{Appointment, BlockedRange};

use super::time_codec::to_range;
use crate::error::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Interval {
    pub start: i32,
    pub end: i32,
}

impl Interval {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn fits(&self, duration: i32) -> bool {
        self.len() >= duration
    }
}

/// Active appointments and blocked ranges as one start-sorted busy list.
///
/// `exclude_appointment` drops an appointment and the system blocks tied to it,
/// so an existing booking can be re-validated against everything else.
pub fn busy_intervals(
    appointments: &[Appointment],
    blocks: &[BlockedRange],
    exclude_appointment: Option<uuid::Uuid>,
) -> Result<Vec<Interval>, SchedulingError> {
    let mut busy = Vec::with_capacity(appointments.len() + blocks.len());

    for appointment in appointments {
        if !appointment.status.is_active() || Some(appointment.id) == exclude_appointment {
            continue;
        }
        let (start, end) = to_range(&appointment.start_time, &appointment.end_time).map_err(|_| {
            SchedulingError::CorruptRecord(format!(
                "appointment {} has times {}-{}",
                appointment.id, appointment.start_time, appointment.end_time
            ))
        })?;
        busy.push(Interval::new(start, end));
    }

    for block in blocks {
        if exclude_appointment.is_some() && block.appointment_id == exclude_appointment {
            continue;
        }
        let (start, end) = to_range(&block.start_time, &block.end_time).map_err(|_| {
            SchedulingError::CorruptRecord(format!(
                "blocked slot {} has times {}-{}",
                block.id, block.start_time, block.end_time
            ))
        })?;
        busy.push(Interval::new(start, end));
    }

    busy.retain(|interval| !interval.is_empty());
    busy.sort();
    Ok(busy)
}

/// Subtracts `busy` from `window`. `busy` need not be sorted or disjoint.
pub fn free_intervals(window: Interval, busy: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = busy.to_vec();
    sorted.sort();

    let mut free = Vec::new();
    let mut cursor = window.start;

    for interval in sorted {
        if cursor >= window.end {
            break;
        }
        if interval.start > cursor {
            let gap_end = interval.start.min(window.end);
            free.push(Interval::new(cursor, gap_end));
        }
        cursor = cursor.max(interval.end);
    }

    if cursor < window.end {
        free.push(Interval::new(cursor, window.end));
    }

    free
}

pub fn conflicts_with_any(candidate: &Interval, busy: &[Interval]) -> bool {
    busy.iter().any(|interval| candidate.overlaps(interval))
}
