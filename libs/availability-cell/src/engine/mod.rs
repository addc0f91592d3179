pub mod duration;
pub mod occupancy;
pub mod scoring;
pub mod slots;
pub mod time_codec;
pub mod timezone;

pub use duration::{aggregate, DurationBreakdown};
pub use occupancy::{busy_intervals, free_intervals, Interval};
pub use scoring::{rank_slots, ScoredSlot};
pub use slots::{build_day_slots, select_windows, AvailabilityWindow, CandidateSlot};
pub use time_codec::{to_minutes, to_time_string};
pub use timezone::{day_of_week, resolve_day_of_week};
